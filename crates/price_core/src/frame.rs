//! Typed tabular values
//!
//! A [`Frame`] is an ordered set of named, equally sized columns. Every column
//! is either categorical (strings) or numeric (`f64`), and any cell may be
//! missing. Shape is validated once at construction; every operation returns a
//! new frame that upholds the same invariants.

use thiserror::Error;

/// Frame construction and access errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FrameError {
    #[error("column name must not be empty")]
    EmptyColumnName,

    #[error("duplicate column: '{0}'")]
    DuplicateColumn(String),

    #[error("column '{name}' has {actual} rows, expected {expected}")]
    LengthMismatch {
        name: String,
        expected: usize,
        actual: usize,
    },

    #[error("column '{0}' not found")]
    MissingColumn(String),

    #[error("column '{0}' is not numeric")]
    NotNumeric(String),

    #[error("column '{0}' contains missing values")]
    MissingValues(String),
}

/// A single typed column
#[derive(Debug, Clone, PartialEq)]
pub enum Column {
    Categorical(Vec<Option<String>>),
    Numeric(Vec<Option<f64>>),
}

impl Column {
    pub fn categorical<I, S>(values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Column::Categorical(values.into_iter().map(|v| Some(v.into())).collect())
    }

    pub fn numeric<I: IntoIterator<Item = f64>>(values: I) -> Self {
        Column::Numeric(values.into_iter().map(Some).collect())
    }

    pub fn len(&self) -> usize {
        match self {
            Column::Categorical(values) => values.len(),
            Column::Numeric(values) => values.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn is_numeric(&self) -> bool {
        matches!(self, Column::Numeric(_))
    }

    /// Whether the cell at `row` is missing (out-of-range rows count as missing).
    pub fn is_missing(&self, row: usize) -> bool {
        match self {
            Column::Categorical(values) => values.get(row).map_or(true, Option::is_none),
            Column::Numeric(values) => values.get(row).map_or(true, Option::is_none),
        }
    }

    pub fn missing_count(&self) -> usize {
        (0..self.len()).filter(|&row| self.is_missing(row)).count()
    }

    /// Category label of a cell. Numeric cells render through `Display`,
    /// so `3.0` becomes `"3"`.
    pub fn category(&self, row: usize) -> Option<String> {
        match self {
            Column::Categorical(values) => values.get(row).cloned().flatten(),
            Column::Numeric(values) => values.get(row).copied().flatten().map(|v| v.to_string()),
        }
    }

    fn take(&self, rows: &[usize]) -> Column {
        match self {
            Column::Categorical(values) => {
                Column::Categorical(rows.iter().map(|&r| values[r].clone()).collect())
            }
            Column::Numeric(values) => Column::Numeric(rows.iter().map(|&r| values[r]).collect()),
        }
    }

    /// Replace missing cells with `sentinel`. A numeric column with gaps can
    /// no longer stay numeric, so it turns categorical.
    fn fill_missing(self, sentinel: &str) -> Column {
        match self {
            Column::Categorical(values) => Column::Categorical(
                values
                    .into_iter()
                    .map(|v| Some(v.unwrap_or_else(|| sentinel.to_string())))
                    .collect(),
            ),
            Column::Numeric(values) if values.iter().any(Option::is_none) => Column::Categorical(
                values
                    .into_iter()
                    .map(|v| Some(v.map_or_else(|| sentinel.to_string(), |n| n.to_string())))
                    .collect(),
            ),
            numeric => numeric,
        }
    }
}

/// Ordered, named, equally sized columns
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Frame {
    names: Vec<String>,
    columns: Vec<Column>,
    n_rows: usize,
}

impl Frame {
    /// Build a frame, rejecting empty or duplicate names and ragged columns.
    pub fn new(columns: Vec<(String, Column)>) -> Result<Self, FrameError> {
        let n_rows = columns.first().map_or(0, |(_, c)| c.len());
        let mut names = Vec::with_capacity(columns.len());
        let mut values = Vec::with_capacity(columns.len());

        for (name, column) in columns {
            if name.is_empty() {
                return Err(FrameError::EmptyColumnName);
            }
            if names.contains(&name) {
                return Err(FrameError::DuplicateColumn(name));
            }
            if column.len() != n_rows {
                return Err(FrameError::LengthMismatch {
                    name,
                    expected: n_rows,
                    actual: column.len(),
                });
            }
            names.push(name);
            values.push(column);
        }

        Ok(Self {
            names,
            columns: values,
            n_rows,
        })
    }

    /// Build a one-row categorical frame from `(name, value)` pairs.
    pub fn from_row<N, V>(cells: &[(N, V)]) -> Result<Self, FrameError>
    where
        N: AsRef<str>,
        V: AsRef<str>,
    {
        Self::new(
            cells
                .iter()
                .map(|(name, value)| {
                    (
                        name.as_ref().to_string(),
                        Column::categorical([value.as_ref()]),
                    )
                })
                .collect(),
        )
    }

    pub fn n_rows(&self) -> usize {
        self.n_rows
    }

    pub fn n_cols(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.n_rows == 0
    }

    pub fn column_names(&self) -> &[String] {
        &self.names
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.names.iter().any(|n| n == name)
    }

    pub fn column(&self, name: &str) -> Result<&Column, FrameError> {
        self.names
            .iter()
            .position(|n| n == name)
            .map(|idx| &self.columns[idx])
            .ok_or_else(|| FrameError::MissingColumn(name.to_string()))
    }

    /// Columns in declaration order
    pub fn columns(&self) -> impl Iterator<Item = (&str, &Column)> {
        self.names.iter().map(String::as_str).zip(self.columns.iter())
    }

    /// Project onto `names`, in the order given.
    pub fn select<S: AsRef<str>>(&self, names: &[S]) -> Result<Frame, FrameError> {
        let mut selected = Vec::with_capacity(names.len());
        for name in names {
            let name = name.as_ref();
            selected.push((name.to_string(), self.column(name)?.clone()));
        }
        Frame::new(selected)
    }

    /// Keep only rows where `name` has a value.
    pub fn drop_missing(&self, name: &str) -> Result<Frame, FrameError> {
        let column = self.column(name)?;
        let keep: Vec<usize> = (0..self.n_rows).filter(|&r| !column.is_missing(r)).collect();
        Ok(self.take(&keep))
    }

    /// Replace every missing cell in every column with `sentinel`.
    pub fn fill_missing(self, sentinel: &str) -> Frame {
        Frame {
            names: self.names,
            columns: self
                .columns
                .into_iter()
                .map(|c| c.fill_missing(sentinel))
                .collect(),
            n_rows: self.n_rows,
        }
    }

    /// Dense numeric values of a column with no gaps.
    pub fn numeric_values(&self, name: &str) -> Result<Vec<f64>, FrameError> {
        match self.column(name)? {
            Column::Numeric(values) => values
                .iter()
                .map(|v| v.ok_or_else(|| FrameError::MissingValues(name.to_string())))
                .collect(),
            Column::Categorical(_) => Err(FrameError::NotNumeric(name.to_string())),
        }
    }

    /// Rows at `rows`, in that order. Indices must be in range.
    pub fn take(&self, rows: &[usize]) -> Frame {
        Frame {
            names: self.names.clone(),
            columns: self.columns.iter().map(|c| c.take(rows)).collect(),
            n_rows: rows.len(),
        }
    }
}

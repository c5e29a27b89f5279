//! CSV dataset loading and preprocessing
//!
//! Reads a headered price history into a typed [`Frame`], then cleans it into
//! feature columns plus a numeric target.

use crop_price_core::{Column, Frame, FrameError, TrainingConfig};
use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;
use tracing::{debug, warn};

use crate::deterministic::train_test_indices;
use crate::errors::TrainerError;

/// Cell contents treated as missing
pub const MISSING_TOKENS: &[&str] = &["", "NA", "N/A", "NaN", "nan", "null", "None"];

fn is_missing_token(cell: &str) -> bool {
    MISSING_TOKENS.contains(&cell)
}

/// Load a CSV file with a header row into a [`Frame`].
///
/// Columns named in `categorical` keep their cell text verbatim, so codes
/// like `0411` stay distinct from `411`. Any other column is numeric when
/// every present cell parses as a finite `f64`, otherwise categorical.
/// Empty header cells are named `Unnamed: <position>`.
pub fn load_csv<S: AsRef<str>>(path: &Path, categorical: &[S]) -> Result<Frame, TrainerError> {
    if !path.exists() {
        return Err(TrainerError::MissingInputFile(path.to_path_buf()));
    }

    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .trim(csv::Trim::All)
        .from_path(path)?;

    let headers: Vec<String> = reader
        .headers()?
        .iter()
        .enumerate()
        .map(|(idx, name)| {
            if name.is_empty() {
                format!("Unnamed: {idx}")
            } else {
                name.to_string()
            }
        })
        .collect();
    let mut cells: Vec<Vec<Option<String>>> = vec![Vec::new(); headers.len()];

    // Ragged records surface as csv::Error (UnequalLengths)
    for record in reader.records() {
        let record = record?;
        for (column, cell) in cells.iter_mut().zip(record.iter()) {
            column.push((!is_missing_token(cell)).then(|| cell.to_string()));
        }
    }

    let columns = headers
        .into_iter()
        .zip(cells)
        .map(|(name, values)| {
            let column = if categorical.iter().any(|c| c.as_ref() == name) {
                Column::Categorical(values)
            } else {
                infer_column(values)
            };
            (name, column)
        })
        .collect();

    Ok(Frame::new(columns)?)
}

/// Numeric if every present cell parses as a finite number
fn infer_column(values: Vec<Option<String>>) -> Column {
    let parsed: Option<Vec<Option<f64>>> = values
        .iter()
        .map(|cell| match cell {
            None => Some(None),
            Some(text) => text.parse::<f64>().ok().filter(|v| v.is_finite()).map(Some),
        })
        .collect();

    match parsed {
        Some(numbers) => Column::Numeric(numbers),
        None => Column::Categorical(values),
    }
}

/// Cleaned training records: schema-ordered features plus the target
#[derive(Clone, Debug, PartialEq)]
pub struct PriceDataset {
    pub features: Frame,
    pub targets: Vec<f64>,
}

impl PriceDataset {
    /// Drop rows without a target, fill remaining gaps with the sentinel and
    /// project onto the configured feature columns.
    pub fn prepare(frame: Frame, config: &TrainingConfig) -> Result<Self, TrainerError> {
        for required in std::iter::once(&config.target_column).chain(&config.feature_columns) {
            if !frame.has_column(required) {
                return Err(TrainerError::MissingRequiredColumn(required.clone()));
            }
        }

        let loaded = frame.n_rows();
        let frame = frame.drop_missing(&config.target_column)?;
        if frame.n_rows() < loaded {
            warn!(
                "Dropped {} rows with a missing '{}'",
                loaded - frame.n_rows(),
                config.target_column
            );
        }

        for (name, column) in frame.columns() {
            let missing = column.missing_count();
            if missing > 0 {
                debug!(
                    "Filling {} missing cells in '{}' with '{}'",
                    missing, name, config.missing_sentinel
                );
            }
        }
        let frame = frame.fill_missing(&config.missing_sentinel);

        let targets = frame
            .numeric_values(&config.target_column)
            .map_err(|err| match err {
                FrameError::NotNumeric(name) => {
                    TrainerError::Dataset(format!("target column '{name}' must be numeric"))
                }
                other => TrainerError::Frame(other),
            })?;
        let features = frame.select(&config.feature_columns)?;

        Ok(Self { features, targets })
    }

    pub fn len(&self) -> usize {
        self.targets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.targets.is_empty()
    }

    /// Seeded shuffle split into `(train, test)`
    pub fn split(&self, test_size: f64, seed: i64) -> Result<(Self, Self), TrainerError> {
        if self.len() < 2 {
            return Err(TrainerError::Dataset(format!(
                "need at least 2 rows to split, found {}",
                self.len()
            )));
        }

        let (train, test) = train_test_indices(self.len(), test_size, seed);
        Ok((self.take(&train), self.take(&test)))
    }

    fn take(&self, rows: &[usize]) -> Self {
        Self {
            features: self.features.take(rows),
            targets: rows.iter().map(|&r| self.targets[r]).collect(),
        }
    }

    /// Distinct category count per feature column
    pub fn category_counts(&self) -> BTreeMap<String, usize> {
        self.features
            .columns()
            .map(|(name, column)| {
                let distinct: BTreeSet<String> =
                    (0..column.len()).filter_map(|r| column.category(r)).collect();
                (name.to_string(), distinct.len())
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crop_price_core::DEFAULT_FEATURE_COLUMNS;
    use std::io::Write;
    use tempfile::NamedTempFile;

    const FEATURES: &[&str] = &DEFAULT_FEATURE_COLUMNS;

    fn write_csv(contents: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        file.flush().unwrap();
        file
    }

    const SAMPLE: &str = "\
State,District,Commodity,Arrival_Date,Modal Price
Maharashtra,Pune,Onion,01/01/2024,1500
Karnataka, Kolar ,Tomato,01/01/2024,NA
Kerala,,Banana,02/01/2024,2100.5
Punjab,Ludhiana,Wheat,02/01/2024,2200
";

    #[test]
    fn test_load_csv_infers_types_and_missing() {
        let file = write_csv(SAMPLE);
        let frame = load_csv(file.path(), FEATURES).unwrap();

        assert_eq!(frame.n_rows(), 4);
        assert_eq!(frame.n_cols(), 5);

        let price = frame.column("Modal Price").unwrap();
        assert!(price.is_numeric());
        assert!(price.is_missing(1));

        let district = frame.column("District").unwrap();
        assert!(!district.is_numeric());
        assert_eq!(district.category(1), Some("Kolar".to_string()));
        assert!(district.is_missing(2));
    }

    #[test]
    fn test_feature_columns_keep_cell_text() {
        let file = write_csv(
            "State,District,Commodity,Grade,Modal Price\n\
             Goa,0411,1500.50,01,1000\n\
             Goa,0522,2.0,02,3000\n",
        );
        let frame = load_csv(file.path(), FEATURES).unwrap();

        let district = frame.column("District").unwrap();
        assert!(!district.is_numeric());
        assert_eq!(district.category(0), Some("0411".to_string()));

        let commodity = frame.column("Commodity").unwrap();
        assert_eq!(commodity.category(0), Some("1500.50".to_string()));
        assert_eq!(commodity.category(1), Some("2.0".to_string()));

        // Passthrough and target columns are still inferred
        assert!(frame.column("Grade").unwrap().is_numeric());
        assert!(frame.column("Modal Price").unwrap().is_numeric());

        let dataset = PriceDataset::prepare(frame, &TrainingConfig::default()).unwrap();
        assert_eq!(
            dataset.features.column("District").unwrap().category(1),
            Some("0522".to_string())
        );
    }

    #[test]
    fn test_unnamed_header_cells() {
        let file = write_csv(
            ",State,District,Commodity,Modal Price,\n\
             0,Goa,North Goa,Rice,900,x\n\
             1,Goa,South Goa,Rice,950,y\n",
        );
        let frame = load_csv(file.path(), FEATURES).unwrap();

        assert_eq!(frame.column_names()[0], "Unnamed: 0");
        assert_eq!(frame.column_names()[5], "Unnamed: 5");

        let dataset = PriceDataset::prepare(frame, &TrainingConfig::default()).unwrap();
        assert_eq!(dataset.targets, vec![900.0, 950.0]);
    }

    #[test]
    fn test_missing_file() {
        let result = load_csv(Path::new("/nonexistent/prices.csv"), FEATURES);
        assert!(matches!(result, Err(TrainerError::MissingInputFile(_))));
    }

    #[test]
    fn test_prepare_cleans_rows() {
        let file = write_csv(SAMPLE);
        let frame = load_csv(file.path(), FEATURES).unwrap();
        let dataset = PriceDataset::prepare(frame, &TrainingConfig::default()).unwrap();

        assert_eq!(dataset.len(), 3);
        assert_eq!(dataset.targets, vec![1500.0, 2100.5, 2200.0]);
        assert_eq!(
            dataset.features.column_names(),
            &["State", "District", "Commodity"]
        );
        assert_eq!(
            dataset.features.column("District").unwrap().category(1),
            Some("Unknown".to_string())
        );
        assert_eq!(dataset.category_counts()["Commodity"], 3);
    }

    #[test]
    fn test_prepare_requires_columns() {
        let file = write_csv("State,District,Modal Price\nGoa,North Goa,1000\n");
        let frame = load_csv(file.path(), FEATURES).unwrap();
        let result = PriceDataset::prepare(frame, &TrainingConfig::default());
        assert!(matches!(
            result,
            Err(TrainerError::MissingRequiredColumn(c)) if c == "Commodity"
        ));

        let file = write_csv("State,District,Commodity\nGoa,North Goa,Rice\n");
        let frame = load_csv(file.path(), FEATURES).unwrap();
        let result = PriceDataset::prepare(frame, &TrainingConfig::default());
        assert!(matches!(
            result,
            Err(TrainerError::MissingRequiredColumn(c)) if c == "Modal Price"
        ));
    }

    #[test]
    fn test_non_numeric_target() {
        let file = write_csv("State,District,Commodity,Modal Price\nGoa,North Goa,Rice,cheap\n");
        let frame = load_csv(file.path(), FEATURES).unwrap();
        let result = PriceDataset::prepare(frame, &TrainingConfig::default());
        assert!(matches!(result, Err(TrainerError::Dataset(_))));
    }

    #[test]
    fn test_split_needs_two_rows() {
        let file = write_csv("State,District,Commodity,Modal Price\nGoa,North Goa,Rice,900\n");
        let frame = load_csv(file.path(), FEATURES).unwrap();
        let dataset = PriceDataset::prepare(frame, &TrainingConfig::default()).unwrap();
        assert!(matches!(dataset.split(0.2, 42), Err(TrainerError::Dataset(_))));

        let file = write_csv(SAMPLE);
        let dataset =
            PriceDataset::prepare(load_csv(file.path(), FEATURES).unwrap(), &TrainingConfig::default())
                .unwrap();
        let (train, test) = dataset.split(0.2, 42).unwrap();
        assert_eq!((train.len(), test.len()), (2, 1));
        assert_eq!(train.features.n_rows(), 2);
    }
}

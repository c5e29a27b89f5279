//! Hand-built pipeline shared by the integration tests

#![allow(dead_code)]

use crop_price_core::{
    save_pipeline, ArtifactConfig, Column, FeatureSchema, Frame, GbdtModel, Node, OneHotEncoder,
    Pipeline, Tree,
};
use tempfile::{tempdir, TempDir};

/// One tree over the fitted vocabulary:
/// Tomato adds 90, Pune onions add 25, other onions subtract 15 (base 1400).
pub fn fixture_pipeline() -> Pipeline {
    let schema = FeatureSchema::default();
    let frame = Frame::new(vec![
        (
            "State".to_string(),
            Column::categorical(["Maharashtra", "Karnataka", "Maharashtra"]),
        ),
        (
            "District".to_string(),
            Column::categorical(["Pune", "Kolar", "Nashik"]),
        ),
        (
            "Commodity".to_string(),
            Column::categorical(["Onion", "Tomato", "Onion"]),
        ),
    ])
    .unwrap();
    let encoder = OneHotEncoder::new().fit(&schema, &frame).unwrap();

    // Columns: Karnataka, Maharashtra, Kolar, Nashik, Pune, Onion, Tomato
    let tree = Tree::new(
        vec![
            Node::internal(0, 6, 0.5, 1, 2),
            Node::internal(1, 4, 0.5, 3, 4),
            Node::leaf(2, 900.0),
            Node::leaf(3, -150.0),
            Node::leaf(4, 250.0),
        ],
        0.1,
    );
    let model = GbdtModel::new(1400.0, vec![tree], encoder.n_features_out());
    Pipeline::from_parts(schema, encoder, model).unwrap()
}

/// Fixture pipeline saved under `<tempdir>/model_files`
pub fn trained_dir() -> (TempDir, ArtifactConfig) {
    let dir = tempdir().unwrap();
    let artifact = ArtifactConfig::new(
        dir.path().join("model_files"),
        "gradient_boosting_model.joblib",
    );
    save_pipeline(&fixture_pipeline(), &artifact.path()).unwrap();
    (dir, artifact)
}

//! Tests for data module

use super::*;

fn survey() -> DataFrame {
    DataFrameBuilder::new()
        .with_column(
            "Condition",
            Series::factor(&["Control", "GlobalWarming", "ClimateCrisis", "Control", "NA"]),
        )
        .unwrap()
        .with_parsed_column("WTC", &["55", "NA", "71.5", "40", "62"])
        .unwrap()
        .with_parsed_column("Age", &["34", "51", "29", "NA", "45"])
        .unwrap()
        .build()
        .unwrap()
}

#[test]
fn test_parse_float_missing_marker() {
    let series = Series::parse_float(&["1.5", "NA", "", "3"]).unwrap();
    assert_eq!(series.len(), 4);
    assert_eq!(series.dtype(), "float64");
    assert_eq!(series.missing_count(), 2);
    assert!(series.is_missing(1));
    assert!(!series.is_missing(3));
}

#[test]
fn test_parse_float_rejects_garbage() {
    let err = Series::parse_float(&["1", "n/a"]).unwrap_err();
    assert!(matches!(err, DataError::ParseFloat { row: 1, .. }));
}

#[test]
fn test_factor_levels_sorted_and_na_excluded() {
    let series = Series::factor(&["b", "a", "NA", "b"]);
    assert_eq!(series.levels().unwrap(), &["a".to_string(), "b".to_string()]);
    assert_eq!(series.label(0), Some("b"));
    assert_eq!(series.label(2), None);
    assert!(series.is_missing(2));
}

#[test]
fn test_factor_with_levels_keeps_order() {
    let series = Series::factor_with_levels(&["x", "z", "y"], &["z", "y", "x"]).unwrap();
    assert_eq!(series.levels().unwrap()[0], "z");
    assert_eq!(series.label(0), Some("x"));

    let err = Series::factor_with_levels(&["w"], &["z"]).unwrap_err();
    assert!(matches!(err, DataError::UnknownLevel { .. }));
}

#[test]
fn test_relevel_preserves_labels() {
    let series = Series::factor(&["a", "b", "c", "b"]);
    let releveled = series.relevel("c").unwrap();

    assert_eq!(
        releveled.levels().unwrap(),
        &["c".to_string(), "a".to_string(), "b".to_string()]
    );
    for row in 0..series.len() {
        assert_eq!(series.label(row), releveled.label(row));
    }
}

#[test]
fn test_dataframe_creation() {
    let df = survey();
    assert_eq!(df.shape(), (5, 3));
    assert_eq!(df.column_names(), vec!["Condition", "WTC", "Age"]);
}

#[test]
fn test_dataframe_dimension_mismatch() {
    let err = DataFrame::from_columns(vec![
        ("x", Series::float(vec![1.0, 2.0])),
        ("y", Series::float(vec![1.0])),
    ])
    .unwrap_err();
    assert!(matches!(err, DataError::DimensionMismatch { .. }));
}

#[test]
fn test_rename_keeps_position() {
    let mut df = survey();
    df.rename_column("WTC", "willingness").unwrap();
    assert_eq!(df.column_names(), vec!["Condition", "willingness", "Age"]);

    let err = df.rename_column("Age", "Condition").unwrap_err();
    assert!(matches!(err, DataError::DuplicateColumn(_)));
}

#[test]
fn test_filter_levels() {
    let df = survey();
    let filtered = df.filter_levels("Condition", &["Control"]).unwrap();
    assert_eq!(filtered.n_rows(), 2);

    let err = df.filter_levels("Condition", &["Nope"]).unwrap_err();
    assert!(matches!(err, DataError::UnknownLevel { .. }));

    let err = df.filter_levels("WTC", &["Control"]).unwrap_err();
    assert!(matches!(err, DataError::TypeMismatch { .. }));
}

#[test]
fn test_complete_cases() {
    let df = survey();
    let rows = df.complete_cases(&["Condition", "WTC"]).unwrap();
    assert_eq!(rows, vec![0, 2, 3]);

    assert!(df.complete_cases(&["missing"]).is_err());
}

#[test]
fn test_cleaning_config_from_toml() {
    let config: CleaningConfig = toml::from_str(
        r#"
        drop_columns = ["Age"]
        require_complete = ["Condition", "willingness"]

        [rename]
        WTC = "willingness"

        [reference_levels]
        Condition = "Control"

        [[filters]]
        column = "Condition"
        keep = ["Control", "ClimateCrisis"]
        "#,
    )
    .unwrap();

    let cleaned = config.apply(&survey()).unwrap();
    assert_eq!(cleaned.column_names(), vec!["Condition", "willingness"]);
    assert_eq!(cleaned.n_rows(), 3);

    let condition = cleaned.column("Condition").unwrap();
    assert_eq!(condition.levels().unwrap()[0], "Control");
    assert_eq!(condition.label(1), Some("ClimateCrisis"));
}

#[test]
fn test_cleaning_config_unknown_column() {
    let config = CleaningConfig {
        drop_columns: vec!["Income".into()],
        ..Default::default()
    };
    let err = config.apply(&survey()).unwrap_err();
    assert!(matches!(err, DataError::ColumnNotFound(name) if name == "Income"));
}

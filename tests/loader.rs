mod common;

use std::sync::Arc;

use encoding_rs::UTF_8;

use common::{SAMPLE_CATALOG, SAMPLE_VALID_ROWS, TestWorkspace, fixture_path, sample_table};
use fragrance_analytics::{
    cache::TableCache,
    data::{Cell, NumberStyle},
    error::LoadError,
    loader::{DatasetLoader, LoadOptions, read_table, read_table_with_report},
    schema::DatasetSchema,
};

#[test]
fn sample_catalog_skips_rows_with_wrong_field_count() {
    let (table, report) =
        read_table_with_report(&fixture_path(SAMPLE_CATALOG), &LoadOptions::default())
            .expect("load sample");
    assert_eq!(table.len(), SAMPLE_VALID_ROWS);
    assert_eq!(report.rows_read, SAMPLE_VALID_ROWS + 2);
    assert_eq!(report.rows_skipped, 2);
}

#[test]
fn column_names_are_trimmed() {
    let table = sample_table();
    assert_eq!(table.column_index("Perfume"), Some(0));
    assert_eq!(table.column_index("Rating Value"), Some(4));
    assert_eq!(table.column_index(" Rating Value "), None);
}

#[test]
fn unparsable_numbers_become_missing_and_row_is_kept() {
    let table = sample_table();
    let schema = DatasetSchema::default();
    let mystery = table
        .records(&schema)
        .find(|record| record.name() == Some("mystery"))
        .expect("mystery row retained");
    assert_eq!(mystery.rating_value(), None);
    assert_eq!(mystery.rating_count(), None);
    assert_eq!(mystery.year(), None);
    assert_eq!(mystery.brand(), Some("zara"));
    assert_eq!(mystery.country(), Some("Spain"));
    assert_eq!(mystery.gender(), Some("unisex"));
}

#[test]
fn latin1_brand_is_decoded() {
    let table = sample_table();
    assert!(table.domain("Brand").contains(&"herm\u{e8}s".to_string()));
}

#[test]
fn loading_twice_is_deterministic() {
    assert_eq!(sample_table(), sample_table());
}

#[test]
fn missing_file_reports_not_found() {
    let workspace = TestWorkspace::new();
    let path = workspace.path().join("fra_cleaned.csv");
    let err = read_table(&path, &LoadOptions::default()).unwrap_err();
    assert!(matches!(err, LoadError::NotFound(ref p) if p == &path));
    assert_eq!(
        err.to_string(),
        format!("Dataset file '{}' not found.", path.display())
    );
}

#[test]
fn undecodable_bytes_are_malformed() {
    let workspace = TestWorkspace::new();
    let path = workspace.write_bytes("latin1.csv", b"Perfume;Brand\nterre;herm\xe8s\n");
    let options = LoadOptions {
        encoding: UTF_8,
        ..LoadOptions::default()
    };
    let err = read_table(&path, &options).unwrap_err();
    assert!(matches!(err, LoadError::Malformed(_)));
    assert!(err.to_string().contains("Decoding row 2"));
}

#[test]
fn decimal_comma_catalogs_parse_with_option() {
    let workspace = TestWorkspace::new();
    let path = workspace.write(
        "comma.csv",
        "Perfume;Brand;Rating Value\nbleu;chanel;4,1\nsauvage;dior;3.9\n",
    );
    let standard = read_table(&path, &LoadOptions::default()).expect("standard load");
    assert_eq!(standard.rows()[0].cell(2), &Cell::Missing);

    let options = LoadOptions {
        number_style: NumberStyle::DecimalComma,
        ..LoadOptions::default()
    };
    let comma = read_table(&path, &options).expect("comma load");
    assert_eq!(comma.rows()[0].cell(2), &Cell::Number(4.1));
    assert_eq!(comma.rows()[1].cell(2), &Cell::Number(3.9));
}

#[test]
fn custom_schema_controls_numeric_columns() {
    let workspace = TestWorkspace::new();
    let path = workspace.write("custom.csv", "Name;Maker;Score\nx;y;4.5\n");
    let options = LoadOptions {
        schema: DatasetSchema {
            name: "Name".to_string(),
            brand: "Maker".to_string(),
            rating_value: "Score".to_string(),
            ..DatasetSchema::default()
        },
        ..LoadOptions::default()
    };
    let table = read_table(&path, &options).expect("load");
    assert_eq!(table.rows()[0].cell(2), &Cell::Number(4.5));
}

#[test]
fn dataset_loader_serves_repeat_loads_from_cache() {
    let mut loader = DatasetLoader::new(LoadOptions::default());
    let first = loader.load(&fixture_path(SAMPLE_CATALOG)).expect("first");
    let second = loader.load(&fixture_path(SAMPLE_CATALOG)).expect("second");
    assert!(Arc::ptr_eq(&first, &second));
    assert_eq!(loader.cache().builds(), 1);
    assert_eq!(loader.cache().hits(), 1);
}

#[test]
fn dataset_loader_rebuilds_when_source_changes() {
    let workspace = TestWorkspace::new();
    let path = workspace.write("catalog.csv", "Perfume;Brand\na;b\n");
    let mut loader = DatasetLoader::with_cache(LoadOptions::default(), TableCache::new());
    let before = loader.load(&path).expect("first load");
    assert_eq!(before.len(), 1);

    workspace.write("catalog.csv", "Perfume;Brand\na;b\nc;d\n");
    let after = loader.load(&path).expect("second load");
    assert_eq!(after.len(), 2);
    assert_eq!(loader.cache().builds(), 2);
}

//! ワークブックからデータセットまでの一括処理テスト
//!
//! rust_xlsxwriter で生成したExcelを calamine で読み戻す

use pallet_dataset::config::Config;
use pallet_dataset::dataset::{Dataset, RunStats};
use pallet_dataset::pipeline;
use pallet_dataset::records::{columns, MergedRecord};
use pallet_dataset::sheet::CalamineWorkbook;
use rust_xlsxwriter::{Workbook, XlsxError};
use std::path::Path;
use tempfile::tempdir;

/// セル値
enum V<'a> {
    S(&'a str),
    N(f64),
    E,
}

fn write_sheet(workbook: &mut Workbook, name: &str, rows: &[Vec<V>]) -> Result<(), XlsxError> {
    let sheet = workbook.add_worksheet();
    sheet.set_name(name)?;
    for (r, row) in rows.iter().enumerate() {
        for (c, value) in row.iter().enumerate() {
            match value {
                V::S(s) => {
                    sheet.write_string(r as u32, c as u16, *s)?;
                }
                V::N(n) => {
                    sheet.write_number(r as u32, c as u16, *n)?;
                }
                V::E => {}
            }
        }
    }
    Ok(())
}

/// 3顧客×3配送先の発注と3件の集荷計画
fn write_sample_workbook(path: &Path) {
    use V::*;
    let mut workbook = Workbook::new();

    write_sheet(
        &mut workbook,
        "Pallet Order",
        &[
            vec![S("Client"), S("Delivery 1"), S("Delivery 2"), S("Delivery 3")],
            vec![S("Client A (+10°C)"), N(5.0), N(2.0), N(1.0)],
            vec![S("Client B"), N(3.0), N(0.0), N(2.0)],
            vec![S("Client C"), N(0.0), N(4.0), N(1.0)],
        ],
    )
    .unwrap();

    write_sheet(
        &mut workbook,
        "Collection Plan",
        &[
            vec![
                S("Load Number"),
                S("Collection Site"),
                S("Delivery Destination"),
                S("Pallets Ordered"),
                S("Pallet Type"),
                S("Trailer Type"),
                S("Trailer Fill %"),
                S("Driver"),
            ],
            vec![S("L001"), S("Site A"), S("Delivery 1"), N(5.0), S("Std"), S("Straight"), N(80.0), S("John Doe")],
            vec![S("L002"), S("Site B"), S("Delivery 2"), N(3.0), S("Euro"), S("Twin"), N(60.0), S("Jane Smith")],
            vec![S("L003"), S("Site C"), S("Delivery 3"), N(4.0), S("Std"), S("DD"), N(70.0), S("Bob Johnson")],
        ],
    )
    .unwrap();

    workbook.save(path).unwrap();
}

fn write_single_match_workbook(path: &Path) {
    use V::*;
    let mut workbook = Workbook::new();

    write_sheet(
        &mut workbook,
        "Pallet Order",
        &[
            vec![S("Client"), S("Delivery1")],
            vec![S("ClientA"), N(5.0)],
        ],
    )
    .unwrap();

    write_sheet(
        &mut workbook,
        "Collection Plan",
        &[
            vec![S("Load Number"), S("Collection Site"), S("Delivery Destination"), S("Pallets Ordered")],
            vec![S("L001"), S("S1"), S("Delivery1"), N(5.0)],
        ],
    )
    .unwrap();

    workbook.save(path).unwrap();
}

fn config_for(dir: &Path) -> Config {
    Config::default().with_paths(
        Some(dir.join("out").join("combined_dataset.csv")),
        Some(dir.join("out").join("processing_statistics.csv")),
    )
}

/// run → persist → 統計保存
fn build(root: &Path, config: &Config) -> RunStats {
    let mut dataset = Dataset::load(&config.dataset_path).unwrap();
    let stats = pipeline::run(root, config, &mut dataset).unwrap();
    dataset.persist().unwrap();
    stats.save(&config.report_path).unwrap();
    stats
}

#[test]
fn test_single_order_matches_single_delivery() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("Lyons collections 01012024.xlsx");
    write_single_match_workbook(&path);

    let extraction = pipeline::extract_file(&path, &Config::default()).unwrap();
    assert_eq!(extraction.merged.len(), 1);

    let record = &extraction.merged[0];
    assert!(matches!(record, MergedRecord::Matched { .. }));
    assert_eq!(record.value(columns::CLIENT_NAME).as_deref(), Some("ClientA"));
    assert_eq!(record.value("load_number").as_deref(), Some("L001"));
    assert_eq!(record.value(columns::DATE).as_deref(), Some("2024-01-01"));
}

#[test]
fn test_sample_workbook_extraction() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("Lyons collections 01012024.xlsx");
    write_sample_workbook(&path);

    let extraction = pipeline::extract_file(&path, &Config::default()).unwrap();
    assert_eq!(extraction.orders.len(), 7);
    assert_eq!(extraction.deliveries.len(), 3);
    // 照合1件 + 未照合の発注6件 + 単独の集荷2件
    assert_eq!(extraction.merged.len(), 9);

    let first = &extraction.merged[0];
    assert_eq!(first.value(columns::TEMPERATURE).as_deref(), Some("+10°C"));
    assert_eq!(first.value("load_number").as_deref(), Some("L001"));
    assert_eq!(first.value("trailer_fill").as_deref(), Some("80"));

    let client_b = extraction
        .orders
        .iter()
        .find(|o| o.client_name == "Client B")
        .unwrap();
    assert_eq!(client_b.temperature_code, "+3°C");
}

#[test]
fn test_build_then_skip_on_second_run() {
    let dir = tempdir().unwrap();
    let root = dir.path().join("reports");
    std::fs::create_dir_all(root.join("2024")).unwrap();
    write_sample_workbook(&root.join("2024").join("Lyons collections 01012024.xlsx"));
    let config = config_for(dir.path());

    let first = build(&root, &config);
    assert_eq!(first.files_processed, 1);
    assert_eq!(first.files_skipped, 0);
    assert_eq!(first.orders_extracted, 7);
    assert_eq!(first.deliveries_extracted, 3);
    assert_eq!(first.new_records, 9);

    let dataset = Dataset::load(&config.dataset_path).unwrap();
    assert_eq!(dataset.len(), 9);
    assert!(dataset.is_processed("Lyons collections 01012024.xlsx"));

    let second = build(&root, &config);
    assert_eq!(second.files_processed, 0);
    assert_eq!(second.files_skipped, 1);
    assert_eq!(second.new_records, 0);

    let dataset = Dataset::load(&config.dataset_path).unwrap();
    assert_eq!(dataset.len(), 9);
    assert_eq!(RunStats::load(&config.report_path).unwrap(), second);
}

#[test]
fn test_new_file_appends_and_grows_schema() {
    let dir = tempdir().unwrap();
    let root = dir.path().join("reports");
    std::fs::create_dir_all(&root).unwrap();
    write_single_match_workbook(&root.join("Lyons collections 01012024.xlsx"));
    let config = config_for(dir.path());

    build(&root, &config);
    let before = Dataset::load(&config.dataset_path).unwrap();
    assert_eq!(before.len(), 1);

    write_sample_workbook(&root.join("Lyons collections 02012024.xlsx"));
    let stats = build(&root, &config);
    assert_eq!(stats.files_processed, 1);
    assert_eq!(stats.files_skipped, 1);

    let after = Dataset::load(&config.dataset_path).unwrap();
    assert_eq!(after.len(), 10);
    assert!(after.columns().len() > before.columns().len());
    for column in before.columns() {
        assert!(after.columns().contains(column));
    }
}

#[test]
fn test_bad_files_are_counted_and_skipped() {
    let dir = tempdir().unwrap();
    let root = dir.path().join("reports");
    std::fs::create_dir_all(&root).unwrap();
    write_single_match_workbook(&root.join("Lyons collections 01012024.xlsx"));
    write_single_match_workbook(&root.join("Lyons collections latest.xlsx"));
    std::fs::write(root.join("Lyons collections 03012024.xlsx"), b"not a zip").unwrap();
    std::fs::write(root.join("~$Lyons collections 01012024.xlsx"), b"lock").unwrap();
    let config = config_for(dir.path());

    let stats = build(&root, &config);
    assert_eq!(stats.files_processed, 1);
    assert_eq!(stats.errors, 2);

    let dataset = Dataset::load(&config.dataset_path).unwrap();
    assert_eq!(dataset.processed_files().len(), 1);
}

#[test]
fn test_missing_sheet_yields_orders_only() {
    use V::*;
    let dir = tempdir().unwrap();
    let path = dir.path().join("Lyons collections 05022024.xlsx");

    let mut workbook = Workbook::new();
    write_sheet(
        &mut workbook,
        "Pallet Order",
        &[
            vec![S("Customer"), S("North"), E, S("South")],
            vec![S("Acme -18C"), N(2.0), N(9.0), S("n/a")],
        ],
    )
    .unwrap();
    workbook.save(&path).unwrap();

    let extraction = pipeline::extract_file(&path, &Config::default()).unwrap();
    assert!(extraction.deliveries.is_empty());
    assert_eq!(extraction.orders.len(), 1);
    assert_eq!(extraction.orders[0].delivery_name, "North");
    assert_eq!(extraction.orders[0].temperature_code, "-18°C");
}

#[test]
fn test_legacy_dataset_reprocesses_files() {
    let dir = tempdir().unwrap();
    let root = dir.path().join("reports");
    std::fs::create_dir_all(&root).unwrap();
    write_single_match_workbook(&root.join("Lyons collections 01012024.xlsx"));
    let config = config_for(dir.path());

    std::fs::create_dir_all(dir.path().join("out")).unwrap();
    std::fs::write(&config.dataset_path, "Date,Client_Name\n2023-12-31,Old Client\n").unwrap();

    let stats = build(&root, &config);
    assert_eq!(stats.files_processed, 1);

    let dataset = Dataset::load(&config.dataset_path).unwrap();
    assert_eq!(dataset.len(), 2);
    assert_eq!(dataset.columns()[0], "Date");
    assert_eq!(dataset.rows()[0].get(columns::CLIENT_NAME).map(String::as_str), Some("Old Client"));
}

/// 既定パスワードでのみ復号できる（中身は単一照合のワークブック）
fn decrypt_single_match(_path: &Path, password: &str) -> Result<Vec<u8>, String> {
    if password != "Test" {
        return Err("パスワード不一致".into());
    }
    let dir = tempdir().map_err(|e| e.to_string())?;
    let plain = dir.path().join("plain.xlsx");
    write_single_match_workbook(&plain);
    std::fs::read(&plain).map_err(|e| e.to_string())
}

#[test]
fn test_encrypted_workbook_read_with_fallback_password() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("Lyons collections 01012024.xlsx");
    // CFB シグネチャで始まる暗号化コンテナ
    let mut bytes = vec![0xD0, 0xCF, 0x11, 0xE0, 0xA1, 0xB1, 0x1A, 0xE1];
    bytes.extend_from_slice(&[0u8; 512]);
    std::fs::write(&path, bytes).unwrap();

    let config = Config::default();
    let date = chrono::NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();

    let mut workbook = CalamineWorkbook::open_with_decryptor(&path, decrypt_single_match).unwrap();
    let extraction = pipeline::extract_workbook(&mut workbook, "Lyons collections 01012024.xlsx", date, &config);
    assert_eq!(extraction.orders.len(), 1);
    assert_eq!(extraction.deliveries.len(), 1);
    assert_eq!(extraction.merged[0].value("load_number").as_deref(), Some("L001"));

    let wrong = Config {
        fallback_password: "other".into(),
        ..Config::default()
    };
    let mut workbook = CalamineWorkbook::open_with_decryptor(&path, decrypt_single_match).unwrap();
    let extraction = pipeline::extract_workbook(&mut workbook, "Lyons collections 01012024.xlsx", date, &wrong);
    assert!(extraction.merged.is_empty());
}

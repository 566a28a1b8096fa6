//! ファイル単位の処理と実行ループ
//!
//! ファイルごとの失敗はここで捕捉してスキップ＋集計に変換する。
//! 実行全体を止めるのは `DatasetError::is_fatal()` のエラーのみ。

use crate::config::Config;
use crate::dataset::{Dataset, RunStats};
use crate::error::{DatasetError, Result};
use crate::metadata::extract_date_from_filename;
use crate::reconciler::merge_orders_and_deliveries;
use crate::records::{DeliveryRecord, MergedRecord, OrderRecord, COLLECTION_PLAN_SHEET, PALLET_ORDER_SHEET};
use crate::scanner::{scan_reports, ReportPattern};
use crate::sheet::{
    extract_deliveries, extract_orders, read_sheet_or_empty, CalamineWorkbook, OrderSheetOptions,
    WorkbookSource,
};
use chrono::NaiveDate;
use serde_json::json;
use std::path::Path;
use tracing::{debug, info, warn};

/// 1ファイル分の抽出・照合結果
#[derive(Debug, Clone)]
pub struct FileExtraction {
    pub file_name: String,
    pub date: NaiveDate,
    pub orders: Vec<OrderRecord>,
    pub deliveries: Vec<DeliveryRecord>,
    pub merged: Vec<MergedRecord>,
}

impl FileExtraction {
    /// 診断表示用のJSON
    pub fn to_json(&self) -> serde_json::Value {
        let rows: Vec<serde_json::Map<String, serde_json::Value>> = self
            .merged
            .iter()
            .map(|record| {
                record
                    .to_columns()
                    .into_iter()
                    .map(|(k, v)| (k, serde_json::Value::String(v)))
                    .collect()
            })
            .collect();

        json!({
            "file": self.file_name,
            "date": self.date.format("%Y-%m-%d").to_string(),
            "orders": self.orders.len(),
            "deliveries": self.deliveries.len(),
            "records": rows,
        })
    }
}

/// パスからファイル名部分を取得
pub fn file_name_of(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_default()
}

/// 開いたワークブックから2シートを読み、照合まで行う
///
/// シートが読めない場合は空バッチとして続行する。
pub fn extract_workbook<S: WorkbookSource + ?Sized>(
    source: &mut S,
    file_name: &str,
    date: NaiveDate,
    config: &Config,
) -> FileExtraction {
    let options = OrderSheetOptions {
        max_columns: config.max_order_columns,
        default_temperature: config.default_temperature.clone(),
    };

    let order_grid = read_sheet_or_empty(source, PALLET_ORDER_SHEET, &config.fallback_password);
    let orders = extract_orders(&order_grid, date, file_name, &options);

    let plan_grid = read_sheet_or_empty(source, COLLECTION_PLAN_SHEET, &config.fallback_password);
    let deliveries = extract_deliveries(&plan_grid, date, file_name);

    let merged = merge_orders_and_deliveries(&orders, &deliveries);

    debug!(
        file = file_name,
        orders = orders.len(),
        deliveries = deliveries.len(),
        merged = merged.len(),
        "抽出完了"
    );

    FileExtraction {
        file_name: file_name.to_string(),
        date,
        orders,
        deliveries,
        merged,
    }
}

/// 1ファイルを処理
///
/// ファイル名に日付がなければ `NoDateInFilename`、開けなければ `WorkbookOpen`。
pub fn extract_file(path: &Path, config: &Config) -> Result<FileExtraction> {
    let file_name = file_name_of(path);
    let date = extract_date_from_filename(&file_name)
        .ok_or_else(|| DatasetError::NoDateInFilename(file_name.clone()))?;

    let mut workbook = CalamineWorkbook::open(path)?;
    Ok(extract_workbook(&mut workbook, &file_name, date, config))
}

/// ルート配下の全対象ファイルを処理してデータセットに追加
///
/// 永続化は呼び出し側で行う。
pub fn run(root: &Path, config: &Config, dataset: &mut Dataset) -> Result<RunStats> {
    if !root.is_dir() {
        return Err(DatasetError::FolderNotFound(root.display().to_string()));
    }
    dataset.ensure_writable()?;

    let pattern = ReportPattern::from_config(config);
    let files = scan_reports(root, &pattern);
    info!(root = %root.display(), files = files.len(), "対象ファイルを検出");

    let mut stats = RunStats::default();

    for (idx, path) in files.iter().enumerate() {
        let file_name = file_name_of(path);

        if dataset.is_processed(&file_name) {
            debug!(file = %file_name, "処理済みのためスキップ");
            stats.files_skipped += 1;
            continue;
        }

        match extract_file(path, config) {
            Ok(extraction) => {
                stats.orders_extracted += extraction.orders.len();
                stats.deliveries_extracted += extraction.deliveries.len();
                stats.new_records += dataset.append(&file_name, &extraction.merged);
                stats.files_processed += 1;

                info!(
                    index = idx + 1,
                    total = files.len(),
                    file = %file_name,
                    orders = extraction.orders.len(),
                    deliveries = extraction.deliveries.len(),
                    records = extraction.merged.len(),
                    "ファイルを処理"
                );
            }
            Err(e) if e.is_fatal() => return Err(e),
            Err(e) => {
                warn!(file = %file_name, error = %e, "ファイルをスキップ");
                stats.errors += 1;
            }
        }
    }

    Ok(stats)
}

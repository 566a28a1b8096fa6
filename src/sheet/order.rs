//! Pallet Order シートの抽出
//!
//! レイアウト:
//! - 先頭列: 顧客名（温度帯を含むことがある）
//! - ヘッダー行の2列目以降: 配送先ラベル
//! - 交点: パレット数

use super::grid::SheetGrid;
use super::header::find_header_row;
use crate::metadata::extract_temperature;
use crate::records::{OrderRecord, PALLET_ORDER_SHEET};
use chrono::NaiveDate;

/// 抽出時のパラメータ
#[derive(Debug, Clone)]
pub struct OrderSheetOptions {
    /// 先頭列を除いて読む最大列数
    pub max_columns: usize,
    pub default_temperature: String,
}

impl Default for OrderSheetOptions {
    fn default() -> Self {
        Self {
            max_columns: 25,
            default_temperature: crate::metadata::DEFAULT_TEMPERATURE.to_string(),
        }
    }
}

/// ヘッダー行から配送先ラベルを取得（列番号, ラベル）
fn delivery_headers(grid: &SheetGrid, header_row: usize, max_columns: usize) -> Vec<(usize, String)> {
    let last = grid.width().min(max_columns + 1);

    (1..last)
        .filter_map(|col| {
            let label = grid.cell(header_row, col).to_string();
            if label.is_empty() {
                None
            } else {
                Some((col, label))
            }
        })
        .collect()
}

/// Pallet Order シートから発注レコードを抽出
///
/// 入力に対する純関数。数量が空・0・負・非数値のセルは出力しない。
pub fn extract_orders(
    grid: &SheetGrid,
    date: NaiveDate,
    source_file: &str,
    options: &OrderSheetOptions,
) -> Vec<OrderRecord> {
    if grid.is_empty() {
        return Vec::new();
    }

    let header_row = find_header_row(grid);
    let headers = delivery_headers(grid, header_row, options.max_columns);

    let mut orders = Vec::new();

    for row in grid.rows().skip(header_row + 1) {
        let client_name = match row.first().and_then(|c| c.as_text()) {
            Some(name) => name.trim(),
            None => continue,
        };

        let temperature = extract_temperature(client_name, &options.default_temperature);

        for (col, delivery_name) in &headers {
            let pallet_count = match row.get(*col).and_then(|c| c.as_number()) {
                Some(n) if n > 0.0 => n,
                _ => continue,
            };

            orders.push(OrderRecord {
                date,
                client_name: client_name.to_string(),
                delivery_name: delivery_name.clone(),
                pallet_count,
                temperature_code: temperature.clone(),
                source_sheet: PALLET_ORDER_SHEET.to_string(),
                source_file: source_file.to_string(),
            });
        }
    }

    orders
}

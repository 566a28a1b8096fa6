//! Collection Plan シートの抽出
//!
//! 列の並び・名称はファイルごとに異なるため、ヘッダー文字列に対する
//! キーワード規則で既知フィールドへ対応付ける。

use super::grid::SheetGrid;
use super::header::find_header_row;
use crate::records::{DeliveryField, DeliveryRecord};
use chrono::NaiveDate;
use std::collections::HashMap;

/// ヘッダー文字列（小文字）がすべてのキーワードを含めば `field` に対応
#[derive(Debug, Clone, Copy)]
pub struct ColumnRule {
    pub keywords: &'static [&'static str],
    pub field: DeliveryField,
}

/// 評価順の規則表（列ごとに最初に一致した規則を採用）
pub const COLUMN_RULES: &[ColumnRule] = &[
    ColumnRule { keywords: &["load", "number"], field: DeliveryField::LoadNumber },
    ColumnRule { keywords: &["collection", "site"], field: DeliveryField::CollectionSite },
    ColumnRule { keywords: &["delivery", "destination"], field: DeliveryField::DeliveryDestination },
    ColumnRule { keywords: &["pallets", "ordered"], field: DeliveryField::PalletsOrdered },
    ColumnRule { keywords: &["pallet", "type"], field: DeliveryField::PalletType },
    ColumnRule { keywords: &["trailer", "type"], field: DeliveryField::TrailerType },
    ColumnRule { keywords: &["trailer", "fill"], field: DeliveryField::TrailerFill },
    ColumnRule { keywords: &["driver"], field: DeliveryField::Driver },
    ColumnRule { keywords: &["vehicle"], field: DeliveryField::Vehicle },
    ColumnRule { keywords: &["route"], field: DeliveryField::Route },
];

/// ヘッダー文字列に対応する既知フィールド
pub fn match_column(label: &str) -> Option<DeliveryField> {
    let lower = label.to_lowercase();
    COLUMN_RULES
        .iter()
        .find(|rule| rule.keywords.iter().all(|kw| lower.contains(kw)))
        .map(|rule| rule.field)
}

/// 列番号 → 既知フィールド / 未知列ラベル
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ColumnMapping {
    pub known: Vec<(usize, DeliveryField)>,
    pub extras: Vec<(usize, String)>,
}

impl ColumnMapping {
    pub fn column_for(&self, field: DeliveryField) -> Option<usize> {
        self.known.iter().find(|(_, f)| *f == field).map(|(c, _)| *c)
    }
}

/// ヘッダーラベルの正規化
///
/// 空ラベルは `column_<n>`（1起点）、重複ラベルは `label.1`, `label.2` ...
fn normalize_labels(raw: &[String]) -> Vec<String> {
    let mut seen: HashMap<String, usize> = HashMap::new();

    raw.iter()
        .enumerate()
        .map(|(idx, label)| {
            let base = if label.is_empty() {
                format!("column_{}", idx + 1)
            } else {
                label.clone()
            };
            let count = seen.entry(base.clone()).or_insert(0);
            let name = if *count == 0 {
                base
            } else {
                format!("{}.{}", base, count)
            };
            *count += 1;
            name
        })
        .collect()
}

/// 列の対応付け
///
/// 同じフィールドに複数列が一致した場合は後の列を採用し、
/// 外れた列は未知列として扱う。
pub fn build_column_mapping(labels: &[String]) -> ColumnMapping {
    let labels = normalize_labels(labels);

    let mut claimed: HashMap<DeliveryField, usize> = HashMap::new();
    for (col, label) in labels.iter().enumerate() {
        if let Some(field) = match_column(label) {
            claimed.insert(field, col);
        }
    }

    let mut known: Vec<(usize, DeliveryField)> = claimed.into_iter().map(|(f, c)| (c, f)).collect();
    known.sort_by_key(|(c, _)| *c);

    let extras = labels
        .into_iter()
        .enumerate()
        .filter(|(col, _)| !known.iter().any(|(c, _)| c == col))
        .collect();

    ColumnMapping { known, extras }
}

/// Collection Plan シートから集荷レコードを抽出
///
/// ヘッダー行より下で、空でないセルを1つ以上持つ行ごとに1レコード。
pub fn extract_deliveries(grid: &SheetGrid, date: NaiveDate, source_file: &str) -> Vec<DeliveryRecord> {
    if grid.is_empty() {
        return Vec::new();
    }

    let header_row = find_header_row(grid);
    let labels: Vec<String> = grid.row(header_row).iter().map(|c| c.to_string()).collect();
    let mapping = build_column_mapping(&labels);

    grid.rows()
        .skip(header_row + 1)
        .filter(|row| row.iter().any(|c| !c.is_empty()))
        .map(|row| {
            let mut delivery = DeliveryRecord::new(date, source_file);

            for (col, field) in &mapping.known {
                if let Some(cell) = row.get(*col) {
                    delivery.set(*field, cell.clone());
                }
            }
            for (col, label) in &mapping.extras {
                if let Some(cell) = row.get(*col) {
                    delivery.push_extra(label, cell.clone());
                }
            }

            delivery
        })
        .collect()
}

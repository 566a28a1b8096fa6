//! 発注と集荷計画の照合
//!
//! 同一ファイル内の `OrderRecord` と `DeliveryRecord` を配送先・パレット数で
//! 突き合わせ、`MergedRecord` を生成する。
//!
//! ## 照合規則
//! 1. (配送先, パレット数, 集荷拠点) の完全一致。発注側は拠点を持たないため
//!    拠点が空の集荷行のみ一致し得る
//! 2. 1で見つからなければ (配送先, パレット数) で先頭から線形探索
//! 3. 発注に使われなかった集荷行は、`load_number` が照合結果に現れない場合のみ単独で追加
//!
//! 1 で同じキーの集荷行が複数ある場合は集荷バッチ内で先のものを採用する（2 と同じ）。
//!
//! 3 は `load_number` で判定するため、1・2 の照合キーとは一致しない。
//! `load_number` のない集荷行は、`load_number` のない照合結果（未照合の発注など）が
//! 1件でもあれば追加されない。

use crate::records::{DeliveryRecord, MergedRecord, OrderRecord};
use std::collections::HashMap;

/// 完全一致検索のキー
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct MatchKey {
    destination: String,
    /// 数量のビット表現（-0.0 は 0.0 に正規化）
    quantity: u64,
    site: Option<String>,
}

impl MatchKey {
    fn new(destination: &str, quantity: f64, site: Option<String>) -> Self {
        Self {
            destination: destination.to_string(),
            quantity: (quantity + 0.0).to_bits(),
            site,
        }
    }
}

/// 発注1件に対する集荷行の探索
///
/// 一致した集荷行の添字を返す。同点の場合は集荷バッチ内で先のもの。
fn find_delivery(
    order: &OrderRecord,
    deliveries: &[DeliveryRecord],
    exact: &HashMap<MatchKey, usize>,
) -> Option<usize> {
    let key = MatchKey::new(&order.delivery_name, order.pallet_count, None);
    if let Some(&idx) = exact.get(&key) {
        return Some(idx);
    }

    deliveries.iter().position(|d| {
        d.destination().as_deref() == Some(order.delivery_name.as_str())
            && d.pallet_quantity() == Some(order.pallet_count)
    })
}

/// 発注と集荷を照合して1ファイル分の結果を生成
pub fn merge_orders_and_deliveries(
    orders: &[OrderRecord],
    deliveries: &[DeliveryRecord],
) -> Vec<MergedRecord> {
    let mut exact: HashMap<MatchKey, usize> = HashMap::new();
    for (idx, delivery) in deliveries.iter().enumerate() {
        if let (Some(destination), Some(quantity)) = (delivery.destination(), delivery.pallet_quantity()) {
            exact
                .entry(MatchKey::new(&destination, quantity, delivery.site()))
                .or_insert(idx);
        }
    }

    let mut merged: Vec<MergedRecord> = orders
        .iter()
        .map(|order| match find_delivery(order, deliveries, &exact) {
            Some(idx) => MergedRecord::Matched {
                order: order.clone(),
                delivery: deliveries[idx].clone(),
            },
            None => MergedRecord::Order(order.clone()),
        })
        .collect();

    for delivery in deliveries {
        let load_number = delivery.load_number.as_ref();
        if !merged.iter().any(|m| m.load_number() == load_number) {
            merged.push(MergedRecord::Delivery(delivery.clone()));
        }
    }

    merged
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::records::{columns, DeliveryField, PALLET_ORDER_SHEET};
    use crate::sheet::grid::Cell;
    use chrono::NaiveDate;

    fn date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 1, 1).unwrap()
    }

    fn order(client: &str, destination: &str, count: f64) -> OrderRecord {
        OrderRecord {
            date: date(),
            client_name: client.into(),
            delivery_name: destination.into(),
            pallet_count: count,
            temperature_code: "+3°C".into(),
            source_sheet: PALLET_ORDER_SHEET.into(),
            source_file: "f.xlsx".into(),
        }
    }

    fn delivery(load: &str, site: Option<&str>, destination: &str, count: f64) -> DeliveryRecord {
        let mut d = DeliveryRecord::new(date(), "f.xlsx");
        d.set(DeliveryField::LoadNumber, Cell::from(load));
        if let Some(site) = site {
            d.set(DeliveryField::CollectionSite, Cell::from(site));
        }
        d.set(DeliveryField::DeliveryDestination, Cell::from(destination));
        d.set(DeliveryField::PalletsOrdered, Cell::Number(count));
        d
    }

    #[test]
    fn test_single_match() {
        let orders = vec![order("ClientA", "Delivery1", 5.0)];
        let deliveries = vec![delivery("L001", Some("S1"), "Delivery1", 5.0)];

        let merged = merge_orders_and_deliveries(&orders, &deliveries);
        assert_eq!(merged.len(), 1);
        assert_eq!(merged[0].value(columns::CLIENT_NAME).as_deref(), Some("ClientA"));
        assert_eq!(merged[0].value("load_number").as_deref(), Some("L001"));
    }

    #[test]
    fn test_unmatched_order_untouched() {
        let orders = vec![order("ClientB", "Delivery9", 2.0)];
        let deliveries = vec![delivery("L001", Some("S1"), "Delivery1", 5.0)];

        let merged = merge_orders_and_deliveries(&orders, &deliveries);
        assert_eq!(merged.len(), 2);
        assert_eq!(merged[0], MergedRecord::Order(orders[0].clone()));
        assert_eq!(merged[1], MergedRecord::Delivery(deliveries[0].clone()));
    }

    #[test]
    fn test_quantity_mismatch_not_matched() {
        let orders = vec![order("ClientA", "Delivery1", 3.0)];
        let deliveries = vec![delivery("L001", None, "Delivery1", 5.0)];

        let merged = merge_orders_and_deliveries(&orders, &deliveries);
        assert!(matches!(merged[0], MergedRecord::Order(_)));
    }

    #[test]
    fn test_exact_lookup_prefers_siteless_delivery() {
        // 拠点のない集荷行は完全一致で優先される
        let orders = vec![order("ClientA", "Delivery1", 5.0)];
        let deliveries = vec![
            delivery("L001", Some("S1"), "Delivery1", 5.0),
            delivery("L002", None, "Delivery1", 5.0),
        ];

        let merged = merge_orders_and_deliveries(&orders, &deliveries);
        assert_eq!(merged[0].value("load_number").as_deref(), Some("L002"));
        // L001 は単独で追加される
        assert_eq!(merged.len(), 2);
        assert_eq!(merged[1].value("load_number").as_deref(), Some("L001"));
    }

    #[test]
    fn test_tie_break_earliest_delivery() {
        let orders = vec![order("ClientA", "Delivery1", 5.0)];
        let deliveries = vec![
            delivery("L001", Some("S1"), "Delivery1", 5.0),
            delivery("L002", Some("S2"), "Delivery1", 5.0),
        ];

        let merged = merge_orders_and_deliveries(&orders, &deliveries);
        assert_eq!(merged[0].value("load_number").as_deref(), Some("L001"));
    }

    #[test]
    fn test_exact_lookup_tie_break_earliest_siteless() {
        let orders = vec![order("ClientA", "Delivery1", 5.0)];
        let deliveries = vec![
            delivery("L001", None, "Delivery1", 5.0),
            delivery("L002", None, "Delivery1", 5.0),
        ];

        let merged = merge_orders_and_deliveries(&orders, &deliveries);
        assert_eq!(merged[0].value("load_number").as_deref(), Some("L001"));
        assert_eq!(merged[1].value("load_number").as_deref(), Some("L002"));
    }

    #[test]
    fn test_one_delivery_can_match_several_orders() {
        let orders = vec![order("ClientA", "Delivery1", 5.0), order("ClientB", "Delivery1", 5.0)];
        let deliveries = vec![delivery("L001", Some("S1"), "Delivery1", 5.0)];

        let merged = merge_orders_and_deliveries(&orders, &deliveries);
        assert_eq!(merged.len(), 2);
        assert!(merged.iter().all(|m| matches!(m, MergedRecord::Matched { .. })));
    }

    #[test]
    fn test_duplicate_load_numbers_collapse() {
        let deliveries = vec![
            delivery("L001", Some("S1"), "Delivery1", 5.0),
            delivery("L001", Some("S2"), "Delivery2", 3.0),
        ];

        let merged = merge_orders_and_deliveries(&[], &deliveries);
        assert_eq!(merged.len(), 1);
    }

    #[test]
    fn test_delivery_without_load_number_dropped_when_unmatched_order_exists() {
        let orders = vec![order("ClientA", "Nowhere", 1.0)];
        let mut no_load = DeliveryRecord::new(date(), "f.xlsx");
        no_load.set(DeliveryField::Driver, Cell::from("John"));

        let merged = merge_orders_and_deliveries(&orders, &[no_load.clone()]);
        assert_eq!(merged.len(), 1);

        let merged = merge_orders_and_deliveries(&[], &[no_load]);
        assert_eq!(merged.len(), 1);
    }

    #[test]
    fn test_numeric_text_quantity_matches() {
        let orders = vec![order("ClientA", "Delivery1", 4.0)];
        let mut d = DeliveryRecord::new(date(), "f.xlsx");
        d.set(DeliveryField::LoadNumber, Cell::from("L009"));
        d.set(DeliveryField::DeliveryDestination, Cell::from("Delivery1"));
        d.set(DeliveryField::PalletsOrdered, Cell::from("4"));

        let merged = merge_orders_and_deliveries(&orders, &[d]);
        assert_eq!(merged.len(), 1);
        assert_eq!(merged[0].value("load_number").as_deref(), Some("L009"));
    }
}

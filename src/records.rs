//! 抽出レコードのデータモデル
//!
//! - `OrderRecord`: Pallet Order シートの 顧客×配送先 の発注
//! - `DeliveryRecord`: Collection Plan シートの1行
//! - `MergedRecord`: 照合結果（発注＋集荷、または単独）

use crate::sheet::grid::{format_number, Cell};
use chrono::NaiveDate;

pub const PALLET_ORDER_SHEET: &str = "Pallet Order";
pub const COLLECTION_PLAN_SHEET: &str = "Collection Plan";

/// 永続化時の列名
pub mod columns {
    pub const DATE: &str = "Date";
    pub const CLIENT_NAME: &str = "Client_Name";
    pub const DELIVERY_NAME: &str = "Delivery_Name";
    pub const PALLETS_ORDERED: &str = "Pallets_Ordered";
    pub const TEMPERATURE: &str = "Temperature";
    pub const SOURCE_SHEET: &str = "Source_Sheet";
    pub const SOURCE_FILE: &str = "Source_File";
    /// 未知列の名前空間
    pub const EXTRA_PREFIX: &str = "extra_";
}

/// 1列分の値（列名, 文字列値）
pub type Column = (String, String);

fn format_date(date: &NaiveDate) -> String {
    date.format("%Y-%m-%d").to_string()
}

/// 顧客1件・配送先1件・1日分のパレット発注
#[derive(Debug, Clone, PartialEq)]
pub struct OrderRecord {
    pub date: NaiveDate,
    pub client_name: String,
    /// 数量が見つかった列のヘッダー文字列
    pub delivery_name: String,
    pub pallet_count: f64,
    pub temperature_code: String,
    pub source_sheet: String,
    pub source_file: String,
}

impl OrderRecord {
    pub fn columns(&self) -> Vec<Column> {
        vec![
            (columns::DATE.into(), format_date(&self.date)),
            (columns::CLIENT_NAME.into(), self.client_name.clone()),
            (columns::DELIVERY_NAME.into(), self.delivery_name.clone()),
            (columns::PALLETS_ORDERED.into(), format_number(self.pallet_count)),
            (columns::TEMPERATURE.into(), self.temperature_code.clone()),
            (columns::SOURCE_SHEET.into(), self.source_sheet.clone()),
            (columns::SOURCE_FILE.into(), self.source_file.clone()),
        ]
    }
}

/// Collection Plan の既知列
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DeliveryField {
    LoadNumber,
    CollectionSite,
    DeliveryDestination,
    PalletsOrdered,
    PalletType,
    TrailerType,
    TrailerFill,
    Driver,
    Vehicle,
    Route,
}

impl DeliveryField {
    pub const ALL: [DeliveryField; 10] = [
        DeliveryField::LoadNumber,
        DeliveryField::CollectionSite,
        DeliveryField::DeliveryDestination,
        DeliveryField::PalletsOrdered,
        DeliveryField::PalletType,
        DeliveryField::TrailerType,
        DeliveryField::TrailerFill,
        DeliveryField::Driver,
        DeliveryField::Vehicle,
        DeliveryField::Route,
    ];

    pub fn column_name(&self) -> &'static str {
        match self {
            DeliveryField::LoadNumber => "load_number",
            DeliveryField::CollectionSite => "collection_site",
            DeliveryField::DeliveryDestination => "delivery_destination",
            DeliveryField::PalletsOrdered => "pallets_ordered",
            DeliveryField::PalletType => "pallet_type",
            DeliveryField::TrailerType => "trailer_type",
            DeliveryField::TrailerFill => "trailer_fill",
            DeliveryField::Driver => "driver",
            DeliveryField::Vehicle => "vehicle",
            DeliveryField::Route => "route",
        }
    }
}

impl std::fmt::Display for DeliveryField {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.column_name())
    }
}

/// Collection Plan の1行
///
/// 既知列は固定フィールド、それ以外の列は `extras` に列順で保持する。
/// `extras` のキーは `extra_` で始まり既知列と衝突しない。
#[derive(Debug, Clone, PartialEq)]
pub struct DeliveryRecord {
    pub date: NaiveDate,
    pub source_sheet: String,
    pub source_file: String,

    pub load_number: Option<Cell>,
    pub collection_site: Option<Cell>,
    pub delivery_destination: Option<Cell>,
    pub pallets_ordered: Option<Cell>,
    pub pallet_type: Option<Cell>,
    pub trailer_type: Option<Cell>,
    pub trailer_fill: Option<Cell>,
    pub driver: Option<Cell>,
    pub vehicle: Option<Cell>,
    pub route: Option<Cell>,

    pub extras: Vec<(String, Cell)>,
}

impl DeliveryRecord {
    pub fn new(date: NaiveDate, source_file: impl Into<String>) -> Self {
        Self {
            date,
            source_sheet: COLLECTION_PLAN_SHEET.to_string(),
            source_file: source_file.into(),
            load_number: None,
            collection_site: None,
            delivery_destination: None,
            pallets_ordered: None,
            pallet_type: None,
            trailer_type: None,
            trailer_fill: None,
            driver: None,
            vehicle: None,
            route: None,
            extras: Vec::new(),
        }
    }

    fn slot_mut(&mut self, field: DeliveryField) -> &mut Option<Cell> {
        match field {
            DeliveryField::LoadNumber => &mut self.load_number,
            DeliveryField::CollectionSite => &mut self.collection_site,
            DeliveryField::DeliveryDestination => &mut self.delivery_destination,
            DeliveryField::PalletsOrdered => &mut self.pallets_ordered,
            DeliveryField::PalletType => &mut self.pallet_type,
            DeliveryField::TrailerType => &mut self.trailer_type,
            DeliveryField::TrailerFill => &mut self.trailer_fill,
            DeliveryField::Driver => &mut self.driver,
            DeliveryField::Vehicle => &mut self.vehicle,
            DeliveryField::Route => &mut self.route,
        }
    }

    pub fn get(&self, field: DeliveryField) -> Option<&Cell> {
        match field {
            DeliveryField::LoadNumber => self.load_number.as_ref(),
            DeliveryField::CollectionSite => self.collection_site.as_ref(),
            DeliveryField::DeliveryDestination => self.delivery_destination.as_ref(),
            DeliveryField::PalletsOrdered => self.pallets_ordered.as_ref(),
            DeliveryField::PalletType => self.pallet_type.as_ref(),
            DeliveryField::TrailerType => self.trailer_type.as_ref(),
            DeliveryField::TrailerFill => self.trailer_fill.as_ref(),
            DeliveryField::Driver => self.driver.as_ref(),
            DeliveryField::Vehicle => self.vehicle.as_ref(),
            DeliveryField::Route => self.route.as_ref(),
        }
    }

    /// 空セルは設定しない
    pub fn set(&mut self, field: DeliveryField, cell: Cell) {
        if !cell.is_empty() {
            *self.slot_mut(field) = Some(cell);
        }
    }

    /// 未知列を追加（キーに `extra_` を付与）
    pub fn push_extra(&mut self, label: &str, cell: Cell) {
        if !cell.is_empty() {
            self.extras
                .push((format!("{}{}", columns::EXTRA_PREFIX, label), cell));
        }
    }

    pub fn destination(&self) -> Option<String> {
        self.delivery_destination
            .as_ref()
            .map(|c| c.to_string())
            .filter(|s| !s.is_empty())
    }

    pub fn pallet_quantity(&self) -> Option<f64> {
        self.pallets_ordered.as_ref().and_then(Cell::as_number)
    }

    pub fn site(&self) -> Option<String> {
        self.collection_site
            .as_ref()
            .map(|c| c.to_string())
            .filter(|s| !s.is_empty())
    }

    pub fn columns(&self) -> Vec<Column> {
        let mut cols = vec![
            (columns::DATE.into(), format_date(&self.date)),
            (columns::SOURCE_SHEET.into(), self.source_sheet.clone()),
            (columns::SOURCE_FILE.into(), self.source_file.clone()),
        ];
        for field in DeliveryField::ALL {
            if let Some(cell) = self.get(field) {
                cols.push((field.column_name().into(), cell.to_string()));
            }
        }
        for (key, cell) in &self.extras {
            cols.push((key.clone(), cell.to_string()));
        }
        cols
    }
}

/// 照合結果
///
/// 照合パスで一度だけ生成され、以後変更しない。
#[derive(Debug, Clone, PartialEq)]
pub enum MergedRecord {
    Matched {
        order: OrderRecord,
        delivery: DeliveryRecord,
    },
    Order(OrderRecord),
    Delivery(DeliveryRecord),
}

impl MergedRecord {
    pub fn order(&self) -> Option<&OrderRecord> {
        match self {
            MergedRecord::Matched { order, .. } | MergedRecord::Order(order) => Some(order),
            MergedRecord::Delivery(_) => None,
        }
    }

    pub fn delivery(&self) -> Option<&DeliveryRecord> {
        match self {
            MergedRecord::Matched { delivery, .. } | MergedRecord::Delivery(delivery) => {
                Some(delivery)
            }
            MergedRecord::Order(_) => None,
        }
    }

    pub fn load_number(&self) -> Option<&Cell> {
        self.delivery().and_then(|d| d.load_number.as_ref())
    }

    /// 列名→値の並び
    ///
    /// 照合済みの場合は発注側の列を優先し、集荷側は発注側にない列のみ補う。
    pub fn to_columns(&self) -> Vec<Column> {
        match self {
            MergedRecord::Matched { order, delivery } => {
                let mut cols = order.columns();
                for (key, value) in delivery.columns() {
                    if !cols.iter().any(|(k, _)| *k == key) {
                        cols.push((key, value));
                    }
                }
                cols
            }
            MergedRecord::Order(order) => order.columns(),
            MergedRecord::Delivery(delivery) => delivery.columns(),
        }
    }

    /// 値の取得（列名指定）
    pub fn value(&self, column: &str) -> Option<String> {
        self.to_columns()
            .into_iter()
            .find(|(k, _)| k == column)
            .map(|(_, v)| v)
    }
}

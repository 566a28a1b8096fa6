//! シート解析モジュール
//!
//! ## 処理フロー
//! 1. ワークブックから名前付きシートを2次元グリッドとして読み込む
//! 2. キーワードでヘッダー行を特定
//! 3. Pallet Order → `OrderRecord`、Collection Plan → `DeliveryRecord`

pub mod collection;
pub mod grid;
pub mod header;
pub mod order;
pub mod reader;

pub use collection::{build_column_mapping, extract_deliveries, match_column, ColumnMapping, COLUMN_RULES};
pub use grid::{Cell, SheetGrid};
pub use header::{find_header_row, HEADER_KEYWORDS};
pub use order::{extract_orders, OrderSheetOptions};
pub use reader::{read_sheet_or_empty, CalamineWorkbook, WorkbookSource};

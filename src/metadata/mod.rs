//! ファイル名・ラベルからのメタデータ抽出

pub mod date;
pub mod temperature;

pub use date::extract_date_from_filename;
pub use temperature::{extract_temperature, DEFAULT_TEMPERATURE};

//! 処理統計

use crate::error::Result;
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::info;

/// 1回の実行の集計
///
/// 列の並びがそのまま `processing_statistics.csv` の列になる。
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RunStats {
    pub files_processed: usize,
    pub files_skipped: usize,
    pub orders_extracted: usize,
    pub deliveries_extracted: usize,
    pub errors: usize,
    pub new_records: usize,
}

impl RunStats {
    /// 1行のCSVとして保存（既存ファイルは上書き）
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }

        let mut writer = csv::Writer::from_path(path)?;
        writer.serialize(self)?;
        writer.flush()?;

        info!(path = %path.display(), "処理統計を保存");
        Ok(())
    }

    pub fn load(path: &Path) -> Result<Self> {
        let mut reader = csv::Reader::from_path(path)?;
        match reader.deserialize().next() {
            Some(row) => Ok(row?),
            None => Ok(Self::default()),
        }
    }

    pub fn log_summary(&self) {
        info!(
            files_processed = self.files_processed,
            files_skipped = self.files_skipped,
            orders = self.orders_extracted,
            deliveries = self.deliveries_extracted,
            errors = self.errors,
            new_records = self.new_records,
            "処理完了"
        );
    }
}

use crate::error::{DatasetError, Result};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Config {
    /// 対象ファイル名の接頭辞
    pub file_prefix: String,
    /// 対象拡張子（小文字）
    pub extensions: Vec<String>,
    /// 統合データセットの保存先
    pub dataset_path: PathBuf,
    /// 処理統計の保存先
    pub report_path: PathBuf,
    /// パスワード保護シートの再試行用パスワード
    pub fallback_password: String,
    /// 温度表記がない顧客の既定温度
    pub default_temperature: String,
    /// Pallet Order シートで読む最大列数（先頭列を除く）
    pub max_order_columns: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            file_prefix: "Lyons collections".into(),
            extensions: vec!["xlsx".into(), "xlsm".into()],
            dataset_path: PathBuf::from("combined_dataset.csv"),
            report_path: PathBuf::from("processing_statistics.csv"),
            fallback_password: "Test".into(),
            default_temperature: "+3°C".into(),
            max_order_columns: 25,
        }
    }
}

impl Config {
    pub fn load() -> Result<Self> {
        let config_path = Self::config_path()?;

        if config_path.exists() {
            let content = std::fs::read_to_string(&config_path)?;
            let config: Config = serde_json::from_str(&content)?;
            Ok(config)
        } else {
            Ok(Self::default())
        }
    }

    pub fn save(&self) -> Result<()> {
        let config_path = Self::config_path()?;

        if let Some(parent) = config_path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(&config_path, content)?;
        Ok(())
    }

    pub fn config_path() -> Result<PathBuf> {
        let home = dirs::home_dir()
            .ok_or_else(|| DatasetError::Config("ホームディレクトリが見つかりません".into()))?;
        Ok(home.join(".config").join("pallet-dataset").join("config.json"))
    }

    /// CLI引数で保存先を上書き
    pub fn with_paths(mut self, dataset: Option<PathBuf>, report: Option<PathBuf>) -> Self {
        if let Some(path) = dataset {
            self.dataset_path = path;
        }
        if let Some(path) = report {
            self.report_path = path;
        }
        self
    }
}

//! 日次レポートファイルの探索
//!
//! ルートフォルダ以下を再帰的に走査し、`<接頭辞>*.<拡張子>` に一致する
//! ファイルを辞書順で返す。

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// 探索対象のファイル名規約
#[derive(Debug, Clone)]
pub struct ReportPattern {
    pub prefix: String,
    pub extensions: Vec<String>,
}

impl ReportPattern {
    pub fn new(prefix: impl Into<String>, extensions: &[&str]) -> Self {
        Self {
            prefix: prefix.into(),
            extensions: extensions.iter().map(|e| e.to_lowercase()).collect(),
        }
    }

    pub fn from_config(config: &crate::config::Config) -> Self {
        Self {
            prefix: config.file_prefix.clone(),
            extensions: config.extensions.iter().map(|e| e.to_lowercase()).collect(),
        }
    }

    /// ファイル名が規約に一致するか
    pub fn matches(&self, file_name: &str) -> bool {
        // Officeのロックファイル
        if file_name.starts_with("~$") {
            return false;
        }
        if !file_name.starts_with(&self.prefix) {
            return false;
        }

        match Path::new(file_name).extension() {
            Some(ext) => {
                let ext = ext.to_string_lossy();
                self.extensions.iter().any(|e| e.eq_ignore_ascii_case(&ext))
            }
            None => false,
        }
    }
}

/// ルート以下の対象ファイルを列挙
///
/// ルートが存在しない・読めない場合はエラーではなく空を返す。
pub fn scan_reports(root: &Path, pattern: &ReportPattern) -> Vec<PathBuf> {
    if !root.is_dir() {
        return Vec::new();
    }

    let files: BTreeSet<PathBuf> = WalkDir::new(root)
        .follow_links(true)
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_file())
        .filter(|e| pattern.matches(&e.file_name().to_string_lossy()))
        .map(|e| e.into_path())
        .collect();

    files.into_iter().collect()
}

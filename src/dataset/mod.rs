//! 統合データセットの蓄積と永続化
//!
//! ライフサイクル: `load()` → `append()`（ファイルごと）→ `persist()`
//!
//! 処理済みファイルの判定は永続化済みの `Source_File` 列のみに基づく。
//! レコード単位の重複排除は行わない。

pub mod report;

pub use report::RunStats;

use crate::error::{DatasetError, Result};
use crate::records::{columns, MergedRecord};
use std::collections::{BTreeMap, HashSet};
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use tracing::{debug, info, warn};

/// 1行分（列名 → 値）。空値は保持しない。
pub type Row = BTreeMap<String, String>;

#[derive(Debug, Clone)]
pub struct Dataset {
    path: PathBuf,
    /// 初出順の列名。増えることはあっても減らない。
    columns: Vec<String>,
    rows: Vec<Row>,
    processed_files: HashSet<String>,
}

impl Dataset {
    /// 空のデータセット
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            columns: Vec::new(),
            rows: Vec::new(),
            processed_files: HashSet::new(),
        }
    }

    /// 既存データセットを読み込み
    ///
    /// ファイルがなければ空。`Source_File` 列のない旧形式では処理済み集合は空になる。
    pub fn load(path: &Path) -> Result<Self> {
        let mut dataset = Self::new(path);
        if !path.exists() {
            debug!(path = %path.display(), "既存データセットなし");
            return Ok(dataset);
        }

        let load_error = |e: csv::Error| DatasetError::DatasetLoad(format!("{}: {}", path.display(), e));

        let mut reader = csv::ReaderBuilder::new()
            .flexible(true)
            .from_path(path)
            .map_err(load_error)?;

        let headers: Vec<String> = reader
            .headers()
            .map_err(load_error)?
            .iter()
            .map(String::from)
            .collect();

        for record in reader.records() {
            let record = record.map_err(load_error)?;
            let row: Row = headers
                .iter()
                .zip(record.iter())
                .filter(|(_, value)| !value.is_empty())
                .map(|(key, value)| (key.clone(), value.to_string()))
                .collect();
            dataset.rows.push(row);
        }
        dataset.columns = headers;

        dataset.processed_files = dataset
            .rows
            .iter()
            .filter_map(|row| row.get(columns::SOURCE_FILE))
            .cloned()
            .collect();

        info!(
            path = %path.display(),
            records = dataset.rows.len(),
            files = dataset.processed_files.len(),
            "既存データセットを読み込み"
        );
        Ok(dataset)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn rows(&self) -> &[Row] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn processed_files(&self) -> &HashSet<String> {
        &self.processed_files
    }

    /// 処理済みファイルか（ファイル名で判定）
    pub fn is_processed(&self, file_name: &str) -> bool {
        self.processed_files.contains(file_name)
    }

    /// 1ファイル分の照合結果を追加し、ファイルを処理済みにする
    ///
    /// 追加した行数を返す。
    pub fn append(&mut self, file_name: &str, records: &[MergedRecord]) -> usize {
        for record in records {
            let mut row = Row::new();
            for (key, value) in record.to_columns() {
                if !self.columns.contains(&key) {
                    self.columns.push(key.clone());
                }
                if !value.is_empty() {
                    row.insert(key, value);
                }
            }
            self.rows.push(row);
        }

        self.processed_files.insert(file_name.to_string());
        records.len()
    }

    fn directory(&self) -> PathBuf {
        match self.path.parent() {
            Some(dir) if !dir.as_os_str().is_empty() => dir.to_path_buf(),
            _ => PathBuf::from("."),
        }
    }

    /// 保存先ディレクトリに書き込めるか確認
    pub fn ensure_writable(&self) -> Result<()> {
        let dir = self.directory();
        let not_writable = |e: std::io::Error| DatasetError::NotWritable(format!("{}: {}", dir.display(), e));

        std::fs::create_dir_all(&dir).map_err(not_writable)?;
        NamedTempFile::new_in(&dir).map_err(not_writable)?;
        Ok(())
    }

    /// データセット全体を書き出す
    ///
    /// 空行を除いた全行（既存＋新規）を一時ファイルに書き、保存先へリネームする。
    /// 書き出した行数を返す。
    pub fn persist(&self) -> Result<usize> {
        let rows: Vec<&Row> = self
            .rows
            .iter()
            .filter(|row| row.values().any(|v| !v.is_empty()))
            .collect();

        if rows.is_empty() {
            warn!("保存するデータがありません");
            return Ok(0);
        }

        let dir = self.directory();
        let mut tmp = NamedTempFile::new_in(&dir)
            .map_err(|e| DatasetError::NotWritable(format!("{}: {}", dir.display(), e)))?;

        {
            let mut writer = csv::Writer::from_writer(tmp.as_file_mut());
            writer.write_record(&self.columns)?;
            for row in &rows {
                writer.write_record(
                    self.columns
                        .iter()
                        .map(|c| row.get(c).map(String::as_str).unwrap_or("")),
                )?;
            }
            writer.flush()?;
        }
        tmp.as_file().sync_all()?;

        tmp.persist(&self.path).map_err(|e| DatasetError::Io(e.error))?;

        info!(
            path = %self.path.display(),
            records = rows.len(),
            columns = self.columns.len(),
            "データセットを保存"
        );
        Ok(rows.len())
    }
}

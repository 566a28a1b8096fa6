use thiserror::Error;

/// シート単位の読み込みエラー
///
/// いずれも致命的ではなく、シートリーダーで空バッチに変換される。
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SheetError {
    #[error("シートが見つかりません: {0}")]
    NotFound(String),

    #[error("パスワード保護されています: {0}")]
    PasswordProtected(String),

    #[error("シート読み込みエラー: {0}")]
    Unreadable(String),
}

#[derive(Error, Debug)]
pub enum DatasetError {
    #[error("設定エラー: {0}")]
    Config(String),

    #[error("フォルダが見つかりません: {0}")]
    FolderNotFound(String),

    #[error("ファイル名から日付を抽出できません: {0}")]
    NoDateInFilename(String),

    #[error("ワークブックを開けません: {0}")]
    WorkbookOpen(String),

    #[error("既存データセットの読み込みに失敗: {0}")]
    DatasetLoad(String),

    #[error("データセットの保存先に書き込めません: {0}")]
    NotWritable(String),

    #[error("入力エラー: {0}")]
    Prompt(String),

    #[error("CSVエラー: {0}")]
    Csv(#[from] csv::Error),

    #[error("JSON解析エラー: {0}")]
    JsonParse(#[from] serde_json::Error),

    #[error("IOエラー: {0}")]
    Io(#[from] std::io::Error),
}

impl DatasetError {
    /// 実行全体を中断すべきエラーか
    ///
    /// それ以外はファイル単位でスキップして集計に数える。
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            DatasetError::FolderNotFound(_)
                | DatasetError::NotWritable(_)
                | DatasetError::DatasetLoad(_)
                | DatasetError::Config(_)
        )
    }
}

pub type Result<T> = std::result::Result<T, DatasetError>;

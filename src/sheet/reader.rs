//! ワークブックからのシート読み込み

use super::grid::SheetGrid;
use crate::error::{DatasetError, Result, SheetError};
use calamine::{open_workbook_auto, open_workbook_auto_from_rs, Reader, Sheets};
use std::fs::File;
use std::io::{BufReader, Cursor, Read, Seek};
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// 名前付きシートを読み出せるワークブック
pub trait WorkbookSource {
    fn read_sheet(
        &mut self,
        name: &str,
        password: Option<&str>,
    ) -> std::result::Result<SheetGrid, SheetError>;
}

fn is_password_error(message: &str) -> bool {
    let lower = message.to_lowercase();
    lower.contains("password") || lower.contains("encrypt")
}

/// CFB（OLE複合文書）のシグネチャ
const CFB_MAGIC: [u8; 8] = [0xD0, 0xCF, 0x11, 0xE0, 0xA1, 0xB1, 0x1A, 0xE1];

/// 暗号化された xlsx/xlsm は zip ではなく CFB コンテナになる
fn is_encrypted_ooxml(path: &Path) -> bool {
    let is_ooxml = path
        .extension()
        .map(|e| {
            let e = e.to_string_lossy().to_lowercase();
            e == "xlsx" || e == "xlsm"
        })
        .unwrap_or(false);
    if !is_ooxml {
        return false;
    }

    let mut magic = [0u8; 8];
    File::open(path)
        .and_then(|mut f| f.read_exact(&mut magic))
        .map(|_| magic == CFB_MAGIC)
        .unwrap_or(false)
}

/// 暗号化ワークブックの復号関数（成功時は平文のバイト列）
pub type Decryptor = fn(&Path, &str) -> std::result::Result<Vec<u8>, String>;

fn decrypt_office_file(path: &Path, password: &str) -> std::result::Result<Vec<u8>, String> {
    office_crypto::decrypt_from_file(path, password).map_err(|e| format!("{:?}", e))
}

enum Contents {
    Plain(Sheets<BufReader<File>>),
    /// 未復号
    Encrypted,
    Decrypted(Sheets<Cursor<Vec<u8>>>),
}

fn read_range<RS: Read + Seek>(
    workbook: &mut Sheets<RS>,
    name: &str,
) -> std::result::Result<SheetGrid, SheetError> {
    if !workbook.sheet_names().iter().any(|n| n == name) {
        return Err(SheetError::NotFound(name.to_string()));
    }

    match workbook.worksheet_range(name) {
        Ok(range) => Ok(SheetGrid::from_range(&range)),
        Err(e) if is_password_error(&e.to_string()) => {
            Err(SheetError::PasswordProtected(name.to_string()))
        }
        Err(e) => Err(SheetError::Unreadable(format!("{}: {}", name, e))),
    }
}

/// calamine によるワークブック
///
/// 暗号化ファイルは開いた時点では未復号で保持し、パスワード付きの読み込みで
/// 一度だけ復号する。復号後はメモリ上のワークブックから読む。
pub struct CalamineWorkbook {
    path: PathBuf,
    contents: Contents,
    decryptor: Decryptor,
}

impl CalamineWorkbook {
    pub fn open(path: &Path) -> Result<Self> {
        Self::open_with_decryptor(path, decrypt_office_file)
    }

    pub fn open_with_decryptor(path: &Path, decryptor: Decryptor) -> Result<Self> {
        let contents = match open_workbook_auto(path) {
            Ok(workbook) => Contents::Plain(workbook),
            Err(e) if is_password_error(&e.to_string()) || is_encrypted_ooxml(path) => {
                debug!(path = %path.display(), "暗号化ワークブック");
                Contents::Encrypted
            }
            Err(e) => return Err(DatasetError::WorkbookOpen(format!("{}: {}", path.display(), e))),
        };

        Ok(Self {
            path: path.to_path_buf(),
            contents,
            decryptor,
        })
    }

    pub fn sheet_names(&self) -> Vec<String> {
        match &self.contents {
            Contents::Plain(wb) => wb.sheet_names(),
            Contents::Decrypted(wb) => wb.sheet_names(),
            Contents::Encrypted => Vec::new(),
        }
    }

    fn unlock(&mut self, name: &str, password: &str) -> std::result::Result<(), SheetError> {
        let bytes = (self.decryptor)(&self.path, password).map_err(|e| {
            debug!(path = %self.path.display(), error = %e, "復号に失敗");
            SheetError::PasswordProtected(name.to_string())
        })?;

        let workbook = open_workbook_auto_from_rs(Cursor::new(bytes))
            .map_err(|e| SheetError::Unreadable(format!("{}: {}", self.path.display(), e)))?;

        info!(path = %self.path.display(), "ワークブックを復号");
        self.contents = Contents::Decrypted(workbook);
        Ok(())
    }
}

impl WorkbookSource for CalamineWorkbook {
    fn read_sheet(
        &mut self,
        name: &str,
        password: Option<&str>,
    ) -> std::result::Result<SheetGrid, SheetError> {
        if let Contents::Encrypted = self.contents {
            match password {
                Some(password) => self.unlock(name, password)?,
                None => return Err(SheetError::PasswordProtected(name.to_string())),
            }
        }

        match &mut self.contents {
            Contents::Plain(wb) => read_range(wb, name),
            Contents::Decrypted(wb) => read_range(wb, name),
            Contents::Encrypted => Err(SheetError::PasswordProtected(name.to_string())),
        }
    }
}

/// シートを読み込み、失敗時は空グリッドを返す
///
/// パスワード保護の場合のみ `fallback_password` で一度だけ再試行する。
pub fn read_sheet_or_empty<S: WorkbookSource + ?Sized>(
    source: &mut S,
    name: &str,
    fallback_password: &str,
) -> SheetGrid {
    let first = match source.read_sheet(name, None) {
        Err(SheetError::PasswordProtected(_)) => {
            info!(sheet = name, "パスワード保護シート、既定パスワードで再試行");
            source.read_sheet(name, Some(fallback_password))
        }
        other => other,
    };

    match first {
        Ok(grid) => grid,
        Err(e) => {
            warn!(sheet = name, error = %e, "シートを読み込めないため空として扱う");
            SheetGrid::default()
        }
    }
}

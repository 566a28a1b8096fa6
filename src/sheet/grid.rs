//! シートの2次元セルグリッド

use calamine::{Data, Range};
use chrono::{Duration, NaiveDate};
use std::fmt;

/// 正規化済みのセル値
#[derive(Debug, Clone, PartialEq, Default)]
pub enum Cell {
    #[default]
    Empty,
    Number(f64),
    Bool(bool),
    Text(String),
}

static EMPTY_CELL: Cell = Cell::Empty;

impl Cell {
    pub fn is_empty(&self) -> bool {
        matches!(self, Cell::Empty)
    }

    /// 空白でない文字列セルのみ返す
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Cell::Text(s) if !s.trim().is_empty() => Some(s.as_str()),
            _ => None,
        }
    }

    /// 数値セル、または数値として読める文字列セル
    pub fn as_number(&self) -> Option<f64> {
        match self {
            Cell::Number(n) if n.is_finite() => Some(*n),
            Cell::Text(s) => s.trim().parse::<f64>().ok().filter(|n| n.is_finite()),
            _ => None,
        }
    }
}

impl fmt::Display for Cell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Cell::Empty => Ok(()),
            Cell::Number(n) => write!(f, "{}", format_number(*n)),
            Cell::Bool(b) => write!(f, "{}", if *b { "TRUE" } else { "FALSE" }),
            Cell::Text(s) => write!(f, "{}", s.trim()),
        }
    }
}

impl From<&str> for Cell {
    fn from(s: &str) -> Self {
        if s.trim().is_empty() {
            Cell::Empty
        } else {
            Cell::Text(s.to_string())
        }
    }
}

impl From<f64> for Cell {
    fn from(n: f64) -> Self {
        Cell::Number(n)
    }
}

impl From<&Data> for Cell {
    fn from(data: &Data) -> Self {
        match data {
            Data::Int(i) => Cell::Number(*i as f64),
            Data::Float(f) => Cell::Number(*f),
            Data::String(s) => Cell::from(s.as_str()),
            Data::Bool(b) => Cell::Bool(*b),
            Data::DateTime(dt) => Cell::Text(excel_serial_to_string(dt.as_f64())),
            Data::DateTimeIso(s) | Data::DurationIso(s) => Cell::from(s.as_str()),
            Data::Error(_) | Data::Empty => Cell::Empty,
        }
    }
}

/// 整数値は小数点なしで表記
pub fn format_number(n: f64) -> String {
    if n.fract() == 0.0 && n.abs() < 1e15 {
        format!("{}", n as i64)
    } else {
        format!("{}", n)
    }
}

/// Excel 日付シリアル値を `YYYY-MM-DD` に変換
///
/// Excel の日付は 1899-12-30 起点（1900年閏年バグのため）。
fn excel_serial_to_string(serial: f64) -> String {
    let date = NaiveDate::from_ymd_opt(1899, 12, 30)
        .zip(Duration::try_days(serial.trunc() as i64))
        .and_then(|(base, days)| base.checked_add_signed(days));

    match date {
        Some(d) => d.format("%Y-%m-%d").to_string(),
        None => format_number(serial),
    }
}

/// 先頭行をヘッダーとみなさない生のセルグリッド
///
/// 全行が同じ幅になるよう右側を空セルで埋める。
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SheetGrid {
    rows: Vec<Vec<Cell>>,
    width: usize,
}

impl SheetGrid {
    pub fn from_rows(mut rows: Vec<Vec<Cell>>) -> Self {
        let width = rows.iter().map(|r| r.len()).max().unwrap_or(0);
        for row in &mut rows {
            row.resize(width, Cell::Empty);
        }
        Self { rows, width }
    }

    /// calamine のレンジから生成
    ///
    /// レンジは最初の非空セルから始まるため、シート座標（A1起点）に戻す。
    pub fn from_range(range: &Range<Data>) -> Self {
        let (row_offset, col_offset) = range
            .start()
            .map(|(r, c)| (r as usize, c as usize))
            .unwrap_or((0, 0));

        let mut rows = vec![Vec::new(); row_offset];
        for row in range.rows() {
            let mut cells = vec![Cell::Empty; col_offset];
            cells.extend(row.iter().map(Cell::from));
            rows.push(cells);
        }

        Self::from_rows(rows)
    }

    pub fn height(&self) -> usize {
        self.rows.len()
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn is_empty(&self) -> bool {
        self.rows.iter().all(|r| r.iter().all(Cell::is_empty))
    }

    pub fn row(&self, idx: usize) -> &[Cell] {
        self.rows.get(idx).map(|r| r.as_slice()).unwrap_or(&[])
    }

    /// 範囲外は空セル
    pub fn cell(&self, row: usize, col: usize) -> &Cell {
        self.rows
            .get(row)
            .and_then(|r| r.get(col))
            .unwrap_or(&EMPTY_CELL)
    }

    pub fn rows(&self) -> impl Iterator<Item = &[Cell]> {
        self.rows.iter().map(|r| r.as_slice())
    }
}

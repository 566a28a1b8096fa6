//! ファイル名からの日付抽出

use chrono::NaiveDate;
use regex::Regex;

/// ファイル名に含まれる日付を抽出
///
/// 優先順に DDMMYYYY → DDMMYY → DD-MM-YY(YY) を試し、
/// 暦として正しい日付になった最初のパターンを採用する。
/// 各パターンは最初の一致箇所のみ評価する。
pub fn extract_date_from_filename(file_name: &str) -> Option<NaiveDate> {
    lazy_static::lazy_static! {
        static ref PATTERNS: Vec<Regex> = vec![
            // DDMMYYYY
            Regex::new(r"(\d{2})(\d{2})(\d{4})").unwrap(),
            // DDMMYY
            Regex::new(r"(\d{2})(\d{2})(\d{2})").unwrap(),
            // DD-MM-YY / DD_MM_YYYY
            Regex::new(r"(\d{1,2})[-_](\d{1,2})[-_](\d{2,4})").unwrap(),
        ];
    }

    PATTERNS.iter().find_map(|re| {
        let caps = re.captures(file_name)?;
        let year = match caps[3].len() {
            2 => format!("20{}", &caps[3]),
            4 => caps[3].to_string(),
            _ => return None,
        };
        let day: u32 = caps[1].parse().ok()?;
        let month: u32 = caps[2].parse().ok()?;
        let year: i32 = year.parse().ok()?;

        NaiveDate::from_ymd_opt(year, month, day)
    })
}

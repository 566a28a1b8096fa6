//! 顧客名からの温度帯抽出

use regex::Regex;
use tracing::debug;

/// 温度表記がない場合の既定値
pub const DEFAULT_TEMPERATURE: &str = "+3°C";

/// テキストから温度帯を抽出し `+N°C` / `-N°C` 形式に正規化
///
/// 見つからない・空文字の場合は `default` を返す。
pub fn extract_temperature(text: &str, default: &str) -> String {
    lazy_static::lazy_static! {
        // 緩いパターンほど後ろ
        static ref PATTERNS: Vec<Regex> = vec![
            // (+10°C)
            Regex::new(r"(?i)\(([+-])(\d+)°C\)").unwrap(),
            // +10°C
            Regex::new(r"(?i)([+-])(\d+)°C").unwrap(),
            // 10°C
            Regex::new(r"(?i)()(\d+)°C").unwrap(),
            // 10C
            Regex::new(r"(?i)([+-]?)(\d+)C").unwrap(),
        ];
    }

    if text.trim().is_empty() {
        return default.to_string();
    }

    for re in PATTERNS.iter() {
        if let Some(caps) = re.captures(text) {
            let sign = match caps.get(1).map(|m| m.as_str()) {
                Some("-") => "-",
                _ => "+",
            };
            return format!("{}{}°C", sign, &caps[2]);
        }
    }

    debug!(text, default, "温度表記なし、既定値を使用");
    default.to_string()
}

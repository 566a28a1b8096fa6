use super::grid::SheetGrid;

/// ヘッダー行と判定するキーワード
pub const HEADER_KEYWORDS: &[&str] = &["client", "customer", "delivery", "pallet", "load", "collection"];

/// ヘッダー行を探す
///
/// 上から順に、セル文字列を連結して小文字化した内容がキーワードを含む最初の行。
/// 見つからなければ 0 行目。
pub fn find_header_row(grid: &SheetGrid) -> usize {
    grid.rows()
        .position(|row| {
            let joined = row
                .iter()
                .filter(|c| !c.is_empty())
                .map(|c| c.to_string().to_lowercase())
                .collect::<Vec<_>>()
                .join(" ");
            HEADER_KEYWORDS.iter().any(|kw| joined.contains(kw))
        })
        .unwrap_or(0)
}

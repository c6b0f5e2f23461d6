//! Interpretation of period keys.
//!
//! Trend buckets are keyed and ordered by the raw period text. These helpers
//! only tell callers what a key means as a date and whether string order is
//! also chronological order; they never change how trends are sorted.

use chrono::NaiveDate;

/// Reads the first day covered by a period key.
///
/// Accepts `YYYY-MM-DD`, `YYYY/MM/DD`, `YYYY-MM`, `YYYY/MM` and `YYYYMM`.
pub fn parse_period_start(key: &str) -> Option<NaiveDate> {
    let key = key.trim();

    for format in ["%Y-%m-%d", "%Y/%m/%d"] {
        if let Ok(date) = NaiveDate::parse_from_str(key, format) {
            return Some(date);
        }
    }

    let month_key = if key.len() == 6 && key.chars().all(|c| c.is_ascii_digit()) {
        format!("{}-{}-01", &key[..4], &key[4..])
    } else {
        format!("{}-01", key.replace('/', "-"))
    };

    NaiveDate::parse_from_str(&month_key, "%Y-%m-%d").ok()
}

/// True for zero-padded ISO keys (`YYYY-MM` or `YYYY-MM-DD`), whose string
/// order matches calendar order.
pub fn is_sortable_key(key: &str) -> bool {
    let bytes = key.as_bytes();
    let digits = |range: std::ops::Range<usize>| bytes[range].iter().all(u8::is_ascii_digit);

    match bytes.len() {
        7 => digits(0..4) && bytes[4] == b'-' && digits(5..7),
        10 => digits(0..4) && bytes[4] == b'-' && digits(5..7) && bytes[7] == b'-' && digits(8..10),
        _ => false,
    }
}

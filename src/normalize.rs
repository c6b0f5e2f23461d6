use serde_json::Value;

/// Converts a spreadsheet cell into a float.
///
/// Numbers pass through. Strings are trimmed; a string containing `%` is read
/// as a percentage and divided by 100, anything else has currency symbols
/// (`¥`, `￥`, `$`), thousands separators and whitespace stripped first.
/// Anything unparseable becomes `0.0`.
pub fn normalize(value: &Value) -> f64 {
    match value {
        Value::Number(n) => n.as_f64().unwrap_or(0.0),
        Value::String(s) => parse_clean_number(s),
        _ => 0.0,
    }
}

/// Same as [`normalize`] for a value that may not have been resolved at all.
pub fn normalize_opt(value: Option<&Value>) -> f64 {
    value.map(normalize).unwrap_or(0.0)
}

pub fn parse_clean_number(raw: &str) -> f64 {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return 0.0;
    }

    if trimmed.contains('%') {
        return leading_float(&trimmed.replace('%', "")).map_or(0.0, |n| n / 100.0);
    }

    let cleaned: String = trimmed
        .chars()
        .filter(|c| !matches!(c, '¥' | '￥' | '$' | ',') && !c.is_whitespace())
        .collect();

    leading_float(&cleaned).unwrap_or(0.0)
}

/// Parses the longest numeric prefix of `s`, so "12.5abc" reads as 12.5.
fn leading_float(s: &str) -> Option<f64> {
    let s = s.trim_start();
    let bytes = s.as_bytes();
    let mut end = 0;
    let mut seen_digit = false;
    let mut seen_dot = false;
    let mut seen_exp = false;

    while end < bytes.len() {
        let b = bytes[end];
        match b {
            b'0'..=b'9' => seen_digit = true,
            b'+' | b'-' if end == 0 => {}
            b'+' | b'-' if seen_exp && matches!(bytes[end - 1], b'e' | b'E') => {}
            b'.' if !seen_dot && !seen_exp => seen_dot = true,
            b'e' | b'E' if seen_digit && !seen_exp => seen_exp = true,
            _ => break,
        }
        end += 1;
    }

    // Back off a dangling exponent marker or sign ("1e", "1e-").
    let mut candidate = &s[..end];
    while !candidate.is_empty() {
        if let Ok(n) = candidate.parse::<f64>() {
            return n.is_finite().then_some(n);
        }
        candidate = &candidate[..candidate.len() - 1];
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn approx(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn test_currency_and_separators() {
        assert!(approx(normalize(&json!("¥229.12")), 229.12));
        assert!(approx(normalize(&json!("￥1,024.50")), 1024.5));
        assert!(approx(normalize(&json!("$ 100")), 100.0));
        assert!(approx(normalize(&json!("1,200")), 1200.0));
    }

    #[test]
    fn test_percentages() {
        assert!(approx(normalize(&json!("16.67%")), 0.1667));
        assert!(approx(normalize(&json!(" 20 % ")), 0.2));
        assert_eq!(normalize(&json!("%")), 0.0);
    }

    #[test]
    fn test_degrades_to_zero() {
        assert_eq!(normalize(&json!("")), 0.0);
        assert_eq!(normalize(&json!("   ")), 0.0);
        assert_eq!(normalize(&json!("garbage")), 0.0);
        assert_eq!(normalize(&Value::Null), 0.0);
        assert_eq!(normalize(&json!([1, 2])), 0.0);
        assert_eq!(normalize_opt(None), 0.0);
    }

    #[test]
    fn test_numbers_pass_through() {
        assert_eq!(normalize(&json!(42)), 42.0);
        assert!(approx(normalize(&json!(0.35)), 0.35));
    }

    #[test]
    fn test_leading_numeric_prefix() {
        assert!(approx(parse_clean_number("12.5abc"), 12.5));
        assert!(approx(parse_clean_number("-3"), -3.0));
        assert!(approx(parse_clean_number("1e3"), 1000.0));
        assert!(approx(parse_clean_number("7e"), 7.0));
    }
}

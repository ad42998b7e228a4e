//! Display formatting for presenter values.
//!
//! Every helper that takes an `Option` renders `None` as [`NA`], so a metric
//! the backend did not compute never shows up as zero.

/// Placeholder for values the backend did not compute.
pub const NA: &str = "N/A";

/// Format an integer with comma separators for readability.
pub fn format_number(n: u64) -> String {
    group_digits(&n.to_string())
}

/// Insert a comma every three digits, counting from the right.
fn group_digits(digits: &str) -> String {
    let mut result = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().rev().enumerate() {
        if i > 0 && i % 3 == 0 {
            result.push(',');
        }
        result.push(ch);
    }
    result.chars().rev().collect()
}

/// Format a float with comma separators and a fixed number of decimals.
pub fn format_grouped(value: f64, decimals: usize) -> String {
    let fixed = format!("{:.*}", decimals, value.abs());
    let (int_part, frac_part) = match fixed.split_once('.') {
        Some((i, f)) => (i, Some(f)),
        None => (fixed.as_str(), None),
    };
    let grouped = group_digits(int_part);
    let sign = if value < 0.0 && fixed.chars().any(|c| c.is_ascii_digit() && c != '0') {
        "-"
    } else {
        ""
    };
    match frac_part {
        Some(frac) => format!("{sign}{grouped}.{frac}"),
        None => format!("{sign}{grouped}"),
    }
}

/// `1234.5` → `$1,234.50`, `-12` → `-$12.00`.
pub fn format_currency(value: Option<f64>) -> String {
    match value {
        None => NA.to_string(),
        Some(v) => {
            let grouped = format_grouped(v, 2);
            match grouped.strip_prefix('-') {
                Some(rest) => format!("-${rest}"),
                None => format!("${grouped}"),
            }
        }
    }
}

/// `Some(1200.04)` → `1200.0 kg`.
pub fn format_weight(value: Option<f64>) -> String {
    match value {
        None => NA.to_string(),
        Some(v) => format!("{v:.1} kg"),
    }
}

/// Like [`format_weight`] but with an explicit `+` for non-negative values.
pub fn format_signed_weight(value: Option<f64>) -> String {
    match value {
        None => NA.to_string(),
        Some(v) => format!("{}{v:.1} kg", sign_prefix(v)),
    }
}

/// `Some(27.456)` with 2 decimals → `27.46%`.
pub fn format_percent(value: Option<f64>, decimals: usize) -> String {
    match value {
        None => NA.to_string(),
        Some(v) => format!("{v:.decimals$}%"),
    }
}

/// Percentage with an explicit `+` for positive values.
pub fn format_signed_percent(value: Option<f64>, decimals: usize) -> String {
    match value {
        None => NA.to_string(),
        Some(v) => format!("{}{v:.decimals$}%", sign_prefix(v)),
    }
}

/// A `0..=1` ratio shown as a percentage: `0.712` → `71.2%`.
pub fn format_ratio(value: Option<f64>) -> String {
    format_percent(value.map(|v| v * 100.0), 1)
}

/// Plain number with fixed decimals.
pub fn format_decimal(value: Option<f64>, decimals: usize) -> String {
    match value {
        None => NA.to_string(),
        Some(v) => format!("{v:.decimals$}"),
    }
}

/// Integer count with separators.
pub fn format_count(value: Option<u64>) -> String {
    value.map_or_else(|| NA.to_string(), format_number)
}

/// Signed integer difference: `+2`, `-1`, `0`.
pub fn format_signed_count(value: Option<i64>) -> String {
    match value {
        None => NA.to_string(),
        Some(v) if v > 0 => format!("+{v}"),
        Some(v) => v.to_string(),
    }
}

/// Solver runtime: milliseconds under a second, seconds under a minute,
/// otherwise minutes and seconds.
pub fn format_runtime(seconds: Option<f64>) -> String {
    let Some(s) = seconds else {
        return NA.to_string();
    };
    if s < 1.0 {
        format!("{:.0} ms", s * 1000.0)
    } else if s < 60.0 {
        format!("{s:.2}s")
    } else {
        let minutes = (s / 60.0).floor();
        let secs = s - minutes * 60.0;
        format!("{minutes:.0}m {secs:.0}s")
    }
}

fn sign_prefix(v: f64) -> &'static str {
    if v >= 0.0 { "+" } else { "" }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_number() {
        assert_eq!(format_number(0), "0");
        assert_eq!(format_number(999), "999");
        assert_eq!(format_number(1000), "1,000");
        assert_eq!(format_number(1234567), "1,234,567");
    }

    #[test]
    fn test_format_currency() {
        assert_eq!(format_currency(None), "N/A");
        assert_eq!(format_currency(Some(0.0)), "$0.00");
        assert_eq!(format_currency(Some(1234.5)), "$1,234.50");
        assert_eq!(format_currency(Some(-98765.432)), "-$98,765.43");
    }

    #[test]
    fn test_format_grouped_beyond_u64() {
        assert_eq!(
            format_currency(Some(2.5e19)),
            "$25,000,000,000,000,000,000.00"
        );
        assert_eq!(format_grouped(-3.0e20, 0), "-300,000,000,000,000,000,000");
    }

    #[test]
    fn test_format_grouped_negative_rounding_to_zero() {
        assert_eq!(format_grouped(-0.001, 2), "0.00");
        assert_eq!(format_grouped(-1500.0, 0), "-1,500");
    }

    #[test]
    fn test_missing_values_render_na() {
        assert_eq!(format_weight(None), "N/A");
        assert_eq!(format_signed_weight(None), "N/A");
        assert_eq!(format_percent(None, 2), "N/A");
        assert_eq!(format_ratio(None), "N/A");
        assert_eq!(format_count(None), "N/A");
        assert_eq!(format_signed_count(None), "N/A");
        assert_eq!(format_runtime(None), "N/A");
    }

    #[test]
    fn test_zero_is_not_na() {
        assert_eq!(format_weight(Some(0.0)), "0.0 kg");
        assert_eq!(format_count(Some(0)), "0");
    }

    #[test]
    fn test_signed_values() {
        assert_eq!(format_signed_weight(Some(12.34)), "+12.3 kg");
        assert_eq!(format_signed_weight(Some(-5.0)), "-5.0 kg");
        assert_eq!(format_signed_percent(Some(1.5), 2), "+1.50%");
        assert_eq!(format_signed_count(Some(2)), "+2");
        assert_eq!(format_signed_count(Some(-1)), "-1");
        assert_eq!(format_signed_count(Some(0)), "0");
    }

    #[test]
    fn test_format_runtime() {
        assert_eq!(format_runtime(Some(0.25)), "250 ms");
        assert_eq!(format_runtime(Some(12.345)), "12.35s");
        assert_eq!(format_runtime(Some(125.0)), "2m 5s");
    }

    #[test]
    fn test_format_ratio() {
        assert_eq!(format_ratio(Some(0.712)), "71.2%");
    }
}

use chrono::{Datelike, NaiveDate};

/// Short month names, indexed by `month0`.
pub const MONTHS: [&str; 12] = [
    "Jan", "Feb", "Mar", "Apr", "May", "Jun", "Jul", "Aug", "Sep", "Oct", "Nov", "Dec",
];

/// Format a floating-point number with thousands separators and a fixed number
/// of decimal places.
///
/// # Examples
///
/// ```
/// use energy_core::formatting::format_number;
///
/// assert_eq!(format_number(1234.5,  1), "1,234.5");
/// assert_eq!(format_number(1234567.0, 0), "1,234,567");
/// assert_eq!(format_number(0.0, 2), "0.00");
/// assert_eq!(format_number(-9876.5, 1), "-9,876.5");
/// ```
pub fn format_number(value: f64, decimals: u32) -> String {
    let negative = value < 0.0;
    let abs_value = value.abs();

    // Nudge by half an ULP at the target precision so exact decimal
    // midpoints such as 1.005 round up.
    let factor = 10_f64.powi(decimals as i32);
    let epsilon = f64::EPSILON * abs_value * factor;
    let rounded = ((abs_value * factor) + epsilon).round() / factor;

    let integer_part = rounded.trunc() as u64;
    let frac_part = rounded - rounded.trunc();

    let grouped = group_thousands(&integer_part.to_string());

    let result = if decimals == 0 {
        grouped
    } else {
        let frac_str = format!("{:.prec$}", frac_part, prec = decimals as usize);
        // `frac_str` looks like "0.50"; keep ".50".
        format!("{}{}", grouped, &frac_str[1..])
    };

    if negative {
        format!("-{}", result)
    } else {
        result
    }
}

/// Format an amount in pounds with two decimal places and thousands
/// separators.
///
/// # Examples
///
/// ```
/// use energy_core::formatting::format_currency;
///
/// assert_eq!(format_currency(1234.56), "£1,234.56");
/// assert_eq!(format_currency(-9.99),   "£-9.99");
/// ```
pub fn format_currency(amount: f64) -> String {
    if amount < 0.0 {
        format!("£-{}", format_number(amount.abs(), 2))
    } else {
        format!("£{}", format_number(amount, 2))
    }
}

/// Label a month-start date as `"Jan 2016"`.
pub fn month_label(date: NaiveDate) -> String {
    format!("{} {}", MONTHS[date.month0() as usize], date.year())
}

/// Calculate `(part / whole) * 100`, rounded to `decimal_places`.
///
/// Returns `0.0` if `whole` is zero to avoid division by zero.
pub fn percentage(part: f64, whole: f64, decimal_places: u32) -> f64 {
    if whole == 0.0 {
        return 0.0;
    }
    round_to((part / whole) * 100.0, decimal_places)
}

// ── Rounding ──────────────────────────────────────────────────────────────────

/// Round to a fixed number of decimal places, halves to even.
pub fn round_to(value: f64, places: u32) -> f64 {
    let factor = 10_f64.powi(places as i32);
    (value * factor).round_ties_even() / factor
}

/// Round to one significant figure: `0.0342 → 0.03`, `347 → 300`.
///
/// Zero and non-finite values are returned unchanged.
pub fn round_1sf(value: f64) -> f64 {
    if value == 0.0 || !value.is_finite() {
        return value;
    }
    let places = -(value.abs().log10().floor() as i32);
    let scale = 10_f64.powi(places.abs());
    if places >= 0 {
        (value * scale).round() / scale
    } else {
        (value / scale).round() * scale
    }
}

// ── Internal helpers ──────────────────────────────────────────────────────────

/// Insert commas every three digits from the right of an integer string.
fn group_thousands(s: &str) -> String {
    if s.len() <= 3 {
        return s.to_string();
    }
    let mut result = String::with_capacity(s.len() + s.len() / 3);
    let remainder = s.len() % 3;
    for (i, c) in s.chars().enumerate() {
        if i != 0 && (i % 3 == remainder) {
            result.push(',');
        }
        result.push(c);
    }
    result
}

// ── Tests ──────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    // ── format_number ────────────────────────────────────────────────────────

    #[test]
    fn test_format_number_zero() {
        assert_eq!(format_number(0.0, 0), "0");
        assert_eq!(format_number(0.0, 2), "0.00");
    }

    #[test]
    fn test_format_number_usage_precision() {
        assert_eq!(format_number(20.93194302, 5), "20.93194");
    }

    #[test]
    fn test_format_number_with_thousands() {
        assert_eq!(format_number(1_234.5, 1), "1,234.5");
        assert_eq!(format_number(1_000.0, 0), "1,000");
    }

    #[test]
    fn test_format_number_rounds_up() {
        assert_eq!(format_number(1.005, 2), "1.01");
    }

    // ── format_currency ──────────────────────────────────────────────────────

    #[test]
    fn test_format_currency_pounds() {
        assert_eq!(format_currency(8.06), "£8.06");
        assert_eq!(format_currency(0.0), "£0.00");
        assert_eq!(format_currency(1_000_000.0), "£1,000,000.00");
    }

    // ── month_label ──────────────────────────────────────────────────────────

    #[test]
    fn test_month_label() {
        let d = NaiveDate::from_ymd_opt(2016, 1, 1).unwrap();
        assert_eq!(month_label(d), "Jan 2016");
        let d = NaiveDate::from_ymd_opt(2017, 12, 1).unwrap();
        assert_eq!(month_label(d), "Dec 2017");
    }

    // ── percentage ───────────────────────────────────────────────────────────

    #[test]
    fn test_percentage_basic() {
        let p = percentage(50.0, 200.0, 1);
        assert!((p - 25.0).abs() < 1e-9, "percentage = {p}");
        assert_eq!(percentage(10.0, 0.0, 2), 0.0);
    }

    // ── round_to ─────────────────────────────────────────────────────────────

    #[test]
    fn test_round_to_places() {
        assert_eq!(round_to(196.31792271234, 7), 196.3179227);
        assert_eq!(round_to(2.123456, 5), 2.12346);
        assert_eq!(round_to(-0.000004, 5), -0.0);
    }

    #[test]
    fn test_round_to_ties_to_even() {
        // 0.125 and 0.375 are exact binary fractions.
        assert_eq!(round_to(0.125, 2), 0.12);
        assert_eq!(round_to(0.375, 2), 0.38);
        assert_eq!(round_to(2.5, 0), 2.0);
    }

    // ── round_1sf ────────────────────────────────────────────────────────────

    #[test]
    fn test_round_1sf_small() {
        assert!((round_1sf(0.0342) - 0.03).abs() < 1e-12);
        assert!((round_1sf(0.0378) - 0.04).abs() < 1e-12);
    }

    #[test]
    fn test_round_1sf_large() {
        assert_eq!(round_1sf(347.0), 300.0);
        assert_eq!(round_1sf(7.6), 8.0);
        assert_eq!(round_1sf(12_500.0), 10_000.0);
    }

    #[test]
    fn test_round_1sf_zero_passthrough() {
        assert_eq!(round_1sf(0.0), 0.0);
        assert!(round_1sf(f64::NAN).is_nan());
    }
}

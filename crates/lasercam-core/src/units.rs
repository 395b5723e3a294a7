//! Decimal rounding and fixed-precision formatting
//!
//! Coordinates are rounded half away from zero on their shortest decimal
//! representation, so `0.125` at two decimals is `0.13` even though the
//! binary value sits slightly below it. Formatting never switches to
//! scientific notation and always keeps exactly `decimals` fraction digits.

use crate::geometry::Point;

/// Format `value` with exactly `decimals` fraction digits.
///
/// Rounds half away from zero on the decimal digits of the value. Negative
/// values that round to zero are printed without a sign.
pub fn format_fixed(value: f64, decimals: usize) -> String {
    if !value.is_finite() {
        return format!("{:.*}", decimals, 0.0);
    }

    // f64 Display yields the shortest round-tripping decimal, never exponent form
    let repr = format!("{}", value.abs());
    let (int_part, frac_part) = match repr.split_once('.') {
        Some((i, f)) => (i, f),
        None => (repr.as_str(), ""),
    };

    let mut digits: Vec<u8> = int_part.bytes().map(|b| b - b'0').collect();
    let frac: Vec<u8> = frac_part.bytes().map(|b| b - b'0').collect();

    let kept = frac.len().min(decimals);
    digits.extend_from_slice(&frac[..kept]);
    digits.resize(int_part.len() + decimals, 0);

    if frac.len() > decimals && frac[decimals] >= 5 {
        let mut i = digits.len();
        loop {
            if i == 0 {
                digits.insert(0, 1);
                break;
            }
            i -= 1;
            if digits[i] == 9 {
                digits[i] = 0;
            } else {
                digits[i] += 1;
                break;
            }
        }
    }

    let split = digits.len() - decimals;
    let mut out = String::with_capacity(digits.len() + 2);
    if value < 0.0 && digits.iter().any(|d| *d != 0) {
        out.push('-');
    }
    for d in &digits[..split] {
        out.push((b'0' + d) as char);
    }
    if decimals > 0 {
        out.push('.');
        for d in &digits[split..] {
            out.push((b'0' + d) as char);
        }
    }
    out
}

/// Round `value` half away from zero to `decimals` fraction digits.
pub fn round_half_away(value: f64, decimals: usize) -> f64 {
    format_fixed(value, decimals).parse().unwrap_or(value)
}

/// Round both coordinates of a point.
pub fn round_point(p: Point, decimals: usize) -> Point {
    Point::new(round_half_away(p.x, decimals), round_half_away(p.y, decimals))
}

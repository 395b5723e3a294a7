use lasercam_core::{format_fixed, round_half_away, round_point, Point};
use proptest::prelude::*;

#[test]
fn test_half_away_from_zero() {
    assert_eq!(format_fixed(1.0005, 3), "1.001");
    assert_eq!(format_fixed(-1.0005, 3), "-1.001");
    assert_eq!(format_fixed(1.0004999, 3), "1.000");
    assert_eq!(format_fixed(0.5, 0), "1");
    assert_eq!(format_fixed(-0.5, 0), "-1");
}

#[test]
fn test_no_scientific_notation() {
    assert_eq!(format_fixed(1e-7, 3), "0.000");
    assert_eq!(format_fixed(123456789.0, 2), "123456789.00");
    assert_eq!(format_fixed(3e-4, 4), "0.0003");
}

#[test]
fn test_round_point() {
    let p = round_point(Point::new(50.00049, -0.0125), 3);
    assert_eq!(p, Point::new(50.0, -0.013));
}

proptest! {
    #[test]
    fn prop_fixed_has_exact_decimals(value in -10000.0f64..10000.0, decimals in 0usize..6) {
        let text = format_fixed(value, decimals);
        match text.split_once('.') {
            Some((_, frac)) => prop_assert_eq!(frac.len(), decimals),
            None => prop_assert_eq!(decimals, 0),
        }
        prop_assert!(!text.contains('e'));
    }

    #[test]
    fn prop_rounding_error_is_bounded(value in -10000.0f64..10000.0, decimals in 0usize..6) {
        let rounded = round_half_away(value, decimals);
        let half_step = 0.5 * 10f64.powi(-(decimals as i32));
        prop_assert!((rounded - value).abs() <= half_step + 1e-9);
    }

    #[test]
    fn prop_rounding_is_idempotent(value in -10000.0f64..10000.0, decimals in 0usize..6) {
        let once = round_half_away(value, decimals);
        prop_assert_eq!(round_half_away(once, decimals), once);
    }

    #[test]
    fn prop_rounding_is_symmetric(value in 0.0f64..10000.0, decimals in 0usize..6) {
        let pos = format_fixed(value, decimals);
        let neg = format_fixed(-value, decimals);
        if pos.chars().any(|c| c.is_ascii_digit() && c != '0') {
            prop_assert_eq!(neg, format!("-{}", pos));
        } else {
            prop_assert_eq!(neg, pos);
        }
    }
}

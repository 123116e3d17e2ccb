// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Unit tests for serial arithmetic and bump schemes

#[cfg(test)]
mod tests {
    use super::super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    // ========================================================================
    // RFC 1982 comparison
    // ========================================================================

    #[test]
    fn test_serial_gt_basic() {
        assert!(serial_gt(2, 1));
        assert!(!serial_gt(1, 2));
        assert!(!serial_gt(5, 5));
    }

    #[test]
    fn test_serial_gt_across_wrap() {
        assert!(serial_gt(0, u32::MAX));
        assert!(serial_gt(10, u32::MAX - 10));
        assert!(!serial_gt(u32::MAX, 0));
    }

    #[test]
    fn test_serial_gt_half_range_is_undefined() {
        assert!(!serial_gt(1 << 31, 0));
        assert!(!serial_gt(0, 1 << 31));
    }

    // ========================================================================
    // Increment scheme
    // ========================================================================

    #[test]
    fn test_increment_adds_one() {
        assert_eq!(SerialScheme::Increment.next_serial(1), 2);
        assert_eq!(SerialScheme::Increment.next_serial(2_024_010_101), 2_024_010_102);
    }

    #[test]
    fn test_increment_wraps() {
        assert_eq!(SerialScheme::Increment.next_serial(u32::MAX), 0);
    }

    #[test]
    fn test_increment_strictly_monotonic_sequence() {
        let scheme = SerialScheme::Increment;
        for start in [0, 1, 41, u32::MAX - 2, u32::MAX] {
            let first = scheme.next_serial(start);
            let second = scheme.next_serial(first);
            assert!(serial_gt(first, start), "next({start}) must exceed {start}");
            assert!(serial_gt(second, first), "next(next({start})) must exceed next");
        }
    }

    // ========================================================================
    // Date scheme
    // ========================================================================

    #[test]
    fn test_date_serial_encoding() {
        assert_eq!(date_serial(date(2026, 10, 17)), 2_026_101_700);
        assert_eq!(date_serial(date(2024, 1, 1)), 2_024_010_100);
    }

    #[test]
    fn test_date_scheme_jumps_to_today_from_low_serial() {
        let next = SerialScheme::Date.next_serial_on(7, date(2026, 10, 17));
        assert_eq!(next, 2_026_101_700);
    }

    #[test]
    fn test_date_scheme_counts_within_same_day() {
        let today = date(2026, 10, 17);
        let first = SerialScheme::Date.next_serial_on(2_026_101_605, today);
        assert_eq!(first, 2_026_101_700);
        let second = SerialScheme::Date.next_serial_on(first, today);
        assert_eq!(second, 2_026_101_701);
        let third = SerialScheme::Date.next_serial_on(second, today);
        assert_eq!(third, 2_026_101_702);
    }

    #[test]
    fn test_date_scheme_never_goes_backwards() {
        // Serial already ahead of today's date (e.g. more than 100 edits yesterday)
        let next = SerialScheme::Date.next_serial_on(2_026_101_799, date(2026, 10, 17));
        assert_eq!(next, 2_026_101_800);

        let far_ahead = SerialScheme::Date.next_serial_on(3_000_000_000, date(2026, 10, 17));
        assert!(serial_gt(far_ahead, 3_000_000_000));
    }

    #[test]
    fn test_date_scheme_is_strictly_monotonic() {
        let today = date(2026, 10, 17);
        let mut serial = 1;
        for _ in 0..250 {
            let next = SerialScheme::Date.next_serial_on(serial, today);
            assert!(serial_gt(next, serial));
            serial = next;
        }
    }

    #[test]
    fn test_scheme_serde_names() {
        let scheme: SerialScheme = serde_yaml::from_str("date").unwrap();
        assert_eq!(scheme, SerialScheme::Date);
        let scheme: SerialScheme = serde_yaml::from_str("increment").unwrap();
        assert_eq!(scheme, SerialScheme::Increment);
    }
}

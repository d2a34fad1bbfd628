//! # محاسبه جریمه (Fine Calculation)
//!
//! جریمه برای هر ساعت شروع شده بعد از سررسید محاسبه میشه:
//! `ceil((return - due) / 1h) * FINE_PER_HOUR`، و اگه به موقع برگرده صفره.

use chrono::{DateTime, Utc};

/// جریمه هر ساعت تاخیر (واحد پول کامل)
pub const FINE_PER_HOUR: i64 = 10;

/// جریمه بازگشت در `returned_at` برای امانتی با سررسید `due`
///
/// ```rust
/// use chrono::{Duration, Utc};
/// use library_service::services::calculate_fine;
///
/// let due = Utc::now();
/// assert_eq!(calculate_fine(due, due), 0);
/// assert_eq!(calculate_fine(due, due + Duration::minutes(90)), 20);
/// ```
#[must_use]
pub fn calculate_fine(due: DateTime<Utc>, returned_at: DateTime<Utc>) -> i64 {
    if returned_at <= due {
        return 0;
    }

    let late = returned_at - due;
    let mut hours = late.num_hours();

    // هر ساعت ناقص یک ساعت کامل حساب میشه
    if late - chrono::Duration::hours(hours) > chrono::Duration::zero() {
        hours += 1;
    }

    hours * FINE_PER_HOUR
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};
    use proptest::prelude::*;

    fn due() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 5, 10, 12, 0, 0).unwrap()
    }

    #[test]
    fn test_on_time_is_free() {
        assert_eq!(calculate_fine(due(), due()), 0);
        assert_eq!(calculate_fine(due(), due() - Duration::days(3)), 0);
    }

    #[test]
    fn test_partial_hour_rounds_up() {
        assert_eq!(calculate_fine(due(), due() + Duration::milliseconds(1)), 10);
        assert_eq!(calculate_fine(due(), due() + Duration::hours(1)), 10);
        assert_eq!(
            calculate_fine(due(), due() + Duration::milliseconds(3_600_001)),
            20
        );
        assert_eq!(calculate_fine(due(), due() + Duration::hours(25)), 250);
    }

    proptest! {
        #[test]
        fn prop_fine_is_ceil_of_hours(late_ms in 1i64..10_000_000_000) {
            let fine = calculate_fine(due(), due() + Duration::milliseconds(late_ms));
            let expected = (late_ms + 3_599_999) / 3_600_000 * FINE_PER_HOUR;
            prop_assert_eq!(fine, expected);
        }

        #[test]
        fn prop_fine_is_monotonic(a in 0i64..1_000_000_000, b in 0i64..1_000_000_000) {
            let (early, late) = if a <= b { (a, b) } else { (b, a) };
            prop_assert!(
                calculate_fine(due(), due() + Duration::milliseconds(early))
                    <= calculate_fine(due(), due() + Duration::milliseconds(late))
            );
        }
    }
}

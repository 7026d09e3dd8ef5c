use chrono::NaiveDate;

use super::model::{ApiStatus, UiStatus};

/// Widen the backend's stored status to the four states users see.
///
/// Overdue is never stored: a pending invoice whose due date is strictly before
/// `today` is reported as overdue. An invoice due today is still pending.
pub fn api_to_ui_status(api: ApiStatus, due_date: Option<NaiveDate>, today: NaiveDate) -> UiStatus {
    match api {
        ApiStatus::Paid => UiStatus::Paid,
        ApiStatus::Cancelled => UiStatus::Failed,
        ApiStatus::Pending => match due_date {
            Some(due) if due < today => UiStatus::Overdue,
            _ => UiStatus::Pending,
        },
        ApiStatus::Unknown => UiStatus::Pending,
    }
}

/// Status to write back when an administrator changes an invoice.
/// Overdue collapses to pending.
pub fn ui_to_api_status(ui: UiStatus) -> ApiStatus {
    match ui {
        UiStatus::Paid => ApiStatus::Paid,
        UiStatus::Failed => ApiStatus::Cancelled,
        UiStatus::Pending | UiStatus::Overdue => ApiStatus::Pending,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 3, d).unwrap()
    }

    #[test]
    fn paid_and_cancelled_ignore_due_date() {
        for due in [None, Some(day(1)), Some(day(28))] {
            assert_eq!(api_to_ui_status(ApiStatus::Paid, due, day(15)), UiStatus::Paid);
            assert_eq!(
                api_to_ui_status(ApiStatus::Cancelled, due, day(15)),
                UiStatus::Failed
            );
        }
    }

    #[test]
    fn pending_past_due_is_overdue() {
        assert_eq!(
            api_to_ui_status(ApiStatus::Pending, Some(day(14)), day(15)),
            UiStatus::Overdue
        );
    }

    #[test]
    fn pending_due_today_or_later_stays_pending() {
        assert_eq!(
            api_to_ui_status(ApiStatus::Pending, Some(day(15)), day(15)),
            UiStatus::Pending
        );
        assert_eq!(
            api_to_ui_status(ApiStatus::Pending, Some(day(20)), day(15)),
            UiStatus::Pending
        );
        assert_eq!(
            api_to_ui_status(ApiStatus::Pending, None, day(15)),
            UiStatus::Pending
        );
    }

    #[test]
    fn unknown_status_fails_open_to_pending() {
        let api = ApiStatus::parse("refunded");
        assert_eq!(api, ApiStatus::Unknown);
        assert_eq!(api_to_ui_status(api, Some(day(1)), day(15)), UiStatus::Pending);
    }

    #[test]
    fn reverse_map_round_trips_terminal_states() {
        for ui in [UiStatus::Paid, UiStatus::Failed] {
            for due in [None, Some(day(1)), Some(day(28))] {
                assert_eq!(api_to_ui_status(ui_to_api_status(ui), due, day(15)), ui);
            }
        }
    }

    #[test]
    fn overdue_collapses_to_pending_on_write() {
        assert_eq!(ui_to_api_status(UiStatus::Overdue), ApiStatus::Pending);
        assert_eq!(ui_to_api_status(UiStatus::Pending), ApiStatus::Pending);
    }
}

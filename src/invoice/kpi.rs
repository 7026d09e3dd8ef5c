use chrono::{Datelike, NaiveDate};

use super::model::{Invoice, UiStatus};

/// Summary figures over the visible invoices
#[derive(Debug, Clone, PartialEq)]
pub struct Kpis<'a> {
    pub outstanding_total: f64,
    pub overdue_count: usize,
    pub overdue_total: f64,
    pub paid_this_month: f64,
    /// Unpaid invoice with the earliest due (or issue) date
    pub next_due: Option<&'a Invoice>,
    /// Overdue invoice that has been due the longest
    pub most_overdue: Option<&'a Invoice>,
}

impl<'a> Kpis<'a> {
    pub fn compute(visible: &[&'a Invoice], today: NaiveDate) -> Self {
        let outstanding_total = visible
            .iter()
            .filter(|inv| inv.status != UiStatus::Paid)
            .map(|inv| inv.amount)
            .sum();

        let overdue: Vec<&'a Invoice> = visible
            .iter()
            .copied()
            .filter(|inv| inv.status == UiStatus::Overdue)
            .collect();
        let overdue_total = overdue.iter().map(|inv| inv.amount).sum();

        let paid_this_month = visible
            .iter()
            .filter(|inv| inv.status == UiStatus::Paid)
            .filter(|inv| inv.date.year() == today.year() && inv.date.month() == today.month())
            .map(|inv| inv.amount)
            .sum();

        let next_due = visible
            .iter()
            .copied()
            .filter(|inv| inv.status != UiStatus::Paid)
            .min_by_key(|inv| inv.due_or_issue_date());

        let most_overdue = overdue
            .iter()
            .copied()
            .min_by_key(|inv| inv.due_or_issue_date());

        Self {
            outstanding_total,
            overdue_count: overdue.len(),
            overdue_total,
            paid_this_month,
            next_due,
            most_overdue,
        }
    }

    /// The single overdue case worth calling out, if any
    pub fn attention(&self, today: NaiveDate) -> Option<String> {
        let inv = self.most_overdue?;
        let days = (today - inv.due_or_issue_date()).num_days();
        let others = self.overdue_count.saturating_sub(1);

        let mut message = format!(
            "Invoice {} ({:.2} {}) is {} day(s) overdue",
            inv.label(),
            inv.amount,
            inv.currency,
            days
        );
        if others > 0 {
            message.push_str(&format!(" ({others} more overdue)"));
        }
        Some(message)
    }
}

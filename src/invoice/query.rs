use chrono::NaiveDate;
use std::cmp::Ordering;

use super::model::{Invoice, UiStatus};

/// Status chips above the invoice table
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum StatusChip {
    #[default]
    All,
    Outstanding,
    Overdue,
    Paid,
    /// The backend has no partial payments; this shows pending invoices.
    Partially,
}

impl StatusChip {
    pub const ALL: [StatusChip; 5] = [
        StatusChip::All,
        StatusChip::Outstanding,
        StatusChip::Overdue,
        StatusChip::Paid,
        StatusChip::Partially,
    ];

    pub fn matches(&self, invoice: &Invoice) -> bool {
        match self {
            StatusChip::All => true,
            StatusChip::Outstanding => invoice.status != UiStatus::Paid,
            StatusChip::Overdue => invoice.status == UiStatus::Overdue,
            StatusChip::Paid => invoice.status == UiStatus::Paid,
            StatusChip::Partially => invoice.status == UiStatus::Pending,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            StatusChip::All => "All",
            StatusChip::Outstanding => "Outstanding",
            StatusChip::Overdue => "Overdue",
            StatusChip::Paid => "Paid",
            StatusChip::Partially => "Partially",
        }
    }

    /// Badge count for every chip
    pub fn counts(invoices: &[&Invoice]) -> Vec<(StatusChip, usize)> {
        Self::ALL
            .iter()
            .map(|chip| (*chip, invoices.iter().filter(|inv| chip.matches(inv)).count()))
            .collect()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum SortKey {
    #[default]
    Date,
    Amount,
    Status,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortDirection {
    Asc,
    #[default]
    Desc,
}

impl SortDirection {
    pub fn toggled(self) -> Self {
        match self {
            SortDirection::Asc => SortDirection::Desc,
            SortDirection::Desc => SortDirection::Asc,
        }
    }
}

/// Table filters, applied chip → text → date range → sort
#[derive(Debug, Clone, Default)]
pub struct InvoiceQuery {
    pub chip: StatusChip,
    pub text: Option<String>,
    pub from: Option<NaiveDate>,
    pub to: Option<NaiveDate>,
    pub sort: SortKey,
    pub direction: SortDirection,
}

impl InvoiceQuery {
    pub fn apply<'a>(&self, invoices: &[&'a Invoice]) -> Vec<&'a Invoice> {
        let needle = self
            .text
            .as_deref()
            .map(|t| t.trim().to_lowercase())
            .filter(|t| !t.is_empty());

        let mut rows: Vec<&'a Invoice> = invoices
            .iter()
            .copied()
            .filter(|inv| self.chip.matches(inv))
            .filter(|inv| match &needle {
                Some(needle) => matches_text(inv, needle),
                None => true,
            })
            .filter(|inv| self.from.map_or(true, |from| inv.date >= from))
            .filter(|inv| self.to.map_or(true, |to| inv.date <= to))
            .collect();

        rows.sort_by(|a, b| {
            let ordering = compare(self.sort, a, b);
            match self.direction {
                SortDirection::Asc => ordering,
                SortDirection::Desc => ordering.reverse(),
            }
        });
        rows
    }
}

fn matches_text(invoice: &Invoice, needle: &str) -> bool {
    invoice.id.to_string().contains(needle)
        || invoice
            .number
            .as_deref()
            .is_some_and(|n| n.to_lowercase().contains(needle))
        || invoice.description.to_lowercase().contains(needle)
}

fn compare(key: SortKey, a: &Invoice, b: &Invoice) -> Ordering {
    match key {
        SortKey::Date => a.date.cmp(&b.date),
        SortKey::Amount => a.amount.total_cmp(&b.amount),
        SortKey::Status => a.status.severity().cmp(&b.status.severity()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 3, d).unwrap()
    }

    fn fixture() -> Vec<Invoice> {
        let mut a = Invoice::sample(1, 30.0, UiStatus::Overdue, day(2));
        a.number = Some("FT-2026-0001".to_string());
        a.description = "Sessão de avaliação".to_string();
        let mut b = Invoice::sample(2, 100.0, UiStatus::Paid, day(10));
        b.number = Some("FT-2026-0002".to_string());
        let mut c = Invoice::sample(3, 50.0, UiStatus::Pending, day(20));
        c.description = "Terapia semanal".to_string();
        let d = Invoice::sample(14, 80.0, UiStatus::Failed, day(25));
        vec![a, b, c, d]
    }

    fn ids(rows: &[&Invoice]) -> Vec<u64> {
        rows.iter().map(|inv| inv.id).collect()
    }

    fn run(query: &InvoiceQuery, all: &[Invoice]) -> Vec<u64> {
        let refs: Vec<&Invoice> = all.iter().collect();
        ids(&query.apply(&refs))
    }

    #[test]
    fn chips_select_by_status() {
        let all = fixture();
        let mut query = InvoiceQuery {
            sort: SortKey::Date,
            direction: SortDirection::Asc,
            ..Default::default()
        };

        assert_eq!(run(&query, &all), vec![1, 2, 3, 14]);
        query.chip = StatusChip::Outstanding;
        assert_eq!(run(&query, &all), vec![1, 3, 14]);
        query.chip = StatusChip::Overdue;
        assert_eq!(run(&query, &all), vec![1]);
        query.chip = StatusChip::Paid;
        assert_eq!(run(&query, &all), vec![2]);
        query.chip = StatusChip::Partially;
        assert_eq!(run(&query, &all), vec![3]);
    }

    #[test]
    fn text_matches_id_number_and_description() {
        let all = fixture();
        let mut query = InvoiceQuery {
            direction: SortDirection::Asc,
            ..Default::default()
        };

        query.text = Some("ft-2026-0002".to_string());
        assert_eq!(run(&query, &all), vec![2]);
        query.text = Some("TERAPIA".to_string());
        assert_eq!(run(&query, &all), vec![3]);
        query.text = Some("14".to_string());
        assert_eq!(run(&query, &all), vec![14]);
        query.text = Some("   ".to_string());
        assert_eq!(run(&query, &all).len(), 4);
    }

    #[test]
    fn date_range_is_inclusive_on_issue_date() {
        let all = fixture();
        let query = InvoiceQuery {
            from: Some(day(10)),
            to: Some(day(20)),
            direction: SortDirection::Asc,
            ..Default::default()
        };
        assert_eq!(run(&query, &all), vec![2, 3]);
    }

    #[test]
    fn amount_sort_respects_direction() {
        let all = vec![
            Invoice::sample(1, 30.0, UiStatus::Pending, day(1)),
            Invoice::sample(2, 100.0, UiStatus::Pending, day(2)),
            Invoice::sample(3, 50.0, UiStatus::Pending, day(3)),
        ];
        let mut query = InvoiceQuery {
            sort: SortKey::Amount,
            direction: SortDirection::Asc,
            ..Default::default()
        };
        assert_eq!(run(&query, &all), vec![1, 3, 2]);

        query.direction = query.direction.toggled();
        assert_eq!(run(&query, &all), vec![2, 3, 1]);
    }

    #[test]
    fn status_sort_descending_puts_most_urgent_first() {
        let all = fixture();
        let query = InvoiceQuery {
            sort: SortKey::Status,
            direction: SortDirection::Desc,
            ..Default::default()
        };
        assert_eq!(run(&query, &all), vec![1, 14, 3, 2]);
    }

    #[test]
    fn chip_counts_cover_every_chip() {
        let all = fixture();
        let refs: Vec<&Invoice> = all.iter().collect();
        let counts = StatusChip::counts(&refs);
        assert_eq!(
            counts,
            vec![
                (StatusChip::All, 4),
                (StatusChip::Outstanding, 3),
                (StatusChip::Overdue, 1),
                (StatusChip::Paid, 1),
                (StatusChip::Partially, 1),
            ]
        );
    }
}

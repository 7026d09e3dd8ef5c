use chrono::NaiveDate;

use super::model::Invoice;

const CSV_HEADER: &str = "Número,FaturaID,Data,Vencimento,Valor,Estado,Descrição";

/// `faturas_<YYYY-MM-DD>.csv`
pub fn csv_file_name(today: NaiveDate) -> String {
    format!("faturas_{}.csv", today.format("%Y-%m-%d"))
}

/// `invoice_<number-or-id>.pdf`, with anything outside `[A-Za-z0-9_-]` replaced
/// so the name stays a single path component.
pub fn pdf_file_name(invoice: &Invoice) -> String {
    let label: String = invoice
        .label()
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '-' || c == '_' {
                c
            } else {
                '_'
            }
        })
        .collect();
    format!("invoice_{label}.pdf")
}

/// Render rows in the order given
pub fn to_csv(invoices: &[&Invoice]) -> String {
    let mut out = String::from(CSV_HEADER);
    out.push('\n');

    for inv in invoices {
        let due = inv
            .due_date
            .map(|d| d.format("%Y-%m-%d").to_string())
            .unwrap_or_default();
        out.push_str(&format!(
            "{},{},{},{},{:.2},{},{}\n",
            quote(inv.number.as_deref().unwrap_or("")),
            inv.id,
            inv.date.format("%Y-%m-%d"),
            due,
            inv.amount,
            inv.status,
            quote(&inv.description)
        ));
    }
    out
}

fn quote(field: &str) -> String {
    format!("\"{}\"", field.replace('"', "\"\""))
}

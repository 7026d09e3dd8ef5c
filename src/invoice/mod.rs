mod board;
mod export;
mod kpi;
mod model;
mod query;
mod status;
mod visibility;

pub use board::BillingBoard;
pub use export::{csv_file_name, pdf_file_name, to_csv};
pub use kpi::Kpis;
pub use model::{
    parse_iso_date, ApiStatus, CreateInvoiceBody, Invoice, InvoiceRecord, NewInvoice, Ownership,
    UiStatus,
};
pub use query::{InvoiceQuery, SortDirection, SortKey, StatusChip};
pub use status::{api_to_ui_status, ui_to_api_status};
pub use visibility::visible_to;

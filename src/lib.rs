pub mod api;
pub mod config;
pub mod error;
pub mod invoice;

pub use api::{BillingBackend, ConsultationLite, HttpBackend, ProofFile};
pub use config::{Config, Role, Session, SessionUser, Viewer, VisibilityPolicy};
pub use error::{BillingError, Result};
pub use invoice::{BillingBoard, Invoice, InvoiceQuery, Kpis, UiStatus};

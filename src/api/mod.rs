mod consultation;
mod http;

pub use consultation::{filter_consultations, ConsultationLite};
pub use http::HttpBackend;

use std::path::Path;

use crate::error::{BillingError, Result};
use crate::invoice::{ApiStatus, CreateInvoiceBody, InvoiceRecord};

/// Payment proof attached by a guardian
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProofFile {
    pub file_name: String,
    pub bytes: Vec<u8>,
}

impl ProofFile {
    pub fn from_path(path: &Path) -> Result<Self> {
        let bytes = std::fs::read(path)?;
        let file_name = path
            .file_name()
            .and_then(|n| n.to_str())
            .map(str::to_string)
            .ok_or_else(|| {
                BillingError::Io(std::io::Error::new(
                    std::io::ErrorKind::InvalidInput,
                    format!("Not a file: {}", path.display()),
                ))
            })?;
        Ok(Self { file_name, bytes })
    }

    pub fn content_type(&self) -> &'static str {
        let ext = Path::new(&self.file_name)
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_ascii_lowercase);
        match ext.as_deref() {
            Some("pdf") => "application/pdf",
            Some("png") => "image/png",
            Some("jpg") | Some("jpeg") => "image/jpeg",
            Some("webp") => "image/webp",
            _ => "application/octet-stream",
        }
    }
}

/// The clinic REST backend as seen by the billing screen.
/// Every call carries the caller's bearer token.
pub trait BillingBackend {
    fn list_invoices(&self, token: &str) -> Result<Vec<InvoiceRecord>>;

    fn update_status(&self, token: &str, id: u64, status: ApiStatus) -> Result<InvoiceRecord>;

    fn upload_proof(&self, token: &str, id: u64, proof: &ProofFile) -> Result<InvoiceRecord>;

    fn download_pdf(&self, token: &str, id: u64) -> Result<Vec<u8>>;

    fn create_invoice(
        &self,
        token: &str,
        consultation_id: u64,
        body: &CreateInvoiceBody,
    ) -> Result<InvoiceRecord>;

    /// Optional server-side search; may be missing on older backends.
    fn search_consultations_lite(
        &self,
        token: &str,
        term: &str,
        limit: usize,
    ) -> Result<Vec<ConsultationLite>>;

    fn list_consultations(&self, token: &str) -> Result<Vec<ConsultationLite>>;
}

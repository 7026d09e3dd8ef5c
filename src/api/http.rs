use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::time::Duration;
use tracing::debug;
use ureq::http::Response;
use ureq::unversioned::multipart::{Form, Part};
use ureq::{Agent, Body};

use super::{BillingBackend, ConsultationLite, ProofFile};
use crate::config::ApiSettings;
use crate::error::{BillingError, Result};
use crate::invoice::{ApiStatus, CreateInvoiceBody, InvoiceRecord};

/// Blocking client for the clinic REST API
pub struct HttpBackend {
    agent: Agent,
    base_url: String,
}

impl HttpBackend {
    pub fn new(settings: &ApiSettings) -> Self {
        let agent: Agent = Agent::config_builder()
            .timeout_global(Some(Duration::from_secs(settings.timeout_secs)))
            .http_status_as_error(false)
            .build()
            .into();

        Self {
            agent,
            base_url: settings.base_url.trim_end_matches('/').to_string(),
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }
}

fn bearer(token: &str) -> String {
    format!("Bearer {token}")
}

/// Turn a raw ureq result into the response body, mapping non-2xx to `Api`.
fn checked_body(
    result: std::result::Result<Response<Body>, ureq::Error>,
    fallback: &str,
) -> Result<Vec<u8>> {
    let mut response = result.map_err(|e| BillingError::Transport(e.to_string()))?;
    let status = response.status();
    let bytes = response
        .body_mut()
        .read_to_vec()
        .map_err(|e| BillingError::Transport(e.to_string()))?;

    if !status.is_success() {
        let message = server_message(&bytes).unwrap_or_else(|| fallback.to_string());
        return Err(BillingError::Api {
            status: status.as_u16(),
            message,
        });
    }
    Ok(bytes)
}

/// `{"message": ".."}` or `{"error": ".."}`, as the backend reports failures
fn server_message(bytes: &[u8]) -> Option<String> {
    let json: serde_json::Value = serde_json::from_slice(bytes).ok()?;
    ["message", "error"]
        .iter()
        .filter_map(|key| json.get(*key))
        .find_map(|value| match value {
            serde_json::Value::String(s) if !s.trim().is_empty() => Some(s.clone()),
            serde_json::Value::Array(items) => {
                let parts: Vec<&str> = items.iter().filter_map(|v| v.as_str()).collect();
                (!parts.is_empty()).then(|| parts.join("; "))
            }
            _ => None,
        })
}

fn decode<T: DeserializeOwned>(bytes: &[u8]) -> Result<T> {
    serde_json::from_slice(bytes).map_err(|e| BillingError::Decode(e.to_string()))
}

/// File name as it may appear inside a part's `Content-Disposition` header
fn header_safe_file_name(name: &str) -> String {
    let cleaned: String = name
        .chars()
        .filter(|c| !c.is_control() && *c != '"' && *c != '\\')
        .collect();
    if cleaned.trim().is_empty() {
        "proof".to_string()
    } else {
        cleaned
    }
}

/// Single-file multipart form carrying the proof under `field`
fn proof_form<'a>(field: &'a str, file_name: &str, proof: &'a ProofFile) -> Result<Form<'a>> {
    let part = Part::bytes(&proof.bytes)
        .file_name(file_name)
        .mime_str(proof.content_type())
        .map_err(|e| BillingError::Transport(e.to_string()))?;
    Ok(Form::new().part(field, part))
}

/// Consultation endpoints answer with either a bare array or `{ "items": [..] }`
#[derive(Deserialize)]
#[serde(untagged)]
enum ConsultationPage {
    List(Vec<ConsultationLite>),
    Wrapped { items: Vec<ConsultationLite> },
}

impl BillingBackend for HttpBackend {
    fn list_invoices(&self, token: &str) -> Result<Vec<InvoiceRecord>> {
        debug!("GET /invoices");
        let result = self
            .agent
            .get(self.url("/invoices"))
            .header("Authorization", &bearer(token))
            .call();
        let bytes = checked_body(result, "Failed to load invoices")?;
        decode(&bytes)
    }

    fn update_status(&self, token: &str, id: u64, status: ApiStatus) -> Result<InvoiceRecord> {
        debug!(invoice_id = id, status = status.as_str(), "PATCH invoice status");
        let payload = serde_json::json!({ "status": status }).to_string();
        let result = self
            .agent
            .patch(self.url(&format!("/invoices/{id}/status")))
            .header("Authorization", &bearer(token))
            .header("Content-Type", "application/json")
            .send(payload.as_bytes());
        let bytes = checked_body(result, "Failed to update invoice status")?;
        decode(&bytes)
    }

    fn upload_proof(&self, token: &str, id: u64, proof: &ProofFile) -> Result<InvoiceRecord> {
        debug!(invoice_id = id, file = %proof.file_name, size = proof.bytes.len(), "POST invoice proof");
        let file_name = header_safe_file_name(&proof.file_name);
        let form = proof_form("proof", &file_name, proof)?;
        let result = self
            .agent
            .post(self.url(&format!("/invoices/{id}/proof")))
            .header("Authorization", &bearer(token))
            .send(form);
        let bytes = checked_body(result, "Failed to upload payment proof")?;
        decode(&bytes)
    }

    fn download_pdf(&self, token: &str, id: u64) -> Result<Vec<u8>> {
        debug!(invoice_id = id, "GET invoice pdf");
        let result = self
            .agent
            .get(self.url(&format!("/invoices/{id}/download")))
            .header("Authorization", &bearer(token))
            .call();
        checked_body(result, "Failed to download invoice")
    }

    fn create_invoice(
        &self,
        token: &str,
        consultation_id: u64,
        body: &CreateInvoiceBody,
    ) -> Result<InvoiceRecord> {
        debug!(consultation_id, total = body.total, "POST invoice");
        let payload =
            serde_json::to_string(body).map_err(|e| BillingError::Decode(e.to_string()))?;
        let result = self
            .agent
            .post(self.url(&format!("/invoices/{consultation_id}/invoices")))
            .header("Authorization", &bearer(token))
            .header("Content-Type", "application/json")
            .send(payload.as_bytes());
        let bytes = checked_body(result, "Failed to create invoice")?;
        decode(&bytes)
    }

    fn search_consultations_lite(
        &self,
        token: &str,
        term: &str,
        limit: usize,
    ) -> Result<Vec<ConsultationLite>> {
        debug!(term, limit, "GET lite consultations");
        let result = self
            .agent
            .get(self.url("/consultations"))
            .query("lite", "1")
            .query("q", term)
            .query("limit", limit.to_string())
            .header("Authorization", &bearer(token))
            .call();
        let bytes = checked_body(result, "Failed to search consultations")?;
        match decode(&bytes)? {
            ConsultationPage::List(items) | ConsultationPage::Wrapped { items } => Ok(items),
        }
    }

    fn list_consultations(&self, token: &str) -> Result<Vec<ConsultationLite>> {
        debug!("GET /consultations");
        let result = self
            .agent
            .get(self.url("/consultations"))
            .header("Authorization", &bearer(token))
            .call();
        let bytes = checked_body(result, "Failed to load consultations")?;
        match decode(&bytes)? {
            ConsultationPage::List(items) | ConsultationPage::Wrapped { items } => Ok(items),
        }
    }
}

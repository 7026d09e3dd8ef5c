//! The billing screen's state: the loaded invoices and the viewer.
//!
//! Mutations are never applied optimistically. The backend is called and only
//! the server's answer (mapped through the status mapper again) replaces the
//! record. On failure the list is left as it was. Every mutation borrows the
//! board mutably, so a row never has two actions in flight.

use chrono::NaiveDate;
use tracing::{info, warn};

use super::export::pdf_file_name;
use super::kpi::Kpis;
use super::model::{
    default_description, CreateInvoiceBody, Invoice, InvoiceRecord, NewInvoice, UiStatus,
};
use super::query::InvoiceQuery;
use super::status::ui_to_api_status;
use super::visibility::visible_to;
use crate::api::{filter_consultations, BillingBackend, ConsultationLite, ProofFile};
use crate::config::{BillingSettings, Role, Session, Viewer};
use crate::error::{BillingError, Result};

pub struct BillingBoard<B> {
    backend: B,
    session: Session,
    settings: BillingSettings,
    invoices: Vec<Invoice>,
}

impl<B: BillingBackend> BillingBoard<B> {
    pub fn new(backend: B, session: Session, settings: BillingSettings) -> Self {
        Self {
            backend,
            session,
            settings,
            invoices: Vec::new(),
        }
    }

    pub fn viewer(&self) -> Viewer {
        self.session.viewer()
    }

    /// Every loaded invoice, before visibility filtering
    pub fn invoices(&self) -> &[Invoice] {
        &self.invoices
    }

    /// Replace the collection with a fresh `GET /invoices`.
    /// The previous collection survives a failed load.
    pub fn load(&mut self, today: NaiveDate) -> Result<usize> {
        let token = self.session.bearer()?;
        let records = self.backend.list_invoices(token).map_err(|e| {
            warn!(error = %e, "Failed to load invoices");
            e
        })?;

        let currency = &self.settings.currency;
        self.invoices = records
            .into_iter()
            .map(|record| Invoice::from_record(record, currency, today))
            .collect();

        info!(count = self.invoices.len(), "Invoices loaded");
        Ok(self.invoices.len())
    }

    pub fn visible(&self) -> Vec<&Invoice> {
        visible_to(&self.invoices, &self.viewer(), self.settings.visibility)
    }

    pub fn query(&self, query: &InvoiceQuery) -> Vec<&Invoice> {
        query.apply(&self.visible())
    }

    pub fn kpis(&self, today: NaiveDate) -> Kpis<'_> {
        Kpis::compute(&self.visible(), today)
    }

    /// Look up a visible invoice
    pub fn get(&self, id: u64) -> Option<&Invoice> {
        self.visible().into_iter().find(|inv| inv.id == id)
    }

    /// Administrator status transition
    pub fn change_status(
        &mut self,
        id: u64,
        target: UiStatus,
        today: NaiveDate,
    ) -> Result<&Invoice> {
        self.require(Role::Admin, "change invoice status")?;
        let status = ui_to_api_status(target);
        self.mutate(id, today, |backend, token| backend.update_status(token, id, status))
    }

    /// Guardian uploads a payment proof
    pub fn upload_proof(
        &mut self,
        id: u64,
        proof: &ProofFile,
        today: NaiveDate,
    ) -> Result<&Invoice> {
        self.require(Role::Pai, "upload payment proofs")?;
        self.mutate(id, today, |backend, token| backend.upload_proof(token, id, proof))
    }

    /// Create an invoice against a consultation and append it to the list.
    pub fn create(&mut self, draft: NewInvoice, today: NaiveDate) -> Result<&Invoice> {
        self.require(Role::Admin, "create invoices")?;

        let consultation_id = draft
            .consultation_id
            .ok_or(BillingError::MissingConsultation)?;
        let total = draft
            .total
            .filter(|t| t.is_finite() && *t > 0.0)
            .ok_or(BillingError::MissingAmount)?;

        let body = CreateInvoiceBody {
            number: draft.number.filter(|n| !n.trim().is_empty()),
            date: draft.date.unwrap_or(today),
            due_date: draft.due_date,
            total,
            status: draft.status,
            description: draft
                .description
                .filter(|d| !d.trim().is_empty())
                .unwrap_or_else(|| default_description(Some(consultation_id))),
        };

        let token = self.session.bearer()?;
        let record = self
            .backend
            .create_invoice(token, consultation_id, &body)
            .map_err(|e| {
                warn!(consultation_id, error = %e, "Failed to create invoice");
                e
            })?;

        let invoice = Invoice::from_record(record, &self.settings.currency, today);
        info!(invoice_id = invoice.id, consultation_id, "Invoice created");
        self.invoices.push(invoice);
        Ok(&self.invoices[self.invoices.len() - 1])
    }

    /// PDF bytes and the file name to save them under
    pub fn download(&self, id: u64) -> Result<(String, Vec<u8>)> {
        let invoice = self.get(id).ok_or(BillingError::InvoiceNotFound(id))?;
        let token = self.session.bearer()?;
        let bytes = self.backend.download_pdf(token, id).map_err(|e| {
            warn!(invoice_id = id, error = %e, "Failed to download invoice");
            e
        })?;
        Ok((pdf_file_name(invoice), bytes))
    }

    /// Consultations for the creation picker. Falls back to filtering the full
    /// listing locally when the lite endpoint is unavailable.
    pub fn search_consultations(
        &self,
        term: &str,
        limit: usize,
    ) -> Result<Vec<ConsultationLite>> {
        self.require(Role::Admin, "create invoices")?;
        let token = self.session.bearer()?;

        match self.backend.search_consultations_lite(token, term, limit) {
            Ok(mut items) => {
                items.truncate(limit);
                Ok(items)
            }
            Err(e) => {
                warn!(error = %e, "Lite consultation search failed, filtering locally");
                let all = self.backend.list_consultations(token).map_err(|e| {
                    warn!(error = %e, "Failed to load consultations");
                    e
                })?;
                Ok(filter_consultations(all, term, limit))
            }
        }
    }

    fn require(&self, role: Role, action: &'static str) -> Result<()> {
        match self.viewer().role {
            Some(current) if current == role => Ok(()),
            Some(current) => Err(BillingError::Forbidden {
                action,
                role: current,
            }),
            None => Err(BillingError::NotAuthenticated),
        }
    }

    fn mutate<F>(&mut self, id: u64, today: NaiveDate, call: F) -> Result<&Invoice>
    where
        F: FnOnce(&B, &str) -> Result<InvoiceRecord>,
    {
        if self.get(id).is_none() {
            return Err(BillingError::InvoiceNotFound(id));
        }

        let token = self.session.bearer()?;
        let record = call(&self.backend, token).map_err(|e| {
            warn!(invoice_id = id, error = %e, "Invoice update failed");
            e
        })?;

        let updated = Invoice::from_record(record, &self.settings.currency, today);
        let index = self
            .invoices
            .iter()
            .position(|inv| inv.id == id)
            .ok_or(BillingError::InvoiceNotFound(id))?;

        info!(invoice_id = id, status = %updated.status, "Invoice updated");
        self.invoices[index] = updated;
        Ok(&self.invoices[index])
    }
}

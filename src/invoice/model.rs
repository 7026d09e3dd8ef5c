use chrono::NaiveDate;
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;

use super::status::api_to_ui_status;

/// Invoice status as stored by the backend
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ApiStatus {
    #[default]
    Pending,
    Paid,
    Cancelled,
    /// Anything the backend sends that we do not recognise
    Unknown,
}

impl ApiStatus {
    /// Never fails; unrecognised values become `Unknown`.
    pub fn parse(raw: &str) -> Self {
        match raw.trim().to_ascii_lowercase().as_str() {
            "pending" => ApiStatus::Pending,
            "paid" => ApiStatus::Paid,
            "cancelled" | "canceled" => ApiStatus::Cancelled,
            _ => ApiStatus::Unknown,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ApiStatus::Pending => "pending",
            ApiStatus::Paid => "paid",
            ApiStatus::Cancelled => "cancelled",
            ApiStatus::Unknown => "unknown",
        }
    }
}

/// Invoice status as shown to users
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, clap::ValueEnum)]
pub enum UiStatus {
    Paid,
    Pending,
    Overdue,
    Failed,
}

impl UiStatus {
    /// Higher is more urgent
    pub fn severity(&self) -> u8 {
        match self {
            UiStatus::Overdue => 3,
            UiStatus::Failed => 2,
            UiStatus::Pending => 1,
            UiStatus::Paid => 0,
        }
    }
}

impl fmt::Display for UiStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            UiStatus::Paid => "Paid",
            UiStatus::Pending => "Pending",
            UiStatus::Overdue => "Overdue",
            UiStatus::Failed => "Failed",
        };
        f.write_str(label)
    }
}

/// Guardian ownership, resolved once when a record is decoded
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Ownership {
    Owned(Vec<u64>),
    #[default]
    Unowned,
}

impl Ownership {
    fn from_fields(fields: [Option<u64>; 3]) -> Self {
        let mut ids: Vec<u64> = Vec::new();
        for id in fields.into_iter().flatten() {
            if !ids.contains(&id) {
                ids.push(id);
            }
        }
        if ids.is_empty() {
            Ownership::Unowned
        } else {
            Ownership::Owned(ids)
        }
    }

    pub fn is_known(&self) -> bool {
        matches!(self, Ownership::Owned(_))
    }

    pub fn is_owned_by(&self, user_id: u64) -> bool {
        match self {
            Ownership::Owned(ids) => ids.contains(&user_id),
            Ownership::Unowned => false,
        }
    }
}

/// Invoice exactly as the backend sends it
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InvoiceRecord {
    #[serde(deserialize_with = "de_id")]
    pub id: u64,
    #[serde(default)]
    pub number: Option<String>,
    #[serde(deserialize_with = "de_date")]
    pub date: NaiveDate,
    #[serde(default, deserialize_with = "de_opt_date")]
    pub due_date: Option<NaiveDate>,
    #[serde(deserialize_with = "de_amount")]
    pub total: f64,
    /// Raw backend value; null or missing parses as `Unknown`
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default, deserialize_with = "de_opt_id")]
    pub consultation_id: Option<u64>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub proof_url: Option<String>,
    #[serde(default)]
    pub proof_uploaded_at: Option<String>,
    #[serde(default, deserialize_with = "de_opt_id")]
    pub owner_user_id: Option<u64>,
    #[serde(default, deserialize_with = "de_opt_id")]
    pub parent_id: Option<u64>,
    #[serde(default, deserialize_with = "de_opt_id")]
    pub user_id: Option<u64>,
}

/// Invoice as the billing screen works with it. Never persisted.
#[derive(Debug, Clone, PartialEq)]
pub struct Invoice {
    pub id: u64,
    pub number: Option<String>,
    pub date: NaiveDate,
    pub due_date: Option<NaiveDate>,
    pub amount: f64,
    pub status: UiStatus,
    pub api_status: ApiStatus,
    pub consultation_id: Option<u64>,
    pub description: String,
    pub proof_url: Option<String>,
    pub proof_uploaded_at: Option<String>,
    pub ownership: Ownership,
    pub currency: String,
}

impl Invoice {
    pub fn from_record(record: InvoiceRecord, currency: &str, today: NaiveDate) -> Self {
        let api_status = ApiStatus::parse(record.status.as_deref().unwrap_or_default());
        let status = api_to_ui_status(api_status, record.due_date, today);
        let description = record
            .description
            .filter(|d| !d.trim().is_empty())
            .unwrap_or_else(|| default_description(record.consultation_id));

        Self {
            id: record.id,
            number: record.number.filter(|n| !n.trim().is_empty()),
            date: record.date,
            due_date: record.due_date,
            amount: record.total,
            status,
            api_status,
            consultation_id: record.consultation_id,
            description,
            proof_url: record.proof_url,
            proof_uploaded_at: record.proof_uploaded_at,
            ownership: Ownership::from_fields([
                record.owner_user_id,
                record.parent_id,
                record.user_id,
            ]),
            currency: currency.to_string(),
        }
    }

    /// Due date, or the issue date when none was set
    pub fn due_or_issue_date(&self) -> NaiveDate {
        self.due_date.unwrap_or(self.date)
    }

    /// Invoice number for display, falling back to the id
    pub fn label(&self) -> String {
        match &self.number {
            Some(number) => number.clone(),
            None => self.id.to_string(),
        }
    }
}

#[cfg(test)]
impl Invoice {
    pub(crate) fn sample(id: u64, amount: f64, status: UiStatus, date: NaiveDate) -> Self {
        Self {
            id,
            number: None,
            date,
            due_date: None,
            amount,
            status,
            api_status: super::status::ui_to_api_status(status),
            consultation_id: None,
            description: default_description(None),
            proof_url: None,
            proof_uploaded_at: None,
            ownership: Ownership::Unowned,
            currency: "EUR".to_string(),
        }
    }
}

pub fn default_description(consultation_id: Option<u64>) -> String {
    match consultation_id {
        Some(id) => format!("Consulta #{id}"),
        None => "Consulta".to_string(),
    }
}

/// Draft collected by the creation form
#[derive(Debug, Clone, Default)]
pub struct NewInvoice {
    pub consultation_id: Option<u64>,
    pub total: Option<f64>,
    pub number: Option<String>,
    pub date: Option<NaiveDate>,
    pub due_date: Option<NaiveDate>,
    pub status: ApiStatus,
    pub description: Option<String>,
}

/// Body of `POST /invoices/:consultationId/invoices`
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct CreateInvoiceBody {
    pub number: Option<String>,
    pub date: NaiveDate,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub due_date: Option<NaiveDate>,
    pub total: f64,
    pub status: ApiStatus,
    pub description: String,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum NumberOrText {
    Int(u64),
    Float(f64),
    Text(String),
}

fn de_id<'de, D: Deserializer<'de>>(deserializer: D) -> Result<u64, D::Error> {
    match NumberOrText::deserialize(deserializer)? {
        NumberOrText::Int(id) => Ok(id),
        NumberOrText::Float(f) if f >= 0.0 && f.fract() == 0.0 => Ok(f as u64),
        NumberOrText::Float(f) => Err(serde::de::Error::custom(format!("invalid id {f}"))),
        NumberOrText::Text(s) => s
            .trim()
            .parse()
            .map_err(|_| serde::de::Error::custom(format!("invalid id '{s}'"))),
    }
}

fn de_opt_id<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<u64>, D::Error> {
    match Option::<NumberOrText>::deserialize(deserializer)? {
        None => Ok(None),
        Some(NumberOrText::Int(id)) => Ok(Some(id)),
        Some(NumberOrText::Float(f)) if f >= 0.0 && f.fract() == 0.0 => Ok(Some(f as u64)),
        Some(NumberOrText::Float(_)) => Ok(None),
        Some(NumberOrText::Text(s)) => Ok(s.trim().parse().ok()),
    }
}

/// Totals arrive either as JSON numbers or as decimal strings
fn de_amount<'de, D: Deserializer<'de>>(deserializer: D) -> Result<f64, D::Error> {
    let value = match NumberOrText::deserialize(deserializer)? {
        NumberOrText::Int(n) => n as f64,
        NumberOrText::Float(f) => f,
        NumberOrText::Text(s) => s
            .trim()
            .parse::<f64>()
            .map_err(|_| serde::de::Error::custom(format!("invalid amount '{s}'")))?,
    };
    if !value.is_finite() {
        return Err(serde::de::Error::custom("amount is not a finite number"));
    }
    Ok(value)
}

/// Accepts `YYYY-MM-DD` and full timestamps; only the date part is kept.
pub fn parse_iso_date(raw: &str) -> Option<NaiveDate> {
    let head = raw.trim().get(..10)?;
    NaiveDate::parse_from_str(head, "%Y-%m-%d").ok()
}

fn de_date<'de, D: Deserializer<'de>>(deserializer: D) -> Result<NaiveDate, D::Error> {
    let raw = String::deserialize(deserializer)?;
    parse_iso_date(&raw).ok_or_else(|| serde::de::Error::custom(format!("invalid date '{raw}'")))
}

fn de_opt_date<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> Result<Option<NaiveDate>, D::Error> {
    match Option::<String>::deserialize(deserializer)? {
        None => Ok(None),
        Some(raw) if raw.trim().is_empty() => Ok(None),
        Some(raw) => parse_iso_date(&raw)
            .map(Some)
            .ok_or_else(|| serde::de::Error::custom(format!("invalid date '{raw}'"))),
    }
}

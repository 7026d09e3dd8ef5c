use std::path::PathBuf;
use thiserror::Error;

use crate::config::Role;

#[derive(Error, Debug)]
pub enum BillingError {
    #[error("Config directory not found at {0}. Run 'aba-billing init' to create it.")]
    ConfigNotFound(PathBuf),

    #[error("Config file not found: {0}")]
    ConfigFileNotFound(PathBuf),

    #[error("Failed to parse config file {path}: {source}")]
    ConfigParse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("Failed to write {path}: {reason}")]
    ConfigWrite { path: PathBuf, reason: String },

    #[error("Config directory already exists at {0}")]
    AlreadyInitialized(PathBuf),

    #[error("Not authenticated. Run 'aba-billing login --token <TOKEN> ...' first.")]
    NotAuthenticated,

    #[error("Role {role} is not allowed to {action}")]
    Forbidden { action: &'static str, role: Role },

    #[error("Invoice #{0} not found")]
    InvoiceNotFound(u64),

    #[error("Select a consultation before creating an invoice")]
    MissingConsultation,

    #[error("Amount must be greater than zero")]
    MissingAmount,

    #[error("Invalid date '{0}'. Expected YYYY-MM-DD.")]
    InvalidDate(String),

    #[error("{message} (HTTP {status})")]
    Api { status: u16, message: String },

    #[error("Request failed: {0}")]
    Transport(String),

    #[error("Unexpected response from server: {0}")]
    Decode(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, BillingError>;

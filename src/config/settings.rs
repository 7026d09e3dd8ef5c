use serde::{Deserialize, Serialize};

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct Config {
    pub api: ApiSettings,
    #[serde(default)]
    pub billing: BillingSettings,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct ApiSettings {
    pub base_url: String,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct BillingSettings {
    #[serde(default = "default_currency")]
    pub currency: String,
    #[serde(default = "default_currency_symbol")]
    pub currency_symbol: String,
    #[serde(default)]
    pub visibility: VisibilityPolicy,
    #[serde(default = "default_search_limit")]
    pub consultation_search_limit: usize,
}

/// What a guardian sees when no invoice carries ownership metadata
#[derive(Debug, Deserialize, Serialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "kebab-case")]
pub enum VisibilityPolicy {
    /// Assume the backend already scoped the list
    #[default]
    FailOpen,
    /// Show nothing
    FailClosed,
}

fn default_timeout_secs() -> u64 {
    15
}

fn default_currency() -> String {
    "EUR".to_string()
}

fn default_currency_symbol() -> String {
    "€".to_string()
}

fn default_search_limit() -> usize {
    20
}

impl Default for BillingSettings {
    fn default() -> Self {
        Self {
            currency: default_currency(),
            currency_symbol: default_currency_symbol(),
            visibility: VisibilityPolicy::default(),
            consultation_search_limit: default_search_limit(),
        }
    }
}

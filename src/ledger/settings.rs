use serde::{Deserialize, Serialize};

/// User-level preferences persisted alongside the ledger collections.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Settings {
    pub base_currency: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            base_currency: "USD".into(),
        }
    }
}

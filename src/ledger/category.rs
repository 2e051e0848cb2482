use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Categorises income and expense activity for reporting.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Category {
    pub id: Uuid,
    pub name: String,
    pub kind: CategoryKind,
    #[serde(default)]
    pub subcategories: Vec<String>,
}

impl Category {
    pub fn new(name: impl Into<String>, kind: CategoryKind) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            kind,
            subcategories: Vec::new(),
        }
    }

    pub fn with_subcategory(mut self, name: impl Into<String>) -> Self {
        self.subcategories.push(name.into());
        self
    }

    /// Case-insensitive name match, ignoring surrounding whitespace.
    pub fn matches(&self, name: &str) -> bool {
        self.name.trim().eq_ignore_ascii_case(name.trim())
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum CategoryKind {
    Expense,
    Income,
}

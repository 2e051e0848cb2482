use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Direction of a transaction. Amounts are stored positive; the type decides the sign.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "camelCase")]
pub enum TransactionType {
    Income,
    Expense,
    InternalTransfer,
    DepositInterestAccrual,
}

impl TransactionType {
    /// Income and expense entries must reference a known category.
    pub fn requires_category(&self) -> bool {
        matches!(self, TransactionType::Income | TransactionType::Expense)
    }

    pub fn is_transfer(&self) -> bool {
        matches!(self, TransactionType::InternalTransfer)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Transaction {
    pub id: Uuid,
    pub date: NaiveDate,
    pub description: String,
    pub amount: Decimal,
    pub currency: String,
    /// Amount expressed in the base currency, filled when `currency` differs from it.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub converted_amount: Option<Decimal>,
    #[serde(rename = "type")]
    pub kind: TransactionType,
    pub category: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subcategory: Option<String>,
    pub account_id: Uuid,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_account_id: Option<Uuid>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub recurring_series_id: Option<Uuid>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub recurring_occurrence_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
}

impl Transaction {
    pub fn new(
        kind: TransactionType,
        account_id: Uuid,
        date: NaiveDate,
        amount: Decimal,
        currency: impl Into<String>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            date,
            description: String::new(),
            amount,
            currency: currency.into(),
            converted_amount: None,
            kind,
            category: String::new(),
            subcategory: None,
            account_id,
            target_account_id: None,
            recurring_series_id: None,
            recurring_occurrence_id: None,
            created_at: Utc::now(),
        }
    }

    pub fn with_category(
        mut self,
        category: impl Into<String>,
        subcategory: Option<String>,
    ) -> Self {
        self.category = category.into();
        self.subcategory = subcategory;
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn with_target_account(mut self, target: Uuid) -> Self {
        self.target_account_id = Some(target);
        self
    }

    pub fn is_recurring(&self) -> bool {
        self.recurring_series_id.is_some()
    }

    /// Demotes the entry to a plain historical record.
    pub fn clear_recurring_link(&mut self) {
        self.recurring_series_id = None;
        self.recurring_occurrence_id = None;
    }

    pub fn touches_account(&self, account_id: Uuid) -> bool {
        self.account_id == account_id || self.target_account_id == Some(account_id)
    }

    /// Amount in the base currency, falling back to the raw amount.
    pub fn base_amount(&self) -> Decimal {
        self.converted_amount.unwrap_or(self.amount)
    }
}

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Represents a balance-bearing account. `balance` is derived from the
/// transaction set and is never edited directly.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Account {
    pub id: Uuid,
    pub name: String,
    pub currency: String,
    #[serde(default)]
    pub initial_balance: Decimal,
    #[serde(default)]
    pub balance: Decimal,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub order: Option<i32>,
}

impl Account {
    /// Creates an account whose balance starts at `initial_balance`.
    pub fn new(
        name: impl Into<String>,
        currency: impl Into<String>,
        initial_balance: Decimal,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            currency: currency.into(),
            initial_balance,
            balance: initial_balance,
            order: None,
        }
    }

    pub fn with_order(mut self, order: i32) -> Self {
        self.order = Some(order);
        self
    }
}

/// Display ordering: explicit order keys first, then by name.
pub fn sort_for_display(accounts: &mut [Account]) {
    accounts.sort_by(|a, b| match (a.order, b.order) {
        (Some(x), Some(y)) => x.cmp(&y).then_with(|| a.name.cmp(&b.name)),
        (Some(_), None) => std::cmp::Ordering::Less,
        (None, Some(_)) => std::cmp::Ordering::Greater,
        (None, None) => a.name.cmp(&b.name),
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ordered_accounts_come_first() {
        let mut accounts = vec![
            Account::new("Zeta", "USD", Decimal::ZERO),
            Account::new("Cash", "USD", Decimal::ZERO).with_order(2),
            Account::new("Alpha", "USD", Decimal::ZERO),
            Account::new("Bank", "USD", Decimal::ZERO).with_order(1),
        ];
        sort_for_display(&mut accounts);
        let names: Vec<_> = accounts.iter().map(|a| a.name.as_str()).collect();
        assert_eq!(names, vec!["Bank", "Cash", "Alpha", "Zeta"]);
    }
}

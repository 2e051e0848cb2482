use chrono::NaiveDate;
use rust_decimal::Decimal;
use uuid::Uuid;

use crate::currency::CurrencyConverter;
use crate::ledger::{Account, Transaction, TransactionType};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Apply,
    Reverse,
}

impl Direction {
    fn sign(self) -> Decimal {
        match self {
            Direction::Apply => Decimal::ONE,
            Direction::Reverse => Decimal::NEGATIVE_ONE,
        }
    }
}

/// Balance arithmetic over account slices. Only entries dated on or before
/// `today` move balances; each leg is converted into its account's currency.
pub struct BalanceService;

impl BalanceService {
    pub fn affects_balance(txn: &Transaction, today: NaiveDate) -> bool {
        txn.date <= today
    }

    /// Applies or reverses the delta of `txn`. Legs whose account is missing
    /// are ignored.
    pub fn apply(
        accounts: &mut [Account],
        txn: &Transaction,
        direction: Direction,
        converter: &dyn CurrencyConverter,
        today: NaiveDate,
    ) {
        if !Self::affects_balance(txn, today) {
            return;
        }
        let sign = direction.sign();
        match txn.kind {
            TransactionType::Income | TransactionType::DepositInterestAccrual => {
                credit(accounts, txn.account_id, txn, sign, converter);
            }
            TransactionType::Expense => {
                credit(accounts, txn.account_id, txn, -sign, converter);
            }
            TransactionType::InternalTransfer => {
                credit(accounts, txn.account_id, txn, -sign, converter);
                if let Some(target) = txn.target_account_id {
                    credit(accounts, target, txn, sign, converter);
                }
            }
        }
    }

    /// Full replay: every balance restarts at its initial value.
    pub fn recompute(
        accounts: &mut [Account],
        transactions: &[Transaction],
        converter: &dyn CurrencyConverter,
        today: NaiveDate,
    ) {
        for account in accounts.iter_mut() {
            account.balance = account.initial_balance;
        }
        for txn in transactions {
            Self::apply(accounts, txn, Direction::Apply, converter, today);
        }
        tracing::debug!(
            accounts = accounts.len(),
            transactions = transactions.len(),
            "recomputed balances"
        );
    }
}

fn credit(
    accounts: &mut [Account],
    account_id: Uuid,
    txn: &Transaction,
    sign: Decimal,
    converter: &dyn CurrencyConverter,
) {
    if let Some(account) = accounts.iter_mut().find(|account| account.id == account_id) {
        let amount = converter.convert(txn.amount, &txn.currency, &account.currency);
        account.balance += sign * amount;
    }
}

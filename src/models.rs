// src/models.rs
use std::fmt;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Deserializer};

/// Direction of a money movement on the tracked account
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(from = "String")]
pub enum Direction {
    Credit,
    Debit,
    Other(String),
}

impl From<String> for Direction {
    fn from(raw: String) -> Self {
        match raw.as_str() {
            "CREDIT" => Direction::Credit,
            "DEBIT" => Direction::Debit,
            _ => Direction::Other(raw),
        }
    }
}

impl Default for Direction {
    fn default() -> Self {
        Direction::Other(String::new())
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Direction::Credit => f.write_str("CREDIT"),
            Direction::Debit => f.write_str("DEBIT"),
            Direction::Other(raw) => f.write_str(raw),
        }
    }
}

/// One row of the account's transaction history as the page publishes it.
///
/// Every field tolerates `null`: a broken row must reach the diff as a bad
/// time for that row alone, not fail the whole page decode.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Transaction {
    #[serde(default, deserialize_with = "null_as_default")]
    pub id: String,
    /// Naive local time, e.g. `2024-01-28T21:11:00`
    #[serde(default, deserialize_with = "null_as_default")]
    pub transaction_time: String,
    #[serde(rename = "type", default, deserialize_with = "null_as_default")]
    pub direction: Direction,
    #[serde(default, deserialize_with = "null_as_default")]
    pub method: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub transaction_amount: Decimal,
    #[serde(default, deserialize_with = "null_as_default")]
    pub fee_amount: Decimal,
    #[serde(default, deserialize_with = "null_as_default")]
    pub narrative: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub other_bank_name: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub other_account_name: String,
    /// Counterparty display name
    #[serde(default, deserialize_with = "null_as_default")]
    pub user_name: String,
}

/// All transactions of one calendar day, newest first
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TransactionGroup {
    #[serde(default, deserialize_with = "null_as_default")]
    pub date: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub count: u32,
    #[serde(default, deserialize_with = "null_as_default")]
    pub transactions: Vec<Transaction>,
}

/// One fetched view of the page: day groups, newest day first
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Snapshot {
    #[serde(default, deserialize_with = "null_as_default")]
    pub groups: Vec<TransactionGroup>,
}

impl Snapshot {
    pub fn transaction_count(&self) -> usize {
        self.groups.iter().map(|g| g.transactions.len()).sum()
    }
}

/// A transaction that passed the watermark, with its resolved event time
#[derive(Debug, Clone)]
pub struct NewTransaction {
    pub transaction: Transaction,
    pub occurred_at: DateTime<Utc>,
}

/// `null` decodes like a missing key
pub(crate) fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn transaction_decodes_from_page_json() {
        let tx: Transaction = serde_json::from_value(json!({
            "id": "abc",
            "bankAccountId": "ba-1",
            "transactionTime": "2024-01-28T21:11:00",
            "type": "CREDIT",
            "method": "TRANSFER",
            "transactionAmount": 100000,
            "feeAmount": 0,
            "narrative": "ung ho",
            "otherBankName": null,
            "userName": "NGUYEN VAN A",
            "donate": null
        }))
        .unwrap();

        assert_eq!(tx.direction, Direction::Credit);
        assert_eq!(tx.transaction_amount, Decimal::from(100000));
        assert_eq!(tx.other_bank_name, "");
        assert_eq!(tx.user_name, "NGUYEN VAN A");
    }

    #[test]
    fn null_fields_decode_to_empty_values() {
        let tx: Transaction = serde_json::from_value(json!({
            "id": "n1",
            "transactionTime": null,
            "type": null,
            "transactionAmount": null,
            "feeAmount": null,
            "narrative": null
        }))
        .unwrap();

        assert_eq!(tx.transaction_time, "");
        assert_eq!(tx.direction, Direction::Other(String::new()));
        assert_eq!(tx.transaction_amount, Decimal::ZERO);

        let snap: Snapshot = serde_json::from_value(json!({ "groups": null })).unwrap();
        assert_eq!(snap.transaction_count(), 0);
        let group: TransactionGroup =
            serde_json::from_value(json!({ "date": null, "count": null, "transactions": null })).unwrap();
        assert!(group.transactions.is_empty());
    }

    #[test]
    fn unknown_direction_is_kept() {
        let d: Direction = serde_json::from_value(json!("REFUND")).unwrap();
        assert_eq!(d, Direction::Other("REFUND".into()));
        assert_eq!(d.to_string(), "REFUND");
    }
}

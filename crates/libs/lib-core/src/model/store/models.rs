use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use crate::error::AppError;

/// Largest amount accepted: 13 integer digits.
const MAX_AMOUNT_INTEGER_DIGITS: u32 = 13;
/// Fraction digits an amount may carry; stored amounts are rescaled to this.
pub const AMOUNT_SCALE: u32 = 2;

/// User entity representing a complete user record from the database.
#[derive(Debug, Clone, FromRow)]
pub struct User {
    pub id: i64,
    pub email: String,
    pub password_hash: String,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}

// region:    --- WireStatus
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum WireStatus {
    Pending,
    Processing,
    Completed,
    Failed,
}

impl WireStatus {
    pub const ALL: [WireStatus; 4] = [
        WireStatus::Pending,
        WireStatus::Processing,
        WireStatus::Completed,
        WireStatus::Failed,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            WireStatus::Pending => "pending",
            WireStatus::Processing => "processing",
            WireStatus::Completed => "completed",
            WireStatus::Failed => "failed",
        }
    }
}

impl fmt::Display for WireStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Invalid status: {0}")]
pub struct ParseStatusError(pub String);

impl FromStr for WireStatus {
    type Err = ParseStatusError;

    /// Exact, case-sensitive match on the stored spelling.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        WireStatus::ALL
            .into_iter()
            .find(|status| status.as_str() == s)
            .ok_or_else(|| ParseStatusError(s.to_string()))
    }
}

impl TryFrom<String> for WireStatus {
    type Error = ParseStatusError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}
// endregion: --- WireStatus

// region:    --- Wire
/// A wire transfer record. Amounts serialize as decimal strings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Wire {
    pub id: i64,
    pub sender_name: String,
    pub recipient_name: String,
    pub amount: Decimal,
    pub currency: String,
    pub status: WireStatus,
    pub reference_number: String,
    pub created_by: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
}

/// Row shape as stored: amount is fixed-point text.
#[derive(Debug, FromRow)]
pub(crate) struct WireRow {
    pub id: i64,
    pub sender_name: String,
    pub recipient_name: String,
    pub amount: String,
    pub currency: String,
    #[sqlx(try_from = "String")]
    pub status: WireStatus,
    pub reference_number: String,
    pub created_by: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
}

pub(crate) const WIRE_COLUMNS: &str = "id, sender_name, recipient_name, amount, currency, status, \
     reference_number, created_by, created_at, updated_at";

impl TryFrom<WireRow> for Wire {
    type Error = AppError;

    fn try_from(row: WireRow) -> Result<Self, Self::Error> {
        let amount = Decimal::from_str(&row.amount).map_err(|e| {
            AppError::Storage(format!("Corrupt amount on wire {}: {}", row.id, e))
        })?;

        Ok(Wire {
            id: row.id,
            sender_name: row.sender_name,
            recipient_name: row.recipient_name,
            amount,
            currency: row.currency,
            status: row.status,
            reference_number: row.reference_number,
            created_by: row.created_by,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

/// One page of an owner's wires plus the unpaginated match count.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WirePage {
    pub wires: Vec<Wire>,
    pub total: i64,
}
// endregion: --- Wire

// region:    --- Wire for create / update
/// Data structure for creating a new wire. Reference number and status are
/// assigned by the store.
#[derive(Debug, Clone)]
pub struct WireForCreate {
    pub sender_name: String,
    pub recipient_name: String,
    pub amount: Decimal,
    pub currency: String,
}

/// Partial update. Only `Some` fields are written.
///
/// `status` stays a raw string so an unknown wire is reported before a bad status.
#[derive(Debug, Clone, Default)]
pub struct WireForUpdate {
    pub sender_name: Option<String>,
    pub recipient_name: Option<String>,
    pub amount: Option<Decimal>,
    pub currency: Option<String>,
    pub status: Option<String>,
}

impl WireForUpdate {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn status(mut self, status: impl Into<String>) -> Self {
        self.status = Some(status.into());
        self
    }

    pub fn sender_name(mut self, sender_name: impl Into<String>) -> Self {
        self.sender_name = Some(sender_name.into());
        self
    }

    pub fn amount(mut self, amount: Decimal) -> Self {
        self.amount = Some(amount);
        self
    }
}
// endregion: --- Wire for create / update

// region:    --- Amount rules
/// Check an amount: strictly positive, at most two fraction digits and
/// thirteen integer digits.
pub fn validate_amount(amount: &Decimal) -> Result<(), String> {
    if amount.is_sign_negative() || amount.is_zero() {
        return Err("must be greater than 0".to_string());
    }
    if amount.normalize().scale() > AMOUNT_SCALE {
        return Err(format!("must have at most {AMOUNT_SCALE} decimal places"));
    }
    if amount.trunc() >= Decimal::from(10_i64.pow(MAX_AMOUNT_INTEGER_DIGITS)) {
        return Err(format!(
            "must have at most {MAX_AMOUNT_INTEGER_DIGITS} digits before the decimal point"
        ));
    }
    Ok(())
}

/// Fixed-point text as stored, always with two fraction digits.
pub(crate) fn amount_to_storage(amount: &Decimal) -> String {
    let mut scaled = *amount;
    scaled.rescale(AMOUNT_SCALE);
    scaled.to_string()
}
// endregion: --- Amount rules

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_parse_is_exact() {
        assert_eq!("processing".parse::<WireStatus>().unwrap(), WireStatus::Processing);
        assert!("Processing".parse::<WireStatus>().is_err());
        assert!("bogus".parse::<WireStatus>().is_err());
        assert_eq!(WireStatus::Failed.to_string(), "failed");
    }

    #[test]
    fn test_validate_amount() {
        assert!(validate_amount(&Decimal::from_str("500.00").unwrap()).is_ok());
        assert!(validate_amount(&Decimal::from_str("0.01").unwrap()).is_ok());
        assert!(validate_amount(&Decimal::from_str("1.50000").unwrap()).is_ok());
        assert!(validate_amount(&Decimal::from_str("9999999999999.99").unwrap()).is_ok());

        assert!(validate_amount(&Decimal::ZERO).is_err());
        assert!(validate_amount(&Decimal::from_str("-5").unwrap()).is_err());
        assert!(validate_amount(&Decimal::from_str("1.005").unwrap()).is_err());
        assert!(validate_amount(&Decimal::from_str("10000000000000").unwrap()).is_err());
    }

    #[test]
    fn test_amount_to_storage_pads_scale() {
        assert_eq!(amount_to_storage(&Decimal::from(500)), "500.00");
        assert_eq!(amount_to_storage(&Decimal::from_str("12.5").unwrap()), "12.50");
    }

    #[test]
    fn test_wire_amount_serializes_as_string() {
        let wire = Wire {
            id: 1,
            sender_name: "Alice".into(),
            recipient_name: "Bob".into(),
            amount: Decimal::from_str("500.00").unwrap(),
            currency: "USD".into(),
            status: WireStatus::Pending,
            reference_number: "WIRE-ABCDEF123456".into(),
            created_by: 1,
            created_at: Utc::now(),
            updated_at: None,
        };
        let json = serde_json::to_value(&wire).unwrap();
        assert_eq!(json["amount"], "500.00");
        assert_eq!(json["status"], "pending");
        assert!(json["updated_at"].is_null());
    }
}

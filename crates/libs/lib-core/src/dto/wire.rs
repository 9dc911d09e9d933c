//! # Wire Transfer Data Transfer Objects
//!
//! - `POST /api/wires` - [`WireCreateRequest`] -> [`Wire`]
//! - `GET /api/wires?page=&page_size=&status=` - [`WireListQuery`] -> [`WireListResponse`]
//! - `PUT /api/wires/{id}` - [`WireUpdateRequest`] -> [`Wire`]
//!
//! Amounts are accepted as JSON numbers or decimal strings and always
//! returned as decimal strings (`"500.00"`).

use lib_utils::validation::{validate_currency_code, validate_length};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::{collect, Validate};
use crate::error::{FieldError, Result};
use crate::model::store::models::{validate_amount, WireForCreate, WireForUpdate};
use crate::model::store::WireQuery;
use crate::model::{Wire, WirePage};

pub const NAME_MAX_LEN: usize = 200;
pub const DEFAULT_CURRENCY: &str = "USD";

fn default_currency() -> String {
    DEFAULT_CURRENCY.to_string()
}

fn name_rule(value: &str, field: &str) -> std::result::Result<(), String> {
    validate_length(value, 1, NAME_MAX_LEN, field)
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WireCreateRequest {
    pub sender_name: String,
    pub recipient_name: String,
    pub amount: Decimal,
    #[serde(default = "default_currency")]
    pub currency: String,
}

impl Validate for WireCreateRequest {
    fn validate(&self) -> std::result::Result<(), Vec<FieldError>> {
        collect(vec![
            ("sender_name", name_rule(&self.sender_name, "sender_name")),
            ("recipient_name", name_rule(&self.recipient_name, "recipient_name")),
            ("amount", validate_amount(&self.amount)),
            ("currency", validate_currency_code(&self.currency)),
        ])
    }
}

impl From<WireCreateRequest> for WireForCreate {
    fn from(req: WireCreateRequest) -> Self {
        Self {
            sender_name: req.sender_name,
            recipient_name: req.recipient_name,
            amount: req.amount,
            currency: req.currency,
        }
    }
}

/// Partial update. `status` is checked by the store, after ownership, so an
/// unknown status yields 400 rather than a validation error.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct WireUpdateRequest {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sender_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub recipient_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub amount: Option<Decimal>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub currency: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
}

impl Validate for WireUpdateRequest {
    fn validate(&self) -> std::result::Result<(), Vec<FieldError>> {
        let mut checks = Vec::new();
        if let Some(sender_name) = &self.sender_name {
            checks.push(("sender_name", name_rule(sender_name, "sender_name")));
        }
        if let Some(recipient_name) = &self.recipient_name {
            checks.push(("recipient_name", name_rule(recipient_name, "recipient_name")));
        }
        if let Some(amount) = &self.amount {
            checks.push(("amount", validate_amount(amount)));
        }
        if let Some(currency) = &self.currency {
            checks.push(("currency", validate_currency_code(currency)));
        }
        collect(checks)
    }
}

impl From<WireUpdateRequest> for WireForUpdate {
    fn from(req: WireUpdateRequest) -> Self {
        Self {
            sender_name: req.sender_name,
            recipient_name: req.recipient_name,
            amount: req.amount,
            currency: req.currency,
            status: req.status,
        }
    }
}

/// Raw query string of `GET /api/wires`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct WireListQuery {
    pub page: Option<u32>,
    pub page_size: Option<u32>,
    pub status: Option<String>,
}

impl WireListQuery {
    pub fn into_query(self) -> Result<WireQuery> {
        WireQuery::new(self.page, self.page_size, self.status.as_deref())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WireListResponse {
    pub wires: Vec<Wire>,
    pub total: i64,
    pub page: u32,
    pub page_size: u32,
    /// True when served from the cache.
    pub cached: bool,
}

impl WireListResponse {
    pub fn new(page: WirePage, query: &WireQuery, cached: bool) -> Self {
        Self {
            wires: page.wires,
            total: page.total,
            page: query.page(),
            page_size: query.page_size(),
            cached,
        }
    }
}

//! Wire types for the cashier API.
//!
//! Field names follow the service's camelCase JSON. The service is loose about
//! scalar types (ages and phone numbers arrive as either strings or numbers,
//! `amountPaid` may hold garbage), so those fields are decoded leniently here
//! instead of failing the whole list.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

// =============================================================================
// Status
// =============================================================================

/// Approval / payment status of a registration or transaction.
///
/// Unknown strings are kept verbatim in [`Status::Other`] so that a status the
/// client does not model still round-trips unchanged.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Status {
    Pending,
    Approved,
    Declined,
    Paid,
    Other(String),
}

impl Status {
    pub fn as_str(&self) -> &str {
        match self {
            Status::Pending => "pending",
            Status::Approved => "approved",
            Status::Declined => "declined",
            Status::Paid => "paid",
            Status::Other(s) => s,
        }
    }

    /// `approved` and `declined` are final; no further transition is offered.
    pub fn is_terminal(&self) -> bool {
        match self {
            Status::Approved | Status::Declined => true,
            Status::Pending | Status::Paid | Status::Other(_) => false,
        }
    }
}

impl From<String> for Status {
    fn from(s: String) -> Self {
        match s.as_str() {
            "pending" => Status::Pending,
            "approved" => Status::Approved,
            "declined" => Status::Declined,
            "paid" => Status::Paid,
            _ => Status::Other(s),
        }
    }
}

impl From<&str> for Status {
    fn from(s: &str) -> Self {
        Status::from(s.to_string())
    }
}

impl From<Status> for String {
    fn from(status: Status) -> Self {
        match status {
            Status::Other(s) => s,
            other => other.as_str().to_string(),
        }
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A status the registrar may set. Resetting to `pending` is not possible
/// through the status endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Approve,
    Decline,
}

impl Decision {
    pub fn status(self) -> Status {
        match self {
            Decision::Approve => Status::Approved,
            Decision::Decline => Status::Declined,
        }
    }
}

impl fmt::Display for Decision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.status().as_str())
    }
}

// =============================================================================
// Amount
// =============================================================================

/// A monetary field exactly as the service sent it.
///
/// [`Amount::value`] coerces it to a number the way the dashboard always has:
/// anything non-numeric counts as zero.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Amount(pub serde_json::Value);

impl Amount {
    pub fn value(&self) -> f64 {
        use serde_json::Value;
        let n = match &self.0 {
            Value::Number(n) => n.as_f64().unwrap_or(0.0),
            Value::String(s) => {
                let s = s.trim();
                if s.is_empty() {
                    0.0
                } else {
                    s.parse::<f64>().unwrap_or(0.0)
                }
            }
            Value::Bool(true) => 1.0,
            Value::Bool(false) | Value::Null | Value::Array(_) | Value::Object(_) => 0.0,
        };
        if n.is_finite() {
            n
        } else {
            0.0
        }
    }
}

/// The value as the service sent it: strings verbatim, null as blank.
impl fmt::Display for Amount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        use serde_json::Value;
        match &self.0 {
            Value::String(s) => f.write_str(s),
            Value::Null => Ok(()),
            other => write!(f, "{other}"),
        }
    }
}

impl From<f64> for Amount {
    fn from(n: f64) -> Self {
        Amount(serde_json::json!(n))
    }
}

impl From<&str> for Amount {
    fn from(s: &str) -> Self {
        Amount(serde_json::Value::String(s.to_string()))
    }
}

/// Accept a string or a number and keep it as text.
fn lenient_string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    use serde_json::Value;
    Ok(match Option::<Value>::deserialize(deserializer)? {
        Some(Value::String(s)) => Some(s),
        Some(Value::Number(n)) => Some(n.to_string()),
        Some(Value::Bool(b)) => Some(b.to_string()),
        Some(Value::Null) | None => None,
        Some(other) => Some(other.to_string()),
    })
}

/// Record ids are normally strings; anything else is kept as its text, and a
/// missing id becomes empty.
fn lenient_id<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(lenient_string(deserializer)?.unwrap_or_default())
}

fn lenient_status<'de, D>(deserializer: D) -> Result<Option<Status>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(lenient_string(deserializer)?.map(Status::from))
}

/// Null or non-array histories read as empty; entries that are not objects
/// are skipped.
fn lenient_transactions<'de, D>(deserializer: D) -> Result<Vec<Transaction>, D::Error>
where
    D: Deserializer<'de>,
{
    use serde_json::Value;
    let items = match Option::<Value>::deserialize(deserializer)? {
        Some(Value::Array(items)) => items,
        _ => return Ok(Vec::new()),
    };
    Ok(items
        .into_iter()
        .filter_map(|item| serde_json::from_value(item).ok())
        .collect())
}

// =============================================================================
// Records
// =============================================================================

/// One entry of a record's payment / approval history.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Transaction {
    #[serde(default, deserialize_with = "lenient_status")]
    pub status: Option<Status>,
    #[serde(default)]
    pub amount: Option<Amount>,
    #[serde(default)]
    pub total_amount: Option<Amount>,
    /// Everything else the service attaches; carried, not interpreted.
    #[serde(flatten)]
    pub metadata: serde_json::Map<String, serde_json::Value>,
}

/// Attendee fields shared by registrations and payments.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Attendee {
    #[serde(default, deserialize_with = "lenient_string")]
    pub region: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub email: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub name: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub gender: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub age: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub mobile: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub recommended_by_role: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub recommender_contact: Option<String>,
}

/// A registration awaiting (or past) registrar approval.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegistrationRecord {
    #[serde(rename = "_id", default, deserialize_with = "lenient_id")]
    pub id: String,
    #[serde(flatten)]
    pub attendee: Attendee,
    #[serde(default, deserialize_with = "lenient_status")]
    pub registration_status: Option<Status>,
    #[serde(default, deserialize_with = "lenient_transactions")]
    pub transactions: Vec<Transaction>,
}

/// A payment submission reviewed on the admin dashboard.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentRecord {
    #[serde(rename = "_id", default, deserialize_with = "lenient_id")]
    pub id: String,
    #[serde(flatten)]
    pub attendee: Attendee,
    #[serde(default)]
    pub amount_paid: Amount,
    #[serde(default, alias = "paymentMode2", deserialize_with = "lenient_string")]
    pub payment_mode: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub date_of_payment: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub transaction_id: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub payment_screenshot: Option<String>,
    #[serde(default, deserialize_with = "lenient_status")]
    pub status: Option<Status>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub created_at: Option<String>,
    #[serde(default, deserialize_with = "lenient_transactions")]
    pub transactions: Vec<Transaction>,
}

impl PaymentRecord {
    /// Outstanding balance as reported by the first transaction, 0 if none.
    pub fn balance_amount(&self) -> f64 {
        self.transactions
            .first()
            .and_then(|tx| tx.total_amount.as_ref())
            .map(Amount::value)
            .unwrap_or(0.0)
    }

    pub fn created_at(&self) -> Option<DateTime<Utc>> {
        let raw = self.created_at.as_deref()?;
        DateTime::parse_from_rfc3339(raw)
            .map(|dt| dt.with_timezone(&Utc))
            .ok()
    }
}

/// Common view over both record kinds, used by filtering and totals.
pub trait Record {
    fn attendee(&self) -> &Attendee;

    /// Status the record is filtered on.
    fn effective_status(&self) -> Status;
}

impl Record for RegistrationRecord {
    fn attendee(&self) -> &Attendee {
        &self.attendee
    }

    fn effective_status(&self) -> Status {
        crate::status::effective_status(self)
    }
}

impl Record for PaymentRecord {
    fn attendee(&self) -> &Attendee {
        &self.attendee
    }

    fn effective_status(&self) -> Status {
        self.status.clone().unwrap_or(Status::Pending)
    }
}

/// Response envelope of every list endpoint.
#[derive(Debug, Clone, Deserialize)]
pub struct ListResponse<T> {
    #[serde(default)]
    pub success: bool,
    #[serde(default = "Vec::new")]
    pub data: Vec<T>,
    #[serde(default)]
    pub message: Option<String>,
}

/// Request body of the status endpoint.
#[derive(Debug, Clone, Serialize)]
pub struct StatusUpdate {
    pub status: Status,
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_status_known_and_unknown_strings() {
        assert_eq!(Status::from("approved"), Status::Approved);
        assert_eq!(Status::from("paid"), Status::Paid);
        let partial = Status::from("partially_paid");
        assert_eq!(partial, Status::Other("partially_paid".to_string()));
        assert_eq!(partial.as_str(), "partially_paid");
        assert!(!partial.is_terminal());
        assert!(Status::Declined.is_terminal());
        assert!(!Status::Pending.is_terminal());
    }

    #[test]
    fn test_status_update_body() {
        let body = serde_json::to_value(StatusUpdate {
            status: Decision::Decline.status(),
        })
        .unwrap();
        assert_eq!(body, json!({ "status": "declined" }));
    }

    #[test]
    fn test_amount_coercion() {
        assert_eq!(Amount::from("100").value(), 100.0);
        assert_eq!(Amount::from(" 42.5 ").value(), 42.5);
        assert_eq!(Amount::from("bad").value(), 0.0);
        assert_eq!(Amount::from("").value(), 0.0);
        assert_eq!(Amount::from("NaN").value(), 0.0);
        assert_eq!(Amount(json!(200)).value(), 200.0);
        assert_eq!(Amount(json!(null)).value(), 0.0);
        assert_eq!(Amount(json!(true)).value(), 1.0);
        assert_eq!(Amount::default().value(), 0.0);
    }

    #[test]
    fn test_amount_displays_raw_value() {
        assert_eq!(Amount::from("bad").to_string(), "bad");
        assert_eq!(Amount(json!(1500)).to_string(), "1500");
        assert_eq!(Amount::default().to_string(), "");
        assert_eq!(Amount::from("bad").value(), 0.0);
    }

    #[test]
    fn test_registration_decodes_lenient_fields() {
        let record: RegistrationRecord = serde_json::from_value(json!({
            "_id": "r1",
            "region": "East Rayalaseema",
            "email": "a@x.com",
            "name": "Anil",
            "age": 34,
            "mobile": 9876543210u64,
            "recommendedByRole": "Pastor",
            "transactions": [
                { "status": "pending", "amount": "500", "note": "first" }
            ]
        }))
        .unwrap();

        assert_eq!(record.id, "r1");
        assert_eq!(record.attendee.age.as_deref(), Some("34"));
        assert_eq!(record.attendee.mobile.as_deref(), Some("9876543210"));
        assert_eq!(record.registration_status, None);
        assert_eq!(record.transactions.len(), 1);
        assert_eq!(record.transactions[0].status, Some(Status::Pending));
        assert_eq!(record.transactions[0].metadata["note"], json!("first"));
    }

    #[test]
    fn test_payment_decodes_alternate_mode_field_and_balance() {
        let record: PaymentRecord = serde_json::from_value(json!({
            "_id": "p1",
            "email": "b@x.com",
            "amountPaid": "1500",
            "paymentMode2": "UPI",
            "status": "paid",
            "createdAt": "2025-11-20T10:15:00.000Z",
            "transactions": [
                { "totalAmount": 2500 },
                { "totalAmount": 100 }
            ]
        }))
        .unwrap();

        assert_eq!(record.payment_mode.as_deref(), Some("UPI"));
        assert_eq!(record.amount_paid.value(), 1500.0);
        assert_eq!(record.status, Some(Status::Paid));
        assert_eq!(record.balance_amount(), 2500.0);
        assert!(record.created_at().is_some());
    }

    #[test]
    fn test_payment_without_transactions_has_zero_balance() {
        let record: PaymentRecord = serde_json::from_value(json!({ "_id": "p2" })).unwrap();
        assert_eq!(record.balance_amount(), 0.0);
        assert_eq!(record.created_at(), None);
    }

    #[test]
    fn test_malformed_row_does_not_sink_the_list() {
        let response: ListResponse<PaymentRecord> = serde_json::from_value(json!({
            "success": true,
            "data": [
                { "_id": "p1", "email": "a@x.com" },
                { "email": "b@x.com", "gender": 1, "name": 42, "status": 3, "transactions": null },
                { "_id": 7, "region": "East X", "transactions": ["junk", { "status": "approved" }] }
            ]
        }))
        .unwrap();

        assert_eq!(response.data.len(), 3);
        let second = &response.data[1];
        assert_eq!(second.id, "");
        assert_eq!(second.attendee.gender.as_deref(), Some("1"));
        assert_eq!(second.attendee.name.as_deref(), Some("42"));
        assert_eq!(second.status, Some(Status::Other("3".to_string())));
        assert!(second.transactions.is_empty());

        let third = &response.data[2];
        assert_eq!(third.id, "7");
        assert_eq!(third.transactions.len(), 1);
        assert_eq!(third.transactions[0].status, Some(Status::Approved));
    }
}

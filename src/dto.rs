//! Wire shapes exchanged with the REST backend.
//!
//! Every DTO tolerates missing and `null` fields; the domain mapping in
//! `models` decides what an absent value means.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

/// Status marker the backend sets on successful responses.
pub const SUCCESS_STATUS: &str = "success";

/// Success envelope: `{ "status": "success", "data": ... }`.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Envelope<T> {
    pub status: Option<String>,
    pub data: Option<T>,
}

impl<T> Envelope<T> {
    pub fn is_success(&self) -> bool {
        self.status.as_deref() == Some(SUCCESS_STATUS)
    }
}

/// Body of a failed HTTP response.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ErrorEnvelope {
    #[serde(default)]
    pub trace: Option<Trace>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Trace {
    /// Human-readable message for client errors.
    #[serde(default)]
    pub msg: Option<String>,
    /// Human-readable message for server errors.
    #[serde(default)]
    pub error: Option<String>,
}

/// Request body for `POST /transactions/mine`.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionsRequest {
    pub booking_status: String,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ProfileDto {
    #[serde(deserialize_with = "lenient::int")]
    pub customer_detail_id: i64,
    #[serde(deserialize_with = "lenient::or_default")]
    pub mobile: String,
    #[serde(deserialize_with = "lenient::or_default")]
    pub email: String,
    #[serde(deserialize_with = "lenient::or_default")]
    pub name: String,
    #[serde(deserialize_with = "lenient::or_default")]
    pub first_name: String,
    #[serde(deserialize_with = "lenient::or_default")]
    pub last_name: String,
    #[serde(deserialize_with = "lenient::or_default")]
    pub customer_type: String,
    #[serde(deserialize_with = "lenient::flag")]
    pub is_mobile_verified: bool,
    #[serde(deserialize_with = "lenient::flag")]
    pub is_email_verified: bool,
    #[serde(deserialize_with = "lenient::or_default")]
    pub status: String,
    /// `"NU"`, `"P"` or `"V"`.
    pub document_verified: Option<String>,
    #[serde(deserialize_with = "lenient::or_default")]
    pub language_code: String,
    #[serde(deserialize_with = "lenient::or_default")]
    pub currency_code: String,
    #[serde(deserialize_with = "lenient::or_default")]
    pub currency_symbol: String,
    #[serde(deserialize_with = "lenient::or_default")]
    pub country_code: String,
    #[serde(deserialize_with = "lenient::or_default")]
    pub documents: Vec<ProfileDocumentDto>,
    #[serde(deserialize_with = "lenient::int")]
    pub total_deliveries: i64,
    #[serde(deserialize_with = "lenient::float")]
    pub co2_saved: f64,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ProfileDocumentDto {
    #[serde(deserialize_with = "lenient::int")]
    pub id: i64,
    #[serde(deserialize_with = "lenient::or_default")]
    pub name: String,
    #[serde(deserialize_with = "lenient::int")]
    pub doc_id: i64,
    /// `"P"`, `"A"`, `"R"` or `"NU"`.
    pub status: Option<String>,
    #[serde(deserialize_with = "lenient::or_default")]
    pub path: String,
    pub details: Value,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TransactionDto {
    #[serde(deserialize_with = "lenient::int")]
    pub booking_detail_id: i64,
    #[serde(deserialize_with = "lenient::int")]
    pub customer_detail_id: i64,
    #[serde(deserialize_with = "lenient::int")]
    pub driver_detail_id: i64,
    #[serde(deserialize_with = "lenient::or_default")]
    pub booking_date: String,
    #[serde(deserialize_with = "lenient::or_default")]
    pub booking_status: String,
    #[serde(deserialize_with = "lenient::or_default")]
    pub booking_type: String,
    #[serde(deserialize_with = "lenient::float")]
    pub total_amount: f64,
    #[serde(deserialize_with = "lenient::or_default")]
    pub pickup_locations: Vec<LocationDto>,
    pub driver_details: Option<DriverDetailsDto>,
    pub from_details: Option<ContactDetailsDto>,
    pub to_details: Option<ContactDetailsDto>,
    #[serde(deserialize_with = "lenient::or_default")]
    pub scheduled_date: String,
    #[serde(deserialize_with = "lenient::or_default")]
    pub scheduled_time: String,
    #[serde(deserialize_with = "lenient::or_default")]
    pub delivered_at: String,
    pub payment_info: Option<PaymentInfoDto>,
    #[serde(deserialize_with = "lenient::or_default")]
    pub service_type: String,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(rename_all = "camelCase", default)]
pub struct LocationDto {
    #[serde(deserialize_with = "lenient::or_default")]
    pub address: String,
    #[serde(deserialize_with = "lenient::float")]
    pub latitude: f64,
    #[serde(deserialize_with = "lenient::float")]
    pub longitude: f64,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(rename_all = "camelCase", default)]
pub struct DriverDetailsDto {
    #[serde(deserialize_with = "lenient::int")]
    pub driver_detail_id: i64,
    #[serde(deserialize_with = "lenient::or_default")]
    pub first_name: String,
    #[serde(deserialize_with = "lenient::or_default")]
    pub last_name: String,
    #[serde(deserialize_with = "lenient::or_default")]
    pub mobile: String,
    #[serde(deserialize_with = "lenient::or_default")]
    pub vehicle_number: String,
    #[serde(deserialize_with = "lenient::or_default")]
    pub profile_pic: String,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ContactDetailsDto {
    #[serde(deserialize_with = "lenient::or_default")]
    pub name: String,
    #[serde(deserialize_with = "lenient::or_default")]
    pub mobile: String,
    #[serde(deserialize_with = "lenient::or_default")]
    pub address: String,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PaymentInfoDto {
    #[serde(deserialize_with = "lenient::or_default")]
    pub payment_mode: String,
    #[serde(deserialize_with = "lenient::or_default")]
    pub payment_status: String,
    #[serde(deserialize_with = "lenient::float")]
    pub amount: f64,
    #[serde(deserialize_with = "lenient::or_default")]
    pub transaction_id: String,
}

/// Deserializers for fields the backend sends inconsistently typed.
///
/// `null`, missing and unparsable values all collapse to zero/false/empty.
mod lenient {
    use super::*;

    pub fn or_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
    where
        D: Deserializer<'de>,
        T: Deserialize<'de> + Default,
    {
        Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
    }

    pub fn int<'de, D>(deserializer: D) -> Result<i64, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = Value::deserialize(deserializer)?;
        Ok(match value {
            Value::Number(n) => n
                .as_i64()
                .or_else(|| n.as_f64().map(|f| f as i64))
                .unwrap_or_default(),
            Value::String(s) => s.trim().parse().unwrap_or_default(),
            _ => 0,
        })
    }

    pub fn float<'de, D>(deserializer: D) -> Result<f64, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = Value::deserialize(deserializer)?;
        Ok(match value {
            Value::Number(n) => n.as_f64().unwrap_or_default(),
            Value::String(s) => s.trim().parse().unwrap_or_default(),
            _ => 0.0,
        })
    }

    pub fn flag<'de, D>(deserializer: D) -> Result<bool, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = Value::deserialize(deserializer)?;
        Ok(match value {
            Value::Bool(b) => b,
            Value::Number(n) => n.as_i64() == Some(1),
            Value::String(s) => matches!(
                s.trim().to_ascii_lowercase().as_str(),
                "1" | "true" | "y" | "yes"
            ),
            _ => false,
        })
    }
}

use crate::dto::{
    ContactDetailsDto, DriverDetailsDto, LocationDto, PaymentInfoDto, ProfileDocumentDto,
    ProfileDto, TransactionDto,
};
use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

// ============ Transaction ============

/// A completed (or otherwise filtered) booking as held in client state.
///
/// Nested value objects are always present; an object missing from the wire
/// becomes its `Default`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transaction {
    pub booking_detail_id: i64,
    /// Owning customer, referenced by id rather than embedded.
    pub customer_detail_id: i64,
    pub driver_detail_id: i64,
    pub booking_date: String,
    pub booking_status: String,
    pub booking_type: String,
    pub total_amount: f64,
    pub pickup_locations: Vec<Location>,
    pub driver_details: DriverDetails,
    pub from_details: ContactDetails,
    pub to_details: ContactDetails,
    pub scheduled_date: String,
    pub scheduled_time: String,
    pub delivered_at: String,
    pub payment_info: PaymentInfo,
    pub service_type: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Location {
    pub address: String,
    pub latitude: f64,
    pub longitude: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DriverDetails {
    pub driver_detail_id: i64,
    pub first_name: String,
    pub last_name: String,
    pub mobile: String,
    pub vehicle_number: String,
    pub profile_pic: String,
}

impl DriverDetails {
    pub fn full_name(&self) -> String {
        join_name(&self.first_name, &self.last_name)
    }
}

/// Sender or receiver of a delivery.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ContactDetails {
    pub name: String,
    pub mobile: String,
    pub address: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PaymentInfo {
    pub payment_mode: String,
    pub payment_status: String,
    pub amount: f64,
    pub transaction_id: String,
}

impl Transaction {
    /// Maps one item of a `/transactions/mine` response.
    pub fn from_dto(dto: TransactionDto) -> Self {
        Self {
            booking_detail_id: dto.booking_detail_id,
            customer_detail_id: dto.customer_detail_id,
            driver_detail_id: dto.driver_detail_id,
            booking_date: dto.booking_date,
            booking_status: dto.booking_status,
            booking_type: dto.booking_type,
            total_amount: dto.total_amount,
            pickup_locations: dto.pickup_locations.into_iter().map(Location::from).collect(),
            driver_details: dto.driver_details.map(DriverDetails::from).unwrap_or_default(),
            from_details: dto.from_details.map(ContactDetails::from).unwrap_or_default(),
            to_details: dto.to_details.map(ContactDetails::from).unwrap_or_default(),
            scheduled_date: dto.scheduled_date,
            scheduled_time: dto.scheduled_time,
            delivered_at: dto.delivered_at,
            payment_info: dto.payment_info.map(PaymentInfo::from).unwrap_or_default(),
            service_type: dto.service_type,
        }
    }

    /// Scheduled pickup as a timestamp, combining the date and time fields.
    pub fn scheduled_at(&self) -> Option<DateTime<Utc>> {
        let combined = format!("{} {}", self.scheduled_date.trim(), self.scheduled_time.trim());
        parse_timestamp(combined.trim())
    }

    pub fn delivered_at_parsed(&self) -> Option<DateTime<Utc>> {
        parse_timestamp(&self.delivered_at)
    }
}

impl From<LocationDto> for Location {
    fn from(dto: LocationDto) -> Self {
        Self {
            address: dto.address,
            latitude: dto.latitude,
            longitude: dto.longitude,
        }
    }
}

impl From<DriverDetailsDto> for DriverDetails {
    fn from(dto: DriverDetailsDto) -> Self {
        Self {
            driver_detail_id: dto.driver_detail_id,
            first_name: dto.first_name,
            last_name: dto.last_name,
            mobile: dto.mobile,
            vehicle_number: dto.vehicle_number,
            profile_pic: dto.profile_pic,
        }
    }
}

impl From<ContactDetailsDto> for ContactDetails {
    fn from(dto: ContactDetailsDto) -> Self {
        Self {
            name: dto.name,
            mobile: dto.mobile,
            address: dto.address,
        }
    }
}

impl From<PaymentInfoDto> for PaymentInfo {
    fn from(dto: PaymentInfoDto) -> Self {
        Self {
            payment_mode: dto.payment_mode,
            payment_status: dto.payment_status,
            amount: dto.amount,
            transaction_id: dto.transaction_id,
        }
    }
}

/// Accepts RFC 3339 or the backend's `YYYY-MM-DD HH:MM[:SS]` (read as UTC).
fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }
    if let Ok(ts) = DateTime::parse_from_rfc3339(raw) {
        return Some(ts.with_timezone(&Utc));
    }
    ["%Y-%m-%d %H:%M:%S", "%Y-%m-%d %H:%M"]
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(raw, fmt).ok())
        .map(|naive| naive.and_utc())
}

// ============ Profile ============

/// KYC state of the customer as a whole.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DocumentVerification {
    NotUploaded,
    Pending,
    Verified,
}

impl DocumentVerification {
    /// Parses the wire code. An absent code means nothing was uploaded yet.
    pub fn from_code(code: Option<&str>) -> Result<Self, MappingError> {
        match code.map(str::trim) {
            None | Some("") | Some("NU") => Ok(Self::NotUploaded),
            Some("P") => Ok(Self::Pending),
            Some("V") => Ok(Self::Verified),
            Some(other) => Err(MappingError::UnknownCode {
                field: "documentVerified",
                code: other.to_string(),
            }),
        }
    }

    pub fn code(&self) -> &'static str {
        match self {
            Self::NotUploaded => "NU",
            Self::Pending => "P",
            Self::Verified => "V",
        }
    }
}

/// Review state of a single uploaded document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DocumentStatus {
    Pending,
    Approved,
    Rejected,
    NotUploaded,
}

impl DocumentStatus {
    pub fn from_code(code: Option<&str>) -> Result<Self, MappingError> {
        match code.map(str::trim) {
            None | Some("") | Some("NU") => Ok(Self::NotUploaded),
            Some("P") => Ok(Self::Pending),
            Some("A") => Ok(Self::Approved),
            Some("R") => Ok(Self::Rejected),
            Some(other) => Err(MappingError::UnknownCode {
                field: "documents[].status",
                code: other.to_string(),
            }),
        }
    }

    pub fn code(&self) -> &'static str {
        match self {
            Self::Pending => "P",
            Self::Approved => "A",
            Self::Rejected => "R",
            Self::NotUploaded => "NU",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProfileDocument {
    pub id: i64,
    /// Display name shown on the documents screen.
    pub name: String,
    /// Server-side document type id.
    pub doc_id: i64,
    pub status: DocumentStatus,
    /// Storage path of the uploaded file.
    pub path: String,
    /// Free-form details attached by the backend.
    pub details: Value,
}

impl ProfileDocument {
    pub fn from_dto(dto: ProfileDocumentDto) -> Result<Self, MappingError> {
        Ok(Self {
            id: dto.id,
            name: dto.name,
            doc_id: dto.doc_id,
            status: DocumentStatus::from_code(dto.status.as_deref())?,
            path: dto.path,
            details: dto.details,
        })
    }
}

/// The signed-in customer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Profile {
    pub customer_detail_id: i64,
    pub mobile: String,
    pub email: String,
    /// Display name; the only field editable locally.
    pub name: String,
    pub first_name: String,
    pub last_name: String,
    pub customer_type: String,
    pub is_mobile_verified: bool,
    pub is_email_verified: bool,
    pub status: String,
    pub document_verified: DocumentVerification,
    pub language_code: String,
    pub currency_code: String,
    pub currency_symbol: String,
    pub country_code: String,
    pub documents: Vec<ProfileDocument>,
    pub completed_deliveries: i64,
    /// Environmental impact metric reported by the backend.
    pub co2_saved: f64,
}

impl Profile {
    /// Maps a `/profile/get` payload, rejecting unknown status codes.
    pub fn from_dto(dto: ProfileDto) -> Result<Self, MappingError> {
        let documents = dto
            .documents
            .into_iter()
            .map(ProfileDocument::from_dto)
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            customer_detail_id: dto.customer_detail_id,
            mobile: dto.mobile,
            email: dto.email,
            name: dto.name,
            first_name: dto.first_name,
            last_name: dto.last_name,
            customer_type: dto.customer_type,
            is_mobile_verified: dto.is_mobile_verified,
            is_email_verified: dto.is_email_verified,
            status: dto.status,
            document_verified: DocumentVerification::from_code(dto.document_verified.as_deref())?,
            language_code: dto.language_code,
            currency_code: dto.currency_code,
            currency_symbol: dto.currency_symbol,
            country_code: dto.country_code,
            documents,
            completed_deliveries: dto.total_deliveries,
            co2_saved: dto.co2_saved,
        })
    }

    /// Display name, falling back to the joined name parts.
    pub fn full_name(&self) -> String {
        if self.name.trim().is_empty() {
            join_name(&self.first_name, &self.last_name)
        } else {
            self.name.clone()
        }
    }

    /// True while the customer has not uploaded any KYC documents.
    pub fn requires_kyc(&self) -> bool {
        self.document_verified == DocumentVerification::NotUploaded
    }

    pub fn document_by_doc_id(&self, doc_id: i64) -> Option<&ProfileDocument> {
        self.documents.iter().find(|d| d.doc_id == doc_id)
    }
}

fn join_name(first: &str, last: &str) -> String {
    [first.trim(), last.trim()]
        .iter()
        .filter(|part| !part.is_empty())
        .copied()
        .collect::<Vec<_>>()
        .join(" ")
}

/// A success payload that does not fit the domain model.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MappingError {
    UnknownCode { field: &'static str, code: String },
}

impl fmt::Display for MappingError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MappingError::UnknownCode { field, code } => {
                write!(f, "Unknown code '{}' for {}", code, field)
            }
        }
    }
}

impl std::error::Error for MappingError {}

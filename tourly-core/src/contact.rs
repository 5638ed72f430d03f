use serde::{Deserialize, Serialize};
use tourly_shared::Masked;

// ============================================================================
// Guest and contact records carried by a booking
// ============================================================================

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum IdType {
    Passport,
    Aadhar,
    DrivingLicense,
    VoterId,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct GuestDetails {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub email: Masked<String>,
    #[serde(default)]
    pub phone: Masked<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub age: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id_type: Option<IdType>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id_number: Option<Masked<String>>,
}

impl GuestDetails {
    pub fn new(name: &str, email: &str, phone: &str) -> Self {
        Self {
            name: name.to_string(),
            email: Masked::from(email),
            phone: Masked::from(phone),
            age: None,
            address: None,
            id_type: None,
            id_number: None,
        }
    }

    /// Names of required fields that are empty after trimming.
    pub fn missing_fields(&self) -> Vec<&'static str> {
        required_missing(&self.name, self.email.expose(), self.phone.expose())
    }
}

/// Primary contact for the booking.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct CustomerInfo {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub email: Masked<String>,
    #[serde(default)]
    pub phone: Masked<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
}

impl CustomerInfo {
    pub fn new(name: &str, email: &str, phone: &str) -> Self {
        Self {
            name: name.to_string(),
            email: Masked::from(email),
            phone: Masked::from(phone),
            address: None,
        }
    }

    pub fn missing_fields(&self) -> Vec<&'static str> {
        required_missing(&self.name, self.email.expose(), self.phone.expose())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct EmergencyContact {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<Masked<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub relationship: Option<String>,
}

fn required_missing(name: &str, email: &str, phone: &str) -> Vec<&'static str> {
    [("name", name), ("email", email), ("phone", phone)]
        .into_iter()
        .filter(|(_, value)| value.trim().is_empty())
        .map(|(field, _)| field)
        .collect()
}

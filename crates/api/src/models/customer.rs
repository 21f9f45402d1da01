//! Customer account types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use priceworth_core::{CustomerId, Email, ShoppingCartId};

/// A registered customer. The password hash is never part of this type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Customer {
    pub id: CustomerId,
    pub email: Email,
    #[serde(flatten)]
    pub profile: CustomerProfile,
    pub active: bool,
    pub shopping_cart_id: ShoppingCartId,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Contact and address details a customer may edit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CustomerProfile {
    #[serde(default)]
    pub first_name: Option<String>,
    #[serde(default)]
    pub last_name: Option<String>,
    #[serde(default)]
    pub gender: Option<String>,
    #[serde(default)]
    pub company: Option<String>,
    #[serde(default)]
    pub street_address: Option<String>,
    #[serde(default)]
    pub suburb: Option<String>,
    #[serde(default)]
    pub city: Option<String>,
    #[serde(default = "default_country")]
    pub country: String,
    #[serde(default)]
    pub state: Option<String>,
    #[serde(default)]
    pub postcode: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    /// Free text, e.g. `01-01-2000`.
    #[serde(default)]
    pub date_of_birth: Option<String>,
}

impl Default for CustomerProfile {
    fn default() -> Self {
        Self {
            first_name: None,
            last_name: None,
            gender: None,
            company: None,
            street_address: None,
            suburb: None,
            city: None,
            country: default_country(),
            state: None,
            postcode: None,
            phone: None,
            date_of_birth: None,
        }
    }
}

fn default_country() -> String {
    "Australia".to_string()
}

/// Registration request body.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Registration {
    pub email: Email,
    pub password: String,
    #[serde(flatten)]
    pub profile: CustomerProfile,
    #[serde(default = "default_active")]
    pub active: bool,
    /// The anonymous cart this customer takes ownership of.
    pub shopping_cart_id: ShoppingCartId,
}

const fn default_active() -> bool {
    true
}

/// Login request body.
#[derive(Debug, Clone, Deserialize)]
pub struct Credentials {
    pub email: Email,
    pub password: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PasswordChange {
    pub password: String,
}

#[derive(Debug, Clone, Copy, Deserialize)]
pub struct ActiveChange {
    pub active: bool,
}

/// Body returned by every login and registration endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenResponse {
    pub token: String,
}

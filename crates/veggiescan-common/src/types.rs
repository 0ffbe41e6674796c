use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Canonical, fully defaulted analysis of one uploaded image.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, utoipa::ToSchema)]
pub struct ScanResult {
    /// Detected vegetable, `Unknown` when the model gave none
    pub vegetable_name: String,
    /// Whether the vegetable is considered safe to eat
    pub safe_to_eat: bool,
    /// Detected disease, `None detected` when healthy
    pub disease_name: String,
    /// Handling advice
    pub recommendation: String,
    /// Confidence score (0-100)
    pub confidence: u8,
    /// When the pipeline produced this result
    pub analysis_date: DateTime<Utc>,
}

impl ScanResult {
    /// Same verdict, ignoring confidence and timestamp. Used to compare a
    /// cached answer with the one it was copied from.
    pub fn same_verdict(&self, other: &ScanResult) -> bool {
        self.vegetable_name == other.vegetable_name
            && self.safe_to_eat == other.safe_to_eat
            && self.disease_name == other.disease_name
            && self.recommendation == other.recommendation
    }
}

/// Persisted scan history row. Never updated after insert.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, utoipa::ToSchema)]
pub struct ScanRecord {
    pub id: String,
    /// Owner of the scan
    pub user_id: String,
    /// SHA-256 hex of the uploaded bytes
    pub image_hash: String,
    pub vegetable_name: String,
    pub safe_to_eat: bool,
    pub disease_name: String,
    pub recommendation: String,
    pub confidence: u8,
    pub analysis_date: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}

/// User account
#[derive(Debug, Clone, Serialize, Deserialize, utoipa::ToSchema)]
pub struct User {
    pub id: String,
    /// Login email (unique)
    pub email: String,
    /// Display name
    pub username: String,
    /// bcrypt hash
    #[serde(skip_serializing)]
    pub password_hash: String,
    /// Administrators see every user's scans and have their uploads archived
    pub is_admin: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Registration request
#[derive(Debug, Clone, Serialize, Deserialize, utoipa::ToSchema)]
pub struct RegisterRequest {
    /// Login email (required)
    pub email: String,
    /// Display name (required)
    pub username: String,
    /// Plain-text password (required)
    pub password: String,
}

/// Login request
#[derive(Debug, Clone, Serialize, Deserialize, utoipa::ToSchema)]
pub struct LoginRequest {
    /// Login email (required)
    pub email: String,
    /// Plain-text password (required)
    pub password: String,
}

/// Token issued by register and login
#[derive(Debug, Clone, Serialize, Deserialize, utoipa::ToSchema)]
pub struct AuthResponse {
    /// JWT access token
    pub access_token: String,
    /// Always `bearer`
    pub token_type: String,
    pub user_id: String,
}

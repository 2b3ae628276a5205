//! Registered user records.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Reader profile collected at registration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    /// Years of software experience. Non-negative by construction.
    pub years_of_experience: u32,
    /// Whether the reader has prior hardware knowledge.
    pub hardware_knowledge: bool,
    /// Free-text favorite programming language.
    pub favorite_language: String,
}

/// A registered account.
///
/// Records are created by sign-up and never mutated or deleted
/// afterwards. The credential is stored verbatim: this is a mock
/// backend with no hashing, and sign-in compares plain equality.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserRecord {
    /// Opaque unique identifier, generated at creation.
    pub id: String,
    /// Registration email; unique within the store, compared exactly
    /// (no case or whitespace normalization).
    pub email: String,
    /// Plaintext credential.
    pub password: String,
    /// Reader profile.
    pub profile: UserProfile,
    /// Creation time.
    pub created_at: DateTime<Utc>,
}

impl UserRecord {
    /// Create a fresh record with a generated id and the current time.
    #[must_use]
    pub fn new(email: impl Into<String>, password: impl Into<String>, profile: UserProfile) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            email: email.into(),
            password: password.into(),
            profile,
            created_at: Utc::now(),
        }
    }
}

//! Sessions and the durable current-session record.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::user::UserRecord;

/// How long a freshly created session is nominally valid.
///
/// Expiry is recorded but never enforced: `current_user` does not check
/// it, matching the mock's behavioral contract.
pub const SESSION_TTL_DAYS: i64 = 7;

/// A time-bounded marker of signed-in state tied to one user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Session {
    /// Opaque session identifier, generated at creation.
    pub id: String,
    /// Owning user identifier.
    pub user_id: String,
    /// Creation time + 7 days.
    pub expires_at: DateTime<Utc>,
}

impl Session {
    /// Open a new session for `user_id`, expiring in seven days.
    #[must_use]
    pub fn open(user_id: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            user_id: user_id.into(),
            expires_at: Utc::now() + Duration::days(SESSION_TTL_DAYS),
        }
    }
}

/// The durable "current session" record.
///
/// At most one of these exists per storage root at a time; each
/// sign-in or sign-up overwrites it, and sign-out removes it. It embeds
/// the full user record so that `current_user` is a single read.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionRecord {
    /// The signed-in user, stored verbatim.
    pub user: UserRecord,
    /// Identifier of the session that signed the user in.
    pub session_id: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_session_expiry_is_seven_days_out() {
        let before = Utc::now();
        let session = Session::open("user-1");
        let after = Utc::now();

        assert!(session.expires_at >= before + Duration::days(7));
        assert!(session.expires_at <= after + Duration::days(7));
    }

    #[test]
    fn test_session_record_wire_format() {
        let user = UserRecord::new(
            "a@example.com",
            "secret",
            crate::auth::UserProfile {
                years_of_experience: 0,
                hardware_knowledge: false,
                favorite_language: "C".to_string(),
            },
        );
        let record = SessionRecord {
            user,
            session_id: "s-1".to_string(),
        };

        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(json["sessionId"], "s-1");
        assert!(json["user"]["email"].is_string());
    }
}

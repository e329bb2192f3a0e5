use bson::{DateTime, oid::ObjectId};
use serde::{Deserialize, Serialize};

use super::team_member::MemberRole;

/// Leader-initiated recruitment offer. Lifecycle is
/// pending -> accepted | declined | expired; terminal states are final.
/// Expiry is recognized lazily at read/respond time.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Invitation {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<ObjectId>,
    pub team_id: ObjectId,
    pub recipient_id: ObjectId,
    pub role: MemberRole,
    pub message: Option<String>,
    pub invited_by: ObjectId,
    pub sent_at: DateTime,
    pub expires_at: DateTime,
    #[serde(default)]
    pub status: InvitationStatus,
    pub created_at: DateTime,
    pub updated_at: DateTime,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum InvitationStatus {
    #[default]
    Pending,
    Accepted,
    Declined,
    Expired,
}

impl Invitation {
    pub const COLLECTION: &'static str = "invitations";

    pub fn is_expired(&self, now: DateTime) -> bool {
        self.expires_at.timestamp_millis() <= now.timestamp_millis()
    }
}

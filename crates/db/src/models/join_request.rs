use bson::{DateTime, oid::ObjectId};
use serde::{Deserialize, Serialize};

/// Student-initiated application to a recruiting team. Unlike
/// invitations, join requests carry no TTL.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JoinRequest {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<ObjectId>,
    pub team_id: ObjectId,
    pub student_id: ObjectId,
    pub message: Option<String>,
    pub requested_at: DateTime,
    #[serde(default)]
    pub status: JoinRequestStatus,
    pub created_at: DateTime,
    pub updated_at: DateTime,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum JoinRequestStatus {
    #[default]
    Pending,
    Accepted,
    Declined,
}

impl JoinRequest {
    pub const COLLECTION: &'static str = "join_requests";
}

use bson::{DateTime, oid::ObjectId};
use serde::{Deserialize, Serialize};

use super::invitation::InvitationStatus;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TeamMember {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<ObjectId>,
    pub team_id: ObjectId,
    pub student_id: ObjectId,
    pub role: MemberRole,
    pub responsibilities: Option<String>,
    pub joined_at: DateTime,
    #[serde(default)]
    pub status: MemberStatus,
    /// How the member was admitted: accepted invitation, accepted join
    /// request, or direct join-code redemption (recorded as accepted).
    pub invitation_status: InvitationStatus,
    pub created_at: DateTime,
    pub updated_at: DateTime,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum MemberStatus {
    #[default]
    Active,
    Inactive,
    Left,
}

/// Roster role: one of the standard labels, or free text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "name", rename_all = "snake_case")]
pub enum MemberRole {
    Standard(StandardRole),
    Custom(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum StandardRole {
    Leader,
    Frontend,
    Backend,
    Fullstack,
    Mobile,
    Design,
    Data,
    MachineLearning,
    Devops,
    Product,
    #[default]
    Member,
}

impl Default for MemberRole {
    fn default() -> Self {
        MemberRole::Standard(StandardRole::Member)
    }
}

impl MemberRole {
    pub fn label(&self) -> String {
        match self {
            MemberRole::Standard(role) => format!("{role:?}").to_lowercase(),
            MemberRole::Custom(name) => name.clone(),
        }
    }
}

impl TeamMember {
    pub const COLLECTION: &'static str = "team_members";
}

use bson::{DateTime, oid::ObjectId};
use serde::{Deserialize, Serialize};

use super::invitation::InvitationStatus;

/// Aggregate root. Roster, invitations, join requests and the activity
/// trail live in their own collections keyed by `team_id`; the mentor
/// binding is a single embedded slot.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Team {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<ObjectId>,
    pub name: String,
    pub description: Option<String>,
    pub logo: Option<String>,
    pub leader_id: ObjectId,
    /// Original founder. Equal to `leader_id` until leadership transfer
    /// exists as an operation.
    pub created_by: ObjectId,
    pub max_team_size: u32,
    #[serde(default)]
    pub is_public: bool,
    #[serde(default)]
    pub is_recruiting: bool,
    pub recruitment_message: Option<String>,
    #[serde(default)]
    pub skills_needed: Vec<String>,
    pub join_code: String,
    pub mentor: Option<MentorLink>,
    #[serde(default)]
    pub status: TeamStatus,
    /// Denormalized count of active roster entries.
    pub member_count: u32,
    pub formation_date: DateTime,
    pub last_activity_at: DateTime,
    pub created_at: DateTime,
    pub updated_at: DateTime,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum TeamStatus {
    #[default]
    Active,
    Inactive,
    Archived,
    Disbanded,
}

/// Single-slot mentor binding, mirrored from an accepted entry in the
/// `mentor_applications` collection.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MentorLink {
    pub mentor_id: ObjectId,
    pub name: String,
    pub joined_at: DateTime,
    pub status: MentorLinkStatus,
    pub invitation_status: InvitationStatus,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MentorLinkStatus {
    Active,
    Inactive,
}

impl Team {
    pub const COLLECTION: &'static str = "teams";

    pub const MIN_SIZE: u32 = 1;
    pub const MAX_SIZE: u32 = 15;

    pub fn has_active_mentor(&self) -> bool {
        matches!(
            &self.mentor,
            Some(link) if link.status == MentorLinkStatus::Active
        )
    }

    pub fn at_capacity(&self, active_members: u64) -> bool {
        active_members >= self.max_team_size as u64
    }
}

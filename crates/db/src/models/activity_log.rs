use bson::{DateTime, oid::ObjectId};
use serde::{Deserialize, Serialize};

/// Append-only audit entry. One per successful mutating operation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActivityLog {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<ObjectId>,
    pub team_id: ObjectId,
    pub action: ActivityAction,
    pub description: String,
    pub actor_id: ObjectId,
    #[serde(default)]
    pub actor_type: ActorType,
    pub created_at: DateTime,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActivityAction {
    TeamCreated,
    TeamDisbanded,
    SettingsUpdated,
    JoinCodeRegenerated,
    MemberJoined,
    MemberRemoved,
    InvitationSent,
    InvitationAccepted,
    InvitationDeclined,
    JoinRequestSent,
    JoinRequestAccepted,
    JoinRequestDeclined,
    MentorApplicationSent,
    MentorApplicationCancelled,
    MentorApplicationRejected,
    MentorJoined,
    MentorFeedback,
    ProjectAdded,
    ProjectUpdated,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ActorType {
    #[default]
    Student,
    Mentor,
    System,
}

impl ActivityLog {
    pub const COLLECTION: &'static str = "activity_logs";
}

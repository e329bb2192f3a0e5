use bson::{DateTime, oid::ObjectId};
use serde::{Deserialize, Serialize};

/// Team-initiated request for a mentor's sponsorship. The accepted entry
/// is the authoritative side of the Team <-> Mentor binding; the team's
/// embedded `mentor` slot mirrors it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MentorApplication {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<ObjectId>,
    pub team_id: ObjectId,
    pub mentor_id: ObjectId,
    pub message: Option<String>,
    #[serde(default)]
    pub status: ApplicationStatus,
    pub applied_at: DateTime,
    pub decided_at: Option<DateTime>,
    /// Set when the team-side mirror write failed after the application
    /// was accepted; picked up by the operator reconciliation queue.
    #[serde(default)]
    pub needs_reconciliation: bool,
    pub created_at: DateTime,
    pub updated_at: DateTime,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ApplicationStatus {
    #[default]
    Pending,
    Accepted,
    Rejected,
    // On the wire for compatibility; no operation currently produces it.
    Waitlisted,
    Cancelled,
}

impl MentorApplication {
    pub const COLLECTION: &'static str = "mentor_applications";
}

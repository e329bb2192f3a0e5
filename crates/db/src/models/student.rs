use bson::oid::ObjectId;
use serde::{Deserialize, Serialize};

use super::team_member::MemberRole;

/// Profile-store summary. Only the fields the workflow engine reads,
/// plus the denormalized membership pointer it writes back
/// (eventually consistent, never authoritative).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Student {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<ObjectId>,
    pub name: String,
    #[serde(default)]
    pub skills: Vec<String>,
    pub institution: Option<String>,
    pub team_id: Option<ObjectId>,
    pub team_role: Option<MemberRole>,
}

impl Student {
    pub const COLLECTION: &'static str = "students";
}

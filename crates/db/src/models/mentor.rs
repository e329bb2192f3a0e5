use bson::oid::ObjectId;
use serde::{Deserialize, Serialize};

/// Profile-store summary of a mentor.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Mentor {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<ObjectId>,
    pub name: String,
    #[serde(default)]
    pub expertise: Vec<String>,
    pub organization: Option<String>,
}

impl Mentor {
    pub const COLLECTION: &'static str = "mentors";
}

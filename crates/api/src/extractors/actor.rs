use axum::{
    extract::FromRequestParts,
    http::request::Parts,
};
use bson::oid::ObjectId;

use crate::error::ApiError;

/// Verified actor identity, supplied by the upstream identity gateway
/// as `X-Actor-Id` / `X-Actor-Type` headers. Identity issuance and
/// verification are out of scope here; the headers are trusted.
#[derive(Debug, Clone, Copy)]
pub struct Actor {
    pub id: ObjectId,
    pub kind: ActorKind,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActorKind {
    Student,
    Mentor,
}

impl Actor {
    pub fn require_student(&self) -> Result<ObjectId, ApiError> {
        match self.kind {
            ActorKind::Student => Ok(self.id),
            ActorKind::Mentor => Err(ApiError::Forbidden(
                "This operation is for students".to_string(),
            )),
        }
    }

    pub fn require_mentor(&self) -> Result<ObjectId, ApiError> {
        match self.kind {
            ActorKind::Mentor => Ok(self.id),
            ActorKind::Student => Err(ApiError::Forbidden(
                "This operation is for mentors".to_string(),
            )),
        }
    }
}

impl<S> FromRequestParts<S> for Actor
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let id = parts
            .headers
            .get("x-actor-id")
            .and_then(|v| v.to_str().ok())
            .ok_or_else(|| ApiError::Unauthorized("Missing X-Actor-Id header".to_string()))?;
        let id = ObjectId::parse_str(id)
            .map_err(|_| ApiError::Unauthorized("Invalid X-Actor-Id header".to_string()))?;

        let kind = parts
            .headers
            .get("x-actor-type")
            .and_then(|v| v.to_str().ok())
            .unwrap_or("student");
        let kind = match kind {
            "student" => ActorKind::Student,
            "mentor" => ActorKind::Mentor,
            _ => {
                return Err(ApiError::Unauthorized(
                    "Invalid X-Actor-Type header".to_string(),
                ));
            }
        };

        Ok(Actor { id, kind })
    }
}

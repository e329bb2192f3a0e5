//! Shared roster validation and admission helpers, used by every path
//! that admits a student (join code, invitation accept, join-request
//! accept). All callers hold the team lock.

use bson::{DateTime, doc, oid::ObjectId};
use teamforge_db::models::{
    InvitationStatus, MemberRole, MemberStatus, Team, TeamMember, TeamStatus,
};

use super::base::{BaseDao, DaoError, DaoResult};

pub async fn active_member_count(
    members: &BaseDao<TeamMember>,
    team_id: ObjectId,
) -> DaoResult<u64> {
    members
        .count(doc! { "team_id": team_id, "status": "active" })
        .await
}

pub async fn find_active_member(
    members: &BaseDao<TeamMember>,
    team_id: ObjectId,
    student_id: ObjectId,
) -> DaoResult<Option<TeamMember>> {
    members
        .find_one(doc! {
            "team_id": team_id,
            "student_id": student_id,
            "status": "active",
        })
        .await
}

pub fn require_leader(team: &Team, actor_id: ObjectId) -> DaoResult<()> {
    if team.leader_id != actor_id {
        return Err(DaoError::Forbidden(
            "Only the team leader can perform this action".to_string(),
        ));
    }
    Ok(())
}

pub fn require_capacity(team: &Team, active_members: u64) -> DaoResult<()> {
    if team.at_capacity(active_members) {
        return Err(DaoError::Conflict("Team is at capacity".to_string()));
    }
    Ok(())
}

/// A student may be an active member of at most one non-disbanded team
/// globally. Checked at every admission, after any earlier membership
/// may have changed.
pub async fn assert_free_agent(
    members: &BaseDao<TeamMember>,
    teams: &BaseDao<Team>,
    student_id: ObjectId,
) -> DaoResult<()> {
    let memberships = members
        .find_many(doc! { "student_id": student_id, "status": "active" }, None)
        .await?;

    for membership in memberships {
        let team = teams.find_by_id(membership.team_id).await?;
        if team.status != TeamStatus::Disbanded {
            return Err(DaoError::Conflict(
                "Student is already a member of another team".to_string(),
            ));
        }
    }
    Ok(())
}

/// Inserts the roster entry (or reactivates a `left` one, which the
/// `(team_id, student_id)` unique index would otherwise reject) and
/// bumps the denormalized member count.
pub async fn admit(
    members: &BaseDao<TeamMember>,
    teams: &BaseDao<Team>,
    team_id: ObjectId,
    student_id: ObjectId,
    role: MemberRole,
) -> DaoResult<TeamMember> {
    let existing = members
        .find_one(doc! { "team_id": team_id, "student_id": student_id })
        .await?;

    let member = match existing {
        Some(previous) if previous.status == MemberStatus::Active => {
            return Err(DaoError::Conflict(
                "Student is already a member of this team".to_string(),
            ));
        }
        Some(previous) => {
            let reactivated = members
                .update_by_id(
                    previous.id.expect("loaded member has id"),
                    doc! { "$set": {
                        "status": "active",
                        "role": bson::to_bson(&role)?,
                        "joined_at": DateTime::now(),
                        "invitation_status": "accepted",
                    }},
                )
                .await?;
            if !reactivated {
                return Err(DaoError::Conflict(
                    "Student is already a member of this team".to_string(),
                ));
            }
            members.find_by_id(previous.id.expect("loaded member has id")).await?
        }
        None => {
            let now = DateTime::now();
            let member = TeamMember {
                id: None,
                team_id,
                student_id,
                role,
                responsibilities: None,
                joined_at: now,
                status: MemberStatus::Active,
                invitation_status: InvitationStatus::Accepted,
                created_at: now,
                updated_at: now,
            };
            let id = members.insert_one(&member).await?;
            members.find_by_id(id).await?
        }
    };

    teams
        .update_by_id(team_id, doc! { "$inc": { "member_count": 1 } })
        .await?;

    Ok(member)
}

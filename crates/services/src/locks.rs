use bson::oid::ObjectId;
use dashmap::DashMap;
use std::sync::Arc;
use tokio::sync::{Mutex, OwnedMutexGuard};

/// Per-team exclusive locks. The team aggregate is the unit of
/// concurrency control: every roster / invitation / join-request /
/// settings / mentor-link mutation holds the team's lock for the
/// read-validate-write span and releases it before any external I/O
/// (pointer sync, notifications).
#[derive(Default)]
pub struct TeamLocks {
    locks: DashMap<ObjectId, Arc<Mutex<()>>>,
}

impl TeamLocks {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn acquire(&self, team_id: ObjectId) -> OwnedMutexGuard<()> {
        let lock = self.locks.entry(team_id).or_default().clone();
        lock.lock_owned().await
    }
}

/// Per-student exclusive locks. The one-led-team and one-active-membership
/// rules span teams, so a team lock alone cannot serialize two admissions
/// of the same student into different teams. Every path that checks those
/// rules and then admits (team create, code join, invitation accept,
/// join-request accept) holds the student's lock across the check and the
/// roster write.
///
/// Lock order is fixed: student lock first, then team lock. No path takes
/// them the other way around, which keeps the two registries
/// deadlock-free.
#[derive(Default)]
pub struct StudentLocks {
    locks: DashMap<ObjectId, Arc<Mutex<()>>>,
}

impl StudentLocks {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn acquire(&self, student_id: ObjectId) -> OwnedMutexGuard<()> {
        let lock = self.locks.entry(student_id).or_default().clone();
        lock.lock_owned().await
    }
}

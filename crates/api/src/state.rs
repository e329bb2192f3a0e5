use mongodb::Database;
use std::sync::Arc;
use teamforge_config::Settings;
use teamforge_services::{
    StudentLocks, TeamLocks,
    dao::{
        activity::ActivityDao, mentor::MentorDao, profile::ProfileDao,
        recruitment::RecruitmentDao, team::TeamDao,
    },
};

#[derive(Clone)]
pub struct AppState {
    pub db: Database,
    pub settings: Settings,
    pub teams: Arc<TeamDao>,
    pub recruitment: Arc<RecruitmentDao>,
    pub mentors: Arc<MentorDao>,
    pub activity: Arc<ActivityDao>,
    pub profiles: Arc<ProfileDao>,
}

impl AppState {
    pub fn new(db: Database, settings: Settings) -> Self {
        let locks = Arc::new(TeamLocks::new());
        let student_locks = Arc::new(StudentLocks::new());
        let profiles = Arc::new(ProfileDao::new(
            &db,
            settings.reconcile.pointer_sync_retries,
        ));
        let teams = Arc::new(TeamDao::new(
            &db,
            Arc::clone(&locks),
            Arc::clone(&student_locks),
            Arc::clone(&profiles),
            settings.recruitment.clone(),
        ));
        let recruitment = Arc::new(RecruitmentDao::new(
            &db,
            Arc::clone(&locks),
            Arc::clone(&student_locks),
            Arc::clone(&profiles),
            settings.recruitment.clone(),
        ));
        let mentors = Arc::new(MentorDao::new(
            &db,
            Arc::clone(&locks),
            Arc::clone(&profiles),
            settings.reconcile.max_retries,
        ));
        let activity = Arc::new(ActivityDao::new(&db));

        Self {
            db,
            settings,
            teams,
            recruitment,
            mentors,
            activity,
            profiles,
        }
    }
}

pub mod activity_log;
pub mod invitation;
pub mod join_request;
pub mod mentor;
pub mod mentor_application;
pub mod project;
pub mod student;
pub mod team;
pub mod team_member;

pub use activity_log::{ActivityAction, ActivityLog, ActorType};
pub use invitation::{Invitation, InvitationStatus};
pub use join_request::{JoinRequest, JoinRequestStatus};
pub use mentor::Mentor;
pub use mentor_application::{ApplicationStatus, MentorApplication};
pub use project::{Project, ProjectStatus};
pub use student::Student;
pub use team::{MentorLink, MentorLinkStatus, Team, TeamStatus};
pub use team_member::{MemberRole, MemberStatus, StandardRole, TeamMember};

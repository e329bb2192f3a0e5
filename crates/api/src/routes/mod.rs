pub mod activity;
pub mod mentor;
pub mod recruitment;
pub mod team;

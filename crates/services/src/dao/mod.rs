pub mod activity;
pub mod base;
pub mod mentor;
pub mod profile;
pub mod recruitment;
pub mod roster;
pub mod team;

pub use base::BaseDao;

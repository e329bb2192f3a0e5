pub mod dao;
pub mod locks;

pub use dao::*;
pub use locks::{StudentLocks, TeamLocks};

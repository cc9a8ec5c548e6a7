pub mod attendance;
pub mod bot_user;
pub mod brigade;
pub mod role;
pub mod specialization;
pub mod task;
pub mod worker;

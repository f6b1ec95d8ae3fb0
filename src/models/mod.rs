pub mod broadcast;
pub mod update;
pub mod user;

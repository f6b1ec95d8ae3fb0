//! Chat-platform bot backend: registers every user who talks to it and
//! lets authorized operators broadcast a message to all of them, now or
//! after a delay.

pub mod bot;
pub mod broadcast;
pub mod config;
pub mod db;
pub mod error;
pub mod models;
pub mod routes;
pub mod session;
pub mod state;
pub mod transport;

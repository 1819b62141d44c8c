//! WayPoint — career guidance server.

pub mod assessment;
pub mod auth;
pub mod backend;
pub mod community;
pub mod config;
pub mod educator;
pub mod error;
pub mod learning;
pub mod notify;
pub mod server;
pub mod store;

//! Terminal stock dashboard: a reducer-driven store fed by concurrent fetch
//! tasks, an auto-refresh poller, and preferences that survive restarts.

pub mod app;
pub mod config;
pub mod debug_hooks;
pub mod guard;
pub mod persist;
pub mod poller;

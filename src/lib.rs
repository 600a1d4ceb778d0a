pub mod commands;
pub mod config;
pub mod error;
pub mod models;
pub mod presenter;
pub mod redmine;
pub mod store;
pub mod timer;
pub mod tracker;

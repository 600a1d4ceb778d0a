pub mod catalog;
pub mod credentials;
pub mod daily;
pub mod entries;
pub mod log;
pub mod prompt;
pub mod tasks;
pub mod timer;

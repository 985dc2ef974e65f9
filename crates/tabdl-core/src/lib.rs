pub mod config;
pub mod logging;

pub mod catalog;
pub mod materialize;
pub mod naming;
pub mod pacing;
pub mod repair;
pub mod resolve;
pub mod retry;
pub mod scheduler;
pub mod source;
pub mod storage;

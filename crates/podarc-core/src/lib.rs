pub mod config;
pub mod logging;

pub mod archive;
pub mod atomic;
pub mod checksum;
pub mod embed;
pub mod feed;
pub mod manifest;
pub mod planner;
pub mod policy;
pub mod retry;
pub mod scheduler;
pub mod transport;
pub mod verify;

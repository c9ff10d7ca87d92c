// src/lib.rs

pub mod config;
pub mod coordinator;
pub mod platforms;
pub mod services;

pub use config::{BotConfig, RuntimeOptions};
pub use coordinator::RequestCoordinator;
pub use tunebot_common::error::Error;

// File: tunebot-core/src/platforms/mod.rs

pub mod discord;
pub mod youtube;

// File: tunebot-core/src/platforms/youtube/requests/mod.rs

pub mod search;

// File: tunebot-common/src/models/mod.rs
pub mod request;
pub mod voice;

pub use request::{DownloadTarget, PlaybackRequest, RequestId, RequestOutcome, SearchHit};
pub use voice::PlaybackSignal;

// File: tunebot-common/src/models/voice.rs

/// What a voice session reports once a track stops.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PlaybackSignal {
    /// Track played to the end (the "idle" signal).
    Finished,
    /// Playback faulted. The string is for logs only.
    Failed(String),
}

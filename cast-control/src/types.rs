use std::fmt;

/// Transport state derived from a GetTransportInfo query
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PlaybackState {
    Stopped,
    Playing,
    Paused,
    Transitioning,
    Unknown,
}

impl PlaybackState {
    /// Map a `CurrentTransportState` value
    pub fn from_transport_state(state: &str) -> Self {
        match state.trim() {
            "STOPPED" | "NO_MEDIA_PRESENT" => PlaybackState::Stopped,
            "PLAYING" => PlaybackState::Playing,
            "PAUSED_PLAYBACK" | "PAUSED_RECORDING" => PlaybackState::Paused,
            "TRANSITIONING" => PlaybackState::Transitioning,
            _ => PlaybackState::Unknown,
        }
    }
}

impl fmt::Display for PlaybackState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            PlaybackState::Stopped => "stopped",
            PlaybackState::Playing => "playing",
            PlaybackState::Paused => "paused",
            PlaybackState::Transitioning => "transitioning",
            PlaybackState::Unknown => "unknown",
        };
        f.write_str(name)
    }
}

/// Elapsed and total time of the current track
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PositionInfo {
    pub elapsed_millis: u64,
    pub duration_millis: u64,
}

/// The media currently loaded on a renderer
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct MediaInfo {
    pub uri: String,
    pub metadata: String,
    pub duration_millis: u64,
}

/// Token for content loaded with `cast`
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ContentHandle {
    uri: String,
}

impl ContentHandle {
    pub(crate) fn new(uri: impl Into<String>) -> Self {
        Self { uri: uri.into() }
    }

    pub fn uri(&self) -> &str {
        &self.uri
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("PLAYING", PlaybackState::Playing)]
    #[case("STOPPED", PlaybackState::Stopped)]
    #[case("NO_MEDIA_PRESENT", PlaybackState::Stopped)]
    #[case("PAUSED_PLAYBACK", PlaybackState::Paused)]
    #[case("PAUSED_RECORDING", PlaybackState::Paused)]
    #[case("TRANSITIONING", PlaybackState::Transitioning)]
    #[case("RECORDING", PlaybackState::Unknown)]
    #[case("", PlaybackState::Unknown)]
    fn test_transport_state_mapping(#[case] raw: &str, #[case] expected: PlaybackState) {
        assert_eq!(PlaybackState::from_transport_state(raw), expected);
    }
}

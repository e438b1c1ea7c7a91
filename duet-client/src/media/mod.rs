use crate::error::MediaError;
use async_trait::async_trait;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TrackKind {
    Audio,
    Video,
}

impl fmt::Display for TrackKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Audio => f.write_str("audio"),
            Self::Video => f.write_str("video"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MediaTrack {
    pub id: String,
    pub kind: TrackKind,
}

impl MediaTrack {
    pub fn new(id: impl Into<String>, kind: TrackKind) -> Self {
        Self {
            id: id.into(),
            kind,
        }
    }
}

/// Tracks captured from the local devices for one call.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LocalMedia {
    pub tracks: Vec<MediaTrack>,
}

/// Access to the local camera and microphone.
///
/// `acquire` may wait on a human (a permission prompt) for as long as it
/// likes; callers never hold shared locks across it.
#[async_trait]
pub trait MediaSource: Send + Sync + 'static {
    async fn acquire(&self) -> Result<LocalMedia, MediaError>;

    /// Stop the given tracks. Called once per successful `acquire`.
    async fn release(&self, media: LocalMedia);
}

/// A media source with a fixed answer, for headless peers and tests.
#[derive(Debug, Clone)]
pub struct StaticMediaSource {
    outcome: Result<LocalMedia, MediaError>,
}

impl StaticMediaSource {
    /// One audio and one video track, like a browser `getUserMedia` with both
    /// constraints enabled.
    pub fn audio_video() -> Self {
        Self {
            outcome: Ok(LocalMedia {
                tracks: vec![
                    MediaTrack::new("audio-0", TrackKind::Audio),
                    MediaTrack::new("video-0", TrackKind::Video),
                ],
            }),
        }
    }

    pub fn with_tracks(tracks: Vec<MediaTrack>) -> Self {
        Self {
            outcome: Ok(LocalMedia { tracks }),
        }
    }

    pub fn denied() -> Self {
        Self {
            outcome: Err(MediaError::PermissionDenied),
        }
    }
}

#[async_trait]
impl MediaSource for StaticMediaSource {
    async fn acquire(&self) -> Result<LocalMedia, MediaError> {
        self.outcome.clone()
    }

    async fn release(&self, _media: LocalMedia) {}
}

use std::sync::Arc;

use crate::backend::{CommandOutcome, TransportCommand};
use crate::transport::TransportShared;

/// Point-in-time metadata for one media session, captured during a single
/// enumeration pass.
///
/// Snapshots are never patched after construction; a new enumeration
/// produces entirely new instances.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct SessionSnapshot {
    /// Application that owns the session (i.e. the media player). Never
    /// absent, but empty when the OS can't say.
    pub source_app: String,

    /// Media artist; empty when unavailable.
    pub artist: String,

    /// Media title; empty when unavailable.
    pub title: String,

    /// Playback duration in seconds; 0 when unavailable.
    pub duration_seconds: u64,

    /// Playback position in seconds; 0 when unavailable. The OS does not
    /// guarantee `position <= duration` and neither do we.
    pub position_seconds: u64,

    /// Whether media is playing, as opposed to paused or stopped.
    pub is_playing: bool,
}

/// Owned cover-art bytes for one session. Always a private copy; the OS
/// stream it came from is closed before enumeration returns.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Thumbnail {
    bytes: Vec<u8>,
}

impl Thumbnail {
    pub fn new(bytes: Vec<u8>) -> Self {
        Self { bytes }
    }

    pub fn empty() -> Self {
        Self::default()
    }

    /// Whether there is any image data at all.
    pub fn has_image(&self) -> bool {
        !self.bytes.is_empty()
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

/// One live media session as the application sees it: an opaque handle, a
/// snapshot, a thumbnail, and the ability to send transport commands back
/// to the player that owns it.
///
/// A session object goes stale the moment the underlying player session
/// ends; there is no notification. Staleness shows up as control methods
/// returning `false`. Re-enumerate to get fresh objects.
#[derive(Clone)]
pub struct MediaSession {
    handle: u32,
    snapshot: SessionSnapshot,
    thumbnail: Thumbnail,
    transport: Arc<TransportShared>,
}

impl MediaSession {
    pub(crate) fn new(
        handle: u32,
        snapshot: SessionSnapshot,
        thumbnail: Thumbnail,
        transport: Arc<TransportShared>,
    ) -> Self {
        Self {
            handle,
            snapshot,
            thumbnail,
            transport,
        }
    }

    /// Opaque handle for this session. Stable for as long as the
    /// underlying player session stays alive; not an enumeration index.
    pub fn handle(&self) -> u32 {
        self.handle
    }

    pub fn source_app(&self) -> &str {
        &self.snapshot.source_app
    }

    pub fn artist(&self) -> &str {
        &self.snapshot.artist
    }

    pub fn title(&self) -> &str {
        &self.snapshot.title
    }

    pub fn duration_seconds(&self) -> u64 {
        self.snapshot.duration_seconds
    }

    pub fn position_seconds(&self) -> u64 {
        self.snapshot.position_seconds
    }

    pub fn is_playing(&self) -> bool {
        self.snapshot.is_playing
    }

    pub fn has_thumbnail(&self) -> bool {
        self.thumbnail.has_image()
    }

    pub fn thumbnail(&self) -> &Thumbnail {
        &self.thumbnail
    }

    pub fn snapshot(&self) -> &SessionSnapshot {
        &self.snapshot
    }

    /// Start or resume playback.
    pub fn play(&self) -> bool {
        self.dispatch(TransportCommand::Play).succeeded
    }

    /// Pause playback.
    pub fn pause(&self) -> bool {
        self.dispatch(TransportCommand::Pause).succeeded
    }

    /// Flip between playing and paused. The outcome carries the playback
    /// state the backend observed right after the toggle; on
    /// `PlaybackState::Unknown`, re-enumerate to learn where it landed.
    pub fn toggle_play(&self) -> CommandOutcome {
        self.dispatch(TransportCommand::TogglePlay)
    }

    /// Stop playback.
    pub fn stop(&self) -> bool {
        self.dispatch(TransportCommand::Stop).succeeded
    }

    /// Skip to the next media in the queue, if there is any.
    pub fn next(&self) -> bool {
        self.dispatch(TransportCommand::Next).succeeded
    }

    /// Skip back to the previous media in the queue, if there is any.
    pub fn previous(&self) -> bool {
        self.dispatch(TransportCommand::Previous).succeeded
    }

    fn dispatch(&self, command: TransportCommand) -> CommandOutcome {
        self.transport.dispatch(self.handle, command)
    }
}

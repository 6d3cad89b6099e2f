use std::fmt;

use crate::transport::ControlError;

// Module is the OS-layer seam: everything above it is platform-independent.

/// Identity of one OS-level media session, as stable as the OS lets it be.
///
/// The source app id alone is not unique (one player can own several
/// sessions), so an occurrence ordinal in OS enumeration order
/// disambiguates. The bridge never retains a raw OS session reference;
/// it re-resolves this key at point of use instead.
///
/// Known weakness: the ordinal is positional *within one app*. While an
/// app owns a single session (the overwhelming case) the key is exact;
/// when an app owns several and one of them ends, its surviving siblings
/// re-derive to lower ordinals, so a handle held across that churn can
/// land on a sibling session of the same player. The OS exposes no
/// per-session identifier that would close this gap; commands can still
/// never cross over to a different application.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct SessionKey {
    pub source_app: String,
    pub ordinal: u32,
}

impl fmt::Display for SessionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}#{}", self.source_app, self.ordinal)
    }
}

/// One OS session as the backend saw it during a single enumeration pass.
/// All buffers are owned copies; nothing aliases OS-internal storage.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct NativeSession {
    pub key: SessionKey,
    pub artist: String,
    pub title: String,
    pub duration_seconds: u64,
    pub position_seconds: u64,
    pub is_playing: bool,
    pub thumbnail: Vec<u8>,
}

/// The six transport commands every backend must accept.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TransportCommand {
    Play,
    Pause,
    TogglePlay,
    Stop,
    Next,
    Previous,
}

impl fmt::Display for TransportCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            TransportCommand::Play => "play",
            TransportCommand::Pause => "pause",
            TransportCommand::TogglePlay => "toggle-play",
            TransportCommand::Stop => "stop",
            TransportCommand::Next => "next",
            TransportCommand::Previous => "previous",
        };
        write!(f, "{}", name)
    }
}

/// Playback state observed right after a command, where the backend can
/// tell. `Unknown` means the caller has to re-enumerate to find out.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum PlaybackState {
    Playing,
    Paused,
    #[default]
    Unknown,
}

/// Result of one dispatched command: the OS layer's own success verdict,
/// plus the playback state that resulted when it is observable (only
/// toggle-play reports one today).
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct CommandOutcome {
    pub succeeded: bool,
    pub resulting_state: PlaybackState,
}

impl CommandOutcome {
    pub fn failed() -> Self {
        Self {
            succeeded: false,
            resulting_state: PlaybackState::Unknown,
        }
    }

    pub fn succeeded_with(state: PlaybackState) -> Self {
        Self {
            succeeded: true,
            resulting_state: state,
        }
    }
}

/// Contract every OS backend implements (Commands + Snapshots)
pub trait SessionBackend: Send + Sync {
    /// Snapshot every currently live OS session, in OS enumeration order.
    /// `None` when the session-manager connection is unavailable, which is
    /// not the same as an empty list.
    fn enumerate(&self) -> Option<Vec<NativeSession>>;

    /// Issue `command` against the live session matching `key`. The bool
    /// inside the outcome is the OS layer's verdict, verbatim; no retry.
    fn send_command(
        &self,
        key: &SessionKey,
        command: TransportCommand,
    ) -> Result<CommandOutcome, ControlError>;
}

// ==============================================================
// OS SELECTION FACTORY
// ==============================================================

#[cfg(target_os = "windows")]
mod windows;
#[cfg(target_os = "windows")]
pub type PlatformBackend = windows::WindowsBackend;

// Fallback for unsupported OS. Non-Windows backends would slot in here the
// same way: a module plus a PlatformBackend alias behind the right cfg.
#[cfg(not(target_os = "windows"))]
mod dummy;
#[cfg(not(target_os = "windows"))]
pub type PlatformBackend = dummy::DummyBackend;

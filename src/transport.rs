use std::sync::{Arc, Mutex, OnceLock};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::backend::{
    CommandOutcome, PlatformBackend, SessionBackend, SessionKey, TransportCommand,
};
use crate::registry::HandleRegistry;
use crate::session::{MediaSession, SessionSnapshot, Thumbnail};

/// Bounded-wait budgets for the OS calls behind enumeration and dispatch,
/// in milliseconds. One slow session must never stall the whole batch, so
/// every per-field OS wait runs against one of these.
///
/// Applications that persist their settings can embed this struct and hand
/// it to [`init_with_config`]; [`init`] uses the defaults.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransportConfig {
    /// One-time session-manager acquisition.
    pub manager_timeout_ms: u64,

    /// Per-session metadata read during enumeration.
    pub properties_timeout_ms: u64,

    /// Per-session cover-art stream read during enumeration.
    pub thumbnail_timeout_ms: u64,

    /// A single transport command round-trip.
    pub command_timeout_ms: u64,
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            manager_timeout_ms: 5000,
            properties_timeout_ms: 3000,
            thumbnail_timeout_ms: 1000,
            command_timeout_ms: 3000,
        }
    }
}

/// Why a control dispatch failed, before the public surface flattens it to
/// `false`. Only log lines ever see the distinction; callers get the plain
/// boolean contract.
#[derive(Debug, Error)]
pub enum ControlError {
    #[error("no live session for handle {0}")]
    StaleHandle(u32),

    #[error("session {0} disappeared before the command reached it")]
    SessionGone(SessionKey),

    #[cfg(target_os = "windows")]
    #[error(transparent)]
    Platform(#[from] windows::core::Error),
}

/// State shared between the transport and every session object it hands
/// out: the backend connection plus the handle table. Registry access is
/// serialized by the lock, and a dispatch holds the lock across its whole
/// backend round-trip so it can never race an enumeration pass that is
/// re-indexing handles.
pub(crate) struct TransportShared {
    backend: Arc<dyn SessionBackend>,
    registry: Mutex<HandleRegistry>,
}

impl TransportShared {
    pub(crate) fn dispatch(&self, handle: u32, command: TransportCommand) -> CommandOutcome {
        let registry = self.registry.lock().unwrap();
        match self.try_dispatch(&registry, handle, command) {
            Ok(outcome) => outcome,
            Err(e) => {
                tracing::warn!("[Transport] Command {} failed: {}", command, e);
                CommandOutcome::failed()
            }
        }
    }

    fn try_dispatch(
        &self,
        registry: &HandleRegistry,
        handle: u32,
        command: TransportCommand,
    ) -> Result<CommandOutcome, ControlError> {
        // A dead handle fails here, without ever touching the OS layer
        let key = registry
            .lookup(handle)
            .ok_or(ControlError::StaleHandle(handle))?;
        self.backend.send_command(&key, command)
    }
}

/// The session bridge: enumerates live OS media sessions into owned
/// snapshot objects and routes transport commands back through their
/// handles.
///
/// Most applications go through the process-wide [`init`] /
/// [`list_sessions`] facade instead of holding one of these directly;
/// [`MediaTransport::with_backend`] exists for embedding a custom
/// [`SessionBackend`].
pub struct MediaTransport {
    shared: Arc<TransportShared>,
}

impl MediaTransport {
    /// Bridge over an explicit backend. This is the extension seam for
    /// additional OS backends: implement [`SessionBackend`] fully and the
    /// rest of the bridge behaves identically.
    pub fn with_backend(backend: Arc<dyn SessionBackend>) -> Self {
        Self {
            shared: Arc::new(TransportShared {
                backend,
                registry: Mutex::new(HandleRegistry::new()),
            }),
        }
    }

    /// Bridge over this platform's backend, or `None` when the platform
    /// has none (or its session manager would not answer).
    pub fn connect_with(config: TransportConfig) -> Option<Self> {
        let backend = PlatformBackend::connect(config)?;
        Some(Self::with_backend(Arc::new(backend)))
    }

    /// Snapshot every currently live media session, in OS enumeration
    /// order. `Some(vec![])` means nothing is playing; `None` means the
    /// session-manager connection is not available right now.
    ///
    /// Every call produces fresh session objects with fresh snapshots;
    /// handles are reused only for sessions that stayed alive.
    pub fn list_sessions(&self) -> Option<Vec<MediaSession>> {
        let natives = self.shared.backend.enumerate()?;

        // Churn detection and handle assignment happen under one lock
        // acquisition, so concurrent dispatch never sees a half-updated
        // table.
        let mut registry = self.shared.registry.lock().unwrap();
        let live: Vec<SessionKey> = natives.iter().map(|native| native.key.clone()).collect();
        registry.retire_missing(&live);
        tracing::debug!(
            "[Transport] Enumerated {} session(s), {} handle(s) live",
            live.len(),
            registry.len()
        );

        let sessions = natives
            .into_iter()
            .map(|native| {
                let handle = registry.resolve(&native.key);
                let snapshot = SessionSnapshot {
                    source_app: native.key.source_app,
                    artist: native.artist,
                    title: native.title,
                    duration_seconds: native.duration_seconds,
                    position_seconds: native.position_seconds,
                    is_playing: native.is_playing,
                };
                MediaSession::new(
                    handle,
                    snapshot,
                    Thumbnail::new(native.thumbnail),
                    Arc::clone(&self.shared),
                )
            })
            .collect();

        Some(sessions)
    }
}

// ==============================================================
// PROCESS-WIDE FACADE
// ==============================================================

// One OS session-manager connection per process, acquired on the first
// init() and kept until exit. `None` in the slot records that this
// platform has no backend; both states are terminal.
static TRANSPORT: OnceLock<Option<MediaTransport>> = OnceLock::new();

/// Initialize the bridge with default timeouts. Returns `true` only on the
/// first call, and only if a platform backend came up; every later call
/// returns `false` and leaves the existing state untouched.
pub fn init() -> bool {
    init_with_config(TransportConfig::default())
}

/// Same as [`init`], with explicit timeout budgets.
pub fn init_with_config(config: TransportConfig) -> bool {
    let mut first_call = false;
    let slot = TRANSPORT.get_or_init(|| {
        first_call = true;
        let transport = MediaTransport::connect_with(config);
        if transport.is_some() {
            tracing::info!("[Transport] Media session bridge initialized");
        }
        transport
    });

    first_call && slot.is_some()
}

/// List the currently active media sessions. `None` until [`init`] has
/// succeeded (so "not initialized" is distinguishable from "initialized,
/// nothing playing"), and `None` again if the OS connection stops
/// answering.
pub fn list_sessions() -> Option<Vec<MediaSession>> {
    TRANSPORT.get()?.as_ref()?.list_sessions()
}

// ================== Tests ===================

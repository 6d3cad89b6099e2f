//! System media session bridge.
//!
//! Discovers every media-playback session active on the host OS (all
//! running players, not just the "current" one), hands out point-in-time
//! snapshots of each -- track, artist, owning app, timeline, playing flag,
//! cover art -- and routes transport commands (play, pause, toggle, stop,
//! next, previous) back to the player that owns the session.
//!
//! ```no_run
//! if bemedia::init() {
//!     for session in bemedia::list_sessions().unwrap_or_default() {
//!         println!("{}: {} - {}", session.source_app(), session.artist(), session.title());
//!         if session.is_playing() {
//!             session.pause();
//!         }
//!     }
//! }
//! ```
//!
//! The bridge is pull-based: snapshots are immutable, staleness is only
//! discovered when a command against a dead session returns `false`, and
//! re-enumerating is always the way to observe change. Windows (the
//! system transport-control session manager) is the only backend today;
//! everything else initializes as unsupported.

pub mod backend;
mod registry;
mod session;
mod transport;

pub use backend::{
    CommandOutcome, NativeSession, PlaybackState, SessionBackend, SessionKey, TransportCommand,
};
pub use session::{MediaSession, SessionSnapshot, Thumbnail};
pub use transport::{init, init_with_config, list_sessions, ControlError, MediaTransport, TransportConfig};

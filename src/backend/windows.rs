use std::collections::HashMap;
use std::future::IntoFuture;
use std::sync::OnceLock;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use super::{CommandOutcome, NativeSession, PlaybackState, SessionBackend, SessionKey, TransportCommand};
use crate::transport::{ControlError, TransportConfig};

// We use the official `windows` crate for session enumeration and control
use windows::Foundation::{DateTime, TimeSpan};
use windows::Media::Control::{
    GlobalSystemMediaTransportControlsSession,
    GlobalSystemMediaTransportControlsSessionManager,
    GlobalSystemMediaTransportControlsSessionMediaProperties,
    GlobalSystemMediaTransportControlsSessionPlaybackStatus,
};
use windows::Storage::Streams::DataReader;

use tokio::runtime::Runtime;
use tokio::time::timeout;

/// WinRT TimeSpan / DateTime tick length: 100ns.
const TICKS_PER_SECOND: i64 = 10_000_000;

/// Offset between the WinRT epoch (1601-01-01) and the Unix epoch, in ticks.
const UNIX_EPOCH_TICKS: i64 = 116_444_736_000_000_000;

/// Streams reporting a thumbnail this large are lying; treat as no art.
const THUMBNAIL_MAX_BYTES: u64 = 1 << 30;

static BRIDGE_RUNTIME: OnceLock<Runtime> = OnceLock::new();

// WinRT calls are async; GSMTC has no sync surface. A single shared
// current-thread runtime keeps every wait on the caller's thread.
fn runtime() -> &'static Runtime {
    BRIDGE_RUNTIME.get_or_init(|| {
        tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .expect("Failed to create Windows media runtime")
    })
}

/// Drive a WinRT async operation to completion with a bounded wait.
/// Async operations become futures at this boundary (awaited by value);
/// on timeout, `cancel` is invoked so the pending operation is not left
/// running inside the OS, and the caller gets `None`.
fn block_on_bounded<T, F>(op: F, budget: Duration, cancel: impl FnOnce()) -> Option<T>
where
    F: IntoFuture<Output = windows::core::Result<T>>,
{
    match runtime().block_on(async move { timeout(budget, op.into_future()).await }) {
        Ok(Ok(value)) => Some(value),
        Ok(Err(_)) => None,
        Err(_) => {
            cancel();
            None
        }
    }
}

/// Assign per-app occurrence ordinals so two sessions from the same player
/// get distinct keys. Input order is OS enumeration order.
///
/// The app id is the only per-session identity the session manager
/// exposes, so the ordinal is positional among that app's own sessions.
/// Keys are therefore exact across apps, but when one app owns several
/// sessions and one of them ends, the survivors slide down and inherit
/// the lower ordinals -- see the known weakness on `SessionKey`.
fn derive_keys(app_ids: Vec<String>) -> Vec<SessionKey> {
    let mut seen: HashMap<String, u32> = HashMap::new();
    app_ids
        .into_iter()
        .map(|source_app| {
            let ordinal = *seen
                .entry(source_app.clone())
                .and_modify(|count| *count += 1)
                .or_insert(0);
            SessionKey { source_app, ordinal }
        })
        .collect()
}

fn timespan_seconds(span: TimeSpan) -> u64 {
    span.Duration.max(0) as u64 / TICKS_PER_SECOND as u64
}

/// The OS only refreshes the timeline position when the player reports
/// progress. While playing, add the wall-clock time elapsed since the last
/// refresh so the snapshot does not appear frozen. Never clamped against
/// duration; consumers that care do their own clamping.
fn extrapolate_position(
    position_ticks: i64,
    last_updated_ticks: i64,
    now_ticks: i64,
    is_playing: bool,
) -> u64 {
    let ticks = if is_playing {
        position_ticks.saturating_add(now_ticks.saturating_sub(last_updated_ticks).max(0))
    } else {
        position_ticks
    };
    ticks.max(0) as u64 / TICKS_PER_SECOND as u64
}

fn now_ticks() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|elapsed| UNIX_EPOCH_TICKS.saturating_add(elapsed.as_nanos() as i64 / 100))
        .unwrap_or(UNIX_EPOCH_TICKS)
}

fn source_app_id(session: &GlobalSystemMediaTransportControlsSession) -> String {
    session
        .SourceAppUserModelId()
        .ok()
        .map(|h| h.to_string())
        .unwrap_or_default()
}

pub struct WindowsBackend {
    manager: GlobalSystemMediaTransportControlsSessionManager,
    config: TransportConfig,
}

impl WindowsBackend {
    /// Acquire the system session manager. RequestAsync is an expensive IPC
    /// call, so it happens exactly once here and the manager is kept for
    /// the life of the process.
    pub fn connect(config: TransportConfig) -> Option<Self> {
        let op = match GlobalSystemMediaTransportControlsSessionManager::RequestAsync() {
            Ok(op) => op,
            Err(e) => {
                tracing::error!("[Transport/Windows] Failed to request session manager: {}", e);
                return None;
            }
        };
        let pending = op.clone();
        let manager = block_on_bounded(op, Duration::from_millis(config.manager_timeout_ms), || {
            let _ = pending.Cancel();
        })?;

        tracing::info!("[Transport/Windows] Session manager acquired");
        Some(Self { manager, config })
    }

    fn live_sessions(
        &self,
    ) -> Result<Vec<GlobalSystemMediaTransportControlsSession>, ControlError> {
        let sessions = self.manager.GetSessions()?;
        let mut out = Vec::new();
        for idx in 0..sessions.Size()? {
            if let Ok(session) = sessions.GetAt(idx) {
                out.push(session);
            }
        }
        Ok(out)
    }

    /// Re-resolve `key` against the sessions that are live right now.
    /// Raw session references are never held between calls, so a session
    /// that died since enumeration simply fails to resolve here.
    fn find_session(
        &self,
        key: &SessionKey,
    ) -> Result<GlobalSystemMediaTransportControlsSession, ControlError> {
        let sessions = self.live_sessions()?;
        let keys = derive_keys(sessions.iter().map(source_app_id).collect());
        match keys.iter().position(|candidate| candidate == key) {
            Some(idx) => Ok(sessions[idx].clone()),
            None => Err(ControlError::SessionGone(key.clone())),
        }
    }

    fn media_properties(
        &self,
        session: &GlobalSystemMediaTransportControlsSession,
    ) -> Option<GlobalSystemMediaTransportControlsSessionMediaProperties> {
        let op = session.TryGetMediaPropertiesAsync().ok()?;
        let pending = op.clone();
        block_on_bounded(
            op,
            Duration::from_millis(self.config.properties_timeout_ms),
            || {
                let _ = pending.Cancel();
            },
        )
    }

    /// Copy the session's cover art into an owned buffer. Any failure along
    /// the way means "no thumbnail", never an enumeration error.
    fn read_thumbnail(
        &self,
        props: &GlobalSystemMediaTransportControlsSessionMediaProperties,
    ) -> Vec<u8> {
        let budget = Duration::from_millis(self.config.thumbnail_timeout_ms);

        let reference = match props.Thumbnail() {
            Ok(reference) => reference,
            Err(_) => return Vec::new(), // No art for this session
        };

        let stream = match reference.OpenReadAsync() {
            Ok(op) => {
                let pending = op.clone();
                match block_on_bounded(op, budget, || {
                    let _ = pending.Cancel();
                }) {
                    Some(stream) => stream,
                    None => return Vec::new(),
                }
            }
            Err(_) => return Vec::new(),
        };

        let size = stream.Size().unwrap_or(0);
        if size == 0 {
            let _ = stream.Close();
            return Vec::new();
        }
        if size >= THUMBNAIL_MAX_BYTES {
            tracing::warn!(
                "[Transport/Windows] Ignoring absurd thumbnail stream ({} bytes)",
                size
            );
            let _ = stream.Close();
            return Vec::new();
        }

        let mut bytes = Vec::new();
        if let Ok(reader) = DataReader::CreateDataReader(&stream) {
            if let Ok(load_op) = reader.LoadAsync(size as u32) {
                let pending = load_op.clone();
                let loaded = block_on_bounded(load_op, budget, || {
                    let _ = pending.Cancel();
                })
                .unwrap_or(0);

                if loaded > 0 {
                    let mut buffer = vec![0u8; loaded as usize];
                    if reader.ReadBytes(&mut buffer).is_ok() {
                        bytes = buffer;
                    }
                }
            }
            let _ = reader.Close();
        }
        let _ = stream.Close();

        bytes
    }

    fn snapshot_session(
        &self,
        session: &GlobalSystemMediaTransportControlsSession,
        key: SessionKey,
    ) -> NativeSession {
        let is_playing = session
            .GetPlaybackInfo()
            .ok()
            .and_then(|info| info.PlaybackStatus().ok())
            .map(|status| status == GlobalSystemMediaTransportControlsSessionPlaybackStatus::Playing)
            .unwrap_or(false);

        // Any single field the OS can't produce degrades to its empty value
        let (artist, title, thumbnail) = match self.media_properties(session) {
            Some(props) => (
                props.Artist().ok().map(|h| h.to_string()).unwrap_or_default(),
                props.Title().ok().map(|h| h.to_string()).unwrap_or_default(),
                self.read_thumbnail(&props),
            ),
            None => (String::new(), String::new(), Vec::new()),
        };

        let (duration_seconds, position_seconds) = match session.GetTimelineProperties() {
            Ok(timeline) => {
                let start = timeline.StartTime().map(|ts| ts.Duration).unwrap_or(0);
                let end = timeline.EndTime().map(|ts| ts.Duration).unwrap_or(0);
                let duration = timespan_seconds(TimeSpan {
                    Duration: end.saturating_sub(start),
                });

                let position_ticks = timeline.Position().map(|ts| ts.Duration).unwrap_or(0);
                let last_updated = timeline
                    .LastUpdatedTime()
                    .map(|dt: DateTime| dt.UniversalTime)
                    .unwrap_or_else(|_| now_ticks());
                let position =
                    extrapolate_position(position_ticks, last_updated, now_ticks(), is_playing);

                (duration, position)
            }
            Err(_) => (0, 0),
        };

        NativeSession {
            key,
            artist,
            title,
            duration_seconds,
            position_seconds,
            is_playing,
            thumbnail,
        }
    }

    fn playback_state(
        &self,
        session: &GlobalSystemMediaTransportControlsSession,
    ) -> PlaybackState {
        match session
            .GetPlaybackInfo()
            .ok()
            .and_then(|info| info.PlaybackStatus().ok())
        {
            Some(status) => {
                if status == GlobalSystemMediaTransportControlsSessionPlaybackStatus::Playing {
                    PlaybackState::Playing
                } else if status == GlobalSystemMediaTransportControlsSessionPlaybackStatus::Paused
                    || status == GlobalSystemMediaTransportControlsSessionPlaybackStatus::Stopped
                {
                    PlaybackState::Paused
                } else {
                    PlaybackState::Unknown
                }
            }
            None => PlaybackState::Unknown,
        }
    }
}

impl SessionBackend for WindowsBackend {
    fn enumerate(&self) -> Option<Vec<NativeSession>> {
        let sessions = match self.live_sessions() {
            Ok(sessions) => sessions,
            Err(e) => {
                tracing::warn!("[Transport/Windows] Session enumeration unavailable: {}", e);
                return None;
            }
        };

        let keys = derive_keys(sessions.iter().map(source_app_id).collect());
        Some(
            sessions
                .iter()
                .zip(keys)
                .map(|(session, key)| self.snapshot_session(session, key))
                .collect(),
        )
    }

    fn send_command(
        &self,
        key: &SessionKey,
        command: TransportCommand,
    ) -> Result<CommandOutcome, ControlError> {
        let session = self.find_session(key)?;

        tracing::debug!("[Transport/Windows] {} -> {}", command, key);
        let op = match command {
            TransportCommand::Play => session.TryPlayAsync(),
            TransportCommand::Pause => session.TryPauseAsync(),
            TransportCommand::TogglePlay => session.TryTogglePlayPauseAsync(),
            TransportCommand::Stop => session.TryStopAsync(),
            TransportCommand::Next => session.TrySkipNextAsync(),
            TransportCommand::Previous => session.TrySkipPreviousAsync(),
        }?;

        let pending = op.clone();
        let verdict = block_on_bounded(
            op,
            Duration::from_millis(self.config.command_timeout_ms),
            || {
                let _ = pending.Cancel();
            },
        )
        .unwrap_or(false);

        if !verdict {
            return Ok(CommandOutcome::failed());
        }

        // The native toggle result only says the call went through, not
        // where playback landed. Re-read the state so callers get both.
        let resulting_state = if command == TransportCommand::TogglePlay {
            self.playback_state(&session)
        } else {
            PlaybackState::Unknown
        };

        Ok(CommandOutcome::succeeded_with(resulting_state))
    }
}

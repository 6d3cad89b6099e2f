use super::{CommandOutcome, NativeSession, SessionBackend, SessionKey, TransportCommand};
use crate::transport::{ControlError, TransportConfig};

/// Placeholder backend for platforms without a session-manager bridge.
/// `connect` always declines, so the facade reports unsupported and none
/// of the methods below are ever reached through it.
pub struct DummyBackend;

impl DummyBackend {
    pub fn connect(_config: TransportConfig) -> Option<Self> {
        tracing::info!("[Transport] Media sessions not supported on this OS");
        None
    }
}

impl SessionBackend for DummyBackend {
    fn enumerate(&self) -> Option<Vec<NativeSession>> {
        None
    }

    fn send_command(
        &self,
        _key: &SessionKey,
        _command: TransportCommand,
    ) -> Result<CommandOutcome, ControlError> {
        Ok(CommandOutcome::failed())
    }
}

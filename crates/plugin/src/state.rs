//! Synchronous front of the management session.
//!
//! Nushell calls plugin commands synchronously, so the state owns a tokio
//! runtime and blocks on each command.  The [`Session`] lives behind a
//! mutex and survives across command invocations for the lifetime of the
//! plugin process.

use std::sync::Mutex;

use jmx_client::exec::StatusSink;
use jmx_client::{Command, CommandOutput, JmxError, JmxResult, Session};
use tracing::debug;

pub struct JmxState {
    runtime: tokio::runtime::Runtime,
    session: Mutex<Session>,
}

impl JmxState {
    pub fn new() -> JmxResult<Self> {
        let runtime = tokio::runtime::Builder::new_multi_thread()
            .worker_threads(2)
            .enable_all()
            .build()
            .map_err(|e| JmxError::Internal(format!("failed to create tokio runtime: {e}")))?;
        Ok(Self {
            runtime,
            session: Mutex::new(Session::new()),
        })
    }

    /// Run one command to completion on the internal runtime.
    pub fn run(&self, command: Command, sink: &mut dyn StatusSink) -> JmxResult<CommandOutput> {
        let mut session = self
            .session
            .lock()
            .map_err(|e| JmxError::Internal(format!("session lock poisoned: {e}")))?;
        debug!(command = command.kind().descriptor().name, "run");
        self.runtime.block_on(command.execute(&mut session, sink))
    }
}

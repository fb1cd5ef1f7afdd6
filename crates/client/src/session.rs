use std::sync::Arc;

use tracing::info;

use crate::errors::{JmxError, JmxResult};
use crate::jolokia::{ConnectOptions, JolokiaClient};
use crate::registry::MBeanRegistry;
use crate::server::{AgentInfo, MBeanServer};

/// Explicit per-user state: the current connection (if any) and the label
/// bindings made while it was open.
#[derive(Default)]
pub struct Session {
    connection: Option<Arc<dyn MBeanServer>>,
    registry: MBeanRegistry,
}

impl Session {
    pub fn new() -> Self {
        Self::default()
    }

    /// Open a Jolokia connection and make it current once the agent answers.
    pub async fn connect(&mut self, options: ConnectOptions) -> JmxResult<AgentInfo> {
        let client = JolokiaClient::new(options)?;
        let agent = client.check().await.map_err(|source| JmxError::Remote {
            context: format!("Cannot connect to {}", client.url()),
            source,
        })?;
        info!(
            url = client.url(),
            version = agent.agent_version.as_deref().unwrap_or("unknown"),
            "connected to jolokia agent"
        );
        self.attach(Arc::new(client));
        Ok(agent)
    }

    /// Make `server` the current connection, returning the previous one.
    ///
    /// Label bindings are kept; handles bound on another endpoint are
    /// refused when used.
    pub fn attach(&mut self, server: Arc<dyn MBeanServer>) -> Option<Arc<dyn MBeanServer>> {
        self.connection.replace(server)
    }

    pub fn detach(&mut self) -> Option<Arc<dyn MBeanServer>> {
        self.connection.take()
    }

    pub fn current_connection(&self) -> Option<Arc<dyn MBeanServer>> {
        self.connection.clone()
    }

    pub fn is_connected(&self) -> bool {
        self.connection.is_some()
    }

    pub fn require_connection(&self) -> JmxResult<Arc<dyn MBeanServer>> {
        self.current_connection().ok_or(JmxError::NotConnected)
    }

    pub fn registry(&self) -> &MBeanRegistry {
        &self.registry
    }

    pub fn registry_mut(&mut self) -> &mut MBeanRegistry {
        &mut self.registry
    }
}

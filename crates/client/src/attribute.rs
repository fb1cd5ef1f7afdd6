use tracing::debug;

use crate::errors::{JmxError, JmxResult};
use crate::registry::ObjectHandle;
use crate::server::{MBeanServer, MBeanValue};

/// Reads and writes attributes of resolved MBeans.
///
/// Any remote fault aborts the calling command as
/// [`JmxError::RemoteAccess`].
pub struct AttributeAccessor<'a> {
    server: &'a dyn MBeanServer,
}

impl<'a> AttributeAccessor<'a> {
    pub fn new(server: &'a dyn MBeanServer) -> Self {
        Self { server }
    }

    pub async fn get(&self, handle: &ObjectHandle, attribute: &str) -> JmxResult<MBeanValue> {
        debug!(mbean = %handle, attribute, "get attribute");
        self.server
            .get_attribute(handle.name(), attribute)
            .await
            .map_err(|source| JmxError::RemoteAccess {
                target: format!("Cannot read attribute {attribute} of {handle}"),
                source,
            })
    }

    pub async fn set(
        &self,
        handle: &ObjectHandle,
        attribute: &str,
        value: MBeanValue,
    ) -> JmxResult<()> {
        debug!(mbean = %handle, attribute, "set attribute");
        self.server
            .set_attribute(handle.name(), attribute, value)
            .await
            .map_err(|source| JmxError::RemoteAccess {
                target: format!("Cannot set attribute {attribute} of {handle}"),
                source,
            })
    }
}

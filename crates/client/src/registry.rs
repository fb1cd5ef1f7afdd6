//! Label bindings and object-name resolution.
//!
//! A label is a caller-chosen alias for one concrete MBean on one
//! connection.  [`MBeanRegistry::resolve`] turns whatever the user typed
//! (a label, an object name or a pattern) into the handles it denotes.

use std::collections::BTreeMap;
use std::fmt;

use tracing::debug;

use crate::errors::{FaultKind, JmxError, JmxResult, RemoteFault};
use crate::object_name::ObjectName;
use crate::server::MBeanServer;

/// Label under which the default binding is stored.
pub const DEFAULT_LABEL: &str = "default";

/// A reference to one concrete MBean, valid only for the connection it was
/// resolved against.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObjectHandle {
    name: ObjectName,
    endpoint: String,
}

impl ObjectHandle {
    pub fn new(name: ObjectName, endpoint: impl Into<String>) -> Self {
        Self {
            name,
            endpoint: endpoint.into(),
        }
    }

    pub fn name(&self) -> &ObjectName {
        &self.name
    }

    /// Description of the connection this handle belongs to.
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

impl fmt::Display for ObjectHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.name, f)
    }
}

/// Session-scoped label bindings.
#[derive(Debug, Default, Clone)]
pub struct MBeanRegistry {
    labels: BTreeMap<String, ObjectHandle>,
}

impl MBeanRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Bind `label` to `handle`, returning the previous binding.
    pub fn bind(&mut self, label: impl Into<String>, handle: ObjectHandle) -> Option<ObjectHandle> {
        self.labels.insert(label.into(), handle)
    }

    pub fn bind_default(&mut self, handle: ObjectHandle) -> Option<ObjectHandle> {
        self.bind(DEFAULT_LABEL, handle)
    }

    pub fn lookup(&self, label: &str) -> Option<&ObjectHandle> {
        self.labels.get(label)
    }

    pub fn default_handle(&self) -> Option<&ObjectHandle> {
        self.lookup(DEFAULT_LABEL)
    }

    /// All bindings, ordered by label.
    pub fn labels(&self) -> impl Iterator<Item = (&str, &ObjectHandle)> {
        self.labels.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    /// Resolve `bean` against `server`.
    ///
    /// A bound label yields exactly its handle.  Anything else is parsed as
    /// an object name (possibly a pattern) and queried; the result keeps the
    /// server's order and may be empty.  `None` means the default binding.
    pub async fn resolve(
        &self,
        server: &dyn MBeanServer,
        bean: Option<&str>,
    ) -> JmxResult<Vec<ObjectHandle>> {
        let bean = match bean.map(str::trim) {
            Some(b) if !b.is_empty() => b,
            _ => {
                let handle = self.default_handle().ok_or_else(|| {
                    JmxError::usage(
                        "missing required 'bean': give an object name, a pattern or a label \
                         (no default MBean is set, see `jmx mbean`)",
                    )
                })?;
                return Ok(vec![self.scoped(server, handle)?]);
            }
        };

        if let Some(handle) = self.lookup(bean) {
            return Ok(vec![self.scoped(server, handle)?]);
        }

        let pattern = ObjectName::parse(bean)?;
        let names = server
            .query_names(&pattern)
            .await
            .map_err(|source| JmxError::Remote {
                context: format!("querying MBeans {pattern}"),
                source,
            })?;
        debug!(pattern = %pattern, matches = names.len(), "resolved object names");

        let endpoint = server.description();
        Ok(names
            .into_iter()
            .map(|name| ObjectHandle::new(name, endpoint.clone()))
            .collect())
    }

    /// Find the single MBean registered as `name`.  Patterns are refused.
    pub async fn locate(server: &dyn MBeanServer, name: &str) -> JmxResult<ObjectHandle> {
        let object_name = ObjectName::parse(name)
            .map_err(|e| JmxError::usage(format!("Error locating MBean {name}: {e}")))?;
        if object_name.is_pattern() {
            return Err(JmxError::usage(format!(
                "Error locating MBean {name}: a label must name a single MBean, not a pattern"
            )));
        }
        let context = format!("Error locating MBean {name}");
        let found = server
            .query_names(&object_name)
            .await
            .map_err(|source| JmxError::Remote {
                context: context.clone(),
                source,
            })?
            .into_iter()
            .next()
            .ok_or_else(|| JmxError::Remote {
                context,
                source: RemoteFault::new(
                    FaultKind::InstanceNotFound,
                    format!("{object_name} is not registered"),
                ),
            })?;
        Ok(ObjectHandle::new(found, server.description()))
    }

    fn scoped(&self, server: &dyn MBeanServer, handle: &ObjectHandle) -> JmxResult<ObjectHandle> {
        let endpoint = server.description();
        if handle.endpoint() != endpoint {
            return Err(JmxError::usage(format!(
                "MBean {handle} was bound on {}, not on the current connection {endpoint}; \
                 bind it again with `jmx mbean`",
                handle.endpoint()
            )));
        }
        Ok(handle.clone())
    }
}

//! Server trait and metadata types.
//!
//! Each transport implements [`MBeanServer`], the primitive remote
//! operations that the attribute, operation and registry layers delegate
//! to.  The only production transport is the Jolokia HTTP agent client in
//! [`crate::jolokia`].

use async_trait::async_trait;

use crate::errors::RemoteFault;
use crate::object_name::ObjectName;

/// A value read from or sent to a managed object.
///
/// `Null` doubles as the result of a `void` operation.
pub type MBeanValue = serde_json::Value;

// ---------------------------------------------------------------------------
// Metadata
// ---------------------------------------------------------------------------

/// One declared parameter of an operation.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ParameterInfo {
    pub name: String,
    /// Fully qualified type name as reported by the server
    /// (e.g. `java.lang.String`, `int`, `[J`).
    pub type_name: String,
    pub description: Option<String>,
}

/// Remote-reported metadata for one operation.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct OperationDescriptor {
    pub name: String,
    pub parameters: Vec<ParameterInfo>,
    pub return_type: String,
    pub description: Option<String>,
}

impl OperationDescriptor {
    pub fn arity(&self) -> usize {
        self.parameters.len()
    }

    /// Declared parameter types, in order.
    pub fn signature(&self) -> Vec<String> {
        self.parameters.iter().map(|p| p.type_name.clone()).collect()
    }
}

/// Remote-reported metadata for one attribute.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct AttributeInfo {
    pub name: String,
    pub type_name: String,
    pub writable: bool,
    pub description: Option<String>,
}

/// Everything the server reports about one MBean.
///
/// `operations` keeps the server's order; overloads appear as separate
/// entries with the same name.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct MBeanInfo {
    pub class_name: String,
    pub description: Option<String>,
    pub attributes: Vec<AttributeInfo>,
    pub operations: Vec<OperationDescriptor>,
}

/// Identification returned by a successful presence check.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct AgentInfo {
    pub url: String,
    pub agent_version: Option<String>,
    pub protocol_version: Option<String>,
    pub product: Option<String>,
    pub vendor: Option<String>,
}

// ---------------------------------------------------------------------------
// Server trait
// ---------------------------------------------------------------------------

/// A connection to a managed-object server.
///
/// Every call is a single round trip; implementations must not retry.
/// Faults are returned already normalized into [`RemoteFault`].
#[async_trait]
pub trait MBeanServer: Send + Sync {
    /// Names of all registered MBeans selected by `pattern`, in the order the
    /// server reports them.  A non-pattern name yields itself or nothing.
    async fn query_names(&self, pattern: &ObjectName) -> Result<Vec<ObjectName>, RemoteFault>;

    /// Fetch the full metadata of one MBean.
    async fn mbean_info(&self, name: &ObjectName) -> Result<MBeanInfo, RemoteFault>;

    /// Read one attribute.
    async fn get_attribute(
        &self,
        name: &ObjectName,
        attribute: &str,
    ) -> Result<MBeanValue, RemoteFault>;

    /// Write one attribute.  Type checking is left to the server.
    async fn set_attribute(
        &self,
        name: &ObjectName,
        attribute: &str,
        value: MBeanValue,
    ) -> Result<(), RemoteFault>;

    /// Invoke `operation` with positional `args`.  `signature` selects the
    /// overload and must hold one declared type name per argument.
    async fn invoke(
        &self,
        name: &ObjectName,
        operation: &str,
        args: &[MBeanValue],
        signature: &[String],
    ) -> Result<MBeanValue, RemoteFault>;

    /// Check that the server answers, returning what it says about itself.
    async fn check(&self) -> Result<AgentInfo, RemoteFault>;

    /// A human-readable endpoint description.  Object handles are scoped
    /// to it.
    fn description(&self) -> String;
}

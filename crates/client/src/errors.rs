use std::fmt;

use thiserror::Error;

// ---------------------------------------------------------------------------
// Remote faults
// ---------------------------------------------------------------------------

/// Broad category of a fault raised on the remote side of a connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FaultKind {
    /// The named MBean is not registered.
    InstanceNotFound,
    /// The MBean has no such attribute.
    AttributeNotFound,
    /// A supplied value did not fit the attribute or parameter type.
    InvalidValue,
    /// The MBean itself threw (a declared exception of the operation or
    /// accessor).
    MBeanException,
    /// Reflection or marshalling failed on the server.
    Reflection,
    /// The agent refused the request.
    Security,
    /// The request never produced a usable answer (I/O, HTTP, bad JSON).
    Transport,
    /// Anything else the server reported.
    Runtime,
}

impl fmt::Display for FaultKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            FaultKind::InstanceNotFound => "instance not found",
            FaultKind::AttributeNotFound => "attribute not found",
            FaultKind::InvalidValue => "invalid value",
            FaultKind::MBeanException => "mbean exception",
            FaultKind::Reflection => "reflection error",
            FaultKind::Security => "access denied",
            FaultKind::Transport => "transport error",
            FaultKind::Runtime => "runtime error",
        };
        f.write_str(s)
    }
}

/// A remote-side fault, normalized across transports.
///
/// `message` is the cause exactly as the server (or the HTTP stack) reported
/// it; `error_type` keeps the server's own classification when it sent one
/// (for Jolokia, the Java exception class name).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct RemoteFault {
    pub kind: FaultKind,
    pub error_type: Option<String>,
    pub message: String,
}

impl RemoteFault {
    pub fn new(kind: FaultKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            error_type: None,
            message: message.into(),
        }
    }

    pub fn transport(message: impl Into<String>) -> Self {
        Self::new(FaultKind::Transport, message)
    }

    pub fn with_error_type(mut self, error_type: impl Into<String>) -> Self {
        self.error_type = Some(error_type.into());
        self
    }
}

/// Failure of a single operation descriptor during `exec`.
///
/// Unlike [`JmxError`], this never aborts the command: sibling descriptors
/// and sibling objects are still attempted.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Operation {class_name}.{operation}({}) failed: {cause}", .signature.join(", "))]
pub struct InvocationFault {
    pub object: String,
    pub class_name: String,
    pub operation: String,
    pub signature: Vec<String>,
    pub cause: RemoteFault,
}

// ---------------------------------------------------------------------------
// Command-level errors
// ---------------------------------------------------------------------------

/// Errors that abort a whole command.
#[derive(Debug, Error)]
pub enum JmxError {
    #[error("{0}")]
    Usage(String),

    #[error("not connected: use `jmx connect` to open a connection to a Jolokia agent first")]
    NotConnected,

    #[error("invalid object name '{name}': {reason}")]
    InvalidObjectName { name: String, reason: String },

    #[error("{target}: {source}")]
    RemoteAccess { target: String, source: RemoteFault },

    #[error("Method {class_name}.{operation}() not found.")]
    OperationNotFound {
        class_name: String,
        operation: String,
    },

    #[error("{context}: {source}")]
    Remote {
        context: String,
        source: RemoteFault,
    },

    #[error("jmx: {0}")]
    Internal(String),
}

impl JmxError {
    pub fn usage(msg: impl Into<String>) -> Self {
        JmxError::Usage(msg.into())
    }

    /// `true` for failures caused by the caller's arguments or session state
    /// rather than by the remote side.
    pub fn is_usage(&self) -> bool {
        matches!(
            self,
            JmxError::Usage(_) | JmxError::NotConnected | JmxError::InvalidObjectName { .. }
        )
    }

    /// The remote cause, when there is one.
    pub fn remote_fault(&self) -> Option<&RemoteFault> {
        match self {
            JmxError::RemoteAccess { source, .. } | JmxError::Remote { source, .. } => {
                Some(source)
            }
            _ => None,
        }
    }
}

pub type JmxResult<T> = Result<T, JmxError>;

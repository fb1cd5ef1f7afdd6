//! Client library for managing remote JVMs over JMX.
//!
//! A [`Session`] holds the current connection and the label bindings made
//! on it.  Commands ([`Command`]) resolve object names, labels and patterns
//! through the [`MBeanRegistry`] and then read attributes, write them or
//! invoke operations through an [`MBeanServer`].
//!
//! The one transport shipped here is [`JolokiaClient`], which talks to a
//! Jolokia agent (JMX over HTTP/JSON).
//!
//! ```no_run
//! # async fn run() -> jmx_client::JmxResult<()> {
//! use jmx_client::{ConnectOptions, ExecRequest, Session, exec};
//!
//! let mut session = Session::new();
//! session.connect(ConnectOptions::new(Some("localhost:8778"))?).await?;
//!
//! let mut lines = Vec::new();
//! let report = exec(
//!     &session,
//!     &ExecRequest::new(Some("java.lang:type=Memory")).op("gc"),
//!     &mut lines,
//! )
//! .await?;
//! assert!(report.failures.is_empty());
//! # Ok(())
//! # }
//! ```

pub mod attribute;
pub mod command;
pub mod errors;
pub mod exec;
pub mod jolokia;
pub mod object_name;
pub mod operation;
pub mod registry;
pub mod server;
pub mod session;

#[cfg(test)]
mod testing;

pub use attribute::AttributeAccessor;
pub use command::{Command, CommandDescriptor, CommandKind, CommandOutput};
pub use errors::{FaultKind, InvocationFault, JmxError, JmxResult, RemoteFault};
pub use exec::{ExecReport, ExecRequest, Params, StatusSink, exec};
pub use jolokia::{ConnectOptions, JolokiaClient};
pub use object_name::ObjectName;
pub use operation::{Candidates, OperationInvoker, OperationResolver};
pub use registry::{MBeanRegistry, ObjectHandle};
pub use server::{AgentInfo, MBeanInfo, MBeanServer, MBeanValue, OperationDescriptor};
pub use session::Session;

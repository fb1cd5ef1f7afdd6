//! Operation lookup and invocation.
//!
//! Candidates are found by name and argument count only; the server picks
//! between same-arity overloads by rejecting arguments it cannot convert.
//! Metadata is fetched fresh on every lookup.

use tracing::{debug, warn};

use crate::errors::{InvocationFault, JmxError, JmxResult};
use crate::registry::ObjectHandle;
use crate::server::{MBeanServer, MBeanValue, OperationDescriptor};

/// Operations of one MBean that fit a requested name and arity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Candidates {
    /// Implementation class reported by the server, or the object name when
    /// the server reports none.
    pub class_name: String,
    /// Matching descriptors in the order the server reported them.
    pub operations: Vec<OperationDescriptor>,
}

pub struct OperationResolver<'a> {
    server: &'a dyn MBeanServer,
}

impl<'a> OperationResolver<'a> {
    pub fn new(server: &'a dyn MBeanServer) -> Self {
        Self { server }
    }

    /// Descriptors of `handle` named `operation` declaring exactly
    /// `arg_count` parameters.  May be empty.
    pub async fn find_candidates(
        &self,
        handle: &ObjectHandle,
        operation: &str,
        arg_count: usize,
    ) -> JmxResult<Candidates> {
        let info = self
            .server
            .mbean_info(handle.name())
            .await
            .map_err(|source| JmxError::Remote {
                context: format!("Cannot read operations of {handle}"),
                source,
            })?;

        let class_name = if info.class_name.is_empty() {
            handle.to_string()
        } else {
            info.class_name
        };
        let operations: Vec<_> = info
            .operations
            .into_iter()
            .filter(|op| op.name == operation && op.arity() == arg_count)
            .collect();
        debug!(
            mbean = %handle,
            operation,
            arg_count,
            candidates = operations.len(),
            "operation candidates"
        );

        Ok(Candidates {
            class_name,
            operations,
        })
    }
}

pub struct OperationInvoker<'a> {
    server: &'a dyn MBeanServer,
}

impl<'a> OperationInvoker<'a> {
    pub fn new(server: &'a dyn MBeanServer) -> Self {
        Self { server }
    }

    /// Invoke one descriptor with positional `args`, using its declared
    /// parameter types as the signature.
    pub async fn invoke(
        &self,
        handle: &ObjectHandle,
        class_name: &str,
        descriptor: &OperationDescriptor,
        args: &[MBeanValue],
    ) -> Result<MBeanValue, InvocationFault> {
        let signature = descriptor.signature();
        debug!(mbean = %handle, operation = %descriptor.name, ?signature, "invoke");

        self.server
            .invoke(handle.name(), &descriptor.name, args, &signature)
            .await
            .map_err(|cause| {
                warn!(mbean = %handle, operation = %descriptor.name, error = %cause, "invocation failed");
                InvocationFault {
                    object: handle.to_string(),
                    class_name: class_name.to_string(),
                    operation: descriptor.name.clone(),
                    signature,
                    cause,
                }
            })
    }
}

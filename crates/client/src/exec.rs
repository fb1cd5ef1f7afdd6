//! The `exec` command: read, write and invoke on every MBean a name
//! resolves to.
//!
//! For each resolved object the requested steps run in a fixed order:
//! `get`, then `set`, then `op`.  Attribute and lookup failures abort the
//! whole command.  A failing operation overload only produces a status line
//! and an entry in [`ExecReport::failures`], so sibling overloads and
//! sibling objects are still attempted.

use serde_json::Value;
use tracing::debug;

use crate::attribute::AttributeAccessor;
use crate::errors::{InvocationFault, JmxError, JmxResult};
use crate::operation::{OperationInvoker, OperationResolver};
use crate::server::MBeanValue;
use crate::session::Session;

// ---------------------------------------------------------------------------
// Request
// ---------------------------------------------------------------------------

/// Operation arguments, or the value of an attribute to write.
#[derive(Debug, Clone, PartialEq)]
pub enum Params {
    Single(MBeanValue),
    List(Vec<MBeanValue>),
}

impl Params {
    /// A JSON array becomes a list; anything else a single value.
    pub fn from_value(value: MBeanValue) -> Self {
        match value {
            Value::Array(items) => Params::List(items),
            other => Params::Single(other),
        }
    }

    /// Positional operation arguments.
    pub fn arguments(&self) -> Vec<MBeanValue> {
        match self {
            Params::Single(v) => vec![v.clone()],
            Params::List(items) => items.clone(),
        }
    }

    /// The value written by `set`.  A list is written as one array value.
    pub fn attribute_value(&self) -> MBeanValue {
        match self {
            Params::Single(v) => v.clone(),
            Params::List(items) => Value::Array(items.clone()),
        }
    }
}

/// Arguments of one `exec` call.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ExecRequest {
    /// Object name, pattern or label.  `None` means the default binding.
    pub bean: Option<String>,
    pub get: Option<String>,
    pub set: Option<String>,
    pub op: Option<String>,
    pub params: Option<Params>,
}

impl ExecRequest {
    pub fn new(bean: Option<&str>) -> Self {
        Self {
            bean: bean.map(str::to_string),
            ..Default::default()
        }
    }

    pub fn get(mut self, attribute: impl Into<String>) -> Self {
        self.get = Some(attribute.into());
        self
    }

    pub fn set(mut self, attribute: impl Into<String>) -> Self {
        self.set = Some(attribute.into());
        self
    }

    pub fn op(mut self, operation: impl Into<String>) -> Self {
        self.op = Some(operation.into());
        self
    }

    pub fn params(mut self, params: Params) -> Self {
        self.params = Some(params);
        self
    }

    /// Checks that need neither a connection nor a round trip.
    pub fn validate(&self) -> JmxResult<()> {
        if self.op.is_some() && self.set.is_some() {
            return Err(JmxError::usage(
                "You cannot specify both 'op' and 'set' at the same time (see help).",
            ));
        }
        if let (Some(attribute), None) = (&self.set, &self.params) {
            return Err(JmxError::usage(format!(
                "'set' requires 'params' holding the new value of {attribute}."
            )));
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Output
// ---------------------------------------------------------------------------

/// Receives human-readable status lines as they are produced.
pub trait StatusSink {
    fn status(&mut self, line: &str);
}

impl StatusSink for Vec<String> {
    fn status(&mut self, line: &str) {
        self.push(line.to_string());
    }
}

/// Drops every line.
pub struct Silent;

impl StatusSink for Silent {
    fn status(&mut self, _line: &str) {}
}

/// What one `exec` call produced.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ExecReport {
    /// Attribute values and successful operation results in production
    /// order.  A `void` operation contributes `null`.
    pub results: Vec<MBeanValue>,
    pub failures: Vec<InvocationFault>,
}

/// Render a value for a status line; strings are shown without quotes.
pub fn display_value(value: &MBeanValue) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

fn display_args(args: &[MBeanValue]) -> String {
    args.iter().map(display_value).collect::<Vec<_>>().join(", ")
}

// ---------------------------------------------------------------------------
// Execution
// ---------------------------------------------------------------------------

pub async fn exec(
    session: &Session,
    request: &ExecRequest,
    sink: &mut dyn StatusSink,
) -> JmxResult<ExecReport> {
    let server = session.require_connection()?;
    request.validate()?;

    let handles = session
        .registry()
        .resolve(server.as_ref(), request.bean.as_deref())
        .await?;
    if handles.is_empty() {
        return Err(JmxError::usage(format!(
            "No MBeans found {}.",
            request.bean.as_deref().unwrap_or_default()
        )));
    }
    debug!(objects = handles.len(), "exec");

    let accessor = AttributeAccessor::new(server.as_ref());
    let resolver = OperationResolver::new(server.as_ref());
    let invoker = OperationInvoker::new(server.as_ref());
    let args = request
        .params
        .as_ref()
        .map(Params::arguments)
        .unwrap_or_default();

    let mut report = ExecReport::default();
    for handle in &handles {
        if let Some(attribute) = &request.get {
            let value = accessor.get(handle, attribute).await?;
            sink.status(&format!("{handle} {attribute} ==> {}", display_value(&value)));
            report.results.push(value);
        }

        if let (Some(attribute), Some(params)) = (&request.set, &request.params) {
            let value = params.attribute_value();
            accessor.set(handle, attribute, value.clone()).await?;
            sink.status(&format!("{handle} {attribute} ==> {}", display_value(&value)));
        }

        if let Some(operation) = &request.op {
            let candidates = resolver.find_candidates(handle, operation, args.len()).await?;
            if candidates.operations.is_empty() {
                return Err(JmxError::OperationNotFound {
                    class_name: candidates.class_name,
                    operation: operation.clone(),
                });
            }
            for descriptor in &candidates.operations {
                match invoker
                    .invoke(handle, &candidates.class_name, descriptor, &args)
                    .await
                {
                    Ok(value) => {
                        let shown = if value.is_null() {
                            "void".to_string()
                        } else {
                            display_value(&value)
                        };
                        sink.status(&format!(
                            "{handle} {operation}({}) : {shown}",
                            display_args(&args)
                        ));
                        report.results.push(value);
                    }
                    Err(fault) => {
                        sink.status(&fault.to_string());
                        report.failures.push(fault);
                    }
                }
            }
        }
    }
    sink.status("");

    Ok(report)
}

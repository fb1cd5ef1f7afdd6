//! Host-facing commands.
//!
//! Each command is one variant of [`Command`]; [`CommandKind::descriptor`]
//! gives the metadata a host needs to register it (namespace, name, help
//! and argument names) and [`Command::execute`] runs it against a
//! [`Session`].

use tracing::info;

use crate::errors::{JmxError, JmxResult};
use crate::exec::{ExecReport, ExecRequest, StatusSink, exec};
use crate::jolokia::ConnectOptions;
use crate::object_name::ALL_MBEANS;
use crate::registry::{MBeanRegistry, ObjectHandle};
use crate::server::{AgentInfo, MBeanInfo};
use crate::session::Session;

/// Namespace every command is registered under.
pub const NAMESPACE: &str = "jmx";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandKind {
    Connect,
    Disconnect,
    Label,
    Labels,
    Query,
    Info,
    Exec,
}

/// Registration metadata for one command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CommandDescriptor {
    pub namespace: &'static str,
    pub name: &'static str,
    pub description: &'static str,
    pub usage: &'static str,
    /// `(argument, help)` pairs.
    pub arguments: &'static [(&'static str, &'static str)],
}

impl CommandKind {
    pub const ALL: [CommandKind; 7] = [
        CommandKind::Connect,
        CommandKind::Disconnect,
        CommandKind::Label,
        CommandKind::Labels,
        CommandKind::Query,
        CommandKind::Info,
        CommandKind::Exec,
    ];

    pub fn descriptor(self) -> CommandDescriptor {
        match self {
            CommandKind::Connect => describe(
                "connect",
                "Connect to a Jolokia agent.",
                "jmx connect [host[:port] | url] [--user <name>] [--password <secret>]",
                &[
                    ("host", "host, host:port or agent URL (default localhost:8778)"),
                    ("user", "user for HTTP basic authentication"),
                    ("password", "password for HTTP basic authentication"),
                ],
            ),
            CommandKind::Disconnect => describe(
                "disconnect",
                "Close the current connection.",
                "jmx disconnect",
                &[],
            ),
            CommandKind::Label => describe(
                "mbean",
                "Bind an MBean to a label, or make it the default.",
                "jmx mbean <object-name> [--as <label>]",
                &[
                    ("bean", "object name of a registered MBean (no patterns)"),
                    ("as", "label to bind; without it the MBean becomes the default"),
                ],
            ),
            CommandKind::Labels => describe(
                "labels",
                "List label bindings.",
                "jmx labels",
                &[],
            ),
            CommandKind::Query => describe(
                "query",
                "List MBean names matching a pattern or label.",
                "jmx query [pattern | label]",
                &[("pattern", "object name pattern or label (default *:*)")],
            ),
            CommandKind::Info => describe(
                "info",
                "Describe the attributes and operations of MBeans.",
                "jmx info [bean]",
                &[("bean", "object name, pattern or label (default: the default MBean)")],
            ),
            CommandKind::Exec => describe(
                "exec",
                "Read, write or invoke on every MBean a name resolves to.",
                "jmx exec [bean] [--get <attr>] [--set <attr>] [--op <operation>] [--params <value | list>]",
                &[
                    ("bean", "object name, pattern or label (default: the default MBean)"),
                    ("get", "attribute to read"),
                    ("set", "attribute to write, with the value in params"),
                    ("op", "operation to invoke; cannot be combined with set"),
                    ("params", "operation arguments, or the value to set"),
                ],
            ),
        }
    }
}

fn describe(
    name: &'static str,
    description: &'static str,
    usage: &'static str,
    arguments: &'static [(&'static str, &'static str)],
) -> CommandDescriptor {
    CommandDescriptor {
        namespace: NAMESPACE,
        name,
        description,
        usage,
        arguments,
    }
}

/// One command invocation with its arguments.
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    Connect(ConnectOptions),
    Disconnect,
    Label { bean: String, label: Option<String> },
    Labels,
    Query { pattern: Option<String> },
    Info { bean: Option<String> },
    Exec(ExecRequest),
}

#[derive(Debug, Clone, PartialEq)]
pub enum CommandOutput {
    Connected(AgentInfo),
    Message(String),
    Labels(Vec<(String, ObjectHandle)>),
    Names(Vec<ObjectHandle>),
    Infos(Vec<(ObjectHandle, MBeanInfo)>),
    Exec(ExecReport),
}

impl Command {
    pub fn kind(&self) -> CommandKind {
        match self {
            Command::Connect(_) => CommandKind::Connect,
            Command::Disconnect => CommandKind::Disconnect,
            Command::Label { .. } => CommandKind::Label,
            Command::Labels => CommandKind::Labels,
            Command::Query { .. } => CommandKind::Query,
            Command::Info { .. } => CommandKind::Info,
            Command::Exec(_) => CommandKind::Exec,
        }
    }

    pub async fn execute(
        self,
        session: &mut Session,
        sink: &mut dyn StatusSink,
    ) -> JmxResult<CommandOutput> {
        match self {
            Command::Connect(options) => session.connect(options).await.map(CommandOutput::Connected),

            Command::Disconnect => Ok(CommandOutput::Message(match session.detach() {
                Some(server) => {
                    let endpoint = server.description();
                    info!(url = %endpoint, "disconnected");
                    format!("Disconnected from {endpoint}.")
                }
                None => "Not connected.".to_string(),
            })),

            Command::Label { bean, label } => {
                let server = session.require_connection()?;
                let handle = MBeanRegistry::locate(server.as_ref(), &bean).await?;
                let message = match label {
                    Some(label) => {
                        let message = format!("MBean {handle} set as {label}.");
                        session.registry_mut().bind(label, handle);
                        message
                    }
                    None => {
                        let message = format!("MBean {handle} set as default.");
                        session.registry_mut().bind_default(handle);
                        message
                    }
                };
                sink.status(&message);
                Ok(CommandOutput::Message(message))
            }

            Command::Labels => Ok(CommandOutput::Labels(
                session
                    .registry()
                    .labels()
                    .map(|(label, handle)| (label.to_string(), handle.clone()))
                    .collect(),
            )),

            Command::Query { pattern } => {
                let server = session.require_connection()?;
                let pattern = pattern.as_deref().unwrap_or(ALL_MBEANS);
                let handles = session
                    .registry()
                    .resolve(server.as_ref(), Some(pattern))
                    .await?;
                Ok(CommandOutput::Names(handles))
            }

            Command::Info { bean } => {
                let server = session.require_connection()?;
                let handles = session
                    .registry()
                    .resolve(server.as_ref(), bean.as_deref())
                    .await?;
                if handles.is_empty() {
                    return Err(JmxError::usage(format!(
                        "No MBeans found {}.",
                        bean.as_deref().unwrap_or_default()
                    )));
                }
                let mut infos = Vec::with_capacity(handles.len());
                for handle in handles {
                    let info = server
                        .mbean_info(handle.name())
                        .await
                        .map_err(|source| JmxError::Remote {
                            context: format!("Cannot describe {handle}"),
                            source,
                        })?;
                    infos.push((handle, info));
                }
                Ok(CommandOutput::Infos(infos))
            }

            Command::Exec(request) => exec(session, &request, sink).await.map(CommandOutput::Exec),
        }
    }
}

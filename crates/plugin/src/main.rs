//! `nu-plugin-jmx`: JMX management of remote JVMs from Nushell.
//!
//! The plugin talks to a [Jolokia](https://jolokia.org) agent and registers
//! the following commands:
//!
//! - `jmx connect [host]`        open a connection to a Jolokia agent
//! - `jmx disconnect`            close the current connection
//! - `jmx mbean <name> [--as]`   bind an MBean to a label (or as the default)
//! - `jmx labels`                list label bindings
//! - `jmx query [pattern]`       list MBean names
//! - `jmx info [bean]`           describe attributes and operations
//! - `jmx exec [bean] ...`       get / set attributes and invoke operations
//!
//! Status lines of `jmx exec` go to stderr; the command's value is the list
//! of attribute values and operation results.

mod logging;
mod state;
mod values;

use std::time::Duration;

use jmx_client::exec::StatusSink;
use jmx_client::{
    AgentInfo, Command, CommandOutput, ConnectOptions, ExecRequest, JmxError, MBeanInfo,
    ObjectHandle,
};
use nu_plugin::{
    EngineInterface, EvaluatedCall, MsgPackSerializer, Plugin, PluginCommand, serve_plugin,
};
use nu_protocol::{
    Category, Example, LabeledError, PipelineData, Record, Signature, Span, SyntaxShape, Type,
    Value,
};

use state::JmxState;

// ---------------------------------------------------------------------------
// Plugin struct
// ---------------------------------------------------------------------------

/// The main plugin object.  One [`JmxState`] (and so one session) is shared
/// by every command invocation for the lifetime of the plugin process.
struct JmxPlugin {
    state: JmxState,
}

impl JmxPlugin {
    fn new() -> Self {
        Self {
            state: JmxState::new().expect("failed to initialise jmx plugin state"),
        }
    }
}

impl Plugin for JmxPlugin {
    fn version(&self) -> String {
        env!("CARGO_PKG_VERSION").into()
    }

    fn commands(&self) -> Vec<Box<dyn PluginCommand<Plugin = Self>>> {
        vec![
            Box::new(JmxMain),
            Box::new(JmxConnect),
            Box::new(JmxDisconnect),
            Box::new(JmxMBean),
            Box::new(JmxLabels),
            Box::new(JmxQuery),
            Box::new(JmxInfo),
            Box::new(JmxExec),
        ]
    }
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Convert a `JmxError` into a `LabeledError` with the call's span.
fn jmx_err(e: JmxError, span: Span) -> LabeledError {
    let help = match &e {
        JmxError::NotConnected => Some("run `jmx connect <host>` first"),
        JmxError::Usage(_) | JmxError::InvalidObjectName { .. } => Some("see `help jmx`"),
        _ => None,
    };
    let err = LabeledError::new(e.to_string()).with_label("jmx error", span);
    match help {
        Some(help) => err.with_help(help),
        None => err,
    }
}

/// Writes status lines to stderr, or nowhere with `--quiet`.
struct StderrSink {
    quiet: bool,
}

impl StatusSink for StderrSink {
    fn status(&mut self, line: &str) {
        if !self.quiet {
            eprintln!("{line}");
        }
    }
}

fn run(
    plugin: &JmxPlugin,
    command: Command,
    quiet: bool,
    span: Span,
) -> Result<CommandOutput, LabeledError> {
    plugin
        .state
        .run(command, &mut StderrSink { quiet })
        .map_err(|e| jmx_err(e, span))
}

/// Read `$env.JMX_TIMEOUT` from the Nushell environment.  Unset or
/// unparseable values mean no timeout.
///
/// Accepts integer seconds (`5`), float seconds (`2.5`), a Nushell
/// duration, or a string with an `s` / `ms` / `sec` suffix (e.g. `500ms`).
fn request_timeout(engine: &EngineInterface) -> Option<Duration> {
    let val = match engine.get_env_var("JMX_TIMEOUT") {
        Ok(Some(v)) => v,
        _ => return None,
    };

    match &val {
        Value::Int { val, .. } if *val >= 0 => Some(Duration::from_secs(*val as u64)),
        Value::Float { val, .. } if *val >= 0.0 => Some(Duration::from_secs_f64(*val)),
        // Nushell durations are stored in nanoseconds.
        Value::Duration { val, .. } if *val >= 0 => Some(Duration::from_nanos(*val as u64)),
        Value::String { val, .. } => parse_duration_string(val),
        _ => None,
    }
}

/// Parse a human-friendly duration like `"5"`, `"2.5"`, `"500ms"`, `"10s"`.
fn parse_duration_string(s: &str) -> Option<Duration> {
    let s = s.trim();
    if s.is_empty() {
        return None;
    }
    if let Some(ms) = s.strip_suffix("ms") {
        return ms
            .trim()
            .parse::<f64>()
            .ok()
            .filter(|v| *v >= 0.0)
            .map(|v| Duration::from_secs_f64(v / 1000.0));
    }
    let s = s
        .strip_suffix("sec")
        .or_else(|| s.strip_suffix('s'))
        .unwrap_or(s);
    s.trim()
        .parse::<f64>()
        .ok()
        .filter(|v| *v >= 0.0)
        .map(Duration::from_secs_f64)
}

fn optional_string(value: Option<&str>, span: Span) -> Value {
    value
        .map(|s| Value::string(s, span))
        .unwrap_or_else(|| Value::nothing(span))
}

fn agent_record(agent: &AgentInfo, span: Span) -> Value {
    let mut record = Record::new();
    record.push("url", Value::string(&agent.url, span));
    record.push("agent", optional_string(agent.agent_version.as_deref(), span));
    record.push("protocol", optional_string(agent.protocol_version.as_deref(), span));
    record.push("product", optional_string(agent.product.as_deref(), span));
    record.push("vendor", optional_string(agent.vendor.as_deref(), span));
    Value::record(record, span)
}

fn info_record(handle: &ObjectHandle, info: &MBeanInfo, span: Span) -> Value {
    let attributes = info
        .attributes
        .iter()
        .map(|a| {
            let mut record = Record::new();
            record.push("name", Value::string(&a.name, span));
            record.push("type", Value::string(&a.type_name, span));
            record.push("writable", Value::bool(a.writable, span));
            record.push("description", optional_string(a.description.as_deref(), span));
            Value::record(record, span)
        })
        .collect();
    let operations = info
        .operations
        .iter()
        .map(|op| {
            let mut record = Record::new();
            record.push("name", Value::string(&op.name, span));
            record.push(
                "parameters",
                Value::list(
                    op.signature()
                        .into_iter()
                        .map(|t| Value::string(t, span))
                        .collect(),
                    span,
                ),
            );
            record.push("returns", Value::string(&op.return_type, span));
            record.push("description", optional_string(op.description.as_deref(), span));
            Value::record(record, span)
        })
        .collect();

    let mut record = Record::new();
    record.push("name", Value::string(handle.to_string(), span));
    record.push("class", Value::string(&info.class_name, span));
    record.push("description", optional_string(info.description.as_deref(), span));
    record.push("attributes", Value::list(attributes, span));
    record.push("operations", Value::list(operations, span));
    Value::record(record, span)
}

/// Render a command's output as a Nushell value.
fn output_value(output: CommandOutput, span: Span) -> Value {
    match output {
        CommandOutput::Connected(agent) => agent_record(&agent, span),
        CommandOutput::Message(message) => Value::string(message, span),
        CommandOutput::Labels(labels) => Value::list(
            labels
                .into_iter()
                .map(|(label, handle)| {
                    let mut record = Record::new();
                    record.push("label", Value::string(label, span));
                    record.push("name", Value::string(handle.to_string(), span));
                    record.push("endpoint", Value::string(handle.endpoint(), span));
                    Value::record(record, span)
                })
                .collect(),
            span,
        ),
        CommandOutput::Names(handles) => Value::list(
            handles
                .iter()
                .map(|h| Value::string(h.to_string(), span))
                .collect(),
            span,
        ),
        CommandOutput::Infos(infos) => Value::list(
            infos
                .iter()
                .map(|(handle, info)| info_record(handle, info, span))
                .collect(),
            span,
        ),
        CommandOutput::Exec(report) => Value::list(
            report
                .results
                .iter()
                .map(|v| values::from_json(v, span))
                .collect(),
            span,
        ),
    }
}

// ---------------------------------------------------------------------------
// `jmx` (main / help)
// ---------------------------------------------------------------------------

struct JmxMain;

impl PluginCommand for JmxMain {
    type Plugin = JmxPlugin;

    fn name(&self) -> &str {
        "jmx"
    }

    fn description(&self) -> &str {
        "Manage remote JVMs over JMX through a Jolokia agent"
    }

    fn extra_description(&self) -> &str {
        r#"
nu-plugin-jmx reads attributes, writes attributes and invokes operations on
the MBeans of a JVM that runs a Jolokia agent:

    jmx connect localhost:8778
    jmx query 'java.lang:type=*'
    jmx exec java.lang:type=Memory --get HeapMemoryUsage
    jmx exec java.lang:type=Memory --op gc

Names may be patterns; every matching MBean is processed in turn:

    jmx exec 'java.lang:type=GarbageCollector,name=*' --get CollectionCount

Labels save typing:

    jmx mbean java.lang:type=Threading --as threads
    jmx exec threads --get ThreadCount
    jmx mbean java.lang:type=Memory          # the default MBean
    jmx exec --op gc                         # uses the default MBean

Overloaded operations are matched by name and argument count; every
candidate is tried and failures are reported on stderr.

Request timeout (default: none):

    $env.JMX_TIMEOUT = 10sec

Diagnostics: set NU_PLUGIN_JMX_LOG (e.g. `debug`) before starting nu.
"#
        .trim()
    }

    fn signature(&self) -> Signature {
        Signature::build(self.name()).category(Category::Network)
    }

    fn search_terms(&self) -> Vec<&str> {
        vec!["jmx", "jolokia", "java", "jvm", "mbean", "management"]
    }

    fn run(
        &self,
        _plugin: &JmxPlugin,
        engine: &EngineInterface,
        _call: &EvaluatedCall,
        _input: PipelineData,
    ) -> Result<PipelineData, LabeledError> {
        Ok(PipelineData::Value(
            Value::string(engine.get_help()?, Span::unknown()),
            None,
        ))
    }
}

// ---------------------------------------------------------------------------
// `jmx connect`
// ---------------------------------------------------------------------------

struct JmxConnect;

impl PluginCommand for JmxConnect {
    type Plugin = JmxPlugin;

    fn name(&self) -> &str {
        "jmx connect"
    }

    fn description(&self) -> &str {
        "Connect to a Jolokia agent"
    }

    fn extra_description(&self) -> &str {
        "The target is a host (port 8778), host:port, or a full agent URL. \
         The agent is asked for its version before the connection replaces \
         the current one. $env.JMX_TIMEOUT sets the request timeout."
    }

    fn signature(&self) -> Signature {
        Signature::build(self.name())
            .optional(
                "host",
                SyntaxShape::String,
                "host, host:port or agent URL (default: localhost:8778)",
            )
            .named(
                "user",
                SyntaxShape::String,
                "user for HTTP basic authentication",
                Some('u'),
            )
            .named(
                "password",
                SyntaxShape::String,
                "password for HTTP basic authentication",
                Some('p'),
            )
            .input_output_types(vec![(Type::Nothing, Type::record())])
            .category(Category::Network)
    }

    fn search_terms(&self) -> Vec<&str> {
        vec!["jmx", "connect", "jolokia", "attach"]
    }

    fn examples(&self) -> Vec<Example<'_>> {
        vec![
            Example {
                example: "jmx connect",
                description: "Connect to the agent on localhost:8778",
                result: None,
            },
            Example {
                example: "jmx connect https://app.example.com/jolokia --user admin --password secret",
                description: "Connect to a secured agent by URL",
                result: None,
            },
        ]
    }

    fn run(
        &self,
        plugin: &JmxPlugin,
        engine: &EngineInterface,
        call: &EvaluatedCall,
        _input: PipelineData,
    ) -> Result<PipelineData, LabeledError> {
        let span = call.head;
        let host: Option<String> = call.opt(0)?;
        let user: Option<String> = call.get_flag("user")?;
        let password: Option<String> = call.get_flag("password")?;

        let mut options = ConnectOptions::new(host.as_deref())
            .map_err(|e| jmx_err(e, span))?
            .with_timeout(request_timeout(engine));
        if let Some(user) = user {
            options = options.with_credentials(user, password);
        }

        let output = run(plugin, Command::Connect(options), false, span)?;
        Ok(PipelineData::Value(output_value(output, span), None))
    }
}

// ---------------------------------------------------------------------------
// `jmx disconnect`
// ---------------------------------------------------------------------------

struct JmxDisconnect;

impl PluginCommand for JmxDisconnect {
    type Plugin = JmxPlugin;

    fn name(&self) -> &str {
        "jmx disconnect"
    }

    fn description(&self) -> &str {
        "Close the current connection"
    }

    fn extra_description(&self) -> &str {
        "Label bindings are kept, but they only resolve again on a \
         connection to the same agent URL."
    }

    fn signature(&self) -> Signature {
        Signature::build(self.name())
            .input_output_types(vec![(Type::Nothing, Type::String)])
            .category(Category::Network)
    }

    fn search_terms(&self) -> Vec<&str> {
        vec!["jmx", "disconnect", "close"]
    }

    fn run(
        &self,
        plugin: &JmxPlugin,
        _engine: &EngineInterface,
        call: &EvaluatedCall,
        _input: PipelineData,
    ) -> Result<PipelineData, LabeledError> {
        let output = run(plugin, Command::Disconnect, false, call.head)?;
        Ok(PipelineData::Value(output_value(output, call.head), None))
    }
}

// ---------------------------------------------------------------------------
// `jmx mbean`
// ---------------------------------------------------------------------------

struct JmxMBean;

impl PluginCommand for JmxMBean {
    type Plugin = JmxPlugin;

    fn name(&self) -> &str {
        "jmx mbean"
    }

    fn description(&self) -> &str {
        "Bind an MBean to a label, or make it the default MBean"
    }

    fn extra_description(&self) -> &str {
        "The name must denote exactly one registered MBean; patterns are \
         refused. Without --as the MBean becomes the default used when \
         `jmx exec` and `jmx info` are called without a bean."
    }

    fn signature(&self) -> Signature {
        Signature::build(self.name())
            .required(
                "bean",
                SyntaxShape::String,
                "object name of a registered MBean",
            )
            .named("as", SyntaxShape::String, "label to bind", Some('a'))
            .switch("quiet", "do not print the status line", Some('q'))
            .input_output_types(vec![(Type::Nothing, Type::String)])
            .category(Category::Network)
    }

    fn search_terms(&self) -> Vec<&str> {
        vec!["jmx", "mbean", "label", "alias", "default"]
    }

    fn examples(&self) -> Vec<Example<'_>> {
        vec![
            Example {
                example: "jmx mbean java.lang:type=Memory",
                description: "Make the memory MBean the default",
                result: None,
            },
            Example {
                example: "jmx mbean java.lang:type=Threading --as threads",
                description: "Refer to the threading MBean as `threads`",
                result: None,
            },
        ]
    }

    fn run(
        &self,
        plugin: &JmxPlugin,
        _engine: &EngineInterface,
        call: &EvaluatedCall,
        _input: PipelineData,
    ) -> Result<PipelineData, LabeledError> {
        let bean: String = call.req(0)?;
        let label: Option<String> = call.get_flag("as")?;
        let quiet = call.has_flag("quiet")?;
        let output = run(plugin, Command::Label { bean, label }, quiet, call.head)?;
        Ok(PipelineData::Value(output_value(output, call.head), None))
    }
}

// ---------------------------------------------------------------------------
// `jmx labels`
// ---------------------------------------------------------------------------

struct JmxLabels;

impl PluginCommand for JmxLabels {
    type Plugin = JmxPlugin;

    fn name(&self) -> &str {
        "jmx labels"
    }

    fn description(&self) -> &str {
        "List label bindings"
    }

    fn signature(&self) -> Signature {
        Signature::build(self.name())
            .input_output_types(vec![(Type::Nothing, Type::table())])
            .category(Category::Network)
    }

    fn search_terms(&self) -> Vec<&str> {
        vec!["jmx", "labels", "mbean", "default"]
    }

    fn run(
        &self,
        plugin: &JmxPlugin,
        _engine: &EngineInterface,
        call: &EvaluatedCall,
        _input: PipelineData,
    ) -> Result<PipelineData, LabeledError> {
        let output = run(plugin, Command::Labels, false, call.head)?;
        Ok(PipelineData::Value(output_value(output, call.head), None))
    }
}

// ---------------------------------------------------------------------------
// `jmx query`
// ---------------------------------------------------------------------------

struct JmxQuery;

impl PluginCommand for JmxQuery {
    type Plugin = JmxPlugin;

    fn name(&self) -> &str {
        "jmx query"
    }

    fn description(&self) -> &str {
        "List the names of MBeans matching a pattern or label"
    }

    fn signature(&self) -> Signature {
        Signature::build(self.name())
            .optional(
                "pattern",
                SyntaxShape::String,
                "object name pattern or label (default: *:*)",
            )
            .input_output_types(vec![(Type::Nothing, Type::List(Box::new(Type::String)))])
            .category(Category::Network)
    }

    fn search_terms(&self) -> Vec<&str> {
        vec!["jmx", "query", "search", "list", "mbean"]
    }

    fn examples(&self) -> Vec<Example<'_>> {
        vec![
            Example {
                example: "jmx query",
                description: "List every registered MBean",
                result: None,
            },
            Example {
                example: "jmx query 'java.lang:type=MemoryPool,*'",
                description: "List the memory pools",
                result: None,
            },
        ]
    }

    fn run(
        &self,
        plugin: &JmxPlugin,
        _engine: &EngineInterface,
        call: &EvaluatedCall,
        _input: PipelineData,
    ) -> Result<PipelineData, LabeledError> {
        let pattern: Option<String> = call.opt(0)?;
        let output = run(plugin, Command::Query { pattern }, false, call.head)?;
        Ok(PipelineData::Value(output_value(output, call.head), None))
    }
}

// ---------------------------------------------------------------------------
// `jmx info`
// ---------------------------------------------------------------------------

struct JmxInfo;

impl PluginCommand for JmxInfo {
    type Plugin = JmxPlugin;

    fn name(&self) -> &str {
        "jmx info"
    }

    fn description(&self) -> &str {
        "Describe the attributes and operations of MBeans"
    }

    fn signature(&self) -> Signature {
        Signature::build(self.name())
            .optional(
                "bean",
                SyntaxShape::String,
                "object name, pattern or label (default: the default MBean)",
            )
            .input_output_types(vec![(Type::Nothing, Type::table())])
            .category(Category::Network)
    }

    fn search_terms(&self) -> Vec<&str> {
        vec!["jmx", "info", "describe", "operations", "attributes"]
    }

    fn examples(&self) -> Vec<Example<'_>> {
        vec![Example {
            example: "jmx info java.lang:type=Memory | get 0.operations",
            description: "Show the operations of the memory MBean",
            result: None,
        }]
    }

    fn run(
        &self,
        plugin: &JmxPlugin,
        _engine: &EngineInterface,
        call: &EvaluatedCall,
        _input: PipelineData,
    ) -> Result<PipelineData, LabeledError> {
        let bean: Option<String> = call.opt(0)?;
        let output = run(plugin, Command::Info { bean }, false, call.head)?;
        Ok(PipelineData::Value(output_value(output, call.head), None))
    }
}

// ---------------------------------------------------------------------------
// `jmx exec`
// ---------------------------------------------------------------------------

struct JmxExec;

impl PluginCommand for JmxExec {
    type Plugin = JmxPlugin;

    fn name(&self) -> &str {
        "jmx exec"
    }

    fn description(&self) -> &str {
        "Get or set attributes and invoke operations on MBeans"
    }

    fn extra_description(&self) -> &str {
        "For every MBean the bean resolves to, --get runs first, then --set, \
         then --op. --set takes its value from --params (a list is written as \
         one array value); --op takes its arguments from --params (a list is \
         positional). --op and --set cannot be combined. Every overload with \
         a matching argument count is invoked; a failing overload is reported \
         on stderr without stopping the others. The result is the list of \
         values read and returned."
    }

    fn signature(&self) -> Signature {
        Signature::build(self.name())
            .optional(
                "bean",
                SyntaxShape::String,
                "object name, pattern or label (default: the default MBean)",
            )
            .named("get", SyntaxShape::String, "attribute to read", Some('g'))
            .named(
                "set",
                SyntaxShape::String,
                "attribute to write (value in --params)",
                Some('s'),
            )
            .named("op", SyntaxShape::String, "operation to invoke", Some('o'))
            .named(
                "params",
                SyntaxShape::Any,
                "operation arguments (a list for several), or the value to set",
                Some('p'),
            )
            .switch("quiet", "do not print status lines", Some('q'))
            .input_output_types(vec![(Type::Nothing, Type::List(Box::new(Type::Any)))])
            .category(Category::Network)
    }

    fn search_terms(&self) -> Vec<&str> {
        vec!["jmx", "exec", "invoke", "attribute", "operation", "mbean"]
    }

    fn examples(&self) -> Vec<Example<'_>> {
        vec![
            Example {
                example: "jmx exec java.lang:type=Memory --get HeapMemoryUsage",
                description: "Read heap usage",
                result: None,
            },
            Example {
                example: "jmx exec java.lang:type=Memory --set Verbose --params true",
                description: "Turn on verbose GC logging",
                result: None,
            },
            Example {
                example: "jmx exec com.example:type=Cache --op resize --params [users 512]",
                description: "Invoke an operation with two arguments",
                result: None,
            },
        ]
    }

    fn run(
        &self,
        plugin: &JmxPlugin,
        _engine: &EngineInterface,
        call: &EvaluatedCall,
        _input: PipelineData,
    ) -> Result<PipelineData, LabeledError> {
        let span = call.head;
        let bean: Option<String> = call.opt(0)?;
        let params: Option<Value> = call.get_flag("params")?;
        let request = ExecRequest {
            bean,
            get: call.get_flag("get")?,
            set: call.get_flag("set")?,
            op: call.get_flag("op")?,
            params: params.as_ref().map(values::to_params),
        };
        let quiet = call.has_flag("quiet")?;

        let output = run(plugin, Command::Exec(request), quiet, span)?;
        Ok(PipelineData::Value(output_value(output, span), None))
    }
}

// ---------------------------------------------------------------------------
// Entry point
// ---------------------------------------------------------------------------

fn main() {
    logging::init();
    serve_plugin(&JmxPlugin::new(), MsgPackSerializer {})
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

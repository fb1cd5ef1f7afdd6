//! Jolokia agent client.
//!
//! Jolokia exposes a JVM's MBean server over HTTP.  Every request is a JSON
//! object `POST`ed to the agent URL; the answer is a JSON object carrying
//! either a `value` or an `error`:
//!
//! ```text
//! → { "type": "read", "mbean": "java.lang:type=Memory", "attribute": "Verbose" }
//! ← { "status": 200, "value": false, "timestamp": 1700000000, "request": {…} }
//! ← { "status": 404, "error_type": "javax.management.InstanceNotFoundException",
//!     "error": "javax.management.InstanceNotFoundException : java.lang:type=Nope" }
//! ```
//!
//! Request types used here: `version`, `search`, `list`, `read`, `write`
//! and `exec`.

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::debug;

use crate::errors::{FaultKind, JmxError, JmxResult, RemoteFault};
use crate::object_name::ObjectName;
use crate::server::{
    AgentInfo, AttributeInfo, MBeanInfo, MBeanServer, MBeanValue, OperationDescriptor,
    ParameterInfo,
};

/// Port a Jolokia JVM agent listens on unless told otherwise.
pub const DEFAULT_PORT: u16 = 8778;

/// Context path of the agent servlet.
pub const DEFAULT_CONTEXT: &str = "/jolokia/";

// ---------------------------------------------------------------------------
// Configuration
// ---------------------------------------------------------------------------

/// How to reach (and authenticate against) a Jolokia agent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectOptions {
    pub url: String,
    pub user: Option<String>,
    pub password: Option<String>,
    /// HTTP request timeout.  `None` leaves requests unbounded.
    pub timeout: Option<Duration>,
}

impl ConnectOptions {
    /// Options for `target`, which may be a bare host, `host:port`, or a full
    /// `http(s)://` agent URL.  `None` means the local default agent.
    pub fn new(target: Option<&str>) -> JmxResult<Self> {
        Ok(Self {
            url: agent_url(target)?,
            user: None,
            password: None,
            timeout: None,
        })
    }

    pub fn with_credentials(mut self, user: impl Into<String>, password: Option<String>) -> Self {
        self.user = Some(user.into());
        self.password = password;
        self
    }

    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }
}

/// Build the agent URL for a connect target.
pub fn agent_url(target: Option<&str>) -> JmxResult<String> {
    let target = target.map(str::trim).unwrap_or("");
    if target.is_empty() {
        return Ok(format!("http://localhost:{DEFAULT_PORT}{DEFAULT_CONTEXT}"));
    }

    if target.starts_with("http://") || target.starts_with("https://") {
        let mut url = target.to_string();
        if !url.ends_with('/') {
            url.push('/');
        }
        return Ok(url);
    }

    // `[v6addr]:port`, `[v6addr]`, `host:port` or `host`.
    let (host, port) = if let Some(rest) = target.strip_prefix('[') {
        let (addr, after) = rest
            .split_once(']')
            .ok_or_else(|| JmxError::usage(format!("invalid host '{target}': missing ']'")))?;
        (format!("[{addr}]"), after.strip_prefix(':'))
    } else {
        match target.split_once(':') {
            Some((host, port)) => (host.to_string(), Some(port)),
            None => (target.to_string(), None),
        }
    };

    if host.is_empty() || host == "[]" {
        return Err(JmxError::usage(format!("invalid host '{target}': missing host name")));
    }

    let port = match port {
        Some(p) => p
            .parse::<u16>()
            .map_err(|_| JmxError::usage(format!("invalid host '{target}': bad port '{p}'")))?,
        None => DEFAULT_PORT,
    };

    Ok(format!("http://{host}:{port}{DEFAULT_CONTEXT}"))
}

// ---------------------------------------------------------------------------
// Wire types
// ---------------------------------------------------------------------------

/// A single Jolokia request.
#[derive(Debug, Clone, Default, Serialize)]
struct Request<'a> {
    #[serde(rename = "type")]
    kind: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    mbean: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    attribute: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    value: Option<&'a MBeanValue>,
    #[serde(skip_serializing_if = "Option::is_none")]
    operation: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    arguments: Option<&'a [MBeanValue]>,
    #[serde(skip_serializing_if = "Option::is_none")]
    path: Option<String>,
}

impl Request<'_> {
    fn new(kind: &'static str) -> Self {
        Self {
            kind,
            ..Default::default()
        }
    }
}

/// A single Jolokia response.
#[derive(Debug, Clone, Deserialize)]
struct Response {
    status: u16,
    #[serde(default)]
    value: Value,
    #[serde(default)]
    error: Option<String>,
    #[serde(default)]
    error_type: Option<String>,
}

/// Classify a Jolokia error into a [`FaultKind`], using the Java exception
/// class when the agent reported one and the status code otherwise.
fn classify(error_type: Option<&str>, status: u16) -> FaultKind {
    let Some(error_type) = error_type else {
        return match status {
            401 | 403 => FaultKind::Security,
            404 => FaultKind::InstanceNotFound,
            _ => FaultKind::Runtime,
        };
    };

    let simple = error_type.rsplit('.').next().unwrap_or(error_type);
    match simple {
        "InstanceNotFoundException" => FaultKind::InstanceNotFound,
        "AttributeNotFoundException" => FaultKind::AttributeNotFound,
        "InvalidAttributeValueException"
        | "IllegalArgumentException"
        | "NumberFormatException"
        | "ClassCastException" => FaultKind::InvalidValue,
        "MBeanException" | "RuntimeMBeanException" | "RuntimeErrorException" => {
            FaultKind::MBeanException
        }
        "ReflectionException" | "NoSuchMethodException" | "IntrospectionException" => {
            FaultKind::Reflection
        }
        "SecurityException" => FaultKind::Security,
        _ => FaultKind::Runtime,
    }
}

/// Turn a raw HTTP answer into the request's `value` or a normalized fault.
fn decode_response(http_status: u16, body: &str) -> Result<Value, RemoteFault> {
    let raw: Value = match serde_json::from_str(body) {
        Ok(v) => v,
        Err(e) => {
            let kind = if matches!(http_status, 401 | 403) {
                FaultKind::Security
            } else {
                FaultKind::Transport
            };
            return Err(RemoteFault::new(
                kind,
                format!("HTTP {http_status}: response is not a Jolokia reply ({e})"),
            ));
        }
    };

    let resp: Response = serde_json::from_value(raw).map_err(|e| {
        RemoteFault::transport(format!("HTTP {http_status}: malformed Jolokia reply ({e})"))
    })?;

    if resp.status == 200 {
        return Ok(resp.value);
    }

    let kind = classify(resp.error_type.as_deref(), resp.status);
    let message = resp
        .error
        .unwrap_or_else(|| format!("agent returned status {}", resp.status));
    let mut fault = RemoteFault::new(kind, message);
    if let Some(error_type) = resp.error_type {
        fault = fault.with_error_type(error_type);
    }
    Err(fault)
}

// ---------------------------------------------------------------------------
// Metadata parsing
// ---------------------------------------------------------------------------

fn get_str<'a>(map: &'a Map<String, Value>, key: &str) -> Option<&'a str> {
    map.get(key).and_then(Value::as_str)
}

fn get_string(map: &Map<String, Value>, key: &str) -> Option<String> {
    get_str(map, key).filter(|s| !s.is_empty()).map(str::to_string)
}

fn parse_operation(name: &str, map: &Map<String, Value>) -> OperationDescriptor {
    let parameters = map
        .get("args")
        .and_then(Value::as_array)
        .map(|args| {
            args.iter()
                .filter_map(Value::as_object)
                .map(|arg| ParameterInfo {
                    name: get_str(arg, "name").unwrap_or("").to_string(),
                    type_name: get_str(arg, "type").unwrap_or("").to_string(),
                    description: get_string(arg, "desc"),
                })
                .collect()
        })
        .unwrap_or_default();

    OperationDescriptor {
        name: name.to_string(),
        parameters,
        return_type: get_str(map, "ret").unwrap_or("void").to_string(),
        description: get_string(map, "desc"),
    }
}

/// Parse the `list` value of a single MBean into an [`MBeanInfo`].
///
/// Overloaded operations arrive as an array under one name; they are
/// flattened into separate descriptors, keeping the reported order.
fn parse_mbean_info(value: &Value) -> Result<MBeanInfo, RemoteFault> {
    let map = value
        .as_object()
        .ok_or_else(|| RemoteFault::transport("list: expected an object describing the MBean"))?;

    let attributes = map
        .get("attr")
        .and_then(Value::as_object)
        .map(|attrs| {
            attrs
                .iter()
                .filter_map(|(name, info)| {
                    let info = info.as_object()?;
                    Some(AttributeInfo {
                        name: name.clone(),
                        type_name: get_str(info, "type").unwrap_or("").to_string(),
                        writable: info.get("rw").and_then(Value::as_bool).unwrap_or(false),
                        description: get_string(info, "desc"),
                    })
                })
                .collect()
        })
        .unwrap_or_default();

    let mut operations = Vec::new();
    if let Some(ops) = map.get("op").and_then(Value::as_object) {
        for (name, entry) in ops {
            match entry {
                Value::Object(op) => operations.push(parse_operation(name, op)),
                Value::Array(overloads) => operations.extend(
                    overloads
                        .iter()
                        .filter_map(Value::as_object)
                        .map(|op| parse_operation(name, op)),
                ),
                _ => {}
            }
        }
    }

    Ok(MBeanInfo {
        class_name: get_str(map, "class").unwrap_or("").to_string(),
        description: get_string(map, "desc"),
        attributes,
        operations,
    })
}

fn parse_names(value: &Value) -> Result<Vec<ObjectName>, RemoteFault> {
    let names = value
        .as_array()
        .ok_or_else(|| RemoteFault::transport("search: expected an array of names"))?;
    names
        .iter()
        .map(|n| {
            let s = n
                .as_str()
                .ok_or_else(|| RemoteFault::transport("search: expected string names"))?;
            ObjectName::parse(s)
                .map_err(|e| RemoteFault::transport(format!("search: agent returned {e}")))
        })
        .collect()
}

/// The operation string Jolokia uses to pick an overload: `name(t1,t2)`.
fn operation_with_signature(operation: &str, signature: &[String]) -> String {
    format!("{operation}({})", signature.join(","))
}

// ---------------------------------------------------------------------------
// Client
// ---------------------------------------------------------------------------

/// An [`MBeanServer`] reached through a Jolokia agent.
pub struct JolokiaClient {
    http: reqwest::Client,
    options: ConnectOptions,
}

impl JolokiaClient {
    pub fn new(options: ConnectOptions) -> JmxResult<Self> {
        let mut builder = reqwest::Client::builder();
        if let Some(timeout) = options.timeout {
            builder = builder.timeout(timeout);
        }
        let http = builder
            .build()
            .map_err(|e| JmxError::Internal(format!("failed to create HTTP client: {e}")))?;
        Ok(Self { http, options })
    }

    pub fn url(&self) -> &str {
        &self.options.url
    }

    /// Send one request and decode its answer.
    async fn call(&self, request: &Request<'_>) -> Result<Value, RemoteFault> {
        debug!(
            kind = request.kind,
            mbean = request.mbean.as_deref().unwrap_or(""),
            url = %self.options.url,
            "jolokia request"
        );

        let mut builder = self.http.post(&self.options.url).json(request);
        if let Some(ref user) = self.options.user {
            builder = builder.basic_auth(user, self.options.password.as_ref());
        }

        let response = builder.send().await.map_err(|e| {
            RemoteFault::transport(format!("request to {} failed: {e}", self.options.url))
        })?;
        let status = response.status().as_u16();
        let body = response.text().await.map_err(|e| {
            RemoteFault::transport(format!("reading reply from {} failed: {e}", self.options.url))
        })?;

        decode_response(status, &body)
    }
}

#[async_trait]
impl MBeanServer for JolokiaClient {
    async fn query_names(&self, pattern: &ObjectName) -> Result<Vec<ObjectName>, RemoteFault> {
        let request = Request {
            mbean: Some(pattern.to_string()),
            ..Request::new("search")
        };
        let value = self.call(&request).await?;
        parse_names(&value)
    }

    async fn mbean_info(&self, name: &ObjectName) -> Result<MBeanInfo, RemoteFault> {
        let request = Request {
            path: Some(name.list_path()),
            ..Request::new("list")
        };
        let value = self.call(&request).await?;
        parse_mbean_info(&value)
    }

    async fn get_attribute(
        &self,
        name: &ObjectName,
        attribute: &str,
    ) -> Result<MBeanValue, RemoteFault> {
        let request = Request {
            mbean: Some(name.to_string()),
            attribute: Some(attribute),
            ..Request::new("read")
        };
        self.call(&request).await
    }

    async fn set_attribute(
        &self,
        name: &ObjectName,
        attribute: &str,
        value: MBeanValue,
    ) -> Result<(), RemoteFault> {
        let request = Request {
            mbean: Some(name.to_string()),
            attribute: Some(attribute),
            value: Some(&value),
            ..Request::new("write")
        };
        // The agent answers with the previous value, which nobody needs.
        self.call(&request).await.map(|_| ())
    }

    async fn invoke(
        &self,
        name: &ObjectName,
        operation: &str,
        args: &[MBeanValue],
        signature: &[String],
    ) -> Result<MBeanValue, RemoteFault> {
        let request = Request {
            mbean: Some(name.to_string()),
            operation: Some(operation_with_signature(operation, signature)),
            arguments: Some(args),
            ..Request::new("exec")
        };
        self.call(&request).await
    }

    async fn check(&self) -> Result<AgentInfo, RemoteFault> {
        let value = self.call(&Request::new("version")).await?;
        let map = value
            .as_object()
            .ok_or_else(|| RemoteFault::transport("version: expected an object"))?;
        let info = map.get("info").and_then(Value::as_object);

        Ok(AgentInfo {
            url: self.url().to_string(),
            agent_version: get_string(map, "agent"),
            protocol_version: get_string(map, "protocol"),
            product: info.and_then(|i| get_string(i, "product")),
            vendor: info.and_then(|i| get_string(i, "vendor")),
        })
    }

    fn description(&self) -> String {
        self.url().to_string()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::Matcher;
    use serde_json::json;

    #[test]
    fn agent_url_defaults() {
        assert_eq!(agent_url(None).unwrap(), "http://localhost:8778/jolokia/");
        assert_eq!(agent_url(Some("  ")).unwrap(), "http://localhost:8778/jolokia/");
    }

    #[test]
    fn agent_url_host_and_port() {
        assert_eq!(agent_url(Some("myvm")).unwrap(), "http://myvm:8778/jolokia/");
        assert_eq!(agent_url(Some("myvm:1999")).unwrap(), "http://myvm:1999/jolokia/");
        assert_eq!(agent_url(Some("[::1]:9000")).unwrap(), "http://[::1]:9000/jolokia/");
        assert_eq!(agent_url(Some("[::1]")).unwrap(), "http://[::1]:8778/jolokia/");
    }

    #[test]
    fn agent_url_full_url_kept() {
        assert_eq!(
            agent_url(Some("https://app.example.com/actuator/jolokia")).unwrap(),
            "https://app.example.com/actuator/jolokia/"
        );
    }

    #[test]
    fn agent_url_rejects_bad_port() {
        let err = agent_url(Some("myvm:http")).unwrap_err();
        assert!(err.is_usage());
        assert!(agent_url(Some(":8778")).unwrap_err().is_usage());
        assert!(agent_url(Some("[::1")).unwrap_err().is_usage());
    }

    #[test]
    fn classify_variants() {
        let c = |t: &str| classify(Some(t), 500);
        assert_eq!(c("javax.management.InstanceNotFoundException"), FaultKind::InstanceNotFound);
        assert_eq!(c("javax.management.AttributeNotFoundException"), FaultKind::AttributeNotFound);
        assert_eq!(c("java.lang.IllegalArgumentException"), FaultKind::InvalidValue);
        assert_eq!(c("javax.management.MBeanException"), FaultKind::MBeanException);
        assert_eq!(c("javax.management.ReflectionException"), FaultKind::Reflection);
        assert_eq!(c("java.lang.SecurityException"), FaultKind::Security);
        assert_eq!(c("java.lang.UnsupportedOperationException"), FaultKind::Runtime);
        assert_eq!(classify(None, 403), FaultKind::Security);
        assert_eq!(classify(None, 404), FaultKind::InstanceNotFound);
    }

    #[test]
    fn decode_success_value() {
        let value = decode_response(200, r#"{"status":200,"value":{"used":42}}"#).unwrap();
        assert_eq!(value, json!({"used": 42}));
    }

    #[test]
    fn decode_missing_value_is_null() {
        let value = decode_response(200, r#"{"status":200}"#).unwrap();
        assert!(value.is_null());
    }

    #[test]
    fn decode_error_keeps_cause() {
        let body = json!({
            "status": 404,
            "error_type": "javax.management.InstanceNotFoundException",
            "error": "javax.management.InstanceNotFoundException : java.lang:type=Nope",
        })
        .to_string();
        let fault = decode_response(200, &body).unwrap_err();
        assert_eq!(fault.kind, FaultKind::InstanceNotFound);
        assert_eq!(
            fault.error_type.as_deref(),
            Some("javax.management.InstanceNotFoundException")
        );
        assert_eq!(
            fault.message,
            "javax.management.InstanceNotFoundException : java.lang:type=Nope"
        );
    }

    #[test]
    fn decode_non_json_body() {
        let fault = decode_response(502, "<html>Bad Gateway</html>").unwrap_err();
        assert_eq!(fault.kind, FaultKind::Transport);
        assert!(fault.message.starts_with("HTTP 502"));

        let fault = decode_response(401, "Unauthorized").unwrap_err();
        assert_eq!(fault.kind, FaultKind::Security);
    }

    #[test]
    fn parse_mbean_info_flattens_overloads() {
        let value = json!({
            "class": "org.example.TestBean",
            "desc": "Information on the management interface of the MBean",
            "attr": {
                "StringValue": {"type": "java.lang.String", "rw": true, "desc": ""},
                "NumericValue": {"type": "java.lang.Integer", "rw": false, "desc": "a number"}
            },
            "op": {
                "exec": [
                    {"args": [], "ret": "void", "desc": ""},
                    {"args": [{"name": "p1", "type": "java.lang.String", "desc": ""}], "ret": "void", "desc": ""}
                ],
                "retrieveValue": {"args": [], "ret": "java.lang.String", "desc": "Operation exposed"}
            }
        });

        let info = parse_mbean_info(&value).unwrap();
        assert_eq!(info.class_name, "org.example.TestBean");
        assert_eq!(info.attributes.len(), 2);
        assert_eq!(info.attributes[0].name, "StringValue");
        assert!(info.attributes[0].writable);
        assert_eq!(info.attributes[0].description, None);
        assert!(!info.attributes[1].writable);
        assert_eq!(info.attributes[1].description.as_deref(), Some("a number"));

        let names: Vec<_> = info
            .operations
            .iter()
            .map(|op| (op.name.as_str(), op.arity()))
            .collect();
        assert_eq!(names, vec![("exec", 0), ("exec", 1), ("retrieveValue", 0)]);
        assert_eq!(info.operations[1].signature(), vec!["java.lang.String"]);
        assert_eq!(info.operations[2].return_type, "java.lang.String");
    }

    #[test]
    fn parse_mbean_info_rejects_non_object() {
        assert!(parse_mbean_info(&json!([1, 2])).is_err());
    }

    #[test]
    fn operation_signature_string() {
        assert_eq!(operation_with_signature("exec", &[]), "exec()");
        assert_eq!(
            operation_with_signature("execWithParams", &["java.lang.String".into(), "int".into()]),
            "execWithParams(java.lang.String,int)"
        );
    }

    // -- HTTP round trips against a mock agent --------------------------------

    fn client_for(server: &mockito::ServerGuard) -> JolokiaClient {
        let options = ConnectOptions::new(Some(&format!("{}/jolokia", server.url()))).unwrap();
        JolokiaClient::new(options).unwrap()
    }

    fn reply(value: Value) -> String {
        json!({"status": 200, "value": value, "timestamp": 1_700_000_000}).to_string()
    }

    #[tokio::test]
    async fn search_returns_names_in_order() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/jolokia/")
            .match_body(Matcher::PartialJson(
                json!({"type": "search", "mbean": "java.lang:type=GarbageCollector,*"}),
            ))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(reply(json!([
                "java.lang:name=G1 Young Generation,type=GarbageCollector",
                "java.lang:name=G1 Old Generation,type=GarbageCollector"
            ])))
            .create_async()
            .await;

        let client = client_for(&server);
        let pattern = ObjectName::parse("java.lang:type=GarbageCollector,*").unwrap();
        let names = client.query_names(&pattern).await.unwrap();
        assert_eq!(names.len(), 2);
        assert_eq!(names[0].get("name"), Some("G1 Young Generation"));
        assert_eq!(names[1].get("name"), Some("G1 Old Generation"));
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn list_uses_escaped_path() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/jolokia/")
            .match_body(Matcher::PartialJson(
                json!({"type": "list", "path": "java.lang/type=Memory"}),
            ))
            .with_status(200)
            .with_body(reply(json!({
                "class": "sun.management.MemoryImpl",
                "attr": {"Verbose": {"type": "boolean", "rw": true}},
                "op": {"gc": {"args": [], "ret": "void"}}
            })))
            .create_async()
            .await;

        let client = client_for(&server);
        let name = ObjectName::parse("java.lang:type=Memory").unwrap();
        let info = client.mbean_info(&name).await.unwrap();
        assert_eq!(info.class_name, "sun.management.MemoryImpl");
        assert_eq!(info.operations[0].name, "gc");
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn exec_sends_signature_and_arguments() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/jolokia/")
            .match_body(Matcher::Json(json!({
                "type": "exec",
                "mbean": "test.jmx:type=bean",
                "operation": "execWithParams(java.lang.String,java.lang.Integer)",
                "arguments": ["a", 1]
            })))
            .with_status(200)
            .with_body(reply(Value::Null))
            .create_async()
            .await;

        let client = client_for(&server);
        let name = ObjectName::parse("test.jmx:type=bean").unwrap();
        let result = client
            .invoke(
                &name,
                "execWithParams",
                &[json!("a"), json!(1)],
                &["java.lang.String".into(), "java.lang.Integer".into()],
            )
            .await
            .unwrap();
        assert!(result.is_null());
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn write_and_read_attribute() {
        let mut server = mockito::Server::new_async().await;
        let write = server
            .mock("POST", "/jolokia/")
            .match_body(Matcher::PartialJson(json!({
                "type": "write", "attribute": "StringValue", "value": "hello"
            })))
            .with_status(200)
            .with_body(reply(json!("previous")))
            .create_async()
            .await;
        let read = server
            .mock("POST", "/jolokia/")
            .match_body(Matcher::PartialJson(
                json!({"type": "read", "attribute": "StringValue"}),
            ))
            .with_status(200)
            .with_body(reply(json!("hello")))
            .create_async()
            .await;

        let client = client_for(&server);
        let name = ObjectName::parse("test.jmx:type=bean").unwrap();
        client
            .set_attribute(&name, "StringValue", json!("hello"))
            .await
            .unwrap();
        let value = client.get_attribute(&name, "StringValue").await.unwrap();
        assert_eq!(value, json!("hello"));
        write.assert_async().await;
        read.assert_async().await;
    }

    #[tokio::test]
    async fn read_error_is_normalized() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/jolokia/")
            .with_status(200)
            .with_body(
                json!({
                    "status": 404,
                    "error_type": "javax.management.AttributeNotFoundException",
                    "error": "No such attribute: Nope"
                })
                .to_string(),
            )
            .create_async()
            .await;

        let client = client_for(&server);
        let name = ObjectName::parse("test.jmx:type=bean").unwrap();
        let fault = client.get_attribute(&name, "Nope").await.unwrap_err();
        assert_eq!(fault.kind, FaultKind::AttributeNotFound);
        assert_eq!(fault.message, "No such attribute: Nope");
    }

    #[tokio::test]
    async fn check_reads_version_info() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/jolokia/")
            .match_body(Matcher::PartialJson(json!({"type": "version"})))
            .with_status(200)
            .with_body(reply(json!({
                "agent": "1.7.2",
                "protocol": "7.2",
                "info": {"product": "tomcat", "vendor": "Apache", "version": "9.0.80"}
            })))
            .create_async()
            .await;

        let client = client_for(&server);
        let info = client.check().await.unwrap();
        assert_eq!(info.agent_version.as_deref(), Some("1.7.2"));
        assert_eq!(info.protocol_version.as_deref(), Some("7.2"));
        assert_eq!(info.product.as_deref(), Some("tomcat"));
        assert_eq!(info.vendor.as_deref(), Some("Apache"));
        assert!(info.url.ends_with("/jolokia/"));
        assert_eq!(info.url, client.url());
    }

    #[tokio::test]
    async fn basic_auth_header_sent() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/jolokia/")
            // base64("admin:secret")
            .match_header("authorization", "Basic YWRtaW46c2VjcmV0")
            .with_status(200)
            .with_body(reply(json!({"agent": "2.0.0"})))
            .create_async()
            .await;

        let options = ConnectOptions::new(Some(&format!("{}/jolokia", server.url())))
            .unwrap()
            .with_credentials("admin", Some("secret".into()));
        let client = JolokiaClient::new(options).unwrap();
        client.check().await.unwrap();
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn unreachable_agent_is_transport_fault() {
        // Port 9 (discard) on localhost is essentially never served over HTTP.
        let options = ConnectOptions::new(Some("127.0.0.1:9"))
            .unwrap()
            .with_timeout(Some(Duration::from_secs(2)));
        let client = JolokiaClient::new(options).unwrap();
        let fault = client.check().await.unwrap_err();
        assert_eq!(fault.kind, FaultKind::Transport);
    }
}

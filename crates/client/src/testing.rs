//! In-memory [`MBeanServer`] used by the unit tests.
//!
//! Beans, attributes and operations are registered at runtime, so a test
//! can change the "remote" schema between two calls.  Operation arguments
//! are type-checked against the declared signature the way a JMX server
//! would reject a mismatched overload.

use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use serde_json::Value;

use crate::errors::{FaultKind, RemoteFault};
use crate::object_name::ObjectName;
use crate::server::{
    AgentInfo, AttributeInfo, MBeanInfo, MBeanServer, MBeanValue, OperationDescriptor,
    ParameterInfo,
};

pub type Handler = Box<dyn Fn(&[MBeanValue]) -> Result<MBeanValue, RemoteFault> + Send + Sync>;

struct Operation {
    descriptor: OperationDescriptor,
    handler: Handler,
}

struct Bean {
    name: ObjectName,
    class_name: String,
    attributes: Vec<(AttributeInfo, MBeanValue)>,
    operations: Vec<Operation>,
}

pub struct InMemoryServer {
    endpoint: String,
    beans: Mutex<Vec<Bean>>,
    info_calls: AtomicUsize,
    invocations: Mutex<Vec<String>>,
    info_fault: Mutex<Option<RemoteFault>>,
}

fn not_registered(name: &ObjectName) -> RemoteFault {
    RemoteFault::new(FaultKind::InstanceNotFound, name.to_string())
        .with_error_type("javax.management.InstanceNotFoundException")
}

/// Loose model of server-side argument conversion.
fn accepts(type_name: &str, value: &MBeanValue) -> bool {
    match type_name {
        "java.lang.String" => value.is_string(),
        "int" | "long" | "short" | "byte" | "java.lang.Integer" | "java.lang.Long" => {
            value.is_i64() || value.is_u64()
        }
        "double" | "float" | "java.lang.Double" | "java.lang.Float" => value.is_number(),
        "boolean" | "java.lang.Boolean" => value.is_boolean(),
        _ => true,
    }
}

impl InMemoryServer {
    pub fn new(endpoint: &str) -> Self {
        Self {
            endpoint: endpoint.to_string(),
            beans: Mutex::new(Vec::new()),
            info_calls: AtomicUsize::new(0),
            invocations: Mutex::new(Vec::new()),
            info_fault: Mutex::new(None),
        }
    }

    pub fn add_bean(&self, name: &str, class_name: &str) {
        self.beans.lock().unwrap().push(Bean {
            name: ObjectName::parse(name).unwrap(),
            class_name: class_name.to_string(),
            attributes: Vec::new(),
            operations: Vec::new(),
        });
    }

    fn with_bean<T>(&self, name: &str, f: impl FnOnce(&mut Bean) -> T) -> T {
        let name = ObjectName::parse(name).unwrap();
        let mut beans = self.beans.lock().unwrap();
        let bean = beans.iter_mut().find(|b| b.name == name).unwrap();
        f(bean)
    }

    pub fn add_attribute(&self, bean: &str, attr: &str, type_name: &str, writable: bool, value: Value) {
        self.with_bean(bean, |b| {
            b.attributes.push((
                AttributeInfo {
                    name: attr.to_string(),
                    type_name: type_name.to_string(),
                    writable,
                    description: None,
                },
                value,
            ))
        });
    }

    pub fn add_operation(
        &self,
        bean: &str,
        op: &str,
        types: &[&str],
        return_type: &str,
        handler: impl Fn(&[MBeanValue]) -> Result<MBeanValue, RemoteFault> + Send + Sync + 'static,
    ) {
        let descriptor = OperationDescriptor {
            name: op.to_string(),
            parameters: types
                .iter()
                .enumerate()
                .map(|(i, t)| ParameterInfo {
                    name: format!("p{}", i + 1),
                    type_name: (*t).to_string(),
                    description: None,
                })
                .collect(),
            return_type: return_type.to_string(),
            description: None,
        };
        self.with_bean(bean, |b| {
            b.operations.push(Operation {
                descriptor,
                handler: Box::new(handler),
            })
        });
    }

    /// Make every subsequent metadata fetch fail with `fault`.
    pub fn fail_mbean_info(&self, fault: RemoteFault) {
        *self.info_fault.lock().unwrap() = Some(fault);
    }

    pub fn info_calls(&self) -> usize {
        self.info_calls.load(Ordering::SeqCst)
    }

    /// Every invoke attempt so far, as `operation(type,…)`.
    pub fn invocations(&self) -> Vec<String> {
        self.invocations.lock().unwrap().clone()
    }

    pub fn attribute(&self, bean: &str, attr: &str) -> Option<Value> {
        self.with_bean(bean, |b| {
            b.attributes
                .iter()
                .find(|(info, _)| info.name == attr)
                .map(|(_, v)| v.clone())
        })
    }
}

#[async_trait]
impl MBeanServer for InMemoryServer {
    async fn query_names(&self, pattern: &ObjectName) -> Result<Vec<ObjectName>, RemoteFault> {
        Ok(self
            .beans
            .lock()
            .unwrap()
            .iter()
            .filter(|b| pattern.matches(&b.name))
            .map(|b| b.name.clone())
            .collect())
    }

    async fn mbean_info(&self, name: &ObjectName) -> Result<MBeanInfo, RemoteFault> {
        self.info_calls.fetch_add(1, Ordering::SeqCst);
        if let Some(fault) = self.info_fault.lock().unwrap().clone() {
            return Err(fault);
        }
        let beans = self.beans.lock().unwrap();
        let bean = beans
            .iter()
            .find(|b| &b.name == name)
            .ok_or_else(|| not_registered(name))?;
        Ok(MBeanInfo {
            class_name: bean.class_name.clone(),
            description: None,
            attributes: bean.attributes.iter().map(|(a, _)| a.clone()).collect(),
            operations: bean.operations.iter().map(|o| o.descriptor.clone()).collect(),
        })
    }

    async fn get_attribute(&self, name: &ObjectName, attribute: &str) -> Result<MBeanValue, RemoteFault> {
        let beans = self.beans.lock().unwrap();
        let bean = beans
            .iter()
            .find(|b| &b.name == name)
            .ok_or_else(|| not_registered(name))?;
        bean.attributes
            .iter()
            .find(|(info, _)| info.name == attribute)
            .map(|(_, v)| v.clone())
            .ok_or_else(|| {
                RemoteFault::new(FaultKind::AttributeNotFound, format!("No such attribute: {attribute}"))
            })
    }

    async fn set_attribute(
        &self,
        name: &ObjectName,
        attribute: &str,
        value: MBeanValue,
    ) -> Result<(), RemoteFault> {
        let mut beans = self.beans.lock().unwrap();
        let bean = beans
            .iter_mut()
            .find(|b| &b.name == name)
            .ok_or_else(|| not_registered(name))?;
        let (info, slot) = bean
            .attributes
            .iter_mut()
            .find(|(info, _)| info.name == attribute)
            .ok_or_else(|| {
                RemoteFault::new(FaultKind::AttributeNotFound, format!("No such attribute: {attribute}"))
            })?;
        if !info.writable {
            return Err(RemoteFault::new(
                FaultKind::Runtime,
                format!("Attribute {attribute} is read-only"),
            ));
        }
        if !accepts(&info.type_name, &value) {
            return Err(RemoteFault::new(
                FaultKind::InvalidValue,
                format!("Cannot convert {value} to {}", info.type_name),
            ));
        }
        *slot = value;
        Ok(())
    }

    async fn invoke(
        &self,
        name: &ObjectName,
        operation: &str,
        args: &[MBeanValue],
        signature: &[String],
    ) -> Result<MBeanValue, RemoteFault> {
        self.invocations
            .lock()
            .unwrap()
            .push(format!("{operation}({})", signature.join(",")));

        let beans = self.beans.lock().unwrap();
        let bean = beans
            .iter()
            .find(|b| &b.name == name)
            .ok_or_else(|| not_registered(name))?;
        let op = bean
            .operations
            .iter()
            .find(|o| o.descriptor.name == operation && o.descriptor.signature() == signature)
            .ok_or_else(|| {
                RemoteFault::new(
                    FaultKind::Reflection,
                    format!("No operation {operation}({})", signature.join(",")),
                )
            })?;
        if args.len() != signature.len() {
            return Err(RemoteFault::new(FaultKind::Reflection, "argument count mismatch"));
        }
        for (arg, type_name) in args.iter().zip(signature) {
            if !accepts(type_name, arg) {
                return Err(RemoteFault::new(
                    FaultKind::InvalidValue,
                    format!("Cannot convert {arg} to {type_name}"),
                )
                .with_error_type("java.lang.IllegalArgumentException"));
            }
        }
        (op.handler)(args)
    }

    async fn check(&self) -> Result<AgentInfo, RemoteFault> {
        Ok(AgentInfo {
            url: self.endpoint.clone(),
            agent_version: Some("test".into()),
            ..Default::default()
        })
    }

    fn description(&self) -> String {
        self.endpoint.clone()
    }
}

/// A server holding `test.jmx:type=bean`, with overloads by type and by
/// arity.
pub fn test_bean_server(endpoint: &str) -> InMemoryServer {
    const BEAN: &str = "test.jmx:type=bean";
    let server = InMemoryServer::new(endpoint);
    server.add_bean(BEAN, "org.example.TestBean");
    server.add_attribute(BEAN, "StringValue", "java.lang.String", true, Value::from("initial"));
    server.add_attribute(BEAN, "NumericValue", "java.lang.Integer", true, Value::from(1));
    server.add_attribute(BEAN, "BooleanValue", "boolean", true, Value::from(false));
    server.add_attribute(BEAN, "Uptime", "long", false, Value::from(1000));
    server.add_operation(BEAN, "exec", &[], "void", |_| Ok(Value::Null));
    server.add_operation(BEAN, "exec", &["java.lang.String"], "void", |_| Ok(Value::Null));
    server.add_operation(BEAN, "execWithParam", &["java.lang.String"], "java.lang.String", |a| {
        Ok(Value::from(format!("string:{}", a[0].as_str().unwrap_or_default())))
    });
    server.add_operation(BEAN, "execWithParam", &["java.lang.Integer"], "java.lang.String", |a| {
        Ok(Value::from(format!("integer:{}", a[0])))
    });
    server.add_operation(
        BEAN,
        "execWithParams",
        &["java.lang.String", "java.lang.Integer"],
        "java.lang.String",
        |a| Ok(Value::from(format!("{}-{}", a[0].as_str().unwrap_or_default(), a[1]))),
    );
    server.add_operation(BEAN, "retrieveValue", &[], "java.lang.String", |_| {
        Ok(Value::from("retrieved"))
    });
    server.add_operation(BEAN, "explode", &[], "void", |_| {
        Err(RemoteFault::new(FaultKind::MBeanException, "java.lang.IllegalStateException: boom")
            .with_error_type("javax.management.MBeanException"))
    });
    server
}

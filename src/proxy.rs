//! Read-only script views of attributes and targets.
//!
//! A computed-attribute function receives `(attr, t)`. Both are proxies over the model: field reads are answered
//! from the underlying struct, and which fields exist follows [`KindCapabilities`](crate::model::KindCapabilities).

use std::rc::Rc;
use std::sync::Arc;

use crate::interp::{EvalError, Value};
use crate::model::{Attr, Target, TargetRef};

fn no_such_field(type_name: &str, field: &str) -> EvalError {
    EvalError::new(format!("{} has no .{} attribute", type_name, field))
}

/// The `attr` argument.
#[derive(Debug)]
pub struct AttrProxy {
    attr: Attr,
}

impl AttrProxy {
    pub const TYPE: &'static str = "attr";

    pub fn new(attr: Attr) -> Self {
        Self { attr }
    }

    pub fn value(attr: Attr) -> Value {
        Value::Attr(Rc::new(Self::new(attr)))
    }

    pub fn field_names(&self) -> &'static [&'static str] {
        &["name", "path", "parent"]
    }

    pub fn field(&self, name: &str) -> Result<Value, EvalError> {
        match name {
            "name" => Ok(Value::str(self.attr.name.as_str())),
            "path" => Ok(Value::str(self.attr.path.as_str())),
            "parent" => TargetProxy::from_ref(&self.attr.parent),
            _ => Err(no_such_field(Self::TYPE, name)),
        }
    }

    pub(crate) fn same_as(&self, other: &AttrProxy) -> bool {
        self.attr.path == other.attr.path
    }
}

/// The `t` argument, and every target reachable from it.
#[derive(Debug)]
pub struct TargetProxy {
    target: Arc<Target>,
}

impl TargetProxy {
    pub fn new(target: Arc<Target>) -> Self {
        Self { target }
    }

    pub fn value(target: Arc<Target>) -> Value {
        Value::Target(Rc::new(Self::new(target)))
    }

    /// Follow a reference; fails if it was never resolved against a graph.
    pub fn from_ref(reference: &TargetRef) -> Result<Value, EvalError> {
        reference
            .target()
            .map(|t| Self::value(t.clone()))
            .ok_or_else(|| EvalError::new(format!("unresolved reference {}", reference.path)))
    }

    pub fn type_name(&self) -> &'static str {
        self.target.kind().as_str()
    }

    pub fn field_names(&self) -> Vec<&'static str> {
        let caps = self.target.kind().capabilities();
        let mut names = vec!["type", "is_class"];
        if caps.naming {
            names.extend(["name", "path"]);
        }
        if caps.class {
            names.push("parent");
        }
        if caps.deps {
            names.push("deps");
        }
        if caps.details {
            names.push("details");
        }
        names
    }

    pub fn field(&self, name: &str) -> Result<Value, EvalError> {
        let caps = self.target.kind().capabilities();
        match name {
            "type" => Ok(Value::str(self.type_name())),
            "is_class" => Ok(Value::Bool(self.target.is_class())),
            "name" if caps.naming => Ok(Value::str(self.target.name())),
            "path" if caps.naming => Ok(Value::str(self.target.path())),
            "parent" => match self.target.class() {
                Some(class) => TargetProxy::from_ref(class),
                None => Err(no_such_field(self.type_name(), name)),
            },
            "deps" => match self.target.deps() {
                Some(deps) => ref_list(deps),
                None => Err(no_such_field(self.type_name(), name)),
            },
            "details" => match self.target.details() {
                Some(details) => ref_list(details),
                None => Err(no_such_field(self.type_name(), name)),
            },
            _ => Err(no_such_field(self.type_name(), name)),
        }
    }

    pub(crate) fn same_as(&self, other: &TargetProxy) -> bool {
        Arc::ptr_eq(&self.target, &other.target) || self.target.path() == other.target.path()
    }
}

fn ref_list(refs: &[TargetRef]) -> Result<Value, EvalError> {
    let items = refs.iter().map(TargetProxy::from_ref).collect::<Result<Vec<_>, _>>()?;
    let list = Value::list(items);
    list.freeze();
    Ok(list)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{AttrClass, Resource, ResourceClass};

    fn semantic() -> Arc<Target> {
        Arc::new(Target::AttrClass(AttrClass {
            name: "semantic".into(),
            path: "common://attrs/version:semantic".into(),
        }))
    }

    fn amd64() -> Attr {
        Attr {
            name: "amd64".into(),
            path: "//test:amd64".into(),
            parent: TargetRef::resolved(semantic()),
            value: None,
        }
    }

    fn some_file(deps: Vec<TargetRef>) -> Arc<Target> {
        let class = Arc::new(Target::ResourceClass(ResourceClass {
            name: "file".into(),
            path: "//classes:file".into(),
            deps: Vec::new(),
        }));
        Arc::new(Target::Resource(Resource {
            name: "some_file".into(),
            path: "//test:some_file".into(),
            parent: TargetRef::resolved(class),
            deps,
            details: Vec::new(),
        }))
    }

    #[test]
    fn test_attr_fields() {
        let attr = AttrProxy::new(amd64());
        assert_eq!(attr.field("name").unwrap(), Value::str("amd64"));
        assert_eq!(attr.field("path").unwrap(), Value::str("//test:amd64"));
        let parent = attr.field("parent").unwrap();
        assert_eq!(parent.type_name(), "attr_class");
        assert_eq!(attr.field("deps").unwrap_err().message, "attr has no .deps attribute");
    }

    #[test]
    fn test_target_fields_follow_capabilities() {
        let t = TargetProxy::new(some_file(Vec::new()));
        assert_eq!(t.field("type").unwrap(), Value::str("resource"));
        assert_eq!(t.field("is_class").unwrap(), Value::Bool(false));
        assert_eq!(t.field("deps").unwrap().repr(), "[]");
        assert_eq!(
            t.field_names(),
            vec!["type", "is_class", "name", "path", "parent", "deps", "details"]
        );

        let class = TargetProxy::new(semantic());
        assert_eq!(class.field("is_class").unwrap(), Value::Bool(true));
        assert_eq!(class.field("deps").unwrap_err().message, "attr_class has no .deps attribute");
        assert_eq!(class.field_names(), vec!["type", "is_class", "name", "path"]);
    }

    #[test]
    fn test_unresolved_reference() {
        let t = TargetProxy::new(some_file(vec![TargetRef::unresolved("//missing:dep")]));
        assert_eq!(t.field("deps").unwrap_err().message, "unresolved reference //missing:dep");
    }

    #[test]
    fn test_dep_lists_are_frozen() {
        let dep = some_file(Vec::new());
        let t = TargetProxy::new(some_file(vec![TargetRef::resolved(dep)]));
        let Value::List(deps) = t.field("deps").unwrap() else {
            panic!("deps should be a list")
        };
        assert!(deps.is_frozen());
        assert_eq!(deps.items()[0].type_name(), "resource");
    }
}

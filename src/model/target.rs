//! Target kinds and the structs behind them.
//!
//! Every kind is its own struct; [`Target`] is the closed sum over them. Which fields a kind carries is
//! recorded once in [`KIND_CAPABILITIES`] so proxies, manifests and display code agree on it.

use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use super::ComputedValue;

/// The kind of a node in the target graph.
///
/// Declaration order matches [`KIND_CAPABILITIES`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TargetKind {
    Component,
    Resource,
    ResourceClass,
    Attr,
    AttrClass,
    Checker,
    Toolchain,
}

/// Which fields a target kind exposes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KindCapabilities {
    pub kind: TargetKind,
    pub spelling: &'static str,
    /// `name` and `path`.
    pub naming: bool,
    /// `parent` (the class this target is an instance of).
    pub class: bool,
    pub deps: bool,
    pub details: bool,
    pub is_class: bool,
}

const fn caps(
    kind: TargetKind,
    spelling: &'static str,
    class: bool,
    deps: bool,
    details: bool,
    is_class: bool,
) -> KindCapabilities {
    KindCapabilities {
        kind,
        spelling,
        naming: true,
        class,
        deps,
        details,
        is_class,
    }
}

/// Capability table, in [`TargetKind`] declaration order.
pub const KIND_CAPABILITIES: &[KindCapabilities] = &[
    caps(TargetKind::Component, "component", false, true, true, false),
    caps(TargetKind::Resource, "resource", true, true, true, false),
    caps(TargetKind::ResourceClass, "resource_class", false, true, false, true),
    caps(TargetKind::Attr, "attr", true, false, false, false),
    caps(TargetKind::AttrClass, "attr_class", false, false, false, true),
    caps(TargetKind::Checker, "checker", false, false, false, false),
    caps(TargetKind::Toolchain, "toolchain", false, true, false, false),
];

impl TargetKind {
    pub fn capabilities(self) -> &'static KindCapabilities {
        &KIND_CAPABILITIES[self as usize]
    }

    pub fn as_str(self) -> &'static str {
        self.capabilities().spelling
    }

    pub fn from_spelling(s: &str) -> Option<TargetKind> {
        KIND_CAPABILITIES.iter().find(|c| c.spelling == s).map(|c| c.kind)
    }
}

impl fmt::Display for TargetKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A reference to another target by path.
///
/// `target` is filled in once the reference has been resolved against a graph.
#[derive(Debug, Clone, Default)]
pub struct TargetRef {
    pub path: String,
    pub target: Option<Arc<Target>>,
}

impl TargetRef {
    pub fn unresolved(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            target: None,
        }
    }

    pub fn resolved(target: Arc<Target>) -> Self {
        Self {
            path: target.path().to_string(),
            target: Some(target),
        }
    }

    pub fn target(&self) -> Option<&Arc<Target>> {
        self.target.as_ref()
    }
}

/// The value an attribute carries.
#[derive(Debug, Clone, PartialEq)]
pub enum AttrValue {
    Str(String),
    Int(i64),
    Bool(bool),
    Computed(ComputedValue),
}

impl AttrValue {
    pub fn as_computed(&self) -> Option<&ComputedValue> {
        match self {
            AttrValue::Computed(c) => Some(c),
            _ => None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Attr {
    pub name: String,
    pub path: String,
    /// The attribute class this attribute instantiates.
    pub parent: TargetRef,
    pub value: Option<AttrValue>,
}

#[derive(Debug, Clone)]
pub struct AttrClass {
    pub name: String,
    pub path: String,
}

#[derive(Debug, Clone)]
pub struct Component {
    pub name: String,
    pub path: String,
    pub deps: Vec<TargetRef>,
    pub details: Vec<TargetRef>,
}

#[derive(Debug, Clone)]
pub struct Resource {
    pub name: String,
    pub path: String,
    pub parent: TargetRef,
    pub deps: Vec<TargetRef>,
    pub details: Vec<TargetRef>,
}

#[derive(Debug, Clone)]
pub struct ResourceClass {
    pub name: String,
    pub path: String,
    pub deps: Vec<TargetRef>,
}

#[derive(Debug, Clone)]
pub struct Checker {
    pub name: String,
    pub path: String,
}

#[derive(Debug, Clone)]
pub struct Toolchain {
    pub name: String,
    pub path: String,
    pub deps: Vec<TargetRef>,
}

/// A node in the target graph.
#[derive(Debug, Clone)]
pub enum Target {
    Component(Component),
    Resource(Resource),
    ResourceClass(ResourceClass),
    Attr(Attr),
    AttrClass(AttrClass),
    Checker(Checker),
    Toolchain(Toolchain),
}

impl Target {
    pub fn kind(&self) -> TargetKind {
        match self {
            Target::Component(_) => TargetKind::Component,
            Target::Resource(_) => TargetKind::Resource,
            Target::ResourceClass(_) => TargetKind::ResourceClass,
            Target::Attr(_) => TargetKind::Attr,
            Target::AttrClass(_) => TargetKind::AttrClass,
            Target::Checker(_) => TargetKind::Checker,
            Target::Toolchain(_) => TargetKind::Toolchain,
        }
    }

    pub fn name(&self) -> &str {
        match self {
            Target::Component(t) => &t.name,
            Target::Resource(t) => &t.name,
            Target::ResourceClass(t) => &t.name,
            Target::Attr(t) => &t.name,
            Target::AttrClass(t) => &t.name,
            Target::Checker(t) => &t.name,
            Target::Toolchain(t) => &t.name,
        }
    }

    pub fn path(&self) -> &str {
        match self {
            Target::Component(t) => &t.path,
            Target::Resource(t) => &t.path,
            Target::ResourceClass(t) => &t.path,
            Target::Attr(t) => &t.path,
            Target::AttrClass(t) => &t.path,
            Target::Checker(t) => &t.path,
            Target::Toolchain(t) => &t.path,
        }
    }

    pub fn is_class(&self) -> bool {
        self.kind().capabilities().is_class
    }

    /// The class this target instantiates, for kinds that have one.
    pub fn class(&self) -> Option<&TargetRef> {
        match self {
            Target::Resource(t) => Some(&t.parent),
            Target::Attr(t) => Some(&t.parent),
            _ => None,
        }
    }

    pub fn deps(&self) -> Option<&[TargetRef]> {
        match self {
            Target::Component(t) => Some(&t.deps),
            Target::Resource(t) => Some(&t.deps),
            Target::ResourceClass(t) => Some(&t.deps),
            Target::Toolchain(t) => Some(&t.deps),
            _ => None,
        }
    }

    pub fn details(&self) -> Option<&[TargetRef]> {
        match self {
            Target::Component(t) => Some(&t.details),
            Target::Resource(t) => Some(&t.details),
            _ => None,
        }
    }

    pub fn as_attr(&self) -> Option<&Attr> {
        match self {
            Target::Attr(a) => Some(a),
            _ => None,
        }
    }
}

impl fmt::Display for Target {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}<{}>", self.kind(), self.path())
    }
}

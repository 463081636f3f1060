//! JSON manifests: a flat list of target declarations resolved into a shared graph.
//!
//! References between targets are by path. [`Manifest::resolve`] turns the declarations into `Arc<Target>` nodes,
//! checking every reference on the way: it must exist, point at a target of an acceptable kind, and not close a
//! cycle.
//!
//! ```json
//! { "targets": [
//!     { "kind": "attr_class", "name": "semantic", "path": "common://attrs/version:semantic" },
//!     { "kind": "attr", "name": "amd64", "path": "//test:amd64",
//!       "parent": "common://attrs/version:semantic",
//!       "value": { "computed": { "filename": "a.star", "func": "some_number" } } }
//! ] }
//! ```

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use super::target::{Attr, AttrClass, AttrValue, Checker, Component, Resource, ResourceClass, Toolchain};
use super::{ComputedValue, Target, TargetKind, TargetRef, ValidationError};

#[derive(Debug, thiserror::Error)]
pub enum ManifestError {
    #[error("reading manifest {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid manifest: {0}")]
    Json(#[from] serde_json::Error),
    #[error("target {0} is declared more than once")]
    DuplicatePath(String),
    #[error("{kind} target {path} does not take `{field}`")]
    Unsupported {
        path: String,
        kind: TargetKind,
        field: &'static str,
    },
    #[error("{kind} target {path} requires `{field}`")]
    Missing {
        path: String,
        kind: TargetKind,
        field: &'static str,
    },
    #[error("{from}: {field} refers to unknown target {to}")]
    Dangling {
        from: String,
        field: &'static str,
        to: String,
    },
    #[error("{from}: {field} refers to {to}, which is a {found} but must be {expected}")]
    WrongKind {
        from: String,
        field: &'static str,
        to: String,
        found: TargetKind,
        expected: &'static str,
    },
    #[error("cycle in target graph at {0}")]
    Cycle(String),
    #[error("{path}: {source}")]
    Invalid {
        path: String,
        #[source]
        source: ValidationError,
    },
}

/// Top-level manifest document.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Manifest {
    #[serde(default)]
    pub targets: Vec<TargetDecl>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct TargetDecl {
    pub kind: TargetKind,
    pub name: String,
    pub path: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub deps: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub details: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<ValueDecl>,
}

/// An attribute value: a literal, or `{"computed": {...}}`.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(untagged)]
pub enum ValueDecl {
    Computed { computed: ComputedDecl },
    Bool(bool),
    Int(i64),
    Str(String),
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct ComputedDecl {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub filename: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub func: Option<String>,
    /// Inline snippet; takes precedence over `filename`/`func`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
    #[serde(default)]
    pub read_write: bool,
}

impl Manifest {
    pub fn from_json(text: &str) -> Result<Self, ManifestError> {
        Ok(serde_json::from_str(text)?)
    }

    /// Read and resolve a manifest file. Script paths resolve against the manifest's directory.
    pub fn load(path: &Path) -> Result<Graph, ManifestError> {
        let text = fs::read_to_string(path).map_err(|source| ManifestError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let base_dir = path.parent().map(Path::to_path_buf).unwrap_or_default();
        Self::from_json(&text)?.resolve(&base_dir, &path.display().to_string())
    }

    /// Resolve declarations into a target graph.
    ///
    /// ## Parameters
    /// - `base_dir`: contract directory for every computed value; relative script filenames join onto it.
    /// - `contract_path`: recorded on computed values for messages.
    #[tracing::instrument(skip(self), fields(targets = self.targets.len()))]
    pub fn resolve(&self, base_dir: &Path, contract_path: &str) -> Result<Graph, ManifestError> {
        let mut decls: HashMap<&str, &TargetDecl> = HashMap::new();
        for decl in &self.targets {
            check_fields(decl)?;
            if decls.insert(decl.path.as_str(), decl).is_some() {
                return Err(ManifestError::DuplicatePath(decl.path.clone()));
            }
        }

        let mut resolver = Resolver {
            decls,
            done: HashMap::new(),
            visiting: Vec::new(),
            base_dir,
            contract_path,
        };
        let mut graph = Graph::default();
        for decl in &self.targets {
            let target = resolver.build(&decl.path)?;
            graph.by_path.insert(decl.path.clone(), graph.targets.len());
            graph.targets.push(target);
        }
        Ok(graph)
    }
}

fn check_fields(decl: &TargetDecl) -> Result<(), ManifestError> {
    let caps = decl.kind.capabilities();
    let unsupported = |field| ManifestError::Unsupported {
        path: decl.path.clone(),
        kind: decl.kind,
        field,
    };
    match (&decl.parent, caps.class) {
        (Some(_), false) => return Err(unsupported("parent")),
        (None, true) => {
            return Err(ManifestError::Missing {
                path: decl.path.clone(),
                kind: decl.kind,
                field: "parent",
            });
        }
        _ => {}
    }
    if !decl.deps.is_empty() && !caps.deps {
        return Err(unsupported("deps"));
    }
    if !decl.details.is_empty() && !caps.details {
        return Err(unsupported("details"));
    }
    if decl.value.is_some() && decl.kind != TargetKind::Attr {
        return Err(unsupported("value"));
    }
    Ok(())
}

struct Resolver<'m> {
    decls: HashMap<&'m str, &'m TargetDecl>,
    done: HashMap<String, Arc<Target>>,
    visiting: Vec<String>,
    base_dir: &'m Path,
    contract_path: &'m str,
}

impl Resolver<'_> {
    fn build(&mut self, path: &str) -> Result<Arc<Target>, ManifestError> {
        if let Some(t) = self.done.get(path) {
            return Ok(t.clone());
        }
        if self.visiting.iter().any(|p| p == path) {
            return Err(ManifestError::Cycle(path.to_string()));
        }
        let Some(decl) = self.decls.get(path).copied() else {
            return Err(ManifestError::Dangling {
                from: path.to_string(),
                field: "path",
                to: path.to_string(),
            });
        };
        self.visiting.push(path.to_string());

        let name = decl.name.clone();
        let path_owned = decl.path.clone();
        let target = match decl.kind {
            TargetKind::Component => Target::Component(Component {
                name,
                path: path_owned,
                deps: self.refs(decl, "deps", &decl.deps, &[TargetKind::Resource, TargetKind::Component])?,
                details: self.refs(decl, "details", &decl.details, &[TargetKind::Attr])?,
            }),
            TargetKind::Resource => Target::Resource(Resource {
                name,
                path: path_owned,
                parent: self.parent(decl, TargetKind::ResourceClass)?,
                deps: self.refs(decl, "deps", &decl.deps, &[TargetKind::Resource, TargetKind::Component])?,
                details: self.refs(decl, "details", &decl.details, &[TargetKind::Attr])?,
            }),
            TargetKind::ResourceClass => Target::ResourceClass(ResourceClass {
                name,
                path: path_owned,
                deps: self.refs(decl, "deps", &decl.deps, &[TargetKind::Resource, TargetKind::Component])?,
            }),
            TargetKind::Attr => Target::Attr(Attr {
                name,
                path: path_owned,
                parent: self.parent(decl, TargetKind::AttrClass)?,
                value: decl.value.as_ref().map(|v| self.attr_value(decl, v)).transpose()?,
            }),
            TargetKind::AttrClass => Target::AttrClass(AttrClass { name, path: path_owned }),
            TargetKind::Checker => Target::Checker(Checker { name, path: path_owned }),
            TargetKind::Toolchain => Target::Toolchain(Toolchain {
                name,
                path: path_owned,
                deps: self.refs(decl, "deps", &decl.deps, &[TargetKind::Resource, TargetKind::Component])?,
            }),
        };

        self.visiting.pop();
        let target = Arc::new(target);
        self.done.insert(path.to_string(), target.clone());
        Ok(target)
    }

    fn reference(
        &mut self,
        from: &TargetDecl,
        field: &'static str,
        to: &str,
        allowed: &[TargetKind],
    ) -> Result<TargetRef, ManifestError> {
        let Some(kind) = self.decls.get(to).map(|d| d.kind) else {
            return Err(ManifestError::Dangling {
                from: from.path.clone(),
                field,
                to: to.to_string(),
            });
        };
        if !allowed.contains(&kind) {
            let expected = match allowed {
                [TargetKind::Resource, TargetKind::Component] => "resource or component",
                [kind] => kind.as_str(),
                _ => "another kind",
            };
            return Err(ManifestError::WrongKind {
                from: from.path.clone(),
                field,
                to: to.to_string(),
                found: kind,
                expected,
            });
        }
        Ok(TargetRef::resolved(self.build(to)?))
    }

    fn refs(
        &mut self,
        from: &TargetDecl,
        field: &'static str,
        paths: &[String],
        allowed: &[TargetKind],
    ) -> Result<Vec<TargetRef>, ManifestError> {
        paths.iter().map(|p| self.reference(from, field, p, allowed)).collect()
    }

    fn parent(&mut self, from: &TargetDecl, class: TargetKind) -> Result<TargetRef, ManifestError> {
        let Some(parent) = from.parent.as_deref() else {
            return Err(ManifestError::Missing {
                path: from.path.clone(),
                kind: from.kind,
                field: "parent",
            });
        };
        self.reference(from, "parent", parent, &[class])
    }

    fn attr_value(&self, from: &TargetDecl, value: &ValueDecl) -> Result<AttrValue, ManifestError> {
        Ok(match value {
            ValueDecl::Bool(b) => AttrValue::Bool(*b),
            ValueDecl::Int(i) => AttrValue::Int(*i),
            ValueDecl::Str(s) => AttrValue::Str(s.clone()),
            ValueDecl::Computed { computed } => {
                let value = ComputedValue {
                    contract_dir: self.base_dir.to_path_buf(),
                    contract_path: self.contract_path.to_string(),
                    filename: computed
                        .filename
                        .as_deref()
                        .map(|f| self.base_dir.join(f))
                        .unwrap_or_default(),
                    func: computed.func.clone().unwrap_or_default(),
                    inline_script: computed.code.clone().unwrap_or_default(),
                    read_write: computed.read_write,
                };
                value.validate().map_err(|source| ManifestError::Invalid {
                    path: from.path.clone(),
                    source,
                })?;
                AttrValue::Computed(value)
            }
        })
    }
}

/// A resolved target graph, in declaration order.
#[derive(Debug, Default)]
pub struct Graph {
    targets: Vec<Arc<Target>>,
    by_path: HashMap<String, usize>,
}

/// A computed attribute paired with the target it is evaluated against.
#[derive(Debug, Clone)]
pub struct ComputedAttr {
    pub attr: Arc<Target>,
    pub owner: Arc<Target>,
}

impl ComputedAttr {
    pub fn attr(&self) -> Option<&Attr> {
        self.attr.as_attr()
    }
}

impl Graph {
    pub fn get(&self, path: &str) -> Option<&Arc<Target>> {
        self.by_path.get(path).map(|&i| &self.targets[i])
    }

    pub fn iter(&self) -> impl Iterator<Item = &Arc<Target>> {
        self.targets.iter()
    }

    pub fn len(&self) -> usize {
        self.targets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.targets.is_empty()
    }

    /// Every attribute with a computed value, paired with its owner.
    ///
    /// The owner is the first target listing the attribute in `details`; attributes nobody lists are evaluated
    /// against their own class.
    pub fn computed_attrs(&self) -> Vec<ComputedAttr> {
        let mut out = Vec::new();
        for target in &self.targets {
            let Some(attr) = target.as_attr() else { continue };
            if attr.value.as_ref().and_then(AttrValue::as_computed).is_none() {
                continue;
            }
            let owner = self
                .targets
                .iter()
                .find(|t| t.details().is_some_and(|d| d.iter().any(|r| r.path == attr.path)))
                .cloned()
                .or_else(|| attr.parent.target().cloned());
            if let Some(owner) = owner {
                out.push(ComputedAttr {
                    attr: target.clone(),
                    owner,
                });
            }
        }
        out
    }
}

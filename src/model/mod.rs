//! Build-graph model: targets, attributes, computed values and JSON manifests.
//!
//! Scripts never see these types directly; they go through the read-only proxies in [`crate::proxy`].

mod computed_value;
pub mod manifest;
mod target;

pub use computed_value::{ComputedValue, ValidationError};
pub use manifest::{Graph, Manifest, ManifestError};
pub use target::{
    Attr, AttrClass, AttrValue, Checker, Component, KIND_CAPABILITIES, KindCapabilities, Resource, ResourceClass,
    Target, TargetKind, TargetRef, Toolchain,
};

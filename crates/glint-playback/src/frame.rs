//! Captured-frame data model.
//!
//! A [`Frame`] is what the capture subsystem hands to playback: an initial
//! snapshot (resources, uniforms, global state, surface description) plus the
//! ordered call log. Frames are immutable; the engine shares them as
//! `Arc<Frame>` and never writes back.

use std::collections::BTreeMap;

use glint_gl::call::GlCall;
use glint_gl::state::StateSnapshot;
use glint_gl::uniform::{UniformData, UniformType};
use glint_gl::ObjectKind;

/// Identity of a logical resource, stable across versions.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ResourceId(pub u32);

/// A resource's content version along the capture timeline.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ResourceVersion(pub u32);

/// A logical, identity-stable handle to an API object.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Resource {
    pub id: ResourceId,
    pub kind: ObjectKind,
    /// Monotonic creation order assigned at first creation; reset replays
    /// initial resources in ascending order so dependencies (shaders before
    /// programs, attachments before framebuffers) are materialized first.
    pub creation_order: u64,
}

/// One `initialResources` entry: a resource and the version live at frame
/// start.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ResourceRef {
    pub resource: Resource,
    pub version: ResourceVersion,
}

/// A captured uniform value with its declared type.
#[derive(Clone, Debug, PartialEq)]
pub struct UniformValue {
    pub ty: UniformType,
    pub data: UniformData,
}

/// All captured uniform values of one program at frame start.
#[derive(Clone, Debug, PartialEq)]
pub struct ProgramUniforms {
    pub program: ResourceId,
    pub values: BTreeMap<String, UniformValue>,
}

/// Creation attributes of the captured surface.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SurfaceAttributes {
    pub alpha: bool,
    pub depth: bool,
    pub stencil: bool,
    pub antialias: bool,
    pub premultiplied_alpha: bool,
}

impl Default for SurfaceAttributes {
    fn default() -> Self {
        // The API's default context-creation attributes.
        Self {
            alpha: true,
            depth: true,
            stencil: false,
            antialias: true,
            premultiplied_alpha: true,
        }
    }
}

/// Dimensions and creation attributes of the captured surface.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CanvasInfo {
    pub width: u32,
    pub height: u32,
    pub attributes: SurfaceAttributes,
}

/// One captured unit of replay.
#[derive(Clone, Debug, PartialEq)]
pub struct Frame {
    pub calls: Vec<GlCall<ResourceId>>,
    pub initial_resources: Vec<ResourceRef>,
    pub initial_uniforms: Vec<ProgramUniforms>,
    pub initial_state: StateSnapshot<ResourceId>,
    pub canvas_info: CanvasInfo,
}

impl Frame {
    pub fn call_count(&self) -> usize {
        self.calls.len()
    }
}

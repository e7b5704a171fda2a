//! The seam between the replay core and a live graphics context.
//!
//! A backend owns the actual API objects. The playback layers never talk to a
//! context directly; they emit resolved [`GlCall`]s and a handful of lifecycle
//! and query operations through [`GlBackend`]. A wasm/WebGL wrapper would
//! implement this trait over a real context; [`HeadlessGl`](crate::HeadlessGl)
//! implements it in memory for tests and state diffing.

use crate::call::{BufferTarget, GlCall, TextureTarget};

/// Opaque handle to a live backend object.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct TargetHandle(pub u32);

/// The kinds of API objects a backend manages.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ObjectKind {
    Buffer,
    Texture,
    Renderbuffer,
    Framebuffer,
    Shader,
    Program,
}

impl ObjectKind {
    /// Dependency-safe creation ranking: buffers, textures, renderbuffers,
    /// framebuffers, shaders, programs. Materializing in this order
    /// guarantees e.g. that a program's shaders exist before the program.
    pub const fn creation_rank(self) -> u8 {
        match self {
            ObjectKind::Buffer => 0,
            ObjectKind::Texture => 1,
            ObjectKind::Renderbuffer => 2,
            ObjectKind::Framebuffer => 3,
            ObjectKind::Shader => 4,
            ObjectKind::Program => 5,
        }
    }
}

/// Per-context implementation limits, resolved once per pool and threaded
/// through state application instead of queried ad hoc.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ContextLimits {
    pub max_texture_units: u32,
    pub max_vertex_attribs: u32,
}

impl Default for ContextLimits {
    fn default() -> Self {
        // The API's mandated minimums.
        Self {
            max_texture_units: 8,
            max_vertex_attribs: 8,
        }
    }
}

/// Completeness of the currently bound framebuffer.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FramebufferStatus {
    Complete,
    IncompleteAttachment,
    IncompleteMissingAttachment,
    IncompleteDimensions,
    Unsupported,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum GlError {
    #[error("unknown {kind:?} handle {handle:?}")]
    UnknownObject {
        kind: ObjectKind,
        handle: TargetHandle,
    },

    #[error("handle {handle:?} is a {actual:?}, expected a {expected:?}")]
    KindMismatch {
        handle: TargetHandle,
        expected: ObjectKind,
        actual: ObjectKind,
    },

    #[error("no buffer bound to {target:?}")]
    NoBufferBound { target: BufferTarget },

    #[error("no texture bound to {target:?} on unit {unit}")]
    NoTextureBound { target: TextureTarget, unit: u32 },

    #[error("no framebuffer bound")]
    NoFramebufferBound,

    #[error("no renderbuffer bound")]
    NoRenderbufferBound,

    #[error("no program is active")]
    NoProgramActive,

    #[error("texture unit {unit} exceeds the context limit of {max}")]
    InvalidTextureUnit { unit: u32, max: u32 },

    #[error("vertex attribute {index} exceeds the context limit of {max}")]
    InvalidAttribIndex { index: u32, max: u32 },

    #[error("buffer update range {offset}..{end} exceeds buffer size {size}")]
    BufferRangeOutOfBounds {
        offset: usize,
        end: usize,
        size: usize,
    },

    #[error("texture image level {level} is undefined for the bound texture")]
    UndefinedTextureLevel { level: i32 },

    #[error("texture update region exceeds the {width}x{height} image")]
    TextureRegionOutOfBounds { width: u32, height: u32 },
}

/// A live graphics context, reduced to what deterministic replay needs:
/// object lifecycle, call execution, and the two queries the engine performs
/// (current framebuffer binding, framebuffer completeness).
pub trait GlBackend {
    fn create_object(&mut self, kind: ObjectKind) -> TargetHandle;

    fn delete_object(&mut self, kind: ObjectKind, handle: TargetHandle);

    fn apply(&mut self, call: &GlCall<TargetHandle>) -> Result<(), GlError>;

    /// The framebuffer currently bound, `None` for the default surface.
    fn framebuffer_binding(&self) -> Option<TargetHandle>;

    fn check_framebuffer_status(&self) -> FramebufferStatus;

    fn limits(&self) -> ContextLimits;
}

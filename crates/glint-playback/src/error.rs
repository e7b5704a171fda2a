use glint_gl::{GlError, ObjectKind, UniformError};

use crate::frame::ResourceId;
use crate::mutate::HandlerFault;
use crate::pool::{AssetError, PoolError};

/// Replay failures.
///
/// Configuration/compatibility faults (incomplete render target, unreproduced
/// antialiasing) are deliberately *not* errors; they surface as `tracing`
/// diagnostics and playback continues best-effort. Nothing here is retried
/// internally.
#[derive(Debug, thiserror::Error)]
pub enum ReplayError {
    #[error("no frame has been set on this playback session")]
    NoFrame,

    #[error("call index {index} is out of range for a frame with {call_count} calls")]
    CallIndexOutOfRange { index: usize, call_count: usize },

    #[error("resource {id:?} ({kind:?}) has no live object in the pool")]
    UnresolvedResource { id: ResourceId, kind: ObjectKind },

    #[error("no render target is allocated")]
    NoRenderTarget,

    #[error(transparent)]
    Pool(#[from] PoolError),

    #[error(transparent)]
    Gl(#[from] GlError),

    #[error(transparent)]
    Uniform(#[from] UniformError),

    #[error(transparent)]
    Mutator(#[from] HandlerFault),

    #[error(transparent)]
    Preload(#[from] AssetError),
}

//! `glint-playback` replays a captured graphics frame against an isolated,
//! versioned copy of the API's resources, so a caller can step forward and
//! backward through the frame, inspect intermediate state, and re-render any
//! intermediate point to an offscreen target for presentation.
//!
//! The moving parts:
//! - [`Frame`]: the captured unit of replay — an initial snapshot (resources
//!   + versions, per-program uniforms, global state, surface description)
//!   plus an ordered call log.
//! - [`ResourcePool`]: the consumed collaborator owning live objects and
//!   version materialization.
//! - [`PlaybackSession`]: the engine. `set_frame` adopts a frame once its
//!   asset preloads resolve; `seek`/`step`/`run`/`run_until_draw` navigate
//!   the call log; `present` blits the offscreen result.
//!
//! Replay is deterministic and resumable from any call index. Backward
//! movement is a reset-and-replay, never an undo. Sessions are strictly
//! single-threaded; every operation runs to completion except the
//! asset-preload wait.

mod apply;
mod error;
mod frame;
mod mutate;
mod pool;
mod present;
mod render_target;
mod session;
pub mod testing;

pub use apply::{apply_state, apply_uniforms, resolve_call};
pub use error::ReplayError;
pub use frame::{
    CanvasInfo, Frame, ProgramUniforms, Resource, ResourceId, ResourceRef, ResourceVersion,
    SurfaceAttributes, UniformValue,
};
pub use mutate::{CallMutator, HandlerFault};
pub use pool::{AssetError, AssetPreload, PoolError, ResourcePool};
pub use present::PresentSurface;
pub use render_target::{RenderTarget, RenderTargetManager};
pub use session::{
    Adoption, AdoptionTicket, PlaybackEvent, PlaybackSession, StepDirection,
};

//! `glint-gl` is the backend-agnostic model of the WebGL-class API that the
//! glint playback engine replays against.
//!
//! This crate provides:
//! - A closed, typed call representation generic over the resource-reference
//!   type (see [`GlCall`]) plus the translation step from logical identities
//!   to live handles ([`GlCall::map_resources`]).
//! - A fully enumerated global-state snapshot and the pure state applier
//!   (see [`StateSnapshot`] and [`state_commands`]).
//! - The exact uniform type→upload-path mapping (see [`uniform`]).
//! - The [`GlBackend`] seam a live context implements, and [`HeadlessGl`],
//!   an in-memory state-tracking implementation used for tests and state
//!   diffing.
//!
//! It deliberately contains no renderer and no playback logic; those live in
//! `glint-playback` and in whatever real context backs [`GlBackend`].

mod backend;
pub mod call;
mod headless;
pub mod state;
pub mod uniform;

pub use backend::{
    ContextLimits, FramebufferStatus, GlBackend, GlError, ObjectKind, TargetHandle,
};
pub use call::GlCall;
pub use headless::{Attachment, HeadlessGl, TextureLevel, TextureParams};
pub use state::{state_commands, StateSnapshot, StencilFaceState, TextureUnit, VertexAttrib};
pub use uniform::{UniformCall, UniformData, UniformError, UniformType};

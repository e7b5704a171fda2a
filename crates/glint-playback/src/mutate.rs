//! Call-interception pipeline.
//!
//! Mutators are configuration, fixed for the lifetime of a session. Around
//! every issued call the dispatcher runs each mutator's `pre` handler in
//! registration order (each may transform or replace the call) and each
//! `post` handler in reverse registration order, mirroring a wrap/unwrap
//! discipline. Handlers return `Ok` for recoverable conditions; a
//! [`HandlerFault`] aborts the current run and is reported to the caller.

use glint_gl::call::GlCall;

use crate::frame::ResourceId;

/// Unrecoverable fault raised by a call handler.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("call handler fault: {reason}")]
pub struct HandlerFault {
    pub reason: String,
}

impl HandlerFault {
    pub fn new(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
        }
    }
}

/// A pre/post call-interception handler pair.
pub trait CallMutator {
    /// Runs before the call is issued; may rewrite it.
    fn pre(&mut self, call: GlCall<ResourceId>) -> Result<GlCall<ResourceId>, HandlerFault> {
        Ok(call)
    }

    /// Runs after the call is issued.
    fn post(&mut self, call: &GlCall<ResourceId>) -> Result<(), HandlerFault> {
        let _ = call;
        Ok(())
    }
}

//! The playback engine state machine.
//!
//! A session's position is either `None` (pre-frame: the initial snapshot is
//! established and zero calls have been issued) or `Some(i)`: calls `0..=i`
//! have been issued since the last reset. Position only moves forward during
//! replay; the underlying API has no undo, so any backward movement is a
//! reset to pre-frame followed by forward replay. Forward stepping is O(1)
//! per call, backward seeking O(target) — that asymmetry is fundamental.
//!
//! Every operation runs to completion on the caller's thread. The single
//! asynchronous boundary is frame adoption, which suspends until asset
//! preloading resolves; see [`PlaybackSession::begin_set_frame`].

use std::sync::Arc;

use glint_gl::call::{BufferTarget, GlCall, TextureTarget, VertexAttribType};
use glint_gl::GlBackend;
use tracing::{debug, trace};

use crate::apply::{apply_state, apply_uniforms, resolve_call};
use crate::error::ReplayError;
use crate::frame::{Frame, ResourceId};
use crate::mutate::CallMutator;
use crate::pool::{AssetPreload, ResourcePool};
use crate::present::PresentSurface;
use crate::render_target::{RenderTarget, RenderTargetManager};

/// Notifications delivered synchronously at well-defined points.
#[derive(Clone, Debug)]
pub enum PlaybackEvent {
    /// A frame has been fully adopted and reset.
    Ready,
    /// A reset completed; carries the frame that was re-established.
    PreFrame { frame: Arc<Frame> },
    /// A stepping operation settled at `call_index`.
    Stepped { call_index: Option<usize> },
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StepDirection {
    Forward,
    Backward,
}

/// Outcome of completing a frame adoption.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Adoption {
    Adopted,
    /// A later `begin_set_frame` superseded this adoption; session state is
    /// untouched.
    Superseded,
}

/// In-flight frame adoption, returned by
/// [`PlaybackSession::begin_set_frame`].
#[derive(Debug)]
pub struct AdoptionTicket {
    epoch: u64,
    frame: Arc<Frame>,
}

/// Replays a captured frame against an isolated resource pool.
pub struct PlaybackSession<P: ResourcePool> {
    pool: P,
    mutators: Vec<Box<dyn CallMutator>>,
    render_target: RenderTargetManager,
    frame: Option<Arc<Frame>>,
    call_index: Option<usize>,
    adoption_epoch: u64,
    is_stepping: bool,
    observers: Vec<Box<dyn FnMut(&PlaybackEvent)>>,
}

impl<P: ResourcePool> PlaybackSession<P> {
    /// Create a session over `pool`. Mutators are fixed for the session's
    /// lifetime.
    pub fn new(pool: P, mutators: Vec<Box<dyn CallMutator>>) -> Self {
        Self {
            pool,
            mutators,
            render_target: RenderTargetManager::default(),
            frame: None,
            call_index: None,
            adoption_epoch: 0,
            is_stepping: false,
            observers: Vec::new(),
        }
    }

    /// Register an observer for [`PlaybackEvent`]s. Delivery is synchronous,
    /// in registration order.
    pub fn observe(&mut self, observer: impl FnMut(&PlaybackEvent) + 'static) {
        self.observers.push(Box::new(observer));
    }

    pub fn pool(&self) -> &P {
        &self.pool
    }

    pub fn pool_mut(&mut self) -> &mut P {
        &mut self.pool
    }

    pub fn frame(&self) -> Option<&Arc<Frame>> {
        self.frame.as_ref()
    }

    /// Current position: `None` before the first call, otherwise the index
    /// of the last issued call.
    pub fn call_index(&self) -> Option<usize> {
        self.call_index
    }

    /// True while a stepping operation is replaying calls.
    pub fn is_stepping(&self) -> bool {
        self.is_stepping
    }

    pub fn render_target(&self) -> Option<&RenderTarget> {
        self.render_target.target()
    }

    fn fire(&mut self, event: &PlaybackEvent) {
        for observer in &mut self.observers {
            observer(event);
        }
    }

    fn begin_stepping(&mut self) {
        self.is_stepping = true;
    }

    fn end_stepping(&mut self) {
        self.is_stepping = false;
        let event = PlaybackEvent::Stepped {
            call_index: self.call_index,
        };
        self.fire(&event);
    }

    /// Start adopting `frame`: bump the adoption epoch and collect the asset
    /// preloads that gate it. Session state is otherwise untouched, so a
    /// preload failure (or a superseding adoption) leaves the prior frame
    /// fully active.
    ///
    /// A later `begin_set_frame` invalidates this ticket; completing a stale
    /// ticket is a no-op reported as [`Adoption::Superseded`].
    pub fn begin_set_frame(&mut self, frame: Arc<Frame>) -> (AdoptionTicket, Vec<AssetPreload>) {
        self.adoption_epoch += 1;
        let preloads = self.pool.preload_assets(&frame.initial_resources);
        (
            AdoptionTicket {
                epoch: self.adoption_epoch,
                frame,
            },
            preloads,
        )
    }

    /// Finish a frame adoption whose preloads have all resolved.
    pub fn complete_set_frame(&mut self, ticket: AdoptionTicket) -> Result<Adoption, ReplayError> {
        if ticket.epoch != self.adoption_epoch {
            debug!("discarding stale frame adoption");
            return Ok(Adoption::Superseded);
        }
        if self.frame.is_some() {
            self.clear_bindings()?;
        }
        self.call_index = None;
        self.frame = Some(ticket.frame);
        self.reset_frame()?;
        self.fire(&PlaybackEvent::Ready);
        Ok(Adoption::Adopted)
    }

    /// Adopt `frame`: await every asset preload, then reset to the frame's
    /// initial snapshot. No materialization, uniform application, or call
    /// replay happens before all preloads resolve.
    pub async fn set_frame(&mut self, frame: Arc<Frame>) -> Result<Adoption, ReplayError> {
        let (ticket, preloads) = self.begin_set_frame(frame);
        for preload in preloads {
            preload.await?;
        }
        self.complete_set_frame(ticket)
    }

    /// Unbind everything the previous frame may have left bound, up to the
    /// pool's texture-unit and vertex-attribute limits.
    fn clear_bindings(&mut self) -> Result<(), ReplayError> {
        let limits = self.pool.limits();
        let gl = self.pool.gl();
        gl.apply(&GlCall::BindFramebuffer { framebuffer: None })?;
        gl.apply(&GlCall::BindRenderbuffer { renderbuffer: None })?;
        gl.apply(&GlCall::UseProgram { program: None })?;
        gl.apply(&GlCall::BindBuffer {
            target: BufferTarget::ElementArray,
            buffer: None,
        })?;
        gl.apply(&GlCall::BindBuffer {
            target: BufferTarget::Array,
            buffer: None,
        })?;
        for index in 0..limits.max_vertex_attribs {
            gl.apply(&GlCall::VertexAttribPointer {
                index,
                size: 4,
                ty: VertexAttribType::Float,
                normalized: false,
                stride: 0,
                offset: 0,
            })?;
        }
        for unit in 0..limits.max_texture_units {
            gl.apply(&GlCall::ActiveTexture { unit })?;
            gl.apply(&GlCall::BindTexture {
                target: TextureTarget::Texture2d,
                texture: None,
            })?;
            gl.apply(&GlCall::BindTexture {
                target: TextureTarget::CubeMap,
                texture: None,
            })?;
        }
        Ok(())
    }

    /// Re-establish the frame's initial snapshot: render target, resources in
    /// ascending creation order, uniforms, then global state. Returns the
    /// position to pre-frame and fires [`PlaybackEvent::PreFrame`].
    pub fn reset_frame(&mut self) -> Result<(), ReplayError> {
        let frame = self.frame.clone().ok_or(ReplayError::NoFrame)?;

        self.render_target
            .setup(self.pool.gl(), &frame.canvas_info)?;

        // Ascending creation order guarantees a resource's dependencies are
        // materialized before the resource itself (shaders before programs,
        // attachments before framebuffers).
        let mut resources = frame.initial_resources.clone();
        resources.sort_by_key(|entry| entry.resource.creation_order);
        for entry in &resources {
            self.pool
                .ensure_resource_version(&entry.resource, entry.version)?;
        }

        apply_uniforms(&mut self.pool, &frame.initial_uniforms)?;
        apply_state(&mut self.pool, &frame.initial_state)?;

        self.call_index = None;
        self.fire(&PlaybackEvent::PreFrame {
            frame: Arc::clone(&frame),
        });
        Ok(())
    }

    /// Move to `target`. Forward movement replays incrementally; backward
    /// movement resets to pre-frame and replays forward, which is expected to
    /// be more expensive. `None` resets to pre-frame.
    pub fn seek(&mut self, target: Option<usize>) -> Result<(), ReplayError> {
        let call_count = self.frame.as_ref().ok_or(ReplayError::NoFrame)?.call_count();
        if let Some(index) = target {
            if index >= call_count {
                return Err(ReplayError::CallIndexOutOfRange { index, call_count });
            }
        }

        if self.call_index == target {
            return Ok(());
        }

        let Some(index) = target else {
            self.call_index = None;
            self.begin_stepping();
            self.end_stepping();
            return self.reset_frame();
        };

        match self.call_index {
            // First movement in the frame, or seeking forward: replay up.
            None => self.run(Some(index)),
            Some(current) if index > current => self.run(Some(index)),
            // Backward: no in-place undo exists; reset and replay forward.
            Some(_) => {
                self.call_index = None;
                self.reset_frame()?;
                self.run(Some(index))
            }
        }
    }

    /// Move by exactly one call. Overshooting either end wraps to the
    /// pre-frame position; from pre-frame, a forward step lands on call 0 and
    /// a backward step on the last call.
    pub fn step(&mut self, direction: StepDirection) -> Result<(), ReplayError> {
        let call_count = self.frame.as_ref().ok_or(ReplayError::NoFrame)?.call_count();
        let target = match (self.call_index, direction) {
            (None, _) if call_count == 0 => None,
            (None, StepDirection::Forward) => Some(0),
            (None, StepDirection::Backward) => Some(call_count - 1),
            (Some(current), StepDirection::Forward) => {
                if current + 1 >= call_count {
                    None
                } else {
                    Some(current + 1)
                }
            }
            (Some(current), StepDirection::Backward) => current.checked_sub(1),
        };
        self.seek(target)
    }

    fn bind_render_target(&mut self) -> Result<(), ReplayError> {
        let framebuffer = self
            .render_target
            .target()
            .ok_or(ReplayError::NoRenderTarget)?
            .framebuffer;
        self.pool.gl().apply(&GlCall::BindFramebuffer {
            framebuffer: Some(framebuffer),
        })?;
        Ok(())
    }

    /// Replay forward to `until` (default: the last call). From the final
    /// index this first rewinds to pre-frame so the whole frame replays. If
    /// no user framebuffer is bound on entry, the session's render target is
    /// bound for the duration and unbound afterward.
    pub fn run(&mut self, until: Option<usize>) -> Result<(), ReplayError> {
        let frame = self.frame.clone().ok_or(ReplayError::NoFrame)?;
        let call_count = frame.call_count();
        if let Some(index) = until {
            if index >= call_count {
                return Err(ReplayError::CallIndexOutOfRange {
                    index,
                    call_count,
                });
            }
        }

        let wrap_framebuffer = self.pool.gl().framebuffer_binding().is_none();

        if call_count == 0 {
            self.reset_frame()?;
            self.begin_stepping();
            self.end_stepping();
            return Ok(());
        }

        let stop_index = until.unwrap_or(call_count - 1);
        if self.call_index == Some(call_count - 1) {
            self.call_index = None;
        }
        if self.call_index.is_none() {
            self.reset_frame()?;
        }
        if wrap_framebuffer {
            self.bind_render_target()?;
        }

        trace!(call_index = ?self.call_index, stop_index, "replaying calls");
        self.begin_stepping();
        let mut result = Ok(());
        while self.call_index.map_or(true, |current| current < stop_index) {
            let next = self.call_index.map_or(0, |current| current + 1);
            self.call_index = Some(next);
            if let Err(error) = self.issue_call(&frame.calls[next]) {
                result = Err(error);
                break;
            }
        }
        self.end_stepping();

        if wrap_framebuffer {
            self.pool
                .gl()
                .apply(&GlCall::BindFramebuffer { framebuffer: None })?;
        }
        result
    }

    /// Like [`run`](Self::run), but stop immediately after the first
    /// draw-class call at or after the current position, or on the last call
    /// if no draw remains.
    pub fn run_until_draw(&mut self) -> Result<(), ReplayError> {
        let frame = self.frame.clone().ok_or(ReplayError::NoFrame)?;
        let call_count = frame.call_count();

        let wrap_framebuffer = self.pool.gl().framebuffer_binding().is_none();

        if call_count == 0 {
            self.reset_frame()?;
            self.begin_stepping();
            self.end_stepping();
            return Ok(());
        }

        if self.call_index == Some(call_count - 1) {
            self.call_index = None;
        }
        if self.call_index.is_none() {
            self.reset_frame()?;
        }
        if wrap_framebuffer {
            self.bind_render_target()?;
        }

        self.begin_stepping();
        let mut result = Ok(());
        loop {
            let next = self.call_index.map_or(0, |current| current + 1);
            self.call_index = Some(next);
            let call = &frame.calls[next];
            let is_draw = call.is_draw();
            if let Err(error) = self.issue_call(call) {
                result = Err(error);
                break;
            }
            if is_draw || next == call_count - 1 {
                break;
            }
        }
        self.end_stepping();

        if wrap_framebuffer {
            self.pool
                .gl()
                .apply(&GlCall::BindFramebuffer { framebuffer: None })?;
        }
        result
    }

    /// Execute one recorded call: pre-handlers in registration order, the
    /// call itself against the pool, post-handlers in reverse order.
    fn issue_call(&mut self, call: &GlCall<ResourceId>) -> Result<(), ReplayError> {
        let mut call = call.clone();
        for mutator in self.mutators.iter_mut() {
            call = mutator.pre(call)?;
        }

        let resolved = resolve_call(&self.pool, &call)?;
        self.pool.gl().apply(&resolved)?;

        for mutator in self.mutators.iter_mut().rev() {
            mutator.post(&call)?;
        }
        Ok(())
    }

    /// Blit the session's offscreen color buffer onto `surface`, scaled to
    /// the surface's dimensions. Read-only: playback position is unaffected.
    pub fn present<S: PresentSurface>(&self, surface: &mut S) -> Result<(), ReplayError> {
        let target = self
            .render_target
            .target()
            .ok_or(ReplayError::NoRenderTarget)?;
        surface.clear();
        surface.draw_scaled(target.color_texture, (target.width, target.height));
        Ok(())
    }

    /// Release the owned render target. Safe to call when none exists.
    pub fn discard(&mut self) {
        self.render_target.discard(self.pool.gl());
    }
}

//! Snapshot application at frame reset.
//!
//! Both appliers run once per reset, against the pool's live context:
//! uniforms first, then global state, so the state snapshot's program ends up
//! as the final active program. Resource references resolve through the pool;
//! an absent reference stays the unbound sentinel.

use glint_gl::call::GlCall;
use glint_gl::state::{state_commands, StateSnapshot};
use glint_gl::{GlBackend, ObjectKind, TargetHandle};

use crate::error::ReplayError;
use crate::frame::{ProgramUniforms, ResourceId};
use crate::pool::ResourcePool;

/// Translate a recorded call's resource references to live handles.
pub fn resolve_call<P: ResourcePool>(
    pool: &P,
    call: &GlCall<ResourceId>,
) -> Result<GlCall<TargetHandle>, ReplayError> {
    call.map_resources(|kind, id| {
        pool.target_handle(*id)
            .ok_or(ReplayError::UnresolvedResource { id: *id, kind })
    })
}

/// Re-upload every captured per-program uniform set.
///
/// Each program is activated in turn and every named value is uploaded
/// through the entry point its declared type selects; a shape mismatch is an
/// error rather than a mis-typed upload.
pub fn apply_uniforms<P: ResourcePool>(
    pool: &mut P,
    uniform_sets: &[ProgramUniforms],
) -> Result<(), ReplayError> {
    for set in uniform_sets {
        let program =
            pool.target_handle(set.program)
                .ok_or(ReplayError::UnresolvedResource {
                    id: set.program,
                    kind: ObjectKind::Program,
                })?;
        pool.gl().apply(&GlCall::UseProgram {
            program: Some(program),
        })?;
        for (name, value) in &set.values {
            let upload = value.ty.upload(&value.data)?;
            pool.gl().apply(&GlCall::Uniform {
                name: name.clone(),
                value: upload,
            })?;
        }
    }
    Ok(())
}

/// Make the live context match `state` exactly.
///
/// Idempotent: applying the same snapshot twice yields the same observable
/// state.
pub fn apply_state<P: ResourcePool>(
    pool: &mut P,
    state: &StateSnapshot<ResourceId>,
) -> Result<(), ReplayError> {
    let limits = pool.limits();
    for call in state_commands(state, &limits) {
        let resolved = resolve_call(pool, &call)?;
        pool.gl().apply(&resolved)?;
    }
    Ok(())
}

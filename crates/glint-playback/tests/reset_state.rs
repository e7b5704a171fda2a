//! Frame reset: resource materialization, uniform and state application,
//! render-target lifecycle, presentation.

use std::collections::BTreeMap;
use std::sync::Arc;

use glint_gl::uniform::{UniformCall, UniformData, UniformType};
use glint_gl::{ContextLimits, ObjectKind};
use glint_playback::testing::{
    empty_frame, resource, MemoryPool, RecordingSurface, ResourceContent, SurfaceOp,
};
use glint_playback::{
    PlaybackSession, ProgramUniforms, ReplayError, ResourceId, ResourcePool, ResourceRef,
    ResourceVersion, UniformValue,
};

fn opaque(pool: &mut MemoryPool, id: u32, kind: ObjectKind, order: u64) -> ResourceRef {
    let res = resource(id, kind, order);
    pool.define_resource(res, ResourceVersion(0), ResourceContent::Opaque);
    ResourceRef {
        resource: res,
        version: ResourceVersion(0),
    }
}

#[test]
fn reset_is_idempotent() {
    let limits = ContextLimits::default();
    let mut pool = MemoryPool::default();
    let program = opaque(&mut pool, 1, ObjectKind::Program, 1);

    let mut frame = empty_frame(&limits, 8, 8);
    frame.initial_resources.push(program);
    frame.initial_state.current_program = Some(ResourceId(1));
    frame.initial_state.viewport = [0, 0, 8, 8];
    frame.initial_state.blend = true;

    let mut session = PlaybackSession::new(pool, Vec::new());
    pollster::block_on(session.set_frame(Arc::new(frame))).unwrap();
    let first = session.pool().headless().state().clone();

    session.reset_frame().unwrap();
    assert_eq!(session.pool().headless().state(), &first);
}

#[test]
fn initial_resources_materialize_in_creation_order() {
    let limits = ContextLimits::default();
    let mut pool = MemoryPool::default();
    // Listed program-first; creation order must still win.
    let program = opaque(&mut pool, 10, ObjectKind::Program, 7);
    let shader = opaque(&mut pool, 11, ObjectKind::Shader, 3);

    let mut frame = empty_frame(&limits, 8, 8);
    frame.initial_resources = vec![program, shader];

    let mut session = PlaybackSession::new(pool, Vec::new());
    pollster::block_on(session.set_frame(Arc::new(frame))).unwrap();

    let log = session.pool().materialize_log();
    let shader_at = log
        .iter()
        .position(|(id, _)| *id == ResourceId(11))
        .unwrap();
    let program_at = log
        .iter()
        .position(|(id, _)| *id == ResourceId(10))
        .unwrap();
    assert!(shader_at < program_at);
}

#[test]
fn repeated_reset_does_not_rematerialize_current_versions() {
    let limits = ContextLimits::default();
    let mut pool = MemoryPool::default();
    let buffer = resource(1, ObjectKind::Buffer, 0);
    pool.define_resource(
        buffer,
        ResourceVersion(2),
        ResourceContent::Buffer {
            data: Arc::from(&[1u8, 2, 3, 4][..]),
        },
    );

    let mut frame = empty_frame(&limits, 8, 8);
    frame.initial_resources.push(ResourceRef {
        resource: buffer,
        version: ResourceVersion(2),
    });

    let mut session = PlaybackSession::new(pool, Vec::new());
    pollster::block_on(session.set_frame(Arc::new(frame))).unwrap();
    assert_eq!(session.pool().materialize_log().len(), 1);

    session.reset_frame().unwrap();
    // ensure was called again but the version was already live.
    assert_eq!(session.pool().ensure_log().len(), 2);
    assert_eq!(session.pool().materialize_log().len(), 1);
}

#[test]
fn uniforms_reach_their_programs_with_exact_arity() {
    let limits = ContextLimits::default();
    let mut pool = MemoryPool::default();
    let program = opaque(&mut pool, 5, ObjectKind::Program, 1);

    let mut values = BTreeMap::new();
    values.insert(
        "u_light_dir".to_string(),
        UniformValue {
            ty: UniformType::FloatVec3,
            data: UniformData::FloatArray(vec![0.0, 1.0, 0.0]),
        },
    );
    values.insert(
        "u_model_view".to_string(),
        UniformValue {
            ty: UniformType::FloatMat4,
            data: UniformData::FloatArray((0..16).map(|v| v as f32).collect()),
        },
    );
    values.insert(
        "u_diffuse".to_string(),
        UniformValue {
            ty: UniformType::Sampler2d,
            data: UniformData::Int(0),
        },
    );

    let mut frame = empty_frame(&limits, 8, 8);
    frame.initial_resources.push(program);
    frame.initial_uniforms.push(ProgramUniforms {
        program: ResourceId(5),
        values,
    });

    let mut session = PlaybackSession::new(pool, Vec::new());
    pollster::block_on(session.set_frame(Arc::new(frame))).unwrap();

    let pool = session.pool();
    let handle = pool.target_handle(ResourceId(5)).unwrap();
    let gl = pool.headless();
    assert_eq!(
        gl.program_uniform(handle, "u_light_dir"),
        Some(&UniformCall::Float {
            components: 3,
            data: vec![0.0, 1.0, 0.0],
        })
    );
    assert_eq!(
        gl.program_uniform(handle, "u_model_view"),
        Some(&UniformCall::Matrix {
            order: 4,
            transpose: false,
            data: (0..16).map(|v| v as f32).collect(),
        })
    );
    assert_eq!(
        gl.program_uniform(handle, "u_diffuse"),
        Some(&UniformCall::Int {
            components: 1,
            data: vec![0],
        })
    );
}

#[test]
fn state_snapshot_program_ends_up_active_after_reset() {
    let limits = ContextLimits::default();
    let mut pool = MemoryPool::default();
    let lit = opaque(&mut pool, 1, ObjectKind::Program, 1);
    let flat = opaque(&mut pool, 2, ObjectKind::Program, 2);

    let mut frame = empty_frame(&limits, 8, 8);
    frame.initial_resources = vec![lit, flat];
    // Uniform application activates program 1 last...
    frame.initial_uniforms.push(ProgramUniforms {
        program: ResourceId(1),
        values: BTreeMap::new(),
    });
    // ...but the state snapshot names program 2 as current.
    frame.initial_state.current_program = Some(ResourceId(2));

    let mut session = PlaybackSession::new(pool, Vec::new());
    pollster::block_on(session.set_frame(Arc::new(frame))).unwrap();

    let expected = session.pool().target_handle(ResourceId(2)).unwrap();
    assert_eq!(
        session.pool().headless().state().current_program,
        Some(expected)
    );
}

#[test]
fn matching_canvas_reuses_the_render_target_across_frames() {
    let limits = ContextLimits::default();
    let mut session = PlaybackSession::new(MemoryPool::default(), Vec::new());

    pollster::block_on(session.set_frame(Arc::new(empty_frame(&limits, 16, 16)))).unwrap();
    let first = session.render_target().unwrap().framebuffer;

    pollster::block_on(session.set_frame(Arc::new(empty_frame(&limits, 16, 16)))).unwrap();
    assert_eq!(session.render_target().unwrap().framebuffer, first);
}

#[test]
fn differing_canvas_forces_reallocation() {
    let limits = ContextLimits::default();
    let mut session = PlaybackSession::new(MemoryPool::default(), Vec::new());

    pollster::block_on(session.set_frame(Arc::new(empty_frame(&limits, 16, 16)))).unwrap();
    let first = session.render_target().unwrap().framebuffer;

    pollster::block_on(session.set_frame(Arc::new(empty_frame(&limits, 32, 16)))).unwrap();
    let second = session.render_target().unwrap().framebuffer;
    assert_ne!(second, first);
    assert!(!session.pool().headless().is_live(first));
}

#[test]
fn present_blits_scaled_without_moving_the_position() {
    let limits = ContextLimits::default();
    let mut session = PlaybackSession::new(MemoryPool::default(), Vec::new());
    pollster::block_on(session.set_frame(Arc::new(empty_frame(&limits, 24, 12)))).unwrap();

    let mut surface = RecordingSurface::default();
    session.present(&mut surface).unwrap();

    let color_texture = session.render_target().unwrap().color_texture;
    assert_eq!(
        surface.ops,
        vec![
            SurfaceOp::Clear,
            SurfaceOp::DrawScaled {
                color_texture,
                source_size: (24, 12),
            },
        ]
    );
    assert_eq!(session.call_index(), None);
}

#[test]
fn present_without_a_target_fails() {
    let session: PlaybackSession<MemoryPool> =
        PlaybackSession::new(MemoryPool::default(), Vec::new());
    let mut surface = RecordingSurface::default();
    assert!(matches!(
        session.present(&mut surface),
        Err(ReplayError::NoRenderTarget)
    ));
}

#[test]
fn discard_releases_the_target_and_is_idempotent() {
    let limits = ContextLimits::default();
    let mut session = PlaybackSession::new(MemoryPool::default(), Vec::new());
    pollster::block_on(session.set_frame(Arc::new(empty_frame(&limits, 8, 8)))).unwrap();

    let framebuffer = session.render_target().unwrap().framebuffer;
    session.discard();
    assert!(session.render_target().is_none());
    assert!(!session.pool().headless().is_live(framebuffer));
    session.discard();
}

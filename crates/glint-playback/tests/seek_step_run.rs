//! Seek/step/run navigation over the call log.

use std::sync::Arc;

use glint_gl::call::{BufferTarget, ClearMask, DrawMode, GlCall, IndexType};
use glint_gl::{ContextLimits, GlBackend, ObjectKind};
use glint_playback::testing::{empty_frame, resource, MemoryPool, ResourceContent};
use glint_playback::{
    Frame, PlaybackSession, ReplayError, ResourceId, ResourcePool, ResourceRef, ResourceVersion,
    StepDirection,
};

/// A session over a four-call frame: `[bindBuffer, drawArrays, clear,
/// drawElements]`.
fn session_with_draws() -> PlaybackSession<MemoryPool> {
    let _ = tracing_subscriber::fmt().with_test_writer().try_init();

    let limits = ContextLimits::default();
    let mut pool = MemoryPool::default();
    let buffer = resource(1, ObjectKind::Buffer, 0);
    pool.define_resource(
        buffer,
        ResourceVersion(0),
        ResourceContent::Buffer {
            data: Arc::from(&[0u8; 12][..]),
        },
    );

    let mut frame = empty_frame(&limits, 8, 8);
    frame
        .initial_resources
        .push(ResourceRef {
            resource: buffer,
            version: ResourceVersion(0),
        });
    frame.calls = vec![
        GlCall::BindBuffer {
            target: BufferTarget::Array,
            buffer: Some(ResourceId(1)),
        },
        GlCall::DrawArrays {
            mode: DrawMode::Triangles,
            first: 0,
            count: 3,
        },
        GlCall::Clear {
            mask: ClearMask::COLOR,
        },
        GlCall::DrawElements {
            mode: DrawMode::Triangles,
            count: 3,
            index_type: IndexType::UnsignedShort,
            offset: 0,
        },
    ];

    let mut session = PlaybackSession::new(pool, Vec::new());
    pollster::block_on(session.set_frame(Arc::new(frame))).unwrap();
    session
}

#[test]
fn adoption_settles_at_pre_frame() {
    let session = session_with_draws();
    assert_eq!(session.call_index(), None);
    assert!(!session.is_stepping());
}

#[test]
fn seek_forward_then_equal_is_a_no_op() {
    let mut session = session_with_draws();
    session.seek(Some(2)).unwrap();
    assert_eq!(session.call_index(), Some(2));

    let log_len = session.pool().headless().call_log().len();
    session.seek(Some(2)).unwrap();
    assert_eq!(session.pool().headless().call_log().len(), log_len);
}

#[test]
fn backward_seek_matches_direct_seek() {
    let mut direct = session_with_draws();
    direct.seek(Some(1)).unwrap();
    let expected = direct.pool().headless().state().clone();

    let mut rewound = session_with_draws();
    rewound.seek(Some(3)).unwrap();
    rewound.seek(Some(1)).unwrap();
    assert_eq!(rewound.call_index(), Some(1));
    assert_eq!(rewound.pool().headless().state(), &expected);
}

#[test]
fn forward_replay_is_deterministic_across_paths() {
    let mut stepped = session_with_draws();
    stepped.seek(Some(0)).unwrap();
    stepped.seek(Some(3)).unwrap();

    let mut direct = session_with_draws();
    direct.seek(Some(3)).unwrap();

    assert_eq!(
        stepped.pool().headless().state(),
        direct.pool().headless().state()
    );
}

#[test]
fn seek_to_none_resets_to_pre_frame() {
    let mut session = session_with_draws();
    session.seek(Some(3)).unwrap();
    session.seek(None).unwrap();
    assert_eq!(session.call_index(), None);
}

#[test]
fn step_walks_forward_and_wraps_at_the_end() {
    let mut session = session_with_draws();
    session.step(StepDirection::Forward).unwrap();
    assert_eq!(session.call_index(), Some(0));
    session.step(StepDirection::Forward).unwrap();
    assert_eq!(session.call_index(), Some(1));

    session.seek(Some(3)).unwrap();
    session.step(StepDirection::Forward).unwrap();
    assert_eq!(session.call_index(), None);
}

#[test]
fn step_backward_from_pre_frame_lands_on_the_last_call() {
    let mut session = session_with_draws();
    session.step(StepDirection::Backward).unwrap();
    assert_eq!(session.call_index(), Some(3));
}

#[test]
fn step_backward_from_zero_wraps_to_pre_frame() {
    let mut session = session_with_draws();
    session.seek(Some(0)).unwrap();
    session.step(StepDirection::Backward).unwrap();
    assert_eq!(session.call_index(), None);
}

#[test]
fn zero_call_frame_steps_stay_at_pre_frame() {
    let limits = ContextLimits::default();
    let frame = Arc::new(empty_frame(&limits, 4, 4));
    let mut session = PlaybackSession::new(MemoryPool::default(), Vec::new());
    pollster::block_on(session.set_frame(frame)).unwrap();

    session.step(StepDirection::Forward).unwrap();
    assert_eq!(session.call_index(), None);
    session.step(StepDirection::Backward).unwrap();
    assert_eq!(session.call_index(), None);
}

#[test]
fn run_replays_the_whole_frame_and_rewinds_from_the_end() {
    let mut session = session_with_draws();
    session.run(None).unwrap();
    assert_eq!(session.call_index(), Some(3));

    // From the final index, run rewinds so the full frame replays again.
    session.run(None).unwrap();
    assert_eq!(session.call_index(), Some(3));
}

#[test]
fn run_until_draw_stops_on_each_draw_class_call() {
    let mut session = session_with_draws();
    session.run_until_draw().unwrap();
    assert_eq!(session.call_index(), Some(1));
    session.run_until_draw().unwrap();
    assert_eq!(session.call_index(), Some(3));
}

#[test]
fn run_until_draw_exhausts_a_frame_without_draws() {
    let limits = ContextLimits::default();
    let mut frame = empty_frame(&limits, 8, 8);
    frame.calls = vec![
        GlCall::Clear {
            mask: ClearMask::COLOR,
        },
        GlCall::Clear {
            mask: ClearMask::DEPTH,
        },
    ];
    let mut session = PlaybackSession::new(MemoryPool::default(), Vec::new());
    pollster::block_on(session.set_frame(Arc::new(frame))).unwrap();

    session.run_until_draw().unwrap();
    assert_eq!(session.call_index(), Some(1));
}

#[test]
fn run_wraps_the_render_target_binding_and_restores_it() {
    let mut session = session_with_draws();
    session.run(None).unwrap();

    // The caller had no framebuffer bound, so the run ends unbound again.
    assert_eq!(session.pool_mut().gl().framebuffer_binding(), None);

    // During the replay itself the session's own target was bound.
    let target_framebuffer = session.render_target().unwrap().framebuffer;
    let log = session.pool().headless().call_log();
    let bind_position = log
        .iter()
        .rposition(|call| {
            matches!(
                call,
                GlCall::BindFramebuffer { framebuffer: Some(fb) } if *fb == target_framebuffer
            )
        })
        .expect("render target bound for the run");
    let draw_position = log
        .iter()
        .rposition(|call| matches!(call, GlCall::DrawElements { .. }))
        .expect("draws replayed");
    assert!(bind_position < draw_position);
}

#[test]
fn run_preserves_a_user_framebuffer_binding() {
    let mut session = session_with_draws();
    session.seek(Some(0)).unwrap();

    let user_framebuffer = session.pool_mut().gl().create_object(ObjectKind::Framebuffer);
    session
        .pool_mut()
        .gl()
        .apply(&GlCall::BindFramebuffer {
            framebuffer: Some(user_framebuffer),
        })
        .unwrap();

    session.run(Some(2)).unwrap();
    assert_eq!(
        session.pool_mut().gl().framebuffer_binding(),
        Some(user_framebuffer)
    );
}

#[test]
fn navigation_before_any_frame_fails_fast() {
    let mut session = PlaybackSession::new(MemoryPool::default(), Vec::new());
    assert!(matches!(session.seek(Some(0)), Err(ReplayError::NoFrame)));
    assert!(matches!(
        session.step(StepDirection::Forward),
        Err(ReplayError::NoFrame)
    ));
    assert!(matches!(session.run(None), Err(ReplayError::NoFrame)));
}

#[test]
fn out_of_range_seek_fails_fast() {
    let mut session = session_with_draws();
    assert!(matches!(
        session.seek(Some(4)),
        Err(ReplayError::CallIndexOutOfRange {
            index: 4,
            call_count: 4,
        })
    ));
    // The failed seek did not move the position.
    assert_eq!(session.call_index(), None);
}

#[test]
fn frames_are_shared_read_only() {
    let limits = ContextLimits::default();
    let frame = Arc::new(empty_frame(&limits, 4, 4));
    let mut session = PlaybackSession::new(MemoryPool::default(), Vec::new());
    pollster::block_on(session.set_frame(Arc::clone(&frame))).unwrap();
    let adopted: &Arc<Frame> = session.frame().unwrap();
    assert!(Arc::ptr_eq(adopted, &frame));
}

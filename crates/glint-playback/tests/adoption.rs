//! Frame adoption: preload gating, supersede semantics, failure isolation,
//! and notification ordering.

use std::cell::RefCell;
use std::rc::Rc;
use std::sync::Arc;

use futures_intrusive::channel::shared::oneshot_channel;
use glint_gl::call::{ClearMask, GlCall};
use glint_gl::{ContextLimits, ObjectKind};
use glint_playback::testing::{empty_frame, resource, MemoryPool, ResourceContent};
use glint_playback::{
    Adoption, AssetError, AssetPreload, PlaybackEvent, PlaybackSession, ReplayError, ResourceId,
    ResourceRef, ResourceVersion,
};

fn frame_with_buffer(pool: &mut MemoryPool, id: u32, width: u32) -> Arc<glint_playback::Frame> {
    let limits = ContextLimits::default();
    let buffer = resource(id, ObjectKind::Buffer, 0);
    pool.define_resource(
        buffer,
        ResourceVersion(0),
        ResourceContent::Buffer {
            data: Arc::from(&[0u8; 4][..]),
        },
    );
    let mut frame = empty_frame(&limits, width, width);
    frame.initial_resources.push(ResourceRef {
        resource: buffer,
        version: ResourceVersion(0),
    });
    Arc::new(frame)
}

#[test]
fn adoption_waits_for_preloads_and_mutates_nothing_before_completion() {
    let mut pool = MemoryPool::default();
    let frame = frame_with_buffer(&mut pool, 1, 8);

    let (tx, rx) = oneshot_channel::<Result<(), AssetError>>();
    let preload: AssetPreload = Box::pin(async move {
        rx.receive().await.unwrap_or_else(|| {
            Err(AssetError {
                resource: ResourceId(1),
                reason: "preload sender dropped".into(),
            })
        })
    });
    pool.stage_preload(ResourceId(1), preload);

    let mut session = PlaybackSession::new(pool, Vec::new());
    let (ticket, preloads) = session.begin_set_frame(Arc::clone(&frame));

    // Nothing is adopted, materialized, or reset while preloads are pending.
    assert!(session.frame().is_none());
    assert!(session.render_target().is_none());
    assert!(session.pool().materialize_log().is_empty());

    tx.send(Ok(())).unwrap();
    for preload in preloads {
        pollster::block_on(preload).unwrap();
    }
    assert_eq!(
        session.complete_set_frame(ticket).unwrap(),
        Adoption::Adopted
    );
    assert!(session.frame().is_some());
    assert_eq!(session.pool().materialize_log().len(), 1);
}

#[test]
fn later_adoption_supersedes_an_in_flight_one() {
    let mut pool = MemoryPool::default();
    let slow = frame_with_buffer(&mut pool, 1, 8);
    let fast = frame_with_buffer(&mut pool, 2, 16);

    let (tx, rx) = oneshot_channel::<Result<(), AssetError>>();
    let preload: AssetPreload = Box::pin(async move {
        rx.receive().await.unwrap_or_else(|| {
            Err(AssetError {
                resource: ResourceId(1),
                reason: "preload sender dropped".into(),
            })
        })
    });
    pool.stage_preload(ResourceId(1), preload);

    let mut session = PlaybackSession::new(pool, Vec::new());
    let (slow_ticket, slow_preloads) = session.begin_set_frame(Arc::clone(&slow));

    // A second set_frame arrives before the first resolves.
    let (fast_ticket, fast_preloads) = session.begin_set_frame(Arc::clone(&fast));
    for preload in fast_preloads {
        pollster::block_on(preload).unwrap();
    }
    assert_eq!(
        session.complete_set_frame(fast_ticket).unwrap(),
        Adoption::Adopted
    );
    let adopted_target = session.render_target().unwrap().framebuffer;

    // The stale adoption resolves afterwards and must be discarded.
    tx.send(Ok(())).unwrap();
    for preload in slow_preloads {
        pollster::block_on(preload).unwrap();
    }
    assert_eq!(
        session.complete_set_frame(slow_ticket).unwrap(),
        Adoption::Superseded
    );
    assert!(Arc::ptr_eq(session.frame().unwrap(), &fast));
    assert_eq!(session.render_target().unwrap().framebuffer, adopted_target);
}

#[test]
fn preload_failure_leaves_the_prior_frame_active() {
    let mut pool = MemoryPool::default();
    let good = frame_with_buffer(&mut pool, 1, 8);
    let bad = frame_with_buffer(&mut pool, 2, 16);
    pool.stage_preload(
        ResourceId(2),
        Box::pin(std::future::ready(Err(AssetError {
            resource: ResourceId(2),
            reason: "missing blob".into(),
        }))),
    );

    let mut session = PlaybackSession::new(pool, Vec::new());
    pollster::block_on(session.set_frame(Arc::clone(&good))).unwrap();
    let target = session.render_target().unwrap().framebuffer;

    let error = pollster::block_on(session.set_frame(Arc::clone(&bad))).unwrap_err();
    assert!(matches!(error, ReplayError::Preload(_)));

    // The failed switch did not partially apply.
    assert!(Arc::ptr_eq(session.frame().unwrap(), &good));
    assert_eq!(session.call_index(), None);
    assert_eq!(session.render_target().unwrap().framebuffer, target);
}

#[test]
fn notifications_fire_in_order_around_adoption_and_stepping() {
    let limits = ContextLimits::default();
    let mut frame = empty_frame(&limits, 8, 8);
    frame.calls = vec![GlCall::Clear {
        mask: ClearMask::COLOR,
    }];
    let frame = Arc::new(frame);

    let log: Rc<RefCell<Vec<String>>> = Rc::default();
    let sink = Rc::clone(&log);

    let mut session = PlaybackSession::new(MemoryPool::default(), Vec::new());
    session.observe(move |event| {
        sink.borrow_mut().push(match event {
            PlaybackEvent::Ready => "ready".to_string(),
            PlaybackEvent::PreFrame { .. } => "pre_frame".to_string(),
            PlaybackEvent::Stepped { call_index } => format!("stepped:{call_index:?}"),
        });
    });

    // PreFrame fires strictly after the reset completes, Ready once the
    // frame is fully adopted.
    pollster::block_on(session.set_frame(Arc::clone(&frame))).unwrap();
    assert_eq!(log.borrow().as_slice(), ["pre_frame", "ready"]);

    log.borrow_mut().clear();
    session.seek(Some(0)).unwrap();
    assert_eq!(log.borrow().as_slice(), ["pre_frame", "stepped:Some(0)"]);

    // Seeking to pre-frame brackets the reset with a stepped notification.
    log.borrow_mut().clear();
    session.seek(None).unwrap();
    assert_eq!(log.borrow().as_slice(), ["stepped:None", "pre_frame"]);
}

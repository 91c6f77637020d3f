//! Hosts built from a graph context, driven the way surfaces drive them.

use std::cell::RefCell;
use std::rc::Rc;
use std::sync::Arc;

use bpview_core::stream::observer_fn;
use bpview_core::{
    GraphContext, MutationOutcome, Observable, PointSequence, PushChannel, SegmentId,
    SegmentTable, ViewportHosts,
};
use bpview_protocol::{
    CenterGesture, DragGesture, LinearSnapshot, Point, Rect, SpatialZoomGesture, Validate,
    ZoomGesture,
};

fn demo_context() -> GraphContext {
    let coords = SegmentTable::from_lengths([120, 30, 850]);
    let layout: PointSequence = (0..10)
        .map(|i| Point::new(f64::from(i) * 10.0, f64::from(i % 3) * 5.0))
        .collect();
    GraphContext::new(Arc::new(coords), layout).with_sequence(b"ACGT".repeat(250))
}

#[test]
fn every_subscriber_sees_the_same_snapshots() {
    let ctx = demo_context();
    let hosts = ViewportHosts::new(&ctx).expect("hosts");

    let path: Rc<RefCell<Vec<LinearSnapshot>>> = Rc::default();
    let overview: Rc<RefCell<Vec<LinearSnapshot>>> = Rc::default();
    for sink in [path.clone(), overview.clone()] {
        hosts
            .linear
            .stream()
            .subscribe(observer_fn(move |s| sink.borrow_mut().push(s)));
    }

    let zooms = PushChannel::multicast();
    let drags = PushChannel::multicast();
    let taps = PushChannel::multicast();
    let _z = hosts.linear.subscribe_zoom(&zooms);
    let _d = hosts.linear.subscribe_drag(&drags);
    let _t = hosts.linear.subscribe_center(&taps);

    zooms.push(ZoomGesture { scale: 0.1, anchor: 0.5 });
    drags.push(DragGesture { dx: -1.0, dy: 0.0 });
    taps.push(CenterGesture { bp: 990 });

    assert_eq!(*path.borrow(), *overview.borrow());
    let lengths: Vec<i64> = path.borrow().iter().map(LinearSnapshot::len).collect();
    assert_eq!(lengths, vec![1000, 100, 100, 100]);
    assert!(path.borrow().iter().all(|s| s.validate().is_ok()));
    // Centering near the upper edge shifts the window back inside.
    assert_eq!(hosts.linear.get(), LinearSnapshot { start: 900, end: 1000, max: 1000 });
}

#[test]
fn segment_framing_and_reset() {
    let ctx = demo_context();
    let hosts = ViewportHosts::new(&ctx).expect("hosts");
    hosts.linear.set(0, 50);

    let outcome = hosts.linear.center_on_segment(ctx.coords().as_ref(), SegmentId(1));
    assert_eq!(outcome, Some(MutationOutcome::Applied));
    assert_eq!((hosts.linear.get().start, hosts.linear.get().end), (110, 160));

    // Wider than the window: show exactly the segment.
    hosts.linear.center_on_segment(ctx.coords().as_ref(), SegmentId(2));
    assert_eq!((hosts.linear.get().start, hosts.linear.get().end), (150, 1000));

    assert_eq!(hosts.linear.reset(), MutationOutcome::Applied);
    assert_eq!(hosts.linear.get(), LinearSnapshot { start: 0, end: 1000, max: 1000 });
}

#[test]
fn camera_frames_layout_and_zooms_to_cursor() {
    let ctx = demo_context();
    let hosts = ViewportHosts::new(&ctx).expect("hosts");
    let layout_bounds = ctx.layout().bounds().expect("bounds");

    let camera = hosts.spatial.get().bounds();
    assert!(camera.x <= layout_bounds.x && camera.y <= layout_bounds.y);
    assert!(camera.x + camera.w >= layout_bounds.x + layout_bounds.w);

    let zooms = PushChannel::multicast();
    let _z = hosts.spatial.subscribe_zoom(&zooms);
    let anchor = Point::new(0.25, 0.75);
    let before = hosts.spatial.get().world_at(anchor);
    zooms.push(SpatialZoomGesture { scale: 0.5, anchor });
    let after = hosts.spatial.get().world_at(anchor);
    assert!((before.x - after.x).abs() < 1e-9 && (before.y - after.y).abs() < 1e-9);

    hosts.spatial.fit(Rect::new(0.0, 0.0, 10.0, 10.0), 0.0);
    assert_eq!(hosts.spatial.get().center, Point::new(5.0, 5.0));
}

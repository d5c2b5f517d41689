use std::cell::RefCell;
use std::rc::Rc;

use approx::assert_relative_eq;
use kline_core::api::SurfaceConfig;
use kline_core::core::{LogicalSize, PhysicalSize, SurfaceGeometry};
use kline_core::platform::{FrameHandle, HeadlessHost, ObserverKind};
use kline_core::render::{
    Canvas, CapabilityProbe, Color, DeviceRatioMode, DrawingContext, NullContext, RectPrimitive,
};

type Paints = Rc<RefCell<Vec<SurfaceGeometry>>>;

fn build_canvas(host: HeadlessHost) -> (Canvas<HeadlessHost>, Paints) {
    build_canvas_with(host, SurfaceConfig::default())
}

fn build_canvas_with(host: HeadlessHost, config: SurfaceConfig) -> (Canvas<HeadlessHost>, Paints) {
    let paints: Paints = Rc::new(RefCell::new(Vec::new()));
    let sink = Rc::clone(&paints);
    let canvas = Canvas::new(
        host,
        config,
        move |context: &mut NullContext, geometry: &SurfaceGeometry| {
            context
                .fill_rect(&RectPrimitive::covering(
                    geometry.logical,
                    Color::rgb(0.1, 0.2, 0.3),
                ))
                .expect("background rect");
            sink.borrow_mut().push(*geometry);
        },
    )
    .expect("canvas init");
    (canvas, paints)
}

fn fire_frames(canvas: &mut Canvas<HeadlessHost>) -> usize {
    let frames = canvas.host_mut().take_scheduled_frames();
    let fired = frames.len();
    for frame in frames {
        canvas.on_frame(frame);
    }
    fired
}

#[test]
fn rapid_updates_coalesce_into_one_paint_with_final_geometry() {
    let (mut canvas, paints) = build_canvas(HeadlessHost::new(2.0));

    canvas.update(100.0, 50.0);
    canvas.update(200.0, 80.0);
    assert_eq!(canvas.host().scheduled_frame_count(), 1);

    assert_eq!(fire_frames(&mut canvas), 1);

    let paints = paints.borrow();
    assert_eq!(paints.len(), 1);
    assert_eq!(paints[0].logical, LogicalSize::new(200.0, 80.0));
    assert_eq!(paints[0].physical, PhysicalSize::new(400, 160));
    assert_relative_eq!(paints[0].horizontal_pixel_ratio, 2.0);
    assert_relative_eq!(paints[0].vertical_pixel_ratio, 2.0);

    let context = canvas.context();
    assert_eq!(context.buffer_size, PhysicalSize::new(400, 160));
    assert_eq!(context.transform, (2.0, 2.0));
    assert_eq!(context.resize_count, 1);
    assert_eq!(context.rect_count, 1);
    assert_eq!(canvas.host().css_size(), Some(LogicalSize::new(200.0, 80.0)));
    assert_eq!(canvas.state().frame, None);
}

#[test]
fn unchanged_size_requests_plain_repaint() {
    let (mut canvas, paints) = build_canvas(HeadlessHost::new(1.0));
    canvas.update(120.0, 60.0);
    fire_frames(&mut canvas);

    canvas.update(120.0, 60.0);
    assert_eq!(canvas.host().scheduled_frame_count(), 1);
    fire_frames(&mut canvas);

    assert_eq!(paints.borrow().len(), 2);
    assert_eq!(canvas.context().resize_count, 1);
    assert_eq!(canvas.context().clear_count, 2);
}

#[test]
fn request_repaint_is_absorbed_by_pending_frame() {
    let (mut canvas, paints) = build_canvas(HeadlessHost::new(1.0));
    canvas.request_repaint();
    canvas.request_repaint();
    canvas.update(40.0, 30.0);

    assert_eq!(fire_frames(&mut canvas), 1);
    assert_eq!(paints.borrow().len(), 1);
    assert_eq!(canvas.geometry().physical, PhysicalSize::new(40, 30));
}

#[test]
fn returning_to_previous_size_before_frame_still_reconciles() {
    let (mut canvas, paints) = build_canvas(HeadlessHost::new(1.0));
    canvas.update(100.0, 100.0);
    fire_frames(&mut canvas);

    canvas.update(200.0, 200.0);
    canvas.update(100.0, 100.0);
    fire_frames(&mut canvas);

    let paints = paints.borrow();
    assert_eq!(paints.len(), 2);
    assert_eq!(paints[1].logical, LogicalSize::new(100.0, 100.0));
    assert_eq!(paints[1].physical, PhysicalSize::new(100, 100));
    assert_eq!(canvas.host().css_size(), Some(LogicalSize::new(100.0, 100.0)));
}

#[test]
fn invalid_sizes_are_ignored() {
    let (mut canvas, paints) = build_canvas(HeadlessHost::new(1.0));
    canvas.update(f64::NAN, 10.0);
    canvas.update(-1.0, 3.0);
    canvas.update(10.0, f64::INFINITY);

    assert_eq!(canvas.host().scheduled_frame_count(), 0);
    assert_eq!(canvas.host().css_size(), None);
    assert!(paints.borrow().is_empty());
}

#[test]
fn zero_size_is_valid_and_keeps_density_as_ratio() {
    let (mut canvas, paints) = build_canvas(HeadlessHost::new(1.5));
    canvas.update(0.0, 20.0);
    fire_frames(&mut canvas);

    let geometry = paints.borrow()[0];
    assert_eq!(geometry.physical, PhysicalSize::new(0, 30));
    assert_relative_eq!(geometry.horizontal_pixel_ratio, 1.5);
    assert_relative_eq!(geometry.vertical_pixel_ratio, 1.5);
}

#[test]
fn stale_frame_handles_do_not_paint() {
    let (mut canvas, paints) = build_canvas(HeadlessHost::new(1.0));
    canvas.update(10.0, 10.0);

    canvas.on_frame(FrameHandle::new(999));
    assert!(paints.borrow().is_empty());
    assert!(canvas.state().frame.is_some());

    fire_frames(&mut canvas);
    assert_eq!(paints.borrow().len(), 1);
}

#[test]
fn probe_support_switches_to_device_pixel_box_reporting() {
    let (mut canvas, paints) = build_canvas(HeadlessHost::new(2.0));
    assert!(canvas.host().probe_started());

    canvas.resolve_capability_probe(true);
    assert_eq!(canvas.host().observers(), vec![ObserverKind::DevicePixelBox]);
    assert_eq!(canvas.state().device_ratio_mode, DeviceRatioMode::ObservedByResize);

    canvas.update(100.0, 50.0);
    assert_eq!(canvas.host().scheduled_frame_count(), 0);

    canvas.on_device_pixel_box(250, 120);
    fire_frames(&mut canvas);

    let geometry = paints.borrow()[0];
    assert_eq!(geometry.logical, LogicalSize::new(100.0, 50.0));
    assert_eq!(geometry.physical, PhysicalSize::new(250, 120));
    assert_relative_eq!(geometry.horizontal_pixel_ratio, 2.5);
    assert_relative_eq!(geometry.vertical_pixel_ratio, 2.4);
    assert_eq!(canvas.context().transform, (2.5, 2.4));

    canvas.on_device_pixel_box(250, 120);
    assert_eq!(canvas.host().scheduled_frame_count(), 0);
}

#[test]
fn repeated_update_in_pixel_box_mode_still_repaints() {
    let (mut canvas, paints) = build_canvas(HeadlessHost::new(2.0));
    canvas.resolve_capability_probe(true);

    canvas.update(100.0, 50.0);
    assert_eq!(canvas.host().scheduled_frame_count(), 0);
    canvas.update(100.0, 50.0);
    assert_eq!(canvas.host().scheduled_frame_count(), 1);

    canvas.on_device_pixel_box(200, 100);
    assert_eq!(canvas.host().scheduled_frame_count(), 1);
    fire_frames(&mut canvas);

    let paints = paints.borrow();
    assert_eq!(paints.len(), 1);
    assert_eq!(paints[0].logical, LogicalSize::new(100.0, 50.0));
    assert_eq!(paints[0].physical, PhysicalSize::new(200, 100));
}

#[test]
fn repeated_update_before_frame_keeps_single_pending_reconcile() {
    let (mut canvas, paints) = build_canvas(HeadlessHost::new(1.5));
    canvas.update(80.0, 40.0);
    canvas.update(80.0, 40.0);
    assert_eq!(canvas.host().scheduled_frame_count(), 1);

    fire_frames(&mut canvas);
    assert_eq!(paints.borrow()[0].physical, PhysicalSize::new(120, 60));
    assert_eq!(canvas.context().resize_count, 1);
}

#[test]
fn density_changes_are_ignored_in_pixel_box_mode() {
    let (mut canvas, _paints) = build_canvas(HeadlessHost::new(1.0));
    canvas.resolve_capability_probe(true);
    canvas.host_mut().set_density(3.0);
    canvas.on_density_changed();
    assert_eq!(canvas.host().scheduled_frame_count(), 0);
}

#[test]
fn probe_resolution_is_one_shot() {
    let (mut canvas, _paints) = build_canvas(HeadlessHost::new(1.0));
    canvas.resolve_capability_probe(false);
    canvas.resolve_capability_probe(true);

    assert_eq!(canvas.host().observers(), vec![ObserverKind::Density(1.0)]);
    assert_eq!(
        canvas.state().probe,
        CapabilityProbe::Resolved { supported: false }
    );
}

#[test]
fn probe_times_out_after_frame_budget() {
    let (mut canvas, _paints) = build_canvas(HeadlessHost::new(1.0));
    assert_eq!(
        canvas.state().probe,
        CapabilityProbe::Pending {
            frames_remaining: 2
        }
    );

    canvas.update(10.0, 10.0);
    fire_frames(&mut canvas);
    assert!(canvas.host().observers().is_empty());

    canvas.update(20.0, 20.0);
    fire_frames(&mut canvas);

    assert_eq!(
        canvas.state().probe,
        CapabilityProbe::Resolved { supported: false }
    );
    assert_eq!(canvas.host().observers(), vec![ObserverKind::Density(1.0)]);
    assert_eq!(
        canvas.state().device_ratio_mode,
        DeviceRatioMode::ObservedByMediaQuery
    );
}

#[test]
fn failed_probe_start_resolves_to_density_listener() {
    let (canvas, _paints) = build_canvas(HeadlessHost::new(1.25).with_probe_failure());
    assert!(!canvas.host().probe_started());
    assert_eq!(canvas.host().observers(), vec![ObserverKind::Density(1.25)]);
    assert!(canvas.state().observing);
}

#[test]
fn density_change_rearms_listener_and_rescales() {
    let (mut canvas, paints) = build_canvas(HeadlessHost::new(1.0).with_probe_failure());
    canvas.update(100.0, 40.0);
    fire_frames(&mut canvas);

    canvas.host_mut().set_density(2.0);
    canvas.on_density_changed();
    assert_eq!(canvas.host().observers(), vec![ObserverKind::Density(2.0)]);

    fire_frames(&mut canvas);
    let paints = paints.borrow();
    assert_eq!(paints.len(), 2);
    assert_eq!(paints[1].physical, PhysicalSize::new(200, 80));
    assert_eq!(canvas.context().transform, (2.0, 2.0));
}

#[test]
fn consecutive_density_changes_share_one_frame() {
    let (mut canvas, paints) = build_canvas(HeadlessHost::new(1.0).with_probe_failure());
    canvas.update(100.0, 100.0);
    fire_frames(&mut canvas);

    canvas.host_mut().set_density(2.0);
    canvas.on_density_changed();
    canvas.host_mut().set_density(3.0);
    canvas.on_density_changed();
    assert_eq!(canvas.host().scheduled_frame_count(), 1);

    fire_frames(&mut canvas);
    assert_eq!(paints.borrow().len(), 2);
    assert_eq!(paints.borrow()[1].physical, PhysicalSize::new(300, 300));
}

#[test]
fn observer_failures_degrade_to_update_driven_reconciliation() {
    let host = HeadlessHost::new(1.5)
        .with_probe_failure()
        .with_observer_failure();
    let (mut canvas, paints) = build_canvas(host);
    assert!(!canvas.state().observing);

    canvas.update(101.0, 33.0);
    fire_frames(&mut canvas);

    let geometry = paints.borrow()[0];
    assert_eq!(geometry.physical, PhysicalSize::new(152, 50));
    assert_relative_eq!(geometry.horizontal_pixel_ratio, 152.0 / 101.0);
    assert_relative_eq!(geometry.vertical_pixel_ratio, 50.0 / 33.0);
}

#[test]
fn pixel_box_observer_failure_falls_back_to_density() {
    let (mut canvas, _paints) = build_canvas(HeadlessHost::new(2.0).with_observer_failure());
    canvas.resolve_capability_probe(true);

    assert_eq!(
        canvas.state().device_ratio_mode,
        DeviceRatioMode::ObservedByMediaQuery
    );
    canvas.update(10.0, 10.0);
    assert_eq!(canvas.state().pending_physical_size, PhysicalSize::new(20, 20));
}

#[test]
fn destroy_before_probe_resolves_installs_no_observer() {
    let (mut canvas, paints) = build_canvas(HeadlessHost::new(1.0));
    canvas.destroy();
    canvas.resolve_capability_probe(true);

    assert!(canvas.host().observers().is_empty());
    assert!(!canvas.is_alive());

    canvas.update(50.0, 50.0);
    canvas.request_repaint();
    assert_eq!(canvas.host().scheduled_frame_count(), 0);
    assert!(paints.borrow().is_empty());
}

#[test]
fn destroy_cancels_in_flight_frame_and_removes_observer() {
    let (mut canvas, paints) = build_canvas(HeadlessHost::new(1.0));
    canvas.resolve_capability_probe(false);
    canvas.update(50.0, 50.0);
    let in_flight = canvas.state().frame.expect("frame requested");

    canvas.destroy();
    canvas.destroy();

    assert_eq!(canvas.host().scheduled_frame_count(), 0);
    assert!(canvas.host().observers().is_empty());
    canvas.on_frame(in_flight);
    assert!(paints.borrow().is_empty());
}

#[test]
fn surface_is_registered_with_host_and_serializes_state() {
    let (canvas, _paints) = build_canvas(HeadlessHost::default());
    assert_eq!(
        canvas.host().surface_ids().to_vec(),
        vec![canvas.surface_id().to_owned()]
    );
    assert!(canvas.surface_id().starts_with("canvas_"));

    let json = serde_json::to_value(canvas.state()).expect("serialize state");
    assert_eq!(json["alive"], true);
    assert_eq!(json["device_ratio_mode"], "ObservedByMediaQuery");
}

#[test]
fn zero_probe_budget_is_rejected() {
    let config = SurfaceConfig {
        probe_frame_budget: 0,
        ..SurfaceConfig::default()
    };
    let result = Canvas::new(
        HeadlessHost::default(),
        config,
        |_: &mut NullContext, _: &SurfaceGeometry| {},
    );
    assert!(result.is_err());
}

#[test]
fn null_context_rejects_invalid_fills() {
    let mut context = NullContext::default();
    let background = Color::rgba(0.0, 0.0, 0.0, 0.5);

    assert!(context
        .fill_rect(&RectPrimitive::covering(LogicalSize::new(10.0, 10.0), background))
        .is_ok());
    assert!(context
        .fill_rect(&RectPrimitive::new(0.0, 0.0, -1.0, 5.0, background))
        .is_err());
    assert!(context
        .fill_rect(&RectPrimitive::new(f64::NAN, 0.0, 1.0, 1.0, background))
        .is_err());
    assert!(context
        .fill_rect(&RectPrimitive::covering(
            LogicalSize::new(1.0, 1.0),
            Color::rgb(1.2, 0.0, 0.0),
        ))
        .is_err());
    assert_eq!(context.rect_count, 1);
}

#[test]
fn probe_budget_counts_only_fired_frames() {
    let (mut canvas, _paints) = build_canvas(HeadlessHost::new(1.0));
    canvas.host_mut().advance(10_000.0);
    assert_eq!(
        canvas.state().probe,
        CapabilityProbe::Pending {
            frames_remaining: 2
        }
    );
    assert!(canvas.host().observers().is_empty());

    canvas.request_repaint();
    fire_frames(&mut canvas);
    assert_eq!(
        canvas.state().probe,
        CapabilityProbe::Pending {
            frames_remaining: 1
        }
    );
}

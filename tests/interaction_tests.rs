//! Integrationstests für die Interaktion über den `DisplayableManager`:
//! - Platzieren und Ziehen in der 3D-Ansicht (mit und ohne Oberflächen-Picker)
//! - Neuaufbau nach Kamera-Änderung
//! - Lightbox-Schichten und Ansichtswechsel

use approx::assert_relative_eq;
use glam::{DVec2, DVec3};
use markups_editor::{
    ActiveComponent, Camera, DisplayableManager, InteractionEvent, LightboxLayout, MarkupsKind,
    MarkupsNode, MarkupsOptions, MouseButton, Representation, SliceView, SurfacePicker, View,
    Viewport, WidgetNotification, WidgetState,
};

/// Oberfläche in der Ebene z = `z`; Display-Pixel werden 1:10 abgebildet.
struct PlanePicker {
    z: f64,
}

impl SurfacePicker for PlanePicker {
    fn pick(&self, display: DVec2) -> Option<DVec3> {
        Some(DVec3::new(display.x / 10.0, display.y / 10.0, self.z))
    }
}

fn view_3d() -> View {
    View::new_3d(
        "View1",
        Camera::looking_at(DVec3::ZERO, 200.0),
        Viewport::new(800.0, 600.0),
    )
}

fn slice_view() -> View {
    View::new_slice(
        "Red",
        SliceView::axial(DVec3::ZERO, 1.0, 1.0),
        Viewport::new(200.0, 200.0),
    )
}

fn node_with_points(id: &str, points: &[[f64; 3]]) -> MarkupsNode {
    let mut node = MarkupsNode::new(id, MarkupsKind::Curve);
    for p in points {
        node.add_control_point(DVec3::from_array(*p));
    }
    node
}

// ─── 3D ──────────────────────────────────────────────────────────────────────

#[test]
fn test_3d_platzieren_auf_oberflaeche() {
    let mut manager = DisplayableManager::new(view_3d(), MarkupsOptions::default());
    manager
        .view_mut()
        .set_surface_picker(Some(Box::new(PlanePicker { z: 5.0 })));
    let mut nodes = vec![MarkupsNode::new("C", MarkupsKind::Curve)];
    assert!(manager.add_node(&mut nodes[0]));
    manager
        .widget_mut(&nodes[0])
        .expect("Widget erwartet")
        .start_placement(&nodes[0]);

    for display in [DVec2::new(100.0, 100.0), DVec2::new(300.0, 200.0)] {
        manager.process_interaction_event(&mut nodes, &InteractionEvent::mouse_move(display));
        manager.process_interaction_event(
            &mut nodes,
            &InteractionEvent::press(MouseButton::Left, display),
        );
    }
    assert_eq!(
        manager.take_notifications(),
        vec![
            ("C".to_string(), WidgetNotification::PointPlaced(0)),
            ("C".to_string(), WidgetNotification::PointPlaced(1)),
        ]
    );
    assert_eq!(nodes[0].nth_position_world(0), Some(DVec3::new(10.0, 10.0, 5.0)));
    assert_eq!(nodes[0].nth_position_world(1), Some(DVec3::new(30.0, 20.0, 5.0)));
}

#[test]
fn test_3d_vorgegebene_weltposition_hat_vorrang() {
    let mut manager = DisplayableManager::new(view_3d(), MarkupsOptions::default());
    let mut nodes = vec![MarkupsNode::new("P", MarkupsKind::PointList)];
    manager.add_node(&mut nodes[0]);
    manager
        .widget_mut(&nodes[0])
        .expect("Widget erwartet")
        .start_placement(&nodes[0]);

    let world = DVec3::new(1.0, 2.0, 3.0);
    let press =
        InteractionEvent::press(MouseButton::Left, DVec2::new(10.0, 10.0)).with_world(world);
    assert!(manager.process_interaction_event(&mut nodes, &press));
    assert_eq!(nodes[0].nth_position_world(0), Some(world));
}

#[test]
fn test_3d_ziehen_behaelt_tiefe() {
    let mut manager = DisplayableManager::new(view_3d(), MarkupsOptions::default());
    let mut nodes = vec![node_with_points("C", &[[0.0, 0.0, 0.0], [20.0, 0.0, 0.0]])];
    manager.add_node(&mut nodes[0]);

    let start = manager.view().world_to_display(DVec3::ZERO).truncate();
    assert_relative_eq!(start.x, 400.0, epsilon = 1e-9);
    assert_relative_eq!(start.y, 300.0, epsilon = 1e-9);

    assert!(manager.process_interaction_event(&mut nodes, &InteractionEvent::mouse_move(start)));
    assert_eq!(
        manager
            .widget(&nodes[0])
            .expect("Widget")
            .representation()
            .active_component(),
        ActiveComponent::ControlPoint(0)
    );
    manager.process_interaction_event(&mut nodes, &InteractionEvent::press(MouseButton::Left, start));
    let target = DVec2::new(450.0, 330.0);
    manager.process_interaction_event(&mut nodes, &InteractionEvent::mouse_move(target));
    manager.process_interaction_event(&mut nodes, &InteractionEvent::release(MouseButton::Left, target));

    let moved = nodes[0].nth_position_world(0).expect("Position");
    assert_relative_eq!(moved.z, 0.0, epsilon = 1e-6);
    let display = manager.view().world_to_display(moved);
    assert_relative_eq!(display.x, target.x, epsilon = 1e-6);
    assert_relative_eq!(display.y, target.y, epsilon = 1e-6);
    assert_eq!(
        manager.widget(&nodes[0]).expect("Widget").state(),
        WidgetState::OnWidget
    );
}

#[test]
fn test_kamera_aenderung_baut_locator_neu() {
    let mut manager = DisplayableManager::new(view_3d(), MarkupsOptions::default());
    let mut node = node_with_points("C", &[[0.0, 0.0, 0.0], [20.0, 0.0, 0.0], [20.0, 20.0, 0.0]]);
    manager.add_node(&mut node);

    manager.build_representation(&mut node).expect("Geometrie");
    let first = manager.view().revision();
    let built = manager
        .widget(&node)
        .expect("Widget")
        .representation()
        .locator()
        .built_view_revision();
    assert_eq!(built, Some(first));

    assert!(manager.view_mut().update_camera(|camera| camera.dolly(2.0)));
    let second = manager.view().revision();
    assert_ne!(first, second);

    let geometry = manager.build_representation(&mut node).expect("Geometrie");
    let rebuilt = manager
        .widget(&node)
        .expect("Widget")
        .representation()
        .locator()
        .built_view_revision();
    assert_eq!(rebuilt, Some(second));
    assert_eq!(geometry.point_display.len(), 3);
}

// ─── 2D ──────────────────────────────────────────────────────────────────────

#[test]
fn test_lightbox_kacheln_sichtbarkeit_und_picking() {
    let slice = SliceView::axial(DVec3::ZERO, 1.0, 1.0).with_lightbox(LightboxLayout::new(2, 2));
    let view = View::new_slice("Red", slice, Viewport::new(200.0, 200.0));
    let mut node = MarkupsNode::new("C", MarkupsKind::Curve);
    let mut rep = Representation::for_node(&node, MarkupsOptions::default());
    rep.add_node_at_world_position(&mut node, DVec3::new(10.0, 20.0, 0.0));
    rep.add_node_at_world_position(&mut node, DVec3::new(10.0, 20.0, 3.2));

    assert!(rep.is_widget_displayable_on_slice(&node, &view));
    let hit = rep.can_interact(
        &node,
        &view,
        DVec2::new(111.0, 20.0),
        DVec3::new(10.0, 20.0, 3.2),
    );
    assert_eq!(hit.component, ActiveComponent::ControlPoint(1));

    rep.add_node_at_world_position(&mut node, DVec3::new(10.0, 20.0, 4.0));
    assert!(!rep.is_widget_displayable_on_slice(&node, &view));
    assert!(!rep.is_point_displayable_on_slice(&node, &view, 2));
}

#[test]
fn test_ansichtswechsel_aendert_darstellbarkeit() {
    let mut manager = DisplayableManager::new(view_3d(), MarkupsOptions::default());
    let mut node = node_with_points("C", &[[10.0, 10.0, 3.0], [30.0, 10.0, 3.0]]);
    manager.add_node(&mut node);
    assert!(manager.is_widget_displayable_on_slice(&node));

    manager.set_view(slice_view());
    assert!(!manager.is_widget_displayable_on_slice(&node));
    assert!(manager.propagate_mrml_to_widget(&mut node));

    manager
        .view_mut()
        .update_slice(|slice| *slice = SliceView::axial(DVec3::new(0.0, 0.0, 3.0), 1.0, 1.0));
    assert!(manager.is_widget_displayable_on_slice(&node));
}

#[test]
fn test_leave_erreicht_alle_widgets() {
    let mut manager = DisplayableManager::new(slice_view(), MarkupsOptions::default());
    let mut nodes = vec![
        MarkupsNode::new("A", MarkupsKind::Curve),
        node_with_points("B", &[[50.0, 50.0, 0.0], [80.0, 50.0, 0.0]]),
    ];
    for node in nodes.iter_mut() {
        manager.add_node(node);
    }
    manager
        .widget_mut(&nodes[0])
        .expect("Widget A")
        .start_placement(&nodes[0]);
    manager.process_interaction_event(&mut nodes, &InteractionEvent::mouse_move(DVec2::new(20.0, 20.0)));
    assert_eq!(nodes[0].len(), 1);

    assert!(manager.process_interaction_event(&mut nodes, &InteractionEvent::leave()));
    assert!(nodes[0].is_empty());
    assert_eq!(
        manager.widget(&nodes[0]).expect("Widget A").state(),
        WidgetState::Idle
    );
    assert_eq!(
        manager.widget(&nodes[1]).expect("Widget B").state(),
        WidgetState::Idle
    );
}

#[test]
fn test_platzierung_hat_vorrang_vor_hover() {
    let mut manager = DisplayableManager::new(slice_view(), MarkupsOptions::default());
    let mut nodes = vec![
        node_with_points("B", &[[50.0, 50.0, 0.0], [80.0, 50.0, 0.0]]),
        MarkupsNode::new("A", MarkupsKind::Curve),
    ];
    for node in nodes.iter_mut() {
        manager.add_node(node);
    }
    manager
        .widget_mut(&nodes[1])
        .expect("Widget A")
        .start_placement(&nodes[1]);

    // Cursor über einem Punkt von B: A platziert trotzdem
    let over_b = DVec2::new(51.0, 50.0);
    manager.process_interaction_event(&mut nodes, &InteractionEvent::mouse_move(over_b));
    manager.process_interaction_event(&mut nodes, &InteractionEvent::press(MouseButton::Left, over_b));
    assert_eq!(nodes[1].len(), 1);
    assert_eq!(nodes[0].len(), 2);
}

#[test]
fn test_viele_punkte_auf_einem_pixel() {
    let mut manager = DisplayableManager::new(view_3d(), MarkupsOptions::default());
    let points: Vec<[f64; 3]> = (0..40).map(|i| [0.0, 0.0, i as f64]).collect();
    let mut nodes = vec![node_with_points("C", &points)];
    manager.add_node(&mut nodes[0]);

    let center = DVec2::new(400.0, 300.0);
    assert!(manager.process_interaction_event(&mut nodes, &InteractionEvent::mouse_move(center)));
    let representation = manager.widget(&nodes[0]).expect("Widget").representation();
    assert_eq!(representation.active_component(), ActiveComponent::ControlPoint(0));
    assert_eq!(representation.locator().len(), 40);
}

use super::*;
use approx::assert_relative_eq;
use glam::DVec2;

use crate::core::MarkupsKind;
use crate::view::{Camera, SliceView, Viewport};

/// Axiale Schicht mit 1 mm/Pixel: Welt (x, y, 0) ↔ Display (x, y).
fn slice_view() -> View {
    View::new_slice(
        "Red",
        SliceView::axial(DVec3::ZERO, 1.0, 1.0),
        Viewport::new(200.0, 200.0),
    )
}

fn view_3d() -> View {
    View::new_3d(
        "3D",
        Camera::looking_at(DVec3::ZERO, 200.0),
        Viewport::new(800.0, 600.0),
    )
}

fn linear() -> Representation {
    Representation::new(InterpolatorKind::Linear, MarkupsOptions::default())
}

fn add_all(rep: &mut Representation, node: &mut MarkupsNode, positions: &[[f64; 3]]) {
    for p in positions {
        rep.add_node_at_world_position(node, DVec3::from_array(*p))
            .expect("Punkt erwartet");
    }
}

fn unit_square(rep: &mut Representation, node: &mut MarkupsNode) {
    add_all(
        rep,
        node,
        &[
            [0.0, 0.0, 0.0],
            [1.0, 0.0, 0.0],
            [1.0, 1.0, 0.0],
            [0.0, 1.0, 0.0],
        ],
    );
}

fn pixel_square(rep: &mut Representation, node: &mut MarkupsNode) {
    add_all(
        rep,
        node,
        &[
            [40.0, 40.0, 0.0],
            [60.0, 40.0, 0.0],
            [60.0, 60.0, 0.0],
            [40.0, 60.0, 0.0],
        ],
    );
}

// ── Linien ──

#[test]
fn open_linear_curve_copies_endpoints() {
    let mut node = MarkupsNode::new("C", MarkupsKind::Curve);
    let mut rep = linear();
    unit_square(&mut rep, &mut node);

    let points = node.control_points();
    for i in 0..3 {
        assert_eq!(
            points[i].intermediate_positions,
            vec![points[i].position, points[i + 1].position],
            "Punkt {i}"
        );
    }
    assert!(points[3].intermediate_positions.is_empty());
}

#[test]
fn closing_adds_wrap_segment_and_centroid() {
    let mut node = MarkupsNode::new("C", MarkupsKind::Curve);
    let mut rep = linear();
    unit_square(&mut rep, &mut node);

    assert!(rep.set_closed_loop(&mut node, true));
    assert!(!rep.set_closed_loop(&mut node, true));
    let points = node.control_points();
    assert_eq!(
        points[3].intermediate_positions,
        vec![points[3].position, points[0].position]
    );

    let centroid = rep.update_centroid(&mut node).expect("Schwerpunkt");
    assert_relative_eq!(centroid.x, 0.5);
    assert_relative_eq!(centroid.y, 0.5);
    assert_relative_eq!(centroid.z, 0.0);
    assert_eq!(node.centroid(), centroid);

    // Wieder öffnen: letzter Punkt verliert sein Segment
    assert!(rep.set_closed_loop(&mut node, false));
    assert!(node.control_points()[3].intermediate_positions.is_empty());
}

#[test]
fn closed_loop_delete_first_keeps_wrap_span() {
    let mut node = MarkupsNode::new("CC", MarkupsKind::ClosedCurve);
    let mut rep = linear();
    unit_square(&mut rep, &mut node);
    let before = node.len();

    assert!(rep.delete_nth_node(&mut node, 0));
    let count = node.len();
    assert_eq!(count, before - 1);
    let span = rep.interpolator().span(0, true, count);
    assert!(span.contains(&(before - 2, 0)));

    // Wrap-Segment wurde mit den neuen Nachbarn neu berechnet
    let points = node.control_points();
    assert_eq!(
        points[count - 1].intermediate_positions,
        vec![points[count - 1].position, points[0].position]
    );
}

#[test]
fn deleting_tail_of_open_curve_clears_new_tail() {
    let mut node = MarkupsNode::new("C", MarkupsKind::Curve);
    let mut rep = linear();
    unit_square(&mut rep, &mut node);
    assert!(rep.delete_last_node(&mut node));
    assert_eq!(node.len(), 3);
    assert!(node.control_points()[2].intermediate_positions.is_empty());
}

#[test]
fn build_representation_is_idempotent() {
    let mut node = MarkupsNode::new("CC", MarkupsKind::ClosedCurve);
    let mut rep = Representation::for_node(&node, MarkupsOptions::default());
    assert_eq!(rep.interpolator().kind(), InterpolatorKind::Bezier);
    add_all(
        &mut rep,
        &mut node,
        &[
            [0.0, 0.0, 0.0],
            [30.0, 5.0, 0.0],
            [25.0, 30.0, 10.0],
            [-5.0, 20.0, 0.0],
        ],
    );
    node.set_nth_label(1, "B");
    let view = view_3d();

    let first = rep.build_representation(&mut node, &view).clone();
    let second = rep.build_representation(&mut node, &view).clone();
    assert_eq!(first, second);

    assert!(first.line_world.len() > node.len());
    assert_eq!(first.line_world.first(), first.line_world.last());
    assert_eq!(first.visible_points, vec![0, 1, 2, 3]);
    assert_eq!(first.label_positions.len(), 1);
    assert_eq!(first.label_positions[0].index, 1);
    assert!(first.centroid.is_some());
}

#[test]
fn camera_change_refreshes_locator_without_interpolating() {
    let mut node = MarkupsNode::new("C", MarkupsKind::Curve);
    let mut rep = linear();
    pixel_square(&mut rep, &mut node);
    let mut view = view_3d();
    assert!(rep.update_widget(&mut node, &view, false));
    let interpolated = node.control_points()[0].intermediate_positions.clone();
    assert!(!interpolated.is_empty());

    // Markierung: wird nur durch eine erneute Interpolation überschrieben
    node.control_points_mut()[0].clear_intermediate_positions();
    assert!(view.update_camera(|camera| camera.dolly(2.0)));

    assert!(rep.update_widget(&mut node, &view, false));
    assert!(node.control_points()[0].intermediate_positions.is_empty());
    assert_eq!(rep.locator().built_view_revision(), Some(view.revision()));
    assert!(!rep.update_widget(&mut node, &view, false));

    assert!(rep.update_widget(&mut node, &view, true));
    assert_eq!(node.control_points()[0].intermediate_positions, interpolated);
}

#[test]
fn point_list_has_no_line() {
    let mut node = MarkupsNode::new("P", MarkupsKind::PointList);
    let mut rep = linear();
    unit_square(&mut rep, &mut node);
    let geometry = rep.build_representation(&mut node, &view_3d());
    assert!(geometry.line_world.is_empty());
    assert_eq!(geometry.point_display.len(), 4);
}

// ── Editieren ──

#[test]
fn locked_point_rejects_world_position() {
    let mut node = MarkupsNode::new("C", MarkupsKind::Curve);
    let mut rep = linear();
    unit_square(&mut rep, &mut node);
    node.set_nth_locked(1, true);

    let before = node.nth_position_world(1);
    assert!(!rep.set_nth_node_world_position(&mut node, 1, DVec3::new(5.0, 5.0, 5.0)));
    assert_eq!(node.nth_position_world(1), before);

    assert!(rep.set_nth_node_world_position(&mut node, 2, DVec3::new(2.0, 2.0, 0.0)));
    assert!(!rep.set_nth_node_world_position(&mut node, 9, DVec3::ZERO));
}

#[test]
fn locked_node_rejects_adding() {
    let mut node = MarkupsNode::new("C", MarkupsKind::Curve);
    node.set_locked(true);
    let mut rep = linear();
    assert!(rep.add_node_at_world_position(&mut node, DVec3::ZERO).is_none());
    assert!(!rep.clear_all_nodes(&mut node));
}

#[test]
fn add_at_display_lands_on_slice() {
    let view = slice_view();
    let mut node = MarkupsNode::new("C", MarkupsKind::Curve);
    let mut rep = linear();
    let index = rep
        .add_node_at_display_position(&mut node, &view, DVec2::new(25.0, 75.0))
        .expect("Punkt erwartet");
    let world = node.nth_position_world(index).expect("Position");
    assert_relative_eq!(world.x, 25.0, epsilon = 1e-9);
    assert_relative_eq!(world.y, 75.0, epsilon = 1e-9);
    assert_relative_eq!(world.z, 0.0, epsilon = 1e-9);
}

#[test]
fn delete_revalidates_active_component() {
    let view = slice_view();
    let mut node = MarkupsNode::new("C", MarkupsKind::Curve);
    let mut rep = linear();
    pixel_square(&mut rep, &mut node);

    rep.set_active_component(&node, ActiveComponent::ControlPoint(3));
    assert!(rep.delete_nth_node(&mut node, 1));
    assert_eq!(rep.active_component(), ActiveComponent::ControlPoint(2));

    assert_eq!(
        rep.activate_node(&node, &view, DVec2::new(60.0, 61.0)),
        ActiveComponent::ControlPoint(1)
    );
    assert!(rep.delete_active_node(&mut node));
    assert_eq!(rep.active_component(), ActiveComponent::None);
    assert!(!rep.delete_active_node(&mut node));

    rep.set_active_component(&node, ActiveComponent::ControlPoint(7));
    assert_eq!(rep.active_component(), ActiveComponent::None);
}

// ── Picking ──

#[test]
fn can_interact_prefers_closest_point() {
    let view = slice_view();
    let mut node = MarkupsNode::new("C", MarkupsKind::Curve);
    let mut rep = linear();
    pixel_square(&mut rep, &mut node);
    let tolerance = rep.pixel_tolerance(&view);
    assert_relative_eq!(tolerance, 3.0 * 1.4, epsilon = 1e-9);

    let hit = rep.can_interact(&node, &view, DVec2::new(59.0, 41.0), DVec3::new(59.0, 41.0, 0.0));
    assert_eq!(hit.component, ActiveComponent::ControlPoint(1));
    assert_relative_eq!(hit.distance2, 2.0, epsilon = 1e-9);

    let line = rep.can_interact(&node, &view, DVec2::new(50.0, 42.0), DVec3::new(50.0, 42.0, 0.0));
    assert_eq!(line.component, ActiveComponent::Line(0));

    let miss = rep.can_interact(&node, &view, DVec2::new(50.0, 50.0), DVec3::new(50.0, 50.0, 0.0));
    assert!(!miss.is_hit());

    node.set_locked(true);
    let locked = rep.can_interact(&node, &view, DVec2::new(60.0, 40.0), DVec3::new(60.0, 40.0, 0.0));
    assert!(!locked.is_hit());
}

#[test]
fn centroid_is_interactable_only_when_closed() {
    let view = slice_view();
    let mut node = MarkupsNode::new("C", MarkupsKind::Curve);
    let mut rep = linear();
    pixel_square(&mut rep, &mut node);
    rep.update_centroid(&mut node);
    let center = DVec2::new(50.0, 50.0);

    assert!(!rep.can_interact(&node, &view, center, center.extend(0.0)).is_hit());
    rep.set_closed_loop(&mut node, true);
    let hit = rep.can_interact(&node, &view, center, center.extend(0.0));
    assert_eq!(hit.component, ActiveComponent::Centroid);
    assert_eq!(rep.activate_node(&node, &view, center), ActiveComponent::Centroid);
}

#[test]
fn hidden_and_off_slice_points_are_not_picked() {
    let view = slice_view();
    let mut node = MarkupsNode::new("P", MarkupsKind::PointList);
    let mut rep = linear();
    add_all(&mut rep, &mut node, &[[10.0, 10.0, 0.0], [30.0, 10.0, 3.0]]);
    node.set_nth_visible(0, false);

    let hidden = rep.can_interact(&node, &view, DVec2::new(10.0, 10.0), DVec3::new(10.0, 10.0, 0.0));
    assert!(!hidden.is_hit());
    let off_slice = rep.can_interact(&node, &view, DVec2::new(30.0, 10.0), DVec3::new(30.0, 10.0, 0.0));
    assert!(!off_slice.is_hit());
}

#[test]
fn line_hit_in_3d_uses_world_tolerance() {
    let view = view_3d();
    let mut node = MarkupsNode::new("L", MarkupsKind::Line);
    let mut rep = linear();
    add_all(&mut rep, &mut node, &[[-40.0, 0.0, 0.0], [40.0, 0.0, 0.0]]);

    let display = view.world_to_display(DVec3::new(0.0, 2.0, 0.0)).truncate();
    let hit = rep
        .can_interact_with_line(&node, &view, display, DVec3::new(0.0, 2.0, 0.0))
        .expect("Linien-Treffer erwartet");
    assert_eq!(hit.component, ActiveComponent::Line(0));
    assert_relative_eq!(hit.distance2, 4.0, epsilon = 1e-9);

    assert!(rep
        .can_interact_with_line(&node, &view, display, DVec3::new(0.0, 5.0, 0.0))
        .is_none());
}

#[test]
fn closest_point_on_widget_gives_insert_index() {
    let view = slice_view();
    let mut node = MarkupsNode::new("C", MarkupsKind::Curve);
    let mut rep = linear();
    pixel_square(&mut rep, &mut node);

    let (world, index) = rep
        .find_closest_point_on_widget(&node, &view, DVec2::new(61.0, 50.0))
        .expect("Treffer erwartet");
    assert_eq!(index, 2);
    assert_relative_eq!(world.x, 60.0, epsilon = 1e-6);
    assert_relative_eq!(world.y, 50.0, epsilon = 1e-6);

    assert!(rep
        .find_closest_point_on_widget(&node, &view, DVec2::new(40.0, 50.0))
        .is_none());

    rep.set_closed_loop(&mut node, true);
    let (_, wrap_index) = rep
        .find_closest_point_on_widget(&node, &view, DVec2::new(40.0, 50.0))
        .expect("Treffer auf Wrap-Segment");
    assert_eq!(wrap_index, node.len());
}

#[test]
fn add_node_on_widget_inserts_between_neighbours() {
    let view = slice_view();
    let mut node = MarkupsNode::new("C", MarkupsKind::Curve);
    let mut rep = linear();
    pixel_square(&mut rep, &mut node);

    let index = rep
        .add_node_on_widget(&mut node, &view, DVec2::new(50.0, 39.0))
        .expect("Einfügen erwartet");
    assert_eq!(index, 1);
    assert_eq!(node.len(), 5);
    let inserted = node.nth_position_world(1).expect("Position");
    assert_relative_eq!(inserted.x, 50.0, epsilon = 1e-6);
    assert_relative_eq!(inserted.y, 40.0, epsilon = 1e-6);
    let points = node.control_points();
    assert_eq!(
        points[0].intermediate_positions,
        vec![points[0].position, points[1].position]
    );
    assert_eq!(
        points[1].intermediate_positions,
        vec![points[1].position, points[2].position]
    );
}

#[test]
fn closest_point_in_3d_follows_pick_ray() {
    let view = view_3d();
    let mut node = MarkupsNode::new("C", MarkupsKind::Curve);
    let mut rep = linear();
    add_all(&mut rep, &mut node, &[[-20.0, 0.0, 0.0], [20.0, 0.0, 0.0], [20.0, 20.0, 0.0]]);

    let display = view.world_to_display(DVec3::new(5.0, 0.0, 0.0)).truncate();
    let (world, index) = rep
        .find_closest_point_on_widget(&node, &view, display)
        .expect("Treffer erwartet");
    assert_eq!(index, 1);
    assert_relative_eq!(world.x, 5.0, epsilon = 1e-4);
    assert_relative_eq!(world.y, 0.0, epsilon = 1e-4);
}

// ── Sichtbarkeit ──

#[test]
fn widget_on_slice_requires_all_points_within_tolerance() {
    let view = slice_view();
    let mut node = MarkupsNode::new("C", MarkupsKind::Curve);
    let mut rep = linear();
    pixel_square(&mut rep, &mut node);
    assert!(rep.is_widget_displayable_on_slice(&node, &view));
    assert!(rep.is_point_displayable_on_slice(&node, &view, 0));

    rep.set_nth_node_world_position(&mut node, 2, DVec3::new(60.0, 60.0, 4.0));
    assert!(!rep.is_widget_displayable_on_slice(&node, &view));
    assert!(!rep.is_point_displayable_on_slice(&node, &view, 2));

    let display_id = node.display_nodes()[0].id.clone();
    node.modify_display_node(&display_id, |d| d.view_node_ids = vec!["Yellow".into()]);
    assert!(!rep.is_widget_displayable_on_slice(&node, &view_3d()));
}

#[test]
fn widget_outside_viewport_is_not_displayable() {
    let view = slice_view();
    let mut node = MarkupsNode::new("C", MarkupsKind::Curve);
    let mut rep = linear();
    add_all(&mut rep, &mut node, &[[-50.0, 10.0, 0.0], [-20.0, 10.0, 0.0]]);
    assert!(!rep.is_widget_displayable_on_slice(&node, &view));
    assert!(rep.is_widget_displayable_on_slice(&node, &view_3d()));
}

// ── Transformationen ──

#[test]
fn translate_widget_moves_points_and_centroid() {
    let mut node = MarkupsNode::new("C", MarkupsKind::Curve);
    let mut rep = linear();
    add_all(
        &mut rep,
        &mut node,
        &[[0.0, 0.0, 0.0], [2.0, 0.0, 0.0], [1.0, 3.0, 0.0]],
    );
    let before = node.positions_world();
    let centroid_before = rep.update_centroid(&mut node).expect("Schwerpunkt");

    assert!(rep.translate_widget(&mut node, DVec3::new(1.0, 0.0, 0.0)));
    for (old, new) in before.iter().zip(node.positions_world()) {
        assert_eq!(new, *old + DVec3::X);
    }
    let centroid_after = node.centroid();
    assert_relative_eq!(centroid_after.x, centroid_before.x + 1.0, epsilon = 1e-12);
    assert_relative_eq!(centroid_after.y, centroid_before.y, epsilon = 1e-12);
}

#[test]
fn locked_points_survive_all_transforms() {
    let view = slice_view();
    let mut node = MarkupsNode::new("C", MarkupsKind::Curve);
    let mut rep = linear();
    pixel_square(&mut rep, &mut node);
    node.set_nth_locked(0, true);
    node.set_nth_locked(2, true);
    let locked_before = [node.nth_position_world(0), node.nth_position_world(2)];
    let reference = DVec3::new(50.0, 50.0, 0.0);

    assert!(rep.translate_widget(&mut node, DVec3::new(3.0, -1.0, 0.0)));
    assert!(rep.scale_widget(&mut node, reference, DVec3::new(60.0, 50.0, 0.0), DVec3::new(70.0, 50.0, 0.0)));
    assert!(rep.rotate_widget(
        &mut node,
        &view,
        reference,
        DVec3::new(60.0, 50.0, 0.0),
        DVec3::new(50.0, 60.0, 0.0)
    ));

    assert_eq!(
        [node.nth_position_world(0), node.nth_position_world(2)],
        locked_before
    );
    assert_ne!(node.nth_position_world(1), Some(DVec3::new(60.0, 40.0, 0.0)));
}

#[test]
fn scale_doubles_offsets_and_skips_degenerate_start() {
    let mut node = MarkupsNode::new("C", MarkupsKind::Curve);
    let mut rep = linear();
    add_all(&mut rep, &mut node, &[[1.0, 0.0, 0.0], [-1.0, 0.0, 0.0]]);
    let reference = DVec3::ZERO;

    assert!(rep.scale_widget(&mut node, reference, DVec3::new(0.0, 1.0, 0.0), DVec3::new(0.0, 2.0, 0.0)));
    assert_eq!(node.nth_position_world(0), Some(DVec3::new(2.0, 0.0, 0.0)));
    assert_eq!(node.nth_position_world(1), Some(DVec3::new(-2.0, 0.0, 0.0)));

    assert!(!rep.scale_widget(&mut node, reference, DVec3::new(1e-9, 0.0, 0.0), DVec3::ONE));
    assert_eq!(node.nth_position_world(0), Some(DVec3::new(2.0, 0.0, 0.0)));
}

#[test]
fn rotate_quarter_turn_about_view_normal() {
    let view = slice_view();
    let mut node = MarkupsNode::new("C", MarkupsKind::Curve);
    let mut rep = linear();
    add_all(&mut rep, &mut node, &[[60.0, 50.0, 0.0], [50.0, 50.0, 0.0]]);
    let reference = DVec3::new(50.0, 50.0, 0.0);

    assert!(rep.rotate_widget(
        &mut node,
        &view,
        reference,
        DVec3::new(60.0, 50.0, 0.0),
        DVec3::new(50.0, 60.0, 0.0)
    ));
    let rotated = node.nth_position_world(0).expect("Position");
    assert_relative_eq!(rotated.x, 50.0, epsilon = 1e-9);
    assert_relative_eq!(rotated.y, 60.0, epsilon = 1e-9);

    // Drehung im Uhrzeigersinn hat negatives Vorzeichen
    assert!(rep.rotate_widget(
        &mut node,
        &view,
        reference,
        DVec3::new(50.0, 60.0, 0.0),
        DVec3::new(60.0, 50.0, 0.0)
    ));
    let back = node.nth_position_world(0).expect("Position");
    assert_relative_eq!(back.x, 60.0, epsilon = 1e-9);
    assert_relative_eq!(back.y, 50.0, epsilon = 1e-9);

    assert!(!rep.rotate_widget(&mut node, &view, reference, reference, DVec3::new(60.0, 50.0, 0.0)));
}

#[test]
fn translate_node_respects_axis_restriction() {
    let view = slice_view();
    let mut node = MarkupsNode::new("C", MarkupsKind::Curve);
    let mut rep = linear();
    pixel_square(&mut rep, &mut node);

    assert_eq!(rep.toggle_axis_restriction(AxisRestriction::X), AxisRestriction::X);
    assert!(rep.translate_node(&mut node, &view, 0, DVec2::new(45.0, 47.0)));
    assert_eq!(node.nth_position_world(0), Some(DVec3::new(45.0, 40.0, 0.0)));

    assert_eq!(rep.toggle_axis_restriction(AxisRestriction::X), AxisRestriction::None);
    assert!(rep.translate_node(&mut node, &view, 0, DVec2::new(30.0, 35.0)));
    assert_eq!(node.nth_position_world(0), Some(DVec3::new(30.0, 35.0, 0.0)));

    node.set_nth_locked(0, true);
    assert!(!rep.translate_node(&mut node, &view, 0, DVec2::new(10.0, 10.0)));
}

#[test]
fn translate_node_is_clamped_to_viewport() {
    let view = slice_view();
    let mut node = MarkupsNode::new("C", MarkupsKind::Curve);
    let mut rep = linear();
    pixel_square(&mut rep, &mut node);

    assert!(rep.translate_node(&mut node, &view, 1, DVec2::new(500.0, 50.0)));
    let moved = node.nth_position_world(1).expect("Position");
    assert_relative_eq!(moved.x, 199.8, epsilon = 1e-9);
    assert_relative_eq!(moved.y, 50.0, epsilon = 1e-9);
}

// ── Render-Flag ──

#[test]
fn render_flag_set_by_active_component_change() {
    let mut node = MarkupsNode::new("C", MarkupsKind::Curve);
    let mut rep = linear();
    pixel_square(&mut rep, &mut node);
    rep.take_need_to_render();
    assert!(!rep.take_need_to_render());

    rep.set_active_component(&node, ActiveComponent::ControlPoint(1));
    assert!(rep.need_to_render());
    assert!(rep.take_need_to_render());

    // Gleiche Komponente erneut: kein neues Zeichnen
    rep.set_active_component(&node, ActiveComponent::ControlPoint(1));
    assert!(!rep.need_to_render());
}

//! End-to-end checks across the stage, containers, and events.

use veduta::layout::{add_to, remove_from};
use veduta::prelude::*;

fn frame_of(stage: &Stage, id: EntityId) -> Rect {
    stage.try_core(id).unwrap().frame()
}

fn plain_rect(stage: &mut Stage, w: f32, h: f32) -> EntityId {
    stage.register(PaintedShape::rectangle(w, h))
}

#[test]
fn row_reflows_when_scene_resizes_it() {
    let mut stage = Stage::new();
    let scene = stage.register(Scene::new(200.0, 40.0));
    let row = stage.register(BoxLayout::horizontal().sized(90.0, 30.0));
    stage.set_parent(row, scene).unwrap();
    let a = plain_rect(&mut stage, 1.0, 1.0);
    let b = plain_rect(&mut stage, 1.0, 1.0);
    let c = plain_rect(&mut stage, 1.0, 1.0);
    for child in [a, b, c] {
        add_to(&mut stage, row, child).unwrap();
    }
    assert_eq!(frame_of(&stage, a).width, 30.0);
    assert_eq!(frame_of(&stage, c).x, 60.0);

    stage.set_size(row, 60.0, 30.0);
    assert_eq!(frame_of(&stage, a).width, 20.0);
    assert_eq!(frame_of(&stage, c).x, 40.0);
    // The reflow surfaced on the scene.
    assert!(!stage.is_clean(scene));
}

#[test]
fn frame_inside_row_tracks_its_child() {
    let mut stage = Stage::new();
    let frame = stage.register(Frame::new().with_uniform_margin(5.0));
    let inner = plain_rect(&mut stage, 20.0, 10.0);
    add_to(&mut stage, frame, inner).unwrap();
    assert_eq!(frame_of(&stage, frame).size(), Size::new(30.0, 20.0));

    stage.set_size(inner, 40.0, 10.0);
    assert_eq!(frame_of(&stage, frame).size(), Size::new(50.0, 20.0));

    remove_from(&mut stage, frame, inner).unwrap();
    assert_eq!(stage.child_count(frame), 0);
}

#[test]
fn grid_places_and_reports_slots() {
    let mut stage = Stage::new();
    let grid = stage.register(Grid::new(3, 2, 20.0, 20.0).with_padding(4.0));
    let tile = plain_rect(&mut stage, 1.0, 1.0);
    stage.set_parent(tile, grid).unwrap();
    stage
        .with_typed_mut::<Grid, _>(grid, |stage, g| g.set_child(stage, grid, 2, 1, tile))
        .unwrap()
        .unwrap();

    let frame = frame_of(&stage, tile);
    assert_eq!((frame.x, frame.y), (48.0, 24.0));

    stage
        .with_typed_mut::<Grid, _>(grid, |_, g| {
            assert_eq!(g.slot_of(tile), Some((2, 1)));
            assert_eq!(g.child_at(2, 1), Some(tile));
            assert_eq!(g.slot_at(50.0, 30.0), Some((2, 1)));
            // Points in the padding gap belong to no slot.
            assert_eq!(g.slot_at(21.0, 10.0), None);
        })
        .unwrap();
}

#[test]
fn freeze_batches_updates_for_the_scene() {
    let mut stage = Stage::new();
    let scene = stage.register(Scene::new(100.0, 100.0));
    let child = plain_rect(&mut stage, 10.0, 10.0);
    stage.set_parent(child, scene).unwrap();
    stage.mark_drawn(scene);
    stage.mark_drawn(child);

    stage.freeze(child);
    stage.set_position(child, 30.0, 30.0);
    stage.set_alpha(child, 0.5);
    // Nothing surfaced yet, on the child or the scene.
    assert!(stage.dirtied(child).is_empty());
    assert!(stage.is_clean(scene));

    stage.unfreeze(child);
    assert_eq!(
        stage.dirtied(child),
        Dirty::POSITION | Dirty::VISIBILITY
    );
    assert!(!stage.is_clean(scene));
    // The mutation itself was never deferred.
    assert_eq!(frame_of(&stage, child).x, 30.0);
}

#[test]
fn hit_chain_respects_child_transforms() {
    let mut stage = Stage::new();
    let root = stage.register(Scene::new(100.0, 100.0));
    let child = plain_rect(&mut stage, 10.0, 10.0);
    stage.set_parent(child, root).unwrap();
    stage.set_scale(child, 2.0, 2.0);

    // (15, 15) in root space is (7.5, 7.5) locally, inside the 10x10 frame.
    let chain = stage.hit_chain(root, 15.0, 15.0);
    assert_eq!(chain.first().map(|(id, _, _)| *id), Some(child));
    let (_, lx, ly) = chain[0];
    assert_eq!((lx, ly), (7.5, 7.5));

    // The doubled extent reaches 20; past it the root takes the hit.
    assert_eq!(
        stage.hit_chain(root, 19.0, 19.0).first().map(|(id, _, _)| *id),
        Some(child)
    );
    assert_eq!(
        stage.hit_chain(root, 25.0, 25.0).first().map(|(id, _, _)| *id),
        Some(root)
    );
}

#[test]
fn removing_subtree_invalidates_handles() {
    let mut stage = Stage::new();
    let scene = stage.register(Scene::new(50.0, 50.0));
    let row = stage.register(StackLayout::horizontal());
    let leaf = plain_rect(&mut stage, 5.0, 5.0);
    stage.set_parent(row, scene).unwrap();
    add_to(&mut stage, row, leaf).unwrap();

    stage.remove(row).unwrap();
    assert!(!stage.contains(row));
    assert!(!stage.contains(leaf));
    assert_eq!(stage.child_count(scene), 0);
    assert!(stage.take_structure_changed(scene));
}

#[test]
fn value_types_survive_json() {
    let rect = Rect::new(1.5, -2.0, 30.0, 40.5);
    let json = serde_json::to_string(&rect).unwrap();
    assert_eq!(serde_json::from_str::<Rect>(&json).unwrap(), rect);

    let point = Point::new(-3.5, 7.25);
    let json = serde_json::to_string(&point).unwrap();
    assert_eq!(serde_json::from_str::<Point>(&json).unwrap(), point);

    let color = Color::rgba(0.2, 0.4, 0.6, 0.8);
    let json = serde_json::to_string(&color).unwrap();
    assert_eq!(serde_json::from_str::<Color>(&json).unwrap(), color);

    let circle = Shape::circle(12.0, 8.0, 6.5);
    let json = serde_json::to_string(&circle).unwrap();
    assert_eq!(serde_json::from_str::<Shape>(&json).unwrap(), circle);

    let shape = Shape::polygon(vec![
        Point::new(0.0, 0.0),
        Point::new(10.0, 0.0),
        Point::new(5.0, 8.0),
    ]);
    let json = serde_json::to_string(&shape).unwrap();
    assert_eq!(serde_json::from_str::<Shape>(&json).unwrap(), shape);

    let brush = Brush::gradient(Gradient::linear(
        Point::new(0.0, 0.0),
        Point::new(0.0, 10.0),
        Color::RED,
        Color::BLUE,
    ))
    .with_stroke(Color::BLACK, 2.0);
    let json = serde_json::to_string(&brush).unwrap();
    assert_eq!(serde_json::from_str::<Brush>(&json).unwrap(), brush);

    let policy = SizePolicy::weighted(2.5);
    let json = serde_json::to_string(&policy).unwrap();
    assert_eq!(serde_json::from_str::<SizePolicy>(&json).unwrap(), policy);
}

#[test]
fn named_lookup_reaches_nested_entities() {
    let mut stage = Stage::new();
    let scene = stage.register(Scene::new(100.0, 100.0));
    let row = stage.register(BoxLayout::horizontal().sized(60.0, 20.0));
    let badge = stage.register(PaintedShape::rectangle(10.0, 10.0).named("badge"));
    stage.set_parent(row, scene).unwrap();
    add_to(&mut stage, row, badge).unwrap();
    assert_eq!(stage.find("badge"), Some(badge));
}

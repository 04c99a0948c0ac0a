use bevy_app::{App, Update};
use bevy_ecs::prelude::{EventReader, ResMut, Resource};
use bevy_ecs::schedule::IntoScheduleConfigs;
use navwalk::{
    NavGeometry, NavigatorConfig, NavigatorState, PointerButton, PointerOutcome, PointerUp, Vec2,
    Vec3,
};
use navwalk_bevy::{
    NavFrameDt, NavPlayerPosition, NavPointerDown, NavPointerHandled, NavPointerUp,
    NavTerrainUpdated, NavWalkEvent, NavwalkPlugin, NavwalkRuntime, NavwalkSet,
};

#[derive(Resource, Default)]
struct Seen {
    walk: Vec<NavWalkEvent>,
    handled: Vec<PointerOutcome>,
}

fn collect(
    mut seen: ResMut<Seen>,
    mut walk: EventReader<NavWalkEvent>,
    mut handled: EventReader<NavPointerHandled>,
) {
    seen.walk.extend(walk.read().copied());
    seen.handled.extend(handled.read().map(|h| h.0.clone()));
}

fn square(size: f32) -> NavGeometry {
    NavGeometry::from_triangles([
        [
            Vec3::new(0.0, 0.0, 0.0),
            Vec3::new(size, 0.0, 0.0),
            Vec3::new(size, 0.0, size),
        ],
        [
            Vec3::new(0.0, 0.0, 0.0),
            Vec3::new(size, 0.0, size),
            Vec3::new(0.0, 0.0, size),
        ],
    ])
}

const SPAWN: Vec3 = Vec3::new(2.0, 0.0, 1.0);

fn app() -> App {
    let mut app = App::new();
    app.add_plugins(NavwalkPlugin::new(
        NavigatorConfig::default().with_spawn(SPAWN),
    ));
    app.insert_resource(NavFrameDt { dt_seconds: 0.1 });
    app.init_resource::<Seen>();
    app.add_systems(Update, collect.after(NavwalkSet::Output));
    app
}

fn take_walk_events(app: &mut App) -> Vec<NavWalkEvent> {
    std::mem::take(&mut app.world_mut().resource_mut::<Seen>().walk)
}

fn click(app: &mut App, event: PointerUp) {
    app.world_mut().send_event(NavPointerDown {
        screen: event.screen,
    });
    app.world_mut().send_event(NavPointerUp(event));
}

fn state(app: &App) -> NavigatorState {
    app.world()
        .get_non_send_resource::<NavwalkRuntime>()
        .expect("runtime inserted by plugin")
        .navigator()
        .state()
}

#[test]
fn terrain_event_places_player_at_spawn() {
    let mut app = app();
    app.update();
    assert_eq!(state(&app), NavigatorState::Unplaced);
    assert_eq!(
        *app.world().resource::<NavPlayerPosition>(),
        NavPlayerPosition::default()
    );

    app.world_mut().send_event(NavTerrainUpdated(square(10.0)));
    app.update();

    let player = *app.world().resource::<NavPlayerPosition>();
    assert_eq!(player.position, SPAWN);
    assert_eq!(player.state, NavigatorState::Idle);
    assert_eq!(take_walk_events(&mut app), vec![NavWalkEvent::Moved(SPAWN)]);
}

#[test]
fn click_walks_the_player_frame_by_frame() {
    let mut app = app();
    app.world_mut().send_event(NavTerrainUpdated(square(10.0)));
    app.update();
    take_walk_events(&mut app);

    let target = Vec3::new(7.0, 0.0, 1.0);
    click(&mut app, PointerUp::click(Vec2::new(0.2, 0.1), target));
    app.update();

    assert_eq!(
        app.world().resource::<Seen>().handled,
        vec![PointerOutcome::Walking { waypoints: 1 }]
    );
    assert_eq!(
        take_walk_events(&mut app),
        vec![
            NavWalkEvent::Moved(Vec3::new(4.0, 0.0, 1.0)),
            NavWalkEvent::Started(target),
        ]
    );
    let player = *app.world().resource::<NavPlayerPosition>();
    assert_eq!(player.position, Vec3::new(4.0, 0.0, 1.0));
    assert_eq!(player.state, NavigatorState::Walking);

    for _ in 0..3 {
        app.update();
    }

    assert_eq!(
        take_walk_events(&mut app),
        vec![
            NavWalkEvent::Moved(Vec3::new(6.0, 0.0, 1.0)),
            NavWalkEvent::Stopped,
        ]
    );
    let player = *app.world().resource::<NavPlayerPosition>();
    assert_eq!(player.position, Vec3::new(6.0, 0.0, 1.0));
    assert_eq!(player.state, NavigatorState::Idle);
}

#[test]
fn dragged_release_does_not_move_the_player() {
    let mut app = app();
    app.world_mut().send_event(NavTerrainUpdated(square(10.0)));
    app.update();
    take_walk_events(&mut app);

    app.world_mut().send_event(NavPointerDown {
        screen: Vec2::new(0.0, 0.0),
    });
    app.world_mut().send_event(NavPointerUp(PointerUp::click(
        Vec2::new(0.3, 0.0),
        Vec3::new(7.0, 0.0, 1.0),
    )));
    app.update();
    app.update();

    assert!(take_walk_events(&mut app).is_empty());
    assert_eq!(app.world().resource::<NavPlayerPosition>().position, SPAWN);
    assert_eq!(state(&app), NavigatorState::Idle);
}

#[test]
fn secondary_click_teleports() {
    let mut app = app();
    app.world_mut().send_event(NavTerrainUpdated(square(10.0)));
    app.update();
    take_walk_events(&mut app);

    let point = Vec3::new(8.0, 0.0, 8.0);
    click(
        &mut app,
        PointerUp::click(Vec2::ZERO, point).with_button(PointerButton::Secondary),
    );
    app.update();

    assert_eq!(
        take_walk_events(&mut app),
        vec![NavWalkEvent::Moved(point), NavWalkEvent::Stopped]
    );
    let player = *app.world().resource::<NavPlayerPosition>();
    assert_eq!(player.position, point);
    assert_eq!(player.state, NavigatorState::Idle);
}

#[test]
fn malformed_terrain_is_rejected_without_panicking() {
    let mut app = app();
    app.world_mut()
        .send_event(NavTerrainUpdated(NavGeometry::new(vec![Vec3::ZERO; 2])));
    app.update();

    assert_eq!(state(&app), NavigatorState::Unplaced);
    assert!(take_walk_events(&mut app).is_empty());
}

//! Bevy adapter for `navwalk`.
//!
//! The host forwards pointer gestures and terrain loads as events; the plugin
//! drives a single [`Navigator`] once per frame and reports movement back as
//! [`NavWalkEvent`]s plus the [`NavPlayerPosition`] resource.
//!
//! The navigator is stored as a non-send resource ([`NavwalkRuntime`]) because
//! its walk callbacks are plain `FnMut` closures without `Send` bounds.
//!
//! ## Scheduling
//!
//! Systems run in [`bevy_app::Update`] by default, in the chained sets
//! [`NavwalkSet::Input`], [`NavwalkSet::Step`] and [`NavwalkSet::Output`]. Use
//! [`NavwalkPlugin::in_fixed_update`] when the fixed timestep loop is driven by
//! Bevy's time plugins.
//!
//! ## Features
//!
//! - `time`: if Bevy's `bevy_time::Time` resource is present, [`NavFrameDt`] is
//!   updated from `Time::delta_secs()` each frame.

#![cfg_attr(docsrs, feature(doc_cfg))]
#![forbid(unsafe_code)]

use std::cell::RefCell;
use std::collections::VecDeque;
use std::rc::Rc;

use bevy_app::{App, FixedUpdate, Plugin, Update};
use bevy_ecs::event::{Event, EventReader, EventWriter};
use bevy_ecs::prelude::{Res, ResMut, Resource, SystemSet};
use bevy_ecs::schedule::IntoScheduleConfigs;
use bevy_ecs::system::{NonSend, NonSendMut};
use navwalk::{
    NavGeometry, Navigator, NavigatorConfig, NavigatorState, PointerOutcome, PointerUp,
    PositionReader, TickOutcome, Vec2, Vec3, WalkCallbacks,
};

#[cfg(feature = "time")]
use bevy_time::Time;

/// Pointer pressed over the viewport, in normalised device coordinates.
#[derive(Event, Debug, Clone, Copy, PartialEq)]
pub struct NavPointerDown {
    pub screen: Vec2,
}

/// Pointer released, with the world point resolved under the cursor.
#[derive(Event, Debug, Clone, Copy, PartialEq)]
pub struct NavPointerUp(pub PointerUp);

/// New walkable geometry finished loading.
#[derive(Event, Debug, Clone, PartialEq)]
pub struct NavTerrainUpdated(pub NavGeometry);

/// Walk lifecycle notifications, in the order the navigator produced them.
#[derive(Event, Debug, Clone, Copy, PartialEq)]
pub enum NavWalkEvent {
    /// First movement towards the next waypoint; paired with a later `Stopped`.
    Started(Vec3),
    /// A waypoint was reached, or the player teleported.
    Stopped,
    Moved(Vec3),
}

/// Result of the last pointer release, for hosts that show click feedback.
#[derive(Event, Debug, Clone, PartialEq)]
pub struct NavPointerHandled(pub PointerOutcome);

/// Frame delta fed to [`Navigator::tick`].
#[derive(Debug, Clone, Copy, PartialEq)]
#[derive(Resource)]
pub struct NavFrameDt {
    pub dt_seconds: f32,
}

impl Default for NavFrameDt {
    fn default() -> Self {
        Self {
            dt_seconds: 1.0 / 60.0,
        }
    }
}

/// Mirror of the navigator's position store for minimap and HUD systems.
#[derive(Debug, Clone, Copy, PartialEq)]
#[derive(Resource)]
pub struct NavPlayerPosition {
    pub position: Vec3,
    pub state: NavigatorState,
}

impl Default for NavPlayerPosition {
    fn default() -> Self {
        Self {
            position: Vec3::ZERO,
            state: NavigatorState::Unplaced,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NavwalkSchedule {
    Update,
    FixedUpdate,
}

#[derive(SystemSet, Debug, Hash, PartialEq, Eq, Clone)]
pub enum NavwalkSet {
    Input,
    Step,
    Output,
}

/// The navigator plus the walk events its callbacks queued this frame.
pub struct NavwalkRuntime {
    navigator: Navigator,
    reader: PositionReader,
    pending: Rc<RefCell<VecDeque<NavWalkEvent>>>,
}

impl NavwalkRuntime {
    pub fn new(config: NavigatorConfig) -> Self {
        let pending: Rc<RefCell<VecDeque<NavWalkEvent>>> = Rc::default();
        let (start, stop, moved) = (pending.clone(), pending.clone(), pending.clone());
        let callbacks = WalkCallbacks::new()
            .on_walk_start(move |p| start.borrow_mut().push_back(NavWalkEvent::Started(p)))
            .on_walk_stop(move || stop.borrow_mut().push_back(NavWalkEvent::Stopped))
            .on_position_update(move |p| moved.borrow_mut().push_back(NavWalkEvent::Moved(p)));

        let navigator = Navigator::new(config).with_callbacks(callbacks);
        let reader = navigator.subscribe_position();
        Self {
            navigator,
            reader,
            pending,
        }
    }

    pub fn navigator(&self) -> &Navigator {
        &self.navigator
    }

    pub fn navigator_mut(&mut self) -> &mut Navigator {
        &mut self.navigator
    }

    fn drain_pending(&self) -> Vec<NavWalkEvent> {
        self.pending.borrow_mut().drain(..).collect()
    }
}

impl Default for NavwalkRuntime {
    fn default() -> Self {
        Self::new(NavigatorConfig::default())
    }
}

#[cfg(feature = "time")]
pub fn sync_frame_dt_from_bevy_time(time: Option<Res<Time>>, mut frame: ResMut<NavFrameDt>) {
    let Some(time) = time else {
        return;
    };

    let dt = time.delta_secs();
    if dt.is_finite() && dt.is_sign_positive() {
        frame.dt_seconds = dt;
    }
}

pub fn apply_terrain_updates(
    mut runtime: NonSendMut<NavwalkRuntime>,
    mut events: EventReader<NavTerrainUpdated>,
) {
    for NavTerrainUpdated(geometry) in events.read() {
        if let Err(err) = runtime.navigator.load_terrain(geometry) {
            tracing::warn!(%err, "rejected terrain update");
        }
    }
}

/// Presses are applied before releases within one frame.
pub fn apply_pointer_events(
    mut runtime: NonSendMut<NavwalkRuntime>,
    mut downs: EventReader<NavPointerDown>,
    mut ups: EventReader<NavPointerUp>,
    mut handled: EventWriter<NavPointerHandled>,
) {
    for down in downs.read() {
        runtime.navigator.on_pointer_down(down.screen);
    }
    for NavPointerUp(up) in ups.read() {
        let outcome = runtime.navigator.on_pointer_up(*up);
        handled.write(NavPointerHandled(outcome));
    }
}

pub fn step_navigator(frame: Res<NavFrameDt>, mut runtime: NonSendMut<NavwalkRuntime>) {
    if let TickOutcome::Arrived { remaining: 0, .. } = runtime.navigator.tick(frame.dt_seconds) {
        tracing::debug!("walk finished");
    }
}

pub fn flush_walk_events(runtime: NonSend<NavwalkRuntime>, mut writer: EventWriter<NavWalkEvent>) {
    for event in runtime.drain_pending() {
        writer.write(event);
    }
}

pub fn sync_player_position(
    mut runtime: NonSendMut<NavwalkRuntime>,
    mut player: ResMut<NavPlayerPosition>,
) {
    let state = runtime.navigator.state();
    if player.state != state {
        player.state = state;
    }
    if runtime.reader.has_changed() {
        player.position = runtime.reader.mark_seen();
    }
}

pub struct NavwalkPlugin {
    schedule: NavwalkSchedule,
    config: NavigatorConfig,
}

impl Default for NavwalkPlugin {
    fn default() -> Self {
        Self {
            schedule: NavwalkSchedule::Update,
            config: NavigatorConfig::default(),
        }
    }
}

impl NavwalkPlugin {
    pub fn new(config: NavigatorConfig) -> Self {
        Self {
            config,
            ..Self::default()
        }
    }

    pub fn in_fixed_update(mut self) -> Self {
        self.schedule = NavwalkSchedule::FixedUpdate;
        self
    }

    pub fn schedule(&self) -> NavwalkSchedule {
        self.schedule
    }

    pub fn config(&self) -> &NavigatorConfig {
        &self.config
    }
}

impl Plugin for NavwalkPlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<NavFrameDt>();
        app.init_resource::<NavPlayerPosition>();
        app.insert_non_send_resource(NavwalkRuntime::new(self.config.clone()));

        app.add_event::<NavPointerDown>();
        app.add_event::<NavPointerUp>();
        app.add_event::<NavTerrainUpdated>();
        app.add_event::<NavPointerHandled>();
        app.add_event::<NavWalkEvent>();

        let systems = (
            #[cfg(feature = "time")]
            sync_frame_dt_from_bevy_time.in_set(NavwalkSet::Input),
            (apply_terrain_updates, apply_pointer_events)
                .chain()
                .in_set(NavwalkSet::Input),
            step_navigator.in_set(NavwalkSet::Step),
            (flush_walk_events, sync_player_position).in_set(NavwalkSet::Output),
        );

        match self.schedule {
            NavwalkSchedule::Update => {
                app.configure_sets(
                    Update,
                    (NavwalkSet::Input, NavwalkSet::Step, NavwalkSet::Output).chain(),
                );
                app.add_systems(Update, systems);
            }
            NavwalkSchedule::FixedUpdate => {
                app.configure_sets(
                    FixedUpdate,
                    (NavwalkSet::Input, NavwalkSet::Step, NavwalkSet::Output).chain(),
                );
                app.add_systems(FixedUpdate, systems);
            }
        }
    }
}

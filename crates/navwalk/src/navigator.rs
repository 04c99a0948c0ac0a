use std::collections::VecDeque;

use crate::{
    GroupId, NavDebug, NavError, NavGeometry, NavOracle, NavigatorConfig, Pathfinding,
    PositionReader, PositionStore, Vec2, Vec3, WalkCallbacks,
};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum PointerButton {
    #[default]
    Primary,
    Middle,
    /// Alternate button (right click on most platforms).
    Secondary,
    Other(u16),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct Modifiers {
    pub ctrl: bool,
    pub meta: bool,
    pub shift: bool,
    pub alt: bool,
}

impl Modifiers {
    pub const NONE: Self = Self {
        ctrl: false,
        meta: false,
        shift: false,
        alt: false,
    };

    /// Platform "secondary action" chord (ctrl, or cmd on macOS).
    pub fn secondary_action(self) -> bool {
        self.ctrl || self.meta
    }
}

/// Pointer release with the world point the host resolved under the cursor.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct PointerUp {
    pub screen: Vec2,
    pub world: Vec3,
    pub button: PointerButton,
    pub modifiers: Modifiers,
}

impl PointerUp {
    pub fn click(screen: Vec2, world: Vec3) -> Self {
        Self {
            screen,
            world,
            button: PointerButton::Primary,
            modifiers: Modifiers::NONE,
        }
    }

    pub fn with_button(mut self, button: PointerButton) -> Self {
        self.button = button;
        self
    }

    pub fn with_modifiers(mut self, modifiers: Modifiers) -> Self {
        self.modifiers = modifiers;
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IgnoreReason {
    /// The pointer moved between press and release (camera rotation).
    Drag,
    /// Release without a recorded press.
    NoPress,
    /// No terrain has been indexed yet.
    NotReady,
}

#[derive(Debug, Clone, PartialEq)]
pub enum PointerOutcome {
    Ignored(IgnoreReason),
    /// First placement of the player; no path is computed.
    Placed(Vec3),
    Teleported(Vec3),
    Walking { waypoints: usize },
    /// No path to the target; `clamped` is the diagnostic step clamp, if any.
    Unreachable { clamped: Option<Vec3> },
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TickOutcome {
    Idle,
    Moved(Vec3),
    /// Reached a waypoint; `remaining` waypoints are still queued.
    Arrived { waypoint: Vec3, remaining: usize },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NavigatorState {
    Unplaced,
    Idle,
    Walking,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PlayerState {
    pub position: Vec3,
    pub group: Option<GroupId>,
    pub placed: bool,
}

/// Planned waypoints plus whether `on_walk_start` already fired for the head.
#[derive(Debug, Clone)]
struct Walk {
    waypoints: VecDeque<Vec3>,
    started: bool,
}

/// Turns pointer gestures into placement, teleport or walk commands and steps
/// the player along planned paths once per frame.
///
/// Single-threaded: the host calls the pointer handlers and [`Navigator::tick`]
/// from the same thread, never concurrently.
pub struct Navigator<O: NavOracle = Pathfinding> {
    config: NavigatorConfig,
    oracle: O,
    player: PlayerState,
    target: Vec3,
    pressed_at: Option<Vec2>,
    walk: Option<Walk>,
    store: PositionStore,
    callbacks: WalkCallbacks,
    debug: NavDebug,
}

impl Navigator<Pathfinding> {
    pub fn new(config: NavigatorConfig) -> Self {
        let oracle = Pathfinding::with_tolerance(config.weld_tolerance);
        Self::with_oracle(config, oracle)
    }
}

impl<O: NavOracle> Navigator<O> {
    pub fn with_oracle(config: NavigatorConfig, oracle: O) -> Self {
        Self {
            config,
            oracle,
            player: PlayerState {
                position: Vec3::ZERO,
                group: None,
                placed: false,
            },
            target: Vec3::ZERO,
            pressed_at: None,
            walk: None,
            store: PositionStore::default(),
            callbacks: WalkCallbacks::default(),
            debug: NavDebug::default(),
        }
    }

    pub fn with_callbacks(mut self, callbacks: WalkCallbacks) -> Self {
        self.callbacks = callbacks;
        self
    }

    pub fn set_callbacks(&mut self, callbacks: WalkCallbacks) {
        self.callbacks = callbacks;
    }

    pub fn config(&self) -> &NavigatorConfig {
        &self.config
    }

    pub fn oracle(&self) -> &O {
        &self.oracle
    }

    pub fn player(&self) -> PlayerState {
        self.player
    }

    pub fn target(&self) -> Vec3 {
        self.target
    }

    pub fn debug(&self) -> &NavDebug {
        &self.debug
    }

    pub fn store(&self) -> &PositionStore {
        &self.store
    }

    pub fn subscribe_position(&self) -> PositionReader {
        self.store.subscribe()
    }

    pub fn state(&self) -> NavigatorState {
        if !self.player.placed {
            NavigatorState::Unplaced
        } else if self.walk.is_some() {
            NavigatorState::Walking
        } else {
            NavigatorState::Idle
        }
    }

    /// Remaining waypoints of the current walk, head first.
    pub fn waypoints(&self) -> Vec<Vec3> {
        self.walk
            .as_ref()
            .map(|w| w.waypoints.iter().copied().collect())
            .unwrap_or_default()
    }

    /// Index new terrain and place the player at the configured spawn point.
    ///
    /// On error the previous zone and player state are left untouched.
    pub fn load_terrain(&mut self, geometry: &NavGeometry) -> Result<(), NavError> {
        let zone = self.oracle.build_zone(geometry)?;
        self.oracle.set_zone(&self.config.zone_id, zone);

        let spawn = self.config.spawn;
        self.player.group = self.oracle.get_group(&self.config.zone_id, spawn, false);
        tracing::info!(
            zone = %self.config.zone_id,
            triangles = geometry.triangle_count(),
            group = ?self.player.group,
            "terrain updated"
        );

        self.walk = None;
        self.place(spawn);
        self.callbacks.position_update(spawn);
        Ok(())
    }

    /// Place the player without a click, e.g. from a saved spawn point.
    pub fn set_spawn(&mut self, point: Vec3) {
        self.walk = None;
        if self.oracle.has_zone(&self.config.zone_id) {
            self.player.group = self.oracle.get_group(&self.config.zone_id, point, false);
        }
        self.place(point);
    }

    pub fn on_pointer_down(&mut self, screen: Vec2) {
        self.pressed_at = Some(screen);
    }

    pub fn on_pointer_up(&mut self, event: PointerUp) -> PointerOutcome {
        let Some(pressed_at) = self.pressed_at.take() else {
            tracing::debug!("pointer up without pointer down, ignoring");
            return PointerOutcome::Ignored(IgnoreReason::NoPress);
        };

        let delta = event.screen - pressed_at;
        let eps = self.config.drag_epsilon;
        if delta.x.abs() > eps || delta.y.abs() > eps {
            tracing::trace!(dx = delta.x, dy = delta.y, "pointer dragged, ignoring");
            return PointerOutcome::Ignored(IgnoreReason::Drag);
        }

        let point = event.world;
        if !self.player.placed {
            if self.oracle.has_zone(&self.config.zone_id) {
                self.player.group = self.oracle.get_group(&self.config.zone_id, point, true);
            }
            self.place(point);
            return PointerOutcome::Placed(point);
        }

        if !self.oracle.has_zone(&self.config.zone_id) {
            tracing::debug!("no terrain indexed yet, ignoring click");
            return PointerOutcome::Ignored(IgnoreReason::NotReady);
        }

        self.target = point;
        self.debug.reset();
        self.debug.player = Some(self.player.position);

        let distance = point.distance(self.player.position);
        let teleport = event.modifiers.secondary_action()
            || event.button == PointerButton::Secondary
            || distance > self.config.teleport_distance;

        if teleport {
            self.teleport(point, distance)
        } else {
            self.plan_walk(point)
        }
    }

    /// Advance the player along the current walk by `dt_seconds`.
    pub fn tick(&mut self, dt_seconds: f32) -> TickOutcome {
        if !self.player.placed {
            return TickOutcome::Idle;
        }
        let Some(walk) = self.walk.as_mut() else {
            return TickOutcome::Idle;
        };
        let Some(head) = walk.waypoints.front().copied() else {
            self.walk = None;
            return TickOutcome::Idle;
        };

        let velocity = head - self.player.position;
        let threshold = self.config.arrival_threshold;
        let remaining = velocity.length_squared();

        if remaining > threshold * threshold {
            let step = (dt_seconds.max(0.0) * self.config.speed).min(remaining.sqrt());
            self.player.position += velocity.normalize_or_zero() * step;
            let position = self.player.position;

            let first_move = !walk.started;
            walk.started = true;

            self.debug.player = Some(position);
            self.store.publish(position);
            self.callbacks.position_update(position);
            if first_move {
                tracing::debug!(?head, "walk segment started");
                self.callbacks.walk_start(head);
            }
            tracing::trace!(?position, "walk step");
            TickOutcome::Moved(position)
        } else {
            walk.waypoints.pop_front();
            walk.started = false;
            let left = walk.waypoints.len();
            if left == 0 {
                self.walk = None;
            }
            tracing::debug!(waypoint = ?head, remaining = left, "waypoint reached");
            self.callbacks.walk_stop();
            TickOutcome::Arrived {
                waypoint: head,
                remaining: left,
            }
        }
    }

    fn place(&mut self, point: Vec3) {
        self.player.position = point;
        self.player.placed = true;
        self.target = point;
        self.debug.reset();
        self.debug.player = Some(point);
        self.debug.target = Some(point);
        self.store.publish(point);
        tracing::debug!(?point, "player placed");
    }

    fn teleport(&mut self, point: Vec3, distance: f32) -> PointerOutcome {
        let zone_id = self.config.zone_id.as_str();
        self.walk = None;

        let group = self.oracle.get_group(zone_id, point, true);
        if let Some(group) = group {
            if let Some(node) =
                self.oracle
                    .get_closest_node(self.player.position, zone_id, group, true)
            {
                self.debug.node = Some(node.centroid);
            }
        }
        self.player.group = group.or(self.player.group);

        self.player.position = point;
        self.debug.player = Some(point);
        tracing::debug!(?point, distance, group = ?self.player.group, "teleport");

        self.callbacks.position_update(point);
        self.callbacks.walk_stop();
        self.store.publish(point);
        PointerOutcome::Teleported(point)
    }

    fn plan_walk(&mut self, point: Vec3) -> PointerOutcome {
        let zone_id = self.config.zone_id.as_str();
        let from = self.player.position;

        if let Some(target_group) = self.oracle.get_group(zone_id, point, true) {
            if let Some(node) = self
                .oracle
                .get_closest_node(point, zone_id, target_group, true)
            {
                self.debug.node = Some(node.centroid);
            }
        }
        self.debug.target = Some(point);

        let path = self
            .player
            .group
            .and_then(|group| self.oracle.find_path(from, point, zone_id, group))
            .filter(|p| !p.is_empty());

        let outcome = match path {
            Some(path) => {
                tracing::debug!(?point, waypoints = path.len(), "walk planned");
                let waypoints = path.len();
                self.debug.path = path.clone();
                self.walk = Some(Walk {
                    waypoints: path.into(),
                    started: false,
                });
                PointerOutcome::Walking { waypoints }
            }
            None => {
                self.walk = None;
                let clamped = self.clamp_towards(point);
                tracing::debug!(?point, ?clamped, "target unreachable");
                PointerOutcome::Unreachable { clamped }
            }
        };

        self.store.publish(self.player.position);
        outcome
    }

    fn clamp_towards(&mut self, point: Vec3) -> Option<Vec3> {
        let zone_id = self.config.zone_id.as_str();
        let from = self.player.position;
        let group = self.player.group?;
        let node = self.oracle.get_closest_node(from, zone_id, group, false)?;

        let mut clamped = from;
        self.oracle
            .clamp_step(from, point, &node, zone_id, group, &mut clamped)?;
        self.debug.step = Some(clamped);
        Some(clamped)
    }
}

impl<O: NavOracle + core::fmt::Debug> core::fmt::Debug for Navigator<O> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Navigator")
            .field("config", &self.config)
            .field("oracle", &self.oracle)
            .field("player", &self.player)
            .field("target", &self.target)
            .field("walk", &self.walk)
            .field("callbacks", &self.callbacks)
            .finish()
    }
}

use crate::Vec3;

/// Optional lifecycle hooks, invoked synchronously from pointer handlers and
/// ticks.
#[derive(Default)]
pub struct WalkCallbacks {
    on_walk_start: Option<Box<dyn FnMut(Vec3)>>,
    on_walk_stop: Option<Box<dyn FnMut()>>,
    on_position_update: Option<Box<dyn FnMut(Vec3)>>,
}

impl WalkCallbacks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Called with the head waypoint on the first movement towards it.
    ///
    /// Each walk segment opens with one start and closes with one
    /// [`on_walk_stop`](Self::on_walk_stop), so a three-waypoint path reports
    /// three of each.
    pub fn on_walk_start(mut self, f: impl FnMut(Vec3) + 'static) -> Self {
        self.on_walk_start = Some(Box::new(f));
        self
    }

    /// Called on every waypoint arrival and after a teleport.
    pub fn on_walk_stop(mut self, f: impl FnMut() + 'static) -> Self {
        self.on_walk_stop = Some(Box::new(f));
        self
    }

    pub fn on_position_update(mut self, f: impl FnMut(Vec3) + 'static) -> Self {
        self.on_position_update = Some(Box::new(f));
        self
    }

    pub(crate) fn walk_start(&mut self, waypoint: Vec3) {
        if let Some(f) = self.on_walk_start.as_mut() {
            f(waypoint);
        }
    }

    pub(crate) fn walk_stop(&mut self) {
        if let Some(f) = self.on_walk_stop.as_mut() {
            f();
        }
    }

    pub(crate) fn position_update(&mut self, position: Vec3) {
        if let Some(f) = self.on_position_update.as_mut() {
            f(position);
        }
    }
}

impl core::fmt::Debug for WalkCallbacks {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("WalkCallbacks")
            .field("on_walk_start", &self.on_walk_start.is_some())
            .field("on_walk_stop", &self.on_walk_stop.is_some())
            .field("on_position_update", &self.on_position_update.is_some())
            .finish()
    }
}

/// Diagnostic markers for a debug overlay. Never used for movement.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NavDebug {
    pub player: Option<Vec3>,
    pub target: Option<Vec3>,
    /// Centroid of the last closest-node lookup.
    pub node: Option<Vec3>,
    /// Result of the last clamp fallback.
    pub step: Option<Vec3>,
    pub path: Vec<Vec3>,
}

impl NavDebug {
    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

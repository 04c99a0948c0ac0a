//! Scripted pointer sessions replayed against a headless navigator.

use std::cell::RefCell;
use std::path::Path;
use std::rc::Rc;

use anyhow::{Context, Result};
use navwalk::{
    Modifiers, NavOracle, Navigator, NavigatorState, PointerButton, PointerOutcome, PointerUp,
    Vec2, Vec3, WalkCallbacks,
};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Script {
    /// Overrides the configured frame delta for this script
    #[serde(default)]
    pub frame_dt: Option<f32>,
    #[serde(with = "serde_yaml::with::singleton_map_recursive")]
    pub steps: Vec<Step>,
}

/// One script step, written as a single-key map: `- click: { at: [x, y, z] }`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Step {
    /// Press and release without moving the pointer.
    Click(Click),
    /// Press, move the pointer by `by`, release.
    Drag {
        at: [f32; 3],
        by: [f32; 2],
    },
    /// Advance this many seconds of frames.
    Run(f32),
    /// Run frames until the walk finishes, at most `max_seconds`.
    UntilIdle {
        #[serde(default = "default_max_seconds")]
        max_seconds: f32,
    },
}

fn default_max_seconds() -> f32 {
    30.0
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Click {
    pub at: [f32; 3],
    #[serde(default)]
    pub button: PointerButton,
    #[serde(default)]
    pub modifiers: Modifiers,
    #[serde(default)]
    pub screen: [f32; 2],
}

impl Script {
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read script from {}", path.display()))?;
        serde_yaml::from_str(&content)
            .with_context(|| format!("Failed to parse script from {}", path.display()))
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct WalkCounts {
    pub starts: usize,
    pub stops: usize,
    pub updates: usize,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ReplayReport {
    pub outcomes: Vec<PointerOutcome>,
    pub frames: u64,
    pub walk: WalkCounts,
    pub final_position: Vec3,
    pub final_state: NavigatorState,
}

/// Installs counting callbacks on `navigator` and plays `script` at `frame_dt`.
pub fn replay<O: NavOracle>(
    navigator: &mut Navigator<O>,
    script: &Script,
    frame_dt: f32,
) -> ReplayReport {
    let dt = script.frame_dt.unwrap_or(frame_dt);
    let counts = Rc::new(RefCell::new(WalkCounts::default()));
    let (start, stop, update) = (counts.clone(), counts.clone(), counts.clone());
    navigator.set_callbacks(
        WalkCallbacks::new()
            .on_walk_start(move |waypoint| {
                tracing::info!(?waypoint, "walk start");
                start.borrow_mut().starts += 1;
            })
            .on_walk_stop(move || {
                tracing::debug!("walk stop");
                stop.borrow_mut().stops += 1;
            })
            .on_position_update(move |_| update.borrow_mut().updates += 1),
    );

    let mut outcomes = Vec::new();
    let mut frames = 0u64;

    for (i, step) in script.steps.iter().enumerate() {
        match step {
            Step::Click(click) => {
                let screen = Vec2::new(click.screen[0], click.screen[1]);
                let event = PointerUp::click(screen, Vec3::from_array(click.at))
                    .with_button(click.button)
                    .with_modifiers(click.modifiers);
                navigator.on_pointer_down(screen);
                let outcome = navigator.on_pointer_up(event);
                tracing::info!(step = i, ?outcome, "click");
                outcomes.push(outcome);
            }
            Step::Drag { at, by } => {
                navigator.on_pointer_down(Vec2::ZERO);
                let released = PointerUp::click(Vec2::new(by[0], by[1]), Vec3::from_array(*at));
                let outcome = navigator.on_pointer_up(released);
                tracing::info!(step = i, ?outcome, "drag");
                outcomes.push(outcome);
            }
            Step::Run(seconds) => {
                let count = frame_count(*seconds, dt);
                for _ in 0..count {
                    navigator.tick(dt);
                }
                frames += count;
            }
            Step::UntilIdle { max_seconds } => {
                let budget = frame_count(*max_seconds, dt);
                let mut used = 0;
                while used < budget && navigator.state() == NavigatorState::Walking {
                    navigator.tick(dt);
                    used += 1;
                }
                if navigator.state() == NavigatorState::Walking {
                    tracing::warn!(step = i, max_seconds, "walk still running at step budget");
                }
                frames += used;
            }
        }
    }

    let walk = counts.borrow().clone();
    ReplayReport {
        outcomes,
        frames,
        walk,
        final_position: navigator.player().position,
        final_state: navigator.state(),
    }
}

fn frame_count(seconds: f32, dt: f32) -> u64 {
    if !(seconds.is_finite() && seconds > 0.0 && dt > 0.0) {
        return 0;
    }
    (seconds / dt).ceil() as u64
}

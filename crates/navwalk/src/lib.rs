//! Pointer-driven path planning and path following over a navigation mesh.

#![cfg_attr(docsrs, feature(doc_cfg))]
#![forbid(unsafe_code)]

pub mod callbacks;
pub mod config;
pub mod error;
pub mod geometry;
pub mod math;
pub mod navigator;
pub mod oracle;
pub mod store;
pub mod zone;

pub use callbacks::{NavDebug, WalkCallbacks};
pub use config::NavigatorConfig;
pub use error::NavError;
pub use geometry::NavGeometry;
pub use math::{Vec2, Vec3};
pub use navigator::{
    IgnoreReason, Modifiers, Navigator, NavigatorState, PlayerState, PointerButton,
    PointerOutcome, PointerUp, TickOutcome,
};
pub use oracle::{NavOracle, Pathfinding};
pub use store::{PositionReader, PositionStore};
pub use zone::{GroupId, Node, NodeId, Zone, ZoneQuery};

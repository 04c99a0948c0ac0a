//! Single-writer broadcast of the player position.
//!
//! The [`crate::Navigator`] owns the only [`PositionStore`]; minimap, HUD and other
//! readers hold [`PositionReader`]s and either poll them or await changes. Values
//! are replaced whole, so a reader never sees a half-written position.

use tokio::sync::watch;

use crate::Vec3;

#[derive(Debug)]
pub struct PositionStore {
    tx: watch::Sender<Vec3>,
}

impl Default for PositionStore {
    fn default() -> Self {
        Self::new(Vec3::ZERO)
    }
}

impl PositionStore {
    pub fn new(initial: Vec3) -> Self {
        let (tx, _rx) = watch::channel(initial);
        Self { tx }
    }

    /// Replace the stored position and notify every reader.
    pub fn publish(&self, position: Vec3) {
        // `send_replace` stores the value even while nobody is subscribed.
        self.tx.send_replace(position);
    }

    pub fn get(&self) -> Vec3 {
        *self.tx.borrow()
    }

    pub fn subscribe(&self) -> PositionReader {
        PositionReader {
            rx: self.tx.subscribe(),
        }
    }

    pub fn reader_count(&self) -> usize {
        self.tx.receiver_count()
    }
}

#[derive(Debug, Clone)]
pub struct PositionReader {
    rx: watch::Receiver<Vec3>,
}

impl PositionReader {
    /// Latest published position.
    pub fn get(&self) -> Vec3 {
        *self.rx.borrow()
    }

    /// True when a position was published since this reader last looked.
    pub fn has_changed(&self) -> bool {
        // The store owns the sender for as long as any navigator exists; a closed
        // channel simply means nothing new will ever arrive.
        self.rx.has_changed().unwrap_or(false)
    }

    /// Take the latest position and mark it as seen.
    pub fn mark_seen(&mut self) -> Vec3 {
        *self.rx.borrow_and_update()
    }

    /// Wait for the next publish. Returns `None` once the store is dropped.
    pub async fn changed(&mut self) -> Option<Vec3> {
        self.rx.changed().await.ok()?;
        Some(*self.rx.borrow_and_update())
    }
}

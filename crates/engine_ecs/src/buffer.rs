//! Deferred entity destruction.
//!
//! Destroying an entity while a view is walking its pools would shuffle the
//! dense arrays under the cursor. Systems instead push the handles they want
//! gone into an [`EntityBuffer`] and flush it once the view is exhausted.

use tracing::{trace, warn};

use crate::entity::Entity;
use crate::world::World;

/// A side buffer of entities waiting to be destroyed.
///
/// A bounded buffer clamps: pushes past the limit are dropped with a
/// warning instead of growing without bound.
#[derive(Debug, Clone, Default)]
pub struct EntityBuffer {
    entities: Vec<Entity>,
    limit: Option<usize>,
}

impl EntityBuffer {
    /// An unbounded buffer.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// A buffer that accepts at most `limit` handles between flushes.
    #[must_use]
    pub fn bounded(limit: usize) -> Self {
        Self {
            entities: Vec::with_capacity(limit),
            limit: Some(limit),
        }
    }

    /// Queue `entity` for destruction.
    ///
    /// Returns `false` if the buffer is full and the handle was dropped.
    pub fn push(&mut self, entity: Entity) -> bool {
        if let Some(limit) = self.limit {
            if self.entities.len() >= limit {
                warn!(%entity, limit, "deferred entity buffer full, dropping entity");
                return false;
            }
        }
        self.entities.push(entity);
        true
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entities.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = Entity> + '_ {
        self.entities.iter().copied()
    }

    /// Forget every queued handle without destroying anything.
    pub fn clear(&mut self) {
        self.entities.clear();
    }

    /// Destroy every queued entity that is still valid and empty the buffer.
    ///
    /// Handles queued twice, or destroyed by someone else in the meantime,
    /// are skipped. Returns the number of entities actually destroyed.
    pub fn flush(&mut self, world: &mut World) -> usize {
        let mut destroyed = 0;
        for entity in self.entities.drain(..) {
            if world.destroy_entity(entity).is_ok() {
                destroyed += 1;
            }
        }
        trace!(destroyed, "flushed deferred entity buffer");
        destroyed
    }
}

impl Extend<Entity> for EntityBuffer {
    fn extend<I: IntoIterator<Item = Entity>>(&mut self, iter: I) {
        for entity in iter {
            self.push(entity);
        }
    }
}

//! Entity handles and the generational registry that issues them.
//!
//! An [`Entity`] packs a 32-bit id (low bits) and a 32-bit generation (high
//! bits) into one `u64`. The [`EntityRegistry`] keeps the current handle for
//! every id it has ever issued. Destroyed slots hold a forwarding value
//! instead: the id of the previous free-list head plus the generation the
//! slot will carry when it is reused. The free list therefore lives inside
//! the same array as the live handles.

use serde::{Deserialize, Serialize};
use tracing::trace;

use crate::error::EcsError;
use crate::grow_capacity;

/// The index half of an [`Entity`].
pub type EntityId = u32;

/// The generation half of an [`Entity`].
pub type Generation = u32;

/// A generational entity handle.
///
/// Entities carry no data of their own. A handle stays valid until the
/// entity is destroyed; after that its id may be reused, but always with a
/// higher generation, so the old handle never matches again.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Entity(u64);

impl Entity {
    /// The "no entity" sentinel (all bits set).
    pub const NULL: Entity = Entity(u64::MAX);

    /// Free-list terminator.
    pub const NULL_ID: EntityId = EntityId::MAX;

    /// Build a handle from its id and generation.
    #[must_use]
    pub const fn new(id: EntityId, generation: Generation) -> Self {
        Self(((generation as u64) << 32) | id as u64)
    }

    /// Reinterpret a raw `u64` as a handle.
    #[must_use]
    pub const fn from_raw(bits: u64) -> Self {
        Self(bits)
    }

    #[must_use]
    pub const fn to_raw(self) -> u64 {
        self.0
    }

    /// Returns the id (slot index) of this handle.
    #[must_use]
    pub const fn id(self) -> EntityId {
        self.0 as EntityId
    }

    /// Returns the generation of this handle.
    #[must_use]
    pub const fn generation(self) -> Generation {
        (self.0 >> 32) as Generation
    }

    /// Returns `true` for [`Entity::NULL`].
    #[must_use]
    pub const fn is_null(self) -> bool {
        self.0 == u64::MAX
    }

    pub(crate) const fn index(self) -> usize {
        self.id() as usize
    }
}

impl Default for Entity {
    fn default() -> Self {
        Self::NULL
    }
}

impl std::fmt::Display for Entity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.is_null() {
            write!(f, "Entity(null)")
        } else {
            write!(f, "Entity({}v{})", self.id(), self.generation())
        }
    }
}

/// Allocates, recycles and validates entity handles.
#[derive(Debug, Clone)]
pub struct EntityRegistry {
    /// Current value at each id: the live handle, or a forwarding value
    /// `(next free id, next generation)` for destroyed slots.
    slots: Vec<Entity>,
    /// Head of the implicit free list, [`Entity::NULL_ID`] when empty.
    avail_id: EntityId,
    alive: usize,
}

impl EntityRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::with_capacity(0)
    }

    /// Creates an empty registry with room for `capacity` slots.
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            slots: Vec::with_capacity(capacity),
            avail_id: Entity::NULL_ID,
            alive: 0,
        }
    }

    /// Appends a brand new slot with generation 0.
    ///
    /// # Panics
    ///
    /// Panics if the 32-bit id space is exhausted.
    pub fn allocate(&mut self) -> Entity {
        let id = self.slots.len();
        assert!(
            id < Entity::NULL_ID as usize,
            "entity id space exhausted ({id} slots)"
        );

        if self.slots.len() == self.slots.capacity() {
            let additional = grow_capacity(self.slots.capacity()) - self.slots.len();
            self.slots.reserve_exact(additional);
        }

        let entity = Entity::new(id as EntityId, 0);
        self.slots.push(entity);
        self.alive += 1;
        trace!(%entity, "allocated entity");
        entity
    }

    /// Pops the free-list head if there is one, otherwise allocates.
    ///
    /// A recycled handle carries the generation written into the slot when
    /// it was destroyed.
    pub fn recycle_or_allocate(&mut self) -> Entity {
        if self.avail_id == Entity::NULL_ID {
            return self.allocate();
        }

        let id = self.avail_id;
        let forward = self.slots[id as usize];
        self.avail_id = forward.id();

        let entity = Entity::new(id, forward.generation());
        self.slots[id as usize] = entity;
        self.alive += 1;
        trace!(%entity, "recycled entity");
        entity
    }

    /// Releases `entity`, bumping the generation stored in its slot and
    /// pushing the id onto the free list.
    ///
    /// This does not touch component storage; [`World::destroy_entity`]
    /// clears the components first.
    ///
    /// [`World::destroy_entity`]: crate::World::destroy_entity
    ///
    /// # Errors
    ///
    /// Returns [`EcsError::StaleEntity`] if `entity` is not currently valid.
    pub fn destroy(&mut self, entity: Entity) -> Result<(), EcsError> {
        if !self.valid(entity) {
            return Err(EcsError::StaleEntity(entity));
        }

        self.slots[entity.index()] = Entity::new(self.avail_id, entity.generation().wrapping_add(1));
        self.avail_id = entity.id();
        self.alive -= 1;
        trace!(%entity, "destroyed entity");
        Ok(())
    }

    /// Returns `true` iff `entity` is the exact value stored at its id.
    #[must_use]
    pub fn valid(&self, entity: Entity) -> bool {
        self.slots
            .get(entity.index())
            .is_some_and(|&slot| slot == entity)
    }

    /// Number of slots ever issued, live or free.
    #[must_use]
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Number of live entities.
    #[must_use]
    pub fn alive_count(&self) -> usize {
        self.alive
    }

    /// Iterates over the live handles in id order.
    ///
    /// A live slot stores its own id; a forwarding slot stores the id of a
    /// different (free) slot, so the two never get confused.
    pub fn iter_alive(&self) -> impl Iterator<Item = Entity> + '_ {
        self.slots
            .iter()
            .enumerate()
            .filter(|&(index, slot)| slot.index() == index)
            .map(|(_, &slot)| slot)
    }
}

impl Default for EntityRegistry {
    fn default() -> Self {
        Self::new()
    }
}

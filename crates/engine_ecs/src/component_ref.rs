//! Component tokens that survive structural changes.
//!
//! A plain `&T` into a pool is invalidated by the next add or remove on that
//! pool, and the borrow checker stops you from holding one across a
//! mutation. A [`ComponentRef`] stores where the component lived instead and
//! resolves it again on every dereference.

use std::marker::PhantomData;

use crate::component::Component;
use crate::entity::Entity;
use crate::error::EcsError;
use crate::pool::ComponentPool;
use crate::world::World;

/// A `(pool, dense index, pool version)` token for one entity's `T`.
///
/// While the pool's version is unchanged the cached dense index is used
/// directly. After any add or remove the index is looked up again through
/// the sparse array. Either way the slot must still belong to the same
/// entity handle, generation included.
pub struct ComponentRef<T> {
    entity: Entity,
    pool: usize,
    index: usize,
    version: u64,
    _marker: PhantomData<fn() -> T>,
}

impl<T: Component> ComponentRef<T> {
    pub(crate) fn new(entity: Entity, pool: usize, index: usize, version: u64) -> Self {
        Self {
            entity,
            pool,
            index,
            version,
            _marker: PhantomData,
        }
    }

    #[must_use]
    pub fn entity(&self) -> Entity {
        self.entity
    }

    /// # Errors
    ///
    /// [`EcsError::MissingComponent`] if the component has been removed or
    /// its entity destroyed, [`EcsError::UnknownPool`] if `world` is not the
    /// world the ref was taken from.
    pub fn get<'w>(&self, world: &'w World) -> Result<&'w T, EcsError> {
        let pool = world.pool_at(self.pool)?;
        let index = self.resolve(pool)?;
        pool.get_at(index).ok_or_else(|| self.missing())
    }

    /// # Errors
    ///
    /// Same as [`ComponentRef::get`].
    pub fn get_mut<'w>(&self, world: &'w mut World) -> Result<&'w mut T, EcsError> {
        let pool = world.pool_at_mut(self.pool)?;
        let index = self.resolve(pool)?;
        pool.get_at_mut(index).ok_or_else(|| self.missing())
    }

    fn resolve(&self, pool: &ComponentPool) -> Result<usize, EcsError> {
        if pool.version() == self.version {
            if pool.entities().get(self.index) == Some(&self.entity) {
                return Ok(self.index);
            }
            return Err(self.missing());
        }
        pool.dense_index(self.entity).ok_or_else(|| self.missing())
    }

    fn missing(&self) -> EcsError {
        EcsError::MissingComponent {
            entity: self.entity,
            component: T::type_name(),
        }
    }
}

impl<T> Clone for ComponentRef<T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Copy for ComponentRef<T> {}

impl<T> std::fmt::Debug for ComponentRef<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ComponentRef")
            .field("entity", &self.entity)
            .field("pool", &self.pool)
            .field("index", &self.index)
            .field("version", &self.version)
            .finish()
    }
}

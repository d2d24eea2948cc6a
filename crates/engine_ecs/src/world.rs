//! The [`World`]: one entity registry plus one pool per component type.
//!
//! The world is an explicitly owned context; there is no global instance.
//! Pools are created lazily the first time a component type is used and are
//! never removed, so a pool's index stays stable for the world's lifetime.
//! Views and component refs rely on that.

use std::ptr::NonNull;

use tracing::{debug, trace};

use crate::buffer::EntityBuffer;
use crate::component::{Component, ComponentMeta, ComponentSet, ComponentTypeId};
use crate::component_ref::ComponentRef;
use crate::config::WorldConfig;
use crate::entity::{Entity, EntityRegistry};
use crate::error::EcsError;
use crate::pool::ComponentPool;
use crate::view::{SingleView, View};

/// Entity and component storage for one simulation.
#[derive(Debug)]
pub struct World {
    registry: EntityRegistry,
    /// Pools in creation order. Type cardinality is small, so lookup is a
    /// linear scan.
    pools: Vec<ComponentPool>,
    config: WorldConfig,
}

impl World {
    /// Create an empty world with the default configuration.
    #[must_use]
    pub fn new() -> Self {
        Self::with_config(WorldConfig::default())
    }

    /// Create an empty world sized by `config`.
    #[must_use]
    pub fn with_config(config: WorldConfig) -> Self {
        debug!(?config, "creating world");
        Self {
            registry: EntityRegistry::with_capacity(config.entity_capacity),
            pools: Vec::new(),
            config,
        }
    }

    #[must_use]
    pub fn config(&self) -> &WorldConfig {
        &self.config
    }

    // -- Entity lifecycle --

    /// Create an entity, reusing a destroyed id when one is available.
    pub fn new_entity(&mut self) -> Entity {
        self.registry.recycle_or_allocate()
    }

    /// Remove every component `entity` owns, running destruction hooks, then
    /// release its id with a bumped generation.
    ///
    /// # Errors
    ///
    /// [`EcsError::StaleEntity`] if the handle is not valid.
    pub fn destroy_entity(&mut self, entity: Entity) -> Result<(), EcsError> {
        self.ensure_valid(entity)?;
        for pool in &mut self.pools {
            if pool.has(entity) {
                pool.remove(entity)?;
            }
        }
        self.registry.destroy(entity)
    }

    #[must_use]
    pub fn entity_valid(&self, entity: Entity) -> bool {
        self.registry.valid(entity)
    }

    /// Number of live entities.
    #[must_use]
    pub fn entity_count(&self) -> usize {
        self.registry.alive_count()
    }

    /// Live entities in id order.
    pub fn entities(&self) -> impl Iterator<Item = Entity> + '_ {
        self.registry.iter_alive()
    }

    #[must_use]
    pub fn registry(&self) -> &EntityRegistry {
        &self.registry
    }

    // -- Pools --

    /// Index of the pool for `meta`, creating it on first use.
    ///
    /// # Errors
    ///
    /// [`EcsError::LayoutMismatch`] if a pool with the same type id exists
    /// for a different type.
    pub fn get_or_create_pool(&mut self, meta: &ComponentMeta) -> Result<usize, EcsError> {
        if let Some(index) = self.pools.iter().position(|p| p.meta().type_id == meta.type_id) {
            let existing = self.pools[index].meta();
            if existing.rust_type != meta.rust_type || existing.layout != meta.layout {
                return Err(EcsError::LayoutMismatch {
                    component: meta.name,
                });
            }
            return Ok(index);
        }

        let index = self.pools.len();
        self.pools
            .push(ComponentPool::with_capacity(meta.clone(), self.config.pool_capacity));
        debug!(
            component = meta.name,
            pool = index,
            size = meta.layout.size(),
            "created component pool"
        );
        Ok(index)
    }

    /// The pool registered under `type_id`, if any.
    #[must_use]
    pub fn pool(&self, type_id: ComponentTypeId) -> Option<&ComponentPool> {
        self.pools.iter().find(|p| p.meta().type_id == type_id)
    }

    /// The pool storing `T`, if one has been created.
    #[must_use]
    pub fn pool_of<T: Component>(&self) -> Option<&ComponentPool> {
        self.typed_pool_index::<T>().map(|index| &self.pools[index])
    }

    /// Mutable access to the pool storing `T`, creating it if needed.
    ///
    /// # Errors
    ///
    /// [`EcsError::LayoutMismatch`] on a type id collision.
    pub fn pool_of_mut<T: Component>(&mut self) -> Result<&mut ComponentPool, EcsError> {
        let index = self.typed_pool_or_create::<T>()?;
        Ok(&mut self.pools[index])
    }

    #[must_use]
    pub fn pool_count(&self) -> usize {
        self.pools.len()
    }

    /// Pool by index, as stored in views and component refs. An index
    /// from another world may be out of range here.
    pub(crate) fn pool_at(&self, index: usize) -> Result<&ComponentPool, EcsError> {
        self.pools.get(index).ok_or(EcsError::UnknownPool(index))
    }

    pub(crate) fn pool_at_mut(&mut self, index: usize) -> Result<&mut ComponentPool, EcsError> {
        self.pools.get_mut(index).ok_or(EcsError::UnknownPool(index))
    }

    pub(crate) fn typed_pool_index<T: Component>(&self) -> Option<usize> {
        self.pools.iter().position(|p| p.meta().is::<T>())
    }

    fn typed_pool_or_create<T: Component>(&mut self) -> Result<usize, EcsError> {
        match self.typed_pool_index::<T>() {
            Some(index) => Ok(index),
            None => self.get_or_create_pool(&T::meta()),
        }
    }

    fn ensure_valid(&self, entity: Entity) -> Result<(), EcsError> {
        if self.registry.valid(entity) {
            Ok(())
        } else {
            Err(EcsError::StaleEntity(entity))
        }
    }

    // -- Component operations --

    /// Attach `value` to `entity` and return a reference to the stored copy.
    ///
    /// # Errors
    ///
    /// [`EcsError::StaleEntity`] for an invalid handle,
    /// [`EcsError::DuplicateComponent`] if `entity` already has a `T`.
    pub fn add_component<T: Component>(
        &mut self,
        entity: Entity,
        value: T,
    ) -> Result<&mut T, EcsError> {
        self.ensure_valid(entity)?;
        let index = self.typed_pool_or_create::<T>()?;
        trace!(%entity, component = T::type_name(), "adding component");
        self.pools[index].add(entity, value)
    }

    /// Attach a component given as raw bytes, keyed by its descriptor.
    ///
    /// # Errors
    ///
    /// [`EcsError::StaleEntity`], [`EcsError::DuplicateComponent`], or
    /// [`EcsError::LayoutMismatch`] if `bytes` has the wrong length.
    ///
    /// # Safety
    ///
    /// `bytes` must hold a valid value of the type `meta` describes; the
    /// world takes ownership of it.
    pub unsafe fn add_component_raw(
        &mut self,
        entity: Entity,
        meta: &ComponentMeta,
        bytes: &[u8],
    ) -> Result<NonNull<u8>, EcsError> {
        self.ensure_valid(entity)?;
        let index = self.get_or_create_pool(meta)?;
        // SAFETY: forwarded from the caller.
        unsafe { self.pools[index].add_raw(entity, bytes) }
    }

    /// Detach and drop `entity`'s `T`, running its destruction hook.
    ///
    /// # Errors
    ///
    /// [`EcsError::StaleEntity`] or [`EcsError::MissingComponent`].
    pub fn remove_component<T: Component>(&mut self, entity: Entity) -> Result<(), EcsError> {
        self.ensure_valid(entity)?;
        let index = self.typed_pool_index::<T>().ok_or(missing::<T>(entity))?;
        self.pools[index].remove(entity)
    }

    /// Detach `entity`'s `T` and return it. The destruction hook still runs.
    ///
    /// # Errors
    ///
    /// [`EcsError::StaleEntity`] or [`EcsError::MissingComponent`].
    pub fn take_component<T: Component>(&mut self, entity: Entity) -> Result<T, EcsError> {
        self.ensure_valid(entity)?;
        let index = self.typed_pool_index::<T>().ok_or(missing::<T>(entity))?;
        self.pools[index].take(entity)
    }

    #[must_use]
    pub fn has_component<T: Component>(&self, entity: Entity) -> bool {
        self.pool_of::<T>().is_some_and(|pool| pool.has(entity))
    }

    /// # Errors
    ///
    /// [`EcsError::StaleEntity`] or [`EcsError::MissingComponent`].
    pub fn get_component<T: Component>(&self, entity: Entity) -> Result<&T, EcsError> {
        self.ensure_valid(entity)?;
        self.pool_of::<T>()
            .ok_or(missing::<T>(entity))?
            .get(entity)
    }

    /// # Errors
    ///
    /// [`EcsError::StaleEntity`] or [`EcsError::MissingComponent`].
    pub fn get_component_mut<T: Component>(&mut self, entity: Entity) -> Result<&mut T, EcsError> {
        self.ensure_valid(entity)?;
        let index = self.typed_pool_index::<T>().ok_or(missing::<T>(entity))?;
        self.pools[index].get_mut(entity)
    }

    /// Hot-path lookup without validity or membership checks.
    ///
    /// # Safety
    ///
    /// `entity` must be valid and own a `T`.
    #[must_use]
    pub unsafe fn get_component_unchecked<T: Component>(&self, entity: Entity) -> &T {
        let Some(index) = self.typed_pool_index::<T>() else {
            // SAFETY: the caller guarantees a `T` exists, hence its pool.
            unsafe { std::hint::unreachable_unchecked() }
        };
        // SAFETY: forwarded from the caller.
        unsafe { self.pools[index].get_unchecked(entity) }
    }

    /// Address of `entity`'s component bytes for the type `type_id` names.
    /// Invalidated by the next add or remove on that pool.
    #[must_use]
    pub fn get_component_raw(&self, entity: Entity, type_id: ComponentTypeId) -> Option<NonNull<u8>> {
        if !self.registry.valid(entity) {
            return None;
        }
        self.pool(type_id)?.get_raw(entity)
    }

    /// A token for `entity`'s `T` that survives structural changes.
    ///
    /// # Errors
    ///
    /// [`EcsError::StaleEntity`] or [`EcsError::MissingComponent`].
    pub fn component_ref<T: Component>(&self, entity: Entity) -> Result<ComponentRef<T>, EcsError> {
        self.ensure_valid(entity)?;
        let pool_index = self.typed_pool_index::<T>().ok_or(missing::<T>(entity))?;
        let pool = &self.pools[pool_index];
        let dense_index = pool.dense_index(entity).ok_or(missing::<T>(entity))?;
        Ok(ComponentRef::new(entity, pool_index, dense_index, pool.version()))
    }

    // -- Hooks --

    /// Run `hook` on every `T` right after it is added.
    ///
    /// # Errors
    ///
    /// [`EcsError::LayoutMismatch`] on a type id collision.
    pub fn set_on_create<T, F>(&mut self, hook: F) -> Result<(), EcsError>
    where
        T: Component,
        F: FnMut(Entity, &mut T) + 'static,
    {
        let index = self.typed_pool_or_create::<T>()?;
        debug!(component = T::type_name(), "installed creation hook");
        self.pools[index].set_on_create(hook)
    }

    /// Run `hook` on every `T` right before it is removed, whether through
    /// [`World::remove_component`], [`World::destroy_entity`], or the world
    /// being dropped.
    ///
    /// # Errors
    ///
    /// [`EcsError::LayoutMismatch`] on a type id collision.
    pub fn set_on_destroy<T, F>(&mut self, hook: F) -> Result<(), EcsError>
    where
        T: Component,
        F: FnMut(Entity, &mut T) + 'static,
    {
        let index = self.typed_pool_or_create::<T>()?;
        debug!(component = T::type_name(), "installed destruction hook");
        self.pools[index].set_on_destroy(hook)
    }

    // -- Views --

    /// A view over every entity owning all the types in `S`.
    ///
    /// # Errors
    ///
    /// See [`World::view_of`].
    pub fn view<S: ComponentSet>(&mut self) -> Result<View, EcsError> {
        self.view_of(&S::metas())
    }

    /// A view over every entity owning all the described types.
    ///
    /// # Errors
    ///
    /// [`EcsError::EmptyView`], [`EcsError::TooManyViewTypes`], or
    /// [`EcsError::LayoutMismatch`] on a type id collision.
    pub fn view_of(&mut self, metas: &[ComponentMeta]) -> Result<View, EcsError> {
        View::new(self, metas)
    }

    /// A view over every entity owning a `T`.
    ///
    /// # Errors
    ///
    /// [`EcsError::LayoutMismatch`] on a type id collision.
    pub fn single_view<T: Component>(&mut self) -> Result<SingleView, EcsError> {
        let index = self.typed_pool_or_create::<T>()?;
        SingleView::new(self, index)
    }

    /// A deferred-destruction buffer bounded by this world's config.
    #[must_use]
    pub fn deferred_buffer(&self) -> EntityBuffer {
        match self.config.deferred_capacity {
            Some(limit) => EntityBuffer::bounded(limit),
            None => EntityBuffer::new(),
        }
    }
}

impl Default for World {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for World {
    fn drop(&mut self) {
        // Pools run destruction hooks for whatever they still hold.
        debug!(
            entities = self.registry.alive_count(),
            pools = self.pools.len(),
            "dropping world"
        );
    }
}

fn missing<T: Component>(entity: Entity) -> EcsError {
    EcsError::MissingComponent {
        entity,
        component: T::type_name(),
    }
}

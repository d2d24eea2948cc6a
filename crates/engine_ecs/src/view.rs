//! Cursors over one or more component pools.
//!
//! A view walks the dense array of its *driver* pool from the back. Walking
//! backward means swap-removing the current entity only moves an
//! already-visited element into its slot, so systems can remove components
//! as they go without skipping or revisiting anything.
//!
//! Views hold pool indices rather than borrows. Every accessor takes the
//! [`World`] explicitly, which lets a system interleave structural mutation
//! with iteration:
//!
//! ```rust
//! use engine_ecs::{Component, ViewCursor, World};
//!
//! #[derive(Debug, Clone, Copy)]
//! struct Health(i32);
//! impl Component for Health {}
//!
//! let mut world = World::new();
//! for hp in [3, 0, 5] {
//!     let e = world.new_entity();
//!     world.add_component(e, Health(hp)).unwrap();
//! }
//!
//! let mut view = world.single_view::<Health>().unwrap();
//! while view.valid() {
//!     let entity = view.entity();
//!     if view.get::<Health>(&world).unwrap().0 <= 0 {
//!         world.remove_component::<Health>(entity).unwrap();
//!     }
//!     view.advance(&world);
//! }
//! assert_eq!(world.pool_of::<Health>().unwrap().len(), 2);
//! ```

use tracing::trace;

use crate::component::{Component, ComponentMeta};
use crate::entity::Entity;
use crate::error::EcsError;
use crate::pool::ComponentPool;
use crate::world::World;

/// Maximum number of component types a multi-type view can intersect.
pub const MAX_VIEW_TYPES: usize = 8;

/// Shared cursor behavior of [`View`] and [`SingleView`].
pub trait ViewCursor {
    /// Returns `true` while the cursor is positioned on an entity.
    fn valid(&self) -> bool;

    /// The current entity, or [`Entity::NULL`] once exhausted.
    fn entity(&self) -> Entity;

    /// Move to the next qualifying entity. Does nothing once exhausted.
    fn advance(&mut self, world: &World);

    /// A borrowing iterator over the remaining qualifying entities.
    fn iter(self, world: &World) -> ViewIter<'_, Self>
    where
        Self: Sized,
    {
        ViewIter { world, cursor: self }
    }
}

/// Step one slot backward from `index` in `pool`.
///
/// `index` is clamped to the pool's current length first, so a pool that
/// shrank under the cursor never indexes out of bounds.
fn step_back(pool: &ComponentPool, index: usize) -> Option<(usize, Entity)> {
    let next = index.min(pool.len()).checked_sub(1)?;
    Some((next, pool.entities()[next]))
}

/// Cursor over every entity owning all of a set of component types.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct View {
    pools: [usize; MAX_VIEW_TYPES],
    pool_count: usize,
    driver: usize,
    index: usize,
    current: Entity,
}

impl View {
    pub(crate) fn new(world: &mut World, metas: &[ComponentMeta]) -> Result<Self, EcsError> {
        if metas.is_empty() {
            return Err(EcsError::EmptyView);
        }
        if metas.len() > MAX_VIEW_TYPES {
            return Err(EcsError::TooManyViewTypes {
                requested: metas.len(),
                max: MAX_VIEW_TYPES,
            });
        }

        let mut pools = [0; MAX_VIEW_TYPES];
        for (slot, meta) in pools.iter_mut().zip(metas) {
            *slot = world.get_or_create_pool(meta)?;
        }
        let pool_count = metas.len();

        // Smallest pool drives; the first one wins a tie.
        let mut driver = pools[0];
        let mut driver_len = world.pool_at(driver)?.len();
        for &candidate in &pools[1..pool_count] {
            let len = world.pool_at(candidate)?.len();
            if len < driver_len {
                driver = candidate;
                driver_len = len;
            }
        }

        let mut view = Self {
            pools,
            pool_count,
            driver,
            index: driver_len,
            current: Entity::NULL,
        };
        trace!(
            types = pool_count,
            driver = world.pool_at(driver)?.meta().name,
            candidates = driver_len,
            "created view"
        );
        view.seek(world);
        Ok(view)
    }

    /// Indices of the participating pools, in request order.
    #[must_use]
    pub fn pools(&self) -> &[usize] {
        &self.pools[..self.pool_count]
    }

    /// Index of the pool this view walks.
    #[must_use]
    pub fn driver(&self) -> usize {
        self.driver
    }

    /// The current entity's `T`.
    ///
    /// # Errors
    ///
    /// [`EcsError::ViewExhausted`], [`EcsError::NotInView`] if `T` is not
    /// one of the view's types, or [`EcsError::MissingComponent`] if the
    /// component was removed after the cursor moved here.
    pub fn get<'w, T: Component>(&self, world: &'w World) -> Result<&'w T, EcsError> {
        let pool = self.pool_for::<T>(world)?;
        world.pool_at(pool)?.get(self.current)
    }

    /// Mutable access to the current entity's `T`.
    ///
    /// # Errors
    ///
    /// Same as [`View::get`].
    pub fn get_mut<'w, T: Component>(&self, world: &'w mut World) -> Result<&'w mut T, EcsError> {
        let pool = self.pool_for::<T>(world)?;
        world.pool_at_mut(pool)?.get_mut(self.current)
    }

    fn pool_for<T: Component>(&self, world: &World) -> Result<usize, EcsError> {
        if !self.valid() {
            return Err(EcsError::ViewExhausted);
        }
        for &p in self.pools() {
            if world.pool_at(p)?.meta().is::<T>() {
                return Ok(p);
            }
        }
        Err(EcsError::NotInView(T::type_name()))
    }

    /// Walk the driver backward from `self.index` until every pool has the
    /// candidate, or mark the view exhausted. A world without the view's
    /// pools exhausts it.
    fn seek(&mut self, world: &World) {
        let Ok(driver) = world.pool_at(self.driver) else {
            self.exhaust();
            return;
        };
        while let Some((index, candidate)) = step_back(driver, self.index) {
            self.index = index;
            let qualifies = self.pools().iter().all(|&p| {
                p == self.driver || world.pool_at(p).is_ok_and(|pool| pool.has(candidate))
            });
            if qualifies {
                self.current = candidate;
                return;
            }
        }
        self.exhaust();
    }

    fn exhaust(&mut self) {
        self.index = 0;
        self.current = Entity::NULL;
    }
}

impl ViewCursor for View {
    fn valid(&self) -> bool {
        !self.current.is_null()
    }

    fn entity(&self) -> Entity {
        self.current
    }

    fn advance(&mut self, world: &World) {
        if self.valid() {
            self.seek(world);
        }
    }
}

/// Cursor over every entity in a single pool.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SingleView {
    pool: usize,
    index: usize,
    current: Entity,
}

impl SingleView {
    pub(crate) fn new(world: &World, pool: usize) -> Result<Self, EcsError> {
        let mut view = Self {
            pool,
            index: world.pool_at(pool)?.len(),
            current: Entity::NULL,
        };
        view.step(world);
        Ok(view)
    }

    /// Index of the pool this view walks.
    #[must_use]
    pub fn pool(&self) -> usize {
        self.pool
    }

    /// The current entity's `T`.
    ///
    /// # Errors
    ///
    /// [`EcsError::ViewExhausted`], [`EcsError::NotInView`] for any type
    /// other than the pool's, or [`EcsError::MissingComponent`] if the
    /// component was removed after the cursor moved here.
    pub fn get<'w, T: Component>(&self, world: &'w World) -> Result<&'w T, EcsError> {
        self.check::<T>(world)?;
        world.pool_at(self.pool)?.get(self.current)
    }

    /// # Errors
    ///
    /// Same as [`SingleView::get`].
    pub fn get_mut<'w, T: Component>(&self, world: &'w mut World) -> Result<&'w mut T, EcsError> {
        self.check::<T>(world)?;
        world.pool_at_mut(self.pool)?.get_mut(self.current)
    }

    fn check<T: Component>(&self, world: &World) -> Result<(), EcsError> {
        if !self.valid() {
            return Err(EcsError::ViewExhausted);
        }
        if !world.pool_at(self.pool)?.meta().is::<T>() {
            return Err(EcsError::NotInView(T::type_name()));
        }
        Ok(())
    }

    fn step(&mut self, world: &World) {
        let next = world
            .pool_at(self.pool)
            .ok()
            .and_then(|pool| step_back(pool, self.index));
        match next {
            Some((index, entity)) => {
                self.index = index;
                self.current = entity;
            }
            None => {
                self.index = 0;
                self.current = Entity::NULL;
            }
        }
    }
}

impl ViewCursor for SingleView {
    fn valid(&self) -> bool {
        !self.current.is_null()
    }

    fn entity(&self) -> Entity {
        self.current
    }

    fn advance(&mut self, world: &World) {
        if self.valid() {
            self.step(world);
        }
    }
}

/// Iterator adapter returned by [`ViewCursor::iter`].
#[derive(Debug)]
pub struct ViewIter<'w, C> {
    world: &'w World,
    cursor: C,
}

impl<C: ViewCursor> Iterator for ViewIter<'_, C> {
    type Item = Entity;

    fn next(&mut self) -> Option<Entity> {
        if !self.cursor.valid() {
            return None;
        }
        let entity = self.cursor.entity();
        self.cursor.advance(self.world);
        Some(entity)
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use super::*;

    #[derive(Debug, Clone, Copy, PartialEq)]
    struct X(i32);

    impl Component for X {}

    #[derive(Debug, Clone, Copy, PartialEq)]
    struct Y(i32);

    impl Component for Y {}

    #[derive(Debug, Clone, Copy, PartialEq)]
    struct Z;

    impl Component for Z {}

    fn spawn(world: &mut World, n: usize) -> Vec<Entity> {
        (0..n).map(|_| world.new_entity()).collect()
    }

    #[test]
    fn test_single_view_visits_in_reverse() {
        let mut world = World::new();
        let e = spawn(&mut world, 3);
        for (i, &entity) in e.iter().enumerate() {
            world.add_component(entity, X(i as i32)).unwrap();
        }
        let visited: Vec<Entity> = world.single_view::<X>().unwrap().iter(&world).collect();
        assert_eq!(visited, vec![e[2], e[1], e[0]]);
    }

    #[test]
    fn test_scenario_iterate_after_remove() {
        let mut world = World::new();
        let e = spawn(&mut world, 3);
        for &entity in &e {
            world.add_component(entity, X(0)).unwrap();
        }
        world.remove_component::<X>(e[1]).unwrap();

        let visited: Vec<Entity> = world.single_view::<X>().unwrap().iter(&world).collect();
        assert_eq!(visited.len(), 2);
        assert_eq!(
            visited.into_iter().collect::<HashSet<_>>(),
            HashSet::from([e[0], e[2]])
        );
    }

    #[test]
    fn test_scenario_intersection() {
        let mut world = World::new();
        let e = spawn(&mut world, 3);
        world.add_component(e[0], X(0)).unwrap();
        world.add_component(e[1], X(1)).unwrap();
        world.add_component(e[1], Y(1)).unwrap();
        world.add_component(e[2], Y(2)).unwrap();

        let visited: Vec<Entity> = world.view::<(X, Y)>().unwrap().iter(&world).collect();
        assert_eq!(visited, vec![e[1]]);
    }

    #[test]
    fn test_intersection_is_independent_of_order_and_driver() {
        let mut world = World::new();
        let e = spawn(&mut world, 20);
        let mut expected = HashSet::new();
        for (i, &entity) in e.iter().enumerate() {
            if i % 2 == 0 {
                world.add_component(entity, X(i as i32)).unwrap();
            }
            if i % 3 == 0 {
                world.add_component(entity, Y(i as i32)).unwrap();
            }
            if i % 2 == 0 && i % 3 == 0 {
                expected.insert(entity);
            }
        }

        let xy = world.view::<(X, Y)>().unwrap();
        let yx = world.view::<(Y, X)>().unwrap();
        // Y is the smaller pool either way.
        assert_eq!(xy.driver(), yx.driver());

        let a: Vec<Entity> = xy.iter(&world).collect();
        let b: Vec<Entity> = yx.iter(&world).collect();
        assert_eq!(a.len(), expected.len());
        assert_eq!(a.iter().copied().collect::<HashSet<_>>(), expected);
        assert_eq!(b.into_iter().collect::<HashSet<_>>(), expected);
    }

    #[test]
    fn test_view_get_and_get_mut() {
        let mut world = World::new();
        let a = world.new_entity();
        world.add_component(a, X(1)).unwrap();
        world.add_component(a, Y(2)).unwrap();

        let view = world.view::<(X, Y)>().unwrap();
        assert!(view.valid());
        assert_eq!(view.entity(), a);
        assert_eq!(view.get::<Y>(&world).unwrap(), &Y(2));
        view.get_mut::<X>(&mut world).unwrap().0 = 10;
        assert_eq!(world.get_component::<X>(a).unwrap(), &X(10));
        assert_eq!(
            view.get::<Z>(&world),
            Err(EcsError::NotInView(Z::type_name()))
        );
    }

    #[test]
    fn test_removal_during_single_view_iteration() {
        let mut world = World::new();
        let e = spawn(&mut world, 10);
        for (i, &entity) in e.iter().enumerate() {
            world.add_component(entity, X(i as i32)).unwrap();
        }

        let mut seen = Vec::new();
        let mut view = world.single_view::<X>().unwrap();
        while view.valid() {
            let entity = view.entity();
            seen.push(entity);
            if view.get::<X>(&world).unwrap().0 % 3 == 0 {
                world.remove_component::<X>(entity).unwrap();
            }
            view.advance(&world);
        }

        assert_eq!(seen.len(), 10);
        assert_eq!(seen.iter().copied().collect::<HashSet<_>>().len(), 10);
        assert_eq!(world.pool_of::<X>().unwrap().len(), 6);
    }

    #[test]
    fn test_removal_during_multi_view_iteration() {
        let mut world = World::new();
        let e = spawn(&mut world, 8);
        for &entity in &e {
            world.add_component(entity, X(0)).unwrap();
            world.add_component(entity, Y(0)).unwrap();
        }

        let mut seen = HashSet::new();
        let mut view = world.view::<(X, Y)>().unwrap();
        while view.valid() {
            let entity = view.entity();
            assert!(seen.insert(entity));
            world.remove_component::<Y>(entity).unwrap();
            view.advance(&world);
        }
        assert_eq!(seen.len(), 8);
        assert!(world.pool_of::<Y>().unwrap().is_empty());
    }

    #[test]
    fn test_removing_driver_component_during_multi_view_iteration() {
        let mut world = World::new();
        let e = spawn(&mut world, 12);
        let mut expected = HashSet::new();
        for (i, &entity) in e.iter().enumerate() {
            world.add_component(entity, X(i as i32)).unwrap();
            if i % 2 == 0 {
                world.add_component(entity, Y(i as i32)).unwrap();
                expected.insert(entity);
            }
        }

        let mut view = world.view::<(X, Y)>().unwrap();
        // Y is strictly smaller, so it drives.
        assert_eq!(view.driver(), view.pools()[1]);

        let mut seen = HashSet::new();
        while view.valid() {
            let entity = view.entity();
            assert!(seen.insert(entity));
            world.remove_component::<Y>(entity).unwrap();
            view.advance(&world);
        }
        assert_eq!(seen, expected);
        assert!(world.pool_of::<Y>().unwrap().is_empty());
        assert_eq!(world.pool_of::<X>().unwrap().len(), 12);
    }

    #[test]
    fn test_entities_added_during_iteration_are_not_visited() {
        let mut world = World::new();
        let e = spawn(&mut world, 3);
        for &entity in &e {
            world.add_component(entity, X(0)).unwrap();
        }

        let mut visited = 0;
        let mut view = world.single_view::<X>().unwrap();
        while view.valid() {
            visited += 1;
            let spawned = world.new_entity();
            world.add_component(spawned, X(1)).unwrap();
            view.advance(&world);
        }
        assert_eq!(visited, 3);
    }

    #[test]
    fn test_exhausted_is_absorbing() {
        let mut world = World::new();
        let a = world.new_entity();
        world.add_component(a, X(0)).unwrap();

        let mut view = world.single_view::<X>().unwrap();
        view.advance(&world);
        assert!(!view.valid());
        assert_eq!(view.entity(), Entity::NULL);
        assert_eq!(view.get::<X>(&world), Err(EcsError::ViewExhausted));

        let b = world.new_entity();
        world.add_component(b, X(1)).unwrap();
        view.advance(&world);
        assert!(!view.valid());
    }

    #[test]
    fn test_empty_pools_start_exhausted() {
        let mut world = World::new();
        assert!(!world.single_view::<X>().unwrap().valid());
        let a = world.new_entity();
        world.add_component(a, X(0)).unwrap();
        // No entity has both.
        assert!(!world.view::<(X, Y)>().unwrap().valid());
    }

    #[test]
    fn test_view_type_count_limits() {
        let mut world = World::new();
        assert_eq!(world.view_of(&[]).unwrap_err(), EcsError::EmptyView);

        let metas = vec![X::meta(); MAX_VIEW_TYPES + 1];
        assert_eq!(
            world.view_of(&metas).unwrap_err(),
            EcsError::TooManyViewTypes {
                requested: MAX_VIEW_TYPES + 1,
                max: MAX_VIEW_TYPES,
            }
        );
    }

    #[test]
    fn test_driver_tie_prefers_first() {
        let mut world = World::new();
        let a = world.new_entity();
        world.add_component(a, X(0)).unwrap();
        world.add_component(a, Y(0)).unwrap();
        let view = world.view::<(Y, X)>().unwrap();
        assert_eq!(view.driver(), view.pools()[0]);
    }

    #[test]
    fn test_view_used_with_another_world() {
        let mut world = World::new();
        let a = world.new_entity();
        world.add_component(a, X(0)).unwrap();
        world.add_component(a, Y(0)).unwrap();
        let mut view = world.view::<(X, Y)>().unwrap();
        let mut single = world.single_view::<Y>().unwrap();

        let mut other = World::new();
        assert_eq!(view.get::<X>(&other), Err(EcsError::UnknownPool(0)));
        assert_eq!(
            single.get_mut::<Y>(&mut other).unwrap_err(),
            EcsError::UnknownPool(1)
        );
        view.advance(&other);
        single.advance(&other);
        assert!(!view.valid());
        assert!(!single.valid());
    }

    #[test]
    fn test_pool_shrinking_under_cursor_is_clamped() {
        let mut world = World::new();
        let e = spawn(&mut world, 4);
        for &entity in &e {
            world.add_component(entity, X(0)).unwrap();
        }

        let mut view = world.single_view::<X>().unwrap();
        for &entity in &e {
            world.remove_component::<X>(entity).unwrap();
        }
        view.advance(&world);
        assert!(!view.valid());
    }
}

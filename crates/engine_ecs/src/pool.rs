//! Type-erased sparse-set storage for a single component type.
//!
//! A [`ComponentPool`] keeps three arrays in lockstep:
//!
//! - `sparse`: entity id → dense index ([`ABSENT`] when the id has no
//!   component here),
//! - `dense`: dense index → owning entity,
//! - `data`: dense index → component bytes, laid out per the pool's
//!   [`ComponentMeta`].
//!
//! For every live dense index `i`, `sparse[dense[i].id()] == i`. Removal
//! moves the last element into the vacated slot, so all three operations
//! (add, has/get, remove) are O(1) and `data` stays packed.
//!
//! References handed out by a pool borrow it, so they cannot survive the
//! next `add` or `remove` on the same pool: growth reallocates `data` and
//! swap-compaction moves bytes around.

use std::alloc::{self, Layout};
use std::ptr::{self, NonNull};

use crate::component::{Component, ComponentMeta};
use crate::entity::Entity;
use crate::error::EcsError;
use crate::grow_capacity;

/// Sparse entry for ids that own no component in this pool.
pub const ABSENT: u32 = u32::MAX;

/// Lifecycle hook invoked with the entity and a pointer to its component.
type Hook = Box<dyn FnMut(Entity, *mut u8)>;

/// Sparse-set storage for one component type.
pub struct ComponentPool {
    meta: ComponentMeta,
    sparse: Vec<u32>,
    /// Owning entities. Its length is the element count of the pool.
    dense: Vec<Entity>,
    data: NonNull<u8>,
    /// Element slots allocated behind `data`.
    capacity: usize,
    /// Bumped on every structural change (add or remove).
    version: u64,
    on_create: Option<Hook>,
    on_destroy: Option<Hook>,
}

impl ComponentPool {
    /// Create an empty pool with room for `capacity` components.
    ///
    /// Pools are only built by the [`World`](crate::World), which validates
    /// every handle before it reaches a pool.
    #[must_use]
    pub(crate) fn with_capacity(meta: ComponentMeta, capacity: usize) -> Self {
        let zero_sized = meta.layout.size() == 0;
        // SAFETY: alignment is never zero. Zero-sized components never
        // allocate; an aligned dangling pointer is all they need.
        let data = unsafe {
            NonNull::new_unchecked(ptr::without_provenance_mut::<u8>(meta.layout.align()))
        };

        let mut pool = Self {
            meta,
            sparse: Vec::new(),
            dense: Vec::with_capacity(capacity),
            data,
            capacity: if zero_sized { usize::MAX } else { 0 },
            version: 0,
            on_create: None,
            on_destroy: None,
        };
        if capacity > 0 && !zero_sized {
            pool.grow_data(capacity);
        }
        pool
    }

    /// The descriptor this pool was created with.
    #[must_use]
    pub fn meta(&self) -> &ComponentMeta {
        &self.meta
    }

    /// Number of components stored.
    #[must_use]
    pub fn len(&self) -> usize {
        self.dense.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.dense.is_empty()
    }

    /// Owning entities in dense order.
    #[must_use]
    pub fn entities(&self) -> &[Entity] {
        &self.dense
    }

    /// Structural version, bumped by every add and remove.
    #[must_use]
    pub fn version(&self) -> u64 {
        self.version
    }

    /// Dense index of `entity`, if this exact handle owns a component here.
    #[inline]
    #[must_use]
    pub fn dense_index(&self, entity: Entity) -> Option<usize> {
        let slot = *self.sparse.get(entity.index())?;
        if slot == ABSENT {
            return None;
        }
        let index = slot as usize;
        (self.dense[index] == entity).then_some(index)
    }

    /// Returns `true` if `entity` owns a component in this pool.
    #[inline]
    #[must_use]
    pub fn has(&self, entity: Entity) -> bool {
        self.dense_index(entity).is_some()
    }

    /// Store `value` for `entity` and return a reference to it.
    ///
    /// The creation hook, if any, runs on the stored value before this
    /// returns.
    ///
    /// # Errors
    ///
    /// [`EcsError::LayoutMismatch`] if `T` is not this pool's type,
    /// [`EcsError::DuplicateComponent`] if the entity's id already has a
    /// component here.
    pub(crate) fn add<T: Component>(&mut self, entity: Entity, value: T) -> Result<&mut T, EcsError> {
        self.check_type::<T>()?;
        self.check_vacant(entity)?;

        let value = std::mem::ManuallyDrop::new(value);
        // SAFETY: the type matches this pool and the value is moved in
        // bytewise; `ManuallyDrop` keeps the original from being dropped.
        let stored = unsafe { self.push_unchecked(entity, ptr::from_ref::<T>(&*value).cast::<u8>()) };
        // SAFETY: `stored` points at the `T` just written.
        Ok(unsafe { &mut *stored.cast::<T>().as_ptr() })
    }

    /// Store a component given as raw bytes.
    ///
    /// # Errors
    ///
    /// [`EcsError::LayoutMismatch`] if `bytes` is not exactly one element
    /// long, [`EcsError::DuplicateComponent`] if the entity's id already has
    /// a component here.
    ///
    /// # Safety
    ///
    /// `bytes` must be the representation of a valid value of this pool's
    /// type, and ownership of that value passes to the pool.
    pub(crate) unsafe fn add_raw(&mut self, entity: Entity, bytes: &[u8]) -> Result<NonNull<u8>, EcsError> {
        if bytes.len() != self.meta.layout.size() {
            return Err(EcsError::LayoutMismatch {
                component: self.meta.name,
            });
        }
        self.check_vacant(entity)?;
        // SAFETY: the caller guarantees `bytes` holds a valid value.
        Ok(unsafe { self.push_unchecked(entity, bytes.as_ptr()) })
    }

    /// Remove `entity`'s component, running the destruction hook and then
    /// dropping the value.
    ///
    /// # Errors
    ///
    /// [`EcsError::MissingComponent`] if `entity` has no component here.
    pub(crate) fn remove(&mut self, entity: Entity) -> Result<(), EcsError> {
        let index = self.dense_index(entity).ok_or(EcsError::MissingComponent {
            entity,
            component: self.meta.name,
        })?;

        let ptr = self.slot_ptr(index);
        if let Some(hook) = self.on_destroy.as_mut() {
            hook(entity, ptr);
        }
        if let Some(drop_fn) = self.meta.drop_fn {
            // SAFETY: the slot holds a live value that is about to be
            // overwritten or forgotten by the compaction below.
            unsafe { drop_fn(ptr) };
        }
        self.swap_compact(index, entity);
        Ok(())
    }

    /// Remove `entity`'s component and hand it back instead of dropping it.
    /// The destruction hook still runs first.
    ///
    /// # Errors
    ///
    /// [`EcsError::LayoutMismatch`] if `T` is not this pool's type,
    /// [`EcsError::MissingComponent`] if `entity` has no component here.
    pub(crate) fn take<T: Component>(&mut self, entity: Entity) -> Result<T, EcsError> {
        self.check_type::<T>()?;
        let index = self.dense_index(entity).ok_or(EcsError::MissingComponent {
            entity,
            component: self.meta.name,
        })?;

        let ptr = self.slot_ptr(index);
        if let Some(hook) = self.on_destroy.as_mut() {
            hook(entity, ptr);
        }
        // SAFETY: the slot holds a live `T`; compaction forgets the bytes.
        let value = unsafe { ptr::read(ptr.cast::<T>()) };
        self.swap_compact(index, entity);
        Ok(value)
    }

    /// # Errors
    ///
    /// [`EcsError::LayoutMismatch`] if `T` is not this pool's type,
    /// [`EcsError::MissingComponent`] if `entity` has no component here.
    pub fn get<T: Component>(&self, entity: Entity) -> Result<&T, EcsError> {
        self.check_type::<T>()?;
        let index = self.dense_index(entity).ok_or(EcsError::MissingComponent {
            entity,
            component: self.meta.name,
        })?;
        // SAFETY: type checked above, `index` is live.
        Ok(unsafe { &*self.slot_ptr(index).cast::<T>() })
    }

    /// # Errors
    ///
    /// Same as [`ComponentPool::get`].
    pub fn get_mut<T: Component>(&mut self, entity: Entity) -> Result<&mut T, EcsError> {
        self.check_type::<T>()?;
        let index = self.dense_index(entity).ok_or(EcsError::MissingComponent {
            entity,
            component: self.meta.name,
        })?;
        // SAFETY: type checked above, `index` is live, and `&mut self`
        // guarantees exclusivity.
        Ok(unsafe { &mut *self.slot_ptr(index).cast::<T>() })
    }

    /// Hot-path access without type, membership or generation checks.
    ///
    /// # Safety
    ///
    /// `T` must be this pool's type and `entity` must own a component here.
    #[inline]
    #[must_use]
    pub unsafe fn get_unchecked<T: Component>(&self, entity: Entity) -> &T {
        debug_assert!(self.meta.is::<T>());
        debug_assert!(self.has(entity));
        // SAFETY: guaranteed by the caller.
        unsafe {
            let index = *self.sparse.get_unchecked(entity.index()) as usize;
            &*self.slot_ptr(index).cast::<T>()
        }
    }

    /// Mutable counterpart of [`ComponentPool::get_unchecked`].
    ///
    /// # Safety
    ///
    /// Same contract as [`ComponentPool::get_unchecked`].
    #[inline]
    pub unsafe fn get_unchecked_mut<T: Component>(&mut self, entity: Entity) -> &mut T {
        debug_assert!(self.meta.is::<T>());
        debug_assert!(self.has(entity));
        // SAFETY: guaranteed by the caller.
        unsafe {
            let index = *self.sparse.get_unchecked(entity.index()) as usize;
            &mut *self.slot_ptr(index).cast::<T>()
        }
    }

    /// Address of `entity`'s component bytes. The pointer is invalidated by
    /// the next add or remove on this pool.
    #[must_use]
    pub fn get_raw(&self, entity: Entity) -> Option<NonNull<u8>> {
        let index = self.dense_index(entity)?;
        NonNull::new(self.slot_ptr(index))
    }

    /// Typed access by dense index, for views and component refs that have
    /// already resolved the slot.
    pub(crate) fn get_at<T: Component>(&self, index: usize) -> Option<&T> {
        if !self.meta.is::<T>() || index >= self.dense.len() {
            return None;
        }
        // SAFETY: type checked, index in bounds.
        Some(unsafe { &*self.slot_ptr(index).cast::<T>() })
    }

    pub(crate) fn get_at_mut<T: Component>(&mut self, index: usize) -> Option<&mut T> {
        if !self.meta.is::<T>() || index >= self.dense.len() {
            return None;
        }
        // SAFETY: type checked, index in bounds, exclusive borrow.
        Some(unsafe { &mut *self.slot_ptr(index).cast::<T>() })
    }

    /// Install the hook run after a component is added.
    ///
    /// # Errors
    ///
    /// [`EcsError::LayoutMismatch`] if `T` is not this pool's type.
    pub fn set_on_create<T, F>(&mut self, hook: F) -> Result<(), EcsError>
    where
        T: Component,
        F: FnMut(Entity, &mut T) + 'static,
    {
        self.check_type::<T>()?;
        self.on_create = Some(erase_hook(hook));
        Ok(())
    }

    /// Install the hook run before a component is removed, including removal
    /// through entity destruction and pool teardown. This is where a
    /// component releases resources it owns outside the ECS.
    ///
    /// # Errors
    ///
    /// [`EcsError::LayoutMismatch`] if `T` is not this pool's type.
    pub fn set_on_destroy<T, F>(&mut self, hook: F) -> Result<(), EcsError>
    where
        T: Component,
        F: FnMut(Entity, &mut T) + 'static,
    {
        self.check_type::<T>()?;
        self.on_destroy = Some(erase_hook(hook));
        Ok(())
    }

    fn check_type<T: Component>(&self) -> Result<(), EcsError> {
        if self.meta.is::<T>() {
            Ok(())
        } else {
            Err(EcsError::LayoutMismatch {
                component: T::type_name(),
            })
        }
    }

    /// Double insertion for the same id would corrupt the sparse/dense
    /// mapping, so it is rejected whatever the generation.
    fn check_vacant(&self, entity: Entity) -> Result<(), EcsError> {
        if entity.id() == Entity::NULL_ID {
            return Err(EcsError::StaleEntity(entity));
        }
        match self.sparse.get(entity.index()) {
            Some(&slot) if slot != ABSENT => Err(EcsError::DuplicateComponent {
                entity,
                component: self.meta.name,
            }),
            _ => Ok(()),
        }
    }

    /// Append `entity` with the element bytes at `src`.
    ///
    /// # Safety
    ///
    /// `src` must point to `layout.size()` readable bytes forming a valid
    /// value of this pool's type, and `entity`'s id must be vacant.
    unsafe fn push_unchecked(&mut self, entity: Entity, src: *const u8) -> NonNull<u8> {
        if self.dense.len() == self.capacity {
            self.grow_data(0);
        }
        self.grow_sparse(entity.index());
        if self.dense.len() == self.dense.capacity() {
            let additional = grow_capacity(self.dense.capacity()) - self.dense.len();
            self.dense.reserve_exact(additional);
        }

        let index = self.dense.len();
        let dst = self.slot_ptr(index);
        // SAFETY: `dst` is an unused slot inside the allocation; the caller
        // vouches for `src`. Byte copies need no alignment.
        unsafe { ptr::copy_nonoverlapping(src, dst, self.meta.layout.size()) };

        self.sparse[entity.index()] = index as u32;
        self.dense.push(entity);
        self.version += 1;

        if let Some(hook) = self.on_create.as_mut() {
            hook(entity, dst);
        }
        // SAFETY: derived from the non-null `data` pointer.
        unsafe { NonNull::new_unchecked(dst) }
    }

    /// Move the last element into `index` and shrink by one. The value at
    /// `index` must already have been dropped or moved out.
    fn swap_compact(&mut self, index: usize, removed: Entity) {
        let last = self.dense.len() - 1;
        if index != last {
            let moved = self.dense[last];
            // SAFETY: both slots are in bounds and distinct.
            unsafe {
                ptr::copy_nonoverlapping(
                    self.slot_ptr(last),
                    self.slot_ptr(index),
                    self.meta.layout.size(),
                );
            }
            self.dense[index] = moved;
            self.sparse[moved.index()] = index as u32;
        }
        self.dense.pop();
        self.sparse[removed.index()] = ABSENT;
        self.version += 1;
    }

    fn grow_sparse(&mut self, id: usize) {
        if id < self.sparse.len() {
            return;
        }
        let mut len = grow_capacity(self.sparse.len());
        while len <= id {
            len = grow_capacity(len);
        }
        self.sparse.resize(len, ABSENT);
    }

    /// Reallocate `data` to at least `min_capacity` slots, doubling from 8.
    fn grow_data(&mut self, min_capacity: usize) {
        let capacity = grow_capacity(self.capacity).max(min_capacity);
        let new_layout = array_layout(&self.meta.layout, capacity);

        let raw = if self.capacity == 0 {
            // SAFETY: non-zero size, zero-sized types never get here.
            unsafe { alloc::alloc(new_layout) }
        } else {
            let old_layout = array_layout(&self.meta.layout, self.capacity);
            // SAFETY: `data` was allocated with `old_layout`.
            unsafe { alloc::realloc(self.data.as_ptr(), old_layout, new_layout.size()) }
        };

        self.data = NonNull::new(raw).unwrap_or_else(|| alloc::handle_alloc_error(new_layout));
        self.capacity = capacity;
    }

    fn slot_ptr(&self, index: usize) -> *mut u8 {
        // SAFETY: callers only pass indices below `capacity`.
        unsafe { self.data.as_ptr().add(index * self.meta.layout.size()) }
    }
}

impl Drop for ComponentPool {
    fn drop(&mut self) {
        for index in 0..self.dense.len() {
            let entity = self.dense[index];
            let ptr = self.slot_ptr(index);
            if let Some(hook) = self.on_destroy.as_mut() {
                hook(entity, ptr);
            }
            if let Some(drop_fn) = self.meta.drop_fn {
                // SAFETY: every dense slot holds a live value.
                unsafe { drop_fn(ptr) };
            }
        }
        self.dense.clear();

        if self.meta.layout.size() != 0 && self.capacity != 0 {
            // SAFETY: allocated in `grow_data` with this exact layout.
            unsafe {
                alloc::dealloc(
                    self.data.as_ptr(),
                    array_layout(&self.meta.layout, self.capacity),
                );
            }
        }
    }
}

impl std::fmt::Debug for ComponentPool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ComponentPool")
            .field("component", &self.meta.name)
            .field("len", &self.dense.len())
            .field("capacity", &self.capacity)
            .field("version", &self.version)
            .field("on_create", &self.on_create.is_some())
            .field("on_destroy", &self.on_destroy.is_some())
            .finish()
    }
}

fn erase_hook<T, F>(mut hook: F) -> Hook
where
    T: Component,
    F: FnMut(Entity, &mut T) + 'static,
{
    Box::new(move |entity, ptr| {
        // SAFETY: pools only invoke hooks on live slots of their own type,
        // and the type was checked when the hook was installed.
        let value = unsafe { &mut *ptr.cast::<T>() };
        hook(entity, value);
    })
}

fn array_layout(item: &Layout, count: usize) -> Layout {
    item.size()
        .checked_mul(count)
        .and_then(|size| Layout::from_size_align(size, item.align()).ok())
        .unwrap_or_else(|| panic!("component pool capacity overflow ({count} elements)"))
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;
    use std::rc::Rc;

    use super::*;

    #[derive(Debug, Clone, Copy, PartialEq)]
    struct Position {
        x: f32,
        y: f32,
    }

    impl Component for Position {}

    #[derive(Debug, Clone, PartialEq)]
    struct Name(String);

    impl Component for Name {}

    #[derive(Debug, Clone, Copy, PartialEq)]
    struct Marker;

    impl Component for Marker {}

    fn entity(id: u32) -> Entity {
        Entity::new(id, 0)
    }

    fn pos(x: f32) -> Position {
        Position { x, y: -x }
    }

    #[test]
    fn test_add_has_get() {
        let mut pool = ComponentPool::with_capacity(Position::meta(), 0);
        let e = entity(3);
        assert!(!pool.has(e));

        let stored = pool.add(e, pos(1.0)).unwrap();
        assert_eq!(*stored, pos(1.0));
        assert!(pool.has(e));
        assert_eq!(pool.get::<Position>(e).unwrap(), &pos(1.0));
        assert_eq!(pool.len(), 1);
    }

    #[test]
    fn test_remove_clears_membership() {
        let mut pool = ComponentPool::with_capacity(Position::meta(), 0);
        let e = entity(0);
        pool.add(e, pos(1.0)).unwrap();
        pool.remove(e).unwrap();
        assert!(!pool.has(e));
        assert!(pool.is_empty());
        assert!(matches!(
            pool.get::<Position>(e),
            Err(EcsError::MissingComponent { .. })
        ));
    }

    #[test]
    fn test_swap_remove_preserves_other_values() {
        let mut pool = ComponentPool::with_capacity(Position::meta(), 0);
        for id in 0..20 {
            pool.add(entity(id), pos(id as f32)).unwrap();
        }
        for id in [0, 7, 19, 4] {
            pool.remove(entity(id)).unwrap();
        }

        assert_eq!(pool.len(), 16);
        for id in 0..20 {
            let e = entity(id);
            if [0, 7, 19, 4].contains(&id) {
                assert!(!pool.has(e));
            } else {
                assert_eq!(pool.get::<Position>(e).unwrap(), &pos(id as f32));
            }
        }
        // sparse/dense stay mirror images of each other.
        for (index, e) in pool.entities().iter().enumerate() {
            assert_eq!(pool.sparse[e.index()] as usize, index);
        }
    }

    #[test]
    fn test_duplicate_add_is_rejected() {
        let mut pool = ComponentPool::with_capacity(Position::meta(), 0);
        let e = entity(2);
        pool.add(e, pos(1.0)).unwrap();
        assert_eq!(
            pool.add(e, pos(2.0)).unwrap_err(),
            EcsError::DuplicateComponent {
                entity: e,
                component: Position::type_name()
            }
        );
        // A different generation of the same id is still a duplicate.
        assert!(pool.add(Entity::new(2, 1), pos(3.0)).is_err());
        assert_eq!(pool.len(), 1);
        assert_eq!(pool.get::<Position>(e).unwrap(), &pos(1.0));
    }

    #[test]
    fn test_stale_generation_does_not_match() {
        let mut pool = ComponentPool::with_capacity(Position::meta(), 0);
        pool.add(Entity::new(5, 1), pos(1.0)).unwrap();
        assert!(!pool.has(Entity::new(5, 0)));
        assert!(pool.remove(Entity::new(5, 0)).is_err());
    }

    #[test]
    fn test_wrong_type_is_rejected() {
        let mut pool = ComponentPool::with_capacity(Position::meta(), 0);
        let e = entity(0);
        pool.add(e, pos(1.0)).unwrap();
        assert!(matches!(
            pool.get::<Name>(e),
            Err(EcsError::LayoutMismatch { .. })
        ));
        assert!(pool.add(entity(1), Name("x".into())).is_err());
    }

    #[test]
    fn test_growth_keeps_values_and_doubles() {
        let mut pool = ComponentPool::with_capacity(Position::meta(), 0);
        pool.add(entity(0), pos(0.0)).unwrap();
        assert_eq!(pool.capacity, 8);
        for id in 1..100 {
            pool.add(entity(id * 3), pos(id as f32)).unwrap();
        }
        assert_eq!(pool.capacity, 128);
        assert_eq!(pool.get::<Position>(entity(297)).unwrap(), &pos(99.0));
        assert!(pool.sparse.len() > 297);
    }

    #[test]
    fn test_owned_values_are_dropped_once() {
        let tracker = Rc::new(());
        #[derive(Debug)]
        struct Holder(Rc<()>);
        impl Component for Holder {}

        {
            let mut pool = ComponentPool::with_capacity(Holder::meta(), 0);
            for id in 0..10 {
                pool.add(entity(id), Holder(Rc::clone(&tracker))).unwrap();
            }
            assert_eq!(Rc::strong_count(&tracker), 11);
            pool.remove(entity(4)).unwrap();
            assert_eq!(Rc::strong_count(&tracker), 10);
            let taken = pool.take::<Holder>(entity(9)).unwrap();
            assert_eq!(Rc::strong_count(&tracker), 10);
            drop(taken);
            assert_eq!(Rc::strong_count(&tracker), 9);
        }
        assert_eq!(Rc::strong_count(&tracker), 1);
    }

    #[test]
    fn test_strings_survive_compaction() {
        let mut pool = ComponentPool::with_capacity(Name::meta(), 0);
        pool.add(entity(0), Name("zero".into())).unwrap();
        pool.add(entity(1), Name("one".into())).unwrap();
        pool.add(entity(2), Name("two".into())).unwrap();
        pool.remove(entity(0)).unwrap();
        assert_eq!(pool.get::<Name>(entity(2)).unwrap().0, "two");
        assert_eq!(pool.get::<Name>(entity(1)).unwrap().0, "one");
    }

    #[test]
    fn test_hooks_run_on_add_remove_and_drop() {
        let log = Rc::new(RefCell::new(Vec::new()));
        let mut pool = ComponentPool::with_capacity(Position::meta(), 0);

        let created = Rc::clone(&log);
        pool.set_on_create::<Position, _>(move |e, p| {
            p.y = 100.0;
            created.borrow_mut().push(("create", e.id()));
        })
        .unwrap();
        let destroyed = Rc::clone(&log);
        pool.set_on_destroy::<Position, _>(move |e, p| {
            assert_eq!(p.y, 100.0);
            destroyed.borrow_mut().push(("destroy", e.id()));
        })
        .unwrap();

        assert_eq!(pool.add(entity(0), pos(1.0)).unwrap().y, 100.0);
        pool.add(entity(1), pos(2.0)).unwrap();
        pool.remove(entity(0)).unwrap();
        drop(pool);

        assert_eq!(
            *log.borrow(),
            vec![
                ("create", 0),
                ("create", 1),
                ("destroy", 0),
                ("destroy", 1)
            ]
        );
    }

    #[test]
    fn test_version_tracks_structural_changes() {
        let mut pool = ComponentPool::with_capacity(Position::meta(), 0);
        assert_eq!(pool.version(), 0);
        pool.add(entity(0), pos(0.0)).unwrap();
        pool.get_mut::<Position>(entity(0)).unwrap().x = 5.0;
        assert_eq!(pool.version(), 1);
        pool.remove(entity(0)).unwrap();
        assert_eq!(pool.version(), 2);
    }

    #[test]
    fn test_raw_bytes_roundtrip() {
        let mut pool = ComponentPool::with_capacity(Position::meta(), 0);
        let value = pos(4.0);
        // SAFETY: reading the bytes of a padding-free `Copy` value.
        let bytes = unsafe {
            std::slice::from_raw_parts(
                ptr::from_ref(&value).cast::<u8>(),
                std::mem::size_of::<Position>(),
            )
        };
        // SAFETY: `bytes` is a valid `Position`.
        unsafe { pool.add_raw(entity(1), bytes) }.unwrap();
        assert_eq!(pool.get::<Position>(entity(1)).unwrap(), &value);
        assert!(pool.get_raw(entity(1)).is_some());

        // SAFETY: the length check rejects this before any bytes are read.
        let short = unsafe { pool.add_raw(entity(2), &bytes[..4]) };
        assert!(matches!(short, Err(EcsError::LayoutMismatch { .. })));
    }

    #[test]
    fn test_zero_sized_components() {
        let mut pool = ComponentPool::with_capacity(Marker::meta(), 0);
        for id in 0..50 {
            pool.add(entity(id), Marker).unwrap();
        }
        pool.remove(entity(10)).unwrap();
        assert_eq!(pool.len(), 49);
        assert_eq!(pool.get::<Marker>(entity(11)).unwrap(), &Marker);
    }

    #[test]
    fn test_unchecked_access() {
        let mut pool = ComponentPool::with_capacity(Position::meta(), 32);
        pool.add(entity(7), pos(7.0)).unwrap();
        // SAFETY: entity 7 owns a `Position` here.
        unsafe {
            pool.get_unchecked_mut::<Position>(entity(7)).x = 8.0;
            assert_eq!(pool.get_unchecked::<Position>(entity(7)).x, 8.0);
        }
    }

    #[test]
    fn test_layout_must_match_type() {
        let mut meta = Position::meta();
        meta.layout = Layout::new::<u8>();
        let mut pool = ComponentPool::with_capacity(meta, 0);

        assert!(matches!(
            pool.add(entity(0), pos(1.0)),
            Err(EcsError::LayoutMismatch { .. })
        ));
        assert!(matches!(
            pool.set_on_create::<Position, _>(|_, _| {}),
            Err(EcsError::LayoutMismatch { .. })
        ));
        assert!(pool.is_empty());
    }

    #[test]
    fn test_null_entity_rejected() {
        let mut pool = ComponentPool::with_capacity(Position::meta(), 0);
        assert_eq!(
            pool.add(Entity::NULL, pos(1.0)).unwrap_err(),
            EcsError::StaleEntity(Entity::NULL)
        );
        assert_eq!(
            pool.add(Entity::new(Entity::NULL_ID, 3), pos(1.0)).unwrap_err(),
            EcsError::StaleEntity(Entity::new(Entity::NULL_ID, 3))
        );
        assert!(pool.is_empty());
    }
}

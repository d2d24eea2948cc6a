//! # engine_ecs
//!
//! A single-threaded entity-component-system core built on sparse sets.
//!
//! This crate provides:
//!
//! - [`Entity`]: 64-bit handles packing a 32-bit id and a 32-bit generation.
//! - [`EntityRegistry`]: allocates, recycles, and validates handles.
//! - [`ComponentPool`]: type-erased sparse-set storage for one component type.
//! - [`World`]: owns the registry and one pool per component type.
//! - [`View`] / [`SingleView`]: backward cursors over pool intersections.
//! - [`ComponentRef`]: component tokens that survive structural changes.
//! - [`EntityBuffer`]: deferred destruction for use while iterating.
//! - [`WorldConfig`]: capacity settings, loadable from JSON.

pub mod buffer;
pub mod component;
pub mod component_ref;
pub mod config;
pub mod entity;
pub mod error;
pub mod pool;
pub mod view;
pub mod world;

pub use buffer::EntityBuffer;
pub use component::{Component, ComponentMeta, ComponentSet, ComponentTypeId};
pub use component_ref::ComponentRef;
pub use config::{ConfigError, WORLD_CONFIG_ENV, WorldConfig};
pub use entity::{Entity, EntityId, EntityRegistry, Generation};
pub use error::EcsError;
pub use pool::ComponentPool;
pub use view::{MAX_VIEW_TYPES, SingleView, View, ViewCursor, ViewIter};
pub use world::World;

/// Next capacity for a growing array: 8 to start, doubling after that.
pub(crate) fn grow_capacity(current: usize) -> usize {
    if current < 8 { 8 } else { current * 2 }
}

//! Error types for the checked ECS API.

use crate::entity::Entity;

/// Contract violations detected at the API boundary.
///
/// The unchecked fast paths (`get_unchecked` and friends) skip these checks
/// entirely; everything else reports them through this enum.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum EcsError {
    /// The handle was never issued, or its slot has since been recycled.
    #[error("stale or invalid entity handle {0}")]
    StaleEntity(Entity),

    /// The entity already owns a component of this type.
    #[error("entity {entity} already has component `{component}`")]
    DuplicateComponent {
        /// The offending entity.
        entity: Entity,
        /// Name of the component type.
        component: &'static str,
    },

    /// The entity has no component of this type.
    #[error("entity {entity} has no component `{component}`")]
    MissingComponent {
        /// The offending entity.
        entity: Entity,
        /// Name of the component type.
        component: &'static str,
    },

    /// Two component descriptors share a type id but disagree on the type.
    #[error("component `{component}` does not match the layout of its existing pool")]
    LayoutMismatch {
        /// Name of the component type that was requested.
        component: &'static str,
    },

    /// The view was asked for a component type it was not built over.
    #[error("component `{0}` is not part of this view")]
    NotInView(&'static str),

    /// The view has no current entity.
    #[error("view is exhausted")]
    ViewExhausted,

    /// A view needs at least one component type.
    #[error("a view needs at least one component type")]
    EmptyView,

    /// A view or component ref was used with a world that lacks its pool.
    #[error("no component pool at index {0} in this world")]
    UnknownPool(usize),

    #[error("view over {requested} component types exceeds the maximum of {max}")]
    TooManyViewTypes { requested: usize, max: usize },
}

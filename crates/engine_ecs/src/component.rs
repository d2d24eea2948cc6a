//! Core [`Component`] trait and the metadata used for type-erased storage.
//!
//! Pools never see a concrete component type. They store raw bytes laid out
//! according to a [`ComponentMeta`], which also carries the drop glue needed
//! to release a component in place.
//!
//! ## Type identity
//!
//! [`ComponentTypeId`] is derived from the component's name with FNV-1a
//! 64-bit, so it is deterministic and assigned on first use without any
//! registration step. Typed access additionally checks the Rust
//! [`TypeId`], which keeps a hash collision from ever reinterpreting bytes as
//! the wrong type.

use std::alloc::Layout;
use std::any::TypeId;

/// A stable identifier for a component type, the FNV-1a 64-bit hash of its
/// name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ComponentTypeId(pub u64);

impl ComponentTypeId {
    /// FNV-1a 64-bit offset basis.
    const FNV_OFFSET_BASIS: u64 = 0xcbf2_9ce4_8422_2325;

    /// FNV-1a 64-bit prime.
    const FNV_PRIME: u64 = 0x0100_0000_01b3;

    /// Hash a component name with FNV-1a 64-bit.
    ///
    /// ```text
    /// hash = 0xcbf29ce484222325
    /// for each byte in name.as_bytes():
    ///     hash = hash XOR byte
    ///     hash = hash * 0x00000100000001b3
    /// ```
    #[must_use]
    pub const fn from_name(name: &str) -> Self {
        let bytes = name.as_bytes();
        let mut hash = Self::FNV_OFFSET_BASIS;
        let mut i = 0;
        while i < bytes.len() {
            hash ^= bytes[i] as u64;
            hash = hash.wrapping_mul(Self::FNV_PRIME);
            i += 1;
        }
        Self(hash)
    }

    /// The [`ComponentTypeId`] of a Rust component type.
    #[must_use]
    pub fn of<T: Component>() -> Self {
        Self::from_name(T::type_name())
    }
}

/// Everything a pool needs to store one component type as raw bytes.
///
/// Only [`Component::meta`] builds one, so the layout and drop glue always
/// describe the Rust type recorded alongside them.
#[derive(Debug, Clone)]
pub struct ComponentMeta {
    pub(crate) type_id: ComponentTypeId,
    pub(crate) rust_type: TypeId,
    pub(crate) name: &'static str,
    pub(crate) layout: Layout,
    /// `None` for types without drop glue.
    pub(crate) drop_fn: Option<unsafe fn(*mut u8)>,
}

impl ComponentMeta {
    /// Stable identifier, used to find the pool.
    #[must_use]
    pub fn id(&self) -> ComponentTypeId {
        self.type_id
    }

    /// The Rust type this descriptor was built from.
    #[must_use]
    pub fn rust_type(&self) -> TypeId {
        self.rust_type
    }

    /// Human-readable name (e.g. `"Transform"`).
    #[must_use]
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Size and alignment of one component.
    #[must_use]
    pub fn layout(&self) -> Layout {
        self.layout
    }

    #[must_use]
    pub fn needs_drop(&self) -> bool {
        self.drop_fn.is_some()
    }

    /// Returns `true` if this descriptor was built from `T` and lays out a
    /// `T` exactly.
    #[must_use]
    pub fn is<T: Component>(&self) -> bool {
        self.rust_type == TypeId::of::<T>() && self.layout == Layout::new::<T>()
    }
}

/// Drops the `T` stored at `ptr`.
///
/// # Safety
///
/// `ptr` must point to a live, properly aligned `T` that is not used again.
unsafe fn drop_erased<T>(ptr: *mut u8) {
    // SAFETY: guaranteed by the caller.
    unsafe { std::ptr::drop_in_place(ptr.cast::<T>()) }
}

/// The core component trait.
///
/// Any `'static` type can be a component; the default name is the Rust type
/// name. Override [`Component::type_name`] when the id must stay stable
/// across builds or match an id computed elsewhere.
///
/// ```rust
/// use engine_ecs::Component;
///
/// struct Health {
///     current: f32,
///     max: f32,
/// }
///
/// impl Component for Health {
///     fn type_name() -> &'static str {
///         "Health"
///     }
/// }
/// ```
pub trait Component: Sized + 'static {
    /// A human-readable name for this component type.
    fn type_name() -> &'static str {
        std::any::type_name::<Self>()
    }

    /// Returns the [`ComponentTypeId`] for this component.
    fn component_type_id() -> ComponentTypeId {
        ComponentTypeId::from_name(Self::type_name())
    }

    /// Returns the [`ComponentMeta`] descriptor for this component type.
    fn meta() -> ComponentMeta {
        ComponentMeta {
            type_id: Self::component_type_id(),
            rust_type: TypeId::of::<Self>(),
            name: Self::type_name(),
            layout: Layout::new::<Self>(),
            drop_fn: if std::mem::needs_drop::<Self>() {
                Some(drop_erased::<Self>)
            } else {
                None
            },
        }
    }
}

/// A fixed set of component types, used to build multi-type views from a
/// tuple: `world.view::<(Transform, Velocity)>()`.
pub trait ComponentSet {
    /// Descriptors for every type in the set, in declaration order.
    fn metas() -> Vec<ComponentMeta>;
}

macro_rules! impl_component_set {
    ($($ty:ident),+) => {
        impl<$($ty: Component),+> ComponentSet for ($($ty,)+) {
            fn metas() -> Vec<ComponentMeta> {
                vec![$($ty::meta()),+]
            }
        }
    };
}

impl_component_set!(A);
impl_component_set!(A, B);
impl_component_set!(A, B, C);
impl_component_set!(A, B, C, D);
impl_component_set!(A, B, C, D, E);
impl_component_set!(A, B, C, D, E, F);
impl_component_set!(A, B, C, D, E, F, G);
impl_component_set!(A, B, C, D, E, F, G, H);

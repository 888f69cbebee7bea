//! Provide the type registry that member lookup runs against.
//!
//! ## Menu
//!
//! - [`TypeRegistry`]: A table of [`TypeInfo`]s indexed by type, path and simple name.
//! - [`TypeRegistryArc`]: A shared, lock-protected registry.
//! - [`system`]: The process-wide registry holding the builtin `core` types.
//! - [`register_type!`]: Static registration of host types.
//!
//! ## auto_register
//!
//! See [`TypeRegistry::auto_register`].
//!
//! We use [`inventory`] crate to implement static registration,
//! not all platforms support it (although major platforms do).
//! Without the `auto_register` feature the method does nothing and
//! returns `false`.
//!
//! ### builtin type menu
//!
//! - `core.Object` `core.Class` `core.String` `core.List` `core.Map`
//! - `core.Number` `core.Integer` `core.Long` `core.Double` `core.Float` `core.Short` `core.Byte`
//! - `core.Boolean` `core.Character`
//! - `core.Math`
//!
//! [`TypeInfo`]: crate::info::TypeInfo
//! [`register_type!`]: crate::register_type

// -----------------------------------------------------------------------------
// Modules

mod builtins;
mod type_registry;

#[cfg(feature = "auto_register")]
mod auto_register;

// -----------------------------------------------------------------------------
// Exports

pub use type_registry::{TypeRegistry, TypeRegistryArc, system};

#[cfg(feature = "auto_register")]
pub use auto_register::TypeRegistration;

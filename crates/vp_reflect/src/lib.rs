#![doc = include_str!("../README.md")]
#![cfg_attr(docsrs, feature(doc_cfg))]

// -----------------------------------------------------------------------------
// Modules

pub mod convert;
pub mod error;
pub mod info;
pub mod registry;
pub mod scope;
pub mod ty;
pub mod value;

// -----------------------------------------------------------------------------
// Top-Level exports

pub use error::{ClassNotFound, ConversionError, InvokeError};
pub use ty::{Primitive, Type};
pub use value::{HostObject, Value};

#[doc(hidden)]
pub mod __macro_exports {
    #[cfg(feature = "auto_register")]
    pub use inventory;
}

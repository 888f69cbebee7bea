//! Member descriptors of registered types.
//!
//! A [`TypeInfo`] lists the fields, methods and constructors that
//! expressions may reach on a type. Descriptors carry their behavior as
//! shared closures, so a resolved member can be invoked from any thread.

// -----------------------------------------------------------------------------
// Modules

mod field_info;
mod method_info;
mod type_info;

pub mod args;

// -----------------------------------------------------------------------------
// Exports

pub use field_info::{FieldInfo, Getter};
pub use method_info::{ConstructorInfo, Factory, Invoker, MethodInfo};
pub use type_info::TypeInfo;

// -----------------------------------------------------------------------------
// Internal

use crate::error::InvokeError;
use crate::value::{HostObject, Value};

pub(crate) fn downcast_receiver<T: HostObject>(receiver: &Value) -> Result<&T, InvokeError> {
    receiver
        .downcast_ref::<T>()
        .ok_or_else(|| InvokeError::ReceiverMismatch {
            expected: core::any::type_name::<T>(),
            actual: receiver.type_name(),
        })
}

//! Typed argument extraction for member closures.
//!
//! Arguments reach a member already coerced to its declared parameter
//! types. These helpers only unwrap the payload.

use std::sync::Arc;

use crate::error::InvokeError;
use crate::ty::Type;
use crate::value::{HostObject, Value};

#[inline]
fn at(args: &[Value], index: usize) -> Result<&Value, InvokeError> {
    args.get(index).ok_or(InvokeError::Arity {
        expected: index + 1,
        actual: args.len(),
    })
}

#[inline]
fn bad(index: usize, expected: &'static str) -> InvokeError {
    InvokeError::BadArgument { index, expected }
}

pub fn bool(args: &[Value], index: usize) -> Result<bool, InvokeError> {
    at(args, index)?.as_bool().ok_or_else(|| bad(index, "boolean"))
}

pub fn char(args: &[Value], index: usize) -> Result<char, InvokeError> {
    at(args, index)?.as_char().ok_or_else(|| bad(index, "char"))
}

pub fn int(args: &[Value], index: usize) -> Result<i32, InvokeError> {
    at(args, index)?.as_int().ok_or_else(|| bad(index, "int"))
}

pub fn long(args: &[Value], index: usize) -> Result<i64, InvokeError> {
    at(args, index)?.as_long().ok_or_else(|| bad(index, "long"))
}

pub fn double(args: &[Value], index: usize) -> Result<f64, InvokeError> {
    at(args, index)?.as_double().ok_or_else(|| bad(index, "double"))
}

/// A string argument. `null` is passed through as `None`.
pub fn string(args: &[Value], index: usize) -> Result<Option<Arc<str>>, InvokeError> {
    match at(args, index)? {
        Value::Null => Ok(None),
        Value::String(s) => Ok(Some(s.clone())),
        _ => Err(bad(index, "core.String")),
    }
}

pub fn ty(args: &[Value], index: usize) -> Result<Type, InvokeError> {
    at(args, index)?
        .as_type()
        .cloned()
        .ok_or_else(|| bad(index, "core.Class"))
}

/// A host object argument of type `T`.
pub fn object<T: HostObject>(args: &[Value], index: usize) -> Result<&T, InvokeError> {
    at(args, index)?
        .downcast_ref::<T>()
        .ok_or_else(|| bad(index, core::any::type_name::<T>()))
}

#[cfg(test)]
mod tests {
    use crate::error::InvokeError;
    use crate::value::Value;

    #[test]
    fn unwraps_coerced_payloads() {
        let args = [Value::Int(3), Value::from("s"), Value::Null, Value::Double(1.5)];
        assert_eq!(super::int(&args, 0), Ok(3));
        assert_eq!(super::long(&args, 0), Ok(3));
        assert_eq!(super::string(&args, 1).unwrap().as_deref(), Some("s"));
        assert_eq!(super::string(&args, 2), Ok(None));
        assert_eq!(super::double(&args, 3), Ok(1.5));
    }

    #[test]
    fn reports_missing_and_mistyped_arguments() {
        let args = [Value::from("s")];
        assert_eq!(super::int(&args, 0), Err(InvokeError::BadArgument { index: 0, expected: "int" }));
        assert_eq!(super::bool(&args, 2), Err(InvokeError::Arity { expected: 3, actual: 1 }));
    }
}

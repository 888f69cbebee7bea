//! Provide the type coercion service.
//!
//! [`TypeConverter`] decides whether a value of one type can stand in for
//! another and performs the conversion. Builtin rules cover the numeric
//! tower, boxing, string parsing, `char` and integral codes, and arrays and
//! lists. Hosts add their own rules as [`Conversion`]s, which are consulted
//! before the builtin ones.

// -----------------------------------------------------------------------------
// Modules

mod rules;

#[cfg(feature = "auto_register")]
mod auto_register;

#[cfg(feature = "auto_register")]
pub use auto_register::ConversionRegistration;

// -----------------------------------------------------------------------------
// Conversion

use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use vp_utils::hash::HashMap;
use vp_utils::sync::{RwLock, read, write};

use crate::error::ConversionError;
use crate::ty::Type;
use crate::value::Value;

/// A host supplied conversion rule.
pub trait Conversion: Send + Sync + 'static {
    /// The produced type.
    fn target(&self) -> &Type;

    /// Returns `true` if values of `source` may be converted.
    fn accepts(&self, source: &Type) -> bool;

    fn convert(&self, value: &Value) -> Result<Value, ConversionError>;
}

type ConvertFn = dyn Fn(&Value) -> Result<Value, ConversionError> + Send + Sync;

/// A [`Conversion`] backed by a closure.
///
/// # Examples
///
/// ```
/// use vp_reflect::convert::{FnConversion, TypeConverter};
/// use vp_reflect::ty::Type;
/// use vp_reflect::value::Value;
///
/// let converter = TypeConverter::new();
/// let celsius = Type::named("demo.Celsius");
/// converter.register(FnConversion::new(celsius.clone(), [Type::DOUBLE.boxed()], |v| {
///     Ok(v.clone())
/// }));
///
/// assert!(converter.can_convert(&celsius, Some(&Type::DOUBLE.boxed())));
/// assert!(!converter.can_convert(&celsius, Some(&Type::String)));
/// ```
pub struct FnConversion {
    target: Type,
    sources: Box<[Type]>,
    f: Box<ConvertFn>,
}

impl FnConversion {
    /// An empty `sources` list accepts every source type.
    pub fn new(
        target: Type,
        sources: impl IntoIterator<Item = Type>,
        f: impl Fn(&Value) -> Result<Value, ConversionError> + Send + Sync + 'static,
    ) -> Self {
        Self {
            target,
            sources: sources.into_iter().collect(),
            f: Box::new(f),
        }
    }
}

impl Conversion for FnConversion {
    #[inline]
    fn target(&self) -> &Type {
        &self.target
    }

    fn accepts(&self, source: &Type) -> bool {
        self.sources.is_empty() || self.sources.contains(source)
    }

    #[inline]
    fn convert(&self, value: &Value) -> Result<Value, ConversionError> {
        (self.f)(value)
    }
}

// -----------------------------------------------------------------------------
// TypeConverter

/// The coercion service shared by both accessor backends.
#[derive(Default)]
pub struct TypeConverter {
    custom: RwLock<HashMap<Type, Vec<Arc<dyn Conversion>>>>,
    generation: AtomicU64,
}

impl TypeConverter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a rule. Rules for the same target are tried in registration order.
    pub fn register(&self, conversion: impl Conversion) {
        let target = conversion.target().clone();
        log::debug!("registering conversion to `{target}`");
        write(&self.custom)
            .entry(target)
            .or_default()
            .push(Arc::new(conversion));
        self.generation.fetch_add(1, Ordering::Release);
    }

    /// Counts the registrations so far.
    ///
    /// Anything scored with [`can_convert`](Self::can_convert) is only valid
    /// for the generation it was computed in.
    #[inline]
    pub fn generation(&self) -> u64 {
        self.generation.load(Ordering::Acquire)
    }

    /// Adds every rule submitted with
    /// [`register_conversion!`](crate::register_conversion).
    /// Returns the number of added rules.
    #[cfg(feature = "auto_register")]
    pub fn auto_register(&self) -> usize {
        let mut count = 0;
        for registration in auto_register::registrations() {
            let conversion = registration.build();
            write(&self.custom)
                .entry(conversion.target().clone())
                .or_default()
                .push(Arc::from(conversion));
            count += 1;
        }
        if count != 0 {
            self.generation.fetch_add(1, Ordering::Release);
        }
        count
    }

    fn custom_for(&self, target: &Type) -> Vec<Arc<dyn Conversion>> {
        read(&self.custom).get(target).cloned().unwrap_or_default()
    }

    /// Returns `true` if a value of type `source` can be converted to
    /// `target`. A `None` source stands for `null`, which converts to every
    /// non-primitive type.
    pub fn can_convert(&self, target: &Type, source: Option<&Type>) -> bool {
        let Some(source) = source else {
            return !target.is_primitive();
        };
        rules::can_convert(target, source)
            || self.custom_for(target).iter().any(|c| c.accepts(source))
    }

    /// Converts `value` to `target`.
    pub fn convert(&self, value: &Value, target: &Type) -> Result<Value, ConversionError> {
        if value.is_null() {
            return if target.is_primitive() {
                Err(ConversionError::NullToPrimitive { to: target.clone() })
            } else {
                Ok(Value::Null)
            };
        }
        if let Some(source) = value.runtime_type() {
            if source == target.boxed() {
                return Ok(value.clone());
            }
            for conversion in self.custom_for(target) {
                if conversion.accepts(&source) {
                    return conversion.convert(value);
                }
            }
        }
        rules::convert(value, target)
    }
}

impl fmt::Debug for TypeConverter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(read(&self.custom).keys()).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::{FnConversion, TypeConverter};
    use crate::error::ConversionError;
    use crate::ty::{Primitive, Type};
    use crate::value::Value;

    #[test]
    fn numeric_tower() {
        let converter = TypeConverter::new();
        assert_eq!(converter.convert(&Value::Int(7), &Type::LONG), Ok(Value::Long(7)));
        assert_eq!(converter.convert(&Value::Int(7), &Type::DOUBLE), Ok(Value::Double(7.0)));
        assert_eq!(converter.convert(&Value::Double(7.9), &Type::INT), Ok(Value::Int(7)));
        assert_eq!(converter.convert(&Value::Char('A'), &Type::INT), Ok(Value::Int(65)));
        assert!(converter.convert(&Value::Long(1 << 40), &Type::INT).is_err());
    }

    #[test]
    fn strings_parse_and_print() {
        let converter = TypeConverter::new();
        assert_eq!(converter.convert(&Value::from(" 42 "), &Type::INT), Ok(Value::Int(42)));
        assert_eq!(converter.convert(&Value::from("x"), &Type::CHAR), Ok(Value::Char('x')));
        assert_eq!(converter.convert(&Value::Int(5), &Type::String), Ok(Value::from("5")));
        assert!(matches!(
            converter.convert(&Value::from("4x"), &Type::INT),
            Err(ConversionError::Parse { .. })
        ));
    }

    #[test]
    fn null_only_converts_to_references() {
        let converter = TypeConverter::new();
        assert!(converter.can_convert(&Type::String, None));
        assert!(converter.can_convert(&Type::Boxed(Primitive::Int), None));
        assert!(!converter.can_convert(&Type::INT, None));
        assert_eq!(
            converter.convert(&Value::Null, &Type::INT),
            Err(ConversionError::NullToPrimitive { to: Type::INT }),
        );
        assert_eq!(converter.convert(&Value::Null, &Type::named("x.Y")), Ok(Value::Null));
    }

    #[test]
    fn lists_become_arrays() {
        let converter = TypeConverter::new();
        let list = Value::list([Value::Int(1), Value::from("2")]);
        let target = Type::array_of(Type::LONG);
        assert!(converter.can_convert(&target, Some(&Type::List)));
        assert_eq!(
            converter.convert(&list, &target),
            Ok(Value::array(Type::LONG, [Value::Long(1), Value::Long(2)])),
        );
    }

    #[test]
    fn custom_rules_come_first() {
        let converter = TypeConverter::new();
        assert_eq!(converter.generation(), 0);
        converter.register(FnConversion::new(Type::INT, [Type::String], |_| Ok(Value::Int(-1))));
        assert_eq!(converter.generation(), 1);
        assert_eq!(converter.convert(&Value::from("42"), &Type::INT), Ok(Value::Int(-1)));
        assert_eq!(converter.convert(&Value::Long(3), &Type::INT), Ok(Value::Int(3)));
    }
}

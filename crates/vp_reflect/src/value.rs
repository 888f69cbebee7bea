//! Runtime values.

use std::any::Any;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

use serde_core::ser::{Serialize, Serializer};
use vp_utils::hash::HashMap;

use crate::ty::{Primitive, Type};

// -----------------------------------------------------------------------------
// HostObject

/// An object owned by the host application.
///
/// The type path must name a [`TypeInfo`](crate::info::TypeInfo) registered
/// in the active registry; that descriptor lists the members expressions may
/// reach on the object.
///
/// # Examples
///
/// ```
/// use vp_reflect::value::{HostObject, Value};
///
/// #[derive(Debug)]
/// struct Point { x: i32, y: i32 }
///
/// impl HostObject for Point {
///     fn type_path(&self) -> &str { "demo.Point" }
/// }
///
/// let value = Value::object(Point { x: 1, y: 2 });
/// assert_eq!(value.downcast_ref::<Point>().map(|p| p.x + p.y), Some(3));
/// ```
pub trait HostObject: Any + Send + Sync + fmt::Debug {
    /// The registered path of this object's type.
    fn type_path(&self) -> &str;
}

// -----------------------------------------------------------------------------
// Containers

/// The key/value container behind [`Value::Map`].
pub type ValueMap = HashMap<Value, Value>;

/// A typed, fixed-length array.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ArrayValue {
    elem: Type,
    items: Box<[Value]>,
}

impl ArrayValue {
    #[inline]
    pub fn new(elem: Type, items: impl Into<Box<[Value]>>) -> Self {
        Self {
            elem,
            items: items.into(),
        }
    }

    /// The declared element type.
    #[inline]
    pub fn element_type(&self) -> &Type {
        &self.elem
    }

    #[inline]
    pub fn items(&self) -> &[Value] {
        &self.items
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.items.len()
    }
}

// -----------------------------------------------------------------------------
// Value

/// A dynamically typed runtime value.
///
/// Cloning is cheap: every heap payload sits behind an [`Arc`].
///
/// Equality and hashing are structural, except for floats (compared by bit
/// pattern so values can key a [`ValueMap`]) and host objects (compared by
/// identity).
#[derive(Clone)]
pub enum Value {
    Null,
    Bool(bool),
    Char(char),
    Byte(i8),
    Short(i16),
    Int(i32),
    Long(i64),
    Float(f32),
    Double(f64),
    String(Arc<str>),
    List(Arc<[Value]>),
    Array(Arc<ArrayValue>),
    Map(Arc<ValueMap>),
    Object(Arc<dyn HostObject>),
    /// A type object, e.g. the result of resolving `core.Math`.
    Type(Type),
}

impl Value {
    #[inline]
    pub fn string(s: impl Into<Arc<str>>) -> Self {
        Self::String(s.into())
    }

    pub fn list(items: impl IntoIterator<Item = Value>) -> Self {
        Self::List(items.into_iter().collect())
    }

    pub fn array(elem: Type, items: impl IntoIterator<Item = Value>) -> Self {
        let items: Vec<Value> = items.into_iter().collect();
        Self::Array(Arc::new(ArrayValue::new(elem, items)))
    }

    pub fn map(entries: impl IntoIterator<Item = (Value, Value)>) -> Self {
        Self::Map(Arc::new(entries.into_iter().collect()))
    }

    #[inline]
    pub fn object(obj: impl HostObject) -> Self {
        Self::Object(Arc::new(obj))
    }

    #[inline]
    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    /// The runtime type of this value, `None` for `null`.
    ///
    /// Primitive payloads report their boxed type, matching how a value
    /// reached through an untyped path is observed.
    pub fn runtime_type(&self) -> Option<Type> {
        Some(match self {
            Self::Null => return None,
            Self::Bool(_) => Type::Boxed(Primitive::Bool),
            Self::Char(_) => Type::Boxed(Primitive::Char),
            Self::Byte(_) => Type::Boxed(Primitive::Byte),
            Self::Short(_) => Type::Boxed(Primitive::Short),
            Self::Int(_) => Type::Boxed(Primitive::Int),
            Self::Long(_) => Type::Boxed(Primitive::Long),
            Self::Float(_) => Type::Boxed(Primitive::Float),
            Self::Double(_) => Type::Boxed(Primitive::Double),
            Self::String(_) => Type::String,
            Self::List(_) => Type::List,
            Self::Array(array) => Type::Array(Arc::new(array.elem.clone())),
            Self::Map(_) => Type::Map,
            Self::Object(obj) => Type::named(obj.type_path()),
            Self::Type(_) => Type::Class,
        })
    }

    /// Checks `runtime_type() == *ty` without allocating.
    pub fn has_runtime_type(&self, ty: Option<&Type>) -> bool {
        match (self, ty) {
            (Self::Null, None) => true,
            (Self::Object(obj), Some(Type::Named(path))) => obj.type_path() == &**path,
            (Self::Object(_), _) | (_, None) => false,
            (value, Some(ty)) => value.runtime_type().as_ref() == Some(ty),
        }
    }

    /// The primitive kind of a primitive payload.
    pub fn primitive(&self) -> Option<Primitive> {
        Some(match self {
            Self::Bool(_) => Primitive::Bool,
            Self::Char(_) => Primitive::Char,
            Self::Byte(_) => Primitive::Byte,
            Self::Short(_) => Primitive::Short,
            Self::Int(_) => Primitive::Int,
            Self::Long(_) => Primitive::Long,
            Self::Float(_) => Primitive::Float,
            Self::Double(_) => Primitive::Double,
            _ => return None,
        })
    }

    /// A short description of the runtime type, for diagnostics.
    pub fn type_name(&self) -> String {
        match self.runtime_type() {
            Some(ty) => ty.path().into_owned(),
            None => "null".to_owned(),
        }
    }

    #[inline]
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(b) => Some(*b),
            _ => None,
        }
    }

    #[inline]
    pub fn as_char(&self) -> Option<char> {
        match self {
            Self::Char(c) => Some(*c),
            _ => None,
        }
    }

    /// Integral payloads that fit in an `i32`.
    pub fn as_int(&self) -> Option<i32> {
        match self {
            Self::Byte(v) => Some(i32::from(*v)),
            Self::Short(v) => Some(i32::from(*v)),
            Self::Int(v) => Some(*v),
            Self::Long(v) => i32::try_from(*v).ok(),
            _ => None,
        }
    }

    /// Any integral payload.
    pub fn as_long(&self) -> Option<i64> {
        match self {
            Self::Byte(v) => Some(i64::from(*v)),
            Self::Short(v) => Some(i64::from(*v)),
            Self::Int(v) => Some(i64::from(*v)),
            Self::Long(v) => Some(*v),
            _ => None,
        }
    }

    /// Any numeric payload, widened to `f64`.
    pub fn as_double(&self) -> Option<f64> {
        match self {
            Self::Float(v) => Some(f64::from(*v)),
            Self::Double(v) => Some(*v),
            other => other.as_long().map(|v| v as f64),
        }
    }

    #[inline]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(s) => Some(s),
            _ => None,
        }
    }

    #[inline]
    pub fn as_list(&self) -> Option<&[Value]> {
        match self {
            Self::List(items) => Some(items),
            _ => None,
        }
    }

    #[inline]
    pub fn as_array(&self) -> Option<&ArrayValue> {
        match self {
            Self::Array(array) => Some(array),
            _ => None,
        }
    }

    #[inline]
    pub fn as_map(&self) -> Option<&ValueMap> {
        match self {
            Self::Map(map) => Some(map),
            _ => None,
        }
    }

    #[inline]
    pub fn as_type(&self) -> Option<&Type> {
        match self {
            Self::Type(ty) => Some(ty),
            _ => None,
        }
    }

    /// Downcasts a host object payload.
    pub fn downcast_ref<T: HostObject>(&self) -> Option<&T> {
        match self {
            Self::Object(obj) => {
                let any: &dyn Any = &**obj;
                any.downcast_ref::<T>()
            }
            _ => None,
        }
    }
}

// -----------------------------------------------------------------------------
// Equality

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Null, Self::Null) => true,
            (Self::Bool(a), Self::Bool(b)) => a == b,
            (Self::Char(a), Self::Char(b)) => a == b,
            (Self::Byte(a), Self::Byte(b)) => a == b,
            (Self::Short(a), Self::Short(b)) => a == b,
            (Self::Int(a), Self::Int(b)) => a == b,
            (Self::Long(a), Self::Long(b)) => a == b,
            (Self::Float(a), Self::Float(b)) => a.to_bits() == b.to_bits(),
            (Self::Double(a), Self::Double(b)) => a.to_bits() == b.to_bits(),
            (Self::String(a), Self::String(b)) => a == b,
            (Self::List(a), Self::List(b)) => a == b,
            (Self::Array(a), Self::Array(b)) => a == b,
            (Self::Map(a), Self::Map(b)) => a == b,
            (Self::Object(a), Self::Object(b)) => Arc::ptr_eq(a, b),
            (Self::Type(a), Self::Type(b)) => a == b,
            _ => false,
        }
    }
}

impl Eq for Value {}

impl Hash for Value {
    fn hash<H: Hasher>(&self, state: &mut H) {
        core::mem::discriminant(self).hash(state);
        match self {
            Self::Null => {}
            Self::Bool(v) => v.hash(state),
            Self::Char(v) => v.hash(state),
            Self::Byte(v) => v.hash(state),
            Self::Short(v) => v.hash(state),
            Self::Int(v) => v.hash(state),
            Self::Long(v) => v.hash(state),
            Self::Float(v) => v.to_bits().hash(state),
            Self::Double(v) => v.to_bits().hash(state),
            Self::String(v) => v.hash(state),
            Self::List(v) => v.hash(state),
            Self::Array(v) => v.hash(state),
            // Maps are unordered; the length keeps equal maps in one bucket.
            Self::Map(v) => v.len().hash(state),
            Self::Object(v) => (Arc::as_ptr(v) as *const () as usize).hash(state),
            Self::Type(v) => v.hash(state),
        }
    }
}

// -----------------------------------------------------------------------------
// Formatting

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fn join(f: &mut fmt::Formatter<'_>, items: &[Value]) -> fmt::Result {
            f.write_str("[")?;
            for (i, item) in items.iter().enumerate() {
                if i > 0 {
                    f.write_str(", ")?;
                }
                fmt::Display::fmt(item, f)?;
            }
            f.write_str("]")
        }

        match self {
            Self::Null => f.write_str("null"),
            Self::Bool(v) => fmt::Display::fmt(v, f),
            Self::Char(v) => fmt::Display::fmt(v, f),
            Self::Byte(v) => fmt::Display::fmt(v, f),
            Self::Short(v) => fmt::Display::fmt(v, f),
            Self::Int(v) => fmt::Display::fmt(v, f),
            Self::Long(v) => fmt::Display::fmt(v, f),
            Self::Float(v) => fmt::Debug::fmt(v, f),
            Self::Double(v) => fmt::Debug::fmt(v, f),
            Self::String(v) => f.write_str(v),
            Self::List(items) => join(f, items),
            Self::Array(array) => join(f, array.items()),
            Self::Map(map) => {
                f.write_str("{")?;
                for (i, (key, value)) in map.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{key}={value}")?;
                }
                f.write_str("}")
            }
            Self::Object(obj) => fmt::Debug::fmt(obj, f),
            Self::Type(ty) => fmt::Display::fmt(ty, f),
        }
    }
}

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Null => f.write_str("Null"),
            Self::Bool(v) => f.debug_tuple("Bool").field(v).finish(),
            Self::Char(v) => f.debug_tuple("Char").field(v).finish(),
            Self::Byte(v) => f.debug_tuple("Byte").field(v).finish(),
            Self::Short(v) => f.debug_tuple("Short").field(v).finish(),
            Self::Int(v) => f.debug_tuple("Int").field(v).finish(),
            Self::Long(v) => f.debug_tuple("Long").field(v).finish(),
            Self::Float(v) => f.debug_tuple("Float").field(v).finish(),
            Self::Double(v) => f.debug_tuple("Double").field(v).finish(),
            Self::String(v) => f.debug_tuple("String").field(v).finish(),
            Self::List(v) => f.debug_tuple("List").field(v).finish(),
            Self::Array(v) => f.debug_tuple("Array").field(v).finish(),
            Self::Map(v) => f.debug_tuple("Map").field(v).finish(),
            Self::Object(v) => f.debug_tuple("Object").field(v).finish(),
            Self::Type(v) => f.debug_tuple("Type").field(v).finish(),
        }
    }
}

// -----------------------------------------------------------------------------
// Serialization

impl Serialize for Value {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::Null => serializer.serialize_unit(),
            Self::Bool(v) => serializer.serialize_bool(*v),
            Self::Char(v) => serializer.serialize_char(*v),
            Self::Byte(v) => serializer.serialize_i8(*v),
            Self::Short(v) => serializer.serialize_i16(*v),
            Self::Int(v) => serializer.serialize_i32(*v),
            Self::Long(v) => serializer.serialize_i64(*v),
            Self::Float(v) => serializer.serialize_f32(*v),
            Self::Double(v) => serializer.serialize_f64(*v),
            Self::String(v) => serializer.serialize_str(v),
            Self::List(items) => serializer.collect_seq(items.iter()),
            Self::Array(array) => serializer.collect_seq(array.items()),
            Self::Map(map) => serializer.collect_map(map.iter()),
            Self::Object(obj) => serializer.collect_str(&format_args!("{obj:?}")),
            Self::Type(ty) => serializer.serialize_str(&ty.path()),
        }
    }
}

// -----------------------------------------------------------------------------
// Conversions

macro_rules! impl_from {
    ($($ty:ty => $variant:ident),* $(,)?) => {
        $(
            impl From<$ty> for Value {
                #[inline]
                fn from(value: $ty) -> Self {
                    Self::$variant(value)
                }
            }
        )*
    };
}

impl_from! {
    bool => Bool,
    char => Char,
    i8 => Byte,
    i16 => Short,
    i32 => Int,
    i64 => Long,
    f32 => Float,
    f64 => Double,
    Arc<str> => String,
    Type => Type,
}

impl From<&str> for Value {
    #[inline]
    fn from(value: &str) -> Self {
        Self::String(Arc::from(value))
    }
}

impl From<String> for Value {
    #[inline]
    fn from(value: String) -> Self {
        Self::String(Arc::from(value))
    }
}

impl From<Vec<Value>> for Value {
    #[inline]
    fn from(value: Vec<Value>) -> Self {
        Self::List(Arc::from(value))
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    #[inline]
    fn from(value: Option<T>) -> Self {
        value.map_or(Self::Null, Into::into)
    }
}

// -----------------------------------------------------------------------------
// Tests

#[cfg(test)]
mod tests {
    use super::{HostObject, Value};
    use crate::ty::{Primitive, Type};

    #[derive(Debug)]
    struct Probe;

    impl HostObject for Probe {
        fn type_path(&self) -> &str {
            "test.Probe"
        }
    }

    #[test]
    fn runtime_types_are_boxed() {
        assert_eq!(Value::Int(1).runtime_type(), Some(Type::Boxed(Primitive::Int)));
        assert_eq!(Value::Null.runtime_type(), None);
        assert_eq!(Value::from("x").runtime_type(), Some(Type::String));
        assert_eq!(
            Value::array(Type::INT, [Value::Int(1)]).runtime_type(),
            Some(Type::array_of(Type::INT)),
        );
        assert_eq!(Value::object(Probe).runtime_type(), Some(Type::named("test.Probe")));
    }

    #[test]
    fn has_runtime_type_matches_objects_without_allocating() {
        let probe = Value::object(Probe);
        assert!(probe.has_runtime_type(Some(&Type::named("test.Probe"))));
        assert!(!probe.has_runtime_type(Some(&Type::named("test.Other"))));
        assert!(Value::Null.has_runtime_type(None));
        assert!(Value::Long(3).has_runtime_type(Some(&Type::Boxed(Primitive::Long))));
    }

    #[test]
    fn values_key_maps() {
        let map = Value::map([(Value::from("x"), Value::Int(1)), (Value::Int(2), Value::Double(0.5))]);
        let map = map.as_map().unwrap();
        assert_eq!(map.get(&Value::from("x")), Some(&Value::Int(1)));
        assert_eq!(map.get(&Value::Int(2)), Some(&Value::Double(0.5)));
        assert_eq!(map.get(&Value::Long(2)), None);
    }

    #[test]
    fn objects_compare_by_identity() {
        let a = Value::object(Probe);
        let b = Value::object(Probe);
        assert_eq!(a, a.clone());
        assert_ne!(a, b);
    }

    #[test]
    fn display_uses_host_conventions() {
        let list = Value::list([Value::Int(1), Value::from("a"), Value::Null]);
        assert_eq!(list.to_string(), "[1, a, null]");
        assert_eq!(Value::Double(2.0).to_string(), "2.0");
        assert_eq!(Value::Type(Type::String).to_string(), "core.String");
    }

    #[test]
    fn serializes_to_json() {
        let value = Value::list([Value::Int(1), Value::Null, Value::from("b"), Value::Bool(true)]);
        assert_eq!(serde_json::to_string(&value).unwrap(), r#"[1,null,"b",true]"#);

        let map = Value::map([(Value::from("k"), Value::Long(7))]);
        assert_eq!(serde_json::to_string(&map).unwrap(), r#"{"k":7}"#);
    }
}

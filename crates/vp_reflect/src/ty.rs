//! Runtime type handles.

use std::borrow::Cow;
use std::fmt;
use std::sync::Arc;

// -----------------------------------------------------------------------------
// Primitive

/// The primitive value kinds of the expression language.
///
/// Every primitive also has a boxed counterpart ([`Type::Boxed`]) that may
/// hold `null`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Primitive {
    Bool,
    Char,
    Byte,
    Short,
    Int,
    Long,
    Float,
    Double,
}

impl Primitive {
    /// All primitive kinds, in declaration order.
    pub const ALL: [Primitive; 8] = [
        Self::Bool,
        Self::Char,
        Self::Byte,
        Self::Short,
        Self::Int,
        Self::Long,
        Self::Float,
        Self::Double,
    ];

    /// The keyword naming the unboxed form, e.g. `int`.
    pub const fn name(self) -> &'static str {
        match self {
            Self::Bool => "boolean",
            Self::Char => "char",
            Self::Byte => "byte",
            Self::Short => "short",
            Self::Int => "int",
            Self::Long => "long",
            Self::Float => "float",
            Self::Double => "double",
        }
    }

    /// The canonical path of the boxed form, e.g. `core.Integer`.
    pub const fn boxed_path(self) -> &'static str {
        match self {
            Self::Bool => "core.Boolean",
            Self::Char => "core.Character",
            Self::Byte => "core.Byte",
            Self::Short => "core.Short",
            Self::Int => "core.Integer",
            Self::Long => "core.Long",
            Self::Float => "core.Float",
            Self::Double => "core.Double",
        }
    }

    /// Parses a primitive keyword.
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|p| p.name() == name)
    }

    /// Returns `true` for the members of the numeric tower
    /// (`byte`, `short`, `int`, `long`, `float`, `double`).
    #[inline]
    pub const fn is_numeric(self) -> bool {
        !matches!(self, Self::Bool | Self::Char)
    }

    /// Returns `true` for `byte`, `short`, `int` and `long`.
    #[inline]
    pub const fn is_integral(self) -> bool {
        matches!(self, Self::Byte | Self::Short | Self::Int | Self::Long)
    }
}

// -----------------------------------------------------------------------------
// Type

/// A cheap, comparable handle naming a runtime type.
///
/// Handles never own member tables. Members are looked up through a
/// [`TypeScope`](crate::scope::TypeScope) which maps a handle to its
/// registered [`TypeInfo`](crate::info::TypeInfo).
///
/// # Examples
///
/// ```
/// use vp_reflect::ty::{Primitive, Type};
///
/// assert_eq!(Type::INT.boxed(), Type::Boxed(Primitive::Int));
/// assert_eq!(Type::from_path("core.Integer"), Type::Boxed(Primitive::Int));
/// assert_eq!(Type::from_path("int[]"), Type::array_of(Type::INT));
/// assert_eq!(Type::named("demo.Person").simple_name(), "Person");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Type {
    /// The return type of methods producing nothing.
    Void,
    /// An unboxed primitive, which can never be `null`.
    Primitive(Primitive),
    /// The boxed form of a primitive.
    Boxed(Primitive),
    /// The top type every non-primitive type is assignable to.
    Object,
    String,
    /// The ordered list container.
    List,
    /// The key/value map container.
    Map,
    /// The meta type of type objects.
    Class,
    Array(Arc<Type>),
    /// A registered host class, by path.
    Named(Arc<str>),
}

impl Type {
    pub const BOOL: Type = Type::Primitive(Primitive::Bool);
    pub const CHAR: Type = Type::Primitive(Primitive::Char);
    pub const BYTE: Type = Type::Primitive(Primitive::Byte);
    pub const SHORT: Type = Type::Primitive(Primitive::Short);
    pub const INT: Type = Type::Primitive(Primitive::Int);
    pub const LONG: Type = Type::Primitive(Primitive::Long);
    pub const FLOAT: Type = Type::Primitive(Primitive::Float);
    pub const DOUBLE: Type = Type::Primitive(Primitive::Double);

    /// Creates a handle for a registered host class.
    #[inline]
    pub fn named(path: impl Into<Arc<str>>) -> Self {
        Self::Named(path.into())
    }

    /// Creates an array type with the given element type.
    #[inline]
    pub fn array_of(elem: Type) -> Self {
        Self::Array(Arc::new(elem))
    }

    /// Returns `true` for unboxed primitives and `void`.
    #[inline]
    pub fn is_primitive(&self) -> bool {
        matches!(self, Self::Primitive(_) | Self::Void)
    }

    #[inline]
    pub fn is_array(&self) -> bool {
        matches!(self, Self::Array(_))
    }

    /// Returns `true` if this is a numeric primitive or its boxed form.
    #[inline]
    pub fn is_numeric(&self) -> bool {
        self.primitive().is_some_and(Primitive::is_numeric)
    }

    /// The primitive kind of a primitive or boxed type.
    #[inline]
    pub fn primitive(&self) -> Option<Primitive> {
        match self {
            Self::Primitive(p) | Self::Boxed(p) => Some(*p),
            _ => None,
        }
    }

    /// Returns the boxed form of a primitive type, or a clone of `self`.
    pub fn boxed(&self) -> Type {
        match self {
            Self::Primitive(p) => Self::Boxed(*p),
            other => other.clone(),
        }
    }

    /// Returns the primitive form of a boxed type, or a clone of `self`.
    pub fn unboxed(&self) -> Type {
        match self {
            Self::Boxed(p) => Self::Primitive(*p),
            other => other.clone(),
        }
    }

    /// Element type of an array type.
    pub fn element(&self) -> Option<&Type> {
        match self {
            Self::Array(elem) => Some(elem),
            _ => None,
        }
    }

    /// The canonical path, as used for registry lookups.
    pub fn path(&self) -> Cow<'_, str> {
        match self {
            Self::Void => Cow::Borrowed("void"),
            Self::Primitive(p) => Cow::Borrowed(p.name()),
            Self::Boxed(p) => Cow::Borrowed(p.boxed_path()),
            Self::Object => Cow::Borrowed("core.Object"),
            Self::String => Cow::Borrowed("core.String"),
            Self::List => Cow::Borrowed("core.List"),
            Self::Map => Cow::Borrowed("core.Map"),
            Self::Class => Cow::Borrowed("core.Class"),
            Self::Array(elem) => Cow::Owned(format!("{}[]", elem.path())),
            Self::Named(path) => Cow::Borrowed(path),
        }
    }

    /// The last `.`-separated part of the path.
    pub fn simple_name(&self) -> Cow<'_, str> {
        match self.path() {
            Cow::Borrowed(path) => Cow::Borrowed(path.rsplit('.').next().unwrap_or(path)),
            Cow::Owned(path) => match path.rsplit_once('.') {
                Some((_, name)) => Cow::Owned(name.to_owned()),
                None => Cow::Owned(path),
            },
        }
    }

    /// Inverse of [`Type::path`]. Unknown paths become [`Type::Named`].
    pub fn from_path(path: &str) -> Type {
        if let Some(elem) = path.strip_suffix("[]") {
            return Self::array_of(Self::from_path(elem));
        }
        if path == "void" {
            return Self::Void;
        }
        if let Some(p) = Primitive::from_name(path) {
            return Self::Primitive(p);
        }
        if let Some(p) = Primitive::ALL.into_iter().find(|p| p.boxed_path() == path) {
            return Self::Boxed(p);
        }
        match path {
            "core.Object" => Self::Object,
            "core.String" => Self::String,
            "core.List" => Self::List,
            "core.Map" => Self::Map,
            "core.Class" => Self::Class,
            _ => Self::Named(Arc::from(path)),
        }
    }
}

impl fmt::Display for Type {
    #[inline]
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.path())
    }
}

impl From<Primitive> for Type {
    #[inline]
    fn from(value: Primitive) -> Self {
        Self::Primitive(value)
    }
}

/// Formats an argument-type vector for diagnostics, e.g. `(int, null)`.
///
/// Unknown (`None`) entries are written as `null`.
pub fn format_arg_types(args: &[Option<Type>]) -> String {
    let parts: Vec<Cow<'_, str>> = args
        .iter()
        .map(|arg| match arg {
            Some(ty) => ty.path(),
            None => Cow::Borrowed("null"),
        })
        .collect();
    format!("({})", parts.join(", "))
}

// -----------------------------------------------------------------------------
// Tests

#[cfg(test)]
mod tests {
    use super::{Primitive, Type, format_arg_types};

    #[test]
    fn path_round_trips_for_core_types() {
        let types = [
            Type::Void,
            Type::INT,
            Type::Boxed(Primitive::Char),
            Type::Object,
            Type::String,
            Type::List,
            Type::Map,
            Type::Class,
            Type::array_of(Type::array_of(Type::DOUBLE)),
            Type::named("demo.Point"),
        ];
        for ty in types {
            assert_eq!(Type::from_path(&ty.path()), ty);
        }
    }

    #[test]
    fn numeric_tower_excludes_bool_and_char() {
        assert!(Type::INT.is_numeric());
        assert!(Type::Boxed(Primitive::Double).is_numeric());
        assert!(!Type::BOOL.is_numeric());
        assert!(!Type::CHAR.is_numeric());
        assert!(!Type::String.is_numeric());
    }

    #[test]
    fn simple_names() {
        assert_eq!(Type::String.simple_name(), "String");
        assert_eq!(Type::INT.simple_name(), "int");
        assert_eq!(Type::array_of(Type::named("a.B")).simple_name(), "B[]");
    }

    #[test]
    fn arg_type_formatting() {
        let args = [Some(Type::INT), None, Some(Type::String)];
        assert_eq!(format_arg_types(&args), "(int, null, core.String)");
        assert_eq!(format_arg_types(&[]), "()");
    }
}

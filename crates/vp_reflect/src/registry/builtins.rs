//! Member tables of the builtin `core` types.

use std::hash::BuildHasher;

use vp_utils::hash::FixedHashState;

use crate::error::InvokeError;
use crate::info::{FieldInfo, MethodInfo, TypeInfo, args};
use crate::ty::{Primitive, Type};
use crate::value::Value;

const NUMBER: &str = "core.Number";
const MATH: &str = "core.Math";

pub(super) fn core_types() -> Vec<TypeInfo> {
    let mut types = vec![
        object(),
        class(),
        string(),
        list(),
        map(),
        number(),
        boolean(),
        character(),
        math(),
    ];
    types.extend(
        [Primitive::Byte, Primitive::Short, Primitive::Int, Primitive::Long, Primitive::Float, Primitive::Double]
            .into_iter()
            .map(boxed_number),
    );
    types
}

// -----------------------------------------------------------------------------
// Receivers

fn mismatch(expected: &'static str, receiver: &Value) -> InvokeError {
    InvokeError::ReceiverMismatch {
        expected,
        actual: receiver.type_name(),
    }
}

fn this_str(receiver: &Value) -> Result<&str, InvokeError> {
    receiver.as_str().ok_or_else(|| mismatch("core.String", receiver))
}

fn this_list(receiver: &Value) -> Result<&[Value], InvokeError> {
    receiver.as_list().ok_or_else(|| mismatch("core.List", receiver))
}

fn this_type(receiver: &Value) -> Result<&Type, InvokeError> {
    receiver.as_type().ok_or_else(|| mismatch("core.Class", receiver))
}

fn out_of_bounds(index: i32, len: usize) -> InvokeError {
    InvokeError::IndexOutOfBounds {
        index: i64::from(index),
        len,
    }
}

fn char_index(s: &str, index: i32) -> Result<usize, InvokeError> {
    let len = s.chars().count();
    match usize::try_from(index) {
        Ok(i) if i <= len => Ok(i),
        _ => Err(out_of_bounds(index, len)),
    }
}

// -----------------------------------------------------------------------------
// Object, Class

fn object() -> TypeInfo {
    TypeInfo::new(Type::Object)
        .with_method(MethodInfo::new("toString", [], Type::String, |this, _| {
            Ok(Value::from(this.to_string()))
        }))
        .with_method(MethodInfo::new("hashCode", [], Type::INT, |this, _| {
            Ok(Value::Int(FixedHashState.hash_one(this) as i32))
        }))
        .with_method(MethodInfo::new("equals", [Type::Object], Type::BOOL, |this, args| {
            Ok(Value::Bool(this == &args[0]))
        }))
        .with_method(MethodInfo::new("getClass", [], Type::Class, |this, _| {
            Ok(Value::Type(this.runtime_type().unwrap_or(Type::Object)))
        }))
}

fn class() -> TypeInfo {
    TypeInfo::new(Type::Class)
        .with_method(MethodInfo::new("getName", [], Type::String, |this, _| {
            Ok(Value::from(this_type(this)?.path().into_owned()))
        }))
        .with_method(MethodInfo::new("getSimpleName", [], Type::String, |this, _| {
            Ok(Value::from(this_type(this)?.simple_name().into_owned()))
        }))
        .with_method(MethodInfo::new("isArray", [], Type::BOOL, |this, _| {
            Ok(Value::Bool(this_type(this)?.is_array()))
        }))
        .with_method(MethodInfo::new("isPrimitive", [], Type::BOOL, |this, _| {
            Ok(Value::Bool(this_type(this)?.is_primitive()))
        }))
}

// -----------------------------------------------------------------------------
// String

fn string() -> TypeInfo {
    TypeInfo::new(Type::String)
        .with_method(MethodInfo::new("length", [], Type::INT, |this, _| {
            Ok(Value::Int(this_str(this)?.chars().count() as i32))
        }))
        .with_method(MethodInfo::new("isEmpty", [], Type::BOOL, |this, _| {
            Ok(Value::Bool(this_str(this)?.is_empty()))
        }))
        .with_method(MethodInfo::new("charAt", [Type::INT], Type::CHAR, |this, a| {
            let s = this_str(this)?;
            let index = args::int(a, 0)?;
            usize::try_from(index)
                .ok()
                .and_then(|i| s.chars().nth(i))
                .map(Value::Char)
                .ok_or_else(|| out_of_bounds(index, s.chars().count()))
        }))
        .with_method(MethodInfo::new("substring", [Type::INT], Type::String, |this, a| {
            let s = this_str(this)?;
            let begin = char_index(s, args::int(a, 0)?)?;
            Ok(Value::from(s.chars().skip(begin).collect::<String>()))
        }))
        .with_method(MethodInfo::new(
            "substring",
            [Type::INT, Type::INT],
            Type::String,
            |this, a| {
                let s = this_str(this)?;
                let begin = char_index(s, args::int(a, 0)?)?;
                let end = char_index(s, args::int(a, 1)?)?;
                if begin > end {
                    return Err(out_of_bounds(args::int(a, 0)?, end));
                }
                Ok(Value::from(s.chars().skip(begin).take(end - begin).collect::<String>()))
            },
        ))
        .with_method(MethodInfo::new("indexOf", [Type::String], Type::INT, |this, a| {
            let s = this_str(this)?;
            let needle = args::string(a, 0)?.unwrap_or_default();
            let found = s
                .find(&*needle)
                .map_or(-1, |byte| s[..byte].chars().count() as i32);
            Ok(Value::Int(found))
        }))
        .with_method(MethodInfo::new("contains", [Type::String], Type::BOOL, |this, a| {
            let needle = args::string(a, 0)?.unwrap_or_default();
            Ok(Value::Bool(this_str(this)?.contains(&*needle)))
        }))
        .with_method(MethodInfo::new("startsWith", [Type::String], Type::BOOL, |this, a| {
            let prefix = args::string(a, 0)?.unwrap_or_default();
            Ok(Value::Bool(this_str(this)?.starts_with(&*prefix)))
        }))
        .with_method(MethodInfo::new("endsWith", [Type::String], Type::BOOL, |this, a| {
            let suffix = args::string(a, 0)?.unwrap_or_default();
            Ok(Value::Bool(this_str(this)?.ends_with(&*suffix)))
        }))
        .with_method(MethodInfo::new("concat", [Type::String], Type::String, |this, a| {
            let tail = args::string(a, 0)?.unwrap_or_default();
            Ok(Value::from(format!("{}{tail}", this_str(this)?)))
        }))
        .with_method(MethodInfo::new("toUpperCase", [], Type::String, |this, _| {
            Ok(Value::from(this_str(this)?.to_uppercase()))
        }))
        .with_method(MethodInfo::new("toLowerCase", [], Type::String, |this, _| {
            Ok(Value::from(this_str(this)?.to_lowercase()))
        }))
        .with_method(MethodInfo::new("trim", [], Type::String, |this, _| {
            Ok(Value::from(this_str(this)?.trim()))
        }))
        .with_method(MethodInfo::static_fn("valueOf", [Type::Object], Type::String, |a| {
            Ok(Value::from(a[0].to_string()))
        }))
}

// -----------------------------------------------------------------------------
// List, Map

fn list() -> TypeInfo {
    TypeInfo::new(Type::List)
        .with_method(MethodInfo::new("size", [], Type::INT, |this, _| {
            Ok(Value::Int(this_list(this)?.len() as i32))
        }))
        .with_method(MethodInfo::new("isEmpty", [], Type::BOOL, |this, _| {
            Ok(Value::Bool(this_list(this)?.is_empty()))
        }))
        .with_method(MethodInfo::new("get", [Type::INT], Type::Object, |this, a| {
            let items = this_list(this)?;
            let index = args::int(a, 0)?;
            usize::try_from(index)
                .ok()
                .and_then(|i| items.get(i))
                .cloned()
                .ok_or_else(|| out_of_bounds(index, items.len()))
        }))
        .with_method(MethodInfo::new("contains", [Type::Object], Type::BOOL, |this, a| {
            Ok(Value::Bool(this_list(this)?.contains(&a[0])))
        }))
        .with_method(MethodInfo::new("indexOf", [Type::Object], Type::INT, |this, a| {
            let found = this_list(this)?.iter().position(|item| item == &a[0]);
            Ok(Value::Int(found.map_or(-1, |i| i as i32)))
        }))
}

fn map() -> TypeInfo {
    fn this_map(receiver: &Value) -> Result<&crate::value::ValueMap, InvokeError> {
        receiver.as_map().ok_or_else(|| mismatch("core.Map", receiver))
    }

    TypeInfo::new(Type::Map)
        .with_method(MethodInfo::new("size", [], Type::INT, |this, _| {
            Ok(Value::Int(this_map(this)?.len() as i32))
        }))
        .with_method(MethodInfo::new("isEmpty", [], Type::BOOL, |this, _| {
            Ok(Value::Bool(this_map(this)?.is_empty()))
        }))
        .with_method(MethodInfo::new("get", [Type::Object], Type::Object, |this, a| {
            Ok(this_map(this)?.get(&a[0]).cloned().unwrap_or(Value::Null))
        }))
        .with_method(MethodInfo::new("containsKey", [Type::Object], Type::BOOL, |this, a| {
            Ok(Value::Bool(this_map(this)?.contains_key(&a[0])))
        }))
}

// -----------------------------------------------------------------------------
// Boxed primitives

fn number() -> TypeInfo {
    fn numeric(receiver: &Value) -> Result<&Value, InvokeError> {
        match receiver.primitive() {
            Some(p) if p.is_numeric() => Ok(receiver),
            _ => Err(mismatch(NUMBER, receiver)),
        }
    }

    TypeInfo::class(NUMBER)
        .with_method(MethodInfo::new("intValue", [], Type::INT, |this, _| {
            let value = numeric(this)?;
            Ok(Value::Int(match value.as_long() {
                Some(v) => v as i32,
                None => value.as_double().unwrap_or_default() as i32,
            }))
        }))
        .with_method(MethodInfo::new("longValue", [], Type::LONG, |this, _| {
            let value = numeric(this)?;
            Ok(Value::Long(match value.as_long() {
                Some(v) => v,
                None => value.as_double().unwrap_or_default() as i64,
            }))
        }))
        .with_method(MethodInfo::new("doubleValue", [], Type::DOUBLE, |this, _| {
            Ok(Value::Double(numeric(this)?.as_double().unwrap_or_default()))
        }))
}

fn boxed_number(p: Primitive) -> TypeInfo {
    let info = TypeInfo::new(Type::Boxed(p)).with_supertype(Type::named(NUMBER));
    let ty = Type::Primitive(p);
    let (min, max): (Value, Value) = match p {
        Primitive::Byte => (i8::MIN.into(), i8::MAX.into()),
        Primitive::Short => (i16::MIN.into(), i16::MAX.into()),
        Primitive::Int => (i32::MIN.into(), i32::MAX.into()),
        Primitive::Long => (i64::MIN.into(), i64::MAX.into()),
        Primitive::Float => (f32::MIN_POSITIVE.into(), f32::MAX.into()),
        _ => (f64::MIN_POSITIVE.into(), f64::MAX.into()),
    };
    let info = info
        .with_field(FieldInfo::constant("MIN_VALUE", ty.clone(), min))
        .with_field(FieldInfo::constant("MAX_VALUE", ty.clone(), max))
        .with_method(MethodInfo::static_fn("valueOf", [ty.clone()], Type::Boxed(p), |a| {
            Ok(a[0].clone())
        }));

    let parse_name = match p {
        Primitive::Byte => "parseByte",
        Primitive::Short => "parseShort",
        Primitive::Int => "parseInt",
        Primitive::Long => "parseLong",
        Primitive::Float => "parseFloat",
        _ => "parseDouble",
    };
    info.with_method(MethodInfo::static_fn(parse_name, [Type::String], ty, move |a| {
        let text = args::string(a, 0)?.unwrap_or_default();
        parse_number(p, text.trim())
            .ok_or_else(|| InvokeError::failed(format!("invalid number {text:?}")))
    }))
}

fn parse_number(p: Primitive, text: &str) -> Option<Value> {
    Some(match p {
        Primitive::Byte => Value::Byte(text.parse().ok()?),
        Primitive::Short => Value::Short(text.parse().ok()?),
        Primitive::Int => Value::Int(text.parse().ok()?),
        Primitive::Long => Value::Long(text.parse().ok()?),
        Primitive::Float => Value::Float(text.parse().ok()?),
        _ => Value::Double(text.parse().ok()?),
    })
}

fn boolean() -> TypeInfo {
    TypeInfo::new(Type::Boxed(Primitive::Bool))
        .with_field(FieldInfo::constant("TRUE", Type::Boxed(Primitive::Bool), true))
        .with_field(FieldInfo::constant("FALSE", Type::Boxed(Primitive::Bool), false))
        .with_method(MethodInfo::new("booleanValue", [], Type::BOOL, |this, _| {
            this.as_bool()
                .map(Value::Bool)
                .ok_or_else(|| mismatch("core.Boolean", this))
        }))
        .with_method(MethodInfo::static_fn("parseBoolean", [Type::String], Type::BOOL, |a| {
            let text = args::string(a, 0)?.unwrap_or_default();
            Ok(Value::Bool(text.eq_ignore_ascii_case("true")))
        }))
        .with_method(MethodInfo::static_fn("valueOf", [Type::BOOL], Type::Boxed(Primitive::Bool), |a| {
            Ok(Value::Bool(args::bool(a, 0)?))
        }))
}

fn character() -> TypeInfo {
    TypeInfo::new(Type::Boxed(Primitive::Char))
        .with_method(MethodInfo::new("charValue", [], Type::CHAR, |this, _| {
            this.as_char()
                .map(Value::Char)
                .ok_or_else(|| mismatch("core.Character", this))
        }))
        .with_method(MethodInfo::static_fn("isDigit", [Type::CHAR], Type::BOOL, |a| {
            Ok(Value::Bool(args::char(a, 0)?.is_numeric()))
        }))
        .with_method(MethodInfo::static_fn("isLetter", [Type::CHAR], Type::BOOL, |a| {
            Ok(Value::Bool(args::char(a, 0)?.is_alphabetic()))
        }))
        .with_method(MethodInfo::static_fn("isWhitespace", [Type::CHAR], Type::BOOL, |a| {
            Ok(Value::Bool(args::char(a, 0)?.is_whitespace()))
        }))
        .with_method(MethodInfo::static_fn("toUpperCase", [Type::CHAR], Type::CHAR, |a| {
            let c = args::char(a, 0)?;
            Ok(Value::Char(c.to_uppercase().next().unwrap_or(c)))
        }))
        .with_method(MethodInfo::static_fn("toLowerCase", [Type::CHAR], Type::CHAR, |a| {
            let c = args::char(a, 0)?;
            Ok(Value::Char(c.to_lowercase().next().unwrap_or(c)))
        }))
}

// -----------------------------------------------------------------------------
// Math

fn math() -> TypeInfo {
    let unary = |name: &'static str, f: fn(f64) -> f64| {
        MethodInfo::static_fn(name, [Type::DOUBLE], Type::DOUBLE, move |a| {
            Ok(Value::Double(f(args::double(a, 0)?)))
        })
    };

    TypeInfo::class(MATH)
        .with_field(FieldInfo::constant("PI", Type::DOUBLE, std::f64::consts::PI))
        .with_field(FieldInfo::constant("E", Type::DOUBLE, std::f64::consts::E))
        // Overloads are listed narrowest first.
        .with_method(MethodInfo::static_fn("abs", [Type::INT], Type::INT, |a| {
            Ok(Value::Int(args::int(a, 0)?.wrapping_abs()))
        }))
        .with_method(MethodInfo::static_fn("abs", [Type::LONG], Type::LONG, |a| {
            Ok(Value::Long(args::long(a, 0)?.wrapping_abs()))
        }))
        .with_method(MethodInfo::static_fn("abs", [Type::DOUBLE], Type::DOUBLE, |a| {
            Ok(Value::Double(args::double(a, 0)?.abs()))
        }))
        .with_method(MethodInfo::static_fn("max", [Type::INT, Type::INT], Type::INT, |a| {
            Ok(Value::Int(args::int(a, 0)?.max(args::int(a, 1)?)))
        }))
        .with_method(MethodInfo::static_fn("max", [Type::LONG, Type::LONG], Type::LONG, |a| {
            Ok(Value::Long(args::long(a, 0)?.max(args::long(a, 1)?)))
        }))
        .with_method(MethodInfo::static_fn("max", [Type::DOUBLE, Type::DOUBLE], Type::DOUBLE, |a| {
            Ok(Value::Double(args::double(a, 0)?.max(args::double(a, 1)?)))
        }))
        .with_method(MethodInfo::static_fn("min", [Type::INT, Type::INT], Type::INT, |a| {
            Ok(Value::Int(args::int(a, 0)?.min(args::int(a, 1)?)))
        }))
        .with_method(MethodInfo::static_fn("min", [Type::LONG, Type::LONG], Type::LONG, |a| {
            Ok(Value::Long(args::long(a, 0)?.min(args::long(a, 1)?)))
        }))
        .with_method(MethodInfo::static_fn("min", [Type::DOUBLE, Type::DOUBLE], Type::DOUBLE, |a| {
            Ok(Value::Double(args::double(a, 0)?.min(args::double(a, 1)?)))
        }))
        .with_method(MethodInfo::static_fn("pow", [Type::DOUBLE, Type::DOUBLE], Type::DOUBLE, |a| {
            Ok(Value::Double(args::double(a, 0)?.powf(args::double(a, 1)?)))
        }))
        .with_method(MethodInfo::static_fn("round", [Type::DOUBLE], Type::LONG, |a| {
            Ok(Value::Long((args::double(a, 0)? + 0.5).floor() as i64))
        }))
        .with_method(unary("sqrt", f64::sqrt))
        .with_method(unary("floor", f64::floor))
        .with_method(unary("ceil", f64::ceil))
}

#[cfg(test)]
mod tests {
    use crate::registry::TypeRegistry;
    use crate::ty::{Primitive, Type};
    use crate::value::Value;

    fn call(path: &str, name: &str, receiver: &Value, args: &[Value]) -> Value {
        let registry = TypeRegistry::new();
        let info = registry.get_with_type_path(path).unwrap();
        let method = info
            .methods_named(name)
            .find(|m| m.params().len() == args.len())
            .unwrap();
        method.invoke(receiver, args).unwrap()
    }

    #[test]
    fn string_methods_count_chars() {
        let s = Value::from("héllo");
        assert_eq!(call("core.String", "length", &s, &[]), Value::Int(5));
        assert_eq!(call("core.String", "charAt", &s, &[Value::Int(1)]), Value::Char('é'));
        assert_eq!(call("core.String", "substring", &s, &[Value::Int(1), Value::Int(3)]), Value::from("él"));
        assert_eq!(call("core.String", "indexOf", &s, &[Value::from("l")]), Value::Int(2));
    }

    #[test]
    fn boxed_types_extend_number() {
        let registry = TypeRegistry::new();
        let info = registry.get(&Type::Boxed(Primitive::Int)).unwrap();
        assert_eq!(info.supertypes(), &[Type::named("core.Number")]);
        assert_eq!(info.field("MAX_VALUE").unwrap().get(&Value::Null), Ok(Value::Int(i32::MAX)));
        assert_eq!(call("core.Number", "doubleValue", &Value::Int(3), &[]), Value::Double(3.0));
    }

    #[test]
    fn math_rounds_half_up() {
        assert_eq!(call("core.Math", "round", &Value::Null, &[Value::Double(2.5)]), Value::Long(3));
        assert_eq!(call("core.Math", "round", &Value::Null, &[Value::Double(-2.5)]), Value::Long(-2));
    }

    #[test]
    fn list_get_is_bounds_checked() {
        let registry = TypeRegistry::new();
        let get = registry
            .get(&Type::List)
            .unwrap()
            .methods_named("get")
            .next()
            .unwrap()
            .clone();
        let list = Value::list([Value::Int(1)]);
        assert_eq!(get.invoke(&list, &[Value::Int(0)]), Ok(Value::Int(1)));
        assert!(get.invoke(&list, &[Value::Int(1)]).is_err());
    }
}

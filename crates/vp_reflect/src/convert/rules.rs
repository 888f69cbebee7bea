//! Builtin conversion rules.

use crate::error::ConversionError;
use crate::ty::{Primitive, Type};
use crate::value::Value;

pub(super) fn can_convert(target: &Type, source: &Type) -> bool {
    if target.boxed() == source.boxed() {
        return true;
    }
    match target {
        Type::Object | Type::String => true,
        Type::Primitive(p) | Type::Boxed(p) => match p {
            Primitive::Bool => *source == Type::String,
            Primitive::Char => {
                *source == Type::String || source.primitive().is_some_and(Primitive::is_integral)
            }
            _ => {
                *source == Type::String || source.primitive().is_some_and(|s| s != Primitive::Bool)
            }
        },
        Type::Array(elem) => match source {
            Type::Array(from) => can_convert(elem, from),
            Type::List => true,
            _ => false,
        },
        Type::List => source.is_array(),
        _ => false,
    }
}

fn unsupported(value: &Value, to: &Type) -> ConversionError {
    ConversionError::Unsupported {
        from: value.type_name(),
        to: to.clone(),
    }
}

pub(super) fn convert(value: &Value, target: &Type) -> Result<Value, ConversionError> {
    match target {
        Type::Object => Ok(value.clone()),
        Type::String => Ok(match value {
            Value::String(_) => value.clone(),
            other => Value::from(other.to_string()),
        }),
        Type::Primitive(p) | Type::Boxed(p) => to_primitive(value, *p, target),
        Type::Array(elem) => {
            let items = match value {
                Value::Array(array) => array.items(),
                Value::List(items) => &**items,
                _ => return Err(unsupported(value, target)),
            };
            let items = items
                .iter()
                .map(|item| {
                    if item.is_null() && elem.is_primitive() {
                        return Err(ConversionError::NullToPrimitive { to: (**elem).clone() });
                    }
                    if item.is_null() {
                        return Ok(Value::Null);
                    }
                    convert(item, elem)
                })
                .collect::<Result<Vec<_>, _>>()?;
            Ok(Value::array((**elem).clone(), items))
        }
        Type::List => match value {
            Value::List(_) => Ok(value.clone()),
            Value::Array(array) => Ok(Value::list(array.items().iter().cloned())),
            _ => Err(unsupported(value, target)),
        },
        _ if value.has_runtime_type(Some(target)) => Ok(value.clone()),
        _ => Err(unsupported(value, target)),
    }
}

fn to_primitive(value: &Value, p: Primitive, target: &Type) -> Result<Value, ConversionError> {
    if value.primitive() == Some(p) {
        return Ok(value.clone());
    }
    if let Value::String(text) = value {
        return parse(text, p, target);
    }

    let converted = match p {
        Primitive::Bool => None,
        Primitive::Char => value
            .as_long()
            .and_then(|v| u32::try_from(v).ok())
            .and_then(char::from_u32)
            .map(Value::Char),
        Primitive::Float => numeric(value).map(|v| Value::Float(v.as_f64() as f32)),
        Primitive::Double => numeric(value).map(|v| Value::Double(v.as_f64())),
        integral => numeric(value).and_then(|v| narrow(v.as_i64()?, integral)),
    };
    converted.ok_or_else(|| unsupported(value, target))
}

#[derive(Clone, Copy)]
enum Number {
    Integral(i64),
    Real(f64),
}

impl Number {
    fn as_f64(self) -> f64 {
        match self {
            Self::Integral(v) => v as f64,
            Self::Real(v) => v,
        }
    }

    /// Reals truncate towards zero.
    fn as_i64(self) -> Option<i64> {
        match self {
            Self::Integral(v) => Some(v),
            Self::Real(v) if v.is_finite() => Some(v.trunc() as i64),
            Self::Real(_) => None,
        }
    }
}

fn numeric(value: &Value) -> Option<Number> {
    match value {
        Value::Float(v) => Some(Number::Real(f64::from(*v))),
        Value::Double(v) => Some(Number::Real(*v)),
        Value::Char(c) => Some(Number::Integral(i64::from(u32::from(*c)))),
        other => other.as_long().map(Number::Integral),
    }
}

// Out-of-range integral values do not convert.
fn narrow(v: i64, p: Primitive) -> Option<Value> {
    Some(match p {
        Primitive::Byte => Value::Byte(i8::try_from(v).ok()?),
        Primitive::Short => Value::Short(i16::try_from(v).ok()?),
        Primitive::Int => Value::Int(i32::try_from(v).ok()?),
        Primitive::Long => Value::Long(v),
        _ => return None,
    })
}

fn parse(text: &str, p: Primitive, target: &Type) -> Result<Value, ConversionError> {
    let err = || ConversionError::Parse {
        text: text.to_owned(),
        to: target.clone(),
    };
    let trimmed = text.trim();
    Ok(match p {
        Primitive::Bool => match trimmed {
            "true" => Value::Bool(true),
            "false" => Value::Bool(false),
            _ => return Err(err()),
        },
        Primitive::Char => {
            let mut chars = text.chars();
            match (chars.next(), chars.next()) {
                (Some(c), None) => Value::Char(c),
                _ => return Err(err()),
            }
        }
        Primitive::Byte => Value::Byte(trimmed.parse().map_err(|_| err())?),
        Primitive::Short => Value::Short(trimmed.parse().map_err(|_| err())?),
        Primitive::Int => Value::Int(trimmed.parse().map_err(|_| err())?),
        Primitive::Long => Value::Long(trimmed.parse().map_err(|_| err())?),
        Primitive::Float => Value::Float(trimmed.parse().map_err(|_| err())?),
        Primitive::Double => Value::Double(trimmed.parse().map_err(|_| err())?),
    })
}

//! Literal table and argument literals.

use vp_reflect::{Primitive, Type, Value};

/// A constant with its static type. `null` has no static type.
#[derive(Debug, Clone, PartialEq)]
pub struct Literal {
    pub value: Value,
    pub ty: Option<Type>,
}

impl Literal {
    fn new(value: Value, ty: Type) -> Self {
        Self {
            value,
            ty: Some(ty),
        }
    }
}

/// Looks up a well-known name.
///
/// Covers `true`, `false`, `null` and `nil`, the primitive keywords, and the
/// simple names of the builtin `core` types, which evaluate to type objects.
///
/// # Examples
///
/// ```
/// use vp_access::literal::lookup;
/// use vp_reflect::{Type, Value};
///
/// assert_eq!(lookup("nil").unwrap().value, Value::Null);
/// assert_eq!(lookup("int").unwrap().value, Value::Type(Type::INT));
/// assert_eq!(lookup("String").unwrap().value, Value::Type(Type::String));
/// assert!(lookup("foo").is_none());
/// ```
pub fn lookup(name: &str) -> Option<Literal> {
    Some(match name {
        "true" => Literal::new(Value::Bool(true), Type::BOOL),
        "false" => Literal::new(Value::Bool(false), Type::BOOL),
        "null" | "nil" => Literal {
            value: Value::Null,
            ty: None,
        },
        "void" => Literal::new(Value::Type(Type::Void), Type::Class),
        _ => {
            let ty = match Primitive::from_name(name) {
                Some(p) => Type::Primitive(p),
                None => core_alias(name)?,
            };
            Literal::new(Value::Type(ty), Type::Class)
        }
    })
}

fn core_alias(name: &str) -> Option<Type> {
    Some(match name {
        "Object" => Type::Object,
        "String" => Type::String,
        "List" => Type::List,
        "Map" => Type::Map,
        "Class" => Type::Class,
        "Math" | "Number" => Type::from_path(&format!("core.{name}")),
        _ => {
            let p = Primitive::ALL
                .into_iter()
                .find(|p| p.boxed_path().strip_prefix("core.") == Some(name))?;
            Type::Boxed(p)
        }
    })
}

/// Parses an argument or index literal.
///
/// Strings may use either quote and the usual escapes. Numbers may be
/// negative, hexadecimal, and carry an `L`, `f` or `d` suffix; integers that
/// do not fit an `int` become `long`.
///
/// # Examples
///
/// ```
/// use vp_access::literal::parse_literal;
/// use vp_reflect::{Type, Value};
///
/// let lit = parse_literal("'a\\'b'").unwrap();
/// assert_eq!(lit.value, Value::from("a'b"));
///
/// let lit = parse_literal("3000000000").unwrap();
/// assert_eq!((lit.value, lit.ty), (Value::Long(3_000_000_000), Some(Type::LONG)));
///
/// assert_eq!(parse_literal("-0x10").unwrap().value, Value::Int(-16));
/// assert!(parse_literal("a.b").is_none());
/// ```
pub fn parse_literal(text: &str) -> Option<Literal> {
    let text = text.trim();
    let first = text.chars().next()?;
    if first == '\'' || first == '"' {
        return parse_string(text, first);
    }
    match text {
        "true" | "false" | "null" | "nil" => return lookup(text),
        _ => {}
    }
    if first.is_ascii_digit() || (first == '-' || first == '.') && text.len() > 1 {
        return parse_number(text);
    }
    None
}

fn parse_string(text: &str, quote: char) -> Option<Literal> {
    let body = text.strip_prefix(quote)?.strip_suffix(quote)?;
    let mut out = String::with_capacity(body.len());
    let mut chars = body.chars();
    while let Some(c) = chars.next() {
        if c == quote {
            // An unescaped quote ends the literal early, e.g. `'a' + 'b'`.
            return None;
        }
        if c != '\\' {
            out.push(c);
            continue;
        }
        out.push(match chars.next()? {
            'n' => '\n',
            't' => '\t',
            'r' => '\r',
            '0' => '\0',
            'u' => {
                let hex: String = chars.by_ref().take(4).collect();
                char::from_u32(u32::from_str_radix(&hex, 16).ok()?)?
            }
            other => other,
        });
    }
    Some(Literal::new(Value::from(out), Type::String))
}

fn parse_number(text: &str) -> Option<Literal> {
    let (negative, digits) = match text.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, text),
    };
    if digits.is_empty() || digits.starts_with(['-', '+']) {
        return None;
    }

    if let Some(hex) = digits.strip_prefix("0x").or_else(|| digits.strip_prefix("0X")) {
        let (hex, long) = strip_long_suffix(hex);
        let magnitude = i64::from_str_radix(hex, 16).ok()?;
        return integral(if negative { -magnitude } else { magnitude }, long);
    }

    let (body, long) = strip_long_suffix(digits);
    if long {
        let value: i64 = body.parse().ok()?;
        return integral(if negative { -value } else { value }, true);
    }

    let last = digits.chars().last()?;
    let signed = if negative { format!("-{digits}") } else { digits.to_owned() };
    match last {
        'f' | 'F' => {
            let value: f32 = signed[..signed.len() - 1].parse().ok()?;
            Some(Literal::new(Value::Float(value), Type::FLOAT))
        }
        'd' | 'D' => {
            let value: f64 = signed[..signed.len() - 1].parse().ok()?;
            Some(Literal::new(Value::Double(value), Type::DOUBLE))
        }
        _ if digits.contains(['.', 'e', 'E']) => {
            let value: f64 = signed.parse().ok()?;
            Some(Literal::new(Value::Double(value), Type::DOUBLE))
        }
        _ => {
            if !digits.bytes().all(|b| b.is_ascii_digit()) {
                return None;
            }
            integral(signed.parse().ok()?, false)
        }
    }
}

fn strip_long_suffix(text: &str) -> (&str, bool) {
    match text.strip_suffix(['L', 'l']) {
        Some(body) => (body, true),
        None => (text, false),
    }
}

fn integral(value: i64, long: bool) -> Option<Literal> {
    if !long && let Ok(value) = i32::try_from(value) {
        return Some(Literal::new(Value::Int(value), Type::INT));
    }
    Some(Literal::new(Value::Long(value), Type::LONG))
}

#[cfg(test)]
mod tests {
    use super::{lookup, parse_literal};
    use vp_reflect::{Primitive, Type, Value};

    fn value(text: &str) -> Value {
        parse_literal(text).unwrap().value
    }

    #[test]
    fn numbers() {
        assert_eq!(value("42"), Value::Int(42));
        assert_eq!(value("-7"), Value::Int(-7));
        assert_eq!(value("7L"), Value::Long(7));
        assert_eq!(value("1.5"), Value::Double(1.5));
        assert_eq!(value("2f"), Value::Float(2.0));
        assert_eq!(value("2d"), Value::Double(2.0));
        assert_eq!(value("1e3"), Value::Double(1000.0));
        assert_eq!(value("0xffL"), Value::Long(255));
        assert!(parse_literal("12ab").is_none());
        assert!(parse_literal("-").is_none());
    }

    #[test]
    fn strings_and_escapes() {
        assert_eq!(value("\"a\\tb\""), Value::from("a\tb"));
        assert_eq!(value("'\\u0041'"), Value::from("A"));
        assert_eq!(parse_literal("'x'").unwrap().ty, Some(Type::String));
        assert!(parse_literal("'a' + 'b'").is_none());
        assert!(parse_literal("'open").is_none());
    }

    #[test]
    fn keywords() {
        assert_eq!(parse_literal("null").unwrap().ty, None);
        assert_eq!(value("true"), Value::Bool(true));
        assert_eq!(lookup("Integer").unwrap().value, Value::Type(Type::Boxed(Primitive::Int)));
        assert_eq!(lookup("Math").unwrap().value, Value::Type(Type::named("core.Math")));
        assert!(parse_literal("foo").is_none());
    }
}

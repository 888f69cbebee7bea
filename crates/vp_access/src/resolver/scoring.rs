use std::sync::Arc;

use vp_reflect::Type;
use vp_reflect::info::{ConstructorInfo, MethodInfo};

/// The type relations overload scoring depends on.
pub trait TypeRelations {
    /// `true` if a `source` value may be passed where `target` is declared.
    fn is_assignable(&self, target: &Type, source: &Type) -> bool;

    /// `true` if a `source` value can be converted to `target`. `None`
    /// stands for an unknown or `null` argument.
    fn can_convert(&self, target: &Type, source: Option<&Type>) -> bool;

    /// Changes whenever [`can_convert`](Self::can_convert) may answer
    /// differently.
    fn conversion_generation(&self) -> u64 {
        0
    }
}

#[derive(Clone, Copy)]
enum Table {
    Method { require_exact: bool },
    Constructor,
}

/// Scores one argument against one parameter. `None` rejects the candidate.
fn score_argument(table: Table, arg: Option<&Type>, param: &Type, rel: &dyn TypeRelations) -> Option<u32> {
    let Some(arg) = arg else {
        return (!param.is_primitive()).then_some(5);
    };
    if arg == param {
        return Some(6);
    }
    if arg.boxed() == param.boxed() {
        return Some(5);
    }
    if arg.is_numeric() && param.is_numeric() {
        return Some(4);
    }
    if rel.is_assignable(param, arg) {
        return Some(3);
    }
    match table {
        Table::Method { require_exact } => {
            if !require_exact && rel.can_convert(param, Some(arg)) {
                let bonus = (param.is_array() && arg.is_array())
                    || (*param == Type::CHAR && *arg == Type::String);
                return Some(1 + u32::from(bonus));
            }
            (*arg == Type::Object).then_some(1)
        }
        Table::Constructor => rel.can_convert(param, Some(arg)).then_some(1),
    }
}

/// Total score of a parameter list, `0` when rejected.
fn score(table: Table, args: &[Option<Type>], params: &[Type], rel: &dyn TypeRelations) -> u32 {
    if args.len() != params.len() {
        return 0;
    }
    let mut total = 0;
    for (arg, param) in args.iter().zip(params) {
        match score_argument(table, arg.as_ref(), param, rel) {
            Some(points) => total += points,
            None => return 0,
        }
    }
    total
}

fn best<'a, T>(
    table: Table,
    args: &[Option<Type>],
    candidates: &'a [Arc<T>],
    params: impl Fn(&T) -> &[Type],
    rel: &dyn TypeRelations,
) -> Option<&'a Arc<T>> {
    let mut best = None;
    let mut best_score = 0;
    for candidate in candidates {
        let param_types = params(candidate);
        if args.is_empty() && param_types.is_empty() {
            return Some(candidate);
        }
        let points = score(table, args, param_types, rel);
        // Strictly greater: the first of equally scored candidates wins.
        if points > best_score {
            best = Some(candidate);
            best_score = points;
        }
    }
    best
}

/// Picks the best method for the argument types.
///
/// Per argument: an unknown (`None`) argument scores 5 against a reference
/// parameter and rejects a primitive one; an exact match scores 6, a boxing
/// match 5, two numeric types 4 and an assignable type 3. Unless
/// `require_exact` is set, a convertible argument scores 1, plus 1 when both
/// sides are arrays or a string meets a `char`. An `Object` argument scores 1.
/// Anything else rejects the candidate.
///
/// The highest total wins; ties go to the earliest candidate.
pub fn best_method<'a>(
    args: &[Option<Type>],
    candidates: &'a [Arc<MethodInfo>],
    require_exact: bool,
    rel: &dyn TypeRelations,
) -> Option<&'a Arc<MethodInfo>> {
    best(Table::Method { require_exact }, args, candidates, MethodInfo::params, rel)
}

/// Picks the best constructor. Like [`best_method`], except that every
/// convertible argument scores exactly 1 and `Object` arguments get no
/// special treatment.
pub fn best_constructor<'a>(
    args: &[Option<Type>],
    candidates: &'a [Arc<ConstructorInfo>],
    rel: &dyn TypeRelations,
) -> Option<&'a Arc<ConstructorInfo>> {
    best(Table::Constructor, args, candidates, ConstructorInfo::params, rel)
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use vp_reflect::info::{ConstructorInfo, MethodInfo};
    use vp_reflect::{Primitive, Type, Value};

    use super::{TypeRelations, best_constructor, best_method};

    /// Assignable only to `Object`; everything non-primitive converts to `String`.
    struct Flat;

    impl TypeRelations for Flat {
        fn is_assignable(&self, target: &Type, source: &Type) -> bool {
            *target == Type::Object && !source.is_primitive()
        }

        fn can_convert(&self, target: &Type, source: Option<&Type>) -> bool {
            match source {
                None => !target.is_primitive(),
                Some(source) => *target == Type::String || (*target == Type::CHAR && *source == Type::String),
            }
        }
    }

    fn method(name: &str, params: impl IntoIterator<Item = Type>) -> Arc<MethodInfo> {
        Arc::new(MethodInfo::new(name, params, Type::Void, |_, _| Ok(Value::Null)))
    }

    fn winner(args: &[Option<Type>], candidates: &[Arc<MethodInfo>]) -> Option<String> {
        best_method(args, candidates, false, &Flat).map(|m| m.name().to_owned())
    }

    #[test]
    fn primitive_literal_prefers_primitive_overload() {
        let candidates = [
            method("m2", [Type::Boxed(Primitive::Int)]),
            method("m1", [Type::INT]),
        ];
        assert_eq!(winner(&[Some(Type::INT)], &candidates).as_deref(), Some("m1"));
        assert_eq!(
            winner(&[Some(Type::Boxed(Primitive::Int))], &candidates).as_deref(),
            Some("m2"),
        );
        // Numeric tower: long scores 4 against both, the first wins.
        assert_eq!(winner(&[Some(Type::LONG)], &candidates).as_deref(), Some("m2"));
    }

    #[test]
    fn null_argument_rejects_primitive_parameters() {
        let candidates = [method("p", [Type::INT]), method("r", [Type::String])];
        assert_eq!(winner(&[None], &candidates).as_deref(), Some("r"));

        let only_primitive = [method("p", [Type::INT])];
        assert_eq!(winner(&[None], &only_primitive), None);
    }

    #[test]
    fn zero_arguments_match_immediately() {
        let candidates = [method("a", [Type::INT]), method("b", []), method("c", [])];
        assert_eq!(winner(&[], &candidates).as_deref(), Some("b"));
        assert_eq!(winner(&[Some(Type::INT), Some(Type::INT)], &candidates), None);
    }

    #[test]
    fn conversions_are_a_last_resort() {
        let candidates = [method("s", [Type::String]), method("c", [Type::CHAR])];
        // A string exactly matches `s` (6) and converts to `c` (1 + 1).
        assert_eq!(winner(&[Some(Type::String)], &candidates).as_deref(), Some("s"));
        assert_eq!(winner(&[Some(Type::named("demo.X"))], &candidates).as_deref(), Some("s"));
        assert_eq!(best_method(&[Some(Type::named("demo.X"))], &candidates, true, &Flat), None);
    }

    #[test]
    fn constructors_use_the_strict_table() {
        let open = |param: Type| Arc::new(ConstructorInfo::new([param], |_| Ok(Value::Null)));
        let candidates = [open(Type::INT), open(Type::String)];
        let pick = |arg: Option<Type>| {
            best_constructor(&[arg], &candidates, &Flat).map(|c| c.params()[0].clone())
        };
        assert_eq!(pick(Some(Type::LONG)), Some(Type::INT));
        assert_eq!(pick(None), Some(Type::String));
        assert_eq!(pick(Some(Type::BOOL)), Some(Type::String));
    }
}

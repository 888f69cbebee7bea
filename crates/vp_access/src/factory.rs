//! The entry point of the outer evaluator.

use std::fmt;
use std::sync::Arc;

use vp_reflect::convert::TypeConverter;
use vp_reflect::scope::TypeScope;
use vp_reflect::{Type, Value};
use vp_utils::CacheMap;

use crate::accessor::{self, Accessor};
use crate::config::{AccessConfig, Backend};
use crate::error::{AccessError, ErrorKind};
use crate::plan::{Frame, Receiver};
use crate::runtime::Runtime;
use crate::segment::Segment;
use crate::vars::VariableResolver;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct AccessorKey {
    path: Box<str>,
    root: Receiver,
    conversions: u64,
    backend: Backend,
}

/// Builds and caches accessors.
///
/// Accessors are cached by path text, the receiver the root context denotes,
/// conversion generation and backend. Building an accessor evaluates it once,
/// so every entry point returns the value as well.
///
/// A cached compiled accessor that meets receiver or argument types it was
/// not compiled for is replaced by an interpreted one.
///
/// # Examples
///
/// ```
/// use vp_access::AccessorFactory;
/// use vp_access::vars::MapVariables;
/// use vp_reflect::Value;
///
/// let factory = AccessorFactory::default();
/// let vars: MapVariables = [("name", "vp")].into_iter().collect();
///
/// let value = factory.get_value("name.toUpperCase()", &Value::Null, &Value::Null, &vars).unwrap();
/// assert_eq!(value, Value::from("VP"));
///
/// let value = factory.get_value("Math.max(2, 3)", &Value::Null, &Value::Null, &vars).unwrap();
/// assert_eq!(value, Value::Int(3));
/// ```
pub struct AccessorFactory {
    runtime: Arc<Runtime>,
    accessors: CacheMap<AccessorKey, Arc<Accessor>>,
}

impl Default for AccessorFactory {
    fn default() -> Self {
        Self::new(TypeScope::default())
    }
}

impl AccessorFactory {
    pub fn new(scope: TypeScope) -> Self {
        Self::with_config(scope, AccessConfig::default())
    }

    /// Creates a factory whose converter holds the auto-registered rules.
    pub fn with_config(scope: TypeScope, config: AccessConfig) -> Self {
        let converter = TypeConverter::new();
        #[cfg(feature = "auto_register")]
        converter.auto_register();
        Self::with_converter(scope, config, converter)
    }

    pub fn with_converter(scope: TypeScope, config: AccessConfig, converter: TypeConverter) -> Self {
        let capacity = config.accessor_cache_capacity();
        Self {
            runtime: Arc::new(Runtime::new(config, scope, converter)),
            accessors: CacheMap::new("accessors", capacity),
        }
    }

    #[inline]
    pub fn runtime(&self) -> &Arc<Runtime> {
        &self.runtime
    }

    #[inline]
    pub fn config(&self) -> &AccessConfig {
        self.runtime.config()
    }

    /// The coercion rules.
    ///
    /// Conversions may be added at any time; later lookups score with them.
    #[inline]
    pub fn converter(&self) -> &TypeConverter {
        self.runtime.converter()
    }

    /// Evaluates `path` with the configured backend.
    pub fn get_value(
        &self,
        path: &str,
        ctx: &Value,
        this: &Value,
        vars: &dyn VariableResolver,
    ) -> Result<Value, AccessError> {
        let backend = self.runtime.config().backend();
        self.accessor(path, ctx, this, vars, backend).map(|(value, _)| value)
    }

    /// Builds, or fetches, the interpreted accessor for `path`.
    pub fn interpret(
        &self,
        path: &str,
        ctx: &Value,
        this: &Value,
        vars: &dyn VariableResolver,
    ) -> Result<(Value, Arc<Accessor>), AccessError> {
        self.accessor(path, ctx, this, vars, Backend::Interpreted)
    }

    /// Builds, or fetches, the compiled accessor for `path`.
    ///
    /// Paths the compiler declines are interpreted instead; the returned
    /// accessor then reports [`Backend::Interpreted`].
    pub fn compile(
        &self,
        path: &str,
        ctx: &Value,
        this: &Value,
        vars: &dyn VariableResolver,
    ) -> Result<(Value, Arc<Accessor>), AccessError> {
        self.accessor(path, ctx, this, vars, Backend::Compiled)
    }

    /// Splits `path` into segments.
    pub fn tokenize(&self, path: &str) -> Result<Arc<[Segment]>, AccessError> {
        self.runtime.segments(&Arc::from(path))
    }

    /// Drops every accessor and member lookup that may depend on `ty`.
    /// Call after re-registering `ty`.
    pub fn invalidate(&self, ty: &Type) {
        self.runtime.invalidate(ty);
        self.accessors.clear();
        log::debug!("invalidated accessors after a change to `{ty}`");
    }

    fn accessor(
        &self,
        path: &str,
        ctx: &Value,
        this: &Value,
        vars: &dyn VariableResolver,
        backend: Backend,
    ) -> Result<(Value, Arc<Accessor>), AccessError> {
        let key = AccessorKey {
            path: Box::from(path),
            root: Receiver::of(ctx),
            conversions: self.runtime.converter().generation(),
            backend,
        };
        let frame = Frame { ctx, this, vars };
        let path: Arc<str> = Arc::from(path);

        if let Some(accessor) = self.accessors.get(&key) {
            match accessor.eval(ctx, this, vars) {
                Err(err) if matches!(err.kind(), ErrorKind::OptimizationNotSupported(_)) => {
                    log::debug!("{err}; interpreting instead");
                    let (value, accessor) = accessor::build(&self.runtime, path, &frame, Backend::Interpreted)?;
                    return Ok((value, self.accessors.replace(key, Arc::new(accessor))));
                }
                result => return result.map(|value| (value, accessor)),
            }
        }

        let (value, accessor) = match accessor::build(&self.runtime, path.clone(), &frame, backend) {
            Err(err) if matches!(err.kind(), ErrorKind::OptimizationNotSupported(_)) => {
                log::debug!("{err}; falling back to the interpreted backend");
                accessor::build(&self.runtime, path, &frame, Backend::Interpreted)?
            }
            built => built?,
        };
        log::debug!("built {:?} accessor for `{}`", accessor.backend(), accessor.path());
        Ok((value, self.accessors.insert(key, Arc::new(accessor))))
    }
}

impl fmt::Debug for AccessorFactory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AccessorFactory")
            .field("runtime", &self.runtime)
            .field("accessors", &self.accessors)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use vp_reflect::convert::FnConversion;
    use vp_reflect::info::{ConstructorInfo, FieldInfo, MethodInfo, TypeInfo, args};
    use vp_reflect::registry::{TypeRegistry, TypeRegistryArc};
    use vp_reflect::scope::TypeScope;
    use vp_reflect::{ConversionError, HostObject, Primitive, Type, Value};

    use super::AccessorFactory;
    use crate::accessor::Accessor;
    use crate::config::{AccessConfig, Backend};
    use crate::error::{AccessError, ErrorKind};
    use crate::vars::{MapVariables, NoVariables};

    #[derive(Debug)]
    struct Point {
        x: i32,
        y: i32,
    }

    impl HostObject for Point {
        fn type_path(&self) -> &str {
            "demo.Point"
        }
    }

    #[derive(Debug)]
    struct Overloads;

    impl HostObject for Overloads {
        fn type_path(&self) -> &str {
            "demo.Overloads"
        }
    }

    fn point(x: i32, y: i32) -> Value {
        Value::object(Point { x, y })
    }

    fn factory() -> AccessorFactory {
        let registry = TypeRegistryArc::new(TypeRegistry::new());
        let point_ty = Type::named("demo.Point");
        {
            let mut registry = registry.write();
            registry.register(
                TypeInfo::class("demo.Point")
                    .with_field(FieldInfo::of::<Point>("x", Type::INT, |p| Value::Int(p.x)))
                    .with_field(FieldInfo::static_fn("ORIGIN", point_ty.clone(), || Ok(point(0, 0))))
                    .with_method(MethodInfo::of::<Point>("getY", [], Type::INT, |p, _| Ok(Value::Int(p.y))))
                    .with_method(MethodInfo::of::<Point>("plus", [point_ty.clone()], point_ty.clone(), |p, a| {
                        let other = args::object::<Point>(a, 0)?;
                        Ok(point(p.x + other.x, p.y + other.y))
                    }))
                    .with_constructor(ConstructorInfo::new([Type::INT, Type::INT], |a| {
                        Ok(point(args::int(a, 0)?, args::int(a, 1)?))
                    })),
            );
            registry.register(
                TypeInfo::class("demo.Overloads")
                    .with_method(MethodInfo::of::<Overloads>("m", [Type::INT], Type::String, |_, _| {
                        Ok(Value::from("int"))
                    }))
                    .with_method(MethodInfo::of::<Overloads>(
                        "m",
                        [Type::Boxed(Primitive::Int)],
                        Type::String,
                        |_, _| Ok(Value::from("Integer")),
                    )),
            );
        }
        AccessorFactory::new(TypeScope::new(registry))
    }

    fn vars(entries: impl IntoIterator<Item = (&'static str, Value)>) -> MapVariables {
        entries.into_iter().collect()
    }

    /// Evaluates with both backends, twice each, and checks they agree.
    fn both(factory: &AccessorFactory, path: &str, ctx: &Value, vars: &MapVariables) -> Value {
        let (interpreted, _) = factory.interpret(path, ctx, &Value::Null, vars).unwrap();
        let (compiled, _) = factory.compile(path, ctx, &Value::Null, vars).unwrap();
        assert_eq!(interpreted, compiled, "backends disagree on `{path}`");

        let (again, _) = factory.interpret(path, ctx, &Value::Null, vars).unwrap();
        assert_eq!(again, interpreted, "cached interpreted accessor disagrees on `{path}`");
        let (again, _) = factory.compile(path, ctx, &Value::Null, vars).unwrap();
        assert_eq!(again, compiled, "cached compiled accessor disagrees on `{path}`");
        compiled
    }

    fn error(result: Result<(Value, Arc<Accessor>), AccessError>) -> AccessError {
        match result {
            Ok((value, _)) => panic!("expected an error, got {value}"),
            Err(err) => err,
        }
    }

    /// Fails `path` with both backends and checks they fail alike.
    fn both_err(factory: &AccessorFactory, path: &str, ctx: &Value, vars: &MapVariables) -> AccessError {
        let interpreted = error(factory.interpret(path, ctx, &Value::Null, vars));
        let compiled = error(factory.compile(path, ctx, &Value::Null, vars));
        assert_eq!(interpreted.kind(), compiled.kind(), "backends fail differently on `{path}`");
        assert_eq!(interpreted.offset(), compiled.offset(), "backends fail at different offsets on `{path}`");
        compiled
    }

    #[test]
    fn fields_getters_and_object_members() {
        let factory = factory();
        let ctx = point(3, 4);
        let none = MapVariables::new();
        assert_eq!(both(&factory, "x", &ctx, &none), Value::Int(3));
        assert_eq!(both(&factory, "y", &ctx, &none), Value::Int(4));
        assert_eq!(both(&factory, "getY()", &ctx, &none), Value::Int(4));
        assert_eq!(both(&factory, "class.name", &ctx, &none), Value::from("demo.Point"));
        assert_eq!(both(&factory, "x.toString().length()", &ctx, &none), Value::Int(1));
    }

    #[test]
    fn primitive_and_boxed_overloads() {
        let factory = factory();
        let ctx = Value::object(Overloads);
        let n = vars([("n", Value::Int(5))]);
        assert_eq!(both(&factory, "m(1)", &ctx, &n), Value::from("int"));
        // A variable has no declared type, so its boxed runtime type is used.
        assert_eq!(both(&factory, "m(n)", &ctx, &n), Value::from("Integer"));
        assert_eq!(both(&factory, "m(null)", &ctx, &n), Value::from("Integer"));
    }

    #[test]
    fn index_dispatch() {
        let factory = factory();
        let map = vars([("a", Value::map([(Value::from("x"), Value::Int(1))]))]);
        let list = vars([("a", Value::list([Value::Int(10), Value::Int(20), Value::Int(30)]))]);
        let text = vars([("a", Value::from("cat"))]);
        let array = vars([("a", Value::array(Type::INT, [Value::Int(1), Value::Int(2), Value::Int(3)]))]);

        assert_eq!(both(&factory, "a['x']", &Value::Null, &map), Value::Int(1));
        assert_eq!(both(&factory, "a['y']", &Value::Null, &map), Value::Null);
        assert_eq!(both(&factory, "a.x", &Value::Null, &map), Value::Int(1));
        assert_eq!(both(&factory, "a[1]", &Value::Null, &list), Value::Int(20));
        assert_eq!(both(&factory, "a[1]", &Value::Null, &text), Value::Char('a'));
        assert_eq!(both(&factory, "a[2]", &Value::Null, &array), Value::Int(3));
        assert_eq!(both(&factory, "a.length", &Value::Null, &array), Value::Int(3));
        assert_eq!(both(&factory, "a.size()", &Value::Null, &array), Value::Int(3));

        let err = both_err(&factory, "a[5]", &Value::Null, &list);
        assert_eq!(err.kind(), &ErrorKind::IndexOutOfBounds { index: 5, len: 3 });
        assert_eq!(err.offset(), 1);

        // Compiled against a longer list, the bound is still checked per call.
        let short = vars([("a", Value::list([Value::Int(10)]))]);
        assert_eq!(both(&factory, "a[1]", &Value::Null, &list), Value::Int(20));
        let err = both_err(&factory, "a[1]", &Value::Null, &short);
        assert_eq!(err.kind(), &ErrorKind::IndexOutOfBounds { index: 1, len: 1 });
    }

    #[test]
    fn compiled_index_follows_the_variable() {
        let factory = factory();
        let list = vars([("a", Value::list([Value::Int(10)]))]);
        let map = vars([("a", Value::map([(Value::Int(0), Value::Int(99))]))]);

        let (value, accessor) = factory.compile("a[0]", &Value::Null, &Value::Null, &list).unwrap();
        assert_eq!(value, Value::Int(10));
        assert_eq!(accessor.backend(), Backend::Compiled);
        let err = accessor.eval(&Value::Null, &Value::Null, &map).unwrap_err();
        assert!(matches!(err.kind(), ErrorKind::OptimizationNotSupported(_)));

        let (value, accessor) = factory.compile("a[0]", &Value::Null, &Value::Null, &map).unwrap();
        assert_eq!(value, Value::Int(99));
        assert_eq!(accessor.backend(), Backend::Interpreted);
        let (value, _) = factory.compile("a[0]", &Value::Null, &Value::Null, &list).unwrap();
        assert_eq!(value, Value::Int(10));
        assert_eq!(factory.get_value("a[0]", &Value::Null, &Value::Null, &map).unwrap(), Value::Int(99));
    }

    #[test]
    fn static_members_and_class_names() {
        let factory = factory();
        let none = MapVariables::new();
        assert_eq!(both(&factory, "Math.PI", &Value::Null, &none), Value::Double(std::f64::consts::PI));
        assert_eq!(both(&factory, "Integer.MAX_VALUE", &Value::Null, &none), Value::Int(i32::MAX));
        assert_eq!(both(&factory, "Math.max(1, 2)", &Value::Null, &none), Value::Int(2));
        assert_eq!(both(&factory, "Math.abs(-2.5)", &Value::Null, &none), Value::Double(2.5));
        assert_eq!(both(&factory, "demo.Point.ORIGIN.x", &Value::Null, &none), Value::Int(0));
        assert_eq!(both(&factory, "String.name", &Value::Null, &none), Value::from("core.String"));

        let strict = AccessorFactory::with_config(
            TypeScope::default(),
            AccessConfig::default().with_static_access(false),
        );
        let err = both_err(&strict, "core.String", &Value::Null, &none);
        assert!(matches!(err.kind(), ErrorKind::NullReceiver { .. }));
    }

    #[test]
    fn type_object_roots_are_told_apart() {
        let factory = factory();
        let none = MapVariables::new();
        let integer = Value::Type(Type::Boxed(Primitive::Int));
        let long = Value::Type(Type::Boxed(Primitive::Long));

        assert_eq!(both(&factory, "MAX_VALUE", &integer, &none), Value::Int(i32::MAX));
        assert_eq!(both(&factory, "MAX_VALUE", &long, &none), Value::Long(i64::MAX));
        assert_eq!(factory.get_value("MAX_VALUE", &integer, &Value::Null, &none).unwrap(), Value::Int(i32::MAX));

        let (_, accessor) = factory.compile("MAX_VALUE", &integer, &Value::Null, &none).unwrap();
        let err = accessor.eval(&long, &Value::Null, &none).unwrap_err();
        assert!(matches!(err.kind(), ErrorKind::OptimizationNotSupported(_)));
    }

    #[test]
    fn literals_resolve_past_the_first_segment() {
        let factory = factory();
        let none = MapVariables::new();
        let ctx = point(3, 4);
        assert_eq!(both(&factory, "x.String.name", &ctx, &none), Value::from("core.String"));
        assert_eq!(both(&factory, "x.null", &ctx, &none), Value::Null);
    }

    #[test]
    fn construction_roots_and_nested_arguments() {
        let factory = factory();
        let none = MapVariables::new();
        assert_eq!(both(&factory, "new demo.Point(1, 2).y", &Value::Null, &none), Value::Int(2));
        assert_eq!(both(&factory, "new Point(5, 6).x", &Value::Null, &none), Value::Int(5));

        let ctx = point(3, 4);
        assert_eq!(both(&factory, "plus(new demo.Point(1, 1)).x", &ctx, &none), Value::Int(4));
        assert_eq!(both(&factory, "plus(ORIGIN).getY()", &ctx, &none), Value::Int(4));

        let err = both_err(&factory, "new demo.Point('a')", &Value::Null, &none);
        assert!(matches!(err.kind(), ErrorKind::MemberResolution { .. }));
        let err = both_err(&factory, "new demo.Missing()", &Value::Null, &none);
        assert!(matches!(err.kind(), ErrorKind::ClassNotFound(_)));
    }

    #[test]
    fn null_safe_navigation() {
        let factory = factory();
        let null = vars([("p", Value::Null)]);
        let some = vars([("p", point(3, 4))]);

        assert_eq!(both(&factory, "p.?x", &Value::Null, &null), Value::Null);
        let (_, accessor) = factory.compile("p.?x", &Value::Null, &Value::Null, &null).unwrap();
        assert_eq!(accessor.backend(), Backend::Interpreted);
        assert_eq!(accessor.eval(&Value::Null, &Value::Null, &some).unwrap(), Value::Int(3));

        // Resolved while non-null, the compiled plan still honors `.?`.
        let (_, accessor) = factory.compile("p.?x", &Value::Int(0), &Value::Null, &some).unwrap();
        assert_eq!(accessor.backend(), Backend::Compiled);
        assert_eq!(accessor.eval(&Value::Int(0), &Value::Null, &null).unwrap(), Value::Null);

        let err = both_err(&factory, "p.x", &Value::Null, &null);
        assert_eq!(err.kind(), &ErrorKind::NullReceiver { name: Arc::from("x") });
        assert_eq!(err.offset(), 2);

        // Built on a point, then handed a null.
        let fresh = self::factory();
        assert_eq!(both(&fresh, "p.x", &Value::Null, &some), Value::Int(3));
        let err = both_err(&fresh, "p.x", &Value::Null, &null);
        assert_eq!(err.kind(), &ErrorKind::NullReceiver { name: Arc::from("x") });
        assert_eq!(err.offset(), 2);
    }

    #[test]
    fn interpreted_nodes_follow_the_receiver() {
        let factory = factory();
        let none = MapVariables::new();
        let (_, accessor) = factory.interpret("x", &point(3, 4), &Value::Null, &none).unwrap();

        let map = Value::map([(Value::from("x"), Value::Int(9))]);
        assert_eq!(accessor.eval(&map, &Value::Null, &none).unwrap(), Value::Int(9));
        assert_eq!(accessor.eval(&point(7, 0), &Value::Null, &none).unwrap(), Value::Int(7));

        let (_, compiled) = factory.compile("x", &point(3, 4), &Value::Null, &none).unwrap();
        let err = compiled.eval(&map, &Value::Null, &none).unwrap_err();
        assert!(matches!(err.kind(), ErrorKind::OptimizationNotSupported(_)));
        assert_eq!(err.offset(), 0);
    }

    #[test]
    fn compiled_overloads_follow_the_argument_type() {
        let factory = factory();
        let ctx = Value::object(Overloads);
        let int = vars([("n", Value::Int(5))]);
        let long = vars([("n", Value::Long(5))]);

        let (value, accessor) = factory.compile("m(n)", &ctx, &Value::Null, &int).unwrap();
        assert_eq!(value, Value::from("Integer"));
        let err = accessor.eval(&ctx, &Value::Null, &long).unwrap_err();
        assert!(matches!(err.kind(), ErrorKind::OptimizationNotSupported(_)));

        let (compiled, _) = factory.compile("m(n)", &ctx, &Value::Null, &long).unwrap();
        let fresh = self::factory();
        let (interpreted, _) = fresh.interpret("m(n)", &ctx, &Value::Null, &long).unwrap();
        assert_eq!(compiled, interpreted);
        let (value, _) = factory.compile("m(n)", &ctx, &Value::Null, &int).unwrap();
        assert_eq!(value, Value::from("Integer"));
    }

    #[test]
    fn self_token_and_variables() {
        let factory = factory();
        let none = MapVariables::new();
        let (value, _) = factory.compile("this.x", &Value::Null, &point(8, 0), &none).unwrap();
        assert_eq!(value, Value::Int(8));

        let custom = AccessorFactory::with_config(TypeScope::default(), AccessConfig::default().with_self_token("self"));
        let (value, _) = custom.interpret("self", &Value::Null, &Value::from("me"), &NoVariables).unwrap();
        assert_eq!(value, Value::from("me"));
    }

    #[test]
    fn resolution_errors_name_the_path_and_segment() {
        let factory = factory();
        let ctx = Value::object(Overloads);
        let none = MapVariables::new();

        let err = both_err(&factory, "m(true)", &ctx, &none);
        assert_eq!(
            err.to_string(),
            "Encountered an error at offset 0 while accessing `m(true)`: \
             unable to resolve method `m(boolean)` on `demo.Overloads`",
        );

        let err = both_err(&factory, "m(1).nope", &ctx, &none);
        assert_eq!(err.offset(), 5);
        assert!(matches!(err.kind(), ErrorKind::PropertyAccess { .. }));

        let err = both_err(&factory, "m(1, x.y(", &ctx, &none);
        assert!(matches!(err.kind(), ErrorKind::Compile(_)));

        // Errors inside an argument point into the enclosing path.
        let err = both_err(&factory, "m(missing.x)", &ctx, &none);
        assert_eq!(err.path(), "m(missing.x)");
        assert_eq!(err.offset(), 2);
    }

    #[test]
    fn accessors_are_cached_per_root_type_and_backend() {
        let factory = factory();
        let none = MapVariables::new();
        let (_, first) = factory.compile("x", &point(1, 1), &Value::Null, &none).unwrap();
        let (_, second) = factory.compile("x", &point(2, 2), &Value::Null, &none).unwrap();
        let (_, interpreted) = factory.interpret("x", &point(2, 2), &Value::Null, &none).unwrap();
        assert!(Arc::ptr_eq(&first, &second));
        assert!(!Arc::ptr_eq(&first, &interpreted));

        factory.invalidate(&Type::named("demo.Point"));
        let (_, rebuilt) = factory.compile("x", &point(2, 2), &Value::Null, &none).unwrap();
        assert!(!Arc::ptr_eq(&first, &rebuilt));
    }

    #[test]
    fn concurrent_compilation_publishes_one_accessor() {
        let factory = factory();
        let none = MapVariables::new();
        let accessors: Vec<Arc<Accessor>> = std::thread::scope(|scope| {
            let handles: Vec<_> = (0..8)
                .map(|i| {
                    let (factory, none) = (&factory, &none);
                    scope.spawn(move || {
                        let (value, accessor) = factory
                            .compile("plus(ORIGIN).x", &point(i, 0), &Value::Null, none)
                            .unwrap();
                        assert_eq!(value, Value::Int(i));
                        accessor
                    })
                })
                .collect();
            handles.into_iter().map(|handle| handle.join().unwrap()).collect()
        });
        assert!(accessors.iter().all(|accessor| Arc::ptr_eq(accessor, &accessors[0])));

        let resolver = factory.runtime().resolver();
        assert_eq!(resolver.cached_methods(), 1);
        assert_eq!(resolver.cached_constructors(), 0);
    }

    #[derive(Debug)]
    struct Thermostat;

    impl HostObject for Thermostat {
        fn type_path(&self) -> &str {
            "demo.Thermostat"
        }
    }

    #[derive(Debug)]
    struct Celsius(f64);

    impl HostObject for Celsius {
        fn type_path(&self) -> &str {
            "demo.Celsius"
        }
    }

    #[test]
    fn registered_conversions_reach_cached_lookups() {
        let registry = TypeRegistryArc::new(TypeRegistry::new());
        let celsius = Type::named("demo.Celsius");
        {
            let mut registry = registry.write();
            registry.register(TypeInfo::class("demo.Celsius"));
            registry.register(TypeInfo::class("demo.Thermostat").with_method(MethodInfo::of::<Thermostat>(
                "set",
                [celsius.clone()],
                Type::DOUBLE,
                |_, a| Ok(Value::Double(args::object::<Celsius>(a, 0)?.0)),
            )));
        }
        let factory = AccessorFactory::new(TypeScope::new(registry));
        let ctx = Value::object(Thermostat);
        let none = MapVariables::new();

        let err = both_err(&factory, "set('20')", &ctx, &none);
        assert!(matches!(err.kind(), ErrorKind::MemberResolution { .. }));

        factory.converter().register(FnConversion::new(celsius, [Type::String], |v| {
            v.as_str()
                .and_then(|text| text.parse().ok())
                .map(|degrees| Value::object(Celsius(degrees)))
                .ok_or_else(|| ConversionError::Unsupported {
                    from: v.type_name(),
                    to: Type::named("demo.Celsius"),
                })
        }));
        assert_eq!(both(&factory, "set('20')", &ctx, &none), Value::Double(20.0));
    }

    #[test]
    fn results_serialize_to_json() {
        let factory = factory();
        let list = vars([("a", Value::list([Value::Int(1), Value::from("two"), Value::Null]))]);
        let value = factory.get_value("a", &Value::Null, &Value::Null, &list).unwrap();
        assert_eq!(serde_json::to_string(&value).unwrap(), r#"[1,"two",null]"#);
    }

    #[test]
    fn accessors_are_send_and_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<Accessor>();
        assert_send_sync::<AccessorFactory>();
    }
}

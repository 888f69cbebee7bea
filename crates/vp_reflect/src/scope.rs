//! Class loading context.

use std::fmt;
use std::sync::Arc;

use vp_utils::CacheMap;
use vp_utils::hash::{HashMap, HashSet};

use crate::error::ClassNotFound;
use crate::info::{ConstructorInfo, FieldInfo, MethodInfo, TypeInfo};
use crate::registry::{TypeRegistry, TypeRegistryArc, system};
use crate::ty::{Primitive, Type};

// -----------------------------------------------------------------------------
// TypeScope

/// Resolves class names and member tables against a registry.
///
/// Names are tried, in order, as a primitive keyword, an explicit import,
/// a full path, an unambiguous simple name and finally under each imported
/// package. A name the scope's own registry does not know is retried once
/// against the [system registry](crate::registry::system).
///
/// Resolved names are cached until [`invalidate`](Self::invalidate).
///
/// # Examples
///
/// ```
/// use vp_reflect::info::TypeInfo;
/// use vp_reflect::registry::TypeRegistryArc;
/// use vp_reflect::scope::TypeScope;
/// use vp_reflect::ty::Type;
///
/// let registry = TypeRegistryArc::default();
/// registry.write().register(TypeInfo::class("demo.geo.Point"));
///
/// let scope = TypeScope::new(registry)
///     .with_import("P", "demo.geo.Point")
///     .with_package("demo.geo");
///
/// assert_eq!(scope.resolve_type("P").unwrap(), Type::named("demo.geo.Point"));
/// assert_eq!(scope.resolve_type("Point").unwrap(), Type::named("demo.geo.Point"));
/// assert_eq!(scope.resolve_type("int[]").unwrap(), Type::array_of(Type::INT));
/// assert!(scope.resolve_type("demo.Missing").is_err());
/// ```
pub struct TypeScope {
    registry: TypeRegistryArc,
    imports: HashMap<Arc<str>, Arc<str>>,
    packages: Vec<Arc<str>>,
    resolved: CacheMap<Box<str>, Type>,
}

impl Default for TypeScope {
    fn default() -> Self {
        Self::new(system().clone())
    }
}

impl TypeScope {
    const CACHE_CAPACITY: usize = 4096;

    pub fn new(registry: TypeRegistryArc) -> Self {
        Self {
            registry,
            imports: HashMap::default(),
            packages: Vec::new(),
            resolved: CacheMap::new("class names", Self::CACHE_CAPACITY),
        }
    }

    /// Imports `path` under `alias`.
    pub fn with_import(mut self, alias: &str, path: &str) -> Self {
        self.imports.insert(Arc::from(alias), Arc::from(path));
        self
    }

    /// Makes every type directly under `package` reachable by simple name.
    pub fn with_package(mut self, package: &str) -> Self {
        let package: Arc<str> = Arc::from(package.trim_end_matches('.'));
        if !self.packages.contains(&package) {
            self.packages.push(package);
        }
        self
    }

    #[inline]
    pub fn registry(&self) -> &TypeRegistryArc {
        &self.registry
    }

    fn is_system(&self) -> bool {
        Arc::ptr_eq(&self.registry.internal, &system().internal)
    }

    // -------------------------------------------------------------------------
    // Class names

    /// Resolves a class name to a type handle.
    pub fn resolve_type(&self, name: &str) -> Result<Type, ClassNotFound> {
        let name = name.trim();
        if let Some(ty) = self.resolved.get(name) {
            return Ok(ty);
        }
        let ty = self
            .lookup(name)
            .ok_or_else(|| ClassNotFound(Arc::from(name)))?;
        log::debug!("resolved class `{name}` to `{ty}`");
        Ok(self.resolved.insert(Box::from(name), ty))
    }

    /// Like [`resolve_type`](Self::resolve_type), without the error.
    #[inline]
    pub fn try_resolve_type(&self, name: &str) -> Option<Type> {
        self.resolve_type(name).ok()
    }

    fn lookup(&self, name: &str) -> Option<Type> {
        if name.is_empty() {
            return None;
        }
        if let Some(elem) = name.strip_suffix("[]") {
            return self.lookup(elem.trim_end()).map(Type::array_of);
        }
        if name == "void" {
            return Some(Type::Void);
        }
        if let Some(p) = Primitive::from_name(name) {
            return Some(Type::Primitive(p));
        }

        let found = self.lookup_in(&self.registry.read(), name);
        if found.is_some() || self.is_system() {
            return found;
        }
        log::debug!("class `{name}` not in scope registry, retrying system registry");
        self.lookup_in(&system().read(), name)
    }

    fn lookup_in(&self, registry: &TypeRegistry, name: &str) -> Option<Type> {
        let by_path = |path: &str| registry.get_with_type_path(path).map(|info| info.ty().clone());

        if let Some(path) = self.imports.get(name) {
            return by_path(path);
        }
        if let Some(ty) = by_path(name) {
            return Some(ty);
        }
        if !name.contains('.')
            && let Some(info) = registry.get_with_type_name(name)
        {
            return Some(info.ty().clone());
        }
        self.packages
            .iter()
            .find_map(|package| by_path(&format!("{package}.{name}")))
    }

    // -------------------------------------------------------------------------
    // Member tables

    /// The member table of `ty`. Primitive types share their boxed table.
    pub fn type_info(&self, ty: &Type) -> Option<Arc<TypeInfo>> {
        let ty = ty.boxed();
        let found = self.registry.read().get(&ty).cloned();
        if found.is_some() || self.is_system() {
            return found;
        }
        system().read().get(&ty).cloned()
    }

    /// `ty` followed by all of its supertypes, breadth first, ending with
    /// [`Type::Object`].
    pub fn lineage(&self, ty: &Type) -> Vec<Type> {
        let mut lineage = vec![ty.boxed()];
        let mut seen: HashSet<Type> = HashSet::default();
        seen.insert(ty.boxed());

        let mut next = 0;
        while next < lineage.len() {
            let current = lineage[next].clone();
            next += 1;
            if let Some(info) = self.type_info(&current) {
                for parent in info.supertypes() {
                    if seen.insert(parent.clone()) {
                        lineage.push(parent.clone());
                    }
                }
            }
        }
        if seen.insert(Type::Object) {
            lineage.push(Type::Object);
        } else if let Some(pos) = lineage.iter().position(|t| *t == Type::Object) {
            let object = lineage.remove(pos);
            lineage.push(object);
        }
        lineage
    }

    /// Returns `true` if a value of type `source` may be used where `target`
    /// is declared, without conversion.
    pub fn is_assignable(&self, target: &Type, source: &Type) -> bool {
        if target == source {
            return true;
        }
        if target.is_primitive() || source.is_primitive() {
            return false;
        }
        if *target == Type::Object {
            return true;
        }
        match (target, source) {
            (Type::Array(t), Type::Array(s)) => {
                !t.is_primitive() && !s.is_primitive() && self.is_assignable(t, s)
            }
            _ => self.lineage(source).contains(target),
        }
    }

    /// Methods named `name` visible on `ty`, in declaration order, the type's
    /// own methods before inherited ones. An inherited method with the same
    /// parameter list as a visible one is hidden.
    pub fn methods_named(&self, ty: &Type, name: &str, statics_only: bool) -> Vec<Arc<MethodInfo>> {
        let mut methods: Vec<Arc<MethodInfo>> = Vec::new();
        for owner in self.lineage(ty) {
            let Some(info) = self.type_info(&owner) else {
                continue;
            };
            for method in info.methods_named(name) {
                if statics_only && !method.is_static() {
                    continue;
                }
                if methods.iter().all(|m| m.params() != method.params()) {
                    methods.push(method.clone());
                }
            }
        }
        methods
    }

    /// The first field named `name` on `ty` or its supertypes.
    pub fn find_field(&self, ty: &Type, name: &str) -> Option<Arc<FieldInfo>> {
        self.lineage(ty)
            .iter()
            .filter_map(|owner| self.type_info(owner))
            .find_map(|info| info.field(name).cloned())
    }

    /// The constructors declared on `ty`, in declaration order.
    pub fn constructors(&self, ty: &Type) -> Vec<Arc<ConstructorInfo>> {
        self.type_info(ty)
            .map(|info| info.constructors().to_vec())
            .unwrap_or_default()
    }

    /// Forgets every resolved class name.
    pub fn invalidate(&self) {
        self.resolved.clear();
    }
}

impl fmt::Debug for TypeScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TypeScope")
            .field("imports", &self.imports)
            .field("packages", &self.packages)
            .field("resolved", &self.resolved)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::TypeScope;
    use crate::info::{FieldInfo, MethodInfo, TypeInfo};
    use crate::registry::{TypeRegistry, TypeRegistryArc};
    use crate::ty::{Primitive, Type};
    use crate::value::Value;

    fn shapes() -> TypeScope {
        let registry = TypeRegistryArc::new(TypeRegistry::empty());
        {
            let mut registry = registry.write();
            registry.register(
                TypeInfo::class("demo.Shape")
                    .with_field(FieldInfo::constant("SIDES", Type::INT, 0))
                    .with_method(MethodInfo::new("area", [], Type::DOUBLE, |_, _| Ok(Value::Double(0.0))))
                    .with_method(MethodInfo::new("scale", [Type::DOUBLE], Type::Void, |_, _| Ok(Value::Null))),
            );
            registry.register(
                TypeInfo::class("demo.Square")
                    .with_supertype(Type::named("demo.Shape"))
                    .with_method(MethodInfo::new("area", [], Type::DOUBLE, |_, _| Ok(Value::Double(1.0))))
                    .with_method(MethodInfo::new("scale", [Type::INT], Type::Void, |_, _| Ok(Value::Null))),
            );
        }
        TypeScope::new(registry)
    }

    #[test]
    fn lineage_ends_with_object() {
        let scope = shapes();
        assert_eq!(
            scope.lineage(&Type::named("demo.Square")),
            [Type::named("demo.Square"), Type::named("demo.Shape"), Type::Object],
        );
        assert_eq!(
            scope.lineage(&Type::INT),
            [Type::Boxed(Primitive::Int), Type::named("core.Number"), Type::Object],
        );
    }

    #[test]
    fn own_methods_come_first_and_hide_overridden_ones() {
        let scope = shapes();
        let square = Type::named("demo.Square");

        let area = scope.methods_named(&square, "area", false);
        assert_eq!(area.len(), 1);
        assert_eq!(area[0].declaring(), &square);

        let scale = scope.methods_named(&square, "scale", false);
        let params: Vec<_> = scale.iter().map(|m| m.params()[0].clone()).collect();
        assert_eq!(params, [Type::INT, Type::DOUBLE]);

        // Object members come from the system registry.
        assert_eq!(scope.methods_named(&square, "toString", false).len(), 1);
        assert!(scope.methods_named(&square, "area", true).is_empty());
    }

    #[test]
    fn assignability_follows_supertypes() {
        let scope = shapes();
        let (shape, square) = (Type::named("demo.Shape"), Type::named("demo.Square"));
        assert!(scope.is_assignable(&shape, &square));
        assert!(!scope.is_assignable(&square, &shape));
        assert!(scope.is_assignable(&Type::Object, &square));
        assert!(!scope.is_assignable(&Type::Object, &Type::INT));
        assert!(scope.is_assignable(&Type::array_of(shape.clone()), &Type::array_of(square)));
        assert!(!scope.is_assignable(&Type::array_of(Type::LONG), &Type::array_of(Type::INT)));
    }

    #[test]
    fn inherited_fields_are_found() {
        let scope = shapes();
        let field = scope.find_field(&Type::named("demo.Square"), "SIDES").unwrap();
        assert_eq!(field.declaring(), &Type::named("demo.Shape"));
    }

    #[test]
    fn unknown_names_fall_back_to_the_system_registry() {
        let scope = shapes();
        assert_eq!(scope.resolve_type("Math").unwrap(), Type::named("core.Math"));
        assert_eq!(scope.resolve_type("core.String").unwrap(), Type::String);
        assert_eq!(scope.resolve_type("Square").unwrap(), Type::named("demo.Square"));
        assert!(scope.resolve_type("Circle").is_err());
    }
}

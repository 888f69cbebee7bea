use std::fmt;
use std::sync::Arc;

use vp_utils::hash::{HashMap, HashSet};
use vp_utils::sync::{LazyLock, RwLock, RwLockReadGuard, RwLockWriteGuard, read, write};

use crate::info::TypeInfo;
use crate::ty::Type;

// -----------------------------------------------------------------------------
// TypeRegistry

/// A table of registered [`TypeInfo`]s.
///
/// Types are indexed by handle, by canonical path and by simple name.
/// A simple name shared by several types is ambiguous and can only be
/// reached by path.
///
/// # Examples
///
/// ```
/// use vp_reflect::info::TypeInfo;
/// use vp_reflect::registry::TypeRegistry;
/// use vp_reflect::ty::Type;
///
/// let mut registry = TypeRegistry::new();
/// registry.register(TypeInfo::class("a.Point"));
/// registry.register(TypeInfo::class("b.Point"));
///
/// assert!(registry.get_with_type_path("a.Point").is_some());
/// assert!(registry.get_with_type_name("Point").is_none());
/// assert!(registry.is_ambiguous("Point"));
/// assert!(registry.contains(&Type::String));
/// ```
pub struct TypeRegistry {
    types: HashMap<Type, Arc<TypeInfo>>,
    type_path_to_type: HashMap<Arc<str>, Type>,
    type_name_to_type: HashMap<Arc<str>, Type>,
    ambiguous_names: HashSet<Arc<str>>,
    auto_registered: bool,
}

impl Default for TypeRegistry {
    #[inline]
    fn default() -> Self {
        Self::new()
    }
}

impl TypeRegistry {
    /// Creates a registry without any types.
    pub fn empty() -> Self {
        Self {
            types: HashMap::default(),
            type_path_to_type: HashMap::default(),
            type_name_to_type: HashMap::default(),
            ambiguous_names: HashSet::default(),
            auto_registered: false,
        }
    }

    /// Creates a registry holding the builtin `core` types.
    pub fn new() -> Self {
        let mut registry = Self::empty();
        for info in super::builtins::core_types() {
            registry.register(info);
        }
        registry
    }

    // # Validity
    // The type must **not** already exist.
    fn add_new_type_indices(&mut self, info: &TypeInfo) {
        let name: Arc<str> = Arc::from(info.name());

        if !self.ambiguous_names.contains(&name) {
            if self.type_name_to_type.contains_key(&name) {
                self.type_name_to_type.remove(&name);
                self.ambiguous_names.insert(name);
            } else {
                self.type_name_to_type.insert(name, info.ty().clone());
            }
        }

        self.type_path_to_type
            .insert(Arc::from(info.path()), info.ty().clone());
    }

    /// Registers a type.
    ///
    /// - If the type already exists, nothing happens and `false` is returned.
    /// - Otherwise the table is inserted and `true` is returned.
    pub fn register(&mut self, info: TypeInfo) -> bool {
        if self.types.contains_key(info.ty()) {
            return false;
        }
        log::trace!("registering type `{}`", info.path());
        self.add_new_type_indices(&info);
        self.types.insert(info.ty().clone(), Arc::new(info));
        true
    }

    /// Registers a type, replacing an existing table.
    pub fn insert(&mut self, info: TypeInfo) {
        if !self.types.contains_key(info.ty()) {
            self.add_new_type_indices(&info);
        }
        self.types.insert(info.ty().clone(), Arc::new(info));
    }

    /// Registers every type submitted with [`register_type!`](crate::register_type).
    ///
    /// Returns `false` if static registration is unavailable, either because
    /// the `auto_register` feature is disabled or the platform lacks support.
    /// Repeated calls are cheap.
    #[cfg(feature = "auto_register")]
    pub fn auto_register(&mut self) -> bool {
        use super::auto_register;

        if self.auto_registered {
            return true;
        }
        if !auto_register::is_available() {
            return false;
        }
        let mut count = 0_usize;
        for registration in auto_register::registrations() {
            if self.register(registration.build()) {
                count += 1;
            }
        }
        log::debug!("auto registered {count} types");
        self.auto_registered = true;
        true
    }

    /// Registers every type submitted with `register_type!`.
    ///
    /// The `auto_register` feature is disabled, so this always returns `false`.
    #[cfg(not(feature = "auto_register"))]
    #[inline(always)]
    pub fn auto_register(&mut self) -> bool {
        let _ = self.auto_registered;
        false
    }

    #[inline]
    pub fn contains(&self, ty: &Type) -> bool {
        self.types.contains_key(ty)
    }

    #[inline]
    pub fn get(&self, ty: &Type) -> Option<&Arc<TypeInfo>> {
        self.types.get(ty)
    }

    pub fn get_with_type_path(&self, type_path: &str) -> Option<&Arc<TypeInfo>> {
        // Manual inline
        match self.type_path_to_type.get(type_path) {
            Some(ty) => self.get(ty),
            None => None,
        }
    }

    pub fn get_with_type_name(&self, type_name: &str) -> Option<&Arc<TypeInfo>> {
        match self.type_name_to_type.get(type_name) {
            Some(ty) => self.get(ty),
            None => None,
        }
    }

    pub fn is_ambiguous(&self, type_name: &str) -> bool {
        self.ambiguous_names.contains(type_name)
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.types.len()
    }

    pub fn iter(&self) -> impl ExactSizeIterator<Item = &Arc<TypeInfo>> {
        self.types.values()
    }
}

impl fmt::Debug for TypeRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.type_path_to_type.keys()).finish()
    }
}

// -----------------------------------------------------------------------------
// TypeRegistryArc

/// A shared [`TypeRegistry`].
///
/// Locks are poison tolerant: a panic while holding the write lock leaves
/// a registry that is still readable.
#[derive(Clone, Default)]
pub struct TypeRegistryArc {
    pub internal: Arc<RwLock<TypeRegistry>>,
}

impl TypeRegistryArc {
    pub fn new(registry: TypeRegistry) -> Self {
        Self {
            internal: Arc::new(RwLock::new(registry)),
        }
    }

    #[inline]
    pub fn read(&self) -> RwLockReadGuard<'_, TypeRegistry> {
        read(&self.internal)
    }

    #[inline]
    pub fn write(&self) -> RwLockWriteGuard<'_, TypeRegistry> {
        write(&self.internal)
    }
}

impl fmt::Debug for TypeRegistryArc {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(&*self.read(), f)
    }
}

/// The process-wide registry.
///
/// Holds the builtin `core` types plus everything submitted through
/// [`register_type!`](crate::register_type). Class lookups that fail in a
/// scope's own registry retry here once.
pub fn system() -> &'static TypeRegistryArc {
    static SYSTEM: LazyLock<TypeRegistryArc> = LazyLock::new(|| {
        let mut registry = TypeRegistry::new();
        registry.auto_register();
        TypeRegistryArc::new(registry)
    });
    &SYSTEM
}

#[cfg(test)]
mod tests {
    use super::{TypeRegistry, TypeRegistryArc};
    use crate::info::{FieldInfo, TypeInfo};
    use crate::ty::Type;

    #[test]
    fn register_keeps_the_first_table() {
        let mut registry = TypeRegistry::empty();
        assert!(registry.register(TypeInfo::class("demo.A")));
        assert!(!registry.register(
            TypeInfo::class("demo.A").with_field(FieldInfo::constant("X", Type::INT, 1))
        ));
        let info = registry.get(&Type::named("demo.A")).unwrap();
        assert!(info.fields().is_empty());

        registry.insert(TypeInfo::class("demo.A").with_field(FieldInfo::constant("X", Type::INT, 1)));
        let info = registry.get_with_type_name("A").unwrap();
        assert_eq!(info.fields().len(), 1);
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn builtins_are_indexed_by_name_and_path() {
        let registry = TypeRegistry::new();
        for path in ["core.Object", "core.String", "core.Integer", "core.Math", "core.Class"] {
            assert!(registry.get_with_type_path(path).is_some(), "{path}");
        }
        assert_eq!(registry.get_with_type_name("Integer").unwrap().ty(), &Type::from_path("core.Integer"));
    }

    #[test]
    fn shared_registry_is_writable() {
        let shared = TypeRegistryArc::default();
        shared.write().register(TypeInfo::class("demo.B"));
        assert!(shared.read().contains(&Type::named("demo.B")));
    }

    #[test]
    fn system_registry_has_core_types() {
        assert!(super::system().read().contains(&Type::Map));
    }
}

use std::sync::Arc;

use crate::info::{ConstructorInfo, FieldInfo, MethodInfo};
use crate::ty::Type;

// -----------------------------------------------------------------------------
// TypeInfo

/// The member table of a registered type.
///
/// Members keep their declaration order, which is also the order overload
/// resolution enumerates them in.
///
/// # Examples
///
/// ```
/// use vp_reflect::info::{FieldInfo, TypeInfo};
/// use vp_reflect::ty::Type;
///
/// let info = TypeInfo::class("demo.Limits")
///     .with_field(FieldInfo::constant("MAX", Type::INT, 10));
///
/// assert_eq!(info.name(), "Limits");
/// assert_eq!(info.field("MAX").unwrap().declaring(), &Type::named("demo.Limits"));
/// ```
#[derive(Debug, Clone)]
pub struct TypeInfo {
    ty: Type,
    path: Arc<str>,
    name: Arc<str>,
    supertypes: Vec<Type>,
    fields: Vec<Arc<FieldInfo>>,
    methods: Vec<Arc<MethodInfo>>,
    constructors: Vec<Arc<ConstructorInfo>>,
}

impl TypeInfo {
    /// Creates an empty table for `ty`.
    pub fn new(ty: Type) -> Self {
        let path: Arc<str> = Arc::from(ty.path());
        let name: Arc<str> = Arc::from(ty.simple_name());
        Self {
            ty,
            path,
            name,
            supertypes: Vec::new(),
            fields: Vec::new(),
            methods: Vec::new(),
            constructors: Vec::new(),
        }
    }

    /// Creates an empty table for the host class at `path`.
    #[inline]
    pub fn class(path: &str) -> Self {
        Self::new(Type::from_path(path))
    }

    /// Declares a direct supertype. Every type implicitly extends
    /// [`Type::Object`], which need not be listed.
    pub fn with_supertype(mut self, ty: Type) -> Self {
        if !self.supertypes.contains(&ty) {
            self.supertypes.push(ty);
        }
        self
    }

    pub fn with_field(mut self, mut field: FieldInfo) -> Self {
        field.set_declaring(self.ty.clone());
        self.fields.push(Arc::new(field));
        self
    }

    pub fn with_method(mut self, mut method: MethodInfo) -> Self {
        method.set_declaring(self.ty.clone());
        self.methods.push(Arc::new(method));
        self
    }

    pub fn with_constructor(mut self, mut ctor: ConstructorInfo) -> Self {
        ctor.set_declaring(self.ty.clone());
        self.constructors.push(Arc::new(ctor));
        self
    }

    #[inline]
    pub fn ty(&self) -> &Type {
        &self.ty
    }

    /// The canonical path, e.g. `core.String`.
    #[inline]
    pub fn path(&self) -> &str {
        &self.path
    }

    /// The simple name, e.g. `String`.
    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[inline]
    pub fn supertypes(&self) -> &[Type] {
        &self.supertypes
    }

    #[inline]
    pub fn fields(&self) -> &[Arc<FieldInfo>] {
        &self.fields
    }

    #[inline]
    pub fn methods(&self) -> &[Arc<MethodInfo>] {
        &self.methods
    }

    #[inline]
    pub fn constructors(&self) -> &[Arc<ConstructorInfo>] {
        &self.constructors
    }

    /// The field declared on this type with the given name.
    pub fn field(&self, name: &str) -> Option<&Arc<FieldInfo>> {
        self.fields.iter().find(|f| f.name() == name)
    }

    /// Methods declared on this type with the given name, in declaration order.
    pub fn methods_named<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a Arc<MethodInfo>> {
        self.methods.iter().filter(move |m| m.name() == name)
    }
}

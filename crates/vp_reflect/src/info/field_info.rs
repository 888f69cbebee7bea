use std::fmt;
use std::sync::Arc;

use crate::error::InvokeError;
use crate::info::downcast_receiver;
use crate::ty::Type;
use crate::value::{HostObject, Value};

/// Reads a field from a receiver. Static getters ignore the receiver.
pub type Getter = dyn Fn(&Value) -> Result<Value, InvokeError> + Send + Sync;

// -----------------------------------------------------------------------------
// FieldInfo

/// Information for a readable field.
///
/// # Examples
///
/// ```
/// use vp_reflect::info::FieldInfo;
/// use vp_reflect::ty::Type;
/// use vp_reflect::value::Value;
///
/// let field = FieldInfo::constant("MAX", Type::INT, 9);
/// assert!(field.is_static());
/// assert_eq!(field.get(&Value::Null).unwrap(), Value::Int(9));
/// ```
#[derive(Clone)]
pub struct FieldInfo {
    name: Arc<str>,
    ty: Type,
    declaring: Type,
    is_static: bool,
    getter: Arc<Getter>,
}

impl FieldInfo {
    /// Creates an instance field read by `getter`.
    pub fn new(
        name: impl Into<Arc<str>>,
        ty: Type,
        getter: impl Fn(&Value) -> Result<Value, InvokeError> + Send + Sync + 'static,
    ) -> Self {
        Self {
            name: name.into(),
            ty,
            declaring: Type::Object,
            is_static: false,
            getter: Arc::new(getter),
        }
    }

    /// Creates an instance field of the host object `T`.
    pub fn of<T: HostObject>(
        name: impl Into<Arc<str>>,
        ty: Type,
        getter: impl Fn(&T) -> Value + Send + Sync + 'static,
    ) -> Self {
        Self::new(name, ty, move |receiver| {
            downcast_receiver::<T>(receiver).map(&getter)
        })
    }

    /// Creates a static field computed on every read.
    pub fn static_fn(
        name: impl Into<Arc<str>>,
        ty: Type,
        getter: impl Fn() -> Result<Value, InvokeError> + Send + Sync + 'static,
    ) -> Self {
        let mut field = Self::new(name, ty, move |_| getter());
        field.is_static = true;
        field
    }

    /// Creates a static field holding a fixed value.
    pub fn constant(name: impl Into<Arc<str>>, ty: Type, value: impl Into<Value>) -> Self {
        let value = value.into();
        Self::static_fn(name, ty, move || Ok(value.clone()))
    }

    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The declared field type.
    #[inline]
    pub fn ty(&self) -> &Type {
        &self.ty
    }

    /// The type this field was attached to.
    #[inline]
    pub fn declaring(&self) -> &Type {
        &self.declaring
    }

    #[inline]
    pub fn is_static(&self) -> bool {
        self.is_static
    }

    /// Reads the field.
    #[inline]
    pub fn get(&self, receiver: &Value) -> Result<Value, InvokeError> {
        (self.getter)(receiver)
    }

    pub(crate) fn set_declaring(&mut self, declaring: Type) {
        self.declaring = declaring;
    }
}

impl fmt::Debug for FieldInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FieldInfo")
            .field("name", &self.name)
            .field("ty", &self.ty)
            .field("declaring", &self.declaring)
            .field("is_static", &self.is_static)
            .finish_non_exhaustive()
    }
}

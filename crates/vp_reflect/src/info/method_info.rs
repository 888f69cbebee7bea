use std::fmt;
use std::sync::Arc;

use crate::error::InvokeError;
use crate::info::downcast_receiver;
use crate::ty::Type;
use crate::value::{HostObject, Value};

/// Invokes a method on a receiver with already-coerced arguments.
pub type Invoker = dyn Fn(&Value, &[Value]) -> Result<Value, InvokeError> + Send + Sync;

/// Builds a new object from already-coerced arguments.
pub type Factory = dyn Fn(&[Value]) -> Result<Value, InvokeError> + Send + Sync;

// -----------------------------------------------------------------------------
// MethodInfo

/// Information for an invocable method.
///
/// Two descriptors are equal when they have the same declaring type, name,
/// parameter list and static flag.
#[derive(Clone)]
pub struct MethodInfo {
    name: Arc<str>,
    declaring: Type,
    params: Arc<[Type]>,
    ret: Type,
    is_static: bool,
    invoker: Arc<Invoker>,
}

impl MethodInfo {
    /// Creates an instance method.
    pub fn new(
        name: impl Into<Arc<str>>,
        params: impl IntoIterator<Item = Type>,
        ret: Type,
        invoker: impl Fn(&Value, &[Value]) -> Result<Value, InvokeError> + Send + Sync + 'static,
    ) -> Self {
        Self {
            name: name.into(),
            declaring: Type::Object,
            params: params.into_iter().collect(),
            ret,
            is_static: false,
            invoker: Arc::new(invoker),
        }
    }

    /// Creates an instance method of the host object `T`.
    ///
    /// # Examples
    ///
    /// ```
    /// use vp_reflect::info::MethodInfo;
    /// use vp_reflect::ty::Type;
    /// use vp_reflect::value::{HostObject, Value};
    ///
    /// #[derive(Debug)]
    /// struct Counter(i32);
    ///
    /// impl HostObject for Counter {
    ///     fn type_path(&self) -> &str { "demo.Counter" }
    /// }
    ///
    /// let get = MethodInfo::of::<Counter>("getCount", [], Type::INT, |c, _| Ok(Value::Int(c.0)));
    /// let result = get.invoke(&Value::object(Counter(4)), &[]).unwrap();
    /// assert_eq!(result, Value::Int(4));
    /// assert_eq!(get.signature(), "getCount()");
    /// ```
    pub fn of<T: HostObject>(
        name: impl Into<Arc<str>>,
        params: impl IntoIterator<Item = Type>,
        ret: Type,
        invoker: impl Fn(&T, &[Value]) -> Result<Value, InvokeError> + Send + Sync + 'static,
    ) -> Self {
        Self::new(name, params, ret, move |receiver, args| {
            invoker(downcast_receiver::<T>(receiver)?, args)
        })
    }

    /// Creates a static method.
    pub fn static_fn(
        name: impl Into<Arc<str>>,
        params: impl IntoIterator<Item = Type>,
        ret: Type,
        invoker: impl Fn(&[Value]) -> Result<Value, InvokeError> + Send + Sync + 'static,
    ) -> Self {
        let mut method = Self::new(name, params, ret, move |_, args| invoker(args));
        method.is_static = true;
        method
    }

    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[inline]
    pub fn declaring(&self) -> &Type {
        &self.declaring
    }

    #[inline]
    pub fn params(&self) -> &[Type] {
        &self.params
    }

    #[inline]
    pub fn return_type(&self) -> &Type {
        &self.ret
    }

    #[inline]
    pub fn is_static(&self) -> bool {
        self.is_static
    }

    /// Returns e.g. `abs(int)`.
    pub fn signature(&self) -> String {
        let params: Vec<_> = self.params.iter().map(Type::path).collect();
        format!("{}({})", self.name, params.join(", "))
    }

    /// Invokes the method. The argument count is checked against the
    /// parameter list; argument types are the caller's responsibility.
    pub fn invoke(&self, receiver: &Value, args: &[Value]) -> Result<Value, InvokeError> {
        if args.len() != self.params.len() {
            return Err(InvokeError::Arity {
                expected: self.params.len(),
                actual: args.len(),
            });
        }
        (self.invoker)(receiver, args)
    }

    pub(crate) fn set_declaring(&mut self, declaring: Type) {
        self.declaring = declaring;
    }
}

impl PartialEq for MethodInfo {
    fn eq(&self, other: &Self) -> bool {
        self.is_static == other.is_static
            && self.name == other.name
            && self.declaring == other.declaring
            && self.params == other.params
    }
}

impl Eq for MethodInfo {}

impl fmt::Debug for MethodInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MethodInfo")
            .field("declaring", &self.declaring)
            .field("signature", &self.signature())
            .field("ret", &self.ret)
            .field("is_static", &self.is_static)
            .finish_non_exhaustive()
    }
}

// -----------------------------------------------------------------------------
// ConstructorInfo

/// Information for a constructor.
#[derive(Clone)]
pub struct ConstructorInfo {
    declaring: Type,
    params: Arc<[Type]>,
    factory: Arc<Factory>,
}

impl ConstructorInfo {
    pub fn new(
        params: impl IntoIterator<Item = Type>,
        factory: impl Fn(&[Value]) -> Result<Value, InvokeError> + Send + Sync + 'static,
    ) -> Self {
        Self {
            declaring: Type::Object,
            params: params.into_iter().collect(),
            factory: Arc::new(factory),
        }
    }

    /// The constructed type.
    #[inline]
    pub fn declaring(&self) -> &Type {
        &self.declaring
    }

    #[inline]
    pub fn params(&self) -> &[Type] {
        &self.params
    }

    pub fn construct(&self, args: &[Value]) -> Result<Value, InvokeError> {
        if args.len() != self.params.len() {
            return Err(InvokeError::Arity {
                expected: self.params.len(),
                actual: args.len(),
            });
        }
        (self.factory)(args)
    }

    pub(crate) fn set_declaring(&mut self, declaring: Type) {
        self.declaring = declaring;
    }
}

impl PartialEq for ConstructorInfo {
    fn eq(&self, other: &Self) -> bool {
        self.declaring == other.declaring && self.params == other.params
    }
}

impl Eq for ConstructorInfo {}

impl fmt::Debug for ConstructorInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConstructorInfo")
            .field("declaring", &self.declaring)
            .field("params", &self.params)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::{ConstructorInfo, MethodInfo};
    use crate::error::InvokeError;
    use crate::ty::Type;
    use crate::value::Value;

    #[test]
    fn arity_is_checked_before_invoking() {
        let method = MethodInfo::static_fn("twice", [Type::INT], Type::INT, |args| {
            Ok(Value::Int(args[0].as_int().unwrap_or_default() * 2))
        });
        assert_eq!(method.invoke(&Value::Null, &[Value::Int(4)]), Ok(Value::Int(8)));
        assert_eq!(
            method.invoke(&Value::Null, &[]),
            Err(InvokeError::Arity { expected: 1, actual: 0 }),
        );
    }

    #[test]
    fn instance_methods_reject_foreign_receivers() {
        #[derive(Debug)]
        struct Probe;
        impl crate::value::HostObject for Probe {
            fn type_path(&self) -> &str {
                "test.Probe"
            }
        }

        let method = MethodInfo::of::<Probe>("ping", [], Type::String, |_, _| Ok(Value::from("pong")));
        assert_eq!(method.invoke(&Value::object(Probe), &[]), Ok(Value::from("pong")));
        assert!(matches!(
            method.invoke(&Value::Int(1), &[]),
            Err(InvokeError::ReceiverMismatch { .. }),
        ));
    }

    #[test]
    fn signatures() {
        let method = MethodInfo::static_fn("max", [Type::LONG, Type::LONG], Type::LONG, |_| Ok(Value::Null));
        assert_eq!(method.signature(), "max(long, long)");

        let ctor = ConstructorInfo::new([Type::INT], |args| Ok(args[0].clone()));
        assert_eq!(ctor.construct(&[Value::Int(3)]), Ok(Value::Int(3)));
    }
}

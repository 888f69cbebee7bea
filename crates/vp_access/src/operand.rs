use std::sync::Arc;

use vp_reflect::{Type, Value};

use crate::accessor::{self, Accessor};
use crate::config::Backend;
use crate::error::AccessError;
use crate::literal::{Literal, parse_literal};
use crate::plan::Frame;
use crate::runtime::Runtime;

/// An argument or index expression.
///
/// Literals are kept as constants. Anything else is a nested path that is
/// evaluated against the root context of every call.
#[derive(Debug)]
pub(crate) enum Operand {
    Literal(Literal),
    Nested {
        accessor: Box<Accessor>,
        /// Where the operand text starts in the enclosing path.
        offset: usize,
    },
}

impl Operand {
    /// Builds the operand for `text` and evaluates it once.
    pub(crate) fn build(
        rt: &Arc<Runtime>,
        path: &Arc<str>,
        text: &str,
        offset: usize,
        frame: &Frame<'_>,
        backend: Backend,
    ) -> Result<(Self, Value), AccessError> {
        if let Some(literal) = parse_literal(text) {
            let value = literal.value.clone();
            return Ok((Self::Literal(literal), value));
        }
        let (value, accessor) =
            accessor::build(rt, Arc::from(text), frame, backend).map_err(|err| err.within(path, offset))?;
        let accessor = Box::new(accessor);
        Ok((Self::Nested { accessor, offset }, value))
    }

    pub(crate) fn eval(&self, frame: &Frame<'_>, path: &Arc<str>) -> Result<Value, AccessError> {
        match self {
            Self::Literal(literal) => Ok(literal.value.clone()),
            Self::Nested { accessor, offset } => accessor
                .eval(frame.ctx, frame.this, frame.vars)
                .map_err(|err| err.within(path, *offset)),
        }
    }

    /// The type overload scoring sees for `value`.
    pub(crate) fn arg_type(&self, value: &Value) -> Option<Type> {
        match self {
            Self::Literal(literal) => literal.ty.clone(),
            Self::Nested { accessor, .. } => nested_arg_type(accessor, value),
        }
    }

    #[inline]
    pub(crate) fn is_nested(&self) -> bool {
        matches!(self, Self::Nested { .. })
    }
}

/// The type overload scoring sees for `value` produced by `accessor`.
///
/// That is the declared result type when it is more specific than `Object`,
/// otherwise the runtime type of `value`.
pub(crate) fn nested_arg_type(accessor: &Accessor, value: &Value) -> Option<Type> {
    accessor
        .result_type()
        .filter(|ty| !matches!(ty, Type::Object | Type::Void))
        .cloned()
        .or_else(|| value.runtime_type())
}

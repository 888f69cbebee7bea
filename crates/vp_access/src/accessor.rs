use std::fmt;
use std::sync::Arc;

use vp_reflect::{Type, Value};

use crate::compile::{self, CompiledAccessor};
use crate::config::Backend;
use crate::error::AccessError;
use crate::interpret::{self, InterpretedChain};
use crate::plan::Frame;
use crate::runtime::Runtime;
use crate::vars::VariableResolver;

/// A reusable, resolved property path.
///
/// Both realizations evaluate to the same values for the same inputs.
/// Accessors are immutable and may be shared between threads.
pub enum Accessor {
    Interpreted(InterpretedChain),
    Compiled(CompiledAccessor),
}

impl Accessor {
    /// Evaluates the path against `ctx`.
    ///
    /// `this` is the value of the self token, and `vars` supplies the
    /// variables a first segment may name.
    ///
    /// A compiled accessor fails with
    /// [`ErrorKind::OptimizationNotSupported`](crate::ErrorKind::OptimizationNotSupported)
    /// when a receiver or argument type differs from the one it was compiled
    /// for. [`AccessorFactory`](crate::AccessorFactory) then interprets the
    /// path instead.
    pub fn eval(&self, ctx: &Value, this: &Value, vars: &dyn VariableResolver) -> Result<Value, AccessError> {
        let frame = Frame { ctx, this, vars };
        match self {
            Self::Interpreted(chain) => chain.eval(&frame),
            Self::Compiled(compiled) => compiled.eval(&frame),
        }
    }

    pub fn path(&self) -> &str {
        match self {
            Self::Interpreted(chain) => chain.path(),
            Self::Compiled(compiled) => compiled.path(),
        }
    }

    pub fn backend(&self) -> Backend {
        match self {
            Self::Interpreted(_) => Backend::Interpreted,
            Self::Compiled(_) => Backend::Compiled,
        }
    }

    /// Declared type of the last segment, if known.
    pub fn result_type(&self) -> Option<&Type> {
        match self {
            Self::Interpreted(chain) => chain.result_type(),
            Self::Compiled(compiled) => compiled.result_type(),
        }
    }
}

impl fmt::Debug for Accessor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Interpreted(chain) => fmt::Debug::fmt(chain, f),
            Self::Compiled(compiled) => fmt::Debug::fmt(compiled, f),
        }
    }
}

/// Builds an accessor with `backend` and returns the first value.
pub(crate) fn build(
    rt: &Arc<Runtime>,
    path: Arc<str>,
    frame: &Frame<'_>,
    backend: Backend,
) -> Result<(Value, Accessor), AccessError> {
    match backend {
        Backend::Interpreted => {
            interpret::build(rt, path, frame).map(|(value, chain)| (value, Accessor::Interpreted(chain)))
        }
        Backend::Compiled => {
            compile::build(rt, path, frame).map(|(value, compiled)| (value, Accessor::Compiled(compiled)))
        }
    }
}

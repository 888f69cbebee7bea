//! The compiling backend.
//!
//! Walks the path once with the shared decisions and bakes the outcome into
//! a fixed plan of closures: member handles are bound, literal arguments are
//! converted once and folded in, and the remaining arguments become nested
//! accessors re-evaluated on every call.
//!
//! A plan is only valid for the receiver and argument types it was decided
//! for. Meeting others fails with [`ErrorKind::OptimizationNotSupported`],
//! which the factory answers by switching to the interpreted backend.

use std::fmt;
use std::sync::Arc;

use vp_reflect::{Type, Value};

use crate::accessor::Accessor;
use crate::config::Backend;
use crate::error::{AccessError, ErrorKind};
use crate::operand::{Operand, nested_arg_type};
use crate::plan::{self, Frame, Planned, Receiver, Step};
use crate::runtime::Runtime;

type Run = Box<dyn Fn(&Frame<'_>, &Value, Vec<Value>) -> Result<Value, ErrorKind> + Send + Sync>;

/// An argument of a compiled step.
enum Slot {
    /// A literal, already converted to the parameter type.
    Const(Value),
    /// A nested accessor evaluated per call.
    Input {
        accessor: Box<Accessor>,
        offset: usize,
        /// Conversion target, `None` when the value is passed as is.
        param: Option<Type>,
        /// The argument type seen while compiling.
        seen: Option<Type>,
    },
}

struct CompiledStep {
    offset: usize,
    null_safe: bool,
    /// Set when the step reads its receiver, naming the member for
    /// [`ErrorKind::NullReceiver`].
    member: Option<Arc<str>>,
    /// The receiver the step was decided for, if the decision depends on it.
    receiver: Option<Receiver>,
    /// `true` if the overload was chosen by the argument types.
    pins_args: bool,
    slots: Box<[Slot]>,
    run: Run,
}

/// A fixed plan of pre-bound steps. Never re-resolves.
pub struct CompiledAccessor {
    runtime: Arc<Runtime>,
    path: Arc<str>,
    plan: Box<[CompiledStep]>,
    result_type: Option<Type>,
}

/// Compiles `path` and returns the value of the first evaluation.
///
/// Fails with [`ErrorKind::OptimizationNotSupported`] when a null-safe
/// segment short circuited, leaving later segments undecided.
pub(crate) fn build(
    rt: &Arc<Runtime>,
    path: Arc<str>,
    frame: &Frame<'_>,
) -> Result<(Value, CompiledAccessor), AccessError> {
    let segments = rt.segments(&path)?;
    let walk = plan::walk(
        rt,
        &path,
        &segments,
        frame,
        0,
        frame.ctx.clone(),
        Backend::Compiled,
        rt.config().static_access(),
    )?;
    if let Some(index) = walk.deferred {
        let reason = "a null-safe segment short circuited while compiling";
        return Err(ErrorKind::OptimizationNotSupported(reason).at(&path, segments[index].offset()));
    }

    let result_type = walk.steps.last().and_then(|planned| planned.result_type.clone());
    let mut steps = Vec::with_capacity(walk.steps.len());
    for planned in walk.steps {
        let member = planned.step.uses_receiver().then(|| plan::label(&segments[planned.index]));
        steps.push(specialize(rt, &path, planned, member)?);
    }

    let accessor = CompiledAccessor {
        runtime: rt.clone(),
        path,
        plan: steps.into_boxed_slice(),
        result_type,
    };
    Ok((walk.value, accessor))
}

fn specialize(
    rt: &Arc<Runtime>,
    path: &Arc<str>,
    planned: Planned,
    member: Option<Arc<str>>,
) -> Result<CompiledStep, AccessError> {
    let Planned {
        step,
        offset,
        null_safe,
        receiver,
        operands,
        arg_types,
        ..
    } = planned;
    let receiver = step.uses_receiver().then_some(receiver);
    let pins_args = step.uses_arg_types();

    let params: Vec<Option<Type>> = match &step {
        Step::Invoke(method) => method.params().iter().map(conversion_target).collect(),
        Step::Construct(ctor) => ctor.params().iter().map(conversion_target).collect(),
        _ => vec![None; operands.len()],
    };
    let mut slots = Vec::with_capacity(operands.len());
    for ((operand, param), seen) in operands.into_vec().into_iter().zip(params).zip(arg_types.into_vec()) {
        slots.push(slot(rt, operand, param, seen).map_err(|kind| kind.at(path, offset))?);
    }

    let rt = rt.clone();
    let run = match step {
        Step::Variable(name) => bind(move |frame, _, _| plan::variable(frame, &name)),
        Step::Field(field) => {
            bind(move |_, receiver, _| plan::normalize(&rt, field.get(receiver)?, field.ty()))
        }
        Step::Invoke(method) => bind(move |_, receiver, args| {
            let value = method.invoke(receiver, &args)?;
            plan::normalize(&rt, value, method.return_type())
        }),
        Step::Entry(key) => bind(move |_, receiver, _| plan::entry(receiver, &key)),
        Step::This => bind(|frame, _, _| Ok(frame.this.clone())),
        Step::Length => bind(|_, receiver, _| plan::length(receiver)),
        Step::Literal(value) => bind(move |_, _, _| Ok(value.clone())),
        Step::Class(ty) => {
            let value = Value::Type(ty);
            bind(move |_, _, _| Ok(value.clone()))
        }
        Step::Index(kind) => bind(move |_, receiver, args| {
            let key = args.first().unwrap_or(&Value::Null);
            plan::index(&rt, kind, receiver, key)
        }),
        Step::Construct(ctor) => bind(move |_, _, args| Ok(ctor.construct(&args)?)),
    };

    Ok(CompiledStep {
        offset,
        null_safe,
        member,
        receiver,
        pins_args,
        slots: slots.into_boxed_slice(),
        run,
    })
}

fn bind(f: impl Fn(&Frame<'_>, &Value, Vec<Value>) -> Result<Value, ErrorKind> + Send + Sync + 'static) -> Run {
    Box::new(f)
}

/// `Object` parameters accept any value unchanged.
fn conversion_target(param: &Type) -> Option<Type> {
    (*param != Type::Object).then(|| param.clone())
}

fn slot(rt: &Runtime, operand: Operand, param: Option<Type>, seen: Option<Type>) -> Result<Slot, ErrorKind> {
    Ok(match operand {
        Operand::Literal(literal) => Slot::Const(match &param {
            Some(param) => rt.coerce(literal.value, param)?,
            None => literal.value,
        }),
        Operand::Nested { accessor, offset } => Slot::Input {
            accessor,
            offset,
            param,
            seen,
        },
    })
}

impl CompiledAccessor {
    #[inline]
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Declared type of the last segment, if known.
    #[inline]
    pub fn result_type(&self) -> Option<&Type> {
        self.result_type.as_ref()
    }

    pub(crate) fn eval(&self, frame: &Frame<'_>) -> Result<Value, AccessError> {
        let mut receiver = frame.ctx.clone();
        for step in &self.plan {
            if step.null_safe && receiver.is_null() {
                return Ok(Value::Null);
            }
            let inputs = self.inputs(step, frame)?;
            if receiver.is_null()
                && let Some(name) = &step.member
            {
                let name = name.clone();
                return Err(ErrorKind::NullReceiver { name }.at(&self.path, step.offset));
            }
            if let Some(expected) = &step.receiver
                && !expected.matches(&receiver)
            {
                let reason = "the receiver type differs from the compiled one";
                return Err(ErrorKind::OptimizationNotSupported(reason).at(&self.path, step.offset));
            }
            if step.pins_args && inputs.iter().any(|(slot, value)| slot.drifted(value)) {
                let reason = "an argument type differs from the compiled one";
                return Err(ErrorKind::OptimizationNotSupported(reason).at(&self.path, step.offset));
            }
            let args = self.convert(step, inputs)?;
            receiver = (step.run)(frame, &receiver, args).map_err(|kind| kind.at(&self.path, step.offset))?;
        }
        Ok(receiver)
    }

    /// Evaluates the slots of `step`, before conversion.
    fn inputs<'s>(&self, step: &'s CompiledStep, frame: &Frame<'_>) -> Result<Vec<(&'s Slot, Value)>, AccessError> {
        let mut inputs = Vec::with_capacity(step.slots.len());
        for slot in &step.slots {
            let value = match slot {
                Slot::Const(value) => value.clone(),
                Slot::Input { accessor, offset, .. } => accessor
                    .eval(frame.ctx, frame.this, frame.vars)
                    .map_err(|err| err.within(&self.path, *offset))?,
            };
            inputs.push((slot, value));
        }
        Ok(inputs)
    }

    fn convert(&self, step: &CompiledStep, inputs: Vec<(&Slot, Value)>) -> Result<Vec<Value>, AccessError> {
        inputs
            .into_iter()
            .map(|(slot, value)| match slot {
                Slot::Input {
                    param: Some(param), ..
                } => self
                    .runtime
                    .coerce(value, param)
                    .map_err(|err| ErrorKind::from(err).at(&self.path, step.offset)),
                _ => Ok(value),
            })
            .collect()
    }
}

impl Slot {
    fn drifted(&self, value: &Value) -> bool {
        match self {
            Self::Const(_) => false,
            Self::Input { accessor, seen, .. } => nested_arg_type(accessor, value) != *seen,
        }
    }
}

impl fmt::Debug for CompiledAccessor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let offsets: Vec<usize> = self.plan.iter().map(|step| step.offset).collect();
        f.debug_struct("CompiledAccessor")
            .field("path", &self.path)
            .field("steps", &offsets)
            .field("result_type", &self.result_type)
            .finish_non_exhaustive()
    }
}

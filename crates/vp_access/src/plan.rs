//! The segment decisions shared by both backends.
//!
//! [`walk`] evaluates a path once, deciding for every segment which
//! [`Step`] applies to the live receiver. The interpreted chain keeps the
//! decisions as nodes, the compiler specializes them into closures.
//!
//! Property segments try, in order: a variable (first segment only), a
//! field, a zero-argument getter (`getX`, `isX`, `x`), a present map key,
//! the self token (first segment only), `length` on arrays, the literal
//! table, and the longest class name formed by the leading property
//! segments.

use std::borrow::Cow;
use std::fmt;
use std::sync::Arc;

use vp_reflect::info::{ConstructorInfo, FieldInfo, MethodInfo};
use vp_reflect::ty::format_arg_types;
use vp_reflect::{ConversionError, InvokeError, Type, Value};

use crate::config::Backend;
use crate::error::{AccessError, CompileError, ErrorKind};
use crate::literal;
use crate::operand::Operand;
use crate::runtime::Runtime;
use crate::segment::{Segment, SegmentKind, split_arguments};
use crate::vars::VariableResolver;

// -----------------------------------------------------------------------------
// Frame

/// The inputs of one evaluation.
#[derive(Clone, Copy)]
pub(crate) struct Frame<'a> {
    pub ctx: &'a Value,
    pub this: &'a Value,
    pub vars: &'a dyn VariableResolver,
}

// -----------------------------------------------------------------------------
// Receiver

/// What a decision was made for.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub(crate) enum Receiver {
    Null,
    Instance(Type),
    /// A type object, whose static members are in play.
    Static(Type),
}

impl Receiver {
    pub(crate) fn of(value: &Value) -> Self {
        match value {
            Value::Type(ty) => Self::Static(ty.clone()),
            value => match value.runtime_type() {
                Some(ty) => Self::Instance(ty),
                None => Self::Null,
            },
        }
    }

    pub(crate) fn matches(&self, value: &Value) -> bool {
        match (self, value) {
            (Self::Null, Value::Null) => true,
            (Self::Static(ty), Value::Type(other)) => ty == other,
            (Self::Instance(_), Value::Type(_) | Value::Null) => false,
            (Self::Instance(ty), value) => value.has_runtime_type(Some(ty)),
            _ => false,
        }
    }
}

// -----------------------------------------------------------------------------
// Step

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum IndexKind {
    MapKey,
    List,
    Array,
    CharAt,
}

/// A resolved segment.
#[derive(Debug, Clone)]
pub(crate) enum Step {
    Variable(Arc<str>),
    Field(Arc<FieldInfo>),
    /// A method call, or a getter reached through a property.
    Invoke(Arc<MethodInfo>),
    /// A map entry reached through a property.
    Entry(Value),
    This,
    /// `length` or `size()` of an array.
    Length,
    Literal(Value),
    /// A class reference spanning one or more segments.
    Class(Type),
    Index(IndexKind),
    Construct(Arc<ConstructorInfo>),
}

impl Step {
    /// `true` if the step reads the value of the previous one.
    pub(crate) fn uses_receiver(&self) -> bool {
        matches!(
            self,
            Self::Field(_) | Self::Invoke(_) | Self::Entry(_) | Self::Length | Self::Index(_)
        )
    }

    /// `true` if the step was chosen by argument types.
    pub(crate) fn uses_arg_types(&self) -> bool {
        matches!(self, Self::Invoke(_) | Self::Construct(_))
    }

    /// Runs the step. `args` are the evaluated, not yet converted, operands.
    pub(crate) fn run(
        &self,
        rt: &Runtime,
        frame: &Frame<'_>,
        receiver: &Value,
        args: Vec<Value>,
    ) -> Result<Value, ErrorKind> {
        match self {
            Self::Variable(name) => variable(frame, name),
            Self::Field(field) => normalize(rt, field.get(receiver)?, field.ty()),
            Self::Invoke(method) => {
                let args = coerce_args(rt, method.params(), args)?;
                normalize(rt, method.invoke(receiver, &args)?, method.return_type())
            }
            Self::Entry(key) => entry(receiver, key),
            Self::This => Ok(frame.this.clone()),
            Self::Length => length(receiver),
            Self::Literal(value) => Ok(value.clone()),
            Self::Class(ty) => Ok(Value::Type(ty.clone())),
            Self::Index(kind) => {
                let key = args.into_iter().next().unwrap_or(Value::Null);
                index(rt, *kind, receiver, &key)
            }
            Self::Construct(ctor) => {
                let args = coerce_args(rt, ctor.params(), args)?;
                Ok(ctor.construct(&args)?)
            }
        }
    }
}

// -----------------------------------------------------------------------------
// Step helpers

pub(crate) fn variable(frame: &Frame<'_>, name: &Arc<str>) -> Result<Value, ErrorKind> {
    frame.vars.resolve(name).ok_or_else(|| ErrorKind::PropertyAccess {
        name: name.clone(),
        receiver: frame.ctx.type_name(),
    })
}

/// Converts a result to the declared primitive return type.
pub(crate) fn normalize(rt: &Runtime, value: Value, declared: &Type) -> Result<Value, ErrorKind> {
    match declared {
        Type::Primitive(p) if !value.is_null() && value.primitive() != Some(*p) => {
            Ok(rt.converter().convert(&value, declared)?)
        }
        _ => Ok(value),
    }
}

pub(crate) fn coerce_args(rt: &Runtime, params: &[Type], args: Vec<Value>) -> Result<Vec<Value>, ErrorKind> {
    if args.len() != params.len() {
        return Err(InvokeError::Arity {
            expected: params.len(),
            actual: args.len(),
        }
        .into());
    }
    args.into_iter()
        .zip(params)
        .map(|(arg, param)| rt.coerce(arg, param).map_err(ErrorKind::from))
        .collect()
}

pub(crate) fn entry(receiver: &Value, key: &Value) -> Result<Value, ErrorKind> {
    match receiver.as_map() {
        Some(map) => Ok(map.get(key).cloned().unwrap_or(Value::Null)),
        None => Err(ErrorKind::PropertyAccess {
            name: Arc::from(key.to_string()),
            receiver: describe(receiver),
        }),
    }
}

pub(crate) fn length(receiver: &Value) -> Result<Value, ErrorKind> {
    match receiver.as_array() {
        Some(array) => Ok(Value::Int(i32::try_from(array.len()).unwrap_or(i32::MAX))),
        None => Err(ErrorKind::PropertyAccess {
            name: Arc::from("length"),
            receiver: describe(receiver),
        }),
    }
}

pub(crate) fn index(rt: &Runtime, kind: IndexKind, receiver: &Value, key: &Value) -> Result<Value, ErrorKind> {
    let mismatch = || ErrorKind::PropertyAccess {
        name: Arc::from(format!("[{key}]")),
        receiver: describe(receiver),
    };
    if kind == IndexKind::MapKey {
        return receiver
            .as_map()
            .map(|map| map.get(key).cloned().unwrap_or(Value::Null))
            .ok_or_else(mismatch);
    }

    let position = ordinal(rt, key)?;
    let pick = |items: &[Value]| -> Result<Value, ErrorKind> { Ok(items[slot(position, items.len())?].clone()) };
    match kind {
        IndexKind::List => pick(receiver.as_list().ok_or_else(mismatch)?),
        IndexKind::Array => pick(receiver.as_array().ok_or_else(mismatch)?.items()),
        IndexKind::CharAt => {
            let text = receiver.as_str().ok_or_else(mismatch)?;
            let at = slot(position, text.chars().count())?;
            text.chars().nth(at).map(Value::Char).ok_or_else(mismatch)
        }
        IndexKind::MapKey => Err(mismatch()),
    }
}

fn ordinal(rt: &Runtime, key: &Value) -> Result<i64, ErrorKind> {
    let converted = rt.converter().convert(key, &Type::INT)?;
    converted.as_long().ok_or_else(|| {
        ConversionError::Unsupported {
            from: key.type_name(),
            to: Type::INT,
        }
        .into()
    })
}

fn slot(position: i64, len: usize) -> Result<usize, ErrorKind> {
    usize::try_from(position)
        .ok()
        .filter(|at| *at < len)
        .ok_or(ErrorKind::IndexOutOfBounds { index: position, len })
}

/// Names a receiver in diagnostics. Type objects are named by their type.
pub(crate) fn describe(receiver: &Value) -> String {
    match receiver {
        Value::Type(ty) => ty.path().into_owned(),
        other => other.type_name(),
    }
}

/// The member a segment refers to, as named in diagnostics.
pub(crate) fn label(segment: &Segment) -> Arc<str> {
    match segment.kind() {
        SegmentKind::Property(name) | SegmentKind::Method { name, .. } => Arc::from(&**name),
        SegmentKind::Index { text, .. } => Arc::from(format!("[{text}]")),
        SegmentKind::Construct { class, .. } => Arc::from(&**class),
    }
}

fn capitalize(name: &str) -> Cow<'_, str> {
    let mut chars = name.chars();
    match chars.next() {
        Some(first) if first.is_lowercase() => Cow::Owned(first.to_uppercase().chain(chars).collect()),
        _ => Cow::Borrowed(name),
    }
}

// -----------------------------------------------------------------------------
// Decider

/// The outcome of deciding one segment.
pub(crate) struct Decision {
    pub step: Step,
    /// Number of segments the step consumes.
    pub span: usize,
    pub result_type: Option<Type>,
}

impl Decision {
    fn new(step: Step, result_type: Option<Type>) -> Self {
        Self {
            step,
            span: 1,
            result_type,
        }
    }
}

pub(crate) struct Decider<'a> {
    pub rt: &'a Runtime,
    pub path: &'a Arc<str>,
    pub segments: &'a [Segment],
}

impl Decider<'_> {
    /// Decides the step for the segment at `index`.
    ///
    /// `static_access` enables class names spanning several segments.
    pub(crate) fn decide(
        &self,
        index: usize,
        receiver: &Value,
        frame: &Frame<'_>,
        arg_types: &[Option<Type>],
        static_access: bool,
    ) -> Result<Decision, AccessError> {
        let segment = &self.segments[index];
        let decision = match segment.kind() {
            SegmentKind::Property(name) => self.property(index, name, receiver, frame, static_access),
            SegmentKind::Method { name, .. } => self.method(name, receiver, arg_types),
            SegmentKind::Index { .. } => self.index(segment, receiver),
            SegmentKind::Construct { class, .. } => self.construct(class, arg_types),
        };
        decision.map_err(|kind| kind.at(self.path, segment.offset()))
    }

    fn property(
        &self,
        index: usize,
        name: &str,
        receiver: &Value,
        frame: &Frame<'_>,
        static_access: bool,
    ) -> Result<Decision, ErrorKind> {
        let first = index == 0;
        let scope = self.rt.scope();

        if first && frame.vars.resolve(name).is_some() {
            return Ok(Decision::new(Step::Variable(Arc::from(name)), None));
        }

        match receiver {
            Value::Null => {}
            Value::Type(ty) => {
                if let Some(field) = scope.find_field(ty, name).filter(|f| f.is_static()) {
                    let ty = field.ty().clone();
                    return Ok(Decision::new(Step::Field(field), Some(ty)));
                }
                if let Some(method) = self
                    .getter(ty, name, true)
                    .or_else(|| self.getter(&Type::Class, name, false))
                {
                    let ty = method.return_type().clone();
                    return Ok(Decision::new(Step::Invoke(method), Some(ty)));
                }
            }
            value => {
                if let Some(ty) = value.runtime_type() {
                    if let Some(field) = scope.find_field(&ty, name) {
                        let ty = field.ty().clone();
                        return Ok(Decision::new(Step::Field(field), Some(ty)));
                    }
                    if let Some(method) = self.getter(&ty, name, false) {
                        let ty = method.return_type().clone();
                        return Ok(Decision::new(Step::Invoke(method), Some(ty)));
                    }
                }
                let key = Value::from(name);
                if value.as_map().is_some_and(|map| map.contains_key(&key)) {
                    return Ok(Decision::new(Step::Entry(key), None));
                }
            }
        }

        if first && name == self.rt.config().self_token() {
            return Ok(Decision::new(Step::This, None));
        }
        if name == "length" && receiver.as_array().is_some() {
            return Ok(Decision::new(Step::Length, Some(Type::INT)));
        }
        if let Some(literal) = literal::lookup(name) {
            return Ok(Decision::new(Step::Literal(literal.value), literal.ty));
        }
        if first
            && static_access
            && let Some((ty, span)) = self.class_prefix(index)
        {
            log::trace!("`{}`: `{name}` starts the class name `{ty}`", self.path);
            return Ok(Decision {
                step: Step::Class(ty),
                span,
                result_type: Some(Type::Class),
            });
        }

        let name = Arc::from(name);
        Err(match receiver {
            Value::Null => ErrorKind::NullReceiver { name },
            other => ErrorKind::PropertyAccess {
                name,
                receiver: describe(other),
            },
        })
    }

    fn getter(&self, ty: &Type, name: &str, statics_only: bool) -> Option<Arc<MethodInfo>> {
        let cap = capitalize(name);
        [format!("get{cap}"), format!("is{cap}"), name.to_owned()]
            .iter()
            .find_map(|candidate| self.rt.resolve_method(ty, candidate, &[], statics_only))
    }

    /// The longest class name formed by the property segments from `index`.
    fn class_prefix(&self, index: usize) -> Option<(Type, usize)> {
        let names: Vec<&str> = self.segments[index..]
            .iter()
            .take_while(|segment| !segment.is_null_safe())
            .map_while(|segment| match segment.kind() {
                SegmentKind::Property(name) => Some(&**name),
                _ => None,
            })
            .collect();
        (1..=names.len()).rev().find_map(|len| {
            let ty = self.rt.scope().try_resolve_type(&names[..len].join("."))?;
            Some((ty, len))
        })
    }

    fn method(&self, name: &str, receiver: &Value, args: &[Option<Type>]) -> Result<Decision, ErrorKind> {
        let found = match receiver {
            Value::Null => return Err(ErrorKind::NullReceiver { name: Arc::from(name) }),
            Value::Array(_) if name == "size" && args.is_empty() => {
                return Ok(Decision::new(Step::Length, Some(Type::INT)));
            }
            Value::Type(ty) => self
                .rt
                .resolve_method(ty, name, args, true)
                .or_else(|| self.rt.resolve_method(&Type::Class, name, args, false)),
            value => value
                .runtime_type()
                .and_then(|ty| self.rt.resolve_method(&ty, name, args, false)),
        };
        match found {
            Some(method) => {
                let ty = method.return_type().clone();
                Ok(Decision::new(Step::Invoke(method), Some(ty)))
            }
            None => Err(ErrorKind::MemberResolution {
                receiver: describe(receiver),
                name: Arc::from(name),
                args: format_arg_types(args),
            }),
        }
    }

    fn index(&self, segment: &Segment, receiver: &Value) -> Result<Decision, ErrorKind> {
        let (kind, ty) = match receiver {
            Value::Null => return Err(ErrorKind::NullReceiver { name: label(segment) }),
            Value::Map(_) => (IndexKind::MapKey, None),
            Value::List(_) => (IndexKind::List, None),
            Value::Array(array) => (IndexKind::Array, Some(array.element_type().clone())),
            Value::String(_) => (IndexKind::CharAt, Some(Type::CHAR)),
            other => {
                return Err(ErrorKind::PropertyAccess {
                    name: label(segment),
                    receiver: describe(other),
                });
            }
        };
        Ok(Decision::new(Step::Index(kind), ty))
    }

    fn construct(&self, class: &str, args: &[Option<Type>]) -> Result<Decision, ErrorKind> {
        let ty = self.rt.scope().resolve_type(class)?;
        match self.rt.resolve_constructor(&ty, args) {
            Some(ctor) => Ok(Decision::new(Step::Construct(ctor), Some(ty))),
            None => Err(ErrorKind::MemberResolution {
                receiver: ty.path().into_owned(),
                name: Arc::from("new"),
                args: format_arg_types(args),
            }),
        }
    }
}

// -----------------------------------------------------------------------------
// Walk

/// A decided segment together with what it was decided for.
pub(crate) struct Planned {
    pub step: Step,
    /// Index of the first segment the step consumes.
    pub index: usize,
    pub offset: usize,
    pub null_safe: bool,
    pub receiver: Receiver,
    pub operands: Box<[Operand]>,
    pub arg_types: Box<[Option<Type>]>,
    pub result_type: Option<Type>,
}

impl Planned {
    /// `true` if a nested operand now reports a different argument type.
    pub(crate) fn arg_types_changed(&self, args: &[Value]) -> bool {
        self.operands
            .iter()
            .zip(args)
            .zip(self.arg_types.iter())
            .any(|((operand, value), seen)| operand.is_nested() && operand.arg_type(value) != *seen)
    }
}

impl fmt::Debug for Planned {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Planned")
            .field("step", &self.step)
            .field("offset", &self.offset)
            .field("receiver", &self.receiver)
            .field("arg_types", &self.arg_types)
            .finish_non_exhaustive()
    }
}

/// The result of walking a path once.
pub(crate) struct Walk {
    pub steps: Vec<Planned>,
    pub value: Value,
    /// The segment a null-safe short circuit stopped at.
    pub deferred: Option<usize>,
}

/// Evaluates the segments from `start`, deciding each one for the receiver
/// it meets.
pub(crate) fn walk(
    rt: &Arc<Runtime>,
    path: &Arc<str>,
    segments: &[Segment],
    frame: &Frame<'_>,
    start: usize,
    mut receiver: Value,
    backend: Backend,
    static_access: bool,
) -> Result<Walk, AccessError> {
    let decider = Decider { rt, path, segments };
    let mut steps = Vec::with_capacity(segments.len().saturating_sub(start));
    let mut index = start;

    while let Some(segment) = segments.get(index) {
        if segment.is_null_safe() && receiver.is_null() {
            log::trace!("`{path}`: null receiver before `{segment}`, short circuiting");
            return Ok(Walk {
                steps,
                value: Value::Null,
                deferred: Some(index),
            });
        }

        let (operands, values) = operands(rt, path, segment, frame, backend)?;
        let arg_types: Box<[Option<Type>]> = operands
            .iter()
            .zip(&values)
            .map(|(operand, value)| operand.arg_type(value))
            .collect();

        let decision = decider.decide(index, &receiver, frame, &arg_types, static_access)?;
        log::trace!("`{path}`: `{segment}` resolved to {:?}", decision.step);
        let value = decision
            .step
            .run(rt, frame, &receiver, values)
            .map_err(|kind| kind.at(path, segment.offset()))?;

        steps.push(Planned {
            step: decision.step,
            index,
            offset: segment.offset(),
            null_safe: segment.is_null_safe(),
            receiver: Receiver::of(&receiver),
            operands,
            arg_types,
            result_type: decision.result_type,
        });
        receiver = value;
        index += decision.span;
    }

    Ok(Walk {
        steps,
        value: receiver,
        deferred: None,
    })
}

/// Builds and evaluates the operands of a segment.
fn operands(
    rt: &Arc<Runtime>,
    path: &Arc<str>,
    segment: &Segment,
    frame: &Frame<'_>,
    backend: Backend,
) -> Result<(Box<[Operand]>, Vec<Value>), AccessError> {
    let pieces: Vec<(usize, &str)> = match segment.kind() {
        SegmentKind::Property(_) => return Ok((Box::default(), Vec::new())),
        SegmentKind::Method { args, args_offset, .. } | SegmentKind::Construct { args, args_offset, .. } => {
            split_arguments(args)
                .map_err(|err| {
                    let err = err.shifted(*args_offset);
                    ErrorKind::from(err).at(path, err.offset())
                })?
                .into_iter()
                .map(|(offset, text)| (args_offset + offset, text))
                .collect()
        }
        SegmentKind::Index { text, text_offset } => {
            let trimmed = text.trim_start();
            let offset = text_offset + (text.len() - trimmed.len());
            let trimmed = trimmed.trim_end();
            if trimmed.is_empty() {
                let err = CompileError::InvalidName { offset: *text_offset };
                return Err(ErrorKind::from(err).at(path, *text_offset));
            }
            vec![(offset, trimmed)]
        }
    };

    let mut operands = Vec::with_capacity(pieces.len());
    let mut values = Vec::with_capacity(pieces.len());
    for (offset, text) in pieces {
        let (operand, value) = Operand::build(rt, path, text, offset, frame, backend)?;
        operands.push(operand);
        values.push(value);
    }
    Ok((operands.into_boxed_slice(), values))
}

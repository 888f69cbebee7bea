//! The interpreted backend.

use std::fmt;
use std::sync::Arc;

use vp_reflect::{Type, Value};

use crate::config::Backend;
use crate::error::AccessError;
use crate::plan::{self, Decider, Frame, Planned};
use crate::runtime::Runtime;
use crate::segment::Segment;

/// A linked chain of decided segments.
///
/// Every node remembers the receiver type and argument types it was decided
/// for. When a later call meets different ones, the node decides again for
/// that call only; the chain itself never changes after construction.
pub struct InterpretedChain {
    runtime: Arc<Runtime>,
    path: Arc<str>,
    segments: Arc<[Segment]>,
    head: Option<Box<Node>>,
    result_type: Option<Type>,
}

struct Node {
    kind: NodeKind,
    next: Option<Box<Node>>,
}

enum NodeKind {
    Resolved(Planned),
    /// Segments left unresolved by a null-safe short circuit. Walked on
    /// every call.
    Deferred { from: usize },
}

/// Builds a chain for `path` and returns the value of the first evaluation.
pub(crate) fn build(
    rt: &Arc<Runtime>,
    path: Arc<str>,
    frame: &Frame<'_>,
) -> Result<(Value, InterpretedChain), AccessError> {
    let segments = rt.segments(&path)?;
    let walk = plan::walk(
        rt,
        &path,
        &segments,
        frame,
        0,
        frame.ctx.clone(),
        Backend::Interpreted,
        rt.config().static_access(),
    )?;

    let result_type = match walk.deferred {
        Some(_) => None,
        None => walk.steps.last().and_then(|planned| planned.result_type.clone()),
    };
    let mut head = walk.deferred.map(|from| {
        Box::new(Node {
            kind: NodeKind::Deferred { from },
            next: None,
        })
    });
    for planned in walk.steps.into_iter().rev() {
        head = Some(Box::new(Node {
            kind: NodeKind::Resolved(planned),
            next: head,
        }));
    }

    let chain = InterpretedChain {
        runtime: rt.clone(),
        path,
        segments,
        head,
        result_type,
    };
    Ok((walk.value, chain))
}

impl InterpretedChain {
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
        let decider = Decider {
            rt: &self.runtime,
            path: &self.path,
            segments: &self.segments,
        };
        let mut receiver = frame.ctx.clone();
        let mut node = self.head.as_deref();

        while let Some(current) = node {
            match &current.kind {
                NodeKind::Resolved(planned) => {
                    if planned.null_safe && receiver.is_null() {
                        return Ok(Value::Null);
                    }
                    receiver = self.step(&decider, planned, frame, &receiver)?;
                }
                NodeKind::Deferred { from } => {
                    let walk = plan::walk(
                        &self.runtime,
                        &self.path,
                        &self.segments,
                        frame,
                        *from,
                        receiver,
                        Backend::Interpreted,
                        false,
                    )?;
                    return Ok(walk.value);
                }
            }
            node = current.next.as_deref();
        }
        Ok(receiver)
    }

    fn step(
        &self,
        decider: &Decider<'_>,
        planned: &Planned,
        frame: &Frame<'_>,
        receiver: &Value,
    ) -> Result<Value, AccessError> {
        let mut args = Vec::with_capacity(planned.operands.len());
        for operand in &planned.operands {
            args.push(operand.eval(frame, &self.path)?);
        }

        let stale = (planned.step.uses_receiver() && !planned.receiver.matches(receiver))
            || (planned.step.uses_arg_types() && planned.arg_types_changed(&args));

        let redecided;
        let mut step = &planned.step;
        if stale {
            log::trace!(
                "`{}`: re-resolving the segment at offset {} for `{}`",
                self.path,
                planned.offset,
                plan::describe(receiver),
            );
            let arg_types: Vec<Option<Type>> = planned
                .operands
                .iter()
                .zip(&args)
                .map(|(operand, value)| operand.arg_type(value))
                .collect();
            redecided = decider.decide(planned.index, receiver, frame, &arg_types, false)?;
            step = &redecided.step;
        }

        step.run(&self.runtime, frame, receiver, args)
            .map_err(|kind| kind.at(&self.path, planned.offset))
    }
}

impl fmt::Debug for InterpretedChain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut nodes = Vec::new();
        let mut node = self.head.as_deref();
        while let Some(current) = node {
            match &current.kind {
                NodeKind::Resolved(planned) => nodes.push(format!("{:?}", planned.step)),
                NodeKind::Deferred { from } => nodes.push(format!("Deferred({from})")),
            }
            node = current.next.as_deref();
        }
        f.debug_struct("InterpretedChain")
            .field("path", &self.path)
            .field("nodes", &nodes)
            .field("result_type", &self.result_type)
            .finish()
    }
}

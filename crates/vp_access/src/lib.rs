#![doc = include_str!("../README.md")]
#![cfg_attr(docsrs, feature(doc_cfg))]

// -----------------------------------------------------------------------------
// Modules

pub mod accessor;
pub mod compile;
pub mod config;
pub mod error;
pub mod factory;
pub mod interpret;
pub mod literal;
pub mod resolver;
pub mod runtime;
pub mod segment;
pub mod vars;

mod operand;
mod plan;

// -----------------------------------------------------------------------------
// Top-level exports

pub use accessor::Accessor;
pub use compile::CompiledAccessor;
pub use config::{AccessConfig, Backend};
pub use error::{AccessError, CompileError, ErrorKind};
pub use factory::AccessorFactory;
pub use interpret::InterpretedChain;
pub use vars::{MapVariables, NoVariables, VariableResolver};

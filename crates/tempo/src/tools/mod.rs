//! Tool abstractions for function-calling agents.
//!
//! Every capability the agent has is a [`Tool`] implementor. Tools are
//! collected into a [`ToolRegistry`] which handles name resolution, schema
//! validation, result rendering and truncation.
//!
//! # Submodules
//!
//! - [`core`]: [`Tool`] trait, [`ToolRegistry`], argument validation.
//! - [`spec`]: [`ToolSpec`](spec::ToolSpec) for structured descriptions with
//!   `when_to_use` / `when_not_to_use` guidance.
//!
//! The calendar tools themselves live in [`crate::calendar::tools`].

pub mod core;
pub mod spec;

pub use core::{
    DEFAULT_MAX_RESULT_BYTES, Tool, ToolFuture, ToolOutcome, ToolRegistry, truncate_result,
    validate_arguments,
};
pub use spec::ToolSpec;

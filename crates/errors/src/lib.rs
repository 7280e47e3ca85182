//! Errors that carry a message, a cause chain and the call stack where they
//! were created.
//!
//! Errors are built in layers. [`new`] starts a chain with a message and a
//! stack. [`wrap`] prefixes an error with context and captures a stack only
//! if the chain does not already have one. [`with_message`] adds context
//! alone, and [`with_stack`] adds a stack alone. [`stack`] and [`cause`] walk
//! back down the chain.
//!
//! ```
//! use errstack::{ResultExt as _, wrap};
//!
//! fn parse(text: &str) -> Result<u32, errstack::Error> {
//!     text.parse::<u32>().wrap_err("parsing count")
//! }
//!
//! let err = wrap(parse("x").unwrap_err(), "loading config");
//! assert_eq!(
//!     err.to_string(),
//!     "loading config: parsing count: invalid digit found in string"
//! );
//! assert!(errstack::stack(&err).is_some());
//! ```
//!
//! `{}` prints the message text. `{:#}` and `{:?}` also list every captured
//! stack, one frame per function with its source location.

mod chain;
mod error;
mod ext;
mod frame;
mod macros;
mod message;
mod remap;
mod render;
mod sentinel;
mod stack_trace;


pub use chain::{Chain, ErrorExt, MAX_CHAIN_DEPTH, cause, stack};
pub use error::{
    BoxError, Error, Fundamental, MessageAnnotated, StackAnnotated, new, with_message, with_stack,
    wrap,
};
pub use ext::{OptionErrorExt, ResultExt};
pub use frame::{Frame, FuncInfo, short_function_name};
pub use message::IntoMessage;
pub use remap::{ErrorType, Rule, const_converter, remap};
pub use render::{Flags, Render, Styled, Verb};
pub use sentinel::Sentinel;
pub use stack_trace::StackTrace;

/// The extension traits, imported anonymously.
pub mod prelude {
    pub use crate::chain::ErrorExt as _;
    pub use crate::ext::{OptionErrorExt as _, ResultExt as _};
    pub use crate::render::Render as _;
}

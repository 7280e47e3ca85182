//! The error type and its constructors.

use std::borrow::Cow;
use std::error::Error as StdError;
use std::fmt;

use crate::chain;
use crate::message::IntoMessage;
use crate::render::{Flags, Render, Verb};
use crate::stack_trace::{StackTrace, callers};

/// Any thread-safe error, boxed. Every error this crate wraps is held as one.
pub type BoxError = Box<dyn StdError + Send + Sync + 'static>;

/// An error created by this crate.
///
/// Each variant owns its payload. Formatting with `{}` gives the message
/// text; `{:#}` and `{:?}` add every stack captured along the chain.
pub enum Error {
    /// A root error: a message and the stack it was created at.
    Fundamental(Fundamental),
    /// Another error plus the stack where it was annotated.
    StackAnnotated(StackAnnotated),
    /// Another error prefixed with a message. Has no stack of its own.
    MessageAnnotated(MessageAnnotated),
}

pub struct Fundamental {
    message: Cow<'static, str>,
    stack: StackTrace,
}

impl Fundamental {
    #[must_use]
    pub fn message(&self) -> &str {
        &self.message
    }

    #[must_use]
    pub fn stack(&self) -> &StackTrace {
        &self.stack
    }
}

pub struct StackAnnotated {
    cause: BoxError,
    stack: StackTrace,
}

impl StackAnnotated {
    #[must_use]
    pub fn cause(&self) -> &(dyn StdError + Send + Sync + 'static) {
        &*self.cause
    }

    #[must_use]
    pub fn stack(&self) -> &StackTrace {
        &self.stack
    }
}

pub struct MessageAnnotated {
    cause: BoxError,
    message: Cow<'static, str>,
}

impl MessageAnnotated {
    #[must_use]
    pub fn message(&self) -> &str {
        &self.message
    }

    #[must_use]
    pub fn cause(&self) -> &(dyn StdError + Send + Sync + 'static) {
        &*self.cause
    }
}

/// Creates an error with the given message and the stack of the caller.
#[inline(never)]
#[must_use]
pub fn new(message: impl IntoMessage) -> Error {
    new_at(message.into_message(), 0)
}

/// Annotates `err` with the stack of the caller.
///
/// A stack is captured even if `err` already carries one.
#[inline(never)]
#[must_use]
pub fn with_stack(err: impl Into<BoxError>) -> Error {
    with_stack_at(err.into(), 0)
}

/// Prefixes `err` with a message, without capturing a stack.
#[must_use]
pub fn with_message(err: impl Into<BoxError>, message: impl IntoMessage) -> Error {
    Error::MessageAnnotated(MessageAnnotated {
        cause: err.into(),
        message: message.into_message(),
    })
}

/// Prefixes `err` with a message and makes sure the chain carries a stack.
///
/// The stack of the caller is captured only if nothing in the chain of
/// `err` has one yet.
#[inline(never)]
#[must_use]
pub fn wrap(err: impl Into<BoxError>, message: impl IntoMessage) -> Error {
    wrap_at(err.into(), message.into_message(), 0)
}

// The `*_at` functions capture on behalf of a public entry point. The capture
// skips the `*_at` frame, the entry point's frame, and `extra_skip` more.

#[inline(never)]
pub(crate) fn new_at(message: Cow<'static, str>, extra_skip: usize) -> Error {
    let stack = callers(2 + extra_skip);
    Error::Fundamental(Fundamental { message, stack })
}

#[inline(never)]
pub(crate) fn with_stack_at(cause: BoxError, extra_skip: usize) -> Error {
    let stack = callers(2 + extra_skip);
    Error::StackAnnotated(StackAnnotated { cause, stack })
}

#[inline(never)]
pub(crate) fn wrap_at(cause: BoxError, message: Cow<'static, str>, extra_skip: usize) -> Error {
    let annotated = Error::MessageAnnotated(MessageAnnotated { cause, message });
    if chain::stack(&annotated).is_some() {
        return annotated;
    }
    let stack = callers(2 + extra_skip);
    Error::StackAnnotated(StackAnnotated {
        cause: Box::new(annotated),
        stack,
    })
}

impl Error {
    /// Like [`new`], but also keeps `skip` frames above the caller out of the
    /// stack.
    #[inline(never)]
    #[must_use]
    pub fn new_skipping(message: impl IntoMessage, skip: usize) -> Self {
        new_at(message.into_message(), skip)
    }

    /// Like [`with_stack`], but also keeps `skip` frames above the caller out
    /// of the stack.
    #[inline(never)]
    #[must_use]
    pub fn with_stack_skipping(err: impl Into<BoxError>, skip: usize) -> Self {
        with_stack_at(err.into(), skip)
    }

    /// Like [`wrap`], but also keeps `skip` frames above the caller out of
    /// the stack.
    #[inline(never)]
    #[must_use]
    pub fn wrap_skipping(err: impl Into<BoxError>, message: impl IntoMessage, skip: usize) -> Self {
        wrap_at(err.into(), message.into_message(), skip)
    }

    /// The first stack found walking the chain outward from this error.
    #[must_use]
    pub fn stack(&self) -> Option<&StackTrace> {
        chain::stack(self)
    }

    /// The stack captured by this layer itself, if it captured one.
    #[must_use]
    pub fn own_stack(&self) -> Option<&StackTrace> {
        match self {
            Error::Fundamental(e) => Some(&e.stack),
            Error::StackAnnotated(e) => Some(&e.stack),
            Error::MessageAnnotated(_) => None,
        }
    }

    /// Peels off every layer added by this crate and returns the innermost
    /// error by value.
    ///
    /// A [`Fundamental`] error is its own root. Errors from elsewhere are
    /// returned as they are, even if they have sources of their own; use
    /// [`crate::cause`] to look past those by reference.
    #[must_use]
    pub fn into_root(self) -> BoxError {
        let mut current = self;
        loop {
            let cause = match current {
                Error::Fundamental(_) => return Box::new(current),
                Error::StackAnnotated(e) => e.cause,
                Error::MessageAnnotated(e) => e.cause,
            };
            match cause.downcast::<Error>() {
                Ok(inner) => current = *inner,
                Err(foreign) => return foreign,
            }
        }
    }

    fn render_detailed(&self, out: &mut dyn fmt::Write) -> fmt::Result {
        match self {
            Error::Fundamental(e) => {
                writeln!(out, "{}", e.message)?;
                e.stack.render_to(out, Verb::Value, Flags::PLUS)
            }
            Error::StackAnnotated(e) => {
                render_cause_detailed(&*e.cause, out)?;
                out.write_char('\n')?;
                e.stack.render_to(out, Verb::Value, Flags::PLUS)
            }
            Error::MessageAnnotated(e) => {
                write!(out, "{}: ", e.message)?;
                render_cause_detailed(&*e.cause, out)
            }
        }
    }
}

fn render_cause_detailed(cause: &(dyn StdError + 'static), out: &mut dyn fmt::Write) -> fmt::Result {
    match cause.downcast_ref::<Error>() {
        Some(err) => err.render_detailed(out),
        None => write!(out, "{cause}"),
    }
}

impl Render for Error {
    fn render_to(&self, out: &mut dyn fmt::Write, verb: Verb, flags: Flags) -> fmt::Result {
        match verb {
            Verb::Value if flags.contains(Flags::PLUS) => self.render_detailed(out),
            Verb::Short | Verb::Value => write!(out, "{self}"),
            Verb::Quoted => write!(out, "{:?}", self.to_string()),
            Verb::Line | Verb::Name => Ok(()),
        }
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if f.alternate() {
            return self.render_detailed(f);
        }
        match self {
            Error::Fundamental(e) => f.write_str(&e.message),
            Error::StackAnnotated(e) => write!(f, "{}", e.cause),
            Error::MessageAnnotated(e) => write!(f, "{}: {}", e.message, e.cause),
        }
    }
}

impl fmt::Debug for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if !f.alternate() {
            return self.render_detailed(f);
        }
        match self {
            Error::Fundamental(e) => f
                .debug_struct("Fundamental")
                .field("message", &e.message)
                .field("stack", &e.stack)
                .finish(),
            Error::StackAnnotated(e) => f
                .debug_struct("StackAnnotated")
                .field("cause", &e.cause)
                .field("stack", &e.stack)
                .finish(),
            Error::MessageAnnotated(e) => f
                .debug_struct("MessageAnnotated")
                .field("message", &e.message)
                .field("cause", &e.cause)
                .finish(),
        }
    }
}

impl StdError for Error {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        match self {
            Error::Fundamental(_) => None,
            Error::StackAnnotated(StackAnnotated { cause, .. })
            | Error::MessageAnnotated(MessageAnnotated { cause, .. }) => Some(&**cause),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, thiserror::Error)]
    #[error("EOF")]
    struct Eof;

    fn own_stacks(err: &Error) -> usize {
        chain::Chain::new(err)
            .filter_map(|link| link.downcast_ref::<Error>())
            .filter(|link| link.own_stack().is_some())
            .count()
    }

    fn lines(text: &str) -> Vec<&str> {
        text.split('\n').collect()
    }

    #[test]
    fn test_new_text_forms() {
        let err = new("error");
        assert_eq!(err.to_string(), "error");
        assert_eq!(err.render(Verb::Short, Flags::empty()), "error");
        assert_eq!(err.render(Verb::Value, Flags::empty()), "error");
        assert_eq!(err.render(Verb::Quoted, Flags::empty()), r#""error""#);
        assert_eq!(err.render(Verb::Line, Flags::empty()), "");
    }

    #[test]
    fn test_new_detailed_lists_stack() {
        let err = new("error");
        let detailed = format!("{err:#}");
        assert_eq!(detailed, err.render(Verb::Value, Flags::PLUS));
        assert_eq!(detailed, format!("{err:?}"));

        let lines = lines(&detailed);
        assert_eq!(lines[0], "error");
        assert!(lines[1].contains("test_new_detailed_lists_stack"));
        assert!(lines[2].starts_with('\t'));
        assert!(detailed.ends_with('\n'));
    }

    #[test]
    fn test_errorf_formats_message() {
        let err = crate::errorf!("error{}", 2);
        assert_eq!(err.to_string(), "error2");
        assert!(err.own_stack().is_some());
    }

    #[test]
    fn test_wrap_text_forms() {
        let err = wrap(new("error"), "error2");
        assert_eq!(err.to_string(), "error2: error");
        assert_eq!(err.render(Verb::Value, Flags::empty()), "error2: error");

        let err = wrap(new("error with space"), "context");
        assert_eq!(
            err.render(Verb::Quoted, Flags::empty()),
            r#""context: error with space""#
        );
    }

    #[test]
    fn test_quoted_message_layer_is_one_literal() {
        let err = with_message(Eof, "say \"hi\"");
        assert_eq!(
            err.render(Verb::Quoted, Flags::empty()),
            r#""say \"hi\": EOF""#
        );
    }

    #[test]
    fn test_wrap_foreign_error_captures_stack() {
        let err = wrap(Eof, "error");
        assert!(matches!(err, Error::StackAnnotated(_)));
        assert_eq!(err.to_string(), "error: EOF");

        let detailed = format!("{err:#}");
        let lines = lines(&detailed);
        assert_eq!(lines[0], "error: EOF");
        assert!(lines[1].contains("test_wrap_foreign_error_captures_stack"));
        assert!(lines[2].starts_with('\t'));
    }

    #[test]
    fn test_wrap_keeps_existing_stack() {
        let err = wrap(new("error"), "error2");
        assert!(matches!(err, Error::MessageAnnotated(_)));
        assert_eq!(own_stacks(&err), 1);
        assert!(format!("{err:#}").starts_with("error2: error\n"));
    }

    #[test]
    fn test_nested_wrap_captures_once() {
        let err = wrap(wrap(Eof, "error1"), "error2");
        assert_eq!(err.to_string(), "error2: error1: EOF");
        assert_eq!(own_stacks(&err), 1);

        let detailed = format!("{err:#}");
        assert!(detailed.starts_with("error2: error1: EOF\n"));
        assert!(lines(&detailed)[1].contains("test_nested_wrap_captures_once"));
    }

    #[test]
    fn test_wrapf_formats_message() {
        let err = crate::wrapf!(Eof, "error{}", 2);
        assert_eq!(err.to_string(), "error2: EOF");
        assert!(err.stack().is_some());
    }

    #[test]
    fn test_with_message_captures_nothing() {
        let err = with_message(Eof, "context");
        assert_eq!(err.to_string(), "context: EOF");
        assert!(err.stack().is_none());
        assert_eq!(format!("{err:#}"), "context: EOF");

        let err = crate::with_messagef!(Eof, "context {}", 1);
        assert_eq!(err.to_string(), "context 1: EOF");
    }

    #[test]
    fn test_with_stack_always_captures() {
        let err = with_stack(new("error"));
        assert_eq!(err.to_string(), "error");
        assert_eq!(own_stacks(&err), 2);

        let err = with_stack(Eof);
        assert_eq!(err.to_string(), "EOF");
        let detailed = format!("{err:#}");
        assert!(detailed.starts_with("EOF\n"));
        assert!(lines(&detailed)[1].contains("test_with_stack_always_captures"));
    }

    #[test]
    fn test_with_stack_detailed_shows_both_stacks() {
        let inner = new("error");
        let inner_detailed = format!("{inner:#}");
        let err = with_stack(inner);
        let detailed = format!("{err:#}");
        let (first, second) = detailed.split_at(inner_detailed.len());
        assert_eq!(first, inner_detailed);
        assert!(second.starts_with('\n'));
        assert!(second.ends_with('\n'));
        assert!(second.len() > 1);
    }

    #[test]
    fn test_into_root_peels_own_layers() {
        let err = wrap(with_message(with_stack(Eof), "a"), "b");
        let root = err.into_root();
        assert!(root.downcast_ref::<Eof>().is_some());

        let err = wrap(new("root"), "outer");
        let root = err.into_root();
        let root = root.downcast_ref::<Error>().unwrap();
        assert!(matches!(root, Error::Fundamental(e) if e.message() == "root"));
    }

    #[test]
    fn test_source_follows_cause() {
        let err = wrap(Eof, "context");
        let source = err.source().unwrap();
        assert_eq!(source.to_string(), "context: EOF");
        assert!(source.source().unwrap().is::<Eof>());
        assert!(new("root").source().is_none());
    }

    #[test]
    fn test_alternate_debug_is_structural() {
        let err = with_message(Eof, "context");
        let debug = format!("{err:#?}");
        assert!(debug.starts_with("MessageAnnotated {"));
        assert!(debug.contains("\"context\""));
    }

    #[cfg(target_os = "linux")]
    #[test]
    fn test_skipping_variants_drop_helpers() {
        #[inline(never)]
        fn fail() -> Error {
            Error::new_skipping("helper", 1)
        }

        #[inline(never)]
        fn annotate() -> Error {
            Error::with_stack_skipping(Eof, 1)
        }

        #[inline(never)]
        fn wrap_up() -> Error {
            Error::wrap_skipping(Eof, "helper", 1)
        }

        for err in [fail(), annotate(), wrap_up()] {
            let first = err.own_stack().unwrap()[0].render(Verb::Name, Flags::empty());
            assert_eq!(first, "test_skipping_variants_drop_helpers");
        }
    }

    #[test]
    fn test_error_is_send_and_sync() {
        fn assert_send_sync<T: Send + Sync + 'static>() {}
        assert_send_sync::<Error>();
    }
}

//! Walking the causal chain of an error.

use std::error::Error as StdError;
use std::iter::FusedIterator;

use crate::error::Error;
use crate::stack_trace::StackTrace;

/// The most links [`Chain`] will visit. Keeps a `source()` implementation
/// that loops back on itself from hanging a walk.
pub const MAX_CHAIN_DEPTH: usize = 1024;

/// Iterator over an error and its sources, outermost first.
#[derive(Clone)]
pub struct Chain<'a> {
    next: Option<&'a (dyn StdError + 'static)>,
    remaining: usize,
}

impl<'a> Chain<'a> {
    #[must_use]
    pub fn new(head: &'a (dyn StdError + 'static)) -> Self {
        Self {
            next: Some(head),
            remaining: MAX_CHAIN_DEPTH,
        }
    }
}

impl<'a> Iterator for Chain<'a> {
    type Item = &'a (dyn StdError + 'static);

    fn next(&mut self) -> Option<Self::Item> {
        let current = self.next.take()?;
        if self.remaining == 0 {
            return None;
        }
        self.remaining -= 1;
        self.next = current.source();
        Some(current)
    }
}

impl FusedIterator for Chain<'_> {}

/// Returns the first stack trace found walking outward from `err`.
///
/// Errors from other crates are walked through via their `source()`.
#[must_use]
pub fn stack<'a>(err: &'a (dyn StdError + 'static)) -> Option<&'a StackTrace> {
    Chain::new(err).find_map(|link| link.downcast_ref::<Error>().and_then(Error::own_stack))
}

/// Returns the deepest error in the chain of `err`: the first one without a
/// source. An error without a source is its own cause.
#[must_use]
pub fn cause<'a>(err: &'a (dyn StdError + 'static)) -> &'a (dyn StdError + 'static) {
    Chain::new(err).last().unwrap_or(err)
}

/// Chain-walking helpers for any error.
pub trait ErrorExt {
    fn as_std_error(&self) -> &(dyn StdError + 'static);

    fn chain(&self) -> Chain<'_> {
        Chain::new(self.as_std_error())
    }

    /// See [`stack`].
    fn stack_trace(&self) -> Option<&StackTrace> {
        stack(self.as_std_error())
    }

    /// See [`cause`].
    fn root_cause(&self) -> &(dyn StdError + 'static) {
        cause(self.as_std_error())
    }

    /// The first error of type `E` in the chain.
    fn get_in_chain<E: StdError + 'static>(&self) -> Option<&E> {
        self.chain().find_map(|link| link.downcast_ref::<E>())
    }
}

impl<E> ErrorExt for E
where
    E: StdError + 'static,
{
    fn as_std_error(&self) -> &(dyn StdError + 'static) {
        self
    }
}

impl ErrorExt for dyn StdError + 'static {
    fn as_std_error(&self) -> &(dyn StdError + 'static) {
        self
    }
}

impl ErrorExt for dyn StdError + Send + Sync + 'static {
    fn as_std_error(&self) -> &(dyn StdError + 'static) {
        self
    }
}

//! Annotating errors still inside a `Result` or `Option`.
//!
//! An `Ok` value or a `None` means "no error" and passes through every
//! method here untouched. Nothing is captured for it either.

use crate::error::{BoxError, Error, with_stack_at, wrap_at};
use crate::message::IntoMessage;
use crate::remap::{Rule, remap_at};

pub trait ResultExt<T, E>
where
    E: Into<BoxError>,
{
    /// Like [`crate::wrap`] on the error.
    fn wrap_err(self, message: impl IntoMessage) -> Result<T, Error>;

    /// Like [`ResultExt::wrap_err`], but only builds the message on error.
    fn wrap_err_with<M, F>(self, message: F) -> Result<T, Error>
    where
        M: IntoMessage,
        F: FnOnce() -> M;

    /// Like [`crate::with_message`] on the error.
    fn with_message(self, message: impl IntoMessage) -> Result<T, Error>;

    /// Like [`crate::with_stack`] on the error.
    fn with_stack(self) -> Result<T, Error>;

    /// Like [`crate::remap`] on the error.
    fn remap_err(self, rules: &[Rule]) -> Result<T, BoxError>;
}

impl<T, E> ResultExt<T, E> for Result<T, E>
where
    E: Into<BoxError>,
{
    #[inline(never)]
    fn wrap_err(self, message: impl IntoMessage) -> Result<T, Error> {
        match self {
            Ok(value) => Ok(value),
            Err(err) => Err(wrap_at(err.into(), message.into_message(), 0)),
        }
    }

    #[inline(never)]
    fn wrap_err_with<M, F>(self, message: F) -> Result<T, Error>
    where
        M: IntoMessage,
        F: FnOnce() -> M,
    {
        match self {
            Ok(value) => Ok(value),
            Err(err) => Err(wrap_at(err.into(), message().into_message(), 0)),
        }
    }

    fn with_message(self, message: impl IntoMessage) -> Result<T, Error> {
        self.map_err(|err| crate::error::with_message(err, message))
    }

    #[inline(never)]
    fn with_stack(self) -> Result<T, Error> {
        match self {
            Ok(value) => Ok(value),
            Err(err) => Err(with_stack_at(err.into(), 0)),
        }
    }

    #[inline(never)]
    fn remap_err(self, rules: &[Rule]) -> Result<T, BoxError> {
        match self {
            Ok(value) => Ok(value),
            Err(err) => Err(remap_at(err.into(), rules, 0)),
        }
    }
}

/// The `Option` counterpart of [`ResultExt`], for code that models a
/// possibly absent error as `Option<E>`.
pub trait OptionErrorExt {
    #[must_use]
    fn wrap(self, message: impl IntoMessage) -> Option<Error>;

    #[must_use]
    fn with_message(self, message: impl IntoMessage) -> Option<Error>;

    #[must_use]
    fn with_stack(self) -> Option<Error>;

    #[must_use]
    fn remap(self, rules: &[Rule]) -> Option<BoxError>;
}

impl<E> OptionErrorExt for Option<E>
where
    E: Into<BoxError>,
{
    #[inline(never)]
    fn wrap(self, message: impl IntoMessage) -> Option<Error> {
        match self {
            Some(err) => Some(wrap_at(err.into(), message.into_message(), 0)),
            None => None,
        }
    }

    fn with_message(self, message: impl IntoMessage) -> Option<Error> {
        self.map(|err| crate::error::with_message(err, message))
    }

    #[inline(never)]
    fn with_stack(self) -> Option<Error> {
        match self {
            Some(err) => Some(with_stack_at(err.into(), 0)),
            None => None,
        }
    }

    #[inline(never)]
    fn remap(self, rules: &[Rule]) -> Option<BoxError> {
        match self {
            Some(err) => Some(remap_at(err.into(), rules, 0)),
            None => None,
        }
    }
}

//! Translating errors with an ordered list of rules.
//!
//! A rule either claims an error and hands back its replacement, or gives
//! the error back untouched for the next rule to look at. [`remap`] stops
//! at the first rule that claims the error, so the order of a rule list
//! matters: an earlier rule shadows a later one for the same error.
//!
//! ```
//! use std::sync::LazyLock;
//! use errstack::{Rule, Sentinel, remap};
//!
//! const NOT_FOUND: Sentinel = Sentinel::new("not found");
//! const NO_SUCH_USER: Sentinel = Sentinel::new("no such user");
//!
//! static RULES: LazyLock<Vec<Rule>> = LazyLock::new(|| {
//!     vec![
//!         Rule::value(NOT_FOUND, NO_SUCH_USER),
//!         Rule::constant_wrap("looking up user"),
//!     ]
//! });
//!
//! let err = remap(NOT_FOUND, &RULES);
//! assert_eq!(err.to_string(), "no such user");
//! ```

use std::any::{TypeId, type_name};
use std::borrow::Cow;
use std::error::Error as StdError;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::ops::ControlFlow;

use crate::error::{BoxError, wrap_at};
use crate::message::IntoMessage;

type ApplyFn = dyn Fn(BoxError) -> ControlFlow<BoxError, BoxError> + Send + Sync;

/// A named error translation.
///
/// The function returns `Break` with the replacement when the rule matches,
/// and `Continue` with the original error when it does not.
pub struct Rule {
    name: Cow<'static, str>,
    apply: Apply,
}

enum Apply {
    Custom(Box<ApplyFn>),
    // Applied by the dispatcher itself, which knows how many frames to skip.
    Wrap(Cow<'static, str>),
}

impl Rule {
    #[must_use]
    pub fn new<F>(name: impl Into<Cow<'static, str>>, apply: F) -> Self
    where
        F: Fn(BoxError) -> ControlFlow<BoxError, BoxError> + Send + Sync + 'static,
    {
        Self {
            name: name.into(),
            apply: Apply::Custom(Box::new(apply)),
        }
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Matches errors equal to `sentinel` and replaces them with a copy of
    /// `replacement`.
    #[must_use]
    pub fn value<S, R>(sentinel: S, replacement: R) -> Self
    where
        S: StdError + PartialEq + Send + Sync + 'static,
        R: StdError + Clone + Send + Sync + 'static,
    {
        Self::value_fn(sentinel, const_converter(replacement))
    }

    /// Matches errors equal to `sentinel` and passes them to `convert`.
    ///
    /// Only errors of the sentinel's own type can compare equal to it; the
    /// chain of the candidate is not searched.
    #[must_use]
    pub fn value_fn<S, F, R>(sentinel: S, convert: F) -> Self
    where
        S: StdError + PartialEq + Send + Sync + 'static,
        F: Fn(BoxError) -> R + Send + Sync + 'static,
        R: Into<BoxError>,
    {
        Self::new(format!("value({sentinel})"), move |err: BoxError| {
            if err
                .downcast_ref::<S>()
                .is_some_and(|candidate| *candidate == sentinel)
            {
                ControlFlow::Break(convert(err).into())
            } else {
                ControlFlow::Continue(err)
            }
        })
    }

    /// Matches errors whose type is `error_type` and replaces them with a
    /// copy of `replacement`.
    #[must_use]
    pub fn type_id<R>(error_type: ErrorType, replacement: R) -> Self
    where
        R: StdError + Clone + Send + Sync + 'static,
    {
        Self::type_id_fn(error_type, const_converter(replacement))
    }

    /// Matches errors whose type is `error_type` and passes them to
    /// `convert`.
    #[must_use]
    pub fn type_id_fn<F, R>(error_type: ErrorType, convert: F) -> Self
    where
        F: Fn(BoxError) -> R + Send + Sync + 'static,
        R: Into<BoxError>,
    {
        Self::new(format!("type({})", error_type.name()), move |err: BoxError| {
            if error_type.matches(&*err) {
                ControlFlow::Break(convert(err).into())
            } else {
                ControlFlow::Continue(err)
            }
        })
    }

    /// Matches errors of the same type as `sample`.
    #[must_use]
    pub fn like<E, R>(sample: &E, replacement: R) -> Self
    where
        E: StdError + 'static,
        R: StdError + Clone + Send + Sync + 'static,
    {
        Self::type_id(ErrorType::of_val(sample), replacement)
    }

    /// Matches errors of type `T` and replaces them with a copy of
    /// `replacement`.
    #[must_use]
    pub fn of_type<T>(replacement: impl StdError + Clone + Send + Sync + 'static) -> Self
    where
        T: StdError + 'static,
    {
        Self::of_type_fn(move |_: T| replacement.clone())
    }

    /// Matches errors of type `T` and hands them to `convert` by value.
    #[must_use]
    pub fn of_type_fn<T, F, R>(convert: F) -> Self
    where
        T: StdError + 'static,
        F: Fn(T) -> R + Send + Sync + 'static,
        R: Into<BoxError>,
    {
        Self::new(format!("type({})", type_name::<T>()), move |err: BoxError| {
            match err.downcast::<T>() {
                Ok(concrete) => ControlFlow::Break(convert(*concrete).into()),
                Err(err) => ControlFlow::Continue(err),
            }
        })
    }

    /// Matches every error and wraps it with `message`, as [`crate::wrap`]
    /// would. Goes last in a rule list, so that whatever no other rule
    /// claimed still leaves with context and a stack.
    ///
    /// The stack, if one is captured, starts at the caller of [`remap`] or
    /// of the `Result`/`Option` adapter that ran the rules.
    #[must_use]
    pub fn constant_wrap(message: impl IntoMessage) -> Self {
        let message = message.into_message();
        Self {
            name: Cow::Owned(format!("wrap({message})")),
            apply: Apply::Wrap(message),
        }
    }
}

impl fmt::Debug for Rule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Rule")
            .field("name", &self.name)
            .finish_non_exhaustive()
    }
}

/// Returns a converter that ignores the matched error and produces a fresh
/// copy of `replacement` each time.
#[must_use]
pub fn const_converter<R>(replacement: R) -> impl Fn(BoxError) -> BoxError + Send + Sync + 'static
where
    R: StdError + Clone + Send + Sync + 'static,
{
    move |_: BoxError| -> BoxError { Box::new(replacement.clone()) }
}

/// Runs `rules` in order against `err` and returns the replacement from the
/// first rule that matches, or `err` itself if none does.
#[inline(never)]
#[must_use]
pub fn remap(err: impl Into<BoxError>, rules: &[Rule]) -> BoxError {
    remap_at(err.into(), rules, 0)
}

/// Runs the rules on behalf of a public entry point. A stack captured by a
/// wrapping rule skips this function, the entry point, and `extra_skip`
/// more frames.
#[inline(never)]
pub(crate) fn remap_at(mut err: BoxError, rules: &[Rule], extra_skip: usize) -> BoxError {
    for (index, rule) in rules.iter().enumerate() {
        let outcome = match &rule.apply {
            Apply::Custom(apply) => apply(err),
            Apply::Wrap(message) => {
                let wrapped: BoxError = Box::new(wrap_at(err, message.clone(), 1 + extra_skip));
                ControlFlow::Break(wrapped)
            }
        };
        match outcome {
            ControlFlow::Break(replacement) => {
                log::trace!("remap rule #{index} ({}) matched", rule.name);
                return replacement;
            }
            ControlFlow::Continue(original) => err = original,
        }
    }
    err
}

/// A runtime tag for an error type.
///
/// Two tags are equal when they name the same type.
#[derive(Clone, Copy)]
pub struct ErrorType {
    id: TypeId,
    name: &'static str,
    matches: fn(&(dyn StdError + 'static)) -> bool,
}

fn is_type<E>(err: &(dyn StdError + 'static)) -> bool
where
    E: StdError + 'static,
{
    err.is::<E>()
}

impl ErrorType {
    #[must_use]
    pub fn of<E>() -> Self
    where
        E: StdError + 'static,
    {
        Self {
            id: TypeId::of::<E>(),
            name: type_name::<E>(),
            matches: is_type::<E>,
        }
    }

    /// The tag of the type of `sample`.
    #[must_use]
    pub fn of_val<E>(_sample: &E) -> Self
    where
        E: StdError + 'static,
    {
        Self::of::<E>()
    }

    #[must_use]
    pub fn id(&self) -> TypeId {
        self.id
    }

    #[must_use]
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Whether the concrete type of `err` is this type.
    #[must_use]
    pub fn matches(&self, err: &(dyn StdError + 'static)) -> bool {
        (self.matches)(err)
    }
}

impl PartialEq for ErrorType {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for ErrorType {}

impl Hash for ErrorType {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

impl fmt::Debug for ErrorType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("ErrorType").field(&self.name).finish()
    }
}

impl fmt::Display for ErrorType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name)
    }
}

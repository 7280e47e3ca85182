//! Verb-driven text rendering shared by frames, stack traces and errors.
//!
//! Every renderable value is formatted by a pure function of the value, a
//! [`Verb`] and a set of [`Flags`]. The standard `Display` and `Debug`
//! implementations in this crate are thin adapters over that function.

use std::fmt;

/// Selects which aspect of a value is rendered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Verb {
    /// Short text. Base file name for frames, the message text for errors.
    Short,
    /// The default value form.
    Value,
    /// The source line number. Only meaningful for frames.
    Line,
    /// The function name without its module path. Only meaningful for frames.
    Name,
    /// The text as an escaped, double-quoted literal. Only meaningful for
    /// errors.
    ///
    /// Every error layer quotes its full text with Rust string escaping,
    /// including layers that only add a message. A message-only layer
    /// therefore quotes the prefix and the cause as one literal rather than
    /// writing its prefix bare.
    Quoted,
}

bitflags::bitflags! {
    /// Modifiers applied to a [`Verb`].
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct Flags: u8 {
        /// Detailed output: qualified function names, full paths, and the
        /// captured stacks of errors.
        const PLUS = 1 << 0;
        /// Literal-list output for stack traces.
        const SHARP = 1 << 1;
    }
}

impl Flags {
    /// `PLUS` when the formatter was asked for the alternate (`{:#}`) form.
    pub(crate) fn from_alternate(f: &fmt::Formatter<'_>) -> Self {
        if f.alternate() {
            Flags::PLUS
        } else {
            Flags::empty()
        }
    }
}

/// A value that can be rendered for any combination of verb and flags.
///
/// Combinations a type has no meaning for render as the empty string.
pub trait Render {
    fn render_to(&self, out: &mut dyn fmt::Write, verb: Verb, flags: Flags) -> fmt::Result;

    #[must_use]
    fn render(&self, verb: Verb, flags: Flags) -> String {
        let mut out = String::new();
        self.render_to(&mut out, verb, flags)
            .expect("writing to a String cannot fail");
        out
    }

    /// Returns an adapter that implements `Display` with the given verb and
    /// flags, so rendering can be embedded in `format!` and friends without an
    /// intermediate `String`.
    fn styled(&self, verb: Verb, flags: Flags) -> Styled<'_, Self> {
        Styled {
            value: self,
            verb,
            flags,
        }
    }
}

/// `Display` adapter returned by [`Render::styled`].
pub struct Styled<'a, T>
where
    T: ?Sized,
{
    value: &'a T,
    verb: Verb,
    flags: Flags,
}

impl<T> fmt::Display for Styled<'_, T>
where
    T: Render + ?Sized,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.value.render_to(f, self.verb, self.flags)
    }
}

impl<T> fmt::Debug for Styled<'_, T>
where
    T: Render + ?Sized,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Styled")
            .field("verb", &self.verb)
            .field("flags", &self.flags)
            .field("text", &self.value.render(self.verb, self.flags))
            .finish()
    }
}

//! Captured call stacks.

use std::fmt;
use std::ops::Deref;

use itertools::Itertools as _;

use crate::frame::Frame;
use crate::render::{Flags, Render, Verb};

/// An ordered list of [`Frame`]s, innermost (most recent call) first.
#[derive(Clone, Default, PartialEq, Eq, Hash)]
pub struct StackTrace {
    frames: Vec<Frame>,
}

impl StackTrace {
    /// Frames recorded per capture. Older frames beyond this are never
    /// captured.
    pub const MAX_DEPTH: usize = 32;

    /// Captures the stack of the calling function. The first frame is the
    /// caller of `capture`.
    #[inline(never)]
    #[must_use]
    pub fn capture() -> Self {
        callers(1)
    }

    /// Captures the stack of the calling function, additionally dropping
    /// `skip` frames above it.
    ///
    /// Helpers that capture on behalf of their own caller pass `1` to keep
    /// themselves out of the trace.
    #[inline(never)]
    #[must_use]
    pub fn capture_skipping(skip: usize) -> Self {
        callers(1 + skip)
    }

    #[must_use]
    pub fn new(frames: Vec<Frame>) -> Self {
        Self { frames }
    }

    #[must_use]
    pub fn frames(&self) -> &[Frame] {
        &self.frames
    }

    #[must_use]
    pub fn into_frames(self) -> Vec<Frame> {
        self.frames
    }

    fn format_slice(&self, out: &mut dyn fmt::Write, verb: Verb, flags: Flags) -> fmt::Result {
        write!(
            out,
            "[{}]",
            self.frames
                .iter()
                .map(|frame| frame.styled(verb, flags))
                .format(" ")
        )
    }
}

/// Frames examined while looking for the marker frame before giving up on
/// it.
const MARKER_SEARCH_DEPTH: usize = 16;

/// Records up to [`StackTrace::MAX_DEPTH`] frames, starting `skip` frames
/// above this function.
///
/// The frames of the unwinder itself are found by looking for this
/// function's own frame and discarding everything up to and including it.
/// If that frame does not show up within [`MARKER_SEARCH_DEPTH`] frames (some
/// platforms do not report function start addresses), the innermost frames
/// are kept as they are.
#[inline(never)]
pub(crate) fn callers(skip: usize) -> StackTrace {
    let mut collector = Collector::new(callers as fn(usize) -> StackTrace as usize, skip);
    backtrace::trace(|frame| collector.visit(frame.ip().addr(), frame.symbol_address().addr()));

    if !collector.found {
        log::trace!(
            "capture marker frame not found; keeping {} innermost frames",
            collector.frames.len()
        );
    }

    StackTrace {
        frames: collector.frames,
    }
}

/// The bookkeeping of [`callers`], fed one frame at a time, innermost first.
struct Collector {
    marker: usize,
    remaining_skip: usize,
    found: bool,
    visited: usize,
    frames: Vec<Frame>,
}

impl Collector {
    fn new(marker: usize, skip: usize) -> Self {
        Self {
            marker,
            remaining_skip: skip,
            found: false,
            visited: 0,
            frames: Vec::with_capacity(StackTrace::MAX_DEPTH),
        }
    }

    /// Takes the next frame. Returns whether the walk should go on.
    fn visit(&mut self, ip: usize, symbol_address: usize) -> bool {
        if !self.found {
            self.visited += 1;
            if symbol_address == self.marker {
                self.found = true;
                self.frames.clear();
                return true;
            }
            if self.frames.len() < StackTrace::MAX_DEPTH {
                self.frames.push(Frame::from_ip(ip));
            }
            return self.visited < MARKER_SEARCH_DEPTH;
        }

        if self.remaining_skip > 0 {
            self.remaining_skip -= 1;
            return true;
        }

        self.frames.push(Frame::from_ip(ip));
        self.frames.len() < StackTrace::MAX_DEPTH
    }
}

impl Deref for StackTrace {
    type Target = [Frame];

    fn deref(&self) -> &[Frame] {
        &self.frames
    }
}

impl From<Vec<Frame>> for StackTrace {
    fn from(frames: Vec<Frame>) -> Self {
        Self { frames }
    }
}

impl FromIterator<Frame> for StackTrace {
    fn from_iter<I: IntoIterator<Item = Frame>>(iter: I) -> Self {
        Self {
            frames: iter.into_iter().collect(),
        }
    }
}

impl<'a> IntoIterator for &'a StackTrace {
    type Item = &'a Frame;
    type IntoIter = std::slice::Iter<'a, Frame>;

    fn into_iter(self) -> Self::IntoIter {
        self.frames.iter()
    }
}

impl Render for StackTrace {
    fn render_to(&self, out: &mut dyn fmt::Write, verb: Verb, flags: Flags) -> fmt::Result {
        match verb {
            Verb::Value if flags.contains(Flags::PLUS) => {
                for frame in &self.frames {
                    frame.render_to(out, Verb::Value, Flags::PLUS)?;
                    out.write_char('\n')?;
                }
                Ok(())
            }
            Verb::Value if flags.contains(Flags::SHARP) => write!(out, "{self:?}"),
            Verb::Value | Verb::Short => self.format_slice(out, verb, flags),
            Verb::Line | Verb::Name | Verb::Quoted => Ok(()),
        }
    }
}

impl fmt::Display for StackTrace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let flags = Flags::from_alternate(f);
        self.render_to(f, Verb::Value, flags)
    }
}

impl fmt::Debug for StackTrace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(&self.frames).finish()
    }
}

#[cfg(feature = "serde")]
impl serde::Serialize for StackTrace {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.collect_seq(&self.frames)
    }
}

//! Single call-stack locations and their lazy resolution to source
//! locations.

use std::borrow::Cow;
use std::ffi::c_void;
use std::fmt;
use std::path::Path;

use crate::render::{Flags, Render, Verb};

const UNKNOWN: &str = "unknown";

/// One location in a captured call stack.
///
/// A frame only stores the return address it was captured at. The file,
/// line and function it belongs to are looked up every time they are asked
/// for, which keeps capturing cheap for errors that are never printed.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct Frame {
    ip: usize,
}

impl Frame {
    /// A frame that never resolves. Renders as `unknown`.
    pub const UNKNOWN: Frame = Frame { ip: 0 };

    #[must_use]
    pub const fn from_ip(ip: usize) -> Self {
        Self { ip }
    }

    /// The raw instruction address this frame was captured at.
    #[must_use]
    pub const fn ip(self) -> usize {
        self.ip
    }

    /// Resolves this frame to its source location.
    ///
    /// Frames that cannot be resolved (no debug info, a zero address, a
    /// foreign library without symbols) give [`FuncInfo::UNKNOWN`].
    #[must_use]
    pub fn func_info(self) -> FuncInfo {
        if self.ip == 0 {
            return FuncInfo::UNKNOWN;
        }

        let mut info = None;
        backtrace::resolve(std::ptr::without_provenance_mut::<c_void>(self.ip), |symbol| {
            // Inlined functions report several symbols for one address; the
            // first one is the innermost.
            if info.is_some() {
                return;
            }
            let Some(name) = symbol.name() else {
                return;
            };
            info = Some(FuncInfo {
                file: symbol.filename().map_or(Cow::Borrowed(UNKNOWN), |path| {
                    Cow::Owned(path.display().to_string())
                }),
                line: symbol.lineno().unwrap_or(0),
                function: Cow::Owned(format!("{name:#}")),
            });
        });
        info.unwrap_or(FuncInfo::UNKNOWN)
    }

    /// The single-line text form, `"<function> <file>:<line>"`, or
    /// `"unknown"` if the frame does not resolve.
    #[must_use]
    pub fn to_text(self) -> String {
        self.func_info().to_text()
    }
}

impl Render for Frame {
    fn render_to(&self, out: &mut dyn fmt::Write, verb: Verb, flags: Flags) -> fmt::Result {
        self.func_info().render_to(out, verb, flags)
    }
}

impl fmt::Display for Frame {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let flags = Flags::from_alternate(f);
        self.render_to(f, Verb::Value, flags)
    }
}

impl fmt::Debug for Frame {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.render_to(f, Verb::Value, Flags::empty())
    }
}

#[cfg(feature = "serde")]
impl serde::Serialize for Frame {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.to_text())
    }
}

/// The resolved source location of a [`Frame`].
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FuncInfo {
    /// Full path of the source file, as recorded in the debug info.
    pub file: Cow<'static, str>,
    pub line: u32,
    /// Fully qualified, demangled function name.
    pub function: Cow<'static, str>,
}

impl FuncInfo {
    pub const UNKNOWN: FuncInfo = FuncInfo {
        file: Cow::Borrowed(UNKNOWN),
        line: 0,
        function: Cow::Borrowed(UNKNOWN),
    };

    #[must_use]
    pub fn is_known(&self) -> bool {
        self.function != UNKNOWN
    }

    /// The last component of [`FuncInfo::file`].
    #[must_use]
    pub fn file_name(&self) -> &str {
        Path::new(&*self.file)
            .file_name()
            .and_then(|name| name.to_str())
            .unwrap_or(&self.file)
    }

    /// The function name with its module path stripped.
    ///
    /// See [`short_function_name`].
    #[must_use]
    pub fn short_function(&self) -> Cow<'_, str> {
        short_function_name(&self.function)
    }

    #[must_use]
    pub fn to_text(&self) -> String {
        if self.is_known() {
            format!("{} {}:{}", self.function, self.file, self.line)
        } else {
            UNKNOWN.to_string()
        }
    }
}

impl Render for FuncInfo {
    fn render_to(&self, out: &mut dyn fmt::Write, verb: Verb, flags: Flags) -> fmt::Result {
        match verb {
            Verb::Short if flags.contains(Flags::PLUS) => {
                if self.file == UNKNOWN {
                    out.write_str(UNKNOWN)
                } else {
                    write!(out, "{}\n\t{}", self.function, self.file)
                }
            }
            Verb::Short => out.write_str(self.file_name()),
            Verb::Line => write!(out, "{}", self.line),
            Verb::Name => out.write_str(&self.short_function()),
            Verb::Value => {
                self.render_to(out, Verb::Short, flags)?;
                out.write_char(':')?;
                self.render_to(out, Verb::Line, flags)
            }
            Verb::Quoted => Ok(()),
        }
    }
}

/// Strips the module path from a demangled function name.
///
/// Type qualifiers, `impl` headers and closure suffixes are kept, so a method
/// reports as `Conn::read` and a trait method as `<Conn as Read>::read`.
/// Paths inside an `impl` header are shortened to their last segment.
#[must_use]
pub fn short_function_name(name: &str) -> Cow<'_, str> {
    let segments = split_top_level(name, "::");

    let mut start = segments.len() - 1;
    while start > 0 && segments[start].starts_with('{') {
        start -= 1;
    }
    while start > 0 && is_type_segment(segments[start - 1]) {
        start -= 1;
    }

    let kept = &segments[start..];
    if kept.iter().all(|segment| !segment.starts_with('<')) {
        let begin = kept[0].as_ptr().addr() - name.as_ptr().addr();
        return Cow::Borrowed(&name[begin..]);
    }

    let mut out = String::with_capacity(name.len());
    for (i, segment) in kept.iter().enumerate() {
        if i > 0 {
            out.push_str("::");
        }
        out.push_str(&shorten_impl_header(segment));
    }
    Cow::Owned(out)
}

fn is_type_segment(segment: &str) -> bool {
    segment
        .chars()
        .next()
        .is_some_and(|c| c.is_uppercase() || c == '<' || c == '{')
}

/// Shortens the paths inside `<path::Type as path::Trait>` or `<path::Type>`.
fn shorten_impl_header(segment: &str) -> Cow<'_, str> {
    let Some(inner) = segment
        .strip_prefix('<')
        .and_then(|rest| rest.strip_suffix('>'))
    else {
        return Cow::Borrowed(segment);
    };

    let mut out = String::with_capacity(segment.len());
    out.push('<');
    match split_top_level(inner, " as ").as_slice() {
        [ty] => out.push_str(last_segment(ty)),
        [ty, tr] => {
            out.push_str(last_segment(ty));
            out.push_str(" as ");
            out.push_str(last_segment(tr));
        }
        _ => out.push_str(inner),
    }
    out.push('>');
    Cow::Owned(out)
}

fn last_segment(path: &str) -> &str {
    split_top_level(path, "::").last().copied().unwrap_or(path)
}

/// Splits `s` on `sep`, ignoring separators nested inside brackets.
///
/// `sep` must be ASCII. Always returns at least one (possibly empty) part.
fn split_top_level<'a>(s: &'a str, sep: &str) -> Vec<&'a str> {
    let mut parts = Vec::new();
    let mut depth = 0usize;
    let mut start = 0;
    let mut prev = '\0';
    let mut chars = s.char_indices();
    while let Some((i, c)) = chars.next() {
        match c {
            '<' | '(' | '[' => depth += 1,
            // The arrow of a function type, not a closing bracket.
            '>' if prev == '-' => {}
            '>' | ')' | ']' => depth = depth.saturating_sub(1),
            _ if depth == 0 && s[i..].starts_with(sep) => {
                parts.push(&s[start..i]);
                start = i + sep.len();
                if sep.len() > 1 {
                    chars.nth(sep.len() - 2);
                }
                prev = '\0';
                continue;
            }
            _ => {}
        }
        prev = c;
    }
    parts.push(&s[start..]);
    parts
}

#[cfg(test)]
mod tests {
    use super::*;

    fn server_read() -> FuncInfo {
        FuncInfo {
            file: Cow::Borrowed("/src/app/server.rs"),
            line: 42,
            function: Cow::Borrowed("app::server::Conn::read"),
        }
    }

    #[test]
    fn test_short_function_name() {
        let cases = [
            ("", ""),
            ("main", "main"),
            ("std::rt::lang_start", "lang_start"),
            ("errstack::frame::short_function_name", "short_function_name"),
            ("std::io::copy::generic_copy", "generic_copy"),
            ("app::R::write", "R::write"),
            ("<app::R as std::io::Write>::write", "<R as Write>::write"),
            ("<alloc::vec::Vec<u8>>::push", "<Vec<u8>>::push"),
            ("app::run::{{closure}}", "run::{{closure}}"),
            ("app::Conn::read::{{closure}}", "Conn::read::{{closure}}"),
            (
                "core::ops::function::FnOnce::call_once",
                "FnOnce::call_once",
            ),
            (
                "<fn() -> u8 as app::Thunk>::call",
                "<fn() -> u8 as Thunk>::call",
            ),
        ];
        for (name, want) in cases {
            assert_eq!(short_function_name(name), want, "shortening {name:?}");
        }
    }

    #[test]
    fn test_short_function_name_borrows_without_impl_header() {
        assert!(matches!(
            short_function_name("app::server::Conn::read"),
            Cow::Borrowed("Conn::read")
        ));
    }

    #[test]
    fn test_split_top_level_respects_brackets() {
        assert_eq!(
            split_top_level("a::<b::c as d::e>::f", "::"),
            vec!["a", "<b::c as d::e>", "f"]
        );
        assert_eq!(split_top_level("", "::"), vec![""]);
        assert_eq!(split_top_level("x as y", " as "), vec!["x", "y"]);
    }

    #[test]
    fn test_func_info_verbs() {
        let info = server_read();
        assert_eq!(info.render(Verb::Short, Flags::empty()), "server.rs");
        assert_eq!(
            info.render(Verb::Short, Flags::PLUS),
            "app::server::Conn::read\n\t/src/app/server.rs"
        );
        assert_eq!(info.render(Verb::Line, Flags::empty()), "42");
        assert_eq!(info.render(Verb::Name, Flags::empty()), "Conn::read");
        assert_eq!(info.render(Verb::Value, Flags::empty()), "server.rs:42");
        assert_eq!(
            info.render(Verb::Value, Flags::PLUS),
            "app::server::Conn::read\n\t/src/app/server.rs:42"
        );
        assert_eq!(info.render(Verb::Quoted, Flags::empty()), "");
    }

    #[test]
    fn test_func_info_text() {
        assert_eq!(
            server_read().to_text(),
            "app::server::Conn::read /src/app/server.rs:42"
        );
        assert_eq!(FuncInfo::UNKNOWN.to_text(), "unknown");
    }

    #[test]
    fn test_unknown_frame() {
        let frame = Frame::UNKNOWN;
        assert_eq!(frame.func_info(), FuncInfo::UNKNOWN);
        assert!(!frame.func_info().is_known());
        assert_eq!(frame.render(Verb::Short, Flags::empty()), "unknown");
        assert_eq!(frame.render(Verb::Short, Flags::PLUS), "unknown");
        assert_eq!(frame.render(Verb::Line, Flags::empty()), "0");
        assert_eq!(frame.render(Verb::Name, Flags::empty()), "unknown");
        assert_eq!(frame.render(Verb::Value, Flags::empty()), "unknown:0");
        assert_eq!(frame.render(Verb::Value, Flags::PLUS), "unknown:0");
        assert_eq!(format!("{frame}"), "unknown:0");
        assert_eq!(format!("{frame:#}"), "unknown:0");
        assert_eq!(format!("{frame:?}"), "unknown:0");
        assert_eq!(frame.to_text(), "unknown");
    }

    #[test]
    fn test_frame_from_ip_roundtrips_address() {
        assert_eq!(Frame::from_ip(0x1234).ip(), 0x1234);
        assert_eq!(Frame::from_ip(0), Frame::UNKNOWN);
    }

    #[cfg(feature = "serde")]
    #[test]
    fn test_unknown_frame_serializes_as_sentinel() {
        assert_eq!(
            serde_json::to_string(&Frame::UNKNOWN).unwrap(),
            r#""unknown""#
        );
    }
}

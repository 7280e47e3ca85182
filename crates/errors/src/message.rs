use std::borrow::Cow;
use std::fmt;

/// Conversion into an error message.
///
/// Implemented for the usual string types and for `fmt::Arguments`, which is
/// what the formatting macros of this crate pass along.
pub trait IntoMessage {
    fn into_message(self) -> Cow<'static, str>;
}

impl IntoMessage for String {
    fn into_message(self) -> Cow<'static, str> {
        Cow::Owned(self)
    }
}

impl IntoMessage for &str {
    fn into_message(self) -> Cow<'static, str> {
        Cow::Owned(self.to_owned())
    }
}

impl IntoMessage for &String {
    fn into_message(self) -> Cow<'static, str> {
        Cow::Owned(self.clone())
    }
}

impl IntoMessage for Cow<'static, str> {
    fn into_message(self) -> Cow<'static, str> {
        self
    }
}

impl IntoMessage for fmt::Arguments<'_> {
    fn into_message(self) -> Cow<'static, str> {
        if let Some(static_str) = self.as_str() {
            Cow::Borrowed(static_str)
        } else {
            Cow::Owned(self.to_string())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_literal_arguments_are_borrowed() {
        assert!(matches!(
            format_args!("plain").into_message(),
            Cow::Borrowed("plain")
        ));
    }

    #[test]
    fn test_formatted_arguments_are_owned() {
        let n = 2;
        let message = format_args!("error{n}").into_message();
        assert!(matches!(message, Cow::Owned(_)));
        assert_eq!(message, "error2");
    }

    #[test]
    fn test_string_types() {
        assert_eq!("a".into_message(), "a");
        assert_eq!(String::from("b").into_message(), "b");
        assert_eq!((&String::from("c")).into_message(), "c");
        assert_eq!(Cow::Borrowed("d").into_message(), "d");
    }
}

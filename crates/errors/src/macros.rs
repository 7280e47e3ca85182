/// Creates an [`Error`](crate::Error) with a formatted message and the
/// stack of the caller.
///
/// ```
/// let err = errstack::errorf!("bad record {}", 4);
/// assert_eq!(err.to_string(), "bad record 4");
/// ```
#[macro_export]
macro_rules! errorf {
    ($($arg:tt)+) => {
        $crate::new(::std::format_args!($($arg)+))
    };
}

/// [`wrap`](crate::wrap) with a formatted message.
#[macro_export]
macro_rules! wrapf {
    ($err:expr, $($arg:tt)+) => {
        $crate::wrap($err, ::std::format_args!($($arg)+))
    };
}

/// [`with_message`](crate::with_message) with a formatted message.
#[macro_export]
macro_rules! with_messagef {
    ($err:expr, $($arg:tt)+) => {
        $crate::with_message($err, ::std::format_args!($($arg)+))
    };
}

/// Returns early with an error.
///
/// With a format string, the error is a new [`Error`](crate::Error). With an
/// error expression, that error is annotated with the stack of the caller,
/// and prefixed with a message if a format string follows it.
#[macro_export]
macro_rules! bail {
    ($fmt:literal $(, $args:expr)* $(,)?) => {
        return ::std::result::Result::Err($crate::errorf!($fmt $(, $args)*).into())
    };
    ($err:expr $(,)?) => {
        return ::std::result::Result::Err($crate::with_stack($err).into())
    };
    ($err:expr, $fmt:literal $(, $args:expr)* $(,)?) => {
        return ::std::result::Result::Err($crate::wrapf!($err, $fmt $(, $args)*).into())
    };
}

/// Returns early with an error if a condition does not hold. Takes the same
/// error arguments as [`bail!`].
#[macro_export]
macro_rules! ensure {
    ($cond:expr, $($bail_tt:tt)+) => {
        if !$cond {
            $crate::bail!($($bail_tt)+);
        }
    };
}

/// A fixed error value that callers compare against, such as "not found".
///
/// Sentinels are usually declared as constants and matched with
/// [`Rule::value`](crate::Rule::value) or by comparing after a downcast.
/// Two sentinels are equal when their messages are.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, thiserror::Error)]
#[error("{message}")]
pub struct Sentinel {
    message: &'static str,
}

impl Sentinel {
    #[must_use]
    pub const fn new(message: &'static str) -> Self {
        Self { message }
    }

    #[must_use]
    pub const fn message(&self) -> &'static str {
        self.message
    }
}

use std::error::Error;
use std::fmt;

/// Error returned by [`Channel::send`](crate::Channel::send) on a closed
/// channel. Carries the undelivered value back to the caller.
pub struct SendError<T>(
    /// The value that could not be sent.
    pub T,
);

impl<T> SendError<T> {
    /// Consumes the error, returning the value that could not be sent.
    pub fn into_inner(self) -> T {
        self.0
    }
}

impl<T> fmt::Debug for SendError<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("SendError(..)")
    }
}

impl<T> fmt::Display for SendError<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "send on a closed channel")
    }
}

impl<T> Error for SendError<T> {}

/// Errors surfaced by [`Select::select`](crate::Select::select) and
/// [`Select::try_select`](crate::Select::try_select).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SelectError {
    /// Every operation is cleared or unarmed; blocking would never return.
    AllCleared,
}

impl fmt::Display for SelectError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SelectError::AllCleared => write!(f, "select has no active operations"),
        }
    }
}

impl Error for SelectError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn send_error_returns_the_value() {
        let err = SendError(41);
        assert_eq!(err.into_inner(), 41);
    }

    #[test]
    fn display_messages() {
        assert_eq!(
            SendError(()).to_string(),
            "send on a closed channel"
        );
        assert_eq!(
            SelectError::AllCleared.to_string(),
            "select has no active operations"
        );
    }
}

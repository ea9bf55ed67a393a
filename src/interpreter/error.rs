use std::fmt;

/// Errors raised during evaluation. All of these are fatal to the running
/// script; there is no user-level exception handling.
#[derive(Debug, Clone, PartialEq)]
pub enum RuntimeError {
    /// Read or write of an identifier with no binding anywhere in scope.
    Reference(String),
    /// Operation applied to a value of the wrong kind, such as calling a
    /// number or assigning a member on a primitive.
    Type(String),
    /// The call-depth cap was exceeded.
    StackOverflow,
}

impl std::error::Error for RuntimeError {}

impl fmt::Display for RuntimeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RuntimeError::Reference(message) => write!(f, "ReferenceError: {message}"),
            RuntimeError::Type(message) => write!(f, "TypeError: {message}"),
            RuntimeError::StackOverflow => write!(f, "stack overflow: call depth limit exceeded"),
        }
    }
}

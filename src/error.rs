/// Errors raised while turning a query string into a runnable tree.
///
/// Both kinds are detected before any evaluation starts; once
/// [`evaluate`](crate::evaluate) has returned a stream, producing results
/// never fails.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum QueryError {
    /// Malformed token stream: unterminated string, unexpected token,
    /// unbalanced parentheses.
    #[error("syntax error: {0}")]
    Syntax(String),

    /// Operands of the wrong kind, e.g. a non-numeric comparison bound.
    #[error("type error: {0}")]
    Type(String),
}

impl QueryError {
    pub(crate) fn syntax(msg: impl Into<String>) -> Self {
        QueryError::Syntax(msg.into())
    }

    pub(crate) fn type_error(msg: impl Into<String>) -> Self {
        QueryError::Type(msg.into())
    }
}

pub type Result<T> = std::result::Result<T, QueryError>;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum AuditError {
    #[error("activity is blank")]
    MissingActivity,

    #[error("unknown variable '{0}'")]
    UnknownVariable(String),

    #[error("cannot evaluate '{expr}': {reason}")]
    Evaluation { expr: String, reason: String },

    #[error("cannot serialize audit value: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("audit backend rejected record: {code} - {message}")]
    Delivery { code: i32, message: String },

    #[error("Internal error: {0}")]
    InternalError(#[from] anyhow::Error),
}

impl AuditError {
    /// Evaluation failure for the given expression text.
    pub fn evaluation(expr: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Evaluation {
            expr: expr.into(),
            reason: reason.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, AuditError>;

use thiserror::Error;

#[derive(Debug, Clone, Error)]
pub enum DispatchError {
    #[error("handler for {kind} rejected message: {reason}")]
    Rejected { kind: String, reason: String },

    #[error("{0}")]
    Other(String),
}

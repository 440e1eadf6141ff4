/// Errors raised while writing or reading the JSON wire format
#[derive(Debug, thiserror::Error)]
pub enum CodecError {
    /// The document does not have the shape the caller asked for
    #[error("{message}\n{trace}")]
    Protocol { message: String, trace: String },
    /// A value does not fit the requested width or would lose precision
    #[error("size limit: {0}")]
    SizeLimit(String),
    #[error("not implemented: {0}")]
    NotImplemented(&'static str),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl CodecError {
    pub(crate) fn protocol(message: impl Into<String>, trace: impl Into<String>) -> Self {
        Self::Protocol {
            message: message.into(),
            trace: trace.into(),
        }
    }
}

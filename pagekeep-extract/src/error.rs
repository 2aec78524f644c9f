/// Failure of the readability stage. Never fatal to a request: the
/// orchestrator logs it and keeps the baseline fields.
#[derive(thiserror::Error, Debug)]
pub enum ExtractionError {
    #[error("readability engine failed: {0}")]
    Engine(String),

    #[error("readability engine panicked: {0}")]
    Panicked(String),
}

/// The normalizer could not produce a document from its input.
#[derive(thiserror::Error, Debug, PartialEq, Eq)]
pub enum MalformedInputError {
    #[error("input HTML is empty")]
    Empty,

    #[error("input HTML has no content left after lexical cleanup")]
    EmptyAfterCleanup,

    #[error("input looks like binary data, not HTML")]
    Binary,

    #[error("parsed document has no body")]
    MissingBody,
}

pub(crate) fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic payload".to_string()
    }
}

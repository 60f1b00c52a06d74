use thiserror::Error;

/// The sync core's error taxonomy. Variants map 1:1 onto the error kind
/// table: what triggers them and how the orchestrator disposes of them is
/// documented at each call site, not here.
#[derive(Error, Debug)]
pub enum AirweaveError {
    #[error("not found: {0}")]
    NotFound(String),

    #[error("permission denied: {0}")]
    PermissionDenied(String),

    #[error("cannot modify immutable field: {field}")]
    ImmutableField { field: String },

    #[error("token refresh failed: {0}")]
    TokenRefresh(String),

    #[error("transient upstream error: {0}")]
    TransientUpstream(String),

    #[error("bad data for entity {entity_id}: {message}")]
    PerItemBadData { entity_id: String, message: String },

    #[error("cancelled: {0}")]
    Cancelled(String),

    #[error("usage limit exceeded: {0}")]
    UsageExceeded(String),

    #[error("payment required: {0}")]
    PaymentRequired(String),

    #[error("configuration error: {0}")]
    Config(String),

    #[error(transparent)]
    Anyhow(#[from] anyhow::Error),
}

impl AirweaveError {
    /// True for errors spec §7 classifies as transient and worth retrying.
    pub fn is_transient(&self) -> bool {
        matches!(self, AirweaveError::TransientUpstream(_))
    }
}

/// Walk an error's cause chain and return the deepest message that carries
/// text, stripping known wrapper prefixes a durable-workflow runtime tends
/// to add (e.g. `"ApplicationError: "`). Falls back to the error's own
/// `Display` output if the chain bottoms out immediately.
pub fn root_cause(err: &(dyn std::error::Error + 'static)) -> String {
    const KNOWN_PREFIXES: &[&str] = &["ApplicationError: ", "TerminalError: ", "HandlerError: "];

    let mut deepest = err;
    while let Some(source) = deepest.source() {
        deepest = source;
    }

    let mut message = deepest.to_string();
    for prefix in KNOWN_PREFIXES {
        if let Some(stripped) = message.strip_prefix(prefix) {
            message = stripped.to_string();
            break;
        }
    }
    message
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, thiserror::Error)]
    #[error("outer failure")]
    struct Outer {
        #[source]
        inner: Inner,
    }

    #[derive(Debug, thiserror::Error)]
    #[error("ApplicationError: inner failure detail")]
    struct Inner;

    #[test]
    fn root_cause_walks_to_deepest_source_and_strips_prefix() {
        let err = Outer { inner: Inner };
        assert_eq!(root_cause(&err), "inner failure detail");
    }

    #[test]
    fn root_cause_falls_back_to_display_with_no_source() {
        let err = AirweaveError::NotFound("sync 123".into());
        assert_eq!(root_cause(&err), "not found: sync 123");
    }
}

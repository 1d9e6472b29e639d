/// Convenience result type used across scorereel.
pub type ReelResult<T> = Result<T, ReelError>;

/// Top-level error taxonomy used by the installation APIs.
#[derive(thiserror::Error, Debug)]
pub enum ReelError {
    /// Invalid user-provided settings or arguments.
    #[error("validation error: {0}")]
    Validation(String),

    /// Failures while probing, loading or decoding video.
    #[error("media error: {0}")]
    Media(String),

    /// Malformed recording data.
    #[error("parse error: {0}")]
    Parse(String),

    /// Failures while preparing fonts, images or surfaces for drawing.
    #[error("render error: {0}")]
    Render(String),

    /// Wrapped lower-level error from dependencies or IO.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl ReelError {
    /// Build a [`ReelError::Validation`] value.
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    /// Build a [`ReelError::Media`] value.
    pub fn media(msg: impl Into<String>) -> Self {
        Self::Media(msg.into())
    }

    /// Build a [`ReelError::Parse`] value.
    pub fn parse(msg: impl Into<String>) -> Self {
        Self::Parse(msg.into())
    }

    /// Build a [`ReelError::Render`] value.
    pub fn render(msg: impl Into<String>) -> Self {
        Self::Render(msg.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_prefixes_are_stable() {
        assert!(
            ReelError::validation("x")
                .to_string()
                .contains("validation error:")
        );
        assert!(ReelError::media("x").to_string().contains("media error:"));
        assert!(ReelError::parse("x").to_string().contains("parse error:"));
        assert!(ReelError::render("x").to_string().contains("render error:"));
    }

    #[test]
    fn other_preserves_source() {
        let base = std::io::Error::other("boom");
        let err = ReelError::Other(anyhow::Error::new(base));
        assert!(err.to_string().contains("boom"));
    }
}

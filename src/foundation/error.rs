/// Crate-wide result alias.
pub type GlyphResult<T> = Result<T, GlyphError>;

/// Every failure a decode session can end with.
///
/// All variants are fatal for the session that produced them; the pipeline never swallows one
/// mid-stream.
#[derive(thiserror::Error, Debug)]
pub enum GlyphError {
    /// A fixed-length field, sentinel byte or block introducer had an unexpected value.
    #[error("malformed container: {0}")]
    MalformedContainer(String),

    /// The LZW stream referenced a code that is neither defined nor derivable.
    #[error("corrupt compressed stream: {0}")]
    CorruptCompressedStream(String),

    /// The byte source failed or disconnected mid-stream.
    #[error("transport error: {0}")]
    Transport(String),

    /// A reassembled fixed-size unit grew past its declared size.
    #[error("overrun: {0}")]
    Overrun(String),

    /// A per-frame metadata queue was drained more often than it was filled.
    #[error("metadata queue desync: {0}")]
    Desync(String),

    /// Invalid options or arguments.
    #[error("validation error: {0}")]
    Validation(String),

    /// I/O, encoding or other failures carried with context.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl GlyphError {
    /// Build a [`GlyphError::MalformedContainer`] value.
    pub fn malformed(msg: impl Into<String>) -> Self {
        Self::MalformedContainer(msg.into())
    }

    /// Build a [`GlyphError::CorruptCompressedStream`] value.
    pub fn corrupt(msg: impl Into<String>) -> Self {
        Self::CorruptCompressedStream(msg.into())
    }

    /// Build a [`GlyphError::Transport`] value.
    pub fn transport(msg: impl Into<String>) -> Self {
        Self::Transport(msg.into())
    }

    /// Build a [`GlyphError::Overrun`] value.
    pub fn overrun(msg: impl Into<String>) -> Self {
        Self::Overrun(msg.into())
    }

    /// Build a [`GlyphError::Desync`] value.
    pub fn desync(msg: impl Into<String>) -> Self {
        Self::Desync(msg.into())
    }

    /// Build a [`GlyphError::Validation`] value.
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_prefixes_are_stable() {
        assert!(
            GlyphError::malformed("x")
                .to_string()
                .contains("malformed container:")
        );
        assert!(
            GlyphError::corrupt("x")
                .to_string()
                .contains("corrupt compressed stream:")
        );
        assert!(
            GlyphError::transport("x")
                .to_string()
                .contains("transport error:")
        );
        assert!(GlyphError::overrun("x").to_string().contains("overrun:"));
        assert!(
            GlyphError::desync("x")
                .to_string()
                .contains("metadata queue desync:")
        );
        assert!(
            GlyphError::validation("x")
                .to_string()
                .contains("validation error:")
        );
    }

    #[test]
    fn other_preserves_source() {
        let base = std::io::Error::other("boom");
        let err = GlyphError::Other(anyhow::Error::new(base));
        assert!(err.to_string().contains("boom"));
    }
}

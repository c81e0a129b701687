pub type PlotResult<T> = Result<T, PlotError>;

#[derive(thiserror::Error, Debug)]
pub enum PlotError {
    #[error("not found: {0}")]
    NotFound(String),

    #[error("validation error: {0}")]
    Validation(String),

    #[error("external process error: {0}")]
    Process(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl PlotError {
    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::NotFound(msg.into())
    }

    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn process(msg: impl Into<String>) -> Self {
        Self::Process(msg.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_prefixes_are_stable() {
        assert!(
            PlotError::not_found("frame 7")
                .to_string()
                .contains("not found:")
        );
        assert!(
            PlotError::validation("x")
                .to_string()
                .contains("validation error:")
        );
        assert!(
            PlotError::process("x")
                .to_string()
                .contains("external process error:")
        );
    }

    #[test]
    fn other_preserves_source() {
        let base = std::io::Error::other("boom");
        let err = PlotError::Other(anyhow::Error::new(base));
        assert!(err.to_string().contains("boom"));
    }
}

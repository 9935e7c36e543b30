pub type AsmvizResult<T> = Result<T, AsmvizError>;

#[derive(thiserror::Error, Debug)]
pub enum AsmvizError {
    #[error("unknown animation: {0}")]
    UnknownAnimation(String),

    #[error("config error: {0}")]
    Config(String),

    #[error("scene consistency error: {0}")]
    SceneConsistency(String),

    #[error("render engine error: {0}")]
    RenderEngine(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl AsmvizError {
    pub fn unknown_animation(msg: impl Into<String>) -> Self {
        Self::UnknownAnimation(msg.into())
    }

    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    pub fn scene(msg: impl Into<String>) -> Self {
        Self::SceneConsistency(msg.into())
    }

    pub fn engine(msg: impl Into<String>) -> Self {
        Self::RenderEngine(msg.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_prefixes_are_stable() {
        assert!(
            AsmvizError::unknown_animation("x")
                .to_string()
                .contains("unknown animation:")
        );
        assert!(
            AsmvizError::config("x")
                .to_string()
                .contains("config error:")
        );
        assert!(
            AsmvizError::scene("x")
                .to_string()
                .contains("scene consistency error:")
        );
        assert!(
            AsmvizError::engine("x")
                .to_string()
                .contains("render engine error:")
        );
    }

    #[test]
    fn other_preserves_source() {
        let base = std::io::Error::other("boom");
        let err = AsmvizError::Other(anyhow::Error::new(base));
        assert!(err.to_string().contains("boom"));
    }
}

use crate::model::LayoutUpdatePattern;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// `do_layout` was called with a pattern the manager reports as unsupported.
    #[error("layout update pattern {pattern:?} is not supported by this layout manager")]
    UnsupportedPattern { pattern: LayoutUpdatePattern },

    #[error(transparent)]
    Algorithm(#[from] depmap_hierarchic::Error),

    #[error("invalid layout configuration: {0}")]
    InvalidConfig(#[from] serde_json::Error),
}

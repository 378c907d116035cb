/// Nothing of the requested shape is in the variant right now.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, thiserror::Error)]
pub enum AccessError {
    /// A different alternative is live.
    #[error("variant holds alternative {found}, not alternative {expected}")]
    WrongAlternative { expected: usize, found: usize },
    /// No alternative is live.
    #[error("variant holds no alternative")]
    Empty,
}

use thiserror::Error;

pub type Result<T> = std::result::Result<T, PopupError>;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum PopupError {
    #[error("placement mode {0} is out of range (0..=14)")]
    PlacementOutOfRange(u8),

    #[error("unknown placement mode `{0}`")]
    UnknownPlacement(String),

    #[error("{which} flags contain opposite edges: {bits:#06b}")]
    OppositeEdges { which: &'static str, bits: u8 },

    #[error("target visual is not attached to a visual root")]
    NotAttachedToVisualRoot,

    #[error("popup host is not an ancestor of the target visual")]
    HostNotInChain,

    #[error("pointer placement requested with no known pointer position")]
    MissingPointerPosition,

    #[error("visual id does not belong to this tree")]
    UnknownVisual,
}

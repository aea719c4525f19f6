use thiserror::Error;

use crate::types::Rect;

/// The one condition that aborts a whole optimization run.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum OptimizeError {
    #[error(
        "E-CUT-001 piece too large: {piece_id} ({size}) does not fit sheet {sheet} of material {material_id}"
    )]
    PieceTooLarge {
        material_id: String,
        piece_id: String,
        size: Rect,
        sheet: Rect,
    },
}

/// Failures while loading the inputs of a run.
#[derive(Debug, Error)]
pub enum InputError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid JSON in {path}: {source}")]
    Json {
        path: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("piece list is missing required column '{0}'")]
    MissingColumn(&'static str),

    #[error("piece list is empty")]
    Empty,
}

use thiserror::Error;
use uuid::Uuid;

/// Crate-wide error type.
///
/// The controller deliberately keeps most of these out of its return
/// values: a sort or filter rule pointing at a vanished column degrades to
/// a logged no-op, and a failed save is remembered rather than raised, so
/// the rendered grid never lags behind the in-memory table.
#[derive(Error, Debug)]
pub enum GridError {
    /// The persisted document is not a valid table (missing `columns` or
    /// `rows` arrays even after migration). Fatal for that document only.
    #[error("Not a table document: {0}")]
    Structure(String),

    #[error("Store error: {0}")]
    Store(String),

    #[error("IO error: {0}")]
    Io(std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(serde_json::Error),

    #[error("No row with id {0}")]
    RowNotFound(Uuid),

    #[error("No column with id '{0}'")]
    ColumnNotFound(String),

    /// A document with the requested name already exists. Surfaced to the
    /// host so its rename input can revert to the prior name.
    #[error("A document named '{0}' already exists")]
    RenameConflict(String),
}

pub type Result<T> = std::result::Result<T, GridError>;

/// Errors the storage layer reports in a form callers can match on.
///
/// Store methods return `anyhow::Result`; the variants below travel inside
/// that error and are recovered with `downcast_ref` where the caller needs to
/// tell a conflict apart from a database failure.
///
/// # Examples
///
/// ```rust
/// use veggiescan_storage::error::StorageError;
///
/// let err = StorageError::Conflict {
///     entity: "user",
///     key: "alice@example.com".to_string(),
/// };
/// assert!(err.to_string().contains("alice@example.com"));
/// ```
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    /// A unique column already holds this value.
    #[error("Storage: {entity} already exists ({key})")]
    Conflict { entity: &'static str, key: String },

    /// An underlying SeaORM error.
    #[error("Storage: database error: {0}")]
    Db(#[from] sea_orm::DbErr),
}

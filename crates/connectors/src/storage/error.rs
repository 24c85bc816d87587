use model::core::identifiers::StorageKey;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StorageError {
    /// Worth retrying with the same key and bytes.
    #[error("Transient storage failure for '{key}': {message}")]
    Transient { key: StorageKey, message: String },

    /// Retrying cannot succeed.
    #[error("Permanent storage failure for '{key}': {message}")]
    Permanent { key: StorageKey, message: String },
}

impl StorageError {
    pub fn transient(key: &StorageKey, message: impl Into<String>) -> Self {
        StorageError::Transient {
            key: key.clone(),
            message: message.into(),
        }
    }

    pub fn permanent(key: &StorageKey, message: impl Into<String>) -> Self {
        StorageError::Permanent {
            key: key.clone(),
            message: message.into(),
        }
    }

    pub fn key(&self) -> &StorageKey {
        match self {
            StorageError::Transient { key, .. } | StorageError::Permanent { key, .. } => key,
        }
    }

    pub fn is_transient(&self) -> bool {
        matches!(self, StorageError::Transient { .. })
    }
}

use serde::{Deserialize, Serialize};
use std::{fmt, sync::Arc};

/// Forward-slash delimited path of an artifact in the object store.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct StorageKey(Arc<str>);

impl StorageKey {
    pub fn new(key: impl Into<String>) -> Self {
        Self(Arc::from(key.into()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn extension(&self) -> Option<&str> {
        let file = self.0.rsplit('/').next()?;
        file.split_once('.').map(|(_, ext)| ext)
    }
}

impl fmt::Display for StorageKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<String> for StorageKey {
    fn from(s: String) -> Self {
        Self::new(s)
    }
}

impl From<&str> for StorageKey {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

impl AsRef<str> for StorageKey {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

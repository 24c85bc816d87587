use super::{StorageError, StorageSink};
use crate::error::ConnectorError;
use async_trait::async_trait;
use bytes::Bytes;
use engine_config::settings::provider::{CloudProviderSettings, ProviderKind};
use model::core::identifiers::StorageKey;
use object_store::{
    ObjectStore, PutPayload, aws::AmazonS3Builder, local::LocalFileSystem, memory::InMemory,
    path::Path as ObjectPath,
};
use std::{sync::Arc, time::Duration};
use tracing::{debug, info};

/// [`StorageSink`] backed by any `object_store` implementation.
#[derive(Debug, Clone)]
pub struct ObjectStorageSink {
    store: Arc<dyn ObjectStore>,
    timeout: Duration,
    location: String,
}

impl ObjectStorageSink {
    pub fn new(store: Arc<dyn ObjectStore>, timeout: Duration, location: impl Into<String>) -> Self {
        Self {
            store,
            timeout,
            location: location.into(),
        }
    }

    pub fn in_memory() -> Self {
        Self::new(Arc::new(InMemory::new()), Duration::from_secs(60), "memory://")
    }

    pub fn from_settings(settings: &CloudProviderSettings) -> Result<Self, ConnectorError> {
        let timeout = Duration::from_secs(settings.timeout_secs);

        let sink = match settings.cloud_provider_type {
            ProviderKind::Aws => {
                let aws = settings
                    .aws
                    .as_ref()
                    .ok_or_else(|| ConnectorError::Config("missing 'aws' settings".into()))?;

                let mut builder = AmazonS3Builder::from_env().with_bucket_name(&aws.bucket);
                if let Some(region) = &aws.region {
                    builder = builder.with_region(region);
                }
                if let Some(endpoint) = &aws.endpoint {
                    builder = builder.with_endpoint(endpoint);
                }
                if let (Some(key), Some(secret)) = (&aws.access_key_id, &aws.secret_access_key) {
                    builder = builder
                        .with_access_key_id(key)
                        .with_secret_access_key(secret);
                }
                if let Some(token) = &aws.session_token {
                    builder = builder.with_token(token);
                }
                if aws.allow_http {
                    builder = builder.with_allow_http(true);
                }

                let store = builder.build().map_err(|e| {
                    ConnectorError::Config(format!("failed to create S3 client: {e}"))
                })?;
                Self::new(Arc::new(store), timeout, format!("s3://{}", aws.bucket))
            }
            ProviderKind::Local => {
                let local = settings
                    .local
                    .as_ref()
                    .ok_or_else(|| ConnectorError::Config("missing 'local' settings".into()))?;

                std::fs::create_dir_all(&local.root)?;
                let store = LocalFileSystem::new_with_prefix(&local.root).map_err(|e| {
                    ConnectorError::Config(format!(
                        "failed to open local store at '{}': {e}",
                        local.root
                    ))
                })?;
                Self::new(Arc::new(store), timeout, format!("file://{}", local.root))
            }
            ProviderKind::Memory => Self::new(Arc::new(InMemory::new()), timeout, "memory://"),
        };

        info!(location = %sink.location, "Object storage ready");
        Ok(sink)
    }

    pub fn store(&self) -> Arc<dyn ObjectStore> {
        self.store.clone()
    }
}

#[async_trait]
impl StorageSink for ObjectStorageSink {
    async fn persist(&self, key: &StorageKey, body: Bytes) -> Result<(), StorageError> {
        let path = ObjectPath::parse(key.as_str())
            .map_err(|e| StorageError::permanent(key, format!("invalid key: {e}")))?;
        let size = body.len();

        match tokio::time::timeout(self.timeout, self.store.put(&path, PutPayload::from(body))).await
        {
            Ok(Ok(_)) => {
                debug!(key = %key, bytes = size, location = %self.location, "Artifact stored");
                Ok(())
            }
            Ok(Err(err)) => Err(classify_object_store_error(key, err)),
            Err(_) => Err(StorageError::transient(
                key,
                format!("no response within {}s", self.timeout.as_secs_f64()),
            )),
        }
    }

    fn describe(&self) -> String {
        self.location.clone()
    }
}

/// Splits client errors into the ones worth retrying and the ones that are not.
pub fn classify_object_store_error(key: &StorageKey, err: object_store::Error) -> StorageError {
    use object_store::Error;

    match err {
        // a put only misses when the bucket itself is gone
        Error::NotFound { .. }
        | Error::InvalidPath { .. }
        | Error::NotSupported { .. }
        | Error::NotImplemented { .. }
        | Error::PermissionDenied { .. }
        | Error::Unauthenticated { .. }
        | Error::UnknownConfigurationKey { .. }
        | Error::AlreadyExists { .. }
        | Error::Precondition { .. } => StorageError::permanent(key, err.to_string()),
        // network, throttling and server-side failures
        other => StorageError::transient(key, other.to_string()),
    }
}

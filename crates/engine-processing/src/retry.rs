use connectors::storage::StorageError;
use engine_core::{error::BatchError, retry::RetryDisposition};

pub fn classify_storage_error(err: &StorageError) -> RetryDisposition {
    match err {
        StorageError::Transient { .. } => RetryDisposition::Retry,
        StorageError::Permanent { .. } => RetryDisposition::Stop,
    }
}

pub fn classify_batch_error(err: &BatchError) -> RetryDisposition {
    match err {
        BatchError::Storage(storage_err) => classify_storage_error(storage_err),
        BatchError::Format { .. } => RetryDisposition::Stop,
        BatchError::DrainPending { .. } | BatchError::Rejected { .. } => RetryDisposition::Stop,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use model::core::identifiers::StorageKey;

    #[test]
    fn test_only_transient_storage_errors_retry() {
        let key = StorageKey::from("k");
        assert_eq!(
            classify_batch_error(&BatchError::Storage(StorageError::transient(&key, "503"))),
            RetryDisposition::Retry
        );
        assert_eq!(
            classify_batch_error(&BatchError::Storage(StorageError::permanent(&key, "403"))),
            RetryDisposition::Stop
        );
        assert_eq!(
            classify_batch_error(&BatchError::DrainPending { stream: "s".into() }),
            RetryDisposition::Stop
        );
    }
}

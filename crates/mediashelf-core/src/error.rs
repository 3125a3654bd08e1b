use thiserror::Error;

/// Errors produced by the media store and its durable backends.
///
/// None of these are fatal. `Validation` and `NotFound` are reported before
/// any state changes; the rest come from the durable layer and never roll
/// back the in-memory collection.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("validation failed: {0}")]
    Validation(String),

    #[error("media {0} not found")]
    NotFound(u64),

    #[error("storage full: writing '{key}' needs {needed} bytes, capacity is {capacity} bytes")]
    QuotaExceeded {
        key: String,
        needed: u64,
        capacity: u64,
    },

    #[error("storage I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl StoreError {
    pub(crate) fn validation(msg: impl Into<String>) -> Self {
        StoreError::Validation(msg.into())
    }

    /// Capacity exhaustion; callers should tell the user to free space.
    pub fn is_quota(&self) -> bool {
        matches!(self, StoreError::QuotaExceeded { .. })
    }
}

/// Outcome of a mutation that was applied in memory.
///
/// The in-memory collection is authoritative for the running session, so a
/// mutation is never undone because the durable write failed. `persisted`
/// reports whether the write-through succeeded.
#[derive(Debug)]
#[must_use]
pub struct Mutation<T> {
    pub value: T,
    pub persisted: Result<(), StoreError>,
}

impl<T> Mutation<T> {
    pub(crate) fn new(value: T, persisted: Result<(), StoreError>) -> Self {
        Self { value, persisted }
    }

    pub fn is_persisted(&self) -> bool {
        self.persisted.is_ok()
    }

    /// Treat a failed write-through as an error, discarding the value.
    pub fn into_result(self) -> Result<T, StoreError> {
        self.persisted.map(|()| self.value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_quota_classification() {
        let err = StoreError::QuotaExceeded {
            key: "media_collection".to_string(),
            needed: 10,
            capacity: 5,
        };
        assert!(err.is_quota());
        assert!(!StoreError::NotFound(1).is_quota());
        assert!(err.to_string().contains("media_collection"));
    }

    #[test]
    fn test_mutation_into_result() {
        let ok = Mutation::new(7u64, Ok(()));
        assert!(ok.is_persisted());
        assert_eq!(ok.into_result().unwrap(), 7);

        let failed = Mutation::new(
            7u64,
            Err(StoreError::QuotaExceeded {
                key: "k".to_string(),
                needed: 2,
                capacity: 1,
            }),
        );
        assert!(!failed.is_persisted());
        assert!(failed.into_result().unwrap_err().is_quota());
    }
}

//! Mock library scanner for testing.

use async_trait::async_trait;
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::jobs::{CollaboratorError, LibraryScanner};

/// Mock implementation of the LibraryScanner trait.
///
/// Counts calls and fails on demand, once or on every call.
#[derive(Debug, Default)]
pub struct MockLibraryScanner {
    scan_calls: Arc<RwLock<usize>>,
    find_new_calls: Arc<RwLock<usize>>,
    /// Error to return, and whether it stays after being returned.
    failure: Arc<RwLock<Option<(CollaboratorError, bool)>>>,
}

impl MockLibraryScanner {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn scan_calls(&self) -> usize {
        *self.scan_calls.read().await
    }

    pub async fn find_new_calls(&self) -> usize {
        *self.find_new_calls.read().await
    }

    /// Make the next call fail with the given error.
    pub async fn fail_next(&self, error: CollaboratorError) {
        *self.failure.write().await = Some((error, false));
    }

    /// Make every call fail with the given error.
    pub async fn fail_always(&self, error: CollaboratorError) {
        *self.failure.write().await = Some((error, true));
    }

    async fn outcome(&self) -> Result<(), CollaboratorError> {
        let mut failure = self.failure.write().await;
        match failure.take() {
            Some((error, true)) => {
                *failure = Some((error.clone(), true));
                Err(error)
            }
            Some((error, false)) => Err(error),
            None => Ok(()),
        }
    }
}

#[async_trait]
impl LibraryScanner for MockLibraryScanner {
    fn name(&self) -> &str {
        "mock"
    }

    async fn scan_library(&self) -> Result<(), CollaboratorError> {
        *self.scan_calls.write().await += 1;
        self.outcome().await
    }

    async fn find_new_episodes(&self) -> Result<(), CollaboratorError> {
        *self.find_new_calls.write().await += 1;
        self.outcome().await
    }
}

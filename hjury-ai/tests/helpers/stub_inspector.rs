//! In-memory repository inspector

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use hjury_ai::services::{GithubRepo, RepositoryAccess, RepositoryError, RepositoryInspector};

/// Answers every lookup with a public repository unless overridden per repo
#[derive(Default)]
pub struct StubInspector {
    overrides: Mutex<HashMap<String, Result<RepositoryAccess, String>>>,
    calls: AtomicUsize,
    in_flight: AtomicUsize,
    peak_in_flight: AtomicUsize,
    delay: Option<Duration>,
}

impl StubInspector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fixed answer for `owner/name`
    pub fn set_access(&self, repo: &str, access: RepositoryAccess) {
        self.overrides
            .lock()
            .unwrap()
            .insert(repo.to_string(), Ok(access));
    }

    /// Network failure for `owner/name`
    pub fn set_failure(&self, repo: &str, message: &str) {
        self.overrides
            .lock()
            .unwrap()
            .insert(repo.to_string(), Err(message.to_string()));
    }

    /// Hold every lookup open for `delay` so overlapping calls are observable
    pub fn with_delay(delay: Duration) -> Self {
        Self {
            delay: Some(delay),
            ..Self::default()
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Highest number of lookups that were in progress at the same time
    pub fn peak_in_flight(&self) -> usize {
        self.peak_in_flight.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl RepositoryInspector for StubInspector {
    async fn inspect(&self, repo: &GithubRepo) -> Result<RepositoryAccess, RepositoryError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let running = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak_in_flight.fetch_max(running, Ordering::SeqCst);
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        self.in_flight.fetch_sub(1, Ordering::SeqCst);

        let answer = self.overrides.lock().unwrap().get(&repo.to_string()).cloned();
        match answer {
            Some(Ok(access)) => Ok(access),
            Some(Err(message)) => Err(RepositoryError::Network(message)),
            None => Ok(RepositoryAccess::public()),
        }
    }
}

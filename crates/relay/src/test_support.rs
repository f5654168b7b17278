//! In-memory fakes for the port traits.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use routing::{Fingerprint, JobId, JobTrigger, MappingProvider, SourceError, TriggerError};
use tokio::time::Instant;

#[derive(Debug, Default)]
struct ProviderState {
    content: String,
    fingerprint: String,
    unreachable: bool,
    // Published right after the next content read.
    after_read: Option<(String, String)>,
}

/// Provider whose content and fingerprint are set by the test.
#[derive(Debug, Clone, Default)]
pub struct FakeProvider {
    state: Arc<Mutex<ProviderState>>,
    content_fetches: Arc<AtomicUsize>,
}

impl FakeProvider {
    pub fn new(content: &str, fingerprint: &str) -> Self {
        let provider = Self::default();
        provider.publish(content, fingerprint);
        provider
    }

    pub fn publish(&self, content: &str, fingerprint: &str) {
        let mut state = self.state.lock().unwrap();
        state.content = content.to_string();
        state.fingerprint = fingerprint.to_string();
    }

    /// Publishes `content` and `fingerprint` as soon as the current content
    /// has been read, as if the source were rewritten mid-load.
    pub fn publish_after_next_read(&self, content: &str, fingerprint: &str) {
        self.state.lock().unwrap().after_read = Some((content.to_string(), fingerprint.to_string()));
    }

    pub fn set_unreachable(&self, unreachable: bool) {
        self.state.lock().unwrap().unreachable = unreachable;
    }

    pub fn content_fetches(&self) -> usize {
        self.content_fetches.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl MappingProvider for FakeProvider {
    fn location(&self) -> String {
        "memory://mapping".to_string()
    }

    async fn fetch_content(&self) -> Result<Vec<u8>, SourceError> {
        self.content_fetches.fetch_add(1, Ordering::SeqCst);
        let mut state = self.state.lock().unwrap();
        if state.unreachable {
            return Err(SourceError::Io {
                location: self.location(),
                message: "unreachable".to_string(),
            });
        }
        let content = state.content.clone().into_bytes();
        if let Some((next_content, next_fingerprint)) = state.after_read.take() {
            state.content = next_content;
            state.fingerprint = next_fingerprint;
        }
        Ok(content)
    }

    async fn fetch_fingerprint(&self) -> Result<Fingerprint, SourceError> {
        let state = self.state.lock().unwrap();
        if state.unreachable {
            return Err(SourceError::Io {
                location: self.location(),
                message: "unreachable".to_string(),
            });
        }
        Ok(Fingerprint::new(state.fingerprint.clone()).unwrap())
    }
}

/// Trigger that records every fire with the (virtual) time it happened.
#[derive(Debug, Clone, Default)]
pub struct RecordingTrigger {
    fired: Arc<Mutex<Vec<(JobId, Instant)>>>,
    failing: bool,
}

impl RecordingTrigger {
    pub fn failing() -> Self {
        Self {
            failing: true,
            ..Self::default()
        }
    }

    pub fn fired(&self) -> Vec<(JobId, Instant)> {
        self.fired.lock().unwrap().clone()
    }

    pub fn fired_jobs(&self) -> Vec<String> {
        self.fired()
            .into_iter()
            .map(|(job, _)| job.as_str().to_string())
            .collect()
    }
}

#[async_trait]
impl JobTrigger for RecordingTrigger {
    async fn fire(&self, job: &JobId) -> Result<(), TriggerError> {
        self.fired.lock().unwrap().push((job.clone(), Instant::now()));
        if self.failing {
            return Err(TriggerError::Status {
                job: job.clone(),
                status: 500,
            });
        }
        Ok(())
    }
}

pub fn job(name: &str) -> JobId {
    JobId::new(name).unwrap()
}

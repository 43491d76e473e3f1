//! In-memory registry backend shared by the engine tests.

#![allow(dead_code)]

use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use tagsweep_core::SkipPolicy;
use tagsweep_registry::{RegistryBackend, RegistryError, RepositoryReference};

/// A repository held in memory.
///
/// Deleting a tag removes it, so a second run sees the shrunken repository.
pub struct MemoryBackend {
    reference: RepositoryReference,
    skip_policy: SkipPolicy,
    tags: Mutex<Vec<(String, Option<DateTime<Utc>>)>>,
    unreadable: HashSet<String>,
    undeletable: HashSet<String>,
    list_error: bool,
    list_delay: Option<Duration>,
    fetch_delays: HashMap<String, Duration>,
    delete_delay: Option<Duration>,
    delete_delays: HashMap<String, Duration>,
    fetch_calls: Mutex<Vec<String>>,
    delete_calls: Mutex<Vec<String>>,
}

impl MemoryBackend {
    pub fn new(tags: &[(&str, Option<i64>)]) -> Self {
        Self {
            reference: RepositoryReference::parse("registry.test/acme/app").unwrap(),
            skip_policy: SkipPolicy::CommitTag,
            tags: Mutex::new(
                tags.iter()
                    .map(|(name, secs)| {
                        (
                            (*name).to_string(),
                            secs.and_then(|s| DateTime::from_timestamp(s, 0)),
                        )
                    })
                    .collect(),
            ),
            unreadable: HashSet::new(),
            undeletable: HashSet::new(),
            list_error: false,
            list_delay: None,
            fetch_delays: HashMap::new(),
            delete_delay: None,
            delete_delays: HashMap::new(),
            fetch_calls: Mutex::new(Vec::new()),
            delete_calls: Mutex::new(Vec::new()),
        }
    }

    pub const fn with_skip_policy(mut self, policy: SkipPolicy) -> Self {
        self.skip_policy = policy;
        self
    }

    pub fn with_unreadable(mut self, tag: &str) -> Self {
        self.unreadable.insert(tag.to_string());
        self
    }

    pub fn with_undeletable(mut self, tag: &str) -> Self {
        self.undeletable.insert(tag.to_string());
        self
    }

    pub const fn with_list_error(mut self) -> Self {
        self.list_error = true;
        self
    }

    pub const fn with_list_delay(mut self, delay: Duration) -> Self {
        self.list_delay = Some(delay);
        self
    }

    pub fn with_fetch_delay(mut self, tag: &str, delay: Duration) -> Self {
        self.fetch_delays.insert(tag.to_string(), delay);
        self
    }

    /// Delay applied to every deletion without a per-tag delay.
    pub const fn with_delete_delay(mut self, delay: Duration) -> Self {
        self.delete_delay = Some(delay);
        self
    }

    pub fn with_tag_delete_delay(mut self, tag: &str, delay: Duration) -> Self {
        self.delete_delays.insert(tag.to_string(), delay);
        self
    }

    pub fn remaining(&self) -> Vec<String> {
        self.tags.lock().iter().map(|(name, _)| name.clone()).collect()
    }

    pub fn fetch_calls(&self) -> Vec<String> {
        self.fetch_calls.lock().clone()
    }

    pub fn delete_calls(&self) -> Vec<String> {
        self.delete_calls.lock().clone()
    }
}

#[async_trait]
impl RegistryBackend for MemoryBackend {
    fn name(&self) -> &'static str {
        "memory"
    }

    fn repository(&self) -> &RepositoryReference {
        &self.reference
    }

    fn skip_policy(&self) -> SkipPolicy {
        self.skip_policy
    }

    async fn list_tags(&self) -> Result<Vec<String>, RegistryError> {
        if let Some(delay) = self.list_delay {
            tokio::time::sleep(delay).await;
        }
        if self.list_error {
            return Err(RegistryError::HttpError {
                status: 503,
                message: "service unavailable".to_string(),
            });
        }
        Ok(self.remaining())
    }

    async fn fetch_created_at(&self, tag: &str) -> Result<Option<DateTime<Utc>>, RegistryError> {
        self.fetch_calls.lock().push(tag.to_string());
        if let Some(delay) = self.fetch_delays.get(tag) {
            tokio::time::sleep(*delay).await;
        }
        if self.unreadable.contains(tag) {
            return Err(RegistryError::NotFound {
                repository: self.reference.to_string(),
                reference: tag.to_string(),
            });
        }
        self.tags
            .lock()
            .iter()
            .find(|(name, _)| name == tag)
            .map(|(_, created)| *created)
            .ok_or_else(|| RegistryError::NotFound {
                repository: self.reference.to_string(),
                reference: tag.to_string(),
            })
    }

    async fn delete_tag(&self, tag: &str) -> Result<(), RegistryError> {
        self.delete_calls.lock().push(tag.to_string());
        if let Some(delay) = self.delete_delays.get(tag).copied().or(self.delete_delay) {
            tokio::time::sleep(delay).await;
        }
        if self.undeletable.contains(tag) {
            return Err(RegistryError::HttpError {
                status: 500,
                message: "internal error".to_string(),
            });
        }
        self.tags.lock().retain(|(name, _)| name != tag);
        Ok(())
    }
}

/// Hands a backend to the engine while the test keeps a handle on it.
pub struct Shared(pub Arc<MemoryBackend>);

impl Shared {
    pub fn boxed(backend: &Arc<MemoryBackend>) -> Box<dyn RegistryBackend> {
        Box::new(Self(Arc::clone(backend)))
    }
}

#[async_trait]
impl RegistryBackend for Shared {
    fn name(&self) -> &'static str {
        self.0.name()
    }

    fn repository(&self) -> &RepositoryReference {
        self.0.repository()
    }

    fn skip_policy(&self) -> SkipPolicy {
        self.0.skip_policy()
    }

    async fn list_tags(&self) -> Result<Vec<String>, RegistryError> {
        self.0.list_tags().await
    }

    async fn fetch_created_at(&self, tag: &str) -> Result<Option<DateTime<Utc>>, RegistryError> {
        self.0.fetch_created_at(tag).await
    }

    async fn delete_tag(&self, tag: &str) -> Result<(), RegistryError> {
        self.0.delete_tag(tag).await
    }
}

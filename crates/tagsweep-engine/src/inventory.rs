//! Tag inventory: listed tags paired with their creation times.
//!
//! Each tag's metadata is fetched independently. A tag whose metadata
//! cannot be read, or is not read before the run deadline, is logged,
//! recorded as a [`TagFailure`] and left out of the inventory, so it is
//! neither kept nor deleted.

use futures::stream::{self, StreamExt};
use tagsweep_core::{Inventory, TagFailure, TagRecord};
use tagsweep_registry::{validate_tag, RegistryBackend, RegistryError};
use tokio::time::Instant;

use crate::dispatch::DEADLINE_REASON;

/// Why a tag did not make it into the inventory.
enum FetchError {
    Registry(RegistryError),
    Deadline,
}

impl std::fmt::Display for FetchError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Registry(e) => e.fmt(f),
            Self::Deadline => f.write_str(DEADLINE_REASON),
        }
    }
}

/// Inventory plus the tags that could not be read.
#[derive(Debug, Clone, Default)]
pub struct InventoryResult {
    /// Tags with readable metadata, in enumeration order.
    pub inventory: Inventory,
    /// Tags excluded from the inventory.
    pub failures: Vec<TagFailure>,
}

/// Builds the inventory for `tags`.
///
/// At most `concurrency` fetches are in flight; the inventory keeps the
/// order of `tags` regardless of completion order. With a `deadline`, a
/// fetch still running at the deadline is abandoned and no fetch starts
/// after it.
pub async fn build_inventory(
    backend: &dyn RegistryBackend,
    tags: Vec<String>,
    concurrency: usize,
    deadline: Option<Instant>,
) -> InventoryResult {
    let fetched: Vec<(String, Result<TagRecord, FetchError>)> = stream::iter(tags)
        .map(|tag| async move {
            let record = fetch_before(backend, &tag, deadline).await;
            (tag, record)
        })
        .buffered(concurrency.max(1))
        .collect()
        .await;

    fetched
        .into_iter()
        .fold(InventoryResult::default(), |mut acc, (tag, record)| {
            match record {
                Ok(record) => acc.inventory.push(record),
                Err(e) => {
                    tracing::warn!(tag = %tag, error = %e, "skipping tag with unreadable metadata");
                    acc.failures.push(TagFailure::new(tag, e.to_string()));
                }
            }
            acc
        })
}

async fn fetch_before(
    backend: &dyn RegistryBackend,
    tag: &str,
    deadline: Option<Instant>,
) -> Result<TagRecord, FetchError> {
    let Some(deadline) = deadline else {
        return fetch_record(backend, tag).await.map_err(FetchError::Registry);
    };
    if Instant::now() >= deadline {
        return Err(FetchError::Deadline);
    }
    match tokio::time::timeout_at(deadline, fetch_record(backend, tag)).await {
        Ok(record) => record.map_err(FetchError::Registry),
        Err(_) => Err(FetchError::Deadline),
    }
}

async fn fetch_record(backend: &dyn RegistryBackend, tag: &str) -> Result<TagRecord, RegistryError> {
    validate_tag(tag)?;
    let created_at = backend.fetch_created_at(tag).await?;
    tracing::debug!(tag = %tag, created_at = ?created_at, "fetched tag metadata");
    Ok(TagRecord::new(tag, created_at))
}

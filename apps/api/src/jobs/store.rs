//! Job persistence seam. The service ships with the in-memory backend only.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use thiserror::Error;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::jobs::models::Job;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("job {0} already exists")]
    Duplicate(Uuid),

    #[error("job {0} does not exist")]
    Missing(Uuid),
}

#[async_trait]
pub trait JobStore: Send + Sync {
    async fn insert(&self, job: Job) -> Result<(), StoreError>;

    /// Replaces the stored row for `job.id` wholesale.
    async fn update(&self, job: &Job) -> Result<(), StoreError>;

    async fn get(&self, id: Uuid) -> Option<Job>;

    /// Removes finished jobs whose `completed_at` is before `cutoff` and returns them.
    async fn evict_finished_before(&self, cutoff: DateTime<Utc>) -> Vec<Job>;
}

#[derive(Default)]
pub struct InMemoryJobStore {
    jobs: RwLock<HashMap<Uuid, Job>>,
}

impl InMemoryJobStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn len(&self) -> usize {
        self.jobs.read().await.len()
    }
}

#[async_trait]
impl JobStore for InMemoryJobStore {
    async fn insert(&self, job: Job) -> Result<(), StoreError> {
        let mut jobs = self.jobs.write().await;
        if jobs.contains_key(&job.id) {
            return Err(StoreError::Duplicate(job.id));
        }
        jobs.insert(job.id, job);
        Ok(())
    }

    async fn update(&self, job: &Job) -> Result<(), StoreError> {
        let mut jobs = self.jobs.write().await;
        match jobs.get_mut(&job.id) {
            Some(slot) => {
                *slot = job.clone();
                Ok(())
            }
            None => Err(StoreError::Missing(job.id)),
        }
    }

    async fn get(&self, id: Uuid) -> Option<Job> {
        self.jobs.read().await.get(&id).cloned()
    }

    async fn evict_finished_before(&self, cutoff: DateTime<Utc>) -> Vec<Job> {
        let mut jobs = self.jobs.write().await;
        let expired: Vec<Uuid> = jobs
            .values()
            .filter(|job| job.finished_at().is_some_and(|at| at < cutoff))
            .map(|job| job.id)
            .collect();
        expired
            .into_iter()
            .filter_map(|id| jobs.remove(&id))
            .collect()
    }
}

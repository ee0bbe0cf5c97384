//! Scripted collections for scheduler and command tests

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use anyhow::{Result, anyhow};
use async_trait::async_trait;
use kiln_core::domain::dataset::{Dataset, DatasetStatus, FileMeta};
use kiln_core::domain::model::{Model, ModelStatus};
use kiln_core::domain::status::JobStatus;

use crate::scheduler::Collection;

/// Replays canned responses; the last one repeats
pub struct Script<T> {
    responses: Mutex<VecDeque<std::result::Result<T, String>>>,
    calls: AtomicUsize,
}

impl<T: Clone> Script<T> {
    pub fn new(responses: Vec<std::result::Result<T, String>>) -> Self {
        Self {
            responses: Mutex::new(responses.into()),
            calls: AtomicUsize::new(0),
        }
    }

    fn next(&self) -> Result<T> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let mut responses = self.responses.lock().unwrap();
        let response = if responses.len() > 1 {
            responses.pop_front().unwrap()
        } else {
            responses.front().cloned().unwrap()
        };
        response.map_err(|e| anyhow!(e))
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

pub struct FakeCollection<I, U> {
    pub lists: Script<Vec<I>>,
    pub statuses: Script<Vec<U>>,
}

#[async_trait]
impl Collection for Arc<FakeCollection<Dataset, DatasetStatus>> {
    type Item = Dataset;
    type Update = DatasetStatus;

    fn name(&self) -> &'static str {
        "datasets"
    }

    async fn list(&self) -> Result<Vec<Dataset>> {
        self.lists.next()
    }

    async fn status(&self) -> Result<Vec<DatasetStatus>> {
        self.statuses.next()
    }
}

#[async_trait]
impl Collection for Arc<FakeCollection<Model, ModelStatus>> {
    type Item = Model;
    type Update = ModelStatus;

    fn name(&self) -> &'static str {
        "models"
    }

    async fn list(&self) -> Result<Vec<Model>> {
        self.lists.next()
    }

    async fn status(&self) -> Result<Vec<ModelStatus>> {
        self.statuses.next()
    }
}

pub fn dataset(id: i64, status: &str) -> Dataset {
    Dataset {
        id,
        file_name: format!("set-{}.zip", id),
        file_meta: Some(FileMeta {
            filesize: 100,
            creation_time: "2024-05-01T09:00:00".to_string(),
        }),
        status: JobStatus::from(status),
    }
}

pub fn dataset_status(id: i64, status: &str) -> DatasetStatus {
    DatasetStatus {
        id,
        file_name: format!("set-{}.zip", id),
        status: JobStatus::from(status),
    }
}

//! Target scheduler protocol
//!
//! The scheduler's ranking algorithm is a collaborator; the controller
//! only depends on the protocol here. A scheduling failure is deliberately
//! non-fatal: the controller logs a warning and retries from the getting
//! ready state, never escalating to a park.

use crate::target::Target;
use argus_devices::SkyCoordinates;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::sync::Mutex;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SchedulerError {
    #[error("no suitable target available")]
    NoSuitableTarget,
}

/// Scheduler capability the controller drives.
#[async_trait]
pub trait TargetScheduler: Send + Sync {
    /// Select the target to observe next.
    async fn get_target(&self) -> Result<Target, SchedulerError>;

    /// Record that a target's observation block finished, so the field is
    /// not issued again.
    async fn mark_complete(&self, name: &str);
}

/// A field the observatory can be asked to observe.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Field {
    pub name: String,
    pub ra_hours: f64,
    pub dec_degrees: f64,
    #[serde(default = "default_min_images")]
    pub min_images: u32,
    /// Higher priority fields are issued first.
    #[serde(default = "default_priority")]
    pub priority: i32,
}

fn default_min_images() -> u32 {
    3
}

fn default_priority() -> i32 {
    100
}

/// Scheduler issuing configured fields in priority order, skipping those
/// whose observation block already completed.
pub struct FieldListScheduler {
    fields: Vec<Field>,
    done: Mutex<HashSet<String>>,
}

impl FieldListScheduler {
    pub fn new(mut fields: Vec<Field>) -> Self {
        fields.sort_by(|a, b| b.priority.cmp(&a.priority));
        Self {
            fields,
            done: Mutex::new(HashSet::new()),
        }
    }

    pub fn completed_fields(&self) -> Vec<String> {
        let mut names: Vec<String> = self.done.lock().unwrap().iter().cloned().collect();
        names.sort();
        names
    }
}

#[async_trait]
impl TargetScheduler for FieldListScheduler {
    async fn get_target(&self) -> Result<Target, SchedulerError> {
        let done = self.done.lock().unwrap();
        self.fields
            .iter()
            .find(|f| !done.contains(&f.name))
            .map(|f| {
                Target::new(
                    f.name.clone(),
                    SkyCoordinates::new(f.ra_hours, f.dec_degrees),
                    f.min_images,
                )
            })
            .ok_or(SchedulerError::NoSuitableTarget)
    }

    async fn mark_complete(&self, name: &str) {
        self.done.lock().unwrap().insert(name.to_string());
    }
}

//! Canonical in-memory record collection.
//!
//! Records keep their load order; ordering is only ever a property of a view.
//! Every write bumps the revision so clients can tell when to refresh.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use tokio::sync::RwLock;

use crate::errors::AppError;
use crate::models::{ClaimField, Record};

/// Store shared between request handlers and the claim controller.
pub type SharedStore = Arc<RwLock<RecordStore>>;

/// Keyed collection of attendee records.
#[derive(Debug, Default)]
pub struct RecordStore {
    records: Vec<Record>,
    index: HashMap<String, usize>,
    revision: u64,
    loaded_at: Option<DateTime<Utc>>,
}

impl RecordStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn shared(self) -> SharedStore {
        Arc::new(RwLock::new(self))
    }

    /// All records in load order.
    pub fn records(&self) -> &[Record] {
        &self.records
    }

    pub fn get(&self, id: &str) -> Option<&Record> {
        self.index.get(id).map(|&i| &self.records[i])
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn revision(&self) -> u64 {
        self.revision
    }

    pub fn loaded_at(&self) -> Option<DateTime<Utc>> {
        self.loaded_at
    }

    /// Replace the whole collection. Ids must be unique.
    pub fn replace_all(&mut self, records: Vec<Record>) -> Result<(), AppError> {
        let mut index = HashMap::with_capacity(records.len());
        for (i, record) in records.iter().enumerate() {
            if index.insert(record.id.clone(), i).is_some() {
                return Err(AppError::Validation(format!(
                    "Duplicate record id {}",
                    record.id
                )));
            }
        }

        self.records = records;
        self.index = index;
        self.revision += 1;
        self.loaded_at = Some(Utc::now());

        tracing::info!(
            records = self.records.len(),
            revision = self.revision,
            "Record collection replaced"
        );
        if self.is_empty() {
            tracing::warn!("Record collection is empty");
        }
        Ok(())
    }

    /// Current value of a claim field.
    #[cfg(test)]
    pub fn field(&self, id: &str, field: ClaimField) -> Option<bool> {
        self.get(id).map(|record| record.claim(field))
    }

    /// Write a claim field in place, returning the previous value.
    pub fn update_field(&mut self, id: &str, field: ClaimField, value: bool) -> Option<bool> {
        let &i = self.index.get(id)?;
        let record = &mut self.records[i];
        let previous = record.claim(field);
        record.set_claim(field, value);
        self.revision += 1;
        Some(previous)
    }
}

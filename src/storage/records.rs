//! Record Store
//!
//! Whole-collection read-modify-write over the student document.
//!
//! ## Concurrency
//! Nothing in this module serializes writers. Two callers that both
//! `load_all`, change their copy and `save_all` race: the last save wins and
//! the earlier change is lost. `Engine` wraps every mutation in one
//! process-wide lock; processes sharing the same file are not protected.

use std::collections::HashMap;
use std::path::Path;

use uuid::Uuid;

use crate::error::{Result, RollbookError};
use crate::record::{AttachmentRefs, NewStudent, StudentPatch, StudentRecord};

use super::DocumentStore;

/// An in-memory copy of the collection with lookup indexes
///
/// Indexes are rebuilt whenever the collection is loaded or changed, so
/// `by_roll` always reflects live (not stored) roll numbers.
#[derive(Debug, Clone, Default)]
pub struct Collection {
    /// Records in insertion order
    records: Vec<StudentRecord>,

    /// id → position
    by_id: HashMap<String, usize>,

    /// live roll number → positions (several students may share one)
    by_roll: HashMap<String, Vec<usize>>,
}

impl Collection {
    /// Index a loaded record list, rejecting duplicate ids
    pub fn new(records: Vec<StudentRecord>) -> Result<Self> {
        let mut collection = Self {
            records,
            by_id: HashMap::new(),
            by_roll: HashMap::new(),
        };
        collection.reindex()?;
        Ok(collection)
    }

    pub fn records(&self) -> &[StudentRecord] {
        &self.records
    }

    pub fn into_records(self) -> Vec<StudentRecord> {
        self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// O(1) lookup by primary key
    pub fn get(&self, id: &str) -> Option<&StudentRecord> {
        self.by_id.get(id).map(|&pos| &self.records[pos])
    }

    /// Linear scan for the first record matching `predicate`
    pub fn find<P>(&self, predicate: P) -> Option<&StudentRecord>
    where
        P: Fn(&StudentRecord) -> bool,
    {
        self.records.iter().find(|record| predicate(record))
    }

    /// Records whose live roll number equals `roll`, in insertion order
    pub fn with_live_roll<'a>(&'a self, roll: &str) -> impl Iterator<Item = &'a StudentRecord> + 'a {
        self.by_roll
            .get(roll)
            .into_iter()
            .flatten()
            .map(move |&pos| &self.records[pos])
    }

    /// Append a record; its id must be new
    pub fn insert(&mut self, record: StudentRecord) -> Result<()> {
        if self.by_id.contains_key(&record.id) {
            return Err(RollbookError::validation(
                "id",
                format!("{} already exists", record.id),
            ));
        }
        let pos = self.records.len();
        self.by_id.insert(record.id.clone(), pos);
        self.records.push(record);
        self.index_roll(pos);
        Ok(())
    }

    /// Change one record in place and refresh the indexes
    pub fn modify<F>(&mut self, id: &str, change: F) -> Result<&StudentRecord>
    where
        F: FnOnce(&mut StudentRecord),
    {
        let pos = *self
            .by_id
            .get(id)
            .ok_or_else(|| RollbookError::NotFound(format!("student {}", id)))?;

        change(&mut self.records[pos]);
        // ids are immutable
        self.records[pos].id = id.to_string();
        self.reindex()?;

        Ok(&self.records[pos])
    }

    /// Remove and return the record with `id`
    pub fn remove(&mut self, id: &str) -> Result<StudentRecord> {
        let pos = *self
            .by_id
            .get(id)
            .ok_or_else(|| RollbookError::NotFound(format!("student {}", id)))?;

        let removed = self.records.remove(pos);
        self.reindex()?;
        Ok(removed)
    }

    fn reindex(&mut self) -> Result<()> {
        self.by_id.clear();
        self.by_roll.clear();

        for pos in 0..self.records.len() {
            let id = self.records[pos].id.clone();
            if self.by_id.insert(id.clone(), pos).is_some() {
                return Err(RollbookError::StoreCorrupt(format!(
                    "duplicate student id {}",
                    id
                )));
            }
            self.index_roll(pos);
        }
        Ok(())
    }

    fn index_roll(&mut self, pos: usize) {
        let record = &self.records[pos];
        match record.roll_number() {
            Ok(roll) => self.by_roll.entry(roll).or_default().push(pos),
            Err(e) => tracing::debug!("Student {} has no live roll number: {}", record.id, e),
        }
    }
}

/// Outcome of a delete
#[derive(Debug, Clone)]
pub struct Deletion {
    /// The record that was removed
    pub removed: StudentRecord,

    /// Everything left in the collection
    pub remaining: Vec<StudentRecord>,
}

/// Loads, mutates and persists the whole student collection
#[derive(Debug)]
pub struct RecordStore {
    document: DocumentStore,
}

impl RecordStore {
    /// Open (or initialize) the store backed by the document at `path`
    pub fn open(path: &Path, pretty: bool) -> Result<Self> {
        Ok(Self {
            document: DocumentStore::open(path, pretty)?,
        })
    }

    /// Read the whole collection and rebuild its indexes
    pub fn load_all(&self) -> Result<Collection> {
        Collection::new(self.document.load()?)
    }

    /// Atomically replace the persisted collection
    pub fn save_all(&self, collection: &Collection) -> Result<()> {
        self.document.save(collection.records())
    }

    /// Load, apply `change`, and persist if it succeeded
    ///
    /// A failed change leaves the document untouched.
    pub fn mutate<T, F>(&self, change: F) -> Result<T>
    where
        F: FnOnce(&mut Collection) -> Result<T>,
    {
        let mut collection = self.load_all()?;
        let outcome = change(&mut collection)?;
        self.save_all(&collection)?;
        Ok(outcome)
    }

    /// Register a new student under a fresh id
    pub fn create(&self, fields: NewStudent, refs: AttachmentRefs) -> Result<StudentRecord> {
        fields.validate()?;

        self.mutate(|collection| {
            let record = StudentRecord::new(Uuid::new_v4().to_string(), fields, refs);
            collection.insert(record.clone())?;
            Ok(record)
        })
    }

    /// First record matching `predicate`
    pub fn find_one<P>(&self, predicate: P) -> Result<StudentRecord>
    where
        P: Fn(&StudentRecord) -> bool,
    {
        self.load_all()?
            .find(predicate)
            .cloned()
            .ok_or_else(|| RollbookError::NotFound("no student matches".to_string()))
    }

    /// Apply `patch` to the record with `id`
    ///
    /// `attach` runs once the prior record is known and before anything is
    /// persisted. It returns the references to store in each replaced slot.
    pub fn update_by_id<F>(&self, id: &str, patch: StudentPatch, attach: F) -> Result<StudentRecord>
    where
        F: FnOnce(&StudentRecord) -> Result<AttachmentRefs>,
    {
        patch.validate()?;

        self.mutate(|collection| {
            let prior = collection
                .get(id)
                .ok_or_else(|| RollbookError::NotFound(format!("student {}", id)))?;
            let refs = attach(prior)?;

            let updated = collection.modify(id, |record| {
                patch.apply(record);
                for (slot, reference) in refs.iter() {
                    record.set_attachment_ref(slot, reference.to_string());
                }
            })?;
            Ok(updated.clone())
        })
    }

    /// Remove the record with `id`
    ///
    /// Attachment files are not touched here.
    pub fn delete_by_id(&self, id: &str) -> Result<Deletion> {
        self.mutate(|collection| {
            let removed = collection.remove(id)?;
            Ok(Deletion {
                removed,
                remaining: collection.records().to_vec(),
            })
        })
    }

    /// Path of the backing document
    pub fn document_path(&self) -> &Path {
        self.document.path()
    }
}

//! Engine Module
//!
//! The owning service for the student registry: the only path through which
//! records and attachments change.
//!
//! ## Responsibilities
//! - Refuse to start on an unreadable student document
//! - Serialize every mutation (create/update/delete/set-result)
//! - Keep attachment files in step with record mutations
//! - Serve lock-free reads from the atomically replaced document

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};

use crate::config::Config;
use crate::error::{Result, RollbookError};
use crate::export::{self, Export, ExportFormat};
use crate::merger;
use crate::protocol::{Command, ResponseBody};
use crate::record::{AttachmentRefs, NewStudent, ResultPayload, StudentPatch, StudentRecord};
use crate::storage::{AttachmentStore, AttachmentUploads, RecordStore};

/// The registry engine
///
/// ## Concurrency Model: Single-Writer / Multiple-Reader (SWMR)
///
/// - **Writes** (create/update/delete/set-result): Serialized by `write_lock`
///   - Only ONE load → mutate → persist cycle at a time
///   - Attachment files are written inside the same critical section
///
/// - **Reads** (list/find/roll/get-result/export): No lock
///   - Each read loads the document, which is only ever replaced by rename,
///     so a read sees one complete collection
///
/// ## Known Limitation
/// The lock is per process. Two processes pointed at the same data
/// directory still lose updates (last writer wins).
pub struct Engine {
    /// Engine configuration
    config: Config,

    /// Whole-collection persistence
    records: RecordStore,

    /// Attachment files under `{data_dir}/uploads`
    attachments: AttachmentStore,

    /// Serializes mutations
    write_lock: Mutex<()>,
}

impl Engine {
    // =========================================================================
    // Internal Path Constants
    // =========================================================================
    const DOCUMENT_FILENAME: &'static str = "students.json";
    const UPLOAD_DIR: &'static str = "uploads";

    /// Open or create an engine with the given config
    ///
    /// On startup:
    /// 1. Create data directory
    /// 2. Create an empty document if none exists
    /// 3. Load the document once; a corrupt document aborts startup
    pub fn open(config: Config) -> Result<Self> {
        config.validate()?;

        // Step 1: Create data directory if it doesn't exist
        fs::create_dir_all(&config.data_dir)?;

        // Step 2: Compute paths (derived from data_dir, not configurable)
        let document_path = config.data_dir.join(Self::DOCUMENT_FILENAME);
        let upload_dir = config.data_dir.join(Self::UPLOAD_DIR);

        // Step 3: Open the record store (initializes a missing document)
        let records = RecordStore::open(&document_path, config.pretty_document)?;

        // Step 4: Verify the document before serving anything
        let loaded = records.load_all()?;
        tracing::info!(
            "Loaded {} student records from {}",
            loaded.len(),
            document_path.display()
        );

        let attachments = AttachmentStore::new(upload_dir, config.max_attachment_size);

        Ok(Self {
            config,
            records,
            attachments,
            write_lock: Mutex::new(()),
        })
    }

    /// Open with a path (convenience method)
    ///
    /// Uses default config with the specified data directory
    pub fn open_path(path: &Path) -> Result<Self> {
        let mut config = Config::default();
        config.data_dir = path.to_path_buf();
        Self::open(config)
    }

    /// Execute a command
    ///
    /// Routes commands to the boundary operations. Credentials are not
    /// checked here.
    pub fn execute(&self, command: Command) -> Result<ResponseBody> {
        match command {
            Command::Ping => Ok(ResponseBody::Pong),
            Command::Create { student, uploads } => self
                .create_record(student, uploads)
                .map(ResponseBody::Record),
            Command::List => self.list_records().map(ResponseBody::Records),
            Command::Find { name, email } => self
                .find_record_by_name_and_email(&name, &email)
                .map(ResponseBody::Record),
            Command::RollNumber { name, email } => self
                .derive_roll_number(&name, &email)
                .map(ResponseBody::RollNumber),
            Command::SetResult {
                roll_number,
                payload,
            } => self
                .set_result_by_roll(&roll_number, payload)
                .map(ResponseBody::Record),
            Command::GetResult { roll_number } => self
                .get_result_by_roll(&roll_number)
                .map(ResponseBody::Record),
            Command::Update { id, patch, uploads } => self
                .update_record_by_id(&id, patch, uploads)
                .map(ResponseBody::Record),
            Command::Delete { id } => self.delete_record_by_id(&id).map(ResponseBody::Records),
            Command::Export { format } => self.export(format).map(ResponseBody::Export),
        }
    }

    // =========================================================================
    // Mutations (write lock held)
    // =========================================================================

    /// Register a student, storing any uploaded attachments
    ///
    /// Every upload is validated before any file is written. If persisting
    /// the record fails, the files written for it are removed again.
    pub fn create_record(
        &self,
        fields: NewStudent,
        uploads: AttachmentUploads,
    ) -> Result<StudentRecord> {
        fields.validate()?;
        self.validate_uploads(&uploads)?;

        let _write_guard = self.lock_writes()?;

        let staged = self.attachments.stage(&uploads, &AttachmentRefs::default())?;
        let record = self.records.create(fields, staged.refs().clone())?;
        staged.commit();

        tracing::info!("Created student {} ({})", record.id, record.name);
        Ok(record)
    }

    /// Patch a student; each uploaded slot replaces the prior attachment
    ///
    /// Superseded files are removed only after the record is persisted. A
    /// failed update removes the files it wrote and leaves the prior ones
    /// referenced and on disk.
    pub fn update_record_by_id(
        &self,
        id: &str,
        patch: StudentPatch,
        uploads: AttachmentUploads,
    ) -> Result<StudentRecord> {
        patch.validate()?;
        self.validate_uploads(&uploads)?;

        let _write_guard = self.lock_writes()?;

        // Dropped uncommitted on any error below
        let mut staged = None;
        let record = self.records.update_by_id(id, patch, |prior| {
            let batch = self.attachments.stage(&uploads, &prior.attachments())?;
            let refs = batch.refs().clone();
            staged = Some(batch);
            Ok(refs)
        })?;

        if let Some(batch) = staged {
            batch.commit();
        }

        tracing::info!("Updated student {}", record.id);
        Ok(record)
    }

    /// Remove a student and return the remaining collection
    ///
    /// Attachment files stay on disk unless `cascade_attachment_delete` is
    /// set.
    pub fn delete_record_by_id(&self, id: &str) -> Result<Vec<StudentRecord>> {
        let _write_guard = self.lock_writes()?;

        let deletion = self.records.delete_by_id(id)?;
        tracing::info!("Deleted student {}", deletion.removed.id);

        if self.config.cascade_attachment_delete {
            for reference in deletion.removed.attachment_refs() {
                if let Err(e) = self.attachments.delete(reference) {
                    tracing::warn!("Could not remove attachment {}: {}", reference, e);
                }
            }
        }

        Ok(deletion.remaining)
    }

    /// File a result on the student whose live roll number and name match
    pub fn set_result_by_roll(&self, roll: &str, payload: ResultPayload) -> Result<StudentRecord> {
        let _write_guard = self.lock_writes()?;

        self.records
            .mutate(|collection| merger::set_result(collection, roll, payload))
    }

    // =========================================================================
    // Reads (no lock)
    // =========================================================================

    /// Every record, in insertion order
    pub fn list_records(&self) -> Result<Vec<StudentRecord>> {
        Ok(self.records.load_all()?.into_records())
    }

    /// First record with exactly this name and email
    pub fn find_record_by_name_and_email(&self, name: &str, email: &str) -> Result<StudentRecord> {
        self.records
            .find_one(|record| record.name == name && record.email == email)
            .map_err(|e| match e {
                RollbookError::NotFound(_) => {
                    RollbookError::NotFound(format!("student {} <{}>", name, email))
                }
                other => other,
            })
    }

    /// Live roll number of the student with this name and email
    pub fn derive_roll_number(&self, name: &str, email: &str) -> Result<String> {
        let record = self.find_record_by_name_and_email(name, email)?;
        merger::derive_live(&record)
    }

    /// Student whose stored result was filed under `roll`
    pub fn get_result_by_roll(&self, roll: &str) -> Result<StudentRecord> {
        if roll.trim().is_empty() {
            return Err(RollbookError::validation("rollNumber", "is required"));
        }
        let collection = self.records.load_all()?;
        merger::lookup_stored(&collection, roll).cloned()
    }

    /// Render the whole collection
    pub fn export(&self, format: ExportFormat) -> Result<Export> {
        let records = self.list_records()?;
        export::render(format, &records)
    }

    // =========================================================================
    // Accessors (for testing and debugging)
    // =========================================================================

    /// Get the data directory path
    pub fn data_dir(&self) -> &Path {
        &self.config.data_dir
    }

    /// Get the student document path
    pub fn document_path(&self) -> &Path {
        self.records.document_path()
    }

    /// Get the attachment directory path
    pub fn upload_dir(&self) -> &Path {
        self.attachments.root()
    }

    /// Resolve an attachment reference under the upload directory
    pub fn attachment_path(&self, reference: &str) -> Result<PathBuf> {
        self.attachments.path_of(reference)
    }

    /// Get the configuration
    pub fn config(&self) -> &Config {
        &self.config
    }

    // =========================================================================
    // Private Helpers
    // =========================================================================

    fn lock_writes(&self) -> Result<MutexGuard<'_, ()>> {
        self.write_lock
            .lock()
            .map_err(|e| RollbookError::LockPoisoned(format!("Write lock poisoned: {}", e)))
    }

    fn validate_uploads(&self, uploads: &AttachmentUploads) -> Result<()> {
        for (_, upload) in uploads.iter() {
            self.attachments.validate(upload)?;
        }
        Ok(())
    }
}

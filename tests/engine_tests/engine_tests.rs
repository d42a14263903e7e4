//! Tests for Engine
//!
//! These tests verify:
//! - Engine lifecycle (open/reopen, corrupt document refusal)
//! - Create/list/find/update/delete through the engine
//! - Attachment files following record mutations
//! - Result filing and lookup by roll number
//! - Command execution

use std::collections::BTreeMap;
use std::fs;

use rollbook::config::Config;
use rollbook::engine::Engine;
use rollbook::error::RollbookError;
use rollbook::export::ExportFormat;
use rollbook::protocol::{Command, ResponseBody};
use rollbook::record::{AttachmentSlot, NewStudent, ResultPayload, ResultRecord, StudentPatch};
use rollbook::storage::{AttachmentUploads, Upload};
use tempfile::TempDir;

// =============================================================================
// Helper Functions
// =============================================================================

const PNG_BYTES: &[u8] = &[0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A, 0, 0, 0, 13];
const PDF_BYTES: &[u8] = b"%PDF-1.4\n";

fn setup_temp_engine() -> (TempDir, Engine) {
    let temp_dir = TempDir::new().unwrap();
    let config = Config::builder().data_dir(temp_dir.path()).build();
    let engine = Engine::open(config).unwrap();
    (temp_dir, engine)
}

fn setup_cascading_engine() -> (TempDir, Engine) {
    let temp_dir = TempDir::new().unwrap();
    let config = Config::builder()
        .data_dir(temp_dir.path())
        .cascade_attachment_delete(true)
        .build();
    let engine = Engine::open(config).unwrap();
    (temp_dir, engine)
}

fn jordan() -> NewStudent {
    NewStudent {
        name: "Jordan Lee".to_string(),
        email: "jordan@example.com".to_string(),
        course: "Maths".to_string(),
        mobile_number: "9876543210".to_string(),
        date_of_birth: "2004-05-19".to_string(),
        address: "1 Main St".to_string(),
    }
}

fn photo_uploads(name: &str) -> AttachmentUploads {
    let mut uploads = AttachmentUploads::default();
    uploads.set(
        AttachmentSlot::Profile,
        Upload::new(name, "image/png", PNG_BYTES.to_vec()),
    );
    uploads
}

fn upload_count(engine: &Engine) -> usize {
    match fs::read_dir(engine.upload_dir()) {
        Ok(entries) => entries.count(),
        Err(_) => 0,
    }
}

fn maths_result(name: &str, score: u8) -> ResultPayload {
    let mut scores = BTreeMap::new();
    scores.insert("maths".to_string(), score);
    ResultPayload::from_scores(name, scores)
}

// =============================================================================
// Lifecycle Tests
// =============================================================================

#[test]
fn test_engine_open_creates_document() {
    let temp_dir = TempDir::new().unwrap();
    let data_dir = temp_dir.path().join("registry");

    let engine = Engine::open(Config::builder().data_dir(&data_dir).build()).unwrap();

    assert!(data_dir.exists());
    assert!(data_dir.join("students.json").exists());
    assert_eq!(engine.document_path(), data_dir.join("students.json"));
    assert!(engine.list_records().unwrap().is_empty());
}

#[test]
fn test_engine_refuses_corrupt_document() {
    let temp_dir = TempDir::new().unwrap();
    fs::write(temp_dir.path().join("students.json"), b"[{\"id\": ").unwrap();

    let result = Engine::open_path(temp_dir.path());

    assert!(matches!(result, Err(RollbookError::StoreCorrupt(_))));
    // The bad document is left for inspection
    assert_eq!(
        fs::read(temp_dir.path().join("students.json")).unwrap(),
        b"[{\"id\": "
    );
}

#[test]
fn test_engine_rejects_invalid_config() {
    let temp_dir = TempDir::new().unwrap();
    let config = Config::builder()
        .data_dir(temp_dir.path())
        .max_attachment_size(0)
        .build();

    assert!(matches!(Engine::open(config), Err(RollbookError::Config(_))));
    assert!(!temp_dir.path().join("students.json").exists());
}

#[test]
fn test_engine_reopen_keeps_records() {
    let temp_dir = TempDir::new().unwrap();
    let id = {
        let engine = Engine::open_path(temp_dir.path()).unwrap();
        engine
            .create_record(jordan(), AttachmentUploads::default())
            .unwrap()
            .id
    };

    let engine = Engine::open_path(temp_dir.path()).unwrap();
    let records = engine.list_records().unwrap();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].id, id);
}

// =============================================================================
// Create / Read Tests
// =============================================================================

#[test]
fn test_create_grows_list_by_one() {
    let (_temp, engine) = setup_temp_engine();

    let before = engine.list_records().unwrap().len();
    let created = engine
        .create_record(jordan(), AttachmentUploads::default())
        .unwrap();
    let after = engine.list_records().unwrap();

    assert_eq!(after.len(), before + 1);
    assert_eq!(after.last().unwrap(), &created);
}

#[test]
fn test_create_with_photo_stores_file() {
    let (_temp, engine) = setup_temp_engine();

    let created = engine
        .create_record(jordan(), photo_uploads("me.png"))
        .unwrap();

    let reference = created.profile_image_ref.clone().unwrap();
    let path = engine.attachment_path(&reference).unwrap();
    assert_eq!(fs::read(path).unwrap(), PNG_BYTES);
    assert_eq!(upload_count(&engine), 1);
}

#[test]
fn test_create_with_bad_upload_writes_nothing() {
    let (_temp, engine) = setup_temp_engine();

    let mut uploads = photo_uploads("me.png");
    uploads.set(
        AttachmentSlot::Sheet,
        Upload::new("sheet.pdf", "application/pdf", b"plain text".to_vec()),
    );

    let err = engine.create_record(jordan(), uploads).unwrap_err();

    assert!(matches!(err, RollbookError::UnsupportedMediaType(_)));
    assert_eq!(upload_count(&engine), 0);
    assert!(engine.list_records().unwrap().is_empty());
}

#[test]
fn test_create_with_invalid_fields_writes_nothing() {
    let (_temp, engine) = setup_temp_engine();
    let mut fields = jordan();
    fields.email = String::new();

    let err = engine.create_record(fields, photo_uploads("me.png")).unwrap_err();

    assert!(matches!(err, RollbookError::Validation { .. }));
    assert_eq!(upload_count(&engine), 0);
}

#[test]
fn test_create_with_oversize_upload_is_too_large() {
    let temp_dir = TempDir::new().unwrap();
    let config = Config::builder()
        .data_dir(temp_dir.path())
        .max_attachment_size(4)
        .build();
    let engine = Engine::open(config).unwrap();

    let err = engine
        .create_record(jordan(), photo_uploads("me.png"))
        .unwrap_err();
    assert!(matches!(err, RollbookError::PayloadTooLarge { .. }));
}

#[test]
fn test_find_by_name_and_email() {
    let (_temp, engine) = setup_temp_engine();
    let created = engine
        .create_record(jordan(), AttachmentUploads::default())
        .unwrap();

    let found = engine
        .find_record_by_name_and_email("Jordan Lee", "jordan@example.com")
        .unwrap();
    assert_eq!(found, created);

    let err = engine
        .find_record_by_name_and_email("Jordan Lee", "other@example.com")
        .unwrap_err();
    assert!(matches!(err, RollbookError::NotFound(_)));
}

#[test]
fn test_derive_roll_number() {
    let (_temp, engine) = setup_temp_engine();
    engine
        .create_record(jordan(), AttachmentUploads::default())
        .unwrap();

    let roll = engine
        .derive_roll_number("Jordan Lee", "jordan@example.com")
        .unwrap();
    assert_eq!(roll, "JO0410");
}

#[test]
fn test_derive_roll_number_short_mobile_fails() {
    let (_temp, engine) = setup_temp_engine();
    let mut fields = jordan();
    fields.mobile_number = "9".to_string();
    engine
        .create_record(fields, AttachmentUploads::default())
        .unwrap();

    let err = engine
        .derive_roll_number("Jordan Lee", "jordan@example.com")
        .unwrap_err();
    assert!(matches!(err, RollbookError::Derivation { .. }));
}

// =============================================================================
// Update Tests
// =============================================================================

#[test]
fn test_update_merges_fields_and_keeps_id() {
    let (_temp, engine) = setup_temp_engine();
    let created = engine
        .create_record(jordan(), AttachmentUploads::default())
        .unwrap();

    let patch = StudentPatch {
        address: Some("2 High St".to_string()),
        ..StudentPatch::default()
    };
    let updated = engine
        .update_record_by_id(&created.id, patch, AttachmentUploads::default())
        .unwrap();

    assert_eq!(updated.id, created.id);
    assert_eq!(updated.address, "2 High St");
    assert_eq!(updated.email, created.email);
}

#[test]
fn test_update_replaces_attachment_file() {
    let (_temp, engine) = setup_temp_engine();
    let created = engine
        .create_record(jordan(), photo_uploads("old.png"))
        .unwrap();
    let old_ref = created.profile_image_ref.clone().unwrap();
    let old_path = engine.attachment_path(&old_ref).unwrap();

    let updated = engine
        .update_record_by_id(&created.id, StudentPatch::default(), photo_uploads("new.png"))
        .unwrap();

    let new_ref = updated.profile_image_ref.clone().unwrap();
    assert_ne!(new_ref, old_ref);
    assert!(!old_path.exists());
    assert!(engine.attachment_path(&new_ref).unwrap().exists());
    assert_eq!(upload_count(&engine), 1);
}

#[test]
fn test_update_adds_new_slot_and_keeps_others() {
    let (_temp, engine) = setup_temp_engine();
    let created = engine
        .create_record(jordan(), photo_uploads("photo.png"))
        .unwrap();

    let mut uploads = AttachmentUploads::default();
    uploads.set(
        AttachmentSlot::Sheet,
        Upload::new("marks.pdf", "application/pdf", PDF_BYTES.to_vec()),
    );
    let updated = engine
        .update_record_by_id(&created.id, StudentPatch::default(), uploads)
        .unwrap();

    assert_eq!(updated.profile_image_ref, created.profile_image_ref);
    assert!(updated.sheet_image_ref.as_deref().unwrap().ends_with("_MARKS.pdf"));
    assert_eq!(upload_count(&engine), 2);
}

#[test]
fn test_update_missing_id_is_not_found() {
    let (_temp, engine) = setup_temp_engine();

    let err = engine
        .update_record_by_id("nope", StudentPatch::default(), photo_uploads("x.png"))
        .unwrap_err();

    assert!(matches!(err, RollbookError::NotFound(_)));
    assert_eq!(upload_count(&engine), 0);
}

#[test]
fn test_update_with_non_finite_result_keeps_store_readable() {
    let temp_dir = TempDir::new().unwrap();
    let config = Config::builder().data_dir(temp_dir.path()).build();
    let engine = Engine::open(config.clone()).unwrap();
    let created = engine
        .create_record(jordan(), photo_uploads("old.png"))
        .unwrap();
    let old_ref = created.profile_image_ref.clone().unwrap();

    let mut scores = BTreeMap::new();
    scores.insert("maths".to_string(), 90);
    let patch = StudentPatch {
        result: Some(ResultRecord {
            roll_number: "JO0410".to_string(),
            scores,
            total: 90,
            percentage: f64::NAN,
        }),
        ..StudentPatch::default()
    };
    let err = engine
        .update_record_by_id(&created.id, patch, photo_uploads("new.png"))
        .unwrap_err();
    assert!(matches!(err, RollbookError::Validation { .. }));

    // Prior photo still referenced and on disk, nothing new written
    let records = engine.list_records().unwrap();
    assert_eq!(records, vec![created]);
    assert!(engine.attachment_path(&old_ref).unwrap().exists());
    assert_eq!(upload_count(&engine), 1);

    drop(engine);
    let reopened = Engine::open(config).unwrap();
    assert_eq!(reopened.list_records().unwrap().len(), 1);
}

#[test]
fn test_update_with_bad_second_upload_keeps_prior_files() {
    let (_temp, engine) = setup_temp_engine();
    let created = engine
        .create_record(jordan(), photo_uploads("old.png"))
        .unwrap();
    let old_ref = created.profile_image_ref.clone().unwrap();

    let mut uploads = photo_uploads("new.png");
    uploads.set(
        AttachmentSlot::Signature,
        Upload::new("sig.png", "image/png", PDF_BYTES.to_vec()),
    );
    let err = engine
        .update_record_by_id(&created.id, StudentPatch::default(), uploads)
        .unwrap_err();

    assert!(matches!(err, RollbookError::UnsupportedMediaType(_)));
    let stored = engine.list_records().unwrap();
    assert_eq!(stored[0].profile_image_ref.as_deref(), Some(old_ref.as_str()));
    assert!(engine.attachment_path(&old_ref).unwrap().exists());
    assert_eq!(upload_count(&engine), 1);
}

// =============================================================================
// Delete Tests
// =============================================================================

#[test]
fn test_delete_returns_remaining_and_keeps_files() {
    let (_temp, engine) = setup_temp_engine();
    let created = engine
        .create_record(jordan(), photo_uploads("me.png"))
        .unwrap();

    let remaining = engine.delete_record_by_id(&created.id).unwrap();

    assert!(remaining.is_empty());
    assert_eq!(upload_count(&engine), 1);
}

#[test]
fn test_delete_cascades_when_configured() {
    let (_temp, engine) = setup_cascading_engine();
    let created = engine
        .create_record(jordan(), photo_uploads("me.png"))
        .unwrap();

    engine.delete_record_by_id(&created.id).unwrap();

    assert_eq!(upload_count(&engine), 0);
}

#[test]
fn test_delete_twice_is_not_found() {
    let (_temp, engine) = setup_temp_engine();
    let created = engine
        .create_record(jordan(), AttachmentUploads::default())
        .unwrap();

    engine.delete_record_by_id(&created.id).unwrap();
    let err = engine.delete_record_by_id(&created.id).unwrap_err();

    assert!(matches!(err, RollbookError::NotFound(_)));
}

// =============================================================================
// Result Tests
// =============================================================================

#[test]
fn test_set_then_get_result() {
    let (_temp, engine) = setup_temp_engine();
    engine
        .create_record(jordan(), AttachmentUploads::default())
        .unwrap();

    engine
        .set_result_by_roll("JO0410", maths_result("Jordan Lee", 77))
        .unwrap();
    let record = engine.get_result_by_roll("JO0410").unwrap();

    let result = record.result.unwrap();
    assert_eq!(result.roll_number, "JO0410");
    assert_eq!(result.total, 77);
}

#[test]
fn test_set_result_wrong_name_changes_nothing() {
    let (_temp, engine) = setup_temp_engine();
    engine
        .create_record(jordan(), AttachmentUploads::default())
        .unwrap();
    let before = fs::read(engine.document_path()).unwrap();

    let err = engine
        .set_result_by_roll("JO0410", maths_result("Someone Else", 77))
        .unwrap_err();

    assert!(matches!(err, RollbookError::NotFound(_)));
    assert_eq!(fs::read(engine.document_path()).unwrap(), before);
}

#[test]
fn test_result_survives_roll_changing_edit() {
    let (_temp, engine) = setup_temp_engine();
    let created = engine
        .create_record(jordan(), AttachmentUploads::default())
        .unwrap();
    engine
        .set_result_by_roll("JO0410", maths_result("Jordan Lee", 77))
        .unwrap();

    let patch = StudentPatch {
        name: Some("Morgan Lee".to_string()),
        ..StudentPatch::default()
    };
    engine
        .update_record_by_id(&created.id, patch, AttachmentUploads::default())
        .unwrap();

    assert_eq!(
        engine
            .derive_roll_number("Morgan Lee", "jordan@example.com")
            .unwrap(),
        "MO0410"
    );
    let by_stored = engine.get_result_by_roll("JO0410").unwrap();
    assert_eq!(by_stored.id, created.id);
    assert!(matches!(
        engine.get_result_by_roll("MO0410"),
        Err(RollbookError::NotFound(_))
    ));
}

#[test]
fn test_get_result_empty_roll_is_invalid() {
    let (_temp, engine) = setup_temp_engine();
    assert!(matches!(
        engine.get_result_by_roll(""),
        Err(RollbookError::Validation { .. })
    ));
}

// =============================================================================
// Command Execution Tests
// =============================================================================

#[test]
fn test_execute_ping() {
    let (_temp, engine) = setup_temp_engine();
    assert_eq!(engine.execute(Command::Ping).unwrap(), ResponseBody::Pong);
}

#[test]
fn test_execute_create_then_list() {
    let (_temp, engine) = setup_temp_engine();

    let created = match engine
        .execute(Command::Create {
            student: jordan(),
            uploads: AttachmentUploads::default(),
        })
        .unwrap()
    {
        ResponseBody::Record(record) => record,
        other => panic!("unexpected body: {other:?}"),
    };

    match engine.execute(Command::List).unwrap() {
        ResponseBody::Records(records) => assert_eq!(records, vec![created]),
        other => panic!("unexpected body: {other:?}"),
    }
}

#[test]
fn test_execute_roll_number() {
    let (_temp, engine) = setup_temp_engine();
    engine
        .create_record(jordan(), AttachmentUploads::default())
        .unwrap();

    let body = engine
        .execute(Command::RollNumber {
            name: "Jordan Lee".to_string(),
            email: "jordan@example.com".to_string(),
        })
        .unwrap();
    assert_eq!(body, ResponseBody::RollNumber("JO0410".to_string()));
}

#[test]
fn test_execute_export() {
    let (_temp, engine) = setup_temp_engine();
    engine
        .create_record(jordan(), AttachmentUploads::default())
        .unwrap();

    match engine
        .execute(Command::Export {
            format: ExportFormat::Csv,
        })
        .unwrap()
    {
        ResponseBody::Export(export) => {
            assert_eq!(export.file_name, "StudentData.csv");
            let text = String::from_utf8(export.body).unwrap();
            assert_eq!(text.lines().count(), 2);
            assert!(text.contains("Jordan Lee"));
        }
        other => panic!("unexpected body: {other:?}"),
    }
}

#[test]
fn test_execute_delete_missing_propagates_error() {
    let (_temp, engine) = setup_temp_engine();
    let err = engine
        .execute(Command::Delete {
            id: "missing".to_string(),
        })
        .unwrap_err();
    assert!(matches!(err, RollbookError::NotFound(_)));
}

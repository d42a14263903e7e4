//! Tests for RecordStore and Collection
//!
//! These tests verify:
//! - Create assigns fresh ids and appends
//! - Updates merge fields and never change the id
//! - Deletes report missing ids
//! - The live roll-number index follows edits
//! - Unsynchronized read-modify-write loses updates

use std::collections::BTreeMap;
use std::sync::{Arc, Barrier};
use std::thread;

use rollbook::error::RollbookError;
use rollbook::record::{AttachmentRefs, NewStudent, ResultRecord, StudentPatch, StudentRecord};
use rollbook::storage::{Collection, RecordStore};
use tempfile::TempDir;

// =============================================================================
// Helper Functions
// =============================================================================

fn setup_store() -> (TempDir, RecordStore) {
    let temp = TempDir::new().unwrap();
    let store = RecordStore::open(&temp.path().join("students.json"), true).unwrap();
    (temp, store)
}

fn new_student(name: &str, email: &str) -> NewStudent {
    NewStudent {
        name: name.to_string(),
        email: email.to_string(),
        course: "Chemistry".to_string(),
        mobile_number: "9876543210".to_string(),
        date_of_birth: "2004-05-19".to_string(),
        address: "12 Elm St".to_string(),
    }
}

fn filed_result(score: u8, percentage: f64) -> ResultRecord {
    let mut scores = BTreeMap::new();
    scores.insert("maths".to_string(), score);
    ResultRecord {
        roll_number: "AL0410".to_string(),
        scores,
        total: u32::from(score),
        percentage,
    }
}

fn no_attachments(_: &StudentRecord) -> rollbook::Result<AttachmentRefs> {
    Ok(AttachmentRefs::default())
}

// =============================================================================
// Create Tests
// =============================================================================

#[test]
fn test_create_appends_with_fresh_id() {
    let (_temp, store) = setup_store();

    let first = store
        .create(new_student("Alice", "alice@example.com"), AttachmentRefs::default())
        .unwrap();
    let second = store
        .create(new_student("Bob", "bob@example.com"), AttachmentRefs::default())
        .unwrap();

    assert!(!first.id.is_empty());
    assert_ne!(first.id, second.id);

    let all = store.load_all().unwrap().into_records();
    assert_eq!(all.len(), 2);
    assert_eq!(all[0], first);
    assert_eq!(all[1], second);
}

#[test]
fn test_create_stores_attachment_refs() {
    let (_temp, store) = setup_store();
    let refs = AttachmentRefs {
        profile: Some("1_aaaa_PHOTO.png".to_string()),
        signature: None,
        sheet: Some("2_bbbb_SHEET.pdf".to_string()),
    };

    let record = store.create(new_student("Alice", "alice@example.com"), refs).unwrap();

    assert_eq!(record.profile_image_ref.as_deref(), Some("1_aaaa_PHOTO.png"));
    assert_eq!(record.signature_image_ref, None);
    assert_eq!(record.sheet_image_ref.as_deref(), Some("2_bbbb_SHEET.pdf"));
    assert!(record.result.is_none());
}

#[test]
fn test_create_rejects_missing_fields() {
    let (_temp, store) = setup_store();

    let mut fields = new_student("Alice", "alice@example.com");
    fields.course = "   ".to_string();

    let err = store.create(fields, AttachmentRefs::default()).unwrap_err();
    match err {
        RollbookError::Validation { field, .. } => assert_eq!(field, "course"),
        other => panic!("unexpected error: {other:?}"),
    }
    assert!(store.load_all().unwrap().is_empty());
}

#[test]
fn test_create_rejects_email_without_at() {
    let (_temp, store) = setup_store();

    let err = store
        .create(new_student("Alice", "alice.example.com"), AttachmentRefs::default())
        .unwrap_err();
    assert!(matches!(err, RollbookError::Validation { .. }));
}

// =============================================================================
// Find Tests
// =============================================================================

#[test]
fn test_find_one_returns_first_match() {
    let (_temp, store) = setup_store();
    let first = store
        .create(new_student("Alice", "alice@example.com"), AttachmentRefs::default())
        .unwrap();
    store
        .create(new_student("Alice", "alice@example.com"), AttachmentRefs::default())
        .unwrap();

    let found = store
        .find_one(|r| r.name == "Alice" && r.email == "alice@example.com")
        .unwrap();
    assert_eq!(found.id, first.id);
}

#[test]
fn test_find_one_no_match_is_not_found() {
    let (_temp, store) = setup_store();
    let err = store.find_one(|r| r.name == "Nobody").unwrap_err();
    assert!(matches!(err, RollbookError::NotFound(_)));
}

// =============================================================================
// Update Tests
// =============================================================================

#[test]
fn test_update_merges_only_present_fields() {
    let (_temp, store) = setup_store();
    let created = store
        .create(new_student("Alice", "alice@example.com"), AttachmentRefs::default())
        .unwrap();

    let patch = StudentPatch {
        course: Some("Biology".to_string()),
        ..StudentPatch::default()
    };
    let updated = store.update_by_id(&created.id, patch, no_attachments).unwrap();

    assert_eq!(updated.id, created.id);
    assert_eq!(updated.course, "Biology");
    assert_eq!(updated.name, created.name);
    assert_eq!(updated.address, created.address);
    assert_eq!(store.load_all().unwrap().get(&created.id), Some(&updated));
}

#[test]
fn test_update_unknown_id_is_not_found() {
    let (_temp, store) = setup_store();
    let err = store
        .update_by_id("missing", StudentPatch::default(), no_attachments)
        .unwrap_err();
    assert!(matches!(err, RollbookError::NotFound(_)));
}

#[test]
fn test_update_attach_sees_prior_record() {
    let (_temp, store) = setup_store();
    let created = store
        .create(
            new_student("Alice", "alice@example.com"),
            AttachmentRefs {
                profile: Some("old.png".to_string()),
                ..AttachmentRefs::default()
            },
        )
        .unwrap();

    let updated = store
        .update_by_id(&created.id, StudentPatch::default(), |prior| {
            assert_eq!(prior.profile_image_ref.as_deref(), Some("old.png"));
            Ok(AttachmentRefs {
                profile: Some("new.png".to_string()),
                ..AttachmentRefs::default()
            })
        })
        .unwrap();

    assert_eq!(updated.profile_image_ref.as_deref(), Some("new.png"));
}

#[test]
fn test_update_failed_attach_persists_nothing() {
    let (_temp, store) = setup_store();
    let created = store
        .create(new_student("Alice", "alice@example.com"), AttachmentRefs::default())
        .unwrap();

    let patch = StudentPatch {
        name: Some("Alicia".to_string()),
        ..StudentPatch::default()
    };
    let err = store
        .update_by_id(&created.id, patch, |_| {
            Err(RollbookError::UnsupportedMediaType("x.gif".to_string()))
        })
        .unwrap_err();

    assert!(matches!(err, RollbookError::UnsupportedMediaType(_)));
    assert_eq!(store.load_all().unwrap().get(&created.id).unwrap().name, "Alice");
}

#[test]
fn test_patch_with_id_is_rejected() {
    let err = StudentPatch::from_json(r#"{"id": "other", "name": "Eve"}"#).unwrap_err();
    assert!(matches!(err, RollbookError::Validation { .. }));
}

#[test]
fn test_patch_from_json_reads_camel_case() {
    let patch = StudentPatch::from_json(r#"{"mobileNumber": "1112223333"}"#).unwrap();
    assert_eq!(patch.mobile_number.as_deref(), Some("1112223333"));
    assert!(patch.name.is_none());
}

#[test]
fn test_patch_rejects_blank_name() {
    let patch = StudentPatch {
        name: Some("".to_string()),
        ..StudentPatch::default()
    };
    assert!(patch.validate().is_err());
}

#[test]
fn test_update_rejects_non_finite_result_percentage() {
    let (_temp, store) = setup_store();
    let created = store
        .create(new_student("Alice", "alice@example.com"), AttachmentRefs::default())
        .unwrap();

    for percentage in [f64::NAN, f64::INFINITY] {
        let patch = StudentPatch {
            result: Some(filed_result(80, percentage)),
            ..StudentPatch::default()
        };
        let err = store.update_by_id(&created.id, patch, no_attachments).unwrap_err();
        assert!(matches!(err, RollbookError::Validation { .. }));
    }

    // The document still loads and holds no result
    let reloaded = store.load_all().unwrap();
    assert!(reloaded.get(&created.id).unwrap().result.is_none());
}

#[test]
fn test_patch_rejects_out_of_range_result() {
    let too_high = StudentPatch {
        result: Some(filed_result(250, 80.0)),
        ..StudentPatch::default()
    };
    assert!(matches!(too_high.validate(), Err(RollbookError::Validation { .. })));

    let over_hundred = StudentPatch {
        result: Some(filed_result(80, 180.0)),
        ..StudentPatch::default()
    };
    assert!(over_hundred.validate().is_err());

    let blank_roll = StudentPatch {
        result: Some(ResultRecord {
            roll_number: " ".to_string(),
            ..filed_result(80, 80.0)
        }),
        ..StudentPatch::default()
    };
    assert!(blank_roll.validate().is_err());

    let valid = StudentPatch {
        result: Some(filed_result(80, 80.0)),
        ..StudentPatch::default()
    };
    assert!(valid.validate().is_ok());
}

// =============================================================================
// Delete Tests
// =============================================================================

#[test]
fn test_delete_returns_remaining() {
    let (_temp, store) = setup_store();
    let alice = store
        .create(new_student("Alice", "alice@example.com"), AttachmentRefs::default())
        .unwrap();
    let bob = store
        .create(new_student("Bob", "bob@example.com"), AttachmentRefs::default())
        .unwrap();

    let deletion = store.delete_by_id(&alice.id).unwrap();

    assert_eq!(deletion.removed, alice);
    assert_eq!(deletion.remaining, vec![bob]);
}

#[test]
fn test_delete_twice_is_not_found() {
    let (_temp, store) = setup_store();
    let alice = store
        .create(new_student("Alice", "alice@example.com"), AttachmentRefs::default())
        .unwrap();

    store.delete_by_id(&alice.id).unwrap();
    let err = store.delete_by_id(&alice.id).unwrap_err();

    assert!(matches!(err, RollbookError::NotFound(_)));
}

// =============================================================================
// Collection Index Tests
// =============================================================================

#[test]
fn test_collection_rejects_duplicate_ids() {
    let (_temp, store) = setup_store();
    let alice = store
        .create(new_student("Alice", "alice@example.com"), AttachmentRefs::default())
        .unwrap();

    let err = Collection::new(vec![alice.clone(), alice]).unwrap_err();
    assert!(matches!(err, RollbookError::StoreCorrupt(_)));
}

#[test]
fn test_live_roll_index_follows_edits() {
    let (_temp, store) = setup_store();
    let alice = store
        .create(new_student("Alice", "alice@example.com"), AttachmentRefs::default())
        .unwrap();

    let mut collection = store.load_all().unwrap();
    assert_eq!(collection.with_live_roll("AL0410").count(), 1);

    collection
        .modify(&alice.id, |r| r.name = "Zed".to_string())
        .unwrap();

    assert_eq!(collection.with_live_roll("AL0410").count(), 0);
    assert_eq!(collection.with_live_roll("ZE0410").count(), 1);
}

#[test]
fn test_modify_cannot_change_id() {
    let (_temp, store) = setup_store();
    let alice = store
        .create(new_student("Alice", "alice@example.com"), AttachmentRefs::default())
        .unwrap();

    let mut collection = store.load_all().unwrap();
    let record = collection
        .modify(&alice.id, |r| r.id = "hijacked".to_string())
        .unwrap();

    assert_eq!(record.id, alice.id);
    assert!(collection.get("hijacked").is_none());
}

#[test]
fn test_underivable_record_is_not_indexed() {
    let (_temp, store) = setup_store();
    let mut fields = new_student("Alice", "alice@example.com");
    fields.mobile_number = "7".to_string();
    store.create(fields, AttachmentRefs::default()).unwrap();

    let collection = store.load_all().unwrap();
    assert_eq!(collection.len(), 1);
    assert_eq!(collection.with_live_roll("AL047").count(), 0);
}

// =============================================================================
// Lost Update Tests
// =============================================================================

#[test]
fn test_unsynchronized_writers_lose_an_update() {
    let (_temp, store) = setup_store();
    let store = Arc::new(store);
    let barrier = Arc::new(Barrier::new(2));

    let handles: Vec<_> = ["Alice", "Bob"]
        .into_iter()
        .map(|name| {
            let store = Arc::clone(&store);
            let barrier = Arc::clone(&barrier);
            thread::spawn(move || {
                let mut collection = store.load_all().unwrap();
                // Both writers hold the same (empty) snapshot
                barrier.wait();
                let email = format!("{}@example.com", name.to_lowercase());
                let record = StudentRecord {
                    id: format!("id-{}", name),
                    name: name.to_string(),
                    email,
                    course: "History".to_string(),
                    mobile_number: "9876543210".to_string(),
                    date_of_birth: "2004-05-19".to_string(),
                    address: String::new(),
                    profile_image_ref: None,
                    signature_image_ref: None,
                    sheet_image_ref: None,
                    result: None,
                };
                collection.insert(record).unwrap();
                store.save_all(&collection).unwrap();
            })
        })
        .collect();

    for handle in handles {
        handle.join().unwrap();
    }

    // Last save wins
    assert_eq!(store.load_all().unwrap().len(), 1);
}

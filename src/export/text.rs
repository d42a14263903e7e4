//! Plain-text rendering, one block per student

use crate::record::StudentRecord;

pub(super) fn render(records: &[StudentRecord]) -> String {
    let mut out = String::new();
    for record in records {
        out.push_str(&format!("Name: {}\n", record.name));
        out.push_str(&format!("Course: {}\n", record.course));
        out.push_str(&format!("Email: {}\n", record.email));
        out.push_str(&format!("Mobile: {}\n\n", record.mobile_number));
    }
    out
}

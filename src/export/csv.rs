//! CSV rendering (RFC 4180 quoting)

use crate::record::StudentRecord;

const HEADER: [&str; 13] = [
    "id",
    "name",
    "email",
    "course",
    "mobileNumber",
    "dateOfBirth",
    "address",
    "profileImageRef",
    "signatureImageRef",
    "sheetImageRef",
    "rollNumber",
    "total",
    "percentage",
];

pub(super) fn render(records: &[StudentRecord]) -> String {
    let mut out = String::new();
    push_row(&mut out, HEADER.iter().map(|h| h.to_string()));

    for record in records {
        let result = record.result.as_ref();
        let row = [
            record.id.clone(),
            record.name.clone(),
            record.email.clone(),
            record.course.clone(),
            record.mobile_number.clone(),
            record.date_of_birth.clone(),
            record.address.clone(),
            record.profile_image_ref.clone().unwrap_or_default(),
            record.signature_image_ref.clone().unwrap_or_default(),
            record.sheet_image_ref.clone().unwrap_or_default(),
            result.map(|r| r.roll_number.clone()).unwrap_or_default(),
            result.map(|r| r.total.to_string()).unwrap_or_default(),
            result.map(|r| r.percentage.to_string()).unwrap_or_default(),
        ];
        push_row(&mut out, row.into_iter());
    }

    out
}

fn push_row(out: &mut String, fields: impl Iterator<Item = String>) {
    for (i, field) in fields.enumerate() {
        if i > 0 {
            out.push(',');
        }
        out.push_str(&quote(&field));
    }
    out.push_str("\r\n");
}

fn quote(field: &str) -> String {
    if field.contains([',', '"', '\r', '\n']) {
        format!("\"{}\"", field.replace('"', "\"\""))
    } else {
        field.to_string()
    }
}

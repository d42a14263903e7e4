//! XML rendering
//!
//! ```text
//! <?xml version="1.0" encoding="UTF-8"?>
//! <students>
//!   <student>
//!     <id>…</id> … <result><rollNumber>…</rollNumber><scores><score subject="math">90</score>…
//!   </student>
//! </students>
//! ```

use crate::record::StudentRecord;

pub(super) fn render(records: &[StudentRecord]) -> String {
    let mut out = String::from("<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n<students>\n");

    for record in records {
        out.push_str("  <student>\n");
        element(&mut out, 4, "id", &record.id);
        element(&mut out, 4, "name", &record.name);
        element(&mut out, 4, "email", &record.email);
        element(&mut out, 4, "course", &record.course);
        element(&mut out, 4, "mobileNumber", &record.mobile_number);
        element(&mut out, 4, "dateOfBirth", &record.date_of_birth);
        element(&mut out, 4, "address", &record.address);
        optional(&mut out, "profileImageRef", record.profile_image_ref.as_deref());
        optional(&mut out, "signatureImageRef", record.signature_image_ref.as_deref());
        optional(&mut out, "sheetImageRef", record.sheet_image_ref.as_deref());

        if let Some(result) = &record.result {
            out.push_str("    <result>\n");
            element(&mut out, 6, "rollNumber", &result.roll_number);
            out.push_str("      <scores>\n");
            for (subject, score) in &result.scores {
                out.push_str(&format!(
                    "        <score subject=\"{}\">{}</score>\n",
                    escape(subject),
                    score
                ));
            }
            out.push_str("      </scores>\n");
            element(&mut out, 6, "total", &result.total.to_string());
            element(&mut out, 6, "percentage", &result.percentage.to_string());
            out.push_str("    </result>\n");
        }

        out.push_str("  </student>\n");
    }

    out.push_str("</students>\n");
    out
}

fn element(out: &mut String, indent: usize, tag: &str, value: &str) {
    out.push_str(&format!(
        "{:indent$}<{tag}>{}</{tag}>\n",
        "",
        escape(value),
        indent = indent,
        tag = tag
    ));
}

fn optional(out: &mut String, tag: &str, value: Option<&str>) {
    match value {
        Some(v) => element(out, 4, tag, v),
        None => out.push_str(&format!("    <{}/>\n", tag)),
    }
}

fn escape(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&apos;"),
            c => escaped.push(c),
        }
    }
    escaped
}

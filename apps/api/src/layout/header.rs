//! Header extraction: promotes the name, email and phone records to the top
//! block and passes every other record through to the body, in order.

use crate::models::resume::ResumeRecord;

const NAME_KEYWORDS: &[&str] = &["фио", "полное имя", "имя", "full name", "name"];
const EMAIL_KEYWORDS: &[&str] = &[
    "email",
    "e-mail",
    "почта",
    "электронная почта",
    "эл. почта",
    "mail",
];
const PHONE_KEYWORDS: &[&str] = &[
    "телефон",
    "номер телефона",
    "мобильный телефон",
    "phone",
    "phone number",
    "mobile",
    "tel",
];

/// Shown in place of the name when no record supplies one.
pub const NAME_PLACEHOLDER: &str = "N/A";
pub const CONTACT_SEPARATOR: &str = " | ";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum HeaderField {
    Name,
    Email,
    Phone,
}

/// Fixed check order: a label is tested against name, then email, then phone.
const FIELD_ORDER: [(HeaderField, &[&str]); 3] = [
    (HeaderField::Name, NAME_KEYWORDS),
    (HeaderField::Email, EMAIL_KEYWORDS),
    (HeaderField::Phone, PHONE_KEYWORDS),
];

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HeaderFields {
    pub name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
}

impl HeaderFields {
    pub fn display_name(&self) -> &str {
        self.name.as_deref().unwrap_or(NAME_PLACEHOLDER)
    }

    /// Email and phone joined by `CONTACT_SEPARATOR`; `None` when neither resolved.
    /// Absent fields are left out rather than rendered as placeholders.
    pub fn contact_line(&self) -> Option<String> {
        let parts: Vec<&str> = [self.email.as_deref(), self.phone.as_deref()]
            .into_iter()
            .flatten()
            .collect();
        (!parts.is_empty()).then(|| parts.join(CONTACT_SEPARATOR))
    }

    fn slot(&mut self, field: HeaderField) -> &mut Option<String> {
        match field {
            HeaderField::Name => &mut self.name,
            HeaderField::Email => &mut self.email,
            HeaderField::Phone => &mut self.phone,
        }
    }
}

/// Drops records whose label or value is blank. Surviving records are trimmed.
pub fn normalize_records(records: &[ResumeRecord]) -> Vec<ResumeRecord> {
    records
        .iter()
        .filter(|r| !r.is_blank())
        .map(|r| ResumeRecord::new(r.label.trim(), r.value.trim()))
        .collect()
}

/// Splits normalized records into header fields and body records.
///
/// Labels are matched by exact membership after trim + lowercase, never by
/// substring, so "Email marketing experience" stays in the body. The first
/// record matching a field wins; later synonyms fall through to the body.
pub fn extract_header(records: Vec<ResumeRecord>) -> (HeaderFields, Vec<ResumeRecord>) {
    let mut header = HeaderFields::default();
    let mut body = Vec::with_capacity(records.len());

    for record in records {
        let key = record.label.trim().to_lowercase();
        let field = FIELD_ORDER
            .iter()
            .find(|(_, keywords)| keywords.contains(&key.as_str()))
            .map(|(field, _)| *field);

        if let Some(field) = field {
            let slot = header.slot(field);
            if slot.is_none() {
                *slot = Some(record.value);
                continue;
            }
        }
        body.push(record);
    }

    (header, body)
}

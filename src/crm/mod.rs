use std::{
    collections::HashMap,
    sync::OnceLock,
};

use regex::Regex;
use serde::Deserialize;
use serde_json::{
    Map,
    Value,
};

pub mod contact;
pub mod order;
pub mod quote;
pub mod task;

pub use contact::{
    Contact,
    ContactForm,
    ContactService,
};
pub use order::{
    Order,
    OrderForm,
    OrderService,
};
pub use quote::{
    Quote,
    QuoteForm,
    QuoteService,
};
pub use task::{
    Task,
    TaskForm,
    TaskService,
};

/// Per-field validation messages produced before anything goes on the wire.
pub type FieldErrors = HashMap<&'static str, String>;

/// A lookup field as the store hands it back: expanded to `{Id, Name}` on
/// read, but a bare integer id on older rows and always a bare id on write.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum Reference {
    Expanded {
        #[serde(rename = "Id")]
        id: i64,
        #[serde(rename = "Name", default)]
        name: String,
    },
    Id(i64),
}

impl Reference {
    pub fn id(&self) -> i64 {
        match self {
            Reference::Expanded { id, .. } => *id,
            Reference::Id(id) => *id,
        }
    }

    pub fn name(&self) -> &str {
        match self {
            Reference::Expanded { name, .. } => name,
            Reference::Id(_) => "",
        }
    }
}

/// Splits comma-joined tag text into trimmed, non-empty tokens.
pub fn split_tags(raw: &str) -> Vec<String> {
    raw.split(',').map(str::trim).filter(|tag| !tag.is_empty()).map(str::to_string).collect()
}

pub(crate) fn put_text(record: &mut Map<String, Value>, field: &str, value: &str) {
    record.insert(field.to_string(), Value::from(value));
}

/// Empty numeric input is omitted entirely; the store rejects `""` where it
/// expects a number.
pub(crate) fn put_number(record: &mut Map<String, Value>, field: &str, raw: &str) {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return;
    }
    if let Ok(number) = trimmed.parse::<f64>() {
        if let Some(number) = serde_json::Number::from_f64(number) {
            record.insert(field.to_string(), Value::Number(number));
        }
    }
}

/// Reference selections arrive as raw id strings from a dropdown and are
/// written as bare integer ids.
pub(crate) fn put_reference(record: &mut Map<String, Value>, field: &str, raw: &str) {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return;
    }
    if let Ok(id) = trimmed.parse::<i64>() {
        record.insert(field.to_string(), Value::from(id));
    }
}

pub(crate) fn issues_from(errors: FieldErrors) -> Vec<crate::core::FieldIssue> {
    errors
        .into_iter()
        .map(|(field, message)| crate::core::FieldIssue { field: Some(field.to_string()), message })
        .collect()
}

pub(crate) fn is_valid_email(email: &str) -> bool {
    static EMAIL: OnceLock<Regex> = OnceLock::new();
    EMAIL
        .get_or_init(|| Regex::new(r"^\S+@\S+\.\S+$").unwrap())
        .is_match(email)
}

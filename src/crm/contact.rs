use std::sync::Arc;

use chrono::{
    DateTime,
    Utc,
};
use log::error;
use serde::Deserialize;
use serde_json::{
    Map,
    Value,
};

use super::{
    is_valid_email,
    issues_from,
    put_text,
    split_tags,
    FieldErrors,
};
use crate::{
    core::FlowCrmError,
    store::{
        FetchParams,
        FieldSelector,
        RecordClient,
        SortType,
    },
    view::{
        ListRow,
        SortValue,
    },
};

pub const TABLE: &str = "contact_c";

pub const STATUS_OPTIONS: [&str; 3] = ["lead", "active", "inactive"];

/// A row of `contact_c`. Contact tags are list-valued on the store side.
#[derive(Debug, Clone, Deserialize)]
pub struct Contact {
    #[serde(rename = "Id")]
    pub id: i64,
    #[serde(rename = "Name", default)]
    pub name: Option<String>,
    #[serde(rename = "Tags", default)]
    pub tags: Vec<String>,
    #[serde(rename = "CreatedOn", default)]
    pub created_on: Option<DateTime<Utc>>,
    #[serde(rename = "ModifiedOn", default)]
    pub modified_on: Option<DateTime<Utc>>,
    #[serde(default)]
    pub first_name_c: Option<String>,
    #[serde(default)]
    pub last_name_c: Option<String>,
    #[serde(default)]
    pub email_c: Option<String>,
    #[serde(default)]
    pub phone_c: Option<String>,
    #[serde(default)]
    pub company_c: Option<String>,
    #[serde(default)]
    pub job_title_c: Option<String>,
    #[serde(default)]
    pub status_c: Option<String>,
    #[serde(default)]
    pub notes_c: Option<String>,
}

pub fn field_selectors() -> Vec<FieldSelector> {
    vec![
        FieldSelector::plain("Id"),
        FieldSelector::plain("Name"),
        FieldSelector::plain("Tags"),
        FieldSelector::plain("Owner"),
        FieldSelector::plain("CreatedOn"),
        FieldSelector::plain("CreatedBy"),
        FieldSelector::plain("ModifiedOn"),
        FieldSelector::plain("ModifiedBy"),
        FieldSelector::plain("first_name_c"),
        FieldSelector::plain("last_name_c"),
        FieldSelector::plain("email_c"),
        FieldSelector::plain("phone_c"),
        FieldSelector::plain("company_c"),
        FieldSelector::plain("job_title_c"),
        FieldSelector::plain("status_c"),
        FieldSelector::plain("notes_c"),
    ]
}

#[derive(Debug, Clone, PartialEq)]
pub struct ContactForm {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub phone: String,
    pub company: String,
    pub job_title: String,
    pub status: String,
    pub notes: String,
    /// Comma-joined in the form; split into a list on submit.
    pub tags: String,
}

impl Default for ContactForm {
    fn default() -> Self {
        Self {
            first_name: String::new(),
            last_name: String::new(),
            email: String::new(),
            phone: String::new(),
            company: String::new(),
            job_title: String::new(),
            status: "lead".to_string(),
            notes: String::new(),
            tags: String::new(),
        }
    }
}

impl ContactForm {
    pub fn from_record(contact: &Contact) -> Self {
        Self {
            first_name: contact.first_name_c.clone().unwrap_or_default(),
            last_name: contact.last_name_c.clone().unwrap_or_default(),
            email: contact.email_c.clone().unwrap_or_default(),
            phone: contact.phone_c.clone().unwrap_or_default(),
            company: contact.company_c.clone().unwrap_or_default(),
            job_title: contact.job_title_c.clone().unwrap_or_default(),
            status: match contact.status_c.as_deref() {
                Some(status) if !status.is_empty() => status.to_string(),
                _ => "lead".to_string(),
            },
            notes: contact.notes_c.clone().unwrap_or_default(),
            tags: contact.tags.join(", "),
        }
    }

    pub fn validate(&self) -> FieldErrors {
        let mut errors = FieldErrors::new();
        if self.first_name.trim().is_empty() {
            errors.insert("first_name_c", "First name is required".to_string());
        }
        if self.email.trim().is_empty() {
            errors.insert("email_c", "Email is required".to_string());
        } else if !is_valid_email(self.email.trim()) {
            errors.insert("email_c", "Email is invalid".to_string());
        }
        if self.company.trim().is_empty() {
            errors.insert("company_c", "Company is required".to_string());
        }
        errors
    }

    pub fn to_payload(&self) -> Map<String, Value> {
        let mut record = Map::new();
        let full_name = format!("{} {}", self.first_name.trim(), self.last_name.trim());
        put_text(&mut record, "Name", full_name.trim());
        put_text(&mut record, "first_name_c", &self.first_name);
        put_text(&mut record, "last_name_c", &self.last_name);
        put_text(&mut record, "email_c", &self.email);
        put_text(&mut record, "phone_c", &self.phone);
        put_text(&mut record, "company_c", &self.company);
        put_text(&mut record, "job_title_c", &self.job_title);
        put_text(&mut record, "status_c", &self.status);
        put_text(&mut record, "notes_c", &self.notes);
        record.insert(
            "Tags".to_string(),
            Value::Array(split_tags(&self.tags).into_iter().map(Value::from).collect()),
        );
        record
    }
}

pub struct ContactService {
    client: Arc<RecordClient>,
}

impl ContactService {
    pub fn new(client: Arc<RecordClient>) -> Self {
        Self { client }
    }

    pub async fn get_all(&self) -> Vec<Contact> {
        let params =
            FetchParams::new(field_selectors()).order_by("CreatedOn", SortType::Desc);
        match self.client.fetch_records(TABLE, &params).await {
            Ok(contacts) => contacts,
            Err(err) => {
                error!("Error fetching contacts: {}", err);
                Vec::new()
            }
        }
    }

    pub async fn get_by_id(&self, id: i64) -> Result<Option<Contact>, FlowCrmError> {
        self.client.get_record_by_id(TABLE, id, field_selectors()).await
    }

    pub async fn create(&self, form: &ContactForm) -> Result<Contact, FlowCrmError> {
        let errors = form.validate();
        if !errors.is_empty() {
            return Err(FlowCrmError::Validation {
                message: "Contact form is invalid".to_string(),
                errors: issues_from(errors),
            });
        }
        self.client.create_record(TABLE, form.to_payload()).await
    }

    pub async fn update(&self, id: i64, form: &ContactForm) -> Result<Contact, FlowCrmError> {
        let errors = form.validate();
        if !errors.is_empty() {
            return Err(FlowCrmError::Validation {
                message: "Contact form is invalid".to_string(),
                errors: issues_from(errors),
            });
        }
        self.client.update_record(TABLE, id, form.to_payload()).await
    }

    pub async fn delete(&self, id: i64) -> Result<(), FlowCrmError> {
        self.client.delete_records(TABLE, &[id]).await
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContactSortKey {
    FirstName,
    Company,
    CreatedOn,
}

impl ListRow for Contact {
    type SortKey = ContactSortKey;

    fn id(&self) -> i64 {
        self.id
    }

    fn search_fields(&self) -> Vec<&str> {
        vec![
            self.first_name_c.as_deref().unwrap_or(""),
            self.last_name_c.as_deref().unwrap_or(""),
            self.email_c.as_deref().unwrap_or(""),
            self.company_c.as_deref().unwrap_or(""),
        ]
    }

    fn filter_value(&self, field: &str) -> Option<&str> {
        match field {
            "status_c" => self.status_c.as_deref(),
            _ => None,
        }
    }

    fn sort_value(&self, key: ContactSortKey) -> SortValue {
        match key {
            ContactSortKey::FirstName => {
                SortValue::text(self.first_name_c.as_deref().unwrap_or(""))
            }
            ContactSortKey::Company => SortValue::text(self.company_c.as_deref().unwrap_or("")),
            ContactSortKey::CreatedOn => SortValue::timestamp(self.created_on),
        }
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn payload_splits_tags_into_a_trimmed_list() {
        let form = ContactForm {
            first_name: "Sara".to_string(),
            last_name: "Lee".to_string(),
            email: "sara@acme.com".to_string(),
            company: "Acme Corp".to_string(),
            tags: "enterprise, tech, saas".to_string(),
            ..ContactForm::default()
        };

        let payload = form.to_payload();
        assert_eq!(payload["Tags"], json!(["enterprise", "tech", "saas"]));
        assert_eq!(payload["Name"], json!("Sara Lee"));
        assert_eq!(payload["status_c"], json!("lead"));
    }

    #[test]
    fn form_round_trips_list_tags_through_comma_text() {
        let contact: Contact = serde_json::from_value(json!({
            "Id": 3,
            "Name": "Sara Lee",
            "Tags": ["enterprise", "tech"],
            "first_name_c": "Sara",
            "last_name_c": "Lee",
            "email_c": "sara@acme.com",
            "company_c": "Acme Corp",
            "status_c": "active"
        }))
        .unwrap();

        let form = ContactForm::from_record(&contact);
        assert_eq!(form.tags, "enterprise, tech");
        assert_eq!(form.status, "active");

        let payload = form.to_payload();
        assert_eq!(payload["Tags"], json!(["enterprise", "tech"]));
    }

    #[test]
    fn validate_checks_required_fields_and_email_format() {
        let form = ContactForm::default();
        let errors = form.validate();
        assert!(errors.contains_key("first_name_c"));
        assert!(errors.contains_key("email_c"));
        assert!(errors.contains_key("company_c"));

        let form = ContactForm {
            first_name: "Sara".to_string(),
            email: "not-an-email".to_string(),
            company: "Acme Corp".to_string(),
            ..ContactForm::default()
        };
        let errors = form.validate();
        assert_eq!(errors.get("email_c").map(String::as_str), Some("Email is invalid"));
        assert_eq!(errors.len(), 1);
    }

    #[test]
    fn missing_custom_fields_fall_back_to_defaults() {
        let contact: Contact = serde_json::from_value(json!({ "Id": 9 })).unwrap();
        let form = ContactForm::from_record(&contact);
        assert_eq!(form.first_name, "");
        assert_eq!(form.status, "lead");
        assert_eq!(form.tags, "");
    }
}

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
    issues_from,
    put_text,
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

pub const TABLE: &str = "tasks_c";

pub const STATUS_OPTIONS: [&str; 3] = ["Open", "In Progress", "Completed"];
pub const PRIORITY_OPTIONS: [&str; 3] = ["Low", "Medium", "High"];

/// A row of `tasks_c`. `Tags` is a flat delimited string for tasks, unlike
/// the list-valued contact tags.
#[derive(Debug, Clone, Deserialize)]
pub struct Task {
    #[serde(rename = "Id")]
    pub id: i64,
    #[serde(rename = "Name", default)]
    pub name: Option<String>,
    #[serde(rename = "Tags", default)]
    pub tags: Option<String>,
    #[serde(rename = "CreatedOn", default)]
    pub created_on: Option<DateTime<Utc>>,
    #[serde(rename = "ModifiedOn", default)]
    pub modified_on: Option<DateTime<Utc>>,
    #[serde(default)]
    pub name_c: Option<String>,
    #[serde(default)]
    pub description_c: Option<String>,
    #[serde(default)]
    pub status_c: Option<String>,
    #[serde(default)]
    pub due_date_c: Option<String>,
    #[serde(default)]
    pub priority_c: Option<String>,
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
        FieldSelector::plain("name_c"),
        FieldSelector::plain("description_c"),
        FieldSelector::plain("status_c"),
        FieldSelector::plain("due_date_c"),
        FieldSelector::plain("priority_c"),
    ]
}

/// Flat, always-populated shape bound to the task form inputs.
#[derive(Debug, Clone, PartialEq)]
pub struct TaskForm {
    pub name: String,
    pub description: String,
    pub status: String,
    pub due_date: String,
    pub priority: String,
    pub tags: String,
}

impl Default for TaskForm {
    fn default() -> Self {
        Self {
            name: String::new(),
            description: String::new(),
            status: "Open".to_string(),
            due_date: String::new(),
            priority: "Medium".to_string(),
            tags: String::new(),
        }
    }
}

impl TaskForm {
    pub fn from_record(task: &Task) -> Self {
        Self {
            name: task.name_c.clone().unwrap_or_default(),
            description: task.description_c.clone().unwrap_or_default(),
            status: non_empty_or(task.status_c.as_deref(), "Open"),
            due_date: task.due_date_c.clone().unwrap_or_default(),
            priority: non_empty_or(task.priority_c.as_deref(), "Medium"),
            tags: task.tags.clone().unwrap_or_default(),
        }
    }

    pub fn validate(&self) -> FieldErrors {
        let mut errors = FieldErrors::new();
        if self.name.trim().is_empty() {
            errors.insert("name_c", "Task name is required".to_string());
        }
        if self.status.trim().is_empty() {
            errors.insert("status_c", "Status is required".to_string());
        }
        if self.priority.trim().is_empty() {
            errors.insert("priority_c", "Priority is required".to_string());
        }
        errors
    }

    /// Every form field goes back on the wire each time; update is
    /// idempotent per field so resending unchanged values is safe.
    pub fn to_payload(&self) -> Map<String, Value> {
        let mut record = Map::new();
        put_text(&mut record, "name_c", &self.name);
        put_text(&mut record, "description_c", &self.description);
        put_text(&mut record, "status_c", &self.status);
        put_text(&mut record, "due_date_c", &self.due_date);
        put_text(&mut record, "priority_c", &self.priority);
        put_text(&mut record, "Tags", &self.tags);
        record
    }
}

fn non_empty_or(value: Option<&str>, fallback: &str) -> String {
    match value {
        Some(value) if !value.is_empty() => value.to_string(),
        _ => fallback.to_string(),
    }
}

pub struct TaskService {
    client: Arc<RecordClient>,
}

impl TaskService {
    pub fn new(client: Arc<RecordClient>) -> Self {
        Self { client }
    }

    /// Full table snapshot, newest first. Degrades to empty on any failure.
    pub async fn get_all(&self) -> Vec<Task> {
        let params =
            FetchParams::new(field_selectors()).order_by("CreatedOn", SortType::Desc);
        match self.client.fetch_records(TABLE, &params).await {
            Ok(tasks) => tasks,
            Err(err) => {
                error!("Error fetching tasks: {}", err);
                Vec::new()
            }
        }
    }

    pub async fn get_by_id(&self, id: i64) -> Result<Option<Task>, FlowCrmError> {
        self.client.get_record_by_id(TABLE, id, field_selectors()).await
    }

    pub async fn create(&self, form: &TaskForm) -> Result<Task, FlowCrmError> {
        let errors = form.validate();
        if !errors.is_empty() {
            return Err(FlowCrmError::Validation {
                message: "Task form is invalid".to_string(),
                errors: issues_from(errors),
            });
        }
        self.client.create_record(TABLE, form.to_payload()).await
    }

    pub async fn update(&self, id: i64, form: &TaskForm) -> Result<Task, FlowCrmError> {
        let errors = form.validate();
        if !errors.is_empty() {
            return Err(FlowCrmError::Validation {
                message: "Task form is invalid".to_string(),
                errors: issues_from(errors),
            });
        }
        self.client.update_record(TABLE, id, form.to_payload()).await
    }

    pub async fn delete(&self, id: i64) -> Result<(), FlowCrmError> {
        self.client.delete_records(TABLE, &[id]).await
    }

    pub async fn delete_many(&self, ids: &[i64]) -> Result<(), FlowCrmError> {
        self.client.delete_records(TABLE, ids).await
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskSortKey {
    Name,
    DueDate,
    CreatedOn,
}

impl ListRow for Task {
    type SortKey = TaskSortKey;

    fn id(&self) -> i64 {
        self.id
    }

    fn search_fields(&self) -> Vec<&str> {
        vec![
            self.name_c.as_deref().unwrap_or(""),
            self.description_c.as_deref().unwrap_or(""),
            self.name.as_deref().unwrap_or(""),
        ]
    }

    fn filter_value(&self, field: &str) -> Option<&str> {
        match field {
            "status_c" => self.status_c.as_deref(),
            "priority_c" => self.priority_c.as_deref(),
            _ => None,
        }
    }

    fn sort_value(&self, key: TaskSortKey) -> SortValue {
        match key {
            TaskSortKey::Name => SortValue::text(self.name_c.as_deref().unwrap_or("")),
            TaskSortKey::DueDate => SortValue::date(self.due_date_c.as_deref()),
            TaskSortKey::CreatedOn => SortValue::timestamp(self.created_on),
        }
    }
}

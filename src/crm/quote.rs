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
    put_number,
    put_reference,
    put_text,
    FieldErrors,
    Reference,
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
        pipeline::is_all_sentinel,
        ListRow,
        SortValue,
    },
};

pub const TABLE: &str = "quote_c";

pub const STATUS_OPTIONS: [&str; 4] = ["Draft", "Sent", "Accepted", "Rejected"];

#[derive(Debug, Clone, Deserialize)]
pub struct Quote {
    #[serde(rename = "Id")]
    pub id: i64,
    #[serde(rename = "Name", default)]
    pub name: Option<String>,
    #[serde(rename = "CreatedOn", default)]
    pub created_on: Option<DateTime<Utc>>,
    #[serde(rename = "ModifiedOn", default)]
    pub modified_on: Option<DateTime<Utc>>,
    #[serde(default)]
    pub quote_number_c: Option<String>,
    #[serde(default)]
    pub deal_id_c: Option<Reference>,
    #[serde(default)]
    pub company_id_c: Option<Reference>,
    #[serde(default)]
    pub contact_id_c: Option<Reference>,
    #[serde(default)]
    pub amount_c: Option<f64>,
    #[serde(default)]
    pub status_c: Option<String>,
    #[serde(default)]
    pub valid_until_c: Option<String>,
    #[serde(default)]
    pub terms_c: Option<String>,
    #[serde(default)]
    pub notes_c: Option<String>,
}

pub fn field_selectors() -> Vec<FieldSelector> {
    vec![
        FieldSelector::plain("Id"),
        FieldSelector::plain("Name"),
        FieldSelector::plain("CreatedOn"),
        FieldSelector::plain("ModifiedOn"),
        FieldSelector::plain("quote_number_c"),
        FieldSelector::lookup("deal_id_c", "Name"),
        FieldSelector::lookup("company_id_c", "Name"),
        FieldSelector::lookup("contact_id_c", "Name"),
        FieldSelector::plain("amount_c"),
        FieldSelector::plain("status_c"),
        FieldSelector::plain("valid_until_c"),
        FieldSelector::plain("terms_c"),
        FieldSelector::plain("notes_c"),
    ]
}

#[derive(Debug, Clone, PartialEq)]
pub struct QuoteForm {
    pub name: String,
    pub quote_number: String,
    pub deal_id: String,
    pub company_id: String,
    pub contact_id: String,
    pub amount: String,
    pub status: String,
    pub valid_until: String,
    pub terms: String,
    pub notes: String,
}

impl Default for QuoteForm {
    fn default() -> Self {
        Self {
            name: String::new(),
            quote_number: String::new(),
            deal_id: String::new(),
            company_id: String::new(),
            contact_id: String::new(),
            amount: String::new(),
            status: "Draft".to_string(),
            valid_until: String::new(),
            terms: String::new(),
            notes: String::new(),
        }
    }
}

impl QuoteForm {
    pub fn from_record(quote: &Quote) -> Self {
        let reference_id = |reference: &Option<Reference>| {
            reference.as_ref().map(|r| r.id().to_string()).unwrap_or_default()
        };
        Self {
            name: quote.name.clone().unwrap_or_default(),
            quote_number: quote.quote_number_c.clone().unwrap_or_default(),
            deal_id: reference_id(&quote.deal_id_c),
            company_id: reference_id(&quote.company_id_c),
            contact_id: reference_id(&quote.contact_id_c),
            amount: quote.amount_c.map(|amount| amount.to_string()).unwrap_or_default(),
            status: match quote.status_c.as_deref() {
                Some(status) if !status.is_empty() => status.to_string(),
                _ => "Draft".to_string(),
            },
            valid_until: quote.valid_until_c.clone().unwrap_or_default(),
            terms: quote.terms_c.clone().unwrap_or_default(),
            notes: quote.notes_c.clone().unwrap_or_default(),
        }
    }

    pub fn validate(&self) -> FieldErrors {
        let mut errors = FieldErrors::new();
        if self.name.trim().is_empty() {
            errors.insert("Name", "Quote name is required".to_string());
        }
        if self.status.trim().is_empty() {
            errors.insert("status_c", "Status is required".to_string());
        }
        let amount = self.amount.trim();
        if amount.is_empty() {
            errors.insert("amount_c", "Amount is required".to_string());
        } else if amount.parse::<f64>().is_err() {
            errors.insert("amount_c", "Amount must be a number".to_string());
        }
        errors
    }

    /// Quotes write only the fields the form actually holds a value for;
    /// absent keys are preserved server-side.
    pub fn to_payload(&self) -> Map<String, Value> {
        let mut record = Map::new();
        let mut put_nonempty = |field: &str, value: &str| {
            if !value.trim().is_empty() {
                put_text(&mut record, field, value);
            }
        };
        put_nonempty("Name", &self.name);
        put_nonempty("quote_number_c", &self.quote_number);
        put_nonempty("status_c", &self.status);
        put_nonempty("valid_until_c", &self.valid_until);
        put_nonempty("terms_c", &self.terms);
        put_nonempty("notes_c", &self.notes);
        put_reference(&mut record, "deal_id_c", &self.deal_id);
        put_reference(&mut record, "company_id_c", &self.company_id);
        put_reference(&mut record, "contact_id_c", &self.contact_id);
        put_number(&mut record, "amount_c", &self.amount);
        record
    }
}

pub struct QuoteService {
    client: Arc<RecordClient>,
}

impl QuoteService {
    pub fn new(client: Arc<RecordClient>) -> Self {
        Self { client }
    }

    pub async fn get_all(&self) -> Vec<Quote> {
        let params =
            FetchParams::new(field_selectors()).order_by("CreatedOn", SortType::Desc);
        match self.client.fetch_records(TABLE, &params).await {
            Ok(quotes) => quotes,
            Err(err) => {
                error!("Error fetching quotes: {}", err);
                Vec::new()
            }
        }
    }

    /// Snapshot narrowed server-side: free-text OR-search across name and
    /// quote number plus an exact status predicate.
    pub async fn search(&self, term: &str, status: &str) -> Vec<Quote> {
        let mut params = FetchParams::new(field_selectors())
            .order_by("CreatedOn", SortType::Desc)
            .search(term, &["Name", "quote_number_c"]);
        if !is_all_sentinel(status) && !status.is_empty() {
            params = params.where_equals("status_c", status);
        }
        match self.client.fetch_records(TABLE, &params).await {
            Ok(quotes) => quotes,
            Err(err) => {
                error!("Error searching quotes: {}", err);
                Vec::new()
            }
        }
    }

    pub async fn get_by_id(&self, id: i64) -> Result<Quote, FlowCrmError> {
        self.client
            .get_record_by_id(TABLE, id, field_selectors())
            .await?
            .ok_or_else(|| FlowCrmError::NotFound { table: TABLE.to_string(), id })
    }

    pub async fn create(&self, form: &QuoteForm) -> Result<Quote, FlowCrmError> {
        let errors = form.validate();
        if !errors.is_empty() {
            return Err(FlowCrmError::Validation {
                message: "Quote form is invalid".to_string(),
                errors: issues_from(errors),
            });
        }
        self.client.create_record(TABLE, form.to_payload()).await
    }

    pub async fn update(&self, id: i64, form: &QuoteForm) -> Result<Quote, FlowCrmError> {
        let errors = form.validate();
        if !errors.is_empty() {
            return Err(FlowCrmError::Validation {
                message: "Quote form is invalid".to_string(),
                errors: issues_from(errors),
            });
        }
        self.client.update_record(TABLE, id, form.to_payload()).await
    }

    /// Deletes one or many; a partially failed batch surfaces as
    /// `PartialBatch` with the failing subset's message.
    pub async fn delete(&self, ids: &[i64]) -> Result<(), FlowCrmError> {
        self.client.delete_records(TABLE, ids).await
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QuoteSortKey {
    Name,
    Amount,
    ValidUntil,
    CreatedOn,
}

impl ListRow for Quote {
    type SortKey = QuoteSortKey;

    fn id(&self) -> i64 {
        self.id
    }

    fn search_fields(&self) -> Vec<&str> {
        vec![
            self.name.as_deref().unwrap_or(""),
            self.quote_number_c.as_deref().unwrap_or(""),
        ]
    }

    fn filter_value(&self, field: &str) -> Option<&str> {
        match field {
            "status_c" => self.status_c.as_deref(),
            _ => None,
        }
    }

    fn sort_value(&self, key: QuoteSortKey) -> SortValue {
        match key {
            QuoteSortKey::Name => SortValue::text(self.name.as_deref().unwrap_or("")),
            QuoteSortKey::Amount => SortValue::number(self.amount_c),
            QuoteSortKey::ValidUntil => SortValue::date(self.valid_until_c.as_deref()),
            QuoteSortKey::CreatedOn => SortValue::timestamp(self.created_on),
        }
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::view::{
        ListState,
        SortDirection,
        SortState,
    };

    fn quote(id: i64, name: &str, amount: Option<f64>, status: &str) -> Quote {
        Quote {
            id,
            name: Some(name.to_string()),
            created_on: None,
            modified_on: None,
            quote_number_c: None,
            deal_id_c: None,
            company_id_c: None,
            contact_id_c: None,
            amount_c: amount,
            status_c: Some(status.to_string()),
            valid_until_c: None,
            terms_c: None,
            notes_c: None,
        }
    }

    #[test]
    fn payload_omits_everything_the_form_left_blank() {
        let form = QuoteForm {
            name: "Acme renewal".to_string(),
            amount: "2500".to_string(),
            ..QuoteForm::default()
        };

        let payload = form.to_payload();
        assert_eq!(payload["Name"], json!("Acme renewal"));
        assert_eq!(payload["amount_c"], json!(2500.0));
        assert_eq!(payload["status_c"], json!("Draft"));
        assert!(payload.get("quote_number_c").is_none());
        assert!(payload.get("deal_id_c").is_none());
        assert!(payload.get("valid_until_c").is_none());
    }

    #[test]
    fn form_round_trips_expanded_references() {
        let record: Quote = serde_json::from_value(json!({
            "Id": 21,
            "Name": "Acme renewal",
            "quote_number_c": "Q-2024-017",
            "deal_id_c": { "Id": 4, "Name": "Annual renewal" },
            "company_id_c": { "Id": 9, "Name": "Acme Corp" },
            "contact_id_c": 7,
            "amount_c": 2500.0,
            "status_c": "Sent",
            "valid_until_c": "2024-06-30"
        }))
        .unwrap();

        let form = QuoteForm::from_record(&record);
        assert_eq!(form.deal_id, "4");
        assert_eq!(form.company_id, "9");
        assert_eq!(form.contact_id, "7");
        assert_eq!(form.status, "Sent");

        let payload = form.to_payload();
        assert_eq!(payload["deal_id_c"], json!(4));
        assert_eq!(payload["company_id_c"], json!(9));
        assert_eq!(payload["contact_id_c"], json!(7));
    }

    #[test]
    fn amount_sort_descending_then_ascending_reverses() {
        let mut state: ListState<Quote> = ListState::new();
        state.set_rows(vec![
            quote(1, "Small", Some(100.0), "Draft"),
            quote(2, "Large", Some(9000.0), "Draft"),
            quote(3, "Blank", None, "Draft"),
        ]);

        state.sort = SortState::new(Some(QuoteSortKey::Amount), SortDirection::Descending);
        let descending: Vec<i64> = state.visible().iter().map(|q| q.id).collect();
        assert_eq!(descending, vec![2, 1, 3]);

        state.sort.direction = SortDirection::Ascending;
        let ascending: Vec<i64> = state.visible().iter().map(|q| q.id).collect();
        assert_eq!(ascending, vec![3, 1, 2]);
    }

    #[test]
    fn status_sentinel_passes_every_quote() {
        let mut state: ListState<Quote> = ListState::new();
        state.set_rows(vec![
            quote(1, "A", None, "Draft"),
            quote(2, "B", None, "Sent"),
        ]);
        state.set_filter("status_c", "All");
        assert_eq!(state.visible().len(), 2);
    }

    #[test]
    fn validate_requires_name_amount_status() {
        let mut form = QuoteForm::default();
        form.status = String::new();
        let errors = form.validate();
        assert!(errors.contains_key("Name"));
        assert!(errors.contains_key("amount_c"));
        assert!(errors.contains_key("status_c"));
    }
}

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
        ListRow,
        SortValue,
    },
};

pub const TABLE: &str = "order_c";

pub const STATUS_OPTIONS: [&str; 5] = ["draft", "confirmed", "shipped", "delivered", "cancelled"];

/// A row of `order_c`. Deal and contact are reference fields: expanded
/// `{Id, Name}` objects on read, bare ids on write.
#[derive(Debug, Clone, Deserialize)]
pub struct Order {
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
    pub order_number_c: Option<String>,
    #[serde(default)]
    pub deal_id_c: Option<Reference>,
    #[serde(default)]
    pub contact_id_c: Option<Reference>,
    #[serde(default)]
    pub order_date_c: Option<String>,
    #[serde(default)]
    pub status_c: Option<String>,
    #[serde(default)]
    pub total_amount_c: Option<f64>,
    #[serde(default)]
    pub notes_c: Option<String>,
    #[serde(default)]
    pub shipping_date_c: Option<String>,
    #[serde(default)]
    pub billing_address_c: Option<String>,
    #[serde(default)]
    pub shipping_address_c: Option<String>,
}

pub fn field_selectors() -> Vec<FieldSelector> {
    vec![
        FieldSelector::plain("Id"),
        FieldSelector::plain("Name"),
        FieldSelector::plain("Tags"),
        FieldSelector::lookup("Owner", "Name"),
        FieldSelector::plain("CreatedOn"),
        FieldSelector::lookup("CreatedBy", "Name"),
        FieldSelector::plain("ModifiedOn"),
        FieldSelector::lookup("ModifiedBy", "Name"),
        FieldSelector::plain("order_number_c"),
        FieldSelector::lookup("deal_id_c", "Name"),
        FieldSelector::lookup("contact_id_c", "Name"),
        FieldSelector::plain("order_date_c"),
        FieldSelector::plain("status_c"),
        FieldSelector::plain("total_amount_c"),
        FieldSelector::plain("notes_c"),
        FieldSelector::plain("shipping_date_c"),
        FieldSelector::plain("billing_address_c"),
        FieldSelector::plain("shipping_address_c"),
    ]
}

#[derive(Debug, Clone, PartialEq)]
pub struct OrderForm {
    pub order_number: String,
    /// Raw dropdown id string; parsed to an integer on submit.
    pub deal_id: String,
    pub contact_id: String,
    pub order_date: String,
    pub status: String,
    pub total_amount: String,
    pub notes: String,
}

impl Default for OrderForm {
    fn default() -> Self {
        Self {
            order_number: String::new(),
            deal_id: String::new(),
            contact_id: String::new(),
            order_date: String::new(),
            status: "draft".to_string(),
            total_amount: String::new(),
            notes: String::new(),
        }
    }
}

impl OrderForm {
    pub fn from_record(order: &Order) -> Self {
        Self {
            order_number: order.order_number_c.clone().unwrap_or_default(),
            deal_id: order
                .deal_id_c
                .as_ref()
                .map(|reference| reference.id().to_string())
                .unwrap_or_default(),
            contact_id: order
                .contact_id_c
                .as_ref()
                .map(|reference| reference.id().to_string())
                .unwrap_or_default(),
            order_date: order.order_date_c.clone().unwrap_or_default(),
            status: match order.status_c.as_deref() {
                Some(status) if !status.is_empty() => status.to_string(),
                _ => "draft".to_string(),
            },
            total_amount: order
                .total_amount_c
                .map(|amount| amount.to_string())
                .unwrap_or_default(),
            notes: order.notes_c.clone().unwrap_or_default(),
        }
    }

    pub fn validate(&self) -> FieldErrors {
        let mut errors = FieldErrors::new();
        if self.order_number.trim().is_empty() {
            errors.insert("order_number_c", "Order number is required".to_string());
        }
        if self.deal_id.trim().is_empty() {
            errors.insert("deal_id_c", "Deal is required".to_string());
        }
        if self.contact_id.trim().is_empty() {
            errors.insert("contact_id_c", "Contact is required".to_string());
        }
        if self.order_date.trim().is_empty() {
            errors.insert("order_date_c", "Order date is required".to_string());
        }
        let amount = self.total_amount.trim();
        if amount.is_empty() {
            errors.insert("total_amount_c", "Total amount is required".to_string());
        } else if amount.parse::<f64>().is_err() {
            errors.insert("total_amount_c", "Total amount must be a number".to_string());
        }
        errors
    }

    pub fn to_payload(&self) -> Map<String, Value> {
        let mut record = Map::new();
        put_text(&mut record, "Name", &self.order_number);
        put_text(&mut record, "order_number_c", &self.order_number);
        put_reference(&mut record, "deal_id_c", &self.deal_id);
        put_reference(&mut record, "contact_id_c", &self.contact_id);
        put_text(&mut record, "order_date_c", &self.order_date);
        put_text(&mut record, "status_c", &self.status);
        put_number(&mut record, "total_amount_c", &self.total_amount);
        put_text(&mut record, "notes_c", &self.notes);
        record
    }
}

pub struct OrderService {
    client: Arc<RecordClient>,
}

impl OrderService {
    pub fn new(client: Arc<RecordClient>) -> Self {
        Self { client }
    }

    pub async fn get_all(&self) -> Vec<Order> {
        let params = FetchParams::new(field_selectors()).order_by("Id", SortType::Desc);
        match self.client.fetch_records(TABLE, &params).await {
            Ok(orders) => orders,
            Err(err) => {
                error!("Error fetching orders: {}", err);
                Vec::new()
            }
        }
    }

    /// Unlike the list path, a missing order is an error here; detail views
    /// need something to show.
    pub async fn get_by_id(&self, id: i64) -> Result<Order, FlowCrmError> {
        self.client
            .get_record_by_id(TABLE, id, field_selectors())
            .await?
            .ok_or_else(|| FlowCrmError::NotFound { table: TABLE.to_string(), id })
    }

    pub async fn create(&self, form: &OrderForm) -> Result<Order, FlowCrmError> {
        let errors = form.validate();
        if !errors.is_empty() {
            return Err(FlowCrmError::Validation {
                message: "Order form is invalid".to_string(),
                errors: issues_from(errors),
            });
        }
        self.client.create_record(TABLE, form.to_payload()).await
    }

    pub async fn update(&self, id: i64, form: &OrderForm) -> Result<Order, FlowCrmError> {
        let errors = form.validate();
        if !errors.is_empty() {
            return Err(FlowCrmError::Validation {
                message: "Order form is invalid".to_string(),
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
pub enum OrderSortKey {
    OrderDate,
    TotalAmount,
    CreatedOn,
}

impl ListRow for Order {
    type SortKey = OrderSortKey;

    fn id(&self) -> i64 {
        self.id
    }

    fn search_fields(&self) -> Vec<&str> {
        vec![
            self.order_number_c.as_deref().unwrap_or(""),
            self.deal_id_c.as_ref().map(Reference::name).unwrap_or(""),
            self.contact_id_c.as_ref().map(Reference::name).unwrap_or(""),
        ]
    }

    fn filter_value(&self, field: &str) -> Option<&str> {
        match field {
            "status_c" => self.status_c.as_deref(),
            _ => None,
        }
    }

    fn sort_value(&self, key: OrderSortKey) -> SortValue {
        match key {
            OrderSortKey::OrderDate => SortValue::date(self.order_date_c.as_deref()),
            OrderSortKey::TotalAmount => SortValue::number(self.total_amount_c),
            OrderSortKey::CreatedOn => SortValue::timestamp(self.created_on),
        }
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn record_normalizes_both_reference_shapes() {
        let expanded: Order = serde_json::from_value(json!({
            "Id": 11,
            "order_number_c": "ORD-1001",
            "deal_id_c": { "Id": 4, "Name": "Annual renewal" },
            "contact_id_c": 7,
            "total_amount_c": 1499.5
        }))
        .unwrap();

        let deal = expanded.deal_id_c.as_ref().unwrap();
        assert_eq!(deal.id(), 4);
        assert_eq!(deal.name(), "Annual renewal");

        let contact = expanded.contact_id_c.as_ref().unwrap();
        assert_eq!(contact.id(), 7);
        assert_eq!(contact.name(), "");
    }

    #[test]
    fn form_reads_reference_ids_and_writes_bare_integers() {
        let order: Order = serde_json::from_value(json!({
            "Id": 11,
            "order_number_c": "ORD-1001",
            "deal_id_c": { "Id": 4, "Name": "Annual renewal" },
            "contact_id_c": { "Id": 7, "Name": "Sara Lee" },
            "order_date_c": "2024-03-01",
            "status_c": "confirmed",
            "total_amount_c": 1499.5
        }))
        .unwrap();

        let form = OrderForm::from_record(&order);
        assert_eq!(form.deal_id, "4");
        assert_eq!(form.contact_id, "7");
        assert_eq!(form.total_amount, "1499.5");

        let payload = form.to_payload();
        assert_eq!(payload["deal_id_c"], json!(4));
        assert_eq!(payload["contact_id_c"], json!(7));
        assert_eq!(payload["total_amount_c"], json!(1499.5));
        assert_eq!(payload["Name"], json!("ORD-1001"));
    }

    #[test]
    fn empty_amount_is_omitted_not_sent_as_empty_string() {
        let form = OrderForm { order_number: "ORD-1002".to_string(), ..OrderForm::default() };
        let payload = form.to_payload();
        assert!(payload.get("total_amount_c").is_none());
        assert!(payload.get("deal_id_c").is_none());
    }

    #[test]
    fn validate_requires_references_and_a_numeric_amount() {
        let form = OrderForm::default();
        let errors = form.validate();
        assert!(errors.contains_key("order_number_c"));
        assert!(errors.contains_key("deal_id_c"));
        assert!(errors.contains_key("contact_id_c"));
        assert!(errors.contains_key("order_date_c"));
        assert!(errors.contains_key("total_amount_c"));

        let form = OrderForm {
            order_number: "ORD-1001".to_string(),
            deal_id: "4".to_string(),
            contact_id: "7".to_string(),
            order_date: "2024-03-01".to_string(),
            total_amount: "lots".to_string(),
            ..OrderForm::default()
        };
        let errors = form.validate();
        assert_eq!(
            errors.get("total_amount_c").map(String::as_str),
            Some("Total amount must be a number")
        );
        assert_eq!(errors.len(), 1);
    }
}

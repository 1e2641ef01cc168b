use serde::{
    Deserialize,
    Serialize,
};
use serde_json::{
    Map,
    Value,
};

use crate::core::FieldIssue;

/// Default page size the hosted store serves; snapshots are bounded by this.
pub const DEFAULT_PAGE_LIMIT: u32 = 100;

#[derive(Debug, Clone, Serialize)]
pub struct FieldName {
    #[serde(rename = "Name")]
    pub name: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct ReferenceSelector {
    pub field: FieldName,
}

/// One entry of the field-selection descriptor. Reference fields name the
/// sub-field of the referenced row to surface (usually `Name`).
#[derive(Debug, Clone, Serialize)]
pub struct FieldSelector {
    pub field: FieldName,
    #[serde(rename = "referenceField", skip_serializing_if = "Option::is_none")]
    pub reference_field: Option<ReferenceSelector>,
}

impl FieldSelector {
    pub fn plain(name: &str) -> Self {
        Self { field: FieldName { name: name.to_string() }, reference_field: None }
    }

    pub fn lookup(name: &str, reference_field: &str) -> Self {
        Self {
            field: FieldName { name: name.to_string() },
            reference_field: Some(ReferenceSelector {
                field: FieldName { name: reference_field.to_string() },
            }),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum WhereOperator {
    EqualTo,
    Contains,
}

/// Top-level `where` predicate; the store ANDs these together.
#[derive(Debug, Clone, Serialize)]
pub struct WhereClause {
    #[serde(rename = "FieldName")]
    pub field_name: String,
    #[serde(rename = "Operator")]
    pub operator: WhereOperator,
    #[serde(rename = "Values")]
    pub values: Vec<String>,
}

/// Predicate inside a `whereGroups` subgroup. Same shape as `WhereClause`
/// but the store expects lower-cased keys here.
#[derive(Debug, Clone, Serialize)]
pub struct GroupCondition {
    #[serde(rename = "fieldName")]
    pub field_name: String,
    pub operator: WhereOperator,
    pub values: Vec<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct WhereSubGroup {
    pub conditions: Vec<GroupCondition>,
}

/// Disjunctive group: OR across subgroups, AND within each subgroup.
#[derive(Debug, Clone, Serialize)]
pub struct WhereGroup {
    pub operator: String,
    #[serde(rename = "subGroups")]
    pub sub_groups: Vec<WhereSubGroup>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum SortType {
    #[serde(rename = "ASC")]
    Asc,
    #[serde(rename = "DESC")]
    Desc,
}

#[derive(Debug, Clone, Serialize)]
pub struct OrderBy {
    #[serde(rename = "fieldName")]
    pub field_name: String,
    pub sorttype: SortType,
}

#[derive(Debug, Clone, Copy, Serialize)]
pub struct PagingInfo {
    pub limit: u32,
    pub offset: u32,
}

impl Default for PagingInfo {
    fn default() -> Self {
        Self { limit: DEFAULT_PAGE_LIMIT, offset: 0 }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct FetchParams {
    pub fields: Vec<FieldSelector>,
    #[serde(rename = "where", skip_serializing_if = "Vec::is_empty")]
    pub where_clauses: Vec<WhereClause>,
    #[serde(rename = "whereGroups", skip_serializing_if = "Option::is_none")]
    pub where_groups: Option<Vec<WhereGroup>>,
    #[serde(rename = "orderBy", skip_serializing_if = "Vec::is_empty")]
    pub order_by: Vec<OrderBy>,
    #[serde(rename = "pagingInfo")]
    pub paging_info: PagingInfo,
}

impl FetchParams {
    pub fn new(fields: Vec<FieldSelector>) -> Self {
        Self {
            fields,
            where_clauses: Vec::new(),
            where_groups: None,
            order_by: Vec::new(),
            paging_info: PagingInfo::default(),
        }
    }

    pub fn order_by(mut self, field_name: &str, sorttype: SortType) -> Self {
        self.order_by.push(OrderBy { field_name: field_name.to_string(), sorttype });
        self
    }

    pub fn where_equals(mut self, field_name: &str, value: &str) -> Self {
        self.where_clauses.push(WhereClause {
            field_name: field_name.to_string(),
            operator: WhereOperator::EqualTo,
            values: vec![value.to_string()],
        });
        self
    }

    /// Free-text search across several fields: one OR group with a
    /// single-condition subgroup per field.
    pub fn search(mut self, term: &str, field_names: &[&str]) -> Self {
        if term.is_empty() || field_names.is_empty() {
            return self;
        }
        let sub_groups = field_names
            .iter()
            .map(|field_name| WhereSubGroup {
                conditions: vec![GroupCondition {
                    field_name: (*field_name).to_string(),
                    operator: WhereOperator::Contains,
                    values: vec![term.to_string()],
                }],
            })
            .collect();
        self.where_groups = Some(vec![WhereGroup { operator: "OR".to_string(), sub_groups }]);
        self
    }

    pub fn paging(mut self, limit: u32, offset: u32) -> Self {
        self.paging_info = PagingInfo { limit, offset };
        self
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct GetParams {
    pub fields: Vec<FieldSelector>,
}

/// Body for `createRecord`/`updateRecord`: the store takes a batch even for
/// a single row.
#[derive(Debug, Clone, Serialize)]
pub struct RecordsBody {
    pub records: Vec<Value>,
}

impl RecordsBody {
    pub fn single(record: Map<String, Value>) -> Self {
        Self { records: vec![Value::Object(record)] }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct DeleteBody {
    #[serde(rename = "RecordIds")]
    pub record_ids: Vec<i64>,
}

/// Envelope for `fetchRecords`/`getRecordById`.
#[derive(Debug, Deserialize)]
#[serde(bound(deserialize = "T: Deserialize<'de>"))]
pub struct ApiEnvelope<T> {
    pub success: bool,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub data: Option<T>,
}

/// Envelope for the write operations. A `success: true` top level does not
/// mean every record in the batch went through; the per-record results decide.
#[derive(Debug, Deserialize)]
#[serde(bound(deserialize = "T: Deserialize<'de>"))]
pub struct BatchEnvelope<T> {
    pub success: bool,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub results: Option<Vec<BatchResult<T>>>,
}

#[derive(Debug, Deserialize)]
#[serde(bound(deserialize = "T: Deserialize<'de>"))]
pub struct BatchResult<T> {
    pub success: bool,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub data: Option<T>,
    #[serde(default)]
    pub errors: Option<Vec<FieldIssue>>,
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn fetch_params_serialize_with_store_casing() {
        let params = FetchParams::new(vec![
            FieldSelector::plain("Id"),
            FieldSelector::lookup("deal_id_c", "Name"),
        ])
        .where_equals("status_c", "Open")
        .order_by("CreatedOn", SortType::Desc);

        let value = serde_json::to_value(&params).unwrap();
        assert_eq!(
            value,
            json!({
                "fields": [
                    { "field": { "Name": "Id" } },
                    { "field": { "Name": "deal_id_c" }, "referenceField": { "field": { "Name": "Name" } } }
                ],
                "where": [
                    { "FieldName": "status_c", "Operator": "EqualTo", "Values": ["Open"] }
                ],
                "orderBy": [
                    { "fieldName": "CreatedOn", "sorttype": "DESC" }
                ],
                "pagingInfo": { "limit": 100, "offset": 0 }
            })
        );
    }

    #[test]
    fn search_builds_or_group_per_field() {
        let params =
            FetchParams::new(vec![FieldSelector::plain("Id")]).search("acme", &["Name", "quote_number_c"]);

        let value = serde_json::to_value(&params).unwrap();
        assert_eq!(
            value["whereGroups"],
            json!([{
                "operator": "OR",
                "subGroups": [
                    { "conditions": [{ "fieldName": "Name", "operator": "Contains", "values": ["acme"] }] },
                    { "conditions": [{ "fieldName": "quote_number_c", "operator": "Contains", "values": ["acme"] }] }
                ]
            }])
        );
    }

    #[test]
    fn empty_search_term_adds_no_groups() {
        let params = FetchParams::new(vec![FieldSelector::plain("Id")]).search("", &["Name"]);
        assert!(params.where_groups.is_none());

        let value = serde_json::to_value(&params).unwrap();
        assert!(value.get("whereGroups").is_none());
        assert!(value.get("where").is_none());
    }

    #[test]
    fn envelope_tolerates_missing_message_and_data() {
        let envelope: ApiEnvelope<Vec<i64>> =
            serde_json::from_value(json!({ "success": true })).unwrap();
        assert!(envelope.success);
        assert!(envelope.message.is_none());
        assert!(envelope.data.is_none());

        let envelope: ApiEnvelope<Vec<i64>> =
            serde_json::from_value(json!({ "success": false, "message": "no such table" })).unwrap();
        assert!(!envelope.success);
        assert_eq!(envelope.message.as_deref(), Some("no such table"));
    }

    #[test]
    fn batch_result_carries_field_errors() {
        let envelope: BatchEnvelope<serde_json::Value> = serde_json::from_value(json!({
            "success": true,
            "results": [{
                "success": false,
                "message": "Validation failed",
                "errors": [{ "field": "total_amount_c", "message": "expected a number" }]
            }]
        }))
        .unwrap();

        let results = envelope.results.unwrap();
        let errors = results[0].errors.as_ref().unwrap();
        assert_eq!(errors[0].field.as_deref(), Some("total_amount_c"));
        assert_eq!(errors[0].message, "expected a number");
    }
}

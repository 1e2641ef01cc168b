use log::error;
use serde::Deserialize;

use crate::{
    core::FlowCrmError,
    crm::contact,
    store::{
        FetchParams,
        FieldSelector,
        RecordClient,
        SortType,
    },
};

/// One dropdown entry for a reference-field selector.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct LookupOption {
    #[serde(rename = "Id")]
    pub id: i64,
    #[serde(rename = "Name", default)]
    pub label: String,
}

#[derive(Debug, Default)]
pub struct ReferenceData {
    pub deals: Vec<LookupOption>,
    pub companies: Vec<LookupOption>,
    pub contacts: Vec<LookupOption>,
}

async fn load_options(
    client: &RecordClient,
    table: &str,
) -> Result<Vec<LookupOption>, FlowCrmError> {
    let params = FetchParams::new(vec![
        FieldSelector::plain("Id"),
        FieldSelector::plain("Name"),
    ])
    .order_by("Name", SortType::Asc);
    client.fetch_records(table, &params).await
}

/// Loads every dropdown list a form needs, concurrently. The join is
/// all-or-nothing: one failed load empties all three lists (logged), but the
/// caller still renders.
pub async fn load_reference_data(client: &RecordClient) -> ReferenceData {
    match tokio::try_join!(
        load_options(client, "deal_c"),
        load_options(client, "company_c"),
        load_options(client, contact::TABLE),
    ) {
        Ok((deals, companies, contacts)) => ReferenceData { deals, companies, contacts },
        Err(err) => {
            error!("Failed to load reference data: {}", err);
            ReferenceData::default()
        }
    }
}

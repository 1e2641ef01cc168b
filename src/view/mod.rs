pub mod list;
pub mod lookups;
pub mod pipeline;

pub use list::{
    ListRow,
    ListState,
};
pub use lookups::{
    load_reference_data,
    LookupOption,
    ReferenceData,
};
pub use pipeline::{
    SortDirection,
    SortState,
    SortValue,
};

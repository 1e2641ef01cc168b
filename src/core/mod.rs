pub mod errors;

pub use errors::{
    FieldIssue,
    FlowCrmError,
};

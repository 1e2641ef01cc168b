pub mod core;
pub mod crm;
pub mod store;
pub mod view;

pub mod store;
pub mod todo;

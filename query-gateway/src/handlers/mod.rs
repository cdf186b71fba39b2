pub mod query;

pub use query::handle_query;

pub mod query;

pub use query::{IncomingQuery, QueryResponse};

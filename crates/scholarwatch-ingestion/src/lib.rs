//! scholarwatch-ingestion: Literature discovery for the daily digest.
//! - Web of Science query building and search
//! - Lenient mapping of search hits
//! - Abstract resolution (Crossref, then PubMed Central)

pub mod abstracts;
pub mod fetch;
pub mod models;
pub mod query;
pub mod sources;

pub use abstracts::{AbstractOutcome, AbstractResolver};
pub use fetch::fetch_articles;
pub use models::{SearchHit, SearchRequest};
pub use query::{build_query, QueryError};

pub mod clean;
pub mod enrich;
pub mod ingest;
pub mod parse;
pub mod pipeline;
pub mod sink;
pub mod table;

pub mod client;
pub mod detail_parser;
pub mod search_parser;

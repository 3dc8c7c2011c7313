pub mod classifier;
pub mod page_source;

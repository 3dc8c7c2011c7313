pub mod enrichment;
pub mod listing;
pub mod normalize;
pub mod search_params;

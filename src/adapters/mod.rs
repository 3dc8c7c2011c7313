pub mod llm;
pub mod scraper;

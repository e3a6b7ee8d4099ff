pub mod audience;
pub mod catalog;
pub mod error;
pub mod keywords;
pub mod model;
pub mod parser;
pub mod relevance;
pub mod sheets;

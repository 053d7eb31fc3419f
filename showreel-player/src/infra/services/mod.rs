//! REST-backed collaborators for the session controller

pub mod cache;
pub mod catalog;
pub mod history;

pub use cache::CachedCatalog;
pub use catalog::HttpCatalog;
pub use history::HttpHistory;

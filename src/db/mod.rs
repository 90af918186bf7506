mod repository;
mod schema;

pub use repository::HistoryStore;

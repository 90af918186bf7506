mod article;
mod classification;
mod history;

pub use article::ArticleSummary;
pub use classification::{Category, ClassificationStatus};
pub use history::{HistoryRecord, NewHistoryRecord};

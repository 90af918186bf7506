#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HistoryRecord {
    pub id: i64,
    pub image_location: String,
    pub result_label: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewHistoryRecord {
    pub image_location: String,
    pub result_label: String,
}

impl NewHistoryRecord {
    pub fn new(image_location: impl Into<String>, result_label: impl Into<String>) -> Self {
        Self {
            image_location: image_location.into(),
            result_label: result_label.into(),
        }
    }
}

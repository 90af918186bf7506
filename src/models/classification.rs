/// A single classifier output. `score` is a confidence in `[0, 1]`.
#[derive(Debug, Clone, PartialEq)]
pub struct Category {
    pub label: String,
    pub score: f32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ClassificationStatus {
    #[default]
    Idle,
    Running,
    Done,
    Failed,
}

use std::time::Duration;

#[derive(Debug, Clone)]
pub enum AppEvent {
    Generated {
        request_id: u64,
        category: Option<&'static str>,
        code: String,
        deep_think: bool,
        elapsed: Duration,
    },
    GenerationFailed {
        request_id: u64,
        message: String,
    },
}

//! Timed response returned to interactive callers.

use std::time::{Duration, Instant};

/// Generated text for one prompt, with the wall-clock time it took.
///
/// Created when the request starts and discarded once displayed.
#[derive(Debug, Clone)]
pub struct Response {
    pub text: String,
    pub start_time: Instant,
    pub end_time: Instant,
}

impl Response {
    pub fn new(text: String, start_time: Instant, end_time: Instant) -> Self {
        Self {
            text,
            start_time,
            end_time,
        }
    }

    pub fn response_time(&self) -> Duration {
        self.end_time.saturating_duration_since(self.start_time)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_response_time_is_end_minus_start() {
        let start = Instant::now();
        let end = start + Duration::from_millis(250);
        let resp = Response::new("ok".into(), start, end);
        assert_eq!(resp.response_time(), Duration::from_millis(250));
    }
}

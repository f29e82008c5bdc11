use serde::Serialize;
use std::time::Duration;

use crate::ErrorInfo;

/// Outcome of one generation call.
///
/// `elapsed_ms` is always populated, including on failure, where it is the
/// time spent until the failure was observed. When `error` is set, `text` is
/// empty and meaningless.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GenerationResult {
    pub text: String,
    pub elapsed_ms: f64,
    pub error: Option<ErrorInfo>,
}

impl GenerationResult {
    pub fn success(text: String, elapsed: Duration) -> Self {
        Self {
            text,
            elapsed_ms: duration_ms(elapsed),
            error: None,
        }
    }

    pub fn failure(error: ErrorInfo, elapsed: Duration) -> Self {
        Self {
            text: String::new(),
            elapsed_ms: duration_ms(elapsed),
            error: Some(error),
        }
    }

    pub fn is_success(&self) -> bool {
        self.error.is_none()
    }

    /// `Ok(text)` or `Err(error)`, whichever branch is meaningful.
    pub fn outcome(&self) -> Result<&str, &ErrorInfo> {
        match &self.error {
            None => Ok(&self.text),
            Some(e) => Err(e),
        }
    }
}

/// Wall-clock duration in fractional milliseconds.
pub fn duration_ms(elapsed: Duration) -> f64 {
    elapsed.as_secs_f64() * 1000.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn failure_keeps_elapsed_and_drops_text() {
        let r = GenerationResult::failure(ErrorInfo::transport("reset"), Duration::from_millis(12));
        assert!(!r.is_success());
        assert!(r.text.is_empty());
        assert!((r.elapsed_ms - 12.0).abs() < 1e-9);
        assert!(r.outcome().is_err());
    }

    #[test]
    fn duration_is_fractional_millis() {
        assert!((duration_ms(Duration::from_micros(1500)) - 1.5).abs() < 1e-9);
    }
}

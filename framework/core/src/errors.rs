use std::time::Duration;

/// Returned while waiting on the engine when the operator interrupts the driver.
///
/// Work that receives this error should clean up whatever it started and stop, rather than
/// retrying. The batch runner closes the report and exits once it sees it.
#[derive(derive_more::Error, derive_more::Display, Debug)]
pub struct InterruptedError {
    msg: String,
}

impl Default for InterruptedError {
    fn default() -> Self {
        Self {
            msg: "Execution cancelled by interrupt signal".to_string(),
        }
    }
}

/// The engine client was still running when its exit budget ran out.
///
/// This is not a scenario failure by itself. The supervisor kills the client and counts the
/// attempt towards its retry budget.
#[derive(derive_more::Error, derive_more::Display, Debug)]
pub struct ProcessTimeoutError {
    msg: String,
}

impl ProcessTimeoutError {
    pub fn new(timeout: Duration) -> Self {
        Self {
            msg: format!(
                "Engine client did not exit within {}s",
                timeout.as_secs_f32()
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn timeout_error_names_budget() {
        let err = ProcessTimeoutError::new(Duration::from_secs(60));
        assert_eq!(err.to_string(), "Engine client did not exit within 60s");
    }

    #[test]
    fn errors_can_be_recovered_from_anyhow() {
        let err: anyhow::Error = InterruptedError::default().into();
        assert!(err.is::<InterruptedError>());
        assert!(!err.is::<ProcessTimeoutError>());
    }
}

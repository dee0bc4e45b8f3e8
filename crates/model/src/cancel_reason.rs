use crate::errors::ScheduleError;

pub const OTHER_REASON: &str = "Other";

/// Reason picked in the cancellation dialog.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CancelReason {
    Preset(String),
    Other(String),
}

impl CancelReason {
    /// Maps a picked option to a reason; the "Other" option takes the free text.
    pub fn pick(option: &str, free_text: &str) -> CancelReason {
        if option.eq_ignore_ascii_case(OTHER_REASON) {
            CancelReason::Other(free_text.to_string())
        } else {
            CancelReason::Preset(option.to_string())
        }
    }

    pub fn text(&self) -> Result<&str, ScheduleError> {
        let text = match self {
            CancelReason::Preset(text) | CancelReason::Other(text) => text.trim(),
        };
        if text.is_empty() {
            return Err(ScheduleError::EmptyCancelReason);
        }
        Ok(text)
    }
}

/// Options offered by the dialog: the configured reasons plus "Other".
pub fn with_other(mut options: Vec<String>) -> Vec<String> {
    options.retain(|o| !o.trim().is_empty() && !o.eq_ignore_ascii_case(OTHER_REASON));
    options.push(OTHER_REASON.to_string());
    options
}

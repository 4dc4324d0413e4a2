use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::CoreError;

/// Lifecycle of a scrape job: `pending → processing → done | failed`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScrapeStatus {
    Pending,
    Processing,
    Done,
    Failed,
}

impl ScrapeStatus {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            ScrapeStatus::Pending => "pending",
            ScrapeStatus::Processing => "processing",
            ScrapeStatus::Done => "done",
            ScrapeStatus::Failed => "failed",
        }
    }

    /// Returns `true` once the job can no longer change state.
    #[must_use]
    pub fn is_terminal(self) -> bool {
        matches!(self, ScrapeStatus::Done | ScrapeStatus::Failed)
    }

    /// Returns `true` if moving from `self` to `next` is a legal transition.
    #[must_use]
    pub fn can_transition_to(self, next: ScrapeStatus) -> bool {
        matches!(
            (self, next),
            (ScrapeStatus::Pending, ScrapeStatus::Processing)
                | (
                    ScrapeStatus::Processing,
                    ScrapeStatus::Done | ScrapeStatus::Failed
                )
        )
    }
}

impl fmt::Display for ScrapeStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ScrapeStatus {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(ScrapeStatus::Pending),
            "processing" => Ok(ScrapeStatus::Processing),
            "done" => Ok(ScrapeStatus::Done),
            "failed" => Ok(ScrapeStatus::Failed),
            other => Err(CoreError::InvalidScrapeStatus(other.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_every_status_string() {
        for status in [
            ScrapeStatus::Pending,
            ScrapeStatus::Processing,
            ScrapeStatus::Done,
            ScrapeStatus::Failed,
        ] {
            assert_eq!(status.as_str().parse::<ScrapeStatus>().unwrap(), status);
        }
    }

    #[test]
    fn unknown_status_is_rejected() {
        let err = "queued".parse::<ScrapeStatus>().unwrap_err();
        assert!(matches!(err, CoreError::InvalidScrapeStatus(ref s) if s == "queued"));
    }

    #[test]
    fn only_forward_transitions_are_legal() {
        assert!(ScrapeStatus::Pending.can_transition_to(ScrapeStatus::Processing));
        assert!(ScrapeStatus::Processing.can_transition_to(ScrapeStatus::Done));
        assert!(ScrapeStatus::Processing.can_transition_to(ScrapeStatus::Failed));
        assert!(!ScrapeStatus::Pending.can_transition_to(ScrapeStatus::Done));
        assert!(!ScrapeStatus::Done.can_transition_to(ScrapeStatus::Processing));
        assert!(!ScrapeStatus::Failed.can_transition_to(ScrapeStatus::Done));
    }

    #[test]
    fn terminal_states() {
        assert!(ScrapeStatus::Done.is_terminal());
        assert!(ScrapeStatus::Failed.is_terminal());
        assert!(!ScrapeStatus::Processing.is_terminal());
    }
}

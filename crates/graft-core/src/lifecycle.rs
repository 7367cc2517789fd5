//! Document lifecycle phases.

use std::fmt;

use serde::{Deserialize, Serialize};

/// One of the three one-shot milestones of document construction.
///
/// Phases occur strictly in declaration order; `Ord` follows that order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LifecyclePhase {
    /// Before DOM construction completes.
    Start,
    /// After DOM construction, before the full load.
    End,
    /// DOM content loaded; the document is fully parsed.
    Idle,
}

impl LifecyclePhase {
    /// All phases in firing order.
    pub const ALL: [Self; 3] = [Self::Start, Self::End, Self::Idle];

    /// The phase that must fire after this one, if any.
    #[must_use]
    pub fn next(self) -> Option<Self> {
        match self {
            Self::Start => Some(Self::End),
            Self::End => Some(Self::Idle),
            Self::Idle => None,
        }
    }

    /// Stable event name used in logs and host messages.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Start => "document-start",
            Self::End => "document-end",
            Self::Idle => "dom-content-loaded",
        }
    }

    /// The `document.readyState` value once this phase has fired.
    #[must_use]
    pub fn ready_state(self) -> &'static str {
        match self {
            Self::Start => "loading",
            Self::End => "interactive",
            Self::Idle => "complete",
        }
    }
}

impl fmt::Display for LifecyclePhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What happens to start or end work registered after its phase fired.
///
/// Late idle work is always deferred to the next tick.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LateRegistration {
    /// Refuse the registration; the whole script is dropped.
    #[default]
    Reject,
    /// Run it on the next tick, after already-deferred work.
    Defer,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn late_registration_defaults_to_reject() {
        assert_eq!(LateRegistration::default(), LateRegistration::Reject);
        let parsed: LateRegistration = serde_json::from_str("\"defer\"").unwrap();
        assert_eq!(parsed, LateRegistration::Defer);
    }

    #[test]
    fn phases_are_ordered() {
        assert!(LifecyclePhase::Start < LifecyclePhase::End);
        assert!(LifecyclePhase::End < LifecyclePhase::Idle);
        assert_eq!(LifecyclePhase::Start.next(), Some(LifecyclePhase::End));
        assert_eq!(LifecyclePhase::Idle.next(), None);
    }

    #[test]
    fn serde_names() {
        assert_eq!(
            serde_json::to_string(&LifecyclePhase::Idle).unwrap(),
            "\"idle\""
        );
        let phase: LifecyclePhase = serde_json::from_str("\"start\"").unwrap();
        assert_eq!(phase, LifecyclePhase::Start);
    }
}

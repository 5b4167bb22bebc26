use std::fmt;
use serde::Serialize;

/// Where the conversation is. The single source of truth for every status
/// flag the presentation layer shows.
///
/// `Listening` and `Speaking` carry the ticket of the operation they wait
/// on, so a late completion from a cancelled capture or playback can be
/// told apart from the current one.
#[derive(Serialize, Clone, Copy, Debug, PartialEq, Eq)]
#[serde(tag = "state", rename_all = "camelCase")]
pub enum Phase {
    Idle,
    Starting,
    WaitingForUser,
    Listening { ticket: u64 },
    AiResponding,
    Speaking { ticket: u64 },
    Ended,
}

impl Phase {
    pub fn name(&self) -> &'static str {
        match self {
            Phase::Idle => "idle",
            Phase::Starting => "starting",
            Phase::WaitingForUser => "waitingForUser",
            Phase::Listening { .. } => "listening",
            Phase::AiResponding => "aiResponding",
            Phase::Speaking { .. } => "speaking",
            Phase::Ended => "ended",
        }
    }

    pub fn is_listening(&self) -> bool {
        matches!(self, Phase::Listening { .. })
    }

    pub fn is_speaking(&self) -> bool {
        matches!(self, Phase::Speaking { .. })
    }

    /// A session exists and has not ended.
    pub fn is_active(&self) -> bool {
        !matches!(self, Phase::Idle | Phase::Ended)
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// The four booleans the presentation layer binds to.
#[derive(Serialize, Clone, Copy, Debug, PartialEq, Eq, Default)]
#[serde(rename_all = "camelCase")]
pub struct VoiceStatus {
    pub is_listening: bool,
    pub is_speaking: bool,
    pub is_ai_responding: bool,
    pub is_voice_enabled: bool,
}

impl VoiceStatus {
    /// Number of exclusive activity flags set. Never more than one.
    pub fn active_count(&self) -> usize {
        [self.is_listening, self.is_speaking, self.is_ai_responding]
            .iter()
            .filter(|flag| **flag)
            .count()
    }
}

/// Pure projection of the phase onto the status flags. `Starting` counts as
/// AI responding since the opening question is being fetched.
pub fn project(phase: Phase, voice_enabled: bool) -> VoiceStatus {
    VoiceStatus {
        is_listening: phase.is_listening(),
        is_speaking: phase.is_speaking(),
        is_ai_responding: matches!(phase, Phase::Starting | Phase::AiResponding),
        is_voice_enabled: voice_enabled,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ALL: [Phase; 7] = [
        Phase::Idle,
        Phase::Starting,
        Phase::WaitingForUser,
        Phase::Listening { ticket: 1 },
        Phase::AiResponding,
        Phase::Speaking { ticket: 2 },
        Phase::Ended,
    ];

    #[test]
    fn test_projection_never_sets_two_activity_flags() {
        for phase in ALL {
            for voice in [false, true] {
                let status = project(phase, voice);
                assert!(status.active_count() <= 1, "{} projected {:?}", phase, status);
                assert_eq!(status.is_voice_enabled, voice);
            }
        }
    }

    #[test]
    fn test_projection_per_phase() {
        assert!(project(Phase::Listening { ticket: 9 }, true).is_listening);
        assert!(project(Phase::Speaking { ticket: 9 }, true).is_speaking);
        assert!(project(Phase::AiResponding, false).is_ai_responding);
        assert!(project(Phase::Starting, false).is_ai_responding);
        assert_eq!(project(Phase::WaitingForUser, true).active_count(), 0);
        assert_eq!(project(Phase::Ended, true).active_count(), 0);
    }

    #[test]
    fn test_active_phases() {
        assert!(!Phase::Idle.is_active());
        assert!(!Phase::Ended.is_active());
        assert!(Phase::WaitingForUser.is_active());
        assert_eq!(Phase::Listening { ticket: 3 }.to_string(), "listening");
    }
}

//! Live mock-interview session state.
//!
//! The transcript lives here while a simulation runs, so it exists only
//! between simulation start and finalization. Finalizing consumes the
//! session and yields the transcript for archival; it cannot be finalized
//! twice.

use serde::{Deserialize, Serialize};

use crate::models::session::Turn;

pub const MIN_DIFFICULTY: u8 = 1;
pub const MAX_DIFFICULTY: u8 = 10;

/// Word a candidate can type instead of an answer to end the interview.
pub const TERMINATOR: &str = "end";

pub fn is_terminator(input: &str) -> bool {
    input.trim().eq_ignore_ascii_case(TERMINATOR)
}

/// Options chosen when the user starts a simulation.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct SimulationConfig {
    /// Interviewer pressure level, 1 (gentle) to 10 (relentless).
    #[serde(default = "default_difficulty")]
    pub difficulty: u8,
    /// When on, the interviewer critiques each answer before the next question.
    #[serde(default = "default_feedback_mode")]
    pub feedback_mode: bool,
}

fn default_difficulty() -> u8 {
    5
}

fn default_feedback_mode() -> bool {
    true
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            difficulty: default_difficulty(),
            feedback_mode: default_feedback_mode(),
        }
    }
}

/// The running interview: configuration plus the ordered transcript.
#[derive(Debug, Clone)]
pub struct SimulationSession {
    config: SimulationConfig,
    transcript: Vec<Turn>,
}

impl SimulationSession {
    pub fn new(config: SimulationConfig) -> Self {
        Self {
            config,
            transcript: Vec::new(),
        }
    }

    pub fn config(&self) -> SimulationConfig {
        self.config
    }

    pub fn append_user_turn(&mut self, content: impl Into<String>) {
        self.transcript.push(Turn::user(content));
    }

    pub fn append_assistant_turn(&mut self, content: impl Into<String>) {
        self.transcript.push(Turn::assistant(content));
    }

    pub fn transcript(&self) -> &[Turn] {
        &self.transcript
    }

    /// Consumes the session, yielding the transcript for archival.
    /// The transcript is moved, not copied.
    pub fn into_transcript(self) -> Vec<Turn> {
        self.transcript
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::session::Role;

    #[test]
    fn test_turns_append_in_order_with_roles() {
        let mut session = SimulationSession::new(SimulationConfig::default());
        session.append_assistant_turn("Why robotics?");
        session.append_user_turn("Because of the club.");
        session.append_assistant_turn("Which club project was yours?");

        let transcript = session.transcript();
        assert_eq!(transcript.len(), 3);
        assert_eq!(transcript[0].role, Role::Assistant);
        assert_eq!(transcript[1].role, Role::User);
        assert_eq!(transcript[1].content, "Because of the club.");
        assert_eq!(transcript[2].role, Role::Assistant);
    }

    #[test]
    fn test_into_transcript_moves_all_turns() {
        let mut session = SimulationSession::new(SimulationConfig::default());
        session.append_assistant_turn("q");
        session.append_user_turn("a");

        let archived = session.into_transcript();
        assert_eq!(archived.len(), 2);
    }

    #[test]
    fn test_default_config_matches_ui_defaults() {
        let config = SimulationConfig::default();
        assert_eq!(config.difficulty, 5);
        assert!(config.feedback_mode);
    }

    #[test]
    fn test_config_deserializes_with_defaults() {
        let config: SimulationConfig = serde_json::from_str("{}").unwrap();
        assert_eq!(config.difficulty, 5);
        assert!(config.feedback_mode);

        let config: SimulationConfig =
            serde_json::from_str(r#"{"difficulty": 7, "feedback_mode": false}"#).unwrap();
        assert_eq!(config.difficulty, 7);
        assert!(!config.feedback_mode);
    }

    #[test]
    fn test_terminator_detection() {
        assert!(is_terminator("end"));
        assert!(is_terminator("End"));
        assert!(is_terminator("  END  "));
        assert!(!is_terminator("end of story"));
        assert!(!is_terminator("the end"));
        assert!(!is_terminator(""));
    }
}

//! The session aggregate: one user's working state for the whole workflow.
//!
//! Owned exclusively by the orchestrator and passed by reference through each
//! transition. No ambient globals; a process hosts exactly one session.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::cache::{CacheHandle, Tier};
use crate::errors::AppError;
use crate::simulation::SimulationSession;

/// Workflow stage. `Analyzed` is re-entered after a simulation finalizes,
/// enriched with the simulation report and the archived transcript.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Stage {
    #[default]
    Uploading,
    Analyzed,
    Simulating,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

/// One conversational turn in the mock interview.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Turn {
    pub role: Role,
    pub content: String,
}

impl Turn {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
        }
    }
}

/// The two submitted documents. Immutable once set.
#[derive(Debug, Clone, Serialize)]
pub struct Documents {
    pub student_record: String,
    pub personal_statement: String,
}

/// Names one stage's stored output artifact.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResultKind {
    InitialReport,
    AdditionalQuestions,
    StrategyReport,
    ModelAnswers,
    SimulationReport,
}

/// One slot per stage artifact. Slots default to empty, are written only by a
/// successful stage call, and are cleared only by a full session reset; a
/// failed call never blanks a previously stored result.
#[derive(Debug, Clone, Default, Serialize)]
pub struct SessionResults {
    pub initial_report: String,
    pub additional_questions: String,
    pub strategy_report: String,
    pub model_answers: String,
    pub simulation_report: String,
}

impl SessionResults {
    pub fn get(&self, kind: ResultKind) -> &str {
        match kind {
            ResultKind::InitialReport => &self.initial_report,
            ResultKind::AdditionalQuestions => &self.additional_questions,
            ResultKind::StrategyReport => &self.strategy_report,
            ResultKind::ModelAnswers => &self.model_answers,
            ResultKind::SimulationReport => &self.simulation_report,
        }
    }

    pub fn set(&mut self, kind: ResultKind, text: String) {
        match kind {
            ResultKind::InitialReport => self.initial_report = text,
            ResultKind::AdditionalQuestions => self.additional_questions = text,
            ResultKind::StrategyReport => self.strategy_report = text,
            ResultKind::ModelAnswers => self.model_answers = text,
            ResultKind::SimulationReport => self.simulation_report = text,
        }
    }
}

/// The top-level mutable aggregate for one user's working session.
#[derive(Debug)]
pub struct Session {
    pub id: Uuid,
    pub stage: Stage,
    pub documents: Option<Documents>,
    reporting_cache: Option<CacheHandle>,
    interactive_cache: Option<CacheHandle>,
    pub results: SessionResults,
    /// Present exactly while `stage == Simulating`; owns the live transcript.
    pub simulation: Option<SimulationSession>,
    /// Transcript of the most recently finalized simulation, moved here (not
    /// copied) on finalization.
    pub transcript_archive: Vec<Turn>,
}

impl Session {
    pub fn new() -> Self {
        Self {
            id: Uuid::new_v4(),
            stage: Stage::Uploading,
            documents: None,
            reporting_cache: None,
            interactive_cache: None,
            results: SessionResults::default(),
            simulation: None,
            transcript_archive: Vec::new(),
        }
    }

    pub fn cache(&self, tier: Tier) -> Option<&CacheHandle> {
        match tier {
            Tier::Reporting => self.reporting_cache.as_ref(),
            Tier::Interactive => self.interactive_cache.as_ref(),
        }
    }

    /// Records a handle in its tier's slot. The caller is responsible for
    /// deleting any previous handle first; this only swaps the slot.
    pub fn set_cache(&mut self, handle: CacheHandle) {
        match handle.tier {
            Tier::Reporting => self.reporting_cache = Some(handle),
            Tier::Interactive => self.interactive_cache = Some(handle),
        }
    }

    pub fn take_cache(&mut self, tier: Tier) -> Option<CacheHandle> {
        match tier {
            Tier::Reporting => self.reporting_cache.take(),
            Tier::Interactive => self.interactive_cache.take(),
        }
    }

    /// Guards every cached read: a tier's handle may only be used once both
    /// documents are set and the handle was successfully created.
    pub fn require_context(&self, tier: Tier) -> Result<&CacheHandle, AppError> {
        if self.documents.is_none() {
            return Err(AppError::InvalidState(
                "no documents have been analyzed in this session".to_string(),
            ));
        }
        self.cache(tier).ok_or_else(|| {
            AppError::InvalidState(format!("no live {tier} cache exists for this session"))
        })
    }

    /// The live transcript: empty unless a simulation is running.
    pub fn transcript(&self) -> &[Turn] {
        self.simulation
            .as_ref()
            .map(|s| s.transcript())
            .unwrap_or(&[])
    }
}

impl Default for Session {
    fn default() -> Self {
        Self::new()
    }
}

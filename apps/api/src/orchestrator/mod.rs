//! Stage orchestration — the state machine driving the whole workflow.
//!
//! Flow: upload → initial analysis → premium report stages → simulation →
//! final report. Each transition is an explicit function over `&mut Session`
//! with its guards up front, independently testable without any HTTP layer.
//!
//! Failure semantics: every remote failure is caught at the transition
//! boundary. A cache miss surfaces as a restart remediation and leaves the
//! session in its current state; a failed generation leaves the target result
//! slot unchanged. Mutation happens only after the remote call succeeds.

use std::sync::Arc;

use tracing::info;

use crate::cache::{ContextCacheManager, RemoteContext, Tier};
use crate::config::Config;
use crate::errors::AppError;
use crate::llm_client::prompts::ANALYST_SYSTEM_INSTRUCTION;
use crate::llm_client::{LlmBackend, LlmError};
use crate::models::session::{Documents, ResultKind, Session, Stage};
use crate::simulation::{self, SimulationConfig, SimulationSession, MAX_DIFFICULTY, MIN_DIFFICULTY};

pub mod composer;
pub mod handlers;
pub mod prompts;

use prompts::*;

/// The three reporting-tier stages available after the initial analysis.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReportStage {
    AdditionalQuestions,
    Strategy,
    ModelAnswers,
}

impl ReportStage {
    fn command(self) -> &'static str {
        match self {
            ReportStage::AdditionalQuestions => CMD_ADDITIONAL_QUESTIONS,
            ReportStage::Strategy => CMD_STRATEGY_REPORT,
            ReportStage::ModelAnswers => CMD_MODEL_ANSWERS,
        }
    }

    fn result_kind(self) -> ResultKind {
        match self {
            ReportStage::AdditionalQuestions => ResultKind::AdditionalQuestions,
            ReportStage::Strategy => ResultKind::StrategyReport,
            ReportStage::ModelAnswers => ResultKind::ModelAnswers,
        }
    }
}

/// Outcome of one simulation turn: either the interviewer's reply, or the
/// final report when the candidate's input was the terminator.
#[derive(Debug)]
pub enum TurnOutcome {
    Reply(String),
    Finalized(String),
}

/// Sequences the workflow stages and decides, per transition, which cache
/// tier to use and whether to create, reuse, or recreate a cache.
pub struct Orchestrator {
    backend: Arc<dyn LlmBackend>,
    caches: ContextCacheManager,
}

fn map_generation(e: LlmError) -> AppError {
    match e {
        LlmError::CacheNotFound => AppError::CacheExpired,
        other => AppError::Generation(other.to_string()),
    }
}

impl Orchestrator {
    pub fn new(backend: Arc<dyn LlmBackend>, config: &Config) -> Self {
        let caches = ContextCacheManager::new(backend.clone(), config);
        Self { backend, caches }
    }

    /// Resolves the session's handle for `tier` into a generate-ready
    /// reference, enforcing that documents exist and the handle was created.
    async fn context(&self, session: &Session, tier: Tier) -> Result<RemoteContext, AppError> {
        let handle = session.require_context(tier)?;
        self.caches.get(handle).await
    }

    /// Uploading → Analyzed. Creates both tier caches seeded with the parsed
    /// documents and the fixed system instruction, then runs the initial
    /// analysis on the reporting tier. On any remote failure the session is
    /// untouched and partially created caches are released.
    pub async fn analyze(
        &self,
        session: &mut Session,
        documents: Documents,
    ) -> Result<String, AppError> {
        if session.stage != Stage::Uploading {
            return Err(AppError::InvalidState(
                "documents were already analyzed; restart to upload a new set".to_string(),
            ));
        }

        let blocks = composer::document_blocks(&documents);
        let reporting = self
            .caches
            .create(Tier::Reporting, ANALYST_SYSTEM_INSTRUCTION, &blocks)
            .await?;
        let interactive = match self
            .caches
            .create(Tier::Interactive, ANALYST_SYSTEM_INSTRUCTION, &blocks)
            .await
        {
            Ok(handle) => handle,
            Err(e) => {
                self.caches.delete(&reporting).await;
                return Err(e);
            }
        };

        let model = self.caches.model_for(Tier::Reporting).to_string();
        let report = match self
            .backend
            .generate_cached(&model, &reporting.id, INITIAL_ANALYSIS_PROMPT)
            .await
        {
            Ok(text) => text,
            Err(e) => {
                self.caches.delete(&reporting).await;
                self.caches.delete(&interactive).await;
                return Err(map_generation(e));
            }
        };

        session.documents = Some(documents);
        session.set_cache(reporting);
        session.set_cache(interactive);
        session.results.set(ResultKind::InitialReport, report.clone());
        session.stage = Stage::Analyzed;
        info!("Initial analysis complete; both tier caches are live");
        Ok(report)
    }

    /// Analyzed → Analyzed. Runs one premium stage against the reporting
    /// tier and stores its result slot on success only.
    pub async fn run_report_stage(
        &self,
        session: &mut Session,
        stage: ReportStage,
    ) -> Result<String, AppError> {
        if session.stage != Stage::Analyzed {
            return Err(AppError::InvalidState(
                "run the initial analysis before requesting report stages".to_string(),
            ));
        }

        let mut fragments: Vec<(&str, &str)> = Vec::new();
        if stage == ReportStage::ModelAnswers {
            let representative = session.results.get(ResultKind::InitialReport);
            let deep_dive = session.results.get(ResultKind::AdditionalQuestions);
            if representative.trim().is_empty() && deep_dive.trim().is_empty() {
                return Err(AppError::Validation(
                    "extract interview questions before generating model answers".to_string(),
                ));
            }
            fragments.push((LABEL_REPRESENTATIVE_QUESTIONS, representative));
            fragments.push((LABEL_DEEP_DIVE_QUESTIONS, deep_dive));
        }

        let ctx = self.context(session, Tier::Reporting).await?;
        let prompt = composer::compose_stage_prompt(stage.command(), &fragments);
        let text = self
            .backend
            .generate_cached(&ctx.model, &ctx.cache_name, &prompt)
            .await
            .map_err(map_generation)?;

        session.results.set(stage.result_kind(), text.clone());
        info!("Stage '{}' stored {} chars", stage.command(), text.len());
        Ok(text)
    }

    /// Analyzed → Simulating. Builds a fresh interactive-tier cache seeded
    /// with the documents plus every analysis result so far, superseding the
    /// lightweight interactive cache from the initial analysis, and issues
    /// the interviewer's first question.
    pub async fn start_simulation(
        &self,
        session: &mut Session,
        config: SimulationConfig,
    ) -> Result<String, AppError> {
        if session.stage != Stage::Analyzed {
            return Err(AppError::InvalidState(
                "finish the initial analysis before starting a simulation".to_string(),
            ));
        }
        if config.difficulty < MIN_DIFFICULTY || config.difficulty > MAX_DIFFICULTY {
            return Err(AppError::Validation(format!(
                "difficulty must be between {MIN_DIFFICULTY} and {MAX_DIFFICULTY}"
            )));
        }
        let Some(documents) = session.documents.as_ref() else {
            return Err(AppError::InvalidState(
                "no analyzed documents in the session".to_string(),
            ));
        };

        let blocks = composer::simulation_seed_blocks(documents, &session.results);
        let fresh = self
            .caches
            .create(Tier::Interactive, ANALYST_SYSTEM_INSTRUCTION, &blocks)
            .await?;

        let model = self.caches.model_for(Tier::Interactive).to_string();
        let prompt = composer::compose_simulation_start_prompt(&config);
        let first_question = match self.backend.generate_cached(&model, &fresh.id, &prompt).await {
            Ok(text) => text,
            Err(e) => {
                self.caches.delete(&fresh).await;
                return Err(map_generation(e));
            }
        };

        if let Some(stale) = session.take_cache(Tier::Interactive) {
            self.caches.delete(&stale).await;
        }
        session.set_cache(fresh);

        let mut sim = SimulationSession::new(config);
        sim.append_assistant_turn(first_question.clone());
        session.simulation = Some(sim);
        session.stage = Stage::Simulating;
        info!(
            "Simulation started (difficulty {}, feedback {})",
            config.difficulty, config.feedback_mode
        );
        Ok(first_question)
    }

    /// Simulating → Simulating (ordinary answer), or → Analyzed when the
    /// input is the terminator. Both the candidate turn and the interviewer
    /// turn are committed together after the call succeeds, so a failed call
    /// leaves the transcript exactly as it was.
    pub async fn simulation_turn(
        &self,
        session: &mut Session,
        user_input: &str,
    ) -> Result<TurnOutcome, AppError> {
        if session.stage != Stage::Simulating {
            return Err(AppError::InvalidState(
                "no interview simulation is running".to_string(),
            ));
        }
        let answer = user_input.trim();
        if answer.is_empty() {
            return Err(AppError::Validation("answer cannot be empty".to_string()));
        }
        if simulation::is_terminator(answer) {
            let report = self.finalize_simulation(session).await?;
            return Ok(TurnOutcome::Finalized(report));
        }

        let reply = {
            let Some(sim) = session.simulation.as_ref() else {
                return Err(AppError::InvalidState(
                    "no interview simulation is running".to_string(),
                ));
            };
            let ctx = self.context(session, Tier::Interactive).await?;
            let prompt = composer::compose_simulation_turn_prompt(sim.transcript(), answer);
            self.backend
                .generate_cached(&ctx.model, &ctx.cache_name, &prompt)
                .await
                .map_err(map_generation)?
        };

        let Some(sim) = session.simulation.as_mut() else {
            return Err(AppError::InvalidState(
                "no interview simulation is running".to_string(),
            ));
        };
        sim.append_user_turn(answer);
        sim.append_assistant_turn(reply.clone());
        Ok(TurnOutcome::Reply(reply))
    }

    /// Simulating → Analyzed. Produces the final report on the reporting
    /// tier, archives the transcript (moved, not copied), and releases the
    /// interactive cache. A second finalize without a new simulation is an
    /// invalid transition; the stored report stays as the first one left it.
    pub async fn finalize_simulation(&self, session: &mut Session) -> Result<String, AppError> {
        if session.stage != Stage::Simulating {
            return Err(AppError::InvalidState(
                "no interview simulation to finalize".to_string(),
            ));
        }

        let report = {
            let Some(sim) = session.simulation.as_ref() else {
                return Err(AppError::InvalidState(
                    "no interview simulation to finalize".to_string(),
                ));
            };
            let ctx = self.context(session, Tier::Reporting).await?;
            let prompt = composer::compose_final_report_prompt(sim.transcript());
            self.backend
                .generate_cached(&ctx.model, &ctx.cache_name, &prompt)
                .await
                .map_err(map_generation)?
        };

        let Some(sim) = session.simulation.take() else {
            return Err(AppError::InvalidState(
                "no interview simulation to finalize".to_string(),
            ));
        };
        session.transcript_archive = sim.into_transcript();
        session
            .results
            .set(ResultKind::SimulationReport, report.clone());
        if let Some(handle) = session.take_cache(Tier::Interactive) {
            self.caches.delete(&handle).await;
        }
        session.stage = Stage::Analyzed;
        info!(
            "Simulation finalized; transcript archived ({} turns)",
            session.transcript_archive.len()
        );
        Ok(report)
    }

    /// Any stage → Uploading. Releases every live handle (best-effort) and
    /// resets the session to a fresh state. Never fails; calling it twice in
    /// a row lands in the same clean state.
    pub async fn restart(&self, session: &mut Session) {
        for tier in [Tier::Reporting, Tier::Interactive] {
            if let Some(handle) = session.take_cache(tier) {
                self.caches.delete(&handle).await;
            }
        }
        *session = Session::new();
        info!("Session reset to a fresh uploading state");
    }
}

//! Axum route handlers for the workflow API.
//!
//! Handlers are thin: they validate the request shape, take the session
//! lock, and delegate to the orchestrator. Taking the lock for the whole
//! action is what serializes stage transitions and cache operations.

use axum::{
    extract::{Multipart, State},
    http::StatusCode,
    Json,
};
use bytes::Bytes;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::cache::Tier;
use crate::errors::AppError;
use crate::ingest;
use crate::models::session::{Documents, Session, SessionResults, Stage, Turn};
use crate::orchestrator::{ReportStage, TurnOutcome};
use crate::simulation::SimulationConfig;
use crate::state::AppState;

// ────────────────────────────────────────────────────────────────────────────
// Request / Response types
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
pub struct AnalyzeResponse {
    pub stage: Stage,
    pub initial_report: String,
}

#[derive(Debug, Serialize)]
pub struct StageResultResponse {
    pub stage: Stage,
    pub result: String,
}

#[derive(Debug, Serialize)]
pub struct SimulationStartResponse {
    pub stage: Stage,
    pub first_question: String,
}

#[derive(Debug, Deserialize)]
pub struct TurnRequest {
    pub content: String,
}

#[derive(Debug, Serialize)]
pub struct TurnResponse {
    pub stage: Stage,
    pub finalized: bool,
    pub reply: Option<String>,
    pub report: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct FinalizeResponse {
    pub stage: Stage,
    pub report: String,
}

#[derive(Debug, Serialize)]
pub struct CacheStatus {
    pub reporting: bool,
    pub interactive: bool,
}

/// Everything the presentation layer renders, in one snapshot.
#[derive(Debug, Serialize)]
pub struct SessionSnapshot {
    pub session_id: Uuid,
    pub stage: Stage,
    pub documents_loaded: bool,
    pub caches: CacheStatus,
    pub results: SessionResults,
    pub simulation: Option<SimulationConfig>,
    pub transcript: Vec<Turn>,
    pub transcript_archive: Vec<Turn>,
}

impl SessionSnapshot {
    fn of(session: &Session) -> Self {
        Self {
            session_id: session.id,
            stage: session.stage,
            documents_loaded: session.documents.is_some(),
            caches: CacheStatus {
                reporting: session.cache(Tier::Reporting).is_some(),
                interactive: session.cache(Tier::Interactive).is_some(),
            },
            results: session.results.clone(),
            simulation: session.simulation.as_ref().map(|s| s.config()),
            transcript: session.transcript().to_vec(),
            transcript_archive: session.transcript_archive.clone(),
        }
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Handlers
// ────────────────────────────────────────────────────────────────────────────

/// GET /api/v1/session
pub async fn handle_get_session(State(state): State<AppState>) -> Json<SessionSnapshot> {
    let session = state.session.lock().await;
    Json(SessionSnapshot::of(&session))
}

/// POST /api/v1/session/analyze
///
/// Multipart upload of the two PDFs (`student_record`, `personal_statement`).
/// Extracts both texts, then runs the Uploading → Analyzed transition.
pub async fn handle_analyze(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<Json<AnalyzeResponse>, AppError> {
    let mut student_record: Option<Bytes> = None;
    let mut personal_statement: Option<Bytes> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::Validation(format!("invalid multipart upload: {e}")))?
    {
        let Some(name) = field.name().map(str::to_string) else {
            continue;
        };
        let data = field
            .bytes()
            .await
            .map_err(|e| AppError::Validation(format!("failed to read uploaded file: {e}")))?;
        match name.as_str() {
            "student_record" => student_record = Some(data),
            "personal_statement" => personal_statement = Some(data),
            _ => {}
        }
    }

    let student_record = student_record
        .ok_or_else(|| AppError::Validation("a student record PDF is required".to_string()))?;
    let personal_statement = personal_statement.ok_or_else(|| {
        AppError::Validation("a personal statement PDF is required".to_string())
    })?;

    let documents = Documents {
        student_record: ingest::extract_text(&student_record)
            .map_err(|e| AppError::Validation(format!("student record: {e}")))?,
        personal_statement: ingest::extract_text(&personal_statement)
            .map_err(|e| AppError::Validation(format!("personal statement: {e}")))?,
    };

    let mut session = state.session.lock().await;
    let initial_report = state.orchestrator.analyze(&mut session, documents).await?;
    Ok(Json(AnalyzeResponse {
        stage: session.stage,
        initial_report,
    }))
}

/// POST /api/v1/session/reports/additional-questions
pub async fn handle_additional_questions(
    State(state): State<AppState>,
) -> Result<Json<StageResultResponse>, AppError> {
    run_report(state, ReportStage::AdditionalQuestions).await
}

/// POST /api/v1/session/reports/strategy
pub async fn handle_strategy_report(
    State(state): State<AppState>,
) -> Result<Json<StageResultResponse>, AppError> {
    run_report(state, ReportStage::Strategy).await
}

/// POST /api/v1/session/reports/model-answers
pub async fn handle_model_answers(
    State(state): State<AppState>,
) -> Result<Json<StageResultResponse>, AppError> {
    run_report(state, ReportStage::ModelAnswers).await
}

async fn run_report(
    state: AppState,
    stage: ReportStage,
) -> Result<Json<StageResultResponse>, AppError> {
    let mut session = state.session.lock().await;
    let result = state
        .orchestrator
        .run_report_stage(&mut session, stage)
        .await?;
    Ok(Json(StageResultResponse {
        stage: session.stage,
        result,
    }))
}

/// POST /api/v1/session/simulation/start
pub async fn handle_simulation_start(
    State(state): State<AppState>,
    Json(config): Json<SimulationConfig>,
) -> Result<Json<SimulationStartResponse>, AppError> {
    let mut session = state.session.lock().await;
    let first_question = state
        .orchestrator
        .start_simulation(&mut session, config)
        .await?;
    Ok(Json(SimulationStartResponse {
        stage: session.stage,
        first_question,
    }))
}

/// POST /api/v1/session/simulation/turns
pub async fn handle_simulation_turn(
    State(state): State<AppState>,
    Json(request): Json<TurnRequest>,
) -> Result<Json<TurnResponse>, AppError> {
    let mut session = state.session.lock().await;
    let outcome = state
        .orchestrator
        .simulation_turn(&mut session, &request.content)
        .await?;
    let response = match outcome {
        TurnOutcome::Reply(reply) => TurnResponse {
            stage: session.stage,
            finalized: false,
            reply: Some(reply),
            report: None,
        },
        TurnOutcome::Finalized(report) => TurnResponse {
            stage: session.stage,
            finalized: true,
            reply: None,
            report: Some(report),
        },
    };
    Ok(Json(response))
}

/// POST /api/v1/session/simulation/finalize
pub async fn handle_simulation_finalize(
    State(state): State<AppState>,
) -> Result<Json<FinalizeResponse>, AppError> {
    let mut session = state.session.lock().await;
    let report = state.orchestrator.finalize_simulation(&mut session).await?;
    Ok(Json(FinalizeResponse {
        stage: session.stage,
        report,
    }))
}

/// POST /api/v1/session/restart
pub async fn handle_restart(State(state): State<AppState>) -> StatusCode {
    let mut session = state.session.lock().await;
    state.orchestrator.restart(&mut session).await;
    StatusCode::NO_CONTENT
}

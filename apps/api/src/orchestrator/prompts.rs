// Stage commands and fragment labels for the orchestrator's LLM calls.
// The documents themselves live in the context caches; everything here is
// small delta text sent alongside a cache reference.

/// First call after cache creation. The only stage prompt that is a full
/// sentence rather than a command, matching the system instruction's framing.
pub const INITIAL_ANALYSIS_PROMPT: &str = "Begin the analysis now and produce the \
initial analysis report with the five representative interview questions.";

pub const CMD_ADDITIONAL_QUESTIONS: &str = "extract_additional_questions";
pub const CMD_STRATEGY_REPORT: &str = "compose_strategy_report";
pub const CMD_MODEL_ANSWERS: &str = "generate_model_answers";
pub const CMD_START_SIMULATION: &str = "start_interview_simulation";
pub const CMD_FINAL_REPORT: &str = "generate_final_interview_report";

// Labels for prior-result fragments re-presented to the model. Stored results
// are passed whole under these labels; model output is never parsed to
// recover a sub-section.
pub const LABEL_REPRESENTATIVE_QUESTIONS: &str = "Representative questions";
pub const LABEL_DEEP_DIVE_QUESTIONS: &str = "Deep-dive questions";

// Labels for the cache seed blocks.
pub const DOCUMENT_BUNDLE_HEADER: &str = "--- [Submitted documents] ---";
pub const LABEL_STUDENT_RECORD: &str = "Student record";
pub const LABEL_PERSONAL_STATEMENT: &str = "Personal statement";
pub const LABEL_INITIAL_REPORT: &str = "Initial analysis report";
pub const LABEL_STRATEGY_REPORT: &str = "Strategy report";
pub const LABEL_MODEL_ANSWERS: &str = "Model answers";
pub const LABEL_PREVIOUS_SIMULATION_REPORT: &str = "Previous simulation report";

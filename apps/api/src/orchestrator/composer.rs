//! Prompt composition — builds the small delta prompts sent alongside a
//! cache reference, and the content blocks that seed the caches.
//!
//! Composed stage prompts never include the original documents verbatim;
//! those live only in the caches. The simulation turn prompt embeds the full
//! running transcript on purpose: the transcript changes every turn, so
//! caching it per-turn would buy nothing.

use crate::llm_client::ContentBlock;
use crate::models::session::{Documents, Role, SessionResults, Turn};
use crate::orchestrator::prompts::*;
use crate::simulation::SimulationConfig;

/// Assembles a stage prompt from a short symbolic command plus ordered,
/// labeled prior-result fragments. Empty fragments are silently omitted: an
/// empty section under a header would only mislead the model.
pub fn compose_stage_prompt(command: &str, fragments: &[(&str, &str)]) -> String {
    let mut prompt = String::new();
    for (label, text) in fragments {
        let text = text.trim();
        if text.is_empty() {
            continue;
        }
        prompt.push_str(&format!("[{label}]\n{text}\n\n---\n"));
    }
    prompt.push_str(&format!("[User command]\nOn command: '{command}'"));
    prompt
}

/// Encodes the simulation options into the instruction that steers the
/// interactive-tier model's first question.
pub fn compose_simulation_start_prompt(config: &SimulationConfig) -> String {
    let feedback = if config.feedback_mode { "ON" } else { "OFF" };
    format!(
        "[User command]\nOn command: '{CMD_START_SIMULATION}'\n\
         Parameters: difficulty: {}, feedback_mode: '{feedback}'\n\
         Using the submitted documents, open the interview with your first question.",
        config.difficulty
    )
}

/// Embeds the running transcript plus the candidate's newest answer.
pub fn compose_simulation_turn_prompt(transcript: &[Turn], latest_user_input: &str) -> String {
    format!(
        "[Interview transcript so far]\n{}\n\n---\n[User command]\n\
         The candidate has just answered: '{latest_user_input}'. Analyze the answer and \
         produce the next follow-up question, honoring the configured difficulty and \
         feedback mode.",
        render_transcript(transcript)
    )
}

/// The termination command over the full transcript, sent to the reporting
/// tier to produce the final simulation report.
pub fn compose_final_report_prompt(transcript: &[Turn]) -> String {
    format!(
        "[Full interview transcript]\n{}\n\n---\n[User command]\nOn command: '{CMD_FINAL_REPORT}'",
        render_transcript(transcript)
    )
}

fn render_transcript(transcript: &[Turn]) -> String {
    transcript
        .iter()
        .map(|turn| {
            let speaker = match turn.role {
                Role::Assistant => "interviewer",
                Role::User => "candidate",
            };
            format!("{speaker}: {}", turn.content)
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// The seed content for the initial per-tier caches: both documents under
/// their labels, as one role-tagged block.
pub fn document_blocks(documents: &Documents) -> Vec<ContentBlock> {
    vec![ContentBlock::user(vec![
        DOCUMENT_BUNDLE_HEADER.to_string(),
        format!("[{LABEL_STUDENT_RECORD}]\n{}", documents.student_record),
        format!(
            "[{LABEL_PERSONAL_STATEMENT}]\n{}",
            documents.personal_statement
        ),
    ])]
}

/// The seed content for the fresh interactive cache created at simulation
/// start: the documents plus every analysis result produced so far, so the
/// interviewer can draw on the whole analysis without resending it per turn.
pub fn simulation_seed_blocks(documents: &Documents, results: &SessionResults) -> Vec<ContentBlock> {
    let mut parts = vec![
        DOCUMENT_BUNDLE_HEADER.to_string(),
        format!("[{LABEL_STUDENT_RECORD}]\n{}", documents.student_record),
        format!(
            "[{LABEL_PERSONAL_STATEMENT}]\n{}",
            documents.personal_statement
        ),
    ];

    let sections = [
        (LABEL_INITIAL_REPORT, &results.initial_report),
        (LABEL_DEEP_DIVE_QUESTIONS, &results.additional_questions),
        (LABEL_STRATEGY_REPORT, &results.strategy_report),
        (LABEL_MODEL_ANSWERS, &results.model_answers),
        (
            LABEL_PREVIOUS_SIMULATION_REPORT,
            &results.simulation_report,
        ),
    ];
    for (label, text) in sections {
        if text.trim().is_empty() {
            continue;
        }
        parts.push(format!("[{label}]\n{text}"));
    }

    vec![ContentBlock::user(parts)]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stage_prompt_carries_the_command() {
        let prompt = compose_stage_prompt(CMD_ADDITIONAL_QUESTIONS, &[]);
        assert_eq!(
            prompt,
            "[User command]\nOn command: 'extract_additional_questions'"
        );
    }

    #[test]
    fn test_stage_prompt_includes_nonempty_fragments_in_order() {
        let prompt = compose_stage_prompt(
            CMD_MODEL_ANSWERS,
            &[
                (LABEL_REPRESENTATIVE_QUESTIONS, "Q1\nQ2"),
                (LABEL_DEEP_DIVE_QUESTIONS, "Q3"),
            ],
        );
        let representative = prompt.find("[Representative questions]").unwrap();
        let deep_dive = prompt.find("[Deep-dive questions]").unwrap();
        let command = prompt.find("On command:").unwrap();
        assert!(representative < deep_dive);
        assert!(deep_dive < command);
        assert!(prompt.contains("Q1\nQ2"));
    }

    #[test]
    fn test_stage_prompt_omits_empty_fragments() {
        let prompt = compose_stage_prompt(
            CMD_MODEL_ANSWERS,
            &[
                (LABEL_REPRESENTATIVE_QUESTIONS, "Q1"),
                (LABEL_DEEP_DIVE_QUESTIONS, "   "),
            ],
        );
        assert!(prompt.contains("[Representative questions]"));
        assert!(!prompt.contains("[Deep-dive questions]"));
    }

    #[test]
    fn test_start_prompt_encodes_difficulty_and_feedback() {
        let prompt = compose_simulation_start_prompt(&SimulationConfig {
            difficulty: 7,
            feedback_mode: false,
        });
        assert!(prompt.contains("difficulty: 7"));
        assert!(prompt.contains("feedback_mode: 'OFF'"));

        let prompt = compose_simulation_start_prompt(&SimulationConfig {
            difficulty: 3,
            feedback_mode: true,
        });
        assert!(prompt.contains("difficulty: 3"));
        assert!(prompt.contains("feedback_mode: 'ON'"));
    }

    #[test]
    fn test_turn_prompt_embeds_transcript_and_latest_answer() {
        let transcript = vec![
            Turn::assistant("Why did you pick this major?"),
            Turn::user("It started with the robotics club."),
        ];
        let prompt = compose_simulation_turn_prompt(&transcript, "I led the rover project.");
        assert!(prompt.contains("interviewer: Why did you pick this major?"));
        assert!(prompt.contains("candidate: It started with the robotics club."));
        assert!(prompt.contains("'I led the rover project.'"));
    }

    #[test]
    fn test_final_report_prompt_carries_full_transcript() {
        let transcript = vec![Turn::assistant("q"), Turn::user("a")];
        let prompt = compose_final_report_prompt(&transcript);
        assert!(prompt.contains("interviewer: q"));
        assert!(prompt.contains("candidate: a"));
        assert!(prompt.contains(CMD_FINAL_REPORT));
    }

    #[test]
    fn test_document_blocks_label_both_documents() {
        let documents = Documents {
            student_record: "record body".to_string(),
            personal_statement: "statement body".to_string(),
        };
        let blocks = document_blocks(&documents);
        assert_eq!(blocks.len(), 1);
        assert_eq!(blocks[0].role, "user");
        assert_eq!(blocks[0].parts[0], DOCUMENT_BUNDLE_HEADER);
        assert!(blocks[0].parts[1].contains("record body"));
        assert!(blocks[0].parts[2].contains("statement body"));
    }

    #[test]
    fn test_simulation_seed_includes_documents_and_nonempty_results() {
        let documents = Documents {
            student_record: "record body".to_string(),
            personal_statement: "statement body".to_string(),
        };
        let mut results = SessionResults::default();
        results.initial_report = "five questions".to_string();
        results.strategy_report = "the strategy".to_string();

        let blocks = simulation_seed_blocks(&documents, &results);
        let parts = &blocks[0].parts;
        assert!(parts.iter().any(|p| p.contains("record body")));
        assert!(parts.iter().any(|p| p.contains("five questions")));
        assert!(parts.iter().any(|p| p.contains("the strategy")));
        // Unset result slots contribute no section at all.
        assert!(!parts.iter().any(|p| p.contains("[Model answers]")));
        assert!(!parts
            .iter()
            .any(|p| p.contains("[Previous simulation report]")));
    }
}

use std::sync::Arc;
use async_trait::async_trait;
use anyhow::{anyhow, Result};
use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;
use log::{info, warn};

use crate::completion::{CompletionClient, CompletionOptions};
use crate::session::{ChatTurn, DetailedFeedback, Feedback, InterviewSession, Sender};

/// Scores a finished transcript. Errors are recovered by the caller with
/// [`Feedback::neutral`].
#[async_trait]
pub trait FeedbackScorer: Send + Sync {
    async fn score(&self, session: &InterviewSession) -> Result<Feedback>;
}

static NUMBER: Lazy<Regex> = Lazy::new(|| Regex::new(r"\d").expect("static regex"));
static EXAMPLE_MARKERS: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\b(for example|for instance|when i|i led|i built|i designed|i implemented|we shipped|resulted in|measured)\b")
        .expect("static regex")
});
static TEAM_MARKERS: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\b(team|we|collaborat\w*|stakeholders?|mentor\w*|together)\b").expect("static regex")
});
static HEDGES: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\b(um+|uh+|i guess|maybe|kind of|sort of|i don't know|not sure)\b").expect("static regex")
});

/// Deterministic scoring from the candidate's answers alone.
#[derive(Debug, Default, Clone, Copy)]
pub struct TranscriptScorer;

impl TranscriptScorer {
    pub fn new() -> Self {
        Self
    }

    pub fn evaluate(&self, session: &InterviewSession) -> Result<Feedback> {
        let answers: Vec<&str> = session.user_messages().map(|m| m.content.as_str()).collect();
        if answers.is_empty() {
            return Err(anyhow!("No candidate answers to score"));
        }

        let count = answers.len() as f32;
        let total_words: usize = answers.iter().map(|a| a.split_whitespace().count()).sum();
        let average_words = total_words as f32 / count;

        let specific = answers
            .iter()
            .filter(|a| NUMBER.is_match(a) || EXAMPLE_MARKERS.is_match(a))
            .count() as f32;
        let team = answers.iter().filter(|a| TEAM_MARKERS.is_match(a)).count() as f32;
        let hedges: usize = answers.iter().map(|a| HEDGES.find_iter(a).count()).sum();

        let depth = (average_words / 60.0).min(1.0);
        let specificity = specific / count;
        let engagement = (count / 5.0).min(1.0);
        let teamwork = team / count;
        let hedging_penalty = (hedges as f32 * 5.0).min(30.0);

        let communication = to_score(30.0 + depth * 40.0 + engagement * 30.0 - hedging_penalty);
        let technical_knowledge = to_score(25.0 + specificity * 45.0 + depth * 30.0);
        let problem_solving = to_score(30.0 + specificity * 40.0 + engagement * 30.0);
        let cultural_fit = to_score(40.0 + teamwork * 40.0 + engagement * 20.0 - hedging_penalty / 2.0);

        let average = (communication as f32 + technical_knowledge as f32 + problem_solving as f32 + cultural_fit as f32) / 4.0;
        let confidence_score = to_score(average - hedging_penalty / 2.0);
        let overall_rating = 1 + (average / 100.0 * 4.0).round() as u8;

        let mut strengths = Vec::new();
        let mut improvements = Vec::new();

        if depth >= 0.6 {
            strengths.push("Answers were developed in good detail".to_string());
        } else {
            improvements.push("Expand answers with more context and detail".to_string());
        }
        if specificity >= 0.5 {
            strengths.push("Backed claims with concrete examples and numbers".to_string());
        } else {
            improvements.push("Support answers with specific examples and measurable results".to_string());
        }
        if teamwork >= 0.3 {
            strengths.push("Showed awareness of team and stakeholders".to_string());
        } else {
            improvements.push("Mention how you work with others".to_string());
        }
        if hedges == 0 {
            strengths.push("Spoke with confidence".to_string());
        } else {
            improvements.push("Reduce filler words and hedging".to_string());
        }
        if engagement >= 1.0 {
            strengths.push("Stayed engaged for the whole interview".to_string());
        }

        Ok(Feedback {
            confidence_score,
            strengths,
            improvements,
            overall_rating,
            detailed_feedback: DetailedFeedback {
                communication,
                technical_knowledge,
                problem_solving,
                cultural_fit,
            },
        }
        .clamped())
    }
}

fn to_score(value: f32) -> u8 {
    value.round().clamp(0.0, 100.0) as u8
}

#[async_trait]
impl FeedbackScorer for TranscriptScorer {
    async fn score(&self, session: &InterviewSession) -> Result<Feedback> {
        self.evaluate(session)
    }
}

/// Asks the completion service for a JSON report on the transcript.
pub struct CompletionScorer {
    client: Arc<CompletionClient>,
}

impl CompletionScorer {
    pub fn new(client: Arc<CompletionClient>) -> Self {
        Self { client }
    }

    fn evaluation_prompt(session: &InterviewSession) -> String {
        let setup = &session.setup;
        let mut transcript = String::new();
        for message in session.messages() {
            let speaker = match message.sender {
                Sender::Ai => "Interviewer",
                Sender::User => "Candidate",
            };
            transcript.push_str(&format!("{}: {}\n", speaker, message.content));
        }

        format!(
            "Evaluate this mock interview for a {} position in {} ({} difficulty).\n\n\
             Transcript:\n\
             {}\
             Return only JSON with fields:\n\
             confidenceScore (0-100), overallRating (1-5),\n\
             strengths (max 3 strings), improvements (max 3 strings),\n\
             detailedFeedback: {{communication, technicalKnowledge, problemSolving, culturalFit}} (each 0-100)",
            setup.role().unwrap_or("general"),
            setup.industry,
            setup.difficulty,
            transcript
        )
    }
}

#[async_trait]
impl FeedbackScorer for CompletionScorer {
    async fn score(&self, session: &InterviewSession) -> Result<Feedback> {
        if session.user_messages().next().is_none() {
            return Err(anyhow!("No candidate answers to score"));
        }

        let messages = [
            ChatTurn::system("You are an experienced interview coach. Reply with JSON only."),
            ChatTurn::user(Self::evaluation_prompt(session)),
        ];
        let options = CompletionOptions {
            max_tokens: 600,
            temperature: 0.2,
        };

        let reply = self.client.complete_with(&messages, options).await?;
        info!("📝 Feedback report received from {}", self.client.model());
        parse_feedback(&reply)
    }
}

/// Reads a model-written report. Missing fields take the neutral values;
/// a reply with no JSON object at all is an error.
pub fn parse_feedback(reply: &str) -> Result<Feedback> {
    let start = reply.find('{').ok_or_else(|| anyhow!("No JSON object in feedback reply"))?;
    let end = reply.rfind('}').ok_or_else(|| anyhow!("No JSON object in feedback reply"))?;
    if end < start {
        return Err(anyhow!("No JSON object in feedback reply"));
    }

    let json: Value = serde_json::from_str(&reply[start..=end])?;
    let neutral = Feedback::neutral();
    let detail = &json["detailedFeedback"];
    let neutral_detail = &neutral.detailed_feedback;

    let strengths = string_list(&json["strengths"]);
    let improvements = string_list(&json["improvements"]);
    if strengths.is_none() && improvements.is_none() {
        warn!("Feedback reply had no strengths or improvements lists");
    }

    Ok(Feedback {
        confidence_score: number(&json["confidenceScore"], 100).unwrap_or(neutral.confidence_score),
        strengths: strengths.unwrap_or(neutral.strengths),
        improvements: improvements.unwrap_or(neutral.improvements),
        overall_rating: number(&json["overallRating"], 5).unwrap_or(neutral.overall_rating),
        detailed_feedback: DetailedFeedback {
            communication: number(&detail["communication"], 100).unwrap_or(neutral_detail.communication),
            technical_knowledge: number(&detail["technicalKnowledge"], 100).unwrap_or(neutral_detail.technical_knowledge),
            problem_solving: number(&detail["problemSolving"], 100).unwrap_or(neutral_detail.problem_solving),
            cultural_fit: number(&detail["culturalFit"], 100).unwrap_or(neutral_detail.cultural_fit),
        },
    }
    .clamped())
}

fn number(value: &Value, max: u8) -> Option<u8> {
    value
        .as_f64()
        .map(|n| n.round().clamp(0.0, f64::from(max)) as u8)
}

fn string_list(value: &Value) -> Option<Vec<String>> {
    value
        .as_array()
        .map(|arr| arr.iter().filter_map(|v| v.as_str().map(String::from)).collect::<Vec<_>>())
        .filter(|list| !list.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::{Difficulty, InterviewSetup, Personality};

    fn session_with_answers(answers: &[&str]) -> InterviewSession {
        let mut session = InterviewSession::new(InterviewSetup::new("tech", Difficulty::Medium, Personality::Friendly));
        for answer in answers {
            session.append(Sender::Ai, "Tell me more.").unwrap();
            session.append(Sender::User, *answer).unwrap();
        }
        session
    }

    #[test]
    fn test_no_answers_is_an_error() {
        let session = session_with_answers(&[]);
        assert!(TranscriptScorer::new().evaluate(&session).is_err());
    }

    #[test]
    fn test_specific_answers_outscore_vague_ones() {
        let vague = session_with_answers(&["um maybe", "I guess so", "not sure"]);
        let strong = session_with_answers(&[
            "For example, I led a team of 6 engineers that rebuilt our billing pipeline, which resulted in 40% fewer failed payments.",
            "We measured latency before and after the migration and cut p99 from 900ms to 220ms by batching writes together.",
            "When I joined, onboarding took 3 weeks; I built a mentoring plan with the team and brought it down to 1 week.",
        ]);

        let scorer = TranscriptScorer::new();
        let vague = scorer.evaluate(&vague).unwrap();
        let strong = scorer.evaluate(&strong).unwrap();

        assert!(strong.confidence_score > vague.confidence_score);
        assert!(strong.overall_rating >= vague.overall_rating);
        assert!(strong.detailed_feedback.technical_knowledge > vague.detailed_feedback.technical_knowledge);
        assert!(vague.improvements.iter().any(|i| i.contains("filler")));
        assert!((1..=5).contains(&strong.overall_rating));
    }

    #[test]
    fn test_evaluation_prompt_lines_are_flush() {
        let session = session_with_answers(&["I shipped the search rewrite."]);
        let prompt = CompletionScorer::evaluation_prompt(&session);

        assert!(prompt.starts_with("Evaluate this mock interview for a general position in tech"));
        assert!(prompt.contains("Transcript:\nInterviewer: Tell me more.\nCandidate: I shipped the search rewrite.\nReturn only JSON"));
        assert!(prompt.lines().all(|line| !line.starts_with(' ')), "{}", prompt);
    }

    #[test]
    fn test_parse_feedback_from_wrapped_json() {
        let reply = r#"Here is the report:
        ```json
        {"confidenceScore": 140, "overallRating": 4, "strengths": ["Clear structure"],
         "improvements": ["More metrics"],
         "detailedFeedback": {"communication": 82, "technicalKnowledge": 70.6, "problemSolving": 65, "culturalFit": 90}}
        ```"#;

        let feedback = parse_feedback(reply).unwrap();
        assert_eq!(feedback.confidence_score, 100);
        assert_eq!(feedback.overall_rating, 4);
        assert_eq!(feedback.strengths, vec!["Clear structure".to_string()]);
        assert_eq!(feedback.detailed_feedback.technical_knowledge, 71);
        assert_eq!(feedback.detailed_feedback.cultural_fit, 90);
    }

    #[test]
    fn test_parse_feedback_fills_missing_fields() {
        let feedback = parse_feedback(r#"{"overallRating": 0}"#).unwrap();
        assert_eq!(feedback.overall_rating, 1);
        assert_eq!(feedback.confidence_score, 50);
        assert_eq!(feedback.strengths, Feedback::neutral().strengths);

        assert!(parse_feedback("I cannot evaluate this interview.").is_err());
        assert!(parse_feedback("} oops {").is_err());
    }
}

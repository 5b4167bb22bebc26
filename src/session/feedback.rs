use serde::{Serialize, Deserialize};

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct DetailedFeedback {
    pub communication: u8,        // 0-100
    pub technical_knowledge: u8,  // 0-100
    pub problem_solving: u8,      // 0-100
    pub cultural_fit: u8,         // 0-100
}

/// End-of-session report. Computed once when the interview ends.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Feedback {
    pub confidence_score: u8, // 0-100
    pub strengths: Vec<String>,
    pub improvements: Vec<String>,
    pub overall_rating: u8, // 1-5
    pub detailed_feedback: DetailedFeedback,
}

impl Feedback {
    /// Substitute report used when scoring fails.
    pub fn neutral() -> Self {
        Self {
            confidence_score: 50,
            strengths: vec![
                "Completed the interview session".to_string(),
                "Engaged with the interviewer's questions".to_string(),
            ],
            improvements: vec![
                "Give more specific examples from past work".to_string(),
                "Structure answers with situation, action and result".to_string(),
            ],
            overall_rating: 3,
            detailed_feedback: DetailedFeedback {
                communication: 50,
                technical_knowledge: 50,
                problem_solving: 50,
                cultural_fit: 50,
            },
        }
    }

    /// Pulls every score back into its documented range.
    pub fn clamped(mut self) -> Self {
        self.confidence_score = self.confidence_score.min(100);
        self.overall_rating = self.overall_rating.clamp(1, 5);
        let d = &mut self.detailed_feedback;
        d.communication = d.communication.min(100);
        d.technical_knowledge = d.technical_knowledge.min(100);
        d.problem_solving = d.problem_solving.min(100);
        d.cultural_fit = d.cultural_fit.min(100);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clamped_ranges() {
        let mut feedback = Feedback::neutral();
        feedback.confidence_score = 180;
        feedback.overall_rating = 0;
        feedback.detailed_feedback.cultural_fit = 255;

        let feedback = feedback.clamped();
        assert_eq!(feedback.confidence_score, 100);
        assert_eq!(feedback.overall_rating, 1);
        assert_eq!(feedback.detailed_feedback.cultural_fit, 100);
    }

    #[test]
    fn test_camel_case_wire_names() {
        let json = serde_json::to_value(Feedback::neutral()).unwrap();
        assert_eq!(json["confidenceScore"], 50);
        assert_eq!(json["overallRating"], 3);
        assert_eq!(json["detailedFeedback"]["technicalKnowledge"], 50);
    }
}

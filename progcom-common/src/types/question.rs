//! Question and answer wire types

use serde::{Deserialize, Serialize};

use crate::expand::Expandable;
use crate::localized::LocalizedString;

/// What a question is attached to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QuestionTarget {
    Submission,
    Speaker,
    Reviewer,
}

/// One option of a closed-choice question.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuestionOption {
    pub id: i64,
    pub answer: LocalizedString,
}

/// A custom question configured for the event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Question {
    pub id: i64,
    pub question: LocalizedString,
    #[serde(default)]
    pub target: Option<QuestionTarget>,
    /// Input variant, e.g. `text`, `choices`, `boolean`.
    #[serde(default)]
    pub variant: Option<String>,
    #[serde(default)]
    pub required: bool,
    #[serde(default)]
    pub options: Vec<QuestionOption>,
}

/// An answer binding a question to a proposal, speaker or review.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Answer {
    pub id: i64,
    pub question: Expandable<i64, Question>,
    #[serde(default)]
    pub answer: String,
    /// Code of the answering proposal, when the question targets proposals.
    #[serde(default)]
    pub submission: Option<String>,
    /// Code of the answering speaker, when the question targets speakers.
    #[serde(default)]
    pub person: Option<String>,
    #[serde(default)]
    pub review: Option<i64>,
    /// Selected option identifiers for closed-choice questions.
    #[serde(default)]
    pub options: Vec<i64>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_question_with_options() {
        let json = r#"{
            "id": 9,
            "question": {"en": "Expected audience level"},
            "target": "submission",
            "variant": "choices",
            "required": true,
            "options": [
                {"id": 1, "answer": {"en": "Novice"}},
                {"id": 2, "answer": {"en": "Advanced"}}
            ]
        }"#;
        let q: Question = serde_json::from_str(json).unwrap();
        assert_eq!(q.target, Some(QuestionTarget::Submission));
        assert_eq!(q.options.len(), 2);
        assert!(q.required);
    }

    #[test]
    fn test_answer_with_question_reference() {
        let json = r#"{"id": 11, "question": 9, "answer": "Novice", "submission": "ABCDE"}"#;
        let a: Answer = serde_json::from_str(json).unwrap();
        assert_eq!(a.question.reference(), Some(&9));
        assert_eq!(a.submission.as_deref(), Some("ABCDE"));
    }

    #[test]
    fn test_answer_with_nested_question() {
        let json = r#"{
            "id": 11,
            "question": {"id": 9, "question": {"en": "Expected audience level"}},
            "answer": "Advanced",
            "options": [2]
        }"#;
        let a: Answer = serde_json::from_str(json).unwrap();
        assert_eq!(a.question.full().unwrap().id, 9);
        assert_eq!(a.options, vec![2]);
    }
}

// src/models/exam.rs

use bson::oid::ObjectId;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use validator::Validate;

/// Number of answer options every question carries.
pub const OPTIONS_PER_QUESTION: usize = 4;

/// Represents a document in the `exams` collection.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Exam {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<ObjectId>,

    pub title: String,

    /// Sanitized HTML.
    pub description: String,

    /// Declared duration in minutes. Shown to the student, not enforced.
    pub duration: i64,

    /// Ordered; answer fields are matched by position.
    pub questions: Vec<Question>,

    /// `_id` of the admin who authored the exam.
    pub created_by: ObjectId,

    #[serde(with = "bson::serde_helpers::chrono_datetime_as_bson_datetime")]
    pub created_at: DateTime<Utc>,

    pub is_active: bool,
}

/// A single multiple-choice question embedded in an exam.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Question {
    /// Prompt text.
    pub question: String,

    pub options: [String; OPTIONS_PER_QUESTION],

    /// Zero-based index into `options`.
    pub correct_answer: i64,
}

impl Exam {
    /// Builds an active, not-yet-persisted exam from a validated draft.
    pub fn from_draft(draft: ExamDraft, created_by: ObjectId) -> Self {
        Self {
            id: None,
            title: draft.title,
            description: draft.description,
            duration: draft.duration,
            questions: draft
                .questions
                .into_iter()
                .map(|q| Question {
                    question: q.question,
                    options: q.options,
                    correct_answer: q.correct_answer,
                })
                .collect(),
            created_by,
            created_at: Utc::now(),
            is_active: true,
        }
    }
}

/// Structured exam payload decoded from the authoring form.
#[derive(Debug, Clone, PartialEq, Validate)]
pub struct ExamDraft {
    #[validate(length(min = 1, max = 200, message = "Title must be between 1 and 200 characters."))]
    pub title: String,
    #[validate(length(max = 5000, message = "Description is too long."))]
    pub description: String,
    #[validate(range(min = 1, max = 600, message = "Duration must be between 1 and 600 minutes."))]
    pub duration: i64,
    #[validate(length(min = 1, message = "An exam needs at least one question."), nested)]
    pub questions: Vec<QuestionDraft>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Validate)]
pub struct QuestionDraft {
    #[validate(length(min = 1, max = 1000, message = "Question text must not be empty."))]
    pub question: String,
    #[validate(custom(function = validate_options))]
    pub options: [String; OPTIONS_PER_QUESTION],
    #[validate(range(min = 0, max = 3, message = "Correct answer must be one of the four options."))]
    pub correct_answer: i64,
}

fn validate_options(options: &[String; OPTIONS_PER_QUESTION]) -> Result<(), validator::ValidationError> {
    for opt in options {
        if opt.len() > 500 {
            return Err(validator::ValidationError::new("option_too_long"));
        }
    }
    Ok(())
}

/// Exam row shown on dashboards.
#[derive(Debug, Serialize)]
pub struct ExamSummary {
    pub id: String,
    pub title: String,
    pub description: String,
    pub duration: i64,
    pub question_count: usize,
    pub is_active: bool,
    pub created_at: String,
}

impl From<&Exam> for ExamSummary {
    fn from(exam: &Exam) -> Self {
        Self {
            id: exam.id.map(|id| id.to_hex()).unwrap_or_default(),
            title: exam.title.clone(),
            description: exam.description.clone(),
            duration: exam.duration,
            question_count: exam.questions.len(),
            is_active: exam.is_active,
            created_at: exam.created_at.format("%Y-%m-%d %H:%M").to_string(),
        }
    }
}

/// Exam as sent to the student taking it (excludes correct answers).
#[derive(Debug, Serialize)]
pub struct PublicExam {
    pub id: String,
    pub title: String,
    pub description: String,
    pub duration: i64,
    pub questions: Vec<PublicQuestion>,
}

#[derive(Debug, Serialize)]
pub struct PublicQuestion {
    pub index: usize,
    pub question: String,
    pub options: Vec<String>,
}

impl From<&Exam> for PublicExam {
    fn from(exam: &Exam) -> Self {
        Self {
            id: exam.id.map(|id| id.to_hex()).unwrap_or_default(),
            title: exam.title.clone(),
            description: exam.description.clone(),
            duration: exam.duration,
            questions: exam
                .questions
                .iter()
                .enumerate()
                .map(|(index, q)| PublicQuestion {
                    index,
                    question: q.question.clone(),
                    options: q.options.to_vec(),
                })
                .collect(),
        }
    }
}

/// Aggregate counts for the admin dashboard.
#[derive(Debug, Serialize, PartialEq, Eq)]
pub struct AdminStats {
    pub total_exams: u64,
    pub total_students: u64,
    pub total_results: u64,
    pub active_exams: u64,
}

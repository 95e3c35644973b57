// src/models/exam_result.rs

use bson::oid::ObjectId;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Recorded in `answers` for a question the student left blank.
pub const UNANSWERED: i64 = -1;

/// Represents a document in the `results` collection.
/// One per submission; never updated.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExamResult {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<ObjectId>,
    pub student_id: ObjectId,
    pub exam_id: ObjectId,
    pub answers: Vec<i64>,
    pub score: i64,
    pub total_questions: i64,
    pub percentage: f64,
    #[serde(with = "bson::serde_helpers::chrono_datetime_as_bson_datetime")]
    pub completed_at: DateTime<Utc>,
}

/// A past attempt as listed on the student dashboard.
#[derive(Debug, Serialize)]
pub struct ResultSummary {
    pub exam_title: String,
    pub score: i64,
    pub total_questions: i64,
    pub percentage: f64,
    pub completed_at: String,
}

impl ResultSummary {
    pub fn new(result: &ExamResult, exam_title: String) -> Self {
        Self {
            exam_title,
            score: result.score,
            total_questions: result.total_questions,
            percentage: result.percentage,
            completed_at: result.completed_at.format("%Y-%m-%d %H:%M").to_string(),
        }
    }
}

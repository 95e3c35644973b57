// src/handlers/exam.rs

use std::sync::Arc;

use axum::{
    Extension, Form,
    extract::{Path, State},
    response::{IntoResponse, Redirect, Response},
};
use bson::oid::ObjectId;
use chrono::Utc;
use minijinja::context;

use super::render_page;
use crate::{
    error::AppError,
    models::{
        exam::{Exam, PublicExam, Question},
        exam_result::{ExamResult, UNANSWERED},
    },
    state::Templates,
    store::Store,
    utils::{
        form::{FormFields, field, parse_answers},
        session::{FlashCategory, Session, SessionUser},
    },
};

const EXAM_NOT_AVAILABLE: &str = "Exam not available";

/// Outcome of grading one submission.
#[derive(Debug, Clone, PartialEq)]
pub struct Score {
    /// One entry per question, `UNANSWERED` where the student left it blank.
    pub answers: Vec<i64>,
    pub score: i64,
    pub total_questions: i64,
    pub percentage: f64,
}

/// Grades `answers` against `questions`, position by position.
///
/// A missing answer is recorded as `UNANSWERED` and never counts as correct.
/// An exam without questions scores 0 with 0.0 percent.
pub fn score_answers(questions: &[Question], answers: &[Option<i64>]) -> Score {
    let mut score = 0;
    let mut recorded = Vec::with_capacity(questions.len());

    for (i, question) in questions.iter().enumerate() {
        match answers.get(i).copied().flatten() {
            Some(answer) => {
                if answer == question.correct_answer {
                    score += 1;
                }
                recorded.push(answer);
            }
            None => recorded.push(UNANSWERED),
        }
    }

    let total_questions = questions.len() as i64;
    let percentage = if total_questions == 0 {
        0.0
    } else {
        (score as f64 / total_questions as f64) * 100.0
    };

    Score {
        answers: recorded,
        score,
        total_questions,
        percentage,
    }
}

/// Loads an exam that may be taken: the id parses, the exam exists, and it is
/// active. All three failures look the same to the caller.
async fn find_available_exam(store: &dyn Store, raw_id: &str) -> Result<Option<Exam>, AppError> {
    let Ok(id) = ObjectId::parse_str(raw_id.trim()) else {
        return Ok(None);
    };

    Ok(store.find_exam(id).await?.filter(|exam| exam.is_active))
}

fn exam_not_available(session: &Session) -> Response {
    session.flash(FlashCategory::Error, EXAM_NOT_AVAILABLE);
    Redirect::to("/dashboard").into_response()
}

/// Renders the exam form. Correct answers are not part of the page.
pub async fn take_exam(
    State(store): State<Arc<dyn Store>>,
    State(templates): State<Templates>,
    Extension(session): Extension<Session>,
    Path(exam_id): Path<String>,
) -> Result<Response, AppError> {
    let Some(exam) = find_available_exam(store.as_ref(), &exam_id).await? else {
        return Ok(exam_not_available(&session));
    };

    let page = render_page(
        &templates,
        &session,
        "take_exam.html",
        context! { exam => PublicExam::from(&exam) },
    )?;
    Ok(page.into_response())
}

/// Grades a submission and stores one immutable result.
///
/// Resubmitting the same exam is allowed; every submission is recorded.
pub async fn submit_exam(
    State(store): State<Arc<dyn Store>>,
    Extension(session): Extension<Session>,
    Extension(user): Extension<SessionUser>,
    Form(fields): Form<FormFields>,
) -> Result<Response, AppError> {
    let raw_id = field(&fields, "exam_id").unwrap_or_default();
    let Some(exam) = find_available_exam(store.as_ref(), raw_id).await? else {
        return Ok(exam_not_available(&session));
    };
    let exam_id = exam
        .id
        .ok_or_else(|| AppError::InternalServerError("Stored exam has no _id".to_string()))?;

    let answers = match parse_answers(&fields, exam.questions.len()) {
        Ok(answers) => answers,
        Err(_) => {
            session.flash(FlashCategory::Error, "Invalid answer submitted");
            return Ok(Redirect::to(&format!("/exam/{}", exam_id.to_hex())).into_response());
        }
    };

    let graded = score_answers(&exam.questions, &answers);

    let result = ExamResult {
        id: None,
        student_id: user.object_id()?,
        exam_id,
        answers: graded.answers,
        score: graded.score,
        total_questions: graded.total_questions,
        percentage: graded.percentage,
        completed_at: Utc::now(),
    };

    store.insert_result(result).await.map_err(|e| {
        tracing::error!("Failed to store exam result: {:?}", e);
        e
    })?;
    tracing::info!(
        "User {} submitted exam {}: {}/{}",
        user.user_id,
        exam_id,
        graded.score,
        graded.total_questions
    );

    session.flash(
        FlashCategory::Success,
        format!(
            "Exam submitted: {}/{} ({:.1}%)",
            graded.score, graded.total_questions, graded.percentage
        ),
    );
    Ok(Redirect::to("/dashboard").into_response())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn questions(correct: &[i64]) -> Vec<Question> {
        correct
            .iter()
            .enumerate()
            .map(|(i, &c)| Question {
                question: format!("Question {}", i),
                options: ["A".into(), "B".into(), "C".into(), "D".into()],
                correct_answer: c,
            })
            .collect()
    }

    #[test]
    fn test_score_all_correct() {
        let qs = questions(&[0, 1, 2, 3]);
        let graded = score_answers(&qs, &[Some(0), Some(1), Some(2), Some(3)]);
        assert_eq!(graded.score, 4);
        assert_eq!(graded.total_questions, 4);
        assert_eq!(graded.percentage, 100.0);
        assert_eq!(graded.answers, vec![0, 1, 2, 3]);
    }

    #[test]
    fn test_score_all_unanswered() {
        let qs = questions(&[0, 1, 2]);
        let graded = score_answers(&qs, &[None, None, None]);
        assert_eq!(graded.score, 0);
        assert_eq!(graded.percentage, 0.0);
        assert_eq!(graded.answers, vec![UNANSWERED; 3]);
    }

    #[test]
    fn test_score_partial_is_exact_ratio() {
        let qs = questions(&[0, 0, 0]);
        let graded = score_answers(&qs, &[Some(0), Some(1), None]);
        assert_eq!(graded.score, 1);
        assert_eq!(graded.percentage, (1.0 / 3.0) * 100.0);
        assert_eq!(graded.answers, vec![0, 1, UNANSWERED]);
    }

    #[test]
    fn test_score_short_answer_list_counts_as_unanswered() {
        let qs = questions(&[2, 2]);
        let graded = score_answers(&qs, &[Some(2)]);
        assert_eq!(graded.score, 1);
        assert_eq!(graded.answers, vec![2, UNANSWERED]);
        assert_eq!(graded.percentage, 50.0);
    }

    #[test]
    fn test_score_negative_answer_never_matches() {
        let qs = questions(&[0]);
        let graded = score_answers(&qs, &[Some(-1)]);
        assert_eq!(graded.score, 0);
    }

    #[test]
    fn test_score_empty_exam() {
        let graded = score_answers(&[], &[]);
        assert_eq!(graded.score, 0);
        assert_eq!(graded.total_questions, 0);
        assert_eq!(graded.percentage, 0.0);
    }
}

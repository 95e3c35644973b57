// src/utils/form.rs

//! Decoding of the indexed HTML form fields (`question_0`, `option_0_2`, ...)
//! into structured payloads. Handlers only ever see the structured form.

use std::{collections::BTreeMap, sync::LazyLock};

use regex::Regex;

use crate::{
    error::AppError,
    models::exam::{ExamDraft, OPTIONS_PER_QUESTION, QuestionDraft},
    utils::html::clean_html,
};

/// Raw `application/x-www-form-urlencoded` pairs, in submission order.
pub type FormFields = Vec<(String, String)>;

static QUESTION_FIELD: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^question_(\d+)$").expect("valid regex"));
static OPTION_FIELD: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^option_(\d+)_(\d+)$").expect("valid regex"));
static CORRECT_FIELD: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^correct_answer_(\d+)$").expect("valid regex"));

/// Returns the value of the first field called `name`.
pub fn field<'a>(fields: &'a [(String, String)], name: &str) -> Option<&'a str> {
    fields
        .iter()
        .find(|(key, _)| key == name)
        .map(|(_, value)| value.as_str())
}

fn parse_int(value: &str, what: &str) -> Result<i64, AppError> {
    value
        .trim()
        .parse::<i64>()
        .map_err(|_| AppError::BadRequest(format!("{} must be a whole number.", what)))
}

fn index_of(re: &Regex, key: &str) -> Option<(usize, Option<usize>)> {
    let caps = re.captures(key)?;
    let first = caps.get(1)?.as_str().parse().ok()?;
    let second = caps.get(2).and_then(|m| m.as_str().parse().ok());
    Some((first, second))
}

#[derive(Default)]
struct PartialQuestion {
    question: Option<String>,
    options: [Option<String>; OPTIONS_PER_QUESTION],
    correct_answer: Option<String>,
}

/// Decodes the exam authoring form into an [`ExamDraft`].
///
/// Questions are ordered by their field index. `question_count` is required and
/// must match the number of questions present. The returned draft is not yet
/// validated; the description is already sanitized.
pub fn parse_exam_form(fields: &[(String, String)]) -> Result<ExamDraft, AppError> {
    let title = field(fields, "title").unwrap_or_default().trim().to_string();
    let description = clean_html(field(fields, "description").unwrap_or_default().trim());
    let duration = parse_int(field(fields, "duration").unwrap_or_default(), "Duration")?;

    let mut partials: BTreeMap<usize, PartialQuestion> = BTreeMap::new();
    for (key, value) in fields {
        if let Some((i, _)) = index_of(&QUESTION_FIELD, key) {
            partials.entry(i).or_default().question = Some(value.trim().to_string());
        } else if let Some((i, Some(j))) = index_of(&OPTION_FIELD, key) {
            if j >= OPTIONS_PER_QUESTION {
                return Err(AppError::BadRequest(format!(
                    "Question {} has more than {} options.",
                    i + 1,
                    OPTIONS_PER_QUESTION
                )));
            }
            partials.entry(i).or_default().options[j] = Some(value.trim().to_string());
        } else if let Some((i, _)) = index_of(&CORRECT_FIELD, key) {
            partials.entry(i).or_default().correct_answer = Some(value.clone());
        }
    }

    let count = parse_int(
        field(fields, "question_count").unwrap_or_default(),
        "Question count",
    )?;
    if count != partials.len() as i64 {
        return Err(AppError::BadRequest(format!(
            "Expected {} questions but received {}.",
            count,
            partials.len()
        )));
    }

    let mut questions = Vec::with_capacity(partials.len());
    for (position, (index, partial)) in partials.into_iter().enumerate() {
        if index != position {
            return Err(AppError::BadRequest(format!(
                "Question {} is missing.",
                position + 1
            )));
        }
        let number = index + 1;

        let question = partial
            .question
            .ok_or_else(|| AppError::BadRequest(format!("Question {} has no text.", number)))?;

        let [a, b, c, d] = partial.options;
        let options = match (a, b, c, d) {
            (Some(a), Some(b), Some(c), Some(d)) => [a, b, c, d],
            _ => {
                return Err(AppError::BadRequest(format!(
                    "Question {} needs exactly {} options.",
                    number, OPTIONS_PER_QUESTION
                )));
            }
        };

        let correct_answer = partial.correct_answer.ok_or_else(|| {
            AppError::BadRequest(format!("Question {} has no correct answer.", number))
        })?;
        let correct_answer = parse_int(&correct_answer, "Correct answer")?;

        questions.push(QuestionDraft {
            question,
            options,
            correct_answer,
        });
    }

    Ok(ExamDraft {
        title,
        description,
        duration,
        questions,
    })
}

/// Decodes submitted answers for an exam with `total` questions.
///
/// Position `i` holds the option index chosen for `question_i`, or `None` when
/// the field is absent or blank. Non-integer answers are rejected.
pub fn parse_answers(fields: &[(String, String)], total: usize) -> Result<Vec<Option<i64>>, AppError> {
    (0..total)
        .map(|i| match field(fields, &format!("question_{}", i)) {
            Some(value) if !value.trim().is_empty() => parse_int(value, "Answer").map(Some),
            _ => Ok(None),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pairs(raw: &[(&str, &str)]) -> FormFields {
        raw.iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    fn one_question_form() -> FormFields {
        pairs(&[
            ("title", " Rust basics "),
            ("description", "<p>Intro</p><script>x()</script>"),
            ("duration", "30"),
            ("question_count", "1"),
            ("question_0", "Which keyword declares a binding?"),
            ("option_0_0", "let"),
            ("option_0_1", "var"),
            ("option_0_2", "const"),
            ("option_0_3", "def"),
            ("correct_answer_0", "0"),
        ])
    }

    #[test]
    fn test_parse_exam_form_structures_questions() {
        let draft = parse_exam_form(&one_question_form()).unwrap();

        assert_eq!(draft.title, "Rust basics");
        assert_eq!(draft.description, "<p>Intro</p>");
        assert_eq!(draft.duration, 30);
        assert_eq!(draft.questions.len(), 1);
        assert_eq!(draft.questions[0].options[3], "def");
        assert_eq!(draft.questions[0].correct_answer, 0);
    }

    #[test]
    fn test_parse_exam_form_orders_by_index() {
        let mut form = one_question_form();
        form[3].1 = "2".to_string();
        form.extend(pairs(&[
            ("option_1_0", "a"),
            ("option_1_1", "b"),
            ("option_1_2", "c"),
            ("option_1_3", "d"),
            ("correct_answer_1", "3"),
            ("question_1", "Second?"),
        ]));
        // Field order in the body must not matter.
        form.reverse();

        let draft = parse_exam_form(&form).unwrap();
        assert_eq!(draft.questions[0].question, "Which keyword declares a binding?");
        assert_eq!(draft.questions[1].question, "Second?");
        assert_eq!(draft.questions[1].correct_answer, 3);
    }

    #[test]
    fn test_parse_exam_form_rejects_bad_duration() {
        let mut form = one_question_form();
        form[2].1 = "half an hour".to_string();
        assert!(matches!(parse_exam_form(&form), Err(AppError::BadRequest(_))));
    }

    #[test]
    fn test_parse_exam_form_rejects_count_mismatch() {
        let mut form = one_question_form();
        form[3].1 = "2".to_string();
        assert!(matches!(parse_exam_form(&form), Err(AppError::BadRequest(_))));
    }

    #[test]
    fn test_parse_exam_form_rejects_missing_option() {
        let mut form = one_question_form();
        form.retain(|(k, _)| k != "option_0_2");
        assert!(matches!(parse_exam_form(&form), Err(AppError::BadRequest(_))));
    }

    #[test]
    fn test_parse_exam_form_rejects_gap_in_indices() {
        let form = pairs(&[
            ("title", "Gap"),
            ("duration", "10"),
            ("question_count", "1"),
            ("question_1", "Only the second?"),
            ("option_1_0", "a"),
            ("option_1_1", "b"),
            ("option_1_2", "c"),
            ("option_1_3", "d"),
            ("correct_answer_1", "0"),
        ]);
        assert!(matches!(
            parse_exam_form(&form),
            Err(AppError::BadRequest(msg)) if msg == "Question 1 is missing."
        ));
    }

    #[test]
    fn test_parse_exam_form_requires_question_count() {
        let mut form = one_question_form();
        form.retain(|(k, _)| k != "question_count");
        assert!(matches!(
            parse_exam_form(&form),
            Err(AppError::BadRequest(msg)) if msg == "Question count must be a whole number."
        ));
    }

    #[test]
    fn test_parse_answers_marks_missing_as_none() {
        let form = pairs(&[("exam_id", "x"), ("question_0", "2"), ("question_2", "")]);
        let answers = parse_answers(&form, 3).unwrap();
        assert_eq!(answers, vec![Some(2), None, None]);
    }

    #[test]
    fn test_parse_answers_rejects_non_integer() {
        let form = pairs(&[("question_0", "B")]);
        assert!(matches!(parse_answers(&form, 1), Err(AppError::BadRequest(_))));
    }
}

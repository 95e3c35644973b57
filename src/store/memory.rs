// src/store/memory.rs

use async_trait::async_trait;
use bson::oid::ObjectId;
use tokio::sync::RwLock;

use super::Store;
use crate::{
    error::AppError,
    models::{exam::Exam, exam_result::ExamResult, user::{Role, User}},
};

#[derive(Default)]
struct Collections {
    users: Vec<User>,
    exams: Vec<Exam>,
    results: Vec<ExamResult>,
}

/// Process-local store with the same semantics as [`super::MongoStore`].
/// Nothing survives a restart.
#[derive(Default)]
pub struct MemoryStore {
    inner: RwLock<Collections>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Flips the `is_active` flag of an exam. Returns `false` if no such exam.
    /// There is no HTTP route for this; operators toggle exams in the database.
    pub async fn set_exam_active(&self, id: ObjectId, is_active: bool) -> bool {
        let mut inner = self.inner.write().await;
        match inner.exams.iter_mut().find(|e| e.id == Some(id)) {
            Some(exam) => {
                exam.is_active = is_active;
                true
            }
            None => false,
        }
    }

    pub async fn count_users_with_email(&self, email: &str) -> usize {
        let inner = self.inner.read().await;
        inner.users.iter().filter(|u| u.email == email).count()
    }

    pub async fn all_results(&self) -> Vec<ExamResult> {
        self.inner.read().await.results.clone()
    }
}

#[async_trait]
impl Store for MemoryStore {
    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, AppError> {
        let inner = self.inner.read().await;
        Ok(inner.users.iter().find(|u| u.email == email).cloned())
    }

    async fn insert_user(&self, mut user: User) -> Result<ObjectId, AppError> {
        let mut inner = self.inner.write().await;
        if inner.users.iter().any(|u| u.email == user.email) {
            return Err(AppError::Conflict(format!(
                "Email '{}' already exists",
                user.email
            )));
        }

        let id = ObjectId::new();
        user.id = Some(id);
        inner.users.push(user);
        Ok(id)
    }

    async fn count_users_by_role(&self, role: Role) -> Result<u64, AppError> {
        let inner = self.inner.read().await;
        Ok(inner.users.iter().filter(|u| u.role == role).count() as u64)
    }

    async fn insert_exam(&self, mut exam: Exam) -> Result<ObjectId, AppError> {
        let id = ObjectId::new();
        exam.id = Some(id);
        self.inner.write().await.exams.push(exam);
        Ok(id)
    }

    async fn find_exam(&self, id: ObjectId) -> Result<Option<Exam>, AppError> {
        let inner = self.inner.read().await;
        Ok(inner.exams.iter().find(|e| e.id == Some(id)).cloned())
    }

    async fn list_active_exams(&self) -> Result<Vec<Exam>, AppError> {
        let inner = self.inner.read().await;
        Ok(inner.exams.iter().filter(|e| e.is_active).cloned().collect())
    }

    async fn recent_exams(&self, limit: i64) -> Result<Vec<Exam>, AppError> {
        let inner = self.inner.read().await;
        let mut exams = inner.exams.clone();
        // Stable sort keeps insertion order among equal timestamps; reverse it so
        // the latest insert still comes first.
        exams.reverse();
        exams.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        exams.truncate(limit.max(0) as usize);
        Ok(exams)
    }

    async fn count_exams(&self, active_only: bool) -> Result<u64, AppError> {
        let inner = self.inner.read().await;
        Ok(inner
            .exams
            .iter()
            .filter(|e| !active_only || e.is_active)
            .count() as u64)
    }

    async fn insert_result(&self, mut result: ExamResult) -> Result<ObjectId, AppError> {
        let id = ObjectId::new();
        result.id = Some(id);
        self.inner.write().await.results.push(result);
        Ok(id)
    }

    async fn count_results(&self) -> Result<u64, AppError> {
        Ok(self.inner.read().await.results.len() as u64)
    }

    async fn results_for_student(&self, student_id: ObjectId) -> Result<Vec<ExamResult>, AppError> {
        let inner = self.inner.read().await;
        let mut results: Vec<ExamResult> = inner
            .results
            .iter()
            .filter(|r| r.student_id == student_id)
            .cloned()
            .collect();
        results.reverse();
        results.sort_by(|a, b| b.completed_at.cmp(&a.completed_at));
        Ok(results)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::exam::Question;
    use chrono::{Duration, Utc};

    fn exam(title: &str, minutes_ago: i64, is_active: bool) -> Exam {
        Exam {
            id: None,
            title: title.to_string(),
            description: String::new(),
            duration: 10,
            questions: vec![Question {
                question: "2 + 2?".to_string(),
                options: ["3".into(), "4".into(), "5".into(), "22".into()],
                correct_answer: 1,
            }],
            created_by: ObjectId::new(),
            created_at: Utc::now() - Duration::minutes(minutes_ago),
            is_active,
        }
    }

    #[tokio::test]
    async fn test_duplicate_email_is_conflict() {
        let store = MemoryStore::new();
        let user = User::new("alice", "alice@example.com", "hash".into(), Role::Student);

        store.insert_user(user.clone()).await.unwrap();
        let second = store.insert_user(user).await;

        assert!(matches!(second, Err(AppError::Conflict(_))));
        assert_eq!(store.count_users_with_email("alice@example.com").await, 1);
    }

    #[tokio::test]
    async fn test_recent_exams_newest_first_and_limited() {
        let store = MemoryStore::new();
        for i in 0..7 {
            store.insert_exam(exam(&format!("exam {i}"), 10 - i, true)).await.unwrap();
        }

        let recent = store.recent_exams(5).await.unwrap();
        let titles: Vec<_> = recent.iter().map(|e| e.title.as_str()).collect();
        assert_eq!(titles, ["exam 6", "exam 5", "exam 4", "exam 3", "exam 2"]);
    }

    #[tokio::test]
    async fn test_active_filtering() {
        let store = MemoryStore::new();
        let active = store.insert_exam(exam("on", 1, true)).await.unwrap();
        store.insert_exam(exam("off", 2, false)).await.unwrap();

        assert_eq!(store.count_exams(false).await.unwrap(), 2);
        assert_eq!(store.count_exams(true).await.unwrap(), 1);

        assert!(store.set_exam_active(active, false).await);
        assert!(store.list_active_exams().await.unwrap().is_empty());
        assert!(!store.set_exam_active(ObjectId::new(), true).await);
    }
}

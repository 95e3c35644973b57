// src/store/mod.rs

//! Data-store seam.
//!
//! Handlers talk to persistence only through [`Store`]. Production uses
//! [`MongoStore`]; tests and local demos use [`MemoryStore`].

use async_trait::async_trait;
use bson::oid::ObjectId;

use crate::{
    config::SAMPLE_PASSWORD,
    error::AppError,
    models::{
        exam::Exam,
        exam_result::ExamResult,
        user::{Role, User},
    },
    utils::hash::hash_password,
};

pub mod memory;
pub mod mongo;

pub use memory::MemoryStore;
pub use mongo::MongoStore;

pub const USERS_COLLECTION: &str = "users";
pub const EXAMS_COLLECTION: &str = "exams";
pub const RESULTS_COLLECTION: &str = "results";

#[async_trait]
pub trait Store: Send + Sync {
    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, AppError>;

    /// Inserts a user and returns its new id.
    /// Fails with `AppError::Conflict` when the email is already taken.
    async fn insert_user(&self, user: User) -> Result<ObjectId, AppError>;

    async fn count_users_by_role(&self, role: Role) -> Result<u64, AppError>;

    async fn insert_exam(&self, exam: Exam) -> Result<ObjectId, AppError>;

    async fn find_exam(&self, id: ObjectId) -> Result<Option<Exam>, AppError>;

    async fn list_active_exams(&self) -> Result<Vec<Exam>, AppError>;

    /// Newest first by `created_at`.
    async fn recent_exams(&self, limit: i64) -> Result<Vec<Exam>, AppError>;

    async fn count_exams(&self, active_only: bool) -> Result<u64, AppError>;

    async fn insert_result(&self, result: ExamResult) -> Result<ObjectId, AppError>;

    async fn count_results(&self) -> Result<u64, AppError>;

    /// Newest first by `completed_at`.
    async fn results_for_student(&self, student_id: ObjectId) -> Result<Vec<ExamResult>, AppError>;
}

/// Ensures the sample admin and student accounts exist.
/// Each account is inserted only if its email is not registered yet.
pub async fn seed_sample_data(store: &dyn Store) -> Result<(), AppError> {
    let accounts = [
        ("Admin", "admin@test.com", Role::Admin),
        ("Student", "student@test.com", Role::Student),
    ];

    for (username, email, role) in accounts {
        if store.find_user_by_email(email).await?.is_some() {
            continue;
        }

        tracing::info!("Seeding sample {} account: {}", role.as_str(), email);
        let hashed_password = hash_password(SAMPLE_PASSWORD)?;

        match store
            .insert_user(User::new(username, email, hashed_password, role))
            .await
        {
            // Another instance seeded it between the check and the insert.
            Ok(_) | Err(AppError::Conflict(_)) => {}
            Err(e) => return Err(e),
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_seed_is_idempotent() {
        let store = MemoryStore::new();

        seed_sample_data(&store).await.unwrap();
        seed_sample_data(&store).await.unwrap();

        assert_eq!(store.count_users_with_email("admin@test.com").await, 1);
        assert_eq!(store.count_users_with_email("student@test.com").await, 1);
        assert_eq!(store.count_users_by_role(Role::Admin).await.unwrap(), 1);
        assert_eq!(store.count_users_by_role(Role::Student).await.unwrap(), 1);
    }
}

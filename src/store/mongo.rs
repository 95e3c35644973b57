// src/store/mongo.rs

use std::time::Duration;

use async_trait::async_trait;
use bson::{doc, oid::ObjectId};
use futures::TryStreamExt;
use mongodb::{
    Client, Collection, Database, IndexModel,
    options::IndexOptions,
};

use super::{EXAMS_COLLECTION, RESULTS_COLLECTION, Store, USERS_COLLECTION};
use crate::{
    config::Config,
    error::AppError,
    models::{exam::Exam, exam_result::ExamResult, user::{Role, User}},
};

/// [`Store`] backed by a MongoDB database.
#[derive(Clone)]
pub struct MongoStore {
    users: Collection<User>,
    exams: Collection<Exam>,
    results: Collection<ExamResult>,
}

impl MongoStore {
    /// Connects, waits until the server answers a ping, and ensures indexes.
    ///
    /// The ping is retried 5 times, 2 seconds apart, so the server can start
    /// alongside a database that is still booting.
    pub async fn connect(config: &Config) -> Result<Self, AppError> {
        let client = Client::with_uri_str(&config.mongo_uri).await?;
        let db = client.database(&config.mongo_database);

        let mut retry_count = 0;
        loop {
            match db.run_command(doc! { "ping": 1 }).await {
                Ok(_) => break,
                Err(e) => {
                    retry_count += 1;
                    if retry_count > 5 {
                        return Err(AppError::InternalServerError(format!(
                            "Failed to reach MongoDB after 5 retries: {}",
                            e
                        )));
                    }
                    tracing::warn!(
                        "Database not ready, retrying in 2s... (Attempt {})",
                        retry_count
                    );
                    tokio::time::sleep(Duration::from_secs(2)).await;
                }
            }
        }

        let store = Self::from_database(&db);
        store.ensure_indexes().await?;
        Ok(store)
    }

    pub fn from_database(db: &Database) -> Self {
        Self {
            users: db.collection(USERS_COLLECTION),
            exams: db.collection(EXAMS_COLLECTION),
            results: db.collection(RESULTS_COLLECTION),
        }
    }

    /// Unique email index, so concurrent registrations cannot both succeed.
    async fn ensure_indexes(&self) -> Result<(), AppError> {
        let email_index = IndexModel::builder()
            .keys(doc! { "email": 1 })
            .options(IndexOptions::builder().unique(true).build())
            .build();
        self.users.create_index(email_index).await?;

        let created_index = IndexModel::builder()
            .keys(doc! { "created_at": -1 })
            .build();
        self.exams.create_index(created_index).await?;

        Ok(())
    }
}

#[async_trait]
impl Store for MongoStore {
    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, AppError> {
        Ok(self.users.find_one(doc! { "email": email }).await?)
    }

    async fn insert_user(&self, user: User) -> Result<ObjectId, AppError> {
        let inserted = self.users.insert_one(&user).await.map_err(|e| {
            match AppError::from(e) {
                AppError::Conflict(_) => {
                    AppError::Conflict(format!("Email '{}' already exists", user.email))
                }
                other => other,
            }
        })?;

        inserted_object_id(inserted.inserted_id)
    }

    async fn count_users_by_role(&self, role: Role) -> Result<u64, AppError> {
        Ok(self
            .users
            .count_documents(doc! { "role": role.as_str() })
            .await?)
    }

    async fn insert_exam(&self, exam: Exam) -> Result<ObjectId, AppError> {
        let inserted = self.exams.insert_one(&exam).await?;
        inserted_object_id(inserted.inserted_id)
    }

    async fn find_exam(&self, id: ObjectId) -> Result<Option<Exam>, AppError> {
        Ok(self.exams.find_one(doc! { "_id": id }).await?)
    }

    async fn list_active_exams(&self) -> Result<Vec<Exam>, AppError> {
        let cursor = self.exams.find(doc! { "is_active": true }).await?;
        Ok(cursor.try_collect().await?)
    }

    async fn recent_exams(&self, limit: i64) -> Result<Vec<Exam>, AppError> {
        let cursor = self
            .exams
            .find(doc! {})
            .sort(doc! { "created_at": -1 })
            .limit(limit)
            .await?;
        Ok(cursor.try_collect().await?)
    }

    async fn count_exams(&self, active_only: bool) -> Result<u64, AppError> {
        let filter = if active_only {
            doc! { "is_active": true }
        } else {
            doc! {}
        };
        Ok(self.exams.count_documents(filter).await?)
    }

    async fn insert_result(&self, result: ExamResult) -> Result<ObjectId, AppError> {
        let inserted = self.results.insert_one(&result).await?;
        inserted_object_id(inserted.inserted_id)
    }

    async fn count_results(&self) -> Result<u64, AppError> {
        Ok(self.results.count_documents(doc! {}).await?)
    }

    async fn results_for_student(&self, student_id: ObjectId) -> Result<Vec<ExamResult>, AppError> {
        let cursor = self
            .results
            .find(doc! { "student_id": student_id })
            .sort(doc! { "completed_at": -1 })
            .await?;
        Ok(cursor.try_collect().await?)
    }
}

fn inserted_object_id(id: bson::Bson) -> Result<ObjectId, AppError> {
    id.as_object_id().ok_or_else(|| {
        AppError::InternalServerError(format!("Unexpected inserted id: {}", id))
    })
}

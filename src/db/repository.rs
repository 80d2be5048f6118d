use async_trait::async_trait;
use futures::TryStreamExt;
use mongodb::bson::{doc, Document};

use crate::error::AppError;
use crate::models::page::Page;

/// Repository trait for CMS page lookups.
///
/// This trait allows mocking the database layer in tests.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait PageRepository: Send + Sync {
    /// Create a new page or replace an existing one (matched by id).
    async fn create_or_update(&self, page: Page) -> Result<(), AppError>;

    async fn find_by_id(&self, id: i64) -> Result<Option<Page>, AppError>;

    /// Fetch the live pages among `ids`. Order is unspecified; missing or
    /// unpublished ids are simply absent.
    async fn find_live_by_ids(&self, ids: &[i64]) -> Result<Vec<Page>, AppError>;

    /// Every page that belongs in the index (live and public).
    async fn list_indexable(&self) -> Result<Vec<Page>, AppError>;

    async fn find_by_tag(&self, tag_id: i64) -> Result<Vec<Page>, AppError>;

    async fn find_by_category(&self, category_id: i64) -> Result<Vec<Page>, AppError>;

    async fn find_by_author(&self, author_id: i64) -> Result<Vec<Page>, AppError>;
}

/// MongoDB implementation of the PageRepository.
pub struct MongoPageRepository {
    collection: mongodb::Collection<Page>,
}

impl MongoPageRepository {
    pub fn new(db: &mongodb::Database) -> Self {
        Self {
            collection: db.collection("pages"),
        }
    }

    async fn find_many(&self, filter: Document) -> Result<Vec<Page>, AppError> {
        use mongodb::options::FindOptions;

        let options = FindOptions::builder().sort(doc! { "id": 1 }).build();

        let cursor = self
            .collection
            .find(filter)
            .with_options(options)
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        cursor
            .try_collect()
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }
}

#[async_trait]
impl PageRepository for MongoPageRepository {
    async fn create_or_update(&self, page: Page) -> Result<(), AppError> {
        use mongodb::options::ReplaceOptions;

        let filter = doc! { "id": page.id };
        let options = ReplaceOptions::builder().upsert(true).build();

        self.collection
            .replace_one(filter, &page)
            .with_options(options)
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        Ok(())
    }

    async fn find_by_id(&self, id: i64) -> Result<Option<Page>, AppError> {
        self.collection
            .find_one(doc! { "id": id })
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    async fn find_live_by_ids(&self, ids: &[i64]) -> Result<Vec<Page>, AppError> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        self.find_many(doc! { "id": { "$in": ids.to_vec() }, "live": true })
            .await
    }

    async fn list_indexable(&self) -> Result<Vec<Page>, AppError> {
        self.find_many(doc! { "live": true, "public": true }).await
    }

    async fn find_by_tag(&self, tag_id: i64) -> Result<Vec<Page>, AppError> {
        self.find_many(doc! { "tags.id": tag_id }).await
    }

    async fn find_by_category(&self, category_id: i64) -> Result<Vec<Page>, AppError> {
        self.find_many(doc! { "categories.id": category_id }).await
    }

    async fn find_by_author(&self, author_id: i64) -> Result<Vec<Page>, AppError> {
        self.find_many(doc! { "authors.id": author_id }).await
    }
}

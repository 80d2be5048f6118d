use std::collections::BTreeMap;
use std::sync::RwLock;

use async_trait::async_trait;

use crate::db::repository::PageRepository;
use crate::error::AppError;
use crate::models::page::Page;

/// Page store held in process memory, used in demo mode and tests.
#[derive(Default)]
pub struct InMemoryPageRepository {
    pages: RwLock<BTreeMap<i64, Page>>,
}

impl InMemoryPageRepository {
    pub fn new() -> Self {
        Self::default()
    }

    fn select(&self, predicate: impl Fn(&Page) -> bool) -> Result<Vec<Page>, AppError> {
        let pages = self
            .pages
            .read()
            .map_err(|_| AppError::Internal("Page store lock poisoned".into()))?;
        Ok(pages.values().filter(|p| predicate(p)).cloned().collect())
    }
}

#[async_trait]
impl PageRepository for InMemoryPageRepository {
    async fn create_or_update(&self, page: Page) -> Result<(), AppError> {
        self.pages
            .write()
            .map_err(|_| AppError::Internal("Page store lock poisoned".into()))?
            .insert(page.id, page);
        Ok(())
    }

    async fn find_by_id(&self, id: i64) -> Result<Option<Page>, AppError> {
        Ok(self.select(|p| p.id == id)?.into_iter().next())
    }

    async fn find_live_by_ids(&self, ids: &[i64]) -> Result<Vec<Page>, AppError> {
        self.select(|p| p.live && ids.contains(&p.id))
    }

    async fn list_indexable(&self) -> Result<Vec<Page>, AppError> {
        self.select(Page::is_indexable)
    }

    async fn find_by_tag(&self, tag_id: i64) -> Result<Vec<Page>, AppError> {
        self.select(|p| p.tags.iter().any(|t| t.id == tag_id))
    }

    async fn find_by_category(&self, category_id: i64) -> Result<Vec<Page>, AppError> {
        self.select(|p| p.categories.iter().any(|c| c.id == category_id))
    }

    async fn find_by_author(&self, author_id: i64) -> Result<Vec<Page>, AppError> {
        self.select(|p| p.authors.iter().any(|a| a.id == author_id))
    }
}

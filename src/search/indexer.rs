use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::db::repository::PageRepository;
use crate::error::AppError;
use crate::models::page::Page;
use crate::search::backend::SearchBackend;
use crate::search::document::{document_id, SearchableDocument};
use crate::search::fields::DocumentSchema;

/// A CMS entity whose change may affect indexed pages.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "entity", rename_all = "snake_case")]
pub enum RelatedEntity {
    Tag { id: i64 },
    Category { id: i64 },
    Author { id: i64 },
    /// A row linking one page to a tag.
    TagLink { page_id: i64 },
    CategoryLink { page_id: i64 },
    AuthorLink { page_id: i64 },
    /// A row linking an enforcement action to a status.
    StatusLink { page_id: i64 },
    /// The type-specific record of a page, e.g. an event's schedule.
    Specific { page_id: i64 },
}

/// Change notification sent by the CMS.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum IndexEvent {
    PageSaved { page_id: i64 },
    PageDeleted { page_id: i64 },
    RelatedSaved { related: RelatedEntity },
}

/// Outcome of handling one event or a rebuild.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexReport {
    pub indexed: usize,
    pub removed: usize,
    pub failed: usize,
}

/// Keeps the engine's documents in step with the page store.
pub struct Indexer {
    schema: DocumentSchema,
    backend: Arc<dyn SearchBackend>,
    pages: Arc<dyn PageRepository>,
}

impl Indexer {
    pub fn new(
        schema: DocumentSchema,
        backend: Arc<dyn SearchBackend>,
        pages: Arc<dyn PageRepository>,
    ) -> Self {
        Self {
            schema,
            backend,
            pages,
        }
    }

    pub fn schema(&self) -> &DocumentSchema {
        &self.schema
    }

    pub async fn handle(&self, event: &IndexEvent) -> Result<IndexReport, AppError> {
        tracing::debug!(?event, "Handling index event");
        match event {
            IndexEvent::PageSaved { page_id } => {
                let page = self.pages.find_by_id(*page_id).await?;
                match page {
                    Some(page) => Ok(self.sync_pages(&[page]).await),
                    None => self.remove_page(*page_id).await,
                }
            }
            IndexEvent::PageDeleted { page_id } => self.remove_page(*page_id).await,
            IndexEvent::RelatedSaved { related } => {
                let pages = self.instances_from_related(related).await?;
                Ok(self.sync_pages(&pages).await)
            }
        }
    }

    /// Pages whose documents depend on `related`.
    pub async fn instances_from_related(
        &self,
        related: &RelatedEntity,
    ) -> Result<Vec<Page>, AppError> {
        match related {
            RelatedEntity::Tag { id } => self.pages.find_by_tag(*id).await,
            RelatedEntity::Category { id } => self.pages.find_by_category(*id).await,
            RelatedEntity::Author { id } => self.pages.find_by_author(*id).await,
            RelatedEntity::TagLink { page_id }
            | RelatedEntity::CategoryLink { page_id }
            | RelatedEntity::AuthorLink { page_id }
            | RelatedEntity::StatusLink { page_id }
            | RelatedEntity::Specific { page_id } => {
                Ok(self.pages.find_by_id(*page_id).await?.into_iter().collect())
            }
        }
    }

    /// Upsert indexable pages and remove the rest, one after another.
    ///
    /// A failure on one page is logged and counted; the others still run.
    pub async fn sync_pages(&self, pages: &[Page]) -> IndexReport {
        let mut report = IndexReport::default();
        for page in pages {
            let result = if page.is_indexable() {
                self.index_page(page).await.map(|_| report.indexed += 1)
            } else {
                self.delete_document(page.id)
                    .await
                    .map(|_| report.removed += 1)
            };

            if let Err(e) = result {
                tracing::warn!(page_id = page.id, "Failed to sync page: {e}");
                report.failed += 1;
            }
        }
        report
    }

    /// Build the page's document and replace whatever the engine holds for it.
    pub async fn index_page(&self, page: &Page) -> Result<(), AppError> {
        let document = serde_json::to_value(SearchableDocument::from(page))
            .map_err(|e| AppError::Internal(format!("Failed to serialize page {}: {e}", page.id)))?;

        self.backend
            .upsert(self.schema.index(), &document_id(page.id), &document)
            .await?;
        tracing::debug!(page_id = page.id, "Indexed page");
        Ok(())
    }

    pub async fn remove_page(&self, page_id: i64) -> Result<IndexReport, AppError> {
        self.delete_document(page_id).await?;
        Ok(IndexReport {
            removed: 1,
            ..Default::default()
        })
    }

    async fn delete_document(&self, page_id: i64) -> Result<(), AppError> {
        self.backend
            .delete(self.schema.index(), &document_id(page_id))
            .await?;
        tracing::debug!(page_id, "Removed page from index");
        Ok(())
    }

    /// Index every indexable page, optionally dropping the index first.
    pub async fn rebuild(&self, recreate: bool) -> Result<IndexReport, AppError> {
        if recreate {
            self.backend.delete_index(self.schema.index()).await?;
        }
        self.backend.create_index(&self.schema).await?;

        let pages = self.pages.list_indexable().await?;
        let report = self.sync_pages(&pages).await;
        tracing::info!(
            index = self.schema.index(),
            indexed = report.indexed,
            failed = report.failed,
            "Rebuilt search index"
        );
        Ok(report)
    }
}

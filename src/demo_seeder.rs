use crate::db::repository::PageRepository;
use crate::error::AppError;
use crate::models::page::Page;
use crate::search::indexer::{IndexReport, Indexer};

/// The demo page set, embedded in the binary.
pub fn demo_pages() -> Result<Vec<Page>, AppError> {
    serde_json::from_str(include_str!("../demo_data/pages.json"))
        .map_err(|e| AppError::Internal(format!("Invalid demo data: {e}")))
}

/// Store the demo pages and build the index from them.
pub async fn seed_demo_data(
    repo: &dyn PageRepository,
    indexer: &Indexer,
) -> Result<IndexReport, AppError> {
    tracing::info!("Starting demo data seeding...");

    let pages = demo_pages()?;
    let count = pages.len();
    for page in pages {
        repo.create_or_update(page).await?;
    }

    let report = indexer.rebuild(false).await?;
    tracing::info!(pages = count, indexed = report.indexed, "Demo data seeded");
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::page::{PageKind, PageSpecific};

    #[test]
    fn test_demo_pages_parse() {
        let pages = demo_pages().unwrap();
        assert!(pages.iter().any(|p| p.kind == PageKind::EventPage));
        assert!(pages.iter().any(|p| !p.is_indexable()));

        let acme = pages.iter().find(|p| p.id == 301).unwrap();
        assert!(matches!(
            &acme.specific,
            PageSpecific::EnforcementAction { statuses, .. } if statuses[0].status == "active"
        ));
    }
}

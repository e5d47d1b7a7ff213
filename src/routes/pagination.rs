use sea_orm::{ConnectionTrait, SelectorTrait};
use serde::{Deserialize, Serialize};
use utoipa::IntoParams;

use crate::error::AppResult;

/// Fixed page size for paginated collection endpoints.
pub const PER_PAGE: u64 = 50;

#[derive(Debug, Default, Deserialize, IntoParams)]
#[serde(default)]
pub struct PageQuery {
    /// 1-based page number; defaults to the first page.
    pub page: Option<u64>,
}

impl PageQuery {
    /// 0-based page index for the paginator.
    #[must_use]
    pub fn index(&self) -> u64 {
        self.page.unwrap_or(1).max(1) - 1
    }
}

#[derive(Debug, Serialize)]
pub struct Page<T> {
    pub data: Vec<T>,
    pub page: u64,
    pub per_page: u64,
    pub total_items: u64,
    pub total_pages: u64,
}

/// Run a paginator for one page and wrap the result with its counts.
///
/// # Errors
///
/// Returns `AppError::Database` on query failures.
pub async fn fetch_page<'db, C, S>(
    paginator: sea_orm::Paginator<'db, C, S>,
    query: &PageQuery,
) -> AppResult<Page<S::Item>>
where
    C: ConnectionTrait,
    S: SelectorTrait + 'db,
{
    let counts = paginator.num_items_and_pages().await?;
    let index = query.index();
    let data = paginator.fetch_page(index).await?;

    Ok(Page {
        data,
        page: index + 1,
        per_page: PER_PAGE,
        total_items: counts.number_of_items,
        total_pages: counts.number_of_pages,
    })
}

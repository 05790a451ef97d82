//! Catalog reads with an in-memory cache.
//!
//! Product detail and unsearched listing pages are cached in `moka` for the
//! configured TTL. Admin edits reach shoppers once the entry expires.

use std::sync::Arc;
use std::time::Duration;

use moka::future::Cache;
use sqlx::PgPool;
use tracing::{debug, instrument};

use crate::db::{ProductRepository, RepositoryError};
use crate::models::{ProductDetail, ProductPage};

/// Products per listing page.
pub const PAGE_SIZE: u32 = 24;

/// Longest accepted search term.
const MAX_SEARCH_LENGTH: usize = 100;

#[derive(Debug, Clone)]
enum CacheValue {
    Page(Arc<ProductPage>),
    Product(Arc<ProductDetail>),
}

/// Cached catalog reads.
#[derive(Clone)]
pub struct Catalog {
    cache: Cache<String, CacheValue>,
}

impl Catalog {
    /// Create a catalog cache whose entries live for `ttl_seconds`.
    #[must_use]
    pub fn new(ttl_seconds: u64) -> Self {
        let cache = Cache::builder()
            .max_capacity(1000)
            .time_to_live(Duration::from_secs(ttl_seconds))
            .build();

        Self { cache }
    }

    /// One page of active products, optionally filtered by title.
    ///
    /// Pages are 1-based; page 0 is treated as page 1.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if a query fails.
    #[instrument(skip(self, pool))]
    pub async fn page(
        &self,
        pool: &PgPool,
        search: Option<&str>,
        page: u32,
    ) -> Result<Arc<ProductPage>, RepositoryError> {
        let page = page.max(1);
        let search = normalize_search(search);
        let cache_key = format!("products:{page}");

        if search.is_none()
            && let Some(CacheValue::Page(cached)) = self.cache.get(&cache_key).await
        {
            debug!("Cache hit for product page");
            return Ok(cached);
        }

        let products = ProductRepository::new(pool);
        let offset = i64::from(page - 1) * i64::from(PAGE_SIZE);
        let items = products
            .list_active(search.as_deref(), i64::from(PAGE_SIZE), offset)
            .await?;
        let total = products.count_active(search.as_deref()).await?;

        let result = Arc::new(ProductPage {
            products: items,
            page,
            per_page: PAGE_SIZE,
            total,
        });

        if search.is_none() {
            self.cache
                .insert(cache_key, CacheValue::Page(Arc::clone(&result)))
                .await;
        }

        Ok(result)
    }

    /// An active product with its variants.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if a query fails.
    #[instrument(skip(self, pool))]
    pub async fn product(
        &self,
        pool: &PgPool,
        slug: &str,
    ) -> Result<Option<Arc<ProductDetail>>, RepositoryError> {
        let cache_key = format!("product:{slug}");

        if let Some(CacheValue::Product(cached)) = self.cache.get(&cache_key).await {
            debug!("Cache hit for product");
            return Ok(Some(cached));
        }

        let products = ProductRepository::new(pool);
        let Some(product) = products.get_active_by_slug(slug).await? else {
            return Ok(None);
        };
        let variants = products.variants(product.id).await?;
        let detail = Arc::new(ProductDetail::new(product, &variants));

        self.cache
            .insert(cache_key, CacheValue::Product(Arc::clone(&detail)))
            .await;

        Ok(Some(detail))
    }
}

/// Trim a search term, drop it when blank, and escape `LIKE` wildcards.
fn normalize_search(search: Option<&str>) -> Option<String> {
    let term = search?.trim();
    if term.is_empty() {
        return None;
    }

    let escaped = term
        .chars()
        .take(MAX_SEARCH_LENGTH)
        .fold(String::with_capacity(term.len()), |mut out, c| {
            if matches!(c, '\\' | '%' | '_') {
                out.push('\\');
            }
            out.push(c);
            out
        });
    Some(escaped)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_search() {
        assert_eq!(normalize_search(None), None);
        assert_eq!(normalize_search(Some("   ")), None);
        assert_eq!(normalize_search(Some(" hoodie ")).as_deref(), Some("hoodie"));
        assert_eq!(
            normalize_search(Some("100%_cotton")).as_deref(),
            Some("100\\%\\_cotton")
        );
    }

    #[test]
    fn test_normalize_search_truncates() {
        let long = "a".repeat(500);
        assert_eq!(
            normalize_search(Some(&long)).map(|s| s.len()),
            Some(MAX_SEARCH_LENGTH)
        );
    }
}

//! Live product resolution against the catalog tables.
//!
//! Cart items and recommendations always read prices, weights and names
//! from here at request time; nothing downstream caches or snapshots
//! catalog data.

use std::collections::HashMap;

use sqlx::PgPool;
use uuid::Uuid;

use crate::domain::product::{Book, MusicAlbum, Product, ProductKey, ProductKind, SoftwareLicense};
use crate::error::StoreError;

const BOOK_COLUMNS: &str = "id, title, author, price, weight";
const ALBUM_COLUMNS: &str = "id, artist, number_of_tracks, price, weight";
const LICENSE_COLUMNS: &str = "id, license_key, price, weight";

#[derive(Clone)]
pub struct Catalog {
    pool: PgPool,
}

impl Catalog {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Resolve one (kind, id) reference. `None` when the product does not
    /// exist, or no longer exists.
    pub async fn find(&self, key: ProductKey) -> Result<Option<Product>, StoreError> {
        let product = match key.kind {
            ProductKind::Book => {
                sqlx::query_as::<_, Book>(&format!("SELECT {BOOK_COLUMNS} FROM books WHERE id = $1"))
                    .bind(key.id)
                    .fetch_optional(&self.pool)
                    .await?
                    .map(Product::Book)
            }
            ProductKind::MusicAlbum => {
                sqlx::query_as::<_, MusicAlbum>(&format!(
                    "SELECT {ALBUM_COLUMNS} FROM music_albums WHERE id = $1"
                ))
                .bind(key.id)
                .fetch_optional(&self.pool)
                .await?
                .map(Product::MusicAlbum)
            }
            ProductKind::SoftwareLicense => {
                sqlx::query_as::<_, SoftwareLicense>(&format!(
                    "SELECT {LICENSE_COLUMNS} FROM software_licenses WHERE id = $1"
                ))
                .bind(key.id)
                .fetch_optional(&self.pool)
                .await?
                .map(Product::SoftwareLicense)
            }
        };
        Ok(product)
    }

    /// Batch-resolve a set of references, one query per kind actually
    /// present. Keys that do not resolve are simply absent from the map;
    /// callers decide how to degrade.
    pub async fn find_many(
        &self,
        keys: &[ProductKey],
    ) -> Result<HashMap<ProductKey, Product>, StoreError> {
        let mut ids_by_kind: HashMap<ProductKind, Vec<Uuid>> = HashMap::new();
        for key in keys {
            ids_by_kind.entry(key.kind).or_default().push(key.id);
        }

        let mut resolved = HashMap::with_capacity(keys.len());
        for (kind, ids) in ids_by_kind {
            let products: Vec<Product> = match kind {
                ProductKind::Book => {
                    sqlx::query_as::<_, Book>(&format!(
                        "SELECT {BOOK_COLUMNS} FROM books WHERE id = ANY($1)"
                    ))
                    .bind(&ids)
                    .fetch_all(&self.pool)
                    .await?
                    .into_iter()
                    .map(Product::Book)
                    .collect()
                }
                ProductKind::MusicAlbum => {
                    sqlx::query_as::<_, MusicAlbum>(&format!(
                        "SELECT {ALBUM_COLUMNS} FROM music_albums WHERE id = ANY($1)"
                    ))
                    .bind(&ids)
                    .fetch_all(&self.pool)
                    .await?
                    .into_iter()
                    .map(Product::MusicAlbum)
                    .collect()
                }
                ProductKind::SoftwareLicense => {
                    sqlx::query_as::<_, SoftwareLicense>(&format!(
                        "SELECT {LICENSE_COLUMNS} FROM software_licenses WHERE id = ANY($1)"
                    ))
                    .bind(&ids)
                    .fetch_all(&self.pool)
                    .await?
                    .into_iter()
                    .map(Product::SoftwareLicense)
                    .collect()
                }
            };
            for product in products {
                resolved.insert(product.key(), product);
            }
        }
        Ok(resolved)
    }

    /// Page through one kind's catalog, newest first.
    pub async fn list(
        &self,
        kind: ProductKind,
        page: u32,
        per_page: u32,
    ) -> Result<(Vec<Product>, i64), StoreError> {
        let page = page.max(1);
        let per_page = per_page.clamp(1, 100);
        let limit = per_page as i64;
        let offset = ((page - 1) * per_page) as i64;

        let products: Vec<Product> = match kind {
            ProductKind::Book => {
                sqlx::query_as::<_, Book>(&format!(
                    "SELECT {BOOK_COLUMNS} FROM books ORDER BY created_at DESC LIMIT $1 OFFSET $2"
                ))
                .bind(limit)
                .bind(offset)
                .fetch_all(&self.pool)
                .await?
                .into_iter()
                .map(Product::Book)
                .collect()
            }
            ProductKind::MusicAlbum => {
                sqlx::query_as::<_, MusicAlbum>(&format!(
                    "SELECT {ALBUM_COLUMNS} FROM music_albums ORDER BY created_at DESC LIMIT $1 OFFSET $2"
                ))
                .bind(limit)
                .bind(offset)
                .fetch_all(&self.pool)
                .await?
                .into_iter()
                .map(Product::MusicAlbum)
                .collect()
            }
            ProductKind::SoftwareLicense => {
                sqlx::query_as::<_, SoftwareLicense>(&format!(
                    "SELECT {LICENSE_COLUMNS} FROM software_licenses ORDER BY created_at DESC LIMIT $1 OFFSET $2"
                ))
                .bind(limit)
                .bind(offset)
                .fetch_all(&self.pool)
                .await?
                .into_iter()
                .map(Product::SoftwareLicense)
                .collect()
            }
        };

        let table = match kind {
            ProductKind::Book => "books",
            ProductKind::MusicAlbum => "music_albums",
            ProductKind::SoftwareLicense => "software_licenses",
        };
        let total: (i64,) = sqlx::query_as(&format!("SELECT COUNT(*) FROM {table}"))
            .fetch_one(&self.pool)
            .await?;

        Ok((products, total.0))
    }
}

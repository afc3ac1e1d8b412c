//! Product catalog types.
//!
//! Three unrelated product kinds share nothing beyond an id, a price, a
//! weight and a display name. Carts reference them through a (kind, id)
//! key instead of a foreign key into any single table. The set is closed:
//! a fourth kind is a new enum variant, and every `match` below has to
//! learn about it before the crate compiles again.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Tag identifying which catalog table a product reference points into.
///
/// The declaration order doubles as the tie-break order for
/// recommendation mining, matching the lexicographic order of the wire
/// tags (`book` < `musicalbum` < `softwarelicense`).
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProductKind {
    Book,
    MusicAlbum,
    SoftwareLicense,
}

impl ProductKind {
    pub const ALL: [ProductKind; 3] = [
        ProductKind::Book,
        ProductKind::MusicAlbum,
        ProductKind::SoftwareLicense,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            ProductKind::Book => "book",
            ProductKind::MusicAlbum => "musicalbum",
            ProductKind::SoftwareLicense => "softwarelicense",
        }
    }

    /// Parse a wire tag. Case-insensitive; unknown tags are rejected by the
    /// caller as an invalid product kind.
    pub fn parse(tag: &str) -> Option<Self> {
        match tag.trim().to_ascii_lowercase().as_str() {
            "book" => Some(ProductKind::Book),
            "musicalbum" => Some(ProductKind::MusicAlbum),
            "softwarelicense" => Some(ProductKind::SoftwareLicense),
            _ => None,
        }
    }
}

impl fmt::Display for ProductKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Identifies one catalog item across all product kinds.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ProductKey {
    pub kind: ProductKind,
    pub id: Uuid,
}

impl ProductKey {
    pub fn new(kind: ProductKind, id: Uuid) -> Self {
        Self { kind, id }
    }

    /// Label shown when the referenced product no longer exists in the
    /// catalog.
    pub fn fallback_label(&self) -> String {
        format!("{} {}", self.kind, self.id)
    }
}

impl fmt::Display for ProductKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.kind, self.id)
    }
}

#[derive(Clone, Debug, Serialize, Deserialize, sqlx::FromRow)]
pub struct Book {
    pub id: Uuid,
    pub title: String,
    pub author: String,
    pub price: Decimal,
    pub weight: Decimal,
}

#[derive(Clone, Debug, Serialize, Deserialize, sqlx::FromRow)]
pub struct MusicAlbum {
    pub id: Uuid,
    pub artist: String,
    pub number_of_tracks: i32,
    pub price: Decimal,
    pub weight: Decimal,
}

#[derive(Clone, Debug, Serialize, Deserialize, sqlx::FromRow)]
pub struct SoftwareLicense {
    pub id: Uuid,
    pub license_key: String,
    pub price: Decimal,
    pub weight: Decimal,
}

/// A resolved catalog item. Serializes with a `type` tag and the fields of
/// the concrete kind, one JSON shape per variant.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Product {
    Book(Book),
    MusicAlbum(MusicAlbum),
    SoftwareLicense(SoftwareLicense),
}

impl Product {
    pub fn kind(&self) -> ProductKind {
        match self {
            Product::Book(_) => ProductKind::Book,
            Product::MusicAlbum(_) => ProductKind::MusicAlbum,
            Product::SoftwareLicense(_) => ProductKind::SoftwareLicense,
        }
    }

    pub fn id(&self) -> Uuid {
        match self {
            Product::Book(b) => b.id,
            Product::MusicAlbum(a) => a.id,
            Product::SoftwareLicense(l) => l.id,
        }
    }

    pub fn key(&self) -> ProductKey {
        ProductKey::new(self.kind(), self.id())
    }

    pub fn price(&self) -> Decimal {
        match self {
            Product::Book(b) => b.price,
            Product::MusicAlbum(a) => a.price,
            Product::SoftwareLicense(l) => l.price,
        }
    }

    pub fn weight(&self) -> Decimal {
        match self {
            Product::Book(b) => b.weight,
            Product::MusicAlbum(a) => a.weight,
            Product::SoftwareLicense(l) => l.weight,
        }
    }

    pub fn display_name(&self) -> String {
        match self {
            Product::Book(b) => b.title.clone(),
            Product::MusicAlbum(a) => format!("Album by {}", a.artist),
            Product::SoftwareLicense(l) => format!("License {}", l.id),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn book(title: &str) -> Product {
        Product::Book(Book {
            id: Uuid::new_v4(),
            title: title.into(),
            author: "A. Author".into(),
            price: Decimal::new(1999, 2),
            weight: Decimal::new(500, 3),
        })
    }

    #[test]
    fn test_kind_tags_round_trip() {
        for kind in ProductKind::ALL {
            assert_eq!(ProductKind::parse(kind.as_str()), Some(kind));
        }
        assert_eq!(ProductKind::parse("MusicAlbum"), Some(ProductKind::MusicAlbum));
        assert_eq!(ProductKind::parse("  book "), Some(ProductKind::Book));
        assert_eq!(ProductKind::parse("dvd"), None);
        assert_eq!(ProductKind::parse(""), None);
    }

    #[test]
    fn test_kind_order_matches_tag_order() {
        // Tie-breaking relies on the enum ordering agreeing with the wire tags.
        let mut tags: Vec<&str> = ProductKind::ALL.iter().map(|k| k.as_str()).collect();
        let sorted = tags.clone();
        tags.sort_unstable();
        assert_eq!(tags, sorted);
    }

    #[test]
    fn test_display_names() {
        assert_eq!(book("Dune").display_name(), "Dune");

        let album = Product::MusicAlbum(MusicAlbum {
            id: Uuid::new_v4(),
            artist: "The Kinks".into(),
            number_of_tracks: 12,
            price: Decimal::new(1450, 2),
            weight: Decimal::new(100, 3),
        });
        assert_eq!(album.display_name(), "Album by The Kinks");

        let id = Uuid::new_v4();
        let license = Product::SoftwareLicense(SoftwareLicense {
            id,
            license_key: "XXXX-YYYY".into(),
            price: Decimal::new(9900, 2),
            weight: Decimal::ZERO,
        });
        assert_eq!(license.display_name(), format!("License {id}"));
    }

    #[test]
    fn test_serialized_shape_is_tagged_per_kind() {
        let product = book("Dune");
        let value = serde_json::to_value(&product).unwrap();
        assert_eq!(value["type"], "book");
        assert_eq!(value["title"], "Dune");
        // Prices ride as decimal strings, not floats.
        assert_eq!(value["price"], "19.99");

        let license = Product::SoftwareLicense(SoftwareLicense {
            id: Uuid::new_v4(),
            license_key: "K".into(),
            price: Decimal::ONE,
            weight: Decimal::ZERO,
        });
        let value = serde_json::to_value(&license).unwrap();
        assert_eq!(value["type"], "softwarelicense");
        assert!(value.get("title").is_none());
    }

    #[test]
    fn test_fallback_label() {
        let id = Uuid::new_v4();
        let key = ProductKey::new(ProductKind::MusicAlbum, id);
        assert_eq!(key.fallback_label(), format!("musicalbum {id}"));
    }
}

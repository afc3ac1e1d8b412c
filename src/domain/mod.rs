//! Domain layer: catalog types, cart aggregation, sequence mining.
//!
//! Everything in here is pure (no I/O, no pool handles) so the cart and
//! recommendation semantics are testable without a database.

pub mod cart;
pub mod product;
pub mod recommendation;

pub use cart::{remaining_quantity, CartLine, CartView};
pub use product::{Book, MusicAlbum, Product, ProductKey, ProductKind, SoftwareLicense};
pub use recommendation::{ItemEvent, PredecessorPick, TransitionCounts};

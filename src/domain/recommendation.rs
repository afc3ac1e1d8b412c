//! First-order "usually added before" mining over cart histories.
//!
//! Each cart is an ordered sequence of item insertions. Adjacent pairs
//! within one cart form directed edges from the earlier product to the
//! later one; the most frequent predecessor of each product becomes its
//! recommendation. Sequences never cross cart boundaries.

use chrono::{DateTime, Utc};
use std::collections::HashMap;
use uuid::Uuid;

use crate::domain::product::ProductKey;

/// One cart-item insertion, as read from the store.
#[derive(Clone, Debug)]
pub struct ItemEvent {
    pub cart_id: Uuid,
    pub item_id: Uuid,
    pub key: ProductKey,
    pub added_at: DateTime<Utc>,
}

/// Directed edge counts, keyed current product -> previous product.
///
/// A local accumulator for one engine run; nothing here is shared or
/// retained between invocations.
#[derive(Debug, Default)]
pub struct TransitionCounts {
    edges: HashMap<ProductKey, HashMap<ProductKey, u64>>,
}

impl TransitionCounts {
    /// Count `previous -> current` edges over adjacent insertions within
    /// each cart. Items are ordered by insertion time with ties broken by
    /// item id, so the walk is a total order and counts are deterministic.
    /// Carts with fewer than two items contribute nothing.
    ///
    /// Runs in O(total items) after the per-cart sorts.
    pub fn from_events(events: Vec<ItemEvent>) -> Self {
        let mut by_cart: HashMap<Uuid, Vec<ItemEvent>> = HashMap::new();
        for event in events {
            by_cart.entry(event.cart_id).or_default().push(event);
        }

        let mut counts = Self::default();
        for items in by_cart.values_mut() {
            items.sort_by(|a, b| a.added_at.cmp(&b.added_at).then(a.item_id.cmp(&b.item_id)));
            for pair in items.windows(2) {
                *counts
                    .edges
                    .entry(pair[1].key)
                    .or_default()
                    .entry(pair[0].key)
                    .or_insert(0) += 1;
            }
        }
        counts
    }

    pub fn is_empty(&self) -> bool {
        self.edges.is_empty()
    }

    /// Number of times `previous` was added immediately before `current`
    /// within a single cart.
    pub fn edge_count(&self, current: ProductKey, previous: ProductKey) -> u64 {
        self.edges
            .get(&current)
            .and_then(|preds| preds.get(&previous))
            .copied()
            .unwrap_or(0)
    }

    /// For every product with at least one incoming edge, the most frequent
    /// immediate predecessor. Ties go to the smaller product key (kind tag,
    /// then id) so the winner does not depend on hash iteration order.
    /// Output is sorted by current key.
    pub fn most_common_predecessors(&self) -> Vec<PredecessorPick> {
        let mut picks: Vec<PredecessorPick> = self
            .edges
            .iter()
            .filter_map(|(current, previous_counts)| {
                previous_counts
                    .iter()
                    .max_by(|(key_a, count_a), (key_b, count_b)| {
                        count_a.cmp(count_b).then_with(|| key_b.cmp(key_a))
                    })
                    .map(|(previous, count)| PredecessorPick {
                        current: *current,
                        previous: *previous,
                        occurrences: *count,
                    })
            })
            .collect();
        picks.sort_by_key(|pick| pick.current);
        picks
    }
}

/// The winning predecessor for one product.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PredecessorPick {
    pub current: ProductKey,
    pub previous: ProductKey,
    pub occurrences: u64,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::product::ProductKind;
    use chrono::TimeZone;

    fn key(kind: ProductKind, n: u128) -> ProductKey {
        ProductKey::new(kind, Uuid::from_u128(n))
    }

    fn event(cart: u128, seq: i64, key: ProductKey) -> ItemEvent {
        ItemEvent {
            cart_id: Uuid::from_u128(cart),
            item_id: Uuid::from_u128(seq as u128 + 1000),
            key,
            added_at: Utc.timestamp_opt(1_700_000_000 + seq, 0).unwrap(),
        }
    }

    #[test]
    fn test_edges_never_cross_cart_boundaries() {
        let book1 = key(ProductKind::Book, 1);
        let album1 = key(ProductKind::MusicAlbum, 2);
        let license1 = key(ProductKind::SoftwareLicense, 3);

        // Cart A: book1 then album1. Cart B: album1 then license1.
        // album1 globally precedes license1's insertion, but only the
        // intra-cart edges may exist.
        let counts = TransitionCounts::from_events(vec![
            event(1, 0, book1),
            event(1, 1, album1),
            event(2, 2, album1),
            event(2, 3, license1),
        ]);

        assert_eq!(counts.edge_count(album1, book1), 1);
        assert_eq!(counts.edge_count(license1, album1), 1);
        assert_eq!(counts.edge_count(license1, book1), 0);
        assert_eq!(counts.edge_count(album1, license1), 0);
    }

    #[test]
    fn test_most_common_predecessor_wins_by_count() {
        let book1 = key(ProductKind::Book, 1);
        let album1 = key(ProductKind::MusicAlbum, 2);
        let license1 = key(ProductKind::SoftwareLicense, 3);

        // Three carts add book1 then album1; one cart adds license1 then
        // album1. book1 must win with count 3.
        let mut events = Vec::new();
        for cart in 1..=3 {
            events.push(event(cart, 0, book1));
            events.push(event(cart, 1, album1));
        }
        events.push(event(4, 0, license1));
        events.push(event(4, 1, album1));

        let picks = TransitionCounts::from_events(events).most_common_predecessors();
        let album_pick = picks.iter().find(|p| p.current == album1).unwrap();
        assert_eq!(album_pick.previous, book1);
        assert_eq!(album_pick.occurrences, 3);
    }

    #[test]
    fn test_small_carts_contribute_nothing() {
        let book1 = key(ProductKind::Book, 1);
        let counts = TransitionCounts::from_events(vec![event(1, 0, book1)]);
        assert!(counts.is_empty());
        assert!(counts.most_common_predecessors().is_empty());

        let counts = TransitionCounts::from_events(vec![]);
        assert!(counts.is_empty());
    }

    #[test]
    fn test_ties_break_to_smaller_key() {
        let book1 = key(ProductKind::Book, 1);
        let album1 = key(ProductKind::MusicAlbum, 2);
        let license1 = key(ProductKind::SoftwareLicense, 3);

        // album1 and license1 each precede book1 once; the book kind tag
        // sorts before nothing here, but between the two predecessors the
        // album key is smaller and must win regardless of insertion order.
        let counts = TransitionCounts::from_events(vec![
            event(1, 0, license1),
            event(1, 1, book1),
            event(2, 0, album1),
            event(2, 1, book1),
        ]);

        let picks = counts.most_common_predecessors();
        let book_pick = picks.iter().find(|p| p.current == book1).unwrap();
        assert_eq!(book_pick.previous, album1);
        assert_eq!(book_pick.occurrences, 1);
    }

    #[test]
    fn test_insertion_time_orders_within_cart() {
        let book1 = key(ProductKind::Book, 1);
        let album1 = key(ProductKind::MusicAlbum, 2);

        // Events arrive out of order; mining must sort by added_at first.
        let counts = TransitionCounts::from_events(vec![
            event(1, 5, album1),
            event(1, 0, book1),
        ]);
        assert_eq!(counts.edge_count(album1, book1), 1);
        assert_eq!(counts.edge_count(book1, album1), 0);
    }

    #[test]
    fn test_repeat_pairs_accumulate_across_carts() {
        let book1 = key(ProductKind::Book, 1);
        let album1 = key(ProductKind::MusicAlbum, 2);

        let mut events = Vec::new();
        for cart in 1..=5 {
            events.push(event(cart, 0, book1));
            events.push(event(cart, 1, album1));
        }
        let counts = TransitionCounts::from_events(events);
        assert_eq!(counts.edge_count(album1, book1), 5);
    }

    #[test]
    fn test_output_is_sorted_by_current_key() {
        let book1 = key(ProductKind::Book, 1);
        let album1 = key(ProductKind::MusicAlbum, 2);
        let license1 = key(ProductKind::SoftwareLicense, 3);

        let counts = TransitionCounts::from_events(vec![
            event(1, 0, book1),
            event(1, 1, license1),
            event(2, 0, book1),
            event(2, 1, album1),
        ]);
        let picks = counts.most_common_predecessors();
        let currents: Vec<ProductKey> = picks.iter().map(|p| p.current).collect();
        let mut sorted = currents.clone();
        sorted.sort();
        assert_eq!(currents, sorted);
    }
}

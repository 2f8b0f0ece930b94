use crate::models::{copper_to_gold, FetchOutcome, ItemId, Listing, STABLE_TARGETS, TOKEN_ITEM_ID};
use crate::storage::ItemDictionary;
use std::collections::{BTreeMap, BTreeSet, HashMap};

/// Add-only set of tracked item ids.
///
/// Built from this snapshot's top movers, the stable allowlist and every id
/// the dictionary has ever recorded, so an item stays tracked once seen.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TrackedSet {
    ids: BTreeSet<ItemId>,
}

impl TrackedSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, id: ItemId) -> bool {
        self.ids.insert(id)
    }

    pub fn contains(&self, id: ItemId) -> bool {
        self.ids.contains(&id)
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = ItemId> + '_ {
        self.ids.iter().copied()
    }
}

impl Extend<ItemId> for TrackedSet {
    fn extend<I: IntoIterator<Item = ItemId>>(&mut self, iter: I) {
        self.ids.extend(iter);
    }
}

/// The `n` items with the largest summed quantity. Equal totals go to the
/// lower item id.
pub fn top_by_quantity(listings: &[Listing], n: usize) -> Vec<ItemId> {
    let mut totals: HashMap<ItemId, u64> = HashMap::new();
    for listing in listings {
        *totals.entry(listing.item_id).or_insert(0) += listing.quantity;
    }

    let mut ranked: Vec<(ItemId, u64)> = totals.into_iter().collect();
    ranked.sort_by(|(a_id, a_qty), (b_id, b_qty)| b_qty.cmp(a_qty).then(a_id.cmp(b_id)));
    ranked.into_iter().take(n).map(|(id, _)| id).collect()
}

pub fn select_tracked_items(listings: &[Listing], dict: &ItemDictionary, top_n: usize) -> TrackedSet {
    let mut tracked = TrackedSet::new();
    tracked.extend(top_by_quantity(listings, top_n));
    tracked.extend(STABLE_TARGETS.iter().map(|(id, _)| *id));
    tracked.extend(dict.ids());
    tracked
}

/// Lowest unit price in gold for each tracked item present in the snapshot.
/// A fetched token index price replaces the order-book price for the token.
pub fn compute_current_prices(
    listings: &[Listing],
    tracked: &TrackedSet,
    token_quote: &FetchOutcome<f64>,
) -> BTreeMap<ItemId, f64> {
    let mut lowest: BTreeMap<ItemId, u64> = BTreeMap::new();
    for listing in listings.iter().filter(|l| tracked.contains(l.item_id)) {
        lowest
            .entry(listing.item_id)
            .and_modify(|p| *p = (*p).min(listing.unit_price))
            .or_insert(listing.unit_price);
    }

    let mut prices: BTreeMap<ItemId, f64> = lowest
        .into_iter()
        .map(|(id, copper)| (id, copper_to_gold(copper)))
        .collect();

    if let FetchOutcome::Fetched(price) = token_quote {
        if tracked.contains(TOKEN_ITEM_ID) && price.is_finite() && *price >= 0.0 {
            prices.insert(TOKEN_ITEM_ID, *price);
        }
    }

    prices
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::item_dict::placeholder_name;

    fn listing(item_id: ItemId, quantity: u64, unit_price: u64) -> Listing {
        Listing {
            id: item_id * 1000 + quantity,
            item_id,
            quantity,
            unit_price,
            time_left: "LONG".to_string(),
        }
    }

    #[test]
    fn test_top_by_quantity_sums_listings() {
        let listings = vec![
            listing(1, 10, 100),
            listing(2, 15, 100),
            listing(1, 10, 100),
            listing(3, 1, 100),
        ];
        assert_eq!(top_by_quantity(&listings, 2), vec![1, 2]);
    }

    #[test]
    fn test_top_by_quantity_ties_go_to_lower_id() {
        let listings = vec![listing(9, 5, 1), listing(4, 5, 1), listing(7, 5, 1)];
        assert_eq!(top_by_quantity(&listings, 2), vec![4, 7]);
    }

    #[test]
    fn test_selection_unions_top_stable_and_dictionary() {
        let mut dict = ItemDictionary::default();
        dict.record(555, "Old favourite".to_string());

        let listings: Vec<Listing> = (1..=30).map(|id| listing(id, id * 10, 100)).collect();
        let tracked = select_tracked_items(&listings, &dict, 20);

        assert!(tracked.contains(30));
        assert!(tracked.contains(11));
        assert!(!tracked.contains(10));
        assert!(tracked.contains(555));
        for (id, _) in STABLE_TARGETS {
            assert!(tracked.contains(id));
        }
        assert_eq!(tracked.len(), 20 + STABLE_TARGETS.len() + 1);
    }

    #[test]
    fn test_selection_never_drops_previously_recorded_items() {
        let mut dict = ItemDictionary::seeded();

        let first_run = vec![listing(100, 500, 1), listing(200, 400, 1)];
        let first = select_tracked_items(&first_run, &dict, 1);
        for id in first.iter() {
            dict.record(id, placeholder_name(id));
        }

        let second_run = vec![listing(200, 900, 1)];
        let second = select_tracked_items(&second_run, &dict, 1);

        for id in first.iter() {
            assert!(second.contains(id), "item {} dropped", id);
        }
    }

    #[test]
    fn test_prices_are_minimum_listing_in_gold() {
        let listings = vec![
            listing(1, 100, 50_000),
            listing(1, 3, 42_000),
            listing(2, 5, 20_000),
            listing(3, 5, 90_000),
        ];
        let mut tracked = TrackedSet::new();
        tracked.extend([1, 2]);

        let prices = compute_current_prices(&listings, &tracked, &FetchOutcome::Degraded("down".into()));
        assert_eq!(prices.get(&1), Some(&4.2));
        assert_eq!(prices.get(&2), Some(&2.0));
        assert_eq!(prices.get(&3), None);
        assert!(prices.values().all(|p| *p >= 0.0));
    }

    #[test]
    fn test_token_index_overrides_order_book() {
        let listings = vec![listing(TOKEN_ITEM_ID, 1, 2_000_000)];
        let mut tracked = TrackedSet::new();
        tracked.insert(TOKEN_ITEM_ID);

        let quoted = compute_current_prices(&listings, &tracked, &FetchOutcome::Fetched(150.0));
        assert_eq!(quoted.get(&TOKEN_ITEM_ID), Some(&150.0));

        let degraded = compute_current_prices(&listings, &tracked, &FetchOutcome::Degraded("503".into()));
        assert_eq!(degraded.get(&TOKEN_ITEM_ID), Some(&200.0));
    }
}

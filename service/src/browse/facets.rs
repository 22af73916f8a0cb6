//! Facet [`Cache`] of a browse page.

use crate::domain::{
    facet::{self, Count, Counts, Kind, Selector},
    FacetOption,
};

/// Loaded [`FacetOption`]s of every facet [`Kind`].
#[derive(Clone, Debug, Default)]
pub struct Cache {
    /// Top-level categories.
    categories: Vec<FacetOption>,

    /// Cities.
    cities: Vec<FacetOption>,

    /// Subcategories along with the category they belong to.
    subcategories: Option<(facet::Id, Vec<FacetOption>)>,

    /// Price buckets.
    prices: Vec<FacetOption>,

    /// Statuses.
    statuses: Vec<FacetOption>,
}

impl Cache {
    /// Returns the cached [`FacetOption`]s of the provided [`Kind`].
    #[must_use]
    pub fn get(&self, kind: Kind) -> &[FacetOption] {
        match kind {
            Kind::Category => &self.categories,
            Kind::City => &self.cities,
            Kind::Price => &self.prices,
            Kind::Status => &self.statuses,
            Kind::Subcategory => self
                .subcategories
                .as_ref()
                .map_or(&[][..], |(_, o)| o.as_slice()),
        }
    }

    /// Returns the category the cached subcategories belong to.
    #[must_use]
    pub fn subcategories_of(&self) -> Option<facet::Id> {
        self.subcategories.as_ref().map(|(id, _)| *id)
    }

    /// Stores freshly loaded [`FacetOption`]s picked by the provided
    /// [`Selector`], replacing the previous ones.
    ///
    /// Counted [`Kind`]s get [`Count::Pending`] until
    /// [`Cache::apply_counts()`] is called.
    pub fn store(&mut self, selector: Selector, mut options: Vec<FacetOption>) {
        let count = if selector.kind.is_counted() {
            Count::Pending
        } else {
            Count::Uncounted
        };
        for o in &mut options {
            o.count = count;
        }

        match (selector.kind, selector.parent) {
            (Kind::Category, _) => self.categories = options,
            (Kind::City, _) => self.cities = options,
            (Kind::Price, _) => self.prices = options,
            (Kind::Status, _) => self.statuses = options,
            (Kind::Subcategory, Some(parent)) => {
                self.subcategories = Some((parent, options));
            }
            (Kind::Subcategory, None) => self.subcategories = None,
        }
    }

    /// Fills in the provided [`Counts`] for the [`FacetOption`]s of the
    /// provided [`Kind`]. Options missing from the [`Counts`] get zero.
    pub fn apply_counts(&mut self, kind: Kind, counts: &Counts) {
        let counted = self
            .get(kind)
            .iter()
            .map(|o| FacetOption {
                count: Count::Known(counts.get(o.id)),
                ..o.clone()
            })
            .collect();
        self.replace(kind, counted);
    }

    /// Gives up on counts of the provided [`Kind`], keeping the options.
    pub fn drop_counts(&mut self, kind: Kind) {
        let uncounted = self
            .get(kind)
            .iter()
            .map(|o| FacetOption {
                count: Count::Uncounted,
                ..o.clone()
            })
            .collect();
        self.replace(kind, uncounted);
    }

    /// Discards the cached subcategories.
    pub fn discard_subcategories(&mut self) {
        self.subcategories = None;
    }

    /// Searches the cached [`FacetOption`]s of the provided [`Kind`] by
    /// their label, case-insensitively.
    ///
    /// An empty `needle` matches everything.
    pub fn search<'c>(
        &'c self,
        kind: Kind,
        needle: &str,
    ) -> impl Iterator<Item = &'c FacetOption> + 'c {
        let needle = needle.trim().to_lowercase();
        self.get(kind)
            .iter()
            .filter(move |o| o.label.to_lowercase().contains(&needle))
    }

    /// Replaces the [`FacetOption`]s of the provided [`Kind`] wholesale.
    fn replace(&mut self, kind: Kind, options: Vec<FacetOption>) {
        match kind {
            Kind::Category => self.categories = options,
            Kind::City => self.cities = options,
            Kind::Price => self.prices = options,
            Kind::Status => self.statuses = options,
            Kind::Subcategory => {
                if let Some((_, o)) = &mut self.subcategories {
                    *o = options;
                }
            }
        }
    }
}

#[cfg(test)]
mod spec {
    use crate::domain::{
        facet::{Count, Counts, Kind, Selector},
        FacetOption,
    };

    use super::Cache;

    fn option(id: u32, label: &str) -> FacetOption {
        FacetOption {
            id: id.into(),
            label: label.to_owned(),
            icon: String::new(),
            count: Count::Uncounted,
        }
    }

    #[test]
    fn counted_options_start_pending() {
        let mut cache = Cache::default();

        cache.store(Selector::categories(), vec![option(1, "Food")]);
        cache.store(Selector::cities(), vec![option(34, "Istanbul")]);

        assert_eq!(cache.get(Kind::Category)[0].count, Count::Pending);
        assert_eq!(cache.get(Kind::City)[0].count, Count::Uncounted);
    }

    #[test]
    fn counts_fill_in_zeroes() {
        let mut cache = Cache::default();
        cache.store(
            Selector::categories(),
            vec![option(1, "Food"), option(2, "Retail")],
        );

        cache.apply_counts(
            Kind::Category,
            &[1, 1, 1].into_iter().map(Into::into).collect::<Counts>(),
        );

        let counts = cache
            .get(Kind::Category)
            .iter()
            .map(|o| o.count)
            .collect::<Vec<_>>();
        assert_eq!(counts, [Count::Known(3), Count::Known(0)]);
    }

    #[test]
    fn dropped_counts_keep_options() {
        let mut cache = Cache::default();
        cache.store(Selector::categories(), vec![option(1, "Food")]);

        cache.drop_counts(Kind::Category);

        assert_eq!(cache.get(Kind::Category).len(), 1);
        assert_eq!(cache.get(Kind::Category)[0].count, Count::Uncounted);
    }

    #[test]
    fn subcategories_follow_their_category() {
        let mut cache = Cache::default();

        cache.store(
            Selector::subcategories(1.into()),
            vec![option(11, "Cafe")],
        );
        assert_eq!(cache.subcategories_of(), Some(1.into()));
        assert_eq!(cache.get(Kind::Subcategory).len(), 1);

        cache.store(Selector::subcategories(2.into()), vec![]);
        assert_eq!(cache.subcategories_of(), Some(2.into()));
        assert!(cache.get(Kind::Subcategory).is_empty());

        cache.discard_subcategories();
        assert_eq!(cache.subcategories_of(), None);
    }

    #[test]
    fn searches_labels() {
        let mut cache = Cache::default();
        cache.store(
            Selector::subcategories(1.into()),
            vec![
                option(11, "Coffee shop"),
                option(12, "Bakery"),
                option(13, "Ice cream"),
            ],
        );

        let found = |needle| {
            cache
                .search(Kind::Subcategory, needle)
                .map(|o| o.label.as_str())
                .collect::<Vec<_>>()
        };

        assert_eq!(found("C"), ["Coffee shop", "Ice cream"]);
        assert_eq!(found("  bak "), ["Bakery"]);
        assert_eq!(found("").len(), 3);
        assert!(found("pizza").is_empty());
    }
}

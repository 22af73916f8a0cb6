//! Facet definitions: filterable dimensions of listings.

use std::{collections::HashMap, fmt, iter};

use common::{define_kind, money::Currency, Money};
use derive_more::{Display, From, FromStr, Into};
use itertools::Itertools as _;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::domain::listing;
#[cfg(doc)]
use crate::domain::Listing;

/// ID of a [`FacetOption`]: a category, a subcategory or a city, or else a
/// [`Bucket`] or a [`listing::Status`].
#[derive(
    Clone,
    Copy,
    Debug,
    Deserialize,
    Display,
    Eq,
    From,
    FromStr,
    Hash,
    Into,
    Ord,
    PartialEq,
    PartialOrd,
    Serialize,
)]
#[serde(transparent)]
pub struct Id(u32);

define_kind! {
    #[doc = "Kind of a facet."]
    #[serialize_all = "snake_case"]
    enum Kind {
        #[doc = "Top-level category."]
        Category = 1,

        #[doc = "Child category (sector) of a selected category."]
        Subcategory = 2,

        #[doc = "City."]
        City = 3,

        #[doc = "Price range (investment) bucket."]
        Price = 4,

        #[doc = "Publication status, on the owner's profile page only."]
        Status = 5,
    }
}

impl Kind {
    /// Indicates whether options of this [`Kind`] display [`Listing`]
    /// counts.
    #[must_use]
    pub const fn is_counted(self) -> bool {
        matches!(self, Self::Category | Self::Price | Self::Status)
    }

    /// Indicates whether options of this [`Kind`] are loaded from the
    /// catalog of a backend, rather than built locally.
    #[must_use]
    pub const fn is_catalog(self) -> bool {
        matches!(self, Self::Category | Self::Subcategory | Self::City)
    }

    /// Returns the icon shown for options of this [`Kind`] having none.
    #[must_use]
    pub const fn default_icon(self) -> &'static str {
        match self {
            Self::Category => "📁",
            Self::Subcategory => "📌",
            Self::City => "📍",
            Self::Price => "💰",
            Self::Status => "🏷",
        }
    }
}

/// Single selectable option of a facet.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct FacetOption {
    /// ID of the selected entity.
    pub id: Id,

    /// Human readable label.
    pub label: String,

    /// Icon shown before the label.
    pub icon: String,

    /// Number of [`Listing`]s having this option.
    pub count: Count,
}

/// Number of [`Listing`]s behind a [`FacetOption`].
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Count {
    /// Counts are not displayed for this [`FacetOption`].
    Uncounted,

    /// Count is being loaded in background.
    Pending,

    /// Count is known.
    Known(u64),
}

impl fmt::Display for Count {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Uncounted => Ok(()),
            Self::Pending => f.write_str("..."),
            Self::Known(n) => write!(f, "{n}"),
        }
    }
}

/// Selector of [`FacetOption`]s to load.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub struct Selector {
    /// [`Kind`] of the options.
    pub kind: Kind,

    /// Parent category, for [`Kind::Subcategory`] options only.
    pub parent: Option<Id>,
}

impl Selector {
    /// Selects top-level categories.
    #[must_use]
    pub const fn categories() -> Self {
        Self {
            kind: Kind::Category,
            parent: None,
        }
    }

    /// Selects subcategories of the provided category.
    #[must_use]
    pub const fn subcategories(of: Id) -> Self {
        Self {
            kind: Kind::Subcategory,
            parent: Some(of),
        }
    }

    /// Selects cities.
    #[must_use]
    pub const fn cities() -> Self {
        Self {
            kind: Kind::City,
            parent: None,
        }
    }

    /// Selects price buckets, built locally out of [`PriceBuckets`].
    #[must_use]
    pub const fn prices() -> Self {
        Self {
            kind: Kind::Price,
            parent: None,
        }
    }

    /// Selects statuses, built locally out of a [`listing::Scope`].
    #[must_use]
    pub const fn statuses() -> Self {
        Self {
            kind: Kind::Status,
            parent: None,
        }
    }
}

impl From<listing::Status> for Id {
    fn from(status: listing::Status) -> Self {
        Self(u32::from(status.u8()))
    }
}

/// Bounds of price buckets, shown as the price facet.
///
/// `N` edges split prices into `N + 1` [`Bucket`]s, the first one starting
/// at zero and the last one unbounded.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct PriceBuckets {
    /// Positive ascending inner edges.
    edges: Vec<Decimal>,

    /// [`Currency`] of the labels.
    currency: Currency,
}

impl Default for PriceBuckets {
    fn default() -> Self {
        Self::new(
            [500_000, 1_000_000, 2_000_000, 5_000_000].map(Decimal::from),
            Currency::Try,
        )
    }
}

impl PriceBuckets {
    /// Creates new [`PriceBuckets`] out of the provided edges, in any order.
    ///
    /// Non-positive and repeated edges are ignored. No edges at all means
    /// no price facet.
    #[must_use]
    pub fn new(
        edges: impl IntoIterator<Item = Decimal>,
        currency: Currency,
    ) -> Self {
        Self {
            edges: edges
                .into_iter()
                .filter(|e| e.is_sign_positive() && !e.is_zero())
                .sorted()
                .dedup()
                .collect(),
            currency,
        }
    }

    /// Indicates whether there are no edges, so no price facet.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.edges.is_empty()
    }

    /// Iterates over the [`Bucket`]s, cheapest first.
    pub fn buckets(&self) -> impl Iterator<Item = Bucket> + '_ {
        let mins = iter::once(Decimal::ZERO).chain(self.edges.iter().copied());
        let maxes = self.edges.iter().copied().map(Some).chain([None]);
        mins.zip(maxes)
            .zip(1..)
            .map(|((min, max), n)| Bucket { id: Id(n), min, max })
    }

    /// Returns the [`Bucket`] with the provided [`Id`].
    #[must_use]
    pub fn get(&self, id: Id) -> Option<Bucket> {
        self.buckets().find(|b| b.id == id)
    }

    /// Returns the [`Id`] of the [`Bucket`] the provided `price` falls into.
    #[must_use]
    pub fn bucket_of(&self, price: Decimal) -> Option<Id> {
        if self.is_empty() {
            return None;
        }
        self.buckets().find(|b| b.contains(price)).map(|b| b.id)
    }

    /// Builds uncounted [`FacetOption`]s of the [`Bucket`]s.
    #[must_use]
    pub fn options(&self) -> Vec<FacetOption> {
        if self.is_empty() {
            return Vec::new();
        }
        self.buckets()
            .map(|b| FacetOption {
                id: b.id,
                label: b.label(self.currency),
                icon: Kind::Price.default_icon().to_owned(),
                count: Count::Uncounted,
            })
            .collect()
    }
}

/// Single price bucket of [`PriceBuckets`].
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct Bucket {
    /// [`Id`] of this [`Bucket`], starting from `1`.
    pub id: Id,

    /// Lower bound.
    pub min: Decimal,

    /// Upper bound, if any.
    pub max: Option<Decimal>,
}

impl Bucket {
    /// Checks whether the provided `price` falls into this [`Bucket`].
    ///
    /// The upper bound is exclusive here, so every price is counted once.
    #[must_use]
    pub fn contains(&self, price: Decimal) -> bool {
        price >= self.min && self.max.map_or(true, |max| price < max)
    }

    /// Returns a human readable label (e.g. `₺0 - ₺500.000`).
    #[must_use]
    pub fn label(&self, currency: Currency) -> String {
        let min = Money::new(self.min, currency);
        match self.max {
            Some(max) => {
                let max = Money::new(max, currency);
                format!("{} - {}", min.grouped(), max.grouped())
            }
            None => format!("{}+", min.grouped()),
        }
    }
}

/// Field [`Listing`]s are grouped by when counted.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum GroupBy {
    /// Top-level category.
    Category,

    /// Price [`Bucket`]. [`Listing`]s without a price are not counted.
    Price(PriceBuckets),

    /// [`listing::Status`].
    Status,
}

impl GroupBy {
    /// Returns the [`GroupBy`] counting options of the provided [`Kind`],
    /// if the [`Kind`] [is counted][`Kind::is_counted()`].
    #[must_use]
    pub fn of(kind: Kind, buckets: &PriceBuckets) -> Option<Self> {
        match kind {
            Kind::Category => Some(Self::Category),
            Kind::Price => Some(Self::Price(buckets.clone())),
            Kind::Status => Some(Self::Status),
            Kind::Subcategory | Kind::City => None,
        }
    }
}

/// Selector of aggregated [`Counts`].
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct CountSelector {
    /// Field to group [`Listing`]s by.
    pub group_by: GroupBy,

    /// [`listing::Scope`] of the counted [`Listing`]s.
    pub scope: listing::Scope,
}

/// Number of [`Listing`]s per facet [`Id`].
#[derive(Clone, Debug, Default, Eq, From, PartialEq)]
pub struct Counts(HashMap<Id, u64>);

impl Counts {
    /// Returns the count of the provided [`Id`], which is `0` when the [`Id`]
    /// has no [`Listing`]s at all.
    #[must_use]
    pub fn get(&self, id: Id) -> u64 {
        self.0.get(&id).copied().unwrap_or_default()
    }
}

impl FromIterator<Id> for Counts {
    fn from_iter<I: IntoIterator<Item = Id>>(ids: I) -> Self {
        let mut counts = HashMap::<_, u64>::new();
        for id in ids {
            *counts.entry(id).or_default() += 1;
        }
        Self(counts)
    }
}

#[cfg(test)]
mod spec {
    use common::money::Currency;
    use rust_decimal::Decimal;

    use crate::domain::listing::Status;

    use super::{Count, Counts, Id, PriceBuckets};

    fn dec(n: i64) -> Decimal {
        Decimal::from(n)
    }

    #[test]
    fn counts_group_ids() {
        let counts = [1, 2, 1, 1].into_iter().map(Id).collect::<Counts>();

        assert_eq!(counts.get(Id(1)), 3);
        assert_eq!(counts.get(Id(2)), 1);
        assert_eq!(counts.get(Id(3)), 0);
    }

    #[test]
    fn count_placeholders() {
        assert_eq!(Count::Pending.to_string(), "...");
        assert_eq!(Count::Uncounted.to_string(), "");
        assert_eq!(Count::Known(7).to_string(), "7");
    }

    #[test]
    fn price_buckets_cover_every_price() {
        let buckets = PriceBuckets::default();

        let labels = buckets
            .options()
            .into_iter()
            .map(|o| o.label)
            .collect::<Vec<_>>();
        assert_eq!(
            labels,
            [
                "₺0 - ₺500.000",
                "₺500.000 - ₺1.000.000",
                "₺1.000.000 - ₺2.000.000",
                "₺2.000.000 - ₺5.000.000",
                "₺5.000.000+",
            ],
        );
        assert_eq!(buckets.bucket_of(dec(0)), Some(Id(1)));
        assert_eq!(buckets.bucket_of(dec(499_999)), Some(Id(1)));
        assert_eq!(buckets.bucket_of(dec(500_000)), Some(Id(2)));
        assert_eq!(buckets.bucket_of(dec(90_000_000)), Some(Id(5)));

        let last = buckets.get(Id(5)).unwrap();
        assert_eq!((last.min, last.max), (dec(5_000_000), None));
        assert_eq!(buckets.get(Id(6)), None);
    }

    #[test]
    fn price_buckets_normalize_edges() {
        let buckets = PriceBuckets::new(
            [dec(200), dec(-1), dec(100), dec(200)],
            Currency::Usd,
        );

        let bounds = buckets
            .buckets()
            .map(|b| (b.min, b.max))
            .collect::<Vec<_>>();
        assert_eq!(
            bounds,
            [
                (dec(0), Some(dec(100))),
                (dec(100), Some(dec(200))),
                (dec(200), None),
            ],
        );

        let none = PriceBuckets::new(Vec::<Decimal>::new(), Currency::Try);
        assert!(none.options().is_empty());
        assert_eq!(none.bucket_of(dec(10)), None);
    }

    #[test]
    fn statuses_have_distinct_ids() {
        let ids = Status::ALL
            .iter()
            .map(|s| Id::from(*s))
            .collect::<std::collections::BTreeSet<_>>();

        assert_eq!(ids.len(), Status::ALL.len());
    }
}

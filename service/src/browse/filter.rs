//! [`Filter`] state of a browse page.

use std::{collections::BTreeSet, str::FromStr as _};

use common::{define_kind, pagination};
use derive_more::{Display, Error};
use rust_decimal::Decimal;

use crate::domain::{
    facet,
    listing::{Feature, Status},
};

define_kind! {
    #[doc = "Order of browse results."]
    #[serialize_all = "kebab-case"]
    enum SortKey {
        #[doc = "Most recently created first."]
        Newest = 1,

        #[doc = "Least recently created first."]
        Oldest = 2,

        #[doc = "Cheapest first."]
        PriceAsc = 3,

        #[doc = "Most expensive first."]
        PriceDesc = 4,

        #[doc = "Largest first."]
        AreaDesc = 5,
    }
}

impl Default for SortKey {
    fn default() -> Self {
        Self::Newest
    }
}

impl SortKey {
    /// Parses a [`SortKey`], accepting the legacy `price-low`, `price-high`
    /// and `area-high` spellings as well.
    #[must_use]
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim() {
            "price-low" => Some(Self::PriceAsc),
            "price-high" => Some(Self::PriceDesc),
            "area-high" => Some(Self::AreaDesc),
            other => other.parse().ok(),
        }
    }
}

/// Optional bounds of a numeric filter.
#[derive(Clone, Copy, Debug, Default, Eq, Hash, PartialEq)]
pub struct Range {
    /// Inclusive lower bound.
    pub min: Option<Decimal>,

    /// Inclusive upper bound.
    pub max: Option<Decimal>,
}

impl Range {
    /// [`Range`] without any bounds.
    pub const UNBOUNDED: Self = Self {
        min: None,
        max: None,
    };

    /// Creates a new [`Range`] out of the provided bounds.
    #[must_use]
    pub const fn new(min: Option<Decimal>, max: Option<Decimal>) -> Self {
        Self { min, max }
    }

    /// Indicates whether this [`Range`] constrains nothing.
    #[must_use]
    pub const fn is_unbounded(&self) -> bool {
        self.min.is_none() && self.max.is_none()
    }

    /// Clamps negative bounds to zero and swaps inverted ones.
    #[must_use]
    pub fn normalized(self) -> Self {
        let clamp = |v: Decimal| v.max(Decimal::ZERO);
        let (min, max) = (self.min.map(clamp), self.max.map(clamp));
        match (min, max) {
            (Some(min), Some(max)) if min > max => {
                Self::new(Some(max), Some(min))
            }
            _ => Self::new(min, max),
        }
    }

    /// Checks whether the provided value lies within this [`Range`].
    #[must_use]
    pub fn contains(&self, value: Decimal) -> bool {
        self.min.map_or(true, |min| value >= min)
            && self.max.map_or(true, |max| value <= max)
    }

    /// Parses a `min-max` or `min+` [`Range`], an empty input being the
    /// [unbounded][`Range::UNBOUNDED`] one.
    fn parse(raw: &str) -> Option<Self> {
        let bound = |s: &str| Decimal::from_str(s.trim()).ok();
        if raw.is_empty() {
            return Some(Self::UNBOUNDED);
        }
        if let Some(min) = raw.strip_suffix('+') {
            return Some(Self::new(Some(bound(min)?), None));
        }
        let (min, max) = raw.split_once('-')?;
        Some(Self::new(Some(bound(min)?), Some(bound(max)?)))
    }
}

impl From<facet::Bucket> for Range {
    fn from(bucket: facet::Bucket) -> Self {
        Self::new(Some(bucket.min), bucket.max)
    }
}

/// Active filter selections and the current page of a browse page.
///
/// Only constructible as [`Filter::default()`] and changed via
/// [`Filter::apply()`], so its invariants always hold:
/// - subcategories are selected only along with exactly one category;
/// - [`Range`]s are [normalized][`Range::normalized()`];
/// - the search term has no surrounding whitespace.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct Filter {
    /// Free-text search term, empty for none.
    search: String,

    /// Selected top-level categories.
    category_ids: BTreeSet<facet::Id>,

    /// Selected subcategories.
    subcategory_ids: BTreeSet<facet::Id>,

    /// Selected city.
    city_id: Option<facet::Id>,

    /// Price bounds.
    price: Range,

    /// Area bounds.
    area: Range,

    /// Required [`Feature`]s.
    features: BTreeSet<Feature>,

    /// Result order.
    sort: SortKey,

    /// Narrowing [`Status`] of an owner page tab, [`None`] for every status
    /// of the scope.
    status: Option<Status>,

    /// Current page.
    page: pagination::Number,
}

impl Filter {
    /// Returns the free-text search term.
    #[must_use]
    pub fn search(&self) -> &str {
        &self.search
    }

    /// Returns the selected top-level categories.
    #[must_use]
    pub fn category_ids(&self) -> &BTreeSet<facet::Id> {
        &self.category_ids
    }

    /// Returns the selected category, if exactly one is selected.
    #[must_use]
    pub fn single_category(&self) -> Option<facet::Id> {
        let mut ids = self.category_ids.iter();
        match (ids.next(), ids.next()) {
            (Some(id), None) => Some(*id),
            _ => None,
        }
    }

    /// Returns the selected subcategories.
    #[must_use]
    pub fn subcategory_ids(&self) -> &BTreeSet<facet::Id> {
        &self.subcategory_ids
    }

    /// Returns the selected city.
    #[must_use]
    pub fn city_id(&self) -> Option<facet::Id> {
        self.city_id
    }

    /// Returns the price [`Range`].
    #[must_use]
    pub fn price(&self) -> Range {
        self.price
    }

    /// Returns the area [`Range`].
    #[must_use]
    pub fn area(&self) -> Range {
        self.area
    }

    /// Returns the required [`Feature`]s.
    #[must_use]
    pub fn features(&self) -> &BTreeSet<Feature> {
        &self.features
    }

    /// Returns the [`SortKey`].
    #[must_use]
    pub fn sort(&self) -> SortKey {
        self.sort
    }

    /// Returns the narrowing [`Status`].
    #[must_use]
    pub fn status(&self) -> Option<Status> {
        self.status
    }

    /// Returns the current page.
    #[must_use]
    pub fn page(&self) -> pagination::Number {
        self.page
    }

    /// Returns a new [`Filter`] with the provided [`Patch`] merged in.
    ///
    /// Invariants are enforced in order:
    /// 1. changing categories clears subcategories;
    /// 2. inverted [`Range`]s are swapped;
    /// 3. the page is reset to the first one, unless only the page changed.
    #[must_use]
    pub fn apply(&self, patch: Patch) -> Self {
        let Patch {
            search,
            category_ids,
            subcategory_ids,
            city_id,
            price,
            area,
            features,
            sort,
            status,
            page,
        } = patch;

        let mut next = self.clone();
        if let Some(search) = search {
            search.trim().clone_into(&mut next.search);
        }
        if let Some(ids) = category_ids {
            next.category_ids = ids;
        }
        if let Some(ids) = subcategory_ids {
            next.subcategory_ids = ids;
        }
        if let Some(id) = city_id {
            next.city_id = id;
        }
        if let Some(range) = price {
            next.price = range;
        }
        if let Some(range) = area {
            next.area = range;
        }
        if let Some(features) = features {
            next.features = features;
        }
        if let Some(sort) = sort {
            next.sort = sort;
        }
        if let Some(status) = status {
            next.status = status;
        }
        if let Some(page) = page {
            next.page = page;
        }

        if next.category_ids != self.category_ids
            || next.single_category().is_none()
        {
            next.subcategory_ids.clear();
        }

        next.price = next.price.normalized();
        next.area = next.area.normalized();

        let only_page_changed = Self {
            page: self.page,
            ..next.clone()
        } == *self;
        if !only_page_changed {
            next.page = pagination::Number::FIRST;
        }

        next
    }

    /// Returns a new [`Filter`] with the provided textual parameters (URL
    /// query or form fields) applied.
    ///
    /// Malformed parameters are skipped and reported as
    /// [`ValidationError`]s.
    pub fn apply_params<'p>(
        &self,
        params: impl IntoIterator<Item = (&'p str, &'p str)>,
    ) -> (Self, Vec<ValidationError>) {
        let mut errors = Vec::new();
        let mut patch = Patch::default();
        let mut subcategories = None::<BTreeSet<facet::Id>>;
        let mut page = None;
        let mut price = self.price;
        let mut area = self.area;

        for (name, value) in params {
            let value = value.trim();
            let mut malformed = |expected| {
                errors.push(ValidationError::Malformed {
                    name: name.to_owned(),
                    expected,
                    value: value.to_owned(),
                });
            };
            match name {
                "search" | "q" => patch.search = Some(value.to_owned()),
                "category" | "subcategory" => {
                    let Some(ids) = parse_ids(value) else {
                        malformed("comma separated ids");
                        continue;
                    };
                    let target = if name == "category" {
                        patch.category_ids.get_or_insert_with(BTreeSet::new)
                    } else {
                        subcategories.get_or_insert_with(BTreeSet::new)
                    };
                    target.extend(ids);
                }
                "city" => match parse_optional(value, facet::Id::from_str) {
                    Ok(id) => patch.city_id = Some(id),
                    Err(()) => malformed("an id"),
                },
                "price" => match Range::parse(value) {
                    Some(range) => price = range,
                    None => malformed("a `min-max` or `min+` range"),
                },
                "min_price" | "max_price" | "min_area" | "max_area" => {
                    let Ok(bound) = parse_optional(value, Decimal::from_str)
                    else {
                        malformed("a number");
                        continue;
                    };
                    let range = if name.ends_with("price") {
                        &mut price
                    } else {
                        &mut area
                    };
                    if name.starts_with("min") {
                        range.min = bound;
                    } else {
                        range.max = bound;
                    }
                }
                "feature" => match Feature::new(value) {
                    Some(f) => {
                        _ = patch
                            .features
                            .get_or_insert_with(|| self.features.clone())
                            .insert(f);
                    }
                    None => malformed("a feature tag"),
                },
                "status" => match value {
                    "" | "all" => patch.status = Some(None),
                    _ => match value.parse::<Status>() {
                        Ok(s) => patch.status = Some(Some(s)),
                        Err(_) => malformed("a listing status"),
                    },
                },
                "sort" => match SortKey::parse(value) {
                    Some(key) => patch.sort = Some(key),
                    None => malformed("a sort key"),
                },
                "page" => {
                    match value.parse().ok().and_then(pagination::Number::new) {
                        Some(n) => page = Some(n),
                        None => malformed("a positive page number"),
                    }
                }
                _ => errors.push(ValidationError::UnknownParameter(
                    name.to_owned(),
                )),
            }
        }
        if price != self.price {
            patch.price = Some(price);
        }
        if area != self.area {
            patch.area = Some(area);
        }

        // Subcategories and the page would be reset by a preceding category
        // change, so they go last.
        let mut next = self.apply(patch);
        if let Some(ids) = subcategories {
            if next.single_category().is_none() {
                errors.push(ValidationError::OrphanSubcategories);
            }
            next = next.apply(Patch::default().with_subcategories(ids));
        }
        if let Some(n) = page {
            next = next.apply(Patch::default().with_page(n));
        }
        (next, errors)
    }
}

/// Parses a comma separated list of [`facet::Id`]s.
fn parse_ids(raw: &str) -> Option<Vec<facet::Id>> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|s| s.parse().ok())
        .collect()
}

/// Parses an optional value, treating an empty input as [`None`].
fn parse_optional<T, E>(
    raw: &str,
    parse: impl FnOnce(&str) -> Result<T, E>,
) -> Result<Option<T>, ()> {
    if raw.is_empty() {
        return Ok(None);
    }
    parse(raw).map(Some).map_err(drop)
}

/// Partial update of a [`Filter`].
///
/// [`None`] fields are left untouched.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct Patch {
    /// New search term.
    pub search: Option<String>,

    /// New set of selected categories.
    pub category_ids: Option<BTreeSet<facet::Id>>,

    /// New set of selected subcategories.
    pub subcategory_ids: Option<BTreeSet<facet::Id>>,

    /// New selected city, [`Some(None)`] to unselect.
    pub city_id: Option<Option<facet::Id>>,

    /// New price [`Range`].
    pub price: Option<Range>,

    /// New area [`Range`].
    pub area: Option<Range>,

    /// New set of required [`Feature`]s.
    pub features: Option<BTreeSet<Feature>>,

    /// New [`SortKey`].
    pub sort: Option<SortKey>,

    /// New narrowing [`Status`], [`Some(None)`] for every status.
    pub status: Option<Option<Status>>,

    /// New page.
    pub page: Option<pagination::Number>,
}

impl Patch {
    /// Sets the search term.
    #[must_use]
    pub fn with_search(mut self, term: impl Into<String>) -> Self {
        self.search = Some(term.into());
        self
    }

    /// Sets the selected categories.
    #[must_use]
    pub fn with_categories(
        mut self,
        ids: impl IntoIterator<Item = facet::Id>,
    ) -> Self {
        self.category_ids = Some(ids.into_iter().collect());
        self
    }

    /// Sets the selected subcategories.
    #[must_use]
    pub fn with_subcategories(
        mut self,
        ids: impl IntoIterator<Item = facet::Id>,
    ) -> Self {
        self.subcategory_ids = Some(ids.into_iter().collect());
        self
    }

    /// Sets or unsets the selected city.
    #[must_use]
    pub fn with_city(mut self, id: Option<facet::Id>) -> Self {
        self.city_id = Some(id);
        self
    }

    /// Sets the price [`Range`].
    #[must_use]
    pub fn with_price(mut self, range: Range) -> Self {
        self.price = Some(range);
        self
    }

    /// Sets the area [`Range`].
    #[must_use]
    pub fn with_area(mut self, range: Range) -> Self {
        self.area = Some(range);
        self
    }

    /// Sets the required [`Feature`]s.
    #[must_use]
    pub fn with_features(
        mut self,
        features: impl IntoIterator<Item = Feature>,
    ) -> Self {
        self.features = Some(features.into_iter().collect());
        self
    }

    /// Sets the [`SortKey`].
    #[must_use]
    pub fn with_sort(mut self, sort: SortKey) -> Self {
        self.sort = Some(sort);
        self
    }

    /// Sets or unsets the narrowing [`Status`].
    #[must_use]
    pub fn with_status(mut self, status: Option<Status>) -> Self {
        self.status = Some(status);
        self
    }

    /// Sets the page.
    #[must_use]
    pub fn with_page(mut self, page: pagination::Number) -> Self {
        self.page = Some(page);
        self
    }

    /// Indicates whether this [`Patch`] changes category selection.
    #[must_use]
    pub fn touches_categories(&self) -> bool {
        self.category_ids.is_some()
    }
}

/// Error of malformed filter input, corrected locally by ignoring it.
#[derive(Clone, Debug, Display, Eq, Error, PartialEq)]
pub enum ValidationError {
    /// Parameter value cannot be parsed.
    #[display("`{name}` expects {expected}, got `{value}`")]
    Malformed {
        /// Name of the parameter.
        name: String,

        /// Description of the expected value.
        expected: &'static str,

        /// Provided value.
        value: String,
    },

    /// Parameter is not known.
    #[display("unknown filter parameter `{_0}`")]
    UnknownParameter(#[error(not(source))] String),

    /// Subcategories are given without exactly one category.
    #[display("subcategories require exactly one selected category")]
    OrphanSubcategories,
}

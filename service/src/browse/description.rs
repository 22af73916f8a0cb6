//! [`Description`] of a listings query, built out of a [`Filter`].

use std::collections::BTreeSet;

use common::pagination;

use crate::{
    browse::filter::{Filter, Range, SortKey},
    domain::{
        facet,
        listing::{Feature, OwnerId, Scope, Status},
    },
};
#[cfg(doc)]
use crate::domain::Listing;

/// Backend-neutral description of a listings query.
///
/// Two equal [`Filter`]s under the same [`Scope`] always produce equal
/// [`Description`]s.
#[derive(Clone, Debug, Eq, Hash, PartialEq)]
pub struct Description {
    /// [`Constraint`]s a [`Listing`] must satisfy, all of them.
    pub constraints: Vec<Constraint>,

    /// [`Ordering`] of the results.
    pub ordering: Ordering,

    /// Requested page of the results.
    pub pagination: pagination::Arguments,
}

impl Description {
    /// Builds a [`Description`] out of the provided [`Filter`] restricted to
    /// the provided [`Scope`].
    ///
    /// Constraints are emitted in a fixed order: [`Scope`] ones first,
    /// followed by categories, subcategories, city, price, area, search term
    /// and features.
    ///
    /// A [`Filter::status()`] narrows the [`Scope`] statuses. A status outside
    /// of the [`Scope`] matches nothing.
    #[must_use]
    pub fn build(
        filter: &Filter,
        scope: &Scope,
        size: pagination::Size,
    ) -> Self {
        let narrowed;
        let scope = match filter.status() {
            Some(status) => {
                narrowed = scope.clone().with_statuses(
                    scope.statuses.iter().copied().filter(|s| *s == status),
                );
                &narrowed
            }
            None => scope,
        };
        let mut constraints = Self::scope_constraints(scope);

        if !filter.category_ids().is_empty() {
            constraints.push(Constraint::In(
                facet::Kind::Category,
                filter.category_ids().clone(),
            ));
        }
        if !filter.subcategory_ids().is_empty() {
            constraints.push(Constraint::In(
                facet::Kind::Subcategory,
                filter.subcategory_ids().clone(),
            ));
        }
        if let Some(id) = filter.city_id() {
            constraints.push(Constraint::Eq(facet::Kind::City, id));
        }
        for (measure, range) in
            [(Measure::Price, filter.price()), (Measure::Area, filter.area())]
        {
            if !range.is_unbounded() {
                constraints.push(Constraint::Range(measure, range));
            }
        }
        if !filter.search().is_empty() {
            constraints.push(Constraint::Text(filter.search().to_owned()));
        }
        for feature in filter.features() {
            if !(scope.franchise_only && *feature == Feature::franchise()) {
                constraints.push(Constraint::Feature(feature.clone()));
            }
        }

        Self {
            constraints,
            ordering: filter.sort().into(),
            pagination: pagination::Arguments {
                number: filter.page(),
                size,
            },
        }
    }

    /// Returns the [`Constraint`]s expressing the provided [`Scope`] alone.
    ///
    /// Used for facet counts, which ignore the user's own selections.
    #[must_use]
    pub fn scope_constraints(scope: &Scope) -> Vec<Constraint> {
        let mut constraints = vec![Constraint::Status(scope.statuses.clone())];
        if let Some(owner) = scope.owner {
            constraints.push(Constraint::Owner(owner));
        }
        if scope.franchise_only {
            constraints.push(Constraint::Feature(Feature::franchise()));
        }
        constraints
    }

    /// Returns the same [`Description`] requesting another page.
    #[must_use]
    pub fn with_page(mut self, number: pagination::Number) -> Self {
        self.pagination.number = number;
        self
    }
}

/// Single condition on a [`Listing`].
#[derive(Clone, Debug, Eq, Hash, PartialEq)]
pub enum Constraint {
    /// [`Status`] is one of the provided ones.
    Status(BTreeSet<Status>),

    /// [`Listing`] belongs to the provided owner.
    Owner(OwnerId),

    /// [`Listing`] has the provided [`Feature`].
    Feature(Feature),

    /// Facet of the provided [`facet::Kind`] is one of the provided IDs.
    In(facet::Kind, BTreeSet<facet::Id>),

    /// Facet of the provided [`facet::Kind`] equals the provided ID.
    Eq(facet::Kind, facet::Id),

    /// [`Measure`] lies within the provided [`Range`].
    ///
    /// [`Listing`]s missing the [`Measure`] never match.
    Range(Measure, Range),

    /// Title or description contains the provided term, case-insensitively.
    Text(String),
}

/// Numeric property of a [`Listing`].
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum Measure {
    /// Asked price.
    Price,

    /// Area in square meters.
    Area,
}

/// Order of query results.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub struct Ordering {
    /// Main [`Sort`].
    pub primary: Sort,

    /// [`Sort`] applied to items equal by the [`Ordering::primary`] one.
    pub tie_break: Option<Sort>,
}

/// Sorting by a single field.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub struct Sort {
    /// Field to sort by.
    pub field: SortField,

    /// Direction to sort in.
    pub order: Order,
}

impl Sort {
    /// Most recently created first.
    pub const NEWEST: Self = Self {
        field: SortField::CreatedAt,
        order: Order::Descending,
    };
}

/// Sortable field of a [`Listing`].
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum SortField {
    /// Creation time.
    CreatedAt,

    /// Asked price.
    Price,

    /// Area.
    Area,
}

/// Sorting direction.
///
/// Missing values sort as the largest ones: last when
/// [`Order::Ascending`], first when [`Order::Descending`].
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum Order {
    /// Smallest first.
    Ascending,

    /// Largest first.
    Descending,
}

impl From<SortKey> for Ordering {
    fn from(key: SortKey) -> Self {
        let by = |field, order| Sort { field, order };
        let (primary, tie_break) = match key {
            SortKey::Newest => (Sort::NEWEST, None),
            SortKey::Oldest => {
                (by(SortField::CreatedAt, Order::Ascending), None)
            }
            SortKey::PriceAsc => {
                (by(SortField::Price, Order::Ascending), Some(Sort::NEWEST))
            }
            SortKey::PriceDesc => {
                (by(SortField::Price, Order::Descending), Some(Sort::NEWEST))
            }
            SortKey::AreaDesc => {
                (by(SortField::Area, Order::Descending), Some(Sort::NEWEST))
            }
        };
        Self { primary, tie_break }
    }
}

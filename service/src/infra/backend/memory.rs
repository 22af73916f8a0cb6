//! In-memory [`Backend`] implementation.

use std::{cmp, sync::Arc};

use common::operations::{By, Select};
use serde::Deserialize;
use tracerr::Traced;

use crate::{
    browse::description::{
        Constraint, Description, Measure, Order, Sort, SortField,
    },
    domain::{facet, FacetOption, Listing},
    infra::{backend, Backend},
    read,
};

/// Named entry of a catalog: a category, a subcategory or a city.
#[derive(Clone, Debug, Deserialize)]
pub struct CatalogEntry {
    /// ID of this [`CatalogEntry`].
    pub id: facet::Id,

    /// Human readable name.
    pub name: String,

    /// Icon shown before the name.
    #[serde(default)]
    pub icon: Option<String>,

    /// Parent category of a subcategory.
    #[serde(default)]
    pub parent_id: Option<facet::Id>,
}

/// Rows served by a [`Memory`] backend.
#[derive(Clone, Debug, Default, Deserialize)]
pub struct Dataset {
    /// Categories, along with their subcategories.
    #[serde(default)]
    pub categories: Vec<CatalogEntry>,

    /// Cities.
    #[serde(default)]
    pub cities: Vec<CatalogEntry>,

    /// [`Listing`]s.
    #[serde(default)]
    pub listings: Vec<Listing>,
}

/// [`Backend`] evaluating queries over an in-memory [`Dataset`].
#[derive(Clone, Debug, Default)]
pub struct Memory(Arc<Dataset>);

impl Memory {
    /// Creates a new [`Memory`] backend serving the provided [`Dataset`].
    #[must_use]
    pub fn new(dataset: Dataset) -> Self {
        Self(Arc::new(dataset))
    }

    /// Creates a new [`Memory`] backend out of a JSON [`Dataset`].
    ///
    /// # Errors
    ///
    /// If the provided JSON is not a valid [`Dataset`].
    pub fn from_json(json: &str) -> Result<Self, Traced<backend::Error>> {
        serde_json::from_str(json)
            .map(Self::new)
            .map_err(tracerr::from_and_wrap!(=> backend::Error))
    }

    /// Returns the name of the catalog entry with the provided ID.
    fn label(entries: &[CatalogEntry], id: facet::Id) -> Option<String> {
        entries.iter().find(|e| e.id == id).map(|e| e.name.clone())
    }

    /// Projects the provided [`Listing`] into a [`read::listing::Summary`].
    fn summarize(&self, listing: &Listing) -> read::listing::Summary {
        let Dataset {
            categories, cities, ..
        } = &*self.0;
        read::listing::Summary {
            id: listing.id,
            title: Some(listing.title.clone()),
            price: listing.price,
            area: listing.area,
            image: listing.primary_image().map(ToOwned::to_owned),
            category: listing
                .category_id
                .and_then(|id| Self::label(categories, id)),
            city: listing.city_id.and_then(|id| Self::label(cities, id)),
            district: listing.district.clone(),
            created_at: Some(listing.created_at),
        }
    }
}

/// Checks whether the provided [`Listing`] satisfies the [`Constraint`].
fn satisfies(listing: &Listing, constraint: &Constraint) -> bool {
    match constraint {
        Constraint::Status(statuses) => statuses.contains(&listing.status),
        Constraint::Owner(owner) => listing.owner == *owner,
        Constraint::Feature(feature) => listing.features.contains(feature),
        Constraint::In(kind, ids) => {
            listing.facet(*kind).is_some_and(|id| ids.contains(&id))
        }
        Constraint::Eq(kind, id) => listing.facet(*kind) == Some(*id),
        Constraint::Range(Measure::Price, range) => {
            listing.price.is_some_and(|p| range.contains(p.amount))
        }
        Constraint::Range(Measure::Area, range) => listing
            .area
            .is_some_and(|a| range.contains(a.square_meters())),
        Constraint::Text(term) => {
            let term = term.to_lowercase();
            listing.title.to_lowercase().contains(&term)
                || listing.description.to_lowercase().contains(&term)
        }
    }
}

/// Compares [`Listing`]s by the provided [`Sort`].
fn compare(a: &Listing, b: &Listing, sort: Sort) -> cmp::Ordering {
    let ord = match sort.field {
        SortField::CreatedAt => a.created_at.cmp(&b.created_at),
        SortField::Price => nulls_last(
            a.price.map(|p| p.amount),
            b.price.map(|p| p.amount),
        ),
        SortField::Area => nulls_last(a.area, b.area),
    };
    match sort.order {
        Order::Ascending => ord,
        Order::Descending => ord.reverse(),
    }
}

/// Compares optional values, treating [`None`] as the largest one.
fn nulls_last<T: Ord>(a: Option<T>, b: Option<T>) -> cmp::Ordering {
    match (a, b) {
        (Some(a), Some(b)) => a.cmp(&b),
        (None, None) => cmp::Ordering::Equal,
        (None, Some(_)) => cmp::Ordering::Greater,
        (Some(_), None) => cmp::Ordering::Less,
    }
}

impl Backend<Select<By<read::listing::list::Page, Description>>> for Memory {
    type Ok = read::listing::list::Page;
    type Err = Traced<backend::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<read::listing::list::Page, Description>>,
    ) -> Result<Self::Ok, Self::Err> {
        let Description {
            constraints,
            ordering,
            pagination,
        } = by.into_inner();

        let mut matched = self
            .0
            .listings
            .iter()
            .filter(|l| constraints.iter().all(|c| satisfies(l, c)))
            .collect::<Vec<_>>();
        matched.sort_by(|a, b| {
            compare(a, b, ordering.primary)
                .then_with(|| {
                    ordering
                        .tie_break
                        .map_or(cmp::Ordering::Equal, |s| compare(a, b, s))
                })
                .then_with(|| a.id.cmp(&b.id))
        });

        let offset = usize::try_from(pagination.offset()).unwrap_or(usize::MAX);
        let limit = usize::try_from(pagination.limit()).unwrap_or(usize::MAX);
        Ok(read::listing::list::Page {
            items: matched
                .iter()
                .skip(offset)
                .take(limit)
                .map(|l| self.summarize(l))
                .collect(),
            total_count: matched.len() as u64,
            number: pagination.number,
            size: pagination.size,
        })
    }
}

impl Backend<Select<By<Vec<FacetOption>, facet::Selector>>> for Memory {
    type Ok = Vec<FacetOption>;
    type Err = Traced<backend::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<Vec<FacetOption>, facet::Selector>>,
    ) -> Result<Self::Ok, Self::Err> {
        let facet::Selector { kind, parent } = by.into_inner();

        if !kind.is_catalog() {
            return Ok(vec![]);
        }
        let entries = if kind == facet::Kind::City {
            &self.0.cities
        } else {
            &self.0.categories
        };
        let mut options = entries
            .iter()
            .filter(|e| e.parent_id == parent)
            .map(|e| FacetOption {
                id: e.id,
                label: e.name.clone(),
                icon: e
                    .icon
                    .clone()
                    .unwrap_or_else(|| kind.default_icon().to_owned()),
                count: facet::Count::Uncounted,
            })
            .collect::<Vec<_>>();
        options.sort_by(|a, b| a.label.cmp(&b.label));
        Ok(options)
    }
}

impl Backend<Select<By<facet::Counts, facet::CountSelector>>> for Memory {
    type Ok = facet::Counts;
    type Err = Traced<backend::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<facet::Counts, facet::CountSelector>>,
    ) -> Result<Self::Ok, Self::Err> {
        let facet::CountSelector { group_by, scope } = by.into_inner();

        Ok(self
            .0
            .listings
            .iter()
            .filter(|l| scope.contains(l))
            .filter_map(|l| match &group_by {
                facet::GroupBy::Category => l.category_id,
                facet::GroupBy::Status => Some(l.status.into()),
                facet::GroupBy::Price(buckets) => {
                    l.price.and_then(|p| buckets.bucket_of(p.amount))
                }
            })
            .collect())
    }
}

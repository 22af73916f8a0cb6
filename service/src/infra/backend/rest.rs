//! [PostgREST] [`Backend`] implementation.
//!
//! [PostgREST]: https://postgrest.org

use std::sync::Arc;

use common::{
    datetime::DateTimeOf,
    money::Currency,
    operations::{By, Select},
    Money,
};
use itertools::Itertools as _;
use reqwest::{header, Response};
use rust_decimal::Decimal;
use secrecy::{ExposeSecret as _, SecretString};
use serde::Deserialize;
use tracerr::Traced;
use tracing as log;

use crate::{
    browse::description::{
        Constraint, Description, Measure, Order, Ordering, Sort, SortField,
    },
    domain::{facet, listing, FacetOption},
    infra::{backend, Backend},
    read,
};

/// [`Backend`] reaching a [PostgREST] API over HTTP.
///
/// Cheap to clone: clones share the same connection pool.
///
/// [PostgREST]: https://postgrest.org
#[derive(Clone, Debug)]
pub struct Rest(Arc<Inner>);

/// Shared state of a [`Rest`] backend.
#[derive(Debug)]
struct Inner {
    /// HTTP client.
    client: reqwest::Client,

    /// Root URL of the API (e.g. `https://example.supabase.co/rest/v1`).
    url: String,

    /// Key authorizing requests.
    api_key: SecretString,

    /// [`Currency`] of listing prices.
    currency: Currency,
}

/// Number of rows fetched at once when projecting listings for counting.
///
/// Stays under the default `max-rows` of PostgREST deployments.
const PROJECTION_PAGE: u64 = 1000;

/// Columns of a listing row projected into a [`read::listing::Summary`].
const SUMMARY_COLUMNS: &str = "id,title,price,area_sqm,district,created_at,\
                               categories!category_id(name),cities(name),\
                               listing_images(url,is_primary)";

impl Rest {
    /// Creates a new [`Rest`] backend for the API at the provided `url`.
    #[must_use]
    pub fn new(
        url: impl Into<String>,
        api_key: SecretString,
        currency: Currency,
    ) -> Self {
        Self(Arc::new(Inner {
            client: reqwest::Client::new(),
            url: url.into().trim_end_matches('/').to_owned(),
            api_key,
            currency,
        }))
    }

    /// Performs a `GET` request to the provided `table`.
    async fn get(
        &self,
        table: &str,
        params: &[(String, String)],
        count: bool,
    ) -> Result<Response, Traced<backend::Error>> {
        let Inner {
            client,
            url,
            api_key,
            ..
        } = &*self.0;

        log::debug!("GET {url}/{table} {params:?}");

        let mut req = client
            .get(format!("{url}/{table}"))
            .query(params)
            .header("apikey", api_key.expose_secret())
            .bearer_auth(api_key.expose_secret());
        if count {
            req = req.header("Prefer", "count=exact");
        }
        req.send()
            .await
            .and_then(Response::error_for_status)
            .map_err(tracerr::from_and_wrap!(=> backend::Error))
    }

    /// Fetches every row of the `listings` projection described by the
    /// provided `params`, page by page, until the total of the
    /// `Content-Range` header is reached.
    async fn project(
        &self,
        params: &[(String, String)],
    ) -> Result<Vec<Row>, Traced<backend::Error>> {
        let mut rows = Vec::new();
        let mut offset = 0;
        loop {
            let mut page = params.to_vec();
            page.extend([
                ("order".to_owned(), "id.asc".to_owned()),
                ("offset".to_owned(), offset.to_string()),
                ("limit".to_owned(), PROJECTION_PAGE.to_string()),
            ]);
            let resp = self
                .get("listings", &page, true)
                .await
                .map_err(tracerr::wrap!())?;
            let total = content_total(&resp).map_err(tracerr::wrap!())?;
            let batch = resp
                .json::<Vec<Row>>()
                .await
                .map_err(tracerr::from_and_wrap!(=> backend::Error))?;

            let fetched = batch.len() as u64;
            rows.extend(batch);
            match next_offset(offset, fetched, total) {
                Some(next) => offset = next,
                None => break,
            }
        }
        log::debug!("projected {} listing rows", rows.len());
        Ok(rows)
    }
}

/// Untyped row of a projection.
type Row = serde_json::Map<String, serde_json::Value>;

/// Returns the offset of the next projection page, if any rows are left.
///
/// An empty page stops paging even below the `total`, as rows may vanish
/// between requests.
fn next_offset(offset: u64, fetched: u64, total: u64) -> Option<u64> {
    let next = offset.saturating_add(fetched);
    (fetched > 0 && next < total).then_some(next)
}

/// Reads the total count out of the `Content-Range` header of the provided
/// [`Response`].
fn content_total(resp: &Response) -> Result<u64, Traced<backend::Error>> {
    let range = resp
        .headers()
        .get(header::CONTENT_RANGE)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default();
    total_count(range).ok_or_else(|| {
        tracerr::new!(backend::Error::MalformedContentRange(range.to_owned()))
    })
}

/// Returns the column holding the facet of the provided [`facet::Kind`],
/// if the [`facet::Kind`] is a catalog one.
fn column(kind: facet::Kind) -> Option<&'static str> {
    match kind {
        facet::Kind::Category => Some("category_id"),
        facet::Kind::Subcategory => Some("subcategory_id"),
        facet::Kind::City => Some("city_id"),
        facet::Kind::Price | facet::Kind::Status => None,
    }
}

/// Returns the column the provided [`facet::GroupBy`] groups rows by.
fn group_column(group_by: &facet::GroupBy) -> &'static str {
    match group_by {
        facet::GroupBy::Category => "category_id",
        facet::GroupBy::Price(_) => "price",
        facet::GroupBy::Status => "status",
    }
}

/// Counts the provided projection [`Row`]s by the [`facet::GroupBy`].
///
/// Rows with a missing or unrecognized value are not counted.
fn tally(group_by: &facet::GroupBy, rows: &[Row]) -> facet::Counts {
    let column = group_column(group_by);
    rows.iter()
        .filter_map(|row| {
            let value = row.get(column)?;
            match group_by {
                facet::GroupBy::Category => value
                    .as_u64()
                    .and_then(|id| u32::try_from(id).ok())
                    .map(facet::Id::from),
                facet::GroupBy::Status => value
                    .as_str()?
                    .parse::<listing::Status>()
                    .ok()
                    .map(Into::into),
                facet::GroupBy::Price(buckets) => <Decimal as Deserialize>::deserialize(value)
                    .ok()
                    .and_then(|price| buckets.bucket_of(price)),
            }
        })
        .collect()
}

/// Builds an `ilike` pattern matching the provided `term` anywhere.
///
/// `LIKE` wildcards of the `term` match literally.
fn ilike_pattern(term: &str) -> String {
    // `LIKE` escaping goes first, quoting of the PostgREST value second.
    let escaped = term
        .replace('\\', r"\\")
        .replace('%', r"\%")
        .replace('_', r"\_")
        .replace('*', "")
        .replace('\\', r"\\")
        .replace('"', r#"\""#);
    format!("\"*{escaped}*\"")
}

/// Converts the provided [`Constraint`]s into query parameters.
fn filter_params(constraints: &[Constraint]) -> Vec<(String, String)> {
    let mut params = Vec::new();
    for c in constraints {
        match c {
            Constraint::Status(statuses) => params.push((
                "status".to_owned(),
                format!("in.({})", statuses.iter().join(",")),
            )),
            Constraint::Owner(owner) => {
                params.push(("user_id".to_owned(), format!("eq.{owner}")));
            }
            Constraint::Feature(feature) => {
                params.push((format!("is_{feature}"), "is.true".to_owned()));
            }
            Constraint::In(kind, ids) => match column(*kind) {
                Some(column) => params.push((
                    column.to_owned(),
                    format!("in.({})", ids.iter().join(",")),
                )),
                None => log::warn!("no column to filter `{kind}` facets by"),
            },
            Constraint::Eq(kind, id) => match column(*kind) {
                Some(column) => {
                    params.push((column.to_owned(), format!("eq.{id}")));
                }
                None => log::warn!("no column to filter `{kind}` facets by"),
            },
            Constraint::Range(measure, range) => {
                let column = match measure {
                    Measure::Price => "price",
                    Measure::Area => "area_sqm",
                };
                if let Some(min) = range.min {
                    params.push((column.to_owned(), format!("gte.{min}")));
                }
                if let Some(max) = range.max {
                    params.push((column.to_owned(), format!("lte.{max}")));
                }
            }
            Constraint::Text(term) => {
                let pattern = ilike_pattern(term);
                params.push((
                    "or".to_owned(),
                    format!(
                        "(title.ilike.{pattern},description.ilike.{pattern})",
                    ),
                ));
            }
        }
    }
    params
}

/// Converts the provided [`Ordering`] into the `order` parameter value.
///
/// Missing values sort as the largest ones, in both directions.
fn order_param(ordering: Ordering) -> String {
    let sort = |Sort { field, order }: Sort| {
        let field = match field {
            SortField::CreatedAt => "created_at",
            SortField::Price => "price",
            SortField::Area => "area_sqm",
        };
        let order = match order {
            Order::Ascending => "asc.nullslast",
            Order::Descending => "desc.nullsfirst",
        };
        format!("{field}.{order}")
    };
    std::iter::once(ordering.primary)
        .chain(ordering.tie_break)
        .map(sort)
        .join(",")
}

/// Converts the provided [`Description`] into query parameters.
fn listing_params(description: &Description) -> Vec<(String, String)> {
    let mut params = vec![("select".to_owned(), SUMMARY_COLUMNS.to_owned())];
    params.extend(filter_params(&description.constraints));
    params.extend([
        ("order".to_owned(), order_param(description.ordering)),
        (
            "offset".to_owned(),
            description.pagination.offset().to_string(),
        ),
        ("limit".to_owned(), description.pagination.limit().to_string()),
    ]);
    params
}

/// Reads the total count out of a `Content-Range` header value (e.g.
/// `0-11/57` or `*/0`).
fn total_count(content_range: &str) -> Option<u64> {
    content_range.rsplit_once('/')?.1.trim().parse().ok()
}

/// Label embedded into a listing row.
#[derive(Debug, Deserialize)]
struct Named {
    /// Label.
    name: Option<String>,
}

/// Image embedded into a listing row.
#[derive(Debug, Deserialize)]
struct ImageRow {
    /// URL of the image.
    url: String,

    /// Indicator whether the image is the primary one.
    #[serde(default)]
    is_primary: Option<bool>,
}

/// Listing row as returned by the API.
#[derive(Debug, Deserialize)]
struct ListingRow {
    id: listing::Id,
    title: Option<String>,
    price: Option<Decimal>,
    area_sqm: Option<Decimal>,
    district: Option<String>,
    created_at: Option<String>,
    categories: Option<Named>,
    cities: Option<Named>,
    #[serde(default)]
    listing_images: Vec<ImageRow>,
}

impl ListingRow {
    /// Projects this [`ListingRow`] into a [`read::listing::Summary`].
    fn into_summary(self, currency: Currency) -> read::listing::Summary {
        let images = self
            .listing_images
            .into_iter()
            .map(|i| listing::Image {
                url: i.url,
                is_primary: i.is_primary.unwrap_or_default(),
            })
            .collect::<Vec<_>>();
        read::listing::Summary {
            id: self.id,
            title: self.title,
            price: self.price.map(|p| Money::new(p, currency)),
            area: self.area_sqm.map(Into::into),
            image: listing::Image::primary(&images).map(ToOwned::to_owned),
            category: self.categories.and_then(|c| c.name),
            city: self.cities.and_then(|c| c.name),
            district: self.district,
            created_at: self
                .created_at
                .and_then(|at| DateTimeOf::from_rfc3339(&at).ok()),
        }
    }
}

/// Category or city row as returned by the API.
#[derive(Debug, Deserialize)]
struct CatalogRow {
    id: facet::Id,
    name: String,
    #[serde(default)]
    icon: Option<String>,
}

impl Backend<Select<By<read::listing::list::Page, Description>>> for Rest {
    type Ok = read::listing::list::Page;
    type Err = Traced<backend::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<read::listing::list::Page, Description>>,
    ) -> Result<Self::Ok, Self::Err> {
        let description = by.into_inner();

        let resp = self
            .get("listings", &listing_params(&description), true)
            .await
            .map_err(tracerr::wrap!())?;
        let total_count = content_total(&resp).map_err(tracerr::wrap!())?;
        let rows = resp
            .json::<Vec<ListingRow>>()
            .await
            .map_err(tracerr::from_and_wrap!(=> backend::Error))?;

        let currency = self.0.currency;
        Ok(read::listing::list::Page {
            items: rows.into_iter().map(|r| r.into_summary(currency)).collect(),
            total_count,
            number: description.pagination.number,
            size: description.pagination.size,
        })
    }
}

impl Backend<Select<By<Vec<FacetOption>, facet::Selector>>> for Rest {
    type Ok = Vec<FacetOption>;
    type Err = Traced<backend::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<Vec<FacetOption>, facet::Selector>>,
    ) -> Result<Self::Ok, Self::Err> {
        let facet::Selector { kind, parent } = by.into_inner();

        let mut params = vec![("order".to_owned(), "name.asc".to_owned())];
        let table = match kind {
            facet::Kind::Category | facet::Kind::Subcategory => {
                params.push(("select".to_owned(), "id,name,icon".to_owned()));
                let parent = parent.map_or_else(
                    || "is.null".to_owned(),
                    |p| format!("eq.{p}"),
                );
                params.push(("parent_id".to_owned(), parent));
                "categories"
            }
            facet::Kind::City => {
                params.push(("select".to_owned(), "id,name".to_owned()));
                "cities"
            }
            facet::Kind::Price | facet::Kind::Status => return Ok(vec![]),
        };

        Ok(self
            .get(table, &params, false)
            .await
            .map_err(tracerr::wrap!())?
            .json::<Vec<CatalogRow>>()
            .await
            .map_err(tracerr::from_and_wrap!(=> backend::Error))?
            .into_iter()
            .map(|row| FacetOption {
                id: row.id,
                label: row.name,
                icon: row
                    .icon
                    .unwrap_or_else(|| kind.default_icon().to_owned()),
                count: facet::Count::Uncounted,
            })
            .collect())
    }
}

impl Backend<Select<By<facet::Counts, facet::CountSelector>>> for Rest {
    type Ok = facet::Counts;
    type Err = Traced<backend::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<facet::Counts, facet::CountSelector>>,
    ) -> Result<Self::Ok, Self::Err> {
        let facet::CountSelector { group_by, scope } = by.into_inner();

        let mut params =
            vec![("select".to_owned(), group_column(&group_by).to_owned())];
        params.extend(filter_params(&Description::scope_constraints(&scope)));

        let rows = self.project(&params).await.map_err(tracerr::wrap!())?;
        Ok(tally(&group_by, &rows))
    }
}

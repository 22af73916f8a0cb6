//! [`Query`] collection related to facets.

use common::operations::By;

use crate::domain::{facet, FacetOption};
#[cfg(doc)]
use crate::{domain::Listing, Query};

use super::BackendQuery;

/// Queries [`FacetOption`]s picked by a [`facet::Selector`], ordered by
/// label.
pub type Options = BackendQuery<By<Vec<FacetOption>, facet::Selector>>;

/// Queries [`facet::Counts`] of [`Listing`]s grouped by a facet.
pub type Counts = BackendQuery<By<facet::Counts, facet::CountSelector>>;

//! [`Query`] collection related to the multiple [`Listing`]s.

use common::operations::By;

use crate::{browse::Description, read};
#[cfg(doc)]
use crate::{domain::Listing, Query};

use super::BackendQuery;

/// Queries a page of [`Listing`]s matching a [`Description`].
pub type List = BackendQuery<By<read::listing::list::Page, Description>>;

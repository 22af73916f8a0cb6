//! [`Listing`]-related read definitions.

use common::Money;

use crate::domain::listing::{self, Area, CreationDateTime};
#[cfg(doc)]
use crate::domain::Listing;

/// Projection of a [`Listing`] shown in browse results.
///
/// Every field except the [`listing::Id`] may be absent.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Summary {
    /// ID of the [`Listing`].
    pub id: listing::Id,

    /// Title of the [`Listing`].
    pub title: Option<String>,

    /// Asked price of the [`Listing`].
    pub price: Option<Money>,

    /// [`Area`] of the [`Listing`].
    pub area: Option<Area>,

    /// URL of the primary image of the [`Listing`].
    pub image: Option<String>,

    /// Label of the [`Listing`] category.
    pub category: Option<String>,

    /// Label of the [`Listing`] city.
    pub city: Option<String>,

    /// Label of the [`Listing`] district.
    pub district: Option<String>,

    /// [`CreationDateTime`] of the [`Listing`].
    pub created_at: Option<CreationDateTime>,
}

pub mod list {
    //! [`Summary`] list definitions.

    use common::pagination;

    use super::Summary;

    /// Page of [`Summary`]s matching a query.
    #[derive(Clone, Debug, Default, PartialEq)]
    pub struct Page {
        /// [`Summary`]s on this [`Page`], in query order.
        pub items: Vec<Summary>,

        /// Total number of items matching the query across all pages.
        pub total_count: u64,

        /// Number of this [`Page`].
        pub number: pagination::Number,

        /// Maximum number of items on this [`Page`].
        pub size: pagination::Size,
    }

    impl Page {
        /// Creates an empty [`Page`] for the provided arguments.
        #[must_use]
        pub fn empty(args: pagination::Arguments) -> Self {
            Self {
                items: Vec::new(),
                total_count: 0,
                number: args.number,
                size: args.size,
            }
        }

        /// Indicates whether nothing matched the query.
        #[must_use]
        pub fn is_empty(&self) -> bool {
            self.total_count == 0
        }

        /// Indicates whether this [`Page`] lies beyond the last page of the
        /// result set.
        #[must_use]
        pub fn is_out_of_range(&self) -> bool {
            self.items.is_empty() && self.total_count > 0
        }

        /// Returns the last page number of the result set.
        #[must_use]
        pub fn last_page(&self) -> pagination::Number {
            pagination::last_page(self.total_count, self.size)
        }
    }
}

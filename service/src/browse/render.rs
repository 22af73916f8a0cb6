//! Rendering of result [`Page`]s into display-ready [`Fragment`]s.

use common::DateTime;
use itertools::Itertools as _;
use smart_default::SmartDefault;

use crate::read::listing::{list::Page, Summary};

/// Display-ready piece of browse results.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum Fragment {
    /// Single listing.
    Card(Card),

    /// Nothing matched the query.
    Empty(EmptyState),
}

/// Listing card, every field ready to be shown as is.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Card {
    /// Link to the listing details.
    pub href: String,

    /// Title.
    pub title: String,

    /// Price (e.g. `₺1.250.000`).
    pub price: String,

    /// Area (e.g. `120 m²`).
    pub area: String,

    /// District and city.
    pub location: String,

    /// Category label.
    pub category: String,

    /// Creation date.
    pub date: String,

    /// Image URL.
    pub image: String,
}

/// Empty result notice.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct EmptyState {
    /// Headline.
    pub title: &'static str,

    /// Hint on what to do next.
    pub hint: &'static str,

    /// Label of the action clearing all the filters.
    pub clear_filters: &'static str,
}

impl EmptyState {
    /// The one [`EmptyState`].
    pub const NO_RESULTS: Self = Self {
        title: "No listings found",
        hint: "Try changing or clearing your filters.",
        clear_filters: "Clear filters",
    };
}

/// Style of [`Card::date`]s.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub enum DateStyle {
    /// Calendar date (e.g. `05.03.2024`).
    #[default]
    Absolute,

    /// Elapsed time (e.g. `3 days ago`).
    Relative,
}

/// Renderer of result [`Page`]s.
#[derive(Clone, Debug, SmartDefault)]
pub struct Renderer {
    /// [`DateStyle`] of rendered dates.
    pub date_style: DateStyle,

    /// Image shown for listings having none.
    #[default("/images/placeholder.svg".to_owned())]
    pub placeholder_image: String,

    /// Path of the listing details page.
    #[default("/listing".to_owned())]
    pub detail_path: String,
}

impl Renderer {
    /// Renders the provided [`Page`] relatively to the provided `now`.
    ///
    /// A [`Page`] without items renders as a single [`Fragment::Empty`].
    #[must_use]
    pub fn render(&self, page: &Page, now: DateTime) -> Vec<Fragment> {
        if page.items.is_empty() {
            return vec![Fragment::Empty(EmptyState::NO_RESULTS)];
        }
        page.items
            .iter()
            .map(|s| Fragment::Card(self.card(s, now)))
            .collect()
    }

    /// Renders a single [`Card`].
    #[must_use]
    pub fn card(&self, summary: &Summary, now: DateTime) -> Card {
        let non_blank = |s: &Option<String>| {
            s.as_deref()
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(ToOwned::to_owned)
        };

        let location = [non_blank(&summary.district), non_blank(&summary.city)]
            .into_iter()
            .flatten()
            .join(", ");

        Card {
            href: format!("{}?id={}", self.detail_path, summary.id),
            title: non_blank(&summary.title)
                .unwrap_or_else(|| "Untitled listing".to_owned()),
            price: summary
                .price
                .filter(|p| !p.amount.trunc().is_zero())
                .map_or_else(
                    || "Price on request".to_owned(),
                    |p| p.grouped().to_string(),
                ),
            area: summary.area.map_or_else(
                || "-".to_owned(),
                |a| format!("{} m²", a.square_meters().normalize()),
            ),
            location: if location.is_empty() {
                "Location not specified".to_owned()
            } else {
                location
            },
            category: non_blank(&summary.category)
                .unwrap_or_else(|| "Uncategorized".to_owned()),
            date: summary.created_at.map_or_else(
                || "-".to_owned(),
                |at| match self.date_style {
                    DateStyle::Absolute => at.to_date_string(),
                    DateStyle::Relative => at.ago(now).to_string(),
                },
            ),
            image: non_blank(&summary.image)
                .unwrap_or_else(|| self.placeholder_image.clone()),
        }
    }
}

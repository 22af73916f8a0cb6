//! [`Listing`] definitions.

use std::collections::BTreeSet;

#[cfg(doc)]
use common::DateTime;
use common::{define_kind, unit, DateTimeOf, Money};
use derive_more::{AsRef, Display, From, FromStr, Into};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::facet;

/// Classified ad of a business or a franchise for sale or rent.
#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct Listing {
    /// ID of this [`Listing`].
    pub id: Id,

    /// ID of the user owning this [`Listing`].
    pub owner: OwnerId,

    /// [`Status`] of this [`Listing`].
    pub status: Status,

    /// Title of this [`Listing`].
    pub title: String,

    /// Free-form description of this [`Listing`].
    #[serde(default)]
    pub description: String,

    /// Asked price of this [`Listing`], if specified.
    pub price: Option<Money>,

    /// [`Area`] of this [`Listing`], if specified.
    pub area: Option<Area>,

    /// Top-level category of this [`Listing`].
    pub category_id: Option<facet::Id>,

    /// Child category (sector) of this [`Listing`].
    pub subcategory_id: Option<facet::Id>,

    /// City this [`Listing`] is located in.
    pub city_id: Option<facet::Id>,

    /// Name of the district this [`Listing`] is located in.
    pub district: Option<String>,

    /// Boolean [`Feature`]s this [`Listing`] has.
    #[serde(default)]
    pub features: BTreeSet<Feature>,

    /// [`Image`]s of this [`Listing`].
    #[serde(default)]
    pub images: Vec<Image>,

    /// [`DateTime`] when this [`Listing`] was created.
    #[serde(with = "common::datetime::serde::rfc3339")]
    pub created_at: CreationDateTime,
}

impl Listing {
    /// Returns the URL of the primary [`Image`] of this [`Listing`], falling
    /// back to the first one.
    #[must_use]
    pub fn primary_image(&self) -> Option<&str> {
        Image::primary(&self.images)
    }

    /// Returns the facet [`facet::Id`] of the provided [`facet::Kind`] this
    /// [`Listing`] is filed under.
    ///
    /// Always [`None`] for [`facet::Kind::Price`], as price buckets are
    /// configurable.
    #[must_use]
    pub fn facet(&self, kind: facet::Kind) -> Option<facet::Id> {
        match kind {
            facet::Kind::Category => self.category_id,
            facet::Kind::Subcategory => self.subcategory_id,
            facet::Kind::City => self.city_id,
            facet::Kind::Status => Some(self.status.into()),
            facet::Kind::Price => None,
        }
    }
}

/// ID of a [`Listing`].
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
pub struct Id(Uuid);

impl Id {
    /// Creates a new random [`Id`].
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for Id {
    fn default() -> Self {
        Self::new()
    }
}

/// ID of a user owning a [`Listing`].
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
    PartialEq,
    Serialize,
)]
pub struct OwnerId(Uuid);

define_kind! {
    #[doc = "Publication status of a [`Listing`]."]
    #[serialize_all = "snake_case"]
    enum Status {
        #[doc = "Published and visible."]
        Active = 1,

        #[doc = "Awaiting moderation."]
        Pending = 2,

        #[doc = "Sold, kept for history."]
        Sold = 3,

        #[doc = "Hidden by its owner."]
        Inactive = 4,
    }
}

/// Area of a [`Listing`] in square meters.
#[derive(
    Clone,
    Copy,
    Debug,
    Deserialize,
    Display,
    Eq,
    From,
    Hash,
    Into,
    Ord,
    PartialEq,
    PartialOrd,
    Serialize,
)]
#[serde(transparent)]
pub struct Area(Decimal);

impl Area {
    /// Returns the amount of square meters.
    #[must_use]
    pub fn square_meters(self) -> Decimal {
        self.0
    }
}

/// Boolean tag of a [`Listing`] (e.g. `franchise`).
#[derive(
    AsRef,
    Clone,
    Debug,
    Deserialize,
    Display,
    Eq,
    Hash,
    Ord,
    PartialEq,
    PartialOrd,
    Serialize,
)]
#[as_ref(forward)]
#[serde(try_from = "String")]
pub struct Feature(String);

impl Feature {
    /// [`Feature`] marking a [`Listing`] as a franchise.
    pub const FRANCHISE: &'static str = "franchise";

    /// Creates a new [`Feature`] out of the given `tag`, lowercasing it.
    ///
    /// [`None`] is returned if the `tag` is too long, doesn't start with a
    /// letter or contains anything but ASCII letters, digits and `_`.
    #[must_use]
    pub fn new(tag: impl AsRef<str>) -> Option<Self> {
        let tag = tag.as_ref().trim().to_ascii_lowercase();
        let valid = tag.len() <= 64
            && tag.starts_with(|c: char| c.is_ascii_lowercase())
            && tag.chars().all(|c| {
                c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_'
            });
        valid.then_some(Self(tag))
    }

    /// Returns the [`Feature`] marking a [`Listing`] as a franchise.
    #[must_use]
    pub fn franchise() -> Self {
        Self(Self::FRANCHISE.to_owned())
    }
}

impl TryFrom<String> for Feature {
    type Error = &'static str;

    fn try_from(tag: String) -> Result<Self, Self::Error> {
        Self::new(tag).ok_or("invalid `Feature`")
    }
}

/// Image attached to a [`Listing`].
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct Image {
    /// URL of this [`Image`].
    pub url: String,

    /// Indicator whether this [`Image`] is the primary one.
    #[serde(default)]
    pub is_primary: bool,
}

impl Image {
    /// Picks the URL of the primary [`Image`] out of the provided ones,
    /// falling back to the first one.
    #[must_use]
    pub fn primary(images: &[Self]) -> Option<&str> {
        images
            .iter()
            .find(|i| i.is_primary)
            .or_else(|| images.first())
            .map(|i| i.url.as_str())
    }
}

/// Set of [`Listing`]s a browse page is allowed to show.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Scope {
    /// [`Status`]es of browsable [`Listing`]s.
    pub statuses: BTreeSet<Status>,

    /// Owner the [`Listing`]s must belong to, if restricted.
    pub owner: Option<OwnerId>,

    /// Indicator whether only franchise [`Listing`]s are browsable.
    pub franchise_only: bool,
}

impl Scope {
    /// [`Scope`] of the public listings page.
    #[must_use]
    pub fn listings(statuses: impl IntoIterator<Item = Status>) -> Self {
        Self {
            statuses: statuses.into_iter().collect(),
            owner: None,
            franchise_only: false,
        }
    }

    /// [`Scope`] of the franchise listings page.
    #[must_use]
    pub fn franchises(statuses: impl IntoIterator<Item = Status>) -> Self {
        Self {
            franchise_only: true,
            ..Self::listings(statuses)
        }
    }

    /// [`Scope`] of the profile page: every [`Listing`] of the `owner`,
    /// whatever its [`Status`].
    #[must_use]
    pub fn owned_by(owner: OwnerId) -> Self {
        Self {
            owner: Some(owner),
            ..Self::listings(Status::ALL.iter().copied())
        }
    }

    /// Narrows this [`Scope`] to the provided [`Status`]es only.
    #[must_use]
    pub fn with_statuses(
        mut self,
        statuses: impl IntoIterator<Item = Status>,
    ) -> Self {
        self.statuses = statuses.into_iter().collect();
        self
    }

    /// Checks whether the provided [`Listing`] is within this [`Scope`].
    #[must_use]
    pub fn contains(&self, listing: &Listing) -> bool {
        self.statuses.contains(&listing.status)
            && self.owner.map_or(true, |o| o == listing.owner)
            && (!self.franchise_only
                || listing.features.contains(&Feature::franchise()))
    }
}

impl Default for Scope {
    fn default() -> Self {
        Self::listings([Status::Active, Status::Pending])
    }
}

/// [`DateTime`] when a [`Listing`] was created.
pub type CreationDateTime = DateTimeOf<(Listing, unit::Creation)>;

#[cfg(test)]
mod spec {
    use super::{Feature, Image, Scope, Status};

    #[test]
    fn feature_is_normalized() {
        assert_eq!(Feature::new("  Franchise "), Some(Feature::franchise()));
        assert_eq!(Feature::new("   "), None);
        assert_eq!(
            Feature::new("Has_Parking2").map(|f| f.to_string()),
            Some("has_parking2".to_owned()),
        );
    }

    #[test]
    fn feature_is_a_plain_tag() {
        assert_eq!(Feature::new("has parking, or=(x)"), None);
        assert_eq!(Feature::new("is.true"), None);
        assert_eq!(Feature::new("2nd_floor"), None);
        assert_eq!(Feature::new("x".repeat(65)), None);
    }

    #[test]
    fn primary_image_falls_back_to_first() {
        let image = |url: &str, is_primary| Image {
            url: url.to_owned(),
            is_primary,
        };

        assert_eq!(
            Image::primary(&[image("a", false), image("b", true)]),
            Some("b"),
        );
        assert_eq!(Image::primary(&[image("a", false)]), Some("a"));
        assert_eq!(Image::primary(&[]), None);
    }

    #[test]
    fn default_scope_browses_active_and_pending() {
        let scope = Scope::default();

        assert!(scope.statuses.contains(&Status::Active));
        assert!(scope.statuses.contains(&Status::Pending));
        assert!(!scope.statuses.contains(&Status::Sold));
        assert!(!scope.franchise_only);
        assert!(scope.owner.is_none());
    }

    #[test]
    fn status_parses_snake_case() {
        assert_eq!("pending".parse::<Status>().unwrap(), Status::Pending);
        assert_eq!(Status::Inactive.to_string(), "inactive");
    }
}

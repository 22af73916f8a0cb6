//! [`Config`]-related definitions.

use std::{num::NonZeroU32, time};

use common::{money::Currency, pagination};
use config::{builder::DefaultState, ConfigBuilder, ConfigError};
use rust_decimal::Decimal;
use secrecy::SecretString;
use serde::Deserialize;
use service::{
    browse::{coordinator, render},
    domain::{facet::PriceBuckets, listing::Status},
};
use smart_default::SmartDefault;

/// Application configuration.
#[derive(Clone, Debug, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Backend configuration.
    pub backend: Backend,

    /// Browse page configuration.
    pub browse: Browse,

    /// Log configuration.
    pub log: Log,
}

impl Config {
    /// Creates a new [`Config`] by:
    /// - loading it from the provided `path` (if any);
    /// - merging it with the environment variables (if any);
    /// - using default values for missing fields.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration is invalid.
    pub fn new(path: impl AsRef<str>) -> Result<Self, ConfigError> {
        ConfigBuilder::<DefaultState>::default()
            .add_source(config::File::with_name(path.as_ref()).required(false))
            .add_source(
                config::Environment::with_prefix("CONF").separator("."),
            )
            .build()?
            .try_deserialize()
    }
}

/// REST backend configuration.
#[derive(Clone, Debug, Deserialize, SmartDefault)]
#[serde(default)]
pub struct Backend {
    /// Base URL of the REST API.
    #[default("http://127.0.0.1:3000".to_owned())]
    pub url: String,

    /// API key sent with every request.
    #[default(String::new().into())]
    pub api_key: SecretString,

    /// [`Currency`] of listing prices.
    #[default(Currency::Try)]
    pub currency: Currency,
}

/// Browse page configuration.
#[derive(Clone, Debug, Deserialize, SmartDefault)]
#[serde(default)]
pub struct Browse {
    /// Number of listings per page.
    #[default(NonZeroU32::MIN.saturating_add(11))]
    pub page_size: NonZeroU32,

    /// Number of leading page buttons shown before the ellipsis.
    #[default(pagination::DEFAULT_MAX_VISIBLE)]
    pub max_visible_pages: usize,

    /// Maximum duration of a single backend call.
    #[default(time::Duration::from_secs(10))]
    #[serde(with = "humantime_serde")]
    pub timeout: time::Duration,

    /// [`Status`]es of publicly browsable listings.
    #[default(vec![Status::Active, Status::Pending])]
    pub statuses: Vec<Status>,

    /// Image shown for listings having none.
    #[default("/images/placeholder.svg".to_owned())]
    pub placeholder_image: String,

    /// Path of the listing details page.
    #[default("/listing".to_owned())]
    pub detail_path: String,

    /// Inner edges of the price facet buckets, empty to hide the facet.
    #[default(
        [500_000, 1_000_000, 2_000_000, 5_000_000].map(Decimal::from).into()
    )]
    pub price_buckets: Vec<Decimal>,
}

impl Browse {
    /// Returns the [`coordinator::Config`] described by this [`Browse`],
    /// labeling prices in the provided [`Currency`].
    #[must_use]
    pub fn coordinator(&self, currency: Currency) -> coordinator::Config {
        coordinator::Config {
            page_size: pagination::Size::new(self.page_size.get())
                .unwrap_or_default(),
            max_visible_pages: self.max_visible_pages,
            price_buckets: PriceBuckets::new(
                self.price_buckets.iter().copied(),
                currency,
            ),
        }
    }

    /// Returns the [`render::Renderer`] described by this [`Browse`].
    #[must_use]
    pub fn renderer(&self, relative_dates: bool) -> render::Renderer {
        render::Renderer {
            date_style: if relative_dates {
                render::DateStyle::Relative
            } else {
                render::DateStyle::Absolute
            },
            placeholder_image: self.placeholder_image.clone(),
            detail_path: self.detail_path.clone(),
        }
    }
}

impl From<&Browse> for service::Config {
    fn from(value: &Browse) -> Self {
        Self {
            timeout: value.timeout,
        }
    }
}

/// Log configuration.
#[derive(Clone, Copy, Debug, Default, Deserialize)]
#[serde(default)]
pub struct Log {
    /// Log level.
    pub level: LogLevel,
}

/// Log level.
#[derive(Clone, Copy, Debug, Default, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum LogLevel {
    /// Designates very low priority, often extremely verbose, information.
    Trace,

    /// Designates lower priority information.
    Debug,

    /// Designates useful information.
    #[default]
    Info,

    /// Designates hazardous situations.
    Warn,

    /// Designates very serious errors.
    Error,
}

impl From<LogLevel> for tracing::Level {
    fn from(value: LogLevel) -> Self {
        match value {
            LogLevel::Trace => Self::TRACE,
            LogLevel::Debug => Self::DEBUG,
            LogLevel::Info => Self::INFO,
            LogLevel::Warn => Self::WARN,
            LogLevel::Error => Self::ERROR,
        }
    }
}

#[cfg(test)]
mod spec {
    use std::time::Duration;

    use common::money::Currency;
    use service::{
        browse::render::DateStyle,
        domain::{facet::PriceBuckets, listing::Status},
    };

    use super::Config;

    #[test]
    fn defaults_without_file() {
        let config = Config::new("surely-missing-config").unwrap();

        assert_eq!(config.browse.page_size.get(), 12);
        assert_eq!(config.browse.max_visible_pages, 5);
        assert_eq!(config.browse.timeout, Duration::from_secs(10));
        assert_eq!(
            config.browse.statuses,
            [Status::Active, Status::Pending],
        );
        let coordinator = config.browse.coordinator(config.backend.currency);
        assert_eq!(coordinator.page_size.get(), 12);
        assert_eq!(coordinator.price_buckets, PriceBuckets::default());
        assert_eq!(
            config.browse.renderer(true).date_style,
            DateStyle::Relative,
        );
    }

    #[test]
    fn empty_price_buckets_hide_facet() {
        let browse = super::Browse {
            price_buckets: Vec::new(),
            ..super::Browse::default()
        };

        let coordinator = browse.coordinator(Currency::Usd);

        assert!(coordinator.price_buckets.is_empty());
    }
}

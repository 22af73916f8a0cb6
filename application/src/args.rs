//! [`Args`] definitions.

use std::str::FromStr;

use clap::Parser;
use derive_more::{Display, Error};
use service::domain::listing::{OwnerId, Scope, Status};

/// Browser of business and franchise listings.
#[derive(Debug, Parser)]
#[command(version, about, long_about = None)]
pub struct Args {
    /// Path to the configuration file.
    #[arg(short, long, default_value = "config.toml")]
    pub config: String,

    /// Path to a JSON dataset to browse instead of the configured backend.
    #[arg(long)]
    pub fixture: Option<String>,

    /// Listings to browse: `all`, `franchise` or `owner:<uuid>`.
    #[arg(short, long, default_value = "all")]
    pub scope: ScopeArg,

    /// Filter parameter (e.g. `category=3` or `min_price=100000`).
    #[arg(short, long = "filter", value_name = "KEY=VALUE")]
    #[arg(value_parser = parse_param)]
    pub filters: Vec<(String, String)>,

    /// Show how long ago listings were created instead of the date.
    #[arg(long)]
    pub relative_dates: bool,

    /// Narrow the shown subcategories (or categories, if none is selected)
    /// to the ones with a matching label.
    #[arg(long, value_name = "TEXT")]
    pub find: Option<String>,
}

impl Args {
    /// Parses command line arguments.
    ///
    /// # Errors
    ///
    /// Errors if failed to parse command line arguments.
    pub fn parse() -> Result<Self, clap::Error> {
        <Self as Parser>::try_parse()
    }
}

/// Parses a `KEY=VALUE` filter parameter.
fn parse_param(raw: &str) -> Result<(String, String), String> {
    raw.split_once('=')
        .map(|(k, v)| (k.trim().to_owned(), v.to_owned()))
        .ok_or_else(|| format!("expected `KEY=VALUE`, got `{raw}`"))
}

/// Browsable listings selected on the command line.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ScopeArg {
    /// Every public listing.
    All,

    /// Public franchise listings only.
    Franchise,

    /// Every listing of the owner, whatever its status.
    Owner(OwnerId),
}

impl ScopeArg {
    /// Converts this [`ScopeArg`] into a [`Scope`], browsing public listings
    /// of the provided [`Status`]es.
    #[must_use]
    pub fn into_scope(
        self,
        statuses: impl IntoIterator<Item = Status>,
    ) -> Scope {
        match self {
            Self::All => Scope::listings(statuses),
            Self::Franchise => Scope::franchises(statuses),
            Self::Owner(id) => Scope::owned_by(id),
        }
    }
}

/// Error of parsing a [`ScopeArg`].
#[derive(Debug, Display, Error)]
#[display("expected `all`, `franchise` or `owner:<uuid>`")]
pub struct ScopeParseError;

impl FromStr for ScopeArg {
    type Err = ScopeParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "all" => Ok(Self::All),
            "franchise" => Ok(Self::Franchise),
            other => other
                .strip_prefix("owner:")
                .and_then(|id| id.parse().ok())
                .map(Self::Owner)
                .ok_or(ScopeParseError),
        }
    }
}

#[cfg(test)]
mod spec {
    use clap::Parser as _;
    use service::domain::listing::Status;

    use super::{parse_param, Args, ScopeArg};

    #[test]
    fn parses_filters() {
        let args = Args::try_parse_from([
            "browse",
            "-f",
            "category=3",
            "--filter",
            "search=corner cafe",
            "--scope",
            "franchise",
        ])
        .unwrap();

        assert_eq!(
            args.filters,
            [
                ("category".to_owned(), "3".to_owned()),
                ("search".to_owned(), "corner cafe".to_owned()),
            ],
        );
        assert_eq!(args.scope, ScopeArg::Franchise);
        assert!(!args.relative_dates);
        assert!(parse_param("category").is_err());
    }

    #[test]
    fn parses_scope() {
        let owner = "owner:20000000-0000-0000-0000-000000000000"
            .parse::<ScopeArg>()
            .unwrap();
        let scope = owner.into_scope([Status::Active]);

        assert!(scope.owner.is_some());
        assert_eq!(scope.statuses.len(), Status::ALL.len());
        assert!("owner:nobody".parse::<ScopeArg>().is_err());
        assert!("everything".parse::<ScopeArg>().is_err());
    }
}

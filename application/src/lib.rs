//! Application drives the browse page of listings from the command line.

#![deny(
    nonstandard_style,
    rust_2018_idioms,
    rustdoc::all,
    trivial_casts,
    trivial_numeric_casts,
    unsafe_code
)]
#![forbid(non_ascii_idents)]
#![warn(
    clippy::allow_attributes,
    clippy::allow_attributes_without_reason,
    clippy::pedantic,
    clippy::wildcard_enum_match_arm,
    deprecated_in_future,
    missing_copy_implementations,
    missing_debug_implementations,
    missing_docs,
    unreachable_pub,
    unused_crate_dependencies,
    unused_import_braces,
    unused_labels,
    unused_lifetimes,
    unused_qualifications,
    unused_results
)]

pub mod args;
pub mod config;
pub mod view;

use std::io;

use service::{
    browse::coordinator::Queries,
    domain::{facet::Kind, listing::Scope},
    Coordinator,
};
use tracing as log;
// Used in binary.
use tokio as _;
use tracing_subscriber as _;

pub use self::{args::Args, config::Config, view::Terminal};

/// Browse session requested on the command line.
#[derive(Clone, Debug)]
pub struct Session {
    /// Listings to browse.
    pub scope: Scope,

    /// Textual filter parameters to open the browse page with.
    pub params: Vec<(String, String)>,

    /// Indicator whether to show relative creation dates.
    pub relative_dates: bool,

    /// Text to search facet options for, once the page is loaded.
    pub find: Option<String>,
}

/// Opens a browse page over the provided `service` and waits for it to
/// settle, printing everything into the provided output.
pub async fn browse<S, W>(
    service: S,
    out: W,
    config: &Config,
    session: Session,
) -> Coordinator<S, Terminal<W>>
where
    S: Queries,
    W: io::Write,
{
    let Session {
        scope,
        params,
        relative_dates,
        find,
    } = session;

    let Config {
        backend, browse, ..
    } = config;
    let mut coordinator = Coordinator::new(
        service,
        Terminal::new(out),
        scope,
        browse.coordinator(backend.currency),
        browse.renderer(relative_dates),
    );
    coordinator.open(params.iter().map(|(k, v)| (k.as_str(), v.as_str())));
    coordinator.settle().await;
    log::debug!("browse page settled: {:?}", coordinator.filter());

    if let Some(needle) = find {
        let kind = if coordinator.filter().single_category().is_some() {
            Kind::Subcategory
        } else {
            Kind::Category
        };
        let found = coordinator
            .facets()
            .search(kind, &needle)
            .cloned()
            .collect::<Vec<_>>();
        coordinator.view_mut().matches(kind, &needle, &found);
    }

    coordinator
}

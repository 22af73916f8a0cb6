//! Domain definitions.

pub mod facet;
pub mod listing;

pub use self::{facet::FacetOption, listing::Listing};

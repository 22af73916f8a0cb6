//! Browse page of listings.

pub mod coordinator;
pub mod description;
pub mod facets;
pub mod filter;
pub mod render;

pub use self::{
    coordinator::{Coordinator, Event, Notice, State, View},
    description::Description,
    filter::{Filter, Patch, SortKey, ValidationError},
    render::{Fragment, Renderer},
};

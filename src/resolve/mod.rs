//! Reverse resolution pipeline.
//!
//! Candidates from the spatial index go through the suitability filter, the
//! winner's address hierarchy is climbed and cut to the requested zoom, and
//! names and geometry are attached to the resulting [`PlaceResult`](crate::models::PlaceResult).

pub mod address;
pub mod filter;
pub mod hierarchy;
pub mod locale;
pub mod request;
pub mod service;
pub mod simplify;
pub mod zoom;

pub use address::{assemble, AssembledAddress};
pub use filter::SuitabilityFilter;
pub use hierarchy::{build_chain, AdminHierarchyChain, ChainCache, ChainEntry, HierarchyResolver};
pub use locale::{parse_accept_language, resolve_name};
pub use request::ReverseRequest;
pub use service::ReverseGeocoder;
pub use simplify::simplify;
pub use zoom::{ZoomTable, MAX_ZOOM};

//! Connectivity layer: access strategies and the resolver that tries them
//! in order until the target page is reachable.

mod resolver;
mod strategy;

pub use resolver::{
    probe_page, resolve, PageState, Reachable, ResolverConfig, PASSWORD_SELECTORS,
    SIGNED_IN_MARKERS,
};
pub use strategy::AccessStrategy;

//! Core traits for resolution and cleanup.

mod close;
mod resolver;

pub use close::Close;
pub use resolver::{Resolver, ResolverCore};

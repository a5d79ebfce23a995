//! Provider capability used uniformly by races and chains.
//!
//! # Example Implementation
//!
//! ```rust
//! use hedge_core::{DeadlineScope, FetchFuture, Provider, ProviderId};
//!
//! struct Echo;
//!
//! impl Provider<String, String> for Echo {
//!     fn id(&self) -> ProviderId {
//!         ProviderId::new("echo")
//!     }
//!
//!     fn fetch<'a>(&'a self, key: &'a String, scope: &'a DeadlineScope) -> FetchFuture<'a, String> {
//!         Box::pin(async move { Ok(scope.run(async { key.clone() }).await?) })
//!     }
//! }
//! ```

use std::future::Future;
use std::pin::Pin;

use crate::deadline::DeadlineScope;
use crate::outcome::Outcome;
use crate::source::ProviderId;

/// Boxed future returned by [`Provider::fetch`].
pub type FetchFuture<'a, V> = Pin<Box<dyn Future<Output = Outcome<V>> + Send + 'a>>;

/// Fetches equivalent data from one specific upstream source.
///
/// Implementations must:
///
/// - run inside the supplied scope and return promptly once it expires
///   (typically by wrapping I/O in [`DeadlineScope::run`]);
/// - produce exactly one outcome per call and never retry internally;
/// - perform no side effects when they fail.
///
/// Adapters know nothing about each other, so any set of them can be raced.
pub trait Provider<K, V>: Send + Sync {
    /// Returns the unique provider identifier.
    fn id(&self) -> ProviderId;

    /// Fetches the value for `key` within `scope`.
    fn fetch<'a>(&'a self, key: &'a K, scope: &'a DeadlineScope) -> FetchFuture<'a, V>;
}

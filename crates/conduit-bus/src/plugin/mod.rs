//! Built-in bus plugins.
//!
//! Plugins are listener bundles attached with `utilize` and removed with
//! `deactivate`. Each built-in plugin tracks its own listener handles, so
//! deactivating one never touches listeners attached by anyone else.
//!
//! - [`HandleCommandStrategy`] / [`FinderInvokeStrategy`]: invoke handler
//!   objects by method-naming convention
//! - [`HandlerLocatorPlugin`]: resolve handler tokens through a
//!   [`HandlerLocator`]
//!
//! ```rust,ignore
//! let finder = FinderInvokeStrategy::new();
//! query_bus.utilize(&finder);
//! // ...
//! query_bus.deactivate(&finder);
//! ```

pub mod locator;
pub mod strategy;

pub use locator::{HandlerLocator, HandlerLocatorPlugin, InMemoryLocator};
pub use strategy::{FinderInvokeStrategy, HandleCommandStrategy, short_name};

//! Procedural macros for the Conduit message bus.
//!
//! This crate provides:
//!
//! - `#[derive(MessageName)]` - Implements `HasMessageName` so a bus routes the
//!   message by name instead of by Rust type
//!
//! # MessageName Derive Macro
//!
//! ```rust,ignore
//! use conduit_core::{Envelope, HasMessageName};
//! use conduit_macros::MessageName;
//!
//! // Explicit routing name
//! #[derive(MessageName)]
//! #[message(name = "fetch-something")]
//! pub struct FetchSomething {
//!     pub filter: String,
//! }
//!
//! // Default routing name: `my_app::commands::RegisterUser`
//! #[derive(MessageName)]
//! pub struct RegisterUser {
//!     pub id: u64,
//! }
//!
//! let envelope = Envelope::named(FetchSomething { filter: "todo".into() });
//! assert_eq!(envelope.name(), Some("fetch-something"));
//! ```

mod message;

use proc_macro::TokenStream;
use syn::{DeriveInput, parse_macro_input};

/// Derives `conduit_core::HasMessageName` for structs and enums.
///
/// # Attributes
///
/// - `#[message(name = "...")]` - Set the routing name (default: module path
///   followed by the type name)
#[proc_macro_derive(MessageName, attributes(message))]
pub fn derive_message_name(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);

    match message::derive_message_name(&input) {
        Ok(tokens) => tokens.into(),
        Err(err) => err.to_compile_error().into(),
    }
}

//! `#[derive(MessageName)]` implementation.
//!
//! Generates `impl ::conduit_core::HasMessageName`.
//!
//! # Type-level attribute `#[message(...)]`
//!
//! | Key | Example | Required | Description |
//! |-----|---------|----------|-------------|
//! | `name` | `"fetch-something"` | No | Routing name (default: `module_path!()::TypeName`) |

use proc_macro2::TokenStream;
use quote::quote;
use syn::{Attribute, Data, DeriveInput, LitStr, spanned::Spanned};

// ============================================================================
// Entry point
// ============================================================================

pub fn derive_message_name(input: &DeriveInput) -> syn::Result<TokenStream> {
    if let Data::Union(_) = input.data {
        return Err(syn::Error::new(
            input.span(),
            "MessageName cannot be derived for unions",
        ));
    }

    let ident = &input.ident;
    let name = match parse_name(&input.attrs)? {
        Some(name) => quote! { #name },
        None => quote! { concat!(module_path!(), "::", stringify!(#ident)) },
    };

    let (impl_generics, ty_generics, where_clause) = input.generics.split_for_impl();

    Ok(quote! {
        impl #impl_generics ::conduit_core::HasMessageName for #ident #ty_generics #where_clause {
            fn message_name(&self) -> &str {
                #name
            }
        }
    })
}

// ============================================================================
// Attribute parsing
// ============================================================================

fn parse_name(attrs: &[Attribute]) -> syn::Result<Option<LitStr>> {
    let mut name: Option<LitStr> = None;

    for attr in attrs.iter().filter(|attr| attr.path().is_ident("message")) {
        attr.parse_nested_meta(|meta| {
            if meta.path.is_ident("name") {
                let value: LitStr = meta.value()?.parse()?;
                if value.value().trim().is_empty() {
                    return Err(syn::Error::new(value.span(), "message name must not be empty"));
                }
                name = Some(value);
                Ok(())
            } else {
                Err(meta.error("unsupported message attribute, expected `name = \"…\"`"))
            }
        })?;
    }

    Ok(name)
}

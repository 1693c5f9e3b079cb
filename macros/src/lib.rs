//! Derive macros for Statekit
//!
//! # Available Macros
//!
//! - `#[derive(Action)]` - Generates a stable kind discriminator for action enums
//!
//! # Example
//!
//! ```ignore
//! use statekit_macros::Action;
//!
//! #[derive(Action, Clone, Debug)]
//! enum TodoAction {
//!     AddTodo { text: String },
//!     #[action(kind = "REMOVE")]
//!     DeleteTodo(u64),
//!     ClearTodos,
//! }
//!
//! assert_eq!(TodoAction::ClearTodos.kind(), "CLEAR_TODOS");
//! assert_eq!(TodoAction::DeleteTodo(1).kind(), "REMOVE");
//! assert_eq!(TodoAction::KINDS, &["ADD_TODO", "REMOVE", "CLEAR_TODOS"]);
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

use proc_macro::TokenStream;
use quote::quote;
use syn::{Attribute, Data, DeriveInput, Fields, LitStr, parse_macro_input};

/// Derive macro for Action enums
///
/// Generates, on the enum itself:
/// - `kind()` - The variant's kind tag as a `&'static str`
/// - `KINDS` - Every kind tag, in declaration order
///
/// The tag defaults to the variant name in `SCREAMING_SNAKE_CASE`
/// (`AddTodo` → `ADD_TODO`), spelled the way serde's
/// `rename_all = "SCREAMING_SNAKE_CASE"` spells it, and can be overridden per
/// variant with `#[action(kind = "...")]`.
///
/// # Errors
///
/// Produces a compile error if:
/// - Applied to a non-enum type
/// - An `#[action(...)]` attribute is malformed
/// - Two variants resolve to the same kind
#[proc_macro_derive(Action, attributes(action))]
pub fn derive_action(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);
    let name = &input.ident;

    let Data::Enum(data_enum) = &input.data else {
        return syn::Error::new_spanned(input, "#[derive(Action)] can only be used on enums")
            .to_compile_error()
            .into();
    };

    let mut kinds: Vec<String> = Vec::with_capacity(data_enum.variants.len());
    let mut arms = Vec::with_capacity(data_enum.variants.len());

    for variant in &data_enum.variants {
        let variant_name = &variant.ident;

        let kind = match kind_override(&variant.attrs) {
            Ok(Some(kind)) => kind,
            Ok(None) => screaming_snake(&variant_name.to_string()),
            Err(error) => return error.to_compile_error().into(),
        };

        if kinds.contains(&kind) {
            return syn::Error::new_spanned(
                variant,
                format!("duplicate action kind `{kind}`"),
            )
            .to_compile_error()
            .into();
        }

        let pattern = match &variant.fields {
            Fields::Named(_) => quote! { Self::#variant_name { .. } },
            Fields::Unnamed(_) => quote! { Self::#variant_name(..) },
            Fields::Unit => quote! { Self::#variant_name },
        };
        arms.push(quote! { #pattern => #kind, });
        kinds.push(kind);
    }

    let (impl_generics, ty_generics, where_clause) = input.generics.split_for_impl();

    let expanded = quote! {
        impl #impl_generics #name #ty_generics #where_clause {
            /// Every kind tag this action type recognises, in declaration order
            pub const KINDS: &'static [&'static str] = &[#(#kinds),*];

            /// Returns the kind tag of this action
            #[must_use]
            pub const fn kind(&self) -> &'static str {
                match self {
                    #(#arms)*
                }
            }
        }
    };

    TokenStream::from(expanded)
}

/// Reads `#[action(kind = "...")]` if present
fn kind_override(attrs: &[Attribute]) -> syn::Result<Option<String>> {
    let mut kind = None;
    for attr in attrs.iter().filter(|attr| attr.path().is_ident("action")) {
        attr.parse_nested_meta(|meta| {
            if meta.path.is_ident("kind") {
                let value: LitStr = meta.value()?.parse()?;
                kind = Some(value.value());
                Ok(())
            } else {
                Err(meta.error("unsupported action attribute, expected `kind`"))
            }
        })?;
    }
    Ok(kind)
}

/// `AddTodo` → `ADD_TODO`
///
/// Every uppercase letter after the first starts a new word, as in serde, so
/// `HTTPRequest` becomes `H_T_T_P_REQUEST`.
fn screaming_snake(ident: &str) -> String {
    let mut out = String::with_capacity(ident.len() + 4);
    for (i, ch) in ident.char_indices() {
        if i > 0 && ch.is_uppercase() {
            out.push('_');
        }
        out.extend(ch.to_uppercase());
    }
    out
}

//! Derive macro for wirebox
//!
//! `#[derive(Autowire)]` generates the constructor descriptor table
//! (`wirebox::Constructible`) the container reads when autowiring a type:
//! one parameter per field, named after the field, in declaration order.
//!
//! # Example
//!
//! ```rust,ignore
//! use wirebox::{Autowire, Container};
//! use std::sync::Arc;
//!
//! trait Mailer: Send + Sync {}
//!
//! #[derive(Autowire)]
//! struct Config {
//!     #[autowire(default = "localhost".to_string())]
//!     host: String,
//! }
//!
//! #[derive(Autowire)]
//! struct SignupService {
//!     // resolved through the `Config` class identifier
//!     config: Arc<Config>,
//!     // resolved through the `dyn Mailer` identifier
//!     mailer: Arc<dyn Mailer>,
//!     // bound from an entry named `retries`, else 3
//!     #[autowire(default = 3)]
//!     retries: u32,
//!     // not a parameter
//!     #[autowire(skip)]
//!     sent: std::sync::atomic::AtomicU64,
//! }
//! ```

use proc_macro::TokenStream;
use proc_macro2::TokenStream as TokenStream2;
use quote::quote;
use syn::{Attribute, Data, DeriveInput, Expr, Fields, Type, parse_macro_input};

/// Derive `wirebox::Constructible` for a struct.
///
/// # Attributes
///
/// - `#[autowire(default)]` - Optional parameter, defaulting to `Default::default()`.
/// - `#[autowire(default = expr)]` - Optional parameter, defaulting to `expr`.
/// - `#[autowire(skip)]` - Not a parameter; the field is set to `Default::default()`.
///
/// # Field Types
///
/// - `Arc<T>` - Declared as `T`; receives the shared instance.
/// - `Arc<dyn Trait>` - Declared as `dyn Trait`; the entry must hold an `Arc<dyn Trait>`.
/// - anything else - Declared as its own type; receives a clone. Primitives,
///   strings, `Duration`, `PathBuf` and `Option`/`Vec` of those have no
///   declared type and bind by name.
#[proc_macro_derive(Autowire, attributes(autowire))]
pub fn derive_autowire(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);

    match expand(&input) {
        Ok(tokens) => tokens.into(),
        Err(err) => err.to_compile_error().into(),
    }
}

fn expand(input: &DeriveInput) -> syn::Result<TokenStream2> {
    let name = &input.ident;
    let (impl_generics, ty_generics, where_clause) = input.generics.split_for_impl();

    // Only structs with named fields, or unit structs
    let fields = match &input.data {
        Data::Struct(data) => match &data.fields {
            Fields::Named(fields) => fields.named.iter().collect::<Vec<_>>(),
            Fields::Unit => Vec::new(),
            Fields::Unnamed(_) => {
                return Err(syn::Error::new_spanned(
                    input,
                    "Autowire parameters are named after fields; tuple structs are not supported",
                ));
            }
        },
        _ => {
            return Err(syn::Error::new_spanned(
                input,
                "Autowire can only be derived for structs",
            ));
        }
    };

    let mut parameters = Vec::new();
    let mut field_inits = Vec::new();
    let mut index = 0usize;

    for field in fields {
        let Some(field_name) = field.ident.as_ref() else {
            continue;
        };
        let field_type = &field.ty;
        let param_name = field_name.to_string();

        let attr = parse_autowire_attr(&field.attrs)?;
        if let FieldAttr::Skip = attr {
            field_inits.push(quote! {
                #field_name: ::std::default::Default::default()
            });
            continue;
        }

        let kind = FieldKind::of(field_type);

        let declared = match kind {
            FieldKind::Shared(inner) | FieldKind::SharedDyn(inner) => inner,
            FieldKind::Owned => field_type,
        };
        let mut parameter = quote! {
            ::wirebox::Parameter::typed::<#declared>(#param_name)
        };

        if let FieldAttr::Default(expr) = &attr {
            let expr = match expr {
                Some(expr) => quote! { #expr },
                None => quote! { <#field_type as ::std::default::Default>::default() },
            };
            let wrap = match kind {
                FieldKind::Shared(inner) => quote! { ::wirebox::Value::from_arc::<#inner>(value) },
                FieldKind::SharedDyn(_) | FieldKind::Owned => {
                    quote! { ::wirebox::Value::new::<#field_type>(value) }
                }
            };
            parameter = quote! {
                #parameter.with_default_value({
                    let value: #field_type = #expr;
                    #wrap
                })
            };
        }

        parameters.push(parameter);

        field_inits.push(match kind {
            FieldKind::Shared(inner) => quote! {
                #field_name: args.shared::<#inner>(#index)?
            },
            FieldKind::SharedDyn(_) | FieldKind::Owned => quote! {
                #field_name: args.cloned::<#field_type>(#index)?
            },
        });
        index += 1;
    }

    let args_ident = if index == 0 {
        quote! { _args }
    } else {
        quote! { args }
    };

    Ok(quote! {
        impl #impl_generics ::wirebox::Constructible for #name #ty_generics #where_clause {
            fn parameters() -> ::std::vec::Vec<::wirebox::Parameter> {
                ::std::vec![#(#parameters),*]
            }

            fn construct(#args_ident: &::wirebox::Arguments) -> ::wirebox::Result<Self> {
                ::std::result::Result::Ok(Self {
                    #(#field_inits),*
                })
            }
        }
    })
}

/// Parsed #[autowire] attribute
enum FieldAttr {
    Inject,
    Default(Option<Expr>),
    Skip,
}

/// Find and parse the #[autowire] attribute
fn parse_autowire_attr(attrs: &[Attribute]) -> syn::Result<FieldAttr> {
    let mut result = FieldAttr::Inject;

    for attr in attrs {
        if !attr.path().is_ident("autowire") {
            continue;
        }

        attr.parse_nested_meta(|meta| {
            if meta.path.is_ident("skip") {
                result = FieldAttr::Skip;
                Ok(())
            } else if meta.path.is_ident("default") {
                // default = expr, or bare default
                if meta.input.peek(syn::Token![=]) {
                    let expr: Expr = meta.value()?.parse()?;
                    result = FieldAttr::Default(Some(expr));
                } else {
                    result = FieldAttr::Default(None);
                }
                Ok(())
            } else {
                Err(meta.error("expected `default`, `default = ...` or `skip`"))
            }
        })?;
    }

    Ok(result)
}

/// How a field receives its argument
#[derive(Clone, Copy)]
enum FieldKind<'a> {
    /// `Arc<T>`
    Shared(&'a Type),
    /// `Arc<dyn Trait>`
    SharedDyn(&'a Type),
    Owned,
}

impl<'a> FieldKind<'a> {
    fn of(ty: &'a Type) -> Self {
        match extract_arc_inner_type(ty) {
            Some(inner) if matches!(inner, Type::TraitObject(_)) => FieldKind::SharedDyn(inner),
            Some(inner) => FieldKind::Shared(inner),
            None => FieldKind::Owned,
        }
    }
}

/// Extract T from Arc<T>
fn extract_arc_inner_type(ty: &Type) -> Option<&Type> {
    if let Type::Path(type_path) = ty {
        let segment = type_path.path.segments.last()?;
        if segment.ident == "Arc" {
            if let syn::PathArguments::AngleBracketed(args) = &segment.arguments {
                if let Some(syn::GenericArgument::Type(inner)) = args.args.first() {
                    return Some(inner);
                }
            }
        }
    }
    None
}

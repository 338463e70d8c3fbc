//! `Injectable` derive macro.

use darling::FromMeta;
use proc_macro::TokenStream;
use proc_macro2::TokenStream as TokenStream2;
use quote::quote;
use syn::{Data, DeriveInput, Field, Fields, Index, Member, Meta, parse_macro_input};

/// Arguments of a field's `#[inject(...)]` attribute.
#[derive(Debug, Default, FromMeta)]
struct InjectArgs {
    #[darling(default)]
    labels: Option<String>,
    #[darling(default)]
    embed: bool,
}

pub fn derive_injectable(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);
    match expand(&input) {
        Ok(tokens) => tokens.into(),
        Err(err) => err.to_compile_error().into(),
    }
}

fn expand(input: &DeriveInput) -> syn::Result<TokenStream2> {
    let name = &input.ident;

    let Data::Struct(data) = &input.data else {
        return Err(syn::Error::new_spanned(input, "Injectable can only be derived for structs"));
    };

    let members: Vec<(Member, &Field)> = match &data.fields {
        Fields::Named(fields) => fields
            .named
            .iter()
            .filter_map(|f| f.ident.clone().map(|ident| (Member::Named(ident), f)))
            .collect(),
        Fields::Unnamed(fields) => fields
            .unnamed
            .iter()
            .enumerate()
            .map(|(i, f)| (Member::Unnamed(Index::from(i)), f))
            .collect(),
        Fields::Unit => Vec::new(),
    };

    let mut points = Vec::new();
    for (member, field) in &members {
        let Some(args) = inject_args(field)? else {
            continue;
        };
        let field_name = match member {
            Member::Named(ident) => ident.to_string(),
            Member::Unnamed(index) => index.index.to_string(),
        };

        if args.embed {
            if args.labels.is_some() {
                return Err(syn::Error::new_spanned(
                    field,
                    "#[inject(embed)] fields take their labels from their own fields",
                ));
            }
            points.push(quote! {
                points.embed(#field_name, |this| &this.#member);
            });
        } else {
            let labels = args.labels.unwrap_or_default();
            points.push(quote! {
                points.field(#field_name, #labels, |this| &this.#member);
            });
        }
    }

    let (impl_generics, ty_generics, where_clause) = input.generics.split_for_impl();
    let body = if points.is_empty() {
        quote! {}
    } else {
        quote! {
            fn injection_points(points: &mut ::refwire::InjectionPoints<Self>) {
                #(#points)*
            }
        }
    };

    Ok(quote! {
        impl #impl_generics ::refwire::Injectable for #name #ty_generics #where_clause {
            #body
        }
    })
}

/// Parses the field's `#[inject]` attribute, if it has one.
fn inject_args(field: &Field) -> syn::Result<Option<InjectArgs>> {
    let mut found = None;
    for attr in field.attrs.iter().filter(|a| a.path().is_ident("inject")) {
        if found.is_some() {
            return Err(syn::Error::new_spanned(attr, "duplicate #[inject] attribute"));
        }
        let args = match &attr.meta {
            Meta::Path(_) => InjectArgs::default(),
            Meta::List(_) => InjectArgs::from_meta(&attr.meta)
                .map_err(|err| syn::Error::new_spanned(attr, err.to_string()))?,
            Meta::NameValue(_) => {
                return Err(syn::Error::new_spanned(
                    attr,
                    "expected #[inject], #[inject(labels = \"...\")] or #[inject(embed)]",
                ));
            }
        };
        found = Some(args);
    }
    Ok(found)
}

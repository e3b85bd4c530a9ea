//! `#[derive(Configurable)]` implementation.
//!
//! The expansion implements `Configurable` by handing every field to the
//! visitor along with a static `FieldDescriptor`, and `ConfigField` so the
//! record can be nested in other records.

use proc_macro2::TokenStream;
use quote::quote;
use syn::{ext::IdentExt, Data, DeriveInput, Fields, Index, Member};

use crate::parse::{reject_attrs, FieldAttrs};

/// Expands `#[derive(Configurable)]`.
pub fn expand_derive(input: TokenStream) -> syn::Result<TokenStream> {
    let input: DeriveInput = syn::parse2(input)?;
    reject_attrs(&input.attrs)?;

    let fields = match &input.data {
        Data::Struct(data) => &data.fields,
        Data::Enum(data) => {
            return Err(syn::Error::new(
                data.enum_token.span,
                "Configurable can only be derived for structs",
            ))
        }
        Data::Union(data) => {
            return Err(syn::Error::new(
                data.union_token.span,
                "Configurable can only be derived for structs",
            ))
        }
    };

    let visits = generate_visits(fields)?;
    let ident = &input.ident;

    let mut generics = input.generics.clone();
    if generics.type_params().next().is_some() {
        let where_clause = generics.make_where_clause();
        for field in fields {
            if !FieldAttrs::from_attrs(&field.attrs)?.skip {
                let ty = &field.ty;
                where_clause
                    .predicates
                    .push(syn::parse_quote!(#ty: ::keystone::ConfigField));
            }
        }
    }
    let (impl_generics, ty_generics, where_clause) = generics.split_for_impl();

    Ok(quote! {
        impl #impl_generics ::keystone::Configurable for #ident #ty_generics #where_clause {
            #[allow(unused_variables)]
            fn visit<'__keystone>(
                &'__keystone mut self,
                visitor: &mut dyn ::keystone::Visitor<'__keystone>,
            ) {
                #(#visits)*
            }
        }

        impl #impl_generics ::keystone::ConfigField for #ident #ty_generics #where_clause {
            fn accept<'__keystone>(
                &'__keystone mut self,
                field: &'static ::keystone::FieldDescriptor,
                visitor: &mut dyn ::keystone::Visitor<'__keystone>,
            ) {
                visitor.nested(field, self);
            }
        }
    })
}

/// Generates one descriptor and `accept` call per field, skipping `#[config(skip)]`.
fn generate_visits(fields: &Fields) -> syn::Result<Vec<TokenStream>> {
    let mut visits = Vec::with_capacity(fields.len());

    for (index, field) in fields.iter().enumerate() {
        let attrs = FieldAttrs::from_attrs(&field.attrs)?;
        if attrs.skip {
            continue;
        }

        let (member, name) = match &field.ident {
            Some(ident) => (Member::Named(ident.clone()), ident.unraw().to_string()),
            None => (Member::Unnamed(Index::from(index)), index.to_string()),
        };
        let keys = attrs.annotations.iter().map(|(key, _)| key);
        let values = attrs.annotations.iter().map(|(_, value)| value);

        visits.push(quote! {
            {
                static FIELD: ::keystone::FieldDescriptor =
                    ::keystone::FieldDescriptor::new(#name, &[#((#keys, #values)),*]);
                ::keystone::ConfigField::accept(&mut self.#member, &FIELD, visitor);
            }
        });
    }

    Ok(visits)
}

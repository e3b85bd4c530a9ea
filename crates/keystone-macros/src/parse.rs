//! Parsing utilities for the derive macro.
//!
//! This module turns the `#[config(...)]` attributes on one field into its
//! annotation table.

use proc_macro2::Span;
use syn::{
    ext::IdentExt, punctuated::Punctuated, spanned::Spanned, Attribute, Expr, ExprLit, Lit, Meta,
    Token,
};

/// Name of the helper attribute.
pub const ATTR: &str = "config";

const SKIP: &str = "skip";
const FLAGS: [&str; 2] = ["required", "ignore"];

/// Parsed `#[config(...)]` attributes of one field.
#[derive(Debug, Default)]
pub struct FieldAttrs {
    /// `(key, value)` pairs in declaration order.
    pub annotations: Vec<(String, String)>,
    /// Whether the field is left out of the record entirely.
    pub skip: bool,
}

impl FieldAttrs {
    /// Collects every `#[config(...)]` attribute on a field.
    ///
    /// Several attributes are merged; a key may appear only once across all
    /// of them.
    pub fn from_attrs(attrs: &[Attribute]) -> syn::Result<Self> {
        let mut parsed = Self::default();
        let mut skip_span: Option<Span> = None;

        for attr in attrs.iter().filter(|attr| attr.path().is_ident(ATTR)) {
            let metas =
                attr.parse_args_with(Punctuated::<Meta, Token![,]>::parse_terminated)?;
            for meta in metas {
                match meta {
                    Meta::Path(path) => {
                        let key = key_of(&path)?;
                        if key == SKIP {
                            if skip_span.is_some() {
                                return Err(syn::Error::new(path.span(), "duplicate key: skip"));
                            }
                            skip_span = Some(path.span());
                        } else if FLAGS.contains(&key.as_str()) {
                            parsed.push(key, "true".to_string(), path.span())?;
                        } else {
                            return Err(syn::Error::new(
                                path.span(),
                                format!("expected `{key} = \"...\"`"),
                            ));
                        }
                    }
                    Meta::NameValue(nv) => {
                        let key = key_of(&nv.path)?;
                        if key == SKIP {
                            return Err(syn::Error::new(
                                nv.path.span(),
                                "`skip` does not take a value",
                            ));
                        }
                        let value = literal(&nv.value)?;
                        parsed.push(key, value, nv.path.span())?;
                    }
                    Meta::List(list) => {
                        return Err(syn::Error::new(list.span(), "expected `key = value`"))
                    }
                }
            }
        }

        if let Some(span) = skip_span {
            if !parsed.annotations.is_empty() {
                return Err(syn::Error::new(
                    span,
                    "`skip` cannot be combined with other keys",
                ));
            }
            parsed.skip = true;
        }

        Ok(parsed)
    }

    fn push(&mut self, key: String, value: String, span: Span) -> syn::Result<()> {
        if self.annotations.iter().any(|(k, _)| *k == key) {
            return Err(syn::Error::new(span, format!("duplicate key: {key}")));
        }
        self.annotations.push((key, value));
        Ok(())
    }
}

/// Rejects `#[config]` anywhere but on fields.
pub fn reject_attrs(attrs: &[Attribute]) -> syn::Result<()> {
    match attrs.iter().find(|attr| attr.path().is_ident(ATTR)) {
        Some(attr) => Err(syn::Error::new(
            attr.span(),
            "`#[config]` is only supported on fields",
        )),
        None => Ok(()),
    }
}

fn key_of(path: &syn::Path) -> syn::Result<String> {
    path.get_ident()
        .map(|ident| ident.unraw().to_string())
        .ok_or_else(|| syn::Error::new(path.span(), "expected identifier"))
}

fn literal(expr: &Expr) -> syn::Result<String> {
    match expr {
        Expr::Lit(ExprLit { lit, .. }) => match lit {
            Lit::Str(s) => Ok(s.value()),
            Lit::Int(i) => Ok(i.base10_digits().to_string()),
            Lit::Float(f) => Ok(f.base10_digits().to_string()),
            Lit::Bool(b) => Ok(b.value.to_string()),
            other => Err(syn::Error::new(
                other.span(),
                "expected a string, integer, float or bool literal",
            )),
        },
        // `default = -1`
        Expr::Unary(unary) if matches!(unary.op, syn::UnOp::Neg(_)) => {
            let inner = literal(&unary.expr)?;
            Ok(format!("-{inner}"))
        }
        other => Err(syn::Error::new(other.span(), "expected a literal")),
    }
}

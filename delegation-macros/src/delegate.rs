use proc_macro::TokenStream;
use proc_macro2::TokenStream as TokenStream2;
use quote::quote;
use syn::spanned::Spanned;
use syn::{
    Data, DeriveInput, Field, Fields, GenericArgument, Index, Member, Meta, PathArguments, Result,
    Type, parse_macro_input,
};

const REGISTRY_TYPE: &str = "DelegationRegistry";

/// #[derive(Delegate)] 宏实现
pub(crate) fn expand(item: TokenStream) -> TokenStream {
    let input = parse_macro_input!(item as DeriveInput);
    match expand_derive(&input) {
        Ok(ts) => TokenStream::from(ts),
        Err(err) => err.to_compile_error().into(),
    }
}

fn expand_derive(input: &DeriveInput) -> Result<TokenStream2> {
    let Data::Struct(data) = &input.data else {
        return Err(syn::Error::new(
            input.span(),
            "#[derive(Delegate)] only supports struct",
        ));
    };

    let selected = select_field(&data.fields)?;
    let root_ty = match selected.root {
        Some(ty) => ty,
        None => root_type(&selected.field.ty)?,
    };
    let member = selected.member;

    let ident = &input.ident;
    let (impl_generics, ty_generics, where_clause) = input.generics.split_for_impl();

    Ok(quote! {
        impl #impl_generics ::delegation_core::host::Delegate for #ident #ty_generics #where_clause {
            type Root = #root_ty;

            fn delegation(
                &self,
            ) -> &::delegation_core::registry::DelegationRegistry<Self, Self::Root> {
                &self.#member
            }
        }
    })
}

struct SelectedField<'a> {
    field: &'a Field,
    member: Member,
    root: Option<Type>,
}

// 先找 #[delegate] 标注，再按类型名推断
fn select_field(fields: &Fields) -> Result<SelectedField<'_>> {
    let mut marked: Vec<SelectedField<'_>> = Vec::new();
    let mut by_type: Vec<SelectedField<'_>> = Vec::new();

    for (index, field) in fields.iter().enumerate() {
        let member = match &field.ident {
            Some(ident) => Member::Named(ident.clone()),
            None => Member::Unnamed(Index::from(index)),
        };

        let mut is_marked = false;
        let mut root: Option<Type> = None;
        for attr in field.attrs.iter().filter(|a| a.path().is_ident("delegate")) {
            if is_marked {
                return Err(syn::Error::new(
                    attr.span(),
                    "duplicate #[delegate] attribute on field",
                ));
            }
            is_marked = true;
            if !matches!(attr.meta, Meta::Path(_)) {
                attr.parse_nested_meta(|meta| {
                    if meta.path.is_ident("root") {
                        root = Some(meta.value()?.parse::<Type>()?);
                        Ok(())
                    } else {
                        Err(meta.error("unknown key in attribute; expected 'root'"))
                    }
                })?;
            }
        }

        let candidate = SelectedField {
            field,
            member,
            root,
        };
        if is_marked {
            marked.push(candidate);
        } else if is_registry_type(&field.ty) {
            by_type.push(candidate);
        }
    }

    let span = fields.span();
    match (marked.len(), by_type.len()) {
        (1, _) => Ok(marked.remove(0)),
        (0, 1) => Ok(by_type.remove(0)),
        (0, 0) => Err(syn::Error::new(
            span,
            "no DelegationRegistry field found; mark one with #[delegate]",
        )),
        (0, _) => Err(syn::Error::new(
            span,
            "multiple DelegationRegistry fields; mark one with #[delegate]",
        )),
        _ => Err(syn::Error::new(
            marked[1].field.span(),
            "only one field may be marked #[delegate]",
        )),
    }
}

fn is_registry_type(ty: &Type) -> bool {
    match ty {
        Type::Path(tp) => tp
            .path
            .segments
            .last()
            .map(|seg| seg.ident == REGISTRY_TYPE)
            .unwrap_or(false),
        _ => false,
    }
}

// 取 DelegationRegistry<Owner, Root> 的第二个类型参数
fn root_type(ty: &Type) -> Result<Type> {
    let err = || {
        syn::Error::new(
            ty.span(),
            "expected DelegationRegistry<Self, Root>; use #[delegate(root = Type)] for aliases",
        )
    };

    let Type::Path(tp) = ty else {
        return Err(err());
    };
    let seg = tp.path.segments.last().ok_or_else(err)?;
    let PathArguments::AngleBracketed(args) = &seg.arguments else {
        return Err(err());
    };

    args.args
        .iter()
        .filter_map(|arg| match arg {
            GenericArgument::Type(t) => Some(t.clone()),
            _ => None,
        })
        .nth(1)
        .ok_or_else(err)
}

#[cfg(test)]
mod tests {
    use super::*;
    use syn::parse_quote;

    fn error_of(input: DeriveInput) -> String {
        expand_derive(&input).unwrap_err().to_string()
    }

    #[test]
    fn infers_root_from_registry_field() {
        let input: DeriveInput = parse_quote! {
            struct Toolbar {
                title: String,
                registry: DelegationRegistry<Toolbar, Node>,
            }
        };
        let expanded = expand_derive(&input).unwrap().to_string();
        assert!(expanded.contains("type Root = Node"));
        assert!(expanded.contains("& self . registry"));
    }

    #[test]
    fn marked_field_with_root_override() {
        let input: DeriveInput = parse_quote! {
            struct Dialog(u8, #[delegate(root = Node)] Registry);
        };
        let expanded = expand_derive(&input).unwrap().to_string();
        assert!(expanded.contains("type Root = Node"));
        assert!(expanded.contains("& self . 1"));
    }

    #[test]
    fn rejects_missing_or_ambiguous_fields() {
        assert_eq!(
            error_of(parse_quote! { struct Empty { title: String } }),
            "no DelegationRegistry field found; mark one with #[delegate]"
        );
        assert_eq!(
            error_of(parse_quote! {
                struct Twice {
                    a: DelegationRegistry<Twice, Node>,
                    b: DelegationRegistry<Twice, Node>,
                }
            }),
            "multiple DelegationRegistry fields; mark one with #[delegate]"
        );
        assert_eq!(
            error_of(parse_quote! {
                struct Marked {
                    #[delegate] a: DelegationRegistry<Marked, Node>,
                    #[delegate] b: DelegationRegistry<Marked, Node>,
                }
            }),
            "only one field may be marked #[delegate]"
        );
        assert_eq!(
            error_of(parse_quote! { enum Menu { Open } }),
            "#[derive(Delegate)] only supports struct"
        );
    }

    #[test]
    fn rejects_malformed_attributes() {
        assert_eq!(
            error_of(parse_quote! {
                struct Dup {
                    #[delegate]
                    #[delegate]
                    registry: DelegationRegistry<Dup, Node>,
                }
            }),
            "duplicate #[delegate] attribute on field"
        );
        assert_eq!(
            error_of(parse_quote! {
                struct Unknown {
                    #[delegate(owner = Unknown)]
                    registry: DelegationRegistry<Unknown, Node>,
                }
            }),
            "unknown key in attribute; expected 'root'"
        );
        assert_eq!(
            error_of(parse_quote! {
                struct Aliased {
                    #[delegate]
                    registry: Registry,
                }
            }),
            "expected DelegationRegistry<Self, Root>; use #[delegate(root = Type)] for aliases"
        );
    }
}

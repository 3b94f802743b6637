//! Implementation of `#[derive(ExtensionClass)]`.

use proc_macro::TokenStream;
use proc_macro2::TokenStream as TokenStream2;
use quote::{quote, quote_spanned};
use syn::spanned::Spanned;
use syn::{parse_macro_input, Data, DeriveInput, Fields, Ident, Type};

use crate::attrs::{ClassAttrs, FieldAttrs, FieldRole};

pub fn derive_class_impl(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);

    match derive_class_inner(&input) {
        Ok(tokens) => tokens.into(),
        Err(err) => err.to_compile_error().into(),
    }
}

struct ClassField<'a> {
    ident: &'a Ident,
    ty: &'a Type,
    attrs: FieldAttrs,
}

impl ClassField<'_> {
    /// Name the engine sees for this field.
    fn engine_name(&self) -> String {
        self.attrs.name.clone().unwrap_or_else(|| self.ident.to_string())
    }
}

fn collect_fields(input: &DeriveInput) -> syn::Result<Vec<ClassField<'_>>> {
    let Data::Struct(data) = &input.data else {
        return Err(syn::Error::new_spanned(
            &input.ident,
            "ExtensionClass can only be derived for structs",
        ));
    };
    match &data.fields {
        Fields::Named(fields) => fields
            .named
            .iter()
            .map(|field| {
                let ident = field
                    .ident
                    .as_ref()
                    .ok_or_else(|| syn::Error::new(field.span(), "expected a named field"))?;
                Ok(ClassField {
                    ident,
                    ty: &field.ty,
                    attrs: FieldAttrs::from_attrs(&field.attrs)?,
                })
            })
            .collect(),
        Fields::Unit => Ok(Vec::new()),
        Fields::Unnamed(fields) => Err(syn::Error::new_spanned(
            fields,
            "ExtensionClass needs named fields",
        )),
    }
}

fn derive_class_inner(input: &DeriveInput) -> syn::Result<TokenStream2> {
    let name = &input.ident;
    let attrs = ClassAttrs::from_attrs(&input.attrs)?;
    let base = attrs.base.as_ref().ok_or_else(|| {
        syn::Error::new_spanned(name, "missing #[bridge(base = ...)] naming the engine class to extend")
    })?;
    let class_name = attrs.name.clone().unwrap_or_else(|| name.to_string());
    let fields = collect_fields(input)?;

    let mut base_fields = fields.iter().filter(|f| f.attrs.role == FieldRole::Base);
    let base_field = base_fields.next();
    if let Some(extra) = base_fields.next() {
        return Err(syn::Error::new_spanned(extra.ident, "only one field can be the base"));
    }
    if base_field.is_none()
        && let Some(child) = fields.iter().find(|f| f.attrs.role == FieldRole::Child)
    {
        return Err(syn::Error::new_spanned(
            child.ident,
            "child fields need a #[bridge(base)] field to attach to",
        ));
    }
    for field in &fields {
        let exported = field.attrs.role == FieldRole::Export;
        if !exported && (field.attrs.default.is_some() || field.attrs.hint.is_some() || field.attrs.hint_string.is_some()) {
            return Err(syn::Error::new_spanned(
                field.ident,
                "default, hint and hint_string apply to exported fields only",
            ));
        }
    }

    let flags = {
        let mut flags = vec![quote! { ::gdbridge::class::ClassFlags::EXPOSED }];
        if attrs.tool {
            flags.push(quote! { ::gdbridge::class::ClassFlags::TOOL });
        }
        if attrs.abstract_class {
            flags.push(quote! { ::gdbridge::class::ClassFlags::ABSTRACT });
        }
        quote! { ::gdbridge::class::ClassFlags::empty()#(.union(#flags))* }
    };

    let create = generate_create(&fields);
    let meta = generate_meta(&fields);
    let accessors = generate_accessors(&fields);
    let bind_signals = generate_bind_signals(&fields);
    let assert_children = generate_assert_children(&fields, base_field);
    let hooks = (!attrs.hooks).then(|| {
        quote! { impl ::gdbridge::class::ClassHooks for #name {} }
    });

    Ok(quote! {
        impl ::gdbridge::class::ExtensionClass for #name {
            type Base = #base;

            const CLASS_NAME: &'static str = #class_name;
            const FLAGS: ::gdbridge::class::ClassFlags = #flags;

            #create
            #meta
            #accessors
            #bind_signals
            #assert_children
        }

        #hooks
    })
}

fn generate_create(fields: &[ClassField<'_>]) -> TokenStream2 {
    let mut used_base = false;
    let inits: Vec<_> = fields
        .iter()
        .map(|field| {
            let ident = field.ident;
            let ty = field.ty;
            match (&field.attrs.role, &field.attrs.default) {
                (FieldRole::Base, _) => {
                    used_base = true;
                    quote! { #ident: base }
                }
                (_, Some(default)) => quote_spanned! {default.span()=>
                    #ident: { let value: #ty = #default; value }
                },
                _ => quote_spanned! {ty.span()=>
                    #ident: ::core::default::Default::default()
                },
            }
        })
        .collect();
    let discard = (!used_base).then(|| quote! { let _ = base; });

    quote! {
        fn create(base: ::gdbridge::obj::Base<Self::Base>) -> Self {
            #discard
            Self { #(#inits),* }
        }
    }
}

fn generate_meta(fields: &[ClassField<'_>]) -> TokenStream2 {
    let properties = fields.iter().filter(|f| f.attrs.role == FieldRole::Export).map(|field| {
        let ty = field.ty;
        let engine_name = field.engine_name();
        let field_name = field.ident.to_string();
        let hint = match (&field.attrs.hint, &field.attrs.hint_string) {
            (None, None) => None,
            (hint, hint_string) => {
                let hint = hint
                    .as_ref()
                    .map(|hint| quote! { ::gdbridge::class::PropertyHint::#hint })
                    .unwrap_or_else(|| quote! { ::gdbridge::class::PropertyHint::None });
                let hint_string = hint_string.clone().unwrap_or_default();
                Some(quote! { .hint(#hint, #hint_string) })
            }
        };
        quote! {
            ::gdbridge::class::PropertyMeta::of::<#ty>(#engine_name).field(#field_name)#hint
        }
    });
    let signals = fields.iter().filter(|f| f.attrs.role == FieldRole::Signal).map(|field| {
        let ty = field.ty;
        let engine_name = field.engine_name();
        quote! {
            ::gdbridge::class::SignalMeta {
                name: #engine_name,
                args: <#ty as ::gdbridge::class::SignalField>::arg_meta(),
            }
        }
    });

    quote! {
        fn meta() -> ::gdbridge::class::ClassMeta {
            ::gdbridge::class::ClassMeta {
                properties: ::std::vec![#(#properties),*],
                signals: ::std::vec![#(#signals),*],
            }
        }
    }
}

/// Patterns matching a field by engine name or by field name.
fn name_pattern(field: &ClassField<'_>) -> TokenStream2 {
    let engine_name = field.engine_name();
    let field_name = field.ident.to_string();
    if engine_name == field_name {
        quote! { #engine_name }
    } else {
        quote! { #engine_name | #field_name }
    }
}

fn generate_accessors(fields: &[ClassField<'_>]) -> TokenStream2 {
    let exported: Vec<_> = fields.iter().filter(|f| f.attrs.role == FieldRole::Export).collect();

    let getters = exported.iter().map(|field| {
        let ident = field.ident;
        let pattern = name_pattern(field);
        quote! {
            #pattern => ::core::option::Option::Some(::gdbridge::variant::ToVariant::to_variant(&self.#ident)),
        }
    });
    let setters = exported.iter().map(|field| {
        let ident = field.ident;
        let pattern = name_pattern(field);
        quote! {
            #pattern => {
                self.#ident = ::gdbridge::variant::FromVariant::from_variant(value)?;
                ::core::result::Result::Ok(true)
            }
        }
    });
    let defaults = exported.iter().filter_map(|field| {
        let default = field.attrs.default.as_ref()?;
        let ty = field.ty;
        let pattern = name_pattern(field);
        Some(quote! {
            #pattern => {
                let value: #ty = #default;
                ::core::option::Option::Some(::gdbridge::variant::ToVariant::to_variant(&value))
            }
        })
    });

    quote! {
        fn get_field(&self, name: &str) -> ::core::option::Option<::gdbridge::variant::Variant> {
            match name {
                #(#getters)*
                _ => ::core::option::Option::None,
            }
        }

        #[allow(unused_variables)]
        fn set_field(
            &mut self,
            name: &str,
            value: &::gdbridge::variant::Variant,
        ) -> ::core::result::Result<bool, ::gdbridge::error::ConversionError> {
            match name {
                #(#setters)*
                _ => ::core::result::Result::Ok(false),
            }
        }

        fn field_default(name: &str) -> ::core::option::Option<::gdbridge::variant::Variant> {
            match name {
                #(#defaults)*
                _ => ::core::option::Option::None,
            }
        }
    }
}

fn generate_bind_signals(fields: &[ClassField<'_>]) -> TokenStream2 {
    let binds: Vec<_> = fields
        .iter()
        .filter(|f| f.attrs.role == FieldRole::Signal)
        .map(|field| {
            let ident = field.ident;
            let engine_name = field.engine_name();
            quote! {
                ::gdbridge::class::SignalField::bind(&mut self.#ident, #engine_name, binder);
            }
        })
        .collect();
    if binds.is_empty() {
        return TokenStream2::new();
    }

    quote! {
        fn bind_signals(&mut self, binder: &mut ::gdbridge::class::SignalBinder) {
            #(#binds)*
        }
    }
}

fn generate_assert_children(fields: &[ClassField<'_>], base_field: Option<&ClassField<'_>>) -> TokenStream2 {
    let Some(base_field) = base_field else {
        return TokenStream2::new();
    };
    let base = base_field.ident;
    let children: Vec<_> = fields
        .iter()
        .filter(|f| f.attrs.role == FieldRole::Child)
        .map(|field| {
            let ident = field.ident;
            let engine_name = field.engine_name();
            quote! {
                ::gdbridge::class::children::assert_child(&*self.#base, #engine_name, &mut self.#ident)?;
            }
        })
        .collect();
    if children.is_empty() {
        return TokenStream2::new();
    }

    quote! {
        fn assert_children(&mut self) -> ::gdbridge::error::BridgeResult<()> {
            #(#children)*
            ::core::result::Result::Ok(())
        }
    }
}

//! Attribute parsing for the bridge macros.

use syn::{Attribute, Expr, Ident, LitStr, Type};

/// Parsed `#[bridge(...)]` attributes on a struct.
#[derive(Default)]
pub struct ClassAttrs {
    /// Engine class the struct extends.
    pub base: Option<Type>,
    /// Engine name of the class (default: the struct name).
    pub name: Option<String>,
    pub tool: bool,
    pub abstract_class: bool,
    /// The struct implements `ClassHooks` itself.
    pub hooks: bool,
}

/// What a field stands for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FieldRole {
    /// Plain host state, initialized with `Default`.
    #[default]
    Plain,
    /// The `Base<T>` handle to the engine object.
    Base,
    /// An exported property.
    Export,
    /// A child node asserted after construction.
    Child,
    /// A `Signal` or `SignalSender` declaring an engine signal.
    Signal,
}

/// Parsed `#[bridge(...)]` attributes on a field.
#[derive(Default)]
pub struct FieldAttrs {
    pub role: FieldRole,
    /// Engine-facing name (property, child node or signal).
    pub name: Option<String>,
    pub default: Option<Expr>,
    pub hint: Option<Ident>,
    pub hint_string: Option<String>,
}

fn ident_text(path: &syn::Path) -> String {
    path.get_ident().map(|i| i.to_string()).unwrap_or_default()
}

impl ClassAttrs {
    pub fn from_attrs(attrs: &[Attribute]) -> syn::Result<Self> {
        let mut result = Self::default();

        for attr in attrs {
            if !attr.path().is_ident("bridge") {
                continue;
            }

            attr.parse_nested_meta(|meta| {
                if meta.path.is_ident("base") {
                    result.base = Some(meta.value()?.parse()?);
                } else if meta.path.is_ident("name") {
                    let value: LitStr = meta.value()?.parse()?;
                    result.name = Some(value.value());
                } else if meta.path.is_ident("tool") {
                    result.tool = true;
                } else if meta.path.is_ident("abstract_class") {
                    result.abstract_class = true;
                } else if meta.path.is_ident("hooks") {
                    result.hooks = true;
                } else {
                    return Err(meta.error(format!("unknown bridge attribute: {}", ident_text(&meta.path))));
                }
                Ok(())
            })?;
        }

        Ok(result)
    }
}

impl FieldAttrs {
    pub fn from_attrs(attrs: &[Attribute]) -> syn::Result<Self> {
        let mut result = Self::default();

        for attr in attrs {
            if !attr.path().is_ident("bridge") {
                continue;
            }

            attr.parse_nested_meta(|meta| {
                if meta.path.is_ident("base") {
                    result.set_role(FieldRole::Base, &meta.path)?;
                } else if meta.path.is_ident("export") {
                    result.set_role(FieldRole::Export, &meta.path)?;
                } else if meta.path.is_ident("child") {
                    result.set_role(FieldRole::Child, &meta.path)?;
                } else if meta.path.is_ident("signal") {
                    result.set_role(FieldRole::Signal, &meta.path)?;
                } else if meta.path.is_ident("name") {
                    let value: LitStr = meta.value()?.parse()?;
                    result.name = Some(value.value());
                } else if meta.path.is_ident("default") {
                    let value: LitStr = meta.value()?.parse()?;
                    result.default = Some(value.parse()?);
                } else if meta.path.is_ident("hint") {
                    result.hint = Some(meta.value()?.parse()?);
                } else if meta.path.is_ident("hint_string") {
                    let value: LitStr = meta.value()?.parse()?;
                    result.hint_string = Some(value.value());
                } else {
                    return Err(meta.error(format!("unknown bridge field attribute: {}", ident_text(&meta.path))));
                }
                Ok(())
            })?;
        }

        Ok(result)
    }

    fn set_role(&mut self, role: FieldRole, path: &syn::Path) -> syn::Result<()> {
        if self.role != FieldRole::Plain && self.role != role {
            return Err(syn::Error::new_spanned(path, "a field takes only one of base, export, child or signal"));
        }
        self.role = role;
        Ok(())
    }
}

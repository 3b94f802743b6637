//! Declaring virtual overrides and methods.

use gdbridge_sys as sys;

use crate::classes::{find_virtual, EngineClass, Signature};
use crate::error::{BridgeError, BridgeResult, CallError, CallErrorKind};
use crate::marshal::PtrValue;
use crate::variant::{FromVariant, ToVariant, Variant, VariantTyped};

use super::{ExtensionClass, PropertyMeta};

type PtrThunk<H> = Box<
    dyn Fn(&mut H, *const sys::GDExtensionConstTypePtr, sys::GDExtensionTypePtr) -> BridgeResult<()>
        + Send
        + Sync,
>;
type VarThunk<H> = Box<dyn Fn(&mut H, &[&Variant]) -> Result<Variant, CallError> + Send + Sync>;

/// A host function callable from the engine through both calling conventions.
pub struct HostMethod<H> {
    pub(crate) name: &'static str,
    pub(crate) host_name: &'static str,
    pub(crate) signature: Signature,
    pub(crate) args: Vec<PropertyMeta>,
    pub(crate) ret: Option<PropertyMeta>,
    pub(crate) ptrcall: PtrThunk<H>,
    pub(crate) varcall: VarThunk<H>,
    pub(crate) write_default: unsafe fn(sys::GDExtensionTypePtr),
}

/// A function taking the host instance and engine-marshallable arguments.
///
/// Implemented for `Fn(&mut H, A1, .., An) -> R` with up to four arguments.
pub trait HostFn<H, Args>: Send + Sync + Sized + 'static {
    fn signature() -> Signature;

    fn into_method(self, name: &'static str) -> HostMethod<H>;
}

/// Short name of a host function: the last two path segments of its type name.
fn host_name_of<F>() -> &'static str {
    let full = std::any::type_name::<F>();
    let mut cut = full.len();
    for _ in 0..2 {
        match full[..cut].rfind("::") {
            Some(pos) => cut = pos,
            None => return full,
        }
    }
    &full[cut + 2..]
}

macro_rules! impl_host_fn {
    ($($arg:ident),*) => {
        impl<H, F, R, $($arg,)*> HostFn<H, ($($arg,)*)> for F
        where
            H: 'static,
            F: Fn(&mut H, $($arg),*) -> R + Send + Sync + 'static,
            R: PtrValue + ToVariant + 'static,
            $($arg: PtrValue + FromVariant + 'static,)*
        {
            fn signature() -> Signature {
                Signature {
                    args: vec![$(<$arg as VariantTyped>::type_label()),*],
                    ret: R::type_label(),
                }
            }

            #[allow(non_snake_case, unused_mut, unused_assignments, unused_variables)]
            fn into_method(self, name: &'static str) -> HostMethod<H> {
                let this = std::sync::Arc::new(self);
                let ptr_fn = this.clone();
                let var_fn = this;
                let arity: usize = <[&str]>::len(&[$(stringify!($arg)),*]);
                let ret = if R::type_label() == "void" {
                    None
                } else {
                    Some(PropertyMeta::of::<R>(""))
                };
                HostMethod {
                    name,
                    host_name: host_name_of::<F>(),
                    signature: Self::signature(),
                    args: vec![$(PropertyMeta::of::<$arg>(stringify!($arg))),*],
                    ret,
                    ptrcall: Box::new(move |host: &mut H, args, ret| {
                        let mut index = 0;
                        $(
                            let $arg = unsafe { <$arg as PtrValue>::from_arg(*args.add(index)) };
                            index += 1;
                        )*
                        let result = ptr_fn(host, $($arg),*);
                        unsafe { result.write_ret(ret) }
                    }),
                    varcall: Box::new(move |host: &mut H, args: &[&Variant]| {
                        if args.len() != arity {
                            return Err(CallError {
                                method: name.to_string(),
                                kind: if args.len() < arity {
                                    CallErrorKind::TooFewArguments
                                } else {
                                    CallErrorKind::TooManyArguments
                                },
                                argument: 0,
                                expected: arity as i32,
                            });
                        }
                        let mut index = 0;
                        $(
                            let $arg = <$arg as FromVariant>::from_variant(args[index]).map_err(|_| CallError {
                                method: name.to_string(),
                                kind: CallErrorKind::InvalidArgument,
                                argument: index as i32,
                                expected: <$arg as VariantTyped>::VARIANT_TYPE.to_sys() as i32,
                            })?;
                            index += 1;
                        )*
                        Ok(var_fn(host, $($arg),*).to_variant())
                    }),
                    write_default: <R as PtrValue>::write_default,
                }
            }
        }
    };
}

impl_host_fn!();
impl_host_fn!(A1);
impl_host_fn!(A1, A2);
impl_host_fn!(A1, A2, A3);
impl_host_fn!(A1, A2, A3, A4);

/// An overridden engine virtual.
pub(crate) struct VirtualEntry<H> {
    pub(crate) engine_name: &'static str,
    pub(crate) method: HostMethod<H>,
}

/// Collects the virtual overrides and methods of a class during registration.
pub struct ClassBuilder<H> {
    pub(crate) virtuals: Vec<VirtualEntry<H>>,
    pub(crate) methods: Vec<HostMethod<H>>,
    pub(crate) errors: Vec<BridgeError>,
}

impl<H: ExtensionClass> ClassBuilder<H> {
    pub(crate) fn new() -> Self {
        Self {
            virtuals: Vec::new(),
            methods: Vec::new(),
            errors: Vec::new(),
        }
    }

    /// Overrides the engine virtual `name` (for example `_process`).
    ///
    /// The signature of `f` must match the one the engine declares; a
    /// mismatch fails the registration of the whole class.
    pub fn virtual_method<F, Args>(&mut self, name: &'static str, f: F) -> &mut Self
    where
        F: HostFn<H, Args>,
    {
        let base = <H::Base as EngineClass>::CLASS_NAME;
        let Some(declared) = find_virtual(base, name) else {
            self.errors.push(BridgeError::UnknownVirtual {
                class: H::CLASS_NAME.to_string(),
                engine_method: name.to_string(),
            });
            return self;
        };

        let expected = declared.signature();
        let found = F::signature();
        if expected != found {
            self.errors.push(BridgeError::SignatureMismatch {
                host_method: host_name_of::<F>().to_string(),
                engine_method: format!("{}::{}", declared.class, name),
                expected: expected.to_string(),
                found: found.to_string(),
            });
            return self;
        }

        self.virtuals.retain(|entry| entry.engine_name != name);
        self.virtuals.push(VirtualEntry {
            engine_name: name,
            method: f.into_method(name),
        });
        self
    }

    /// Exposes `f` to the engine as the method `name`.
    pub fn method<F, Args>(&mut self, name: &'static str, f: F) -> &mut Self
    where
        F: HostFn<H, Args>,
    {
        if self.methods.iter().any(|m| m.name == name) {
            self.errors.push(BridgeError::InvalidClass {
                class: H::CLASS_NAME.to_string(),
                reason: format!("method '{}' is declared twice", name),
            });
            return self;
        }
        self.methods.push(f.into_method(name));
        self
    }

    /// First error recorded while building, if any.
    pub(crate) fn finish(mut self) -> BridgeResult<Self> {
        if self.errors.is_empty() {
            Ok(self)
        } else {
            Err(self.errors.remove(0))
        }
    }
}

// vim: tw=80
use proc_macro2::{TokenStream, TokenTree};
use quote::{ToTokens, format_ident, quote};
use syn::{
    *,
    ext::IdentExt,
    spanned::Spanned
};

use crate::compile_error;

/// How an argument is passed to the faked method
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
enum Passing {
    Value,
    /// `&T`, recorded as `T::Owned`
    Shared,
    /// `&mut T`, recorded as a ref parameter and written back after the call
    Mutable,
}

struct FakeArg {
    ident: Ident,
    passing: Passing,
    /// Type as declared by the trait
    ty: Type,
    /// Type of the referent, for `&T` and `&mut T` arguments
    elem: Type,
}

impl FakeArg {
    /// Type of the value stored in the call
    fn recorded(&self) -> TokenStream {
        let elem = &self.elem;
        match self.passing {
            Passing::Value => self.ty.to_token_stream(),
            Passing::Shared => quote!(<#elem as ::std::borrow::ToOwned>::Owned),
            Passing::Mutable => elem.to_token_stream()
        }
    }
}

/// Does `tokens` mention an identifier equal to `word`, at any depth?
fn mentions(tokens: TokenStream, word: &str) -> bool {
    tokens.into_iter().any(|tt| match tt {
        TokenTree::Group(g) => mentions(g.stream(), word),
        TokenTree::Ident(i) => i == word,
        _ => false
    })
}

/// Does `tokens` mention any lifetime other than `'static`?
fn has_lifetime(tokens: TokenStream) -> bool {
    let mut iter = tokens.into_iter().peekable();
    while let Some(tt) = iter.next() {
        match tt {
            TokenTree::Group(g) => {
                if has_lifetime(g.stream()) {
                    return true;
                }
            },
            TokenTree::Punct(p) if p.as_char() == '\'' => {
                match iter.peek() {
                    Some(TokenTree::Ident(i)) if i == "static" => (),
                    _ => return true
                }
            },
            _ => ()
        }
    }
    false
}

/// Check that values of type `ty` can be stored in a call.
fn check_type(ty: &Type) -> bool {
    let tokens = ty.to_token_stream();
    if mentions(tokens.clone(), "impl") {
        compile_error(ty.span(), "fakeall does not support impl Trait types");
        false
    } else if mentions(tokens.clone(), "Self") {
        compile_error(ty.span(),
            "fakeall does not support types that mention Self");
        false
    } else if has_lifetime(tokens) {
        compile_error(ty.span(),
            "fakeall does not support non-'static lifetimes inside argument or return types");
        false
    } else {
        true
    }
}

/// One method of a faked trait.
pub(crate) struct FakeMethod {
    abi: Option<Abi>,
    args: Vec<FakeArg>,
    generics: Generics,
    ident: Ident,
    is_async: bool,
    /// The return type, or the output of the future for async methods.
    /// `None` for methods that return `()`.
    output: Option<Type>,
    receiver: Receiver,
    unsafety: Option<Token![unsafe]>,
}

impl FakeMethod {
    /// Parse a method from the trait's declaration.  Reports unsupported
    /// methods with `compile_error` and returns `None`.
    pub(crate) fn new(sig: &Signature) -> Option<Self> {
        if let Some(variadic) = &sig.variadic {
            compile_error(variadic.span(),
                "fakeall does not support variadic methods");
            return None;
        }
        for param in sig.generics.params.iter() {
            if !matches!(param, GenericParam::Lifetime(_)) {
                compile_error(param.span(),
                    "fakeall does not support generic methods");
                return None;
            }
        }
        let receiver = match sig.receiver() {
            Some(r) if r.reference.is_some() && r.colon_token.is_none() =>
                r.clone(),
            Some(r) => {
                compile_error(r.span(),
                    "fakeall only supports &self and &mut self receivers");
                return None;
            },
            None => {
                compile_error(sig.ident.span(),
                    "fakeall can not fake methods without a receiver");
                return None;
            }
        };
        let mut args = Vec::new();
        for (i, input) in sig.inputs.iter().skip(1).enumerate() {
            let FnArg::Typed(pat_type) = input else {
                continue;
            };
            let ident = match &*pat_type.pat {
                Pat::Ident(pi) if pi.by_ref.is_none() && pi.subpat.is_none()
                    => pi.ident.clone(),
                Pat::Wild(_) => format_ident!("arg{}", i),
                pat => {
                    compile_error(pat.span(),
                        "fakeall requires arguments to be plain identifiers");
                    return None;
                }
            };
            let ty = (*pat_type.ty).clone();
            let (passing, elem) = match &ty {
                Type::Reference(r) if r.mutability.is_some() =>
                    (Passing::Mutable, (*r.elem).clone()),
                Type::Reference(r) => (Passing::Shared, (*r.elem).clone()),
                _ => (Passing::Value, ty.clone())
            };
            if !check_type(&elem) {
                return None;
            }
            args.push(FakeArg { ident, passing, ty, elem });
        }
        let output = match &sig.output {
            ReturnType::Default => None,
            ReturnType::Type(_, ty) => match &**ty {
                Type::Tuple(t) if t.elems.is_empty() => None,
                Type::Reference(r) => {
                    compile_error(r.span(),
                        "fakeall can not fake methods that return references");
                    return None;
                },
                ty if !check_type(ty) => return None,
                ty => Some(ty.clone())
            }
        };
        Some(FakeMethod {
            abi: sig.abi.clone(),
            args,
            generics: sig.generics.clone(),
            ident: sig.ident.clone(),
            is_async: sig.asyncness.is_some(),
            output,
            receiver,
            unsafety: sig.unsafety
        })
    }

    /// The method's name, as recorded in its `Method`
    fn name(&self) -> String {
        self.ident.unraw().to_string()
    }

    fn method_ident(&self) -> Ident {
        format_ident!("{}_method", self.ident.unraw())
    }

    fn call_ident(&self) -> Ident {
        format_ident!("{}_call", self.ident.unraw())
    }

    fn call_to_ident(&self) -> Ident {
        format_ident!("call_to_{}", self.ident.unraw())
    }

    fn output(&self) -> TokenStream {
        match &self.output {
            Some(ty) => ty.to_token_stream(),
            None => quote!(())
        }
    }

    /// Expression building the method's `fakeall::ReturnType`
    fn return_type(&self) -> TokenStream {
        let returns = match &self.output {
            Some(ty) => quote!({
                use ::fakeall::__private::{ViaDefault as _, ViaNoDefault as _};
                ::fakeall::ReturnType::new::<#ty>(
                    (&::fakeall::__private::DefaultReturner::<#ty>::new())
                        .default_maker())
            }),
            None => quote!(::fakeall::ReturnType::unit())
        };
        if self.is_async {
            quote!(#returns.asynchronous())
        } else {
            returns
        }
    }

    /// Inherent methods of the fake struct: the method's identity, its
    /// matcher, and its rule builder.
    pub(crate) fn gen_inherent(&self, trait_name: &str) -> TokenStream {
        let name = self.name();
        let method_ident = self.method_ident();
        let call_ident = self.call_ident();
        let call_to_ident = self.call_to_ident();
        let params = self.args.iter().map(|arg| {
            let param_name = arg.ident.unraw().to_string();
            let recorded = arg.recorded();
            match arg.passing {
                Passing::Mutable =>
                    quote!(.with_ref_param::<#recorded>(#param_name)),
                _ => quote!(.with_param::<#recorded>(#param_name))
            }
        });
        let returns = self.return_type();
        let idents = self.args.iter().map(|a| &a.ident).collect::<Vec<_>>();
        let method_doc = format!("Identity of the faked `{}` method", name);
        let call_doc = format!(
            "Matches calls to `{}` whose arguments satisfy the constraints",
            name);
        let call_to_doc = format!(
            "Configure calls to `{}` whose arguments satisfy the constraints",
            name);
        quote!(
            #[doc = #method_doc]
            pub fn #method_ident() -> ::std::sync::Arc<::fakeall::Method> {
                static METHOD: ::std::sync::OnceLock<
                    ::std::sync::Arc<::fakeall::Method>
                > = ::std::sync::OnceLock::new();
                METHOD.get_or_init(|| {
                    let method = ::fakeall::Method::new(#trait_name, #name)
                        #(#params)*
                        .with_return_type(#returns);
                    ::std::sync::Arc::new(method)
                }).clone()
            }

            #[doc = #call_doc]
            pub fn #call_ident(#(#idents: ::fakeall::ArgumentConstraint),*)
                -> ::fakeall::CallMatcher
            {
                ::fakeall::CallMatcher::new_unchecked(Self::#method_ident(),
                    vec![#(#idents),*])
            }

            #[doc = #call_to_doc]
            pub fn #call_to_ident(&self,
                #(#idents: ::fakeall::ArgumentConstraint),*)
                -> ::fakeall::RuleBuilder<'_>
            {
                ::fakeall::FakeManager::call_to(&self.manager,
                    Self::#call_ident(#(#idents),*))
            }
        )
    }

    /// The signature shared by the inherent method and the trait method
    fn gen_signature(&self, receiver: TokenStream) -> TokenStream {
        let abi = &self.abi;
        let ident = &self.ident;
        let generics = &self.generics;
        let where_clause = &self.generics.where_clause;
        let unsafety = &self.unsafety;
        let output = self.output();
        let inputs = self.args.iter().map(|a| {
            let (ident, ty) = (&a.ident, &a.ty);
            quote!(#ident: #ty)
        });
        let ret = if self.is_async {
            quote!(-> impl ::std::future::Future<Output = #output>)
        } else if self.output.is_some() {
            quote!(-> #output)
        } else {
            TokenStream::new()
        };
        quote!(
            #unsafety #abi fn #ident #generics(#receiver, #(#inputs),*) #ret
                #where_clause
        )
    }

    /// The trait method, which defers to the inherent method of the same
    /// name.  Inherent methods take precedence over trait methods, so a
    /// member can't be shadowed by the methods of `FakedExt`.
    pub(crate) fn gen_impl(&self, fake_ident: &Ident) -> TokenStream {
        let ident = &self.ident;
        let signature = self.gen_signature(self.receiver.to_token_stream());
        let idents = self.args.iter().map(|a| &a.ident);
        quote!(
            #signature {
                #fake_ident::#ident(self, #(#idents),*)
            }
        )
    }

    /// The inherent method that intercepts calls of this member.  It always
    /// takes `&self`, or method lookup would find `FakedExt` first at the
    /// `&Self` autoref step.
    pub(crate) fn gen_member(&self, vis: &Visibility) -> TokenStream {
        let method_ident = self.method_ident();
        let output = self.output();
        let lifetime = self.receiver.reference.as_ref()
            .and_then(|(_, lt)| lt.as_ref());
        let signature = self.gen_signature(quote!(&#lifetime self));
        let values = self.args.iter().map(|a| {
            let (ident, elem) = (&a.ident, &a.elem);
            match a.passing {
                Passing::Value => quote!(::fakeall::arg_value(#ident)),
                Passing::Shared => quote!(::fakeall::arg_value(
                    <#elem as ::std::borrow::ToOwned>::to_owned(#ident))),
                Passing::Mutable => quote!(::fakeall::arg_value(
                    ::std::clone::Clone::clone(&*#ident)))
            }
        });
        let writebacks = self.args.iter()
            .enumerate()
            .filter(|(_, a)| a.passing == Passing::Mutable)
            .map(|(i, a)| {
                let (ident, elem) = (&a.ident, &a.elem);
                quote!(
                    if let Some(__value) = __outcome.assigned::<#elem>(#i) {
                        *#ident = __value;
                    }
                )
            }).collect::<Vec<_>>();
        let mutability = if writebacks.is_empty() {
            None
        } else {
            Some(quote!(mut))
        };
        let finish = if self.is_async {
            quote!(__outcome.into_future::<#output>())
        } else {
            quote!(__outcome.into_value::<#output>())
        };
        quote!(
            #vis #signature {
                let #mutability __outcome = ::fakeall::FakeManager::intercept_with(
                    &self.manager,
                    Self::#method_ident(),
                    vec![#(#values),*]);
                #(#writebacks)*
                #finish
            }
        )
    }

    /// The match arm that forwards this method to a wrapped implementation
    pub(crate) fn gen_invoker_arm(&self, trait_ident: &Ident) -> TokenStream {
        let name = self.name();
        let ident = &self.ident;
        let loads = self.args.iter().enumerate().map(|(i, a)| {
            let ident = &a.ident;
            let recorded = a.recorded();
            let mutability = if a.passing == Passing::Mutable {
                Some(quote!(mut))
            } else {
                None
            };
            quote!(let #mutability #ident = __call.cloned::<#recorded>(#i)?;)
        });
        let passed = self.args.iter().map(|a| {
            let ident = &a.ident;
            match a.passing {
                Passing::Value => quote!(#ident),
                Passing::Shared => quote!(::std::borrow::Borrow::borrow(&#ident)),
                Passing::Mutable => quote!(&mut #ident)
            }
        });
        let inner = if self.receiver.mutability.is_some() {
            quote!(&mut *__inner)
        } else {
            quote!(&*__inner)
        };
        let mut call = quote!(
            <__Inner as #trait_ident>::#ident(#inner, #(#passed),*)
        );
        if self.is_async {
            call = quote!(::fakeall::__private::block_on(#call));
        }
        if self.unsafety.is_some() {
            call = quote!(unsafe { #call });
        }
        let assigns = self.args.iter()
            .enumerate()
            .filter(|(_, a)| a.passing == Passing::Mutable)
            .map(|(i, a)| {
                let ident = &a.ident;
                quote!(.assign(#i, #ident))
            });
        let result = if self.output.is_some() {
            quote!(
                let __r = #call;
                Ok(::fakeall::Returned::new(__r) #(#assigns)*)
            )
        } else {
            quote!(
                #call;
                Ok(::fakeall::Returned::new(()) #(#assigns)*)
            )
        };
        quote!(
            #name => {
                #(#loads)*
                #result
            }
        )
    }
}

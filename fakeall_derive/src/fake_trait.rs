// vim: tw=80
use proc_macro2::TokenStream;
use quote::{ToTokens, format_ident, quote};
use syn::{
    *,
    spanned::Spanned
};

use crate::{
    compile_error,
    fake_method::FakeMethod
};

/// Supertraits that every generated fake already implements
const IMPLIED_SUPERTRAITS: &[&str] = &["Clone", "Debug", "Send", "Sync"];

/// Constructors of the generated fake.  Members are generated as inherent
/// methods too, so they can't share these names.
const CONSTRUCTORS: &[&str] = &["new", "with_options", "wrapping",
                                "wrapping_with"];

/// A trait annotated with `#[fake]`
pub(crate) struct FakeTrait {
    ident: Ident,
    methods: Vec<FakeMethod>,
    unsafety: Option<Token![unsafe]>,
    vis: Visibility,
}

impl FakeTrait {
    pub(crate) fn new(item: &ItemTrait) -> Self {
        if !item.generics.params.is_empty() {
            compile_error(item.generics.span(),
                "fakeall does not support generic traits");
        }
        for bound in item.supertraits.iter() {
            if let TypeParamBound::Trait(tb) = bound {
                let implied = tb.path.segments.last()
                    .map(|seg| IMPLIED_SUPERTRAITS.iter()
                         .any(|name| seg.ident == *name))
                    .unwrap_or(false);
                if !implied {
                    compile_error(tb.span(),
                        "fakeall can not implement this supertrait");
                }
            }
        }
        let mut methods = Vec::new();
        for trait_item in item.items.iter() {
            match trait_item {
                TraitItem::Fn(f) if CONSTRUCTORS.iter()
                    .any(|name| f.sig.ident == *name) =>
                {
                    compile_error(f.sig.ident.span(),
                        "fakeall can not fake a method with the name of one of the fake's constructors");
                },
                TraitItem::Fn(f) => {
                    if let Some(m) = FakeMethod::new(&f.sig) {
                        methods.push(m);
                    }
                },
                other => {
                    compile_error(other.span(),
                        "fakeall can only fake methods; remove associated consts, types and macros");
                }
            }
        }
        FakeTrait {
            ident: item.ident.clone(),
            methods,
            unsafety: item.unsafety,
            vis: item.vis.clone()
        }
    }

    fn fake_ident(&self) -> Ident {
        format_ident!("Fake{}", self.ident)
    }

    fn invoker_ident(&self) -> Ident {
        format_ident!("__Fake{}Invoker", self.ident)
    }

    /// Forwards unhandled calls of a wrapping fake to the wrapped value.
    fn gen_invoker(&self) -> TokenStream {
        let trait_ident = &self.ident;
        let invoker_ident = self.invoker_ident();
        let arms = self.methods.iter()
            .map(|m| m.gen_invoker_arm(trait_ident));
        quote!(
            #[doc(hidden)]
            #[allow(dead_code, non_camel_case_types)]
            struct #invoker_ident<__Inner>(::std::sync::Mutex<__Inner>);

            impl<__Inner> ::fakeall::Invoker for #invoker_ident<__Inner>
                where __Inner: #trait_ident + Send + 'static
            {
                fn invoke(&self, __call: &::fakeall::Call)
                    -> ::std::result::Result<::fakeall::Returned,
                                             ::fakeall::Thrown>
                {
                    #[allow(unused_mut, unused_variables)]
                    let mut __inner = self.0.lock()
                        .unwrap_or_else(::std::sync::PoisonError::into_inner);
                    match __call.method().name() {
                        #(#arms)*
                        _ => Err(::fakeall::FakeError::NoWrappedInstance {
                            call: __call.to_string()
                        }.into())
                    }
                }
            }
        )
    }
}

impl ToTokens for FakeTrait {
    fn to_tokens(&self, tokens: &mut TokenStream) {
        let trait_ident = &self.ident;
        let trait_name = self.ident.to_string();
        let fake_ident = self.fake_ident();
        let invoker_ident = self.invoker_ident();
        let unsafety = &self.unsafety;
        let vis = &self.vis;
        let doc = format!("Fake implementation of [`{}`]", trait_name);
        let inherent = self.methods.iter()
            .map(|m| m.gen_inherent(&trait_name));
        let members = self.methods.iter()
            .map(|m| m.gen_member(vis));
        let impls = self.methods.iter()
            .map(|m| m.gen_impl(&fake_ident));
        let invoker = self.gen_invoker();
        quote!(
            #[doc = #doc]
            #[derive(Clone, Debug)]
            #vis struct #fake_ident {
                manager: ::std::sync::Arc<::fakeall::FakeManager>,
            }

            #[allow(dead_code)]
            impl #fake_ident {
                /// A fake with no rules.  Unconfigured calls return dummies.
                pub fn new() -> Self {
                    #fake_ident {
                        manager: ::fakeall::FakeManager::new(#trait_name)
                    }
                }

                /// A fake configured by `options`
                pub fn with_options(options: ::fakeall::FakeOptions)
                    -> ::fakeall::Result<Self>
                {
                    let manager = ::fakeall::FakeManager::with_options(
                        #trait_name, options)?;
                    Ok(#fake_ident { manager })
                }

                /// A fake that forwards unconfigured calls to `inner`
                pub fn wrapping<__Inner>(inner: __Inner) -> Self
                    where __Inner: #trait_ident + Send + 'static
                {
                    let invoker = #invoker_ident(::std::sync::Mutex::new(inner));
                    #fake_ident {
                        manager: ::fakeall::FakeManager::wrapping(#trait_name,
                                                                  invoker)
                    }
                }

                /// Like `wrapping`, with more options
                pub fn wrapping_with<__Inner>(inner: __Inner,
                                              options: ::fakeall::FakeOptions)
                    -> ::fakeall::Result<Self>
                    where __Inner: #trait_ident + Send + 'static
                {
                    let invoker = #invoker_ident(::std::sync::Mutex::new(inner));
                    Self::with_options(options.wrapping(invoker))
                }

                #(#inherent)*

                #(#members)*
            }

            impl ::std::default::Default for #fake_ident {
                fn default() -> Self {
                    Self::new()
                }
            }

            impl ::fakeall::Faked for #fake_ident {
                fn fake_manager(&self)
                    -> &::std::sync::Arc<::fakeall::FakeManager>
                {
                    &self.manager
                }
            }

            #unsafety impl #trait_ident for #fake_ident {
                #(#impls)*
            }

            #invoker
        ).to_tokens(tokens);
    }
}

#[cfg(test)]
mod t {
    use super::*;

    fn parse(input: TokenStream) -> FakeTrait {
        let item: ItemTrait = parse2(input).unwrap();
        FakeTrait::new(&item)
    }

    #[test]
    fn names() {
        let ft = parse(quote!(pub trait Foo { fn foo(&self); }));
        assert_eq!("FakeFoo", ft.fake_ident().to_string());
        assert_eq!("__FakeFooInvoker", ft.invoker_ident().to_string());
        assert_eq!(1, ft.methods.len());
    }

    #[test]
    fn implied_supertraits() {
        let ft = parse(quote!(trait Foo: Send + Sync + std::fmt::Debug {
            fn foo(&self);
        }));
        assert_eq!(1, ft.methods.len());
    }

    #[test]
    fn generates_fake_struct() {
        let ft = parse(quote!(trait Foo { fn foo(&self, x: u32) -> u32; }));
        let out = ft.to_token_stream().to_string();
        assert!(out.contains(&quote!(struct FakeFoo).to_string()));
        assert!(out.contains(&quote!(impl Foo for FakeFoo).to_string()));
        assert!(out.contains(&quote!(pub fn call_to_foo).to_string()));
        assert!(out.contains(&quote!(pub fn foo_call).to_string()));
        // The trait method defers to the inherent one
        assert!(out.contains(&quote!(FakeFoo::foo(self, x)).to_string()));
    }

    #[test]
    #[should_panic(expected = "fakeall does not support generic traits")]
    fn generic_trait() {
        parse(quote!(trait Foo<T> { fn foo(&self, t: T); }));
    }

    #[test]
    #[should_panic(expected = "fakeall can not implement this supertrait")]
    fn supertrait() {
        parse(quote!(trait Foo: Bar { fn foo(&self); }));
    }

    #[test]
    #[should_panic(expected = "fakeall can not fake a method with the name of one of the fake's constructors")]
    fn constructor_name() {
        parse(quote!(trait Foo { fn wrapping(&self); }));
    }

    #[test]
    #[should_panic(expected = "fakeall can only fake methods")]
    fn associated_type() {
        parse(quote!(trait Foo { type Item; fn foo(&self); }));
    }
}

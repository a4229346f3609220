// vim: tw=80
//! Proc Macros for use with Fakeall
//!
//! You probably don't want to use this crate directly.  Instead, you use use
//! its reexports via the [`fakeall`](../fakeall/index.html) crate.

#![cfg_attr(feature = "nightly_derive", feature(proc_macro_diagnostic))]
extern crate proc_macro;

use cfg_if::cfg_if;
use proc_macro2::{Span, TokenStream};
use quote::ToTokens;
use syn::spanned::Spanned;

mod fake_method;
mod fake_trait;

use crate::fake_trait::FakeTrait;

cfg_if! {
    // proc-macro2's Span::unstable method requires the nightly feature, and it
    // doesn't work in test mode.
    // https://github.com/alexcrichton/proc-macro2/issues/159
    if #[cfg(all(feature = "nightly_derive", not(test)))] {
        fn compile_error(span: Span, msg: &str) {
            span.unstable()
                .error(msg)
                .emit();
        }
    } else {
        fn compile_error(_span: Span, msg: &str) {
            panic!("{}.  More information may be available when fakeall is built with the \"nightly\" feature.", msg);
        }
    }
}

fn do_fake(attrs: TokenStream, input: TokenStream) -> TokenStream {
    if !attrs.is_empty() {
        compile_error(attrs.span(), "#[fake] does not take any arguments");
    }
    match syn::parse2::<syn::ItemTrait>(input) {
        Ok(item) => FakeTrait::new(&item).into_token_stream(),
        Err(e) => {
            compile_error(e.span(), "#[fake] can only be applied to traits");
            TokenStream::new()
        }
    }
}

/// Automatically generate a fake implementation of a trait.
///
/// For a trait `Foo`, `#[fake]` emits the trait unchanged followed by a
/// struct named `FakeFoo` that implements it.  Every call to the struct's
/// trait methods is intercepted by its [`FakeManager`].  For each trait
/// method `foo`, the struct also gets:
///
/// * `foo_method()`, the faked method's identity,
/// * `foo_call(constraints...)`, a matcher for calls to `foo`, for use with
///   assertions,
/// * `call_to_foo(&self, constraints...)`, which starts configuring a rule
///   for those calls.
///
/// Plus the constructors `new`, `with_options`, `wrapping` and
/// `wrapping_with`.
///
/// Arguments passed by shared reference are recorded as owned values, and
/// arguments passed by mutable reference are ref parameters whose value may
/// be replaced by the call.
///
/// # Examples
///
/// ```ignore
/// # use fakeall::*;
/// #[fake]
/// pub trait Foo {
///     fn foo(&self, x: u32, name: &str) -> u32;
///     fn bar(&mut self, out: &mut String);
///     async fn baz(&self) -> Vec<u8>;
/// }
/// ```
///
/// # Limitations
///
/// Generic traits, generic methods, methods without a `&self` or `&mut self`
/// receiver, associated types and constants, `impl Trait` types and methods
/// returning references are not supported.
///
/// [`FakeManager`]: ../fakeall/struct.FakeManager.html
#[proc_macro_attribute]
pub fn fake(attrs: proc_macro::TokenStream, input: proc_macro::TokenStream)
    -> proc_macro::TokenStream
{
    let input: proc_macro2::TokenStream = input.into();
    let mut output = input.clone();
    output.extend(do_fake(attrs.into(), input));
    output.into()
}

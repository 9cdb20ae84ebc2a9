use proc_macro::TokenStream;
use quote::quote;
use syn::{parse_macro_input, spanned::Spanned, Ident, ItemFn, LitStr};

/// Test attribute used throughout rxlite.
///
/// - `#[rxlite_macro::test]` on a sync fn expands to `#[test]`.
/// - `#[rxlite_macro::test]` on an async fn expands to a current-thread
///   `#[tokio::test]`.
/// - `#[rxlite_macro::test(local)]` additionally runs the async body inside a
///   `tokio::task::LocalSet`, which `LocalScheduler` needs for `spawn_local`.
#[proc_macro_attribute]
pub fn test(attr: TokenStream, item: TokenStream) -> TokenStream {
  let input = parse_macro_input!(item as ItemFn);
  let is_async = input.sig.asyncness.is_some();

  let raw_args = proc_macro2::TokenStream::from(attr);
  let local_set = if raw_args.is_empty() {
    false
  } else {
    if !is_async {
      return syn::Error::new(
        raw_args.span(),
        "rxlite_macro::test(local) is only supported on async tests",
      )
      .to_compile_error()
      .into();
    }
    let flavor = if let Ok(ident) = syn::parse2::<Ident>(raw_args.clone()) {
      ident.to_string()
    } else if let Ok(lit) = syn::parse2::<LitStr>(raw_args.clone()) {
      lit.value()
    } else {
      String::new()
    };
    if flavor != "local" {
      return syn::Error::new(
        raw_args.span(),
        "rxlite_macro::test only accepts: #[rxlite_macro::test] or #[rxlite_macro::test(local)]",
      )
      .to_compile_error()
      .into();
    }
    true
  };

  if !is_async {
    return quote!(#[test] #input).into();
  }

  if !local_set {
    return quote!(#[tokio::test(flavor = "current_thread")] #input).into();
  }

  let ItemFn { attrs, vis, sig, block } = input;
  let expanded = quote! {
    #[tokio::test(flavor = "current_thread")]
    #(#attrs)*
    #vis #sig {
      tokio::task::LocalSet::new().run_until(async move #block).await
    }
  };
  expanded.into()
}

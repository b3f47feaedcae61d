mod model;
mod route;

use proc_macro::TokenStream;

/// Creates a new documentation function for the route, named after the original function with the suffix `_docs`.
#[proc_macro_attribute]
pub fn route(args: TokenStream, input: TokenStream) -> TokenStream {
	route::from_input(args, input)
}

/// Creates two new structs, `CreateX` and `UpdateX`, for the model `X`.
/// Fields with #[serde(skip_deserializing)] are skipped in both, and all other
/// fields (excluding `id`) are included verbatim (including attributes).
/// Fields marked #[model(create_only)] only appear in `CreateX`.
#[proc_macro_attribute]
pub fn model(_args: TokenStream, input: TokenStream) -> TokenStream {
	model::from_input(input)
}

use darling::{ast, FromDeriveInput, FromField};
use proc_macro2::TokenTree;
use quote::{format_ident, quote, ToTokens};
use syn::Meta;

#[derive(Debug, FromDeriveInput)]
#[darling(supports(struct_named), forward_attrs)]
struct ModelInputReceiver {
	ident: syn::Ident,

	generics: syn::Generics,

	data: ast::Data<(), ModelFieldReceiver>,

	attrs: Vec<syn::Attribute>,
}

#[derive(Debug, FromField)]
#[darling(forward_attrs)]
struct ModelFieldReceiver {
	ident: Option<syn::Ident>,

	ty: syn::Type,
	vis: syn::Visibility,

	attrs: Vec<syn::Attribute>,
}

/// Options given to a field through `#[model(...)]`.
#[derive(Default)]
struct FieldOptions {
	/// The field can be set on creation but never updated.
	create_only: bool,
}

fn is_model_attr(attr: &syn::Attribute) -> bool {
	attr.path().is_ident("model")
}

fn field_options(attrs: &[syn::Attribute]) -> syn::Result<FieldOptions> {
	let mut options = FieldOptions::default();

	for attr in attrs.iter().filter(|attr| is_model_attr(attr)) {
		attr.parse_nested_meta(|meta| {
			if meta.path.is_ident("create_only") {
				options.create_only = true;
				Ok(())
			} else {
				Err(meta.error("unknown model option, expected `create_only`"))
			}
		})?;
	}

	Ok(options)
}

/// Whether the field has #[serde(skip_deserializing)] or #[serde(skip)]
fn is_skipped(attrs: &[syn::Attribute]) -> bool {
	attrs.iter().any(|attr| {
		let Meta::List(ref list) = attr.meta else {
			return false;
		};

		if !list.path.is_ident("serde") {
			return false;
		}

		list.tokens.to_token_stream().into_iter().any(|token| {
			matches!(token, TokenTree::Ident(ref ident) if ident == "skip_deserializing" || ident == "skip")
		})
	})
}

pub fn from_input(input: proc_macro::TokenStream) -> proc_macro::TokenStream {
	let mut input = syn::parse_macro_input!(input as syn::DeriveInput);
	let receiver = match ModelInputReceiver::from_derive_input(&input) {
		Ok(x) => x,
		Err(e) => return e.write_errors().into(),
	};

	// #[model(...)] is only meaningful to this macro, so it is removed
	// before the original struct is emitted again.
	if let syn::Data::Struct(ref mut data) = input.data {
		for field in data.fields.iter_mut() {
			field.attrs.retain(|attr| !is_model_attr(attr));
		}
	}

	let ident = &receiver.ident;
	let vis = &input.vis;
	let generics = &receiver.generics;
	let create_ident = format_ident!("Create{}", ident);
	let update_ident = format_ident!("Update{}", ident);

	let attrs = &receiver.attrs;

	let fields = receiver.data.take_struct().expect("expected struct");
	let mut kept = Vec::new();

	for field in fields.iter() {
		let Some(ident) = field.ident.as_ref() else {
			continue;
		};

		if is_skipped(&field.attrs) {
			continue;
		}

		let options = match field_options(&field.attrs) {
			Ok(options) => options,
			Err(e) => return e.into_compile_error().into(),
		};

		let attrs = field
			.attrs
			.iter()
			.filter(|attr| !is_model_attr(attr))
			.collect::<Vec<_>>();

		kept.push((attrs, ident, &field.ty, &field.vis, options));
	}

	let create_fields = kept.iter().map(|(attrs, ident, ty, vis, _)| {
		quote! {
			#(#attrs)*
			#vis #ident: #ty,
		}
	});

	let update_fields = kept
		.iter()
		.filter(|(.., options)| !options.create_only)
		.map(|(attrs, ident, ty, vis, _)| {
			quote! {
				#(#attrs)*
				#vis #ident: Option<#ty>,
			}
		});

	quote! {
		#input

		#(#attrs)*
		#vis struct #create_ident #generics {
			#(
				#create_fields
			)*
		}

		#(#attrs)*
		#vis struct #update_ident #generics {
			#(
				#update_fields
			)*
		}
	}
	.into()
}

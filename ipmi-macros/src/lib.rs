/*
 * SPDX-FileCopyrightText: 2025 UnionTech Software Technology Co., Ltd.
 *
 * SPDX-License-Identifier: GPL-2.0-or-later
 */
extern crate proc_macro;

use proc_macro::TokenStream;
use proc_macro2::TokenStream as TokenStream2;
use quote::quote;
use syn::{parse_macro_input, Data, DataStruct, DeriveInput, Fields, Type};

fn is_primitive(ty: &Type) -> bool {
    match ty {
        Type::Path(path) => path.path.segments.last().map_or(false, |seg| {
            matches!(
                seg.ident.to_string().as_str(),
                "u8" | "u16" | "u32" | "u64" | "i8" | "i16" | "i32" | "i64"
            )
        }),
        _ => false,
    }
}

/// Wire size of one field, as a const expression.
fn raw_size(ty: &Type) -> TokenStream2 {
    if is_primitive(ty) {
        quote! { ::std::mem::size_of::<#ty>() }
    } else if let Type::Array(arr) = ty {
        let elem = raw_size(&arr.elem);
        let len = &arr.len;
        quote! { (#elem) * (#len) }
    } else {
        quote! { <#ty>::RAW_SIZE }
    }
}

fn field_reader(ty: &Type) -> TokenStream2 {
    if is_primitive(ty) {
        quote! {{
            let n = ::std::mem::size_of::<#ty>();
            let mut buf = [0u8; ::std::mem::size_of::<#ty>()];
            buf.copy_from_slice(&bytes[offset..offset + n]);
            offset += n;
            <#ty>::from_le_bytes(buf)
        }}
    } else if let Type::Array(arr) = ty {
        let elem_ty = &arr.elem;
        let len = &arr.len;
        let elem = field_reader(elem_ty);
        quote! {{
            let mut arr = [<#elem_ty>::default(); #len];
            for slot in arr.iter_mut() {
                *slot = #elem;
            }
            arr
        }}
    } else {
        let size = raw_size(ty);
        quote! {{
            let part = &bytes[offset..offset + #size];
            offset += #size;
            <#ty>::from_le_bytes(part)?
        }}
    }
}

fn field_writer(ty: &Type, value: TokenStream2) -> TokenStream2 {
    if is_primitive(ty) {
        quote! { out.extend_from_slice(&#value.to_le_bytes()); }
    } else if let Type::Array(arr) = ty {
        let inner = field_writer(&arr.elem, quote! { item });
        quote! {
            for item in #value.iter() {
                #inner
            }
        }
    } else {
        quote! { out.extend_from_slice(&#value.to_le_bytes()); }
    }
}

/// Field-by-field little-endian codec for fixed-size payloads.
///
/// Generates `RAW_SIZE`, `from_le_bytes` (length must match exactly) and
/// `to_le_bytes`. Fields are encoded in declaration order with no padding,
/// so host struct layout never leaks onto the wire.
#[proc_macro_derive(AsBytes)]
pub fn derive_as_bytes(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);
    let name = input.ident;

    let fields = match &input.data {
        Data::Struct(DataStruct {
            fields: Fields::Named(fields),
            ..
        }) => &fields.named,
        _ => {
            return syn::Error::new_spanned(name, "AsBytes only supports structs with named fields")
                .to_compile_error()
                .into()
        }
    };

    let mut sizes = Vec::new();
    let mut readers = Vec::new();
    let mut writers = Vec::new();
    for f in fields.iter() {
        let Some(ident) = f.ident.as_ref() else {
            continue;
        };
        let ty = &f.ty;
        sizes.push(raw_size(ty));
        let reader = field_reader(ty);
        readers.push(quote! { #ident: #reader, });
        writers.push(field_writer(ty, quote! { self.#ident }));
    }

    let expanded = quote! {
        impl #name {
            pub const RAW_SIZE: usize = 0 #(+ #sizes)*;

            #[allow(unused_assignments)]
            pub fn from_le_bytes(bytes: &[u8]) -> Result<Self, &'static str> {
                if bytes.len() != Self::RAW_SIZE {
                    return Err("payload length mismatch");
                }
                let mut offset = 0usize;
                Ok(Self {
                    #(#readers)*
                })
            }

            pub fn to_le_bytes(&self) -> Vec<u8> {
                let mut out = Vec::with_capacity(Self::RAW_SIZE);
                #(#writers)*
                out
            }
        }
    };
    TokenStream::from(expanded)
}

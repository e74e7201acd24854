//! Derive macro for the pointfx particle emitter crate.
//!
//! [`GpuRecord`] turns a plain Rust struct into a record whose memory layout
//! is shared between CPU writers and WGSL kernels. It generates:
//!
//! - A companion `{Name}Gpu` struct, `#[repr(C)]` + `Pod`, with explicit
//!   padding fields so that it matches WGSL alignment rules
//! - A `WGSL_STRUCT` constant with the same fields and padding
//! - `{FIELD}_OFFSET` constants on the companion struct, one per field
//! - `to_gpu()` / `from_gpu()` conversions
//!
//! The macro is re-exported from `pointfx`; depend on that crate instead.
//!
//! ```ignore
//! use pointfx::{GpuRecord, Vec3};
//!
//! #[derive(GpuRecord, Clone, Copy)]
//! struct Spark {
//!     position: Vec3,
//!     velocity: Vec3,
//!     age: f32,
//! }
//! ```
//!
//! ## GPU Memory Layout
//!
//! - `Vec3` is 12 bytes but 16-byte aligned in WGSL
//! - `Vec4` is 16 bytes, 16-byte aligned
//! - `Vec2` is 8 bytes, 8-byte aligned
//! - `f32`, `u32`, `i32` are 4 bytes, 4-byte aligned
//! - The record stride is rounded up to a multiple of 16 bytes

use proc_macro::TokenStream;
use proc_macro2::Span;
use quote::quote;
use syn::{parse_macro_input, Data, DeriveInput, Fields, Ident, Type};

/// Derive a GPU-shareable layout for a struct with named fields.
///
/// # Supported field types
///
/// `Vec2`, `Vec3`, `Vec4` (bare or `glam::` qualified), `f32`, `u32`, `i32`.
///
/// # Panics
///
/// The macro panics at compile time if applied to an enum or a tuple struct.
/// Unsupported field types are reported as a compile error on the field.
#[proc_macro_derive(GpuRecord)]
pub fn derive_gpu_record(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);
    let name = &input.ident;
    let name_str = name.to_string();
    let gpu_name = Ident::new(&format!("{}Gpu", name), Span::call_site());

    let fields = match &input.data {
        Data::Struct(data) => match &data.fields {
            Fields::Named(fields) => &fields.named,
            _ => panic!("GpuRecord derive only supports structs with named fields"),
        },
        _ => panic!("GpuRecord derive only supports structs"),
    };

    let mut layout = Layout::default();
    let mut to_gpu_conversions = Vec::new();
    let mut from_gpu_conversions = Vec::new();
    let mut offset_consts = Vec::new();
    let mut offset_entries = Vec::new();

    for field in fields.iter() {
        let field_name = field.ident.as_ref().expect("named field");
        let field_name_str = field_name.to_string();
        let Some(kind) = FieldKind::of(&field.ty) else {
            return syn::Error::new_spanned(
                &field.ty,
                "unsupported GpuRecord field type; expected f32, u32, i32, Vec2, Vec3 or Vec4",
            )
            .to_compile_error()
            .into();
        };

        layout.align_to(kind.align());
        let offset = layout.offset;

        let const_name = Ident::new(
            &format!("{}_OFFSET", field_name_str.to_uppercase()),
            Span::call_site(),
        );
        offset_consts.push(quote! {
            #[doc = concat!("Byte offset of `", #field_name_str, "` within the record.")]
            pub const #const_name: u32 = #offset;
        });
        offset_entries.push(quote! { (#field_name_str, #offset) });

        layout
            .wgsl_fields
            .push(format!("    {}: {},", field_name_str, kind.wgsl()));
        let gpu_field_type = kind.gpu_type();
        layout.gpu_fields.push(quote! { #field_name: #gpu_field_type });

        let (to_gpu, from_gpu) = kind.conversions(field_name);
        to_gpu_conversions.push(quote! { #field_name: #to_gpu });
        from_gpu_conversions.push(quote! { #field_name: #from_gpu });

        layout.offset += kind.size();
    }

    // Arrays of structs need a 16-byte stride once a vec3/vec4 is present.
    layout.align_to(16);
    let stride = layout.offset;

    let wgsl_struct = format!(
        "struct {} {{\n{}\n}}",
        name_str,
        layout.wgsl_fields.join("\n")
    );

    let pad_fields: Vec<_> = layout.pad_fields.iter().map(|(pad, count)| {
        if *count == 1 {
            quote! { #pad: 0.0 }
        } else {
            quote! { #pad: [0.0; #count] }
        }
    }).collect();

    let gpu_fields = &layout.gpu_fields;

    let expanded = quote! {
        #[doc = concat!("GPU layout of [`", #name_str, "`], generated by `#[derive(GpuRecord)]`.")]
        #[repr(C)]
        #[derive(Clone, Copy, Debug, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
        pub struct #gpu_name {
            #(pub #gpu_fields),*
        }

        impl #gpu_name {
            #(#offset_consts)*
        }

        const _: () = assert!(
            ::std::mem::size_of::<#gpu_name>() == #stride as usize,
            "GpuRecord layout does not match its WGSL stride"
        );

        impl pointfx::GpuRecord for #name {
            type Gpu = #gpu_name;

            const WGSL_STRUCT: &'static str = #wgsl_struct;
            const STRIDE: u32 = #stride;
            const FIELD_OFFSETS: &'static [(&'static str, u32)] = &[#(#offset_entries),*];

            fn to_gpu(&self) -> Self::Gpu {
                #gpu_name {
                    #(#to_gpu_conversions,)*
                    #(#pad_fields),*
                }
            }

            fn from_gpu(gpu: &Self::Gpu) -> Self {
                Self {
                    #(#from_gpu_conversions),*
                }
            }
        }
    };

    TokenStream::from(expanded)
}

/// Running layout state while walking the fields.
#[derive(Default)]
struct Layout {
    offset: u32,
    wgsl_fields: Vec<String>,
    gpu_fields: Vec<proc_macro2::TokenStream>,
    /// Padding field names and their length in f32 words.
    pad_fields: Vec<(Ident, usize)>,
}

impl Layout {
    /// Insert an explicit padding field so the next field starts on `align`.
    fn align_to(&mut self, align: u32) {
        let padding_needed = (align - (self.offset % align)) % align;
        if padding_needed == 0 {
            return;
        }

        let pad_name_str = format!("_pad{}", self.pad_fields.len());
        let pad_name = Ident::new(&pad_name_str, Span::call_site());
        let count = (padding_needed / 4) as usize;

        if count == 1 {
            self.wgsl_fields.push(format!("    {}: f32,", pad_name_str));
            self.gpu_fields.push(quote! { #pad_name: f32 });
        } else {
            self.wgsl_fields
                .push(format!("    {}: array<f32, {}>,", pad_name_str, count));
            self.gpu_fields.push(quote! { #pad_name: [f32; #count] });
        }
        self.pad_fields.push((pad_name, count));
        self.offset += padding_needed;
    }
}

/// Shape of one supported field type.
#[derive(Clone, Copy)]
enum FieldKind {
    /// A 4-byte WGSL scalar, named as in both languages (`f32`, `u32`, `i32`).
    Scalar(&'static str),
    /// A glam float vector with this many lanes.
    Vector(u32),
}

impl FieldKind {
    fn of(ty: &Type) -> Option<Self> {
        let key = quote!(#ty).to_string().replace(' ', "");
        let bare = key.strip_prefix("glam::").unwrap_or(&key);
        match bare {
            "f32" => Some(Self::Scalar("f32")),
            "u32" => Some(Self::Scalar("u32")),
            "i32" => Some(Self::Scalar("i32")),
            "Vec2" => Some(Self::Vector(2)),
            "Vec3" => Some(Self::Vector(3)),
            "Vec4" => Some(Self::Vector(4)),
            _ => None,
        }
    }

    fn size(self) -> u32 {
        match self {
            Self::Scalar(_) => 4,
            Self::Vector(lanes) => 4 * lanes,
        }
    }

    /// WGSL alignment: vec3 rounds up to vec4.
    fn align(self) -> u32 {
        match self {
            Self::Scalar(_) => 4,
            Self::Vector(lanes) => 4 * lanes.next_power_of_two(),
        }
    }

    fn wgsl(self) -> String {
        match self {
            Self::Scalar(name) => name.to_string(),
            Self::Vector(lanes) => format!("vec{lanes}<f32>"),
        }
    }

    fn gpu_type(self) -> proc_macro2::TokenStream {
        match self {
            Self::Scalar(name) => {
                let ident = Ident::new(name, Span::call_site());
                quote! { #ident }
            }
            Self::Vector(lanes) => {
                let lanes = lanes as usize;
                quote! { [f32; #lanes] }
            }
        }
    }

    /// Rust → GPU and GPU → Rust conversion expressions for `field`.
    fn conversions(self, field: &Ident) -> (proc_macro2::TokenStream, proc_macro2::TokenStream) {
        match self {
            Self::Scalar(_) => (quote! { self.#field }, quote! { gpu.#field }),
            Self::Vector(lanes) => {
                let glam_ty = Ident::new(&format!("Vec{lanes}"), Span::call_site());
                (
                    quote! { self.#field.to_array() },
                    quote! { glam::#glam_ty::from_array(gpu.#field) },
                )
            }
        }
    }
}

//! Service layer module root.
//! Stateless building blocks of the single-document signing pipeline.

pub mod canonicalizer;
pub mod document_merger;
pub mod signature_assembler;
pub mod signed_attributes_builder;

pub use canonicalizer::{canonicalize, canonicalize_object};
pub use document_merger::{merge, merge_fields, merge_text};
pub use signature_assembler::{encode_signed_data, SignatureAssembler, SignedDataFields};
pub use signed_attributes_builder::SignedAttributesBuilder;

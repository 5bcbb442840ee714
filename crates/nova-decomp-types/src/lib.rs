//! Semantic JVM types for the decompiler IR: the [`VarType`] model, descriptor and generic
//! signature parsing, and the read-only [`SymbolDb`] the inference pass queries.

#![forbid(unsafe_code)]

mod descriptor;
mod error;
mod generics;
mod signature;
mod store;
mod symbols;
mod var_type;

pub use crate::descriptor::{
    parse_class_or_array, parse_field_descriptor, parse_method_descriptor, MethodDescriptor,
};
pub use crate::error::{Error, Result};
pub use crate::generics::{
    all_generics, class_binding, generic_supertype, is_assignable, GenericMap, NamedGenerics,
};
pub use crate::signature::{
    parse_class_signature, parse_field_signature, parse_method_signature, ClassSignature,
    MethodSignature, TypeParam,
};
pub use crate::store::ClassStore;
pub use crate::symbols::{package_of, AccessFlags, ClassInfo, FieldInfo, MethodInfo, SymbolDb};
pub use crate::var_type::{
    TypeFamily, TypeKind, VarType, Wildcard, JAVA_LANG_CLASS, JAVA_LANG_OBJECT, JAVA_LANG_STRING,
};

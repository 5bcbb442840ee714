//! Java source spelling of [`VarType`]s.

use nova_decomp_types::{TypeKind, VarType, Wildcard};

use crate::context::DecompileContext;

/// Source name of a type without array brackets: `int`, `String`, `List<? extends T>`.
pub fn type_name(ty: &VarType, ctx: &DecompileContext<'_>) -> String {
    match ty.kind() {
        TypeKind::Unknown => "<unknown>".to_string(),
        TypeKind::Null => "<nulltype>".to_string(),
        TypeKind::GenVar => ty.name_or_empty().to_string(),
        TypeKind::Object => {
            let mut out = ctx.short_name(ty.name_or_empty());
            if !ty.args().is_empty() {
                out.push_str(&arguments_text(ty.args(), ctx));
            }
            out
        }
        kind => kind.keyword().unwrap_or("<unknown>").to_string(),
    }
}

/// [`type_name`] followed by one `[]` per array dimension.
pub fn cast_type_name(ty: &VarType, ctx: &DecompileContext<'_>) -> String {
    let mut out = type_name(ty, ctx);
    for _ in 0..ty.array_dim() {
        out.push_str("[]");
    }
    out
}

fn argument_text(arg: Option<&VarType>, ctx: &DecompileContext<'_>) -> String {
    let Some(arg) = arg else {
        return "?".to_string();
    };
    let bare = cast_type_name(&arg.without_wildcard(), ctx);
    match arg.wildcard() {
        Wildcard::None => bare,
        Wildcard::Extends => format!("? extends {bare}"),
        Wildcard::Super => format!("? super {bare}"),
    }
}

/// `<A, B>` for declared type arguments; a lone dummy variable renders as the diamond `<>`.
pub(crate) fn arguments_text(args: &[Option<VarType>], ctx: &DecompileContext<'_>) -> String {
    if let [Some(only)] = args {
        if only.is_dummy_var() {
            return "<>".to_string();
        }
    }
    let parts: Vec<String> = args.iter().map(|arg| argument_text(arg.as_ref(), ctx)).collect();
    format!("<{}>", parts.join(", "))
}

/// `<A, B>` for inferred method or constructor type arguments.
pub(crate) fn inferred_arguments_text(args: &[VarType], ctx: &DecompileContext<'_>) -> String {
    let wrapped: Vec<Option<VarType>> = args.iter().cloned().map(Some).collect();
    arguments_text(&wrapped, ctx)
}

/// Box class for a primitive kind, as used by `valueOf` and `xxxValue` calls.
pub(crate) fn box_class(kind: TypeKind) -> Option<&'static str> {
    Some(match kind {
        TypeKind::Boolean => "java/lang/Boolean",
        TypeKind::Byte | TypeKind::ByteChar => "java/lang/Byte",
        TypeKind::Char => "java/lang/Character",
        TypeKind::Short | TypeKind::ShortChar => "java/lang/Short",
        TypeKind::Int => "java/lang/Integer",
        TypeKind::Long => "java/lang/Long",
        TypeKind::Float => "java/lang/Float",
        TypeKind::Double => "java/lang/Double",
        _ => return None,
    })
}

/// Wrapper type of a primitive, as a type argument must be. Small integer constants box to
/// `Integer` like the literals they came from.
pub(crate) fn boxed(ty: &VarType) -> VarType {
    if ty.array_dim() > 0 {
        return ty.clone();
    }
    let class = match ty.kind() {
        TypeKind::ByteChar | TypeKind::ShortChar => Some("java/lang/Integer"),
        kind => box_class(kind),
    };
    class.map_or_else(|| ty.clone(), VarType::object)
}

/// Primitive kind boxed by `class`, if it is one of the wrapper classes.
pub(crate) fn unboxed_kind(class: &str) -> Option<TypeKind> {
    Some(match class {
        "java/lang/Boolean" => TypeKind::Boolean,
        "java/lang/Byte" => TypeKind::Byte,
        "java/lang/Character" => TypeKind::Char,
        "java/lang/Short" => TypeKind::Short,
        "java/lang/Integer" => TypeKind::Int,
        "java/lang/Long" => TypeKind::Long,
        "java/lang/Float" => TypeKind::Float,
        "java/lang/Double" => TypeKind::Double,
        _ => return None,
    })
}

/// Primitive type of a wrapper class, or the type itself.
pub(crate) fn unboxed(ty: &VarType) -> VarType {
    if ty.array_dim() == 0 && ty.kind() == TypeKind::Object {
        if let Some(kind) = unboxed_kind(ty.name_or_empty()) {
            return VarType::primitive(kind);
        }
    }
    ty.clone()
}

#[cfg(test)]
mod tests {
    use super::*;
    use nova_decomp_types::ClassStore;
    use pretty_assertions::assert_eq;

    #[test]
    fn renders_wildcards_arrays_and_diamonds() {
        let store = ClassStore::new();
        let ctx = DecompileContext::new(&store, "a/Main");
        let list = VarType::generic(
            "java/util/List",
            vec![Some(VarType::gen_var("T").resize_array_dim(1).with_wildcard(Wildcard::Extends))],
        );
        assert_eq!(cast_type_name(&list, &ctx), "java.util.List<? extends T[]>");
        assert_eq!(cast_type_name(&VarType::int().resize_array_dim(2), &ctx), "int[][]");
        assert_eq!(cast_type_name(&VarType::byte_char(), &ctx), "byte");
        let raw = VarType::generic("java/util/ArrayList", vec![None]);
        assert_eq!(type_name(&raw, &ctx), "java.util.ArrayList<?>");
        assert_eq!(inferred_arguments_text(&[VarType::dummy_var()], &ctx), "<>");
    }
}

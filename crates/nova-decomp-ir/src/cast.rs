//! Rendering a value where a given type is expected, with an explicit cast when implicit
//! conversion does not reach that type.

use nova_decomp_text::TextBuffer;
use nova_decomp_types::{TypeFamily, TypeKind, VarType, Wildcard};

use crate::context::DecompileContext;
use crate::emit::Emitter;
use crate::error::Result;
use crate::exprent::{ExprKind, Exprent};
use crate::java_type::cast_type_name;
use crate::new::NewKind;

/// Treatment of a `null` value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum NullCast {
    /// `(T)null`, to pick an overload.
    Cast,
    /// `null` unless the ordinary rules require a cast.
    #[default]
    DontCast,
    /// Never cast `null`, even when the ordinary rules would.
    DontCastAtAll,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CastFlags {
    pub null: NullCast,
    pub cast_always: bool,
    /// Int constants flowing into `byte`, `short`, `char`, `Byte` or `Short` are cast.
    pub narrowing: bool,
    /// A `valueOf` boxing call renders as its primitive argument.
    pub unbox: bool,
}

impl CastFlags {
    pub fn null(mut self, null: NullCast) -> Self {
        self.null = null;
        self
    }

    pub fn always(mut self, cast_always: bool) -> Self {
        self.cast_always = cast_always;
        self
    }

    pub fn narrowing(mut self, narrowing: bool) -> Self {
        self.narrowing = narrowing;
        self
    }

    pub fn unbox(mut self, unbox: bool) -> Self {
        self.unbox = unbox;
        self
    }
}

/// Appends `expr` to `buf` as a value of `left_type`. Returns whether a cast was written.
pub fn casted_exprent(
    expr: &Exprent,
    left_type: &VarType,
    buf: &mut TextBuffer,
    indent: usize,
    flags: CastFlags,
    ctx: &DecompileContext<'_>,
) -> Result<bool> {
    Emitter::new(ctx).casted(expr, left_type, buf, indent, flags)
}

/// Byte, short and char positions an int constant needs a cast to reach.
fn is_narrowed_int_type(ty: &VarType) -> bool {
    VarType::int().is_strict_superset(ty)
        || ty.is_class_named("java/lang/Byte")
        || ty.is_class_named("java/lang/Short")
}

fn is_int_constant(e: &Exprent) -> bool {
    e.as_const().is_some_and(|c| {
        c.ty.array_dim() == 0
            && matches!(
                c.ty.kind(),
                TypeKind::Byte | TypeKind::ByteChar | TypeKind::Short | TypeKind::ShortChar | TypeKind::Int
            )
    })
}

impl Emitter<'_> {
    pub(crate) fn casted(
        &mut self,
        expr: &Exprent,
        left_type: &VarType,
        buf: &mut TextBuffer,
        indent: usize,
        flags: CastFlags,
    ) -> Result<bool> {
        let ctx = *self.ctx();
        let mut expr = expr;
        let mut left = left_type.clone();

        if flags.unbox {
            if let Some(call) = expr.as_invocation() {
                if call.is_boxing_call(&ctx) && !self.decorations().keeps_boxing(expr.id()) {
                    let param = call.parsed.params.first().cloned();
                    expr = &call.args[0];
                    if let Some(param) = param.filter(|p| {
                        p.array_dim() == 0 && matches!(p.kind(), TypeKind::Byte | TypeKind::Short | TypeKind::Char)
                    }) {
                        left = param;
                    }
                }
            }
        }

        let right = self.inferred(expr, Some(&left));

        let do_cast = !left.is_superset(&right) && (right.is_object_class() || left.kind() != TypeKind::Object);
        let do_cast_null = flags.null == NullCast::Cast && right.is_null() && left.kind() != TypeKind::Unknown;
        let do_cast_narrowing = flags.narrowing && is_int_constant(expr) && is_narrowed_int_type(&left);
        let do_cast_generics = self.contravariance_needs_cast(&left, &right);

        let mut cast = flags.cast_always || do_cast || do_cast_null || do_cast_narrowing || do_cast_generics;
        if flags.null == NullCast::DontCastAtAll && right.is_null() {
            cast = flags.cast_always;
        }

        let lambda_cast = !cast
            && expr
                .as_new()
                .is_some_and(|n| matches!(n.kind, NewKind::Lambda(_)))
            && right.kind() == TypeKind::Object
            && left.kind() == TypeKind::Object
            && !ctx.symbols.is_subtype(right.name_or_empty(), left.name_or_empty());

        let quote = cast && expr.precedence(ctx.options) >= 1;

        if flags.narrowing && expr.as_const().is_some_and(|c| !c.is_null()) {
            if left.is_class_named("java/lang/Byte") {
                left = VarType::byte();
            } else if left.is_class_named("java/lang/Short") {
                left = VarType::short();
            }
        }

        if cast {
            buf.append("(").append(&cast_type_name(&left, &ctx)).append(")");
        }
        if lambda_cast {
            buf.append("(").append(&cast_type_name(&right, &ctx)).append(")");
        }
        if quote {
            buf.append("(");
        }
        let text = match &expr.kind {
            ExprKind::Const(c) => {
                let mut text = buf.sibling();
                text.add_bytecode_mapping(expr.bytecode.iter());
                text.append(&c.literal(&c.adjusted_type(&left), &ctx)?);
                text
            }
            _ => self.emit(expr, indent)?,
        };
        buf.append_buffer(&text)?;
        if quote {
            buf.append(")");
        }
        if cast {
            tracing::trace!(target: "nova.decomp.ir", to = %left, from = %right, "explicit cast");
        }
        Ok(cast)
    }

    /// A `? super X` argument receiving a concrete type that is not a supertype of `X`.
    fn contravariance_needs_cast(&self, left: &VarType, right: &VarType) -> bool {
        if left.kind() != TypeKind::Object || right.kind() != TypeKind::Object {
            return false;
        }
        if left.args().is_empty() || left.args().len() != right.args().len() {
            return false;
        }
        let db = self.ctx().symbols;
        left.args().iter().zip(right.args()).any(|(l, r)| match (l, r) {
            (Some(l), Some(r)) => {
                l.wildcard() == Wildcard::Super
                    && r.wildcard() == Wildcard::None
                    && l.kind() == TypeKind::Object
                    && r.kind() == TypeKind::Object
                    && l.family() == TypeFamily::Object
                    && !db.is_subtype(l.name_or_empty(), r.name_or_empty())
            }
            _ => false,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constant::ConstExprent;
    use crate::var::{VarExprent, VarVersion};
    use nova_decomp_types::ClassStore;
    use pretty_assertions::assert_eq;

    fn render(expr: &Exprent, left: &VarType, flags: CastFlags) -> (String, bool) {
        let store = ClassStore::new();
        let ctx = DecompileContext::new(&store, "a/Main");
        let mut buf = TextBuffer::default();
        let cast = casted_exprent(expr, left, &mut buf, 0, flags, &ctx).unwrap();
        (buf.into_string(), cast)
    }

    #[test]
    fn widening_needs_no_cast() {
        let e = Exprent::new(ConstExprent::int(5, false));
        assert_eq!(render(&e, &VarType::int(), CastFlags::default()), ("5".to_string(), false));
    }

    #[test]
    fn narrowing_a_long_casts() {
        let e = Exprent::new(VarExprent::new(VarVersion::new(1, 0), VarType::long()));
        assert_eq!(
            render(&e, &VarType::int(), CastFlags::default()),
            ("(int)var1".to_string(), true)
        );
    }

    #[test]
    fn int_constants_narrow_into_boxed_shorts() {
        let e = Exprent::new(ConstExprent::typed_int(VarType::int(), 7));
        let (text, cast) = render(
            &e,
            &VarType::object("java/lang/Short"),
            CastFlags::default().narrowing(true),
        );
        assert_eq!(text, "(short)7");
        assert!(cast);
    }

    #[test]
    fn null_casts_only_on_request() {
        let e = Exprent::new(ConstExprent::null());
        let target = VarType::string();
        assert_eq!(render(&e, &target, CastFlags::default()).0, "null");
        assert_eq!(
            render(&e, &target, CastFlags::default().null(NullCast::Cast)).0,
            "(String)null"
        );
        assert_eq!(
            render(&e, &target, CastFlags::default().null(NullCast::DontCastAtAll).always(false)).0,
            "null"
        );
    }
}

//! Min/max type constraints an expression places on its direct children, consumed by the
//! type widening pass.

use nova_decomp_types::{TypeFamily, TypeKind, VarType};

use crate::context::DecompileContext;
use crate::exit::ExitKind;
use crate::exprent::{ExprId, ExprKind, Exprent};
use crate::function::{FunctionExprent, FunctionType};
use crate::new::NewKind;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct CheckTypesResult {
    /// The tightest type each child may take.
    pub min_types: Vec<(ExprId, VarType)>,
    /// The widest type each child may take without an explicit cast.
    pub max_types: Vec<(ExprId, VarType)>,
}

impl CheckTypesResult {
    pub fn add_min(&mut self, e: &Exprent, ty: VarType) {
        self.min_types.push((e.id(), ty));
    }

    pub fn add_max(&mut self, e: &Exprent, ty: VarType) {
        self.max_types.push((e.id(), ty));
    }

    fn add_min_of_family(&mut self, e: &Exprent, family: TypeFamily) {
        if let Some(min) = VarType::min_type_in_family(family) {
            self.add_min(e, min);
        }
    }

    pub fn is_empty(&self) -> bool {
        self.min_types.is_empty() && self.max_types.is_empty()
    }
}

pub(crate) fn check_type_bounds(e: &Exprent, ctx: &DecompileContext<'_>) -> CheckTypesResult {
    let mut result = CheckTypesResult::default();
    match &e.kind {
        ExprKind::Array(a) => {
            result.add_min(&a.index, VarType::byte_char());
            result.add_max(&a.index, VarType::int());
        }
        ExprKind::Assignment(a) => {
            let left = a.left.expr_type(ctx);
            let right = a.right.expr_type(ctx);
            if left.family() > right.family() {
                result.add_min_of_family(&a.right, left.family());
            } else if left.family() < right.family() {
                result.add_min(&a.left, right);
            } else if let Some(common) = VarType::common_supertype(&left, &right, ctx.symbols) {
                result.add_min(&a.left, common);
            }
        }
        ExprKind::Function(f) => function_bounds(f, e, ctx, &mut result),
        ExprKind::Invocation(inv) => {
            if let Some(instance) = &inv.instance {
                let ty = instance.expr_type(ctx);
                result.add_min_of_family(instance, ty.family());
                result.add_max(instance, ty);
            }
            for (arg, param) in inv.args.iter().zip(&inv.parsed.params) {
                result.add_min_of_family(arg, param.family());
                result.add_max(arg, param.clone());
            }
        }
        ExprKind::New(n) => match &n.kind {
            NewKind::Array { dims, elements, .. } => {
                for dim in dims {
                    result.add_min(dim, VarType::byte_char());
                    result.add_max(dim, VarType::int());
                }
                if n.new_type.array_dim() == 1 {
                    let element = n.new_type.decrease_array_dim();
                    for el in elements {
                        result.add_min_of_family(el, element.family());
                        result.add_max(el, element.clone());
                    }
                }
            }
            NewKind::Object {
                constructor: Some(ctor),
                ..
            } => {
                for (arg, param) in ctor.args.iter().zip(&ctor.parsed.params) {
                    result.add_min_of_family(arg, param.family());
                    result.add_max(arg, param.clone());
                }
            }
            _ => {}
        },
        ExprKind::Exit(exit) => {
            if let (ExitKind::Return, Some(value)) = (exit.kind, &exit.value) {
                if exit.method_return.kind() != TypeKind::Void {
                    result.add_min_of_family(value, exit.method_return.family());
                    result.add_max(value, exit.method_return.clone());
                }
            }
        }
        ExprKind::Switch(s) => {
            if s.value.expr_type(ctx).family() == TypeFamily::Integer {
                result.add_min(&s.value, VarType::byte_char());
                result.add_max(&s.value, VarType::int());
            }
        }
        _ => {}
    }
    result
}

fn function_bounds(f: &FunctionExprent, e: &Exprent, ctx: &DecompileContext<'_>, result: &mut CheckTypesResult) {
    use FunctionType::*;
    let Some(first) = f.operands.first() else {
        return;
    };
    match f.func {
        Ternary => {
            let family = e.expr_type(ctx).family();
            result.add_min(first, VarType::boolean());
            for branch in f.operands.iter().skip(1) {
                result.add_min_of_family(branch, family);
            }
        }
        I2L | I2F | I2D | I2B | I2C | I2S => {
            result.add_min(first, VarType::byte_char());
            result.add_max(first, VarType::int());
        }
        PostDecrement | PreDecrement | PostIncrement | PreIncrement => {
            let ty = e.expr_type(ctx);
            result.add_min(first, ty.clone());
            result.add_max(first, ty);
        }
        Add | Sub | Mul | Div | Rem | Shl | Shr | Ushr | Lt | Ge | Gt | Le => {
            if let Some(second) = f.operands.get(1) {
                result.add_min(second, VarType::byte_char());
            }
            result.add_min(first, VarType::byte_char());
        }
        Neg | BitNot => result.add_min(first, VarType::byte_char()),
        And | Or | Xor | Eq | Ne => {
            let Some(second) = f.operands.get(1) else {
                return;
            };
            let left = first.expr_type(ctx);
            let right = second.expr_type(ctx);
            if left.kind() == TypeKind::Boolean {
                if right.is_strict_superset(&left) {
                    result.add_min(first, VarType::byte_char());
                } else if false_boolean(first, &left, ctx) || false_boolean(second, &right, ctx) {
                    result.add_min(first, VarType::byte_char());
                    result.add_min(second, VarType::byte_char());
                }
            } else if right.kind() == TypeKind::Boolean && left.is_strict_superset(&right) {
                result.add_min(second, VarType::byte_char());
            }
        }
        _ => {}
    }
}

/// A boolean-typed operand that may really be an integer.
fn false_boolean(e: &Exprent, ty: &VarType, ctx: &DecompileContext<'_>) -> bool {
    ty.is_false_boolean()
        || e.as_const()
            .is_some_and(|c| !c.has_boolean_value(ctx.options))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::array::ArrayExprent;
    use crate::assignment::AssignmentExprent;
    use crate::constant::ConstExprent;
    use crate::var::{VarExprent, VarVersion};
    use nova_decomp_types::ClassStore;
    use pretty_assertions::assert_eq;

    fn var(index: u32, ty: VarType) -> Exprent {
        Exprent::new(VarExprent::new(VarVersion::new(index, 0), ty))
    }

    #[test]
    fn array_indices_are_int_bounded() {
        let store = ClassStore::new();
        let ctx = DecompileContext::new(&store, "a/Main");
        let e = Exprent::new(ArrayExprent::new(
            var(1, VarType::int().resize_array_dim(1)),
            var(2, VarType::byte_char()),
            VarType::int(),
        ));
        let index_id = match &e.kind {
            ExprKind::Array(a) => a.index.id(),
            _ => unreachable!(),
        };
        let result = e.check_type_bounds(&ctx);
        assert_eq!(result.min_types, vec![(index_id, VarType::byte_char())]);
        assert_eq!(result.max_types, vec![(index_id, VarType::int())]);
    }

    #[test]
    fn wider_left_side_raises_the_right_minimum() {
        let store = ClassStore::new();
        let ctx = DecompileContext::new(&store, "a/Main");
        let e = Exprent::new(AssignmentExprent::new(
            var(1, VarType::long()),
            Exprent::new(ConstExprent::int(7, false)),
        ));
        let right_id = match &e.kind {
            ExprKind::Assignment(a) => a.right.id(),
            _ => unreachable!(),
        };
        let result = e.check_type_bounds(&ctx);
        assert_eq!(result.min_types, vec![(right_id, VarType::long())]);
        assert!(result.max_types.is_empty());
    }

    #[test]
    fn boolean_comparisons_with_non_boolean_constants_demote_both_sides() {
        let store = ClassStore::new();
        let ctx = DecompileContext::new(&store, "a/Main");
        let left = var(1, VarType::boolean());
        let right = Exprent::new(ConstExprent::int(5, false));
        let (left_id, right_id) = (left.id(), right.id());
        let e = Exprent::new(FunctionExprent::new(FunctionType::Eq, vec![left, right]));
        let result = e.check_type_bounds(&ctx);
        assert_eq!(
            result.min_types,
            vec![(left_id, VarType::byte_char()), (right_id, VarType::byte_char())]
        );
    }

    #[test]
    fn leaves_have_no_bounds() {
        let store = ClassStore::new();
        let ctx = DecompileContext::new(&store, "a/Main");
        assert!(var(1, VarType::int()).check_type_bounds(&ctx).is_empty());
    }
}

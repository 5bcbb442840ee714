use std::ops::RangeInclusive;

use nova_decomp_types::{TypeFamily, TypeKind, VarType};

use crate::constant::{ConstExprent, ConstValue};
use crate::context::DecompileContext;
use crate::error::{EmitError, Result};
use crate::exprent::Exprent;

/// Operators of [`FunctionExprent`], one per bytecode-level operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FunctionType {
    Add,
    Sub,
    Mul,
    Div,
    And,
    Or,
    Xor,
    Rem,
    Shl,
    Shr,
    Ushr,
    BitNot,
    BoolNot,
    Neg,
    I2L,
    I2F,
    I2D,
    L2I,
    L2F,
    L2D,
    F2I,
    F2L,
    F2D,
    D2I,
    D2L,
    D2F,
    I2B,
    I2C,
    I2S,
    /// Operands: value, then a type-only constant naming the target.
    Cast,
    /// Operands: value, type-only constant, optional pattern variable.
    InstanceOf,
    ArrayLength,
    PostDecrement,
    PreDecrement,
    PostIncrement,
    PreIncrement,
    Ternary,
    Lcmp,
    Fcmpl,
    Fcmpg,
    Dcmpl,
    Dcmpg,
    Eq,
    Ne,
    Lt,
    Ge,
    Gt,
    Le,
    BoolAnd,
    BoolOr,
    StrConcat,
}

impl FunctionType {
    pub fn precedence(self) -> u8 {
        use FunctionType::*;
        match self {
            ArrayLength | PostDecrement | PostIncrement | Lcmp | Fcmpl | Fcmpg | Dcmpl | Dcmpg => 0,
            BitNot | BoolNot | Neg | PreDecrement | PreIncrement | Cast => 1,
            I2L | I2F | I2D | L2I | L2F | L2D | F2I | F2L | F2D | D2I | D2L | D2F | I2B | I2C
            | I2S => 1,
            Mul | Div | Rem => 2,
            Add | Sub | StrConcat => 3,
            Shl | Shr | Ushr => 4,
            Lt | Ge | Gt | Le | InstanceOf => 5,
            Eq | Ne => 6,
            And => 7,
            Xor => 8,
            Or => 9,
            BoolAnd => 10,
            BoolOr => 11,
            Ternary => 12,
        }
    }

    /// Operators whose same-operator right operand needs no parentheses.
    pub fn is_associative(self) -> bool {
        use FunctionType::*;
        matches!(self, Add | Mul | And | Or | Xor | BoolAnd | BoolOr | StrConcat)
    }

    pub fn is_increment(self) -> bool {
        use FunctionType::*;
        matches!(self, PostDecrement | PreDecrement | PostIncrement | PreIncrement)
    }

    pub fn is_conversion(self) -> bool {
        self.conversion_target().is_some()
    }

    /// Infix spelling of binary operators.
    pub fn infix(self) -> Option<&'static str> {
        use FunctionType::*;
        Some(match self {
            Add | StrConcat => " + ",
            Sub => " - ",
            Mul => " * ",
            Div => " / ",
            And => " & ",
            Or => " | ",
            Xor => " ^ ",
            Rem => " % ",
            Shl => " << ",
            Shr => " >> ",
            Ushr => " >>> ",
            Eq => " == ",
            Ne => " != ",
            Lt => " < ",
            Ge => " >= ",
            Gt => " > ",
            Le => " <= ",
            BoolAnd => " && ",
            BoolOr => " || ",
            _ => return None,
        })
    }

    pub fn conversion_target(self) -> Option<VarType> {
        use FunctionType::*;
        Some(match self {
            L2I | F2I | D2I => VarType::int(),
            I2L | F2L | D2L => VarType::long(),
            I2F | L2F | D2F => VarType::float(),
            I2D | L2D | F2D => VarType::double(),
            I2B => VarType::byte(),
            I2C => VarType::char(),
            I2S => VarType::short(),
            _ => return None,
        })
    }

    fn arity(self) -> RangeInclusive<usize> {
        use FunctionType::*;
        match self {
            BitNot | BoolNot | Neg | ArrayLength | PostDecrement | PreDecrement | PostIncrement
            | PreIncrement => 1..=1,
            _ if self.is_conversion() => 1..=1,
            InstanceOf => 2..=3,
            Ternary => 3..=3,
            StrConcat => 2..=usize::MAX,
            _ => 2..=2,
        }
    }

    pub fn is_comparison(self) -> bool {
        use FunctionType::*;
        matches!(self, Eq | Ne | Lt | Ge | Gt | Le)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct FunctionExprent {
    pub func: FunctionType,
    pub operands: Vec<Exprent>,
    /// For casts: whether the cast is rendered at all.
    pub needs_cast: bool,
}

impl FunctionExprent {
    pub fn new(func: FunctionType, operands: Vec<Exprent>) -> Self {
        Self {
            func,
            operands,
            needs_cast: true,
        }
    }

    pub fn cast(value: Exprent, target: VarType) -> Self {
        Self::new(
            FunctionType::Cast,
            vec![value, Exprent::new(ConstExprent::type_only(target))],
        )
    }

    pub fn instance_of(value: Exprent, target: VarType, pattern: Option<Exprent>) -> Self {
        let mut operands = vec![value, Exprent::new(ConstExprent::type_only(target))];
        operands.extend(pattern);
        Self::new(FunctionType::InstanceOf, operands)
    }

    pub fn with_needs_cast(mut self, needs_cast: bool) -> Self {
        self.needs_cast = needs_cast;
        self
    }

    /// Checks that the operand count matches the operator.
    pub fn validate(&self) -> Result<()> {
        if self.func.arity().contains(&self.operands.len()) {
            Ok(())
        } else {
            Err(EmitError::malformed(
                "function",
                format!("{:?} with {} operands", self.func, self.operands.len()),
            ))
        }
    }

    /// Target of a cast or `instanceof`.
    pub fn target_type(&self) -> Option<&VarType> {
        match self.func {
            FunctionType::Cast | FunctionType::InstanceOf => {
                self.operands.get(1).and_then(|op| op.as_const()).map(|c| &c.ty)
            }
            _ => None,
        }
    }

    fn operand_type(&self, idx: usize, ctx: &DecompileContext<'_>) -> VarType {
        self.operands
            .get(idx)
            .map_or_else(VarType::unknown, |op| op.expr_type(ctx))
    }

    pub fn expr_type(&self, ctx: &DecompileContext<'_>) -> VarType {
        use FunctionType::*;
        match self.func {
            PostDecrement | PreDecrement | PostIncrement | PreIncrement => self.operand_type(0, ctx),
            BoolNot | Eq | Ne | Lt | Ge | Gt | Le | InstanceOf | BoolAnd | BoolOr => VarType::boolean(),
            BitNot | Neg | Shl | Shr | Ushr => promoted(&self.operand_type(0, ctx)),
            Add | Sub | Mul | Div | Rem => {
                binary_numeric(&self.operand_type(0, ctx), &self.operand_type(1, ctx))
            }
            And | Or | Xor => {
                let (left, right) = (self.operand_type(0, ctx), self.operand_type(1, ctx));
                if left.kind() == TypeKind::Boolean && right.kind() == TypeKind::Boolean {
                    VarType::boolean()
                } else {
                    binary_numeric(&left, &right)
                }
            }
            Cast => self.target_type().cloned().unwrap_or_else(VarType::unknown),
            ArrayLength | Lcmp | Fcmpl | Fcmpg | Dcmpl | Dcmpg => VarType::int(),
            Ternary => self.ternary_type(ctx),
            StrConcat => VarType::string(),
            _ => self.func.conversion_target().unwrap_or_else(VarType::unknown),
        }
    }

    fn ternary_type(&self, ctx: &DecompileContext<'_>) -> VarType {
        let int_constant = |idx: usize| {
            self.operands.get(idx).and_then(|op| op.as_const()).is_some_and(|c| {
                matches!(c.value, ConstValue::Int(_))
                    && c.ty.family() == TypeFamily::Integer
                    && c.ty.array_dim() == 0
            })
        };
        if int_constant(1) && int_constant(2) {
            return VarType::int();
        }
        let (left, right) = (self.operand_type(1, ctx), self.operand_type(2, ctx));
        VarType::common_supertype(&left, &right, ctx.symbols).unwrap_or_else(|| {
            tracing::debug!(
                target: "nova.decomp.ir",
                left = %left,
                right = %right,
                "ternary branches share no supertype"
            );
            VarType::object_type()
        })
    }
}

/// Unary numeric promotion.
fn promoted(ty: &VarType) -> VarType {
    if ty.family() == TypeFamily::Integer {
        VarType::int()
    } else {
        ty.clone()
    }
}

/// Binary numeric promotion.
fn binary_numeric(left: &VarType, right: &VarType) -> VarType {
    let family = left.family().max(right.family());
    match family {
        TypeFamily::Double => VarType::double(),
        TypeFamily::Float => VarType::float(),
        TypeFamily::Long => VarType::long(),
        TypeFamily::Integer | TypeFamily::Boolean => VarType::int(),
        _ => left.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::var::{VarExprent, VarVersion};
    use nova_decomp_types::ClassStore;

    fn var(index: u32, ty: VarType) -> Exprent {
        Exprent::new(VarExprent::new(VarVersion::new(index, 0), ty))
    }

    #[test]
    fn arithmetic_promotes_operands() {
        let store = ClassStore::new();
        let ctx = DecompileContext::new(&store, "a/Main");
        let mul = FunctionExprent::new(FunctionType::Mul, vec![var(1, VarType::byte()), var(2, VarType::long())]);
        assert_eq!(mul.expr_type(&ctx), VarType::long());
        let neg = FunctionExprent::new(FunctionType::Neg, vec![var(1, VarType::short())]);
        assert_eq!(neg.expr_type(&ctx), VarType::int());
    }

    #[test]
    fn ternary_of_small_constants_is_int() {
        let store = ClassStore::new();
        let ctx = DecompileContext::new(&store, "a/Main");
        let ternary = FunctionExprent::new(
            FunctionType::Ternary,
            vec![
                var(1, VarType::boolean()),
                Exprent::new(ConstExprent::int(3, false)),
                Exprent::new(ConstExprent::int(300, false)),
            ],
        );
        assert_eq!(ternary.expr_type(&ctx), VarType::int());
    }

    #[test]
    fn operand_count_is_validated() {
        let bad = FunctionExprent::new(FunctionType::Add, vec![var(1, VarType::int())]);
        assert!(matches!(bad.validate(), Err(EmitError::MalformedNode { kind: "function", .. })));
    }
}

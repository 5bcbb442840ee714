use nova_decomp_types::{TypeKind, VarType};

use crate::context::DecompileContext;
use crate::exprent::Exprent;

/// `array[index]`.
#[derive(Debug, Clone, PartialEq)]
pub struct ArrayExprent {
    pub array: Box<Exprent>,
    pub index: Box<Exprent>,
    /// Element type implied by the load or store instruction.
    pub hard_type: VarType,
}

impl ArrayExprent {
    pub fn new(array: Exprent, index: Exprent, hard_type: VarType) -> Self {
        Self {
            array: Box::new(array),
            index: Box::new(index),
            hard_type,
        }
    }

    pub fn expr_type(&self, ctx: &DecompileContext<'_>) -> VarType {
        let array = self.array.expr_type(ctx);
        if array.kind() == TypeKind::Null || array.array_dim() == 0 {
            self.hard_type.clone()
        } else {
            array.decrease_array_dim()
        }
    }
}

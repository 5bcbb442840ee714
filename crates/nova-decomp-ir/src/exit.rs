use nova_decomp_types::VarType;

use crate::exprent::Exprent;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitKind {
    Return,
    Throw,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ExitExprent {
    pub kind: ExitKind,
    pub value: Option<Box<Exprent>>,
    /// Descriptor return type of the enclosing method (or lambda).
    pub method_return: VarType,
}

impl ExitExprent {
    pub fn return_value(value: Option<Exprent>, method_return: VarType) -> Self {
        Self {
            kind: ExitKind::Return,
            value: value.map(Box::new),
            method_return,
        }
    }

    pub fn throw(value: Exprent) -> Self {
        Self {
            kind: ExitKind::Throw,
            value: Some(Box::new(value)),
            method_return: VarType::void(),
        }
    }
}

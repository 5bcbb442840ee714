use crate::exprent::Exprent;
use crate::function::FunctionType;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CompoundOp {
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
}

impl CompoundOp {
    /// The operator part of `op=`.
    pub fn symbol(self) -> &'static str {
        match self {
            CompoundOp::Add => "+",
            CompoundOp::Sub => "-",
            CompoundOp::Mul => "*",
            CompoundOp::Div => "/",
            CompoundOp::And => "&",
            CompoundOp::Or => "|",
            CompoundOp::Xor => "^",
            CompoundOp::Rem => "%",
            CompoundOp::Shl => "<<",
            CompoundOp::Shr => ">>",
            CompoundOp::Ushr => ">>>",
        }
    }

    pub fn from_function(func: FunctionType) -> Option<Self> {
        Some(match func {
            FunctionType::Add => CompoundOp::Add,
            FunctionType::Sub => CompoundOp::Sub,
            FunctionType::Mul => CompoundOp::Mul,
            FunctionType::Div => CompoundOp::Div,
            FunctionType::And => CompoundOp::And,
            FunctionType::Or => CompoundOp::Or,
            FunctionType::Xor => CompoundOp::Xor,
            FunctionType::Rem => CompoundOp::Rem,
            FunctionType::Shl => CompoundOp::Shl,
            FunctionType::Shr => CompoundOp::Shr,
            FunctionType::Ushr => CompoundOp::Ushr,
            _ => return None,
        })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct AssignmentExprent {
    pub left: Box<Exprent>,
    pub right: Box<Exprent>,
    /// `Some` for compound assignments such as `+=`.
    pub op: Option<CompoundOp>,
}

impl AssignmentExprent {
    pub fn new(left: Exprent, right: Exprent) -> Self {
        Self {
            left: Box::new(left),
            right: Box::new(right),
            op: None,
        }
    }

    pub fn compound(left: Exprent, op: CompoundOp, right: Exprent) -> Self {
        Self {
            op: Some(op),
            ..Self::new(left, right)
        }
    }
}

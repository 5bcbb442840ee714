//! Switch expressions and `yield`.

use std::collections::HashSet;

use nova_decomp_types::{TypeKind, VarType};

use crate::context::DecompileContext;
use crate::exit::ExitKind;
use crate::exprent::{ExprKind, Exprent};
use crate::new::NewKind;

#[derive(Debug, Clone, PartialEq)]
pub enum ArmBody {
    Expression(Box<Exprent>),
    /// Statements; the arm's value comes from a `yield`.
    Block(Vec<Exprent>),
}

#[derive(Debug, Clone, PartialEq)]
pub struct SwitchArm {
    /// Constants or enum field references; empty for a bare `default`.
    pub labels: Vec<Exprent>,
    pub is_default: bool,
    pub body: ArmBody,
}

impl SwitchArm {
    pub fn case(labels: Vec<Exprent>, body: ArmBody) -> Self {
        Self {
            labels,
            is_default: false,
            body,
        }
    }

    pub fn default(body: ArmBody) -> Self {
        Self {
            labels: Vec::new(),
            is_default: true,
            body,
        }
    }

    /// Values this arm produces: the body expression or the top-level `yield`s of a block.
    pub(crate) fn results(&self) -> Vec<&Exprent> {
        match &self.body {
            ArmBody::Expression(e) if !is_throw(e) => vec![&**e],
            ArmBody::Expression(_) => Vec::new(),
            ArmBody::Block(stmts) => stmts
                .iter()
                .filter_map(|stmt| match &stmt.kind {
                    ExprKind::Yield(y) => Some(&*y.value),
                    _ => None,
                })
                .collect(),
        }
    }

    /// The default arm javac adds to enum switches: it throws `IncompatibleClassChangeError`.
    pub(crate) fn is_synthetic_default(&self) -> bool {
        if !self.is_default || !self.labels.is_empty() {
            return false;
        }
        let thrown = match &self.body {
            ArmBody::Expression(e) => &**e,
            ArmBody::Block(stmts) if stmts.len() == 1 => &stmts[0],
            ArmBody::Block(_) => return false,
        };
        let ExprKind::Exit(exit) = &thrown.kind else {
            return false;
        };
        if exit.kind != ExitKind::Throw {
            return false;
        }
        exit.value
            .as_deref()
            .and_then(Exprent::as_new)
            .is_some_and(|new| {
                matches!(new.kind, NewKind::Object { .. })
                    && new.new_type.name_or_empty().contains("IncompatibleClassChange")
            })
    }
}

fn is_throw(e: &Exprent) -> bool {
    matches!(&e.kind, ExprKind::Exit(exit) if exit.kind == ExitKind::Throw)
}

#[derive(Debug, Clone, PartialEq)]
pub struct SwitchExprent {
    pub value: Box<Exprent>,
    pub arms: Vec<SwitchArm>,
}

impl SwitchExprent {
    pub fn new(value: Exprent, arms: Vec<SwitchArm>) -> Self {
        Self {
            value: Box::new(value),
            arms,
        }
    }

    /// Common supertype of all arm results; `Object` when they share none.
    pub fn expr_type(&self, ctx: &DecompileContext<'_>) -> VarType {
        self.result_type(|e| e.expr_type(ctx), ctx)
    }

    pub(crate) fn result_type(
        &self,
        mut type_of: impl FnMut(&Exprent) -> VarType,
        ctx: &DecompileContext<'_>,
    ) -> VarType {
        let mut acc: Option<VarType> = None;
        for arm in &self.arms {
            for result in arm.results() {
                let ty = type_of(result);
                acc = Some(match acc {
                    None => ty,
                    Some(prev) => match VarType::common_supertype(&prev, &ty, ctx.symbols) {
                        Some(common) => common,
                        None => return VarType::object_type(),
                    },
                });
            }
        }
        acc.unwrap_or_else(VarType::object_type)
    }

    /// Whether the switch covers every constant of its enum type, so the synthetic default
    /// arm can be dropped.
    pub fn is_exhaustive_enum(&self, ctx: &DecompileContext<'_>) -> bool {
        let ty = self.value.inferred_type(ctx, None);
        if ty.kind() != TypeKind::Object || ty.array_dim() != 0 {
            return false;
        }
        let Some(class) = ctx.symbols.lookup_class(ty.name_or_empty()) else {
            return false;
        };
        if !class.is_enum() {
            return false;
        }
        let covered: HashSet<&str> = self
            .arms
            .iter()
            .flat_map(|arm| arm.labels.iter())
            .filter_map(|label| label.as_field().map(|f| f.name.as_str()))
            .collect();
        let constants = class.enum_constants();
        !constants.is_empty() && constants.iter().all(|c| covered.contains(c))
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct YieldExprent {
    pub value: Box<Exprent>,
}

impl YieldExprent {
    pub fn new(value: Exprent) -> Self {
        Self {
            value: Box::new(value),
        }
    }
}

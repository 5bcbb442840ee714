//! Expression IR of the Java decompiler.
//!
//! Method bodies are trees of [`Exprent`] nodes, one closed [`ExprKind`] variant per kind of
//! expression. Rendering runs in two passes over a tree:
//!
//! 1. [`decorate`] infers the source-level type of every node, plans overloaded call
//!    arguments, and parameterizes lambdas, producing a [`Decorations`] side table.
//! 2. The emitter walks the tree again with those decorations and appends Java source to a
//!    [`nova_decomp_text::TextBuffer`], inserting the casts, parentheses and qualifiers a
//!    Java compiler needs to pick the same overloads and conversions.
//!
//! [`to_source_text`] runs both passes. Everything the passes consult about the surrounding
//! class, method and unit travels in an explicit [`DecompileContext`].

#![forbid(unsafe_code)]

mod annotation;
mod array;
mod assert;
mod assignment;
mod bounds;
mod cast;
mod constant;
mod context;
mod emit;
mod error;
mod exit;
mod exprent;
mod field;
mod function;
mod infer;
mod invocation;
mod java_type;
mod literal;
mod monitor;
mod new;
mod offsets;
mod options;
mod switch;
mod var;

pub use crate::annotation::AnnotationExprent;
pub use crate::array::ArrayExprent;
pub use crate::assert::AssertExprent;
pub use crate::assignment::{AssignmentExprent, CompoundOp};
pub use crate::bounds::CheckTypesResult;
pub use crate::cast::{casted_exprent, CastFlags, NullCast};
pub use crate::constant::{guess_type, ConstExprent, ConstValue};
pub use crate::context::{
    ClassKind, ClassNode, ClassNodes, DecompileContext, ImportCollector, NestedClassWriter,
    NoNestedClasses,
};
pub use crate::emit::{list_to_java, to_source_text};
pub use crate::error::{EmitError, OptionsError, Result};
pub use crate::exit::{ExitExprent, ExitKind};
pub use crate::exprent::{ExprId, ExprKind, Exprent, ExprentUse};
pub use crate::field::FieldExprent;
pub use crate::function::{FunctionExprent, FunctionType};
pub use crate::infer::{
    decorate, ArgPlan, CallInference, CallPlan, CastDecoration, Decorations, Inferencer,
    LambdaTypes,
};
pub use crate::invocation::{Bootstrap, CallKind, InvocationExprent, InvocationKind};
pub use crate::java_type::{cast_type_name, type_name};
pub use crate::literal::{double_text, float_text};
pub use crate::monitor::{MonitorExprent, MonitorKind};
pub use crate::new::{LambdaBody, LambdaContent, LambdaExpr, NewExprent, NewKind};
pub use crate::offsets::BytecodeOffsets;
pub use crate::options::DecompilerOptions;
pub use crate::switch::{ArmBody, SwitchArm, SwitchExprent, YieldExprent};
pub use crate::var::{VarExprent, VarInfo, VarTable, VarVersion};

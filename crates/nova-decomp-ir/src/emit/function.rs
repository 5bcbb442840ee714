use nova_decomp_text::TextBuffer;
use nova_decomp_types::{VarType, JAVA_LANG_STRING};

use super::Emitter;
use crate::error::{EmitError, Result};
use crate::exprent::{ExprKind, Exprent};
use crate::function::{FunctionExprent, FunctionType};
use crate::java_type::cast_type_name;

impl Emitter<'_> {
    pub(super) fn emit_function(
        &mut self,
        e: &Exprent,
        f: &FunctionExprent,
        buf: &mut TextBuffer,
        indent: usize,
    ) -> Result<()> {
        use FunctionType::*;
        f.validate()?;
        let ops = &f.operands;
        match f.func {
            Cast => {
                let cast = match self.decor.cast(e.id()) {
                    Some(cast) => cast.clone(),
                    None => {
                        let bound = self.decor.bound_of(e.id());
                        self.inf.cast_decoration(f, bound.as_ref())
                    }
                };
                if !cast.elide {
                    buf.append("(").append(&cast_type_name(&cast.target, &self.ctx)).append(")");
                }
                let operand = self.operand(Cast, &ops[0], true, indent)?;
                buf.append_buffer(&operand)?;
            }
            InstanceOf => {
                let value = self.operand(InstanceOf, &ops[0], false, indent)?;
                buf.append_buffer(&value)?;
                let target = f.target_type().cloned().unwrap_or_else(VarType::unknown);
                buf.append(" instanceof ").append(&cast_type_name(&target, &self.ctx));
                if let Some(pattern) = ops.get(2) {
                    buf.append(" ");
                    match &pattern.kind {
                        ExprKind::Var(v) => {
                            buf.append(&self.ctx.vars.name(v.var));
                        }
                        _ => self.append_child(buf, pattern, indent)?,
                    }
                }
            }
            ArrayLength => {
                let array = self.operand(ArrayLength, &ops[0], false, indent)?;
                buf.append_buffer(&array)?;
                buf.append(".length");
            }
            BitNot | BoolNot | Neg | PreIncrement | PreDecrement => {
                buf.append(match f.func {
                    BitNot => "~",
                    BoolNot => "!",
                    Neg => "-",
                    PreIncrement => "++",
                    _ => "--",
                });
                let mut operand = self.operand(f.func, &ops[0], true, indent)?;
                if f.func == Neg && operand.as_str().starts_with('-') {
                    operand.enclose_with_parens();
                }
                buf.append_buffer(&operand)?;
            }
            PostIncrement | PostDecrement => {
                let operand = self.operand(f.func, &ops[0], false, indent)?;
                buf.append_buffer(&operand)?;
                buf.append(if f.func == PostIncrement { "++" } else { "--" });
            }
            Ternary => {
                let cond = self.operand(Ternary, &ops[0], true, indent)?;
                buf.append_buffer(&cond)?;
                buf.append(" ? ");
                let then = self.operand(Ternary, &ops[1], true, indent)?;
                buf.append_buffer(&then)?;
                buf.append(" : ");
                let otherwise = self.operand(Ternary, &ops[2], true, indent)?;
                buf.append_buffer(&otherwise)?;
            }
            Lcmp | Fcmpl | Fcmpg | Dcmpl | Dcmpg => {
                buf.append(match f.func {
                    Lcmp => "Long.compare(",
                    Fcmpl | Fcmpg => "Float.compare(",
                    _ => "Double.compare(",
                });
                self.append_child(buf, &ops[0], indent)?;
                buf.append(", ");
                self.append_child(buf, &ops[1], indent)?;
                buf.append(")");
            }
            StrConcat => self.emit_concat(ops, buf, indent)?,
            BoolAnd | BoolOr => {
                buf.push_newline_group(indent, 1);
                let left = self.operand(f.func, &ops[0], false, indent)?;
                buf.append_buffer(&left)?;
                buf.append_possible_newline(" ");
                buf.append(if f.func == BoolAnd { "&& " } else { "|| " });
                let right = self.operand(f.func, &ops[1], true, indent)?;
                buf.append_buffer(&right)?;
                buf.pop_newline_group()?;
            }
            func => match (func.conversion_target(), func.infix()) {
                (Some(target), _) => {
                    buf.append("(").append(&cast_type_name(&target, &self.ctx)).append(")");
                    let operand = self.operand(func, &ops[0], true, indent)?;
                    buf.append_buffer(&operand)?;
                }
                (None, Some(infix)) => {
                    let left = self.operand(func, &ops[0], false, indent)?;
                    buf.append_buffer(&left)?;
                    buf.append(infix);
                    let right = self.operand(func, &ops[1], true, indent)?;
                    buf.append_buffer(&right)?;
                }
                (None, None) => {
                    return Err(EmitError::malformed("function", format!("{func:?} has no source form")));
                }
            },
        }
        Ok(())
    }

    /// Renders an operand of `parent`. A right-hand operand of equal precedence keeps its
    /// parentheses unless it is the same associative operator.
    fn operand(&mut self, parent: FunctionType, operand: &Exprent, right: bool, indent: usize) -> Result<TextBuffer> {
        let own = parent.precedence();
        let theirs = operand.precedence(self.ctx.options);
        let parens = theirs > own
            || (right
                && theirs == own
                && !(parent.is_associative() && operand.as_function().is_some_and(|g| g.func == parent)));
        let mut text = self.emit(operand, indent)?;
        if parens {
            text.enclose_with_parens();
        }
        Ok(text)
    }

    /// `a + b + c` over all operands; `"" + ` leads when neither of the first two is a string.
    fn emit_concat(&mut self, ops: &[Exprent], buf: &mut TextBuffer, indent: usize) -> Result<()> {
        let leads_with_string = ops
            .iter()
            .take(2)
            .any(|op| self.inferred(op, None).is_class_named(JAVA_LANG_STRING));
        buf.push_newline_group(indent, 1);
        if !leads_with_string {
            buf.append("\"\" + ");
        }
        for (idx, op) in ops.iter().enumerate() {
            if idx > 0 {
                buf.append_possible_newline(" ");
                buf.append("+ ");
            }
            let text = self.operand(FunctionType::StrConcat, op, idx > 0 || !leads_with_string, indent)?;
            buf.append_buffer(&text)?;
        }
        buf.pop_newline_group()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use crate::constant::ConstExprent;
    use crate::context::DecompileContext;
    use crate::emit::to_source_text;
    use crate::exprent::Exprent;
    use crate::function::{FunctionExprent, FunctionType};
    use crate::var::{VarExprent, VarVersion};
    use nova_decomp_types::{ClassStore, VarType};
    use pretty_assertions::assert_eq;

    fn var(index: u32, ty: VarType) -> Exprent {
        Exprent::new(VarExprent::new(VarVersion::new(index, 0), ty))
    }

    fn func(func: FunctionType, operands: Vec<Exprent>) -> Exprent {
        Exprent::new(FunctionExprent::new(func, operands))
    }

    fn render(e: &Exprent) -> String {
        let store = ClassStore::new();
        let ctx = DecompileContext::new(&store, "a/Main");
        to_source_text(e, &ctx, 0).unwrap().into_string()
    }

    #[test]
    fn looser_children_get_parentheses() {
        let sum = func(FunctionType::Add, vec![var(1, VarType::int()), var(2, VarType::int())]);
        let product = func(FunctionType::Mul, vec![sum, var(3, VarType::int())]);
        assert_eq!(render(&product), "(var1 + var2) * var3");
    }

    #[test]
    fn right_operands_of_equal_precedence_keep_parentheses() {
        let diff = func(FunctionType::Sub, vec![var(2, VarType::int()), var(3, VarType::int())]);
        let outer = func(FunctionType::Sub, vec![var(1, VarType::int()), diff]);
        assert_eq!(render(&outer), "var1 - (var2 - var3)");

        let sum = func(FunctionType::Add, vec![var(2, VarType::int()), var(3, VarType::int())]);
        let outer = func(FunctionType::Add, vec![var(1, VarType::int()), sum]);
        assert_eq!(render(&outer), "var1 + var2 + var3");
    }

    #[test]
    fn double_negation_is_parenthesized() {
        let inner = func(FunctionType::Neg, vec![var(1, VarType::int())]);
        assert_eq!(render(&func(FunctionType::Neg, vec![inner])), "-(-var1)");
        let literal = Exprent::new(ConstExprent::int(-5, false));
        assert_eq!(render(&func(FunctionType::Neg, vec![literal])), "-(-5)");
    }

    #[test]
    fn comparisons_of_wide_types_call_compare() {
        let cmp = func(FunctionType::Lcmp, vec![var(1, VarType::long()), var(2, VarType::long())]);
        assert_eq!(render(&cmp), "Long.compare(var1, var2)");
    }

    #[test]
    fn concatenation_without_a_leading_string_starts_empty() {
        let concat = func(
            FunctionType::StrConcat,
            vec![var(1, VarType::int()), var(2, VarType::int()), Exprent::new(ConstExprent::string("!"))],
        );
        assert_eq!(render(&concat), "\"\" + var1 + var2 + \"!\"");
        let greeting = func(
            FunctionType::StrConcat,
            vec![Exprent::new(ConstExprent::string("n=")), var(1, VarType::int())],
        );
        assert_eq!(render(&greeting), "\"n=\" + var1");
    }

    #[test]
    fn conversions_and_ternaries() {
        let widened = func(FunctionType::I2L, vec![var(1, VarType::int())]);
        assert_eq!(render(&widened), "(long)var1");
        let ternary = func(
            FunctionType::Ternary,
            vec![var(1, VarType::boolean()), var(2, VarType::int()), var(3, VarType::int())],
        );
        assert_eq!(render(&ternary), "var1 ? var2 : var3");
    }

    #[test]
    fn arity_mismatches_are_malformed() {
        let store = ClassStore::new();
        let ctx = DecompileContext::new(&store, "a/Main");
        let broken = func(FunctionType::Add, vec![var(1, VarType::int())]);
        let err = to_source_text(&broken, &ctx, 0).unwrap_err();
        assert!(err.to_string().contains("malformed"), "{err}");
    }
}

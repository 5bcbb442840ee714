use nova_decomp_text::TextBuffer;
use nova_decomp_types::VarType;

use super::Emitter;
use crate::cast::CastFlags;
use crate::error::Result;
use crate::exprent::{ExprKind, Exprent};
use crate::switch::{ArmBody, SwitchArm, SwitchExprent};

impl Emitter<'_> {
    pub(super) fn emit_switch(&mut self, e: &Exprent, s: &SwitchExprent, buf: &mut TextBuffer, indent: usize) -> Result<()> {
        let value_type = self.inferred(&s.value, None);
        let result_type = self.decor.inferred_type(e.id()).cloned();
        let exhaustive = s.is_exhaustive_enum(&self.ctx);

        buf.append("switch (");
        self.append_child(buf, &s.value, indent)?;
        buf.append(") {").append_line_separator();
        for arm in &s.arms {
            if exhaustive && arm.is_synthetic_default() {
                continue;
            }
            buf.append_indent(indent + 1);
            self.arm_labels(arm, &value_type, buf, indent)?;
            buf.append(" -> ");
            match &arm.body {
                ArmBody::Expression(body) => {
                    match (&result_type, &body.kind) {
                        (Some(ty), kind) if !matches!(kind, ExprKind::Exit(_)) => {
                            self.casted(body, ty, buf, indent + 1, CastFlags::default())?;
                        }
                        _ => self.append_child(buf, body, indent + 1)?,
                    }
                    buf.append(";");
                }
                ArmBody::Block(stmts) => {
                    let inner = self.statements(stmts, indent + 2)?;
                    buf.append("{").append_line_separator();
                    buf.append_buffer(&inner)?;
                    buf.append_indent(indent + 1).append("}");
                }
            }
            buf.append_line_separator();
        }
        buf.append_indent(indent).append("}");
        Ok(())
    }

    /// `case A, B` or `default`. Enum labels render as bare constant names.
    fn arm_labels(&mut self, arm: &SwitchArm, value_type: &VarType, buf: &mut TextBuffer, indent: usize) -> Result<()> {
        if arm.is_default && arm.labels.is_empty() {
            buf.append("default");
            return Ok(());
        }
        buf.append("case ");
        for (idx, label) in arm.labels.iter().enumerate() {
            if idx > 0 {
                buf.append(", ");
            }
            match &label.kind {
                ExprKind::Field(f) if f.is_static() => {
                    buf.add_bytecode_mapping(label.bytecode.iter());
                    buf.append(&f.name);
                }
                ExprKind::Const(c) => {
                    buf.add_bytecode_mapping(label.bytecode.iter());
                    buf.append(&c.literal(&c.adjusted_type(value_type), &self.ctx)?);
                }
                _ => self.append_child(buf, label, indent)?,
            }
        }
        if arm.is_default {
            buf.append(", default");
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use crate::constant::ConstExprent;
    use crate::context::DecompileContext;
    use crate::emit::to_source_text;
    use crate::exit::ExitExprent;
    use crate::exprent::Exprent;
    use crate::field::FieldExprent;
    use crate::invocation::InvocationExprent;
    use crate::new::NewExprent;
    use crate::switch::{ArmBody, SwitchArm, SwitchExprent, YieldExprent};
    use crate::var::{VarExprent, VarVersion};
    use nova_decomp_types::{AccessFlags, ClassInfo, ClassStore, FieldInfo, VarType};
    use pretty_assertions::assert_eq;

    fn color_store() -> ClassStore {
        let flags = AccessFlags(AccessFlags::PUBLIC | AccessFlags::STATIC | AccessFlags::FINAL | AccessFlags::ENUM);
        ClassStore::new().with_class(
            ClassInfo::new("a/Color", AccessFlags(AccessFlags::PUBLIC | AccessFlags::FINAL | AccessFlags::ENUM))
                .with_super("java/lang/Enum")
                .with_field(FieldInfo::new("a/Color", "RED", "La/Color;", flags))
                .with_field(FieldInfo::new("a/Color", "GREEN", "La/Color;", flags)),
        )
    }

    fn label(name: &str) -> Exprent {
        Exprent::new(FieldExprent::new_static("a/Color", name, "La/Color;"))
    }

    fn int(v: i32) -> Box<Exprent> {
        Box::new(Exprent::new(ConstExprent::int(v, false)))
    }

    fn icce_default() -> SwitchArm {
        let error = Exprent::new(NewExprent::object(
            VarType::object("java/lang/IncompatibleClassChangeError"),
            Some(InvocationExprent::constructor("java/lang/IncompatibleClassChangeError", "()V", Vec::new())),
        ));
        SwitchArm::default(ArmBody::Expression(Box::new(Exprent::new(ExitExprent::throw(error)))))
    }

    #[test]
    fn exhaustive_enum_switches_drop_the_synthetic_default() {
        let store = color_store();
        let ctx = DecompileContext::new(&store, "a/Main");
        let value = Exprent::new(VarExprent::new(VarVersion::new(1, 0), VarType::object("a/Color")));
        let switch = Exprent::new(SwitchExprent::new(
            value,
            vec![
                SwitchArm::case(vec![label("RED")], ArmBody::Expression(int(1))),
                SwitchArm::case(vec![label("GREEN")], ArmBody::Expression(int(2))),
                icce_default(),
            ],
        ));
        assert_eq!(
            to_source_text(&switch, &ctx, 0).unwrap().into_string(),
            "switch (var1) {\n    case RED -> 1;\n    case GREEN -> 2;\n}"
        );
    }

    #[test]
    fn partial_enum_switches_keep_their_default() {
        let store = color_store();
        let ctx = DecompileContext::new(&store, "a/Main");
        let value = Exprent::new(VarExprent::new(VarVersion::new(1, 0), VarType::object("a/Color")));
        let switch = Exprent::new(SwitchExprent::new(
            value,
            vec![
                SwitchArm::case(vec![label("RED")], ArmBody::Expression(int(1))),
                icce_default(),
            ],
        ));
        let text = to_source_text(&switch, &ctx, 0).unwrap().into_string();
        assert!(text.contains("default -> throw new IncompatibleClassChangeError();"), "{text}");
    }

    #[test]
    fn char_labels_and_block_arms() {
        let store = ClassStore::new();
        let ctx = DecompileContext::new(&store, "a/Main");
        let value = Exprent::new(VarExprent::new(VarVersion::new(1, 0), VarType::char()));
        let switch = Exprent::new(SwitchExprent::new(
            value,
            vec![
                SwitchArm::case(
                    vec![Exprent::new(ConstExprent::int(97, false)), Exprent::new(ConstExprent::int(98, false))],
                    ArmBody::Expression(int(1)),
                ),
                SwitchArm::default(ArmBody::Block(vec![Exprent::new(YieldExprent::new(*int(0)))])),
            ],
        ));
        assert_eq!(
            to_source_text(&switch, &ctx, 0).unwrap().into_string(),
            "switch (var1) {\n    case 'a', 'b' -> 1;\n    default -> {\n        yield 0;\n    }\n}"
        );
    }
}

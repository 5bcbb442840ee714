//! Java source emission.
//!
//! Emission reads the [`Decorations`] produced by the inference pass and never mutates the
//! tree. Every node records its bytecode offsets in the buffer it renders into, and every
//! child is rendered into its own buffer and appended, so line-wrap groups nest with the
//! tree.

mod call;
mod function;
mod new;
mod switch;

use nova_decomp_text::TextBuffer;
use nova_decomp_types::{TypeKind, VarType};

use crate::assignment::AssignmentExprent;
use crate::cast::{CastFlags, NullCast};
use crate::context::DecompileContext;
use crate::error::Result;
use crate::exit::{ExitExprent, ExitKind};
use crate::exprent::{ExprId, ExprKind, Exprent};
use crate::field::FieldExprent;
use crate::infer::{decorate, this_class, CallPlan, Decorations, Inferencer};
use crate::invocation::InvocationExprent;
use crate::java_type::{cast_type_name, unboxed};
use crate::monitor::MonitorKind;
use crate::var::VarExprent;

/// Renders `root` at `indent`: runs the inference pass, then emits with its decorations.
pub fn to_source_text(root: &Exprent, ctx: &DecompileContext<'_>, indent: usize) -> Result<TextBuffer> {
    let decorations = decorate(root, ctx);
    let mut emitter = Emitter::with_decorations(ctx, decorations);
    let buf = emitter.emit(root, indent)?;
    tracing::debug!(target: "nova.decomp.ir", root = %root.id(), len = buf.len(), "emitted expression");
    Ok(buf)
}

/// Renders a statement list, one indented line per statement.
pub fn list_to_java(exprs: &[Exprent], ctx: &DecompileContext<'_>, indent: usize) -> Result<TextBuffer> {
    let mut decorations = Decorations::default();
    for e in exprs {
        decorations.merge(decorate(e, ctx));
    }
    Emitter::with_decorations(ctx, decorations).statements(exprs, indent)
}

pub(crate) struct Emitter<'a> {
    ctx: DecompileContext<'a>,
    inf: Inferencer<'a>,
    decor: Decorations,
    /// Expected results of the lambda bodies being rendered, innermost last.
    lambda_returns: Vec<Option<VarType>>,
}

impl<'a> Emitter<'a> {
    /// An emitter without decorations; every answer comes from the inferencer.
    pub(crate) fn new(ctx: &DecompileContext<'a>) -> Self {
        Self::with_decorations(ctx, Decorations::default())
    }

    pub(crate) fn with_decorations(ctx: &DecompileContext<'a>, decor: Decorations) -> Self {
        let inf = Inferencer::new(ctx).with_var_overrides(decor.var_types().clone());
        Self {
            ctx: *ctx,
            inf,
            decor,
            lambda_returns: Vec::new(),
        }
    }

    pub(crate) fn ctx(&self) -> &DecompileContext<'a> {
        &self.ctx
    }

    pub(crate) fn decorations(&self) -> &Decorations {
        &self.decor
    }

    fn buffer(&self) -> TextBuffer {
        TextBuffer::new(self.ctx.options.text_config())
    }

    pub(crate) fn inferred(&mut self, e: &Exprent, bound: Option<&VarType>) -> VarType {
        self.infer_as(e, bound, false)
    }

    fn infer_as(&mut self, e: &Exprent, bound: Option<&VarType>, as_instance: bool) -> VarType {
        match self.decor.inferred_with(e.id(), bound) {
            Some(ty) => ty.clone(),
            None => self.inf.infer(e, bound, as_instance),
        }
    }

    /// The recorded call plan of `id`, or one computed against the recorded bound.
    fn plan_for(&mut self, id: ExprId, inv: &InvocationExprent, outer_instance: bool) -> CallPlan {
        if let Some(plan) = self.decor.call_plan(id) {
            return plan.clone();
        }
        let bound = self.decor.bound_of(id);
        let prefix = self.inf.synthetic_prefix(inv, outer_instance);
        self.inf.call_plan(inv, bound.as_ref(), false, prefix)
    }

    pub(crate) fn emit(&mut self, e: &Exprent, indent: usize) -> Result<TextBuffer> {
        let mut buf = self.buffer();
        buf.add_bytecode_mapping(e.bytecode.iter());
        match &e.kind {
            ExprKind::Const(c) => {
                buf.append(&c.literal(&c.ty, &self.ctx)?);
            }
            ExprKind::Var(v) => self.emit_var(v, &mut buf),
            ExprKind::Field(f) => self.emit_field(f, &mut buf, indent)?,
            ExprKind::Array(a) => {
                let array_type = self.inferred(&a.array, None);
                let mut array = self.emit(&a.array, indent)?;
                if array_type.array_dim() == 0 && array_type.kind() != TypeKind::Unknown {
                    array.enclose("((Object[])", ")");
                } else if a.array.precedence(self.ctx.options) > 0 {
                    array.enclose_with_parens();
                }
                buf.append_buffer(&array)?;
                buf.append("[");
                self.append_child(&mut buf, &a.index, indent)?;
                buf.append("]");
            }
            ExprKind::Assignment(a) => self.emit_assignment(a, &mut buf, indent)?,
            ExprKind::Function(f) => self.emit_function(e, f, &mut buf, indent)?,
            ExprKind::Invocation(inv) => self.emit_invocation(e, inv, &mut buf, indent)?,
            ExprKind::New(n) => self.emit_new(e, n, &mut buf, indent)?,
            ExprKind::Monitor(m) => {
                if m.kind == MonitorKind::Enter {
                    buf.append("synchronized (");
                    self.append_child(&mut buf, &m.value, indent)?;
                    buf.append(")");
                }
            }
            ExprKind::Exit(exit) => self.emit_exit(e, exit, &mut buf, indent)?,
            ExprKind::Switch(s) => self.emit_switch(e, s, &mut buf, indent)?,
            ExprKind::Yield(y) => {
                buf.append("yield ");
                self.append_child(&mut buf, &y.value, indent)?;
            }
            ExprKind::Annotation(a) => {
                buf.append("@").append(&self.ctx.short_name(&a.class_name));
                match a.elements.as_slice() {
                    [] => {}
                    [(name, value)] if name == "value" => {
                        buf.append("(");
                        self.append_child(&mut buf, value, indent)?;
                        buf.append(")");
                    }
                    elements => {
                        buf.append("(");
                        for (idx, (name, value)) in elements.iter().enumerate() {
                            if idx > 0 {
                                buf.append(", ");
                            }
                            buf.append(name).append(" = ");
                            self.append_child(&mut buf, value, indent)?;
                        }
                        buf.append(")");
                    }
                }
            }
            ExprKind::Assert(a) => {
                buf.append("assert ");
                self.append_child(&mut buf, &a.condition, indent)?;
                if let Some(message) = &a.message {
                    buf.append(" : ");
                    self.append_child(&mut buf, message, indent)?;
                }
            }
        }
        Ok(buf)
    }

    fn append_child(&mut self, buf: &mut TextBuffer, child: &Exprent, indent: usize) -> Result<()> {
        let text = self.emit(child, indent)?;
        buf.append_buffer(&text)?;
        Ok(())
    }

    /// Renders `child`, parenthesized when it binds more loosely than `precedence`.
    fn wrapped(&mut self, child: &Exprent, precedence: u8, indent: usize) -> Result<TextBuffer> {
        let mut text = self.emit(child, indent)?;
        if child.precedence(self.ctx.options) > precedence {
            text.enclose_with_parens();
        }
        Ok(text)
    }

    /// One line per statement; statements rendering to nothing are skipped.
    pub(crate) fn statements(&mut self, exprs: &[Exprent], indent: usize) -> Result<TextBuffer> {
        let mut buf = self.buffer();
        for e in exprs {
            let text = self.emit(e, indent)?;
            if text.contains_only_whitespace() {
                continue;
            }
            buf.append_indent(indent);
            buf.append_buffer(&text)?;
            if !matches!(e.kind, ExprKind::Switch(_) | ExprKind::Monitor(_)) {
                buf.append(";");
            }
            buf.append_line_separator();
        }
        Ok(buf)
    }

    fn emit_var(&mut self, v: &VarExprent, buf: &mut TextBuffer) {
        let vars = self.ctx.vars;
        if v.definition {
            if v.is_final || vars.get(v.var).is_some_and(|info| info.is_final) {
                buf.append("final ");
            }
            let ty = self.inf.var_type(v);
            buf.append(&cast_type_name(&ty, &self.ctx)).append(" ");
        }
        buf.append(&vars.name(v.var));
    }

    fn emit_field(&mut self, f: &FieldExprent, buf: &mut TextBuffer, indent: usize) -> Result<()> {
        let ctx = self.ctx;
        match &f.instance {
            None => {
                if f.owner != ctx.current_class || ctx.vars.has_local_named(&f.name) {
                    buf.append(&ctx.short_name(&f.owner)).append(".");
                }
            }
            Some(instance) => match this_class(instance, &ctx) {
                Some(this) if this == ctx.current_class => {
                    let shadowed = f.owner != ctx.current_class
                        && ctx
                            .current_class_info()
                            .is_some_and(|class| class.fields.iter().any(|field| field.name == f.name));
                    if shadowed {
                        buf.append("super.");
                    } else if ctx.vars.has_local_named(&f.name) {
                        buf.append("this.");
                    }
                }
                Some(this) => {
                    buf.append(&ctx.short_name(this)).append(".this.");
                }
                None => {
                    let instance_type = self.inferred(instance, None);
                    let mut text = self.emit(instance, indent)?;
                    let db = ctx.symbols;
                    let needs_cast = instance_type.kind() == TypeKind::Object
                        && instance_type.array_dim() == 0
                        && db.lookup_class(instance_type.name_or_empty()).is_some()
                        && !db.is_subtype(instance_type.name_or_empty(), &f.owner);
                    if needs_cast {
                        if instance.precedence(ctx.options) >= 1 {
                            text.enclose_with_parens();
                        }
                        text.prepend(&format!("(({})", ctx.short_name(&f.owner)));
                        text.append(")");
                    } else if instance.precedence(ctx.options) > 0 {
                        text.enclose_with_parens();
                    }
                    buf.append_buffer(&text)?;
                    buf.append(".");
                }
            },
        }
        buf.append(&f.name);
        Ok(())
    }

    /// A static final field of the current class assigned in its class initializer.
    fn is_initializer_target(&self, left: &Exprent) -> Option<String> {
        let f = left.as_field()?;
        if !f.is_static() || f.owner != self.ctx.current_class || !self.ctx.is_in_class_init() {
            return None;
        }
        let field = self.ctx.current_class_info()?.fields.iter().find(|field| field.name == f.name)?;
        (field.access.is_final() && field.access.is_static()).then(|| f.name.clone())
    }

    fn emit_assignment(&mut self, a: &AssignmentExprent, buf: &mut TextBuffer, indent: usize) -> Result<()> {
        let left_type = self.inferred(&a.left, None);
        match self.is_initializer_target(&a.left) {
            Some(name) => {
                buf.add_bytecode_mapping(a.left.bytecode.iter());
                buf.append(&name);
            }
            None => self.append_child(buf, &a.left, indent)?,
        }

        if let Some(op) = a.op {
            buf.append(" ").append(op.symbol()).append("= ");
            return self.append_child(buf, &a.right, indent);
        }

        buf.append(" = ");
        let right_type = self.inferred(&a.right, Some(&left_type));
        // A type variable whose bound already fits the left side needs no cast.
        let bound_fits = self.inf.is_named(&right_type) && {
            let upper = self.ctx.bound_of(&right_type, self.inf.named_generics());
            left_type.is_superset(&upper) || left_type.is_superset(&unboxed(&upper))
        };
        if bound_fits {
            self.append_child(buf, &a.right, indent)
        } else {
            self.casted(&a.right, &left_type, buf, indent, CastFlags::default())
                .map(|_| ())
        }
    }

    fn emit_exit(&mut self, e: &Exprent, exit: &ExitExprent, buf: &mut TextBuffer, indent: usize) -> Result<()> {
        match exit.kind {
            ExitKind::Return => {
                buf.append("return");
                let Some(value) = &exit.value else {
                    return Ok(());
                };
                buf.append(" ");
                let ret = match (self.decor.exit_type(e.id()), self.lambda_returns.last()) {
                    (Some(ty), _) => ty.clone(),
                    (None, Some(Some(lambda_ret))) => lambda_ret.clone(),
                    (None, Some(None)) => self.inf.return_type(exit, true),
                    (None, None) => self.inf.return_type(exit, false),
                };
                self.casted(value, &ret, buf, indent, CastFlags::default().null(NullCast::DontCastAtAll))?;
            }
            ExitKind::Throw => {
                buf.append("throw");
                if let Some(value) = &exit.value {
                    buf.append(" ");
                    self.append_child(buf, value, indent)?;
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::array::ArrayExprent;
    use crate::constant::ConstExprent;
    use crate::monitor::MonitorExprent;
    use crate::var::{VarInfo, VarTable, VarVersion};
    use nova_decomp_types::{AccessFlags, ClassInfo, ClassStore, FieldInfo, MethodInfo};
    use pretty_assertions::assert_eq;

    fn var(index: u32, ty: VarType) -> Exprent {
        Exprent::new(VarExprent::new(VarVersion::new(index, 0), ty))
    }

    fn render(e: &Exprent, ctx: &DecompileContext<'_>) -> String {
        to_source_text(e, ctx, 0).unwrap().into_string()
    }

    #[test]
    fn definitions_render_type_and_name() {
        let store = ClassStore::new();
        let vars = VarTable::new().with_var(VarVersion::new(1, 0), VarInfo::named("count").with_final(true));
        let ctx = DecompileContext::new(&store, "a/Main").with_vars(&vars);
        let def = Exprent::new(VarExprent::new(VarVersion::new(1, 0), VarType::int()).definition());
        assert_eq!(render(&def, &ctx), "final int count");
    }

    #[test]
    fn static_fields_of_other_classes_are_qualified() {
        let store = ClassStore::new();
        let ctx = DecompileContext::new(&store, "a/Main");
        let own = Exprent::new(FieldExprent::new_static("a/Main", "COUNT", "I"));
        let other = Exprent::new(FieldExprent::new_static("java/lang/System", "out", "Ljava/io/PrintStream;"));
        assert_eq!(render(&own, &ctx), "COUNT");
        assert_eq!(render(&other, &ctx), "System.out");
    }

    #[test]
    fn this_is_written_only_when_a_local_shadows_the_field() {
        let store = ClassStore::new();
        let this = VarVersion::new(0, 0);
        let field = |vars: &VarTable| {
            let ctx = DecompileContext::new(&store, "a/Main").with_vars(vars);
            let e = Exprent::new(FieldExprent::new_instance(
                Exprent::new(VarExprent::new(this, VarType::object("a/Main"))),
                "a/Main",
                "size",
                "I",
            ));
            render(&e, &ctx)
        };
        let plain = VarTable::new().with_var(this, VarInfo::this_of("a/Main"));
        assert_eq!(field(&plain), "size");
        let shadowed = plain.with_var(VarVersion::new(1, 0), VarInfo::named("size"));
        assert_eq!(field(&shadowed), "this.size");
    }

    #[test]
    fn static_finals_assigned_in_the_initializer_use_bare_names() {
        let store = ClassStore::new().with_class(
            ClassInfo::new("a/Main", AccessFlags(AccessFlags::PUBLIC)).with_field(FieldInfo::new(
                "a/Main",
                "LIMIT",
                "I",
                AccessFlags(AccessFlags::STATIC | AccessFlags::FINAL),
            )),
        );
        let clinit = MethodInfo::new("a/Main", "<clinit>", "()V", AccessFlags(AccessFlags::STATIC));
        let vars = VarTable::new().with_var(VarVersion::new(0, 0), VarInfo::named("LIMIT"));
        let ctx = DecompileContext::new(&store, "a/Main").with_method(&clinit).with_vars(&vars);
        let e = Exprent::new(AssignmentExprent::new(
            Exprent::new(FieldExprent::new_static("a/Main", "LIMIT", "I")),
            Exprent::new(ConstExprent::int(10, false)),
        ));
        assert_eq!(render(&e, &ctx), "LIMIT = 10");
    }

    #[test]
    fn non_array_operands_are_cast_to_object_arrays() {
        let store = ClassStore::new();
        let ctx = DecompileContext::new(&store, "a/Main");
        let e = Exprent::new(ArrayExprent::new(
            var(1, VarType::object_type()),
            Exprent::new(ConstExprent::int(0, false)),
            VarType::object_type(),
        ));
        assert_eq!(render(&e, &ctx), "((Object[])var1)[0]");
    }

    #[test]
    fn statement_lists_terminate_lines() {
        let store = ClassStore::new();
        let ctx = DecompileContext::new(&store, "a/Main");
        let stmts = vec![
            Exprent::new(MonitorExprent::enter(var(1, VarType::object_type()))),
            Exprent::new(MonitorExprent::exit(var(1, VarType::object_type()))),
            Exprent::new(ExitExprent::return_value(Some(var(2, VarType::int())), VarType::int())),
        ];
        let text = list_to_java(&stmts, &ctx, 1).unwrap().into_string();
        assert_eq!(text, "    synchronized (var1)\n    return var2;\n");
    }
}

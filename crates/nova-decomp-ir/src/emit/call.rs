use nova_decomp_text::TextBuffer;
use nova_decomp_types::{parse_field_descriptor, TypeKind, VarType, JAVA_LANG_OBJECT};

use super::Emitter;
use crate::cast::{CastFlags, NullCast};
use crate::context::DecompileContext;
use crate::error::{EmitError, Result};
use crate::exprent::Exprent;
use crate::infer::{is_anonymous_class, this_class, CallPlan};
use crate::invocation::{CallKind, InvocationExprent, InvocationKind};
use crate::java_type::{cast_type_name, inferred_arguments_text};

const JAVA_NIO_BUFFER: &str = "java/nio/Buffer";

impl Emitter<'_> {
    pub(super) fn emit_invocation(
        &mut self,
        e: &Exprent,
        inv: &InvocationExprent,
        buf: &mut TextBuffer,
        indent: usize,
    ) -> Result<()> {
        let ctx = self.ctx;
        if inv.call_kind() == CallKind::ClassInit {
            return Err(EmitError::ClassInitInvocation {
                class: inv.owner.clone(),
            });
        }
        if inv.was_lazy_condy && ctx.options.decompiler_comments {
            buf.append("/* $VF: constant dynamic replaced with non-lazy method call */ ");
        }
        let start = buf.len();
        let plan = self.plan_for(e.id(), inv, false);

        let mut super_qualifier: Option<String> = None;
        let mut instance_this = false;
        let mut call_chain_group = false;

        if inv.is_static() {
            if inv.is_boxing_call(&ctx) && !self.decor.keeps_boxing(e.id()) {
                let param = inv.parsed.params.first().cloned().unwrap_or_else(VarType::unknown);
                self.casted(&inv.args[0], &param, buf, indent, CastFlags::default().narrowing(true))?;
                return Ok(());
            }
            if inv.kind == InvocationKind::ConstantDynamic {
                buf.append("(").append(&cast_type_name(&inv.parsed.ret, &ctx)).append(")");
            }
            if !ctx.is_current_or_enclosing(&inv.owner) || !plan.generic_args.is_empty() {
                buf.append(&ctx.short_name(&inv.owner));
            }
        } else if let Some(instance) = &inv.instance {
            if let Some(this) = this_class(instance, &ctx) {
                instance_this = true;
                if inv.kind == InvocationKind::Special && inv.owner != this {
                    let interface = ctx
                        .symbols
                        .lookup_class(&inv.owner)
                        .is_some_and(|class| class.access.is_interface());
                    super_qualifier = Some(if interface {
                        inv.owner.clone()
                    } else {
                        this.to_string()
                    });
                }
            }

            if inv.call_kind() == CallKind::General {
                if let Some(qualifier) = &super_qualifier {
                    if *qualifier != ctx.current_class {
                        buf.append(&ctx.short_name(qualifier)).append(".");
                    }
                    buf.append("super");
                } else {
                    if inv.is_unboxing_call() && !self.decor.keeps_unboxing(e.id()) {
                        let receiver = self.wrapped(instance, 0, indent)?;
                        buf.append_buffer(&receiver)?;
                        return Ok(());
                    }
                    buf.push_newline_group(indent, 1);
                    call_chain_group = true;
                    let receiver = self.receiver(instance, inv, &plan, indent)?;
                    buf.append_buffer(&receiver)?;
                    if instance.as_invocation().is_some() {
                        buf.append_possible_newline("");
                    }
                }
            }
        }

        match inv.call_kind() {
            CallKind::General => {
                if buf.len() > start {
                    buf.append(".");
                    if !plan.generic_args.is_empty() {
                        buf.append(&inferred_arguments_text(&plan.generic_args, &ctx));
                    }
                }
                buf.add_bytecode_mapping(e.bytecode.iter());
                if inv.is_dynamic() {
                    self.dynamic_name(inv, buf)?;
                } else {
                    buf.append(&inv.name);
                }
                buf.append("(");
            }
            CallKind::Init => {
                buf.add_bytecode_mapping(e.bytecode.iter());
                if super_qualifier.is_some() {
                    buf.append("super(");
                } else if instance_this {
                    buf.append("this(");
                } else if let Some(instance) = &inv.instance {
                    self.append_child(buf, instance, indent)?;
                    buf.append(".");
                    if ctx.options.decompiler_comments {
                        buf.append("/* $VF: Unable to resugar constructor */");
                    }
                    buf.append("<init>(");
                } else {
                    return Err(EmitError::malformed("invocation", "constructor call without a receiver"));
                }
            }
            CallKind::ClassInit => {
                return Err(EmitError::ClassInitInvocation {
                    class: inv.owner.clone(),
                })
            }
        }

        self.append_args(buf, &inv.args, &plan, indent)?;
        buf.append(")");
        if call_chain_group {
            buf.pop_newline_group()?;
        }
        Ok(())
    }

    /// The receiver of an instance call, cast to the owner when its own type does not reach it.
    fn receiver(
        &mut self,
        instance: &Exprent,
        inv: &InvocationExprent,
        plan: &CallPlan,
        indent: usize,
    ) -> Result<TextBuffer> {
        let ctx = self.ctx;
        let left = plan.instance_bound.clone();
        let right = self.infer_as(instance, Some(&left), true);
        let mut text = self.emit(instance, indent)?;
        let precedence = instance.precedence(ctx.options);

        let known_owner = ctx.classes.get(&inv.owner).is_some() || ctx.symbols.lookup_class(&inv.owner).is_some();
        if right.is_object_class() && left != right && known_owner && !is_anonymous_class(&inv.owner, &ctx) {
            if precedence >= 1 {
                text.enclose_with_parens();
            }
            text.prepend(&format!("(({})", cast_type_name(&left, &ctx)));
            text.append(")");
        } else if precedence > 0 {
            text.enclose_with_parens();
        } else if inv.owner == JAVA_NIO_BUFFER
            && inv.parsed.ret.is_class_named(JAVA_NIO_BUFFER)
            && right.kind() == TypeKind::Object
            && !right.is_class_named(JAVA_NIO_BUFFER)
            && ctx.symbols.is_subtype(right.name_or_empty(), JAVA_NIO_BUFFER)
        {
            text.prepend(&format!("(({})", ctx.short_name(JAVA_NIO_BUFFER)));
            text.append(")");
        }
        Ok(text)
    }

    fn dynamic_name(&self, inv: &InvocationExprent, buf: &mut TextBuffer) -> Result<()> {
        match &inv.bootstrap {
            None => {
                buf.append("<").append(&inv.name);
                buf.append(if inv.kind == InvocationKind::Dynamic {
                    ">invokedynamic"
                } else {
                    ">ldc"
                });
            }
            Some(bootstrap) => {
                buf.append(&bootstrap.method_name).append("<\"").append(&inv.name).append("\"");
                for arg in &bootstrap.args {
                    buf.append(",").append(&arg.literal(&arg.ty, &self.ctx)?);
                }
                buf.append(">");
            }
        }
        Ok(())
    }

    /// `arg, arg, ...` with skipped synthetic arguments, casts on ambiguous positions and
    /// expanded varargs.
    pub(super) fn append_args(
        &mut self,
        buf: &mut TextBuffer,
        args: &[Exprent],
        plan: &CallPlan,
        indent: usize,
    ) -> Result<()> {
        let ctx = self.ctx;
        // (argument, expected type, flags, written as `(Object)`)
        let mut rendered: Vec<(&Exprent, VarType, CastFlags, bool)> = Vec::new();
        for (idx, arg) in args.iter().enumerate() {
            let arg_plan = plan.args.get(idx);
            if arg_plan.is_some_and(|p| p.skip) {
                continue;
            }
            let ty = arg_plan.map_or_else(|| arg.expr_type(&ctx), |p| p.ty.clone());
            let ambiguous = arg_plan.is_some_and(|p| p.ambiguous);

            if plan.expand_varargs && idx + 1 == args.len() {
                if let Some(elements) = arg.as_new().and_then(|n| n.vararg_elements()) {
                    let element_type = ty.decrease_array_dim();
                    // A lone `Object[]` element would be taken as the whole array.
                    let lone_array = elements.len() == 1 && {
                        let el = elements[0].expr_type(&ctx);
                        el.is_class_named(JAVA_LANG_OBJECT) && el.array_dim() >= 1
                    };
                    for el in elements {
                        rendered.push((el, element_type.clone(), CastFlags::default(), lone_array));
                    }
                    continue;
                }
            }
            let flags = CastFlags::default()
                .null(if ambiguous { NullCast::Cast } else { NullCast::DontCast })
                .always(ambiguous)
                .narrowing(true)
                .unbox(true);
            rendered.push((arg, ty, flags, false));
        }
        if rendered.is_empty() {
            return Ok(());
        }

        buf.push_newline_group(indent, 1);
        buf.append_possible_newline("");
        buf.push_newline_group(indent, 0);
        for (idx, (arg, ty, flags, as_object)) in rendered.into_iter().enumerate() {
            if idx > 0 {
                buf.append(",").append_possible_newline(" ");
            }
            if as_object {
                buf.append("(Object)");
            }
            self.casted(arg, &ty, buf, indent, flags)?;
        }
        buf.pop_newline_group()?;
        buf.append_possible_newline_dedent("");
        buf.pop_newline_group()?;
        Ok(())
    }
}

/// Source spelling of a method reference or constructor owner, which may be an array
/// descriptor such as `[I`.
pub(super) fn owner_type_name(owner: &str, ctx: &DecompileContext<'_>) -> String {
    if owner.starts_with('[') {
        if let Ok(ty) = parse_field_descriptor(owner) {
            return cast_type_name(&ty, ctx);
        }
    }
    ctx.short_name(owner)
}

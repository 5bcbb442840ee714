use nova_decomp_text::TextBuffer;
use nova_decomp_types::VarType;

use super::call::owner_type_name;
use super::Emitter;
use crate::cast::CastFlags;
use crate::error::Result;
use crate::exprent::Exprent;
use crate::infer::{this_class, CallPlan};
use crate::invocation::InvocationExprent;
use crate::java_type::{cast_type_name, inferred_arguments_text, type_name};
use crate::new::{LambdaBody, LambdaContent, LambdaExpr, NewExprent, NewKind};

impl Emitter<'_> {
    pub(super) fn emit_new(&mut self, e: &Exprent, n: &NewExprent, buf: &mut TextBuffer, indent: usize) -> Result<()> {
        match &n.kind {
            NewKind::Lambda(lambda) => self.emit_lambda(e, n, lambda, buf, indent),
            NewKind::Array {
                dims,
                elements,
                direct,
            } => self.emit_array(n, dims, elements, *direct, buf, indent),
            NewKind::Object {
                constructor,
                enum_const,
            } => {
                if n.is_anonymous(&self.ctx) {
                    self.emit_anonymous(e, n, constructor.as_ref(), *enum_const, buf, indent)
                } else {
                    self.emit_construction(e, n, constructor.as_ref(), *enum_const, buf, indent)
                }
            }
        }
    }

    fn emit_construction(
        &mut self,
        e: &Exprent,
        n: &NewExprent,
        constructor: Option<&InvocationExprent>,
        enum_const: bool,
        buf: &mut TextBuffer,
        indent: usize,
    ) -> Result<()> {
        let outer = n.has_outer_instance(&self.ctx);
        if !enum_const {
            let mut qualified = false;
            if outer {
                if let Some(enclosing) = constructor.and_then(|c| c.args.first()) {
                    if self.is_qualifying_instance(enclosing) {
                        let text = self.wrapped(enclosing, 0, indent)?;
                        buf.append_buffer(&text)?;
                        buf.append(".");
                        qualified = true;
                    }
                }
            }
            buf.append("new ");
            if qualified {
                buf.append(&self.simple_name(&n.new_type));
            } else {
                buf.append(&type_name(&n.new_type, &self.ctx));
            }
        }
        if let Some(ctor) = constructor {
            // Enum constants without arguments beyond name and ordinal render bare.
            if !enum_const || ctor.args.len() > 2 {
                let plan = self.plan_for(e.id(), ctor, outer);
                self.constructor_args(buf, ctor, &plan, indent)?;
            }
        }
        Ok(())
    }

    /// `outer.new Inner()` is needed unless the outer instance is `this` of the current class.
    fn is_qualifying_instance(&self, enclosing: &Exprent) -> bool {
        match this_class(enclosing, &self.ctx) {
            Some(this) => this != self.ctx.current_class,
            None => true,
        }
    }

    /// Source name of a member class without its enclosing classes.
    fn simple_name(&self, ty: &VarType) -> String {
        let name = ty.name_or_empty();
        if let Some(simple) = self.ctx.classes.get(name).and_then(|node| node.simple_name.clone()) {
            return simple;
        }
        let short = type_name(ty, &self.ctx);
        match short.rfind('.') {
            Some(idx) => short[idx + 1..].to_string(),
            None => short,
        }
    }

    fn constructor_args(
        &mut self,
        buf: &mut TextBuffer,
        ctor: &InvocationExprent,
        plan: &CallPlan,
        indent: usize,
    ) -> Result<()> {
        if !plan.generic_args.is_empty() {
            buf.append(&inferred_arguments_text(&plan.generic_args, &self.ctx));
        }
        buf.append("(");
        self.append_args(buf, &ctor.args, plan, indent)?;
        buf.append(")");
        Ok(())
    }

    fn emit_anonymous(
        &mut self,
        e: &Exprent,
        n: &NewExprent,
        constructor: Option<&InvocationExprent>,
        enum_const: bool,
        buf: &mut TextBuffer,
        indent: usize,
    ) -> Result<()> {
        let ctx = self.ctx;
        let name = n.new_type.name_or_empty();
        let self_reference = name == ctx.current_class;
        if !enum_const {
            buf.append("new ");
            if self_reference {
                buf.append("<anonymous constructor>");
            } else {
                let base = ctx
                    .classes
                    .get(name)
                    .and_then(|node| node.base_type.clone())
                    .unwrap_or_else(|| n.new_type.clone());
                buf.append(&cast_type_name(&base, &ctx));
            }
        }
        match constructor {
            Some(ctor) if !enum_const || ctor.args.len() > 2 => {
                let plan = self.plan_for(e.id(), ctor, false);
                self.constructor_args(buf, ctor, &plan, indent)?;
            }
            Some(_) => {}
            None => {
                buf.append("()");
            }
        }
        if !self_reference {
            ctx.nested.write_anonymous_body(name, buf, indent)?;
        }
        Ok(())
    }

    fn emit_array(
        &mut self,
        n: &NewExprent,
        dims: &[Exprent],
        elements: &[Exprent],
        direct: bool,
        buf: &mut TextBuffer,
        indent: usize,
    ) -> Result<()> {
        let element_type = n.new_type.decrease_array_dim();
        if direct {
            buf.append("{");
            if !elements.is_empty() {
                buf.push_newline_group(indent, 2);
                buf.append_possible_newline("");
                buf.push_newline_group(indent, 0);
                self.array_elements(buf, elements, &element_type, indent)?;
                buf.pop_newline_group()?;
                buf.append_possible_newline_dedent("");
                buf.pop_newline_group()?;
            }
            buf.append("}");
            return Ok(());
        }

        buf.append("new ").append(&type_name(&n.new_type.resize_array_dim(0), &self.ctx));
        if elements.is_empty() {
            for idx in 0..n.new_type.array_dim() as usize {
                buf.append("[");
                if let Some(dim) = dims.get(idx) {
                    match dim.as_const() {
                        Some(c) => {
                            let literal = c.literal(&c.adjusted_type(&VarType::int()), &self.ctx)?;
                            buf.add_bytecode_mapping(dim.bytecode.iter());
                            buf.append(&literal);
                        }
                        None => self.append_child(buf, dim, indent)?,
                    }
                }
                buf.append("]");
            }
            return Ok(());
        }

        for _ in 0..n.new_type.array_dim() {
            buf.append("[]");
        }
        buf.append("{");
        buf.push_newline_group(indent, 1);
        buf.append_possible_newline("");
        buf.push_newline_group(indent, 0);
        self.array_elements(buf, elements, &element_type, indent)?;
        buf.pop_newline_group()?;
        buf.append_possible_newline_dedent("");
        buf.append("}");
        buf.pop_newline_group()?;
        Ok(())
    }

    fn array_elements(
        &mut self,
        buf: &mut TextBuffer,
        elements: &[Exprent],
        element_type: &VarType,
        indent: usize,
    ) -> Result<()> {
        for (idx, el) in elements.iter().enumerate() {
            if idx > 0 {
                buf.append(",").append_possible_newline(" ");
            }
            self.casted(el, element_type, buf, indent, CastFlags::default())?;
        }
        Ok(())
    }

    fn emit_lambda(
        &mut self,
        e: &Exprent,
        n: &NewExprent,
        lambda: &LambdaExpr,
        buf: &mut TextBuffer,
        indent: usize,
    ) -> Result<()> {
        let types = match self.decor.lambda(e.id()) {
            Some(types) => types.clone(),
            None => {
                let bound = self.decor.bound_of(e.id());
                self.inf.lambda_types(n, lambda, bound.as_ref())
            }
        };
        match &lambda.content {
            LambdaContent::MethodRef {
                owner, name, receiver, ..
            } => {
                match receiver {
                    Some(receiver) => {
                        let text = self.wrapped(receiver, 0, indent)?;
                        buf.append_buffer(&text)?;
                    }
                    None => {
                        buf.append(&owner_type_name(owner, &self.ctx));
                    }
                }
                buf.append("::").append(if name == "<init>" { "new" } else { name });
            }
            LambdaContent::Body { params, body, .. } => {
                let previous: Vec<_> = types
                    .params
                    .iter()
                    .map(|(var, ty)| (*var, self.inf.set_var_type(*var, ty.clone())))
                    .collect();

                let names: Vec<String> = params.iter().map(|var| self.ctx.vars.name(*var)).collect();
                match names.as_slice() {
                    [single] => {
                        buf.append(single);
                    }
                    _ => {
                        buf.append("(").append(&names.join(", ")).append(")");
                    }
                }
                buf.append(" ->");

                self.lambda_returns.push(types.return_type.clone());
                let rendered = match body {
                    LambdaBody::Expression(expr) => {
                        buf.append(" ");
                        self.append_child(buf, expr, indent)
                    }
                    LambdaBody::Block(stmts) => self.statements(stmts, indent + 1).and_then(|inner| {
                        buf.append(" {").append_line_separator();
                        buf.append_buffer(&inner)?;
                        buf.append_indent(indent).append("}");
                        Ok(())
                    }),
                };
                self.lambda_returns.pop();
                for (var, prev) in previous.into_iter().rev() {
                    self.inf.restore_var_type(var, prev);
                }
                rendered?;
            }
        }
        Ok(())
    }
}

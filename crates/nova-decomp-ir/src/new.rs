//! Object, array and lambda construction.

use nova_decomp_types::VarType;

use crate::context::{ClassKind, DecompileContext};
use crate::exprent::Exprent;
use crate::invocation::InvocationExprent;
use crate::var::VarVersion;

#[derive(Debug, Clone, PartialEq)]
pub enum LambdaBody {
    Expression(Box<Exprent>),
    Block(Vec<Exprent>),
}

#[derive(Debug, Clone, PartialEq)]
pub enum LambdaContent {
    /// `Owner::name`, `receiver::name` or `Type::new`.
    MethodRef {
        owner: String,
        name: String,
        descriptor: String,
        /// Bound receiver of an instance method reference.
        receiver: Option<Box<Exprent>>,
    },
    /// An inline lambda compiled to the synthetic method `impl_owner.impl_name`.
    Body {
        impl_owner: String,
        impl_name: String,
        impl_descriptor: String,
        /// The lambda's own parameters, without captured values.
        params: Vec<VarVersion>,
        body: LambdaBody,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub struct LambdaExpr {
    /// Name of the functional interface method.
    pub method_name: String,
    /// Erased descriptor of the functional interface method.
    pub method_descriptor: String,
    pub content: LambdaContent,
}

impl LambdaExpr {
    pub fn method_ref(
        method_name: &str,
        method_descriptor: &str,
        owner: &str,
        name: &str,
        descriptor: &str,
        receiver: Option<Exprent>,
    ) -> Self {
        Self {
            method_name: method_name.to_string(),
            method_descriptor: method_descriptor.to_string(),
            content: LambdaContent::MethodRef {
                owner: owner.to_string(),
                name: name.to_string(),
                descriptor: descriptor.to_string(),
                receiver: receiver.map(Box::new),
            },
        }
    }

    pub fn body(
        method_name: &str,
        method_descriptor: &str,
        impl_owner: &str,
        impl_name: &str,
        impl_descriptor: &str,
        params: Vec<VarVersion>,
        body: LambdaBody,
    ) -> Self {
        Self {
            method_name: method_name.to_string(),
            method_descriptor: method_descriptor.to_string(),
            content: LambdaContent::Body {
                impl_owner: impl_owner.to_string(),
                impl_name: impl_name.to_string(),
                impl_descriptor: impl_descriptor.to_string(),
                params,
                body,
            },
        }
    }

    pub fn is_method_reference(&self) -> bool {
        matches!(self.content, LambdaContent::MethodRef { .. })
    }

    /// Owner, name and descriptor of the method the lambda delegates to.
    pub(crate) fn target(&self) -> (&str, &str, &str) {
        match &self.content {
            LambdaContent::MethodRef {
                owner,
                name,
                descriptor,
                ..
            } => (owner, name, descriptor),
            LambdaContent::Body {
                impl_owner,
                impl_name,
                impl_descriptor,
                ..
            } => (impl_owner, impl_name, impl_descriptor),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum NewKind {
    Object {
        constructor: Option<InvocationExprent>,
        /// The creation of an enum constant; the synthetic name and ordinal arguments are
        /// not rendered.
        enum_const: bool,
    },
    Array {
        dims: Vec<Exprent>,
        elements: Vec<Exprent>,
        /// `{a, b}` without the `new T[]` prefix, as in field and annotation initializers.
        direct: bool,
    },
    Lambda(LambdaExpr),
}

#[derive(Debug, Clone, PartialEq)]
pub struct NewExprent {
    /// Created type; the functional interface for lambdas.
    pub new_type: VarType,
    pub kind: NewKind,
}

impl NewExprent {
    /// `new T(args)`. Member inner classes take their outer instance as the first argument;
    /// anonymous classes take only the arguments of their super constructor.
    pub fn object(new_type: VarType, constructor: Option<InvocationExprent>) -> Self {
        Self {
            new_type,
            kind: NewKind::Object {
                constructor,
                enum_const: false,
            },
        }
    }

    pub fn enum_constant(new_type: VarType, constructor: InvocationExprent) -> Self {
        Self {
            new_type,
            kind: NewKind::Object {
                constructor: Some(constructor),
                enum_const: true,
            },
        }
    }

    /// `new T[d0][d1]...`; `array_type` carries the full dimension count.
    pub fn array(array_type: VarType, dims: Vec<Exprent>) -> Self {
        Self {
            new_type: array_type,
            kind: NewKind::Array {
                dims,
                elements: Vec::new(),
                direct: false,
            },
        }
    }

    /// `new T[]{elements}`.
    pub fn array_init(array_type: VarType, elements: Vec<Exprent>) -> Self {
        Self {
            new_type: array_type,
            kind: NewKind::Array {
                dims: Vec::new(),
                elements,
                direct: false,
            },
        }
    }

    /// `{elements}`.
    pub fn direct_init(array_type: VarType, elements: Vec<Exprent>) -> Self {
        Self {
            new_type: array_type,
            kind: NewKind::Array {
                dims: Vec::new(),
                elements,
                direct: true,
            },
        }
    }

    pub fn lambda(interface: VarType, lambda: LambdaExpr) -> Self {
        Self {
            new_type: interface,
            kind: NewKind::Lambda(lambda),
        }
    }

    pub fn constructor(&self) -> Option<&InvocationExprent> {
        match &self.kind {
            NewKind::Object { constructor, .. } => constructor.as_ref(),
            _ => None,
        }
    }

    pub fn lambda_expr(&self) -> Option<&LambdaExpr> {
        match &self.kind {
            NewKind::Lambda(lambda) => Some(lambda),
            _ => None,
        }
    }

    pub fn is_enum_const(&self) -> bool {
        matches!(self.kind, NewKind::Object { enum_const: true, .. })
    }

    pub fn is_anonymous(&self, ctx: &DecompileContext<'_>) -> bool {
        matches!(self.kind, NewKind::Object { .. })
            && ctx.classes.kind_of(self.new_type.name_or_empty()) == Some(ClassKind::Anonymous)
    }

    /// Whether the first constructor argument is the outer instance of a member class.
    pub(crate) fn has_outer_instance(&self, ctx: &DecompileContext<'_>) -> bool {
        match ctx.classes.get(self.new_type.name_or_empty()) {
            Some(node) => {
                node.kind == ClassKind::Member
                    && !node.is_static()
                    && self.constructor().is_some_and(|c| !c.args.is_empty())
            }
            None => false,
        }
    }

    /// Array elements for vararg expansion: an initializer, or a zero-length array.
    pub(crate) fn vararg_elements(&self) -> Option<&[Exprent]> {
        match &self.kind {
            NewKind::Array { dims, elements, .. } if self.new_type.array_dim() >= 1 => {
                if !elements.is_empty() {
                    Some(elements)
                } else if let [dim] = dims.as_slice() {
                    dim.as_const().and_then(|c| c.int_value()).filter(|n| *n == 0).map(|_| elements.as_slice())
                } else if dims.is_empty() {
                    Some(elements)
                } else {
                    None
                }
            }
            _ => None,
        }
    }
}

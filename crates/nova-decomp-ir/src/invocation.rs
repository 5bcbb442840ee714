use nova_decomp_types::{parse_method_descriptor, MethodDescriptor, TypeFamily, TypeKind, VarType};

use crate::constant::ConstExprent;
use crate::context::DecompileContext;
use crate::exprent::Exprent;
use crate::java_type::box_class;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum InvocationKind {
    Static,
    Virtual,
    Interface,
    /// Constructors, private methods and `super.` calls.
    Special,
    /// `invokedynamic` that is not a lambda.
    Dynamic,
    /// A dynamically computed constant loaded with `ldc`.
    ConstantDynamic,
}

/// What the invoked method is, derived from its name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CallKind {
    General,
    Init,
    ClassInit,
}

/// Bootstrap method of a dynamic call site or constant.
#[derive(Debug, Clone, PartialEq)]
pub struct Bootstrap {
    pub method_name: String,
    pub args: Vec<ConstExprent>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct InvocationExprent {
    pub name: String,
    pub owner: String,
    pub descriptor: String,
    pub parsed: MethodDescriptor,
    pub kind: InvocationKind,
    pub instance: Option<Box<Exprent>>,
    pub args: Vec<Exprent>,
    pub bootstrap: Option<Bootstrap>,
    /// A dynamic constant that was rewritten into an eager method call.
    pub was_lazy_condy: bool,
}

const UNBOXING_METHODS: &[(&str, &str)] = &[
    ("booleanValue", "java/lang/Boolean"),
    ("byteValue", "java/lang/Byte"),
    ("shortValue", "java/lang/Short"),
    ("intValue", "java/lang/Integer"),
    ("longValue", "java/lang/Long"),
    ("floatValue", "java/lang/Float"),
    ("doubleValue", "java/lang/Double"),
    ("charValue", "java/lang/Character"),
];

impl InvocationExprent {
    pub fn new(
        kind: InvocationKind,
        owner: &str,
        name: &str,
        descriptor: &str,
        instance: Option<Exprent>,
        args: Vec<Exprent>,
    ) -> Self {
        let descriptor = if kind == InvocationKind::ConstantDynamic && !descriptor.starts_with('(') {
            format!("(){descriptor}")
        } else {
            descriptor.to_string()
        };
        let parsed = parse_method_descriptor(&descriptor).unwrap_or_else(|err| {
            tracing::warn!(target: "nova.decomp.ir", owner, name, %err, "bad method descriptor");
            MethodDescriptor {
                params: Vec::new(),
                ret: VarType::unknown(),
            }
        });
        Self {
            name: name.to_string(),
            owner: owner.to_string(),
            descriptor,
            parsed,
            kind,
            instance: instance.map(Box::new),
            args,
            bootstrap: None,
            was_lazy_condy: false,
        }
    }

    pub fn static_call(owner: &str, name: &str, descriptor: &str, args: Vec<Exprent>) -> Self {
        Self::new(InvocationKind::Static, owner, name, descriptor, None, args)
    }

    pub fn virtual_call(instance: Exprent, owner: &str, name: &str, descriptor: &str, args: Vec<Exprent>) -> Self {
        Self::new(InvocationKind::Virtual, owner, name, descriptor, Some(instance), args)
    }

    pub fn interface_call(instance: Exprent, owner: &str, name: &str, descriptor: &str, args: Vec<Exprent>) -> Self {
        Self::new(InvocationKind::Interface, owner, name, descriptor, Some(instance), args)
    }

    pub fn special_call(instance: Exprent, owner: &str, name: &str, descriptor: &str, args: Vec<Exprent>) -> Self {
        Self::new(InvocationKind::Special, owner, name, descriptor, Some(instance), args)
    }

    /// The `<init>` call carried by a `new` expression.
    pub fn constructor(owner: &str, descriptor: &str, args: Vec<Exprent>) -> Self {
        Self::new(InvocationKind::Special, owner, "<init>", descriptor, None, args)
    }

    pub fn with_bootstrap(mut self, bootstrap: Bootstrap) -> Self {
        self.bootstrap = Some(bootstrap);
        self
    }

    pub fn with_lazy_condy(mut self) -> Self {
        self.was_lazy_condy = true;
        self
    }

    pub fn call_kind(&self) -> CallKind {
        match self.name.as_str() {
            "<init>" => CallKind::Init,
            "<clinit>" => CallKind::ClassInit,
            _ => CallKind::General,
        }
    }

    pub fn is_static(&self) -> bool {
        matches!(
            self.kind,
            InvocationKind::Static | InvocationKind::Dynamic | InvocationKind::ConstantDynamic
        )
    }

    pub fn is_dynamic(&self) -> bool {
        matches!(self.kind, InvocationKind::Dynamic | InvocationKind::ConstantDynamic)
    }

    /// `Integer.valueOf(int)` and friends.
    pub fn is_boxing_call(&self, ctx: &DecompileContext<'_>) -> bool {
        if self.kind != InvocationKind::Static || self.name != "valueOf" || self.args.len() != 1 {
            return false;
        }
        let arg = &self.args[0];
        let ty = arg.expr_type(ctx);
        if ty.array_dim() > 0 {
            return false;
        }
        if arg.as_const().is_some() {
            if ty.family() == TypeFamily::Integer && self.owner == "java/lang/Integer" {
                return true;
            }
            if matches!(ty.kind(), TypeKind::ByteChar | TypeKind::ShortChar)
                && matches!(self.owner.as_str(), "java/lang/Character" | "java/lang/Short")
            {
                return true;
            }
        }
        box_class(ty.kind()) == Some(self.owner.as_str())
    }

    /// `x.intValue()` and friends on the matching wrapper class.
    pub fn is_unboxing_call(&self) -> bool {
        !self.is_static()
            && self.args.is_empty()
            && UNBOXING_METHODS
                .iter()
                .any(|(name, owner)| self.name == *name && self.owner == *owner)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::var::{VarExprent, VarVersion};
    use nova_decomp_types::ClassStore;

    #[test]
    fn recognizes_boxing_and_unboxing() {
        let store = ClassStore::new();
        let ctx = DecompileContext::new(&store, "a/Main");
        let boxed = InvocationExprent::static_call(
            "java/lang/Integer",
            "valueOf",
            "(I)Ljava/lang/Integer;",
            vec![Exprent::new(VarExprent::new(VarVersion::new(1, 0), VarType::int()))],
        );
        assert!(boxed.is_boxing_call(&ctx));

        let parse = InvocationExprent::static_call(
            "java/lang/Integer",
            "valueOf",
            "(Ljava/lang/String;)Ljava/lang/Integer;",
            vec![Exprent::new(ConstExprent::string("1"))],
        );
        assert!(!parse.is_boxing_call(&ctx));

        let unboxed = InvocationExprent::virtual_call(
            Exprent::new(boxed),
            "java/lang/Integer",
            "intValue",
            "()I",
            Vec::new(),
        );
        assert!(unboxed.is_unboxing_call());
    }

    #[test]
    fn dynamic_constants_get_a_method_descriptor() {
        let condy = InvocationExprent::new(
            InvocationKind::ConstantDynamic,
            "a/Main",
            "value",
            "Ljava/lang/String;",
            None,
            Vec::new(),
        );
        assert_eq!(condy.descriptor, "()Ljava/lang/String;");
        assert_eq!(condy.parsed.ret, VarType::string());
    }
}

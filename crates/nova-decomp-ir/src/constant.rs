use nova_decomp_types::{TypeFamily, TypeKind, VarType};

use crate::context::DecompileContext;
use crate::error::{EmitError, Result};
use crate::java_type::{box_class, cast_type_name, unboxed};
use crate::literal::{
    char_literal, double_text, float_text, is_char_literal_friendly, is_no_paren_double,
    is_no_paren_float, string_literal, uninlined_double, uninlined_float,
};
use crate::options::DecompilerOptions;

#[derive(Debug, Clone)]
pub enum ConstValue {
    Null,
    /// Every int-sized kind, including `boolean` and `char`.
    Int(i32),
    Long(i64),
    Float(f32),
    Double(f64),
    Str(String),
    /// A class literal; the payload is the named type (`int`, `String[]`).
    Class(VarType),
    /// No value: the node only carries a type, e.g. the target of a cast.
    TypeOnly,
}

impl PartialEq for ConstValue {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (ConstValue::Null, ConstValue::Null) | (ConstValue::TypeOnly, ConstValue::TypeOnly) => true,
            (ConstValue::Int(a), ConstValue::Int(b)) => a == b,
            (ConstValue::Long(a), ConstValue::Long(b)) => a == b,
            (ConstValue::Float(a), ConstValue::Float(b)) => a.to_bits() == b.to_bits(),
            (ConstValue::Double(a), ConstValue::Double(b)) => a.to_bits() == b.to_bits(),
            (ConstValue::Str(a), ConstValue::Str(b)) => a == b,
            (ConstValue::Class(a), ConstValue::Class(b)) => a == b,
            _ => false,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ConstExprent {
    pub ty: VarType,
    pub value: ConstValue,
    /// The constant was loaded through a dynamically computed constant-pool entry.
    pub condy: bool,
}

/// Narrowest kind that holds `value`; `0`/`1` become boolean when the position allows it.
pub fn guess_type(value: i32, bool_permitted: bool) -> VarType {
    if bool_permitted {
        return VarType::boolean().with_false_boolean(value != 0 && value != 1);
    }
    match value {
        0..=127 => VarType::byte_char(),
        -128..=127 => VarType::byte(),
        0..=32767 => VarType::short_char(),
        -32768..=32767 => VarType::short(),
        0..=0xFFFF => VarType::char(),
        _ => VarType::int(),
    }
}

impl ConstExprent {
    pub fn new(ty: VarType, value: ConstValue) -> Self {
        Self {
            ty,
            value,
            condy: false,
        }
    }

    pub fn int(value: i32, bool_permitted: bool) -> Self {
        Self::new(guess_type(value, bool_permitted), ConstValue::Int(value))
    }

    pub fn typed_int(ty: VarType, value: i32) -> Self {
        Self::new(ty, ConstValue::Int(value))
    }

    pub fn boolean(value: bool) -> Self {
        Self::new(VarType::boolean(), ConstValue::Int(i32::from(value)))
    }

    pub fn char(value: u16) -> Self {
        Self::new(VarType::char(), ConstValue::Int(i32::from(value)))
    }

    pub fn long(value: i64) -> Self {
        Self::new(VarType::long(), ConstValue::Long(value))
    }

    pub fn float(value: f32) -> Self {
        Self::new(VarType::float(), ConstValue::Float(value))
    }

    pub fn double(value: f64) -> Self {
        Self::new(VarType::double(), ConstValue::Double(value))
    }

    pub fn string(value: impl Into<String>) -> Self {
        Self::new(VarType::string(), ConstValue::Str(value.into()))
    }

    pub fn null() -> Self {
        Self::new(VarType::null(), ConstValue::Null)
    }

    /// `X.class`, typed `Class<X>` (primitives boxed).
    pub fn class_literal(named: VarType) -> Self {
        let arg = match box_class(named.kind()) {
            Some(boxed) if named.array_dim() == 0 => VarType::object(boxed),
            _ => named.clone(),
        };
        Self::new(
            VarType::generic(nova_decomp_types::JAVA_LANG_CLASS, vec![Some(arg)]),
            ConstValue::Class(named),
        )
    }

    /// A type with no value, as carried by cast and `instanceof` targets.
    pub fn type_only(ty: VarType) -> Self {
        Self::new(ty, ConstValue::TypeOnly)
    }

    pub fn with_condy(mut self) -> Self {
        self.condy = true;
        self
    }

    /// Zero value of `ty`: `0`, `0L`, `0.0F`, `0.0`, `false`, or `null`.
    pub fn default_value_for(ty: &VarType) -> Self {
        if ty.array_dim() > 0 {
            return Self::null();
        }
        match ty.kind() {
            TypeKind::Boolean => Self::boolean(false),
            TypeKind::Long => Self::long(0),
            TypeKind::Float => Self::float(0.0),
            TypeKind::Double => Self::double(0.0),
            TypeKind::Char => Self::char(0),
            kind if ty.family() == TypeFamily::Integer => {
                Self::typed_int(VarType::primitive(kind), 0)
            }
            _ => Self::null(),
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self.value, ConstValue::Null)
    }

    pub fn int_value(&self) -> Option<i32> {
        match self.value {
            ConstValue::Int(v) => Some(v),
            _ => None,
        }
    }

    pub fn has_boolean_value(&self, options: &DecompilerOptions) -> bool {
        match (self.ty.kind(), &self.value) {
            (
                TypeKind::Boolean
                | TypeKind::Char
                | TypeKind::Byte
                | TypeKind::ByteChar
                | TypeKind::Short
                | TypeKind::ShortChar
                | TypeKind::Int,
                ConstValue::Int(v),
            ) => *v == 0 || (options.boolean_true_one && *v == 1),
            _ => false,
        }
    }

    pub fn has_value_one(&self) -> bool {
        self.numeric_equals(1)
    }

    pub fn is_zero(&self) -> bool {
        self.numeric_equals(0)
    }

    fn numeric_equals(&self, n: i8) -> bool {
        if self.ty.array_dim() > 0 || self.ty.kind() == TypeKind::Boolean {
            return false;
        }
        match self.value {
            ConstValue::Int(v) => v == i32::from(n),
            ConstValue::Long(v) => v == i64::from(n),
            ConstValue::Float(v) => v == f32::from(n),
            ConstValue::Double(v) => v == f64::from(n),
            _ => false,
        }
    }

    /// The type this constant takes in a position expecting `expected`: small integers
    /// relax to `char` in char contexts (when they spell as a readable char) and to `int`
    /// in int contexts. The node itself is not modified.
    pub fn adjusted_type(&self, expected: &VarType) -> VarType {
        if expected.array_dim() > 0 {
            return self.ty.clone();
        }
        let char_context = expected.kind() == TypeKind::Char
            || expected.is_class_named("java/lang/Character");
        let int_context = expected.kind() == TypeKind::Int
            || expected.is_class_named("java/lang/Integer");
        match (self.ty.kind(), &self.value) {
            (TypeKind::ByteChar | TypeKind::ShortChar, ConstValue::Int(v))
                if char_context && is_char_literal_friendly(*v as u32) =>
            {
                VarType::char()
            }
            (_, ConstValue::Int(_))
                if int_context && self.ty.array_dim() == 0 && self.ty.family() == TypeFamily::Integer =>
            {
                VarType::int()
            }
            _ => self.ty.clone(),
        }
    }

    /// Whether the literal renders through the symbolic constant tables.
    fn is_uninlined(&self) -> Option<(&'static str, bool)> {
        match self.value {
            ConstValue::Double(v) if self.ty.kind() == TypeKind::Double => {
                uninlined_double(v).map(|text| (text, is_no_paren_double(v)))
            }
            ConstValue::Float(v) if self.ty.kind() == TypeKind::Float => {
                uninlined_float(v).map(|text| (text, is_no_paren_float(v)))
            }
            _ => None,
        }
    }

    /// `0`, or `4` for symbolic expressions like `Math.PI / 2` that need parentheses as
    /// operands.
    pub fn precedence(&self, options: &DecompilerOptions) -> u8 {
        if self.is_null() || options.literals_as_is {
            return 0;
        }
        match self.is_uninlined() {
            Some((text, no_paren)) if !no_paren && text.matches('(').count() < 2 => 4,
            _ => 0,
        }
    }

    /// Source text of the constant rendered as `ty` (its own type, or an adjusted one).
    pub fn literal(&self, ty: &VarType, ctx: &DecompileContext<'_>) -> Result<String> {
        let mut out = String::new();
        if self.condy && ctx.options.decompiler_comments {
            out.push_str("/* $VF: constant dynamic */ ");
        }
        if matches!(self.value, ConstValue::TypeOnly) {
            out.push_str(&cast_type_name(ty, ctx));
            return Ok(out);
        }
        out.push_str(&self.value_text(&unboxed(ty), ctx)?);
        Ok(out)
    }

    fn invalid(&self, ty: &VarType) -> EmitError {
        EmitError::InvalidConstantType { ty: ty.to_string() }
    }

    fn value_text(&self, ty: &VarType, ctx: &DecompileContext<'_>) -> Result<String> {
        let options = ctx.options;
        let literal = options.literals_as_is;
        if ty.array_dim() > 0 {
            return match self.value {
                ConstValue::Null => Ok("null".to_string()),
                _ => Err(self.invalid(ty)),
            };
        }
        let text = match (ty.kind(), &self.value) {
            (TypeKind::Boolean, ConstValue::Int(v)) => (*v != 0).to_string(),
            (TypeKind::Char, ConstValue::Int(v)) => char_literal(u32::from(*v as u16), options.ascii_strings),
            (TypeKind::Int, ConstValue::Int(v)) if !literal && *v == i32::MAX => "Integer.MAX_VALUE".to_string(),
            (TypeKind::Int, ConstValue::Int(v)) if !literal && *v == i32::MIN => "Integer.MIN_VALUE".to_string(),
            (
                TypeKind::Byte | TypeKind::ByteChar | TypeKind::Short | TypeKind::ShortChar | TypeKind::Int,
                ConstValue::Int(v),
            ) => v.to_string(),
            (TypeKind::Long, ConstValue::Long(v)) if !literal && *v == i64::MAX => "Long.MAX_VALUE".to_string(),
            (TypeKind::Long, ConstValue::Long(v)) if !literal && *v == i64::MIN => "Long.MIN_VALUE".to_string(),
            (TypeKind::Long, ConstValue::Long(v)) => format!("{v}L"),
            (TypeKind::Long, ConstValue::Int(v)) => format!("{v}L"),
            (TypeKind::Float, ConstValue::Float(v)) => float_literal(*v, literal),
            (TypeKind::Double, ConstValue::Double(v)) => double_literal(*v, literal),
            (TypeKind::Null, _) | (TypeKind::Object | TypeKind::GenVar, ConstValue::Null) => "null".to_string(),
            (TypeKind::Object, ConstValue::Str(s)) => string_literal(s, options.ascii_strings),
            (TypeKind::Object, ConstValue::Class(named)) => format!("{}.class", cast_type_name(named, ctx)),
            _ => return Err(self.invalid(ty)),
        };
        Ok(text)
    }
}

fn float_literal(value: f32, literal: bool) -> String {
    if literal {
        if value.is_nan() {
            return "0.0F / 0.0F".to_string();
        }
        if value.is_infinite() {
            return if value > 0.0 { "1.0F / 0.0F" } else { "-1.0F / 0.0F" }.to_string();
        }
    } else {
        if value.is_nan() {
            return "Float.NaN".to_string();
        }
        if let Some(text) = uninlined_float(value) {
            return text.to_string();
        }
    }
    format!("{}F", float_text(value))
}

fn double_literal(value: f64, literal: bool) -> String {
    if literal {
        if value.is_nan() {
            return "0.0 / 0.0".to_string();
        }
        if value.is_infinite() {
            return if value > 0.0 { "1.0 / 0.0" } else { "-1.0 / 0.0" }.to_string();
        }
        return double_text(value);
    }
    if value.is_nan() {
        return "Double.NaN".to_string();
    }
    if let Some(text) = uninlined_double(value) {
        return text.to_string();
    }
    let single = value as f32;
    if f64::from(single) == value {
        let short = float_text(single);
        let long = double_text(value);
        if short.len() < long.len() {
            return match uninlined_float(single) {
                Some(text) => text.to_string(),
                None => format!("{short}F"),
            };
        }
    }
    double_text(value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use nova_decomp_types::ClassStore;
    use pretty_assertions::assert_eq;

    fn render(c: &ConstExprent, options: &DecompilerOptions) -> String {
        let store = ClassStore::new();
        let ctx = DecompileContext::new(&store, "a/Main").with_options(options);
        c.literal(&c.ty, &ctx).unwrap()
    }

    #[test]
    fn guesses_the_narrowest_kind() {
        assert_eq!(guess_type(1, true), VarType::boolean());
        assert!(guess_type(2, true).is_false_boolean());
        assert_eq!(guess_type(100, false), VarType::byte_char());
        assert_eq!(guess_type(-5, false), VarType::byte());
        assert_eq!(guess_type(300, false), VarType::short_char());
        assert_eq!(guess_type(-300, false), VarType::short());
        assert_eq!(guess_type(40000, false), VarType::char());
        assert_eq!(guess_type(70000, false), VarType::int());
    }

    #[test]
    fn integer_limits_have_names_unless_literal() {
        let options = DecompilerOptions::default();
        let literal = DecompilerOptions {
            literals_as_is: true,
            ..DecompilerOptions::default()
        };
        let max = ConstExprent::typed_int(VarType::int(), i32::MAX);
        assert_eq!(render(&max, &options), "Integer.MAX_VALUE");
        assert_eq!(render(&max, &literal), "2147483647");
        assert_eq!(render(&ConstExprent::long(i64::MIN), &options), "Long.MIN_VALUE");
        assert_eq!(render(&ConstExprent::long(3), &options), "3L");
    }

    #[test]
    fn doubles_prefer_shorter_float_spelling() {
        let options = DecompilerOptions::default();
        assert_eq!(render(&ConstExprent::double(f64::from(0.3f32)), &options), "0.3F");
        assert_eq!(render(&ConstExprent::double(0.3), &options), "0.3");
        assert_eq!(render(&ConstExprent::float(2.5), &options), "2.5F");
    }

    #[test]
    fn negative_char_values_wrap_to_sixteen_bits() {
        let options = DecompilerOptions::default();
        let c = ConstExprent::typed_int(VarType::char(), -1);
        assert_eq!(render(&c, &options), "'\\uffff'");
        let c = ConstExprent::typed_int(VarType::char(), -65_536 + 65);
        assert_eq!(render(&c, &options), "'A'");
    }

    #[test]
    fn adjusted_type_relaxes_small_integers() {
        let c = ConstExprent::int(65, false);
        assert_eq!(c.adjusted_type(&VarType::char()), VarType::char());
        assert_eq!(c.adjusted_type(&VarType::int()), VarType::int());
        assert_eq!(c.adjusted_type(&VarType::long()), VarType::byte_char());
        assert_eq!(ConstExprent::int(1, false).adjusted_type(&VarType::char()), VarType::byte_char());
    }

    #[test]
    fn symbolic_values_need_parentheses_as_operands() {
        let options = DecompilerOptions::default();
        assert_eq!(ConstExprent::double(std::f64::consts::PI / 2.0).precedence(&options), 4);
        assert_eq!(ConstExprent::double(std::f64::consts::PI).precedence(&options), 0);
        assert_eq!(ConstExprent::double(1.0).precedence(&options), 0);
    }

    #[test]
    fn class_literals_and_type_only_constants() {
        let options = DecompilerOptions::default();
        let c = ConstExprent::class_literal(VarType::int());
        assert_eq!(c.ty.args()[0], Some(VarType::object("java/lang/Integer")));
        assert_eq!(render(&c, &options), "int.class");
        let arr = ConstExprent::class_literal(VarType::string().resize_array_dim(1));
        assert_eq!(render(&arr, &options), "String[].class");
        let cast = ConstExprent::type_only(VarType::object("java/util/List"));
        assert_eq!(render(&cast, &options), "java.util.List");
    }

    #[test]
    fn unsupported_kinds_are_errors() {
        let store = ClassStore::new();
        let ctx = DecompileContext::new(&store, "a/Main");
        let c = ConstExprent::new(VarType::void(), ConstValue::Int(0));
        assert!(matches!(c.literal(&c.ty, &ctx), Err(EmitError::InvalidConstantType { .. })));
    }
}

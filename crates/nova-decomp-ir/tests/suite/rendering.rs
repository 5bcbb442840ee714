use std::f64::consts::PI;

use nova_decomp_ir::{
    list_to_java, to_source_text, ArmBody, AssignmentExprent, ConstExprent, DecompileContext,
    DecompilerOptions, ExitExprent, Exprent, FieldExprent, FunctionExprent, FunctionType,
    InvocationExprent, LambdaBody, LambdaExpr, NewExprent, SwitchArm, SwitchExprent, VarExprent,
    VarInfo, VarTable, VarVersion,
};
use nova_decomp_types::{AccessFlags, ClassInfo, ClassStore, FieldInfo, VarType};
use pretty_assertions::assert_eq;

fn render(e: &Exprent, ctx: &DecompileContext<'_>) -> String {
    to_source_text(e, ctx, 0).expect("renders").into_string()
}

fn var(index: u32, ty: VarType) -> Exprent {
    Exprent::new(VarExprent::new(VarVersion::new(index, 0), ty))
}

#[test]
fn byte_constants_assigned_to_ints_need_no_cast() {
    let store = ClassStore::new();
    let vars = VarTable::new().with_var(VarVersion::new(1, 0), VarInfo::named("x").with_type(VarType::int()));
    let ctx = DecompileContext::new(&store, "app/Main").with_vars(&vars);
    let assignment = Exprent::new(AssignmentExprent::new(
        var(1, VarType::int()),
        Exprent::new(ConstExprent::typed_int(VarType::byte(), 5)),
    ));
    let text = list_to_java(&[assignment], &ctx, 0).expect("renders").into_string();
    assert_eq!(text, "x = 5;\n");
}

#[test]
fn nan_is_symbolic_unless_literals_are_kept() {
    let store = ClassStore::new();
    let nan = Exprent::new(ConstExprent::double(f64::NAN));

    let ctx = DecompileContext::new(&store, "app/Main");
    assert_eq!(render(&nan, &ctx), "Double.NaN");

    let options = DecompilerOptions::from_toml_str("literals_as_is = true").expect("valid options");
    let ctx = ctx.with_options(&options);
    assert_eq!(render(&nan, &ctx), "0.0 / 0.0");
}

#[test]
fn multiples_of_pi_render_symbolically() {
    let store = ClassStore::new();
    let ctx = DecompileContext::new(&store, "app/Main");
    assert_eq!(render(&Exprent::new(ConstExprent::double(PI / 2.0)), &ctx), "Math.PI / 2");

    let scaled = Exprent::new(FunctionExprent::new(
        FunctionType::Mul,
        vec![var(1, VarType::double()), Exprent::new(ConstExprent::double(PI / 2.0))],
    ));
    assert_eq!(render(&scaled, &ctx), "var1 * (Math.PI / 2)");

    let plain = Exprent::new(FunctionExprent::new(
        FunctionType::Mul,
        vec![var(1, VarType::double()), Exprent::new(ConstExprent::double(PI))],
    ));
    assert_eq!(render(&plain, &ctx), "var1 * Math.PI");
}

#[test]
fn exhaustive_enum_switches_have_no_default() {
    let constant = AccessFlags(AccessFlags::PUBLIC | AccessFlags::STATIC | AccessFlags::FINAL | AccessFlags::ENUM);
    let store = ClassStore::new().with_class(
        ClassInfo::new("app/Mode", AccessFlags(AccessFlags::PUBLIC | AccessFlags::FINAL | AccessFlags::ENUM))
            .with_super("java/lang/Enum")
            .with_field(FieldInfo::new("app/Mode", "ON", "Lapp/Mode;", constant))
            .with_field(FieldInfo::new("app/Mode", "OFF", "Lapp/Mode;", constant)),
    );
    let vars = VarTable::new().with_var(VarVersion::new(1, 0), VarInfo::named("mode"));
    let ctx = DecompileContext::new(&store, "app/Main").with_vars(&vars);

    let case = |name: &str, value: &str| {
        SwitchArm::case(
            vec![Exprent::new(FieldExprent::new_static("app/Mode", name, "Lapp/Mode;"))],
            ArmBody::Expression(Box::new(Exprent::new(ConstExprent::string(value)))),
        )
    };
    let error = Exprent::new(NewExprent::object(
        VarType::object("java/lang/IncompatibleClassChangeError"),
        Some(InvocationExprent::constructor("java/lang/IncompatibleClassChangeError", "()V", Vec::new())),
    ));
    let switch = Exprent::new(SwitchExprent::new(
        var(1, VarType::object("app/Mode")),
        vec![
            case("ON", "on"),
            case("OFF", "off"),
            SwitchArm::default(ArmBody::Expression(Box::new(Exprent::new(ExitExprent::throw(error))))),
        ],
    ));

    let text = render(&switch, &ctx);
    assert_eq!(text, "switch (mode) {\n    case ON -> \"on\";\n    case OFF -> \"off\";\n}");
}

#[test]
fn lambdas_take_their_parameter_names_from_the_variable_table() {
    let store = ClassStore::new();
    let vars = VarTable::new()
        .with_var(VarVersion::new(1, 0), VarInfo::named("a"))
        .with_var(VarVersion::new(2, 0), VarInfo::named("b"));
    let ctx = DecompileContext::new(&store, "app/Main").with_vars(&vars);
    let sum = Exprent::new(FunctionExprent::new(
        FunctionType::Add,
        vec![var(1, VarType::int()), var(2, VarType::int())],
    ));
    let lambda = Exprent::new(NewExprent::lambda(
        VarType::object("java/util/function/IntBinaryOperator"),
        LambdaExpr::body(
            "applyAsInt",
            "(II)I",
            "app/Main",
            "lambda$main$0",
            "(II)I",
            vec![VarVersion::new(1, 0), VarVersion::new(2, 0)],
            LambdaBody::Expression(Box::new(sum)),
        ),
    ));
    assert_eq!(render(&lambda, &ctx), "(a, b) -> a + b");

    let printer = Exprent::new(NewExprent::lambda(
        VarType::object("java/util/function/Consumer"),
        LambdaExpr::method_ref(
            "accept",
            "(Ljava/lang/Object;)V",
            "java/io/PrintStream",
            "println",
            "(Ljava/lang/Object;)V",
            Some(Exprent::new(FieldExprent::new_static("java/lang/System", "out", "Ljava/io/PrintStream;"))),
        ),
    ));
    assert_eq!(render(&printer, &ctx), "System.out::println");
}

#[test]
fn options_reject_unknown_keys() {
    let err = DecompilerOptions::from_toml_str("no_such_option = 1").unwrap_err();
    assert!(err.to_string().contains("no_such_option"), "{err}");
}

#[test]
fn cloned_casts_follow_their_own_assignment_target() {
    let store = ClassStore::new().with_class(
        ClassInfo::new("java/util/List", AccessFlags(AccessFlags::PUBLIC | AccessFlags::INTERFACE))
            .with_signature("<E:Ljava/lang/Object;>Ljava/lang/Object;"),
    );
    let names_type = VarType::generic("java/util/List", vec![Some(VarType::string())]);
    let vars = VarTable::new()
        .with_var(VarVersion::new(1, 0), VarInfo::named("obj").with_type(VarType::object_type()))
        .with_var(VarVersion::new(2, 0), VarInfo::named("names").with_type(names_type.clone()))
        .with_var(VarVersion::new(3, 0), VarInfo::named("any").with_type(VarType::object_type()));
    let ctx = DecompileContext::new(&store, "app/Main").with_vars(&vars);

    let cast = Exprent::new(FunctionExprent::cast(
        var(1, VarType::object_type()),
        VarType::object("java/util/List"),
    ));
    let copy = cast.clone();
    assert_ne!(copy.id(), cast.id());
    assert_ne!(copy.children()[0].id(), cast.children()[0].id());

    let statements = [
        Exprent::new(AssignmentExprent::new(var(2, names_type), cast)),
        Exprent::new(AssignmentExprent::new(var(3, VarType::object_type()), copy)),
    ];
    let text = list_to_java(&statements, &ctx, 0).expect("renders").into_string();
    let lines: Vec<&str> = text.lines().collect();
    assert!(lines[0].starts_with("names = (") && lines[0].contains("List<"), "{text}");
    assert_eq!(lines[1], "any = (java.util.List)obj;");
}

use nova_decomp_types::{
    generic_supertype, AccessFlags, ClassInfo, ClassStore, MethodInfo, SymbolDb, VarType, Wildcard,
};
use pretty_assertions::assert_eq;

fn function_db() -> ClassStore {
    ClassStore::new()
        .with_class(
            ClassInfo::new("java/util/function/Function", AccessFlags(AccessFlags::INTERFACE))
                .with_signature("<T:Ljava/lang/Object;R:Ljava/lang/Object;>Ljava/lang/Object;")
                .with_method(
                    MethodInfo::new(
                        "java/util/function/Function",
                        "apply",
                        "(Ljava/lang/Object;)Ljava/lang/Object;",
                        AccessFlags(AccessFlags::PUBLIC | AccessFlags::ABSTRACT),
                    )
                    .with_signature("(TT;)TR;"),
                ),
        )
        .with_class(
            ClassInfo::new("app/Parser", AccessFlags(AccessFlags::PUBLIC))
                .with_interface("java/util/function/Function")
                .with_signature(
                    "Ljava/lang/Object;Ljava/util/function/Function<Ljava/lang/String;Ljava/lang/Integer;>;",
                ),
        )
}

#[test]
fn method_generic_types_prefer_the_signature() {
    let db = function_db();
    let apply = db
        .lookup_method(
            "java/util/function/Function",
            "apply",
            "(Ljava/lang/Object;)Ljava/lang/Object;",
        )
        .expect("apply is declared");
    assert_eq!(apply.generic_params(), &[VarType::gen_var("T")]);
    assert_eq!(apply.generic_return(), &VarType::gen_var("R"));
    assert_eq!(apply.parsed.ret, VarType::object_type());
}

#[test]
fn implementing_class_binds_interface_arguments() {
    let db = function_db();
    let sup = generic_supertype(&VarType::object("app/Parser"), "java/util/function/Function", &db)
        .expect("Parser implements Function");
    assert_eq!(
        sup,
        VarType::generic(
            "java/util/function/Function",
            vec![Some(VarType::string()), Some(VarType::object("java/lang/Integer"))]
        )
    );
}

#[test]
fn lenient_parsing_degrades_to_unknown() {
    assert_eq!(
        VarType::parse_lenient("Ljava/util/List<+Ljava/lang/Number;>;"),
        VarType::generic(
            "java/util/List",
            vec![Some(VarType::object("java/lang/Number").with_wildcard(Wildcard::Extends))]
        )
    );
    assert_eq!(VarType::parse_lenient("Ljava/util/List<"), VarType::unknown());
}

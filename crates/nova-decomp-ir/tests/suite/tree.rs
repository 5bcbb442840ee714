use nova_decomp_ir::{
    BytecodeOffsets, ConstExprent, Exprent, FunctionExprent, FunctionType, VarExprent, VarVersion,
};
use nova_decomp_types::VarType;
use pretty_assertions::assert_eq;

fn product() -> Exprent {
    Exprent::new(FunctionExprent::new(
        FunctionType::Mul,
        vec![
            Exprent::with_bytecode(VarExprent::new(VarVersion::new(1, 0), VarType::int()), BytecodeOffsets::single(4)),
            Exprent::with_bytecode(ConstExprent::int(3, false), BytecodeOffsets::single(6)),
        ],
    ))
}

#[test]
fn copies_are_independent_of_the_original() {
    let original = product();
    let mut copy = original.copy();
    assert_ne!(copy.id(), original.id());
    assert_eq!(copy.children().len(), 2);

    let target = copy.children()[1].id();
    copy.replace_exprent(target, Exprent::new(ConstExprent::int(9, false)))
        .expect("direct child is replaced");

    assert_eq!(original.children()[1].as_const().and_then(|c| c.int_value()), Some(3));
    assert_eq!(copy.children()[1].as_const().and_then(|c| c.int_value()), Some(9));
    assert!(original.children()[0].contains_var(VarVersion::new(1, 0)));
}

#[test]
fn replacing_a_grandchild_leaves_the_tree_unchanged() {
    let mut outer = Exprent::new(FunctionExprent::new(FunctionType::Neg, vec![product()]));
    let grandchild = outer.all_exprents(true)[1].id();
    let before = outer.clone();
    let rejected = outer.replace_exprent(grandchild, Exprent::new(ConstExprent::int(0, false)));
    assert!(rejected.is_err());
    assert_eq!(outer, before);
}

#[test]
fn bytecode_ranges_cover_the_subtree() {
    let tree = product();
    let range = tree.bytecode_range();
    assert!(range.contains(4));
    assert!(range.contains(6));
    assert_eq!(range.len(), 2);
    assert!(tree.bytecode.is_empty());
}

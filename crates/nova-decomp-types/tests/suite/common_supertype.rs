use nova_decomp_types::{AccessFlags, ClassInfo, ClassStore, TypeKind, VarType};
use pretty_assertions::assert_eq;
use proptest::prelude::*;

fn shapes() -> ClassStore {
    ClassStore::new()
        .with_class(ClassInfo::new("geo/Shape", AccessFlags(AccessFlags::PUBLIC)))
        .with_class(ClassInfo::new("geo/Circle", AccessFlags(AccessFlags::PUBLIC)).with_super("geo/Shape"))
        .with_class(ClassInfo::new("geo/Square", AccessFlags(AccessFlags::PUBLIC)).with_super("geo/Shape"))
        .with_class(ClassInfo::new("io/Stream", AccessFlags(AccessFlags::PUBLIC)))
        .with_class(ClassInfo::new("java/lang/Runnable", AccessFlags(AccessFlags::PUBLIC | AccessFlags::INTERFACE)))
        .with_class(ClassInfo::new("task/Job", AccessFlags(AccessFlags::PUBLIC)).with_interface("java/lang/Runnable"))
        .with_class(ClassInfo::new("task/Timer", AccessFlags(AccessFlags::PUBLIC)).with_interface("java/lang/Runnable"))
}

fn integer_kind() -> impl Strategy<Value = TypeKind> {
    prop_oneof![
        Just(TypeKind::Int),
        Just(TypeKind::Short),
        Just(TypeKind::Char),
        Just(TypeKind::Byte),
        Just(TypeKind::ShortChar),
        Just(TypeKind::ByteChar),
    ]
}

proptest! {
    #[test]
    fn widening_pair_yields_the_wider_type(a in integer_kind(), b in integer_kind()) {
        let db = ClassStore::new();
        let (a, b) = (VarType::primitive(a), VarType::primitive(b));
        let common = VarType::common_supertype(&a, &b, &db).expect("integer family always unifies");
        prop_assert!(common.is_superset(&a));
        prop_assert!(common.is_superset(&b));
        if a.is_superset(&b) {
            prop_assert_eq!(common, a);
        } else if b.is_superset(&a) {
            prop_assert_eq!(common, b);
        }
    }

    #[test]
    fn common_supertype_is_symmetric_for_integers(a in integer_kind(), b in integer_kind()) {
        let db = ClassStore::new();
        let (a, b) = (VarType::primitive(a), VarType::primitive(b));
        prop_assert_eq!(
            VarType::common_supertype(&a, &b, &db),
            VarType::common_supertype(&b, &a, &db)
        );
    }
}

#[test]
fn sibling_classes_unify_to_their_parent() {
    let db = shapes();
    assert_eq!(
        VarType::common_supertype(&VarType::object("geo/Circle"), &VarType::object("geo/Square"), &db),
        Some(VarType::object("geo/Shape"))
    );
}

#[test]
fn classes_sharing_only_an_interface_unify_to_it() {
    let db = shapes();
    let (job, timer) = (VarType::object("task/Job"), VarType::object("task/Timer"));
    assert_eq!(
        VarType::common_supertype(&job, &timer, &db),
        Some(VarType::object("java/lang/Runnable"))
    );
    assert_eq!(
        VarType::common_supertype(&timer, &job, &db),
        Some(VarType::object("java/lang/Runnable"))
    );
}

#[test]
fn unrelated_classes_have_no_common_supertype() {
    let db = shapes();
    assert_eq!(
        VarType::common_supertype(&VarType::object("geo/Circle"), &VarType::object("io/Stream"), &db),
        None
    );
}

#[test]
fn subclass_unifies_with_its_superclass() {
    let db = shapes();
    assert_eq!(
        VarType::common_supertype(&VarType::object("geo/Shape"), &VarType::object("geo/Circle"), &db),
        Some(VarType::object("geo/Shape"))
    );
    assert_eq!(
        VarType::common_supertype(&VarType::null(), &VarType::object("geo/Circle"), &db),
        Some(VarType::object("geo/Circle"))
    );
}

#[test]
fn families_do_not_cross() {
    let db = shapes();
    assert_eq!(VarType::common_supertype(&VarType::int(), &VarType::float(), &db), None);
    assert_eq!(VarType::common_supertype(&VarType::boolean(), &VarType::int(), &db), None);
}

use super::*;
use std::rc::Rc;

#[test]
fn test_variable_storage_is_shared_with_host() {
    let table = SymbolTable::new();
    let x = table.add_variable("x", 1.5).unwrap();
    x.set(4.0);
    assert_eq!(table.value("x"), Some(4.0));
    assert!(!table.is_constant("x"));
}

#[test]
fn test_reserved_and_duplicate_names_rejected() {
    let table = SymbolTable::new();
    assert_eq!(
        table.add_variable("while", 0.0).unwrap_err(),
        SymbolError::Reserved("while".to_string())
    );
    assert_eq!(
        table.add_variable("sin", 0.0).unwrap_err(),
        SymbolError::Reserved("sin".to_string())
    );
    assert_eq!(
        table.add_variable("1x", 0.0).unwrap_err(),
        SymbolError::InvalidName("1x".to_string())
    );
    table.add_variable("x", 0.0).unwrap();
    assert_eq!(
        table.add_string("x", "str").unwrap_err(),
        SymbolError::AlreadyDefined("x".to_string())
    );
}

#[test]
fn test_empty_vector_rejected() {
    let table = SymbolTable::new();
    assert!(matches!(
        table.add_vector("v", &[]),
        Err(SymbolError::EmptyVector(_))
    ));
}

#[test]
fn test_function_arity_bound() {
    let table = SymbolTable::new();
    let f = NativeFunction::new(21, |_| 0.0).into_rc();
    assert!(matches!(
        table.add_function("f", f),
        Err(SymbolError::ArityTooLarge { arity: 21, .. })
    ));
}

#[test]
fn test_first_table_wins() {
    let first = SymbolTable::new();
    let second = SymbolTable::immutable();
    first.add_variable("x", 1.0).unwrap();
    second.add_variable("x", 2.0).unwrap();
    second.add_vector("v", &[1.0, 2.0]).unwrap();

    let mut list = SymbolTableList::new();
    list.push(first);
    list.push(second);

    let x = list.lookup_variable("x").unwrap();
    assert_eq!(x.value.get(), 1.0);
    assert!(!x.immutable);
    assert!(list.is_immutable("v"));
    assert_eq!(list.get_vector("v").unwrap().len(), 2);
    assert!(list.get_string("v").is_none());
}

#[test]
fn test_immutable_ranges_cover_storage() {
    let locked = SymbolTable::immutable();
    let open = SymbolTable::new();
    let a = locked.add_variable("a", 1.0).unwrap();
    let v = locked.add_vector("v", &[1.0, 2.0, 3.0]).unwrap();
    let b = open.add_variable("b", 2.0).unwrap();

    let mut list = SymbolTableList::new();
    list.push(locked);
    list.push(open);
    let ranges = list.immutable_ranges();

    assert!(ranges.contains(Rc::as_ptr(&a)));
    assert!(ranges.contains(&v[2] as *const _));
    assert!(!ranges.contains(Rc::as_ptr(&b)));
}

#[test]
fn test_add_variable_goes_to_first_table() {
    let first = SymbolTable::new();
    let mut list = SymbolTableList::new();
    list.push(first.clone());
    list.push(SymbolTable::new());

    list.add_variable("k", 3.0, true).unwrap();
    assert!(first.is_constant("k"));
    assert_eq!(
        SymbolTableList::new().add_variable("k", 1.0, false),
        Err(SymbolError::NoTable)
    );
}

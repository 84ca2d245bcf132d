use super::*;

#[test]
fn test_heap_deref() {
    let h = Heap::new(42i64);
    assert_eq!(*h, 42);
}

#[test]
fn test_heap_clone_shares_allocation() {
    let h1 = Heap::new(vec![1, 2, 3]);
    let h2 = h1.clone();
    assert_eq!(*h1, *h2);
    assert!(Heap::ptr_eq(&h1, &h2));
}

#[test]
fn test_heap_eq_is_by_content() {
    let h1 = Heap::new("hello".to_string());
    let h2 = Heap::new("hello".to_string());
    assert_eq!(h1, h2);
    assert!(!Heap::ptr_eq(&h1, &h2));
}

#[test]
fn test_shared_clone_observes_writes() {
    let a = Shared::new(vec![1]);
    let b = a.clone();
    a.write().push(2);
    assert_eq!(*b.read(), vec![1, 2]);
    assert!(Shared::ptr_eq(&a, &b));
    assert_eq!(a.addr(), b.addr());
}

#[test]
fn test_shared_distinct_storage() {
    let a = Shared::new(0);
    let b = Shared::new(0);
    assert!(!Shared::ptr_eq(&a, &b));
    assert_ne!(a.addr(), b.addr());
}

use super::*;
use crate::evaluator::Operator;
use crate::symbols::new_string;

fn binary(arena: &mut NodeArena, left: NodeId, right: NodeId) -> NodeId {
    arena.allocate(Node::Binary {
        op: Operator::Add,
        left: Operand::Node(left),
        right: Operand::Node(right),
    })
}

#[test]
fn test_depth_is_one_more_than_deepest_child() {
    let mut arena = NodeArena::new();
    let a = arena.allocate(Node::Literal(1.0));
    let b = arena.allocate(Node::Literal(2.0));
    assert_eq!(arena.depth(&a), 1);
    let sum = binary(&mut arena, a, b);
    assert_eq!(arena.depth(&sum), 2);
    let c = arena.allocate(Node::Literal(3.0));
    let outer = binary(&mut arena, sum, c);
    assert_eq!(arena.depth(&outer), 3);
}

#[test]
fn test_free_tree_releases_every_descendant() {
    let mut arena = NodeArena::new();
    let a = arena.allocate(Node::Literal(1.0));
    let b = arena.allocate(Node::Literal(2.0));
    let sum = binary(&mut arena, a, b);
    let c = arena.allocate(Node::Literal(3.0));
    let root = arena.allocate(Node::Sequence(vec![sum, c]));
    assert_eq!(arena.live_count(), 5);

    arena.free_tree(root);
    assert_eq!(arena.live_count(), 0);
}

#[test]
fn test_take_hands_children_to_caller() {
    let mut arena = NodeArena::new();
    let a = arena.allocate(Node::Literal(1.0));
    let b = arena.allocate(Node::Literal(2.0));
    let sum = binary(&mut arena, a, b);

    let children = arena.take(sum).into_children();
    assert_eq!(children.len(), 2);
    assert_eq!(arena.live_count(), 2);
    assert_eq!(arena.literal(&children[1]), Some(2.0));
    arena.free_all(children);
    assert_eq!(arena.live_count(), 0);
}

#[test]
fn test_slots_are_recycled() {
    let mut arena = NodeArena::new();
    let a = arena.allocate(Node::Literal(1.0));
    let first = format!("{a:?}");
    arena.free_tree(a);
    let b = arena.allocate(Node::Null);
    assert_eq!(format!("{b:?}"), first);
    assert!(arena.get(&b).is_null());
}

#[test]
fn test_kind_inference() {
    let mut arena = NodeArena::new();
    let s = arena.allocate(Node::StringVar(new_string("abc")));
    let n = arena.allocate(Node::Literal(0.0));
    assert_eq!(arena.kind(&s), ValueKind::String);
    let seq = arena.allocate(Node::Sequence(vec![n, s]));
    assert_eq!(arena.kind(&seq), ValueKind::String);

    let v = arena.allocate(Node::Vector {
        vector: crate::symbols::new_vector(4),
        start: 1,
        len: 2,
    });
    assert_eq!(arena.kind(&v), ValueKind::Vector);
    assert_eq!(arena.vector_size(&v), 2);
}

#[test]
#[should_panic(expected = "node id refers to a released slot")]
fn test_lookup_through_released_id_panics() {
    let mut arena = NodeArena::new();
    let a = arena.allocate(Node::Literal(1.0));
    let _b = arena.allocate(Node::Literal(2.0));
    arena.free_tree(a);
    arena.get(&NodeId(0));
}

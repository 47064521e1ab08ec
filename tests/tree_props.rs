//! Property tests for tree indexing and discretization

use ancestra::character::equal_width_bins;
use ancestra::newick::parse;
use ancestra::Tree;
use proptest::prelude::*;

/// Random polytomous tree shape; tips get labels at render time.
#[derive(Debug, Clone)]
enum Shape {
    Tip,
    Internal(Vec<Shape>),
}

fn shapes() -> impl Strategy<Value = Shape> {
    let tip = Just(Shape::Tip);
    tip.prop_recursive(4, 24, 4, |inner| {
        prop::collection::vec(inner, 2..=4).prop_map(Shape::Internal)
    })
}

fn render(shape: &Shape) -> String {
    fn walk(shape: &Shape, next_tip: &mut usize, out: &mut String) {
        match shape {
            Shape::Tip => {
                out.push('T');
                out.push_str(&next_tip.to_string());
                out.push_str(":1");
                *next_tip += 1;
            }
            Shape::Internal(children) => {
                out.push('(');
                for (position, child) in children.iter().enumerate() {
                    if position > 0 {
                        out.push(',');
                    }
                    walk(child, next_tip, out);
                }
                out.push_str("):1");
            }
        }
    }
    let mut out = String::new();
    let mut next_tip = 0;
    walk(shape, &mut next_tip, &mut out);
    out.push(';');
    out
}

fn index_ranges(tree: &Tree) -> Vec<(usize, usize)> {
    tree.preorder(tree.root())
        .map(|n| (tree.node(n).left_index, tree.node(n).right_index))
        .collect()
}

proptest! {
    /// Index ranges of any two nodes are either nested or disjoint,
    /// never partially overlapping.
    #[test]
    fn index_ranges_nest(shape in shapes()) {
        let tree = parse(&render(&shape)).unwrap();
        let ranges = index_ranges(&tree);
        for (i, &(al, ar)) in ranges.iter().enumerate() {
            prop_assert!(al <= ar);
            for &(bl, br) in &ranges[i + 1..] {
                let nested = (al <= bl && br <= ar) || (bl <= al && ar <= br);
                let disjoint = ar < bl || br < al;
                prop_assert!(nested || disjoint);
            }
        }
    }

    /// Every child's range sits strictly inside its ancestor's.
    #[test]
    fn child_ranges_sit_inside_parent(shape in shapes()) {
        let tree = parse(&render(&shape)).unwrap();
        for node in tree.preorder(tree.root()) {
            for &child in tree.node(node).children() {
                prop_assert!(tree.node(node).spans(tree.node(child)));
                prop_assert!(!tree.node(child).spans(tree.node(node)));
            }
        }
    }

    /// Tips carry 1..=T in left-to-right order; internals carry
    /// T+1..=N in preorder.
    #[test]
    fn identifiers_partition_by_kind(shape in shapes()) {
        let tree = parse(&render(&shape)).unwrap();
        let root = tree.root();
        let tips = tree.tip_count(root);
        let total = tree.node_count(root);
        let tip_ids: Vec<usize> = tree.tips(root).map(|n| tree.node(n).id).collect();
        prop_assert_eq!(tip_ids, (1..=tips).collect::<Vec<_>>());
        let internal_ids: Vec<usize> =
            tree.internals(root).map(|n| tree.node(n).id).collect();
        prop_assert_eq!(internal_ids, (tips + 1..=total).collect::<Vec<_>>());
    }

    /// Sorting by right index yields children before parents; sorting
    /// by left index yields parents before children.
    #[test]
    fn index_sorts_give_valid_evaluation_orders(shape in shapes()) {
        let tree = parse(&render(&shape)).unwrap();
        let root = tree.root();

        let mut bottom_up: Vec<_> = tree.preorder(root).collect();
        bottom_up.sort_by_key(|&n| tree.node(n).right_index);
        let mut seen = vec![false; tree.arena_len()];
        for &node in &bottom_up {
            for &child in tree.node(node).children() {
                prop_assert!(seen[child]);
            }
            seen[node] = true;
        }

        let mut top_down = bottom_up;
        top_down.sort_by_key(|&n| tree.node(n).left_index);
        let mut seen = vec![false; tree.arena_len()];
        for &node in &top_down {
            if let Some(parent) = tree.node(node).ancestor {
                prop_assert!(seen[parent]);
            }
            seen[node] = true;
        }
    }

    /// Equal-width bins always place every observation in exactly one
    /// bin, including the extremes.
    #[test]
    fn equal_width_bins_cover_every_observation(
        values in prop::collection::vec(-1e6f64..1e6, 1..24),
        count in 1usize..8,
    ) {
        let bins = equal_width_bins(&values, count).unwrap();
        prop_assert_eq!(bins.len(), count);
        for &value in &values {
            let containing = bins.iter().filter(|b| b.contains(value)).count();
            prop_assert_eq!(containing, 1);
        }
    }
}

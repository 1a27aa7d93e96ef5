use phylodata::error::Error;
use phylodata::model::context::Context;
use phylodata::model::taxa::{TaxaBlock, Taxon};
use phylodata::model::tree::Tree;
use rand::SeedableRng;
use rand::rngs::StdRng;

// (Kiwi:1,(Kakapo:1,Kea:1):1):0
fn build_three_bird_tree(ctx: &mut Context) -> (Tree, [usize; 5]) {
    let mut tree = Tree::new(ctx);
    let root = tree.add_node(ctx);
    let kiwi = tree.add_node(ctx);
    let inner = tree.add_node(ctx);
    let kakapo = tree.add_node(ctx);
    let kea = tree.add_node(ctx);

    tree.set_root(root).unwrap();
    tree.attach_child(root, kiwi).unwrap();
    tree.attach_child(root, inner).unwrap();
    tree.attach_child(inner, kakapo).unwrap();
    tree.attach_child(inner, kea).unwrap();

    tree[kiwi].set_name("Kiwi").unwrap();
    tree[kakapo].set_name("Kakapo").unwrap();
    tree[kea].set_name("Kea").unwrap();
    for index in [kiwi, inner, kakapo, kea] {
        tree[index].set_branch_length(Some(1.0)).unwrap();
    }
    tree[root].set_branch_length(Some(0.0)).unwrap();

    (tree, [root, kiwi, inner, kakapo, kea])
}

#[test]
fn test_basic_structure() {
    let mut ctx = Context::new();
    let (tree, [root, kiwi, inner, kakapo, kea]) = build_three_bird_tree(&mut ctx);

    assert!(tree.is_valid());
    assert_eq!(tree.num_nodes(), 5);
    assert_eq!(tree.num_terminals(), 3);
    assert_eq!(tree.root(), Some(root));

    assert_eq!(tree.children(root).collect::<Vec<_>>(), vec![kiwi, inner]);
    assert_eq!(tree.children(inner).collect::<Vec<_>>(), vec![kakapo, kea]);
    assert_eq!(tree.terminals(), vec![kiwi, kakapo, kea]);
    assert_eq!(tree.internals(), vec![root, inner]);

    assert!(tree[kiwi].is_terminal());
    assert!(tree[inner].is_internal());
    assert_eq!(tree[kea].parent(), Some(inner));
}

#[test]
fn test_traversal_orders() {
    let mut ctx = Context::new();
    let (tree, [root, kiwi, inner, kakapo, kea]) = build_three_bird_tree(&mut ctx);

    let pre: Vec<usize> = tree.pre_order().collect();
    assert_eq!(pre, vec![root, kiwi, inner, kakapo, kea]);

    let post: Vec<usize> = tree.post_order().collect();
    assert_eq!(post, vec![kiwi, kakapo, kea, inner, root]);
}

#[test]
fn test_metrics() {
    let mut ctx = Context::new();
    let (tree, [root, kiwi, inner, kakapo, kea]) = build_three_bird_tree(&mut ctx);

    assert_eq!(tree.path_to_root(kea), 2.0);
    assert_eq!(tree.path_to_root(kiwi), 1.0);
    assert_eq!(tree.path_to_root(root), 0.0);

    assert_eq!(tree.max_path_to_tips(root), 2.0);
    assert_eq!(tree.min_path_to_tips(root), 1.0);
    assert_eq!(tree.max_path_to_tips(inner), 1.0);
    assert_eq!(tree.max_path_to_tips(kakapo), 0.0);

    assert_eq!(tree.max_nodes_to_tips(root), 2);
    assert_eq!(tree.min_nodes_to_tips(root), 1);
    assert_eq!(tree.max_nodes_to_tips(kea), 0);
}

#[test]
fn test_missing_branch_length_counts_as_zero() {
    let mut ctx = Context::new();
    let (mut tree, [root, _, inner, kakapo, _]) = build_three_bird_tree(&mut ctx);

    tree[inner].set_branch_length(None).unwrap();
    assert_eq!(tree.path_to_root(kakapo), 1.0);
    assert_eq!(tree.max_path_to_tips(root), 1.0);
}

#[test]
fn test_branch_length_rejects_bad_values() {
    let mut ctx = Context::new();
    let mut tree = Tree::new(&mut ctx);
    let node = tree.add_node(&mut ctx);

    assert!(matches!(
        tree[node].set_branch_length(Some(-1.0)),
        Err(Error::InvalidNumber(_))
    ));
    assert!(tree[node].set_branch_length(Some(f64::NAN)).is_err());
    assert!(tree[node].set_branch_length(Some(f64::INFINITY)).is_err());
    assert!(tree[node].set_branch_length(Some(0.0)).is_ok());
}

#[test]
fn test_ancestors() {
    let mut ctx = Context::new();
    let (tree, [root, kiwi, inner, kakapo, _]) = build_three_bird_tree(&mut ctx);

    assert_eq!(tree.ancestors(kakapo), vec![inner, root]);
    assert_eq!(tree.ancestors(kiwi), vec![root]);
    assert!(tree.ancestors(root).is_empty());
}

#[test]
fn test_second_root_rejected() {
    let mut ctx = Context::new();
    let (mut tree, [_, kiwi, _, _, _]) = build_three_bird_tree(&mut ctx);

    let other = tree.add_node(&mut ctx);
    assert!(matches!(tree.set_root(other), Err(Error::Structure(_))));
    // attached nodes cannot become root either
    assert!(tree.set_root(kiwi).is_err());
}

#[test]
fn test_cycle_and_reattachment_rejected() {
    let mut ctx = Context::new();
    let (mut tree, [root, kiwi, inner, kakapo, _]) = build_three_bird_tree(&mut ctx);

    // would close a cycle
    assert!(matches!(
        tree.attach_child(kakapo, inner),
        Err(Error::Structure(_))
    ));
    assert!(tree.attach_child(inner, inner).is_err());
    // already attached
    assert!(tree.attach_child(root, kiwi).is_err());
    // the root cannot become a child
    assert!(tree.attach_child(inner, root).is_err());
    assert!(tree.is_valid());
}

#[test]
fn test_detach_keeps_subtree() {
    let mut ctx = Context::new();
    let (mut tree, [root, kiwi, inner, kakapo, kea]) = build_three_bird_tree(&mut ctx);

    tree.detach(inner).unwrap();
    assert_eq!(tree.children(root).collect::<Vec<_>>(), vec![kiwi]);
    assert_eq!(tree[inner].parent(), None);
    assert_eq!(tree.children(inner).collect::<Vec<_>>(), vec![kakapo, kea]);
    // detached subtree makes the tree malformed until reattached
    assert!(!tree.is_valid());

    tree.attach_child(root, inner).unwrap();
    assert!(tree.is_valid());
}

#[test]
fn test_remove_node_splices_children_in_place() {
    let mut ctx = Context::new();
    let (mut tree, [root, kiwi, inner, kakapo, kea]) = build_three_bird_tree(&mut ctx);

    // give the root a trailing child so the splice lands mid-chain
    let tui = tree.add_node(&mut ctx);
    tree[tui].set_name("Tui").unwrap();
    tree.attach_child(root, tui).unwrap();

    let inner_id = tree[inner].id();
    tree.remove_node(&mut ctx, inner).unwrap();

    assert_eq!(
        tree.children(root).collect::<Vec<_>>(),
        vec![kiwi, kakapo, kea, tui]
    );
    assert_eq!(tree[kakapo].parent(), Some(root));
    assert_eq!(tree[kea].parent(), Some(root));
    assert!(tree.node(inner).is_none());
    assert_eq!(tree.num_nodes(), 5);
    assert!(tree.is_valid());
    // the id is gone from the registry
    assert!(!ctx.registry.is_live(inner_id));
}

#[test]
fn test_remove_terminal_node() {
    let mut ctx = Context::new();
    let (mut tree, [_, kiwi, inner, kakapo, kea]) = build_three_bird_tree(&mut ctx);

    tree.remove_node(&mut ctx, kakapo).unwrap();
    assert_eq!(tree.children(inner).collect::<Vec<_>>(), vec![kea]);
    assert_eq!(tree.terminals(), vec![kiwi, kea]);
    assert!(tree.is_valid());
}

#[test]
fn test_remove_root_with_children_rejected() {
    let mut ctx = Context::new();
    let (mut tree, [root, ..]) = build_three_bird_tree(&mut ctx);

    assert!(matches!(
        tree.remove_node(&mut ctx, root),
        Err(Error::Structure(_))
    ));
    assert!(tree.is_valid());
}

#[test]
#[should_panic(expected = "no live node at index")]
fn test_indexing_removed_node_panics() {
    let mut ctx = Context::new();
    let (mut tree, [_, _, _, kakapo, _]) = build_three_bird_tree(&mut ctx);

    tree.remove_node(&mut ctx, kakapo).unwrap();
    let _ = tree[kakapo].name();
}

#[test]
fn test_resolve_bifurcates_polytomy() {
    let mut ctx = Context::new();
    let mut tree = Tree::new(&mut ctx);

    let root = tree.add_node(&mut ctx);
    tree.set_root(root).unwrap();
    let names = ["Kiwi", "Kakapo", "Kea", "Tui"];
    let mut tips = Vec::new();
    for name in names {
        let tip = tree.add_node(&mut ctx);
        tree[tip].set_name(name).unwrap();
        tree[tip].set_branch_length(Some(1.0)).unwrap();
        tree.attach_child(root, tip).unwrap();
        tips.push(tip);
    }
    assert_eq!(tree.children(root).count(), 4);

    let mut rng = StdRng::seed_from_u64(42);
    tree.resolve(&mut ctx, &mut rng).unwrap();

    assert!(tree.is_valid());
    // strictly bifurcating: every internal node has exactly two children
    for index in tree.internals() {
        assert_eq!(tree.children(index).count(), 2);
    }
    // same terminal set, in some order
    let mut terminal_names: Vec<&str> = tree
        .terminals()
        .iter()
        .map(|&idx| tree[idx].name().unwrap())
        .collect();
    terminal_names.sort();
    assert_eq!(terminal_names, vec!["Kakapo", "Kea", "Kiwi", "Tui"]);
    // new internal branches have length 0, so tip depths are unchanged
    for &tip in &tips {
        assert_eq!(tree.path_to_root(tip), 1.0);
    }
}

#[test]
fn test_resolve_is_deterministic_for_a_seed() {
    let mut ctx_a = Context::new();
    let mut ctx_b = Context::new();
    let build = |ctx: &mut Context| {
        let mut tree = Tree::new(ctx);
        let root = tree.add_node(ctx);
        tree.set_root(root).unwrap();
        for name in ["Moa", "Weka", "Takahe", "Pukeko", "Tieke"] {
            let tip = tree.add_node(ctx);
            tree[tip].set_name(name).unwrap();
            tree.attach_child(root, tip).unwrap();
        }
        tree
    };
    let mut tree_a = build(&mut ctx_a);
    let mut tree_b = build(&mut ctx_b);

    let mut rng_a = StdRng::seed_from_u64(7);
    let mut rng_b = StdRng::seed_from_u64(7);
    tree_a.resolve(&mut ctx_a, &mut rng_a).unwrap();
    tree_b.resolve(&mut ctx_b, &mut rng_b).unwrap();

    let shape_a: Vec<Vec<usize>> = tree_a
        .pre_order()
        .map(|idx| tree_a.children(idx).collect())
        .collect();
    let shape_b: Vec<Vec<usize>> = tree_b
        .pre_order()
        .map(|idx| tree_b.children(idx).collect())
        .collect();
    assert_eq!(shape_a, shape_b);
}

#[test]
fn test_dispose_unregisters_nodes_tree_and_link() {
    let mut ctx = Context::new();
    let (mut tree, _) = build_three_bird_tree(&mut ctx);

    let mut block = TaxaBlock::new(&mut ctx);
    block.insert(Taxon::with_name(&mut ctx, "Kiwi").unwrap());
    tree.cross_reference(&mut ctx, &block);

    let tree_id = tree.id();
    let node_ids: Vec<_> = tree.node_indices().map(|idx| tree[idx].id()).collect();
    assert_eq!(ctx.mediator.block_of(tree_id), Some(block.id()));

    tree.dispose(&mut ctx);
    assert!(!ctx.registry.is_live(tree_id));
    for id in node_ids {
        assert!(!ctx.registry.is_live(id));
    }
    // the mediator no longer knows the tree
    assert_eq!(ctx.mediator.block_of(tree_id), None);
    assert!(ctx.mediator.all_links_of(block.id()).is_empty());
}

#[test]
fn test_duplicate_deep_copies_with_fresh_ids() {
    let mut ctx = Context::new();
    let (tree, [root, kiwi, ..]) = build_three_bird_tree(&mut ctx);

    let copy = tree.duplicate(&mut ctx);
    assert_ne!(copy.id().raw(), tree.id().raw());
    assert_ne!(copy[kiwi].id(), tree[kiwi].id());
    assert_eq!(copy[kiwi].name(), Some("Kiwi"));
    assert_eq!(copy.root(), Some(root));
    assert_eq!(copy.num_nodes(), tree.num_nodes());
    assert!(copy.is_valid());
}

#[test]
fn test_get_by_value_and_regex() {
    let mut ctx = Context::new();
    let (mut tree, [_, kiwi, _, kakapo, kea]) = build_three_bird_tree(&mut ctx);

    tree[kiwi].set_score(Some(3.0)).unwrap();
    tree[kakapo].set_score(Some(6.0)).unwrap();
    tree[kea].set_score(Some(9.0)).unwrap();

    let hits = tree.get_by_value("get_score", "gt", 5.0).unwrap();
    assert_eq!(hits, vec![kakapo, kea]);
    let hits = tree.get_by_value("get_score", "le", 3.0).unwrap();
    assert_eq!(hits, vec![kiwi]);

    let hits = tree.get_by_regex("get_name", "^K").unwrap();
    assert_eq!(hits, vec![kiwi, kakapo, kea]);
    let hits = tree.get_by_regex("get_name", "points").unwrap();
    assert!(hits.is_empty());

    assert!(matches!(
        tree.get_by_value("get_altitude", "gt", 0.0),
        Err(Error::UnknownOperation(_))
    ));
    assert!(tree.get_by_value("get_score", "approximately", 0.0).is_err());
    assert!(tree.get_by_regex("get_name", "(unclosed").is_err());
}

#[test]
fn test_cross_reference_links_terminals() {
    let mut ctx = Context::new();
    let (mut tree, [_, kiwi, _, kakapo, kea]) = build_three_bird_tree(&mut ctx);

    let mut block = TaxaBlock::new(&mut ctx);
    for name in ["Kiwi", "Kakapo", "Moa"] {
        block.insert(Taxon::with_name(&mut ctx, name).unwrap());
    }

    let linked = tree.cross_reference(&mut ctx, &block);
    assert_eq!(linked, 2);

    let kiwi_taxon = block.taxon_by_name("Kiwi").unwrap().id();
    assert_eq!(tree[kiwi].taxon(), Some(kiwi_taxon));
    assert!(tree[kakapo].taxon().is_some());
    assert_eq!(tree[kea].taxon(), None);

    // the link block -> tree is recorded in the mediator
    assert_eq!(ctx.mediator.block_of(tree.id()), Some(block.id()));
}

#[test]
fn test_to_ascii_renders_every_node() {
    let mut ctx = Context::new();
    let (tree, _) = build_three_bird_tree(&mut ctx);

    let rendered = tree.to_ascii();
    assert!(rendered.starts_with("Tree with 3 terminals (5 nodes total):"));
    for name in ["\"Kiwi\"", "\"Kakapo\"", "\"Kea\""] {
        assert!(rendered.contains(name), "missing {name} in:\n{rendered}");
    }
}

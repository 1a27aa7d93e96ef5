use phylodata::error::Error;
use phylodata::model::context::Context;
use phylodata::model::datatype::DataType;
use phylodata::model::forest::Forest;
use phylodata::model::listable::{Comparator, EntityList};
use phylodata::model::matrix::{Datum, Matrix};
use phylodata::model::taxa::{TaxaBlock, Taxon};
use phylodata::model::tree::Tree;

fn scored_taxa(ctx: &mut Context) -> EntityList<Taxon> {
    let mut list = EntityList::new();
    for (name, score) in [("Kea", 3.0), ("Kaka", 6.0), ("Kakapo", 9.0)] {
        let mut taxon = Taxon::with_name(ctx, name).unwrap();
        taxon.set_score(Some(score)).unwrap();
        list.insert(taxon);
    }
    list
}

#[test]
fn test_insertion_order_and_lookup() {
    let mut ctx = Context::new();
    let list = scored_taxa(&mut ctx);

    assert_eq!(list.len(), 3);
    assert_eq!(list.first().unwrap().name(), Some("Kea"));
    assert_eq!(list.last().unwrap().name(), Some("Kakapo"));
    assert_eq!(list.get(1).unwrap().name(), Some("Kaka"));
    assert!(list.get(3).is_none());

    let id = list.get(1).unwrap().id();
    assert!(list.contains_id(id));
    assert_eq!(list.by_id(id).unwrap().name(), Some("Kaka"));
}

#[test]
fn test_take_by_id() {
    let mut ctx = Context::new();
    let mut list = scored_taxa(&mut ctx);

    let id = list.get(1).unwrap().id();
    let taken = list.take_by_id(id).unwrap();
    assert_eq!(taken.name(), Some("Kaka"));
    assert_eq!(list.len(), 2);
    assert!(!list.contains_id(id));
    assert!(list.take_by_id(id).is_none());
}

#[test]
fn test_clear_unregisters_elements() {
    let mut ctx = Context::new();
    let mut list = scored_taxa(&mut ctx);
    let ids: Vec<_> = list.iter().map(Taxon::id).collect();

    list.clear(&mut ctx);
    assert!(list.is_empty());
    for id in ids {
        assert!(!ctx.registry.is_live(id));
    }
}

#[test]
fn test_get_by_value() {
    let mut ctx = Context::new();
    let list = scored_taxa(&mut ctx);

    let heavy = list.get_by_value("get_score", "gt", 5.0).unwrap();
    assert_eq!(heavy.len(), 2);
    assert_eq!(heavy[0].name(), Some("Kaka"));
    assert_eq!(heavy[1].name(), Some("Kakapo"));

    assert_eq!(list.get_by_value("get_score", "le", 3.0).unwrap().len(), 1);
    assert_eq!(list.get_by_value("get_score", "eq", 6.0).unwrap().len(), 1);
    assert_eq!(list.get_by_value("get_score", "ge", 3.0).unwrap().len(), 3);
    assert!(list.get_by_value("get_score", "lt", 3.0).unwrap().is_empty());

    // elements without a value for the field are excluded, not errors
    let mut ctx = Context::new();
    let mut sparse = EntityList::new();
    sparse.insert(Taxon::with_name(&mut ctx, "Moa").unwrap());
    assert!(sparse.get_by_value("get_score", "gt", 0.0).unwrap().is_empty());
}

#[test]
fn test_get_by_value_errors() {
    let mut ctx = Context::new();
    let list = scored_taxa(&mut ctx);

    assert!(matches!(
        list.get_by_value("get_wingspan", "gt", 0.0),
        Err(Error::UnknownOperation(_))
    ));
    assert!(matches!(
        list.get_by_value("get_score", "between", 0.0),
        Err(Error::BadArguments(_))
    ));
}

#[test]
fn test_get_by_regex() {
    let mut ctx = Context::new();
    let list = scored_taxa(&mut ctx);

    let hits = list.get_by_regex("get_name", "^Kaka").unwrap();
    assert_eq!(hits.len(), 2);
    assert_eq!(hits[0].name(), Some("Kaka"));

    assert!(list.get_by_regex("get_name", "Tui").unwrap().is_empty());
    assert!(list.get_by_regex("get_name", "(unclosed").is_err());
}

#[test]
fn test_comparator_parse_and_compare() {
    assert_eq!(Comparator::parse("lt").unwrap(), Comparator::Lt);
    assert_eq!(Comparator::parse("eq").unwrap(), Comparator::Eq);
    assert!(Comparator::parse("LT").is_err());
    assert!(Comparator::parse("").is_err());

    assert!(Comparator::Lt.compare(1.0, 2.0));
    assert!(!Comparator::Lt.compare(2.0, 2.0));
    assert!(Comparator::Le.compare(2.0, 2.0));
    assert!(Comparator::Ge.compare(2.0, 2.0));
    assert!(Comparator::Gt.compare(3.0, 2.0));
    assert!(Comparator::Eq.compare(2.0, 2.0));
}

#[test]
fn test_matrix_rows_and_columns() {
    let mut ctx = Context::new();
    let mut matrix = Matrix::new(&mut ctx, DataType::dna());

    let kiwi = Datum::from_row(&mut ctx, matrix.datatype(), "Kiwi", "ACGTAC").unwrap();
    let kea = Datum::from_row(&mut ctx, matrix.datatype(), "Kea", "ACGT").unwrap();
    matrix.insert(kiwi).unwrap();
    matrix.insert(kea).unwrap();

    assert_eq!(matrix.len(), 2);
    assert_eq!(matrix.num_columns(), 6);
    assert_eq!(matrix.rows().get(1).unwrap().symbol_at(0), Some("A"));

    // an offset row widens the matrix from its start column
    let mut late = Datum::new(&mut ctx);
    late.set_name("Moa").unwrap();
    late.set_start_column(4);
    late.set_sequence(matrix.datatype(), "GGG").unwrap();
    matrix.insert(late).unwrap();
    assert_eq!(matrix.num_columns(), 7);
    assert_eq!(matrix.rows().get(2).unwrap().symbol_at(4), Some("G"));
    assert_eq!(matrix.rows().get(2).unwrap().symbol_at(3), None);
}

#[test]
fn test_matrix_rejects_invalid_rows() {
    let mut ctx = Context::new();
    let matrix = Matrix::new(&mut ctx, DataType::dna());

    assert!(matches!(
        Datum::from_row(&mut ctx, matrix.datatype(), "Kiwi", "ACEG"),
        Err(Error::BadArguments(_))
    ));

    // a row built against one datatype still revalidates on insert
    let mut matrix = Matrix::new(&mut ctx, DataType::restriction());
    let dna_row = Datum::from_row(&mut ctx, &DataType::dna(), "Kiwi", "ACGT").unwrap();
    assert!(matrix.insert(dna_row).is_err());
    assert!(matrix.is_empty());
}

#[test]
fn test_matrix_remove_unregisters_row() {
    let mut ctx = Context::new();
    let mut matrix = Matrix::new(&mut ctx, DataType::dna());
    let row = Datum::from_row(&mut ctx, matrix.datatype(), "Kiwi", "ACGT").unwrap();
    let row_id = row.id();
    matrix.insert(row).unwrap();

    assert!(matrix.remove(&mut ctx, row_id));
    assert!(matrix.is_empty());
    assert!(!ctx.registry.is_live(row_id));
    assert!(!matrix.remove(&mut ctx, row_id));
}

#[test]
fn test_matrix_cross_reference() {
    let mut ctx = Context::new();
    let mut block = TaxaBlock::new(&mut ctx);
    for name in ["Kiwi", "Kea"] {
        block.insert(Taxon::with_name(&mut ctx, name).unwrap());
    }

    let mut matrix = Matrix::new(&mut ctx, DataType::dna());
    for name in ["Kiwi", "Kea", "Moa"] {
        let row = Datum::from_row(&mut ctx, matrix.datatype(), name, "ACGT").unwrap();
        matrix.insert(row).unwrap();
    }

    let linked = matrix.cross_reference(&mut ctx, &block);
    assert_eq!(linked, 2);
    assert!(matrix.rows().get(0).unwrap().taxon().is_some());
    assert!(matrix.rows().get(2).unwrap().taxon().is_none());
    assert_eq!(ctx.mediator.block_of(matrix.id()), Some(block.id()));
}

#[test]
fn test_forest_insert_remove_and_cross_reference() {
    let mut ctx = Context::new();
    let mut block = TaxaBlock::new(&mut ctx);
    block.insert(Taxon::with_name(&mut ctx, "Kiwi").unwrap());

    let build_tree = |ctx: &mut Context| {
        let mut tree = Tree::new(ctx);
        let root = tree.add_node(ctx);
        let tip = tree.add_node(ctx);
        tree.set_root(root).unwrap();
        tree.attach_child(root, tip).unwrap();
        tree[tip].set_name("Kiwi").unwrap();
        tree
    };

    let mut forest = Forest::new(&mut ctx).with_name("posterior").unwrap();
    let first = build_tree(&mut ctx);
    let second = build_tree(&mut ctx);
    let first_id = first.id();
    forest.insert(first);
    forest.insert(second);
    assert_eq!(forest.len(), 2);

    // one linked node per tree
    assert_eq!(forest.cross_reference(&mut ctx, &block), 2);

    let node_ids: Vec<_> = {
        let tree = forest.trees().by_id(first_id).unwrap();
        tree.node_indices().map(|idx| tree[idx].id()).collect()
    };
    assert!(forest.remove(&mut ctx, first_id));
    assert_eq!(forest.len(), 1);
    assert!(!ctx.registry.is_live(first_id));
    for id in node_ids {
        assert!(!ctx.registry.is_live(id));
    }
}

#[test]
fn test_matrix_dispose_unregisters_rows_and_link() {
    let mut ctx = Context::new();
    let mut block = TaxaBlock::new(&mut ctx);
    block.insert(Taxon::with_name(&mut ctx, "Kiwi").unwrap());

    let mut matrix = Matrix::new(&mut ctx, DataType::dna());
    let row = Datum::from_row(&mut ctx, matrix.datatype(), "Kiwi", "ACGT").unwrap();
    let row_id = row.id();
    matrix.insert(row).unwrap();
    matrix.cross_reference(&mut ctx, &block);

    let matrix_id = matrix.id();
    matrix.dispose(&mut ctx);
    assert!(!ctx.registry.is_live(matrix_id));
    assert!(!ctx.registry.is_live(row_id));
    assert_eq!(ctx.mediator.block_of(matrix_id), None);
    assert!(ctx.mediator.all_links_of(block.id()).is_empty());
}

#[test]
fn test_forest_dispose_unregisters_everything() {
    let mut ctx = Context::new();
    let mut forest = Forest::new(&mut ctx);
    let forest_id = forest.id();
    let mut ids = Vec::new();
    for _ in 0..2 {
        let mut tree = Tree::new(&mut ctx);
        let root = tree.add_node(&mut ctx);
        tree.set_root(root).unwrap();
        ids.push(tree.id());
        ids.push(tree[root].id());
        forest.insert(tree);
    }

    forest.dispose(&mut ctx);
    assert!(!ctx.registry.is_live(forest_id));
    for id in ids {
        assert!(!ctx.registry.is_live(id));
    }
    assert!(ctx.registry.is_empty());
}

#[test]
fn test_matrix_duplicate() {
    let mut ctx = Context::new();
    let mut matrix = Matrix::new(&mut ctx, DataType::dna()).with_name("alignment").unwrap();
    let row = Datum::from_row(&mut ctx, matrix.datatype(), "Kiwi", "ACGT").unwrap();
    matrix.insert(row).unwrap();

    let copy = matrix.duplicate(&mut ctx);
    assert_ne!(copy.id(), matrix.id());
    assert_eq!(copy.name(), Some("alignment"));
    assert_eq!(copy.len(), 1);
    assert_ne!(
        copy.rows().get(0).unwrap().id(),
        matrix.rows().get(0).unwrap().id()
    );
    assert!(copy.datatype().is_same(matrix.datatype()));
}

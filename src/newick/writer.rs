//! Newick format writing.

use crate::model::node::NodeIndex;
use crate::model::tree::Tree;

/// Characters that force a label into quoted form
const QUOTE_TRIGGERS: &[char] = &['(', ')', ',', ':', ';', '[', ']', '\'', ' ', '\t', '\n', '\r'];

/// Per-node estimate for "(,)" structure characters
const INTERNAL_NODE_CHARS: usize = 3;
/// Per-node estimate for ":0.009529961339106089" branch length text
const BRANCH_LENGTH_CHARS: usize = 20;

/// Returns the Newick representation of `tree`, terminated with `;`.
///
/// Node names are emitted for terminals and, when present, for internal
/// nodes; branch lengths are emitted wherever set (including on the root).
/// Returns `";"` alone for a tree with no root.
///
/// # Example
/// ```
/// use phylodata::model::context::Context;
/// use phylodata::model::tree::Tree;
/// use phylodata::newick;
///
/// let mut ctx = Context::new();
/// let mut tree = Tree::new(&mut ctx);
/// let root = tree.add_node(&mut ctx);
/// let a = tree.add_node(&mut ctx);
/// let b = tree.add_node(&mut ctx);
/// tree.set_root(root).unwrap();
/// tree.attach_child(root, a).unwrap();
/// tree.attach_child(root, b).unwrap();
/// tree[a].set_name("A").unwrap();
/// tree[a].set_branch_length(Some(1.0)).unwrap();
/// tree[b].set_name("B").unwrap();
/// tree[b].set_branch_length(Some(2.0)).unwrap();
///
/// assert_eq!(newick::write(&tree), "(A:1,B:2);");
/// ```
pub fn write(tree: &Tree) -> String {
    let Some(root) = tree.root() else {
        return ";".to_string();
    };

    // Estimate capacity: structure + labels + branch lengths
    let num_nodes = tree.num_nodes();
    let label_capacity: usize = tree
        .pre_order()
        .filter_map(|idx| tree[idx].name().map(str::len))
        .sum();
    let estimated_capacity =
        num_nodes * INTERNAL_NODE_CHARS + label_capacity + num_nodes * BRANCH_LENGTH_CHARS;

    let mut newick = String::with_capacity(estimated_capacity);
    write_node(tree, root, &mut newick);
    newick.push(';');
    newick
}

fn write_node(tree: &Tree, index: NodeIndex, newick: &mut String) {
    let node = &tree[index];

    if node.is_internal() {
        newick.push('(');
        for (position, child) in tree.children(index).enumerate() {
            if position > 0 {
                newick.push(',');
            }
            write_node(tree, child, newick);
        }
        newick.push(')');
    }

    if let Some(name) = node.name() {
        newick.push_str(&escape_label(name));
    }
    if let Some(length) = node.branch_length() {
        newick.push(':');
        newick.push_str(&length.to_string());
    }
}

/// Quotes a label if it contains Newick structure characters or whitespace,
/// doubling any embedded single quotes.
pub fn escape_label(label: &str) -> String {
    if label.contains(QUOTE_TRIGGERS) {
        format!("'{}'", label.replace('\'', "''"))
    } else {
        label.to_string()
    }
}

//! The input model: a uniform, immutable view over a reducible sequence of
//! atoms, and the index-set `Configuration`s a reducer operates on.
//!
//! An atom is the smallest indivisible unit of an input: a byte, a
//! character, a line, a token, or a tree node. The sequence reducers
//! (`ddmin`, `TicTocMin`, `ProbDD`) are generic over the atom type and
//! require only that atoms be cloneable and orderable for materialization;
//! they never see the underlying buffer, only index sets into it.

use std::fmt::Debug;

/// The bound required of an atom for it to be reducible.
///
/// Kept deliberately small: a sequence reducer only ever clones atoms back
/// out of a `Configuration` during `materialize`, so `Clone` and `Debug` are
/// all that is required. Concrete models (bytes, lines, tokens) add whatever
/// further bounds their own `materialize` needs.
pub trait Atom: Clone + Debug {}

impl<T: Clone + Debug> Atom for T {}

/// An ordered index set into an `InputModel`'s atom sequence.
///
/// Invariant: indices are kept sorted and deduplicated, so two
/// `Configuration`s with the same index set always compare equal and always
/// materialize to the same candidate. The empty index set is a valid
/// configuration; a reducer's full starting configuration holds every index
/// `0..n`.
#[derive(Clone, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Configuration {
    indices: Vec<usize>,
}

impl Configuration {
    /// The full configuration over `n` atoms: `{0, 1, ..., n-1}`.
    pub fn full(n: usize) -> Configuration {
        Configuration { indices: (0..n).collect() }
    }

    /// The empty configuration.
    pub fn empty() -> Configuration {
        Configuration { indices: Vec::new() }
    }

    /// Build a configuration from an arbitrary iterator of indices,
    /// normalizing to sorted, deduplicated order.
    pub fn from_indices<I: IntoIterator<Item = usize>>(indices: I) -> Configuration {
        let mut indices: Vec<usize> = indices.into_iter().collect();
        indices.sort();
        indices.dedup();
        Configuration { indices: indices }
    }

    /// The number of atoms in this configuration.
    pub fn len(&self) -> usize {
        self.indices.len()
    }

    /// Is this configuration empty?
    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }

    /// Read-only access to the sorted indices.
    pub fn indices(&self) -> &[usize] {
        &self.indices
    }

    /// Does this configuration contain the given index?
    pub fn contains(&self, index: usize) -> bool {
        self.indices.binary_search(&index).is_ok()
    }

    /// The set difference `self \ other`.
    pub fn difference(&self, other: &Configuration) -> Configuration {
        Configuration::from_indices(
            self.indices
                .iter()
                .cloned()
                .filter(|i| !other.contains(*i)),
        )
    }

    /// The set union `self ∪ other`.
    pub fn union(&self, other: &Configuration) -> Configuration {
        Configuration::from_indices(self.indices.iter().cloned().chain(other.indices.iter().cloned()))
    }

    /// The set intersection `self ∩ other`.
    pub fn intersection(&self, other: &Configuration) -> Configuration {
        Configuration::from_indices(
            self.indices
                .iter()
                .cloned()
                .filter(|i| other.contains(*i)),
        )
    }

    /// Partition this configuration into `g` contiguous blocks of (as
    /// nearly as possible) equal size, per ddmin's partitioning step.
    /// Block sizes are `ceil(|c|/g)` or `floor(|c|/g)`; there are always
    /// exactly `g` blocks (some may be empty if `g > |c|`).
    pub fn partition(&self, g: usize) -> Vec<Configuration> {
        assert!(g > 0);
        let n = self.indices.len();
        let base = n / g;
        let rem = n % g;
        let mut blocks = Vec::with_capacity(g);
        let mut start = 0;
        for i in 0..g {
            let size = base + if i < rem { 1 } else { 0 };
            let end = start + size;
            blocks.push(Configuration::from_indices(self.indices[start..end].iter().cloned()));
            start = end;
        }
        blocks
    }

    /// Iterate the contained indices in ascending order.
    pub fn iter(&self) -> impl Iterator<Item = usize> + '_ {
        self.indices.iter().cloned()
    }
}

/// A uniform, immutable view over a reducible sequence of atoms.
///
/// `materialize` is pure and deterministic; the model owns the decoded atom
/// sequence for the life of the run and is never re-read or mutated.
pub trait InputModel {
    /// The decoded atom type this model produces.
    type Atom: Atom;
    /// The materialized external representation (bytes, string, list).
    type Rendered;

    /// The number of atoms, `n`.
    fn size(&self) -> usize;

    /// A read-only view of the `n` atoms in order.
    fn atoms(&self) -> &[Self::Atom];

    /// Assemble the atoms named by `configuration`, in index order, into the
    /// external representation the oracle expects.
    fn materialize(&self, configuration: &Configuration) -> Self::Rendered;

    /// Render `configuration` into canonical bytes suitable for content-based
    /// fingerprinting, independent of `Rendered` (which may not itself be
    /// byte-shaped, e.g. `ItemModel<i32>`).
    ///
    /// The default debug-formats each selected atom in order, separated by a
    /// NUL byte that cannot appear inside a `Debug` implementation's typical
    /// output; two configurations collide under this encoding only when
    /// their selected atoms are themselves debug-identical, which is enough
    /// to satisfy fingerprint injectivity for any `Atom: Debug`. Concrete
    /// models with a cheaper canonical byte form (e.g. `ByteModel`) may
    /// override it.
    fn fingerprint_bytes(&self, configuration: &Configuration) -> Vec<u8> {
        let mut out = Vec::new();
        for i in configuration.iter() {
            out.extend_from_slice(format!("{:?}", self.atoms()[i]).as_bytes());
            out.push(0);
        }
        out
    }
}

/// An input model over raw bytes.
#[derive(Clone, Debug)]
pub struct ByteModel {
    atoms: Vec<u8>,
}

impl ByteModel {
    /// Build a byte model from a buffer, one atom per byte.
    pub fn new(buf: Vec<u8>) -> ByteModel {
        ByteModel { atoms: buf }
    }
}

impl InputModel for ByteModel {
    type Atom = u8;
    type Rendered = Vec<u8>;

    fn size(&self) -> usize {
        self.atoms.len()
    }

    fn atoms(&self) -> &[u8] {
        &self.atoms
    }

    fn materialize(&self, configuration: &Configuration) -> Vec<u8> {
        configuration.iter().map(|i| self.atoms[i]).collect()
    }

    fn fingerprint_bytes(&self, configuration: &Configuration) -> Vec<u8> {
        // Bytes are already canonical; skip the debug-formatting round trip.
        self.materialize(configuration)
    }
}

/// An input model over lines of text, each atom a `String` including its
/// trailing newline (if the source had one on that line).
#[derive(Clone, Debug)]
pub struct LineModel {
    atoms: Vec<String>,
}

impl LineModel {
    /// Split `text` into lines, retaining line terminators as part of each
    /// atom so that materialization is a pure concatenation.
    pub fn new(text: &str) -> LineModel {
        let mut atoms = Vec::new();
        let mut start = 0;
        let bytes = text.as_bytes();
        for (i, &b) in bytes.iter().enumerate() {
            if b == b'\n' {
                atoms.push(text[start..=i].to_string());
                start = i + 1;
            }
        }
        if start < text.len() {
            atoms.push(text[start..].to_string());
        }
        LineModel { atoms: atoms }
    }
}

impl InputModel for LineModel {
    type Atom = String;
    type Rendered = String;

    fn size(&self) -> usize {
        self.atoms.len()
    }

    fn atoms(&self) -> &[String] {
        &self.atoms
    }

    fn materialize(&self, configuration: &Configuration) -> String {
        let mut out = String::new();
        for i in configuration.iter() {
            out.push_str(&self.atoms[i]);
        }
        out
    }
}

/// An input model over an arbitrary list of items, for inputs that are
/// already a sequence of discrete elements rather than text (the "list of
/// items" input source).
#[derive(Clone, Debug)]
pub struct ItemModel<T: Atom> {
    atoms: Vec<T>,
}

impl<T: Atom> ItemModel<T> {
    /// Build an item model from a vector of items, one atom per item.
    pub fn new(atoms: Vec<T>) -> ItemModel<T> {
        ItemModel { atoms: atoms }
    }
}

impl<T: Atom> InputModel for ItemModel<T> {
    type Atom = T;
    type Rendered = Vec<T>;

    fn size(&self) -> usize {
        self.atoms.len()
    }

    fn atoms(&self) -> &[T] {
        &self.atoms
    }

    fn materialize(&self, configuration: &Configuration) -> Vec<T> {
        configuration.iter().map(|i| self.atoms[i].clone()).collect()
    }
}

/// An input model whose atoms are produced by a user-supplied tokenizer
/// (e.g. a `regex`-based splitter), for the `custom-tokenizer` granularity
/// option. Each match (and each unmatched gap) becomes one atom, retaining
/// enough of the original text that concatenation reproduces byte-identical
/// output for the full configuration.
#[derive(Clone, Debug)]
pub struct TokenModel {
    atoms: Vec<String>,
}

impl TokenModel {
    /// Tokenize `text` by splitting on every match of `separator`, keeping
    /// the separator as a standalone atom between the atoms it separates.
    pub fn new(text: &str, separator: &::regex::Regex) -> TokenModel {
        let mut atoms = Vec::new();
        let mut last = 0;
        for m in separator.find_iter(text) {
            if m.start() > last {
                atoms.push(text[last..m.start()].to_string());
            }
            atoms.push(text[m.start()..m.end()].to_string());
            last = m.end();
        }
        if last < text.len() {
            atoms.push(text[last..].to_string());
        }
        TokenModel { atoms: atoms }
    }
}

impl InputModel for TokenModel {
    type Atom = String;
    type Rendered = String;

    fn size(&self) -> usize {
        self.atoms.len()
    }

    fn atoms(&self) -> &[String] {
        &self.atoms
    }

    fn materialize(&self, configuration: &Configuration) -> String {
        let mut out = String::new();
        for i in configuration.iter() {
            out.push_str(&self.atoms[i]);
        }
        out
    }
}

/// A node in an HDD subject tree.
///
/// A node with no children is a leaf and contributes `text` to the yield.
/// A node with children contributes the concatenation of its children's
/// yields and ignores its own `text` (interior nodes carry no literal text
/// of their own in this model; grammars that need fixed punctuation around
/// children -- e.g. `f(...)` -- represent it as leaf children alongside the
/// removable ones).
#[derive(Clone, Debug)]
pub struct TreeNode {
    text: String,
    children: Vec<TreeNode>,
    removable: bool,
}

impl TreeNode {
    /// A leaf node contributing `text` to the yield.
    pub fn leaf<S: Into<String>>(text: S) -> TreeNode {
        TreeNode {
            text: text.into(),
            children: Vec::new(),
            removable: true,
        }
    }

    /// An interior node whose yield is the concatenation of `children`'s
    /// yields.
    pub fn with_children(children: Vec<TreeNode>) -> TreeNode {
        TreeNode {
            text: String::new(),
            children: children,
            removable: true,
        }
    }

    /// Mark this node as removable (the default) or required. A required
    /// node is never offered to a level's sequence reducer as a removal
    /// candidate, so HDD can never attempt to prune it or any node whose
    /// only path to the root passes through it.
    pub fn removable(mut self, yes: bool) -> TreeNode {
        self.removable = yes;
        self
    }
}

/// A rooted ordered tree whose yield assembles a candidate string, reduced
/// level-by-level by [`crate::reducers::hdd`].
#[derive(Clone, Debug)]
pub struct Tree {
    root: TreeNode,
}

/// A stable identity for a node within one [`Tree::nodes_by_level`] /
/// [`Tree::yield_pruning`] call pair: its position in a pre-order walk.
/// Recomputed fresh after every structural mutation (`Tree::prune`), so IDs
/// are only meaningful relative to the tree's current shape.
pub type NodeId = usize;

impl Tree {
    /// Build a tree from its root node.
    pub fn new(root: TreeNode) -> Tree {
        Tree { root: root }
    }

    /// The full yield, with nothing pruned.
    pub fn yield_all(&self) -> String {
        let mut out = String::new();
        Self::yield_node(&self.root, &mut out);
        out
    }

    fn yield_node(node: &TreeNode, out: &mut String) {
        if node.children.is_empty() {
            out.push_str(&node.text);
        } else {
            for child in &node.children {
                Self::yield_node(child, out);
            }
        }
    }

    /// Pre-order id, level, and removability of every node, for internal
    /// traversal.
    fn walk(&self) -> Vec<(NodeId, usize, bool)> {
        let mut out = Vec::new();
        Self::walk_node(&self.root, 0, &mut out);
        out
    }

    fn walk_node(node: &TreeNode, level: usize, out: &mut Vec<(NodeId, usize, bool)>) {
        let id = out.len();
        out.push((id, level, node.removable));
        for child in &node.children {
            Self::walk_node(child, level + 1, out);
        }
    }

    /// The greatest level at which any node exists.
    pub fn max_level(&self) -> usize {
        self.walk().iter().map(|&(_, level, _)| level).max().unwrap_or(0)
    }

    /// The ids of every *removable* node at `level`, in left-to-right order.
    pub fn removable_at_level(&self, level: usize) -> Vec<NodeId> {
        self.walk()
            .into_iter()
            .filter(|&(_, l, removable)| l == level && removable)
            .map(|(id, _, _)| id)
            .collect()
    }

    /// Total node count, for reporting.
    pub fn node_count(&self) -> usize {
        self.walk().len()
    }

    /// The yield with every node in `pruned` (and its subtree) removed.
    pub fn yield_pruning(&self, pruned: &::std::collections::HashSet<NodeId>) -> String {
        let mut out = String::new();
        let mut next_id = 0;
        Self::yield_pruning_node(&self.root, pruned, &mut next_id, &mut out);
        out
    }

    fn yield_pruning_node(
        node: &TreeNode,
        pruned: &::std::collections::HashSet<NodeId>,
        next_id: &mut NodeId,
        out: &mut String,
    ) {
        let id = *next_id;
        *next_id += 1;
        if pruned.contains(&id) {
            return;
        }
        if node.children.is_empty() {
            out.push_str(&node.text);
        } else {
            for child in &node.children {
                Self::yield_pruning_node(child, pruned, next_id, out);
            }
        }
    }

    /// Commit a prune: structurally remove every node in `pruned` (and its
    /// subtree) from the tree. Mirrors [`Tree::yield_pruning`]'s id scheme.
    pub fn prune(&mut self, pruned: &::std::collections::HashSet<NodeId>) {
        let mut next_id = 0;
        let root = Self::prune_node(&self.root, pruned, &mut next_id);
        // The root itself is never offered as a removable candidate by
        // `removable_at_level(0)` callers that follow the grammar
        // convention of marking it required, so it always survives.
        self.root = root.unwrap_or_else(|| TreeNode::leaf(""));
    }

    fn prune_node(
        node: &TreeNode,
        pruned: &::std::collections::HashSet<NodeId>,
        next_id: &mut NodeId,
    ) -> Option<TreeNode> {
        let id = *next_id;
        *next_id += 1;
        if pruned.contains(&id) {
            return None;
        }
        let children: Vec<TreeNode> = node.children
            .iter()
            .filter_map(|c| Self::prune_node(c, pruned, next_id))
            .collect();
        Some(TreeNode {
            text: node.text.clone(),
            children: children,
            removable: node.removable,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn full_configuration_has_every_index() {
        let c = Configuration::full(5);
        assert_eq!(c.len(), 5);
        for i in 0..5 {
            assert!(c.contains(i));
        }
    }

    #[test]
    fn partition_covers_and_partitions() {
        let c = Configuration::full(7);
        let blocks = c.partition(3);
        assert_eq!(blocks.len(), 3);
        let total: usize = blocks.iter().map(|b| b.len()).sum();
        assert_eq!(total, 7);

        // Every original index appears in exactly one block.
        let mut seen = Configuration::empty();
        for b in &blocks {
            assert!(seen.intersection(b).is_empty());
            seen = seen.union(b);
        }
        assert_eq!(seen, c);
    }

    #[test]
    fn partition_more_blocks_than_atoms_yields_empty_blocks() {
        let c = Configuration::full(2);
        let blocks = c.partition(5);
        assert_eq!(blocks.len(), 5);
        let total: usize = blocks.iter().map(|b| b.len()).sum();
        assert_eq!(total, 2);
    }

    #[test]
    fn difference_removes_shared_indices() {
        let a = Configuration::from_indices(vec![1, 2, 3, 4]);
        let b = Configuration::from_indices(vec![2, 4]);
        assert_eq!(a.difference(&b), Configuration::from_indices(vec![1, 3]));
    }

    #[test]
    fn byte_model_materializes_subset_in_order() {
        let model = ByteModel::new(b"xxxabcxxx".to_vec());
        let c = Configuration::from_indices(vec![3, 4, 5]);
        assert_eq!(model.materialize(&c), b"abc".to_vec());
    }

    #[test]
    fn line_model_splits_and_rejoins() {
        let model = LineModel::new("one\ntwo\nthree");
        assert_eq!(model.size(), 3);
        let full = Configuration::full(model.size());
        assert_eq!(model.materialize(&full), "one\ntwo\nthree");
    }

    #[test]
    fn item_model_over_integers() {
        let model = ItemModel::new((1..9).collect::<Vec<i32>>());
        let c = Configuration::from_indices(vec![2, 5]);
        assert_eq!(model.materialize(&c), vec![3, 6]);
    }

    fn call(name: &str, args: Vec<TreeNode>) -> TreeNode {
        let mut children = vec![TreeNode::leaf(format!("{}(", name)).removable(false)];
        for (i, arg) in args.into_iter().enumerate() {
            if i > 0 {
                children.push(TreeNode::leaf(",").removable(false));
            }
            children.push(arg);
        }
        children.push(TreeNode::leaf(")").removable(false));
        TreeNode::with_children(children)
    }

    #[test]
    fn tree_yields_full_source() {
        let tree = Tree::new(
            call(
                "f",
                vec![
                    call("g", vec![TreeNode::leaf("1"), TreeNode::leaf("2")]),
                    call("h", vec![TreeNode::leaf("3"), TreeNode::leaf("4")]),
                ],
            ).removable(false),
        );
        assert_eq!(tree.yield_all(), "f(g(1,2),h(3,4))");
    }

    #[test]
    fn tree_prune_removes_subtree() {
        let mut tree = Tree::new(
            call(
                "f",
                vec![
                    call("g", vec![TreeNode::leaf("1"), TreeNode::leaf("2")]),
                    call("h", vec![TreeNode::leaf("3"), TreeNode::leaf("4")]),
                ],
            ).removable(false),
        );
        // Level 1 holds the two call sub-trees; prune the `g(...)` one.
        let level1 = tree.removable_at_level(1);
        assert_eq!(level1.len(), 2);
        let mut pruned = ::std::collections::HashSet::new();
        pruned.insert(level1[0]);
        assert_eq!(tree.yield_pruning(&pruned), "f(h(3,4))");
        tree.prune(&pruned);
        assert_eq!(tree.yield_all(), "f(h(3,4))");
    }
}

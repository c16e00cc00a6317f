use std::collections::BTreeMap;
use tracing::debug;
use crate::error::{ProofPrecondition, ProtocolViolation, Result, TreeError};
use crate::hash::hash_n;
use crate::tree::incremental::{check_arity, compute_zeros, IncrementalTree, MAX_DEPTH};
use crate::types::Fr;

/// An accumulator queue.
///
/// Leaves are buffered into sub-trees of height `sub_depth`; every full
/// sub-tree is archived as a single sub-root. Merging first folds the
/// sub-roots into the smallest tree able to hold them and then lifts that
/// root with zero subtrees to any requested depth. The result always equals
/// the root of an [`IncrementalTree`] built from the same leaves.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AccQueue
{
    /// The height of each buffered sub-tree.
    sub_depth: u8,

    /// The immutable arity of every tree involved.
    arity: usize,

    /// `zeros[level]` for every level up to [`MAX_DEPTH`].
    zeros: Vec<Fr>,

    /// Partially filled nodes of the current sub-tree, one row per level.
    leaf_queue: Vec<Vec<Fr>>,

    /// The number of leaves enqueued, including zero padding from `fill`.
    num_leaves: usize,

    /// Roots of the archived sub-trees.
    sub_roots: Vec<Fr>,

    /// Partially merged nodes of the sub-root tree, one row per level.
    sub_root_queue: Vec<Vec<Fr>>,

    /// The next sub-root to fold into the sub-root tree.
    next_sub_root_index: usize,

    /// Root of the sub-root tree together with its level in the full tree.
    small_srt_root: Option<(u8, Fr)>,

    /// Roots produced by `merge`, by depth.
    main_roots: BTreeMap<u8, Fr>,
}

impl AccQueue
{
    pub fn new(sub_depth: u8, arity: usize, zero_value: Fr) -> Result<Self>
    {
        check_arity(arity)?;
        if sub_depth > MAX_DEPTH || arity.checked_pow(sub_depth.into()).is_none()
        {
            Err(TreeError::UnsupportedDepth(sub_depth))?
        }

        Ok(AccQueue {
            sub_depth,
            arity,
            zeros: compute_zeros(zero_value, arity, MAX_DEPTH)?,
            leaf_queue: vec![Vec::new(); sub_depth as usize + 1],
            num_leaves: 0,
            sub_roots: Vec::new(),
            sub_root_queue: Vec::new(),
            next_sub_root_index: 0,
            small_srt_root: None,
            main_roots: BTreeMap::new(),
        })
    }

    pub fn sub_depth(&self) -> u8
    {
        self.sub_depth
    }

    pub fn arity(&self) -> usize
    {
        self.arity
    }

    pub fn zeros(&self) -> &[Fr]
    {
        &self.zeros
    }

    pub fn num_leaves(&self) -> usize
    {
        self.num_leaves
    }

    pub fn sub_tree_capacity(&self) -> usize
    {
        self.arity.pow(self.sub_depth.into())
    }

    pub fn num_sub_roots(&self) -> usize
    {
        self.sub_roots.len()
    }

    /// Whether sub-root merging has begun, after which the queue is frozen.
    pub fn is_merging(&self) -> bool
    {
        self.next_sub_root_index > 0 || self.small_srt_root.is_some()
    }

    pub fn sub_trees_merged(&self) -> bool
    {
        self.small_srt_root.is_some()
    }

    /// Pushes a node into the current sub-tree, hashing full rows upwards.
    fn queue_leaf(&mut self, node: Fr, level: usize) -> Result<()>
    {
        self.leaf_queue[level].push(node);
        if level < self.sub_depth as usize && self.leaf_queue[level].len() == self.arity
        {
            let children = std::mem::take(&mut self.leaf_queue[level]);
            let hash = hash_n(&children)?;
            self.queue_leaf(hash, level + 1)?;
        }
        Ok(())
    }

    fn archive_sub_root(&mut self) -> Result<()>
    {
        let top = self.sub_depth as usize;
        let root = self.leaf_queue[top].pop().unwrap_or(self.zeros[top]);
        self.leaf_queue.iter_mut().for_each(Vec::clear);
        self.sub_roots.push(root);
        Ok(())
    }

    /// Appends a leaf and returns its index.
    pub fn enqueue(&mut self, leaf: Fr) -> Result<usize>
    {
        if self.is_merging() { Err(ProtocolViolation::EnqueueAfterMerge)? }

        let index = self.num_leaves;
        self.queue_leaf(leaf, 0)?;
        self.num_leaves += 1;

        if self.num_leaves % self.sub_tree_capacity() == 0 { self.archive_sub_root()?; }

        Ok(index)
    }

    /// Zero-pads the current sub-tree and archives it. An empty current
    /// sub-tree is archived as the all-zero sub-tree.
    pub fn fill(&mut self) -> Result<()>
    {
        if self.is_merging() { Err(ProtocolViolation::EnqueueAfterMerge)? }

        let capacity = self.sub_tree_capacity();
        let remainder = self.num_leaves % capacity;

        if remainder == 0
        {
            self.sub_roots.push(self.zeros[self.sub_depth as usize]);
            self.num_leaves += capacity;
            return Ok(());
        }

        for level in 0..self.sub_depth as usize
        {
            let row = &self.leaf_queue[level];
            if row.is_empty() { continue; }

            let mut children = row.clone();
            children.resize(self.arity, self.zeros[level]);
            self.leaf_queue[level].clear();

            let hash = hash_n(&children)?;
            self.queue_leaf(hash, level + 1)?;
        }

        self.num_leaves += capacity - remainder;
        self.archive_sub_root()
    }

    pub fn get_sub_root(&self, index: usize) -> Result<Fr>
    {
        let root = self.sub_roots.get(index).copied();
        Ok(root.ok_or(ProofPrecondition::SubRootNotArchived(index))?)
    }

    /// Height of the smallest tree of sub-roots that holds every sub-root.
    fn sub_root_tree_height(&self) -> u8
    {
        let mut height = 0;
        let mut capacity = 1;
        while capacity < self.sub_roots.len()
        {
            capacity *= self.arity;
            height += 1;
        }
        height
    }

    fn queue_sub_root(&mut self, node: Fr, level: usize, max_level: usize) -> Result<()>
    {
        self.sub_root_queue[level].push(node);
        if level < max_level && self.sub_root_queue[level].len() == self.arity
        {
            let children = std::mem::take(&mut self.sub_root_queue[level]);
            let hash = hash_n(&children)?;
            self.queue_sub_root(hash, level + 1, max_level)?;
        }
        Ok(())
    }

    /// Folds up to `num_operations` archived sub-roots into the sub-root tree,
    /// or all of them when `num_operations` is zero. Can be called repeatedly
    /// until every sub-root has been consumed.
    pub fn merge_sub_roots(&mut self, num_operations: usize) -> Result<()>
    {
        if self.sub_trees_merged() { Err(ProtocolViolation::SubRootsAlreadyMerged)? }
        if self.num_leaves == 0 { Err(ProtocolViolation::EmptyQueue)? }

        if self.next_sub_root_index == 0 && self.num_leaves % self.sub_tree_capacity() != 0
        {
            self.fill()?;
        }

        if self.sub_roots.len() == 1
        {
            self.small_srt_root = Some((self.sub_depth, self.sub_roots[0]));
            self.next_sub_root_index = 1;
            return Ok(());
        }

        let height = self.sub_root_tree_height() as usize;
        if self.sub_root_queue.is_empty() { self.sub_root_queue = vec![Vec::new(); height + 1]; }

        let mut operations = 0;
        while self.next_sub_root_index < self.sub_roots.len()
        {
            if num_operations != 0 && operations == num_operations { return Ok(()); }

            let sub_root = self.sub_roots[self.next_sub_root_index];
            self.queue_sub_root(sub_root, 0, height)?;
            self.next_sub_root_index += 1;
            operations += 1;
        }

        let padded = self.arity.pow(height as u32);
        let zero = self.zeros[self.sub_depth as usize];
        for _ in self.sub_roots.len()..padded
        {
            self.queue_sub_root(zero, 0, height)?;
        }

        let root = self.sub_root_queue[height].first().copied().unwrap_or(zero);
        self.small_srt_root = Some((self.sub_depth + height as u8, root));
        debug!(sub_roots = self.sub_roots.len(), height, "merged accumulator sub-roots");

        Ok(())
    }

    /// Lifts the sub-root tree root to a tree of height `depth`.
    pub fn merge(&mut self, depth: u8) -> Result<Fr>
    {
        let (level, mut root) = self.small_srt_root.ok_or(ProtocolViolation::SubRootsNotMerged)?;
        if depth < level { Err(ProtocolViolation::DepthTooSmall { depth, min: level })? }
        if depth > MAX_DEPTH { Err(TreeError::UnsupportedDepth(depth))? }

        for current in level as usize..depth as usize
        {
            let mut children = vec![self.zeros[current]; self.arity];
            children[0] = root;
            root = hash_n(&children)?;
        }

        self.main_roots.insert(depth, root);
        Ok(root)
    }

    /// Rebuilds the root at `depth` directly from the archived sub-roots.
    /// Only meant to cross-check [`AccQueue::merge`].
    pub fn merge_direct(&mut self, depth: u8) -> Result<Fr>
    {
        if depth < self.sub_depth { Err(ProtocolViolation::DepthTooSmall { depth, min: self.sub_depth })? }
        if self.num_leaves == 0 { Err(ProtocolViolation::EmptyQueue)? }

        if self.num_leaves % self.sub_tree_capacity() != 0 { self.fill()?; }

        let zero = self.zeros[self.sub_depth as usize];
        let mut tree = IncrementalTree::new(depth - self.sub_depth, zero, self.arity)?;
        for sub_root in &self.sub_roots
        {
            tree.insert(*sub_root)?;
        }

        self.main_roots.insert(depth, tree.root());
        Ok(tree.root())
    }

    pub fn has_root(&self, depth: u8) -> bool
    {
        self.main_roots.contains_key(&depth)
    }

    pub fn get_root(&self, depth: u8) -> Result<Fr>
    {
        let root = self.main_roots.get(&depth).copied();
        Ok(root.ok_or(ProofPrecondition::RootNotMerged(depth))?)
    }
}

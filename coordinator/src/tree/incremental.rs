use crate::error::{Result, TreeError};
use crate::hash::{hash_n, MAX_X5_LEN};
use crate::types::Fr;

/// Deepest tree whose capacity is still addressable.
pub const MAX_DEPTH: u8 = 32;

/// Computes `zeros[level]`, the root of an all-zero subtree of height `level`.
pub fn compute_zeros(zero_value: Fr, arity: usize, depth: u8) -> Result<Vec<Fr>>
{
    let mut zeros = Vec::with_capacity(depth as usize + 1);
    zeros.push(zero_value);
    for level in 0..depth as usize
    {
        let children = vec![zeros[level]; arity];
        zeros.push(hash_n(&children)?);
    }
    Ok(zeros)
}

pub(crate) fn check_arity(arity: usize) -> Result<(), TreeError>
{
    if !(2..MAX_X5_LEN).contains(&arity) { Err(TreeError::UnsupportedArity(arity))? }
    Ok(())
}

/// Siblings of a leaf (or sub-root) on its way up to the root.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MerklePath
{
    /// `arity - 1` siblings per level, bottom-up.
    pub path_elements: Vec<Vec<Fr>>,

    /// Position of the node among its siblings at every level.
    pub path_indices: Vec<usize>,

    /// The node the path starts from.
    pub leaf: Fr,

    /// The root the path resolves to.
    pub root: Fr,
}

/// An append-only Merkle tree of fixed arity and depth.
///
/// Only the nodes that differ from the zero subtree of their level are
/// stored, so an empty tree of depth ten costs ten hashes to build.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct IncrementalTree
{
    depth: u8,
    arity: usize,
    zeros: Vec<Fr>,
    nodes: Vec<Vec<Fr>>,
    next_index: usize,
    root: Fr,
}

impl IncrementalTree
{
    pub fn new(depth: u8, zero_value: Fr, arity: usize) -> Result<Self>
    {
        check_arity(arity)?;
        if depth > MAX_DEPTH || arity.checked_pow(depth.into()).is_none()
        {
            Err(TreeError::UnsupportedDepth(depth))?
        }

        let zeros = compute_zeros(zero_value, arity, depth)?;
        let root = zeros[depth as usize];

        Ok(IncrementalTree {
            depth,
            arity,
            zeros,
            nodes: vec![Vec::new(); depth as usize + 1],
            next_index: 0,
            root,
        })
    }

    pub fn depth(&self) -> u8
    {
        self.depth
    }

    pub fn arity(&self) -> usize
    {
        self.arity
    }

    pub fn zero_value(&self) -> Fr
    {
        self.zeros[0]
    }

    pub fn zeros(&self) -> &[Fr]
    {
        &self.zeros
    }

    pub fn root(&self) -> Fr
    {
        self.root
    }

    pub fn next_index(&self) -> usize
    {
        self.next_index
    }

    pub fn capacity(&self) -> usize
    {
        self.arity.pow(self.depth.into())
    }

    pub fn leaf(&self, index: usize) -> Option<Fr>
    {
        (index < self.next_index).then(|| self.node(0, index))
    }

    fn node(&self, level: usize, index: usize) -> Fr
    {
        self.nodes[level].get(index).copied().unwrap_or(self.zeros[level])
    }

    fn set_node(&mut self, level: usize, index: usize, value: Fr)
    {
        let zero = self.zeros[level];
        let row = &mut self.nodes[level];
        if row.len() <= index { row.resize(index + 1, zero); }
        row[index] = value;
    }

    fn children(&self, level: usize, parent: usize) -> Vec<Fr>
    {
        let first = parent * self.arity;
        (first..first + self.arity).map(|i| self.node(level, i)).collect()
    }

    /// Writes a leaf and rehashes the nodes on its path.
    fn write(&mut self, index: usize, leaf: Fr) -> Result<()>
    {
        self.set_node(0, index, leaf);

        let mut position = index;
        for level in 0..self.depth as usize
        {
            let parent = position / self.arity;
            let hash = hash_n(&self.children(level, parent))?;
            self.set_node(level + 1, parent, hash);
            position = parent;
        }

        self.root = self.node(self.depth as usize, 0);
        Ok(())
    }

    /// Appends a leaf and returns its index.
    pub fn insert(&mut self, leaf: Fr) -> Result<usize>
    {
        if self.next_index >= self.capacity() { Err(TreeError::Full)? }

        let index = self.next_index;
        self.write(index, leaf)?;
        self.next_index += 1;

        Ok(index)
    }

    pub fn update(&mut self, index: usize, leaf: Fr) -> Result<()>
    {
        if index >= self.capacity()
        {
            Err(TreeError::IndexOutOfRange { index, capacity: self.capacity() })?
        }
        if index >= self.next_index { Err(TreeError::UnfilledLeaf { index })? }

        self.write(index, leaf)
    }

    /// Collects the siblings from `level` upwards for the node at `position`.
    fn path_from(&self, level: usize, mut position: usize) -> MerklePath
    {
        let leaf = self.node(level, position);
        let mut path_elements = Vec::with_capacity(self.depth as usize - level);
        let mut path_indices = Vec::with_capacity(self.depth as usize - level);

        for current in level..self.depth as usize
        {
            let offset = position % self.arity;
            let siblings = self.children(current, position / self.arity)
                .into_iter()
                .enumerate()
                .filter(|(i, _)| *i != offset)
                .map(|(_, node)| node)
                .collect();

            path_elements.push(siblings);
            path_indices.push(offset);
            position /= self.arity;
        }

        MerklePath { path_elements, path_indices, leaf, root: self.root }
    }

    pub fn gen_merkle_path(&self, index: usize) -> Result<MerklePath>
    {
        if index >= self.capacity()
        {
            Err(TreeError::IndexOutOfRange { index, capacity: self.capacity() })?
        }
        Ok(self.path_from(0, index))
    }

    /// Path from the root of the sub-tree spanning leaves `start..end`.
    ///
    /// The span must be a power of the arity and `start` a multiple of it.
    /// Positions past `next_index` read as zeros.
    pub fn gen_merkle_subroot_path(&self, start: usize, end: usize) -> Result<MerklePath>
    {
        let unaligned = TreeError::UnalignedSpan { start, end };
        if end <= start || end > self.capacity() { Err(unaligned.clone())? }

        let span = end - start;
        let mut level = 0;
        let mut width = 1;
        while width < span
        {
            width *= self.arity;
            level += 1;
        }
        if width != span || start % span != 0 { Err(unaligned)? }

        Ok(self.path_from(level, start / span))
    }

    pub fn verify_merkle_path(path: &MerklePath, arity: usize) -> Result<bool>
    {
        let mut node = path.leaf;
        for (siblings, offset) in path.path_elements.iter().zip(&path.path_indices)
        {
            if siblings.len() + 1 != arity || *offset >= arity { return Ok(false); }

            let mut children = siblings.clone();
            children.insert(*offset, node);
            node = hash_n(&children)?;
        }
        Ok(node == path.root)
    }
}

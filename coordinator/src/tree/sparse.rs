use std::collections::HashMap;
use ark_ff::{BigInteger, PrimeField};
use crate::error::{Result, TreeError};
use crate::hash::{hash2, hash3};
use crate::types::Fr;

/// Bits available for routing a key down the tree.
const MAX_LEVELS: usize = 256;

#[derive(Clone, Debug, PartialEq, Eq)]
enum SmtNode
{
    Leaf { key: Fr, value: Fr },
    Middle { left: Fr, right: Fr },
}

/// Result of a key lookup, shaped after the circomlib `SMTVerifier` inputs.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SmtProof
{
    pub found: bool,
    pub siblings: Vec<Fr>,
    pub found_value: Fr,
    pub not_found_key: Fr,
    pub not_found_value: Fr,
    pub is_old0: bool,
}

impl SmtProof
{
    /// Siblings right-padded with zeros to `levels` entries.
    pub fn padded_siblings(&self, levels: usize) -> Vec<Fr>
    {
        let mut siblings = self.siblings.clone();
        if siblings.len() < levels { siblings.resize(levels, Fr::from(0u64)); }
        siblings
    }
}

/// An in-memory iden3 sparse Merkle tree.
///
/// Keys are routed by their bits, least significant first. A leaf hashes as
/// `H(key, value, 1)`, a middle node as `H(left, right)` and an empty
/// subtree is zero.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SparseMerkleTree
{
    root: Fr,
    nodes: HashMap<Fr, SmtNode>,
}

fn key_bit(key: &Fr, level: usize) -> bool
{
    key.into_bigint().get_bit(level)
}

fn leaf_hash(key: Fr, value: Fr) -> Result<Fr>
{
    hash3([key, value, Fr::from(1u64)])
}

impl SparseMerkleTree
{
    pub fn new() -> Self
    {
        Self::default()
    }

    pub fn root(&self) -> Fr
    {
        self.root
    }

    pub fn find(&self, key: Fr) -> Result<SmtProof>
    {
        let zero = Fr::from(0u64);
        let mut siblings = Vec::new();
        let mut node = self.root;

        for level in 0..MAX_LEVELS
        {
            if node == zero
            {
                return Ok(SmtProof {
                    found: false,
                    siblings,
                    found_value: zero,
                    not_found_key: key,
                    not_found_value: zero,
                    is_old0: true,
                });
            }

            match self.nodes.get(&node).ok_or(TreeError::MissingNode)?
            {
                SmtNode::Leaf { key: leaf_key, value } if *leaf_key == key =>
                {
                    return Ok(SmtProof {
                        found: true,
                        siblings,
                        found_value: *value,
                        not_found_key: zero,
                        not_found_value: zero,
                        is_old0: false,
                    });
                },
                SmtNode::Leaf { key: leaf_key, value } =>
                {
                    return Ok(SmtProof {
                        found: false,
                        siblings,
                        found_value: zero,
                        not_found_key: *leaf_key,
                        not_found_value: *value,
                        is_old0: false,
                    });
                },
                SmtNode::Middle { left, right } =>
                {
                    if key_bit(&key, level)
                    {
                        siblings.push(*left);
                        node = *right;
                    }
                    else
                    {
                        siblings.push(*right);
                        node = *left;
                    }
                },
            }
        }

        Err(TreeError::Full)?
    }

    pub fn insert(&mut self, key: Fr, value: Fr) -> Result<Fr>
    {
        let found = self.find(key)?;
        if found.found { Err(TreeError::KeyExists)? }

        let zero = Fr::from(0u64);
        let mut siblings = found.siblings;

        // An existing leaf sits where the new key lands, push it down until
        // the two keys diverge.
        if !found.is_old0
        {
            while siblings.len() < MAX_LEVELS
                && key_bit(&found.not_found_key, siblings.len()) == key_bit(&key, siblings.len())
            {
                siblings.push(zero);
            }
            if siblings.len() == MAX_LEVELS { Err(TreeError::Full)? }
            siblings.push(leaf_hash(found.not_found_key, found.not_found_value)?);
        }

        let mut node = leaf_hash(key, value)?;
        self.nodes.insert(node, SmtNode::Leaf { key, value });

        for (level, sibling) in siblings.iter().enumerate().rev()
        {
            let (left, right) = if key_bit(&key, level) { (*sibling, node) } else { (node, *sibling) };
            node = hash2([left, right])?;
            self.nodes.insert(node, SmtNode::Middle { left, right });
        }

        self.root = node;
        Ok(node)
    }
}

use crate::error::{InputError, Result};
use crate::hash::hash_left_right;
use crate::tree::{IncrementalTree, MerklePath};
use crate::types::{Fr, VOTE_OPTION_TREE_ARITY};

/// A voter's per-poll vote vector and its replay-protection nonce.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Ballot
{
    /// The weight currently assigned to each vote option.
    pub votes: Vec<u64>,

    /// The number of accepted vote commands.
    pub nonce: u64,

    vote_option_tree_depth: u8,
}

impl Ballot
{
    pub fn new(num_vote_options: usize, vote_option_tree_depth: u8) -> Result<Self>
    {
        let capacity = VOTE_OPTION_TREE_ARITY.checked_pow(vote_option_tree_depth.into());
        if capacity.map_or(true, |capacity| capacity < num_vote_options)
        {
            Err(InputError::InvalidConfiguration(format!(
                "{num_vote_options} vote options do not fit a tree of depth {vote_option_tree_depth}"
            )))?
        }

        Ok(Ballot { votes: vec![0; num_vote_options], nonce: 0, vote_option_tree_depth })
    }

    pub fn vote_option_tree_depth(&self) -> u8
    {
        self.vote_option_tree_depth
    }

    /// The weight assigned to `option`, zero past the end of the vector.
    pub fn vote(&self, option: usize) -> u64
    {
        self.votes.get(option).copied().unwrap_or(0)
    }

    /// The quinary tree over the vote weights.
    pub fn vote_option_tree(&self) -> Result<IncrementalTree>
    {
        let mut tree = IncrementalTree::new(self.vote_option_tree_depth, Fr::from(0u64), VOTE_OPTION_TREE_ARITY)?;

        // Trailing zero weights equal the zero value and need no insertion.
        let last = self.votes.iter().rposition(|vote| *vote != 0).unwrap_or(0);
        for vote in self.votes.iter().take(last + 1)
        {
            tree.insert(Fr::from(*vote))?;
        }
        Ok(tree)
    }

    pub fn vote_option_root(&self) -> Result<Fr>
    {
        Ok(self.vote_option_tree()?.root())
    }

    /// Path from the weight of `option` to the vote option root.
    pub fn vote_option_path(&self, option: usize) -> Result<MerklePath>
    {
        self.vote_option_tree()?.gen_merkle_path(option)
    }

    pub fn as_array(&self) -> Result<[Fr; 2]>
    {
        Ok([Fr::from(self.nonce), self.vote_option_root()?])
    }

    pub fn hash(&self) -> Result<Fr>
    {
        let [nonce, root] = self.as_array()?;
        hash_left_right(nonce, root)
    }
}

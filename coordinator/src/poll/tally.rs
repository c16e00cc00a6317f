//! Tally and subsidy bookkeeping. The per-batch bodies live with the tally
//! circuits; what the engine keeps are the counters, their guards and the
//! commitments the circuits open.

use num_bigint::BigUint;
use crate::config::VoiceCreditModel;
use crate::error::Result;
use crate::hash::hash_left_right;
use crate::poll::Poll;
use crate::tree::IncrementalTree;
use crate::types::{biguint_to_fr_mod_order, Fr, VOTE_OPTION_TREE_ARITY};

/// Commits to per-option results with a salted root.
pub fn gen_tally_result_commitment(results: &[Fr], salt: Fr, depth: u8) -> Result<Fr>
{
    let mut tree = IncrementalTree::new(depth, Fr::from(0u64), VOTE_OPTION_TREE_ARITY)?;
    for result in results
    {
        tree.insert(*result)?;
    }
    hash_left_right(tree.root(), salt)
}

impl Poll
{
    fn ballot_count(&self) -> usize
    {
        self.snapshot.as_ref().map_or(1, |snapshot| snapshot.ballots.len())
    }

    pub fn num_batches_tallied(&self) -> usize
    {
        self.num_batches_tallied
    }

    pub fn has_untallied_ballots(&self) -> bool
    {
        self.num_batches_tallied * self.config.batch_sizes.tally_batch_size < self.ballot_count()
    }

    pub fn has_unfinished_subsidy_calculation(&self) -> bool
    {
        let batch_size = self.config.batch_sizes.subsidy_batch_size;
        let count = self.ballot_count();

        self.subsidy_row_batch_index * batch_size < count && self.subsidy_column_batch_index * batch_size < count
    }

    /// Column sums of the vote weights over every ballot.
    pub fn tally_results(&self) -> Vec<Fr>
    {
        let options = self.config.max_values.max_vote_options;
        let mut totals = vec![0u128; options];

        for ballot in self.ballots()
        {
            for (total, vote) in totals.iter_mut().zip(&ballot.votes)
            {
                *total += u128::from(*vote);
            }
        }

        totals.into_iter().map(Fr::from).collect()
    }

    pub fn gen_results_commitment(&self, salt: Fr) -> Result<Fr>
    {
        gen_tally_result_commitment(&self.tally_results(), salt, self.config.tree_depths.vote_option_tree_depth)
    }

    /// Commits to the voice credits spent by the first `num_ballots` ballots.
    pub fn gen_spent_voice_credit_subtotal_commitment(&self, salt: Fr, num_ballots: usize) -> Result<Fr>
    {
        let model = self.config.voice_credit_model;
        let subtotal = self
            .ballots()
            .iter()
            .take(num_ballots)
            .flat_map(|ballot| ballot.votes.iter())
            .fold(BigUint::from(0u8), |acc, vote| {
                let vote = BigUint::from(*vote);
                match model
                {
                    VoiceCreditModel::Quadratic => acc + &vote * &vote,
                    VoiceCreditModel::Linear => acc + vote,
                }
            });

        hash_left_right(biguint_to_fr_mod_order(&subtotal), salt)
    }
}

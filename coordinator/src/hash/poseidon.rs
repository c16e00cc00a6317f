use std::sync::OnceLock;
use ark_ff::Field;
use light_poseidon::{
    parameters::bn254_x5::get_poseidon_parameters,
    PoseidonError,
    PoseidonParameters
};
use crate::types::Fr;

/// The widest state for which circom compatible constants exist.
pub const MAX_X5_LEN: usize = 13;

#[allow(clippy::declare_interior_mutable_const)]
const UNINITIALIZED: OnceLock<PoseidonParameters<Fr>> = OnceLock::new();
static PARAMETERS: [OnceLock<PoseidonParameters<Fr>>; MAX_X5_LEN] = [UNINITIALIZED; MAX_X5_LEN];

/// Round constants are parsed once per width and shared afterwards.
fn parameters(width: usize) -> Result<&'static PoseidonParameters<Fr>, PoseidonError>
{
    if !(2..=MAX_X5_LEN).contains(&width)
    {
        return Err(PoseidonError::InvalidWidthCircom { width, max_limit: MAX_X5_LEN });
    }

    let cell = &PARAMETERS[width - 1];
    if let Some(params) = cell.get() { return Ok(params); }

    let params = get_poseidon_parameters::<Fr>(
        width.try_into().map_err(|_| PoseidonError::U64Tou8)?
    )?;

    Ok(cell.get_or_init(|| params))
}

/// Trait for hashing inputs that are prime field elements.
pub trait PoseidonHasher
{
    /// Calculates a Poseidon hash for the given input of prime fields and
    /// returns the result as a prime field.
    fn hash(&mut self, inputs: &[Fr]) -> Result<Fr, PoseidonError>;
}

/// Poseidon over the BN254 scalar field with circomlib constants.
///
/// Besides the usual hash, the raw permutation is exposed so that the
/// duplex cipher can absorb and squeeze several elements per round.
pub struct Poseidon
{
    params: &'static PoseidonParameters<Fr>,
    state: Vec<Fr>,
}

impl Poseidon
{
    /// A hasher for `nr_inputs` elements, i.e. a state of width `nr_inputs + 1`.
    pub fn new_circom(nr_inputs: usize) -> Result<Poseidon, PoseidonError>
    {
        Self::with_width(nr_inputs + 1)
    }

    pub fn with_width(width: usize) -> Result<Poseidon, PoseidonError>
    {
        let params = parameters(width)?;
        Ok(Poseidon { params, state: Vec::with_capacity(width) })
    }

    pub fn width(&self) -> usize
    {
        self.params.width
    }

    #[inline(always)]
    fn apply_ark(&mut self, round: usize)
    {
        let width = self.params.width;
        self.state.iter_mut().enumerate().for_each(|(i, a)| {
            *a += self.params.ark[round * width + i];
        });
    }

    #[inline(always)]
    fn apply_sbox_full(&mut self)
    {
        let alpha = self.params.alpha;
        self.state.iter_mut().for_each(|a| {
            *a = a.pow([alpha]);
        });
    }

    #[inline(always)]
    fn apply_sbox_partial(&mut self)
    {
        self.state[0] = self.state[0].pow([self.params.alpha]);
    }

    #[inline(always)]
    fn apply_mds(&mut self)
    {
        let mds = &self.params.mds;
        let state = &self.state;
        let mixed: Vec<Fr> = (0..state.len())
            .map(|i| {
                state
                    .iter()
                    .enumerate()
                    .fold(Fr::from(0u64), |acc, (j, a)| acc + *a * mds[i][j])
            })
            .collect();
        self.state = mixed;
    }

    fn run_rounds(&mut self)
    {
        let half_rounds = self.params.full_rounds / 2;
        let partial_end = half_rounds + self.params.partial_rounds;
        let all_rounds = self.params.full_rounds + self.params.partial_rounds;

        for round in 0..half_rounds
        {
            self.apply_ark(round);
            self.apply_sbox_full();
            self.apply_mds();
        }

        for round in half_rounds..partial_end
        {
            self.apply_ark(round);
            self.apply_sbox_partial();
            self.apply_mds();
        }

        for round in partial_end..all_rounds
        {
            self.apply_ark(round);
            self.apply_sbox_full();
            self.apply_mds();
        }
    }

    /// Applies the permutation to a full-width state and returns every lane.
    pub fn permute(&mut self, state: &[Fr]) -> Result<Vec<Fr>, PoseidonError>
    {
        if state.len() != self.params.width
        {
            return Err(PoseidonError::InvalidNumberOfInputs {
                inputs: state.len(),
                max_limit: self.params.width,
                width: self.params.width,
            });
        }

        self.state.clear();
        self.state.extend_from_slice(state);
        self.run_rounds();

        Ok(std::mem::take(&mut self.state))
    }
}

impl PoseidonHasher for Poseidon
{
    fn hash(&mut self, inputs: &[Fr]) -> Result<Fr, PoseidonError>
    {
        if inputs.len() != self.params.width - 1
        {
            return Err(PoseidonError::InvalidNumberOfInputs {
                inputs: inputs.len(),
                max_limit: self.params.width - 1,
                width: self.params.width,
            });
        }

        // Circom uses a zero capacity element as the domain tag.
        self.state.clear();
        self.state.push(Fr::from(0u64));
        self.state.extend_from_slice(inputs);
        self.run_rounds();

        let result = self.state[0];
        self.state.clear();
        Ok(result)
    }
}

use ark_ff::Zero;
use tracing::info;
use crate::crypto::{elgamal, gen_ecdh_shared_key, Point, PrivateKey, PublicKey};
use crate::domain::deactivated::deactivated_key_hash;
use crate::domain::{Command, DeactivatedKeyLeaf, KeyGenCommand, SignupLeaf};
use crate::error::{CryptoError, InputError, ProofPrecondition, ProtocolViolation, Result};
use crate::hash::{hash2, sha256_hash};
use crate::poll::inputs::{DeactivationInputs, DeactivationOutput, NewKeyInputs, NewKeyOutput};
use crate::poll::Poll;
use crate::state::SignupRegistry;
use crate::types::{fr_to_biguint, Fr, MESSAGE_DATA_LENGTH};

impl Poll
{
    /// Turns every recorded deactivation request into a deactivated-key leaf
    /// and returns the inputs of the deactivation circuit.
    ///
    /// Masks chain from `seed`. The batch is padded to the deactivation queue
    /// size with fresh masks and encryptions of a zero status.
    pub fn process_deactivation_messages(&mut self, registry: &SignupRegistry, seed: Fr) -> Result<DeactivationOutput>
    {
        if self.deactivation.processed { Err(ProtocolViolation::DeactivationAlreadyProcessed)? }

        let capacity = self.config.deactivation_queue_size;
        let count = self.deactivation.messages.len();
        if count > capacity { Err(ProtocolViolation::DeactivationQueueOverflow { count, capacity })? }

        self.ensure_snapshot(registry)?;

        let Poll { snapshot, deactivation, deactivated_keys_tree, salts, coordinator, poll_id, .. } = self;
        let snapshot = snapshot.as_ref().ok_or(ProofPrecondition::MissingSnapshot)?;

        let mut mask = seed;
        let mut masking_values = Vec::with_capacity(capacity);
        let mut el_gamal_enc = Vec::with_capacity(capacity);
        let mut state_leaf_path_elements = Vec::with_capacity(capacity);
        let mut current_state_leaves = Vec::with_capacity(capacity);
        let mut tree_indices = Vec::with_capacity(count);
        let mut deactivated_leaves = Vec::with_capacity(count);

        for command in &deactivation.commands
        {
            let (index, salt) = match command
            {
                Command::Vote(command, _) => (usize::try_from(command.state_index).unwrap_or(usize::MAX), command.salt),
                _ => (0, Fr::zero()),
            };

            let valid_index = index >= 1 && index < snapshot.state_leaves.len();
            let (public_key, slot) = if valid_index
            {
                (snapshot.state_leaves[index].public_key, index)
            }
            else
            {
                (PublicKey::new(Point::new(Fr::zero(), Fr::zero())), 0)
            };

            state_leaf_path_elements.push(snapshot.state_tree.gen_merkle_path(slot)?.path_elements);
            current_state_leaves.push(snapshot.state_leaves[slot].as_array());

            let status = match command
            {
                Command::Vote(command, signature) => valid_index && command.verify_signature(signature, &public_key),
                _ => false,
            };

            mask = hash2([mask, salt])?;
            let ciphertext = elgamal::encrypt_bit(&coordinator.public_key, status, &fr_to_biguint(&mask));

            let leaf = DeactivatedKeyLeaf::new(public_key, ciphertext, salt);
            tree_indices.push(deactivated_keys_tree.insert(leaf.hash()?)?);

            masking_values.push(mask);
            el_gamal_enc.push(ciphertext.as_arrays());
            deactivated_leaves.push(leaf);
        }

        let mut deactivated_tree_path_elements = tree_indices
            .iter()
            .map(|&index| Ok(deactivated_keys_tree.gen_merkle_path(index)?.path_elements))
            .collect::<Result<Vec<_>>>()?;

        let blank_path = snapshot.state_tree.gen_merkle_path(0)?.path_elements;
        let blank_leaf = SignupLeaf::blank().as_array();

        deactivated_tree_path_elements.resize(capacity, blank_path.clone());
        state_leaf_path_elements.resize(capacity, blank_path);
        current_state_leaves.resize(capacity, blank_leaf);

        while masking_values.len() < capacity
        {
            let pad_mask = salts.next_salt();
            let ciphertext = elgamal::encrypt_bit(&coordinator.public_key, false, &fr_to_biguint(&pad_mask));
            masking_values.push(pad_mask);
            el_gamal_enc.push(ciphertext.as_arrays());
        }

        let mut msgs: Vec<Vec<Fr>> = deactivation.messages.iter().map(|message| message.as_array().to_vec()).collect();
        msgs.resize(capacity, vec![Fr::zero(); MESSAGE_DATA_LENGTH + 1]);

        let mut enc_pub_keys: Vec<[Fr; 2]> = deactivation.enc_pub_keys.iter().map(PublicKey::as_array).collect();
        enc_pub_keys.resize(capacity, [Fr::zero(); 2]);

        let deactivated_tree_root = deactivated_keys_tree.root();
        let current_state_root = snapshot.state_tree.root();
        let num_sign_ups = snapshot.num_signups as u64;

        let input_hash = sha256_hash(&[
            deactivated_tree_root,
            Fr::from(num_sign_ups),
            current_state_root,
            deactivation.chain_hash,
        ]);

        deactivation.processed = true;
        info!(poll_id = *poll_id, count, "processed deactivation messages");

        Ok(DeactivationOutput {
            circuit_inputs: DeactivationInputs {
                coord_priv_key: coordinator.private_key.as_circuit_input(),
                coord_pub_key: coordinator.public_key.as_array(),
                enc_pub_keys,
                msgs,
                deactivated_tree_path_elements,
                state_leaf_path_elements,
                current_state_leaves,
                el_gamal_enc,
                masking_values,
                deactivated_tree_root,
                current_state_root,
                num_sign_ups,
                chain_hash: deactivation.chain_hash,
                input_hash,
            },
            deactivated_leaves,
        })
    }

    /// Prepares a key generation request replacing the deactivated key
    /// `deactivated_private_key`, whose deactivation used `salt`.
    ///
    /// The recorded ciphertext is rerandomized so the proof never reveals
    /// which deactivation it spends.
    pub fn generate_circuit_inputs_for_new_key(
        &mut self,
        registry: &SignupRegistry,
        new_public_key: PublicKey,
        deactivated_private_key: &PrivateKey,
        state_index: usize,
        new_credit_balance: Fr,
        salt: Fr,
    ) -> Result<NewKeyOutput>
    {
        self.ensure_snapshot(registry)?;

        let signups = self.snapshot_ref()?.state_leaves.len();
        if state_index == 0 || state_index >= signups { Err(InputError::InvalidStateIndex { index: state_index })? }

        let key_hash = deactivated_key_hash(&deactivated_private_key.public_key(), salt)?;
        let deactivated_key_index = self
            .deactivated_key_events
            .iter()
            .position(|event| event.key_hash == key_hash)
            .ok_or(InputError::UnknownDeactivatedKey)?;
        let event = self.deactivated_key_events[deactivated_key_index];

        if !event.ciphertext.c1.in_curve() || !event.ciphertext.c2.in_curve() { Err(CryptoError::NotOnCurve)? }

        let z = self.salts.next_salt();
        let rerandomized = elgamal::rerandomize(&self.coordinator.public_key, &fr_to_biguint(&z), &event.ciphertext);

        if self.deactivated_keys_tree.next_index() == 0
        {
            for recorded in &self.deactivated_key_events
            {
                self.deactivated_keys_tree.insert(recorded.leaf_hash()?)?;
            }
        }

        let nullifier = hash2([deactivated_private_key.as_circuit_input(), salt])?;
        let command = KeyGenCommand::new(new_public_key, new_credit_balance, nullifier, rerandomized, self.poll_id.into());

        let ephemeral = self.salts.next_keypair();
        let shared_key = gen_ecdh_shared_key(&ephemeral.private_key, &self.coordinator.public_key)?;
        let message = command.encrypt(&shared_key)?;
        let message_hash = sha256_hash(&message.data);

        let snapshot = self.snapshot_ref()?;
        let leaf = &snapshot.state_leaves[state_index];
        let state_tree_root = snapshot.state_tree.root();
        let deactivated_keys_root = self.deactivated_keys_tree.root();
        let coordinator_pub_key = self.coordinator.public_key;

        let input_hash = sha256_hash(&[
            state_tree_root,
            deactivated_keys_root,
            message_hash,
            coordinator_pub_key.x(),
            coordinator_pub_key.y(),
            ephemeral.public_key.x(),
            ephemeral.public_key.y(),
        ]);

        let circuit_inputs = NewKeyInputs {
            old_priv_key: deactivated_private_key.as_circuit_input(),
            new_pub_key: new_public_key.as_array(),
            num_sign_ups: snapshot.num_signups as u64,
            state_index: state_index as u64,
            salt,
            state_tree_root,
            deactivated_keys_root,
            state_tree_inclusion_proof: snapshot.state_tree.gen_merkle_path(state_index)?.path_elements,
            old_credit_balance: leaf.voice_credit_balance,
            new_credit_balance,
            state_leaf_timestamp: leaf.timestamp,
            deactivated_keys_inclusion_proof: self.deactivated_keys_tree.gen_merkle_path(deactivated_key_index)?.path_elements,
            deactivated_key_index: deactivated_key_index as u64,
            c1: event.ciphertext.c1.as_array(),
            c2: event.ciphertext.c2.as_array(),
            coordinator_pub_key: coordinator_pub_key.as_array(),
            enc_priv_key: ephemeral.private_key.as_circuit_input(),
            c1r: rerandomized.c1.as_array(),
            c2r: rerandomized.c2.as_array(),
            z,
            nullifier,
            poll_id: Fr::from(self.poll_id),
            input_hash,
        };

        Ok(NewKeyOutput { circuit_inputs, enc_pub_key: ephemeral.public_key, message })
    }
}

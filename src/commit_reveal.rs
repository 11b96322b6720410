multiversx_sc::imports!();

use crate::errors::*;
use crate::types::ApprovalCommitment;

/// Domain identifiers baked into every commitment hash so that a commitment
/// valid in one execution context can never be replayed in another.
pub const DOMAIN_REQUEST_APPROVAL: u8 = 1;
pub const DOMAIN_CLOSURE_APPROVAL: u8 = 2;
pub const DOMAIN_ROLE_MANAGEMENT: u8 = 3;

/// Minimum delay between commit and reveal: 30 minutes.
pub const MIN_REVEAL_DELAY: u64 = 1_800;

/// Two-phase approval gate shared by the request workflow, the emergency
/// closure workflow and role management. An approver first records
/// `keccak256(approver ‖ subject_id ‖ domain ‖ nonce)`, then discloses the
/// nonce inside the actual approval call once the minimum delay has elapsed.
/// Each phase is a complete atomic operation; the gate only compares
/// recorded timestamps, nothing blocks.
#[multiversx_sc::module]
pub trait CommitRevealModule {
    /// Records a commitment. The caller's authority over `subject_id` must
    /// already have been checked by the calling endpoint.
    fn store_commitment(
        &self,
        domain: u8,
        subject_id: u64,
        actor: &ManagedAddress,
        hash: ManagedByteArray<Self::Api, 32>,
    ) {
        let mapper = self.approval_commitment(domain, subject_id, actor);
        require!(mapper.is_empty(), ERR_COMMITMENT_EXISTS);

        mapper.set(&ApprovalCommitment {
            hash,
            committed_at: self.blockchain().get_block_timestamp(),
        });
        self.approval_committed_event(domain, subject_id, actor);
    }

    /// Validates and deletes the commitment for (domain, subject, actor).
    /// Single-use: a second reveal with the same nonce finds no commitment.
    fn consume_reveal(
        &self,
        domain: u8,
        subject_id: u64,
        actor: &ManagedAddress,
        nonce: &ManagedBuffer,
    ) {
        let mapper = self.approval_commitment(domain, subject_id, actor);
        require!(!mapper.is_empty(), ERR_NO_COMMITMENT);

        let commitment = mapper.get();
        let now = self.blockchain().get_block_timestamp();
        require!(
            now >= commitment.committed_at + MIN_REVEAL_DELAY,
            ERR_REVEAL_TOO_EARLY
        );

        let expected = self.commitment_hash(actor, subject_id, domain, nonce);
        require!(commitment.hash == expected, ERR_COMMITMENT_MISMATCH);

        mapper.clear();
    }

    fn commitment_hash(
        &self,
        actor: &ManagedAddress,
        subject_id: u64,
        domain: u8,
        nonce: &ManagedBuffer,
    ) -> ManagedByteArray<Self::Api, 32> {
        let mut data = ManagedBuffer::new();
        data.append(actor.as_managed_buffer());
        data.append_bytes(&subject_id.to_be_bytes());
        data.append_bytes(&[domain]);
        data.append(nonce);
        self.crypto().keccak256(data)
    }

    /// Off-chain helper so integrators can build commitments without
    /// reimplementing the preimage layout.
    #[view(computeApprovalCommitment)]
    fn compute_approval_commitment(
        &self,
        actor: ManagedAddress,
        subject_id: u64,
        domain: u8,
        nonce: ManagedBuffer,
    ) -> ManagedByteArray<Self::Api, 32> {
        self.commitment_hash(&actor, subject_id, domain, &nonce)
    }

    #[event("approvalCommitted")]
    fn approval_committed_event(
        &self,
        #[indexed] domain: u8,
        #[indexed] subject_id: u64,
        #[indexed] actor: &ManagedAddress,
    );

    #[storage_mapper("approvalCommitment")]
    fn approval_commitment(
        &self,
        domain: u8,
        subject_id: u64,
        actor: &ManagedAddress,
    ) -> SingleValueMapper<ApprovalCommitment<Self::Api>>;
}

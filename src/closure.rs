multiversx_sc::imports!();

use crate::commit_reveal::DOMAIN_CLOSURE_APPROVAL;
use crate::errors::*;
use crate::types::{ClosureStatus, EmergencyClosureRequest, Role};

/// Distinct committee approvals required before the director may execute.
pub const REQUIRED_CLOSURE_APPROVALS: usize = 3;

/// Once fully approved, the director has 7 days to execute.
pub const CLOSURE_EXECUTION_WINDOW: u64 = 604_800;

/// Independent wind-down machine: gated by its own commit-reveal chain and
/// multi-party threshold, it sweeps the whole pool to a designated address
/// and permanently closes the engine. It intentionally bypasses per-request
/// bookkeeping; its purpose is to drain the pool irrespective of in-flight
/// requests. Closure operations stay usable while the engine is paused or
/// emergency-stopped — the circuit breaker must work precisely then.
#[multiversx_sc::module]
pub trait ClosureModule:
    crate::roles::RolesModule
    + crate::budget::BudgetModule
    + crate::commit_reveal::CommitRevealModule
{
    // ========================================================
    // ENDPOINT: initiateEmergencyClosure
    // One active closure at a time, enforced by the global
    // singleton pointer (0 = none).
    // ========================================================

    #[endpoint(initiateEmergencyClosure)]
    fn initiate_emergency_closure(
        &self,
        return_address: ManagedAddress,
        reason: ManagedBuffer,
    ) -> u64 {
        self.require_not_closed();
        let caller = self.blockchain().get_caller();
        require!(
            self.has_role(Role::Committee, &caller) || self.has_role(Role::Director, &caller),
            ERR_MISSING_ROLE
        );
        require!(!return_address.is_zero(), ERR_ZERO_ADDRESS);
        require!(
            reason.len() <= crate::MAX_METADATA_LENGTH,
            ERR_METADATA_TOO_LONG
        );
        require!(self.active_closure_id().get() == 0, ERR_CLOSURE_ACTIVE);

        let closure_id = self.closure_count().get() + 1;
        let now = self.blockchain().get_block_timestamp();

        let closure = EmergencyClosureRequest {
            id: closure_id,
            initiator: caller.clone(),
            return_address,
            reason,
            status: ClosureStatus::Initiated,
            created_at: now,
            updated_at: now,
            execution_deadline: 0,
            committee_approvers: ManagedVec::new(),
            director_approver: None,
            remaining_balance: BigUint::zero(),
        };

        self.closures(closure_id).set(&closure);
        self.closure_count().set(closure_id);
        self.active_closure_id().set(closure_id);

        self.closure_initiated_event(closure_id, &caller);
        closure_id
    }

    // ========================================================
    // ENDPOINT: commitClosureApproval
    // Role is checked against the closure's current phase, just
    // like request commits are checked against request status.
    // ========================================================

    #[endpoint(commitClosureApproval)]
    fn commit_closure_approval(
        &self,
        closure_id: u64,
        commitment_hash: ManagedByteArray<Self::Api, 32>,
    ) {
        self.require_not_closed();
        let caller = self.blockchain().get_caller();
        let closure = self.existing_closure(closure_id);
        require!(!closure.status.is_terminal(), ERR_CLOSURE_TERMINAL);

        let pending_role = if closure.committee_approvers.len() < REQUIRED_CLOSURE_APPROVALS {
            Role::Committee
        } else {
            Role::Director
        };
        self.require_role(pending_role, &caller);
        self.store_commitment(DOMAIN_CLOSURE_APPROVAL, closure_id, &caller, commitment_hash);
    }

    // ========================================================
    // ENDPOINT: approveClosureByCommittee
    // ========================================================

    #[endpoint(approveClosureByCommittee)]
    fn approve_closure_by_committee(&self, closure_id: u64, nonce: ManagedBuffer) {
        self.require_not_closed();
        let caller = self.blockchain().get_caller();
        self.require_role(Role::Committee, &caller);

        let mut closure = self.existing_closure(closure_id);
        require!(
            matches!(
                closure.status,
                ClosureStatus::Initiated | ClosureStatus::PartiallyApproved
            ),
            ERR_CLOSURE_WRONG_STATUS
        );

        self.consume_reveal(DOMAIN_CLOSURE_APPROVAL, closure_id, &caller, &nonce);

        for approver in closure.committee_approvers.iter() {
            require!(caller != *approver, ERR_ALREADY_APPROVED);
        }

        let now = self.blockchain().get_block_timestamp();
        closure.committee_approvers.push(caller.clone());
        closure.updated_at = now;

        if closure.committee_approvers.len() >= REQUIRED_CLOSURE_APPROVALS {
            closure.status = ClosureStatus::FullyApproved;
            closure.execution_deadline = now + CLOSURE_EXECUTION_WINDOW;
        } else {
            closure.status = ClosureStatus::PartiallyApproved;
        }
        let new_status = closure.status;
        self.closures(closure_id).set(&closure);

        self.closure_approved_event(closure_id, &caller, new_status);
    }

    // ========================================================
    // ENDPOINT: approveClosureByDirector
    // The qualifying director reveal executes the closure in the
    // same transaction: snapshot, mark executed, close the
    // engine, then sweep. Effects precede the external transfer.
    // ========================================================

    #[endpoint(approveClosureByDirector)]
    fn approve_closure_by_director(&self, closure_id: u64, nonce: ManagedBuffer) {
        self.require_not_closed();
        let caller = self.blockchain().get_caller();
        self.require_role(Role::Director, &caller);

        let mut closure = self.existing_closure(closure_id);
        require!(
            closure.status == ClosureStatus::FullyApproved,
            ERR_CLOSURE_WRONG_STATUS
        );
        require!(closure.director_approver.is_none(), ERR_SLOT_ALREADY_FILLED);

        self.consume_reveal(DOMAIN_CLOSURE_APPROVAL, closure_id, &caller, &nonce);

        let now = self.blockchain().get_block_timestamp();
        require!(
            now <= closure.execution_deadline,
            ERR_CLOSURE_DEADLINE_PASSED
        );

        let balance = self.fund_balance();
        let return_address = closure.return_address.clone();

        closure.director_approver = Some(caller.clone());
        closure.remaining_balance = balance.clone();
        closure.status = ClosureStatus::Executed;
        closure.updated_at = now;
        self.closures(closure_id).set(&closure);

        self.active_closure_id().set(0u64);
        self.engine_closed().set(true);

        if balance > 0u64 {
            self.send()
                .direct(&return_address, &self.payout_token().get(), 0, &balance);
        }

        self.closure_executed_event(closure_id, &caller, &balance);
    }

    // ========================================================
    // ENDPOINT: cancelEmergencyClosure
    // ========================================================

    #[endpoint(cancelEmergencyClosure)]
    fn cancel_emergency_closure(&self, closure_id: u64) {
        self.require_not_closed();
        let caller = self.blockchain().get_caller();

        let mut closure = self.existing_closure(closure_id);
        require!(!closure.status.is_terminal(), ERR_CLOSURE_TERMINAL);
        require!(
            caller == closure.initiator || self.has_role(Role::Admin, &caller),
            ERR_NOT_INITIATOR_OR_ADMIN
        );

        closure.status = ClosureStatus::Cancelled;
        closure.updated_at = self.blockchain().get_block_timestamp();
        self.closures(closure_id).set(&closure);
        self.active_closure_id().set(0u64);

        self.closure_cancelled_event(closure_id, &caller);
    }

    // ========================================================
    // INTERNAL
    // ========================================================

    fn existing_closure(&self, closure_id: u64) -> EmergencyClosureRequest<Self::Api> {
        let mapper = self.closures(closure_id);
        require!(!mapper.is_empty(), ERR_CLOSURE_NOT_FOUND);
        mapper.get()
    }

    // ========================================================
    // VIEWS
    // ========================================================

    #[view(getClosureRequest)]
    fn get_closure_request(&self, closure_id: u64) -> EmergencyClosureRequest<Self::Api> {
        self.existing_closure(closure_id)
    }

    #[view(getClosureCount)]
    fn get_closure_count(&self) -> u64 {
        self.closure_count().get()
    }

    #[view(getActiveClosureId)]
    fn get_active_closure_id(&self) -> u64 {
        self.active_closure_id().get()
    }

    // ========================================================
    // EVENTS
    // ========================================================

    #[event("closureInitiated")]
    fn closure_initiated_event(&self, #[indexed] closure_id: u64, #[indexed] initiator: &ManagedAddress);

    #[event("closureApproved")]
    fn closure_approved_event(
        &self,
        #[indexed] closure_id: u64,
        #[indexed] approver: &ManagedAddress,
        status: ClosureStatus,
    );

    #[event("closureExecuted")]
    fn closure_executed_event(
        &self,
        #[indexed] closure_id: u64,
        #[indexed] director: &ManagedAddress,
        swept_balance: &BigUint,
    );

    #[event("closureCancelled")]
    fn closure_cancelled_event(&self, #[indexed] closure_id: u64, #[indexed] actor: &ManagedAddress);

    // ========================================================
    // STORAGE
    // ========================================================

    #[storage_mapper("closureCount")]
    fn closure_count(&self) -> SingleValueMapper<u64>;

    #[storage_mapper("closures")]
    fn closures(&self, closure_id: u64) -> SingleValueMapper<EmergencyClosureRequest<Self::Api>>;

    /// Global singleton pointer to the closure currently in flight (0 = none).
    #[storage_mapper("activeClosureId")]
    fn active_closure_id(&self) -> SingleValueMapper<u64>;
}

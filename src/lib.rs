#![no_std]

multiversx_sc::imports!();

pub mod admin;
pub mod budget;
pub mod closure;
pub mod commit_reveal;
pub mod errors;
pub mod roles;
pub mod types;

use commit_reveal::DOMAIN_REQUEST_APPROVAL;
use errors::*;
use types::{ApprovalInfo, ReimbursementRequest, RequestStatus, Role};

// ============================================================
// Constants
// ============================================================

/// Recipients per request: 1..=10
pub const MAX_RECIPIENTS: usize = 10;

/// Upper bound for description, document hash and closure reason buffers
pub const MAX_METADATA_LENGTH: usize = 500;

/// Distinct additional committee sign-offs required before the director
pub const REQUIRED_ADDITIONAL_APPROVALS: usize = 3;

/// Window between director approval and the payment deadline: 24 hours
pub const PAYMENT_WINDOW: u64 = 86_400;

/// A request untouched for 15 days may be cancelled by anyone
pub const ABANDONMENT_THRESHOLD: u64 = 1_296_000;

// ============================================================
// Contract
// ============================================================

/// Fund-disbursement engine. Payouts are gated behind a sequential
/// multi-party approval chain (secretary, committee, finance, three
/// additional committee members, then the director), every approval runs
/// through a commit-reveal gate to resist front-running, and the budget
/// accountant bounds what can ever be reserved or spent. The fund ledger
/// is the chain itself: balances come from `get_sc_balance`, payouts go
/// out as direct transfers of the payout token configured at init.
#[multiversx_sc::contract]
pub trait ReimbursementVault:
    commit_reveal::CommitRevealModule
    + roles::RolesModule
    + admin::AdminModule
    + budget::BudgetModule
    + closure::ClosureModule
{
    // ========================================================
    // Init / Upgrade
    // ========================================================

    #[init]
    fn init(
        &self,
        project_id: u64,
        payout_token: EgldOrEsdtTokenIdentifier,
        initial_budget: BigUint,
        admin: ManagedAddress,
        min_single_payout: BigUint,
        max_single_payout: BigUint,
    ) {
        require!(payout_token.is_valid(), ERR_INVALID_TOKEN);
        require!(
            min_single_payout > 0u64 && min_single_payout <= max_single_payout,
            ERR_INVALID_AMOUNT_BOUNDS
        );
        require!(
            initial_budget <= self.budget_ceiling(),
            ERR_BUDGET_ABOVE_CEILING
        );

        self.project_id().set(project_id);
        self.payout_token().set(&payout_token);
        self.project_budget().set(&initial_budget);
        self.min_single_payout().set(&min_single_payout);
        self.max_single_payout().set(&max_single_payout);
        self.request_count().set(0u64);
        self.add_role_member(Role::Admin, admin);
    }

    #[upgrade]
    fn upgrade(&self) {}

    // ========================================================
    // ENDPOINT: createRequest
    // Validation first, then the budget accountant, then the
    // record is written and its total locked.
    // ========================================================

    #[endpoint(createRequest)]
    fn create_request(
        &self,
        recipients: ManagedVec<ManagedAddress>,
        amounts: ManagedVec<BigUint>,
        description: ManagedBuffer,
        document_hash: ManagedBuffer,
    ) -> u64 {
        self.require_engine_active();
        let caller = self.blockchain().get_caller();
        self.require_role(Role::Requester, &caller);

        let count = recipients.len();
        require!(count > 0, ERR_EMPTY_RECIPIENTS);
        require!(count <= MAX_RECIPIENTS, ERR_TOO_MANY_RECIPIENTS);
        require!(amounts.len() == count, ERR_LENGTH_MISMATCH);
        require!(
            description.len() <= MAX_METADATA_LENGTH && document_hash.len() <= MAX_METADATA_LENGTH,
            ERR_METADATA_TOO_LONG
        );

        let min = self.min_single_payout().get();
        let max = self.max_single_payout().get();
        let mut total = BigUint::zero();

        for i in 0..count {
            let recipient = recipients.get(i);
            require!(!recipient.is_zero(), ERR_ZERO_ADDRESS);
            for j in (i + 1)..count {
                require!(*recipient != *recipients.get(j), ERR_DUPLICATE_RECIPIENT);
            }

            let amount = amounts.get(i);
            require!(*amount >= min && *amount <= max, ERR_AMOUNT_OUT_OF_RANGE);
            total += &*amount;
        }

        let max_total = &max * (MAX_RECIPIENTS as u64);
        require!(total <= max_total, ERR_TOTAL_TOO_LARGE);
        self.validate_available_funds(&total);

        let request_id = self.request_count().get() + 1;
        let now = self.blockchain().get_block_timestamp();

        let request = ReimbursementRequest {
            id: request_id,
            requester: caller.clone(),
            recipients,
            amounts,
            total_amount: total.clone(),
            description,
            document_hash,
            status: RequestStatus::Pending,
            created_at: now,
            updated_at: now,
            payment_deadline: 0,
            approvals: ApprovalInfo::empty(),
        };

        self.requests(request_id).set(&request);
        self.request_count().set(request_id);
        self.active_request_ids().insert(request_id);
        self.requester_requests(&caller).insert(request_id);
        self.lock_funds(&total);

        self.request_created_event(request_id, &caller, &total);
        request_id
    }

    // ========================================================
    // ENDPOINT: commitApproval
    // First phase of the gate. The caller must hold the role the
    // request is currently waiting on, checked at commit time.
    // ========================================================

    #[endpoint(commitApproval)]
    fn commit_approval(&self, request_id: u64, commitment_hash: ManagedByteArray<Self::Api, 32>) {
        self.require_engine_active();
        let caller = self.blockchain().get_caller();

        let request = self.existing_request(request_id);
        require!(!request.status.is_terminal(), ERR_REQUEST_TERMINAL);

        let pending_role = self.pending_approval_role(&request);
        self.require_role(pending_role, &caller);

        self.store_commitment(DOMAIN_REQUEST_APPROVAL, request_id, &caller, commitment_hash);
    }

    // ========================================================
    // ENDPOINTS: advance operations, one per role
    // Each reveal is validated in full before any mutation.
    // ========================================================

    #[endpoint(approveBySecretary)]
    fn approve_by_secretary(&self, request_id: u64, nonce: ManagedBuffer) {
        let (caller, mut request) =
            self.prepare_approval(request_id, RequestStatus::Pending, Role::Secretary, &nonce);
        require!(request.approvals.secretary.is_none(), ERR_SLOT_ALREADY_FILLED);

        request.approvals.secretary = Some(caller.clone());
        self.advance_status(&mut request, RequestStatus::SecretaryApproved, &caller);
    }

    #[endpoint(approveByCommittee)]
    fn approve_by_committee(&self, request_id: u64, nonce: ManagedBuffer) {
        let (caller, mut request) = self.prepare_approval(
            request_id,
            RequestStatus::SecretaryApproved,
            Role::Committee,
            &nonce,
        );
        require!(request.approvals.committee.is_none(), ERR_SLOT_ALREADY_FILLED);

        request.approvals.committee = Some(caller.clone());
        self.advance_status(&mut request, RequestStatus::CommitteeApproved, &caller);
    }

    #[endpoint(approveByFinance)]
    fn approve_by_finance(&self, request_id: u64, nonce: ManagedBuffer) {
        let (caller, mut request) = self.prepare_approval(
            request_id,
            RequestStatus::CommitteeApproved,
            Role::Finance,
            &nonce,
        );
        require!(request.approvals.finance.is_none(), ERR_SLOT_ALREADY_FILLED);

        request.approvals.finance = Some(caller.clone());
        self.advance_status(&mut request, RequestStatus::FinanceApproved, &caller);
    }

    /// Does not advance the status. The request stays `FinanceApproved`
    /// until the required count of distinct additional approvers is
    /// reached, which the director gate then checks.
    #[endpoint(approveByCommitteeAdditional)]
    fn approve_by_committee_additional(&self, request_id: u64, nonce: ManagedBuffer) {
        let (caller, mut request) = self.prepare_approval(
            request_id,
            RequestStatus::FinanceApproved,
            Role::Committee,
            &nonce,
        );
        require!(
            request.approvals.committee_additional.len() < REQUIRED_ADDITIONAL_APPROVALS,
            ERR_ADDITIONAL_APPROVALS_COMPLETE
        );
        if let Some(primary) = &request.approvals.committee {
            require!(caller != *primary, ERR_ALREADY_APPROVED);
        }
        for approver in request.approvals.committee_additional.iter() {
            require!(caller != *approver, ERR_ALREADY_APPROVED);
        }

        request.approvals.committee_additional.push(caller.clone());
        request.updated_at = self.blockchain().get_block_timestamp();
        self.requests(request_id).set(&request);

        self.request_approved_event(request_id, &caller, RequestStatus::FinanceApproved);
    }

    /// Terminal approval: marks the request director-approved, stamps the
    /// payment deadline and runs the distribution in the same transaction.
    #[endpoint(approveByDirector)]
    fn approve_by_director(&self, request_id: u64, nonce: ManagedBuffer) {
        let (caller, mut request) = self.prepare_approval(
            request_id,
            RequestStatus::FinanceApproved,
            Role::Director,
            &nonce,
        );
        require!(
            request.approvals.committee_additional.len() >= REQUIRED_ADDITIONAL_APPROVALS,
            ERR_ADDITIONAL_APPROVALS_INCOMPLETE
        );
        require!(request.approvals.director.is_none(), ERR_SLOT_ALREADY_FILLED);

        let now = self.blockchain().get_block_timestamp();
        request.approvals.director = Some(caller.clone());
        request.status = RequestStatus::DirectorApproved;
        request.payment_deadline = now + PAYMENT_WINDOW;
        request.updated_at = now;
        self.requests(request_id).set(&request);
        self.request_approved_event(request_id, &caller, RequestStatus::DirectorApproved);

        self.execute_distribution(request_id, &caller);
    }

    // ========================================================
    // ENDPOINT: cancelRequest
    // Allowed while paused so locked funds stay releasable; an
    // emergency stop blocks it along with everything else.
    // ========================================================

    #[endpoint(cancelRequest)]
    fn cancel_request(&self, request_id: u64) {
        self.require_not_stopped();
        let caller = self.blockchain().get_caller();

        let mut request = self.existing_request(request_id);
        require!(!request.status.is_terminal(), ERR_REQUEST_TERMINAL);
        require!(
            caller == request.requester || self.has_role(Role::Admin, &caller),
            ERR_NOT_REQUESTER_OR_ADMIN
        );

        self.finish_cancellation(&mut request, &caller);
    }

    // ========================================================
    // ENDPOINT: cancelAbandonedRequest
    // Permissionless sweep: a stalled approval chain must not
    // permanently reserve budget capacity.
    // ========================================================

    #[endpoint(cancelAbandonedRequest)]
    fn cancel_abandoned_request(&self, request_id: u64) {
        self.require_not_stopped();
        let caller = self.blockchain().get_caller();

        let mut request = self.existing_request(request_id);
        require!(!request.status.is_terminal(), ERR_REQUEST_TERMINAL);

        let now = self.blockchain().get_block_timestamp();
        require!(
            now >= request.updated_at + ABANDONMENT_THRESHOLD,
            ERR_NOT_ABANDONED
        );

        self.finish_cancellation(&mut request, &caller);
    }

    // ========================================================
    // INTERNAL: lifecycle helpers
    // ========================================================

    fn existing_request(&self, request_id: u64) -> ReimbursementRequest<Self::Api> {
        let mapper = self.requests(request_id);
        require!(!mapper.is_empty(), ERR_REQUEST_NOT_FOUND);
        mapper.get()
    }

    /// The role the request is currently waiting on.
    fn pending_approval_role(&self, request: &ReimbursementRequest<Self::Api>) -> Role {
        match request.status {
            RequestStatus::Pending => Role::Secretary,
            RequestStatus::SecretaryApproved => Role::Committee,
            RequestStatus::CommitteeApproved => Role::Finance,
            RequestStatus::FinanceApproved => {
                if request.approvals.committee_additional.len() < REQUIRED_ADDITIONAL_APPROVALS {
                    Role::Committee
                } else {
                    Role::Director
                }
            }
            _ => sc_panic!(ERR_WRONG_STATUS),
        }
    }

    /// Shared prologue of every advance operation: guards, role, status
    /// and the reveal, all checked before any mutation.
    fn prepare_approval(
        &self,
        request_id: u64,
        expected_status: RequestStatus,
        role: Role,
        nonce: &ManagedBuffer,
    ) -> (ManagedAddress, ReimbursementRequest<Self::Api>) {
        self.require_engine_active();
        let caller = self.blockchain().get_caller();
        self.require_role(role, &caller);

        let request = self.existing_request(request_id);
        require!(!request.status.is_terminal(), ERR_REQUEST_TERMINAL);
        require!(request.status == expected_status, ERR_WRONG_STATUS);

        self.consume_reveal(DOMAIN_REQUEST_APPROVAL, request_id, &caller, nonce);
        (caller, request)
    }

    fn advance_status(
        &self,
        request: &mut ReimbursementRequest<Self::Api>,
        new_status: RequestStatus,
        actor: &ManagedAddress,
    ) {
        request.status = new_status;
        request.updated_at = self.blockchain().get_block_timestamp();
        self.requests(request.id).set(&*request);

        self.request_approved_event(request.id, actor, new_status);
    }

    fn finish_cancellation(
        &self,
        request: &mut ReimbursementRequest<Self::Api>,
        actor: &ManagedAddress,
    ) {
        request.status = RequestStatus::Cancelled;
        request.updated_at = self.blockchain().get_block_timestamp();
        self.requests(request.id).set(&*request);

        self.release_locked(&request.total_amount);
        self.remove_from_active_indexes(request.id, &request.requester);
        self.request_cancelled_event(request.id, actor);
    }

    fn remove_from_active_indexes(&self, request_id: u64, requester: &ManagedAddress) {
        self.active_request_ids().swap_remove(&request_id);
        self.requester_requests(requester).swap_remove(&request_id);
    }

    // ========================================================
    // INTERNAL: distribution executor
    // All local state reaches its post-operation values before
    // the first external transfer, so a reentrant call from a
    // recipient observes a consistent, already-advanced state.
    // ========================================================

    fn execute_distribution(&self, request_id: u64, actor: &ManagedAddress) {
        let mut request = self.requests(request_id).get();

        let now = self.blockchain().get_block_timestamp();
        require!(now <= request.payment_deadline, ERR_PAYMENT_DEADLINE_PASSED);

        let recipients = request.recipients.clone();
        let amounts = request.amounts.clone();
        let total = request.total_amount.clone();

        request.status = RequestStatus::Distributed;
        request.updated_at = now;
        self.requests(request_id).set(&request);
        self.record_distribution(&total);
        self.remove_from_active_indexes(request_id, &request.requester);

        let token = self.payout_token().get();
        let balance_before = self.fund_balance();
        require!(balance_before >= total, ERR_INSUFFICIENT_BALANCE);

        for i in 0..recipients.len() {
            self.send()
                .direct(&recipients.get(i), &token, 0, &amounts.get(i));
        }

        let balance_after = self.fund_balance();
        require!(
            &balance_before - &balance_after == total,
            ERR_BALANCE_DELTA_MISMATCH
        );

        self.funds_distributed_event(request_id, actor, &total);
    }

    // ========================================================
    // VIEWS
    // ========================================================

    #[view(getRequest)]
    fn get_request(&self, request_id: u64) -> ReimbursementRequest<Self::Api> {
        self.existing_request(request_id)
    }

    #[view(getRequestCount)]
    fn get_request_count(&self) -> u64 {
        self.request_count().get()
    }

    #[view(getActiveRequestIds)]
    fn get_active_request_ids(&self) -> MultiValueEncoded<u64> {
        let mut result = MultiValueEncoded::new();
        for id in self.active_request_ids().iter() {
            result.push(id);
        }
        result
    }

    #[view(getRequestsByRequester)]
    fn get_requests_by_requester(&self, requester: ManagedAddress) -> MultiValueEncoded<u64> {
        let mut result = MultiValueEncoded::new();
        for id in self.requester_requests(&requester).iter() {
            result.push(id);
        }
        result
    }

    #[view(isRequestAbandoned)]
    fn is_request_abandoned(&self, request_id: u64) -> bool {
        let request = self.existing_request(request_id);
        if request.status.is_terminal() {
            return false;
        }
        let now = self.blockchain().get_block_timestamp();
        now >= request.updated_at + ABANDONMENT_THRESHOLD
    }

    /// Derives the locked total by scanning active requests. Must always
    /// agree with the materialized counter in `totalLocked`.
    #[view(recomputeLockedAmount)]
    fn recompute_locked_amount(&self) -> BigUint {
        let mut sum = BigUint::zero();
        for id in self.active_request_ids().iter() {
            sum += self.requests(id).get().total_amount;
        }
        sum
    }

    #[view(getContractConfig)]
    fn get_contract_config(
        &self,
    ) -> MultiValue4<u64, EgldOrEsdtTokenIdentifier, BigUint, BigUint> {
        (
            self.project_id().get(),
            self.payout_token().get(),
            self.min_single_payout().get(),
            self.max_single_payout().get(),
        )
            .into()
    }

    // ========================================================
    // EVENTS
    // ========================================================

    #[event("requestCreated")]
    fn request_created_event(
        &self,
        #[indexed] request_id: u64,
        #[indexed] requester: &ManagedAddress,
        total_amount: &BigUint,
    );

    #[event("requestApproved")]
    fn request_approved_event(
        &self,
        #[indexed] request_id: u64,
        #[indexed] approver: &ManagedAddress,
        status: RequestStatus,
    );

    #[event("requestCancelled")]
    fn request_cancelled_event(
        &self,
        #[indexed] request_id: u64,
        #[indexed] actor: &ManagedAddress,
    );

    #[event("fundsDistributed")]
    fn funds_distributed_event(
        &self,
        #[indexed] request_id: u64,
        #[indexed] director: &ManagedAddress,
        total_amount: &BigUint,
    );

    // ========================================================
    // STORAGE
    // ========================================================

    #[storage_mapper("projectId")]
    fn project_id(&self) -> SingleValueMapper<u64>;

    #[storage_mapper("requestCount")]
    fn request_count(&self) -> SingleValueMapper<u64>;

    #[storage_mapper("requests")]
    fn requests(&self, request_id: u64) -> SingleValueMapper<ReimbursementRequest<Self::Api>>;

    #[storage_mapper("activeRequestIds")]
    fn active_request_ids(&self) -> UnorderedSetMapper<u64>;

    #[storage_mapper("requesterRequests")]
    fn requester_requests(&self, requester: &ManagedAddress) -> UnorderedSetMapper<u64>;
}

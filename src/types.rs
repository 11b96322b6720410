multiversx_sc::imports!();
multiversx_sc::derive_imports!();

// ============================================================
// Roles — fixed enumerated set with explicit membership
// ============================================================

#[type_abi]
#[derive(TopEncode, TopDecode, NestedEncode, NestedDecode, Clone, Copy, PartialEq, Debug)]
pub enum Role {
    /// May administer the engine: cancel requests, adjust budget, pause.
    Admin,
    /// May open reimbursement requests.
    Requester,
    /// First approval step.
    Secretary,
    /// Second approval step, plus the three additional sign-offs.
    Committee,
    /// Third approval step.
    Finance,
    /// Final approval step; triggers distribution.
    Director,
}

// ============================================================
// Request Status — lifecycle states
// ============================================================

#[type_abi]
#[derive(TopEncode, TopDecode, NestedEncode, NestedDecode, Clone, Copy, PartialEq, Debug)]
pub enum RequestStatus {
    /// Created, awaiting the secretary.
    Pending,
    /// Awaiting the committee approver.
    SecretaryApproved,
    /// Awaiting the finance approver.
    CommitteeApproved,
    /// Awaiting three additional committee sign-offs, then the director.
    FinanceApproved,
    /// Director signed off. Transient: distribution runs in the same
    /// transaction, so this status is never observable at rest.
    DirectorApproved,
    /// Funds sent. Terminal state.
    Distributed,
    /// Cancelled by the requester, an admin, or the abandonment sweep.
    Cancelled,
}

impl RequestStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(self, RequestStatus::Distributed | RequestStatus::Cancelled)
    }
}

// ============================================================
// Reimbursement Request — the core workflow record
// ============================================================

#[type_abi]
#[derive(TopEncode, TopDecode, NestedEncode, NestedDecode, Clone, Debug)]
pub struct ApprovalInfo<M: ManagedTypeApi> {
    pub secretary: Option<ManagedAddress<M>>,
    pub committee: Option<ManagedAddress<M>>,
    pub finance: Option<ManagedAddress<M>>,
    /// Append-only, unique, capped at the required count.
    pub committee_additional: ManagedVec<M, ManagedAddress<M>>,
    pub director: Option<ManagedAddress<M>>,
}

impl<M: ManagedTypeApi> ApprovalInfo<M> {
    pub fn empty() -> Self {
        ApprovalInfo {
            secretary: None,
            committee: None,
            finance: None,
            committee_additional: ManagedVec::new(),
            director: None,
        }
    }
}

#[type_abi]
#[derive(TopEncode, TopDecode, NestedEncode, NestedDecode, Clone, Debug)]
pub struct ReimbursementRequest<M: ManagedTypeApi> {
    pub id: u64,
    pub requester: ManagedAddress<M>,
    pub recipients: ManagedVec<M, ManagedAddress<M>>,
    pub amounts: ManagedVec<M, BigUint<M>>,
    pub total_amount: BigUint<M>,
    pub description: ManagedBuffer<M>,
    pub document_hash: ManagedBuffer<M>,
    pub status: RequestStatus,
    pub created_at: u64,
    /// Refreshed on every approval and on cancellation; drives the
    /// abandonment sweep.
    pub updated_at: u64,
    /// Set when the director approves (0 until then). Distribution must
    /// happen before this timestamp.
    pub payment_deadline: u64,
    pub approvals: ApprovalInfo<M>,
}

// ============================================================
// Commit-reveal — one pending commitment per (domain, subject, actor)
// ============================================================

#[type_abi]
#[derive(TopEncode, TopDecode, NestedEncode, NestedDecode, Clone, Debug)]
pub struct ApprovalCommitment<M: ManagedTypeApi> {
    pub hash: ManagedByteArray<M, 32>,
    pub committed_at: u64,
}

// ============================================================
// Emergency closure — independent wind-down state machine
// ============================================================

#[type_abi]
#[derive(TopEncode, TopDecode, NestedEncode, NestedDecode, Clone, Copy, PartialEq, Debug)]
pub enum ClosureStatus {
    /// Opened by a committee member or director.
    Initiated,
    /// At least one committee approval recorded.
    PartiallyApproved,
    /// Required committee count reached; awaiting the director.
    FullyApproved,
    /// Funds swept, engine permanently closed. Terminal state.
    Executed,
    /// Cancelled by the initiator or an admin. Terminal state.
    Cancelled,
}

impl ClosureStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(self, ClosureStatus::Executed | ClosureStatus::Cancelled)
    }
}

#[type_abi]
#[derive(TopEncode, TopDecode, NestedEncode, NestedDecode, Clone, Debug)]
pub struct EmergencyClosureRequest<M: ManagedTypeApi> {
    pub id: u64,
    pub initiator: ManagedAddress<M>,
    pub return_address: ManagedAddress<M>,
    pub reason: ManagedBuffer<M>,
    pub status: ClosureStatus,
    pub created_at: u64,
    pub updated_at: u64,
    /// Set when the committee count is reached; the director must execute
    /// before this timestamp.
    pub execution_deadline: u64,
    pub committee_approvers: ManagedVec<M, ManagedAddress<M>>,
    pub director_approver: Option<ManagedAddress<M>>,
    /// Ledger balance captured at execution time.
    pub remaining_balance: BigUint<M>,
}

// ============================================================
// Timelocked budget adjustment
// ============================================================

#[type_abi]
#[derive(TopEncode, TopDecode, NestedEncode, NestedDecode, Clone, Debug)]
pub struct PendingBudgetChange<M: ManagedTypeApi> {
    pub new_budget: BigUint<M>,
    pub proposed_at: u64,
}

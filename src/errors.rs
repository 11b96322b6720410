// Stable error identifiers. Integrators branch on these strings, so they
// must never be reworded without a migration note.

// Validation

pub const ERR_EMPTY_RECIPIENTS: &str = "No recipients";
pub const ERR_TOO_MANY_RECIPIENTS: &str = "Too many recipients";
pub const ERR_LENGTH_MISMATCH: &str = "Recipients and amounts length mismatch";
pub const ERR_DUPLICATE_RECIPIENT: &str = "Duplicate recipient";
pub const ERR_ZERO_ADDRESS: &str = "Zero address";
pub const ERR_AMOUNT_OUT_OF_RANGE: &str = "Amount outside configured bounds";
pub const ERR_TOTAL_TOO_LARGE: &str = "Total amount exceeds per-request maximum";
pub const ERR_METADATA_TOO_LONG: &str = "Metadata exceeds maximum length";
pub const ERR_INVALID_TOKEN: &str = "Invalid payout token";
pub const ERR_INVALID_AMOUNT_BOUNDS: &str = "Invalid payout amount bounds";
pub const ERR_WRONG_DEPOSIT_TOKEN: &str = "Deposit token does not match payout token";
pub const ERR_ZERO_DEPOSIT: &str = "Deposit amount is zero";

// Authorization

pub const ERR_MISSING_ROLE: &str = "Caller does not hold the required role";
pub const ERR_ALREADY_ROLE_MEMBER: &str = "Identity already holds this role";
pub const ERR_NOT_ROLE_MEMBER: &str = "Identity does not hold this role";
pub const ERR_LAST_ADMIN: &str = "Cannot revoke the last admin";
pub const ERR_NOT_REQUESTER_OR_ADMIN: &str = "Only the requester or an admin may cancel";
pub const ERR_NOT_INITIATOR_OR_ADMIN: &str = "Only the initiator or an admin may cancel";

// Commit-reveal protocol

pub const ERR_COMMITMENT_EXISTS: &str = "Commitment already recorded";
pub const ERR_NO_COMMITMENT: &str = "No commitment recorded";
pub const ERR_REVEAL_TOO_EARLY: &str = "Reveal delay has not elapsed";
pub const ERR_COMMITMENT_MISMATCH: &str = "Commitment hash mismatch";

// Request state

pub const ERR_REQUEST_NOT_FOUND: &str = "Request does not exist";
pub const ERR_REQUEST_TERMINAL: &str = "Request is in a terminal state";
pub const ERR_WRONG_STATUS: &str = "Request is not awaiting this approval";
pub const ERR_SLOT_ALREADY_FILLED: &str = "Approval slot already filled";
pub const ERR_ALREADY_APPROVED: &str = "Approver already recorded";
pub const ERR_ADDITIONAL_APPROVALS_INCOMPLETE: &str = "Additional committee approvals incomplete";
pub const ERR_ADDITIONAL_APPROVALS_COMPLETE: &str = "Additional committee approvals already complete";
pub const ERR_NOT_ABANDONED: &str = "Request is not abandoned";
pub const ERR_PAYMENT_DEADLINE_PASSED: &str = "Payment deadline has passed";

// Closure state

pub const ERR_CLOSURE_NOT_FOUND: &str = "Closure request does not exist";
pub const ERR_CLOSURE_ACTIVE: &str = "An emergency closure is already active";
pub const ERR_CLOSURE_TERMINAL: &str = "Closure request is in a terminal state";
pub const ERR_CLOSURE_WRONG_STATUS: &str = "Closure request is not awaiting this approval";
pub const ERR_CLOSURE_DEADLINE_PASSED: &str = "Closure execution deadline has passed";

// Resources

pub const ERR_INSUFFICIENT_AVAILABLE_FUNDS: &str = "Insufficient available funds";
pub const ERR_LOCKED_CAP_EXCEEDED: &str = "Reserved-capacity cap exceeded";
pub const ERR_BUDGET_EXCEEDED: &str = "Project budget exceeded";
pub const ERR_BUDGET_BELOW_DISTRIBUTED: &str = "Budget below already-distributed total";
pub const ERR_BUDGET_ABOVE_CEILING: &str = "Budget above safety ceiling";
pub const ERR_NO_PENDING_BUDGET_CHANGE: &str = "No pending budget change";
pub const ERR_TIMELOCK_ACTIVE: &str = "Timelock has not elapsed";

// External transfers

pub const ERR_INSUFFICIENT_BALANCE: &str = "Fund balance below payout total";
pub const ERR_BALANCE_DELTA_MISMATCH: &str = "Post-transfer balance delta mismatch";

// Engine guards & admin rails

pub const ERR_ENGINE_CLOSED: &str = "Engine permanently closed";
pub const ERR_ENGINE_PAUSED: &str = "Engine is paused";
pub const ERR_EMERGENCY_STOPPED: &str = "Engine is emergency-stopped";
pub const ERR_ALREADY_PAUSED: &str = "Engine is already paused";
pub const ERR_NOT_PAUSED: &str = "Engine is not paused";
pub const ERR_ALREADY_STOPPED: &str = "Engine is already emergency-stopped";
pub const ERR_NOT_STOPPED: &str = "Engine is not emergency-stopped";
pub const ERR_ALREADY_VOTED: &str = "Admin vote already recorded";
pub const ERR_NO_PENDING_UNPAUSE: &str = "No pending unpause";

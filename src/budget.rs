multiversx_sc::imports!();

use crate::errors::*;
use crate::types::{PendingBudgetChange, Role};

/// Reserved-capacity cap: locked funds may never exceed 80% of the current
/// balance (8000 basis points), so one wave of approvals cannot starve all
/// other requests of liquidity.
pub const MAX_LOCKED_BPS: u64 = 8_000;

/// Basis points denominator
pub const BPS_DENOMINATOR: u64 = 10_000;

/// Budget adjustments execute only after 48 hours.
pub const BUDGET_TIMELOCK: u64 = 172_800;

/// Tracks the authorized budget, the cumulative distributed amount and the
/// materialized locked total. All three are mutated only from inside the
/// same transaction as the request transition that triggers the change.
#[multiversx_sc::module]
pub trait BudgetModule:
    crate::roles::RolesModule + crate::commit_reveal::CommitRevealModule
{
    // ========================================================
    // ENDPOINT: deposit
    // Top-up path for the fund pool. Accepts only the payout
    // token configured at initialization.
    // ========================================================

    #[payable("*")]
    #[endpoint(deposit)]
    fn deposit(&self) {
        self.require_not_closed();
        let payment = self.call_value().egld_or_single_esdt();
        require!(
            payment.token_identifier == self.payout_token().get() && payment.token_nonce == 0,
            ERR_WRONG_DEPOSIT_TOKEN
        );
        require!(payment.amount > 0u64, ERR_ZERO_DEPOSIT);

        let caller = self.blockchain().get_caller();
        self.deposit_event(&caller, &payment.amount);
    }

    // ========================================================
    // ENDPOINT: proposeBudgetChange / executeBudgetChange /
    //           cancelBudgetChange
    // Timelocked adjustment of the authorized ceiling. Bounds
    // are checked both at proposal and at execution, since the
    // distributed total can grow during the timelock.
    // ========================================================

    #[endpoint(proposeBudgetChange)]
    fn propose_budget_change(&self, new_budget: BigUint) {
        self.require_not_closed();
        let caller = self.blockchain().get_caller();
        self.require_role(Role::Admin, &caller);
        self.require_budget_bounds(&new_budget);

        let now = self.blockchain().get_block_timestamp();
        self.pending_budget_change().set(&PendingBudgetChange {
            new_budget: new_budget.clone(),
            proposed_at: now,
        });
        self.budget_change_proposed_event(&caller, &new_budget, now);
    }

    #[endpoint(executeBudgetChange)]
    fn execute_budget_change(&self) {
        self.require_not_closed();
        let caller = self.blockchain().get_caller();
        self.require_role(Role::Admin, &caller);

        let mapper = self.pending_budget_change();
        require!(!mapper.is_empty(), ERR_NO_PENDING_BUDGET_CHANGE);
        let pending = mapper.get();

        let now = self.blockchain().get_block_timestamp();
        require!(
            now >= pending.proposed_at + BUDGET_TIMELOCK,
            ERR_TIMELOCK_ACTIVE
        );
        self.require_budget_bounds(&pending.new_budget);

        mapper.clear();
        self.project_budget().set(&pending.new_budget);
        self.budget_changed_event(&caller, &pending.new_budget);
    }

    #[endpoint(cancelBudgetChange)]
    fn cancel_budget_change(&self) {
        self.require_not_closed();
        let caller = self.blockchain().get_caller();
        self.require_role(Role::Admin, &caller);

        let mapper = self.pending_budget_change();
        require!(!mapper.is_empty(), ERR_NO_PENDING_BUDGET_CHANGE);
        mapper.clear();
        self.budget_change_cancelled_event(&caller);
    }

    // ========================================================
    // INTERNAL: accounting
    // ========================================================

    fn fund_balance(&self) -> BigUint {
        self.blockchain()
            .get_sc_balance(&self.payout_token().get(), 0)
    }

    /// Admission check for new requests: available liquidity, the
    /// reserved-capacity cap and the budget ceiling.
    fn validate_available_funds(&self, amount: &BigUint) {
        let balance = self.fund_balance();
        let locked = self.total_locked().get();

        let available = if balance > locked {
            &balance - &locked
        } else {
            BigUint::zero()
        };
        require!(amount <= &available, ERR_INSUFFICIENT_AVAILABLE_FUNDS);

        let locked_after = &locked + amount;
        require!(
            &locked_after * BPS_DENOMINATOR <= &balance * MAX_LOCKED_BPS,
            ERR_LOCKED_CAP_EXCEEDED
        );

        let distributed = self.total_distributed().get();
        require!(
            &distributed + amount <= self.project_budget().get(),
            ERR_BUDGET_EXCEEDED
        );
    }

    fn lock_funds(&self, amount: &BigUint) {
        self.total_locked().update(|locked| *locked += amount);
    }

    fn release_locked(&self, amount: &BigUint) {
        self.total_locked().update(|locked| {
            if *locked >= *amount {
                *locked -= amount;
            } else {
                *locked = BigUint::zero();
            }
        });
    }

    fn record_distribution(&self, amount: &BigUint) {
        self.release_locked(amount);
        self.total_distributed().update(|d| *d += amount);
    }

    /// Overflow-safety ceiling for budget adjustments. Far above any
    /// realistic denomination, but keeps bps arithmetic comfortably inside
    /// predictable magnitudes.
    fn budget_ceiling(&self) -> BigUint {
        let max_word = BigUint::from(u64::MAX as u128);
        &max_word * &max_word
    }

    fn require_budget_bounds(&self, new_budget: &BigUint) {
        require!(
            *new_budget >= self.total_distributed().get(),
            ERR_BUDGET_BELOW_DISTRIBUTED
        );
        require!(
            *new_budget <= self.budget_ceiling(),
            ERR_BUDGET_ABOVE_CEILING
        );
    }

    // ========================================================
    // VIEWS
    // ========================================================

    #[view(getFundStats)]
    fn get_fund_stats(&self) -> MultiValue4<BigUint, BigUint, BigUint, bool> {
        let balance = self.fund_balance();
        let locked = self.total_locked().get();
        let available = if balance > locked {
            &balance - &locked
        } else {
            BigUint::zero()
        };
        let budget = self.project_budget().get();
        let distributed = self.total_distributed().get();
        let remaining_budget = if budget > distributed {
            &budget - &distributed
        } else {
            BigUint::zero()
        };
        let needs_deposit = balance == 0u64;

        (available, locked, remaining_budget, needs_deposit).into()
    }

    #[view(getBudgetStatus)]
    fn get_budget_status(&self) -> MultiValue3<BigUint, BigUint, BigUint> {
        (
            self.project_budget().get(),
            self.total_distributed().get(),
            self.total_locked().get(),
        )
            .into()
    }

    #[view(getPendingBudgetChange)]
    fn get_pending_budget_change(&self) -> OptionalValue<PendingBudgetChange<Self::Api>> {
        let mapper = self.pending_budget_change();
        if mapper.is_empty() {
            OptionalValue::None
        } else {
            OptionalValue::Some(mapper.get())
        }
    }

    // ========================================================
    // EVENTS
    // ========================================================

    #[event("deposit")]
    fn deposit_event(&self, #[indexed] depositor: &ManagedAddress, amount: &BigUint);

    #[event("budgetChangeProposed")]
    fn budget_change_proposed_event(
        &self,
        #[indexed] admin: &ManagedAddress,
        #[indexed] new_budget: &BigUint,
        proposed_at: u64,
    );

    #[event("budgetChanged")]
    fn budget_changed_event(&self, #[indexed] admin: &ManagedAddress, #[indexed] new_budget: &BigUint);

    #[event("budgetChangeCancelled")]
    fn budget_change_cancelled_event(&self, #[indexed] admin: &ManagedAddress);

    // ========================================================
    // STORAGE
    // ========================================================

    #[storage_mapper("payoutToken")]
    fn payout_token(&self) -> SingleValueMapper<EgldOrEsdtTokenIdentifier>;

    #[storage_mapper("projectBudget")]
    fn project_budget(&self) -> SingleValueMapper<BigUint>;

    #[storage_mapper("totalDistributed")]
    fn total_distributed(&self) -> SingleValueMapper<BigUint>;

    #[storage_mapper("totalLocked")]
    fn total_locked(&self) -> SingleValueMapper<BigUint>;

    #[storage_mapper("minSinglePayout")]
    fn min_single_payout(&self) -> SingleValueMapper<BigUint>;

    #[storage_mapper("maxSinglePayout")]
    fn max_single_payout(&self) -> SingleValueMapper<BigUint>;

    #[storage_mapper("pendingBudgetChange")]
    fn pending_budget_change(&self) -> SingleValueMapper<PendingBudgetChange<Self::Api>>;
}

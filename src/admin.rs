multiversx_sc::imports!();

use crate::errors::*;
use crate::types::Role;

/// Distinct admin votes required for pause and emergency-stop changes, so a
/// single compromised admin key cannot freeze the engine alone.
pub const ADMIN_ACTION_THRESHOLD: usize = 2;

/// Unpausing is timelocked: 48 hours between proposal and execution.
pub const UNPAUSE_TIMELOCK: u64 = 172_800;

/// Threshold-gated pause and emergency stop, plus the timelocked unpause.
/// The underlying flags live in the roles module; this module owns every
/// path that flips them apart from closure execution.
#[multiversx_sc::module]
pub trait AdminModule:
    crate::roles::RolesModule + crate::commit_reveal::CommitRevealModule
{
    // ========================================================
    // ENDPOINT: votePause
    // Second distinct admin vote pauses the engine.
    // ========================================================

    #[endpoint(votePause)]
    fn vote_pause(&self) {
        self.require_not_closed();
        let caller = self.blockchain().get_caller();
        self.require_role(Role::Admin, &caller);
        require!(!self.paused().get(), ERR_ALREADY_PAUSED);

        let inserted = self.pause_votes().insert(caller.clone());
        require!(inserted, ERR_ALREADY_VOTED);

        if self.pause_votes().len() >= ADMIN_ACTION_THRESHOLD {
            self.clear_vote_set(self.pause_votes());
            self.paused().set(true);
            self.engine_paused_event(&caller);
        } else {
            self.pause_vote_event(&caller);
        }
    }

    // ========================================================
    // ENDPOINT: proposeUnpause / executeUnpause
    // ========================================================

    #[endpoint(proposeUnpause)]
    fn propose_unpause(&self) {
        self.require_not_closed();
        let caller = self.blockchain().get_caller();
        self.require_role(Role::Admin, &caller);
        require!(self.paused().get(), ERR_NOT_PAUSED);

        let now = self.blockchain().get_block_timestamp();
        self.unpause_proposed_at().set(now);
        self.unpause_proposed_event(&caller, now);
    }

    #[endpoint(executeUnpause)]
    fn execute_unpause(&self) {
        self.require_not_closed();
        let caller = self.blockchain().get_caller();
        self.require_role(Role::Admin, &caller);
        require!(self.paused().get(), ERR_NOT_PAUSED);

        let proposed_at = self.unpause_proposed_at().get();
        require!(proposed_at != 0, ERR_NO_PENDING_UNPAUSE);

        let now = self.blockchain().get_block_timestamp();
        require!(now >= proposed_at + UNPAUSE_TIMELOCK, ERR_TIMELOCK_ACTIVE);

        self.unpause_proposed_at().clear();
        self.clear_vote_set(self.pause_votes());
        self.paused().set(false);
        self.engine_unpaused_event(&caller);
    }

    // ========================================================
    // ENDPOINT: voteEmergencyStop / voteLiftEmergencyStop
    // Both directions of the toggle carry the same 2-of-N
    // discipline as pause.
    // ========================================================

    #[endpoint(voteEmergencyStop)]
    fn vote_emergency_stop(&self) {
        self.require_not_closed();
        let caller = self.blockchain().get_caller();
        self.require_role(Role::Admin, &caller);
        require!(!self.emergency_stopped().get(), ERR_ALREADY_STOPPED);

        let inserted = self.emergency_stop_votes().insert(caller.clone());
        require!(inserted, ERR_ALREADY_VOTED);

        if self.emergency_stop_votes().len() >= ADMIN_ACTION_THRESHOLD {
            self.clear_vote_set(self.emergency_stop_votes());
            self.clear_vote_set(self.emergency_lift_votes());
            self.emergency_stopped().set(true);
            self.emergency_stop_event(&caller, true);
        } else {
            self.emergency_stop_vote_event(&caller, true);
        }
    }

    #[endpoint(voteLiftEmergencyStop)]
    fn vote_lift_emergency_stop(&self) {
        self.require_not_closed();
        let caller = self.blockchain().get_caller();
        self.require_role(Role::Admin, &caller);
        require!(self.emergency_stopped().get(), ERR_NOT_STOPPED);

        let inserted = self.emergency_lift_votes().insert(caller.clone());
        require!(inserted, ERR_ALREADY_VOTED);

        if self.emergency_lift_votes().len() >= ADMIN_ACTION_THRESHOLD {
            self.clear_vote_set(self.emergency_lift_votes());
            self.clear_vote_set(self.emergency_stop_votes());
            self.emergency_stopped().set(false);
            self.emergency_stop_event(&caller, false);
        } else {
            self.emergency_stop_vote_event(&caller, false);
        }
    }

    // ========================================================
    // INTERNAL
    // ========================================================

    fn clear_vote_set(&self, mut votes: UnorderedSetMapper<Self::Api, ManagedAddress>) {
        while votes.len() > 0 {
            let member = votes.get_by_index(1);
            votes.swap_remove(&member);
        }
    }

    // ========================================================
    // VIEWS
    // ========================================================

    #[view(getEngineStatus)]
    fn get_engine_status(&self) -> MultiValue3<bool, bool, bool> {
        (
            self.paused().get(),
            self.emergency_stopped().get(),
            self.engine_closed().get(),
        )
            .into()
    }

    // ========================================================
    // EVENTS
    // ========================================================

    #[event("pauseVote")]
    fn pause_vote_event(&self, #[indexed] admin: &ManagedAddress);

    #[event("enginePaused")]
    fn engine_paused_event(&self, #[indexed] admin: &ManagedAddress);

    #[event("unpauseProposed")]
    fn unpause_proposed_event(&self, #[indexed] admin: &ManagedAddress, proposed_at: u64);

    #[event("engineUnpaused")]
    fn engine_unpaused_event(&self, #[indexed] admin: &ManagedAddress);

    #[event("emergencyStopVote")]
    fn emergency_stop_vote_event(&self, #[indexed] admin: &ManagedAddress, #[indexed] stop: bool);

    #[event("emergencyStop")]
    fn emergency_stop_event(&self, #[indexed] admin: &ManagedAddress, #[indexed] stopped: bool);

    // ========================================================
    // STORAGE
    // ========================================================

    #[storage_mapper("pauseVotes")]
    fn pause_votes(&self) -> UnorderedSetMapper<ManagedAddress>;

    #[storage_mapper("emergencyStopVotes")]
    fn emergency_stop_votes(&self) -> UnorderedSetMapper<ManagedAddress>;

    #[storage_mapper("emergencyLiftVotes")]
    fn emergency_lift_votes(&self) -> UnorderedSetMapper<ManagedAddress>;

    #[storage_mapper("unpauseProposedAt")]
    fn unpause_proposed_at(&self) -> SingleValueMapper<u64>;
}

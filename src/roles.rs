multiversx_sc::imports!();

use crate::commit_reveal::DOMAIN_ROLE_MANAGEMENT;
use crate::errors::*;
use crate::types::Role;

/// Role changes are not tied to a request, so they all commit against a
/// fixed subject id. The hash still binds the domain, so these commitments
/// cannot be replayed against requests or closures.
pub const ROLE_CHANGE_SUBJECT_ID: u64 = 0;

/// Role membership plus the engine-wide guard flags. Every operation
/// declares the exact role it requires and checks membership directly;
/// there is no role hierarchy.
#[multiversx_sc::module]
pub trait RolesModule: crate::commit_reveal::CommitRevealModule {
    // ========================================================
    // ENDPOINT: grantRoleDirect
    // Factory-only seeding path, before the commit-reveal-gated
    // role management takes over. The deploying factory is the
    // contract owner.
    // ========================================================

    #[only_owner]
    #[endpoint(grantRoleDirect)]
    fn grant_role_direct(&self, role: Role, identity: ManagedAddress) {
        self.require_not_closed();
        self.add_role_member(role, identity);
    }

    // ========================================================
    // ENDPOINT: commitRoleChange
    // ========================================================

    #[endpoint(commitRoleChange)]
    fn commit_role_change(&self, commitment_hash: ManagedByteArray<Self::Api, 32>) {
        self.require_not_closed();
        let caller = self.blockchain().get_caller();
        self.require_role(Role::Admin, &caller);
        self.store_commitment(
            DOMAIN_ROLE_MANAGEMENT,
            ROLE_CHANGE_SUBJECT_ID,
            &caller,
            commitment_hash,
        );
    }

    // ========================================================
    // ENDPOINT: grantRole / revokeRole
    // Commit-reveal gated so pending role changes cannot be
    // observed and front-run by the identities they affect.
    // ========================================================

    #[endpoint(grantRole)]
    fn grant_role(&self, role: Role, identity: ManagedAddress, nonce: ManagedBuffer) {
        self.require_not_closed();
        let caller = self.blockchain().get_caller();
        self.require_role(Role::Admin, &caller);
        self.consume_reveal(DOMAIN_ROLE_MANAGEMENT, ROLE_CHANGE_SUBJECT_ID, &caller, &nonce);
        self.add_role_member(role, identity);
    }

    #[endpoint(revokeRole)]
    fn revoke_role(&self, role: Role, identity: ManagedAddress, nonce: ManagedBuffer) {
        self.require_not_closed();
        let caller = self.blockchain().get_caller();
        self.require_role(Role::Admin, &caller);
        self.consume_reveal(DOMAIN_ROLE_MANAGEMENT, ROLE_CHANGE_SUBJECT_ID, &caller, &nonce);

        require!(
            self.role_members(role).contains(&identity),
            ERR_NOT_ROLE_MEMBER
        );
        if let Role::Admin = role {
            require!(self.role_members(Role::Admin).len() > 1, ERR_LAST_ADMIN);
        }
        self.role_members(role).swap_remove(&identity);
        self.role_revoked_event(role, &identity, &caller);
    }

    // ========================================================
    // INTERNAL: membership
    // ========================================================

    fn add_role_member(&self, role: Role, identity: ManagedAddress) {
        require!(!identity.is_zero(), ERR_ZERO_ADDRESS);
        let inserted = self.role_members(role).insert(identity.clone());
        require!(inserted, ERR_ALREADY_ROLE_MEMBER);
        self.role_granted_event(role, &identity);
    }

    fn has_role(&self, role: Role, identity: &ManagedAddress) -> bool {
        self.role_members(role).contains(identity)
    }

    fn require_role(&self, role: Role, identity: &ManagedAddress) {
        require!(self.has_role(role, identity), ERR_MISSING_ROLE);
    }

    // ========================================================
    // INTERNAL: engine guards
    // The flags are declared here so both the admin rails and the
    // closure sub-machine can flip them; all mutation still goes
    // through those two paths only.
    // ========================================================

    fn require_not_closed(&self) {
        require!(!self.engine_closed().get(), ERR_ENGINE_CLOSED);
    }

    fn require_not_stopped(&self) {
        self.require_not_closed();
        require!(!self.emergency_stopped().get(), ERR_EMERGENCY_STOPPED);
    }

    fn require_engine_active(&self) {
        self.require_not_stopped();
        require!(!self.paused().get(), ERR_ENGINE_PAUSED);
    }

    // ========================================================
    // VIEWS
    // ========================================================

    #[view(hasRole)]
    fn has_role_view(&self, role: Role, identity: ManagedAddress) -> bool {
        self.has_role(role, &identity)
    }

    #[view(getRoleMembers)]
    fn get_role_members(&self, role: Role) -> MultiValueEncoded<ManagedAddress> {
        let mut result = MultiValueEncoded::new();
        for member in self.role_members(role).iter() {
            result.push(member);
        }
        result
    }

    // ========================================================
    // EVENTS
    // ========================================================

    #[event("roleGranted")]
    fn role_granted_event(&self, #[indexed] role: Role, #[indexed] identity: &ManagedAddress);

    #[event("roleRevoked")]
    fn role_revoked_event(
        &self,
        #[indexed] role: Role,
        #[indexed] identity: &ManagedAddress,
        #[indexed] admin: &ManagedAddress,
    );

    // ========================================================
    // STORAGE
    // ========================================================

    #[storage_mapper("roleMembers")]
    fn role_members(&self, role: Role) -> UnorderedSetMapper<ManagedAddress>;

    #[storage_mapper("paused")]
    fn paused(&self) -> SingleValueMapper<bool>;

    #[storage_mapper("emergencyStopped")]
    fn emergency_stopped(&self) -> SingleValueMapper<bool>;

    #[storage_mapper("engineClosed")]
    fn engine_closed(&self) -> SingleValueMapper<bool>;
}

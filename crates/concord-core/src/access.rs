use std::collections::{BTreeSet, HashMap};
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::CoreError;
use crate::types::Address;

/// Administrative capabilities
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Role {
    /// May grant and revoke every role, and move the initial epoch
    DefaultAdmin,
    ManageMembersAndQuorum,
    DisableConsensus,
    ManageFrameConfig,
    ManageFastLaneConfig,
    ManageReportProcessor,
    ManageConsensusContract,
    ManageConsensusVersion,
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Role::DefaultAdmin => "DEFAULT_ADMIN_ROLE",
            Role::ManageMembersAndQuorum => "MANAGE_MEMBERS_AND_QUORUM_ROLE",
            Role::DisableConsensus => "DISABLE_CONSENSUS_ROLE",
            Role::ManageFrameConfig => "MANAGE_FRAME_CONFIG_ROLE",
            Role::ManageFastLaneConfig => "MANAGE_FAST_LANE_CONFIG_ROLE",
            Role::ManageReportProcessor => "MANAGE_REPORT_PROCESSOR_ROLE",
            Role::ManageConsensusContract => "MANAGE_CONSENSUS_CONTRACT_ROLE",
            Role::ManageConsensusVersion => "MANAGE_CONSENSUS_VERSION_ROLE",
        };
        f.write_str(name)
    }
}

/// Role membership table
#[derive(Debug, Clone, Default)]
pub struct AccessControl {
    roles: HashMap<Role, BTreeSet<Address>>,
}

impl AccessControl {
    /// Create a table where `admin` holds the default admin role
    pub fn new(admin: Address) -> Self {
        let mut roles = HashMap::new();
        roles.insert(Role::DefaultAdmin, BTreeSet::from([admin]));
        AccessControl { roles }
    }

    pub fn has_role(&self, role: Role, account: &Address) -> bool {
        self.roles
            .get(&role)
            .map(|members| members.contains(account))
            .unwrap_or(false)
    }

    pub fn check_role(&self, role: Role, account: &Address) -> Result<(), CoreError> {
        if self.has_role(role, account) {
            Ok(())
        } else {
            Err(CoreError::MissingRole {
                account: *account,
                role,
            })
        }
    }

    /// Grant `role` to `account`. Returns whether the table changed.
    pub fn grant_role(
        &mut self,
        caller: &Address,
        role: Role,
        account: Address,
    ) -> Result<bool, CoreError> {
        self.check_role(Role::DefaultAdmin, caller)?;
        Ok(self.roles.entry(role).or_default().insert(account))
    }

    /// Revoke `role` from `account`. Returns whether the table changed.
    pub fn revoke_role(
        &mut self,
        caller: &Address,
        role: Role,
        account: &Address,
    ) -> Result<bool, CoreError> {
        self.check_role(Role::DefaultAdmin, caller)?;
        Ok(self
            .roles
            .get_mut(&role)
            .map(|members| members.remove(account))
            .unwrap_or(false))
    }

    pub fn role_members(&self, role: Role) -> Vec<Address> {
        self.roles
            .get(&role)
            .map(|members| members.iter().copied().collect())
            .unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_admin_holds_default_role() {
        let admin = Address::from_low_u8(1);
        let acl = AccessControl::new(admin);
        assert!(acl.has_role(Role::DefaultAdmin, &admin));
        assert!(!acl.has_role(Role::ManageFrameConfig, &admin));
    }

    #[test]
    fn test_grant_and_revoke() {
        let admin = Address::from_low_u8(1);
        let manager = Address::from_low_u8(2);
        let mut acl = AccessControl::new(admin);

        assert!(acl
            .grant_role(&admin, Role::ManageMembersAndQuorum, manager)
            .unwrap());
        assert!(!acl
            .grant_role(&admin, Role::ManageMembersAndQuorum, manager)
            .unwrap());
        acl.check_role(Role::ManageMembersAndQuorum, &manager).unwrap();

        assert!(acl
            .revoke_role(&admin, Role::ManageMembersAndQuorum, &manager)
            .unwrap());
        assert!(acl.check_role(Role::ManageMembersAndQuorum, &manager).is_err());
    }

    #[test]
    fn test_only_admin_can_grant() {
        let admin = Address::from_low_u8(1);
        let stranger = Address::from_low_u8(9);
        let mut acl = AccessControl::new(admin);

        let result = acl.grant_role(&stranger, Role::DisableConsensus, stranger);
        assert!(matches!(
            result,
            Err(CoreError::MissingRole {
                role: Role::DefaultAdmin,
                ..
            })
        ));
    }

    #[test]
    fn test_role_display() {
        assert_eq!(Role::DisableConsensus.to_string(), "DISABLE_CONSENSUS_ROLE");
    }
}

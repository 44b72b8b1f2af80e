//! The fleet plan (one operator-supplied address per role) and the
//! environment document generated from it.

use anyhow::Result;

use crate::domain::role::Role;

/// Fixed non-address assignments appended to every environment document.
pub const OPTION_A: &str = "Hi-C";
pub const OPTION_B: &str = "Tang";

/// One role paired with its address for this run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Target<'a> {
    pub role: Role,
    pub address: &'a str,
}

/// Exactly one address per role, collected before any remote action.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FleetPlan {
    addresses: [String; Role::COUNT],
}

impl FleetPlan {
    /// Builds a plan from addresses given in [`Role::ALL`] order.
    ///
    /// # Errors
    ///
    /// Returns an error if the number of addresses does not match the
    /// number of roles.
    pub fn from_ordered(addresses: Vec<String>) -> Result<Self> {
        let addresses: [String; Role::COUNT] = addresses
            .try_into()
            .map_err(|got: Vec<String>| {
                anyhow::anyhow!("expected {} addresses, got {}", Role::COUNT, got.len())
            })?;
        Ok(Self { addresses })
    }

    /// The address collected for `role`.
    #[must_use]
    pub fn address(&self, role: Role) -> &str {
        &self.addresses[role.index()]
    }

    /// Targets in the fixed provisioning order.
    pub fn targets(&self) -> impl Iterator<Item = Target<'_>> {
        Role::ALL.iter().map(|&role| Target {
            role,
            address: self.address(role),
        })
    }

    /// Renders the `.env` document pushed to every host.
    ///
    /// Line order is fixed and independent of collection order; addresses
    /// are substituted verbatim.
    #[must_use]
    pub fn render_env_document(&self) -> String {
        format!(
            "DB={}\nWORKER={}\nVOTE={}\nRESULT={}\nREDIS={}\nOPTION_A={OPTION_A}\nOPTION_B={OPTION_B}\n",
            self.address(Role::Database),
            self.address(Role::Worker),
            self.address(Role::Vote),
            self.address(Role::Results),
            self.address(Role::Redis),
        )
    }
}

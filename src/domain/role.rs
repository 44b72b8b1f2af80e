//! The five service roles of the voting-app fleet.

use std::fmt;

/// A logical service role. Every run provisions exactly one host per role,
/// in the order of [`Role::ALL`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Role {
    Vote,
    Results,
    Redis,
    Worker,
    Database,
}

impl Role {
    /// All roles, in the fixed order they are prompted for and provisioned.
    pub const ALL: [Role; 5] = [
        Role::Vote,
        Role::Results,
        Role::Redis,
        Role::Worker,
        Role::Database,
    ];

    /// Number of roles in a fleet.
    pub const COUNT: usize = Self::ALL.len();

    /// Label shown in prompts and progress lines.
    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            Role::Vote => "Vote",
            Role::Results => "Results",
            Role::Redis => "Redis",
            Role::Worker => "Worker",
            Role::Database => "Database",
        }
    }

    /// Hostname assigned to the role's machine, also the compose file infix.
    #[must_use]
    pub fn host_name(self) -> &'static str {
        match self {
            Role::Vote => "vote",
            Role::Results => "results",
            Role::Redis => "redis",
            Role::Worker => "worker",
            Role::Database => "database",
        }
    }

    /// Variable name under which the role's address appears in the
    /// generated environment document.
    #[must_use]
    pub fn env_key(self) -> &'static str {
        match self {
            Role::Vote => "VOTE",
            Role::Results => "RESULT",
            Role::Redis => "REDIS",
            Role::Worker => "WORKER",
            Role::Database => "DB",
        }
    }

    /// Position in [`Role::ALL`].
    #[must_use]
    pub fn index(self) -> usize {
        self as usize
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

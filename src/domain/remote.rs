//! Remote command strings executed on each host.
//!
//! The application directory and file layout are fixed by the voting-app
//! machine image; these strings are reproduced literally.

use crate::domain::role::Role;

/// Application directory on every host.
pub const APP_DIR: &str = "/home/nutanix/voting-app";

/// Environment file overwritten on every host.
pub const ENV_FILE: &str = "/home/nutanix/voting-app/.env";

/// Privileged hostname change to the role's name.
#[must_use]
pub fn set_hostname(role: Role) -> String {
    format!("sudo hostnamectl set-hostname {}", role.host_name())
}

/// Overwrites the environment file with `document` via a quoted heredoc,
/// so the document body is taken literally by the remote shell.
///
/// `document` must end with a newline; [`crate::domain::FleetPlan::render_env_document`]
/// guarantees this.
#[must_use]
pub fn write_env_file(document: &str) -> String {
    format!("cat > {ENV_FILE} << \"EOF\"\n{document}EOF")
}

/// Detached compose-up of the role's composition file, from the
/// application directory.
#[must_use]
pub fn compose_up(role: Role) -> String {
    format!(
        "cd {APP_DIR}/ && docker compose --file ./docker-compose.{}.yml up -d",
        role.host_name()
    )
}

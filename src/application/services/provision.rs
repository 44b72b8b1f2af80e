//! The provisioning service: credential negotiation and the per-target
//! pipeline, driven over the port traits so every path is testable.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

use crate::application::ports::{ProgressReporter, Prompter, RemoteSession, SessionOpener};
use crate::domain::{remote, ConnectError, FleetPlan, Target, TargetOutcome, TargetReport};

/// Process-wide credentials: collected once, reused for every target.
///
/// The password is requested from the operator at most once per run: it is
/// captured lazily on first need and memoized here for the remainder of
/// the run.
#[derive(Debug)]
pub struct Credentials {
    username: String,
    key_path: Option<PathBuf>,
    password: Option<String>,
}

impl Credentials {
    #[must_use]
    pub fn new(username: String, key_path: Option<PathBuf>) -> Self {
        Self {
            username,
            key_path,
            password: None,
        }
    }

    #[must_use]
    pub fn username(&self) -> &str {
        &self.username
    }

    /// The key path, if one was supplied or detected. May not exist on disk.
    #[must_use]
    pub fn key_path(&self) -> Option<&Path> {
        self.key_path.as_deref()
    }

    /// The key path if it currently exists on disk. Checked at use time,
    /// once per target, like the original tool.
    #[must_use]
    pub fn usable_key(&self) -> Option<PathBuf> {
        self.key_path
            .as_deref()
            .filter(|p| p.exists())
            .map(Path::to_path_buf)
    }

    /// Returns the memoized password, prompting for it on first use.
    ///
    /// # Errors
    ///
    /// Returns an error if the masked prompt cannot be read.
    pub fn ensure_password(&mut self, prompter: &impl Prompter) -> Result<String> {
        if self.password.is_none() {
            let password = prompter.secret("SSH Password").context("reading SSH password")?;
            self.password = Some(password);
        }
        Ok(self.password.clone().unwrap_or_default())
    }
}

/// Result of one session-open attempt: either a session, or a per-target
/// failure that must not abort the run.
enum OpenOutcome<S> {
    Opened(S),
    Failed(String),
}

/// Drives the end-to-end bootstrap of every target, continuing past
/// individual failures.
pub struct Provisioner<'a, O, P, R>
where
    O: SessionOpener,
    P: Prompter,
    R: ProgressReporter,
{
    opener: &'a O,
    prompter: &'a P,
    reporter: &'a R,
}

impl<'a, O, P, R> Provisioner<'a, O, P, R>
where
    O: SessionOpener,
    P: Prompter,
    R: ProgressReporter,
{
    #[must_use]
    pub fn new(opener: &'a O, prompter: &'a P, reporter: &'a R) -> Self {
        Self {
            opener,
            prompter,
            reporter,
        }
    }

    /// Provisions every target in fixed role order, one at a time.
    ///
    /// A target's failure is recorded in its report and never propagated;
    /// the returned list always has one entry per role.
    ///
    /// # Errors
    ///
    /// Returns an error only if the password prompt itself cannot be read.
    pub async fn provision_fleet(
        &self,
        plan: &FleetPlan,
        creds: &mut Credentials,
    ) -> Result<Vec<TargetReport>> {
        let env_document = plan.render_env_document();
        let mut reports = Vec::with_capacity(crate::domain::Role::COUNT);

        for target in plan.targets() {
            self.reporter
                .step(&format!("Connecting to {} ({})...", target.address, target.role));
            let outcome = self.provision_target(&target, &env_document, creds).await?;
            match &outcome {
                TargetOutcome::Completed => self.reporter.success(&format!(
                    "Completed setup for {} ({})",
                    target.role, target.address
                )),
                TargetOutcome::Failed(detail) => self.reporter.error(&format!(
                    "Failed to provision {} ({}): {detail}",
                    target.role, target.address
                )),
            }
            reports.push(TargetReport {
                role: target.role,
                address: target.address.to_string(),
                outcome,
            });
        }

        Ok(reports)
    }

    async fn provision_target(
        &self,
        target: &Target<'_>,
        env_document: &str,
        creds: &mut Credentials,
    ) -> Result<TargetOutcome> {
        let mut session = match self.open_session(target, creds).await? {
            OpenOutcome::Opened(session) => session,
            OpenOutcome::Failed(detail) => return Ok(TargetOutcome::Failed(detail)),
        };

        let result = self.run_actions(&mut session, target, env_document).await;

        // Release the session on every path before reporting the outcome.
        if let Err(e) = session.close().await {
            self.reporter
                .warn(&format!("closing session to {}: {e:#}", target.address));
        }

        Ok(match result {
            Ok(()) => TargetOutcome::Completed,
            Err(e) => TargetOutcome::Failed(format!("{e:#}")),
        })
    }

    /// Opens a session per the credential-negotiation rules: key first when
    /// usable, password fallback on rejection, password prompted at most
    /// once per run.
    async fn open_session(
        &self,
        target: &Target<'_>,
        creds: &mut Credentials,
    ) -> Result<OpenOutcome<O::Session>> {
        let username = creds.username().to_string();

        if let Some(key_path) = creds.usable_key() {
            self.reporter.step(&format!(
                "Attempting SSH key authentication using {}",
                key_path.display()
            ));
            match self
                .opener
                .open_with_key(target.address, &username, &key_path)
                .await
            {
                Ok(session) => return Ok(OpenOutcome::Opened(session)),
                Err(ConnectError::AuthRejected) => {
                    self.reporter
                        .warn("SSH key authentication failed, falling back to password");
                }
                Err(ConnectError::Other(e)) => return Ok(OpenOutcome::Failed(format!("{e:#}"))),
            }
        }

        let password = creds.ensure_password(self.prompter)?;
        Ok(
            match self
                .opener
                .open_with_password(target.address, &username, &password)
                .await
            {
                Ok(session) => OpenOutcome::Opened(session),
                Err(ConnectError::AuthRejected) => {
                    OpenOutcome::Failed("password authentication rejected".to_string())
                }
                Err(ConnectError::Other(e)) => OpenOutcome::Failed(format!("{e:#}")),
            },
        )
    }

    /// The three fixed remote actions. Non-empty stderr is reported but
    /// never aborts the remaining actions for the target.
    async fn run_actions(
        &self,
        session: &mut O::Session,
        target: &Target<'_>,
        env_document: &str,
    ) -> Result<()> {
        let host = target.role.host_name();

        self.reporter.step(&format!("Setting hostname to '{host}'..."));
        let output = session
            .exec(&remote::set_hostname(target.role))
            .await
            .context("setting hostname")?;
        if !output.stderr.trim().is_empty() {
            self.reporter.warn(output.stderr.trim());
        }

        self.reporter.step("Updating .env file with IP addresses...");
        let output = session
            .exec(&remote::write_env_file(env_document))
            .await
            .context("writing .env file")?;
        if !output.stderr.trim().is_empty() {
            self.reporter
                .warn(&format!("updating .env: {}", output.stderr.trim()));
        }

        self.reporter.step(&format!("Running docker compose for {host}..."));
        let output = session
            .exec(&remote::compose_up(target.role))
            .await
            .context("running docker compose")?;
        if !output.stdout.trim().is_empty() {
            self.reporter.info(output.stdout.trim());
        }
        if !output.stderr.trim().is_empty() {
            self.reporter.error(output.stderr.trim());
        }

        Ok(())
    }
}

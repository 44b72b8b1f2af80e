//! `votefleet provision` — interactive bootstrap of the whole fleet.
//!
//! Collects all operator input up front (addresses, username, key path,
//! and the password when no usable key exists), then hands the plan to
//! the provisioning service. Input validation failures are fatal; from
//! the first connection onward, failures are per-target.

use std::path::Path;

use anyhow::Result;

use crate::application::ports::{ProgressReporter, Prompter, SessionOpener};
use crate::application::services::provision::{Credentials, Provisioner};
use crate::domain::{FleetPlan, InputError, Role, TargetOutcome, TargetReport};
use crate::infra::keys::{self, KeyResolution};
use crate::infra::prompt::DialoguerPrompter;
use crate::infra::ssh::RusshOpener;
use crate::output::reporter::TerminalReporter;
use crate::output::OutputContext;

/// Run `votefleet provision` against the real terminal and SSH stack.
///
/// # Errors
///
/// Returns an error on empty required input or a failed prompt read;
/// per-target provisioning failures are reported but never propagated.
pub async fn run(ctx: &OutputContext) -> Result<()> {
    let home =
        dirs::home_dir().ok_or_else(|| anyhow::anyhow!("cannot determine home directory"))?;
    let prompter = DialoguerPrompter;
    let opener = RusshOpener::new();
    let reporter = TerminalReporter::new(ctx);
    run_with(&prompter, &opener, &reporter, &home).await?;
    Ok(())
}

/// The full provision flow over injectable ports.
///
/// # Errors
///
/// Returns an error before any session is opened if a required input is
/// empty, or if a prompt cannot be read.
pub async fn run_with(
    prompter: &impl Prompter,
    opener: &impl SessionOpener,
    reporter: &impl ProgressReporter,
    home: &Path,
) -> Result<Vec<TargetReport>> {
    let plan = collect_plan(prompter, reporter)?;
    let mut creds = collect_credentials(prompter, reporter, home)?;

    let provisioner = Provisioner::new(opener, prompter, reporter);
    let reports = provisioner.provision_fleet(&plan, &mut creds).await?;

    report_summary(reporter, &reports);
    Ok(reports)
}

/// Prompt for one address per role, in fixed order. Empty input is fatal.
fn collect_plan(
    prompter: &impl Prompter,
    reporter: &impl ProgressReporter,
) -> Result<FleetPlan> {
    reporter.header("Enter IP addresses for each service:");
    let mut addresses = Vec::with_capacity(Role::COUNT);
    for role in Role::ALL {
        let address = prompter.input(role.label())?;
        if address.is_empty() {
            return Err(InputError::EmptyAddress(role).into());
        }
        addresses.push(address);
    }
    FleetPlan::from_ordered(addresses)
}

/// Prompt for the username and key path, and capture the password up front
/// when no usable key exists.
fn collect_credentials(
    prompter: &impl Prompter,
    reporter: &impl ProgressReporter,
    home: &Path,
) -> Result<Credentials> {
    let username = prompter.input("SSH Username")?;
    if username.is_empty() {
        return Err(InputError::EmptyUsername.into());
    }

    let answer = prompter.input("SSH Private Key Path (press Enter to auto-detect)")?;
    let key_path = match keys::resolve_key_path(&answer, home) {
        KeyResolution::Supplied(path) => Some(path),
        KeyResolution::Detected(path) => {
            reporter.info(&format!("Found SSH key: {}", path.display()));
            Some(path)
        }
        KeyResolution::None => None,
    };

    let mut creds = Credentials::new(username, key_path);

    // Without a usable key every connection needs the password, so capture
    // it once now, before the first connection attempt.
    if creds.usable_key().is_none() {
        match creds.key_path() {
            Some(path) => reporter.warn(&format!("SSH key not found at {}", path.display())),
            None => reporter.warn("No SSH keys found in ~/.ssh/"),
        }
        creds.ensure_password(prompter)?;
    }

    Ok(creds)
}

fn report_summary(reporter: &impl ProgressReporter, reports: &[TargetReport]) {
    let completed = reports.iter().filter(|r| r.completed()).count();
    reporter.header(&format!("{completed}/{} hosts provisioned", reports.len()));
    for report in reports {
        match &report.outcome {
            TargetOutcome::Completed => {
                reporter.success(&format!("{} ({})", report.role, report.address));
            }
            TargetOutcome::Failed(detail) => {
                reporter.error(&format!("{} ({}): {detail}", report.role, report.address));
            }
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::cell::{Cell, RefCell};
    use std::collections::VecDeque;
    use std::rc::Rc;

    use anyhow::Result;

    use super::*;
    use crate::application::ports::{ExecOutput, RemoteSession};
    use crate::domain::ConnectError;

    // -----------------------------------------------------------------------
    // Port doubles
    // -----------------------------------------------------------------------

    struct SilentReporter;

    impl ProgressReporter for SilentReporter {
        fn header(&self, _: &str) {}
        fn step(&self, _: &str) {}
        fn info(&self, _: &str) {}
        fn success(&self, _: &str) {}
        fn warn(&self, _: &str) {}
        fn error(&self, _: &str) {}
    }

    struct ScriptedPrompter {
        inputs: RefCell<VecDeque<String>>,
        secrets: RefCell<VecDeque<String>>,
        secret_prompts: Cell<usize>,
    }

    impl ScriptedPrompter {
        fn new(inputs: &[&str], secrets: &[&str]) -> Self {
            Self {
                inputs: RefCell::new(inputs.iter().map(ToString::to_string).collect()),
                secrets: RefCell::new(secrets.iter().map(ToString::to_string).collect()),
                secret_prompts: Cell::new(0),
            }
        }
    }

    impl Prompter for ScriptedPrompter {
        fn input(&self, label: &str) -> Result<String> {
            self.inputs
                .borrow_mut()
                .pop_front()
                .ok_or_else(|| anyhow::anyhow!("no scripted answer for {label}"))
        }

        fn secret(&self, label: &str) -> Result<String> {
            self.secret_prompts.set(self.secret_prompts.get() + 1);
            self.secrets
                .borrow_mut()
                .pop_front()
                .ok_or_else(|| anyhow::anyhow!("no scripted secret for {label}"))
        }
    }

    /// Proves that input validation happens before any connection attempt.
    struct PanicOpener;

    impl SessionOpener for PanicOpener {
        type Session = NullSession;

        async fn open_with_key(
            &self,
            _: &str,
            _: &str,
            _: &Path,
        ) -> Result<NullSession, ConnectError> {
            unreachable!("no session may be opened after an input error")
        }

        async fn open_with_password(
            &self,
            _: &str,
            _: &str,
            _: &str,
        ) -> Result<NullSession, ConnectError> {
            unreachable!("no session may be opened after an input error")
        }
    }

    struct NullSession;

    impl RemoteSession for NullSession {
        async fn exec(&mut self, _: &str) -> Result<ExecOutput> {
            Ok(ExecOutput::default())
        }
        async fn close(&mut self) -> Result<()> {
            Ok(())
        }
    }

    #[derive(Default)]
    struct OpenLog {
        key_opens: usize,
        password_opens: usize,
    }

    struct RecordingOpener {
        log: Rc<RefCell<OpenLog>>,
        unreachable: Option<&'static str>,
    }

    impl SessionOpener for RecordingOpener {
        type Session = NullSession;

        async fn open_with_key(
            &self,
            address: &str,
            _: &str,
            _: &Path,
        ) -> Result<NullSession, ConnectError> {
            self.log.borrow_mut().key_opens += 1;
            if self.unreachable == Some(address) {
                return Err(ConnectError::Other(anyhow::anyhow!("no route to host")));
            }
            Ok(NullSession)
        }

        async fn open_with_password(
            &self,
            address: &str,
            _: &str,
            _: &str,
        ) -> Result<NullSession, ConnectError> {
            self.log.borrow_mut().password_opens += 1;
            if self.unreachable == Some(address) {
                return Err(ConnectError::Other(anyhow::anyhow!("no route to host")));
            }
            Ok(NullSession)
        }
    }

    const ADDRESSES: [&str; 5] = ["10.0.0.1", "10.0.0.2", "10.0.0.3", "10.0.0.4", "10.0.0.5"];

    fn full_script(key_answer: &str) -> Vec<&str> {
        let mut inputs: Vec<&str> = ADDRESSES.to_vec();
        inputs.push("nutanix");
        inputs.push(key_answer);
        inputs
    }

    // -----------------------------------------------------------------------
    // Fatal input validation
    // -----------------------------------------------------------------------

    #[tokio::test]
    async fn test_empty_first_address_is_fatal_before_any_connection() {
        let home = tempfile::TempDir::new().unwrap();
        let prompter = ScriptedPrompter::new(&[""], &[]);
        let result = run_with(&prompter, &PanicOpener, &SilentReporter, home.path()).await;
        let err = result.unwrap_err().to_string();
        assert!(err.contains("Vote"), "got: {err}");
    }

    #[tokio::test]
    async fn test_empty_later_address_names_its_role() {
        let home = tempfile::TempDir::new().unwrap();
        let prompter = ScriptedPrompter::new(&["10.0.0.1", "10.0.0.2", ""], &[]);
        let result = run_with(&prompter, &PanicOpener, &SilentReporter, home.path()).await;
        let err = result.unwrap_err().to_string();
        assert!(err.contains("Redis"), "got: {err}");
    }

    #[tokio::test]
    async fn test_empty_username_is_fatal_before_any_connection() {
        let home = tempfile::TempDir::new().unwrap();
        let mut inputs: Vec<&str> = ADDRESSES.to_vec();
        inputs.push("");
        let prompter = ScriptedPrompter::new(&inputs, &[]);
        let result = run_with(&prompter, &PanicOpener, &SilentReporter, home.path()).await;
        let err = result.unwrap_err().to_string();
        assert!(err.contains("Username"), "got: {err}");
    }

    // -----------------------------------------------------------------------
    // Credential resolution
    // -----------------------------------------------------------------------

    #[tokio::test]
    async fn test_supplied_missing_key_prompts_password_once_up_front() {
        let home = tempfile::TempDir::new().unwrap();
        let log = Rc::new(RefCell::new(OpenLog::default()));
        let opener = RecordingOpener {
            log: Rc::clone(&log),
            unreachable: None,
        };
        let prompter = ScriptedPrompter::new(&full_script("/nonexistent/deploy_key"), &["pw"]);

        let reports = run_with(&prompter, &opener, &SilentReporter, home.path())
            .await
            .unwrap();

        assert_eq!(prompter.secret_prompts.get(), 1);
        assert_eq!(log.borrow().key_opens, 0);
        assert_eq!(log.borrow().password_opens, Role::COUNT);
        assert!(reports.iter().all(TargetReport::completed));
    }

    #[tokio::test]
    async fn test_no_key_anywhere_prompts_password_once_before_first_connect() {
        let home = tempfile::TempDir::new().unwrap();
        let log = Rc::new(RefCell::new(OpenLog::default()));
        let opener = RecordingOpener {
            log: Rc::clone(&log),
            unreachable: None,
        };
        let prompter = ScriptedPrompter::new(&full_script(""), &["pw"]);

        run_with(&prompter, &opener, &SilentReporter, home.path())
            .await
            .unwrap();

        assert_eq!(prompter.secret_prompts.get(), 1);
        assert_eq!(log.borrow().key_opens, 0);
        assert_eq!(log.borrow().password_opens, Role::COUNT);
    }

    #[tokio::test]
    async fn test_detected_key_skips_the_password_prompt() {
        let home = tempfile::TempDir::new().unwrap();
        std::fs::create_dir_all(home.path().join(".ssh")).unwrap();
        std::fs::write(home.path().join(".ssh/id_rsa"), b"key material").unwrap();

        let log = Rc::new(RefCell::new(OpenLog::default()));
        let opener = RecordingOpener {
            log: Rc::clone(&log),
            unreachable: None,
        };
        let prompter = ScriptedPrompter::new(&full_script(""), &[]);

        let reports = run_with(&prompter, &opener, &SilentReporter, home.path())
            .await
            .unwrap();

        assert_eq!(prompter.secret_prompts.get(), 0);
        assert_eq!(log.borrow().key_opens, Role::COUNT);
        assert_eq!(log.borrow().password_opens, 0);
        assert!(reports.iter().all(TargetReport::completed));
    }

    // -----------------------------------------------------------------------
    // Per-target failure is not fatal
    // -----------------------------------------------------------------------

    #[tokio::test]
    async fn test_unreachable_worker_still_returns_ok() {
        let home = tempfile::TempDir::new().unwrap();
        let log = Rc::new(RefCell::new(OpenLog::default()));
        let opener = RecordingOpener {
            log: Rc::clone(&log),
            unreachable: Some("10.0.0.4"), // Worker
        };
        let prompter = ScriptedPrompter::new(&full_script(""), &["pw"]);

        let reports = run_with(&prompter, &opener, &SilentReporter, home.path())
            .await
            .unwrap();

        let completed = reports.iter().filter(|r| r.completed()).count();
        assert_eq!(completed, Role::COUNT - 1);
        let worker = reports.iter().find(|r| r.role == Role::Worker).unwrap();
        assert!(!worker.completed());
    }
}

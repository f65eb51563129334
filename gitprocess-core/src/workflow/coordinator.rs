//! Coordinator for one branch creation session
//!
//! The session runs strictly in order:
//! 1. Ask for the repository name and URL
//! 2. Clone the repository
//! 3. Check out the baseline branch
//! 4. Scan local branches for unmerged work and ask whether to continue
//! 5. Ask for the new branch name and create it from the baseline
//! 6. Copy branch policies from the baseline to the new branch
//!
//! Any failure before step 6 aborts the session. Policy copy failures are
//! reported as warnings and never undo the new branch.

use std::path::PathBuf;

use tracing::{debug, info, warn};

use super::copier::{CopySummary, PolicyCopier};
use crate::config::WorkflowConfig;
use crate::console::Console;
use crate::git::GitRepo;
use crate::{Error, Result};

/// Step the session is currently in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum WorkflowStep {
    /// Asking for the repository
    #[default]
    CollectRepository,
    /// Cloning the repository
    Clone,
    /// Checking out the baseline branch
    CheckoutBaseline,
    /// Looking for unmerged branches
    ScanBranches,
    /// Asking for the new branch name
    CollectBranchName,
    /// Creating the new branch
    CreateBranch,
    /// Copying branch policies
    CopyPolicies,
    /// Session finished
    Complete,
}

impl WorkflowStep {
    /// Get a human-readable description
    pub fn description(&self) -> &'static str {
        match self {
            WorkflowStep::CollectRepository => "Collecting repository details",
            WorkflowStep::Clone => "Cloning repository",
            WorkflowStep::CheckoutBaseline => "Checking out baseline branch",
            WorkflowStep::ScanBranches => "Checking for unmerged branches",
            WorkflowStep::CollectBranchName => "Collecting new branch name",
            WorkflowStep::CreateBranch => "Creating branch",
            WorkflowStep::CopyPolicies => "Copying branch policies",
            WorkflowStep::Complete => "Session complete",
        }
    }
}

/// How a session ended
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// The new branch was created
    Completed {
        /// Name of the new branch
        branch: String,
        /// Policy copy results, `None` if the copy failed outright
        policies: Option<CopySummary>,
    },
    /// The user chose not to continue past the unmerged branch warning
    Halted,
}

/// Drives one interactive branch creation session
pub struct Coordinator<'a> {
    console: &'a mut dyn Console,
    copier: &'a dyn PolicyCopier,
    workflow: WorkflowConfig,
    workdir: PathBuf,
    step: WorkflowStep,
}

impl<'a> Coordinator<'a> {
    /// Create a coordinator cloning into the current directory
    pub fn new(
        console: &'a mut dyn Console,
        copier: &'a dyn PolicyCopier,
        workflow: WorkflowConfig,
    ) -> Self {
        Self {
            console,
            copier,
            workflow,
            workdir: PathBuf::from("."),
            step: WorkflowStep::default(),
        }
    }

    /// Clone into `workdir` instead of the current directory
    pub fn with_workdir(mut self, workdir: impl Into<PathBuf>) -> Self {
        self.workdir = workdir.into();
        self
    }

    /// Get the current step
    pub fn step(&self) -> WorkflowStep {
        self.step
    }

    fn enter(&mut self, step: WorkflowStep) {
        debug!(from = ?self.step, to = ?step, "{}", step.description());
        self.step = step;
    }

    /// Run the session to completion
    pub async fn run(&mut self) -> Result<Outcome> {
        let baseline = self.workflow.baseline_branch.clone();

        self.enter(WorkflowStep::CollectRepository);
        let repo_name = self.ask_required(
            "Enter the repository name (e.g., LOM_ABC): ",
            "Repository name cannot be empty",
        )?;
        let repo_url = self.ask_required(
            "Enter the repository URL: ",
            "Repository URL cannot be empty",
        )?;

        self.enter(WorkflowStep::Clone);
        self.console
            .say(&format!("\nCloning repository '{}'...", repo_name))?;
        let repo = GitRepo::clone_from_url(&repo_url, self.workdir.join(&repo_name))?;

        self.enter(WorkflowStep::CheckoutBaseline);
        self.console
            .say(&format!("\nSwitching to {} branch...", baseline))?;
        repo.checkout_tracking(&self.workflow.remote, &baseline)?;

        self.enter(WorkflowStep::ScanBranches);
        self.console.say("\nChecking for unmerged branches...")?;
        let scan = repo.scan_unmerged(&baseline)?;

        for skipped in &scan.skipped {
            self.console.say(&format!(
                "Warning: could not check branch '{}': {}",
                skipped.name, skipped.reason
            ))?;
        }

        if !scan.unmerged.is_empty() {
            self.console.say("\nFound unmerged branches:")?;
            for branch in &scan.unmerged {
                self.console.say(&format!("  - {}", branch))?;
            }

            let proceed = self
                .console
                .confirm("\nDo you want to continue with creating a new branch? (y/n): ")?;
            if !proceed {
                info!(unmerged = scan.unmerged.len(), "Session stopped by user");
                self.console.say("Process stopped by user.")?;
                return Ok(Outcome::Halted);
            }
        }

        self.enter(WorkflowStep::CollectBranchName);
        let branch = self.ask_required(
            "\nEnter the new branch name: ",
            "Branch name cannot be empty",
        )?;

        self.enter(WorkflowStep::CreateBranch);
        self.console
            .say(&format!("\nCreating new branch '{}'...", branch))?;
        repo.create_branch(&branch)?;

        self.enter(WorkflowStep::CopyPolicies);
        self.console
            .say(&format!("\nCopying branch policies from {}...", baseline))?;
        let policies = match self
            .copier
            .copy_policies(&mut *self.console, &repo_name, &baseline, &branch)
            .await
        {
            Ok(summary) => {
                self.report_policies(&summary, &baseline)?;
                Some(summary)
            }
            Err(e) => {
                warn!(branch = %branch, "Policy copy failed: {}", e);
                self.console
                    .say(&format!("Warning: Could not copy branch policies: {}", e))?;
                None
            }
        };

        self.enter(WorkflowStep::Complete);
        self.console
            .say(&format!("\n✓ Successfully created branch '{}'", branch))?;

        Ok(Outcome::Completed { branch, policies })
    }

    fn ask_required(&mut self, prompt: &str, empty_message: &str) -> Result<String> {
        let value = self.console.ask(prompt)?;
        if value.is_empty() {
            return Err(Error::Input(empty_message.to_string()));
        }
        Ok(value)
    }

    fn report_policies(&mut self, summary: &CopySummary, source: &str) -> Result<()> {
        if summary.found() == 0 {
            return self
                .console
                .say(&format!("No policies found on branch '{}'", source));
        }

        for copy in &summary.copies {
            match copy.error {
                None => self.console.say(&format!("✓ Copied policy: {}", copy.policy))?,
                Some(ref error) => self.console.say(&format!(
                    "Warning: Failed to copy policy '{}': {}",
                    copy.policy, error
                ))?,
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::console::LineConsole;
    use crate::git::fixtures::{commit, Origin};
    use crate::workflow::copier::PolicyCopy;
    use async_trait::async_trait;
    use std::io::Cursor;
    use std::sync::Mutex;
    use tempfile::TempDir;

    type Call = (String, String, String);

    /// Records calls and answers with a canned result
    struct RecordingCopier {
        calls: Mutex<Vec<Call>>,
        /// `None` fails the whole copy
        summary: Option<CopySummary>,
    }

    impl RecordingCopier {
        fn new(fail: bool) -> Self {
            if fail {
                Self::answering(None)
            } else {
                Self::answering(Some(CopySummary {
                    copies: vec![copy("Minimum number of reviewers", None)],
                }))
            }
        }

        fn answering(summary: Option<CopySummary>) -> Self {
            Self {
                calls: Mutex::new(Vec::new()),
                summary,
            }
        }

        fn calls(&self) -> Vec<Call> {
            self.calls.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl PolicyCopier for RecordingCopier {
        async fn copy_policies(
            &self,
            _console: &mut dyn Console,
            repository: &str,
            source_branch: &str,
            target_branch: &str,
        ) -> Result<CopySummary> {
            self.calls.lock().unwrap().push((
                repository.to_string(),
                source_branch.to_string(),
                target_branch.to_string(),
            ));

            self.summary
                .clone()
                .ok_or_else(|| Error::Policy("missing required Azure DevOps configuration".into()))
        }
    }

    fn copy(policy: &str, error: Option<&str>) -> PolicyCopy {
        PolicyCopy {
            policy: policy.to_string(),
            error: error.map(str::to_string),
        }
    }

    fn console(input: String) -> LineConsole<Cursor<Vec<u8>>, Vec<u8>> {
        LineConsole::new(Cursor::new(input.into_bytes()), Vec::new())
    }

    fn output(console: &LineConsole<Cursor<Vec<u8>>, Vec<u8>>) -> String {
        String::from_utf8_lossy(console.output()).to_string()
    }

    /// Origin whose default branch carries work not merged into develop
    fn origin_with_unmerged_head() -> Origin {
        let origin = Origin::new();
        commit(&origin.repo, "refs/heads/feature/wip", &[origin.develop], "wip");
        origin.repo.set_head("refs/heads/feature/wip").unwrap();
        origin
    }

    #[tokio::test]
    async fn test_declining_continuation_creates_nothing() {
        let origin = origin_with_unmerged_head();
        let workdir = TempDir::new().unwrap();
        let copier = RecordingCopier::new(false);
        let mut console = console(format!("LOM_ABC\n{}\nn\nfeature/x\n", origin.url()));

        let outcome = Coordinator::new(&mut console, &copier, WorkflowConfig::default())
            .with_workdir(workdir.path())
            .run()
            .await
            .unwrap();

        assert_eq!(outcome, Outcome::Halted);
        assert!(copier.calls().is_empty());

        let out = output(&console);
        assert!(out.contains("  - feature/wip"));
        assert!(out.contains("Process stopped by user."));

        let clone = GitRepo::open(workdir.path().join("LOM_ABC")).unwrap();
        let mut branches = clone.list_local_branches().unwrap();
        branches.sort();
        assert_eq!(branches, vec!["develop", "feature/wip"]);
    }

    #[tokio::test]
    async fn test_confirming_continuation_creates_branch_and_copies() {
        let origin = origin_with_unmerged_head();
        let workdir = TempDir::new().unwrap();
        let copier = RecordingCopier::new(false);
        let mut console = console(format!("LOM_ABC\n{}\nYes\nfeature/x\n", origin.url()));

        let mut coordinator = Coordinator::new(&mut console, &copier, WorkflowConfig::default())
            .with_workdir(workdir.path());
        let outcome = coordinator.run().await.unwrap();
        assert_eq!(coordinator.step(), WorkflowStep::Complete);

        match outcome {
            Outcome::Completed { branch, policies } => {
                assert_eq!(branch, "feature/x");
                assert_eq!(policies.unwrap().copied(), 1);
            }
            other => panic!("unexpected outcome: {:?}", other),
        }

        assert_eq!(
            copier.calls(),
            vec![(
                "LOM_ABC".to_string(),
                "develop".to_string(),
                "feature/x".to_string()
            )]
        );

        let clone = GitRepo::open(workdir.path().join("LOM_ABC")).unwrap();
        assert_eq!(clone.current_branch().unwrap().as_deref(), Some("feature/x"));
        assert_eq!(clone.resolve_commit("feature/x").unwrap(), origin.develop);

        let out = output(&console);
        assert!(out.contains("✓ Copied policy: Minimum number of reviewers"));
        assert!(out.contains("Successfully created branch 'feature/x'"));
    }

    #[tokio::test]
    async fn test_no_unmerged_branches_skips_confirmation() {
        let origin = Origin::new();
        let workdir = TempDir::new().unwrap();
        let copier = RecordingCopier::new(false);
        let mut console = console(format!("LOM_ABC\n{}\nrelease/1.0\n", origin.url()));

        let outcome = Coordinator::new(&mut console, &copier, WorkflowConfig::default())
            .with_workdir(workdir.path())
            .run()
            .await
            .unwrap();

        assert!(matches!(outcome, Outcome::Completed { ref branch, .. } if branch == "release/1.0"));
        assert!(!output(&console).contains("Do you want to continue"));
    }

    #[tokio::test]
    async fn test_policy_failure_is_soft() {
        let origin = Origin::new();
        let workdir = TempDir::new().unwrap();
        let copier = RecordingCopier::new(true);
        let mut console = console(format!("LOM_ABC\n{}\nfeature/x\n", origin.url()));

        let outcome = Coordinator::new(&mut console, &copier, WorkflowConfig::default())
            .with_workdir(workdir.path())
            .run()
            .await
            .unwrap();

        assert_eq!(
            outcome,
            Outcome::Completed {
                branch: "feature/x".to_string(),
                policies: None
            }
        );

        let out = output(&console);
        assert!(out.contains("Warning: Could not copy branch policies"));
        assert!(out.contains("Successfully created branch 'feature/x'"));

        let clone = GitRepo::open(workdir.path().join("LOM_ABC")).unwrap();
        assert!(clone.resolve_commit("feature/x").is_ok());
    }

    #[tokio::test]
    async fn test_empty_repository_name_aborts() {
        let workdir = TempDir::new().unwrap();
        let copier = RecordingCopier::new(false);
        let mut console = console("\n".to_string());

        let err = Coordinator::new(&mut console, &copier, WorkflowConfig::default())
            .with_workdir(workdir.path())
            .run()
            .await
            .unwrap_err();

        assert!(matches!(err, Error::Input(_)));
        assert_eq!(err.to_string(), "Repository name cannot be empty");
        // Reported once, by whoever handles the error
        assert!(!output(&console).contains("cannot be empty"));
        assert_eq!(std::fs::read_dir(workdir.path()).unwrap().count(), 0);
    }

    #[tokio::test]
    async fn test_empty_branch_name_aborts() {
        let origin = Origin::new();
        let workdir = TempDir::new().unwrap();
        let copier = RecordingCopier::new(false);
        let mut console = console(format!("LOM_ABC\n{}\n\n", origin.url()));

        let mut coordinator = Coordinator::new(&mut console, &copier, WorkflowConfig::default())
            .with_workdir(workdir.path());
        let err = coordinator.run().await.unwrap_err();

        assert!(err.to_string().contains("Branch name cannot be empty"));
        assert_eq!(coordinator.step(), WorkflowStep::CollectBranchName);
        assert!(copier.calls().is_empty());
    }

    #[tokio::test]
    async fn test_clone_failure_aborts() {
        let workdir = TempDir::new().unwrap();
        let missing = workdir.path().join("nowhere");
        let copier = RecordingCopier::new(false);
        let mut console = console(format!("LOM_ABC\n{}\n", missing.display()));

        let mut coordinator = Coordinator::new(&mut console, &copier, WorkflowConfig::default())
            .with_workdir(workdir.path());
        let err = coordinator.run().await.unwrap_err();

        assert!(matches!(err, Error::Git(_)));
        assert_eq!(coordinator.step(), WorkflowStep::Clone);
    }

    #[tokio::test]
    async fn test_missing_baseline_aborts() {
        let origin = Origin::new();
        let workdir = TempDir::new().unwrap();
        let copier = RecordingCopier::new(false);
        let mut console = console(format!("LOM_ABC\n{}\n", origin.url()));
        let workflow = WorkflowConfig {
            baseline_branch: "integration".to_string(),
            ..WorkflowConfig::default()
        };

        let mut coordinator =
            Coordinator::new(&mut console, &copier, workflow).with_workdir(workdir.path());
        let err = coordinator.run().await.unwrap_err();

        assert!(err.to_string().contains("Branch 'integration' not found"));
        assert_eq!(coordinator.step(), WorkflowStep::CheckoutBaseline);
    }

    #[tokio::test]
    async fn test_no_policies_on_baseline_is_reported() {
        let origin = Origin::new();
        let workdir = TempDir::new().unwrap();
        let copier = RecordingCopier::answering(Some(CopySummary::default()));
        let mut console = console(format!("LOM_ABC\n{}\nfeature/x\n", origin.url()));

        let outcome = Coordinator::new(&mut console, &copier, WorkflowConfig::default())
            .with_workdir(workdir.path())
            .run()
            .await
            .unwrap();

        assert_eq!(
            outcome,
            Outcome::Completed {
                branch: "feature/x".to_string(),
                policies: Some(CopySummary::default())
            }
        );

        let out = output(&console);
        assert!(out.contains("No policies found on branch 'develop'"));
        assert!(!out.contains("Copied policy"));
        assert!(out.contains("Successfully created branch 'feature/x'"));
    }

    #[tokio::test]
    async fn test_partial_policy_failure_reports_each_policy() {
        let origin = Origin::new();
        let workdir = TempDir::new().unwrap();
        let copier = RecordingCopier::answering(Some(CopySummary {
            copies: vec![
                copy("Minimum number of reviewers", None),
                copy("Build", Some("400 Bad Request: invalid settings")),
                copy("Comment requirements", None),
            ],
        }));
        let mut console = console(format!("LOM_ABC\n{}\nfeature/x\n", origin.url()));

        let outcome = Coordinator::new(&mut console, &copier, WorkflowConfig::default())
            .with_workdir(workdir.path())
            .run()
            .await
            .unwrap();

        match outcome {
            Outcome::Completed { policies, .. } => {
                let policies = policies.unwrap();
                assert_eq!(policies.copied(), 2);
                assert_eq!(policies.failed(), 1);
            }
            other => panic!("unexpected outcome: {:?}", other),
        }

        let out = output(&console);
        let reviewers = out.find("✓ Copied policy: Minimum number of reviewers").unwrap();
        let build = out
            .find("Warning: Failed to copy policy 'Build': 400 Bad Request: invalid settings")
            .unwrap();
        let comments = out.find("✓ Copied policy: Comment requirements").unwrap();
        let done = out.find("Successfully created branch 'feature/x'").unwrap();
        assert!(reviewers < build && build < comments && comments < done);
        assert!(!out.contains("No policies found"));
    }
}

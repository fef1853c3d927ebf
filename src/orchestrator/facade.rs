// ToolOrchestrator - probe/run/plan/execute per tool family

use super::error::{OrchestratorError, Result};
use super::family::ToolFamily;
use super::types::{ExecuteRequest, PlanRequest, PlanResult, RunRequest, ToolRunResult};
use crate::classify::{RuleTable, Status};
use crate::config::{ConfigError, OrchestratorConfig, Phase, ToolConfig, ToolsFile, load_tools_file};
use crate::diff;
use crate::probe::{ProbeResult, ToolProbe, probe_input_path};
use crate::process::{
    CancelToken, OutputSink, ProcessResult, ProcessRunner, ProcessTerminator, default_terminator,
};
use crate::safety::{self, GateDecision, GateRequest, SafetyPolicy};
use crate::staging::{CopyFirstStaging, StagingError};
use crate::template::{self, Invocation, Placeholder, TemplateVars};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// A configured tool ready for a given phase
struct Prepared<'a> {
    config: &'a ToolConfig,
    executable: &'a Path,
    template: &'a [String],
}

/// Facade over the whole orchestration pipeline.
///
/// Owns the parsed tool configuration, so nothing is cached globally and two
/// orchestrators never share state.
pub struct ToolOrchestrator {
    config: OrchestratorConfig,
    tools: ToolsFile,
    families: BTreeMap<String, ToolFamily>,
    runner: ProcessRunner,
}

impl ToolOrchestrator {
    pub fn new(config: OrchestratorConfig, tools: ToolsFile) -> Self {
        Self::with_terminator(config, tools, default_terminator())
    }

    /// Use a specific process terminator (tests pass fakes here)
    pub fn with_terminator(
        config: OrchestratorConfig,
        tools: ToolsFile,
        terminator: Arc<dyn ProcessTerminator>,
    ) -> Self {
        let probe_input = probe_input_path(&config.temp_root);
        let families = tools
            .tools
            .iter()
            .map(|(key, tool)| (key.clone(), ToolFamily::resolve(key, Some(tool), &probe_input)))
            .collect();
        let runner = ProcessRunner::new(config.runner.clone(), terminator);

        info!(
            tool_count = tools.tools.len(),
            temp_root = %config.temp_root.display(),
            report_root = %config.report_root.display(),
            "orchestrator initialized"
        );

        Self {
            config,
            tools,
            families,
            runner,
        }
    }

    /// Read the tools file named in `config` once and build the orchestrator
    pub fn load(config: OrchestratorConfig) -> std::result::Result<Self, ConfigError> {
        let tools = load_tools_file(&config.tools_file)?;
        Ok(Self::new(config, tools))
    }

    pub fn config(&self) -> &OrchestratorConfig {
        &self.config
    }

    pub fn tool_keys(&self) -> impl Iterator<Item = &str> {
        self.tools.tools.keys().map(String::as_str)
    }

    pub fn tool_config(&self, tool: &str) -> Option<&ToolConfig> {
        self.tools.tools.get(tool)
    }

    /// Staging area an execute of `tool` would use
    pub fn staging_for(&self, tool: &str) -> CopyFirstStaging {
        CopyFirstStaging::for_tool(&self.config.temp_root, tool)
    }

    /// Sidecar file stem for a tool's plan diff
    pub fn diff_stem(tool: &str) -> String {
        format!("{tool}_plan_diff")
    }

    fn family(&self, tool: &str) -> ToolFamily {
        self.families.get(tool).cloned().unwrap_or_else(|| {
            ToolFamily::resolve(tool, None, &probe_input_path(&self.config.temp_root))
        })
    }

    /// Is the tool usable, and which version. Never does real work.
    pub async fn probe(&self, tool: &str) -> ProbeResult {
        let family = self.family(tool);
        ToolProbe::new(&self.runner, self.config.probe_timeout, &self.config.temp_root)
            .probe(tool, self.tool_config(tool), &family.probe_args, &family.rules.probe)
            .await
    }

    /// One-shot call: validate, dry-run check, run, classify
    pub async fn run(
        &self,
        tool: &str,
        request: &RunRequest,
        cancel: &CancelToken,
        on_output_line: Option<OutputSink>,
    ) -> ToolRunResult {
        match self.run_inner(tool, request, cancel, on_output_line).await {
            Ok(result) => result,
            Err(e) => {
                warn!(tool = %tool, error = %e, "run refused");
                ToolRunResult::rejected(&e)
            }
        }
    }

    async fn run_inner(
        &self,
        tool: &str,
        request: &RunRequest,
        cancel: &CancelToken,
        on_output_line: Option<OutputSink>,
    ) -> Result<ToolRunResult> {
        let prepared = self.prepare(tool, Phase::OneShot)?;
        let vars = self.vars(&request.input, request.output_dir.as_deref(), request.output_file.as_deref());
        let argv = template::render(prepared.template, &vars)?;

        let gate = GateRequest {
            phase: Phase::OneShot,
            dry_run: request.dry_run,
            plan_confirmed: false,
            explicit_confirmation: false,
            output_dir: request.output_dir.as_deref(),
            destination_root: None,
        };
        if safety::evaluate(&SafetyPolicy::from(prepared.config), &gate)? == GateDecision::DryRun {
            return Ok(ToolRunResult::dry_run(dry_run_message(tool, Phase::OneShot, prepared.executable, &argv)));
        }

        self.ensure_dir(&self.config.temp_root)?;
        info!(tool = %tool, input = %request.input.display(), "running tool");
        let result = self
            .runner
            .run(prepared.executable, &argv, self.config.run_timeout, cancel, on_output_line)
            .await;

        let family = self.family(tool);
        let outcome = self.outcome_of(&result, &family.rules.run).map(|()| "completed".to_string());
        Ok(ToolRunResult::from_process(&result, outcome))
    }

    /// Plan phase: gate, run, write diff sidecars
    pub async fn plan(
        &self,
        tool: &str,
        request: &PlanRequest,
        cancel: &CancelToken,
        on_output_line: Option<OutputSink>,
    ) -> PlanResult {
        match self.plan_inner(tool, request, cancel, on_output_line).await {
            Ok(result) => result,
            Err(e) => {
                warn!(tool = %tool, error = %e, "plan refused");
                PlanResult::rejected(&e)
            }
        }
    }

    async fn plan_inner(
        &self,
        tool: &str,
        request: &PlanRequest,
        cancel: &CancelToken,
        on_output_line: Option<OutputSink>,
    ) -> Result<PlanResult> {
        let prepared = self.prepare(tool, Phase::Plan)?;
        let vars = self.vars(&request.input, Some(&request.output_dir), None);
        let argv = template::render(prepared.template, &vars)?;

        let gate = GateRequest {
            phase: Phase::Plan,
            dry_run: request.dry_run,
            plan_confirmed: false,
            explicit_confirmation: false,
            output_dir: Some(&request.output_dir),
            destination_root: request.destination_root.as_deref(),
        };
        if safety::evaluate(&SafetyPolicy::from(prepared.config), &gate)? == GateDecision::DryRun {
            return Ok(PlanResult::dry_run(dry_run_message(tool, Phase::Plan, prepared.executable, &argv)));
        }

        self.ensure_dir(&self.config.temp_root)?;
        self.ensure_dir(&self.config.report_root)?;
        info!(tool = %tool, input = %request.input.display(), "planning");
        let result = self
            .runner
            .run(prepared.executable, &argv, self.config.run_timeout, cancel, on_output_line)
            .await;

        let family = self.family(tool);
        let outcome = self.outcome_of(&result, &family.rules.run);

        if result.is_launch_failure() || result.was_cancelled {
            return Ok(PlanResult::from_process(&result, outcome.map(|()| String::new())));
        }

        let rows = diff::parse_rows(&result.stdout_text);
        let row_count = rows.len();
        let (artifacts, sidecar_note) =
            match diff::write_sidecars(&rows, &self.config.report_root, &Self::diff_stem(tool)) {
                Ok(artifacts) => (Some(artifacts), None),
                Err(e) => {
                    warn!(tool = %tool, error = %e, "diff sidecars not written, plan result unaffected");
                    (None, Some(e.to_string()))
                }
            };

        let outcome = outcome.map(|()| match &sidecar_note {
            Some(note) => format!("plan accepted ({row_count} changes); diff sidecars unavailable: {note}"),
            None => format!("plan accepted ({row_count} changes)"),
        });
        let mut plan = PlanResult::from_process(&result, outcome);
        if let Some(artifacts) = artifacts {
            plan.diff_csv_path = Some(artifacts.csv_path);
            plan.diff_json_path = Some(artifacts.json_path);
        }
        Ok(plan)
    }

    /// Execute phase: full gate, optional copy-first staging
    pub async fn execute(
        &self,
        tool: &str,
        request: &ExecuteRequest,
        cancel: &CancelToken,
        on_output_line: Option<OutputSink>,
    ) -> PlanResult {
        match self.execute_inner(tool, request, cancel, on_output_line).await {
            Ok(result) => result,
            Err(e) => {
                warn!(tool = %tool, error = %e, "execute refused");
                PlanResult::rejected(&e)
            }
        }
    }

    async fn execute_inner(
        &self,
        tool: &str,
        request: &ExecuteRequest,
        cancel: &CancelToken,
        on_output_line: Option<OutputSink>,
    ) -> Result<PlanResult> {
        let prepared = self.prepare(tool, Phase::Execute)?;
        let staging = prepared
            .config
            .copy_first_staging
            .then(|| self.staging_for(tool));

        // The tool sees the staging path; the caller's target stays as given
        let effective_output: PathBuf = match &staging {
            Some(staging) => staging.path().to_path_buf(),
            None => request.output_dir.clone(),
        };
        let vars = self.vars(&request.input, Some(&effective_output), None);
        let argv = template::render(prepared.template, &vars)?;

        let gate = GateRequest {
            phase: Phase::Execute,
            dry_run: request.dry_run,
            plan_confirmed: request.plan_confirmed,
            explicit_confirmation: request.explicit_confirmation,
            output_dir: Some(&request.output_dir),
            destination_root: request.destination_root.as_deref(),
        };
        if safety::evaluate(&SafetyPolicy::from(prepared.config), &gate)? == GateDecision::DryRun {
            return Ok(PlanResult::dry_run(dry_run_message(tool, Phase::Execute, prepared.executable, &argv)));
        }

        self.ensure_dir(&self.config.temp_root)?;
        if let Some(staging) = &staging {
            staging.reset()?;
        }
        info!(
            tool = %tool,
            input = %request.input.display(),
            output = %effective_output.display(),
            staged = staging.is_some(),
            "executing"
        );
        let result = self
            .runner
            .run(prepared.executable, &argv, self.config.run_timeout, cancel, on_output_line)
            .await;

        let family = self.family(tool);
        let mut outcome = self
            .outcome_of(&result, &family.rules.run)
            .map(|()| "execute completed".to_string());

        // Failed or cancelled runs leave staging untouched for inspection
        if outcome.is_ok() {
            if let Some(staging) = &staging {
                outcome = self
                    .promote(staging, &request.output_dir)
                    .await
                    .map(|files| format!("execute completed; promoted {files} files from staging"));
            }
        }

        let mut plan = PlanResult::from_process(&result, outcome);
        plan.staging_dir = staging.map(|s| s.path().to_path_buf());
        Ok(plan)
    }

    async fn promote(&self, staging: &CopyFirstStaging, destination: &Path) -> Result<usize> {
        let task_staging = staging.clone();
        let task_destination = destination.to_path_buf();
        let report = tokio::task::spawn_blocking(move || task_staging.promote(&task_destination))
            .await
            .map_err(|e| StagingError::Promotion {
                from: staging.path().to_path_buf(),
                to: destination.to_path_buf(),
                source: std::io::Error::other(e.to_string()),
            })??;
        debug!(destination = %destination.display(), files = report.files_copied, "promotion done");
        Ok(report.files_copied)
    }

    /// Configured, present, and carrying a valid template for `phase`
    fn prepare(&self, tool: &str, phase: Phase) -> Result<Prepared<'_>> {
        let config = self
            .tools
            .tools
            .get(tool)
            .ok_or_else(|| ConfigError::ToolNotConfigured(tool.to_string()))?;
        let executable = config.executable().ok_or(ConfigError::ExecutableNotConfigured)?;
        if !executable.exists() {
            return Err(ConfigError::ExecutableMissing(executable.clone()).into());
        }
        let template = config.template_for(phase)?;
        template::validate(template)?;
        debug!(tool = %tool, phase = phase.as_str(), "tool prepared");
        Ok(Prepared {
            config,
            executable,
            template,
        })
    }

    fn vars(&self, input: &Path, output_dir: Option<&Path>, output_file: Option<&Path>) -> TemplateVars {
        TemplateVars::new()
            .set_path(Placeholder::Input, input)
            .set_opt_path(Placeholder::OutputDir, output_dir)
            .set_opt_path(Placeholder::OutputFile, output_file)
            .set_path(Placeholder::TempDir, &self.config.temp_root)
            .set_path(Placeholder::ReportDir, &self.config.report_root)
    }

    fn ensure_dir(&self, path: &Path) -> Result<()> {
        std::fs::create_dir_all(path).map_err(|source| OrchestratorError::Directory {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Map a finished process onto the error taxonomy
    fn outcome_of(&self, result: &ProcessResult, rules: &RuleTable) -> Result<()> {
        if result.is_launch_failure() {
            return Err(OrchestratorError::ProcessLaunch(result.stderr_text.clone()));
        }
        if result.was_cancelled {
            return Err(OrchestratorError::Cancelled);
        }
        if result.timed_out {
            return Err(OrchestratorError::Timeout(self.config.run_timeout.as_secs()));
        }
        if result.exit_code == 0 {
            return Ok(());
        }

        let classification = rules.classify(&result.combined_output(), result.exit_code);
        let detail = classification.matched.unwrap_or_default();
        Err(match classification.status {
            Status::InputUnavailable => OrchestratorError::InputUnavailable(detail),
            Status::InvalidInput => OrchestratorError::InvalidInput(detail),
            _ => OrchestratorError::ToolFailure(result.exit_code),
        })
    }
}

fn dry_run_message(tool: &str, phase: Phase, executable: &Path, argv: &[String]) -> String {
    format!(
        "dry-run: {} {} not executed; would run: {}",
        tool,
        phase.as_str(),
        Invocation::for_target(executable, argv).display_line()
    )
}

// Integration tests for the tool orchestrator
// Run with cargo test --test test_orchestrator

#![cfg(unix)]

use std::path::{Path, PathBuf};
use std::time::Duration;
use toolgate::config::{ArgsTemplate, OrchestratorConfig, PhaseTemplates, ToolConfig, ToolsFile};
use toolgate::diff::CSV_HEADER;
use toolgate::process::RunnerConfig;
use toolgate::{
    ExecuteRequest, FailureKind, PlanRequest, RunRequest, ToolOrchestrator, spawn_invocation,
    CancelToken,
};

fn init_tracing() {
    use std::sync::Once;
    static INIT: Once = Once::new();
    INIT.call_once(|| {
        tracing_subscriber::fmt()
            .with_max_level(tracing::Level::DEBUG)
            .with_target(true)
            .with_thread_ids(true)
            .init();
    });
}

/// Scratch layout: temp root, report root, a destination root and a spy script
struct Fixture {
    _dir: tempfile::TempDir,
    root: PathBuf,
}

impl Fixture {
    fn new() -> Self {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path().to_path_buf();
        std::fs::create_dir_all(root.join("dest")).unwrap();
        Self { _dir: dir, root }
    }

    fn config(&self) -> OrchestratorConfig {
        OrchestratorConfig {
            tools_file: self.root.join("tools.toml"),
            temp_root: self.root.join("tmp"),
            report_root: self.root.join("reports"),
            probe_timeout: Duration::from_secs(5),
            run_timeout: Duration::from_secs(30),
            runner: RunnerConfig {
                poll_interval: Duration::from_millis(10),
                grace_period: Duration::from_millis(500),
                reader_join_timeout: Duration::from_secs(1),
            },
        }
    }

    fn dest_root(&self) -> PathBuf {
        self.root.join("dest")
    }

    fn input(&self) -> PathBuf {
        self.root.join("game.cue")
    }

    /// Script that logs its arguments, one call per line, then runs `body`
    fn spy(&self, body: &str) -> String {
        let path = self.root.join("spy.sh");
        let log = self.root.join("spy.log");
        std::fs::write(&path, format!("echo \"$*\" >> '{}'\n{}\n", log.display(), body)).unwrap();
        path.display().to_string()
    }

    fn spy_calls(&self) -> Vec<String> {
        std::fs::read_to_string(self.root.join("spy.log"))
            .map(|s| s.lines().map(str::to_string).collect())
            .unwrap_or_default()
    }

    fn orchestrator(&self, key: &str, tool: ToolConfig) -> ToolOrchestrator {
        let tools = ToolsFile {
            tools: [(key.to_string(), tool)].into_iter().collect(),
        };
        ToolOrchestrator::new(self.config(), tools)
    }
}

fn strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

fn flat_tool(template: Vec<String>) -> ToolConfig {
    ToolConfig {
        executable_path: Some(PathBuf::from("/bin/sh")),
        args_template: Some(ArgsTemplate::Flat(template)),
        family: Some("chdman".to_string()),
        ..Default::default()
    }
}

fn phased_tool(script: &str, copy_first: bool) -> ToolConfig {
    ToolConfig {
        executable_path: Some(PathBuf::from("/bin/sh")),
        args_template: Some(ArgsTemplate::Phased(PhaseTemplates {
            plan: strings(&[script, "plan", "{input}", "{output_dir}"]),
            execute: strings(&[script, "execute", "{input}", "{output_dir}"]),
        })),
        copy_first_staging: copy_first,
        family: Some("igir".to_string()),
        ..Default::default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_template_without_input_never_spawns() {
        init_tracing();

        let fx = Fixture::new();
        let script = fx.spy("exit 0");
        let orch = fx.orchestrator("chdman", flat_tool(strings(&[&script, "--output", "{output_dir}"])));

        let request = RunRequest {
            input: fx.input(),
            output_dir: Some(fx.root.join("out")),
            ..Default::default()
        };
        let result = orch.run("chdman", &request, &CancelToken::new(), None).await;

        assert!(!result.succeeded);
        assert_eq!(result.failure, Some(FailureKind::Configuration));
        assert!(result.message.contains("{input}"));
        assert!(fx.spy_calls().is_empty());
    }

    /// An empty input path would render to no target at all
    #[tokio::test]
    async fn test_run_without_input_never_spawns() {
        init_tracing();

        let fx = Fixture::new();
        let script = fx.spy("exit 0");
        let orch = fx.orchestrator("chdman", flat_tool(strings(&[&script, "{input}"])));

        let result = orch
            .run("chdman", &RunRequest::default(), &CancelToken::new(), None)
            .await;

        assert!(!result.succeeded);
        assert_eq!(result.failure, Some(FailureKind::Configuration));
        assert!(result.message.contains("no input path"));
        assert!(fx.spy_calls().is_empty());
    }

    #[tokio::test]
    async fn test_unconfigured_and_missing_executable() {
        init_tracing();

        let fx = Fixture::new();
        let tool = ToolConfig {
            executable_path: Some(fx.root.join("no-such-tool")),
            args_template: Some(ArgsTemplate::Flat(strings(&["{input}"]))),
            ..Default::default()
        };
        let orch = fx.orchestrator("chdman", tool);
        let request = RunRequest {
            input: fx.input(),
            ..Default::default()
        };

        let missing = orch.run("chdman", &request, &CancelToken::new(), None).await;
        assert_eq!(missing.failure, Some(FailureKind::Configuration));
        assert!(missing.message.contains("executable not found"));

        let unknown = orch.run("maxcso", &request, &CancelToken::new(), None).await;
        assert_eq!(unknown.failure, Some(FailureKind::Configuration));
        assert!(unknown.message.contains("not configured"));
    }

    #[tokio::test]
    async fn test_run_renders_and_succeeds() {
        init_tracing();

        let fx = Fixture::new();
        let script = fx.spy("echo \"Compression complete\"\nexit 0");
        let orch = fx.orchestrator(
            "chdman",
            flat_tool(strings(&[&script, "createcd", "{input}", "{output_file}", "{temp_dir}"])),
        );

        let request = RunRequest {
            input: fx.input(),
            output_file: Some(fx.root.join("game.chd")),
            ..Default::default()
        };
        let result = orch.run("chdman", &request, &CancelToken::new(), None).await;

        assert!(result.succeeded, "run result: {result:?}");
        assert_eq!(result.exit_code, Some(0));
        assert!(result.raw_output.contains("Compression complete"));
        assert_eq!(
            fx.spy_calls(),
            vec![format!(
                "createcd {} {} {}",
                fx.input().display(),
                fx.root.join("game.chd").display(),
                fx.root.join("tmp").display()
            )]
        );
    }

    #[tokio::test]
    async fn test_run_maps_input_unavailable() {
        init_tracing();

        let fx = Fixture::new();
        let script = fx.spy("echo 'Error: input file is missing or not accessible' 1>&2\nexit 1");
        let orch = fx.orchestrator("chdman", flat_tool(strings(&[&script, "{input}"])));

        let request = RunRequest {
            input: fx.input(),
            ..Default::default()
        };
        let result = orch.run("chdman", &request, &CancelToken::new(), None).await;

        assert!(!result.succeeded);
        assert_eq!(result.failure, Some(FailureKind::ToolFailure));
        assert!(result.message.starts_with("input missing or not accessible"));
        assert_eq!(result.exit_code, Some(1));
    }

    #[tokio::test]
    async fn test_run_dry_run_spawns_nothing() {
        init_tracing();

        let fx = Fixture::new();
        let script = fx.spy("exit 0");
        let orch = fx.orchestrator("chdman", flat_tool(strings(&[&script, "{input}"])));

        let request = RunRequest {
            input: fx.input(),
            dry_run: true,
            ..Default::default()
        };
        let result = orch.run("chdman", &request, &CancelToken::new(), None).await;

        assert!(result.succeeded);
        assert!(result.message.starts_with("dry-run"));
        assert!(fx.spy_calls().is_empty());
        assert!(!fx.root.join("tmp").exists());
    }

    #[tokio::test]
    async fn test_phased_template_rejected_for_run() {
        init_tracing();

        let fx = Fixture::new();
        let script = fx.spy("exit 0");
        let orch = fx.orchestrator("igir", phased_tool(&script, false));

        let request = RunRequest {
            input: fx.input(),
            ..Default::default()
        };
        let result = orch.run("igir", &request, &CancelToken::new(), None).await;
        assert_eq!(result.failure, Some(FailureKind::Configuration));
        assert!(fx.spy_calls().is_empty());
    }

    #[tokio::test]
    async fn test_execute_requires_plan() {
        init_tracing();

        let fx = Fixture::new();
        let script = fx.spy("exit 0");
        let orch = fx.orchestrator("igir", phased_tool(&script, false));

        let request = ExecuteRequest {
            input: fx.input(),
            output_dir: fx.dest_root().join("out"),
            destination_root: Some(fx.dest_root()),
            plan_confirmed: false,
            explicit_confirmation: true,
            dry_run: false,
        };
        let result = orch.execute("igir", &request, &CancelToken::new(), None).await;

        assert!(!result.accepted);
        assert_eq!(result.failure, Some(FailureKind::SafetyGate));
        assert!(result.message.contains("plan required"));
        assert!(fx.spy_calls().is_empty());
    }

    #[tokio::test]
    async fn test_execute_requires_explicit_confirmation() {
        init_tracing();

        let fx = Fixture::new();
        let script = fx.spy("exit 0");
        let orch = fx.orchestrator("igir", phased_tool(&script, false));

        let request = ExecuteRequest {
            input: fx.input(),
            output_dir: fx.dest_root().join("out"),
            destination_root: Some(fx.dest_root()),
            plan_confirmed: true,
            explicit_confirmation: false,
            dry_run: false,
        };
        let result = orch.execute("igir", &request, &CancelToken::new(), None).await;

        assert!(!result.accepted);
        assert!(result.message.contains("confirmation"));
        assert!(fx.spy_calls().is_empty());
    }

    #[tokio::test]
    async fn test_plan_outside_destination_root_refused() {
        init_tracing();

        let fx = Fixture::new();
        let script = fx.spy("exit 0");
        let orch = fx.orchestrator("igir", phased_tool(&script, false));

        let request = PlanRequest {
            input: fx.input(),
            output_dir: fx.dest_root().join("../elsewhere"),
            destination_root: Some(fx.dest_root()),
            dry_run: false,
        };
        let result = orch.plan("igir", &request, &CancelToken::new(), None).await;

        assert!(!result.accepted);
        assert_eq!(result.failure, Some(FailureKind::SandboxViolation));
        assert!(result.message.starts_with("destination sandbox violation"));
        assert!(fx.spy_calls().is_empty());
    }

    #[tokio::test]
    async fn test_execute_outside_destination_root_refused() {
        init_tracing();

        let fx = Fixture::new();
        let script = fx.spy("exit 0");
        let orch = fx.orchestrator("igir", phased_tool(&script, true));

        let request = ExecuteRequest {
            input: fx.input(),
            output_dir: fx.root.join("outside"),
            destination_root: Some(fx.dest_root()),
            plan_confirmed: true,
            explicit_confirmation: true,
            dry_run: false,
        };
        let result = orch.execute("igir", &request, &CancelToken::new(), None).await;

        assert!(!result.accepted);
        assert_eq!(result.failure, Some(FailureKind::SandboxViolation));
        assert!(result.message.starts_with("destination sandbox violation"));
        assert!(fx.spy_calls().is_empty());
        assert!(!orch.staging_for("igir").path().exists());
    }

    #[tokio::test]
    async fn test_plan_inside_destination_root_proceeds() {
        init_tracing();

        let fx = Fixture::new();
        let script = fx.spy("exit 0");
        let orch = fx.orchestrator("igir", phased_tool(&script, false));

        let request = PlanRequest {
            input: fx.input(),
            output_dir: fx.dest_root().join("nested/out"),
            destination_root: Some(fx.dest_root()),
            dry_run: false,
        };
        let result = orch.plan("igir", &request, &CancelToken::new(), None).await;

        assert!(result.accepted, "plan result: {result:?}");
        assert_eq!(fx.spy_calls().len(), 1);
    }

    #[tokio::test]
    async fn test_plan_writes_diff_sidecars() {
        init_tracing();

        let fx = Fixture::new();
        let script = fx.spy(
            "echo 'Scanning 3 files'\n\
             echo 'roms/a.sfc -> Nintendo/SNES/a.sfc'\n\
             echo 'roms/b.sfc \u{2192} Nintendo/SNES/b.sfc'\n\
             echo 'roms/c, d.md -> Sega/c, d.md'\n\
             exit 0",
        );
        let orch = fx.orchestrator("igir", phased_tool(&script, false));

        let request = PlanRequest {
            input: fx.input(),
            output_dir: fx.dest_root().join("out"),
            destination_root: Some(fx.dest_root()),
            dry_run: false,
        };
        let result = orch.plan("igir", &request, &CancelToken::new(), None).await;
        assert!(result.accepted, "plan result: {result:?}");

        let csv_path = result.diff_csv_path.clone().unwrap();
        let json_path = result.diff_json_path.clone().unwrap();
        assert_eq!(csv_path, fx.root.join("reports/igir_plan_diff.csv"));
        assert_eq!(json_path, fx.root.join("reports/igir_plan_diff.json"));

        let csv = std::fs::read_to_string(&csv_path).unwrap();
        let lines: Vec<&str> = csv.lines().collect();
        assert_eq!(lines.len(), 4);
        assert_eq!(lines[0], CSV_HEADER);
        assert_eq!(lines[3], ",\"roms/c, d.md\",\"Sega/c, d.md\",,,");

        let json: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&json_path).unwrap()).unwrap();
        assert_eq!(json["rows"].as_array().unwrap().len(), 3);
        assert_eq!(json["rows"][1]["dst"], "Nintendo/SNES/b.sfc");
    }

    #[tokio::test]
    async fn test_plan_without_rows_still_writes_sidecars() {
        init_tracing();

        let fx = Fixture::new();
        let script = fx.spy("echo 'nothing to do'\nexit 0");
        let orch = fx.orchestrator("igir", phased_tool(&script, false));

        let request = PlanRequest {
            input: fx.input(),
            output_dir: fx.dest_root().join("out"),
            destination_root: Some(fx.dest_root()),
            dry_run: false,
        };
        let result = orch.plan("igir", &request, &CancelToken::new(), None).await;
        assert!(result.accepted);

        let csv = std::fs::read_to_string(result.diff_csv_path.unwrap()).unwrap();
        assert_eq!(csv.lines().count(), 1);
        let json: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(result.diff_json_path.unwrap()).unwrap())
                .unwrap();
        assert!(json["rows"].as_array().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_execute_dry_run_creates_nothing() {
        init_tracing();

        let fx = Fixture::new();
        let script = fx.spy("exit 0");
        let orch = fx.orchestrator("igir", phased_tool(&script, true));

        let request = ExecuteRequest {
            input: fx.input(),
            output_dir: fx.dest_root().join("out"),
            destination_root: Some(fx.dest_root()),
            dry_run: true,
            ..Default::default()
        };
        let result = orch.execute("igir", &request, &CancelToken::new(), None).await;

        assert!(result.accepted);
        assert!(result.message.starts_with("dry-run"));
        assert!(fx.spy_calls().is_empty());
        assert!(!orch.staging_for("igir").path().exists());
    }

    /// The tool writes into staging; a clean exit promotes into the destination
    #[tokio::test]
    async fn test_copy_first_promotes_on_success() {
        init_tracing();

        let fx = Fixture::new();
        let script = fx.spy("mkdir -p \"$3/Nintendo\"\necho rom > \"$3/Nintendo/a.sfc\"\nexit 0");
        let orch = fx.orchestrator("igir", phased_tool(&script, true));
        let staging = fx.root.join("tmp/igir_copy_first");
        let output_dir = fx.dest_root().join("out");

        let request = ExecuteRequest {
            input: fx.input(),
            output_dir: output_dir.clone(),
            destination_root: Some(fx.dest_root()),
            plan_confirmed: true,
            explicit_confirmation: true,
            dry_run: false,
        };
        let result = orch.execute("igir", &request, &CancelToken::new(), None).await;

        assert!(result.accepted, "execute result: {result:?}");
        assert_eq!(result.staging_dir.as_deref(), Some(staging.as_path()));
        assert_eq!(
            fx.spy_calls(),
            vec![format!("execute {} {}", fx.input().display(), staging.display())]
        );
        assert_eq!(std::fs::read_to_string(output_dir.join("Nintendo/a.sfc")).unwrap(), "rom\n");
    }

    /// Output left in staging by an earlier run never reaches a later destination
    #[tokio::test]
    async fn test_copy_first_discards_earlier_staging() {
        init_tracing();

        let fx = Fixture::new();
        let script = fx.spy("touch \"$3/$(basename \"$2\").out\"\nexit 0");
        let orch = fx.orchestrator("igir", phased_tool(&script, true));

        // Leftover from an interrupted run
        let staging = orch.staging_for("igir");
        std::fs::create_dir_all(staging.path()).unwrap();
        std::fs::write(staging.path().join("partial.bin"), b"stale").unwrap();

        let execute = |input: &str, out: &str| ExecuteRequest {
            input: fx.root.join(input),
            output_dir: fx.dest_root().join(out),
            destination_root: Some(fx.dest_root()),
            plan_confirmed: true,
            explicit_confirmation: true,
            dry_run: false,
        };

        let first = orch
            .execute("igir", &execute("a.cue", "first"), &CancelToken::new(), None)
            .await;
        assert!(first.accepted, "first execute: {first:?}");
        let second = orch
            .execute("igir", &execute("b.cue", "second"), &CancelToken::new(), None)
            .await;
        assert!(second.accepted, "second execute: {second:?}");

        let first_dir = fx.dest_root().join("first");
        let second_dir = fx.dest_root().join("second");
        assert!(first_dir.join("a.cue.out").exists());
        assert!(!first_dir.join("partial.bin").exists());
        assert!(second_dir.join("b.cue.out").exists());
        assert!(!second_dir.join("a.cue.out").exists());
        assert!(!second_dir.join("partial.bin").exists());
    }

    /// A destination that cannot take a directory fails promotion after a clean run
    #[tokio::test]
    async fn test_promotion_failure_reported() {
        init_tracing();

        let fx = Fixture::new();
        let script = fx.spy("echo rom > \"$3/a.sfc\"\nexit 0");
        let orch = fx.orchestrator("igir", phased_tool(&script, true));
        let occupied = fx.dest_root().join("occupied");
        std::fs::write(&occupied, b"regular file").unwrap();

        let request = ExecuteRequest {
            input: fx.input(),
            output_dir: occupied.clone(),
            destination_root: Some(fx.dest_root()),
            plan_confirmed: true,
            explicit_confirmation: true,
            dry_run: false,
        };
        let result = orch.execute("igir", &request, &CancelToken::new(), None).await;

        assert!(!result.accepted);
        assert_eq!(result.failure, Some(FailureKind::StagingPromotion));
        assert!(result.message.starts_with("staging promotion failed"));
        assert_eq!(result.exit_code, Some(0));
        assert_eq!(std::fs::read(&occupied).unwrap(), b"regular file");
        assert!(orch.staging_for("igir").path().join("a.sfc").exists());
    }

    /// A cancelled execute leaves the destination untouched and staging as-is
    #[tokio::test]
    async fn test_copy_first_cancel_leaves_destination_empty() {
        init_tracing();

        let fx = Fixture::new();
        let marker = fx.root.join("started");
        let script = fx.spy(&format!(
            "echo partial > \"$3/partial.bin\"\ntouch '{}'\nsleep 30\nexit 0",
            marker.display()
        ));
        let orch = std::sync::Arc::new(fx.orchestrator("igir", phased_tool(&script, true)));
        let output_dir = fx.dest_root().join("out");

        let request = ExecuteRequest {
            input: fx.input(),
            output_dir: output_dir.clone(),
            destination_root: Some(fx.dest_root()),
            plan_confirmed: true,
            explicit_confirmation: true,
            dry_run: false,
        };
        let task_orch = orch.clone();
        let invocation = spawn_invocation(move |cancel| async move {
            task_orch.execute("igir", &request, &cancel, None).await
        });

        for _ in 0..500 {
            if marker.exists() {
                break;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        assert!(marker.exists(), "tool never started");
        invocation.cancel();
        let result = invocation.join().await.unwrap();

        assert!(!result.accepted);
        assert!(result.was_cancelled);
        assert_eq!(result.failure, Some(FailureKind::Cancelled));
        assert!(!output_dir.exists());
        assert!(orch.staging_for("igir").path().join("partial.bin").exists());
    }
}

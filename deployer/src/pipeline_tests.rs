//! Tests for the release pipeline, run against stub collaborators.

use super::*;
use crate::config::{CdnCredentials, TransferCredentials};
use crate::test_utils::{
    ExpectedCall, PURGE_FAILURE_BODY, PURGE_SUCCESS_BODY, RecordingConnector, StubExecutor,
    StubTransport, TransferCall, exit_status,
};
use camino::Utf8PathBuf;
use rstest::{fixture, rstest};
use tempfile::TempDir;

const ARTIFACT_BYTES: &[u8] = b"not really an apk";

struct Project {
    _dir: TempDir,
    root: Utf8PathBuf,
    layout: ReleaseLayout,
}

impl Project {
    fn with_descriptor(contents: &str) -> Self {
        let dir = tempfile::tempdir().expect("temp dir");
        let root = Utf8PathBuf::from_path_buf(dir.path().to_path_buf()).expect("utf-8 temp dir");
        let layout = ReleaseLayout::default();
        std::fs::write(layout.descriptor_in(&root), contents).expect("write pubspec");
        Self {
            _dir: dir,
            root,
            layout,
        }
    }

    fn with_artifact(self) -> Self {
        let artifact = self.layout.artifact_in(&self.root);
        let parent = artifact.parent().expect("artifact parent");
        std::fs::create_dir_all(parent).expect("create build dir");
        std::fs::write(&artifact, ARTIFACT_BYTES).expect("write artifact");
        self
    }

    fn manifest_path(&self) -> Utf8PathBuf {
        self.layout.local_manifest_in(&self.root)
    }
}

#[fixture]
fn project() -> Project {
    Project::with_descriptor("name: streameee\nversion: 2.3.1+14\n").with_artifact()
}

fn config(cdn: bool) -> DeployConfig {
    DeployConfig {
        transfer: TransferCredentials::new("ftp.example.com", "deploy", "secret"),
        cdn: cdn.then(|| CdnCredentials::new("zone", "token")),
    }
}

fn run(
    project: &Project,
    options: &ReleaseOptions,
    cdn: bool,
    executor: &StubExecutor,
    connector: &RecordingConnector,
    transport: &StubTransport,
) -> (Result<ReleaseReport>, String) {
    let config = config(cdn);
    let deps = ReleaseDeps {
        executor,
        connector,
        invalidator: CacheInvalidator::new(config.cdn.clone(), transport),
    };
    let mut stderr = Vec::new();
    let result = run_release(
        &project.root,
        &project.layout,
        &config,
        options,
        &deps,
        &mut stderr,
    );
    (result, String::from_utf8_lossy(&stderr).into_owned())
}

#[rstest]
fn release_uploads_in_order_and_cleans_up(project: Project) {
    let connector = RecordingConnector::new();
    let transport = StubTransport::responding(PURGE_SUCCESS_BODY);

    let (result, output) = run(
        &project,
        &ReleaseOptions::default(),
        true,
        &StubExecutor::unused(),
        &connector,
        &transport,
    );

    let report = result.expect("release succeeds");
    assert_eq!(report.descriptor.version(), "2.3.1");
    assert_eq!(report.descriptor.build_code(), 14);
    assert_eq!(report.purge, PurgeOutcome::Purged);
    assert_eq!(report.artifact_bytes, ARTIFACT_BYTES.len() as u64);
    assert_eq!(report.artifact_sha256.len(), 64);
    assert_eq!(
        connector.uploaded_paths(),
        vec![
            "/streameee/dl/streameee.apk",
            "/streameee/update/streameee-v2.3.1.apk",
            "/streameee/update/manifest.json",
        ]
    );
    assert_eq!(connector.count(&TransferCall::Close), 1);
    assert_eq!(transport.calls(), 1);
    assert!(!project.manifest_path().exists());
    assert!(output.contains("Version: 2.3.1 (code 14)"));
    assert!(output.contains("Deployment complete!"));
}

#[rstest]
fn uploaded_manifest_matches_release(project: Project) {
    let connector = RecordingConnector::failing_on("/streameee/update/manifest.json");
    let transport = StubTransport::responding(PURGE_SUCCESS_BODY);
    let options = ReleaseOptions {
        force_update: true,
        notes: Some("- Faster channel switching".to_owned()),
        ..ReleaseOptions::default()
    };

    let (result, _) = run(
        &project,
        &options,
        false,
        &StubExecutor::unused(),
        &connector,
        &transport,
    );

    assert!(result.is_err());
    let written = std::fs::read_to_string(project.manifest_path()).expect("manifest kept");
    let manifest: serde_json::Value = serde_json::from_str(&written).expect("valid JSON");
    assert_eq!(manifest["version"], "2.3.1");
    assert_eq!(manifest["versionCode"], 14);
    assert_eq!(
        manifest["apkUrl"],
        "https://streameee.com/update/streameee-v2.3.1.apk"
    );
    assert_eq!(manifest["releaseNotes"], "- Faster channel switching");
    assert_eq!(manifest["forceUpdate"], true);
}

#[rstest]
fn manifest_upload_failure_keeps_manifest_and_skips_purge(project: Project) {
    let connector = RecordingConnector::failing_on("/streameee/update/manifest.json");
    let transport = StubTransport::responding(PURGE_SUCCESS_BODY);

    let (result, _) = run(
        &project,
        &ReleaseOptions::default(),
        true,
        &StubExecutor::unused(),
        &connector,
        &transport,
    );

    let err = result.expect_err("manifest upload fails");
    assert!(
        matches!(&err, DeployError::Transfer { step, .. } if step == "upload of manifest"),
        "unexpected error: {err}"
    );
    assert!(project.manifest_path().exists());
    assert_eq!(transport.calls(), 0);
    assert_eq!(connector.count(&TransferCall::Close), 1);
}

#[rstest]
fn missing_artifact_fails_before_connecting() {
    let project = Project::with_descriptor("version: 2.3.1+14\n");
    let connector = RecordingConnector::new();
    let transport = StubTransport::responding(PURGE_SUCCESS_BODY);

    let (result, _) = run(
        &project,
        &ReleaseOptions::default(),
        true,
        &StubExecutor::unused(),
        &connector,
        &transport,
    );

    assert!(matches!(result, Err(DeployError::ArtifactMissing { .. })));
    assert!(connector.calls().is_empty());
    assert!(!project.manifest_path().exists());
}

#[rstest]
fn unreadable_version_fails_before_connecting() {
    let project = Project::with_descriptor("name: streameee\n").with_artifact();
    let connector = RecordingConnector::new();

    let (result, _) = run(
        &project,
        &ReleaseOptions::default(),
        false,
        &StubExecutor::unused(),
        &connector,
        &StubTransport::responding(PURGE_SUCCESS_BODY),
    );

    assert!(matches!(result, Err(DeployError::Parse { .. })));
    assert!(connector.calls().is_empty());
}

#[rstest]
#[case::rejected(StubTransport::responding(PURGE_FAILURE_BODY))]
#[case::unreachable(StubTransport::failing("connection reset"))]
fn cdn_failure_is_not_fatal(project: Project, #[case] transport: StubTransport) {
    let connector = RecordingConnector::new();

    let (result, output) = run(
        &project,
        &ReleaseOptions::default(),
        true,
        &StubExecutor::unused(),
        &connector,
        &transport,
    );

    let report = result.expect("release succeeds despite purge failure");
    assert!(matches!(report.purge, PurgeOutcome::Failed { .. }));
    assert!(!project.manifest_path().exists());
    assert!(output.contains("Warning: CDN cache purge failed"));
}

#[rstest]
fn missing_cdn_credentials_skip_purge(project: Project) {
    let transport = StubTransport::responding(PURGE_SUCCESS_BODY);

    let (result, _) = run(
        &project,
        &ReleaseOptions::default(),
        false,
        &StubExecutor::unused(),
        &RecordingConnector::new(),
        &transport,
    );

    assert_eq!(result.expect("release succeeds").purge, PurgeOutcome::Skipped);
    assert_eq!(transport.calls(), 0);
}

#[rstest]
fn build_runs_flutter_in_project_dir(project: Project) {
    let executor = StubExecutor::new(vec![ExpectedCall {
        cmd: "flutter",
        args: vec!["build", "apk", "--release"],
        cwd: Some(project.root.clone()),
        result: Ok(exit_status(0)),
    }]);
    let options = ReleaseOptions {
        build: true,
        ..ReleaseOptions::default()
    };

    let (result, _) = run(
        &project,
        &options,
        false,
        &executor,
        &RecordingConnector::new(),
        &StubTransport::responding(PURGE_SUCCESS_BODY),
    );

    assert!(result.is_ok());
    executor.assert_finished();
}

#[rstest]
fn failed_build_stops_the_run(project: Project) {
    let executor = StubExecutor::new(vec![ExpectedCall {
        cmd: "flutter",
        args: vec!["build", "apk", "--release"],
        cwd: None,
        result: Ok(exit_status(1)),
    }]);
    let connector = RecordingConnector::new();
    let options = ReleaseOptions {
        build: true,
        ..ReleaseOptions::default()
    };

    let (result, _) = run(
        &project,
        &options,
        false,
        &executor,
        &connector,
        &StubTransport::responding(PURGE_SUCCESS_BODY),
    );

    assert!(matches!(result, Err(DeployError::BuildFailed { .. })));
    assert!(connector.calls().is_empty());
    assert!(!project.manifest_path().exists());
}

#[rstest]
fn dry_run_prints_plan_without_side_effects(project: Project) {
    let connector = RecordingConnector::new();
    let transport = StubTransport::responding(PURGE_SUCCESS_BODY);
    let options = ReleaseOptions {
        dry_run: true,
        ..ReleaseOptions::default()
    };

    let (result, output) = run(
        &project,
        &options,
        true,
        &StubExecutor::unused(),
        &connector,
        &transport,
    );

    let report = result.expect("dry run succeeds");
    assert!(report.dry_run);
    assert_eq!(report.purge, PurgeOutcome::Skipped);
    assert!(connector.calls().is_empty());
    assert_eq!(transport.calls(), 0);
    assert!(!project.manifest_path().exists());
    assert!(output.contains("\"versionCode\": 14"));
    assert!(output.contains("/streameee/update/manifest.json"));
}

#[rstest]
fn dry_run_with_build_only_reports_the_command() {
    let project = Project::with_descriptor("version: 2.3.1+14\n");
    let options = ReleaseOptions {
        build: true,
        dry_run: true,
        ..ReleaseOptions::default()
    };

    let (result, output) = run(
        &project,
        &options,
        false,
        &StubExecutor::unused(),
        &RecordingConnector::new(),
        &StubTransport::responding(PURGE_SUCCESS_BODY),
    );

    assert!(result.is_ok());
    assert!(output.contains("Would run: flutter build apk --release"));
}

#[rstest]
fn force_notice_is_printed(project: Project) {
    let options = ReleaseOptions {
        force_update: true,
        dry_run: true,
        ..ReleaseOptions::default()
    };

    let (_, output) = run(
        &project,
        &options,
        false,
        &StubExecutor::unused(),
        &RecordingConnector::new(),
        &StubTransport::responding(PURGE_SUCCESS_BODY),
    );

    assert!(output.contains("Force update: enabled"));
    assert!(output.contains("Notes: - Version 2.3.1"));
}

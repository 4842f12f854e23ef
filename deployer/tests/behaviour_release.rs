//! BDD tests for the end-to-end release workflow against stub collaborators.

use camino::Utf8PathBuf;
use rstest::fixture;
use rstest_bdd_macros::{given, scenario, then, when};
use streameee_deployer::cdn::CacheInvalidator;
use streameee_deployer::config::{CdnCredentials, DeployConfig, TransferCredentials};
use streameee_deployer::error::DeployError;
use streameee_deployer::layout::ReleaseLayout;
use streameee_deployer::pipeline::{ReleaseOptions, ReleaseReport, ReleaseDeps, run_release};
use streameee_deployer::test_utils::{
    PURGE_FAILURE_BODY, PURGE_SUCCESS_BODY, RecordingConnector, StubExecutor, StubTransport,
    TransferCall,
};

#[derive(Default)]
struct ReleaseWorld {
    _temp_dir: Option<tempfile::TempDir>,
    project_dir: Option<Utf8PathBuf>,
    layout: ReleaseLayout,
    cdn: Option<CdnCredentials>,
    purge_body: Option<&'static str>,
    rejected_remote: Option<String>,
    connector: Option<RecordingConnector>,
    transport: Option<StubTransport>,
    result: Option<Result<ReleaseReport, DeployError>>,
}

impl ReleaseWorld {
    fn project_dir(&self) -> &Utf8PathBuf {
        self.project_dir.as_ref().expect("project directory set")
    }

    fn connector(&self) -> &RecordingConnector {
        self.connector.as_ref().expect("release has run")
    }

    fn transport(&self) -> &StubTransport {
        self.transport.as_ref().expect("release has run")
    }

    fn manifest_path(&self) -> Utf8PathBuf {
        self.layout.local_manifest_in(self.project_dir())
    }

    fn run(&mut self, dry_run: bool) {
        let connector = self
            .rejected_remote
            .take()
            .map_or_else(RecordingConnector::new, RecordingConnector::failing_on);
        let transport = StubTransport::responding(self.purge_body.unwrap_or(PURGE_SUCCESS_BODY));
        let executor = StubExecutor::unused();
        let config = DeployConfig {
            transfer: TransferCredentials::new("ftp.example.com", "deploy", "secret"),
            cdn: self.cdn.clone(),
        };
        let options = ReleaseOptions {
            dry_run,
            ..ReleaseOptions::default()
        };

        let result = {
            let deps = ReleaseDeps {
                executor: &executor,
                connector: &connector,
                invalidator: CacheInvalidator::new(config.cdn.clone(), &transport),
            };
            let mut stderr = Vec::new();
            run_release(
                self.project_dir(),
                &self.layout,
                &config,
                &options,
                &deps,
                &mut stderr,
            )
        };

        self.result = Some(result);
        self.connector = Some(connector);
        self.transport = Some(transport);
    }
}

#[fixture]
fn world() -> ReleaseWorld {
    let temp_dir = tempfile::tempdir().expect("temp dir");
    let project_dir = Utf8PathBuf::try_from(temp_dir.path().to_path_buf()).expect("UTF-8 path");
    ReleaseWorld {
        _temp_dir: Some(temp_dir),
        project_dir: Some(project_dir),
        ..Default::default()
    }
}

#[given("a project at version \"{version}\"")]
fn given_project_version(world: &mut ReleaseWorld, version: String) {
    let pubspec = world.layout.descriptor_in(world.project_dir());
    std::fs::write(pubspec, format!("name: streameee\nversion: {version}\n"))
        .expect("write pubspec");
}

#[given("the release APK has been built")]
fn given_apk_built(world: &mut ReleaseWorld) {
    let artifact = world.layout.artifact_in(world.project_dir());
    std::fs::create_dir_all(artifact.parent().expect("artifact parent")).expect("build dir");
    std::fs::write(artifact, b"apk bytes").expect("write artifact");
}

#[given("CDN credentials are configured")]
fn given_cdn_credentials(world: &mut ReleaseWorld) {
    world.cdn = Some(CdnCredentials::new("zone-id", "api-token"));
}

#[given("the file host rejects \"{remote}\"")]
fn given_host_rejects(world: &mut ReleaseWorld, remote: String) {
    world.rejected_remote = Some(remote);
}

#[given("the CDN rejects purge requests")]
fn given_cdn_rejects(world: &mut ReleaseWorld) {
    world.purge_body = Some(PURGE_FAILURE_BODY);
}

#[when("the release runs")]
fn when_release_runs(world: &mut ReleaseWorld) {
    world.run(false);
}

#[when("a dry run of the release runs")]
fn when_dry_run_runs(world: &mut ReleaseWorld) {
    world.run(true);
}

#[then("the release succeeds")]
fn then_release_succeeds(world: &mut ReleaseWorld) {
    let result = world.result.as_ref().expect("release has run");
    assert!(result.is_ok(), "expected success, got {result:?}");
}

#[then("the release fails because the APK is missing")]
fn then_fails_missing_apk(world: &mut ReleaseWorld) {
    let result = world.result.as_ref().expect("release has run");
    assert!(
        matches!(result, Err(DeployError::ArtifactMissing { .. })),
        "unexpected result: {result:?}"
    );
}

#[then("the release fails during \"{step}\"")]
fn then_fails_during(world: &mut ReleaseWorld, step: String) {
    let result = world.result.as_ref().expect("release has run");
    assert!(
        matches!(result, Err(DeployError::Transfer { step: failed, .. }) if *failed == step),
        "unexpected result: {result:?}"
    );
}

#[then("the uploads are \"{paths}\"")]
fn then_uploads_are(world: &mut ReleaseWorld, paths: String) {
    let expected: Vec<String> = paths.split(", ").map(str::to_owned).collect();
    assert_eq!(world.connector().uploaded_paths(), expected);
}

#[then("the CDN purge request count is {count}")]
fn then_purge_count(world: &mut ReleaseWorld, count: usize) {
    assert_eq!(world.transport().calls(), count);
}

#[then("the local manifest is removed")]
fn then_manifest_removed(world: &mut ReleaseWorld) {
    assert!(!world.manifest_path().exists());
}

#[then("the local manifest is kept")]
fn then_manifest_kept(world: &mut ReleaseWorld) {
    assert!(world.manifest_path().exists());
}

#[then("no connection is opened")]
fn then_no_connection(world: &mut ReleaseWorld) {
    assert_eq!(world.connector().count(&TransferCall::Connect), 0);
}

#[then("the connection is closed once")]
fn then_closed_once(world: &mut ReleaseWorld) {
    assert_eq!(world.connector().count(&TransferCall::Close), 1);
}

#[scenario(
    path = "tests/features/release.feature",
    name = "Publishing a built release"
)]
fn scenario_publish_release(world: ReleaseWorld) {
    let _ = world;
}

#[scenario(
    path = "tests/features/release.feature",
    name = "A missing APK stops the release before connecting"
)]
fn scenario_missing_apk(world: ReleaseWorld) {
    let _ = world;
}

#[scenario(
    path = "tests/features/release.feature",
    name = "A failed manifest upload keeps the local manifest"
)]
fn scenario_manifest_upload_failure(world: ReleaseWorld) {
    let _ = world;
}

#[scenario(
    path = "tests/features/release.feature",
    name = "A rejected cache purge does not fail the release"
)]
fn scenario_rejected_purge(world: ReleaseWorld) {
    let _ = world;
}

#[scenario(
    path = "tests/features/release.feature",
    name = "A dry run has no side effects"
)]
fn scenario_dry_run(world: ReleaseWorld) {
    let _ = world;
}

// ABOUTME: Test support utilities.
// ABOUTME: Scripted git/docker runner, fake metadata oracle, and a wired orchestrator harness.

// Each test binary only uses some of these helpers.
#![allow(dead_code)]

use async_trait::async_trait;
use dockyard::config::Config;
use dockyard::deploy::{DeployError, Orchestrator};
use dockyard::diagnostics::Diagnostics;
use dockyard::process::{
    CommandOutput, CommandRunner, CommandSpec, OutputLine, OutputSink, OutputStream,
    ProcessError, StreamedOutput, TailBuffer,
};
use dockyard::runtime::RuntimeType;
use dockyard::source::{MetadataError, MetadataOracle, RepoMetadata};
use dockyard::store::{ApplicationRecord, ApplicationStatus, ApplicationStore, MemoryStore};
use dockyard::types::{ApplicationId, ContainerPort, RepoRef};
use parking_lot::Mutex;
use std::collections::{BTreeSet, HashMap};
use std::path::Path;
use std::sync::{Arc, Once};
use std::time::Duration;
use tempfile::TempDir;

static TRACING_INIT: Once = Once::new();

/// Initialize tracing for tests. Safe to call multiple times.
pub fn init_tracing() {
    TRACING_INIT.call_once(|| {
        use tracing_subscriber::EnvFilter;
        let filter = EnvFilter::from_default_env().add_directive("dockyard=debug".parse().unwrap());
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_test_writer()
            .try_init()
            .ok();
    });
}

/// A container the fake engine knows about.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FakeContainer {
    pub id: String,
    pub name: String,
    pub image: String,
    pub ports: String,
}

#[derive(Debug, Clone)]
struct Reply {
    exit_code: i32,
    stdout: String,
    stderr: String,
}

impl Reply {
    fn ok(stdout: impl Into<String>) -> Self {
        Self {
            exit_code: 0,
            stdout: stdout.into(),
            stderr: String::new(),
        }
    }

    fn fail(exit_code: i32, stderr: impl Into<String>) -> Self {
        Self {
            exit_code,
            stdout: String::new(),
            stderr: stderr.into(),
        }
    }
}

#[derive(Default)]
struct FakeState {
    /// clone URL -> files written at the tree root on clone.
    repos: HashMap<String, Vec<(String, String)>>,
    images: BTreeSet<String>,
    containers: Vec<FakeContainer>,
    /// First argument (`clone`, `build`, `run`, ...) -> forced failure.
    failures: HashMap<String, (i32, String)>,
    calls: Vec<String>,
    next_container: u64,
    build_delay: Option<Duration>,
}

impl FakeState {
    fn clone_repo(&mut self, url: &str, path: &str) -> Reply {
        let Some(files) = self.repos.get(url) else {
            return Reply::fail(
                128,
                format!("fatal: repository '{url}' not found\n"),
            );
        };
        let root = Path::new(path);
        std::fs::create_dir_all(root.join(".git")).unwrap();
        std::fs::write(root.join(".git").join("HEAD"), "ref: refs/heads/main\n").unwrap();
        for (name, content) in files {
            std::fs::write(root.join(name), content).unwrap();
        }
        Reply::ok("")
    }

    /// HEAD resolves once a clone has written it.
    fn rev_parse(&self, cwd: Option<&Path>) -> Reply {
        match cwd {
            Some(dir) if dir.join(".git").join("HEAD").is_file() => Reply::ok("4b825dc6\n"),
            _ => Reply::fail(128, ""),
        }
    }

    fn images_q(&self, name: &str) -> Reply {
        if self.images.contains(name) {
            Reply::ok("sha256feed\n")
        } else {
            Reply::ok("")
        }
    }

    fn ps(&self, filter: &str) -> Reply {
        let matches = |c: &FakeContainer| {
            if let Some(pattern) = filter.strip_prefix("name=") {
                let exact = pattern.trim_start_matches('^').trim_end_matches('$');
                c.name == exact
            } else if let Some(image) = filter.strip_prefix("ancestor=") {
                c.image == image
            } else {
                false
            }
        };
        let ids: String = self
            .containers
            .iter()
            .filter(|c| matches(c))
            .map(|c| format!("{}\n", c.id))
            .collect();
        Reply::ok(ids)
    }

    fn rm(&mut self, id: &str) -> Reply {
        let before = self.containers.len();
        self.containers.retain(|c| c.id != id);
        if self.containers.len() == before {
            return Reply::fail(1, format!("Error: No such container: {id}\n"));
        }
        Reply::ok(format!("{id}\n"))
    }

    fn rmi(&mut self, name: &str) -> Reply {
        if self.containers.iter().any(|c| c.image == name) {
            return Reply::fail(
                1,
                format!("Error response from daemon: conflict: unable to remove repository reference \"{name}\"\n"),
            );
        }
        if !self.images.remove(name) {
            return Reply::fail(1, format!("Error: No such image: {name}\n"));
        }
        Reply::ok(format!("Untagged: {name}:latest\n"))
    }

    fn build(&mut self, name: &str, dir: &str) -> Reply {
        if !Path::new(dir).is_dir() {
            return Reply::fail(1, format!("unable to prepare context: path \"{dir}\" not found\n"));
        }
        self.images.insert(name.to_string());
        Reply::ok(format!(
            "Step 1/2 : FROM scratch\nStep 2/2 : COPY . /app\nSuccessfully tagged {name}:latest\n"
        ))
    }

    fn run(&mut self, name: &str, ports: &str, image: &str) -> Reply {
        if self.containers.iter().any(|c| c.name == name) {
            return Reply::fail(
                125,
                format!("Conflict. The container name \"/{name}\" is already in use\n"),
            );
        }
        if !self.images.contains(image) {
            return Reply::fail(125, format!("Unable to find image '{image}:latest' locally\n"));
        }
        let host = ports.split(':').next().unwrap_or_default();
        if self
            .containers
            .iter()
            .any(|c| c.ports.split(':').next() == Some(host))
        {
            return Reply::fail(
                125,
                format!("Bind for 0.0.0.0:{host} failed: port is already allocated\n"),
            );
        }
        self.next_container += 1;
        let id = format!("c0ffee{:06}", self.next_container);
        self.containers.push(FakeContainer {
            id: id.clone(),
            name: name.to_string(),
            image: image.to_string(),
            ports: ports.to_string(),
        });
        Reply::ok(format!("{id}\n"))
    }
}

/// In-process stand-in for `git` and `docker`.
///
/// Keeps images and containers in memory so cleanup and naming rules can be
/// checked without a daemon. Every invocation is recorded.
#[derive(Default)]
pub struct FakeRunner {
    state: Mutex<FakeState>,
}

impl FakeRunner {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make `url` clonable; the clone contains `files`.
    pub fn add_repo(&self, url: &str, files: &[(&str, &str)]) {
        let files = files
            .iter()
            .map(|(name, content)| (name.to_string(), content.to_string()))
            .collect();
        self.state.lock().repos.insert(url.to_string(), files);
    }

    /// Make every command whose first argument is `op` exit with `exit_code`.
    pub fn fail(&self, op: &str, exit_code: i32, stderr: &str) {
        self.state
            .lock()
            .failures
            .insert(op.to_string(), (exit_code, stderr.to_string()));
    }

    pub fn succeed(&self, op: &str) {
        self.state.lock().failures.remove(op);
    }

    pub fn set_build_delay(&self, delay: Duration) {
        self.state.lock().build_delay = Some(delay);
    }

    pub fn add_image(&self, name: &str) {
        self.state.lock().images.insert(name.to_string());
    }

    pub fn add_container(&self, name: &str, image: &str, ports: &str) -> String {
        let mut state = self.state.lock();
        state.next_container += 1;
        let id = format!("0ld{:09}", state.next_container);
        state.containers.push(FakeContainer {
            id: id.clone(),
            name: name.to_string(),
            image: image.to_string(),
            ports: ports.to_string(),
        });
        id
    }

    pub fn calls(&self) -> Vec<String> {
        self.state.lock().calls.clone()
    }

    pub fn calls_starting_with(&self, prefix: &str) -> Vec<String> {
        self.calls()
            .into_iter()
            .filter(|call| call.starts_with(prefix))
            .collect()
    }

    pub fn images(&self) -> Vec<String> {
        self.state.lock().images.iter().cloned().collect()
    }

    pub fn containers(&self) -> Vec<FakeContainer> {
        self.state.lock().containers.clone()
    }

    fn execute(&self, spec: &CommandSpec) -> Reply {
        let mut state = self.state.lock();
        state.calls.push(spec.to_string());

        let args: Vec<&str> = spec.arguments().iter().map(String::as_str).collect();
        let op = args.first().copied().unwrap_or_default();

        if let Some((exit_code, stderr)) = state.failures.get(op).cloned() {
            // A failed clone leaves whatever git had written so far.
            if op == "clone"
                && let Some(path) = args.get(2)
            {
                std::fs::create_dir_all(path).unwrap();
                std::fs::write(Path::new(path).join("partial"), "").unwrap();
            }
            return Reply::fail(exit_code, stderr);
        }

        match (spec.program(), args.as_slice()) {
            ("git", ["clone", url, path]) => state.clone_repo(url, path),
            ("git", ["rev-parse", "--verify", "--quiet", "HEAD"]) => state.rev_parse(spec.cwd()),
            ("git", ["pull"]) => Reply::ok("Already up to date.\n"),
            ("docker", ["images", "-q", name]) => state.images_q(name),
            ("docker", ["ps", "-q", .., "-f", filter]) => state.ps(filter),
            ("docker", ["rm", "-f", id]) => state.rm(id),
            ("docker", ["rmi", name]) => state.rmi(name),
            ("docker", ["build", "-t", name, dir]) => state.build(name, dir),
            ("docker", ["run", "-d", "--name", name, "-p", ports, image]) => {
                state.run(name, ports, image)
            }
            _ => Reply::fail(127, format!("unexpected command: {spec}\n")),
        }
    }
}

#[async_trait]
impl CommandRunner for FakeRunner {
    async fn run(&self, command: &CommandSpec) -> Result<CommandOutput, ProcessError> {
        let reply = self.execute(command);
        Ok(CommandOutput {
            exit_code: reply.exit_code,
            stdout: reply.stdout,
            stderr: reply.stderr,
        })
    }

    async fn run_streaming(
        &self,
        command: &CommandSpec,
        sink: &dyn OutputSink,
        tail_lines: usize,
    ) -> Result<StreamedOutput, ProcessError> {
        let delay = self.state.lock().build_delay;
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        let reply = self.execute(command);
        let mut tail = TailBuffer::new(tail_lines);
        for (stream, text) in [
            (OutputStream::Stdout, &reply.stdout),
            (OutputStream::Stderr, &reply.stderr),
        ] {
            for line in text.lines() {
                sink.line(&OutputLine {
                    stream,
                    content: line.to_string(),
                });
                tail.push(line);
            }
        }
        Ok(StreamedOutput {
            exit_code: reply.exit_code,
            tail: tail.into_lines(),
        })
    }
}

#[derive(Debug, Clone)]
enum Answer {
    Public,
    Private,
}

/// Metadata oracle answering from a fixed table. Unknown repositories are not found.
#[derive(Default)]
pub struct FakeOracle {
    repos: Mutex<HashMap<String, Answer>>,
    outage: Mutex<Option<String>>,
    lookups: Mutex<u32>,
}

impl FakeOracle {
    pub fn new() -> Self {
        Self::default()
    }

    /// `name` is `owner/repo`.
    pub fn public(&self, name: &str) {
        self.repos.lock().insert(name.to_string(), Answer::Public);
    }

    pub fn private(&self, name: &str) {
        self.repos.lock().insert(name.to_string(), Answer::Private);
    }

    pub fn set_outage(&self, reason: Option<&str>) {
        *self.outage.lock() = reason.map(str::to_string);
    }

    pub fn lookups(&self) -> u32 {
        *self.lookups.lock()
    }
}

#[async_trait]
impl MetadataOracle for FakeOracle {
    async fn fetch(&self, repo: &RepoRef) -> Result<RepoMetadata, MetadataError> {
        *self.lookups.lock() += 1;
        if let Some(reason) = self.outage.lock().clone() {
            return Err(MetadataError::Unavailable(reason));
        }
        match self.repos.lock().get(&repo.to_string()) {
            Some(Answer::Public) => Ok(RepoMetadata { private: false }),
            Some(Answer::Private) => Ok(RepoMetadata { private: true }),
            None => Err(MetadataError::NotFound),
        }
    }
}

/// Collects streamed output lines.
#[derive(Default)]
pub struct RecordingSink {
    lines: Mutex<Vec<String>>,
}

impl RecordingSink {
    pub fn lines(&self) -> Vec<String> {
        self.lines.lock().clone()
    }
}

impl OutputSink for RecordingSink {
    fn line(&self, line: &OutputLine) {
        self.lines.lock().push(line.content.clone());
    }
}

/// Orchestrator over a memory store, a fake runner and a fake oracle,
/// with working trees and locks under a temp directory.
pub struct Harness {
    pub dir: TempDir,
    pub config: Config,
    pub runner: Arc<FakeRunner>,
    pub oracle: Arc<FakeOracle>,
    pub store: Arc<MemoryStore>,
    pub sink: RecordingSink,
    pub orchestrator: Orchestrator,
}

impl Harness {
    pub fn new() -> Self {
        init_tracing();
        let dir = tempfile::tempdir().unwrap();
        let config = Config {
            apps_dir: dir.path().join("apps"),
            state_dir: dir.path().join("state"),
            ..Config::default()
        };
        let runner = Arc::new(FakeRunner::new());
        let oracle = Arc::new(FakeOracle::new());
        let store = Arc::new(MemoryStore::new(config.ports.internal_base));
        let orchestrator = Orchestrator::from_config(
            &config,
            RuntimeType::Docker,
            store.clone(),
            runner.clone(),
            oracle.clone(),
        );
        Self {
            dir,
            config,
            runner,
            oracle,
            store,
            sink: RecordingSink::default(),
            orchestrator,
        }
    }

    /// Publish `owner/repo` on the fake provider, clonable with `files`.
    pub fn publish(&self, name: &str, files: &[(&str, &str)]) -> String {
        self.oracle.public(name);
        self.runner
            .add_repo(&format!("https://github.com/{name}.git"), files);
        format!("https://github.com/{name}")
    }

    pub async fn register(&self, url: &str, container_port: u32) -> ApplicationRecord {
        self.orchestrator
            .register(url, ContainerPort::new(container_port).unwrap())
            .await
            .expect("registration should succeed")
    }

    pub async fn deploy(
        &self,
        id: ApplicationId,
    ) -> (Result<ApplicationStatus, DeployError>, Diagnostics) {
        let mut diag = Diagnostics::default();
        let result = self.orchestrator.deploy(id, &self.sink, &mut diag).await;
        (result, diag)
    }

    pub async fn status(&self, id: ApplicationId) -> ApplicationStatus {
        self.store.load(id).await.unwrap().status
    }

    pub fn tree(&self, id: ApplicationId) -> std::path::PathBuf {
        self.config.apps_dir.join(id.slug())
    }
}

/// Dockerfile contents used by buildable fixtures.
pub const DOCKERFILE: &str = "FROM scratch\nCOPY . /app\n";

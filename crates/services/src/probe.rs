//! Locating Python and FFmpeg on the host.
//!
//! Each tool is tried by command name first, then at a short list of
//! well-known install locations. The first candidate that answers its
//! version flag with exit code 0 wins.

use crate::process::{ProcessOutput, ProcessRunner, RunError};
use shared::environment::{DetectionResult, ProbeEvent, ProbeSelection, Tool, ValidationFailure};
use std::path::{Path, PathBuf};
use std::sync::mpsc::Sender;
use std::time::Duration;
use tracing::{debug, info};

/// Per-candidate timeout during automatic detection
pub const PROBE_TIMEOUT: Duration = Duration::from_secs(5);
/// Timeout for a user-chosen executable
pub const MANUAL_TIMEOUT: Duration = Duration::from_secs(10);

/// How to find and identify one tool
#[derive(Debug, Clone)]
pub struct ToolSpec {
    pub tool: Tool,
    /// Command names tried in order against PATH
    pub commands: Vec<&'static str>,
    pub common_paths: Vec<PathBuf>,
    pub version_flag: &'static str,
}

impl ToolSpec {
    pub fn for_host(tool: Tool) -> Self {
        Self::for_platform(tool, cfg!(windows))
    }

    pub fn for_platform(tool: Tool, windows: bool) -> Self {
        match tool {
            Tool::Interpreter => {
                let mut commands = vec!["python", "python3"];
                let common_paths = if windows {
                    commands.push("py");
                    windows_python_paths(std::env::var("USERNAME").ok().as_deref())
                } else {
                    ["/usr/bin/python3", "/usr/local/bin/python3", "/opt/homebrew/bin/python3"]
                        .iter()
                        .map(PathBuf::from)
                        .collect()
                };
                Self {
                    tool,
                    commands,
                    common_paths,
                    version_flag: "--version",
                }
            }
            Tool::MediaTool => {
                let common_paths = if windows {
                    [
                        r"C:\ffmpeg\bin\ffmpeg.exe",
                        r"C:\Program Files\ffmpeg\bin\ffmpeg.exe",
                        r"C:\Program Files (x86)\ffmpeg\bin\ffmpeg.exe",
                    ]
                    .iter()
                    .map(PathBuf::from)
                    .collect()
                } else {
                    ["/usr/bin/ffmpeg", "/usr/local/bin/ffmpeg", "/opt/homebrew/bin/ffmpeg"]
                        .iter()
                        .map(PathBuf::from)
                        .collect()
                };
                Self {
                    tool,
                    commands: vec!["ffmpeg"],
                    common_paths,
                    version_flag: "-version",
                }
            }
        }
    }

    /// Pull the version string out of a successful run.
    ///
    /// Older Pythons print `--version` to stderr; ffmpeg prints a banner
    /// whose first line carries the version.
    pub fn extract_version(&self, output: &ProcessOutput) -> String {
        match self.tool {
            Tool::Interpreter => {
                let stdout = output.stdout.trim();
                if stdout.is_empty() {
                    output.stderr.trim().to_string()
                } else {
                    stdout.to_string()
                }
            }
            Tool::MediaTool => output
                .stdout
                .lines()
                .next()
                .unwrap_or_default()
                .trim()
                .to_string(),
        }
    }
}

fn windows_python_paths(username: Option<&str>) -> Vec<PathBuf> {
    let versions = ["Python311", "Python310", "Python39"];
    let mut paths: Vec<PathBuf> = versions
        .iter()
        .map(|v| PathBuf::from(format!(r"C:\{}\python.exe", v)))
        .collect();
    if let Some(user) = username {
        paths.extend(versions.iter().map(|v| {
            PathBuf::from(format!(
                r"C:\Users\{}\AppData\Local\Programs\Python\{}\python.exe",
                user, v
            ))
        }));
    }
    paths
}

/// Normalize a detected path for display on this host.
pub fn normalize_path(path: &Path) -> String {
    normalize_path_for(path, cfg!(windows))
}

/// Collapse redundant components and, for Windows, use backslashes and a
/// lowercase `.exe` extension.
pub fn normalize_path_for(path: &Path, windows: bool) -> String {
    let cleaned: PathBuf = path.components().collect();
    let mut s = cleaned.display().to_string();
    if windows {
        s = s.replace('/', "\\");
        let split = s.len().saturating_sub(4);
        if s.is_char_boundary(split) && s[split..].eq_ignore_ascii_case(".exe") {
            s.replace_range(split.., ".exe");
        }
    }
    s
}

async fn try_candidate<R>(runner: &R, spec: &ToolSpec, program: &Path) -> Option<String>
where
    R: ProcessRunner + ?Sized,
{
    match runner.run(program, &[spec.version_flag], PROBE_TIMEOUT).await {
        Ok(output) if output.success => Some(spec.extract_version(&output)),
        Ok(output) => {
            debug!(
                "{} exited with {} during {} probe",
                program.display(),
                output.exit_code,
                spec.tool
            );
            None
        }
        Err(e) => {
            debug!("{} probe candidate failed: {}", spec.tool, e);
            None
        }
    }
}

/// Find one tool. Never fails; a miss is a not-found result.
pub async fn probe_tool<R>(runner: &R, spec: &ToolSpec) -> DetectionResult
where
    R: ProcessRunner + ?Sized,
{
    for name in &spec.commands {
        if let Some(version) = try_candidate(runner, spec, Path::new(name)).await {
            let path = runner
                .which(name)
                .map(|p| normalize_path(&p))
                .unwrap_or_else(|| name.to_string());
            info!("Found {} via `{}`: {}", spec.tool, name, version);
            return DetectionResult::found(spec.tool, path, version);
        }
    }

    for path in &spec.common_paths {
        if !runner.exists(path) {
            continue;
        }
        if let Some(version) = try_candidate(runner, spec, path).await {
            info!("Found {} at {}: {}", spec.tool, path.display(), version);
            return DetectionResult::found(spec.tool, normalize_path(path), version);
        }
    }

    info!("{} not found", spec.tool);
    DetectionResult::not_found(spec.tool, format!("{} not found", spec.tool))
}

/// Probe the selected tools in order, interpreter first.
///
/// Sends one `Detected` per tool, then `Finished`. Send errors mean the UI
/// went away and are ignored.
pub async fn run_probe<R>(runner: &R, selection: ProbeSelection, tx: &Sender<ProbeEvent>)
where
    R: ProcessRunner + ?Sized,
{
    for tool in selection.tools() {
        let spec = ToolSpec::for_host(tool);
        let result = probe_tool(runner, &spec).await;
        let _ = tx.send(ProbeEvent::Detected(result));
    }
    let _ = tx.send(ProbeEvent::Finished);
}

/// Check an executable the user picked by hand.
pub async fn validate_manual_path<R>(
    runner: &R,
    tool: Tool,
    path: &Path,
) -> Result<DetectionResult, ValidationFailure>
where
    R: ProcessRunner + ?Sized,
{
    if !runner.exists(path) {
        return Err(ValidationFailure::NotFound);
    }
    if !runner.is_executable(path) {
        return Err(ValidationFailure::NotExecutable);
    }

    let spec = ToolSpec::for_host(tool);
    match runner.run(path, &[spec.version_flag], MANUAL_TIMEOUT).await {
        Ok(output) if output.success => Ok(DetectionResult::found(
            tool,
            normalize_path(path),
            spec.extract_version(&output),
        )),
        Ok(_) => Err(ValidationFailure::Invalid(tool)),
        Err(RunError::TimedOut { .. }) => Err(ValidationFailure::TimedOut),
        Err(e) => Err(ValidationFailure::Other(e.to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::collections::{HashMap, HashSet};
    use std::sync::mpsc;
    use std::sync::Mutex;

    enum Script {
        Ok(&'static str, &'static str),
        Exit(i32),
        Hang,
    }

    /// Answers from a table instead of spawning anything
    #[derive(Default)]
    struct ScriptedRunner {
        scripts: HashMap<String, Script>,
        on_path: HashMap<String, PathBuf>,
        files: HashSet<PathBuf>,
        executable: HashSet<PathBuf>,
        calls: Mutex<Vec<String>>,
    }

    impl ScriptedRunner {
        fn script(mut self, program: &str, script: Script) -> Self {
            self.scripts.insert(program.to_string(), script);
            self
        }

        fn file(mut self, path: &str, executable: bool) -> Self {
            self.files.insert(PathBuf::from(path));
            if executable {
                self.executable.insert(PathBuf::from(path));
            }
            self
        }

        fn calls(&self) -> Vec<String> {
            self.calls.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl ProcessRunner for ScriptedRunner {
        async fn run(
            &self,
            program: &Path,
            _args: &[&str],
            timeout: Duration,
        ) -> Result<ProcessOutput, RunError> {
            let key = program.display().to_string();
            self.calls.lock().unwrap().push(key.clone());
            match self.scripts.get(&key) {
                Some(Script::Ok(stdout, stderr)) => Ok(ProcessOutput {
                    success: true,
                    exit_code: 0,
                    stdout: stdout.to_string(),
                    stderr: stderr.to_string(),
                }),
                Some(Script::Exit(code)) => Ok(ProcessOutput {
                    success: false,
                    exit_code: *code,
                    ..Default::default()
                }),
                Some(Script::Hang) => Err(RunError::TimedOut {
                    program: key,
                    timeout,
                }),
                None => Err(RunError::Spawn {
                    program: key,
                    source: std::io::Error::from(std::io::ErrorKind::NotFound),
                }),
            }
        }

        fn which(&self, name: &str) -> Option<PathBuf> {
            self.on_path.get(name).cloned()
        }

        fn exists(&self, path: &Path) -> bool {
            self.files.contains(path)
        }

        fn is_executable(&self, path: &Path) -> bool {
            self.executable.contains(path)
        }
    }

    fn unix_spec(tool: Tool) -> ToolSpec {
        ToolSpec::for_platform(tool, false)
    }

    #[tokio::test]
    async fn test_first_command_wins() {
        let mut runner = ScriptedRunner::default()
            .script("python", Script::Ok("Python 3.11.4\n", ""))
            .script("python3", Script::Ok("Python 3.12.0\n", ""));
        runner
            .on_path
            .insert("python".into(), PathBuf::from("/usr/bin/python"));

        let result = probe_tool(&runner, &unix_spec(Tool::Interpreter)).await;
        assert!(result.found);
        assert_eq!(result.path, "/usr/bin/python");
        assert_eq!(result.version, "Python 3.11.4");
        assert_eq!(runner.calls(), vec!["python"]);
    }

    #[tokio::test]
    async fn test_falls_back_to_secondary_name() {
        let runner = ScriptedRunner::default()
            .script("python", Script::Exit(9009))
            .script("python3", Script::Ok("", "Python 3.9.18\n"));

        let result = probe_tool(&runner, &unix_spec(Tool::Interpreter)).await;
        assert!(result.found);
        // Not resolvable through which(), so the bare name is reported
        assert_eq!(result.path, "python3");
        assert_eq!(result.version, "Python 3.9.18");
    }

    #[tokio::test]
    async fn test_falls_back_to_common_path() {
        let runner = ScriptedRunner::default()
            .file("/usr/local/bin/ffmpeg", true)
            .script(
                "/usr/local/bin/ffmpeg",
                Script::Ok("ffmpeg version 6.1 Copyright (c)\nbuilt with gcc\n", ""),
            );

        let result = probe_tool(&runner, &unix_spec(Tool::MediaTool)).await;
        assert!(result.found);
        assert_eq!(result.path, "/usr/local/bin/ffmpeg");
        assert_eq!(result.version, "ffmpeg version 6.1 Copyright (c)");
        // Missing common paths are skipped without running them
        assert_eq!(runner.calls(), vec!["ffmpeg", "/usr/local/bin/ffmpeg"]);
    }

    #[tokio::test]
    async fn test_timeout_moves_to_next_candidate() {
        let runner = ScriptedRunner::default()
            .script("python", Script::Hang)
            .script("python3", Script::Ok("Python 3.10.0", ""));

        let result = probe_tool(&runner, &unix_spec(Tool::Interpreter)).await;
        assert!(result.found);
        assert_eq!(result.version, "Python 3.10.0");
    }

    #[tokio::test]
    async fn test_nothing_found() {
        let runner = ScriptedRunner::default();
        let result = probe_tool(&runner, &unix_spec(Tool::MediaTool)).await;
        assert!(!result.found);
        assert_eq!(result.path, "FFmpeg not found");
        assert!(result.version.is_empty());
    }

    #[tokio::test]
    async fn test_run_probe_reports_in_order() {
        let runner = ScriptedRunner::default()
            .script("python", Script::Ok("Python 3.11.4", ""));
        let (tx, rx) = mpsc::channel();

        run_probe(&runner, ProbeSelection::Both, &tx).await;
        let events: Vec<ProbeEvent> = rx.try_iter().collect();

        assert_eq!(events.len(), 3);
        match (&events[0], &events[1]) {
            (ProbeEvent::Detected(first), ProbeEvent::Detected(second)) => {
                assert_eq!(first.tool, Tool::Interpreter);
                assert!(first.found);
                assert_eq!(second.tool, Tool::MediaTool);
                assert!(!second.found);
            }
            other => panic!("unexpected events: {:?}", other),
        }
        assert_eq!(events[2], ProbeEvent::Finished);
    }

    #[tokio::test]
    async fn test_run_probe_single_tool() {
        let runner = ScriptedRunner::default();
        let (tx, rx) = mpsc::channel();

        run_probe(&runner, ProbeSelection::MediaToolOnly, &tx).await;
        let events: Vec<ProbeEvent> = rx.try_iter().collect();
        assert_eq!(events.len(), 2);
        assert!(matches!(&events[0], ProbeEvent::Detected(r) if r.tool == Tool::MediaTool));
    }

    #[tokio::test]
    async fn test_manual_path_checks_in_order() {
        let runner = ScriptedRunner::default()
            .file("/opt/ff/ffmpeg", false)
            .file("/opt/ff/ffmpeg-ok", true)
            .file("/opt/ff/not-ffmpeg", true)
            .file("/opt/ff/slow", true)
            .script("/opt/ff/ffmpeg-ok", Script::Ok("ffmpeg version 7.0\n", ""))
            .script("/opt/ff/not-ffmpeg", Script::Exit(1))
            .script("/opt/ff/slow", Script::Hang);

        let missing = validate_manual_path(&runner, Tool::MediaTool, Path::new("/nope")).await;
        assert_eq!(missing, Err(ValidationFailure::NotFound));

        let not_exec =
            validate_manual_path(&runner, Tool::MediaTool, Path::new("/opt/ff/ffmpeg")).await;
        assert_eq!(not_exec, Err(ValidationFailure::NotExecutable));

        let invalid =
            validate_manual_path(&runner, Tool::MediaTool, Path::new("/opt/ff/not-ffmpeg")).await;
        assert_eq!(invalid, Err(ValidationFailure::Invalid(Tool::MediaTool)));

        let slow = validate_manual_path(&runner, Tool::MediaTool, Path::new("/opt/ff/slow")).await;
        assert_eq!(slow, Err(ValidationFailure::TimedOut));

        let ok = validate_manual_path(&runner, Tool::MediaTool, Path::new("/opt/ff/ffmpeg-ok"))
            .await
            .unwrap();
        assert_eq!(ok.version, "ffmpeg version 7.0");
    }

    #[test]
    fn test_normalize_windows_extension() {
        assert_eq!(
            normalize_path_for(Path::new("C:/ffmpeg/bin/FFMPEG.EXE"), true),
            r"C:\ffmpeg\bin\FFMPEG.exe"
        );
        assert_eq!(
            normalize_path_for(Path::new("/usr/bin//python3"), false),
            "/usr/bin/python3"
        );
    }

    #[test]
    fn test_windows_spec_includes_py_launcher() {
        let spec = ToolSpec::for_platform(Tool::Interpreter, true);
        assert_eq!(spec.commands, vec!["python", "python3", "py"]);
        assert!(spec
            .common_paths
            .contains(&PathBuf::from(r"C:\Python311\python.exe")));

        let paths = windows_python_paths(Some("alice"));
        assert_eq!(paths.len(), 6);
        assert!(paths[3].display().to_string().contains(r"Users\alice\AppData"));
    }
}

//! Placing documents under the target directory, by symlink or by copy.

use crate::error::{Result, StageError};
use crate::mode::RunMode;
use crate::scan::DocumentEntry;
use std::fs;
use std::io;
use std::path::{Component, Path, PathBuf};

/// What happened to a single document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// A symlink was created, pointing at `link_target` (relative to the target directory)
    Linked { link_target: PathBuf },
    /// Link creation failed with `reason`, so the file was copied instead
    CopiedAsFallback { reason: String },
    Copied,
}

impl Outcome {
    pub fn is_copy(&self) -> bool {
        !matches!(self, Outcome::Linked { .. })
    }
}

/// Creates links. A seam so link failure can be exercised without a hostile filesystem.
pub trait Linker {
    /// Create a link at `link` whose stored target is `original`.
    fn link(&self, original: &Path, link: &Path) -> io::Result<()>;
}

/// The platform's file symlink call
#[derive(Debug, Default, Clone, Copy)]
pub struct SymlinkLinker;

impl Linker for SymlinkLinker {
    #[cfg(unix)]
    fn link(&self, original: &Path, link: &Path) -> io::Result<()> {
        std::os::unix::fs::symlink(original, link)
    }

    #[cfg(windows)]
    fn link(&self, original: &Path, link: &Path) -> io::Result<()> {
        std::os::windows::fs::symlink_file(original, link)
    }

    #[cfg(not(any(unix, windows)))]
    fn link(&self, _original: &Path, _link: &Path) -> io::Result<()> {
        Err(io::Error::new(
            io::ErrorKind::Unsupported,
            "symbolic links are not supported on this platform",
        ))
    }
}

/// Path from directory `from_dir` to `to`, both absolute, expressed with `..` hops.
pub fn relative_link_target(from_dir: &Path, to: &Path) -> PathBuf {
    let from: Vec<Component<'_>> = from_dir.components().collect();
    let to_parts: Vec<Component<'_>> = to.components().collect();

    let shared = from
        .iter()
        .zip(to_parts.iter())
        .take_while(|(a, b)| a == b)
        .count();

    let mut relative = PathBuf::new();
    for _ in shared..from.len() {
        relative.push("..");
    }
    for part in &to_parts[shared..] {
        relative.push(part.as_os_str());
    }

    if relative.as_os_str().is_empty() {
        PathBuf::from(".")
    } else {
        relative
    }
}

/// Per-run result of materializing every scanned document.
#[derive(Debug, Clone)]
pub struct MaterializeReport {
    pub mode: RunMode,
    pub outcomes: Vec<(String, Outcome)>,
}

impl MaterializeReport {
    pub fn processed(&self) -> usize {
        self.outcomes.len()
    }

    pub fn linked(&self) -> usize {
        self.count(|o| matches!(o, Outcome::Linked { .. }))
    }

    pub fn copied(&self) -> usize {
        self.count(|o| matches!(o, Outcome::Copied))
    }

    pub fn fallbacks(&self) -> usize {
        self.count(|o| matches!(o, Outcome::CopiedAsFallback { .. }))
    }

    fn count(&self, pred: impl Fn(&Outcome) -> bool) -> usize {
        self.outcomes.iter().filter(|(_, o)| pred(o)).count()
    }
}

pub struct Materializer {
    source: PathBuf,
    target: PathBuf,
    mode: RunMode,
    linker: Box<dyn Linker>,
}

impl Materializer {
    pub fn new(source: impl Into<PathBuf>, target: impl Into<PathBuf>, mode: RunMode) -> Self {
        Self {
            source: source.into(),
            target: target.into(),
            mode,
            linker: Box::new(SymlinkLinker),
        }
    }

    /// Replace the default symlink implementation
    pub fn with_linker(mut self, linker: impl Linker + 'static) -> Self {
        self.linker = Box::new(linker);
        self
    }

    pub fn mode(&self) -> RunMode {
        self.mode
    }

    /// Materialize every entry in order. Stops at the first fatal copy error.
    pub fn materialize_all(&self, entries: &[DocumentEntry]) -> Result<MaterializeReport> {
        match self.mode {
            RunMode::Link => tracing::info!("Creating symlinks..."),
            RunMode::Copy => tracing::info!("Copying files..."),
        }

        let mut outcomes = Vec::with_capacity(entries.len());
        for entry in entries {
            let outcome = self.materialize_one(entry)?;
            outcomes.push((entry.name.clone(), outcome));
        }

        tracing::info!(
            "✓ {} complete, processed {} files",
            self.mode.describe(),
            outcomes.len()
        );

        Ok(MaterializeReport {
            mode: self.mode,
            outcomes,
        })
    }

    pub fn materialize_one(&self, entry: &DocumentEntry) -> Result<Outcome> {
        let source_file = self.source.join(&entry.name);
        let target_file = self.target.join(&entry.name);

        match self.mode {
            RunMode::Copy => {
                copy_file(&source_file, &target_file)?;
                tracing::info!("  ✓ {}", entry.name);
                Ok(Outcome::Copied)
            }
            RunMode::Link => {
                let link_target = self.link_target_for(&target_file, &source_file)?;
                match self.linker.link(&link_target, &target_file) {
                    Ok(()) => {
                        tracing::info!("  ✓ {} -> {}", entry.name, link_target.display());
                        Ok(Outcome::Linked { link_target })
                    }
                    Err(err) => {
                        tracing::warn!("  Symlink failed for {}: {}", entry.name, err);
                        copy_file(&source_file, &target_file)?;
                        tracing::info!("  Fell back to copy: {}", entry.name);
                        Ok(Outcome::CopiedAsFallback {
                            reason: err.to_string(),
                        })
                    }
                }
            }
        }
    }

    /// Relative path from the link's own directory to the source file
    fn link_target_for(&self, target_file: &Path, source_file: &Path) -> Result<PathBuf> {
        let link_dir = target_file.parent().unwrap_or(&self.target);
        let link_dir = canonical(link_dir)?;
        let source_file = canonical(source_file)?;
        Ok(relative_link_target(&link_dir, &source_file))
    }
}

fn canonical(path: &Path) -> Result<PathBuf> {
    fs::canonicalize(path).map_err(|source| StageError::Resolve {
        path: path.to_path_buf(),
        source,
    })
}

fn copy_file(from: &Path, to: &Path) -> Result<()> {
    fs::copy(from, to).map_err(|source| StageError::Copy {
        from: from.to_path_buf(),
        to: to.to_path_buf(),
        source,
    })?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};
    use tempfile::{tempdir, TempDir};

    /// Collects formatted log output in memory
    #[derive(Clone, Default)]
    struct CapturedLogs(Arc<Mutex<Vec<u8>>>);

    impl io::Write for CapturedLogs {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    impl CapturedLogs {
        fn contents(&self) -> String {
            String::from_utf8(self.0.lock().unwrap().clone()).unwrap()
        }
    }

    struct FailingLinker;

    impl Linker for FailingLinker {
        fn link(&self, _original: &Path, _link: &Path) -> io::Result<()> {
            Err(io::Error::new(io::ErrorKind::PermissionDenied, "links disabled"))
        }
    }

    /// Fails for one filename, links normally otherwise
    struct FailFor(&'static str);

    impl Linker for FailFor {
        fn link(&self, original: &Path, link: &Path) -> io::Result<()> {
            if link.file_name().and_then(|n| n.to_str()) == Some(self.0) {
                Err(io::Error::other("refused"))
            } else {
                SymlinkLinker.link(original, link)
            }
        }
    }

    fn fixture(names: &[&str]) -> (TempDir, PathBuf, PathBuf, Vec<DocumentEntry>) {
        let dir = tempdir().unwrap();
        let source = dir.path().join("advices");
        let target = dir.path().join("public").join("advices");
        fs::create_dir_all(&source).unwrap();
        fs::create_dir_all(&target).unwrap();
        let entries = names
            .iter()
            .map(|name| {
                fs::write(source.join(name), format!("# {name}\n")).unwrap();
                DocumentEntry::from_file_name(name).unwrap()
            })
            .collect();
        (dir, source, target, entries)
    }

    #[test]
    fn test_relative_link_target() {
        assert_eq!(
            relative_link_target(
                Path::new("/site/public/advices"),
                Path::new("/site/advices/a.md")
            ),
            PathBuf::from("../../advices/a.md")
        );
        assert_eq!(
            relative_link_target(Path::new("/site/out"), Path::new("/site/out/a.md")),
            PathBuf::from("a.md")
        );
        assert_eq!(
            relative_link_target(Path::new("/a/b"), Path::new("/c/d.md")),
            PathBuf::from("../../c/d.md")
        );
        assert_eq!(
            relative_link_target(Path::new("/a"), Path::new("/a")),
            PathBuf::from(".")
        );
    }

    #[test]
    fn test_copy_mode_copies_bytes() {
        let (_dir, source, target, entries) = fixture(&["b.md", "a.md"]);
        let materializer = Materializer::new(&source, &target, RunMode::Copy);

        let report = materializer.materialize_all(&entries).unwrap();

        assert_eq!(report.processed(), 2);
        assert_eq!(report.copied(), 2);
        for entry in &entries {
            let out = target.join(&entry.name);
            assert!(!fs::symlink_metadata(&out).unwrap().file_type().is_symlink());
            assert_eq!(fs::read(&out).unwrap(), fs::read(source.join(&entry.name)).unwrap());
        }
    }

    #[test]
    fn test_copy_mode_missing_source_is_fatal() {
        let (_dir, source, target, _) = fixture(&[]);
        let ghost = DocumentEntry::from_file_name("ghost.md").unwrap();
        let materializer = Materializer::new(&source, &target, RunMode::Copy);

        let err = materializer.materialize_all(&[ghost]).unwrap_err();
        assert!(matches!(err, StageError::Copy { .. }));
    }

    #[cfg(unix)]
    #[test]
    fn test_link_mode_creates_relative_symlinks() {
        let (_dir, source, target, entries) = fixture(&["Writing_Style.md"]);
        let materializer = Materializer::new(&source, &target, RunMode::Link);

        let outcome = materializer.materialize_one(&entries[0]).unwrap();

        let expected = PathBuf::from("../../advices/Writing_Style.md");
        assert_eq!(outcome, Outcome::Linked { link_target: expected.clone() });

        let out = target.join("Writing_Style.md");
        assert!(fs::symlink_metadata(&out).unwrap().file_type().is_symlink());
        assert_eq!(fs::read_link(&out).unwrap(), expected);
        assert_eq!(
            fs::canonicalize(&out).unwrap(),
            fs::canonicalize(source.join("Writing_Style.md")).unwrap()
        );
    }

    #[test]
    fn test_link_failure_falls_back_to_copy() {
        let (_dir, source, target, entries) = fixture(&["a.md"]);
        let materializer =
            Materializer::new(&source, &target, RunMode::Link).with_linker(FailingLinker);

        let report = materializer.materialize_all(&entries).unwrap();

        assert_eq!(report.fallbacks(), 1);
        match &report.outcomes[0].1 {
            Outcome::CopiedAsFallback { reason } => assert!(reason.contains("links disabled")),
            other => panic!("unexpected outcome {other:?}"),
        }
        let out = target.join("a.md");
        assert!(fs::symlink_metadata(&out).unwrap().file_type().is_file());
        assert_eq!(fs::read(&out).unwrap(), fs::read(source.join("a.md")).unwrap());
    }

    #[test]
    fn test_link_failure_emits_warning() {
        let (_dir, source, target, entries) = fixture(&["Writing_Style.md"]);
        let materializer =
            Materializer::new(&source, &target, RunMode::Link).with_linker(FailingLinker);

        let logs = CapturedLogs::default();
        let writer = logs.clone();
        let subscriber = tracing_subscriber::fmt()
            .with_max_level(tracing::Level::INFO)
            .with_ansi(false)
            .with_writer(move || writer.clone())
            .finish();

        tracing::subscriber::with_default(subscriber, || {
            materializer.materialize_all(&entries).unwrap();
        });

        let output = logs.contents();
        let warning = output
            .lines()
            .find(|line| line.contains("WARN"))
            .unwrap_or_else(|| panic!("no warning in log output:\n{output}"));
        assert!(warning.contains("Writing_Style.md"), "{warning}");
        assert!(warning.contains("links disabled"), "{warning}");
        assert!(output.contains("Fell back to copy: Writing_Style.md"));
    }

    #[test]
    fn test_successful_copy_emits_no_warning() {
        let (_dir, source, target, entries) = fixture(&["a.md"]);
        let materializer = Materializer::new(&source, &target, RunMode::Copy);

        let logs = CapturedLogs::default();
        let writer = logs.clone();
        let subscriber = tracing_subscriber::fmt()
            .with_max_level(tracing::Level::WARN)
            .with_ansi(false)
            .with_writer(move || writer.clone())
            .finish();

        tracing::subscriber::with_default(subscriber, || {
            materializer.materialize_all(&entries).unwrap();
        });

        assert!(logs.contents().is_empty());
    }

    #[cfg(unix)]
    #[test]
    fn test_fallback_is_per_file() {
        let (_dir, source, target, entries) = fixture(&["c.md", "b.md", "a.md"]);
        let materializer =
            Materializer::new(&source, &target, RunMode::Link).with_linker(FailFor("b.md"));

        let report = materializer.materialize_all(&entries).unwrap();

        assert_eq!(report.processed(), 3);
        assert_eq!(report.linked(), 2);
        assert_eq!(report.fallbacks(), 1);
        assert!(report.outcomes[1].1.is_copy());
        assert!(fs::symlink_metadata(target.join("c.md")).unwrap().file_type().is_symlink());
        assert!(fs::symlink_metadata(target.join("b.md")).unwrap().file_type().is_file());
        assert!(fs::symlink_metadata(target.join("a.md")).unwrap().file_type().is_symlink());
    }
}

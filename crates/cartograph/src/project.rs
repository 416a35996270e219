// ABOUTME: Reference project that indexes source files on a background thread
// ABOUTME: Reports completion through FinishedParsing on the message bus

use cartograph_events::{Message, MessageDispatch};
use cartograph_logging::{PerfTimer, debug, info, warn};
use ignore::WalkBuilder;
use parking_lot::Mutex;
use serde::Deserialize;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use crate::collaborators::{FileRecord, Project, ProjectFactory, StorageCache};
use crate::error::ProjectError;

/// Name of the background indexing thread
pub const INDEXER_THREAD_NAME: &str = "indexer";

/// Per-directory ignore file honoured in addition to .gitignore
pub const IGNORE_FILE_NAME: &str = ".cartographignore";

#[derive(Debug, Deserialize)]
struct ProjectFile {
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    source_paths: Vec<PathBuf>,
}

/// Outcome of one indexing pass
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct IndexReport {
    pub full: bool,
    pub files_seen: usize,
    /// Files (re)parsed during this pass
    pub files_indexed: usize,
    pub files_unchanged: usize,
    pub files_removed: usize,
    pub cancelled: bool,
    pub duration: Duration,
}

struct IndexJob {
    sources: Vec<PathBuf>,
    full: bool,
    storage: Arc<dyn StorageCache>,
    known: Arc<Mutex<HashMap<PathBuf, FileRecord>>>,
    cancel: Arc<AtomicBool>,
}

impl IndexJob {
    fn run(self) -> IndexReport {
        let timer = PerfTimer::new("index_sources");
        let mut report = IndexReport {
            full: self.full,
            ..IndexReport::default()
        };

        let mut known = self.known.lock();
        if self.full {
            known.clear();
        }
        let mut current = HashMap::with_capacity(known.len());

        'sources: for source in &self.sources {
            let mut builder = WalkBuilder::new(source);
            builder.add_custom_ignore_filename(IGNORE_FILE_NAME);

            for entry in builder.build().filter_map(Result::ok) {
                if self.cancel.load(Ordering::Relaxed) {
                    report.cancelled = true;
                    break 'sources;
                }
                if !entry.file_type().is_some_and(|kind| kind.is_file()) {
                    continue;
                }

                let metadata = match entry.metadata() {
                    Ok(metadata) => metadata,
                    Err(err) => {
                        debug!(path = %entry.path().display(), error = %err, "Skipping unreadable file");
                        continue;
                    }
                };
                let record = FileRecord {
                    size: metadata.len(),
                    modified: metadata.modified().ok(),
                };
                let path = entry.into_path();

                report.files_seen += 1;
                if known.get(&path) == Some(&record) {
                    report.files_unchanged += 1;
                } else {
                    report.files_indexed += 1;
                }
                self.storage.record_file(path.clone(), record);
                current.insert(path, record);
            }
        }

        if !report.cancelled {
            report.files_removed = known.keys().filter(|path| !current.contains_key(*path)).count();
            *known = current;
        }

        report.duration = timer.finish();
        report
    }
}

/// A project rooted at a directory or described by a TOML project file
pub struct IndexedProject {
    settings_file_path: PathBuf,
    name: String,
    sources: Vec<PathBuf>,
    storage: Arc<dyn StorageCache>,
    events: Arc<dyn MessageDispatch>,
    known: Arc<Mutex<HashMap<PathBuf, FileRecord>>>,
    last_report: Arc<Mutex<Option<IndexReport>>>,
    cancel: Arc<AtomicBool>,
    indexer: Option<JoinHandle<()>>,
}

impl IndexedProject {
    /// Resolve the project at `path` without indexing it
    pub fn open(
        path: &Path,
        storage: Arc<dyn StorageCache>,
        events: Arc<dyn MessageDispatch>,
    ) -> Result<Self, ProjectError> {
        if !path.exists() {
            return Err(ProjectError::not_found(path));
        }

        let (name, sources) = if path.is_dir() {
            let name = path
                .file_name()
                .map(|name| name.to_string_lossy().into_owned())
                .unwrap_or_else(|| path.display().to_string());
            (name, vec![path.to_path_buf()])
        } else {
            Self::read_project_file(path)?
        };

        info!(project = %name, sources = sources.len(), "Opened project");
        Ok(Self {
            settings_file_path: path.to_path_buf(),
            name,
            sources,
            storage,
            events,
            known: Arc::new(Mutex::new(HashMap::new())),
            last_report: Arc::new(Mutex::new(None)),
            cancel: Arc::new(AtomicBool::new(false)),
            indexer: None,
        })
    }

    fn read_project_file(path: &Path) -> Result<(String, Vec<PathBuf>), ProjectError> {
        let content = std::fs::read_to_string(path)?;
        let file: ProjectFile = toml::from_str(&content)
            .map_err(|err| ProjectError::manifest_parse(path.to_path_buf(), err))?;

        if file.source_paths.is_empty() {
            return Err(ProjectError::invalid_manifest(
                path.to_path_buf(),
                "no source_paths configured",
            ));
        }

        let base = path.parent().unwrap_or_else(|| Path::new("."));
        let sources: Vec<PathBuf> = file
            .source_paths
            .iter()
            .map(|source| base.join(source))
            .collect();
        if let Some(missing) = sources.iter().find(|source| !source.exists()) {
            return Err(ProjectError::MissingSource {
                path: missing.clone(),
            });
        }

        let name = file.name.unwrap_or_else(|| {
            path.file_stem()
                .map(|stem| stem.to_string_lossy().into_owned())
                .unwrap_or_default()
        });
        Ok((name, sources))
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn source_paths(&self) -> &[PathBuf] {
        &self.sources
    }

    pub fn last_report(&self) -> Option<IndexReport> {
        *self.last_report.lock()
    }

    /// Block until the running indexing pass, if any, completes
    pub fn wait_for_indexing(&mut self) -> Option<IndexReport> {
        if let Some(handle) = self.indexer.take()
            && handle.join().is_err()
        {
            warn!(project = %self.name, "Indexer thread panicked");
        }
        self.last_report()
    }

    fn start_indexing(&mut self, full: bool) -> Result<(), ProjectError> {
        // A pass in flight stops at its next entry; the new pass supersedes it
        if self.indexer.is_some() {
            self.cancel.store(true, Ordering::Relaxed);
            self.wait_for_indexing();
        }
        self.cancel.store(false, Ordering::Relaxed);

        let job = IndexJob {
            sources: self.sources.clone(),
            full,
            storage: Arc::clone(&self.storage),
            known: Arc::clone(&self.known),
            cancel: Arc::clone(&self.cancel),
        };
        let last_report = Arc::clone(&self.last_report);
        let events = Arc::clone(&self.events);
        let project = self.name.clone();
        let settings_file_path = self.settings_file_path.clone();

        let handle = thread::Builder::new()
            .name(INDEXER_THREAD_NAME.to_string())
            .spawn(move || {
                let report = job.run();
                info!(
                    project = %project,
                    full = report.full,
                    files_seen = report.files_seen,
                    files_indexed = report.files_indexed,
                    files_removed = report.files_removed,
                    duration_ms = report.duration.as_millis(),
                    "Indexing pass finished"
                );
                *last_report.lock() = Some(report);
                if !report.cancelled {
                    events.dispatch(Message::finished_parsing(settings_file_path));
                }
            })
            .map_err(|err| ProjectError::indexing(err.to_string()))?;

        self.indexer = Some(handle);
        debug!(project = %self.name, full, "Indexing started");
        Ok(())
    }
}

impl Project for IndexedProject {
    fn refresh(&mut self) -> Result<(), ProjectError> {
        self.start_indexing(false)
    }

    fn force_refresh(&mut self) -> Result<(), ProjectError> {
        self.start_indexing(true)
    }

    fn log_stats(&self) {
        match self.last_report() {
            Some(report) => info!(
                project = %self.name,
                indexed_files = self.storage.file_count(),
                files_indexed = report.files_indexed,
                files_unchanged = report.files_unchanged,
                files_removed = report.files_removed,
                duration_ms = report.duration.as_millis(),
                "Project statistics"
            ),
            None => info!(project = %self.name, "Project has not been indexed yet"),
        }
    }

    fn settings_file_path(&self) -> &Path {
        &self.settings_file_path
    }
}

impl Drop for IndexedProject {
    fn drop(&mut self) {
        self.cancel.store(true, Ordering::Relaxed);
        self.wait_for_indexing();
    }
}

/// Opens [`IndexedProject`]s and starts their initial full index
#[derive(Debug, Clone)]
pub struct IndexedProjectFactory {
    index_on_open: bool,
}

impl IndexedProjectFactory {
    pub fn new() -> Self {
        Self {
            index_on_open: true,
        }
    }

    /// Open projects without starting an indexing pass
    pub fn without_initial_index() -> Self {
        Self {
            index_on_open: false,
        }
    }
}

impl Default for IndexedProjectFactory {
    fn default() -> Self {
        Self::new()
    }
}

impl ProjectFactory for IndexedProjectFactory {
    fn create(
        &self,
        path: &Path,
        storage: Arc<dyn StorageCache>,
        events: Arc<dyn MessageDispatch>,
    ) -> Result<Box<dyn Project>, ProjectError> {
        let mut project = IndexedProject::open(path, storage, events)?;
        if self.index_on_open {
            project.force_refresh()?;
        }
        Ok(Box::new(project))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryStorageCache;
    use std::fs;
    use tempfile::TempDir;

    #[derive(Default)]
    struct CountingDispatch(Mutex<Vec<Message>>);

    impl MessageDispatch for CountingDispatch {
        fn dispatch(&self, message: Message) {
            self.0.lock().push(message);
        }
    }

    fn source_tree() -> TempDir {
        let dir = TempDir::new().unwrap();
        fs::create_dir_all(dir.path().join("src/nested")).unwrap();
        fs::write(dir.path().join("src/main.rs"), "fn main() {}").unwrap();
        fs::write(dir.path().join("src/nested/lib.rs"), "pub fn lib() {}").unwrap();
        fs::write(dir.path().join(IGNORE_FILE_NAME), "*.log\n").unwrap();
        fs::write(dir.path().join("src/debug.log"), "noise").unwrap();
        dir
    }

    fn open(path: &Path) -> (IndexedProject, Arc<MemoryStorageCache>, Arc<CountingDispatch>) {
        let storage = Arc::new(MemoryStorageCache::new());
        let events = Arc::new(CountingDispatch::default());
        let project = IndexedProject::open(path, storage.clone(), events.clone()).unwrap();
        (project, storage, events)
    }

    #[test]
    fn test_directory_project_indexes_sources() {
        let dir = source_tree();
        let (mut project, storage, events) = open(dir.path());

        project.force_refresh().unwrap();
        let report = project.wait_for_indexing().unwrap();

        assert!(report.full);
        assert_eq!(report.files_indexed, 2);
        assert_eq!(storage.file_count(), 2);
        assert!(storage.file_record(&dir.path().join("src/main.rs")).is_some());
        assert!(storage.file_record(&dir.path().join("src/debug.log")).is_none());
        assert_eq!(
            *events.0.lock(),
            vec![Message::finished_parsing(dir.path())]
        );
    }

    #[test]
    fn test_incremental_refresh_reparses_only_changes() {
        let dir = source_tree();
        let (mut project, storage, events) = open(dir.path());

        project.force_refresh().unwrap();
        project.wait_for_indexing();

        fs::write(dir.path().join("src/extra.rs"), "pub struct Extra;").unwrap();
        fs::remove_file(dir.path().join("src/nested/lib.rs")).unwrap();
        storage.clear();

        project.refresh().unwrap();
        let report = project.wait_for_indexing().unwrap();

        assert!(!report.full);
        assert_eq!(report.files_seen, 2);
        assert_eq!(report.files_indexed, 1);
        assert_eq!(report.files_unchanged, 1);
        assert_eq!(report.files_removed, 1);
        assert_eq!(storage.file_count(), 2);
        assert_eq!(events.0.lock().len(), 2);
    }

    #[test]
    fn test_project_file_resolves_relative_sources() {
        let dir = source_tree();
        let project_file = dir.path().join("demo.toml");
        fs::write(&project_file, "name = \"Demo\"\nsource_paths = [\"src/nested\"]\n").unwrap();

        let (project, _storage, _events) = open(&project_file);

        assert_eq!(project.name(), "Demo");
        assert_eq!(project.source_paths(), &[dir.path().join("src/nested")]);
        assert_eq!(project.settings_file_path(), project_file.as_path());
    }

    #[test]
    fn test_open_errors() {
        let dir = TempDir::new().unwrap();
        let storage: Arc<dyn StorageCache> = Arc::new(MemoryStorageCache::new());
        let events: Arc<dyn MessageDispatch> = Arc::new(CountingDispatch::default());
        let open = |path: &Path| IndexedProject::open(path, storage.clone(), events.clone());

        assert!(matches!(
            open(&dir.path().join("missing.toml")),
            Err(ProjectError::NotFound { .. })
        ));

        let malformed = dir.path().join("malformed.toml");
        fs::write(&malformed, "source_paths = [").unwrap();
        assert!(matches!(
            open(&malformed),
            Err(ProjectError::ManifestParse { .. })
        ));

        let empty = dir.path().join("empty.toml");
        fs::write(&empty, "name = \"x\"\n").unwrap();
        assert!(matches!(
            open(&empty),
            Err(ProjectError::InvalidManifest { .. })
        ));

        let dangling = dir.path().join("dangling.toml");
        fs::write(&dangling, "source_paths = [\"nope\"]\n").unwrap();
        assert!(matches!(
            open(&dangling),
            Err(ProjectError::MissingSource { .. })
        ));
    }

    /// Storage that takes a while to record each file
    struct SlowStorage {
        inner: MemoryStorageCache,
        delay: Duration,
    }

    impl StorageCache for SlowStorage {
        fn clear(&self) {
            self.inner.clear();
        }

        fn record_file(&self, path: PathBuf, record: FileRecord) {
            thread::sleep(self.delay);
            self.inner.record_file(path, record);
        }

        fn file_record(&self, path: &Path) -> Option<FileRecord> {
            self.inner.file_record(path)
        }

        fn file_count(&self) -> usize {
            self.inner.file_count()
        }
    }

    #[test]
    fn test_refresh_supersedes_pass_in_flight() {
        let dir = TempDir::new().unwrap();
        for i in 0..8 {
            fs::write(dir.path().join(format!("file{i}.rs")), "// source").unwrap();
        }
        let storage = Arc::new(SlowStorage {
            inner: MemoryStorageCache::new(),
            delay: Duration::from_millis(200),
        });
        let events = Arc::new(CountingDispatch::default());
        let mut project = IndexedProject::open(dir.path(), storage.clone(), events.clone()).unwrap();

        project.force_refresh().unwrap();
        thread::sleep(Duration::from_millis(50));

        // The full pass needs 1.6s; refresh only waits for the entry being recorded
        let started = std::time::Instant::now();
        project.refresh().unwrap();
        assert!(started.elapsed() < Duration::from_millis(800));

        let report = project.wait_for_indexing().unwrap();
        assert!(!report.full);
        assert!(!report.cancelled);
        assert_eq!(report.files_seen, 8);
        assert_eq!(storage.file_count(), 8);
        assert_eq!(
            *events.0.lock(),
            vec![Message::finished_parsing(dir.path())]
        );
    }

    #[test]
    fn test_factory_starts_initial_index() {
        let dir = source_tree();
        let storage = Arc::new(MemoryStorageCache::new());
        let events = Arc::new(CountingDispatch::default());

        let project = IndexedProjectFactory::new()
            .create(dir.path(), storage.clone(), events.clone())
            .unwrap();
        // Dropping joins the indexer; it may or may not have been cancelled first
        drop(project);

        let idle = IndexedProjectFactory::without_initial_index()
            .create(dir.path(), storage.clone(), events.clone())
            .unwrap();
        drop(idle);
        assert!(events.0.lock().len() <= 1);
    }
}

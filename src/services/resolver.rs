//! Recursive order status resolution.
//!
//! Every directory is classified by the first rule that applies:
//!
//! 1. a work list (`list.xml`) is present: work was already dispatched, `Pending`;
//! 2. a file with `ready` in its name is present (first one in name order):
//!    - `ready` + `fasady`: facade list finished, must be copied out by hand, `Pending`;
//!    - `ready` + `order`: completion marker, `Ready` with the persisted tree as children;
//!    - plain ready marker: `Ready` with the date from its name;
//!
//!    a marker whose date cannot be read leaves the directory `Pending`;
//! 3. job files (`.xml`, `.mpr`) without stop words: part files are rewritten, a work
//!    list is written, `Pending`;
//! 4. subdirectories: resolved recursively; any `Other` child makes the directory
//!    `Other` at once, any `Pending` child makes it `Pending`, and when every child is
//!    `Ready` the directory is `Ready` as of the latest child date and a completion
//!    marker is written;
//! 5. nothing at all: `Other`.
//!
//! Rules 1–3 only look at file names and are decided by [`classify`] before anything is
//! written; [`StatusResolver`] then applies the plan.

use crate::metrics::ScanMetrics;
use crate::models::{ScanOptions, Status, StatusNode};
use crate::services::manifest::{self, FileFormat};
use crate::services::{naming, panels, report_codec};
use camino::{Utf8Path, Utf8PathBuf};
use std::io;

/// Marks a file as a ready marker
const READY_WORD: &str = "ready";
/// Ready marker of a facade list that still has to be handed over manually
const FACADE_WORD: &str = "fasady";
/// Ready marker that carries a persisted status tree
const ORDER_WORD: &str = "order";

/// Entries of one directory, each list sorted by name
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DirectoryListing {
    /// Full paths of subdirectories not on the ignore list
    pub subdirs: Vec<Utf8PathBuf>,
    /// Names of everything else
    pub files: Vec<String>,
}

/// A file that goes onto the work list
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobFile {
    pub name: String,
    pub format: FileFormat,
}

/// What the files of a directory say about it
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LocalPlan {
    /// Work list already present
    ManifestPresent,
    /// Finished facade list waiting to be copied out
    FacadeMarker { file: String },
    /// Completion marker holding a persisted status tree
    CompletionMarker { file: String, date: Option<String> },
    /// Plain ready marker
    ReadyMarker { file: String, date: Option<String> },
    /// Job files to rewrite and put on a new work list, in name order
    Dispatch(Vec<JobFile>),
    /// Files say nothing; fall through to subdirectories
    Nothing,
}

/// List `dir`, dropping ignored subdirectories.
///
/// Entries whose name is not valid UTF-8 or whose type cannot be read are skipped with
/// a warning; only failing to open the directory itself is an error.
pub fn list_directory(dir: &Utf8Path, options: &ScanOptions) -> io::Result<DirectoryListing> {
    let mut listing = DirectoryListing::default();

    for entry in dir.read_dir_utf8()? {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                tracing::warn!("Skipping unreadable entry in {}: {}", dir, e);
                continue;
            }
        };

        let file_type = match entry.file_type() {
            Ok(file_type) => file_type,
            Err(e) => {
                tracing::warn!("Skipping {}: {}", entry.path(), e);
                continue;
            }
        };

        let name = entry.file_name();
        if file_type.is_dir() {
            if options.is_ignored(name) {
                tracing::debug!("Ignoring directory {}", entry.path());
                continue;
            }
            listing.subdirs.push(entry.path().to_path_buf());
        } else {
            listing.files.push(name.to_string());
        }
    }

    listing.subdirs.sort();
    listing.files.sort();
    Ok(listing)
}

/// Decide what a directory's files (sorted names) call for. Pure: nothing is read or
/// written.
pub fn classify(files: &[String], options: &ScanOptions) -> LocalPlan {
    if files.iter().any(|file| options.is_manifest(file)) {
        return LocalPlan::ManifestPresent;
    }

    if let Some(marker) = files.iter().find(|file| naming::contains_word(file, READY_WORD)) {
        let file = marker.clone();
        return if naming::contains_word(marker, FACADE_WORD) {
            LocalPlan::FacadeMarker { file }
        } else if naming::contains_word(marker, ORDER_WORD) {
            LocalPlan::CompletionMarker {
                date: naming::ready_date(marker),
                file,
            }
        } else {
            LocalPlan::ReadyMarker {
                date: naming::ready_date(marker),
                file,
            }
        };
    }

    let jobs: Vec<JobFile> = files
        .iter()
        .filter(|file| !naming::has_stop_word(file, &options.stop_words))
        .filter_map(|file| {
            FileFormat::of_file_name(file).map(|format| JobFile {
                name: file.clone(),
                format,
            })
        })
        .collect();

    if jobs.is_empty() {
        LocalPlan::Nothing
    } else {
        LocalPlan::Dispatch(jobs)
    }
}

fn directory_name(dir: &Utf8Path) -> String {
    dir.file_name().unwrap_or(dir.as_str()).to_string()
}

/// Walks order directories and builds their status trees.
///
/// Holds only read-only configuration and the run's counters; every call works on its
/// own data, so one resolver serves a whole run.
pub struct StatusResolver<'a> {
    options: &'a ScanOptions,
    metrics: &'a ScanMetrics,
}

impl<'a> StatusResolver<'a> {
    pub fn new(options: &'a ScanOptions, metrics: &'a ScanMetrics) -> Self {
        Self { options, metrics }
    }

    /// Resolve every order directory directly below `root`.
    ///
    /// `root` itself is only a container: it never gets a work list or a completion
    /// marker. Failing to list it is the one error that is returned instead of logged.
    pub fn resolve_orders(&self, root: &Utf8Path) -> io::Result<Vec<StatusNode>> {
        let listing = list_directory(root, self.options)?;
        self.metrics.record_directory_scanned();

        if !listing.files.is_empty() {
            tracing::debug!("{} loose file(s) in {} left alone", listing.files.len(), root);
        }

        Ok(listing
            .subdirs
            .iter()
            .map(|order| self.resolve(order))
            .collect())
    }

    /// Resolve one directory and everything below it.
    ///
    /// Never fails: an unreadable directory is logged and reported as `Other`.
    pub fn resolve(&self, dir: &Utf8Path) -> StatusNode {
        let name = directory_name(dir);

        let listing = match list_directory(dir, self.options) {
            Ok(listing) => listing,
            Err(e) => {
                tracing::warn!("Cannot read directory {}: {}", dir, e);
                self.metrics.record_directory_unreadable();
                return StatusNode::other(name);
            }
        };
        self.metrics.record_directory_scanned();

        let plan = classify(&listing.files, self.options);
        if let Some(node) = self.apply(dir, &name, plan) {
            tracing::debug!("{}: {}", dir, node.status);
            return node;
        }

        if !listing.subdirs.is_empty() {
            return self.aggregate(dir, name, &listing.subdirs);
        }

        tracing::warn!("Nothing to process in {}, needs manual review", dir);
        self.metrics.record_manual_action();
        StatusNode::other(name)
    }

    /// Carry out a file-level plan. `None` means the files decided nothing.
    fn apply(&self, dir: &Utf8Path, name: &str, plan: LocalPlan) -> Option<StatusNode> {
        match plan {
            LocalPlan::ManifestPresent => Some(StatusNode::pending(name)),

            LocalPlan::FacadeMarker { file } => {
                tracing::warn!(
                    "{}: move {} into the facade folders by hand",
                    dir,
                    file
                );
                self.metrics.record_manual_action();
                Some(StatusNode::pending(name))
            }

            LocalPlan::CompletionMarker { file, date } => {
                let children = self.load_marker(&dir.join(&file));
                match date {
                    Some(date) => {
                        let level = if children.is_empty() {
                            0
                        } else {
                            StatusNode::max_level(&children) + 1
                        };
                        Some(
                            StatusNode::ready(name, date)
                                .with_level(level)
                                .with_children(children),
                        )
                    }
                    None => {
                        tracing::warn!("No ready date in marker name {}/{}", dir, file);
                        Some(StatusNode::pending(name).with_children(children))
                    }
                }
            }

            LocalPlan::ReadyMarker { file, date } => match date {
                Some(date) => Some(StatusNode::ready(name, date)),
                None => {
                    tracing::warn!("No ready date in marker name {}/{}", dir, file);
                    Some(StatusNode::pending(name))
                }
            },

            LocalPlan::Dispatch(jobs) => {
                self.dispatch(dir, jobs);
                Some(StatusNode::pending(name))
            }

            LocalPlan::Nothing => None,
        }
    }

    fn load_marker(&self, path: &Utf8Path) -> Vec<StatusNode> {
        match report_codec::read_marker(path) {
            Ok(nodes) => {
                self.metrics.record_marker_loaded();
                nodes
            }
            Err(e) => {
                tracing::warn!("{}", e);
                self.metrics.record_marker_failure();
                Vec::new()
            }
        }
    }

    /// Rewrite part files, then write the work list for all job files.
    fn dispatch(&self, dir: &Utf8Path, jobs: Vec<JobFile>) {
        let mut paths = Vec::with_capacity(jobs.len());

        for job in jobs {
            let path = dir.join(&job.name);
            if job.format == FileFormat::Xml {
                match panels::rewrite_part_file(&path) {
                    Ok(rewrite) => {
                        if rewrite.dirty {
                            self.metrics.record_part_file_rewritten();
                        }
                        self.metrics.record_panels_skipped(rewrite.skipped_panels);
                    }
                    Err(e) => {
                        tracing::warn!("{}: {}", path, e);
                        self.metrics.record_part_file_failure();
                    }
                }
            }
            paths.push(path);
        }

        manifest::sort_job_files(&mut paths);

        match manifest::write_manifest(
            dir,
            &self.options.manifest_name,
            &paths,
            self.options.detail_count,
        ) {
            Ok(_) => self.metrics.record_manifest_written(),
            Err(e) => {
                tracing::warn!("{}", e);
                self.metrics.record_manifest_failure();
            }
        }
    }

    /// Combine subdirectory outcomes (sorted order).
    fn aggregate(&self, dir: &Utf8Path, name: String, subdirs: &[Utf8PathBuf]) -> StatusNode {
        let mut children = Vec::with_capacity(subdirs.len());
        let mut max_level = 0;

        for subdir in subdirs {
            let child = self.resolve(subdir);
            max_level = max_level.max(child.level);

            if child.status == Status::Other {
                tracing::info!("{} needs attention, {} stays Other", subdir, dir);
                return StatusNode::other(name).with_level(max_level + 1);
            }
            children.push(child);
        }

        let level = max_level + 1;

        if children.iter().any(|child| child.status == Status::Pending) {
            return StatusNode::pending(name)
                .with_level(level)
                .with_children(children);
        }

        // Dates are YYYY-MM-DD, so the string maximum is the latest date.
        let date = children
            .iter()
            .map(|child| child.date_ready.as_str())
            .max()
            .unwrap_or_default()
            .to_string();

        let node = StatusNode::ready(name, date)
            .with_level(level)
            .with_children(children);

        match report_codec::write_marker(dir, &node) {
            Ok(_) => self.metrics.record_marker_written(),
            Err(e) => {
                tracing::warn!("{}", e);
                self.metrics.record_marker_failure();
            }
        }

        node
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn files(names: &[&str]) -> Vec<String> {
        names.iter().map(|name| name.to_string()).collect()
    }

    fn plan(names: &[&str]) -> LocalPlan {
        classify(&files(names), &ScanOptions::default())
    }

    #[test]
    fn test_manifest_wins() {
        assert_eq!(
            plan(&["1_2.mpr", "LIST.XML", "ready_20240101.xml"]),
            LocalPlan::ManifestPresent
        );
    }

    #[test]
    fn test_facade_marker() {
        assert_eq!(
            plan(&["ready_fasady_20240101.xml"]),
            LocalPlan::FacadeMarker {
                file: "ready_fasady_20240101.xml".to_string()
            }
        );
    }

    #[test]
    fn test_completion_marker() {
        assert_eq!(
            plan(&["order_ready_20240503.xml"]),
            LocalPlan::CompletionMarker {
                file: "order_ready_20240503.xml".to_string(),
                date: Some("2024-05-03".to_string()),
            }
        );
    }

    #[test]
    fn test_ready_marker_with_bad_date() {
        assert_eq!(
            plan(&["Ready_2024.xml"]),
            LocalPlan::ReadyMarker {
                file: "Ready_2024.xml".to_string(),
                date: None,
            }
        );
    }

    #[test]
    fn test_first_marker_decides() {
        assert_eq!(
            plan(&["a_ready_20240101.xml", "b_ready_fasady_20240101.xml"]),
            LocalPlan::ReadyMarker {
                file: "a_ready_20240101.xml".to_string(),
                date: Some("2024-01-01".to_string()),
            }
        );
    }

    #[test]
    fn test_marker_beats_job_files() {
        assert!(matches!(
            plan(&["1_2.xml", "ready_20240101.xml"]),
            LocalPlan::ReadyMarker { .. }
        ));
    }

    #[test]
    fn test_dispatch_filters_stop_words_and_extensions() {
        assert_eq!(
            plan(&["1_2.XML", "2_1.mpr", "fasady.xml", "notes.txt"]),
            LocalPlan::Dispatch(vec![
                JobFile {
                    name: "1_2.XML".to_string(),
                    format: FileFormat::Xml,
                },
                JobFile {
                    name: "2_1.mpr".to_string(),
                    format: FileFormat::Mpr,
                },
            ])
        );
    }

    #[test]
    fn test_nothing() {
        assert_eq!(plan(&["notes.txt"]), LocalPlan::Nothing);
        assert_eq!(plan(&[]), LocalPlan::Nothing);
    }
}

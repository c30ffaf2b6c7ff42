use camino::{Utf8Path, Utf8PathBuf};
use indexmap::IndexSet;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Name of the per-directory work list handed to the cutting machine
pub const MANIFEST_FILE_NAME: &str = "list.xml";

/// Substrings that keep a file out of the work list (facade lists, manifests, markers)
pub const DEFAULT_STOP_WORDS: [&str; 3] = ["fasady", "list", "ready"];

/// Report file name used when the settings leave `WorkReportFile` empty
pub const DEFAULT_REPORT_FILE: &str = "WorkReport.txt";

/// Settings file as stored on disk (`listMaker_settings.xml`).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename = "Root")]
pub struct SettingsFile {
    #[serde(rename = "IgnoreDirList", default)]
    pub ignore_dir_list: IgnoreDirList,

    #[serde(rename = "SourceDir", default)]
    pub source_dir: String,

    #[serde(rename = "TargetDir", default)]
    pub target_dir: String,

    #[serde(rename = "WorkReportFile", default)]
    pub work_report_file: String,

    #[serde(
        rename = "DetailCountTokens",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub detail_count_tokens: Option<u8>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct IgnoreDirList {
    #[serde(rename = "IgnoreDir", default)]
    pub ignore_dir: Vec<IgnoreDir>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IgnoreDir {
    #[serde(rename = "@Name")]
    pub name: String,
}

/// Errors in otherwise well-formed settings
#[derive(Error, Debug, PartialEq, Eq)]
pub enum SettingsError {
    #[error("DetailCountTokens must be 2 or 3, got {0}")]
    InvalidDetailCountTokens(u8),
}

/// Which file-name convention carries the planned detail count.
///
/// Both conventions read the count from the second `_` token; they differ in
/// how many tokens a name must have before the count is trusted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DetailCountConvention {
    /// `ID_COUNT[_...]`
    #[default]
    TwoToken,
    /// `ID_COUNT_REST[_...]`, the older naming scheme
    ThreeToken,
}

impl DetailCountConvention {
    pub fn from_tokens(tokens: u8) -> Result<Self, SettingsError> {
        match tokens {
            2 => Ok(Self::TwoToken),
            3 => Ok(Self::ThreeToken),
            other => Err(SettingsError::InvalidDetailCountTokens(other)),
        }
    }

    /// Minimum number of `_`-separated tokens required
    pub fn min_tokens(&self) -> usize {
        match self {
            Self::TwoToken => 2,
            Self::ThreeToken => 3,
        }
    }
}

/// Settings after path resolution; immutable for the rest of the run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    /// Lower-cased directory names skipped during the walk
    pub ignore_list: IndexSet<String>,
    pub source_dir: Utf8PathBuf,
    pub target_dir: Utf8PathBuf,
    pub report_file_name: String,
    pub detail_count: DetailCountConvention,
}

impl Settings {
    /// Resolve a parsed settings file. Relative directories are taken
    /// relative to `base_dir`, the folder holding the settings file.
    pub fn from_file(file: SettingsFile, base_dir: &Utf8Path) -> Result<Self, SettingsError> {
        let ignore_list = file
            .ignore_dir_list
            .ignore_dir
            .iter()
            .map(|dir| dir.name.trim().to_lowercase())
            .filter(|name| !name.is_empty())
            .collect();

        let source = match file.source_dir.trim() {
            "" => ".",
            value => value,
        };

        let report_file_name = match file.work_report_file.trim() {
            "" => DEFAULT_REPORT_FILE.to_string(),
            value => value.to_string(),
        };

        let detail_count = match file.detail_count_tokens {
            Some(tokens) => DetailCountConvention::from_tokens(tokens)?,
            None => DetailCountConvention::default(),
        };

        Ok(Self {
            ignore_list,
            source_dir: resolve_against(base_dir, source),
            target_dir: resolve_against(base_dir, file.target_dir.trim()),
            report_file_name,
            detail_count,
        })
    }

    /// Keep a directory the tool writes into (logs, archive) out of the walk when it
    /// sits below `root`, by ignoring its name. Returns true if the name was added.
    pub fn ignore_nested_dir(&mut self, root: &Utf8Path, dir: &Utf8Path) -> bool {
        if dir == root || !dir.starts_with(root) {
            return false;
        }
        match dir.file_name() {
            Some(name) => self.ignore_list.insert(name.to_lowercase()),
            None => false,
        }
    }

    /// Options handed to the status resolver
    pub fn scan_options(&self) -> ScanOptions {
        ScanOptions {
            ignore_list: self.ignore_list.clone(),
            detail_count: self.detail_count,
            ..ScanOptions::default()
        }
    }
}

/// Read-only configuration for one directory walk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScanOptions {
    /// Lower-cased directory names to skip
    pub ignore_list: IndexSet<String>,
    /// Lower-cased stop words
    pub stop_words: Vec<String>,
    pub manifest_name: String,
    pub detail_count: DetailCountConvention,
}

impl Default for ScanOptions {
    fn default() -> Self {
        Self {
            ignore_list: IndexSet::new(),
            stop_words: DEFAULT_STOP_WORDS.iter().map(|w| w.to_string()).collect(),
            manifest_name: MANIFEST_FILE_NAME.to_string(),
            detail_count: DetailCountConvention::default(),
        }
    }
}

impl ScanOptions {
    /// Case-insensitive match of a directory name against the ignore list
    pub fn is_ignored(&self, dir_name: &str) -> bool {
        self.ignore_list.contains(&dir_name.to_lowercase())
    }

    /// Whether `file_name` is this directory's work list
    pub fn is_manifest(&self, file_name: &str) -> bool {
        file_name.eq_ignore_ascii_case(&self.manifest_name)
    }
}

/// Join `value` onto `base` unless it is already absolute, then drop `.`
/// components lexically.
pub fn resolve_against(base: &Utf8Path, value: &str) -> Utf8PathBuf {
    let path = Utf8Path::new(value);
    let joined = if path.is_absolute() {
        path.to_path_buf()
    } else {
        base.join(path)
    };
    joined.components().collect()
}

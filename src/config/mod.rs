use crate::models::{Settings, SettingsFile};
use anyhow::{Context, Result};
use camino::{Utf8Path, Utf8PathBuf};
use std::fs;

/// Settings file name looked up next to the executable
pub const SETTINGS_FILE_NAME: &str = "listMaker_settings.xml";

/// Written when no settings file exists yet
pub const DEFAULT_SETTINGS: &str = r##"<?xml version="1.0" encoding="utf-8" ?>
<Root>
	<IgnoreDirList>
		<IgnoreDir Name="#Archive"/>
		<IgnoreDir Name="#Frezerovki"/>
		<IgnoreDir Name="#Без_кромок"/>
		<IgnoreDir Name="#ВЫПОЛНЕННЫЕ"/>
		<IgnoreDir Name="#ЕВРОЗАПИЛ"/>
		<IgnoreDir Name="#КОММЕРЦИЯ"/>
		<IgnoreDir Name="1111"/>
		<IgnoreDir Name="123"/>
		<IgnoreDir Name="1234"/>
		<IgnoreDir Name="12345"/>
		<IgnoreDir Name=".git"/>
		<IgnoreDir Name=".svn"/>
	</IgnoreDirList>
	<SourceDir>.</SourceDir>
	<TargetDir>./#ВЫПОЛНЕННЫЕ</TargetDir>
	<WorkReportFile>WorkReport.txt</WorkReportFile>
</Root>
"##;

/// Result of [`ConfigManager::load`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SettingsLoad {
    Loaded(Settings),
    /// No settings existed; a default file was written at this path and should be
    /// edited before the next run
    DefaultWritten(Utf8PathBuf),
}

/// Configuration manager for the XML settings file.
///
/// Relative directories inside the file are resolved against the folder that
/// holds it, so the file and the order tree can travel together.
#[derive(Debug, Clone)]
pub struct ConfigManager {
    settings_path: Utf8PathBuf,
}

impl ConfigManager {
    /// Create a manager for the settings file at `settings_path`.
    pub fn new<P: AsRef<Utf8Path>>(settings_path: P) -> Self {
        Self {
            settings_path: settings_path.as_ref().to_path_buf(),
        }
    }

    /// Load the settings, or write the default template when the file is missing.
    ///
    /// An existing file that cannot be read or parsed is an error and is left untouched.
    pub fn load(&self) -> Result<SettingsLoad> {
        if !self.settings_path.exists() {
            tracing::warn!(
                "Settings file not found at {}, writing defaults",
                self.settings_path
            );
            self.write_default()?;
            return Ok(SettingsLoad::DefaultWritten(self.settings_path.clone()));
        }

        let file_contents = fs::read_to_string(&self.settings_path)
            .with_context(|| format!("Failed to read settings: {}", self.settings_path))?;

        let file = parse_settings(&file_contents)
            .with_context(|| format!("Failed to parse settings: {}", self.settings_path))?;

        let settings = Settings::from_file(file, self.base_dir())
            .with_context(|| format!("Invalid settings in {}", self.settings_path))?;

        tracing::info!("Loaded settings from {}", self.settings_path);
        tracing::debug!(
            "Source: {}, target: {}, report: {}, ignored: {:?}",
            settings.source_dir,
            settings.target_dir,
            settings.report_file_name,
            settings.ignore_list
        );
        Ok(SettingsLoad::Loaded(settings))
    }

    /// Write the default settings template, creating the parent folder if needed.
    pub fn write_default(&self) -> Result<()> {
        let parent = self.base_dir();
        if !parent.as_str().is_empty() && !parent.exists() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create settings directory: {}", parent))?;
        }

        fs::write(&self.settings_path, DEFAULT_SETTINGS)
            .with_context(|| format!("Failed to write default settings: {}", self.settings_path))?;

        tracing::info!("Wrote default settings to {}", self.settings_path);
        Ok(())
    }

    /// Get the settings file path.
    pub fn settings_path(&self) -> &Utf8Path {
        &self.settings_path
    }

    fn base_dir(&self) -> &Utf8Path {
        self.settings_path.parent().unwrap_or(Utf8Path::new(""))
    }
}

/// Parse the text of a settings file. A leading byte-order mark is accepted.
pub fn parse_settings(xml: &str) -> Result<SettingsFile> {
    let file: SettingsFile = quick_xml::de::from_str(xml.trim_start_matches('\u{feff}'))
        .context("Settings file is not valid XML")?;
    Ok(file)
}

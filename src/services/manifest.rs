//! Work-list (`list.xml`) generation for the cutting machine.
//!
//! The machine processes parts in the order the file list gives them, and that order
//! must follow the numeric part identifier (`2` < `2.1` < `12`), not the file name.

use crate::models::DetailCountConvention;
use crate::services::naming;
use camino::{Utf8Path, Utf8PathBuf};
use quick_xml::escape::escape;
use std::fs;
use thiserror::Error;

/// Header written at the top of every generated XML document
pub const XML_HEADER: &str = r#"<?xml version="1.0" encoding="utf-8" ?>"#;

/// Zero-padding applied to each numeric component of a part identifier
const KEY_COMPONENT_WIDTH: usize = 6;

/// Job file formats understood by the machine, with their numeric type codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FileFormat {
    Mpr,
    Xml,
}

impl FileFormat {
    pub const ALL: [FileFormat; 2] = [FileFormat::Mpr, FileFormat::Xml];

    /// Machine-type code written into `<FileType>`
    pub fn code(&self) -> u8 {
        match self {
            FileFormat::Mpr => 7,
            FileFormat::Xml => 11,
        }
    }

    pub fn extension(&self) -> &'static str {
        match self {
            FileFormat::Mpr => "mpr",
            FileFormat::Xml => "xml",
        }
    }

    pub fn from_code(code: u8) -> Option<Self> {
        Self::ALL.into_iter().find(|format| format.code() == code)
    }

    /// Case-insensitive lookup by extension (without the dot)
    pub fn from_extension(extension: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|format| format.extension().eq_ignore_ascii_case(extension))
    }

    pub fn of_file_name(file_name: &str) -> Option<Self> {
        naming::extension_lowercase(file_name).and_then(|ext| Self::from_extension(&ext))
    }
}

#[derive(Error, Debug)]
pub enum ManifestError {
    #[error("Failed to write manifest {path}: {source}")]
    Write {
        path: Utf8PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Comparison key for a job file name.
///
/// The identifier token (see [`naming::sort_key`]) is split on `.`; every numeric
/// component is zero-padded and the results are concatenated. Non-numeric components
/// do not contribute.
pub fn comparison_key(file_name: &str) -> String {
    padded_components(naming::sort_key(naming::file_stem(file_name)))
}

/// Secondary key, used when identifiers tie (non-numeric identifiers all tie on an
/// empty key): the padded numeric components of the tokens after the identifier.
pub fn tie_break_key(file_name: &str) -> String {
    naming::file_stem(file_name)
        .split(naming::TOKEN_SEPARATOR)
        .skip(1)
        .map(padded_components)
        .collect()
}

fn padded_components(token: &str) -> String {
    token
        .split('.')
        .filter_map(|component| component.parse::<u64>().ok())
        .map(|n| format!("{:0width$}", n, width = KEY_COMPONENT_WIDTH))
        .collect()
}

/// Order job files by [`comparison_key`], then [`tie_break_key`]; files equal on
/// both keep their relative order.
pub fn sort_job_files(paths: &mut [Utf8PathBuf]) {
    paths.sort_by_cached_key(|path| {
        let file_name = path.file_name().unwrap_or_default();
        (comparison_key(file_name), tie_break_key(file_name))
    });
}

/// Build the work-list document for already ordered job files.
pub fn build_manifest(paths: &[Utf8PathBuf], convention: DetailCountConvention) -> String {
    let mut xml = String::new();

    xml.push_str(XML_HEADER);
    xml.push_str("\n<WorkList>\n");
    xml.push_str("\t<Version><Major>1</Major><Minor>0</Minor></Version>\n");
    xml.push_str("\t<FileList>\n");
    xml.push_str(&file_list(paths));
    xml.push_str("\t</FileList>\n");
    xml.push_str("\t<ProcessList>\n");
    xml.push_str(&process_list(paths, convention));
    xml.push_str("\t</ProcessList>\n");
    xml.push_str("</WorkList>\n");

    xml
}

fn file_list(paths: &[Utf8PathBuf]) -> String {
    let mut xml = String::new();
    for path in paths {
        let code = path
            .file_name()
            .and_then(FileFormat::of_file_name)
            .map(|format| format.code().to_string())
            .unwrap_or_default();

        xml.push_str("\t\t<Item>\n");
        xml.push_str(&format!("\t\t\t<FileType>{}</FileType>\n", code));
        xml.push_str(&format!("\t\t\t<FilePath>{}</FilePath>\n", escape(path.as_str())));
        xml.push_str("\t\t</Item>\n");
    }
    xml
}

fn process_list(paths: &[Utf8PathBuf], convention: DetailCountConvention) -> String {
    let mut xml = String::new();
    for path in paths {
        let stem = naming::file_stem(path.file_name().unwrap_or_default());

        let Some(count) = naming::detail_count(stem, convention) else {
            tracing::warn!(
                "No detail count in file name '{}', not added to the process list",
                path
            );
            continue;
        };

        xml.push_str("\t\t<Item>\n");
        xml.push_str(&format!("\t\t\t<SerialNum>{}</SerialNum>\n", escape(stem)));
        xml.push_str(&format!("\t\t\t<PlanCount>{}</PlanCount>\n", escape(count)));
        xml.push_str("\t\t\t<Count>0</Count>\n");
        xml.push_str("\t\t</Item>\n");
    }
    xml
}

/// Write the work list into `dir` and return its path.
pub fn write_manifest(
    dir: &Utf8Path,
    manifest_name: &str,
    paths: &[Utf8PathBuf],
    convention: DetailCountConvention,
) -> Result<Utf8PathBuf, ManifestError> {
    let path = dir.join(manifest_name);
    let xml = build_manifest(paths, convention);

    fs::write(&path, xml).map_err(|source| ManifestError::Write {
        path: path.clone(),
        source,
    })?;

    tracing::info!("Wrote work list {} ({} files)", path, paths.len());
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn paths(names: &[&str]) -> Vec<Utf8PathBuf> {
        names
            .iter()
            .map(|name| Utf8PathBuf::from(format!("/jobs/order/{}", name)))
            .collect()
    }

    fn names(paths: &[Utf8PathBuf]) -> Vec<&str> {
        paths.iter().map(|p| p.file_name().unwrap()).collect()
    }

    #[test]
    fn test_file_format_table() {
        assert_eq!(FileFormat::Mpr.code(), 7);
        assert_eq!(FileFormat::Xml.code(), 11);
        assert_eq!(FileFormat::from_code(7), Some(FileFormat::Mpr));
        assert_eq!(FileFormat::from_code(3), None);
        assert_eq!(FileFormat::from_extension("XML"), Some(FileFormat::Xml));
        assert_eq!(FileFormat::of_file_name("1_2.mpr"), Some(FileFormat::Mpr));
        assert_eq!(FileFormat::of_file_name("1_2.dxf"), None);
    }

    #[test]
    fn test_numeric_ordering() {
        let mut files = paths(&["12_1.xml", "2.1_1.xml", "2_1.xml"]);
        sort_job_files(&mut files);
        assert_eq!(names(&files), vec!["2_1.xml", "2.1_1.xml", "12_1.xml"]);
    }

    #[test]
    fn test_multi_component_ordering() {
        let mut files = paths(&["12.1.3_1.mpr", "12.0.3_1.mpr", "2.0.3_1.mpr"]);
        sort_job_files(&mut files);
        assert_eq!(
            names(&files),
            vec!["2.0.3_1.mpr", "12.0.3_1.mpr", "12.1.3_1.mpr"]
        );
    }

    #[test]
    fn test_non_numeric_identifiers_order_by_following_token() {
        let mut files = paths(&["B_2.xml", "A_12.xml", "C_2.1.xml"]);
        sort_job_files(&mut files);
        assert_eq!(names(&files), vec!["B_2.xml", "C_2.1.xml", "A_12.xml"]);
    }

    #[test]
    fn test_identifier_wins_over_following_tokens() {
        let mut files = paths(&["2_9.mpr", "12_1.mpr", "2_10.mpr"]);
        sort_job_files(&mut files);
        assert_eq!(names(&files), vec!["2_9.mpr", "2_10.mpr", "12_1.mpr"]);
    }

    #[test]
    fn test_full_ties_keep_input_order() {
        let mut files = paths(&["door_x.xml", "base_y.xml", "shelf.mpr"]);
        sort_job_files(&mut files);
        assert_eq!(names(&files), vec!["door_x.xml", "base_y.xml", "shelf.mpr"]);
    }

    #[test]
    fn test_comparison_key() {
        assert_eq!(comparison_key("12.0.3_4.xml"), "000012000000000003");
        assert_eq!(comparison_key("door_4.xml"), "");
        assert_eq!(tie_break_key("C_2.1_x.xml"), "000002000001");
        assert_eq!(tie_break_key("12.0.3.xml"), "");
    }

    #[test]
    fn test_manifest_layout() {
        let files = paths(&["1_4_door.xml", "2.mpr"]);
        let xml = build_manifest(&files, DetailCountConvention::TwoToken);

        assert!(xml.starts_with(XML_HEADER));
        assert!(xml.contains("<Version><Major>1</Major><Minor>0</Minor></Version>"));
        assert!(xml.contains("<FileType>11</FileType>"));
        assert!(xml.contains("<FileType>7</FileType>"));
        assert!(xml.contains("<FilePath>/jobs/order/1_4_door.xml</FilePath>"));
        assert!(xml.contains("<SerialNum>1_4_door</SerialNum>"));
        assert!(xml.contains("<PlanCount>4</PlanCount>"));
        assert!(xml.contains("<Count>0</Count>"));
        // 2.mpr has no count token
        assert_eq!(xml.matches("<SerialNum>").count(), 1);
        assert_eq!(xml.matches("<FilePath>").count(), 2);
    }

    #[test]
    fn test_manifest_escapes_paths() {
        let files = vec![Utf8PathBuf::from("/jobs/A&B <1>/1_2.mpr")];
        let xml = build_manifest(&files, DetailCountConvention::TwoToken);
        assert!(xml.contains("<FilePath>/jobs/A&amp;B &lt;1&gt;/1_2.mpr</FilePath>"));
    }

    #[test]
    fn test_unknown_extension_has_empty_code() {
        let files = paths(&["1_2.dxf"]);
        let xml = build_manifest(&files, DetailCountConvention::TwoToken);
        assert!(xml.contains("<FileType></FileType>"));
    }

    #[test]
    fn test_write_manifest() {
        let temp_dir = TempDir::new().unwrap();
        let dir = Utf8Path::from_path(temp_dir.path()).unwrap();
        let files = vec![dir.join("1_3.mpr")];

        let written =
            write_manifest(dir, "list.xml", &files, DetailCountConvention::TwoToken).unwrap();

        assert_eq!(written, dir.join("list.xml"));
        let content = fs::read_to_string(written).unwrap();
        assert!(content.contains("<PlanCount>3</PlanCount>"));
    }
}

//! Plain-text summary of a run: one line per order with the month it was finished.

use crate::models::StatusNode;
use camino::{Utf8Path, Utf8PathBuf};
use chrono::{DateTime, TimeZone};
use std::fs;
use std::io;

/// Timestamp prefix of report file names
const REPORT_TIMESTAMP_FORMAT: &str = "%Y-%m-%d_%H-%M-%S";

/// One line per order, `"{YYYY-MM} - {name}"`, sorted. Orders that are not ready
/// have an empty month, so they sort first.
pub fn render(orders: &[StatusNode]) -> String {
    let mut lines: Vec<String> = orders
        .iter()
        .map(|order| {
            format!(
                "{} - {}",
                order.ready_month().unwrap_or_default(),
                order.item_name
            )
        })
        .collect();
    lines.sort();

    lines.iter().map(|line| format!("{}\n", line)).collect()
}

/// `<target_dir>/<YYYY-MM-DD_HH-MM-SS>_<file_name>`
pub fn report_file_path<Tz>(target_dir: &Utf8Path, file_name: &str, now: &DateTime<Tz>) -> Utf8PathBuf
where
    Tz: TimeZone,
    Tz::Offset: std::fmt::Display,
{
    target_dir.join(format!(
        "{}_{}",
        now.format(REPORT_TIMESTAMP_FORMAT),
        file_name
    ))
}

/// Write the rendered report, creating the target directory when needed.
pub fn write_report(path: &Utf8Path, orders: &[StatusNode]) -> io::Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::write(path, render(orders))?;

    tracing::info!("Wrote work report {} ({} orders)", path, orders.len());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use tempfile::TempDir;

    fn orders() -> Vec<StatusNode> {
        vec![
            StatusNode::ready("Smith kitchen", "2024-05-03"),
            StatusNode::pending("Jones wardrobe"),
            StatusNode::ready("Brown hallway", "2024-04-28"),
            StatusNode::other("misc"),
        ]
    }

    #[test]
    fn test_render_sorted_lines() {
        assert_eq!(
            render(&orders()),
            " - Jones wardrobe\n - misc\n2024-04 - Brown hallway\n2024-05 - Smith kitchen\n"
        );
    }

    #[test]
    fn test_render_empty() {
        assert_eq!(render(&[]), "");
    }

    #[test]
    fn test_report_file_path() {
        let now = Utc.with_ymd_and_hms(2024, 5, 3, 14, 7, 9).unwrap();
        assert_eq!(
            report_file_path(Utf8Path::new("/done"), "WorkReport.txt", &now),
            Utf8PathBuf::from("/done/2024-05-03_14-07-09_WorkReport.txt")
        );
    }

    #[test]
    fn test_write_report_creates_target() {
        let temp_dir = TempDir::new().unwrap();
        let root = Utf8Path::from_path(temp_dir.path()).unwrap();
        let path = root.join("done").join("report.txt");

        write_report(&path, &orders()).unwrap();

        let content = fs::read_to_string(&path).unwrap();
        assert_eq!(content.lines().count(), 4);
        assert!(content.ends_with("2024-05 - Smith kitchen\n"));
    }
}

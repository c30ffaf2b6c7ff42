//! Moves finished orders out of the working tree into `<target>/<YYYY-MM>/`.

use crate::metrics::ScanMetrics;
use crate::models::StatusNode;
use camino::{Utf8Path, Utf8PathBuf};
use std::fs;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum RelocationError {
    #[error("Order '{0}' has no usable ready date")]
    MissingDate(String),

    #[error("Failed to create {path}: {source}")]
    CreateDir {
        path: Utf8PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to move {from} to {to}: {source}")]
    Move {
        from: Utf8PathBuf,
        to: Utf8PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Outcome of one relocation pass
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RelocationSummary {
    /// New locations of the orders that were moved
    pub moved: Vec<Utf8PathBuf>,
    /// Names of the ready orders that stayed where they were
    pub failed: Vec<String>,
}

/// Move one ready order and return its new path.
pub fn relocate_order(
    source_root: &Utf8Path,
    target_root: &Utf8Path,
    order: &StatusNode,
) -> Result<Utf8PathBuf, RelocationError> {
    let month = order
        .ready_month()
        .ok_or_else(|| RelocationError::MissingDate(order.item_name.clone()))?;

    let month_dir = target_root.join(month);
    fs::create_dir_all(&month_dir).map_err(|source| RelocationError::CreateDir {
        path: month_dir.clone(),
        source,
    })?;

    let from = source_root.join(&order.item_name);
    let to = month_dir.join(&order.item_name);
    fs::rename(&from, &to).map_err(|source| RelocationError::Move {
        from: from.clone(),
        to: to.clone(),
        source,
    })?;

    Ok(to)
}

/// Move every `Ready` order. A failed move is logged and counted; the rest go on.
pub fn relocate_ready_orders(
    source_root: &Utf8Path,
    target_root: &Utf8Path,
    orders: &[StatusNode],
    metrics: &ScanMetrics,
) -> RelocationSummary {
    let mut summary = RelocationSummary::default();

    for order in orders.iter().filter(|order| order.is_ready()) {
        match relocate_order(source_root, target_root, order) {
            Ok(to) => {
                tracing::info!("Moved finished order '{}' to {}", order.item_name, to);
                metrics.record_order_relocated();
                summary.moved.push(to);
            }
            Err(e) => {
                tracing::error!("{}", e);
                metrics.record_relocation_failure();
                summary.failed.push(order.item_name.clone());
            }
        }
    }

    summary
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_moves_ready_orders_only() {
        let temp_dir = TempDir::new().unwrap();
        let root = Utf8Path::from_path(temp_dir.path()).unwrap();
        let source = root.join("work");
        let target = root.join("done");
        fs::create_dir_all(source.join("A")).unwrap();
        fs::create_dir_all(source.join("B")).unwrap();
        fs::write(source.join("A").join("order_ready_20240503.xml"), "x").unwrap();

        let orders = vec![
            StatusNode::ready("A", "2024-05-03"),
            StatusNode::pending("B"),
        ];
        let metrics = ScanMetrics::new();

        let summary = relocate_ready_orders(&source, &target, &orders, &metrics);

        assert_eq!(summary.moved, vec![target.join("2024-05").join("A")]);
        assert!(summary.failed.is_empty());
        assert!(target.join("2024-05/A/order_ready_20240503.xml").exists());
        assert!(!source.join("A").exists());
        assert!(source.join("B").exists());
        assert_eq!(ScanMetrics::get(&metrics.orders_relocated), 1);
    }

    #[test]
    fn test_missing_source_is_counted() {
        let temp_dir = TempDir::new().unwrap();
        let root = Utf8Path::from_path(temp_dir.path()).unwrap();
        let metrics = ScanMetrics::new();

        let orders = vec![StatusNode::ready("gone", "2024-05-03")];
        let summary = relocate_ready_orders(&root.join("work"), &root.join("done"), &orders, &metrics);

        assert!(summary.moved.is_empty());
        assert_eq!(summary.failed, vec!["gone".to_string()]);
        assert_eq!(ScanMetrics::get(&metrics.relocation_failures), 1);
    }

    #[test]
    fn test_short_date_is_rejected() {
        let temp_dir = TempDir::new().unwrap();
        let root = Utf8Path::from_path(temp_dir.path()).unwrap();

        let order = StatusNode::ready("A", "2024");
        assert!(matches!(
            relocate_order(root, root, &order),
            Err(RelocationError::MissingDate(_))
        ));
    }
}

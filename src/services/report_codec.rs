//! Completion-marker persistence.
//!
//! A directory that becomes `Ready` through its subdirectories records its status tree in
//! `order_ready_YYYYMMDD.xml`. On later runs the marker short-circuits the walk and its
//! tree is loaded back as the directory's children.

use crate::models::{Status, StatusNode};
use crate::services::manifest::XML_HEADER;
use crate::services::naming;
use camino::{Utf8Path, Utf8PathBuf};
use quick_xml::de::DeError;
use quick_xml::se::{SeError, Serializer};
use serde::{Deserialize, Serialize};
use std::fs;
use thiserror::Error;

/// File name prefix of completion markers
pub const MARKER_PREFIX: &str = "order_ready_";

const ROOT_ELEMENT: &str = "Root";

#[derive(Error, Debug)]
pub enum ReportCodecError {
    #[error("Failed to serialize status report: {0}")]
    Serialize(#[from] SeError),

    #[error("Failed to parse status report: {0}")]
    Deserialize(#[from] DeError),

    #[error("Failed to read status report {path}: {source}")]
    Read {
        path: Utf8PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to write status report {path}: {source}")]
    Write {
        path: Utf8PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Ready date '{0}' cannot be used in a marker file name")]
    InvalidDate(String),
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct ReportDocument {
    #[serde(rename = "ReportItemList", default)]
    list: ReportItemList,
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct ReportItemList {
    #[serde(rename = "ReportItem", default)]
    items: Vec<ReportItem>,
}

#[derive(Debug, Serialize, Deserialize)]
struct ReportItem {
    #[serde(rename = "@ItemName", default)]
    item_name: String,

    #[serde(rename = "@Status", default)]
    status: String,

    #[serde(rename = "@DateReady", default)]
    date_ready: String,

    #[serde(rename = "@Level", default)]
    level: u32,

    #[serde(rename = "ReportItemList", default)]
    children: ReportItemList,
}

impl From<&StatusNode> for ReportItem {
    fn from(node: &StatusNode) -> Self {
        Self {
            item_name: node.item_name.clone(),
            status: node.status.as_str().to_string(),
            date_ready: node.date_ready.clone(),
            level: node.level,
            children: ReportItemList {
                items: node.children.iter().map(ReportItem::from).collect(),
            },
        }
    }
}

impl From<ReportItem> for StatusNode {
    fn from(item: ReportItem) -> Self {
        let status = item.status.parse::<Status>().unwrap_or_else(|e| {
            tracing::warn!("Item '{}' in status report: {}, treated as Other", item.item_name, e);
            Status::Other
        });

        let date_ready = if status == Status::Ready {
            item.date_ready
        } else {
            String::new()
        };

        StatusNode {
            item_name: item.item_name,
            status,
            date_ready,
            level: item.level,
            children: item.children.items.into_iter().map(StatusNode::from).collect(),
        }
    }
}

/// Serialize a list of status trees into a report document (with header).
pub fn encode(nodes: &[StatusNode]) -> Result<String, ReportCodecError> {
    let document = ReportDocument {
        list: ReportItemList {
            items: nodes.iter().map(ReportItem::from).collect(),
        },
    };

    let mut body = String::new();
    let mut serializer = Serializer::with_root(&mut body, Some(ROOT_ELEMENT))?;
    serializer.indent('\t', 1);
    document.serialize(serializer)?;

    Ok(format!("{}\n{}", XML_HEADER, body))
}

/// Parse a report document back into status trees, preserving order.
pub fn decode(xml: &str) -> Result<Vec<StatusNode>, ReportCodecError> {
    let document: ReportDocument = quick_xml::de::from_str(xml)?;
    Ok(document
        .list
        .items
        .into_iter()
        .map(StatusNode::from)
        .collect())
}

/// Marker file name for a `YYYY-MM-DD` ready date: `order_ready_YYYYMMDD.xml`.
pub fn marker_file_name(date_ready: &str) -> Result<String, ReportCodecError> {
    let compact = naming::compact_date(date_ready)
        .ok_or_else(|| ReportCodecError::InvalidDate(date_ready.to_string()))?;
    Ok(format!("{}{}.xml", MARKER_PREFIX, compact))
}

/// Persist `node` as the completion marker of `dir` and return the marker path.
pub fn write_marker(dir: &Utf8Path, node: &StatusNode) -> Result<Utf8PathBuf, ReportCodecError> {
    let path = dir.join(marker_file_name(&node.date_ready)?);
    let xml = encode(std::slice::from_ref(node))?;

    fs::write(&path, xml).map_err(|source| ReportCodecError::Write {
        path: path.clone(),
        source,
    })?;

    tracing::info!("Wrote completion marker {}", path);
    Ok(path)
}

/// Load the status trees stored in a completion marker.
pub fn read_marker(path: &Utf8Path) -> Result<Vec<StatusNode>, ReportCodecError> {
    let xml = fs::read_to_string(path).map_err(|source| ReportCodecError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    decode(xml.trim_start_matches('\u{feff}'))
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use tempfile::TempDir;

    fn sample_tree() -> StatusNode {
        StatusNode::ready("Order 17", "2024-05-03")
            .with_level(1)
            .with_children(vec![
                StatusNode::ready("ЛДСП 16", "2024-05-01"),
                StatusNode::ready("Fronts & <glass>", "2024-05-03"),
            ])
    }

    #[test]
    fn test_round_trip() {
        let tree = sample_tree();
        let xml = encode(std::slice::from_ref(&tree)).unwrap();
        assert_eq!(decode(&xml).unwrap(), vec![tree]);
    }

    #[test]
    fn test_document_shape() {
        let xml = encode(&[sample_tree()]).unwrap();

        assert!(xml.starts_with("<?xml version=\"1.0\" encoding=\"utf-8\" ?>\n<Root>"));
        assert!(xml.contains("<ReportItemList>"));
        assert!(xml.contains(r#"ItemName="Order 17""#));
        assert!(xml.contains(r#"Status="Ready""#));
        assert!(xml.contains(r#"DateReady="2024-05-03""#));
        assert!(xml.contains(r#"Level="1""#));
        assert!(xml.contains("Fronts &amp; &lt;glass&gt;"));
    }

    #[test]
    fn test_empty_list_round_trips() {
        let xml = encode(&[]).unwrap();
        assert!(decode(&xml).unwrap().is_empty());
    }

    #[test]
    fn test_decodes_legacy_marker() {
        let xml = r#"<?xml version="1.0" encoding="utf-8" ?>
<Root>
	<ReportItemList>
		<ReportItem ItemName="Заказ 5" Status="Готов" DateReady="2023-11-20" Level="1">
			<ReportItemList>
				<ReportItem ItemName="ЛДСП" Status="Готов" DateReady="2023-11-20" Level="0">
					<ReportItemList></ReportItemList>
				</ReportItem>
			</ReportItemList>
		</ReportItem>
	</ReportItemList>
</Root>"#;

        let nodes = decode(xml).unwrap();
        assert_eq!(nodes.len(), 1);
        assert_eq!(nodes[0].item_name, "Заказ 5");
        assert_eq!(nodes[0].status, Status::Ready);
        assert_eq!(nodes[0].level, 1);
        assert_eq!(nodes[0].children.len(), 1);
        assert_eq!(nodes[0].children[0].date_ready, "2023-11-20");
        assert!(nodes[0].children[0].children.is_empty());
    }

    #[test]
    fn test_unknown_status_becomes_other() {
        let xml = r#"<Root><ReportItemList><ReportItem ItemName="x" Status="Done" DateReady="2024-01-01" Level="0"/></ReportItemList></Root>"#;
        let nodes = decode(xml).unwrap();
        assert_eq!(nodes[0].status, Status::Other);
        assert_eq!(nodes[0].date_ready, "");
    }

    #[test]
    fn test_garbage_is_an_error() {
        assert!(decode("<Root><ReportItemList>").is_err());
    }

    #[test]
    fn test_marker_file_name() {
        assert_eq!(marker_file_name("2024-05-03").unwrap(), "order_ready_20240503.xml");
        assert!(marker_file_name("").is_err());
    }

    #[test]
    fn test_write_and_read_marker() {
        let temp_dir = TempDir::new().unwrap();
        let dir = Utf8Path::from_path(temp_dir.path()).unwrap();
        let tree = sample_tree();

        let path = write_marker(dir, &tree).unwrap();
        assert_eq!(path, dir.join("order_ready_20240503.xml"));
        assert_eq!(read_marker(&path).unwrap(), vec![tree]);
    }

    fn arb_status_node() -> impl Strategy<Value = StatusNode> {
        let name = "[A-Za-z0-9#._-]{0,12}";
        let leaf = (name, 0u8..3, "[0-9]{4}-[0-9]{2}-[0-9]{2}", 0u32..5).prop_map(
            |(name, kind, date, level)| {
                let node = match kind {
                    0 => StatusNode::pending(name),
                    1 => StatusNode::ready(name, date),
                    _ => StatusNode::other(name),
                };
                node.with_level(level)
            },
        );
        leaf.prop_recursive(3, 24, 4, move |inner| {
            (
                "[A-Za-z0-9#._-]{0,12}",
                any::<bool>(),
                "[0-9]{4}-[0-9]{2}-[0-9]{2}",
                0u32..5,
                prop::collection::vec(inner, 0..4),
            )
                .prop_map(|(name, ready, date, level, children)| {
                    let node = if ready {
                        StatusNode::ready(name, date)
                    } else {
                        StatusNode::pending(name)
                    };
                    node.with_level(level).with_children(children)
                })
        })
    }

    proptest! {
        #[test]
        fn prop_encode_decode_round_trip(nodes in prop::collection::vec(arb_status_node(), 0..4)) {
            let xml = encode(&nodes).unwrap();
            prop_assert_eq!(decode(&xml).unwrap(), nodes);
        }
    }
}

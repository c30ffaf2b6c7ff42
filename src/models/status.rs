use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Completion status of an order directory (or any directory below it).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Status {
    /// Work is outstanding or already dispatched to the machine
    Pending,
    /// Everything below the directory is finished and a ready date is known
    Ready,
    /// Nothing actionable was found; needs a human to look at it
    Other,
}

impl Status {
    /// Canonical text form, as written into completion markers
    pub fn as_str(&self) -> &'static str {
        match self {
            Status::Pending => "Pending",
            Status::Ready => "Ready",
            Status::Other => "Other",
        }
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Returned when a marker carries a status string we do not know.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("unknown status '{0}'")]
pub struct UnknownStatus(pub String);

impl FromStr for Status {
    type Err = UnknownStatus;

    /// Accepts the canonical names and the Russian names used by markers
    /// written with older releases of the tool.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Pending" | "Ожидает" => Ok(Status::Pending),
            "Ready" | "Готов" => Ok(Status::Ready),
            "Other" | "Иное" => Ok(Status::Other),
            other => Err(UnknownStatus(other.to_string())),
        }
    }
}

/// One node of the status tree produced by the resolver.
///
/// Nodes are built bottom-up and moved into their parent's `children`.
/// `date_ready` is only ever non-empty on `Ready` nodes; [`StatusNode::ready`]
/// is the only constructor that accepts a date.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusNode {
    /// Directory base name (display only)
    pub item_name: String,
    pub status: Status,
    /// `YYYY-MM-DD`, or empty
    pub date_ready: String,
    /// Approximate nesting depth at which readiness was established
    pub level: u32,
    /// Child outcomes in directory-name order
    pub children: Vec<StatusNode>,
}

impl StatusNode {
    pub fn pending(item_name: impl Into<String>) -> Self {
        Self::bare(item_name, Status::Pending, String::new())
    }

    pub fn ready(item_name: impl Into<String>, date_ready: impl Into<String>) -> Self {
        Self::bare(item_name, Status::Ready, date_ready.into())
    }

    pub fn other(item_name: impl Into<String>) -> Self {
        Self::bare(item_name, Status::Other, String::new())
    }

    fn bare(item_name: impl Into<String>, status: Status, date_ready: String) -> Self {
        Self {
            item_name: item_name.into(),
            status,
            date_ready,
            level: 0,
            children: Vec::new(),
        }
    }

    pub fn with_level(mut self, level: u32) -> Self {
        self.level = level;
        self
    }

    pub fn with_children(mut self, children: Vec<StatusNode>) -> Self {
        self.children = children;
        self
    }

    pub fn is_ready(&self) -> bool {
        self.status == Status::Ready
    }

    /// `YYYY-MM` part of the ready date, if the node has one
    pub fn ready_month(&self) -> Option<&str> {
        crate::services::naming::month_of(&self.date_ready)
    }

    /// Highest `level` among the given nodes, 0 for an empty slice
    pub fn max_level(nodes: &[StatusNode]) -> u32 {
        nodes.iter().map(|n| n.level).max().unwrap_or(0)
    }
}

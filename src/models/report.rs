//! Sort report data model.

use super::category::Category;
use crate::Result;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

/// Report version.
pub const REPORT_VERSION: &str = "1.0";

/// Result of one sorting pass.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SortReport {
    /// Report version.
    pub version: String,
    /// Unique pass ID.
    pub id: String,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Sorted root directory.
    pub root: PathBuf,
    /// Whether the pass was a dry run.
    pub dry_run: bool,
    /// One outcome per child of the root, in file-name order.
    pub outcomes: Vec<NodeOutcome>,
}

/// Final state of a node in a sorting pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortState {
    /// The node is one of the category folders.
    SkippedSortedDir,
    /// The category is not allowed or has no destination.
    SkippedDisallowedType,
    /// The destination already exists and the conflict policy is `skip`.
    SkippedConflict,
    /// Destination computed, nothing moved (dry run).
    Resolved,
    /// The node (or its selected elements) was moved.
    Moved,
    /// Elements were moved and the source directory was removed.
    CleanedUp,
    /// A filesystem operation failed.
    Failed,
}

impl SortState {
    pub fn is_skipped(&self) -> bool {
        matches!(
            self,
            SortState::SkippedSortedDir | SortState::SkippedDisallowedType | SortState::SkippedConflict
        )
    }
}

impl std::fmt::Display for SortState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            SortState::SkippedSortedDir => "skipped (sorted directory)",
            SortState::SkippedDisallowedType => "skipped (type not sorted)",
            SortState::SkippedConflict => "skipped (destination exists)",
            SortState::Resolved => "resolved",
            SortState::Moved => "moved",
            SortState::CleanedUp => "cleaned up",
            SortState::Failed => "failed",
        };
        write!(f, "{}", s)
    }
}

/// A single move, performed or planned.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MoveRecord {
    pub from: PathBuf,
    pub to: PathBuf,
}

/// What happened to one child of the root.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NodeOutcome {
    /// Source path at enumeration time.
    pub source: PathBuf,
    /// Category, once classified.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<Category>,
    /// Final state.
    pub state: SortState,
    /// Destination folder, once resolved.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub destination: Option<PathBuf>,
    /// Moves performed, or planned in a dry run.
    #[serde(default)]
    pub moves: Vec<MoveRecord>,
    /// Error text for failed nodes.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl NodeOutcome {
    pub fn new(source: PathBuf) -> Self {
        Self {
            source,
            category: None,
            state: SortState::Resolved,
            destination: None,
            moves: Vec::new(),
            error: None,
        }
    }
}

impl SortReport {
    pub fn new(root: PathBuf, dry_run: bool) -> Self {
        Self {
            version: REPORT_VERSION.to_string(),
            id: uuid::Uuid::new_v4().to_string(),
            created_at: Utc::now(),
            root,
            dry_run,
            outcomes: Vec::new(),
        }
    }

    /// Number of outcomes in a given state.
    pub fn count(&self, state: SortState) -> usize {
        self.outcomes.iter().filter(|o| o.state == state).count()
    }

    /// Number of skipped nodes, all reasons combined.
    pub fn skipped(&self) -> usize {
        self.outcomes.iter().filter(|o| o.state.is_skipped()).count()
    }

    /// Total number of moves across all outcomes.
    pub fn total_moves(&self) -> usize {
        self.outcomes.iter().map(|o| o.moves.len()).sum()
    }

    pub fn has_failures(&self) -> bool {
        self.outcomes.iter().any(|o| o.state == SortState::Failed)
    }

    /// Outcome for a source path.
    pub fn outcome(&self, source: &Path) -> Option<&NodeOutcome> {
        self.outcomes.iter().find(|o| o.source == source)
    }
}

/// Save a report to a JSON file.
pub fn save_report(report: &SortReport, path: &Path) -> Result<()> {
    let json = serde_json::to_string_pretty(report)?;

    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }

    let mut file = fs::File::create(path)?;
    file.write_all(json.as_bytes())?;

    tracing::info!("Report saved to {:?}", path);
    Ok(())
}

/// Load a report from a JSON file.
pub fn load_report(path: &Path) -> Result<SortReport> {
    let content = fs::read_to_string(path)?;
    let report: SortReport = serde_json::from_str(&content)?;
    Ok(report)
}

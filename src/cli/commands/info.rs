//! Info command implementation.

use crate::core::context::NodeContext;
use crate::core::node::Node;
use crate::Result;
use std::path::Path;
use std::sync::Arc;

/// Print the description of a file or directory.
pub fn info(context: &Arc<NodeContext>, path: &Path) -> Result<()> {
    let node = Node::open(path, context)?;
    println!("{}", node);
    Ok(())
}

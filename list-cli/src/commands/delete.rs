//! Delete a row.

use anyhow::{bail, Context, Result};
use tracing::info;

use crate::session::Session;

/// Run the delete command.
pub fn run(session: &Session, section: usize, row: usize) -> Result<()> {
    let controller = session.controller();
    if !controller.can_edit(section, row) {
        bail!("Editing is disabled for this list");
    }

    controller
        .commit_delete(section, row)
        .with_context(|| format!("Failed to delete row {}", row))?;
    session.persist()?;

    info!(section, row, remaining = session.item_count(), "deleted row");
    println!("Deleted row {}", row);
    Ok(())
}

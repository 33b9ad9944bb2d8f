//! Move a row within its section.

use anyhow::{bail, Context, Result};
use list_types::IndexPath;
use tracing::info;

use crate::session::Session;

/// Run the move command.
///
/// The reorder callback rewrites `position` for the whole section; the
/// list is then reloaded so the rows show their new positions.
pub fn run(session: &Session, section: usize, from: usize, to: usize) -> Result<()> {
    let controller = session.controller();
    if !controller.can_move(section, from) {
        bail!("Reordering is disabled for this list");
    }

    let source = IndexPath::new(section, from);
    let target = controller.propose_move_target(source, IndexPath::new(section, to));
    controller
        .commit_move(source, target)
        .with_context(|| format!("Failed to move row {} to {}", from, to))?;
    controller.reload().context("Failed to reload list")?;
    session.persist()?;

    info!(%source, %target, "moved row");
    println!("Moved row {} to {}", from, target.row);
    Ok(())
}

//! Show the list.

use anyhow::Result;

use crate::session::Session;

/// Run the list command.
pub fn run(session: &Session) -> Result<()> {
    let title = session.controller().title().unwrap_or_default();
    println!("=== {} ===", title);
    Ok(())
}

//! Show list status.

use anyhow::Result;

use crate::session::Session;

/// Run the status command.
pub fn run(session: &Session) -> Result<()> {
    let controller = session.controller();
    let options = controller.options();

    println!("=== livelist status ===");
    println!();
    match controller.descriptor() {
        Some(descriptor) => {
            println!("List:");
            println!("  Entity:   {}", descriptor.entity);
            println!("  Title:    {}", controller.title().unwrap_or_default());
            println!("  Sections: {}", controller.section_count());
            println!("  Rows:     {}", controller.fetched_records().len());
            println!(
                "  Cache:    {}",
                descriptor.cache_name.as_deref().unwrap_or("(none)")
            );
        }
        None => println!("List: NOT CONFIGURED"),
    }
    println!();
    println!("Options:");
    println!("  Cell:       {}", options.cell_reuse_identifier);
    println!("  Editing:    {}", on_off(options.allow_editing));
    println!("  Reordering: {}", on_off(options.allow_reordering));
    println!();
    println!("Data:");
    println!("  Store:  {}", session.store_path().display());
    println!("  Saved:  {}", session.store_path().exists());
    println!();

    Ok(())
}

fn on_off(flag: bool) -> &'static str {
    if flag {
        "enabled"
    } else {
        "disabled"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn on_off_labels() {
        assert_eq!(on_off(true), "enabled");
        assert_eq!(on_off(false), "disabled");
    }
}

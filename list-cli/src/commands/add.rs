//! Add an event at the end of the list.

use anyhow::{Context, Result};
use list_types::FieldValue;
use std::collections::BTreeMap;
use std::time::{SystemTime, UNIX_EPOCH};
use tracing::info;

use crate::config::{POSITION_FIELD, TIMESTAMP_FIELD};
use crate::session::Session;

/// Run the add command.
pub fn run(session: &Session) -> Result<()> {
    let position = session.next_position();
    let fields = BTreeMap::from([
        (
            TIMESTAMP_FIELD.to_string(),
            FieldValue::Timestamp(now_secs()),
        ),
        (
            POSITION_FIELD.to_string(),
            FieldValue::Int(position as i64),
        ),
    ]);

    let record = session
        .controller()
        .insert_record(fields)
        .context("Failed to add event")?;
    session.persist()?;

    info!(id = %record.id(), position, "added event");
    println!("Added event at position {}", position);
    Ok(())
}

fn now_secs() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0)
}

use anyhow::Result;
use innsync_core::room::ROOMS;
use owo_colors::OwoColorize;

/// List the room registry.
pub fn run() -> Result<()> {
    for room in &ROOMS {
        println!("{}  {}", room.id.dimmed(), room.name);
    }
    Ok(())
}

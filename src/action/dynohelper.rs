//
// dynohelper.rs
//

/// Placeholder for the dyno automation helper. The board-side
/// messaging it will exercise is not wired up yet.
pub async fn run() -> anyhow::Result<()> {
    println!("Hello world: dynohelper");
    Ok(())
}

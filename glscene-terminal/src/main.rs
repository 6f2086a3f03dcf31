/// glscene terminal demo
///
/// Renders the transform-stack scenes as colored ASCII art.
/// Controls:
///   - Mouse drag / WASD / Arrow Keys: Rotate
///   - Mouse wheel / +/-: Zoom
///   - R: Reset the view
///   - Tab: Next scene
///   - Q/ESC: Quit
use anyhow::Context;
use clap::Parser;
use glscene_terminal::logging::init_logging;
use glscene_terminal::{AppConfig, TerminalApp};

fn main() -> anyhow::Result<()> {
    let config = AppConfig::parse();
    init_logging(config.logging()).context("failed to set up logging")?;

    let mut app = TerminalApp::new(config)?;
    app.run()?;

    Ok(())
}

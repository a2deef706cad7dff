//! orbview - inspect OBJ models in the terminal
//!
//! Controls:
//!   - Left drag / WASD / Arrow Keys: Orbit
//!   - Right drag: Pan
//!   - Middle drag: Dolly
//!   - Wheel / +/-: Zoom
//!   - R: Reset camera
//!   - Q/ESC: Quit

use anyhow::Context;
use clap::Parser;
use log::{info, warn};
use orbview_core::{Mesh, ObjLoader};
use orbview_terminal::{AppSettings, TerminalApp};

mod cli;

fn main() -> anyhow::Result<()> {
    let cli = cli::Cli::parse();
    let config = cli.viewer_config()?;

    if cli.dump_config {
        print!("{}", config.to_toml()?);
        return Ok(());
    }

    cli::initialize_logging(&cli.log_filter, config.logging.file.as_deref())?;

    let mesh = match cli.model_path(&config) {
        Some(path) => {
            let loader = ObjLoader::new(config.loader.options());
            let mesh = loader
                .load(&path)
                .with_context(|| format!("failed to load model {}", path.display()))?;
            info!(
                "loaded {}: {} vertices, {} triangles",
                path.display(),
                mesh.vertex_count(),
                mesh.triangle_count()
            );
            mesh
        }
        None => {
            warn!("no model given, showing the built-in cube");
            Mesh::cube(1.0)
        }
    };

    let mut app = TerminalApp::new(mesh, AppSettings::from(&config))
        .context("failed to query terminal size")?;
    app.run()?;

    info!("viewer closed");
    Ok(())
}

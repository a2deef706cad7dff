use std::fs::File;
use std::path::{Path, PathBuf};

use anyhow::Context;
use clap::ValueHint;

use orbview_terminal::config::ViewerConfig;

#[derive(Debug, clap::Parser)]
#[command(author, version, about)]
pub struct Cli {
    /// Logging output filters; comma-separated
    #[arg(
        short,
        long,
        default_value = "warn,orbview_core=info,orbview_terminal=info",
        env = "ORBVIEW_LOG"
    )]
    pub log_filter: String,
    /// Write log output to this file instead of stderr
    #[arg(long, value_hint = ValueHint::FilePath)]
    pub log_file: Option<PathBuf>,
    /// Viewer configuration (TOML)
    #[arg(short, long, env = "ORBVIEW_CONFIG", value_hint = ValueHint::FilePath)]
    pub config: Option<PathBuf>,
    /// Store texture coordinates as (u, 1 - v)
    #[arg(long)]
    pub flip_v: bool,
    /// Skip face corners that reference undeclared attributes
    #[arg(long)]
    pub lenient: bool,
    /// Keep missing normals as zero vectors
    #[arg(long)]
    pub no_normals: bool,
    /// Print the effective configuration and exit
    #[arg(long)]
    pub dump_config: bool,
    /// OBJ model to display; overrides the configured model
    #[arg(value_hint = ValueHint::FilePath)]
    pub model: Option<PathBuf>,
}

impl Cli {
    /// Read the configuration file, if any, and apply command line overrides.
    pub fn viewer_config(&self) -> anyhow::Result<ViewerConfig> {
        let mut config = match &self.config {
            Some(path) => ViewerConfig::load(path)?,
            None => ViewerConfig::default(),
        };
        self.apply(&mut config);
        Ok(config)
    }

    pub fn apply(&self, config: &mut ViewerConfig) {
        if let Some(file) = &self.log_file {
            config.logging.file = Some(file.clone());
        }
        if self.flip_v {
            config.loader.flip_v = true;
        }
        if self.lenient {
            config.loader.strict = false;
        }
        if self.no_normals {
            config.loader.generate_normals = false;
        }
    }

    /// The model to load. A path on the command line is taken as given,
    /// a configured one is resolved against the resources directory.
    pub fn model_path(&self, config: &ViewerConfig) -> Option<PathBuf> {
        self.model.clone().or_else(|| config.model_path())
    }
}

/// Set up log output, to `file` when given since the viewer owns the terminal
pub(crate) fn initialize_logging(log_filter: &str, file: Option<&Path>) -> anyhow::Result<()> {
    let mut builder = env_logger::Builder::new();
    builder.parse_filters(log_filter).format_timestamp_millis();

    if let Some(path) = file {
        let file = File::create(path)
            .with_context(|| format!("failed to create log file {}", path.display()))?;
        builder.target(env_logger::Target::Pipe(Box::new(file)));
    }

    builder.try_init().context("logger already initialized")
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;
    use orbview_core::IndexPolicy;

    #[test]
    fn test_flags_override_config() {
        let cli = Cli::try_parse_from([
            "orbview",
            "--lenient",
            "--no-normals",
            "--log-file",
            "viewer.log",
            "cube.obj",
        ])
        .unwrap();

        let mut config = ViewerConfig::default();
        cli.apply(&mut config);
        let options = config.loader.options();
        assert_eq!(options.index_policy, IndexPolicy::Skip);
        assert!(!options.generate_normals);
        assert!(!options.flip_v);
        assert_eq!(config.logging.file, Some(PathBuf::from("viewer.log")));
        assert_eq!(cli.model_path(&config), Some(PathBuf::from("cube.obj")));
    }

    #[test]
    fn test_configured_model_is_resolved() {
        let cli = Cli::try_parse_from(["orbview"]).unwrap();
        let config = ViewerConfig {
            model: Some(PathBuf::from("models/cube.obj")),
            ..ViewerConfig::default()
        };
        assert_eq!(
            cli.model_path(&config),
            Some(PathBuf::from("assets/models/cube.obj"))
        );
    }

    #[test]
    fn test_no_flags_keep_config() {
        let cli = Cli::try_parse_from(["orbview", "--flip-v"]).unwrap();
        let mut config = ViewerConfig::default();
        config.loader.generate_normals = false;
        cli.apply(&mut config);
        assert!(config.loader.flip_v);
        assert!(config.loader.strict);
        assert!(!config.loader.generate_normals);
    }
}

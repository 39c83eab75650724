// cli.rs - Command-line interface configuration
use clap::Parser;
use std::path::PathBuf;

use crate::config::DemoMode;

#[derive(Parser, Debug, Clone, Default)]
#[command(name = "fishbones")]
#[command(about = "Animated fish viewer with cursor-reactive head tracking", long_about = None)]
pub struct Cli {
    /// Demo preset to start from
    #[arg(long, value_enum)]
    pub demo: Option<DemoMode>,

    /// JSON config file layered over the preset
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// glTF/GLB model to load instead of the preset's
    #[arg(long)]
    pub model: Option<PathBuf>,

    /// Bone that follows the cursor (enables head tracking)
    #[arg(long)]
    pub bone: Option<String>,

    /// Disable the overlay
    #[arg(long = "no-ui", default_value = "false")]
    pub no_ui: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_demo_and_flags() {
        let cli = Cli::parse_from(["fishbones", "--demo", "tracking", "--bone", "Jaw", "--no-ui"]);
        assert_eq!(cli.demo, Some(DemoMode::Tracking));
        assert_eq!(cli.bone.as_deref(), Some("Jaw"));
        assert!(cli.no_ui);
        assert!(cli.config.is_none());
    }

    #[test]
    fn defaults_leave_everything_to_config() {
        let cli = Cli::parse_from(["fishbones"]);
        assert!(cli.demo.is_none());
        assert!(cli.model.is_none());
        assert!(!cli.no_ui);
    }
}

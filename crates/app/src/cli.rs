//! Command-line arguments.

use std::path::PathBuf;

use clap::{Parser, ValueEnum};
use tessera_domain::RenderMode;

/// Render a template with filters, tags and plugins.
#[derive(Parser, Debug)]
#[command(name = "tessera", version, about, long_about = None)]
pub struct Args {
    /// Template text. Read from stdin when omitted.
    pub template: Option<String>,

    /// Which constructs to evaluate: all, variables or tags.
    #[arg(long, default_value_t = RenderMode::All)]
    pub mode: RenderMode,

    /// JSON file holding an object of render variables.
    #[arg(long, value_name = "FILE")]
    pub context: Option<PathBuf>,

    /// Label reported as the path of render errors.
    #[arg(long, value_name = "LABEL")]
    pub path: Option<String>,

    /// Templating config file. Defaults to the platform config directory.
    #[arg(long, value_name = "FILE", env = "TESSERA_CONFIG")]
    pub config: Option<PathBuf>,

    /// Model snapshot read by the response and cookie tags.
    #[arg(long, value_name = "FILE")]
    pub models: Option<PathBuf>,

    /// Id of the request being rendered.
    #[arg(long, value_name = "ID")]
    pub request_id: Option<String>,

    /// Id of the active environment.
    #[arg(long, value_name = "ID")]
    pub environment_id: Option<String>,

    /// Print definitions as JSON instead of rendering.
    #[arg(long, value_enum, value_name = "KIND", conflicts_with = "template")]
    pub list: Option<ListKind>,
}

/// Definition kinds that can be listed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ListKind {
    /// Template filters, built-in and plugin.
    Filters,
    /// Block tags from active plugins.
    Tags,
    /// Test names usable after `is`.
    Tests,
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn defaults() {
        let args = Args::try_parse_from(["tessera", "{{ a }}"]).unwrap();
        assert_eq!(args.template.as_deref(), Some("{{ a }}"));
        assert_eq!(args.mode, RenderMode::All);
        assert!(args.list.is_none());
    }

    #[test]
    fn mode_accepts_alias() {
        let args = Args::try_parse_from(["tessera", "--mode", "vars", "x"]).unwrap();
        assert_eq!(args.mode, RenderMode::Variables);
        assert!(Args::try_parse_from(["tessera", "--mode", "bogus", "x"]).is_err());
    }

    #[test]
    fn list_conflicts_with_template() {
        let args = Args::try_parse_from(["tessera", "--list", "filters"]).unwrap();
        assert_eq!(args.list, Some(ListKind::Filters));
        assert!(Args::try_parse_from(["tessera", "--list", "tags", "{{ a }}"]).is_err());
    }

    #[test]
    fn model_flags() {
        let args = Args::try_parse_from([
            "tessera",
            "--models",
            "models.json",
            "--request-id",
            "req_1",
            "--environment-id",
            "env_1",
            "x",
        ])
        .unwrap();
        assert_eq!(args.models, Some(PathBuf::from("models.json")));
        assert_eq!(args.request_id.as_deref(), Some("req_1"));
        assert_eq!(args.environment_id.as_deref(), Some("env_1"));
    }
}

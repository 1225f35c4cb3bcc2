use std::path::PathBuf;

use clap::Parser;

#[derive(Parser, Debug)]
#[command(name = "grun-agentd")]
#[command(version, about = "Autoscaler for ephemeral Gitea Actions runners")]
pub struct Args {
    /// Path to the TOML configuration file
    #[arg(short, long, env = "GRUN_CONFIG", default_value = "/etc/grun/config.toml")]
    pub config: PathBuf,

    /// Validate the configuration and exit
    #[arg(long)]
    pub check: bool,
}

use std::path::PathBuf;

use clap::Parser;

#[derive(Parser, Debug, Clone)]
#[command(name = "primview")]
#[command(about = "Interactive primitive shape viewer", long_about = None)]
pub struct Cli {
    /// JSON file holding the last selected shape kind
    #[arg(long, default_value = "primview-storage.json")]
    pub storage: PathBuf,

    /// Keep the selected shape kind in memory only
    #[arg(long = "no-persist")]
    pub no_persist: bool,

    /// Start from the persisted shape kind
    #[arg(long)]
    pub restore: bool,

    /// Select a shape kind at startup (Box, Sphere, Cone, Cylinder, Torus)
    #[arg(long)]
    pub shape: Option<String>,

    #[arg(long, default_value_t = 1280)]
    pub width: u32,

    #[arg(long, default_value_t = 720)]
    pub height: u32,

    #[arg(long = "no-vsync")]
    pub no_vsync: bool,

    #[arg(long = "no-auto-rotate")]
    pub no_auto_rotate: bool,
}

impl Cli {
    pub fn vsync(&self) -> bool {
        !self.no_vsync
    }
}

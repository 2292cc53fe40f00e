use super::Parser;

#[derive(Parser, Debug)]
#[command(name = "campus-graph", about = "Social relationship service")]
pub struct Cli {
    /// Path of the TOML settings file.
    #[arg(long)]
    pub settings: Option<String>,
}

//! Command line plus TOML settings. `--settings <path>` overrides the
//! build-profile default under `settings/`.

mod cli;
pub use clap::Parser;
pub use cli::*;

mod settings;
pub use settings::*;

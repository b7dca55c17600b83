//! Build-directory layout and generator configuration.
//!
//! - `BuildLayout`: computed paths inside a configured build directory.
//! - `GeneratorConfig`: optional user settings (`slngen.yaml` / `slngen.json`).
//! - `BuildContext`: layout plus loaded config.

mod config;
mod context;
mod layout;
mod util;

pub use config::GeneratorConfig;
pub use context::BuildContext;
pub use layout::BuildLayout;
pub use util::load_generator_config;

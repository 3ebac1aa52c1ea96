// Library surface for the binary, headless/integration tests and reuse.
// Terminal rendering stays in the binary (ui.rs) so this side has no ratatui coupling.
pub mod app_dirs;
pub mod config;
pub mod pagination;
pub mod provider;
pub mod runtime;
pub mod scoring;
pub mod session;
pub mod timer;
pub mod util;

//! Configuration file discovery and resolution.

mod manager;

pub use manager::{
    Config, ConfigFile, ConfigManager, DEFAULT_API_ENDPOINT, DEFAULT_CODE_BLOCK_PRESERVATION_LINES,
    DEFAULT_FRAGMENT_SIZE, DEFAULT_MODEL, DEFAULT_TEMPERATURE, OverwritePolicy, ResolveOptions,
    Resolved, resolve_config, resolve_model_shorthand,
};

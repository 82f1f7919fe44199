pub mod types;
pub mod error;
pub mod vasp_parsers;
pub mod analysis;
pub mod settings;
pub mod commands;
pub mod cli;

pub use types::Result;
pub use cli::OptProcess;
pub use error::{
    ExtractError,
    ExtractResult,
};
pub use settings::Settings;

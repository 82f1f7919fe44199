use clap::Args;
use log::info;

use crate::{
    types::Result,
    OptProcess,
    commands::common::SettingsArgs,
    settings::Settings,
};


#[derive(Debug, Args)]
/// Print the effective settings as TOML.
///
/// Save the output as `./rsband.toml` or in the user's config directory and edit it to
/// change the defaults of the other commands.
pub struct Config {
    #[command(flatten)]
    settings: SettingsArgs,
}


impl OptProcess for Config {
    fn process(&self) -> Result<()> {
        if let Some(path) = Settings::user_config_path() {
            info!("User settings file: {:?}", path);
        }
        let settings = self.settings.load()?;
        print!("{}", settings.to_toml()?);
        Ok(())
    }
}

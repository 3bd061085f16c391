//! `normargs settings` command

use anyhow::{anyhow, Result};

use crate::cli::{SettingsArgs, SettingsCommands};
use normargs::util::diagnostic::suggestions;
use normargs::util::settings::Settings;
use normargs::GlobalContext;

pub fn execute(args: SettingsArgs, ctx: &mut GlobalContext) -> Result<()> {
    match args.command {
        SettingsCommands::List => {
            let settings = ctx.settings();
            for name in settings.names() {
                let value = settings
                    .get(name)
                    .map(|v| v.to_string())
                    .unwrap_or_default();
                let marker = if settings.is_set(name) { " (set)" } else { "" };
                println!(
                    "{} = {}{}  # {}",
                    name,
                    value,
                    marker,
                    settings.description(name).unwrap_or_default()
                );
            }
            Ok(())
        }

        SettingsCommands::Get { name } => {
            let value = ctx.settings().get(&name).ok_or_else(|| {
                anyhow!("unknown setting `{}`\n{}", name, suggestions::LIST_SETTINGS)
            })?;
            println!("{}", value);
            Ok(())
        }

        SettingsCommands::Set { name, value } => {
            ctx.settings_mut()
                .set(&name, Settings::parse_value(&value))
                .map_err(|e| anyhow!("{}\n{}", e, suggestions::LIST_SETTINGS))?;
            ctx.save_settings()?;
            tracing::info!("Saved {} to {}", name, ctx.settings_path().display());
            Ok(())
        }

        SettingsCommands::Reset { name } => {
            ctx.settings_mut()
                .reset(name.as_deref())
                .map_err(|e| anyhow!("{}\n{}", e, suggestions::LIST_SETTINGS))?;
            ctx.save_settings()?;
            Ok(())
        }
    }
}

//! Factory preset commands.

use clap::{Args, Subcommand};
use ongen_config::{FACTORY_PRESET_NAMES, factory_presets, get_factory_preset};
use std::path::PathBuf;

#[derive(Args)]
pub struct PresetsArgs {
    #[command(subcommand)]
    command: Option<PresetsCommand>,
}

#[derive(Subcommand)]
enum PresetsCommand {
    /// List factory presets
    List,

    /// Print a factory preset as TOML
    Show {
        /// Preset name
        name: String,
    },

    /// Write a factory preset to a file for editing
    Export {
        /// Preset name
        name: String,

        /// Destination TOML file
        path: PathBuf,
    },
}

pub fn run(args: PresetsArgs) -> anyhow::Result<()> {
    match args.command.unwrap_or(PresetsCommand::List) {
        PresetsCommand::List => {
            println!("Factory Presets");
            println!("===============\n");
            for preset in factory_presets() {
                println!(
                    "  {:<10} {} channel(s)  {}",
                    preset.name,
                    preset.len(),
                    preset.description.as_deref().unwrap_or("")
                );
            }
        }
        PresetsCommand::Show { name } => {
            let preset = factory(&name)?;
            print!("{}", preset.to_toml()?);
        }
        PresetsCommand::Export { name, path } => {
            let preset = factory(&name)?;
            preset.save(&path)?;
            println!("Saved '{}' to {}", name, path.display());
        }
    }
    Ok(())
}

fn factory(name: &str) -> anyhow::Result<ongen_config::Preset> {
    get_factory_preset(name).ok_or_else(|| {
        anyhow::anyhow!(
            "Unknown factory preset '{}'. Available: {}",
            name,
            FACTORY_PRESET_NAMES.join(", ")
        )
    })
}

// FILE: crates/cli/src/main.rs

use anyhow::Result;
use clap::{Arg, ArgAction, Command};
use std::path::PathBuf;

mod commands;

fn config_arg() -> Arg {
    Arg::new("config")
        .short('c')
        .long("config")
        .value_name("FILE")
        .help("Config file to load (repeatable); defaults to the user config directory")
        .value_parser(clap::value_parser!(PathBuf))
        .action(ArgAction::Append)
}

fn guide_arg(required: bool) -> Arg {
    Arg::new("guide")
        .short('g')
        .long("guide")
        .value_name("DIR")
        .help("Local checkout of the guide data")
        .value_parser(clap::value_parser!(PathBuf))
        .required(required)
}

fn build_cli() -> Command {
    Command::new("guidesync")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Synchronizes guide custom formats, scores and release profiles to Radarr and Sonarr")
        .subcommand_required(true)
        .arg_required_else_help(true)
        .arg(
            Arg::new("verbose")
                .short('v')
                .long("verbose")
                .help("Enable debug logging")
                .action(ArgAction::SetTrue)
                .global(true),
        )
        .subcommand(
            Command::new("sync")
                .about("Bring every configured instance in line with the guide")
                .arg(
                    Arg::new("service")
                        .value_name("SERVICE")
                        .help("Only process instances of this service")
                        .value_parser(["radarr", "sonarr"]),
                )
                .arg(config_arg())
                .arg(
                    Arg::new("instance")
                        .short('i')
                        .long("instance")
                        .value_name("NAME")
                        .help("Only process this instance (repeatable)")
                        .action(ArgAction::Append),
                )
                .arg(guide_arg(false))
                .arg(
                    Arg::new("preview")
                        .short('p')
                        .long("preview")
                        .help("Show what would change without modifying anything")
                        .action(ArgAction::SetTrue),
                ),
        )
        .subcommand(
            Command::new("list")
                .about("Show guide data")
                .subcommand_required(true)
                .subcommand(
                    Command::new("custom-formats")
                        .about("List guide custom formats")
                        .arg(guide_arg(true))
                        .arg(
                            Arg::new("service")
                                .short('s')
                                .long("service")
                                .value_name("SERVICE")
                                .help("Only list formats for this service")
                                .value_parser(["radarr", "sonarr"]),
                        ),
                )
                .subcommand(
                    Command::new("release-profiles")
                        .about("List guide release profiles")
                        .arg(guide_arg(true)),
                ),
        )
        .subcommand(
            Command::new("delete")
                .about("Delete things from Radarr or Sonarr")
                .subcommand_required(true)
                .subcommand(
                    Command::new("custom-formats")
                        .about("Delete custom formats from one instance")
                        .arg(
                            Arg::new("instance")
                                .value_name("INSTANCE")
                                .help("Instance to delete custom formats from")
                                .required(true),
                        )
                        .arg(
                            Arg::new("names")
                                .value_name("NAME")
                                .help("Custom format names to delete")
                                .num_args(1..)
                                .required_unless_present("all"),
                        )
                        .arg(config_arg())
                        .arg(
                            Arg::new("all")
                                .short('a')
                                .long("all")
                                .help("Delete every custom format on the instance")
                                .conflicts_with("names")
                                .action(ArgAction::SetTrue),
                        )
                        .arg(
                            Arg::new("force")
                                .short('f')
                                .long("force")
                                .help("Skip the confirmation prompt")
                                .action(ArgAction::SetTrue),
                        )
                        .arg(
                            Arg::new("preview")
                                .short('p')
                                .long("preview")
                                .help("Show what would be deleted without deleting anything")
                                .action(ArgAction::SetTrue),
                        ),
                ),
        )
        .subcommand(
            Command::new("config")
                .about("Configuration utilities")
                .subcommand_required(true)
                .subcommand(
                    Command::new("validate")
                        .about("Load and validate config files without contacting any service")
                        .arg(config_arg()),
                ),
        )
}

#[tokio::main]
async fn main() -> Result<()> {
    let matches = build_cli().get_matches();

    let default_filter = if matches.get_flag("verbose") {
        "debug"
    } else {
        "info"
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_filter))
        .init();

    match matches.subcommand() {
        Some(("sync", sub_matches)) => {
            let status = commands::sync(sub_matches).await?;
            if status.code() != 0 {
                std::process::exit(status.code());
            }
            Ok(())
        }
        Some(("list", sub_matches)) => match sub_matches.subcommand() {
            Some(("custom-formats", list_matches)) => commands::list_custom_formats(list_matches),
            Some(("release-profiles", list_matches)) => {
                commands::list_release_profiles(list_matches)
            }
            _ => {
                build_cli().print_help()?;
                Ok(())
            }
        },
        Some(("delete", sub_matches)) => match sub_matches.subcommand() {
            Some(("custom-formats", delete_matches)) => {
                commands::delete_custom_formats(delete_matches).await
            }
            _ => {
                build_cli().print_help()?;
                Ok(())
            }
        },
        Some(("config", sub_matches)) => match sub_matches.subcommand() {
            Some(("validate", validate_matches)) => commands::validate_config(validate_matches),
            _ => {
                build_cli().print_help()?;
                Ok(())
            }
        },
        _ => {
            build_cli().print_help()?;
            Ok(())
        }
    }
}

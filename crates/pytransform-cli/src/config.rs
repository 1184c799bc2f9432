//! Configuration loading helpers for the CLI.
//!
//! Configuration flags must precede the subcommand. The leading run of known
//! flags is handed to `ortho_config`; everything from the first other token
//! on is parsed by clap.

use std::ffi::{OsStr, OsString};

use ortho_config::OrthoConfig;
use pytransform_config::Config;

use crate::AppError;

/// CLI flags recognised by the configuration loader that take a value.
///
/// Keep in sync with the fields of [`Config`].
pub(crate) const CONFIG_CLI_FLAGS: &[&str] = &[
    "--config-path",
    "--service-url",
    "--worker-dir",
    "--worker-program",
    "--worker-entry",
    "--connect-timeout-ms",
    "--request-timeout-ms",
    "--startup-timeout-ms",
    "--language",
    "--log-filter",
    "--log-format",
];

/// Configuration switches that take no separate value.
pub(crate) const CONFIG_CLI_SWITCHES: &[&str] = &["--auto-start"];

pub(crate) trait ConfigLoader {
    /// Loads configuration from the leading configuration arguments.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::LoadConfiguration`] when a layer is malformed.
    fn load(&self, args: &[OsString]) -> Result<Config, AppError>;
}

/// Loads configuration through `ortho_config`'s layered sources.
pub(crate) struct OrthoConfigLoader;

impl ConfigLoader for OrthoConfigLoader {
    fn load(&self, args: &[OsString]) -> Result<Config, AppError> {
        Config::load_from_iter(args.iter().cloned()).map_err(AppError::LoadConfiguration)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FlagAction {
    Include { needs_value: bool },
    Stop,
}

fn classify_flag(argument: &OsStr) -> FlagAction {
    let text = argument.to_string_lossy();
    if !text.starts_with("--") {
        return FlagAction::Stop;
    }
    let (flag, inline_value) = match text.split_once('=') {
        Some((flag, _)) => (flag, true),
        None => (text.as_ref(), false),
    };
    if CONFIG_CLI_FLAGS.contains(&flag) {
        FlagAction::Include {
            needs_value: !inline_value,
        }
    } else if CONFIG_CLI_SWITCHES.contains(&flag) {
        FlagAction::Include { needs_value: false }
    } else {
        FlagAction::Stop
    }
}

/// Arguments split into the configuration prefix and the command remainder.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct ConfigArgumentSplit {
    /// Program name followed by the configuration flags.
    pub(crate) config_arguments: Vec<OsString>,
    /// Program name followed by the subcommand and its arguments.
    pub(crate) command_arguments: Vec<OsString>,
}

pub(crate) fn split_config_arguments(args: &[OsString]) -> ConfigArgumentSplit {
    let Some(program) = args.first() else {
        return ConfigArgumentSplit {
            config_arguments: Vec::new(),
            command_arguments: Vec::new(),
        };
    };

    let mut config_arguments = vec![program.clone()];
    let mut index = 1;
    while let Some(argument) = args.get(index) {
        match classify_flag(argument) {
            FlagAction::Include { needs_value } => {
                config_arguments.push(argument.clone());
                index += 1;
                if needs_value && let Some(value) = args.get(index) {
                    config_arguments.push(value.clone());
                    index += 1;
                }
            }
            FlagAction::Stop => break,
        }
    }

    let mut command_arguments = vec![program.clone()];
    command_arguments.extend(args.get(index..).unwrap_or_default().iter().cloned());
    ConfigArgumentSplit {
        config_arguments,
        command_arguments,
    }
}

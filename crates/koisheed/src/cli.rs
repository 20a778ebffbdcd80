//! Splits the command line into configuration flags and the hook command.
//!
//! The command line is `koisheed [config flags] <hook> [hook args...]`.
//! Configuration flags are only recognised before the hook: the first token
//! that is not a known flag (or its value) starts the hook command, and
//! everything after it is passed to the hook untouched, including tokens
//! that look like koisheed flags. A literal `--` ends the flags explicitly.
//!
//! Short flags take their value either as the next token (`-e URL`) or
//! attached to the flag (`-eURL`).

use std::ffi::{OsStr, OsString};

use koishee_hooks::HookCommand;

/// Long flags consumed by the configuration loader.
///
/// MAINTENANCE: keep in step with the fields of `koishee_config::Config`
/// and the flags the loader adds itself.
pub(crate) const CONFIG_CLI_FLAGS: &[&str] = &[
    "--config-path",
    "--etcd",
    "--domain",
    "--local",
    "--log-filter",
    "--log-format",
];

/// Short aliases of [`CONFIG_CLI_FLAGS`], matching the `cli_short` letters
/// declared on `koishee_config::Config`.
pub(crate) const CONFIG_SHORT_FLAGS: &[char] = &['e', 'd', 'l', 'f', 'F'];

/// Usage summary printed for `--help` and usage errors.
pub const USAGE: &str = "usage: koisheed [--config-path FILE] [-e|--etcd URL] \
     [-d|--domain DOMAIN] [-l|--local DOMAIN] [-f|--log-filter FILTER] \
     [-F|--log-format json|compact] <hook> [hook args...]";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Token {
    ConfigFlag { needs_value: bool },
    Terminator,
    Help,
    Hook,
}

fn classify(argument: &OsStr) -> Token {
    let text = argument.to_string_lossy();
    if text == "--" {
        return Token::Terminator;
    }
    if text == "--help" || text == "-h" {
        return Token::Help;
    }
    if !text.starts_with("--") {
        return classify_short(&text);
    }

    let mut parts = text.splitn(2, '=');
    let flag = parts.next().unwrap_or_default();
    let has_inline_value = parts.next().is_some();

    if CONFIG_CLI_FLAGS.contains(&flag) {
        Token::ConfigFlag {
            needs_value: !has_inline_value,
        }
    } else {
        Token::Hook
    }
}

fn classify_short(text: &str) -> Token {
    let Some(rest) = text.strip_prefix('-') else {
        return Token::Hook;
    };
    let mut letters = rest.chars();
    match letters.next() {
        Some(letter) if CONFIG_SHORT_FLAGS.contains(&letter) => Token::ConfigFlag {
            needs_value: letters.as_str().is_empty(),
        },
        _ => Token::Hook,
    }
}

/// Result of splitting the process arguments.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandLine {
    /// Program name followed by the configuration flags.
    pub config_arguments: Vec<OsString>,
    /// Hook command, absent when none was given.
    pub hook: Option<HookCommand>,
    /// Whether `--help` appeared before the hook.
    pub help_requested: bool,
}

/// Splits `args` (program name first) at the start of the hook command.
#[must_use]
pub fn split_command_line<I>(args: I) -> CommandLine
where
    I: IntoIterator<Item = OsString>,
{
    let mut tokens = args.into_iter();
    let mut config_arguments: Vec<OsString> = tokens.next().into_iter().collect();
    let mut hook_argv: Vec<OsString> = Vec::new();
    let mut help_requested = false;

    while let Some(argument) = tokens.next() {
        match classify(&argument) {
            Token::ConfigFlag { needs_value } => {
                config_arguments.push(argument);
                if needs_value {
                    config_arguments.extend(tokens.next());
                }
            }
            Token::Help => {
                help_requested = true;
                break;
            }
            Token::Terminator => {
                hook_argv.extend(tokens.by_ref());
                break;
            }
            Token::Hook => {
                hook_argv.push(argument);
                hook_argv.extend(tokens.by_ref());
                break;
            }
        }
    }

    CommandLine {
        config_arguments,
        hook: HookCommand::from_argv(hook_argv),
        help_requested,
    }
}

//! `link` command handler.

use crate::cli::args::LinkArgs;
use crate::config::ConfigLoader;
use crate::contact::{self, ContactLinks};
use crate::error::{ConfigError, MockupSimError};

/// Print a contact deep link, or the list of canned messages.
///
/// The number comes from `--number`, then the config file, then the
/// environment.
///
/// # Errors
///
/// Returns a config error for an unknown preset, a malformed number or a
/// bad config file.
pub fn run(args: &LinkArgs) -> Result<(), MockupSimError> {
    if args.list_presets {
        for (key, message) in contact::PRESETS {
            println!("{key:<28} {message}");
        }
        return Ok(());
    }

    let message = message(args)?;
    let links = links(args)?;
    println!("{}", links.link(message));
    Ok(())
}

fn message(args: &LinkArgs) -> Result<&str, ConfigError> {
    match (&args.message, &args.preset) {
        (Some(message), _) => Ok(message.as_str()),
        (None, Some(key)) => contact::preset(key).ok_or_else(|| ConfigError::InvalidValue {
            field: "preset".to_string(),
            value: key.clone(),
            expected: "a key listed by --list-presets".to_string(),
        }),
        (None, None) => Ok(""),
    }
}

fn links(args: &LinkArgs) -> Result<ContactLinks, ConfigError> {
    if let Some(number) = &args.number {
        return ContactLinks::new(number.trim());
    }
    match &args.config {
        Some(path) => ConfigLoader::with_defaults().load(path)?.config.contact_links(),
        None => Ok(ContactLinks::global().clone()),
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use clap::Parser;

    use super::*;
    use crate::cli::args::{Cli, Commands};

    fn link_args(argv: &[&str]) -> LinkArgs {
        let mut full = vec!["mockupsim", "link"];
        full.extend_from_slice(argv);
        match Cli::try_parse_from(full).unwrap().command {
            Commands::Link(args) => args,
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn test_explicit_number_and_message() {
        let args = link_args(&["Olá! Tudo bem?", "--number", "5511999990000"]);
        let url = links(&args).unwrap().link(message(&args).unwrap());
        assert_eq!(
            url,
            "https://wa.me/5511999990000?text=Ol%C3%A1!%20Tudo%20bem%3F"
        );
    }

    #[test]
    fn test_preset_lookup() {
        let args = link_args(&["--preset", "contato"]);
        assert_eq!(message(&args).unwrap(), contact::preset("contato").unwrap());

        let args = link_args(&["--preset", "nope"]);
        assert!(matches!(
            message(&args),
            Err(ConfigError::InvalidValue { .. })
        ));
    }

    #[test]
    fn test_bad_number_rejected() {
        let args = link_args(&["hi", "--number", "+55 11"]);
        assert!(links(&args).is_err());
    }

    #[test]
    fn test_number_from_config() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "contact:\n  number: \"5521988887777\"").unwrap();
        let args = link_args(&["hi", "--config", file.path().to_str().unwrap()]);
        assert_eq!(links(&args).unwrap().number(), "5521988887777");
    }
}

//! ssss: Shamir secret sharing from the command line
//!
//! Secrets and shares are read from stdin, results are written to stdout,
//! one share per line.

mod config;

use anyhow::{bail, Context, Result};
use ssss_shamir::{SecretEncoding, ShamirConfig, SplitOptions};
use std::io::Read;
use std::path::PathBuf;
use zeroize::Zeroizing;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Command {
    Split,
    Combine,
    Resplit,
    Extend,
    Regenerate,
}

impl Command {
    fn from_name(name: &str) -> Option<Self> {
        match name {
            "split" => Some(Self::Split),
            "combine" => Some(Self::Combine),
            "resplit" => Some(Self::Resplit),
            "extend" => Some(Self::Extend),
            "regenerate" => Some(Self::Regenerate),
            _ => None,
        }
    }
}

/// Command-line flags; unset values fall back to the config file
#[derive(Debug, Default, PartialEq, Eq)]
struct Flags {
    threshold: Option<usize>,
    number_of_keys: Option<usize>,
    prefix: Option<String>,
    hex: bool,
    entropy: Option<String>,
    export_entropy: bool,
    index: Option<u64>,
}

#[derive(Debug, PartialEq, Eq)]
enum Action {
    Help,
    Version,
    Run {
        config_path: Option<PathBuf>,
        command: Command,
        flags: Flags,
    },
}

fn main() -> Result<()> {
    let args: Vec<String> = std::env::args().skip(1).collect();

    let (config_path, command, flags) = match parse_args(&args)? {
        Action::Help => {
            print_help();
            return Ok(());
        }
        Action::Version => {
            println!("ssss {}", env!("CARGO_PKG_VERSION"));
            return Ok(());
        }
        Action::Run {
            config_path,
            command,
            flags,
        } => (config_path, command, flags),
    };

    // Load config
    let mut cli_config = match &config_path {
        Some(path) => config::CliConfig::from_file(path)
            .with_context(|| format!("Failed to load config from {}", path.display()))?,
        None => config::CliConfig::default(),
    };
    cli_config.apply_env_overrides();
    cli_config
        .validate()
        .context("Configuration validation failed")?;

    // Initialize logging
    std::env::set_var("RUST_LOG", &cli_config.logging.level);
    env_logger::init();

    log::debug!("Running {:?}", command);
    let shamir_config = apply_flags(cli_config.shamir_config(), &flags);
    run(command, &flags, &shamir_config)
}

fn parse_args(args: &[String]) -> Result<Action> {
    let mut config_path = None;
    let mut command = None;
    let mut flags = Flags::default();

    let mut i = 0;
    while i < args.len() {
        let arg = args[i].as_str();
        match arg {
            "--help" | "-h" => return Ok(Action::Help),
            "--version" | "-V" => return Ok(Action::Version),
            "--config" | "-c" => {
                let value = flag_value(args, &mut i, arg)?;
                config_path = Some(PathBuf::from(value));
            }
            "--threshold" | "-t" => {
                let value = flag_value(args, &mut i, arg)?;
                flags.threshold = Some(parse_number(value, arg)?);
            }
            "--number-of-keys" | "-n" => {
                let value = flag_value(args, &mut i, arg)?;
                flags.number_of_keys = Some(parse_number(value, arg)?);
            }
            "--prefix" | "-p" => {
                let value = flag_value(args, &mut i, arg)?;
                flags.prefix = Some(value.to_string());
            }
            "--index" | "-i" => {
                let value = flag_value(args, &mut i, arg)?;
                flags.index = Some(parse_number(value, arg)?);
            }
            "--entropy" => {
                let value = flag_value(args, &mut i, arg)?;
                flags.entropy = Some(value.to_string());
            }
            "--hex" | "-x" => flags.hex = true,
            "--export-entropy" => flags.export_entropy = true,
            other if other.starts_with('-') => bail!("Unknown flag: {}", other),
            other => {
                if command.is_some() {
                    bail!("Unexpected argument: {}", other);
                }
                command = Some(
                    Command::from_name(other)
                        .with_context(|| format!("Unknown command: {}", other))?,
                );
            }
        }
        i += 1;
    }

    let command = command.context("No command given (try --help)")?;
    Ok(Action::Run {
        config_path,
        command,
        flags,
    })
}

fn flag_value<'a>(args: &'a [String], i: &mut usize, flag: &str) -> Result<&'a str> {
    *i += 1;
    args.get(*i)
        .map(String::as_str)
        .with_context(|| format!("{} requires a value", flag))
}

fn parse_number<T: std::str::FromStr>(value: &str, flag: &str) -> Result<T> {
    value
        .parse()
        .map_err(|_| anyhow::anyhow!("{} expects a number, got {:?}", flag, value))
}

fn apply_flags(mut config: ShamirConfig, flags: &Flags) -> ShamirConfig {
    if let Some(threshold) = flags.threshold {
        config.threshold = threshold;
    }
    if let Some(number_of_keys) = flags.number_of_keys {
        config.number_of_keys = number_of_keys;
    }
    if let Some(prefix) = &flags.prefix {
        config.prefix = Some(prefix.clone());
    }
    if flags.hex {
        config.encoding = SecretEncoding::Hex;
    }
    config
}

fn run(command: Command, flags: &Flags, config: &ShamirConfig) -> Result<()> {
    match command {
        Command::Split => {
            let secret = read_secret()?;
            let options = SplitOptions {
                entropy: flags.entropy.clone(),
                export_entropy: flags.export_entropy,
            };
            let output = ssss_shamir::split(&secret, config, &options)
                .context("Split failed")?;
            for share in &output.shares {
                println!("{}", share);
            }
            if let Some(entropy) = output.entropy {
                eprintln!("entropy: {}", entropy.as_str());
            }
        }
        Command::Combine => {
            let shares = read_shares()?;
            let secret = ssss_shamir::combine(&shares, config.threshold, config.encoding)
                .context("Combine failed")?;
            println!("{}", secret.as_str());
        }
        Command::Resplit => {
            let shares = read_shares()?;
            let fresh = ssss_shamir::resplit(&shares, config).context("Resplit failed")?;
            for share in fresh {
                println!("{}", share);
            }
        }
        Command::Extend => {
            let shares = read_shares()?;
            let prefix = config.prefix.as_deref();
            let share = ssss_shamir::extend(&shares, config.threshold, prefix)
                .context("Extend failed")?;
            println!("{}", share);
        }
        Command::Regenerate => {
            let index = flags.index.context("regenerate requires --index")?;
            let shares = read_shares()?;
            let share = ssss_shamir::regenerate(
                &shares,
                config.threshold,
                index,
                config.prefix.as_deref(),
            )
            .context("Regenerate failed")?;
            println!("{}", share);
        }
    }
    Ok(())
}

/// The secret is everything on stdin minus the trailing line break
fn read_secret() -> Result<Zeroizing<String>> {
    let mut input = Zeroizing::new(String::new());
    std::io::stdin()
        .read_to_string(&mut input)
        .context("Failed to read secret from stdin")?;
    let secret = input.trim_end_matches(&['\n', '\r'][..]);
    if secret.is_empty() {
        bail!("No secret on stdin");
    }
    Ok(Zeroizing::new(secret.to_string()))
}

/// One share per line; blank lines are skipped
fn read_shares() -> Result<Vec<String>> {
    let mut input = String::new();
    std::io::stdin()
        .read_to_string(&mut input)
        .context("Failed to read shares from stdin")?;
    Ok(shares_from_lines(&input))
}

fn shares_from_lines(input: &str) -> Vec<String> {
    input
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(str::to_string)
        .collect()
}

fn print_help() {
    println!(
        r#"ssss - Shamir's secret sharing over GF(2^n)

USAGE:
    ssss [OPTIONS] <COMMAND>

COMMANDS:
    split        Read a secret from stdin and print the shares
    combine      Read shares from stdin and print the secret
    resplit      Read shares from stdin and print a fresh batch
    extend       Read shares from stdin and print one new share
    regenerate   Read shares from stdin and print the share at --index

OPTIONS:
    -c, --config <PATH>          Path to config file (TOML)
    -t, --threshold <N>          Shares needed to reconstruct
    -n, --number-of-keys <N>     Shares to generate
    -p, --prefix <TOKEN>         Token prepended to every share
    -x, --hex                    Secret is hex digits, not text
    -i, --index <N>              Share index for regenerate
        --entropy <HEX>          Use these coefficients instead of random ones
        --export-entropy         Print the coefficients used to stderr
    -h, --help                   Print this help
    -V, --version                Print version

ENVIRONMENT:
    SSSS_THRESHOLD, SSSS_NUMBER_OF_KEYS, SSSS_PREFIX, SSSS_HEX,
    SSSS_THRESHOLD_POLICY, SSSS_LOG_LEVEL
    Override config file values.

EXAMPLES:
    echo -n 'my secret' | ssss split -t 3 -n 5 -p vault
    head -3 shares.txt | ssss combine -t 3"#
    );
}

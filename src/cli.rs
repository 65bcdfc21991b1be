//! Command-line interface for mvc-dispatch.
//!
//! Uses lexopt for minimal binary size overhead.

use std::ffi::OsString;
use std::net::IpAddr;
use std::path::PathBuf;

/// Command-line arguments.
///
/// Options left unset do not override the config file or environment.
#[derive(Debug, Clone, Default)]
pub struct Args {
    /// Host address to bind to.
    pub host: Option<IpAddr>,
    /// Port to listen on.
    pub port: Option<u16>,
    /// Path to configuration file.
    pub config: Option<PathBuf>,
    /// Static file root.
    pub root: Option<PathBuf>,
    /// Default controller name.
    pub default_controller: Option<String>,
    /// Log level (error, warn, info, debug, trace).
    pub log_level: Option<String>,
    /// Show version and exit.
    pub version: bool,
    /// Show help and exit.
    pub help: bool,
}

/// Parse command-line arguments.
pub fn parse_args() -> Result<Args, ArgsError> {
    parse_args_from(std::env::args_os())
}

/// Parse arguments from an iterator (for testing).
pub fn parse_args_from<I>(args: I) -> Result<Args, ArgsError>
where
    I: IntoIterator<Item = OsString>,
{
    use lexopt::prelude::*;

    let mut result = Args::default();
    let mut parser = lexopt::Parser::from_iter(args);

    while let Some(arg) = parser.next()? {
        match arg {
            Short('h') | Long("help") => {
                result.help = true;
            }
            Short('V') | Long("version") => {
                result.version = true;
            }
            Short('H') | Long("host") => {
                let value: String = parser.value()?.parse()?;
                result.host = Some(
                    value
                        .parse()
                        .map_err(|_| ArgsError::InvalidValue("host", value))?,
                );
            }
            Short('p') | Long("port") => {
                let value: String = parser.value()?.parse()?;
                result.port = Some(
                    value
                        .parse()
                        .map_err(|_| ArgsError::InvalidValue("port", value))?,
                );
            }
            Short('c') | Long("config") => {
                result.config = Some(parser.value()?.parse()?);
            }
            Short('r') | Long("root") => {
                result.root = Some(parser.value()?.parse()?);
            }
            Short('d') | Long("default-controller") => {
                let value: String = parser.value()?.parse()?;
                if value.is_empty() || value.contains('/') {
                    return Err(ArgsError::InvalidValue("default-controller", value));
                }
                result.default_controller = Some(value);
            }
            Short('l') | Long("log-level") => {
                result.log_level = Some(parser.value()?.parse()?);
            }
            Value(val) => {
                return Err(ArgsError::UnexpectedArgument(val.to_string_lossy().into()));
            }
            _ => return Err(arg.unexpected().into()),
        }
    }

    Ok(result)
}

/// Print help message.
pub fn print_help() {
    let version = env!("CARGO_PKG_VERSION");
    println!(
        r#"mvc-dispatch {version}
Controller/action request dispatch with cookie sessions and static files

USAGE:
    mvc-dispatch [OPTIONS]

OPTIONS:
    -H, --host <ADDR>                Host address to bind [default: 127.0.0.1]
    -p, --port <PORT>                Port to listen on [default: 3000]
    -c, --config <FILE>              Path to configuration file (JSON)
    -r, --root <DIR>                 Static file root [default: executable directory]
    -d, --default-controller <NAME>  Controller for paths no other controller claims
    -l, --log-level <LVL>            Log level (error, warn, info, debug, trace)
    -h, --help                       Print help
    -V, --version                    Print version

ENVIRONMENT VARIABLES:
    MVC_DISPATCH_HOST                Host address (overrides config)
    MVC_DISPATCH_PORT                Port number (overrides config)
    MVC_DISPATCH_ROOT                Static file root (overrides config)
    MVC_DISPATCH_DEFAULT_CONTROLLER  Default controller (overrides config)
    MVC_DISPATCH_LOG_LEVEL           Log level (overrides config)
    RUST_LOG                         Alternative log level setting

EXAMPLES:
    # Serve the current directory on localhost:3000
    mvc-dispatch -r .

    # Listen on all interfaces
    mvc-dispatch -H 0.0.0.0 -p 8080 -r /srv/site

    # Start with config file
    mvc-dispatch -c /etc/mvc-dispatch/config.json
"#
    );
}

/// Print version.
pub fn print_version() {
    println!("mvc-dispatch {}", env!("CARGO_PKG_VERSION"));
}

/// Argument parsing errors.
#[derive(Debug)]
pub enum ArgsError {
    /// Lexopt parsing error.
    Lexopt(lexopt::Error),
    /// Invalid argument value.
    InvalidValue(&'static str, String),
    /// Unexpected positional argument.
    UnexpectedArgument(String),
}

impl std::fmt::Display for ArgsError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Lexopt(e) => write!(f, "{}", e),
            Self::InvalidValue(name, value) => {
                write!(f, "invalid value for --{}: '{}'", name, value)
            }
            Self::UnexpectedArgument(arg) => {
                write!(f, "unexpected argument: '{}'", arg)
            }
        }
    }
}

impl std::error::Error for ArgsError {}

impl From<lexopt::Error> for ArgsError {
    fn from(e: lexopt::Error) -> Self {
        Self::Lexopt(e)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(args: &[&str]) -> Vec<OsString> {
        std::iter::once("mvc-dispatch")
            .chain(args.iter().copied())
            .map(OsString::from)
            .collect()
    }

    #[test]
    fn test_default_args() {
        let result = parse_args_from(args(&[])).unwrap();
        assert!(result.host.is_none());
        assert!(result.port.is_none());
        assert!(result.root.is_none());
        assert!(!result.help);
    }

    #[test]
    fn test_host_port() {
        let result = parse_args_from(args(&["-H", "0.0.0.0", "-p", "8080"])).unwrap();
        assert_eq!(result.host.unwrap().to_string(), "0.0.0.0");
        assert_eq!(result.port, Some(8080));
    }

    #[test]
    fn test_root_and_default_controller() {
        let result = parse_args_from(args(&[
            "--root",
            "/srv/site",
            "--default-controller",
            "home",
        ]))
        .unwrap();
        assert_eq!(result.root, Some(PathBuf::from("/srv/site")));
        assert_eq!(result.default_controller.as_deref(), Some("home"));
    }

    #[test]
    fn test_bad_default_controller() {
        assert!(parse_args_from(args(&["-d", "a/b"])).is_err());
    }

    #[test]
    fn test_help_and_version_flags() {
        assert!(parse_args_from(args(&["--help"])).unwrap().help);
        assert!(parse_args_from(args(&["-V"])).unwrap().version);
    }

    #[test]
    fn test_invalid_port() {
        let err = parse_args_from(args(&["-p", "invalid"])).unwrap_err();
        assert_eq!(err.to_string(), "invalid value for --port: 'invalid'");
    }

    #[test]
    fn test_unexpected_positional() {
        assert!(matches!(
            parse_args_from(args(&["serve"])),
            Err(ArgsError::UnexpectedArgument(_))
        ));
    }
}

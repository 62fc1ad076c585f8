use std::io::Write;
use std::process::ExitCode;

mod chirp;
mod cmd;
mod utils;

use chirp::{Connector, JobConnector};
use cmd::registry::Registry;
use cmd::{binder, render};
use utils::logging;

const PROGRAM: &str = "rchirp";

fn main() -> ExitCode {
    let args: Vec<String> = std::env::args().skip(1).collect();
    let registry = Registry::new();
    ExitCode::from(run(&registry, &JobConnector, &args, &mut std::io::stdout()))
}

/// Dispatch one invocation: resolve the command token, parse the rest
/// of the tokens, run the command, render its reply. Returns the
/// process exit status.
///
/// An unknown command is reported on stdout with a zero exit status,
/// matching the tool this replaces; scripts probe for commands that
/// older installations do not have.
fn run(registry: &Registry, connector: &dyn Connector, args: &[String], out: &mut dyn Write) -> u8 {
    let Some(command) = args.first() else {
        eprintln!("usage: {PROGRAM} [-h] command [args]");
        return 2;
    };

    if command == "-h" || command == "--help" {
        let _ = out.write_all(registry.catalog(PROGRAM).as_bytes());
        return 0;
    }

    let Some(entry) = registry.resolve(command) else {
        let _ = writeln!(out, "error: command not implemented");
        return 0;
    };

    logging::debug(format!("dispatching '{command}'"));
    let parsed = binder::parse_or_exit(PROGRAM, &entry.spec, &args[1..]);
    logging::trace(format!("parsed arguments: {parsed:?}"));
    match (entry.run)(&parsed, connector) {
        Ok(reply) => {
            if !reply.is_empty() {
                for line in render::render(&reply, 0) {
                    let _ = writeln!(out, "{line}");
                }
            }
            0
        }
        Err(err) => {
            logging::error(format!("{err:#}"));
            1
        }
    }
}

/* --------------------------------- Tests ---------------------------------- */

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::bail;

    struct NoConnector;

    impl Connector for NoConnector {
        fn connect(&self) -> anyhow::Result<Box<dyn chirp::ChirpClient>> {
            bail!("no connection in this test")
        }
    }

    fn run_captured(args: &[&str]) -> (u8, String) {
        let registry = Registry::new();
        let args: Vec<String> = args.iter().map(|s| s.to_string()).collect();
        let mut out = Vec::new();
        let code = run(&registry, &NoConnector, &args, &mut out);
        (code, String::from_utf8(out).expect("utf-8 output"))
    }

    #[test]
    fn unknown_command_is_reported_without_failing() {
        let (code, out) = run_captured(&["foo"]);
        assert_eq!(out, "error: command not implemented\n");
        assert_eq!(code, 0);
    }

    #[test]
    fn private_names_are_treated_as_unknown() {
        let (code, out) = run_captured(&["_fetch"]);
        assert_eq!(out, "error: command not implemented\n");
        assert_eq!(code, 0);
    }

    #[test]
    fn top_level_help_prints_the_catalog() {
        let (code, out) = run_captured(&["-h"]);
        assert_eq!(code, 0);
        assert!(out.starts_with("usage: rchirp [-h] command [args]"));
        assert!(out.contains("  getdir [-l] remotepath\n"));
    }

    #[test]
    fn no_arguments_is_a_usage_error() {
        let (code, _) = run_captured(&[]);
        assert_eq!(code, 2);
    }

    #[test]
    fn failed_connection_exits_nonzero() {
        let (code, out) = run_captured(&["whoami"]);
        assert_eq!(code, 1);
        assert!(out.is_empty(), "errors must not reach stdout");
    }
}

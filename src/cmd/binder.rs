/*!
binder.rs - builds a clap parser from a `CommandSpec` and converts the
parsed tokens into the values the command functions take.

Interactive mode only: programmatic callers use the public functions in
`cmd::ops` directly and never go through here.

condor_chirp options are single-dash long options (`-mode`, `-stride`),
which clap does not parse natively, so `normalize_tokens` rewrites a
single leading dash on a known multi-character option name into the
GNU `--` form first. Single-character flags (`-r`, `-l`, `-s`) are
registered as clap shorts and pass through untouched.
*/

use anyhow::{Context, Result, bail};
use clap::{Arg, ArgAction, ArgMatches};
use std::collections::HashMap;

use super::spec::{CommandSpec, ParamKind};

/// One parsed argument value, keyed by parameter name in `Parsed`.
#[derive(Debug, Clone, PartialEq)]
pub enum ArgValue {
    /// Required positional token.
    Str(String),
    /// Optional scalar: the given token, or the declared default.
    Opt(Option<String>),
    /// Flag value after toggling against the declared default.
    Bool(bool),
    /// Tuple option slots; a slot is `None` when the option was
    /// omitted (or a slot token was empty, see below).
    Slots(Vec<Option<String>>),
}

/// Parsed command-line values for one invocation.
#[derive(Debug)]
pub struct Parsed {
    command: &'static str,
    values: HashMap<&'static str, ArgValue>,
}

impl Parsed {
    pub fn str(&self, name: &str) -> Result<&str> {
        match self.get(name)? {
            ArgValue::Str(s) => Ok(s),
            other => bail!(
                "{}: '{name}' is not a positional value: {other:?}",
                self.command
            ),
        }
    }

    pub fn opt(&self, name: &str) -> Result<Option<&str>> {
        match self.get(name)? {
            ArgValue::Opt(v) => Ok(v.as_deref()),
            other => bail!(
                "{}: '{name}' is not an optional value: {other:?}",
                self.command
            ),
        }
    }

    pub fn flag(&self, name: &str) -> Result<bool> {
        match self.get(name)? {
            ArgValue::Bool(b) => Ok(*b),
            other => bail!("{}: '{name}' is not a flag: {other:?}", self.command),
        }
    }

    pub fn slots(&self, name: &str) -> Result<&[Option<String>]> {
        match self.get(name)? {
            ArgValue::Slots(v) => Ok(v),
            other => bail!(
                "{}: '{name}' is not a tuple option: {other:?}",
                self.command
            ),
        }
    }

    /// Required positional parsed as an integer.
    pub fn int(&self, name: &str) -> Result<i64> {
        let raw = self.str(name)?;
        raw.parse()
            .with_context(|| format!("invalid integer for '{name}': '{raw}'"))
    }

    /// Optional scalar parsed as an integer when given.
    pub fn opt_int(&self, name: &str) -> Result<Option<i64>> {
        match self.opt(name)? {
            None => Ok(None),
            Some(raw) => raw
                .parse()
                .map(Some)
                .with_context(|| format!("invalid integer for '{name}': '{raw}'")),
        }
    }

    /// Two-slot tuple option parsed as integers, e.g. `-stride`.
    pub fn int_pair(&self, name: &str) -> Result<(Option<i64>, Option<i64>)> {
        let slots = self.slots(name)?;
        let parse = |slot: &Option<String>| -> Result<Option<i64>> {
            match slot {
                None => Ok(None),
                Some(raw) => raw
                    .parse()
                    .map(Some)
                    .with_context(|| format!("invalid integer for '{name}': '{raw}'")),
            }
        };
        match slots {
            [a, b] => Ok((parse(a)?, parse(b)?)),
            _ => bail!("'{name}' does not have exactly two slots"),
        }
    }

    fn get(&self, name: &str) -> Result<&ArgValue> {
        self.values
            .get(name)
            .with_context(|| format!("{}: unknown parameter '{name}'", self.command))
    }
}

/// Build the clap parser for one command. The program name is
/// `"<process-name> <command-name>"` and the description is the
/// command's summary, so `-h` output reads like a dedicated tool.
pub fn build_parser(program: &str, spec: &CommandSpec) -> clap::Command {
    let mut cmd = clap::Command::new(format!("{program} {}", spec.name))
        .about(spec.summary.clone())
        .no_binary_name(true);

    for param in &spec.params {
        let mut arg = Arg::new(param.name).value_name(param.name);
        if let Some(help) = &param.help {
            arg = arg.help(help.clone());
        }
        arg = match &param.kind {
            ParamKind::Positional => arg.required(true),
            ParamKind::Flag { .. } => {
                // Single-character names stay single-dash shorts.
                let arg = arg.action(ArgAction::SetTrue);
                if param.name.len() == 1 {
                    arg.short(param.name.chars().next().unwrap_or('?'))
                } else {
                    arg.long(param.name)
                }
            }
            ParamKind::Value { .. } => arg.long(param.name).action(ArgAction::Set),
            ParamKind::Tuple { labels } => arg
                .long(param.name)
                .action(ArgAction::Set)
                .num_args(param.arity())
                .value_names(labels.clone()),
        };
        cmd = cmd.arg(arg);
    }
    cmd
}

/// Rewrite condor_chirp style single-dash long options (`-mode`) into
/// the `--mode` form clap parses. Only known option names of this
/// command are rewritten, so positional values starting with a dash
/// are left alone.
pub fn normalize_tokens(spec: &CommandSpec, raw: &[String]) -> Vec<String> {
    raw.iter()
        .map(|token| {
            let Some(body) = token.strip_prefix('-') else {
                return token.clone();
            };
            if body.starts_with('-') {
                return token.clone(); // already GNU style
            }
            let name = body.split('=').next().unwrap_or(body);
            let known = spec
                .params
                .iter()
                .any(|p| !matches!(p.kind, ParamKind::Positional) && p.name == name);
            if name.len() > 1 && known {
                format!("-{token}")
            } else {
                token.clone()
            }
        })
        .collect()
}

/// Parse the remaining process tokens for a command. Errors (including
/// `-h` help requests) are returned so the caller can let clap print
/// and exit with its standard behavior.
pub fn try_parse(
    program: &str,
    spec: &CommandSpec,
    tokens: &[String],
) -> Result<Parsed, clap::Error> {
    let parser = build_parser(program, spec);
    let matches = parser.try_get_matches_from(normalize_tokens(spec, tokens))?;
    Ok(from_matches(spec, &matches))
}

/// Parse or exit: usage errors go to stderr with a non-zero status,
/// help goes to stdout with status zero, both via clap.
pub fn parse_or_exit(program: &str, spec: &CommandSpec, tokens: &[String]) -> Parsed {
    match try_parse(program, spec, tokens) {
        Ok(parsed) => parsed,
        Err(err) => err.exit(),
    }
}

/// Convert clap matches into `Parsed`, applying the defaults.
///
/// A given-but-empty value for a defaulted parameter falls back to the
/// declared default instead of being passed through. This mirrors the
/// python condor_chirp replacement this tool stays drop-in compatible
/// with; see DESIGN.md before extending the behavior.
fn from_matches(spec: &CommandSpec, matches: &ArgMatches) -> Parsed {
    let mut values = HashMap::new();
    for param in &spec.params {
        let value = match &param.kind {
            ParamKind::Positional => ArgValue::Str(
                matches
                    .get_one::<String>(param.name)
                    .cloned()
                    .unwrap_or_default(),
            ),
            ParamKind::Flag { default } => {
                // Presence toggles the opposite of the declared default.
                let given = matches.get_flag(param.name);
                ArgValue::Bool(if given { !default } else { *default })
            }
            ParamKind::Value { default } => {
                let given = matches
                    .get_one::<String>(param.name)
                    .filter(|s| !s.is_empty())
                    .cloned();
                ArgValue::Opt(given.or_else(|| default.clone()))
            }
            ParamKind::Tuple { labels } => {
                let slots = match matches.get_many::<String>(param.name) {
                    Some(given) => given
                        .map(|s| if s.is_empty() { None } else { Some(s.clone()) })
                        .collect(),
                    None => vec![None; labels.len()],
                };
                ArgValue::Slots(slots)
            }
        };
        values.insert(param.name, value);
    }
    Parsed {
        command: spec.name,
        values,
    }
}

/* --------------------------------- Tests ---------------------------------- */

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cmd::spec::{ParamDecl, describe};

    fn toks(args: &[&str]) -> Vec<String> {
        args.iter().map(|s| s.to_string()).collect()
    }

    fn put_spec() -> CommandSpec {
        describe(
            "put",
            "Copy a local file to the remote machine.",
            &[
                ParamDecl::required("remote_file"),
                ParamDecl::required("local_file"),
                ParamDecl::value("mode", None),
                ParamDecl::value("perm", None),
            ],
        )
    }

    fn read_spec() -> CommandSpec {
        describe(
            "read",
            "Read from a remote file.",
            &[
                ParamDecl::required("remote_file"),
                ParamDecl::required("length"),
                ParamDecl::value("offset", None),
                ParamDecl::tuple("stride", &[None, None]).with_labels(&["length", "skip"]),
            ],
        )
    }

    fn rmdir_spec() -> CommandSpec {
        describe(
            "rmdir",
            "Delete a remote directory.",
            &[
                ParamDecl::required("remotepath"),
                ParamDecl::flag("r", false),
            ],
        )
    }

    #[test]
    fn single_dash_long_options_are_normalized() {
        let spec = put_spec();
        let out = normalize_tokens(&spec, &toks(&["-mode", "c", "a", "b"]));
        assert_eq!(out, vec!["--mode", "c", "a", "b"]);
    }

    #[test]
    fn unknown_and_gnu_tokens_pass_through() {
        let spec = put_spec();
        let out = normalize_tokens(&spec, &toks(&["--mode", "-x", "-h", "-perm"]));
        // -x is not a known option, -h stays clap's help short.
        assert_eq!(out, vec!["--mode", "-x", "-h", "--perm"]);
    }

    #[test]
    fn positionals_and_options_parse() {
        let parsed = try_parse(
            "rchirp",
            &put_spec(),
            &toks(&["r.txt", "l.txt", "-mode", "c"]),
        )
        .expect("parse");
        assert_eq!(parsed.str("remote_file").unwrap(), "r.txt");
        assert_eq!(parsed.str("local_file").unwrap(), "l.txt");
        assert_eq!(parsed.opt("mode").unwrap(), Some("c"));
        assert_eq!(parsed.opt("perm").unwrap(), None);
    }

    #[test]
    fn missing_required_is_a_parse_error() {
        let err = try_parse("rchirp", &put_spec(), &toks(&["only_one"])).unwrap_err();
        assert_eq!(err.kind(), clap::error::ErrorKind::MissingRequiredArgument);
    }

    #[test]
    fn flag_toggles_default_exactly_once() {
        let spec = rmdir_spec();
        let absent = try_parse("rchirp", &spec, &toks(&["/tmp/x"])).expect("parse");
        assert!(!absent.flag("r").unwrap());
        let present = try_parse("rchirp", &spec, &toks(&["/tmp/x", "-r"])).expect("parse");
        assert!(present.flag("r").unwrap());
    }

    #[test]
    fn tuple_option_takes_exactly_two_tokens() {
        let spec = read_spec();
        let ok =
            try_parse("rchirp", &spec, &toks(&["f", "10", "-stride", "4", "2"])).expect("parse");
        assert_eq!(ok.int_pair("stride").unwrap(), (Some(4), Some(2)));

        let too_few = try_parse("rchirp", &spec, &toks(&["f", "10", "-stride", "4"]));
        assert!(too_few.is_err(), "one token for a two-slot option must fail");

        let too_many = try_parse(
            "rchirp",
            &spec,
            &toks(&["f", "10", "-stride", "4", "2", "1"]),
        );
        assert!(
            too_many.is_err(),
            "three tokens for a two-slot option must fail"
        );
    }

    #[test]
    fn omitted_tuple_option_yields_empty_slots() {
        let parsed = try_parse("rchirp", &read_spec(), &toks(&["f", "10"])).expect("parse");
        assert_eq!(parsed.int_pair("stride").unwrap(), (None, None));
    }

    #[test]
    fn empty_value_falls_back_to_default() {
        // Compatibility quirk: an explicitly empty token for a
        // defaulted parameter means "use the default".
        let parsed =
            try_parse("rchirp", &put_spec(), &toks(&["r", "l", "-mode", ""])).expect("parse");
        assert_eq!(parsed.opt("mode").unwrap(), None);

        let spec = describe("demo", "Demo.", &[ParamDecl::value("chunk", Some("8"))]);
        let parsed = try_parse("rchirp", &spec, &toks(&["-chunk", ""])).expect("parse");
        assert_eq!(parsed.opt("chunk").unwrap(), Some("8"));
    }

    #[test]
    fn int_accessors_validate() {
        let parsed = try_parse("rchirp", &read_spec(), &toks(&["f", "ten"])).expect("parse");
        let err = parsed.int("length").unwrap_err();
        assert!(err.to_string().contains("invalid integer"));

        let parsed =
            try_parse("rchirp", &read_spec(), &toks(&["f", "10", "-offset", "5"])).expect("parse");
        assert_eq!(parsed.int("length").unwrap(), 10);
        assert_eq!(parsed.opt_int("offset").unwrap(), Some(5));
    }

    #[test]
    fn help_request_surfaces_as_clap_error() {
        let err = try_parse("rchirp", &put_spec(), &toks(&["-h"])).unwrap_err();
        assert_eq!(err.kind(), clap::error::ErrorKind::DisplayHelp);
    }
}

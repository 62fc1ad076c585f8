/*!
spec.rs - command and parameter descriptors.

Each command is declared once: a name, a help text block (summary
paragraph plus optional `name (type): description` lines per
parameter), and an ordered parameter list with default values.
`describe` turns that declaration into a `CommandSpec`, the single
source of truth the parser builder and the help catalog consume.

The CLI shape of every parameter is derived from the shape of its
default value, so no separate per-argument configuration is needed:

  no default            -> required positional token
  boolean default       -> flag; presence toggles the opposite value
  tuple default (len n) -> named option taking exactly n tokens
  any other default     -> named option taking one token

A per-parameter customization (`labels`) can attach explicit slot
names for multi-value options and takes precedence over the derived
shape (e.g. `-stride length skip`).
*/

/// Declared default value of a parameter; its shape determines the
/// CLI binding (see module docs).
#[derive(Debug, Clone, PartialEq)]
pub enum ParamDefault {
    /// No default: a required positional token.
    None,
    /// Boolean default: a flag toggling the opposite value.
    Flag(bool),
    /// Scalar default: a named option taking one token.
    Value(Option<&'static str>),
    /// Fixed-size tuple of placeholders: a named option taking exactly
    /// as many tokens as there are slots.
    Tuple(&'static [Option<&'static str>]),
}

/// One parameter as written in the command declaration.
#[derive(Debug, Clone)]
pub struct ParamDecl {
    pub name: &'static str,
    pub default: ParamDefault,
    /// Customization: explicit per-slot value names for tuple options.
    /// Overrides the derived labels when present.
    pub labels: Option<&'static [&'static str]>,
}

impl ParamDecl {
    pub const fn required(name: &'static str) -> Self {
        Self {
            name,
            default: ParamDefault::None,
            labels: None,
        }
    }

    pub const fn flag(name: &'static str, default: bool) -> Self {
        Self {
            name,
            default: ParamDefault::Flag(default),
            labels: None,
        }
    }

    pub const fn value(name: &'static str, default: Option<&'static str>) -> Self {
        Self {
            name,
            default: ParamDefault::Value(default),
            labels: None,
        }
    }

    pub const fn tuple(name: &'static str, slots: &'static [Option<&'static str>]) -> Self {
        Self {
            name,
            default: ParamDefault::Tuple(slots),
            labels: None,
        }
    }

    pub fn with_labels(mut self, labels: &'static [&'static str]) -> Self {
        self.labels = Some(labels);
        self
    }
}

/// Derived CLI binding of a parameter.
#[derive(Debug, Clone, PartialEq)]
pub enum ParamKind {
    Positional,
    Flag { default: bool },
    Value { default: Option<String> },
    Tuple { labels: Vec<String> },
}

/// Normalized parameter descriptor, derived from a `ParamDecl` and the
/// command's help text.
#[derive(Debug, Clone)]
pub struct ParamSpec {
    pub name: &'static str,
    pub required: bool,
    pub kind: ParamKind,
    /// One-line description mined from the help text, if present.
    pub help: Option<String>,
}

impl ParamSpec {
    /// Number of CLI tokens this parameter consumes when given.
    pub fn arity(&self) -> usize {
        match &self.kind {
            ParamKind::Flag { .. } => 0,
            ParamKind::Tuple { labels } => labels.len(),
            _ => 1,
        }
    }

    /// Token for this parameter in a one-line usage summary.
    pub fn usage_token(&self) -> String {
        match &self.kind {
            ParamKind::Positional => self.name.to_string(),
            ParamKind::Flag { .. } => format!("[-{}]", self.name),
            ParamKind::Value { .. } => format!("[-{} {}]", self.name, self.name),
            ParamKind::Tuple { labels } => format!("[-{} {}]", self.name, labels.join(" ")),
        }
    }
}

/// Normalized command descriptor: everything the parser builder and
/// help catalog need, built once at registration.
#[derive(Debug, Clone)]
pub struct CommandSpec {
    pub name: &'static str,
    /// First paragraph of the help text.
    pub summary: String,
    /// Parameters in declaration order. Required parameters precede
    /// optional ones, mirroring conventional ordering rules.
    pub params: Vec<ParamSpec>,
}

impl CommandSpec {
    /// One-line usage summary for the command catalog, optionals
    /// first: `put [-mode mode] [-perm perm] remote_file local_file`.
    pub fn usage_line(&self) -> String {
        let mut parts = vec![self.name.to_string()];
        parts.extend(
            self.params
                .iter()
                .filter(|p| !p.required)
                .map(ParamSpec::usage_token),
        );
        parts.extend(
            self.params
                .iter()
                .filter(|p| p.required)
                .map(ParamSpec::usage_token),
        );
        parts.join(" ")
    }
}

/// Build a `CommandSpec` from a command declaration.
///
/// The summary is the first paragraph of `doc` (up to the first blank
/// line). Per-parameter help is mined from `doc` by looking for a line
/// of the form `<name> (<type>): <description>` (name matched
/// case-insensitively); a trailing `defaults to ...` clause and a
/// trailing period are stripped. Missing help lines are not an error.
pub fn describe(name: &'static str, doc: &str, decls: &[ParamDecl]) -> CommandSpec {
    debug_assert!(
        required_precede_optional(decls),
        "{name}: required parameters must precede optional ones"
    );

    let params = decls
        .iter()
        .map(|decl| {
            let kind = match &decl.default {
                ParamDefault::None => ParamKind::Positional,
                ParamDefault::Flag(b) => ParamKind::Flag { default: *b },
                ParamDefault::Value(v) => ParamKind::Value {
                    default: v.map(str::to_string),
                },
                ParamDefault::Tuple(slots) => ParamKind::Tuple {
                    labels: match decl.labels {
                        Some(labels) => labels.iter().map(|l| l.to_string()).collect(),
                        None => vec![decl.name.to_string(); slots.len()],
                    },
                },
            };
            ParamSpec {
                name: decl.name,
                required: decl.default == ParamDefault::None,
                kind,
                help: mine_help(doc, decl.name),
            }
        })
        .collect();

    CommandSpec {
        name,
        summary: first_paragraph(doc),
        params,
    }
}

fn required_precede_optional(decls: &[ParamDecl]) -> bool {
    let first_optional = decls
        .iter()
        .position(|d| d.default != ParamDefault::None)
        .unwrap_or(decls.len());
    decls[first_optional..]
        .iter()
        .all(|d| d.default != ParamDefault::None)
}

/// Text up to the first blank line, joined into a single line.
fn first_paragraph(doc: &str) -> String {
    doc.trim_start()
        .lines()
        .map(str::trim)
        .take_while(|line| !line.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}

/// Find a `<name> (<type>): <description>` line for a parameter.
fn mine_help(doc: &str, name: &str) -> Option<String> {
    for line in doc.lines() {
        let line = line.trim();
        let Some(rest) = strip_prefix_ci(line, name) else {
            continue;
        };
        // Expect `(<type>):` right after the name.
        let rest = rest.trim_start();
        let Some(rest) = rest.strip_prefix('(') else {
            continue;
        };
        let Some((_, rest)) = rest.split_once(')') else {
            continue;
        };
        let Some(desc) = rest.trim_start().strip_prefix(':') else {
            continue;
        };
        return Some(clean_help(desc.trim()));
    }
    None
}

/// Case-insensitive prefix strip that only matches a whole word.
fn strip_prefix_ci<'a>(line: &'a str, prefix: &str) -> Option<&'a str> {
    if line.len() < prefix.len() {
        return None;
    }
    let (head, tail) = line.split_at(prefix.len());
    if !head.eq_ignore_ascii_case(prefix) {
        return None;
    }
    // Must be followed by a space or '(' so e.g. `mode` does not match
    // a `modestring` help line.
    match tail.chars().next() {
        Some(' ') | Some('(') => Some(tail),
        _ => None,
    }
}

/// Strip a trailing `defaults to ...` clause and a trailing period.
/// Only the clause running to the end of the line is removed, so a
/// description mentioning "defaults to" earlier stays intact.
fn clean_help(desc: &str) -> String {
    let lowered = desc.to_ascii_lowercase();
    let mut out = match lowered.rfind("defaults to") {
        Some(pos) => &desc[..pos],
        None => desc,
    };
    out = out.trim_end();
    out = out.trim_end_matches(['.', ',']);
    out.trim_end().to_string()
}

/* --------------------------------- Tests ---------------------------------- */

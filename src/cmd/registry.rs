/*!
registry.rs - the closed command registry.

Command lookup is an explicit mapping populated once at startup from
`cmd::ops::commands()`; the command token is never evaluated, only
compared. Names starting with `_` are private by convention and never
resolve, registered or not.
*/

use anyhow::Result;

use super::binder::Parsed;
use super::render::Reply;
use super::spec::CommandSpec;
use crate::chirp::Connector;

/// Leading marker of private names.
const PRIVATE_MARKER: char = '_';

/// Interactive-mode entry point of a command.
pub type Handler = fn(&Parsed, &dyn Connector) -> Result<Reply>;

/// A registered command: its descriptor plus the handler bridging
/// parsed CLI values to the programmatic function.
pub struct CommandEntry {
    pub spec: CommandSpec,
    pub run: Handler,
}

impl CommandEntry {
    pub fn new(spec: CommandSpec, run: Handler) -> Self {
        Self { spec, run }
    }
}

/// The set of all chirp commands, in catalog order.
pub struct Registry {
    entries: Vec<CommandEntry>,
}

impl Registry {
    pub fn new() -> Self {
        Self {
            entries: super::ops::commands(),
        }
    }

    /// True when `name` is registered and not private.
    pub fn is_command(&self, name: &str) -> bool {
        self.resolve(name).is_some()
    }

    /// Look up a command. Private and unregistered names both come
    /// back as `None`; no code is ever derived from the input string.
    pub fn resolve(&self, name: &str) -> Option<&CommandEntry> {
        if name.starts_with(PRIVATE_MARKER) {
            return None;
        }
        self.entries.iter().find(|e| e.spec.name == name)
    }

    pub fn entries(&self) -> &[CommandEntry] {
        &self.entries
    }

    /// Top-level help: usage, description, and the command catalog
    /// with one usage line per command.
    pub fn catalog(&self, program: &str) -> String {
        let mut out = String::new();
        out.push_str(&format!("usage: {program} [-h] command [args]\n\n"));
        out.push_str("Drop-in replacement of condor_chirp\n\n");
        out.push_str("commands:\n");
        for entry in self.entries() {
            out.push_str("  ");
            out.push_str(&entry.spec.usage_line());
            out.push('\n');
        }
        out
    }
}

impl Default for Registry {
    fn default() -> Self {
        Self::new()
    }
}

/* --------------------------------- Tests ---------------------------------- */

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cmd::spec::ParamKind;

    #[test]
    fn known_commands_resolve() {
        let reg = Registry::new();
        for name in ["fetch", "put", "rmdir", "whoami", "utime"] {
            assert!(reg.is_command(name), "{name} must be registered");
            assert!(reg.resolve(name).is_some());
        }
    }

    #[test]
    fn unknown_and_private_names_do_not_resolve() {
        let reg = Registry::new();
        assert!(!reg.is_command("foo"));
        assert!(reg.resolve("foo").is_none());
        // Private marker blocks resolution outright.
        assert!(!reg.is_command("_fetch"));
        assert!(reg.resolve("_fetch").is_none());
    }

    #[test]
    fn names_are_unique() {
        let reg = Registry::new();
        let mut names: Vec<_> = reg.entries().iter().map(|e| e.spec.name).collect();
        names.sort_unstable();
        let before = names.len();
        names.dedup();
        assert_eq!(before, names.len(), "duplicate command names registered");
    }

    #[test]
    fn required_parameters_precede_optional_everywhere() {
        let reg = Registry::new();
        for entry in reg.entries() {
            let first_optional = entry
                .spec
                .params
                .iter()
                .position(|p| !p.required)
                .unwrap_or(entry.spec.params.len());
            assert!(
                entry.spec.params[first_optional..].iter().all(|p| !p.required),
                "{}: required parameter after an optional one",
                entry.spec.name
            );
        }
    }

    #[test]
    fn argument_shapes_match_the_compat_contract() {
        let reg = Registry::new();
        let shape = |name: &str| -> (Vec<&str>, Vec<&str>) {
            let entry = reg.resolve(name).expect(name);
            let pos = entry
                .spec
                .params
                .iter()
                .filter(|p| p.required)
                .map(|p| p.name)
                .collect();
            let opt = entry
                .spec
                .params
                .iter()
                .filter(|p| !p.required)
                .map(|p| p.name)
                .collect();
            (pos, opt)
        };

        assert_eq!(shape("fetch"), (vec!["remote_file", "local_file"], vec![]));
        assert_eq!(
            shape("put"),
            (vec!["remote_file", "local_file"], vec!["mode", "perm"])
        );
        assert_eq!(shape("remove"), (vec!["remote_file"], vec![]));
        assert_eq!(shape("get_job_attr"), (vec!["job_attribute"], vec![]));
        assert_eq!(shape("get_job_attr_delayed"), (vec!["job_attribute"], vec![]));
        assert_eq!(
            shape("set_job_attr"),
            (vec!["job_attribute", "attribute_value"], vec![])
        );
        assert_eq!(
            shape("set_job_attr_delayed"),
            (vec!["job_attribute", "attribute_value"], vec![])
        );
        assert_eq!(shape("ulog"), (vec!["text"], vec![]));
        assert_eq!(
            shape("read"),
            (vec!["remote_file", "length"], vec!["offset", "stride"])
        );
        assert_eq!(
            shape("write"),
            (
                vec!["remote_file", "local_file", "length"],
                vec!["offset", "stride"]
            )
        );
        assert_eq!(shape("rmdir"), (vec!["remotepath"], vec!["r"]));
        assert_eq!(shape("getdir"), (vec!["remotepath"], vec!["l"]));
        assert_eq!(shape("whoami"), (vec![], vec![]));
        assert_eq!(shape("whoareyou"), (vec!["remotepath"], vec![]));
    }

    #[test]
    fn stride_is_a_two_slot_tuple_with_labels() {
        let reg = Registry::new();
        for name in ["read", "write"] {
            let entry = reg.resolve(name).expect(name);
            let stride = entry
                .spec
                .params
                .iter()
                .find(|p| p.name == "stride")
                .expect("stride parameter");
            assert_eq!(
                stride.kind,
                ParamKind::Tuple {
                    labels: vec!["length".into(), "skip".into()]
                }
            );
        }
    }

    #[test]
    fn catalog_lists_every_command_once() {
        let reg = Registry::new();
        let catalog = reg.catalog("rchirp");
        assert!(catalog.starts_with("usage: rchirp [-h] command [args]"));
        for entry in reg.entries() {
            assert!(
                catalog.contains(&format!("  {}\n", entry.spec.usage_line())),
                "catalog misses {}",
                entry.spec.name
            );
        }
        assert!(catalog.contains("  put [-mode mode] [-perm perm] remote_file local_file\n"));
        assert!(catalog.contains("  rmdir [-r] remotepath\n"));
    }

    #[test]
    fn every_summary_is_nonempty() {
        let reg = Registry::new();
        for entry in reg.entries() {
            assert!(
                !entry.spec.summary.is_empty(),
                "{} has no summary",
                entry.spec.name
            );
        }
    }
}

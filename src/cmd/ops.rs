/*!
ops.rs - the chirp commands.

Every command exists in two forms:

  - a public function taking a `Connector` plus explicit typed
    arguments (programmatic mode, usable as a library), and
  - a registry entry pairing its `CommandSpec` with a thin handler
    that pulls the same arguments out of parsed CLI tokens
    (interactive mode).

The help text block passed to `describe` is the single source of the
command summary and per-parameter help lines; see `cmd::spec`.
*/

use anyhow::{Context, Result};

use crate::chirp::{Connector, with_client};
use crate::cmd::binder::Parsed;
use crate::cmd::registry::CommandEntry;
use crate::cmd::render::{Reply, reply_from_metadata};
use crate::cmd::spec::{ParamDecl, describe};

/* ------------------------------ File transfer ------------------------------ */

/// Copy a file from the remote machine to the local machine.
pub fn fetch(connector: &dyn Connector, remote_file: &str, local_file: &str) -> Result<Reply> {
    with_client(connector, |c| {
        c.fetch(remote_file, local_file).map(Reply::Int)
    })
}

/// Copy a file from the local machine to the remote machine.
///
/// `perm` is an octal permission string; it is validated locally
/// before any connection is opened.
pub fn put(
    connector: &dyn Connector,
    remote_file: &str,
    local_file: &str,
    mode: Option<&str>,
    perm: Option<&str>,
) -> Result<Reply> {
    let mode = mode.map(augment_mode);
    let perm = perm.map(parse_octal).transpose()?;
    with_client(connector, |c| {
        c.put(remote_file, local_file, mode.as_deref(), perm)
            .map(Reply::Int)
    })
}

/// Remove a file from the remote machine.
pub fn remove(connector: &dyn Connector, remote_file: &str) -> Result<Reply> {
    with_client(connector, |c| c.remove(remote_file).map(|()| Reply::None))
}

/// condor_chirp semantics: requesting append/create/truncate also
/// requests write, so any of 'a', 'c', 't' in the mode string appends
/// a single 'w'. Kept verbatim for compatibility.
fn augment_mode(mode: &str) -> String {
    let mut out = mode.to_string();
    if mode.chars().any(|ch| matches!(ch, 'a' | 'c' | 't')) {
        out.push('w');
    }
    out
}

fn parse_octal(raw: &str) -> Result<u32> {
    u32::from_str_radix(raw, 8).with_context(|| format!("invalid octal mode '{raw}'"))
}

/* ------------------------------ Job attributes ----------------------------- */

/// Read a job ClassAd attribute.
pub fn get_job_attr(connector: &dyn Connector, job_attribute: &str) -> Result<Reply> {
    with_client(connector, |c| c.get_job_attr(job_attribute).map(Reply::Str))
}

/// Read a job ClassAd attribute from the last checkpointed state.
pub fn get_job_attr_delayed(connector: &dyn Connector, job_attribute: &str) -> Result<Reply> {
    with_client(connector, |c| {
        c.get_job_attr_delayed(job_attribute).map(Reply::Str)
    })
}

/// Set a job ClassAd attribute.
pub fn set_job_attr(
    connector: &dyn Connector,
    job_attribute: &str,
    attribute_value: &str,
) -> Result<Reply> {
    with_client(connector, |c| {
        c.set_job_attr(job_attribute, attribute_value)
            .map(|()| Reply::None)
    })
}

/// Set a job ClassAd attribute without blocking on the schedd.
pub fn set_job_attr_delayed(
    connector: &dyn Connector,
    job_attribute: &str,
    attribute_value: &str,
) -> Result<Reply> {
    with_client(connector, |c| {
        c.set_job_attr_delayed(job_attribute, attribute_value)
            .map(|()| Reply::None)
    })
}

/// Append text to the job's user log.
pub fn ulog(connector: &dyn Connector, text: &str) -> Result<Reply> {
    with_client(connector, |c| c.ulog(text).map(|()| Reply::None))
}

/// Report the job's run phase to the starter.
pub fn phase(connector: &dyn Connector, phasestring: &str) -> Result<Reply> {
    with_client(connector, |c| c.phase(phasestring).map(|()| Reply::None))
}

/* ------------------------------- Remote I/O -------------------------------- */

/// Read bytes from a remote file, optionally offset and strided.
pub fn read(
    connector: &dyn Connector,
    remote_file: &str,
    length: i64,
    offset: Option<i64>,
    stride: (Option<i64>, Option<i64>),
) -> Result<Reply> {
    with_client(connector, |c| {
        c.read(remote_file, length, offset, stride).map(Reply::Str)
    })
}

/// Write bytes from a local file into a remote file, optionally
/// offset and strided.
pub fn write(
    connector: &dyn Connector,
    remote_file: &str,
    local_file: &str,
    length: i64,
    offset: Option<i64>,
    stride: (Option<i64>, Option<i64>),
) -> Result<Reply> {
    with_client(connector, |c| {
        c.write(remote_file, local_file, length, offset, stride)
            .map(Reply::Int)
    })
}

/* ------------------------------- Filesystem -------------------------------- */

/// Delete a remote directory, optionally recursively.
pub fn rmdir(connector: &dyn Connector, remotepath: &str, r: bool) -> Result<Reply> {
    with_client(connector, |c| c.rmdir(remotepath, r).map(|()| Reply::None))
}

/// List a remote directory; with `l`, include per-file metadata and
/// convert its time fields for display.
pub fn getdir(connector: &dyn Connector, remotepath: &str, l: bool) -> Result<Reply> {
    with_client(connector, |c| {
        let listing = c.getdir(remotepath, l)?;
        Ok(reply_from_metadata(&listing))
    })
}

/// Identity the remote side assigns to this client.
pub fn whoami(connector: &dyn Connector) -> Result<Reply> {
    with_client(connector, |c| c.whoami().map(Reply::Str))
}

/// Identity the remote side would assign for a given path.
pub fn whoareyou(connector: &dyn Connector, remotepath: &str) -> Result<Reply> {
    with_client(connector, |c| c.whoareyou(remotepath).map(Reply::Str))
}

/// Create a hard or symbolic link on the remote machine.
pub fn link(connector: &dyn Connector, oldpath: &str, newpath: &str, s: bool) -> Result<Reply> {
    with_client(connector, |c| {
        c.link(oldpath, newpath, s).map(|()| Reply::None)
    })
}

/// Read the target of a remote symbolic link.
pub fn readlink(connector: &dyn Connector, remotepath: &str, length: i64) -> Result<Reply> {
    with_client(connector, |c| c.readlink(remotepath, length).map(Reply::Str))
}

/// Stat a remote path (following links).
pub fn stat(connector: &dyn Connector, remotepath: &str) -> Result<Reply> {
    with_client(connector, |c| {
        let meta = c.stat(remotepath)?;
        Ok(reply_from_metadata(&meta))
    })
}

/// Stat a remote path (not following links).
pub fn lstat(connector: &dyn Connector, remotepath: &str) -> Result<Reply> {
    with_client(connector, |c| {
        let meta = c.lstat(remotepath)?;
        Ok(reply_from_metadata(&meta))
    })
}

/// Filesystem statistics for the volume holding a remote path.
pub fn statfs(connector: &dyn Connector, remotepath: &str) -> Result<Reply> {
    with_client(connector, |c| {
        let meta = c.statfs(remotepath)?;
        Ok(reply_from_metadata(&meta))
    })
}

/// Check access rights on a remote path ('rwxf' flags).
pub fn access(connector: &dyn Connector, remotepath: &str, mode: &str) -> Result<Reply> {
    with_client(connector, |c| {
        c.access(remotepath, mode).map(|()| Reply::None)
    })
}

/// Change permission bits of a remote path.
pub fn chmod(connector: &dyn Connector, remotepath: &str, mode: &str) -> Result<Reply> {
    let mode = parse_octal(mode)?;
    with_client(connector, |c| c.chmod(remotepath, mode).map(|()| Reply::None))
}

/// Change the owner of a remote path (following links).
pub fn chown(connector: &dyn Connector, remotepath: &str, uid: i64, gid: i64) -> Result<Reply> {
    with_client(connector, |c| {
        c.chown(remotepath, uid, gid).map(|()| Reply::None)
    })
}

/// Change the owner of a remote path (not following links).
pub fn lchown(connector: &dyn Connector, remotepath: &str, uid: i64, gid: i64) -> Result<Reply> {
    with_client(connector, |c| {
        c.lchown(remotepath, uid, gid).map(|()| Reply::None)
    })
}

/// Truncate a remote file to a given length.
pub fn truncate(connector: &dyn Connector, remotepath: &str, length: i64) -> Result<Reply> {
    with_client(connector, |c| {
        c.truncate(remotepath, length).map(|()| Reply::None)
    })
}

/// Set access and modification times of a remote path.
pub fn utime(
    connector: &dyn Connector,
    remotepath: &str,
    actime: i64,
    mtime: i64,
) -> Result<Reply> {
    with_client(connector, |c| {
        c.utime(remotepath, actime, mtime).map(|()| Reply::None)
    })
}

/* ----------------------------- Registration ----------------------------- */

/// All chirp commands in catalog order. Built once at startup; this
/// list is the closed mapping the registry serves lookups from.
pub fn commands() -> Vec<CommandEntry> {
    vec![
        CommandEntry::new(
            describe(
                "fetch",
                "Copy a file from the remote machine to the local machine.

remote_file (str): Path to the file on the remote machine.
local_file (str): Path to the destination on the local machine.
",
                &[
                    ParamDecl::required("remote_file"),
                    ParamDecl::required("local_file"),
                ],
            ),
            |p: &Parsed, c: &dyn Connector| fetch(c, p.str("remote_file")?, p.str("local_file")?),
        ),
        CommandEntry::new(
            describe(
                "put",
                "Copy a file from the local machine to the remote machine.

remote_file (str): Path to the destination file on the remote machine.
local_file (str): Path to the file on the local machine.
mode (str): File open modes, one or more of 'rwatcx'. Defaults to 'wct'.
perm (str): Octal permission bits for a newly created file. Defaults to None.
",
                &[
                    ParamDecl::required("remote_file"),
                    ParamDecl::required("local_file"),
                    ParamDecl::value("mode", None),
                    ParamDecl::value("perm", None),
                ],
            ),
            |p: &Parsed, c: &dyn Connector| {
                put(
                    c,
                    p.str("remote_file")?,
                    p.str("local_file")?,
                    p.opt("mode")?,
                    p.opt("perm")?,
                )
            },
        ),
        CommandEntry::new(
            describe(
                "remove",
                "Remove a file from the remote machine.

remote_file (str): Path to the file on the remote machine.
",
                &[ParamDecl::required("remote_file")],
            ),
            |p: &Parsed, c: &dyn Connector| remove(c, p.str("remote_file")?),
        ),
        CommandEntry::new(
            describe(
                "get_job_attr",
                "Print the named job ClassAd attribute.

job_attribute (str): Name of the job attribute.
",
                &[ParamDecl::required("job_attribute")],
            ),
            |p: &Parsed, c: &dyn Connector| get_job_attr(c, p.str("job_attribute")?),
        ),
        CommandEntry::new(
            describe(
                "get_job_attr_delayed",
                "Print the named job ClassAd attribute from the last checkpointed state.

job_attribute (str): Name of the job attribute.
",
                &[ParamDecl::required("job_attribute")],
            ),
            |p: &Parsed, c: &dyn Connector| get_job_attr_delayed(c, p.str("job_attribute")?),
        ),
        CommandEntry::new(
            describe(
                "set_job_attr",
                "Set the named job ClassAd attribute.

job_attribute (str): Name of the job attribute.
attribute_value (str): New value of the job attribute.
",
                &[
                    ParamDecl::required("job_attribute"),
                    ParamDecl::required("attribute_value"),
                ],
            ),
            |p: &Parsed, c: &dyn Connector| {
                set_job_attr(c, p.str("job_attribute")?, p.str("attribute_value")?)
            },
        ),
        CommandEntry::new(
            describe(
                "set_job_attr_delayed",
                "Set the named job ClassAd attribute without blocking on the schedd.

job_attribute (str): Name of the job attribute.
attribute_value (str): New value of the job attribute.
",
                &[
                    ParamDecl::required("job_attribute"),
                    ParamDecl::required("attribute_value"),
                ],
            ),
            |p: &Parsed, c: &dyn Connector| {
                set_job_attr_delayed(c, p.str("job_attribute")?, p.str("attribute_value")?)
            },
        ),
        CommandEntry::new(
            describe(
                "ulog",
                "Append text to the job's user log.

text (str): Message to append.
",
                &[ParamDecl::required("text")],
            ),
            |p: &Parsed, c: &dyn Connector| ulog(c, p.str("text")?),
        ),
        CommandEntry::new(
            describe(
                "phase",
                "Report the job's run phase to the starter.

phasestring (str): Name of the phase the job is entering.
",
                &[ParamDecl::required("phasestring")],
            ),
            |p: &Parsed, c: &dyn Connector| phase(c, p.str("phasestring")?),
        ),
        CommandEntry::new(
            describe(
                "read",
                "Read and print up to length bytes from a file on the remote machine.

remote_file (str): Path to the file on the remote machine.
length (int): Number of bytes to read.
offset (int): Byte offset from the start of the file. Defaults to None.
stride (tuple): Read length bytes, then skip skip bytes, repeating. Defaults to (None, None).
",
                &[
                    ParamDecl::required("remote_file"),
                    ParamDecl::required("length"),
                    ParamDecl::value("offset", None),
                    ParamDecl::tuple("stride", &[None, None]).with_labels(&["length", "skip"]),
                ],
            ),
            |p: &Parsed, c: &dyn Connector| {
                read(
                    c,
                    p.str("remote_file")?,
                    p.int("length")?,
                    p.opt_int("offset")?,
                    p.int_pair("stride")?,
                )
            },
        ),
        CommandEntry::new(
            describe(
                "write",
                "Write up to length bytes from a local file into a file on the remote machine.

remote_file (str): Path to the destination file on the remote machine.
local_file (str): Path to the source file on the local machine.
length (int): Number of bytes to write.
offset (int): Byte offset from the start of the remote file. Defaults to None.
stride (tuple): Write length bytes, then skip skip bytes, repeating. Defaults to (None, None).
",
                &[
                    ParamDecl::required("remote_file"),
                    ParamDecl::required("local_file"),
                    ParamDecl::required("length"),
                    ParamDecl::value("offset", None),
                    ParamDecl::tuple("stride", &[None, None]).with_labels(&["length", "skip"]),
                ],
            ),
            |p: &Parsed, c: &dyn Connector| {
                write(
                    c,
                    p.str("remote_file")?,
                    p.str("local_file")?,
                    p.int("length")?,
                    p.opt_int("offset")?,
                    p.int_pair("stride")?,
                )
            },
        ),
        CommandEntry::new(
            describe(
                "rmdir",
                "Delete a directory on the remote machine.

remotepath (str): Path to the directory on the remote machine.
r (bool): Delete recursively. Defaults to False.
",
                &[
                    ParamDecl::required("remotepath"),
                    ParamDecl::flag("r", false),
                ],
            ),
            |p: &Parsed, c: &dyn Connector| rmdir(c, p.str("remotepath")?, p.flag("r")?),
        ),
        CommandEntry::new(
            describe(
                "getdir",
                "List a directory on the remote machine.

remotepath (str): Path to the directory on the remote machine.
l (bool): Include per-file metadata. Defaults to False.
",
                &[
                    ParamDecl::required("remotepath"),
                    ParamDecl::flag("l", false),
                ],
            ),
            |p: &Parsed, c: &dyn Connector| getdir(c, p.str("remotepath")?, p.flag("l")?),
        ),
        CommandEntry::new(
            describe(
                "whoami",
                "Print the identity the remote machine assigns to this client.
",
                &[],
            ),
            |_p: &Parsed, c: &dyn Connector| whoami(c),
        ),
        CommandEntry::new(
            describe(
                "whoareyou",
                "Print the identity of the remote machine serving a path.

remotepath (str): Path on the remote machine.
",
                &[ParamDecl::required("remotepath")],
            ),
            |p: &Parsed, c: &dyn Connector| whoareyou(c, p.str("remotepath")?),
        ),
        CommandEntry::new(
            describe(
                "link",
                "Create a link on the remote machine.

oldpath (str): Existing path on the remote machine.
newpath (str): Path of the new link.
s (bool): Create a symbolic link instead of a hard link. Defaults to False.
",
                &[
                    ParamDecl::required("oldpath"),
                    ParamDecl::required("newpath"),
                    ParamDecl::flag("s", false),
                ],
            ),
            |p: &Parsed, c: &dyn Connector| {
                link(c, p.str("oldpath")?, p.str("newpath")?, p.flag("s")?)
            },
        ),
        CommandEntry::new(
            describe(
                "readlink",
                "Print the target of a symbolic link on the remote machine.

remotepath (str): Path to the link on the remote machine.
length (int): Maximum number of bytes to read.
",
                &[
                    ParamDecl::required("remotepath"),
                    ParamDecl::required("length"),
                ],
            ),
            |p: &Parsed, c: &dyn Connector| readlink(c, p.str("remotepath")?, p.int("length")?),
        ),
        CommandEntry::new(
            describe(
                "stat",
                "Print metadata for a path on the remote machine, following links.

remotepath (str): Path on the remote machine.
",
                &[ParamDecl::required("remotepath")],
            ),
            |p: &Parsed, c: &dyn Connector| stat(c, p.str("remotepath")?),
        ),
        CommandEntry::new(
            describe(
                "lstat",
                "Print metadata for a path on the remote machine, without following links.

remotepath (str): Path on the remote machine.
",
                &[ParamDecl::required("remotepath")],
            ),
            |p: &Parsed, c: &dyn Connector| lstat(c, p.str("remotepath")?),
        ),
        CommandEntry::new(
            describe(
                "statfs",
                "Print filesystem statistics for the volume holding a remote path.

remotepath (str): Path on the remote machine.
",
                &[ParamDecl::required("remotepath")],
            ),
            |p: &Parsed, c: &dyn Connector| statfs(c, p.str("remotepath")?),
        ),
        CommandEntry::new(
            describe(
                "access",
                "Check whether a path on the remote machine can be accessed.

remotepath (str): Path on the remote machine.
mode (str): Access flags to check, one or more of 'rwxf'.
",
                &[
                    ParamDecl::required("remotepath"),
                    ParamDecl::required("mode"),
                ],
            ),
            |p: &Parsed, c: &dyn Connector| access(c, p.str("remotepath")?, p.str("mode")?),
        ),
        CommandEntry::new(
            describe(
                "chmod",
                "Change permission bits of a path on the remote machine.

remotepath (str): Path on the remote machine.
mode (str): Octal permission bits.
",
                &[
                    ParamDecl::required("remotepath"),
                    ParamDecl::required("mode"),
                ],
            ),
            |p: &Parsed, c: &dyn Connector| chmod(c, p.str("remotepath")?, p.str("mode")?),
        ),
        CommandEntry::new(
            describe(
                "chown",
                "Change the owner of a path on the remote machine, following links.

remotepath (str): Path on the remote machine.
uid (int): New user id.
gid (int): New group id.
",
                &[
                    ParamDecl::required("remotepath"),
                    ParamDecl::required("uid"),
                    ParamDecl::required("gid"),
                ],
            ),
            |p: &Parsed, c: &dyn Connector| {
                chown(c, p.str("remotepath")?, p.int("uid")?, p.int("gid")?)
            },
        ),
        CommandEntry::new(
            describe(
                "lchown",
                "Change the owner of a path on the remote machine, without following links.

remotepath (str): Path on the remote machine.
uid (int): New user id.
gid (int): New group id.
",
                &[
                    ParamDecl::required("remotepath"),
                    ParamDecl::required("uid"),
                    ParamDecl::required("gid"),
                ],
            ),
            |p: &Parsed, c: &dyn Connector| {
                lchown(c, p.str("remotepath")?, p.int("uid")?, p.int("gid")?)
            },
        ),
        CommandEntry::new(
            describe(
                "truncate",
                "Truncate a file on the remote machine to a given length.

remotepath (str): Path to the file on the remote machine.
length (int): New length of the file in bytes.
",
                &[
                    ParamDecl::required("remotepath"),
                    ParamDecl::required("length"),
                ],
            ),
            |p: &Parsed, c: &dyn Connector| truncate(c, p.str("remotepath")?, p.int("length")?),
        ),
        CommandEntry::new(
            describe(
                "utime",
                "Set access and modification times of a path on the remote machine.

remotepath (str): Path on the remote machine.
actime (int): New access time, seconds since the epoch.
mtime (int): New modification time, seconds since the epoch.
",
                &[
                    ParamDecl::required("remotepath"),
                    ParamDecl::required("actime"),
                    ParamDecl::required("mtime"),
                ],
            ),
            |p: &Parsed, c: &dyn Connector| {
                utime(
                    c,
                    p.str("remotepath")?,
                    p.int("actime")?,
                    p.int("mtime")?,
                )
            },
        ),
    ]
}

/* --------------------------------- Tests ---------------------------------- */

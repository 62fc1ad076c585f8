/*!
Chirp client boundary.

This front end delegates every remote operation to a chirp protocol
client; the wire protocol itself lives outside this crate. What this
module defines:

  ChirpClient  - one method per remote operation, plus close
  Connector    - scoped acquisition of a client
  with_client  - open, run one operation, close on every exit path
  ChirpConfig  - discovery/parsing of the job's .chirp.config file

Each process invocation performs exactly one operation over one
connection; no retries, no pooling.
*/

use anyhow::{Context, Result, bail};
use std::path::PathBuf;

use crate::utils::logging;

/// Operations offered by the remote side. Mirrors the chirp command
/// set 1:1; errors are operation-specific and propagate unmodified.
///
/// Stride arguments are `(length, skip)` pairs: transfer `length`
/// bytes, skip `skip` bytes, repeat.
pub trait ChirpClient {
    fn fetch(&mut self, remote_file: &str, local_file: &str) -> Result<i64>;
    fn put(
        &mut self,
        remote_file: &str,
        local_file: &str,
        mode: Option<&str>,
        perm: Option<u32>,
    ) -> Result<i64>;
    fn remove(&mut self, remote_file: &str) -> Result<()>;
    fn get_job_attr(&mut self, job_attribute: &str) -> Result<String>;
    fn get_job_attr_delayed(&mut self, job_attribute: &str) -> Result<String>;
    fn set_job_attr(&mut self, job_attribute: &str, attribute_value: &str) -> Result<()>;
    fn set_job_attr_delayed(&mut self, job_attribute: &str, attribute_value: &str) -> Result<()>;
    fn ulog(&mut self, text: &str) -> Result<()>;
    fn phase(&mut self, phasestring: &str) -> Result<()>;
    fn read(
        &mut self,
        remote_file: &str,
        length: i64,
        offset: Option<i64>,
        stride: (Option<i64>, Option<i64>),
    ) -> Result<String>;
    fn write(
        &mut self,
        remote_file: &str,
        local_file: &str,
        length: i64,
        offset: Option<i64>,
        stride: (Option<i64>, Option<i64>),
    ) -> Result<i64>;
    fn rmdir(&mut self, remotepath: &str, recursive: bool) -> Result<()>;
    /// Plain listing returns an array of names; with `long` a map of
    /// name -> metadata fields (including atime/mtime/ctime epochs).
    fn getdir(&mut self, remotepath: &str, long: bool) -> Result<serde_json::Value>;
    fn whoami(&mut self) -> Result<String>;
    fn whoareyou(&mut self, remotepath: &str) -> Result<String>;
    fn link(&mut self, oldpath: &str, newpath: &str, symbolic: bool) -> Result<()>;
    fn readlink(&mut self, remotepath: &str, length: i64) -> Result<String>;
    fn stat(&mut self, remotepath: &str) -> Result<serde_json::Value>;
    fn lstat(&mut self, remotepath: &str) -> Result<serde_json::Value>;
    fn statfs(&mut self, remotepath: &str) -> Result<serde_json::Value>;
    fn access(&mut self, remotepath: &str, mode: &str) -> Result<()>;
    fn chmod(&mut self, remotepath: &str, mode: u32) -> Result<()>;
    fn chown(&mut self, remotepath: &str, uid: i64, gid: i64) -> Result<()>;
    fn lchown(&mut self, remotepath: &str, uid: i64, gid: i64) -> Result<()>;
    fn truncate(&mut self, remotepath: &str, length: i64) -> Result<()>;
    fn utime(&mut self, remotepath: &str, actime: i64, mtime: i64) -> Result<()>;
    fn close(&mut self) -> Result<()>;
}

/// Scoped acquisition of a chirp client.
pub trait Connector {
    fn connect(&self) -> Result<Box<dyn ChirpClient>>;
}

/// Open a client, run one operation, and close the client on every
/// exit path. An operation error wins over a close error; a close
/// error surfaces only when the operation itself succeeded.
pub fn with_client<T>(
    connector: &dyn Connector,
    op: impl FnOnce(&mut dyn ChirpClient) -> Result<T>,
) -> Result<T> {
    let mut client = connector.connect()?;
    let outcome = op(client.as_mut());
    let closed = client.close();
    match (outcome, closed) {
        (Ok(value), Ok(())) => Ok(value),
        (Ok(_), Err(e)) => Err(e).context("operation succeeded but closing the connection failed"),
        (Err(e), _) => Err(e),
    }
}

/// Connection parameters from the job's `.chirp.config` file, written
/// by the starter as a single `host port cookie` line.
#[derive(Debug, Clone, PartialEq)]
pub struct ChirpConfig {
    pub host: String,
    pub port: u16,
    pub cookie: String,
}

impl ChirpConfig {
    pub fn parse(text: &str) -> Result<Self> {
        let mut fields = text.split_whitespace();
        let (Some(host), Some(port), Some(cookie)) =
            (fields.next(), fields.next(), fields.next())
        else {
            bail!("malformed .chirp.config: expected 'host port cookie'");
        };
        if fields.next().is_some() {
            bail!("malformed .chirp.config: trailing fields after 'host port cookie'");
        }
        let port: u16 = port
            .parse()
            .with_context(|| format!("malformed .chirp.config: bad port '{port}'"))?;
        Ok(Self {
            host: host.to_string(),
            port,
            cookie: cookie.to_string(),
        })
    }

    /// Locate and parse `.chirp.config`: `_CONDOR_SCRATCH_DIR` first,
    /// then the working directory. Only available inside a running
    /// job with `WantIOProxy = True`.
    pub fn discover() -> Result<Self> {
        let path = Self::locate()?;
        logging::debug(format!("reading chirp config from {}", path.display()));
        let text = std::fs::read_to_string(&path)
            .with_context(|| format!("cannot read {}", path.display()))?;
        Self::parse(&text)
    }

    fn locate() -> Result<PathBuf> {
        let mut candidates = Vec::new();
        if let Ok(scratch) = std::env::var("_CONDOR_SCRATCH_DIR") {
            candidates.push(PathBuf::from(scratch).join(".chirp.config"));
        }
        candidates.push(PathBuf::from(".chirp.config"));
        for candidate in candidates {
            if candidate.is_file() {
                return Ok(candidate);
            }
        }
        bail!("no .chirp.config found; rchirp must run inside an HTCondor job with IO proxy enabled")
    }
}

/// Connector for the surrounding HTCondor job. Discovers the config
/// and hands it to the site's chirp transport.
pub struct JobConnector;

impl Connector for JobConnector {
    fn connect(&self) -> Result<Box<dyn ChirpClient>> {
        let config = ChirpConfig::discover()?;
        logging::debug(format!(
            "chirp proxy at {}:{}",
            config.host, config.port
        ));
        // Wire transport not implemented yet; the protocol client is
        // supplied externally and plugged in through `ChirpClient`.
        bail!(
            "no chirp transport available for {}:{}",
            config.host,
            config.port
        )
    }
}

/* --------------------------------- Tests ---------------------------------- */

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_config_line() {
        let cfg = ChirpConfig::parse("execute-1.example.org 9618 c00kie\n").unwrap();
        assert_eq!(
            cfg,
            ChirpConfig {
                host: "execute-1.example.org".into(),
                port: 9618,
                cookie: "c00kie".into(),
            }
        );
    }

    #[test]
    fn parse_config_rejects_bad_input() {
        assert!(ChirpConfig::parse("").is_err());
        assert!(ChirpConfig::parse("host cookie").is_err());
        assert!(ChirpConfig::parse("host notaport cookie").is_err());
        assert!(ChirpConfig::parse("host 1 cookie extra").is_err());
    }
}

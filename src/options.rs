//! Agent option parsing.
//!
//! The VM hands the agent everything after `=` in
//! `-agentpath:libsharedcache_agent.so=<options>`, in the form
//! `name1=value1,name2=value2,...`. Recognised names:
//!
//! | Option | Meaning |
//! |--------|---------|
//! | `cacheDir` | Directory to query. Absent: the VM default directory. |
//! | `expectedCacheCount` | Minimum number of caches the pass must find. Absent or malformed: not checked. |
//! | `useCommandLineValues` | `true`: let the VM use its `-Xshareclasses` settings, ignoring `cacheDir`. |
//! | `deleteCaches` | `true`: try to delete each cache after it is queried. |
//! | `cachePrefix` | Only delete caches whose name starts with this prefix. |
//! | `logEncoding` | `utf8` (default) or `ebcdic`. |

use crate::logging::LogEncoding;
use tracing::{info, warn};

pub const CACHE_DIR: &str = "cacheDir";
pub const EXPECTED_CACHE_COUNT: &str = "expectedCacheCount";
pub const USE_COMMAND_LINE_VALUES: &str = "useCommandLineValues";
pub const DELETE_CACHES: &str = "deleteCaches";
pub const CACHE_PREFIX: &str = "cachePrefix";
pub const LOG_ENCODING: &str = "logEncoding";

/// Settings parsed from the agent option string.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AgentOptions {
    pub cache_dir: Option<String>,
    /// `None` means the number of caches found is not checked.
    pub expected_cache_count: Option<u32>,
    pub use_command_line_values: bool,
    pub delete_caches: bool,
    pub cache_prefix: Option<String>,
    pub log_encoding: LogEncoding,
}

impl AgentOptions {
    /// Parses `options`, logging each decision as it is made.
    ///
    /// Nothing here is fatal: missing or malformed options fall back to
    /// their defaults.
    pub fn parse(options: &str) -> Self {
        info!("Parsing option string '{}'", options);

        let cache_dir = lookup(options, CACHE_DIR).map(str::to_owned);
        match &cache_dir {
            Some(dir) => info!("cache Directory to be searched is '{}'", dir),
            None => info!("The default cache directory will be used"),
        }

        let expected_cache_count = lookup(options, EXPECTED_CACHE_COUNT).and_then(|raw| {
            let count = leading_count(raw);
            if count.is_none() {
                warn!(
                    "Invalid value specified for {}. Expected a non-negative integer, got '{}'",
                    EXPECTED_CACHE_COUNT, raw
                );
            }
            count
        });
        match expected_cache_count {
            Some(count) => info!("Number of caches found will be checked. Expected value is {}", count),
            None => info!("Number of caches found will not be checked"),
        }

        let use_command_line_values = lookup(options, USE_COMMAND_LINE_VALUES).map_or(false, is_true);
        if use_command_line_values {
            info!("Command line values for the shared classes cache directory will be used");
        } else {
            info!("Command line values for the shared classes cache directory will be ignored");
        }

        let delete_caches = lookup(options, DELETE_CACHES).map_or(false, is_true);
        if delete_caches {
            info!("Will attempt to delete the caches after querying them");
        } else {
            info!("Caches will not be deleted after querying them");
        }

        let cache_prefix = lookup(options, CACHE_PREFIX).map(str::to_owned);
        match &cache_prefix {
            Some(prefix) => info!(
                "Cache prefix was specified as: '{}'. Only caches with this prefix will be deleted",
                prefix
            ),
            None => info!("No Cache prefix was specified. All caches will be deleted"),
        }

        let log_encoding = find_option(options, LOG_ENCODING)
            .map(|raw| {
                LogEncoding::from_option(raw).unwrap_or_else(|| {
                    warn!("Unknown {} '{}', using utf8", LOG_ENCODING, raw);
                    LogEncoding::Utf8
                })
            })
            .unwrap_or_default();

        AgentOptions {
            cache_dir,
            expected_cache_count,
            use_command_line_values,
            delete_caches,
            cache_prefix,
            log_encoding,
        }
    }

    /// Whether a cache called `name` should be destroyed after it is queried.
    ///
    /// The prefix test is a byte comparison on the raw cache name.
    pub fn should_delete(&self, name: &[u8]) -> bool {
        if !self.delete_caches {
            return false;
        }
        match &self.cache_prefix {
            None => true,
            Some(prefix) => name.starts_with(prefix.as_bytes()),
        }
    }
}

fn lookup<'a>(options: &'a str, name: &str) -> Option<&'a str> {
    let value = find_option(options, name);
    if value.is_none() {
        info!("No value found for option '{}'", name);
    }
    value
}

// Leading blanks and a '+' are accepted and anything after the digits is
// ignored, so "3abc" and " 3" both read as 3.
fn leading_count(raw: &str) -> Option<u32> {
    let trimmed = raw.trim_start();
    let unsigned = trimmed.strip_prefix('+').unwrap_or(trimmed);
    let end = unsigned
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(unsigned.len());
    unsigned[..end].parse().ok()
}

fn is_true(value: &str) -> bool {
    value == "true"
}

/// Returns the value of option `name` in `options`.
///
/// A match must start the string or follow a comma, and must be followed
/// directly by `=`. Other occurrences (inside another option's name or
/// value) are skipped and the scan moves on. The value runs to the next
/// comma or the end of the string.
///
/// An empty value (`name=` before a comma or the end) counts as absent, so a
/// later well-formed occurrence of the same name still matches.
pub fn find_option<'a>(options: &'a str, name: &str) -> Option<&'a str> {
    let first = name.chars().next()?;
    let mut cursor = 0;

    while let Some(offset) = options[cursor..].find(name) {
        let start = cursor + offset;
        let at_boundary = start == 0 || options.as_bytes()[start - 1] == b',';

        if at_boundary {
            if let Some(tail) = options[start + name.len()..].strip_prefix('=') {
                let value = tail.find(',').map_or(tail, |end| &tail[..end]);
                if !value.is_empty() {
                    return Some(value);
                }
            }
        }
        cursor = start + first.len_utf8();
    }
    None
}

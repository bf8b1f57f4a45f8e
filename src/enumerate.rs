//! One pass over the shared classes caches.
//!
//! Before the real pass the host is probed with an unsupported version and
//! with an illegal flags value; both calls must be rejected with the matching
//! JVMTI error. The real pass then tallies every cache, applies the deletion
//! policy from [`AgentOptions`] and finally checks the tally against
//! `expectedCacheCount`.

use crate::error::AgentError;
use crate::host::{CacheRecord, SharedCacheHost};
use crate::options::AgentOptions;
use crate::sys::ibmjvmti::{COM_IBM_ITERATE_SHARED_CACHES_NO_FLAGS, COM_IBM_ITERATE_SHARED_CACHES_VERSION_1};
use crate::sys::jni::jint;
use crate::sys::jvmti::jvmtiError;
use tracing::info;

/// A version number no VM supports.
pub const INVALID_ITERATE_VERSION: jint = COM_IBM_ITERATE_SHARED_CACHES_VERSION_1 + 999;
/// A flags value no VM accepts.
pub const INVALID_ITERATE_FLAGS: jint = COM_IBM_ITERATE_SHARED_CACHES_NO_FLAGS + 100;

/// Counters for one enumeration pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PassReport {
    pub found: u32,
    pub deleted: u32,
    pub delete_failures: u32,
}

pub struct CacheEnumerator<'a, H: SharedCacheHost> {
    host: &'a H,
    options: &'a AgentOptions,
}

impl<'a, H: SharedCacheHost> CacheEnumerator<'a, H> {
    pub fn new(host: &'a H, options: &'a AgentOptions) -> Self {
        CacheEnumerator { host, options }
    }

    fn cache_dir(&self) -> Option<&'a str> {
        self.options.cache_dir.as_deref()
    }

    /// Runs the protocol checks and the real pass.
    ///
    /// A short count is returned as [`AgentError::TooFewCaches`] and left to
    /// the caller to report.
    pub fn run(&self) -> Result<PassReport, AgentError> {
        self.check_rejects(INVALID_ITERATE_VERSION, COM_IBM_ITERATE_SHARED_CACHES_NO_FLAGS, jvmtiError::UNSUPPORTED_VERSION)
            .map_err(AgentError::UnsupportedVersionAccepted)?;
        self.check_rejects(COM_IBM_ITERATE_SHARED_CACHES_VERSION_1, INVALID_ITERATE_FLAGS, jvmtiError::ILLEGAL_ARGUMENT)
            .map_err(AgentError::IllegalFlagsAccepted)?;

        let report = self.pass()?;

        info!("Finished iterating over the caches, total found was {}", report.found);
        if let Some(expected) = self.options.expected_cache_count {
            if report.found >= expected {
                info!(
                    "Correct number of caches found. Expected at least {} caches, found {}.",
                    expected, report.found
                );
            } else {
                return Err(AgentError::TooFewCaches { expected, found: report.found });
            }
        }
        Ok(report)
    }

    // Probe calls ignore any record the host reports, so a host that wrongly
    // accepts the call cannot trigger deletions or skew the tally.
    fn check_rejects(&self, version: jint, flags: jint, expected: jvmtiError) -> Result<(), jvmtiError> {
        let outcome = self.host.iterate(
            version,
            self.cache_dir(),
            flags,
            self.options.use_command_line_values,
            &mut |_: &CacheRecord<'_>| {},
        );
        match outcome {
            Err(err) if err == expected => Ok(()),
            Err(err) => Err(err),
            Ok(()) => Err(jvmtiError::NONE),
        }
    }

    fn pass(&self) -> Result<PassReport, AgentError> {
        let mut report = PassReport::default();
        let outcome = self.host.iterate(
            COM_IBM_ITERATE_SHARED_CACHES_VERSION_1,
            self.cache_dir(),
            COM_IBM_ITERATE_SHARED_CACHES_NO_FLAGS,
            self.options.use_command_line_values,
            &mut |record: &CacheRecord<'_>| self.visit(record, &mut report),
        );
        outcome.map_err(AgentError::IterationFailed)?;
        Ok(report)
    }

    fn visit(&self, record: &CacheRecord<'_>, report: &mut PassReport) {
        report.found += 1;
        let number = report.found;

        info!("Iterating over cache number {}", number);
        info!("Cache name is: {}", record.name.to_string_lossy());
        if record.persistent {
            info!("Cache is persistent");
        } else {
            info!("Cache is non-persistent");
        }

        let delete = self.options.should_delete(record.name.to_bytes());
        if self.options.delete_caches {
            info!("Delete caches was specified");
            match (&self.options.cache_prefix, delete) {
                (None, _) => info!("No prefix is specified, will attempt to delete cache"),
                (Some(_), true) => info!("Prefix was specified and cache name matches. Cache will be deleted"),
                (Some(_), false) => {
                    info!("Prefix was specified and cache name doesn't match. Cache will not be deleted")
                }
            }
        }

        if delete {
            info!("Attempting to delete cache");
            let outcome = self.host.destroy(
                self.cache_dir(),
                record.name,
                record.cache_type(),
                self.options.use_command_line_values,
            );
            match outcome {
                Ok(()) => {
                    report.deleted += 1;
                    info!("Cache appears to have been deleted successfully");
                }
                Err(failure) => {
                    // Caches still attached to a running VM cannot be deleted.
                    report.delete_failures += 1;
                    info!("Cache was not deleted. {}", failure);
                }
            }
        }

        info!("Finished with cache {}", number);
    }
}

/// Logs which directory the pass is about to query.
pub fn log_query_directory(options: &AgentOptions) {
    let printable_dir = options.cache_dir.as_deref().unwrap_or("<default>");
    if options.use_command_line_values {
        info!("Querying all caches in directory specified via -Xshareclasses option");
        info!("cacheDir option passed to the agent should be ignored: {}", printable_dir);
    } else {
        info!("Querying all caches in directory {}", printable_dir);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn probe_arguments_are_out_of_range() {
        assert_eq!(INVALID_ITERATE_VERSION, 1000);
        assert_eq!(INVALID_ITERATE_FLAGS, 100);
    }
}

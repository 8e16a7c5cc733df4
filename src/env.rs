use std::collections::{BTreeMap, HashSet};

use crate::model::{EnvMap, LoadReport};

/// Destination for loaded environment variables.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TargetEnv {
    kind: TargetEnvKind,
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum TargetEnvKind {
    /// Apply entries to the current process environment.
    ///
    /// This writes through [`std::env::set_var`], which mutates global process
    /// state and is not thread-safe for concurrent environment access.
    Process,
    /// Apply entries to an in-memory map.
    Memory(BTreeMap<String, String>),
}

impl Default for TargetEnv {
    fn default() -> Self {
        Self::memory()
    }
}

impl TargetEnv {
    /// Create a process-environment target.
    ///
    /// # Safety
    ///
    /// The caller must ensure no other threads concurrently read or write the
    /// process environment for the duration of operations that may mutate this
    /// target.
    pub unsafe fn process() -> Self {
        Self {
            kind: TargetEnvKind::Process,
        }
    }

    /// Create an in-memory environment target.
    ///
    /// Use this to avoid mutating the process environment.
    pub fn memory() -> Self {
        Self::from_memory(BTreeMap::new())
    }

    /// Create an in-memory environment target from an existing map.
    pub fn from_memory(map: BTreeMap<String, String>) -> Self {
        Self {
            kind: TargetEnvKind::Memory(map),
        }
    }

    pub fn is_process(&self) -> bool {
        matches!(self.kind, TargetEnvKind::Process)
    }

    pub fn as_memory(&self) -> Option<&BTreeMap<String, String>> {
        match &self.kind {
            TargetEnvKind::Memory(map) => Some(map),
            TargetEnvKind::Process => None,
        }
    }

    pub fn into_memory(self) -> Option<BTreeMap<String, String>> {
        match self.kind {
            TargetEnvKind::Memory(map) => Some(map),
            TargetEnvKind::Process => None,
        }
    }

    pub fn get_var(&self, key: &str) -> Option<String> {
        match &self.kind {
            TargetEnvKind::Process => {
                std::env::var_os(key).map(|value| value.to_string_lossy().into_owned())
            }
            TargetEnvKind::Memory(map) => map.get(key).cloned(),
        }
    }

    /// Merge `values` into this target.
    ///
    /// The set of keys already present is captured once before any write. A
    /// key is written when it is missing from that snapshot or `overwrite` is
    /// set, so the result does not depend on iteration order.
    ///
    /// Keys the OS environment cannot hold (empty, containing `=` or NUL) and
    /// values containing NUL are skipped and counted in
    /// [`LoadReport::skipped_invalid`], for both target kinds.
    pub fn merge(&mut self, values: &EnvMap, overwrite: bool) -> LoadReport {
        let existing = self.snapshot_keys();
        let mut report = LoadReport::default();

        for (key, value) in values {
            if !is_portable_pair(key, value) {
                tracing::warn!(key = %key, "skipping variable the environment cannot hold");
                report.skipped_invalid += 1;
                continue;
            }
            if !overwrite && existing.contains(key) {
                tracing::debug!(key = %key, "skipping existing key");
                report.skipped_existing += 1;
                continue;
            }

            self.set_var(key, value);
            report.loaded += 1;
        }

        report
    }

    fn snapshot_keys(&self) -> HashSet<String> {
        match &self.kind {
            TargetEnvKind::Process => std::env::vars_os()
                .map(|(key, _)| key.to_string_lossy().into_owned())
                .collect(),
            TargetEnvKind::Memory(map) => map.keys().cloned().collect(),
        }
    }

    fn set_var(&mut self, key: &str, value: &str) {
        match &mut self.kind {
            // SAFETY: `TargetEnv::process` is unsafe and its caller promised
            // exclusive access to the process environment.
            TargetEnvKind::Process => unsafe { std::env::set_var(key, value) },
            TargetEnvKind::Memory(map) => {
                map.insert(key.to_owned(), value.to_owned());
            }
        }
    }
}

fn is_portable_pair(key: &str, value: &str) -> bool {
    !key.is_empty() && !key.contains(['=', '\0']) && !value.contains('\0')
}

#[cfg(test)]
mod tests {
    use super::*;

    fn map(pairs: &[(&str, &str)]) -> BTreeMap<String, String> {
        pairs
            .iter()
            .map(|(key, value)| ((*key).to_owned(), (*value).to_owned()))
            .collect()
    }

    #[test]
    fn merge_keeps_existing_values() {
        let mut target = TargetEnv::from_memory(map(&[("OPTION_A", "do_not_override")]));
        let report = target.merge(&map(&[("OPTION_A", "1"), ("OPTION_B", "2")]), false);

        assert_eq!(report.loaded, 1);
        assert_eq!(report.skipped_existing, 1);
        let values = target.as_memory().expect("memory target");
        assert_eq!(values["OPTION_A"], "do_not_override");
        assert_eq!(values["OPTION_B"], "2");
    }

    #[test]
    fn merge_with_overwrite_replaces_values() {
        let mut target = TargetEnv::from_memory(map(&[("OPTION_A", "do_not_override")]));
        let report = target.merge(&map(&[("OPTION_A", "1")]), true);

        assert_eq!(report.loaded, 1);
        assert_eq!(report.skipped_existing, 0);
        assert_eq!(target.get_var("OPTION_A").as_deref(), Some("1"));
    }

    #[test]
    fn merge_into_empty_target_reproduces_values() {
        let values = map(&[("A", "1"), ("B", ""), ("C", "three")]);
        let mut target = TargetEnv::memory();
        target.merge(&values, false);

        assert_eq!(target.into_memory(), Some(values));
    }

    #[test]
    fn merge_skips_keys_the_environment_cannot_hold() {
        let mut target = TargetEnv::memory();
        let report = target.merge(
            &map(&[("", "empty"), ("A=B", "eq"), ("NUL", "a\0b"), ("OK", "1")]),
            true,
        );

        assert_eq!(report.loaded, 1);
        assert_eq!(report.skipped_invalid, 3);
        assert_eq!(target.into_memory(), Some(map(&[("OK", "1")])));
    }

    #[test]
    fn memory_target_is_not_process() {
        assert!(!TargetEnv::memory().is_process());
        assert!(TargetEnv::default().as_memory().is_some());
    }
}

use std::fs::File;
use std::io::{BufRead, BufReader, ErrorKind};
use std::path::{Path, PathBuf};

use crate::env::TargetEnv;
use crate::error::{Error, ParseError, ParseErrorKind};
use crate::interpolate::interpolate;
use crate::model::{EnvMap, LoadReport, MalformedPolicy, ParseOutcome};
use crate::parser::parse_numbered_line;

const DEFAULT_FILE: &str = ".env";

/// Read `.env` text into a map, failing on the first malformed line.
pub fn read<R: BufRead>(reader: R) -> Result<EnvMap, Error> {
    read_with_policy(reader, MalformedPolicy::Strict)
}

/// Read `.env` text into a map using a specific malformed-line policy.
///
/// Lines are split on `\n`, a trailing `\r` is dropped and a final line
/// without a newline is still read. Before a line is parsed, each `${NAME}`
/// in it is replaced with the value parsed for `NAME` on an earlier line, or
/// the empty string. A key defined more than once keeps its last value.
pub fn read_with_policy<R: BufRead>(
    mut reader: R,
    malformed_policy: MalformedPolicy,
) -> Result<EnvMap, Error> {
    let mut env_map = EnvMap::new();
    let mut raw = Vec::new();
    let mut line_num = 0u32;

    loop {
        raw.clear();
        if reader.read_until(b'\n', &mut raw)? == 0 {
            break;
        }
        line_num += 1;

        let text = std::str::from_utf8(strip_line_ending(&raw)).map_err(|source| {
            Error::InvalidEncoding {
                path: None,
                line: line_num,
                source,
            }
        })?;
        let line = interpolate(text, &env_map);

        match parse_numbered_line(&line, line_num) {
            ParseOutcome::Blank | ParseOutcome::Comment => {}
            ParseOutcome::Entry(entry) => {
                if entry.unterminated_quote {
                    tracing::warn!(line = line_num, key = %entry.key, "unterminated quote");
                }
                env_map.insert(entry.key, entry.value);
            }
            ParseOutcome::Malformed => match malformed_policy {
                MalformedPolicy::Strict => {
                    return Err(ParseError::new(line_num, ParseErrorKind::InvalidSyntax).into());
                }
                MalformedPolicy::Lenient => {
                    tracing::warn!(line = line_num, "skipping malformed line");
                }
            },
        }
    }

    Ok(env_map)
}

/// Read a `.env` file into a map, failing on the first malformed line.
pub fn read_file(path: impl AsRef<Path>) -> Result<EnvMap, Error> {
    read_file_with_policy(path, MalformedPolicy::Strict)
}

/// Read a `.env` file into a map using a specific malformed-line policy.
pub fn read_file_with_policy(
    path: impl AsRef<Path>,
    malformed_policy: MalformedPolicy,
) -> Result<EnvMap, Error> {
    let path = path.as_ref();
    let _span = tracing::debug_span!("read_file", path = %path.display()).entered();

    let file = File::open(path).map_err(|err| Error::from(err).with_path(path))?;
    let env_map = read_with_policy(BufReader::new(file), malformed_policy)
        .map_err(|err| err.with_path(path))?;

    tracing::debug!(entries = env_map.len(), "read dotenv file");
    Ok(env_map)
}

/// Load `.env` from the current working directory into the process
/// environment, keeping variables that are already set.
///
/// # Safety
///
/// Mutates the process environment. The caller must ensure no other threads
/// concurrently read or write it.
pub unsafe fn dotenv() -> Result<LoadReport, Error> {
    unsafe { load([DEFAULT_FILE]) }
}

/// Load each file in order into the process environment, keeping variables
/// that are already set. An empty list loads `.env`.
///
/// Stops at the first file that cannot be read or parsed; files before it
/// stay applied.
///
/// # Safety
///
/// Mutates the process environment. The caller must ensure no other threads
/// concurrently read or write it.
pub unsafe fn load<I, P>(paths: I) -> Result<LoadReport, Error>
where
    I: IntoIterator<Item = P>,
    P: AsRef<Path>,
{
    let target = unsafe { TargetEnv::process() };
    EnvLoader::new().paths(paths).target(target).load()
}

/// Like [`load`], but replaces variables that are already set.
///
/// # Safety
///
/// Mutates the process environment. The caller must ensure no other threads
/// concurrently read or write it.
pub unsafe fn overload<I, P>(paths: I) -> Result<LoadReport, Error>
where
    I: IntoIterator<Item = P>,
    P: AsRef<Path>,
{
    let target = unsafe { TargetEnv::process() };
    EnvLoader::new()
        .paths(paths)
        .override_existing(true)
        .target(target)
        .load()
}

/// Builder-style dotenv loader.
///
/// Sources are read one at a time, in order, and each is merged into the
/// target before the next is read. Without `override_existing` the first
/// source to define a key wins; with it the last one does.
#[derive(Debug, Clone)]
pub struct EnvLoader {
    paths: Vec<PathBuf>,
    override_existing: bool,
    malformed_policy: MalformedPolicy,
    required: bool,
    target: TargetEnv,
}

impl EnvLoader {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn path(mut self, path: impl AsRef<Path>) -> Self {
        self.paths.push(path.as_ref().to_path_buf());
        self
    }

    pub fn paths<I, P>(mut self, paths: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: AsRef<Path>,
    {
        self.paths
            .extend(paths.into_iter().map(|path| path.as_ref().to_path_buf()));
        self
    }

    pub fn override_existing(mut self, override_existing: bool) -> Self {
        self.override_existing = override_existing;
        self
    }

    pub fn malformed_policy(mut self, malformed_policy: MalformedPolicy) -> Self {
        self.malformed_policy = malformed_policy;
        self
    }

    /// When `false`, files that do not exist are skipped instead of failing.
    pub fn required(mut self, required: bool) -> Self {
        self.required = required;
        self
    }

    pub fn target(mut self, target: TargetEnv) -> Self {
        self.target = target;
        self
    }

    pub fn target_env(&self) -> &TargetEnv {
        &self.target
    }

    pub fn into_target(self) -> TargetEnv {
        self.target
    }

    /// Read every source and merge them with the same precedence as
    /// [`EnvLoader::load`], without touching the target.
    pub fn read_merged(&self) -> Result<EnvMap, Error> {
        let mut merged = TargetEnv::memory();
        for path in self.effective_paths() {
            if let Some(values) = self.read_source(&path)? {
                merged.merge(&values, self.override_existing);
            }
        }
        Ok(merged.into_memory().unwrap_or_default())
    }

    pub fn load(&mut self) -> Result<LoadReport, Error> {
        let mut report = LoadReport::default();
        for path in self.effective_paths() {
            let Some(values) = self.read_source(&path)? else {
                continue;
            };
            report.files_read += 1;
            report.absorb(self.target.merge(&values, self.override_existing));
        }

        tracing::debug!(
            loaded = report.loaded,
            skipped_existing = report.skipped_existing,
            files_read = report.files_read,
            "loaded dotenv files"
        );
        Ok(report)
    }

    fn read_source(&self, path: &Path) -> Result<Option<EnvMap>, Error> {
        match read_file_with_policy(path, self.malformed_policy) {
            Ok(values) => Ok(Some(values)),
            Err(Error::Io { source, .. })
                if !self.required && source.kind() == ErrorKind::NotFound =>
            {
                tracing::debug!(path = %path.display(), "skipping missing dotenv file");
                Ok(None)
            }
            Err(err) => Err(err),
        }
    }

    fn effective_paths(&self) -> Vec<PathBuf> {
        if self.paths.is_empty() {
            vec![PathBuf::from(DEFAULT_FILE)]
        } else {
            self.paths.clone()
        }
    }
}

impl Default for EnvLoader {
    fn default() -> Self {
        Self {
            paths: Vec::new(),
            override_existing: false,
            malformed_policy: MalformedPolicy::Strict,
            required: true,
            target: TargetEnv::memory(),
        }
    }
}

fn strip_line_ending(raw: &[u8]) -> &[u8] {
    let raw = raw.strip_suffix(b"\n").unwrap_or(raw);
    raw.strip_suffix(b"\r").unwrap_or(raw)
}

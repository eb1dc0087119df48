//! Project path containment checks
//!
//! Untrusted path strings are expanded the way a shell would display them
//! (`~`, `~user`, `$VAR`, `${VAR}`), anchored at the canonical project root,
//! resolved through symlinks, and only then compared against the root. Any
//! failure along the way is a rejection.

use regex::Regex;
use std::fs;
use std::io;
use std::path::{Component, Path, PathBuf};
use std::sync::LazyLock;
use tracing::debug;

use super::env::{EnvLookup, ProcessEnv};

/// Symlink hops allowed while resolving one path (matches Linux MAXSYMLINKS)
const MAX_SYMLINK_HOPS: usize = 40;

/// `$NAME` or `${...}`, the forms a shell expands
static VAR_REFERENCE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\$(\w+|\{[^}]*\})").expect("valid regex"));

/// What is left behind when a variable could not be expanded
static UNEXPANDED_VAR: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\$[A-Za-z_][A-Za-z0-9_]*|\$\{[^}]*\}").expect("valid regex"));

/// Why a path was refused
#[derive(Debug, thiserror::Error)]
pub enum PathRejection {
    #[error("project root {root:?} cannot be resolved: {source}")]
    InvalidRoot {
        root: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("path '{0}' references an undefined environment variable")]
    UnexpandedVariable(String),

    #[error("path '{path}' cannot be resolved: {source}")]
    Unresolvable {
        path: String,
        #[source]
        source: io::Error,
    },

    #[error("path {0:?} resolves outside the project root")]
    OutsideRoot(PathBuf),
}

/// True if `path` refers to `project_root` or something below it
pub fn validate_project_path(path: &str, project_root: &Path) -> bool {
    validate_project_path_with(path, project_root, &ProcessEnv)
}

/// [`validate_project_path`] with an explicit environment
pub fn validate_project_path_with(path: &str, project_root: &Path, env: &dyn EnvLookup) -> bool {
    match resolve_project_path(path, project_root, env) {
        Ok(_) => true,
        Err(rejection) => {
            debug!("Rejected project path '{}': {}", path, rejection);
            false
        }
    }
}

/// Resolve an untrusted path and return its canonical location if it lies
/// inside the project root.
pub fn resolve_project_path(
    path: &str,
    project_root: &Path,
    env: &dyn EnvLookup,
) -> Result<PathBuf, PathRejection> {
    let root = fs::canonicalize(project_root).map_err(|source| PathRejection::InvalidRoot {
        root: project_root.to_path_buf(),
        source,
    })?;

    let expanded = expand_vars(&expand_user(path, env), env);
    if UNEXPANDED_VAR.is_match(&expanded) {
        return Err(PathRejection::UnexpandedVariable(path.to_string()));
    }

    let candidate =
        resolve_path(Path::new(&expanded), &root).map_err(|source| PathRejection::Unresolvable {
            path: path.to_string(),
            source,
        })?;

    if candidate.starts_with(&root) {
        Ok(candidate)
    } else {
        Err(PathRejection::OutsideRoot(candidate))
    }
}

/// Make `path` absolute (relative paths are anchored at `base`) and resolve
/// symlinks. Components that do not exist yet are kept as written.
pub fn resolve_path(path: &Path, base: &Path) -> io::Result<PathBuf> {
    let anchored = if path.is_absolute() {
        path.to_path_buf()
    } else {
        base.join(path)
    };
    let mut hops = 0;
    resolve_components(&anchored, &mut hops)
}

fn resolve_components(path: &Path, hops: &mut usize) -> io::Result<PathBuf> {
    let mut resolved = PathBuf::new();

    for component in path.components() {
        match component {
            Component::Prefix(prefix) => resolved.push(prefix.as_os_str()),
            Component::RootDir => resolved.push(Component::RootDir.as_os_str()),
            Component::CurDir => {}
            Component::ParentDir => {
                resolved.pop();
            }
            Component::Normal(name) => {
                let candidate = resolved.join(name);
                match fs::symlink_metadata(&candidate) {
                    Ok(meta) if meta.file_type().is_symlink() => {
                        *hops += 1;
                        if *hops > MAX_SYMLINK_HOPS {
                            return Err(io::Error::new(
                                io::ErrorKind::Other,
                                "too many levels of symbolic links",
                            ));
                        }
                        let target = fs::read_link(&candidate)?;
                        let next = if target.is_absolute() {
                            target
                        } else {
                            resolved.join(target)
                        };
                        resolved = resolve_components(&next, hops)?;
                    }
                    Ok(_) => resolved = candidate,
                    Err(e) if e.kind() == io::ErrorKind::NotFound => resolved = candidate,
                    Err(e) => return Err(e),
                }
            }
        }
    }

    Ok(resolved)
}

/// Expand a leading `~` or `~user`. Unknown users leave the path untouched.
pub fn expand_user(path: &str, env: &dyn EnvLookup) -> String {
    let Some(rest) = path.strip_prefix('~') else {
        return path.to_string();
    };

    let (user, tail) = match rest.find('/') {
        Some(idx) => (&rest[..idx], &rest[idx..]),
        None => (rest, ""),
    };

    let home = if user.is_empty() {
        env.var("HOME").or_else(|| {
            directories::BaseDirs::new().map(|dirs| dirs.home_dir().to_string_lossy().into_owned())
        })
    } else {
        home_for_user(user)
    };

    match home {
        Some(home) => {
            let trimmed = home.trim_end_matches('/');
            let home = if trimmed.is_empty() && home.starts_with('/') {
                "/"
            } else {
                trimmed
            };
            format!("{}{}", home, tail)
        }
        None => path.to_string(),
    }
}

/// Expand `$NAME` and `${NAME}`. Undefined variables are left as written.
pub fn expand_vars(path: &str, env: &dyn EnvLookup) -> String {
    if !path.contains('$') {
        return path.to_string();
    }

    VAR_REFERENCE
        .replace_all(path, |caps: &regex::Captures<'_>| {
            let reference = &caps[1];
            let name = reference
                .strip_prefix('{')
                .and_then(|r| r.strip_suffix('}'))
                .unwrap_or(reference);
            env.var(name).unwrap_or_else(|| caps[0].to_string())
        })
        .into_owned()
}

#[cfg(unix)]
fn home_for_user(user: &str) -> Option<String> {
    use std::ffi::{CStr, CString};

    let name = CString::new(user).ok()?;
    let mut buf: Vec<libc::c_char> = vec![0; 4096];
    // SAFETY: passwd is a plain C struct; all-zero is a valid initial value.
    let mut pwd: libc::passwd = unsafe { std::mem::zeroed() };
    let mut result: *mut libc::passwd = std::ptr::null_mut();

    loop {
        // SAFETY: every pointer refers to a live, correctly sized buffer.
        let rc = unsafe {
            libc::getpwnam_r(
                name.as_ptr(),
                &mut pwd,
                buf.as_mut_ptr(),
                buf.len(),
                &mut result,
            )
        };
        if rc == libc::ERANGE && buf.len() < (1 << 20) {
            let grown = buf.len() * 2;
            buf.resize(grown, 0);
            continue;
        }
        break;
    }

    if result.is_null() || pwd.pw_dir.is_null() {
        return None;
    }
    // SAFETY: pw_dir points into `buf`, which outlives this borrow.
    let dir = unsafe { CStr::from_ptr(pwd.pw_dir) };
    Some(dir.to_string_lossy().into_owned())
}

#[cfg(not(unix))]
fn home_for_user(_user: &str) -> Option<String> {
    None
}

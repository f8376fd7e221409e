//! Location resolution.
//!
//! Turns the path and URL strings hosts pass in into `Location` values the
//! presentation surface can display. Existence checking is delegated to a
//! `LocationService`; `LocationResolver` adds separator normalization, the
//! current-item fallback against a working context, and all-or-nothing
//! resolution of several locations.

use std::fs;
use std::io;
use std::path::{self, Path, PathBuf, MAIN_SEPARATOR};

use tracing::{debug, warn};
use url::Url;

use crate::error::{DialogError, ResolveError};
use crate::model::{Location, LocationRole, Locations};

/// Binds a path or URL string to a location.
pub trait LocationService: Send {
    fn resolve(&self, input: &str) -> Result<Location, ResolveError>;
}

/// Resolves against the local filesystem.
///
/// Remote URLs are accepted without a round trip. `file:` URLs and plain
/// strings must name something that exists; relative strings are taken
/// relative to the process working directory.
#[derive(Debug, Clone, Copy, Default)]
pub struct FsLocationService;

impl LocationService for FsLocationService {
    fn resolve(&self, input: &str) -> Result<Location, ResolveError> {
        if looks_like_url(input) {
            let url = Url::parse(input).map_err(|e| ResolveError::InvalidUrl {
                input: input.to_string(),
                source: e,
            })?;
            if url.scheme() != "file" {
                return Ok(Location::Url(url));
            }
            let path = url.to_file_path().map_err(|()| ResolveError::NotFound {
                input: input.to_string(),
                source: io::Error::new(io::ErrorKind::NotFound, "file URL has no local path"),
            })?;
            return existing_path(input, &path);
        }

        existing_path(input, Path::new(input))
    }
}

fn existing_path(input: &str, path: &Path) -> Result<Location, ResolveError> {
    let classify = |e: io::Error| {
        if e.kind() == io::ErrorKind::NotFound {
            ResolveError::NotFound {
                input: input.to_string(),
                source: e,
            }
        } else {
            ResolveError::Inaccessible {
                input: input.to_string(),
                source: e,
            }
        }
    };

    if input.is_empty() {
        return Err(classify(io::Error::new(io::ErrorKind::NotFound, "empty path")));
    }
    fs::metadata(path).map_err(classify)?;
    let absolute = path::absolute(path).map_err(classify)?;
    Ok(Location::Path(absolute))
}

/// A scheme of two or more letters followed by `:`. Single letters are drive
/// prefixes (`C:/...`), not schemes.
fn looks_like_url(input: &str) -> bool {
    match input.split_once(':') {
        Some((scheme, _)) => {
            scheme.len() > 1
                && scheme.starts_with(|c: char| c.is_ascii_alphabetic())
                && scheme
                    .chars()
                    .all(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '-' | '.'))
        }
        None => false,
    }
}

/// Replace forward slashes with the platform separator. URLs are left alone.
pub fn normalize_separators(input: &str) -> String {
    if looks_like_url(input) || MAIN_SEPARATOR == '/' {
        input.to_string()
    } else {
        input.replace('/', &MAIN_SEPARATOR.to_string())
    }
}

/// Resolves source, destination and current-item strings for a session.
pub struct LocationResolver {
    service: Box<dyn LocationService>,
    working_dir: PathBuf,
}

impl LocationResolver {
    pub fn new(service: Box<dyn LocationService>, working_dir: impl Into<PathBuf>) -> Self {
        LocationResolver {
            service,
            working_dir: working_dir.into(),
        }
    }

    /// Filesystem resolver rooted at the given working context.
    pub fn filesystem(working_dir: impl Into<PathBuf>) -> Self {
        Self::new(Box::new(FsLocationService), working_dir)
    }

    pub fn working_dir(&self) -> &Path {
        &self.working_dir
    }

    /// The location every role starts at: the working context itself.
    pub fn default_location(&self) -> Location {
        Location::Path(self.working_dir.clone())
    }

    /// Resolve one string for the given role, without fallback.
    pub fn resolve_one(&self, role: LocationRole, input: &str) -> Result<Location, DialogError> {
        self.service
            .resolve(input)
            .map_err(|e| DialogError::Location {
                role,
                input: input.to_string(),
                source: e,
            })
    }

    /// Resolve the current item.
    ///
    /// The string is tried as given (with separators normalized). If nothing
    /// is found it is retried relative to the working context. When both
    /// fail, the error carries the first attempt's cause.
    pub fn resolve_item(&self, input: &str) -> Result<Location, DialogError> {
        let normalized = normalize_separators(input);
        let primary = match self.service.resolve(&normalized) {
            Ok(location) => return Ok(location),
            Err(e) => e,
        };

        if !primary.is_not_found() {
            return Err(DialogError::Location {
                role: LocationRole::Item,
                input: input.to_string(),
                source: primary,
            });
        }

        let fallback = self.working_dir.join(&normalized);
        let fallback_input = fallback.display().to_string();
        match self.service.resolve(&fallback_input) {
            Ok(location) => {
                debug!(input, fallback = %fallback_input, "Resolved current item against working context");
                Ok(location)
            }
            Err(fallback_err) => {
                warn!(input, fallback = %fallback_input, error = %fallback_err, "Current item not found");
                Err(DialogError::Location {
                    role: LocationRole::Item,
                    input: input.to_string(),
                    source: primary,
                })
            }
        }
    }

    /// Resolve source and destination. Both succeed or neither is returned.
    pub fn resolve_pair(
        &self,
        source: &str,
        destination: &str,
    ) -> Result<(Location, Location), DialogError> {
        let source = self.resolve_one(LocationRole::Source, source)?;
        let destination = self.resolve_one(LocationRole::Destination, destination)?;
        Ok((source, destination))
    }

    /// Resolve all three locations. All succeed or none is returned.
    pub fn resolve_all(
        &self,
        source: &str,
        destination: &str,
        item: &str,
    ) -> Result<Locations, DialogError> {
        let (source, destination) = self.resolve_pair(source, destination)?;
        let item = self.resolve_one(LocationRole::Item, item)?;
        Ok(Locations {
            source,
            destination,
            item,
        })
    }
}

impl std::fmt::Debug for LocationResolver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LocationResolver")
            .field("working_dir", &self.working_dir)
            .finish()
    }
}

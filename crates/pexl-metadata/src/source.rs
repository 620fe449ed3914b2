use std::borrow::Cow;
use std::fmt::{Display, Formatter};
use std::path::Path;

use crate::{DistMetadata, Headers, MetadataCache, MetadataError, MetadataFiles};

/// Where to read distribution metadata from.
#[derive(Debug, Clone, Copy)]
pub enum MetadataSource<'a> {
    /// An installed directory, wheel or sdist on disk.
    Path(&'a Path),
    /// Already parsed metadata headers.
    Headers(&'a Headers),
    Files(&'a MetadataFiles),
    /// The metadata of an already loaded distribution.
    Distribution(&'a DistMetadata),
}

impl<'a> MetadataSource<'a> {
    /// The primary metadata headers, if this source has any.
    ///
    /// Loaded distributions carry no headers since their fields are already extracted.
    pub fn headers(&self, cache: &MetadataCache) -> Result<Option<Cow<'a, Headers>>, MetadataError> {
        match *self {
            Self::Path(location) => Ok(cache.pkg_info(location)?.map(Cow::Owned)),
            Self::Headers(headers) => Ok(Some(Cow::Borrowed(headers))),
            Self::Files(files) => Ok(Some(Cow::Borrowed(&files.metadata.headers))),
            Self::Distribution(_) => Ok(None),
        }
    }
}

impl<'a> From<&'a Path> for MetadataSource<'a> {
    fn from(location: &'a Path) -> Self {
        Self::Path(location)
    }
}

impl<'a> From<&'a Headers> for MetadataSource<'a> {
    fn from(headers: &'a Headers) -> Self {
        Self::Headers(headers)
    }
}

impl<'a> From<&'a MetadataFiles> for MetadataSource<'a> {
    fn from(files: &'a MetadataFiles) -> Self {
        Self::Files(files)
    }
}

impl<'a> From<&'a DistMetadata> for MetadataSource<'a> {
    fn from(metadata: &'a DistMetadata) -> Self {
        Self::Distribution(metadata)
    }
}

impl Display for MetadataSource<'_> {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Path(location) => write!(f, "{}", location.display()),
            Self::Headers(_) => f.write_str("<parsed message>"),
            Self::Files(files) => write!(
                f,
                "{}",
                files.metadata.location.join(&files.metadata.rel_path).display()
            ),
            Self::Distribution(metadata) => write!(f, "{} {}", metadata.name, metadata.version),
        }
    }
}

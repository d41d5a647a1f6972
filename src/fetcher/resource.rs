use crate::archive::{self, Entry};
use crate::fetcher::errors::{ResourceError, ResourceResult};
use crate::manifest::{ArchiveProperties, Link};
use crate::mediatype::MediaType;
use crate::parser::XmlDocument;
use crate::util::sync::{Memo, SendAndSync};
use crate::util::utf;
use serde_json::Value;
use std::fmt::{Debug, Formatter};
use std::fs::File;
use std::io::{self, Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

/// A boxed [`Resource`], as handed out by a [`Fetcher`](super::Fetcher).
pub type BoxedResource = Box<dyn Resource>;

/// Random access to the content of a single [`Link`].
///
/// # Ranges
/// [`Self::read`] and [`Self::stream`] take an inclusive `start..=end` range,
/// with the same semantics as [`Entry::read`]:
/// `0..=0` selects everything, `start` is clamped to `0`, `end` to the last byte,
/// and `end < start` fails with [`ResourceError::RangeNotSatisfiable`].
///
/// # Errors
/// A resource is always obtainable; failures surface only once it is read.
pub trait Resource: SendAndSync {
    /// The link this resource was retrieved with,
    /// possibly augmented with additional properties, such as `archive`.
    fn link(&self) -> &Link;

    /// The local file backing this resource, if any.
    fn file(&self) -> Option<&Path> {
        None
    }

    /// The data length, which may be computed by reading the whole resource.
    fn length(&self) -> ResourceResult<u64>;

    /// Reads the inclusive `start..=end` byte range.
    fn read(&self, start: i64, end: i64) -> ResourceResult<Vec<u8>>;

    /// Writes the inclusive `start..=end` byte range into `writer`,
    /// returning the number of bytes written.
    fn stream(&self, writer: &mut dyn Write, start: i64, end: i64) -> ResourceResult<u64> {
        let data = self.read(start, end)?;
        writer.write_all(&data)?;
        Ok(data.len() as u64)
    }

    /// Releases any held handle. Closing is idempotent.
    fn close(&self) {}

    /// Reads the entire resource as a string, decoded according to
    /// the `charset` of the link's media type, or UTF-8 if absent.
    fn read_as_string(&self) -> ResourceResult<String> {
        // Registered media types drop their parameters, so the charset is read from the raw type.
        let media_type = self
            .link()
            .r#type
            .as_deref()
            .and_then(|media_type| MediaType::parse(media_type).ok());
        let charset = media_type.as_ref().and_then(MediaType::charset);
        Ok(utf::decode(self.read(0, 0)?, charset)?)
    }

    /// Reads the entire resource as JSON.
    fn read_as_json(&self) -> ResourceResult<Value> {
        Ok(serde_json::from_str(&self.read_as_string()?)?)
    }

    /// Reads the entire resource as a namespace-resolved XML document.
    fn read_as_xml(&self) -> ResourceResult<XmlDocument> {
        Ok(XmlDocument::parse(&self.read(0, 0)?)?)
    }
}

impl Debug for dyn Resource {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Resource")
            .field("href", &self.link().href)
            .finish_non_exhaustive()
    }
}

/// Slices `data` according to an inclusive `start..=end` range.
fn slice(mut data: Vec<u8>, start: i64, end: i64) -> ResourceResult<Vec<u8>> {
    let range = archive::byte_range(start, end, data.len() as u64)
        .ok_or_else(|| range_error(start, end))?;

    data.truncate(range.end as usize);
    data.drain(..range.start as usize);
    Ok(data)
}

fn range_error(start: i64, end: i64) -> ResourceError {
    ResourceError::range_not_satisfiable(format!("{start}..={end}: end of range smaller than start"))
}

/// A resource that always fails with the same error.
#[derive(Debug)]
pub struct FailureResource {
    link: Link,
    error: ResourceError,
}

impl FailureResource {
    pub fn new(link: Link, error: ResourceError) -> Self {
        Self { link, error }
    }

    /// A [`ResourceError::NotFound`] failure for `link`.
    pub fn not_found(link: Link) -> Self {
        let error = ResourceError::not_found(format!("No resource at `{}`", link.href));
        Self::new(link, error)
    }
}

impl Resource for FailureResource {
    fn link(&self) -> &Link {
        &self.link
    }

    fn length(&self) -> ResourceResult<u64> {
        Err(self.error.clone())
    }

    fn read(&self, _start: i64, _end: i64) -> ResourceResult<Vec<u8>> {
        Err(self.error.clone())
    }
}

/// A resource whose bytes are produced lazily by a loader, at most once.
///
/// ```
/// # use rpub::fetcher::{BytesResource, Resource};
/// # use rpub::manifest::Link;
/// let resource = BytesResource::new(Link::new("/hello.txt"), || Ok(b"hello world".to_vec()));
///
/// assert_eq!(11, resource.length().unwrap());
/// assert_eq!(b"world", resource.read(6, 99).unwrap().as_slice());
/// ```
pub struct BytesResource<F> {
    link: Link,
    loader: F,
    bytes: Memo<ResourceResult<Vec<u8>>>,
}

impl<F> BytesResource<F>
where
    F: Fn() -> ResourceResult<Vec<u8>> + SendAndSync,
{
    pub fn new(link: Link, loader: F) -> Self {
        Self {
            link,
            loader,
            bytes: Memo::new(),
        }
    }

    fn bytes(&self) -> ResourceResult<&Vec<u8>> {
        self.bytes.get_or_init(|| (self.loader)()).as_ref().map_err(Clone::clone)
    }
}

impl<F> Resource for BytesResource<F>
where
    F: Fn() -> ResourceResult<Vec<u8>> + SendAndSync,
{
    fn link(&self) -> &Link {
        &self.link
    }

    fn length(&self) -> ResourceResult<u64> {
        self.bytes().map(|bytes| bytes.len() as u64)
    }

    fn read(&self, start: i64, end: i64) -> ResourceResult<Vec<u8>> {
        let bytes = self.bytes()?;
        let range = archive::byte_range(start, end, bytes.len() as u64)
            .ok_or_else(|| range_error(start, end))?;

        Ok(bytes[range.start as usize..range.end as usize].to_vec())
    }
}

/// A resource backed by a file on the local file system.
///
/// The file is opened for each read, so no handle outlives a call.
#[derive(Debug)]
pub struct FileResource {
    link: Link,
    path: PathBuf,
}

impl FileResource {
    pub fn new(link: Link, path: impl Into<PathBuf>) -> Self {
        Self {
            link,
            path: path.into(),
        }
    }
}

impl Resource for FileResource {
    fn link(&self) -> &Link {
        &self.link
    }

    fn file(&self) -> Option<&Path> {
        Some(&self.path)
    }

    fn length(&self) -> ResourceResult<u64> {
        Ok(self.path.metadata()?.len())
    }

    fn read(&self, start: i64, end: i64) -> ResourceResult<Vec<u8>> {
        let mut data = Vec::new();
        self.stream(&mut data, start, end)?;
        Ok(data)
    }

    fn stream(&self, writer: &mut dyn Write, start: i64, end: i64) -> ResourceResult<u64> {
        let mut file = File::open(&self.path)?;
        let length = file.metadata()?.len();
        let range = archive::byte_range(start, end, length).ok_or_else(|| range_error(start, end))?;

        file.seek(SeekFrom::Start(range.start))?;
        Ok(io::copy(&mut file.take(range.end - range.start), writer)?)
    }
}

/// A resource backed by an archive [`Entry`].
///
/// Its link carries the `archive` properties of the entry.
#[derive(Debug)]
pub struct EntryResource {
    link: Link,
    entry: Entry,
}

impl EntryResource {
    pub fn new(mut link: Link, entry: Entry) -> Self {
        let archive = ArchiveProperties {
            entry_length: if entry.is_compressed() {
                entry.compressed_length()
            } else {
                entry.length()
            },
            is_entry_compressed: entry.is_compressed(),
        };
        link.properties.insert("archive", archive);
        Self { link, entry }
    }

    pub fn entry(&self) -> &Entry {
        &self.entry
    }
}

impl Resource for EntryResource {
    fn link(&self) -> &Link {
        &self.link
    }

    fn length(&self) -> ResourceResult<u64> {
        Ok(self.entry.length())
    }

    fn read(&self, start: i64, end: i64) -> ResourceResult<Vec<u8>> {
        Ok(self.entry.read(start, end)?)
    }

    fn stream(&self, writer: &mut dyn Write, start: i64, end: i64) -> ResourceResult<u64> {
        Ok(self.entry.stream(writer, start, end)?)
    }
}

/// A proxy transforming the entire content of another resource.
///
/// The transformed bytes are never retained,
/// so each read transforms the inner resource anew.
///
/// ```
/// # use rpub::fetcher::{BytesResource, Resource, TransformingResource};
/// # use rpub::manifest::Link;
/// let inner = BytesResource::new(Link::new("/a.txt"), || Ok(b"abc".to_vec()));
/// let upper = TransformingResource::new(Box::new(inner), |data: Vec<u8>| {
///     Ok(data.to_ascii_uppercase())
/// });
///
/// assert_eq!(b"BC", upper.read(1, 2).unwrap().as_slice());
/// ```
pub struct TransformingResource<F> {
    resource: BoxedResource,
    transform: F,
}

impl<F> TransformingResource<F>
where
    F: Fn(Vec<u8>) -> ResourceResult<Vec<u8>> + SendAndSync,
{
    pub fn new(resource: BoxedResource, transform: F) -> Self {
        Self { resource, transform }
    }

    fn transformed(&self) -> ResourceResult<Vec<u8>> {
        (self.transform)(self.resource.read(0, 0)?)
    }
}

impl<F> Resource for TransformingResource<F>
where
    F: Fn(Vec<u8>) -> ResourceResult<Vec<u8>> + SendAndSync,
{
    fn link(&self) -> &Link {
        self.resource.link()
    }

    fn file(&self) -> Option<&Path> {
        self.resource.file()
    }

    fn length(&self) -> ResourceResult<u64> {
        self.transformed().map(|data| data.len() as u64)
    }

    fn read(&self, start: i64, end: i64) -> ResourceResult<Vec<u8>> {
        if end < start {
            return Err(range_error(start, end));
        }
        slice(self.transformed()?, start, end)
    }

    fn close(&self) {
        self.resource.close();
    }
}

/// Adapts a [`Resource`] to [`Read`] and [`Seek`] using ranged reads.
///
/// ```
/// # use rpub::fetcher::{BytesResource, ResourceReadSeeker};
/// # use rpub::manifest::Link;
/// # use std::io::{Read, Seek, SeekFrom};
/// let resource = BytesResource::new(Link::new("/a.txt"), || Ok(b"0123456789".to_vec()));
/// let mut reader = ResourceReadSeeker::new(&resource);
/// let mut buffer = [0; 3];
///
/// reader.seek(SeekFrom::End(-4)).unwrap();
/// reader.read_exact(&mut buffer).unwrap();
/// assert_eq!(b"678", &buffer);
/// ```
pub struct ResourceReadSeeker<'a> {
    resource: &'a dyn Resource,
    position: u64,
}

impl<'a> ResourceReadSeeker<'a> {
    pub fn new(resource: &'a dyn Resource) -> Self {
        Self {
            resource,
            position: 0,
        }
    }
}

impl Read for ResourceReadSeeker<'_> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let length = self.resource.length().map_err(io::Error::other)?;
        if buf.is_empty() || self.position >= length {
            return Ok(0);
        }
        let end = (self.position + buf.len() as u64 - 1).min(length - 1);
        let data = self
            .resource
            .read(self.position as i64, end as i64)
            .map_err(io::Error::other)?;

        let count = data.len().min(buf.len());
        buf[..count].copy_from_slice(&data[..count]);
        self.position += count as u64;
        Ok(count)
    }
}

impl Seek for ResourceReadSeeker<'_> {
    fn seek(&mut self, position: SeekFrom) -> io::Result<u64> {
        let position = match position {
            SeekFrom::Start(offset) => Some(offset),
            SeekFrom::Current(offset) => self.position.checked_add_signed(offset),
            SeekFrom::End(offset) => {
                let length = self.resource.length().map_err(io::Error::other)?;
                length.checked_add_signed(offset)
            }
        };
        self.position = position.ok_or_else(|| {
            io::Error::new(io::ErrorKind::InvalidInput, "Seeking before the start of the resource")
        })?;
        Ok(self.position)
    }
}

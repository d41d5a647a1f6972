use crate::fetcher::{
    BoxedResource, FailureResource, Fetcher, FileResource, ResourceError, ResourceResult,
};
use crate::manifest::Link;
use crate::mediatype::MediaType;
use crate::util::uri;
use std::fs;
use std::path::{Path, PathBuf};

/// Provides access to files on the local file system.
///
/// Each href prefix maps to a file or directory.
/// A requested href must resolve to the mapped path or one of its descendants;
/// anything escaping it (e.g., `/book/../../etc/passwd`) is not found.
///
/// ```no_run
/// # use rpub::fetcher::{Fetcher, FileFetcher, Resource};
/// # use rpub::manifest::Link;
/// let fetcher = FileFetcher::new("/book", "unpacked/childrens-literature");
/// let opf = fetcher.get(&Link::new("/book/EPUB/package.opf"));
///
/// assert!(opf.read_as_xml().is_ok());
/// ```
#[derive(Clone, Debug, Default)]
pub struct FileFetcher {
    paths: Vec<(String, PathBuf)>,
}

impl FileFetcher {
    /// Maps a single `href` prefix to `path`.
    pub fn new(href: &str, path: impl Into<PathBuf>) -> Self {
        Self::default().with(href, path)
    }

    /// Adds a mapping from an `href` prefix to `path`.
    pub fn with(mut self, href: &str, path: impl Into<PathBuf>) -> Self {
        let href = format!("/{}", href.trim_matches('/'));
        self.paths.push((href, path.into()));
        self
    }

    /// The file at `href` under the mapping `(prefix, root)`, if any.
    fn resolve(href: &str, prefix: &str, root: &Path) -> Option<PathBuf> {
        let relative = if prefix == "/" {
            href.strip_prefix('/')?
        } else {
            match href.strip_prefix(prefix)? {
                "" => "",
                rest => rest.strip_prefix('/')?,
            }
        };

        // Normalized as a relative path so that escaping `..` segments are retained
        let relative = uri::normalize(relative);
        if relative == ".." || relative.starts_with("../") {
            log::debug!("Rejecting `{href}` escaping `{}`", root.display());
            return None;
        }

        let path = if relative.is_empty() {
            root.to_path_buf()
        } else {
            root.join(relative)
        };
        path.is_file().then_some(path)
    }
}

fn with_media_type(mut link: Link, path: &Path) -> Link {
    if link.r#type.is_none() {
        link.r#type = MediaType::of_file(path, &[], &[]).map(|media_type| media_type.to_string());
    }
    link
}

impl Fetcher for FileFetcher {
    fn links(&self) -> ResourceResult<Vec<Link>> {
        fn walk(links: &mut Vec<Link>, href: &str, path: &Path) -> ResourceResult<()> {
            if path.is_file() {
                links.push(with_media_type(Link::new(href), path));
                return Ok(());
            }

            let mut children = fs::read_dir(path)?
                .map(|entry| entry.map(|entry| entry.path()))
                .collect::<Result<Vec<_>, _>>()?;
            children.sort();

            for child in children {
                if let Some(name) = child.file_name().and_then(|name| name.to_str()) {
                    walk(links, &format!("{}/{name}", href.trim_end_matches('/')), &child)?;
                }
            }
            Ok(())
        }

        let mut links = Vec::new();
        for (href, path) in &self.paths {
            walk(&mut links, href, path)?;
        }
        Ok(links)
    }

    fn get(&self, link: &Link) -> BoxedResource {
        let href = super::resource_path(&link.href);
        let href = if href.starts_with('/') {
            href.to_owned()
        } else {
            format!("/{href}")
        };

        let path = self
            .paths
            .iter()
            .find_map(|(prefix, root)| Self::resolve(&href, prefix, root));

        match path {
            Some(path) => Box::new(FileResource::new(with_media_type(link.clone(), &path), path)),
            None => {
                log::debug!("No file for `{}`", link.href);
                Box::new(FailureResource::new(
                    link.clone(),
                    ResourceError::not_found(format!("No file at `{}`", link.href)),
                ))
            }
        }
    }
}

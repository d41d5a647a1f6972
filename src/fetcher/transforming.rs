use crate::fetcher::{BoxedResource, Fetcher, ResourceResult};
use crate::manifest::Link;
use crate::util::sync::SendAndSync;

/// Wraps a [`Resource`](super::Resource) into another, such as a font deobfuscator.
///
/// Any `Fn(BoxedResource) -> BoxedResource` is a transformer.
/// A transformer not applicable to a resource returns it as-is.
pub trait ResourceTransformer: SendAndSync {
    fn transform(&self, resource: BoxedResource) -> BoxedResource;
}

impl<F> ResourceTransformer for F
where
    F: Fn(BoxedResource) -> BoxedResource + SendAndSync,
{
    fn transform(&self, resource: BoxedResource) -> BoxedResource {
        self(resource)
    }
}

/// Applies [transformers](ResourceTransformer), in order, to the resources of another fetcher.
pub struct TransformingFetcher {
    fetcher: Box<dyn Fetcher>,
    transformers: Vec<Box<dyn ResourceTransformer>>,
}

impl TransformingFetcher {
    pub fn new(fetcher: Box<dyn Fetcher>, transformers: Vec<Box<dyn ResourceTransformer>>) -> Self {
        Self { fetcher, transformers }
    }
}

impl Fetcher for TransformingFetcher {
    fn links(&self) -> ResourceResult<Vec<Link>> {
        self.fetcher.links()
    }

    fn get(&self, link: &Link) -> BoxedResource {
        self.transformers
            .iter()
            .fold(self.fetcher.get(link), |resource, transformer| {
                transformer.transform(resource)
            })
    }

    fn close(&self) {
        self.fetcher.close();
    }
}

impl std::fmt::Debug for TransformingFetcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TransformingFetcher")
            .field("transformers", &self.transformers.len())
            .finish_non_exhaustive()
    }
}

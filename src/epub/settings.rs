use crate::epub::ReflowableStrategy;

/// Optional settings to parse an EPUB with.
///
/// ```
/// # use rpub::epub::{EpubSettings, ReflowableStrategy};
/// let settings = EpubSettings::builder()
///     .fallback_title("Untitled")
///     .positions_strategy(ReflowableStrategy::OriginalLength { page_length: 2048 })
///     .build();
///
/// assert_eq!("Untitled", settings.fallback_title);
/// assert!(settings.deobfuscate_fonts);
/// ```
#[derive(Clone, Debug, PartialEq)]
pub struct EpubSettings {
    /// The title used when the package document declares none,
    /// typically the file name of the publication.
    ///
    /// Default: `""`
    pub fallback_title: String,
    /// How reflowable resources are split into positions.
    ///
    /// Default: [`ReflowableStrategy::ArchiveEntryLength`] with pages of `1024` bytes.
    pub positions_strategy: ReflowableStrategy,
    /// Deobfuscate embedded fonts using the publication identifier.
    ///
    /// Default: `true`
    pub deobfuscate_fonts: bool,
    /// Serve media overlays (`.smil`) as guided navigation documents.
    ///
    /// Default: `true`
    pub media_overlays: bool,
    /// When set to `true`, a manifest `item` without an `href` is an error
    /// rather than being dropped.
    ///
    /// Default: `false`
    pub strict: bool,
}

impl EpubSettings {
    /// Returns a builder to create an [`EpubSettings`] instance.
    pub fn builder() -> EpubSettingsBuilder {
        EpubSettingsBuilder(Self::default())
    }
}

impl Default for EpubSettings {
    fn default() -> Self {
        Self {
            fallback_title: String::new(),
            positions_strategy: ReflowableStrategy::default(),
            deobfuscate_fonts: true,
            media_overlays: true,
            strict: false,
        }
    }
}

impl From<EpubSettingsBuilder> for EpubSettings {
    fn from(value: EpubSettingsBuilder) -> Self {
        value.build()
    }
}

/// Builder to construct an [`EpubSettings`] instance.
#[derive(Clone, Debug)]
pub struct EpubSettingsBuilder(EpubSettings);

impl EpubSettingsBuilder {
    /// Turn this builder into an [`EpubSettings`] instance.
    pub fn build(self) -> EpubSettings {
        self.0
    }

    /// See [`EpubSettings::fallback_title`].
    pub fn fallback_title(mut self, title: impl Into<String>) -> Self {
        self.0.fallback_title = title.into();
        self
    }

    /// See [`EpubSettings::positions_strategy`].
    pub fn positions_strategy(mut self, strategy: ReflowableStrategy) -> Self {
        self.0.positions_strategy = strategy;
        self
    }

    /// See [`EpubSettings::deobfuscate_fonts`].
    pub fn deobfuscate_fonts(mut self, deobfuscate: bool) -> Self {
        self.0.deobfuscate_fonts = deobfuscate;
        self
    }

    /// See [`EpubSettings::media_overlays`].
    pub fn media_overlays(mut self, media_overlays: bool) -> Self {
        self.0.media_overlays = media_overlays;
        self
    }

    /// See [`EpubSettings::strict`].
    pub fn strict(mut self, strict: bool) -> Self {
        self.0.strict = strict;
        self
    }
}

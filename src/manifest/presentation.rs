use crate::manifest::{Link, keywords};
use serde::{Deserialize, Serialize};

keywords! {
    /// How a content should be laid out within the viewport.
    #[derive(Default)]
    Fit {
        /// Fit to the viewport width.
        Width => "width",
        /// Fit to the viewport height.
        Height => "height",
        /// Fit entirely within the viewport.
        #[default]
        Contain => "contain",
        /// Cover the entire viewport.
        Cover => "cover",
    }
}

keywords! {
    /// The suggested orientation for a device.
    #[derive(Default)]
    Orientation {
        #[default]
        Auto => "auto",
        Landscape => "landscape",
        Portrait => "portrait",
    }
}

keywords! {
    /// Whether content is paginated or scrolled.
    #[derive(Default)]
    Overflow {
        #[default]
        Auto => "auto",
        Paginated => "paginated",
        Scrolled => "scrolled",
    }
}

keywords! {
    /// The side of a spread a resource is displayed on.
    Page {
        Left => "left",
        Right => "right",
        Center => "center",
    }
}

keywords! {
    /// When synthetic spreads are displayed.
    #[derive(Default)]
    Spread {
        /// Left to the reading system.
        #[default]
        Auto => "auto",
        /// In both landscape and portrait orientations.
        Both => "both",
        /// Never.
        None => "none",
        /// Only in landscape orientation.
        Landscape => "landscape",
    }
}

keywords! {
    /// The layout of an EPUB resource.
    Layout {
        Fixed => "fixed",
        Reflowable => "reflowable",
    }
}

/// Rendering hints of a publication.
///
/// Fields equal to their default value are omitted when serialized.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Presentation {
    /// Whether the content is clipped to its declared dimensions.
    #[serde(skip_serializing_if = "is_false")]
    pub clipped: bool,
    /// Whether the transition between resources is continuous.
    #[serde(skip_serializing_if = "is_false")]
    pub continuous: bool,
    #[serde(skip_serializing_if = "is_default")]
    pub fit: Fit,
    #[serde(skip_serializing_if = "is_default")]
    pub orientation: Orientation,
    #[serde(skip_serializing_if = "is_default")]
    pub overflow: Overflow,
    #[serde(skip_serializing_if = "is_default")]
    pub spread: Spread,
    /// The EPUB layout, when the publication is an EPUB.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub layout: Option<Layout>,
}

impl Presentation {
    /// The layout of the resource behind `link`.
    ///
    /// The link's own `layout` property takes precedence over the publication's.
    /// Defaults to [`Layout::Reflowable`].
    pub fn layout_of(&self, link: &Link) -> Layout {
        link.properties
            .layout()
            .or(self.layout)
            .unwrap_or(Layout::Reflowable)
    }

    /// Returns `true` if every field holds its default value.
    pub fn is_default(&self) -> bool {
        *self == Self::default()
    }
}

fn is_false(value: &bool) -> bool {
    !*value
}

fn is_default<T: Default + PartialEq>(value: &T) -> bool {
    *value == T::default()
}

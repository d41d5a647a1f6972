use crate::epub::consts::{APPLE_DISPLAY_OPTIONS, KOBO_DISPLAY_OPTIONS};
use crate::epub::parser::EpubParser;
use std::collections::HashMap;

impl EpubParser<'_> {
    /// Parses the iBooks display options, falling back to the Kobo ones.
    ///
    /// ```xml
    /// <display_options>
    ///   <platform name="*">
    ///     <option name="fixed-layout">true</option>
    ///   </platform>
    /// </display_options>
    /// ```
    pub(super) fn parse_display_options(&self) -> HashMap<String, String> {
        [APPLE_DISPLAY_OPTIONS, KOBO_DISPLAY_OPTIONS]
            .into_iter()
            .find_map(|path| {
                let document = self.read_xml(path).ok()?;
                let root = document.root();
                // Display options are not namespaced
                let options = root
                    .elements()
                    .filter(|platform| platform.local_name() == "platform")
                    .flat_map(|platform| platform.elements())
                    .filter(|option| option.local_name() == "option")
                    .filter_map(|option| {
                        let name = option.attribute("name")?;
                        Some((name.to_owned(), option.text().trim().to_owned()))
                    })
                    .collect();
                Some(options)
            })
            .unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use crate::epub::consts::{APPLE_DISPLAY_OPTIONS, KOBO_DISPLAY_OPTIONS};
    use crate::epub::parser::tests::MemoryFetcher;
    use crate::epub::{EpubParser, EpubSettings};

    const OPTIONS: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
        <display_options>
          <platform name="*">
            <option name="fixed-layout">true</option>
            <option name="open-to-spread"> false </option>
          </platform>
        </display_options>"#;

    #[test]
    fn test_display_options() {
        let settings = EpubSettings::default();

        for path in [APPLE_DISPLAY_OPTIONS, KOBO_DISPLAY_OPTIONS] {
            let fetcher = MemoryFetcher::default().with(path, OPTIONS);
            let options = EpubParser::new(&settings, &fetcher).parse_display_options();

            assert_eq!(Some("true"), options.get("fixed-layout").map(String::as_str));
            assert_eq!(Some("false"), options.get("open-to-spread").map(String::as_str));
        }

        let fetcher = MemoryFetcher::default();
        assert!(EpubParser::new(&settings, &fetcher).parse_display_options().is_empty());
    }
}

pub(crate) trait StrExt {
    /// Trims and replaces each run of whitespace with a single space.
    fn collapse_whitespace(&self) -> String;

    /// Returns [`None`] if the value is empty after trimming.
    fn non_blank(&self) -> Option<&str>;
}

impl StrExt for str {
    fn collapse_whitespace(&self) -> String {
        let mut collapsed = String::with_capacity(self.len());

        for word in self.split_whitespace() {
            if !collapsed.is_empty() {
                collapsed.push(' ');
            }
            collapsed.push_str(word);
        }
        collapsed
    }

    fn non_blank(&self) -> Option<&str> {
        let trimmed = self.trim();
        (!trimmed.is_empty()).then_some(trimmed)
    }
}

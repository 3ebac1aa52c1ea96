use itertools::Itertools;

pub const DEFAULT_CHARS_PER_PAGE: usize = 500;

/// Split a source text into its title (first line) and body (third line onward).
///
/// The second line is the blank separator written by `ExtractedText::compose`,
/// so it never belongs to either part.
pub fn split_title_body(source: &str) -> (&str, String) {
    let mut lines = source.split('\n');
    let title = lines.next().unwrap_or_default();
    let body = lines.skip(1).join("\n");
    (title, body)
}

/// Ordered typing targets: page 0 is the title, the rest is the body cut
/// into fixed windows of `chars_per_page` characters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Pages {
    pages: Vec<String>,
}

impl Pages {
    pub fn paginate(source: &str, chars_per_page: usize) -> Self {
        let (title, body) = split_title_body(source);
        let window = chars_per_page.max(1);

        let mut pages = vec![title.to_string()];
        pages.extend(
            body.chars()
                .chunks(window)
                .into_iter()
                .map(|chunk| chunk.collect::<String>()),
        );

        Self { pages }
    }

    pub fn get(&self, idx: usize) -> Option<&str> {
        self.pages.get(idx).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.pages.len()
    }

    /// Always false; a paginated text has at least its title page.
    pub fn is_empty(&self) -> bool {
        self.pages.is_empty()
    }

    pub fn title(&self) -> &str {
        &self.pages[0]
    }

    pub fn body_pages(&self) -> &[String] {
        &self.pages[1..]
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.pages.iter().map(String::as_str)
    }
}

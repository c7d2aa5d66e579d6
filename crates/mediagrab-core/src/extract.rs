//! `<img>` extraction from page HTML.
//!
//! Produces one [`ImageElement`] per `<img>` tag with the three attribute
//! sources a page may use for the image location.

use scraper::{Html, Selector};

/// Attribute sources of one `<img>` element.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ImageElement {
    /// `data-lazy-src`: lazy-loading plugins put the real image here.
    pub lazy_src: Option<String>,
    /// `data-src`: deferred loading.
    pub deferred_src: Option<String>,
    /// `src`: often a placeholder when either of the above is set.
    pub src: Option<String>,
}

impl ImageElement {
    /// Element with only a plain `src`.
    pub fn with_src(src: &str) -> Self {
        Self {
            src: Some(src.to_string()),
            ..Default::default()
        }
    }

    /// The single reference admitted for this element: first non-blank of
    /// lazy-load, deferred-load, plain source.
    pub fn candidate(&self) -> Option<&str> {
        [&self.lazy_src, &self.deferred_src, &self.src]
            .into_iter()
            .filter_map(|a| a.as_deref())
            .find(|v| !v.trim().is_empty())
    }
}

/// Collects every `<img>` element in `html`.
pub fn extract_image_elements(html: &str) -> Vec<ImageElement> {
    let doc = Html::parse_document(html);
    let selector = match Selector::parse("img") {
        Ok(sel) => sel,
        Err(_) => return Vec::new(),
    };
    doc.select(&selector)
        .map(|el| {
            let attr = |name: &str| el.value().attr(name).map(str::to_string);
            ImageElement {
                lazy_src: attr("data-lazy-src"),
                deferred_src: attr("data-src"),
                src: attr("src"),
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extracts_all_three_attributes() {
        let html = r#"<html><body>
            <img src="/placeholder.gif" data-src="/real.jpg" data-lazy-src="/lazy.jpg">
            <img src="plain.png">
            <p>no image</p>
        </body></html>"#;
        let els = extract_image_elements(html);
        assert_eq!(els.len(), 2);
        assert_eq!(els[0].lazy_src.as_deref(), Some("/lazy.jpg"));
        assert_eq!(els[0].deferred_src.as_deref(), Some("/real.jpg"));
        assert_eq!(els[0].src.as_deref(), Some("/placeholder.gif"));
        assert_eq!(els[1], ImageElement::with_src("plain.png"));
    }

    #[test]
    fn candidate_precedence() {
        let all = ImageElement {
            lazy_src: Some("lazy.jpg".into()),
            deferred_src: Some("deferred.jpg".into()),
            src: Some("plain.jpg".into()),
        };
        assert_eq!(all.candidate(), Some("lazy.jpg"));

        let no_lazy = ImageElement {
            lazy_src: None,
            deferred_src: Some("deferred.jpg".into()),
            src: Some("plain.jpg".into()),
        };
        assert_eq!(no_lazy.candidate(), Some("deferred.jpg"));

        assert_eq!(ImageElement::with_src("plain.jpg").candidate(), Some("plain.jpg"));
    }

    #[test]
    fn blank_attribute_falls_through() {
        let el = ImageElement {
            lazy_src: Some("".into()),
            deferred_src: Some("  ".into()),
            src: Some("plain.jpg".into()),
        };
        assert_eq!(el.candidate(), Some("plain.jpg"));
        assert_eq!(ImageElement::default().candidate(), None);
    }

    #[test]
    fn no_images() {
        assert!(extract_image_elements("<p>text only</p>").is_empty());
        assert!(extract_image_elements("").is_empty());
    }
}

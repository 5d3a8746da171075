use scout_core::error::AppError;
use scout_core::scrape::EXTRACTION_ERROR_TEXT;
use scout_core::traits::Cleaner;
use scraper::{ElementRef, Html, Selector};

/// Elements that never contribute text.
const NOISE: &str = "script, style, nav, footer, iframe";

/// Main-content probes, highest priority first.
const CONTENT_PROBES: [&str; 7] = [
    "main",
    "article",
    "[role=\"main\"]",
    "#content",
    ".content",
    "#main",
    ".main",
];

/// Blocks whose text makes up the extracted content.
const TEXT_BLOCKS: &str = "p, h1, h2, h3, h4, h5, h6, li";

/// Main-content extractor built on the `scraper` HTML parser.
///
/// Drops scripting, styling, navigation, footers and frames, picks the
/// main content region and renders its paragraphs, headings and list
/// items as plain text separated by blank lines.
#[derive(Debug, Clone, Copy, Default)]
pub struct MainContentCleaner;

impl MainContentCleaner {
    pub fn new() -> Self {
        Self
    }
}

impl Cleaner for MainContentCleaner {
    fn clean(&self, html: &str) -> Result<String, AppError> {
        let mut document = Html::parse_document(html);
        strip_noise(&mut document)?;

        let region = content_region(&document)?;
        let blocks = selector(TEXT_BLOCKS)?;

        let mut text = String::new();
        for block in region.select(&blocks) {
            text.push_str(block.text().collect::<String>().trim());
            text.push_str("\n\n");
        }

        Ok(text.trim().to_string())
    }
}

/// Extract the main content of `html`, falling back to the fixed error
/// text instead of failing.
pub fn extract_main_content(html: &str) -> String {
    MainContentCleaner.clean(html).unwrap_or_else(|e| {
        tracing::error!(error = %e, "Error extracting content");
        EXTRACTION_ERROR_TEXT.to_string()
    })
}

fn selector(css: &str) -> Result<Selector, AppError> {
    Selector::parse(css).map_err(|e| AppError::CleanerError(format!("bad selector '{css}': {e}")))
}

fn strip_noise(document: &mut Html) -> Result<(), AppError> {
    let noise = selector(NOISE)?;
    let ids: Vec<_> = document.select(&noise).map(|el| el.id()).collect();
    for id in ids {
        if let Some(mut node) = document.tree.get_mut(id) {
            node.detach();
        }
    }
    Ok(())
}

/// First probe with a match wins, then `<body>`, then the whole document.
///
/// Probes walk down from the root element so detached noise subtrees,
/// which stay in the node arena, are never matched.
fn content_region(document: &Html) -> Result<ElementRef<'_>, AppError> {
    let root = document.root_element();
    for probe in CONTENT_PROBES {
        if let Some(region) = root.select(&selector(probe)?).next() {
            return Ok(region);
        }
    }

    let body = selector("body")?;
    Ok(root.select(&body).next().unwrap_or(root))
}

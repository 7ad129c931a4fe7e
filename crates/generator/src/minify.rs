use crate::engine::RenderError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MinifyOptions {
    pub remove_comments: bool,
    pub minify_css: bool,
    pub minify_js: bool,
}

impl Default for MinifyOptions {
    fn default() -> Self {
        Self {
            remove_comments: true,
            minify_css: true,
            minify_js: true,
        }
    }
}

pub trait Minifier {
    fn minify(&self, markup: &str, options: &MinifyOptions) -> Result<String, RenderError>;
}

/// `minify_html` with closing tags and the `html`/`head` opening tags kept.
#[derive(Debug, Clone, Copy, Default)]
pub struct HtmlMinifier;

impl HtmlMinifier {
    fn cfg(options: &MinifyOptions) -> minify_html::Cfg {
        let mut cfg = minify_html::Cfg::new();
        cfg.keep_closing_tags = true;
        cfg.keep_html_and_head_opening_tags = true;
        cfg.keep_comments = !options.remove_comments;
        cfg.minify_css = options.minify_css;
        cfg.minify_js = options.minify_js;
        cfg
    }
}

impl Minifier for HtmlMinifier {
    fn minify(&self, markup: &str, options: &MinifyOptions) -> Result<String, RenderError> {
        let bytes = minify_html::minify(markup.as_bytes(), &Self::cfg(options));
        String::from_utf8(bytes).map_err(|e| RenderError::Minify(e.to_string()))
    }
}

use std::path::PathBuf;

/// Everything a site build needs to know, gathered from the command line and
/// the environment.
#[derive(Debug, Clone)]
pub(crate) struct Context {
    /// Holds `pages/` and optionally `assets/` and `images/`.
    pub source_dir: PathBuf,
    /// Existing contents will be removed.
    pub out_dir: PathBuf,
    pub template_path: PathBuf,

    pub base_url: Option<String>,
    pub search_index: bool,
    pub sitemap: bool,
}

impl Context {
    pub fn pages_dir(&self) -> PathBuf {
        self.source_dir.join("pages")
    }

    /// Directories copied verbatim into the output.
    pub fn static_dirs(&self) -> [PathBuf; 2] {
        [self.source_dir.join("assets"), self.source_dir.join("images")]
    }
}

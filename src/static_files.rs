use minijinja::Environment;
use serde_json::Value as JsonValue;
use std::fs;
use std::io;
use std::path::{Component, Path, PathBuf};

/// Files served from one directory, with HTML optionally rendered as a
/// `minijinja` template.
#[derive(Debug, Clone)]
pub struct StaticFiles {
    base_dir: PathBuf,
}

impl StaticFiles {
    pub fn new<P: Into<PathBuf>>(base: P) -> Self {
        Self {
            base_dir: base.into(),
        }
    }

    #[must_use]
    pub fn base_dir(&self) -> &Path {
        &self.base_dir
    }

    /// Map a URL path below `base_dir`; `None` for anything that would escape it.
    fn map_path(&self, url_path: &str) -> Option<PathBuf> {
        let mut pb = self.base_dir.clone();
        for comp in Path::new(url_path.trim_start_matches('/')).components() {
            match comp {
                Component::Normal(s) => pb.push(s),
                Component::CurDir => {}
                _ => return None,
            }
        }
        Some(pb)
    }

    fn content_type(path: &Path) -> &'static str {
        let ext = path
            .extension()
            .and_then(|s| s.to_str())
            .unwrap_or_default()
            .to_ascii_lowercase();
        match ext.as_str() {
            "html" => "text/html; charset=utf-8",
            "md" => "text/markdown; charset=utf-8",
            "css" => "text/css",
            "js" => "application/javascript",
            "json" => "application/json",
            "txt" => "text/plain; charset=utf-8",
            "svg" => "image/svg+xml",
            "png" => "image/png",
            _ => "application/octet-stream",
        }
    }

    /// Read `url_path`, rendering `.html` through `ctx` when one is given.
    ///
    /// # Errors
    ///
    /// `NotFound` for missing files and traversal attempts, `InvalidData` for
    /// template errors, otherwise the underlying read error.
    pub fn load(
        &self,
        url_path: &str,
        ctx: Option<&JsonValue>,
    ) -> io::Result<(Vec<u8>, &'static str)> {
        let path = self
            .map_path(url_path)
            .ok_or_else(|| io::Error::new(io::ErrorKind::NotFound, "invalid path"))?;
        if !path.is_file() {
            return Err(io::Error::new(io::ErrorKind::NotFound, "file not found"));
        }
        let content_type = Self::content_type(&path);
        match ctx {
            Some(ctx) if path.extension().and_then(|s| s.to_str()) == Some("html") => {
                let source = fs::read_to_string(&path)?;
                let rendered = render(&source, ctx)
                    .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;
                Ok((rendered.into_bytes(), content_type))
            }
            _ => Ok((fs::read(&path)?, content_type)),
        }
    }
}

fn render(source: &str, ctx: &JsonValue) -> Result<String, minijinja::Error> {
    let mut env = Environment::new();
    env.add_template("page", source)?;
    env.get_template("page")?.render(ctx)
}

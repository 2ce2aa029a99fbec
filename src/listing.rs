//! HTML listings for directories that have no `index.html`.
//!
//! [`ServeDir`](tower_http::services::ServeDir) answers 404 for such
//! directories; it is configured to hand those requests to
//! [`list_directory`] instead.

use std::{
    path::{Component, Path, PathBuf},
    sync::Arc,
};

use axum::{
    extract::State,
    http::{StatusCode, Uri},
    response::{Html, IntoResponse, Response},
};
use percent_encoding::{AsciiSet, NON_ALPHANUMERIC, percent_decode_str, utf8_percent_encode};
use tokio::fs;
use tracing::{debug, warn};

/// Characters left unescaped in listing links.
const HREF: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'~')
    .remove(b'/');

/// A single row of a directory listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Entry {
    pub name: String,
    pub is_dir: bool,
    pub is_symlink: bool,
}

impl Entry {
    fn display_name(&self) -> String {
        match (self.is_dir, self.is_symlink) {
            (_, true) => format!("{}@", self.name),
            (true, false) => format!("{}/", self.name),
            (false, false) => self.name.clone(),
        }
    }

    fn link(&self) -> String {
        if self.is_dir {
            format!("{}/", self.name)
        } else {
            self.name.clone()
        }
    }
}

/// Fallback handler: lists the directory the request path points at, or
/// answers 404 when there is none.
pub async fn list_directory(State(root): State<Arc<Path>>, uri: Uri) -> Response {
    let request_path = uri.path();
    let Some(dir) = resolve(&root, request_path) else {
        debug!(path = request_path, "rejected request path");
        return not_found();
    };

    match fs::metadata(&dir).await {
        Ok(meta) if meta.is_dir() => {}
        _ => return not_found(),
    }

    match read_entries(&dir).await {
        Ok(entries) => {
            let title = percent_decode_str(request_path).decode_utf8_lossy();
            Html(render(&title, &entries)).into_response()
        }
        Err(err) => {
            warn!(dir = %dir.display(), %err, "cannot list directory");
            (StatusCode::NOT_FOUND, "No permission to list directory").into_response()
        }
    }
}

/// Maps a percent-encoded URL path onto `root`.
///
/// Returns `None` for anything that could leave `root`: `..` segments,
/// embedded separators, or prefixes such as drive letters.
pub fn resolve(root: &Path, request_path: &str) -> Option<PathBuf> {
    let decoded = percent_decode_str(request_path).decode_utf8().ok()?;
    let mut path = root.to_path_buf();

    for segment in decoded.split('/') {
        if segment.is_empty() || segment == "." {
            continue;
        }
        if segment.contains('\\') {
            return None;
        }
        let mut components = Path::new(segment).components();
        match (components.next(), components.next()) {
            (Some(Component::Normal(part)), None) => path.push(part),
            _ => return None,
        }
    }

    Some(path)
}

/// Reads `dir` and returns its entries sorted case-insensitively.
pub async fn read_entries(dir: &Path) -> std::io::Result<Vec<Entry>> {
    let mut reader = fs::read_dir(dir).await?;
    let mut entries = Vec::new();

    while let Some(entry) = reader.next_entry().await? {
        let is_symlink = entry
            .file_type()
            .await
            .map(|t| t.is_symlink())
            .unwrap_or(false);
        // Follows symlinks, so a link to a directory is listed as one.
        let is_dir = fs::metadata(entry.path())
            .await
            .map(|m| m.is_dir())
            .unwrap_or(false);
        entries.push(Entry {
            name: entry.file_name().to_string_lossy().into_owned(),
            is_dir,
            is_symlink,
        });
    }

    entries.sort_by_key(|e| e.name.to_lowercase());
    Ok(entries)
}

/// Renders the listing page for the URL path `title`.
pub fn render(title: &str, entries: &[Entry]) -> String {
    let title = escape(title);
    let mut html = format!(
        "<!DOCTYPE HTML>\n<html lang=\"en\">\n<head>\n<meta charset=\"utf-8\">\n\
         <title>Directory listing for {title}</title>\n</head>\n<body>\n\
         <h1>Directory listing for {title}</h1>\n<hr>\n<ul>\n"
    );
    let rows: String = entries
        .iter()
        .map(|entry| {
            format!(
                "<li><a href=\"{}\">{}</a></li>\n",
                utf8_percent_encode(&entry.link(), HREF),
                escape(&entry.display_name())
            )
        })
        .collect();
    html.push_str(&rows);
    html.push_str("</ul>\n<hr>\n</body>\n</html>\n");
    html
}

fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#x27;"),
            _ => out.push(c),
        }
    }
    out
}

fn not_found() -> Response {
    (StatusCode::NOT_FOUND, "File not found").into_response()
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::to_bytes;
    use tempfile::TempDir;

    fn file(name: &str) -> Entry {
        Entry {
            name: name.to_string(),
            is_dir: false,
            is_symlink: false,
        }
    }

    #[test]
    fn test_resolve_joins_segments() {
        let root = Path::new("/srv/site");
        assert_eq!(
            resolve(root, "/assets/css/"),
            Some(PathBuf::from("/srv/site/assets/css"))
        );
    }

    #[test]
    fn test_resolve_decodes_percent_escapes() {
        let root = Path::new("/srv/site");
        assert_eq!(
            resolve(root, "/my%20files/"),
            Some(PathBuf::from("/srv/site/my files"))
        );
    }

    #[test]
    fn test_resolve_rejects_parent_segments() {
        let root = Path::new("/srv/site");
        assert_eq!(resolve(root, "/../etc/"), None);
        assert_eq!(resolve(root, "/a/%2e%2e/%2e%2e/"), None);
    }

    #[test]
    fn test_resolve_rejects_backslash() {
        assert_eq!(resolve(Path::new("/srv"), "/a%5c..%5c/"), None);
    }

    #[test]
    fn test_resolve_root() {
        assert_eq!(resolve(Path::new("/srv"), "/"), Some(PathBuf::from("/srv")));
    }

    #[test]
    fn test_render_marks_directories_and_links() {
        let entries = vec![
            Entry {
                name: "css".to_string(),
                is_dir: true,
                is_symlink: false,
            },
            Entry {
                name: "latest".to_string(),
                is_dir: false,
                is_symlink: true,
            },
        ];
        let html = render("/", &entries);
        assert!(html.contains("<title>Directory listing for /</title>"));
        assert!(html.contains("<li><a href=\"css/\">css/</a></li>"));
        assert!(html.contains("<li><a href=\"latest\">latest@</a></li>"));
    }

    #[test]
    fn test_render_escapes_names() {
        let html = render("/<x>/", &[file("a&b <c>.txt")]);
        assert!(html.contains("Directory listing for /&lt;x&gt;/"));
        assert!(html.contains("href=\"a%26b%20%3Cc%3E.txt\""));
        assert!(html.contains(">a&amp;b &lt;c&gt;.txt</a>"));
    }

    #[tokio::test]
    async fn test_read_entries_sorted_case_insensitively() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("b.txt"), "").unwrap();
        std::fs::write(dir.path().join("A.txt"), "").unwrap();
        std::fs::create_dir(dir.path().join("c")).unwrap();

        let entries = read_entries(dir.path()).await.unwrap();
        let names: Vec<_> = entries.iter().map(|e| e.name.as_str()).collect();
        assert_eq!(names, ["A.txt", "b.txt", "c"]);
        assert!(entries[2].is_dir);
    }

    #[tokio::test]
    async fn test_list_directory_missing_is_not_found() {
        let dir = TempDir::new().unwrap();
        let root: Arc<Path> = Arc::from(dir.path());
        let response = list_directory(State(root), Uri::from_static("/nope/")).await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_list_directory_renders_entries() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("notes.txt"), "x").unwrap();
        let root: Arc<Path> = Arc::from(dir.path());

        let response = list_directory(State(root), Uri::from_static("/")).await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            response.headers()["content-type"],
            "text/html; charset=utf-8"
        );
        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body = String::from_utf8(body.to_vec()).unwrap();
        assert!(body.contains("<a href=\"notes.txt\">notes.txt</a>"));
    }
}

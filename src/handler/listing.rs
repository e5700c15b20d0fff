//! Directory listing
//!
//! Renders the immediate children of a directory as an HTML table.

use super::path::escape_html;
use std::fmt::Write;
use std::path::Path;
use tokio::fs;

/// One child of a listed directory
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListingEntry {
    pub name: String,
    pub is_dir: bool,
    /// Size in bytes; `None` for directories
    pub size: Option<u64>,
}

/// Read the children of `dir`, sorted by name
///
/// Entries whose names are not valid UTF-8 are skipped: they could not be
/// requested back through a URL anyway.
pub async fn read_entries(dir: &Path) -> std::io::Result<Vec<ListingEntry>> {
    let mut reader = fs::read_dir(dir).await?;
    let mut entries = Vec::new();

    while let Some(entry) = reader.next_entry().await? {
        let Ok(name) = entry.file_name().into_string() else {
            continue;
        };
        // Follow symlinks for the type and size shown; dangling links show as files
        let metadata = match fs::metadata(entry.path()).await {
            Ok(m) => Some(m),
            Err(_) => entry.metadata().await.ok(),
        };
        let is_dir = metadata.as_ref().is_some_and(std::fs::Metadata::is_dir);
        let size = if is_dir {
            None
        } else {
            metadata.as_ref().map(std::fs::Metadata::len)
        };
        entries.push(ListingEntry { name, is_dir, size });
    }

    entries.sort_by(|a, b| a.name.cmp(&b.name));
    Ok(entries)
}

/// Render the listing page for `url_path` (a cleaned path ending in `/`)
pub fn render(url_path: &str, entries: &[ListingEntry]) -> String {
    let title = escape_html(url_path);
    let mut html = String::with_capacity(512 + entries.len() * 96);

    let _ = write!(
        html,
        "<!doctype html>\n<html>\n<head>\n<meta charset=\"utf-8\">\n\
         <meta name=\"viewport\" content=\"width=device-width\">\n\
         <title>Index of {title}</title>\n</head>\n<body>\n\
         <h1>Index of {title}</h1>\n<table>\n\
         <tr><th>Name</th><th>Size</th></tr>\n"
    );

    if url_path != "/" {
        html.push_str("<tr><td><a href=\"../\">../</a></td><td>-</td></tr>\n");
    }

    for entry in entries {
        let suffix = if entry.is_dir { "/" } else { "" };
        // "./" keeps names like "a:b" from being read as a URL scheme
        let href = format!("./{}{suffix}", urlencoding::encode(&entry.name));
        let size = entry
            .size
            .map_or_else(|| "-".to_string(), |s| s.to_string());
        let _ = writeln!(
            html,
            "<tr><td><a href=\"{}\">{}{suffix}</a></td><td>{size}</td></tr>",
            escape_html(&href),
            escape_html(&entry.name),
        );
    }

    html.push_str("</table>\n</body>\n</html>\n");
    html
}

#[cfg(test)]
mod tests {
    use super::*;

    fn file(name: &str, size: u64) -> ListingEntry {
        ListingEntry {
            name: name.to_string(),
            is_dir: false,
            size: Some(size),
        }
    }

    #[test]
    fn test_render_lists_children() {
        let entries = vec![
            file("a.txt", 5),
            ListingEntry {
                name: "docs".to_string(),
                is_dir: true,
                size: None,
            },
        ];
        let html = render("/", &entries);
        assert!(html.contains("<title>Index of /</title>"));
        assert!(html.contains("<a href=\"./a.txt\">a.txt</a></td><td>5</td>"));
        assert!(html.contains("<a href=\"./docs/\">docs/</a></td><td>-</td>"));
        assert!(!html.contains("../"));
    }

    #[test]
    fn test_render_parent_link_below_root() {
        let html = render("/sub/", &[]);
        assert!(html.contains("<a href=\"../\">../</a>"));
    }

    #[test]
    fn test_render_escapes_names() {
        let html = render("/", &[file("<b>&x y.txt", 1)]);
        assert!(html.contains("href=\"./%3Cb%3E%26x%20y.txt\""));
        assert!(html.contains(">&lt;b&gt;&amp;x y.txt</a>"));
    }

    #[tokio::test]
    async fn test_read_entries_sorted() {
        let tmp = tempfile::TempDir::new().unwrap();
        let dir = tmp.path();
        std::fs::create_dir(dir.join("zeta")).unwrap();
        std::fs::write(dir.join("beta.txt"), b"12345").unwrap();
        std::fs::write(dir.join("alpha.txt"), b"1").unwrap();

        let entries = read_entries(dir).await.unwrap();
        let names: Vec<&str> = entries.iter().map(|e| e.name.as_str()).collect();
        assert_eq!(names, vec!["alpha.txt", "beta.txt", "zeta"]);
        assert_eq!(entries[1].size, Some(5));
        assert!(entries[2].is_dir);
        assert_eq!(entries[2].size, None);
    }
}

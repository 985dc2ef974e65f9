//! Extension helpers for file names and URL paths.

/// Lowercased extension of a file name, with the leading dot (`"x.GP5"` -> `".gp5"`).
/// Dotfiles (`".hidden"`) and names ending in a dot have no extension.
pub fn extension_of(filename: &str) -> Option<String> {
    let name = filename.rsplit(['/', '\\']).next()?;
    let (stem, ext) = name.rsplit_once('.')?;
    if stem.is_empty() || ext.is_empty() {
        return None;
    }
    Some(format!(".{}", ext.to_ascii_lowercase()))
}

/// Extension of the last path segment of `url`, ignoring query and fragment.
pub fn url_path_extension(url: &str) -> Option<String> {
    let parsed = url::Url::parse(url).ok()?;
    let segment = parsed.path_segments()?.filter(|s| !s.is_empty()).last()?;
    extension_of(segment)
}

/// Sanitize a browser-suggested filename for the local filesystem,
/// preserving the extension so format dispatch still works.
pub fn sanitize_filename(suggested: &str) -> String {
    let mut name: String = suggested
        .chars()
        .map(|c| match c {
            '/' | '\\' | ':' | '?' | '&' | '=' | '#' | '%' | '*' | '"' | '<' | '>' | '|' => '_',
            c if c.is_control() => '_',
            c => c,
        })
        .collect();

    if name.is_empty() {
        name = "download".to_string();
    }

    // Limit filename length, keeping the extension intact.
    if name.len() > 100 {
        let extension = name
            .rsplit_once('.')
            .map(|(_, ext)| format!(".{ext}"))
            .unwrap_or_default();
        let keep = 100usize.saturating_sub(extension.len());
        let stem: String = name.chars().take(keep).collect();
        name = format!("{stem}{extension}");
    }

    name
}

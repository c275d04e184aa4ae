use std::path::Path;

/// Content-type tag for a file, using the identifiers editors commonly report
/// (`rust`, `typescript`, `markdown`, ...). Unknown extensions are `plaintext`.
pub fn language_for_path(path: &Path) -> &'static str {
    let extension = path
        .extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.to_ascii_lowercase());

    match extension.as_deref() {
        Some("html" | "htm") => "html",
        Some("php") => "php",
        Some("vue") => "vue",
        Some("js" | "mjs" | "cjs" | "jsx") => "javascript",
        Some("ts" | "mts" | "cts" | "tsx") => "typescript",
        Some("py" | "pyw") => "python",
        Some("java") => "java",
        Some("cs") => "csharp",
        Some("cpp" | "cc" | "cxx" | "hpp" | "hh" | "hxx") => "cpp",
        Some("c" | "h") => "c",
        Some("css") => "css",
        Some("scss") => "scss",
        Some("rb") => "ruby",
        Some("go") => "go",
        Some("rs") => "rust",
        Some("json") => "json",
        Some("yaml" | "yml") => "yaml",
        Some("md" | "markdown") => "markdown",
        Some("toml") => "toml",
        Some("sh" | "bash") => "shellscript",
        _ => "plaintext",
    }
}

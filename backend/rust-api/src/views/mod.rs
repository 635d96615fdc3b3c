//! Server-rendered HTML pages.

pub mod login_page;
pub mod quiz_page;

pub const SITE_TITLE: &str = "Privacy Policy Training Site";

/// Escape a string for safe HTML insertion.
pub fn html_escape(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#x27;")
}

const CSS: &str = r#"
body { font-family: sans-serif; margin: 0; display: flex; }
aside { width: 18rem; padding: 1rem; background: #f0f2f6; min-height: 100vh; }
aside select { width: 100%; }
main { flex: 1; padding: 1rem 2rem; max-width: 60rem; }
mark { background-color: yellow; color: black; }
.category { color: blue; }
.hint { border: 1px solid #000; padding: 10px; margin: 10px 0; }
.error { background: #fde2e2; padding: .75rem; }
.warning { background: #fff4d6; padding: .75rem; }
.success { background: #dff5e1; padding: .75rem; }
table { border-collapse: collapse; margin-bottom: 1.5rem; }
th, td { border: 1px solid #ccc; padding: .25rem .75rem; }
tr.total { font-weight: bold; }
"#;

/// Wraps a page body in the shared document shell.
pub fn layout(title: &str, sidebar: &str, body: &str) -> String {
    let mut html = String::new();
    html.push_str("<!DOCTYPE html>\n<html lang=\"ja\">\n<head>\n");
    html.push_str("<meta charset=\"utf-8\">\n");
    html.push_str("<meta name=\"viewport\" content=\"width=device-width, initial-scale=1\">\n");
    html.push_str(&format!("<title>{}</title>\n", html_escape(title)));
    html.push_str("<style>");
    html.push_str(CSS);
    html.push_str("</style>\n</head>\n<body>\n");
    if !sidebar.is_empty() {
        html.push_str("<aside>\n");
        html.push_str(sidebar);
        html.push_str("</aside>\n");
    }
    html.push_str("<main>\n");
    html.push_str(&format!("<h1>{}</h1>\n", html_escape(title)));
    html.push_str(body);
    html.push_str("</main>\n</body>\n</html>\n");
    html
}

pub fn banner(class: &str, message: &str) -> String {
    format!("<p class=\"{}\">{}</p>\n", class, html_escape(message))
}

pub fn hidden_input(name: &str, value: &str) -> String {
    format!(
        "<input type=\"hidden\" name=\"{}\" value=\"{}\">\n",
        html_escape(name),
        html_escape(value)
    )
}

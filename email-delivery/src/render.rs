use interfaces::defs::{Article, Digest};

const BODY_STYLE: &str = "font-family: 'Segoe UI', sans-serif; color: #333; line-height: 1.6;";
const CONTAINER_STYLE: &str = "max-width: 600px; margin: 0 auto; border: 1px solid #e0e0e0; border-radius: 8px;";
const HEADER_STYLE: &str = "background-color: #4b2c92; padding: 20px; text-align: center; color: white;";
const SECTION_STYLE: &str = "padding: 20px;";
const SECTION_TITLE_STYLE: &str = "border-bottom: 2px solid #4b2c92; padding-bottom: 5px; margin-top: 30px;";
const ARTICLE_STYLE: &str = "margin-bottom: 25px; border-bottom: 1px solid #eee; padding-bottom: 15px;";
const SOURCE_STYLE: &str = "font-size: 11px; font-weight: bold; color: #666; text-transform: uppercase;";
const TITLE_STYLE: &str = "margin: 5px 0; font-size: 18px;";
const LINK_STYLE: &str = "text-decoration: none; color: #0078D4;";
const DESC_STYLE: &str = "font-size: 14px; color: #444; margin-top: 5px;";

pub fn subject_line(digest: &Digest) -> String {
    format!("Daily Brief: {} Updates", digest.total())
}

/// Full HTML body of the digest mail. Empty sections are left out.
pub fn render_digest_html(digest: &Digest) -> String {
    let mut html = String::new();
    html.push_str(&format!("<html><body style=\"{}\">", BODY_STYLE));
    html.push_str(&format!("<div style=\"{}\">", CONTAINER_STYLE));
    html.push_str(&format!(
        "<div style=\"{}\"><h2 style=\"margin:0;\">Daily Brief</h2><p style=\"margin:5px 0 0; opacity: 0.9;\">Top {} Stories</p></div>",
        HEADER_STYLE,
        digest.total()
    ));
    html.push_str(&format!("<div style=\"{}\">", SECTION_STYLE));
    html.push_str(&render_section("Platform Updates", &digest.platform));
    html.push_str(&render_section("Blog Posts", &digest.blogs));
    html.push_str("</div></div></body></html>");
    html
}

fn render_section(title: &str, articles: &[Article]) -> String {
    if articles.is_empty() {
        return String::new();
    }

    let mut html = format!("<h3 style=\"{}\">{}</h3>", SECTION_TITLE_STYLE, escape_html(title));
    for article in articles {
        html.push_str(&format!(
            "<div style=\"{}\"><span style=\"{}\">{}</span><h3 style=\"{}\"><a href=\"{}\" style=\"{}\">{}</a></h3><p style=\"{}\"><b>Why it matters:</b> {}<br><br>{}</p></div>",
            ARTICLE_STYLE,
            SOURCE_STYLE,
            escape_html(&article.source),
            TITLE_STYLE,
            escape_html(&article.link),
            LINK_STYLE,
            escape_html(&article.title),
            DESC_STYLE,
            escape_html(article.reason.as_deref().unwrap_or("")),
            escape_html(&article.summary),
        ));
    }
    html
}

pub fn escape_html(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            _ => escaped.push(c),
        }
    }
    escaped
}

//! Mind-map rendering: markdown outline → self-contained markmap HTML page.
//!
//! The page loads d3, markmap-view and markmap-lib from jsDelivr and renders
//! the outline into an `<svg>`. Rendering is a pure string transformation
//! with no failure path.
//!
//! ## Embedding
//!
//! The outline is attacker-influenced text (it is model output derived from
//! an uploaded document), so it must not be able to break out of the script
//! that carries it.
//!
//! * [`EmbedMode::JsonPayload`] (default) stores the markdown as a JSON
//!   string in a `<script type="application/json">` block, with every `<`,
//!   `>` and `&` written as a `\u` escape. No sequence in the content can
//!   close the element or be parsed as script.
//! * [`EmbedMode::TemplateLiteral`] inlines the markdown in a JS template
//!   literal. Backslashes are doubled first, then [`escape_template_literal`]
//!   runs, and finally `</` is written as `<\/` so the literal cannot end
//!   the `<script>` element.

use serde::{Deserialize, Serialize};

/// How the outline is carried inside the page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EmbedMode {
    /// JSON string in a data block, parsed with `JSON.parse`. (default)
    #[default]
    JsonPayload,
    /// Inline JS template literal.
    TemplateLiteral,
}

/// Fixed markmap presentation options.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MarkmapOptions {
    /// Node colours, cycled by depth.
    #[serde(skip)]
    pub palette: Vec<String>,
    pub max_width: u32,
    pub padding_x: u32,
    pub auto_fit: bool,
    pub initial_expand_level: u32,
    /// Transition duration in milliseconds.
    pub duration: u32,
}

impl Default for MarkmapOptions {
    fn default() -> Self {
        Self {
            palette: ["#2196f3", "#4caf50", "#ff9800", "#f44336"]
                .iter()
                .map(|c| c.to_string())
                .collect(),
            max_width: 300,
            padding_x: 16,
            auto_fit: true,
            initial_expand_level: 2,
            duration: 500,
        }
    }
}

/// Escape backticks and `${` for use inside a JS template literal.
///
/// Each backtick becomes `` \` `` and each `${` becomes `\${`, exactly once.
/// Every other character is copied unchanged.
pub fn escape_template_literal(markdown: &str) -> String {
    let mut out = String::with_capacity(markdown.len() + 8);
    let mut chars = markdown.chars().peekable();
    while let Some(c) = chars.next() {
        match c {
            '`' => out.push_str("\\`"),
            '$' if chars.peek() == Some(&'{') => {
                chars.next();
                out.push_str("\\${");
            }
            other => out.push(other),
        }
    }
    out
}

/// Encode `value` as JSON that is safe inside a `<script>` element.
///
/// `<`, `>` and `&` become `\u003c`, `\u003e` and `\u0026`; U+2028 and
/// U+2029 are escaped for older JS parsers. `JSON.parse` restores them.
pub fn encode_json_payload<T: Serialize + ?Sized>(value: &T) -> String {
    // Serialising strings, numbers and bools cannot fail.
    let json = serde_json::to_string(value).unwrap_or_else(|_| "null".to_string());
    let mut out = String::with_capacity(json.len() + 16);
    for c in json.chars() {
        match c {
            '<' => out.push_str("\\u003c"),
            '>' => out.push_str("\\u003e"),
            '&' => out.push_str("\\u0026"),
            '\u{2028}' => out.push_str("\\u2028"),
            '\u{2029}' => out.push_str("\\u2029"),
            other => out.push(other),
        }
    }
    out
}

/// Render `markdown` into a self-contained mind-map HTML document.
pub fn render_mindmap_html(markdown: &str, options: &MarkmapOptions, mode: EmbedMode) -> String {
    let (data_block, markdown_expr) = match mode {
        EmbedMode::JsonPayload => (
            format!(
                "<script id=\"mindmap-data\" type=\"application/json\">{}</script>\n",
                encode_json_payload(markdown)
            ),
            "JSON.parse(document.getElementById('mindmap-data').textContent)".to_string(),
        ),
        EmbedMode::TemplateLiteral => (
            String::new(),
            format!(
                "`{}`",
                escape_template_literal(&markdown.replace('\\', "\\\\")).replace("</", "<\\/")
            ),
        ),
    };

    let palette = encode_json_payload(&options.palette);
    let markmap_options = encode_json_payload(options);

    format!(
        r#"<!DOCTYPE html>
<html>
<head>
    <meta charset="UTF-8">
    <title>Interactive Mindmap</title>
    <style>
        #mindmap {{
            width: 100%;
            height: 600px;
            margin: 0;
            padding: 0;
        }}
    </style>
    <script src="https://cdn.jsdelivr.net/npm/d3@6"></script>
    <script src="https://cdn.jsdelivr.net/npm/markmap-view"></script>
    <script src="https://cdn.jsdelivr.net/npm/markmap-lib@0.14.3/dist/browser/index.min.js"></script>
</head>
<body>
    <svg id="mindmap"></svg>
    {data_block}<script>
        window.onload = async () => {{
            try {{
                const markdown = {markdown_expr};
                const palette = {palette};
                const transformer = new markmap.Transformer();
                const {{ root }} = transformer.transform(markdown);
                const options = Object.assign({markmap_options}, {{
                    color: (node) => palette[node.depth % palette.length],
                }});
                const mm = new markmap.Markmap(document.querySelector('#mindmap'), options);
                mm.setData(root);
                mm.fit();
            }} catch (error) {{
                console.error('Error rendering mindmap:', error);
                document.body.innerHTML = '<p style="color: red;">Error rendering mindmap. Please check the console for details.</p>';
            }}
        }};
    </script>
</body>
</html>
"#
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn escapes_backticks_and_interpolation() {
        assert_eq!(escape_template_literal("a`b"), "a\\`b");
        assert_eq!(escape_template_literal("${x}"), "\\${x}");
        assert_eq!(escape_template_literal("``"), "\\`\\`");
        assert_eq!(escape_template_literal("$${"), "$\\${");
    }

    #[test]
    fn other_characters_are_untouched() {
        let s = "# Title\n- $5 and {braces} </b> \\n ünïcödé";
        assert_eq!(escape_template_literal(s), s);
    }

    #[test]
    fn escaping_happens_exactly_once() {
        let input = "`code` and ${a} ${b} `";
        let escaped = escape_template_literal(input);
        assert_eq!(escaped.matches("\\`").count(), input.matches('`').count());
        assert_eq!(escaped.matches("\\${").count(), input.matches("${").count());
        assert_eq!(escaped.replace("\\`", "`").replace("\\${", "${"), input);
    }

    #[test]
    fn json_payload_cannot_close_script() {
        let md = "# Hi </script><script>alert(1)</script> & more";
        let html = render_mindmap_html(md, &MarkmapOptions::default(), EmbedMode::JsonPayload);
        assert_eq!(html.matches("</script>").count(), 5, "only the page's own closing tags");
        assert!(html.contains("\\u003c/script\\u003e"));
        assert!(html.contains("\\u0026 more"));
    }

    #[test]
    fn json_payload_round_trips() {
        let md = "# A\n## B `x` ${y}\n- \u{2028}";
        let payload = encode_json_payload(md);
        let back: String = serde_json::from_str(&payload).unwrap();
        assert_eq!(back, md);
    }

    #[test]
    fn template_literal_mode_escapes_content() {
        let md = "# T `tick` ${inj} </script>";
        let html = render_mindmap_html(md, &MarkmapOptions::default(), EmbedMode::TemplateLiteral);
        assert!(html.contains("const markdown = `# T \\`tick\\` \\${inj} <\\/script>`;"));
        assert!(!html.contains("mindmap-data"));
    }

    #[test]
    fn template_literal_mode_keeps_escaped_backtick_inside_the_literal() {
        let md = "# T \\`;alert(1);//";
        let html = render_mindmap_html(md, &MarkmapOptions::default(), EmbedMode::TemplateLiteral);
        assert!(html.contains(r"const markdown = `# T \\\`;alert(1);//`;"));
    }

    #[test]
    fn template_literal_mode_doubles_backslashes() {
        let md = "## Files in C:\\users\\x41";
        let html = render_mindmap_html(md, &MarkmapOptions::default(), EmbedMode::TemplateLiteral);
        assert!(html.contains(r"const markdown = `## Files in C:\\users\\x41`;"));
    }

    #[test]
    fn options_are_embedded() {
        let html = render_mindmap_html("# x", &MarkmapOptions::default(), EmbedMode::JsonPayload);
        assert!(html.contains(r#""maxWidth":300"#));
        assert!(html.contains(r#""autoFit":true"#));
        assert!(html.contains(r#""initialExpandLevel":2"#));
        assert!(html.contains(r#""duration":500"#));
        assert!(html.contains(r##"["#2196f3","#4caf50","#ff9800","#f44336"]"##));
        assert!(html.contains(r#"<meta charset="UTF-8">"#));
        assert!(!html.contains("palette\":"), "palette is passed separately");
    }
}

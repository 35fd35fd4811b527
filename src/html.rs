pub const TITLE: &str = "PAGE Token Prices";

/// Escapes text for use in HTML/SVG content and attribute values.
pub fn escape(raw: &str) -> String {
    let mut escaped = String::with_capacity(raw.len());
    for c in raw.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            c => escaped.push(c),
        }
    }
    escaped
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ButtonAction {
    Post,
    Link(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FrameButton {
    pub label: String,
    pub action: ButtonAction,
}

impl FrameButton {
    pub fn post(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            action: ButtonAction::Post,
        }
    }

    pub fn link(label: impl Into<String>, target: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            action: ButtonAction::Link(target.into()),
        }
    }
}

/// The `fc:frame` metadata of one card.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FrameMeta {
    pub image: String,
    pub buttons: Vec<FrameButton>,
    pub post_url: String,
    pub state: Option<String>,
}

fn meta(html: &mut String, property: &str, content: &str) {
    html.push_str(&format!(
        "    <meta property=\"{}\" content=\"{}\" />\n",
        property,
        escape(content)
    ));
}

impl FrameMeta {
    pub fn render(&self) -> String {
        let mut html = String::from("<!DOCTYPE html>\n<html>\n  <head>\n");
        html.push_str("    <meta charset=\"utf-8\" />\n");
        meta(&mut html, "fc:frame", "vNext");
        meta(&mut html, "fc:frame:image", &self.image);
        meta(&mut html, "fc:frame:image:aspect_ratio", "1.91:1");
        for (i, button) in self.buttons.iter().enumerate() {
            let key = format!("fc:frame:button:{}", i + 1);
            meta(&mut html, &key, &button.label);
            if let ButtonAction::Link(target) = &button.action {
                meta(&mut html, &format!("{}:action", key), "link");
                meta(&mut html, &format!("{}:target", key), target);
            }
        }
        meta(&mut html, "fc:frame:post_url", &self.post_url);
        if let Some(state) = &self.state {
            meta(&mut html, "fc:frame:state", state);
        }
        meta(&mut html, "og:title", TITLE);
        html.push_str(&format!("    <title>{}</title>\n", TITLE));
        html.push_str("  </head>\n  <body>\n");
        html.push_str(&format!("    <h1>{}</h1>\n", TITLE));
        html.push_str("  </body>\n</html>\n");
        html
    }
}

use serde::Serialize;
use serde_json::{json, Map, Value};

pub const NODE_SIZE_PX: u32 = 40;
pub const NODE_FILL: &str = "#1976d2";
pub const NODE_TEXT: &str = "#fff";

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StyleRule {
    pub selector: String,
    pub style: Map<String, Value>,
}

impl StyleRule {
    fn new(selector: &str, declarations: Value) -> Self {
        let style = match declarations {
            Value::Object(map) => map,
            _ => Map::new(),
        };
        Self {
            selector: selector.to_string(),
            style,
        }
    }
}

/// Labelled blue discs joined by arrowed bezier curves.
pub fn default_style() -> Vec<StyleRule> {
    vec![
        StyleRule::new(
            "node",
            json!({
                "label": "data(label)",
                "width": NODE_SIZE_PX,
                "height": NODE_SIZE_PX,
                "background-color": NODE_FILL,
                "color": NODE_TEXT,
                "text-valign": "center",
                "text-halign": "center",
            }),
        ),
        StyleRule::new(
            "edge",
            json!({
                "label": "data(label)",
                "curve-style": "bezier",
                "target-arrow-shape": "triangle",
            }),
        ),
    ]
}

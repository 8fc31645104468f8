//! Layout configuration: distance constants and the node style registry.
//!
//! Every manager owns its own [`LayoutConfig`]; there is no process-wide style table. Configs
//! deserialize from camelCase JSON, missing fields take their defaults and unknown fields are
//! ignored.

use crate::Result;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Insets {
    pub top: f64,
    pub right: f64,
    pub bottom: f64,
    pub left: f64,
}

impl Insets {
    pub fn uniform(v: f64) -> Self {
        Self {
            top: v,
            right: v,
            bottom: v,
            left: v,
        }
    }

    pub fn horizontal(&self) -> f64 {
        self.left + self.right
    }

    pub fn vertical(&self) -> f64 {
        self.top + self.bottom
    }
}

/// How a node arranges its children inside its content area.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum ContentLayout {
    /// Vertical stack.
    #[default]
    List,
    /// Columns ranked by the edges among the children.
    Ihl,
    /// Children spaced evenly on a circle.
    Ring,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct NodeStyle {
    pub name: String,
    /// Base width; the whole node when childless, the header allowance otherwise.
    pub width: f64,
    /// Base height; the whole node when childless, the header band otherwise.
    pub height: f64,
    pub content_layout: ContentLayout,
    pub margin: Insets,
    pub padding: Insets,
}

impl Default for NodeStyle {
    fn default() -> Self {
        Self::new("default", 120.0, 40.0)
    }
}

impl NodeStyle {
    pub fn new(name: impl Into<String>, width: f64, height: f64) -> Self {
        Self {
            name: name.into(),
            width,
            height,
            content_layout: ContentLayout::List,
            margin: Insets::default(),
            padding: Insets::default(),
        }
    }

    pub fn with_content_layout(mut self, content_layout: ContentLayout) -> Self {
        self.content_layout = content_layout;
        self
    }

    pub fn with_margin(mut self, margin: Insets) -> Self {
        self.margin = margin;
        self
    }

    pub fn with_padding(mut self, padding: Insets) -> Self {
        self.padding = padding;
        self
    }
}

/// Named node styles plus the names of the styles used when a node is added without one.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct NodeStyleRegistry {
    pub styles: IndexMap<String, NodeStyle>,
    pub expanded: String,
    pub collapsed: String,
}

impl Default for NodeStyleRegistry {
    fn default() -> Self {
        let expanded = NodeStyle::new("expanded", 160.0, 40.0)
            .with_margin(Insets::uniform(10.0))
            .with_padding(Insets::uniform(10.0));
        let collapsed = NodeStyle::new("collapsed", 120.0, 40.0).with_margin(Insets::uniform(10.0));
        let mut styles = IndexMap::new();
        styles.insert(expanded.name.clone(), expanded);
        styles.insert(collapsed.name.clone(), collapsed);
        Self {
            styles,
            expanded: "expanded".to_string(),
            collapsed: "collapsed".to_string(),
        }
    }
}

impl NodeStyleRegistry {
    pub fn get(&self, name: &str) -> Option<&NodeStyle> {
        self.styles.get(name)
    }

    /// Adds or replaces a style under its own name.
    pub fn insert(&mut self, style: NodeStyle) {
        self.styles.insert(style.name.clone(), style);
    }

    pub fn default_name(&self, expanded: bool) -> &str {
        if expanded {
            &self.expanded
        } else {
            &self.collapsed
        }
    }

    /// Style applied to a node added without an explicit one.
    pub fn default_style(&self, expanded: bool) -> NodeStyle {
        let name = self.default_name(expanded);
        self.get(name)
            .cloned()
            .unwrap_or_else(|| NodeStyle {
                name: name.to_string(),
                ..NodeStyle::default()
            })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct LayoutConfig {
    pub node_to_node_distance: f64,
    pub minimum_layer_distance: f64,
    pub edge_segment_length: f64,
    pub single_segment_edge_error_offset: f64,
    pub min_distance_from_nodes: f64,
    pub distance_between_channels: f64,
    pub child_spacing: f64,
    pub ring_min_radius: f64,
    pub column_max_rows: usize,
    pub column_spacing: f64,
    pub styles: NodeStyleRegistry,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            node_to_node_distance: 40.0,
            minimum_layer_distance: 80.0,
            edge_segment_length: 20.0,
            single_segment_edge_error_offset: 10.0,
            min_distance_from_nodes: 10.0,
            distance_between_channels: 12.0,
            child_spacing: 12.0,
            ring_min_radius: 40.0,
            column_max_rows: 8,
            column_spacing: 24.0,
            styles: NodeStyleRegistry::default(),
        }
    }
}

impl LayoutConfig {
    pub fn from_json_str(text: &str) -> Result<Self> {
        Ok(serde_json::from_str(text)?)
    }

    pub fn from_value(value: Value) -> Result<Self> {
        Ok(serde_json::from_value(value)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_fields_take_defaults() {
        let cfg = LayoutConfig::from_json_str(r#"{ "nodeToNodeDistance": 12, "extra": true }"#)
            .unwrap();
        assert_eq!(cfg.node_to_node_distance, 12.0);
        assert_eq!(cfg.minimum_layer_distance, 80.0);
        assert_eq!(cfg.styles.expanded, "expanded");
    }

    #[test]
    fn styles_parse_from_json() {
        let cfg = LayoutConfig::from_value(serde_json::json!({
            "styles": {
                "styles": {
                    "machine": {
                        "name": "machine",
                        "width": 200,
                        "height": 60,
                        "contentLayout": "Ring",
                        "padding": { "top": 4, "left": 2 }
                    }
                },
                "expanded": "machine",
                "collapsed": "process"
            }
        }))
        .unwrap();

        let machine = cfg.styles.default_style(true);
        assert_eq!(machine.content_layout, ContentLayout::Ring);
        assert_eq!(machine.padding.top, 4.0);
        assert_eq!(machine.padding.right, 0.0);
        // Unknown default style names fall back to the built-in dimensions.
        assert_eq!(cfg.styles.default_style(false).width, 120.0);
        assert_eq!(cfg.styles.default_style(false).name, "process");
    }

    #[test]
    fn malformed_config_is_an_error() {
        assert!(matches!(
            LayoutConfig::from_json_str("{ nope"),
            Err(crate::Error::InvalidConfig(_))
        ));
    }
}

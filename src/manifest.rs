use crate::document::Element;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

pub const ROOT: &str = "Mod";
pub const NAME: &str = "Name";
pub const AUTHOR: &str = "Author";
pub const VERSION: &str = "Version";
pub const DESCRIPTION: &str = "Description";
pub const DEBUG: &str = "Debug";
pub const MULTIPLAYER_COMPATIBLE: &str = "MultiplayerCompatible";
pub const ID: &str = "ID";
pub const ASSEMBLIES: &str = "Assemblies";
pub const BLOCKS: &str = "Blocks";
pub const ENTITIES: &str = "Entities";
pub const TRIGGERS: &str = "Triggers";
pub const EVENTS: &str = "Events";
pub const KEYS: &str = "Keys";
pub const RESOURCES: &str = "Resources";

/// A top-level field of `Mod.xml`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ManifestValue {
    /// Present but empty, e.g. `<Keys></Keys>` or `<Blocks/>`.
    Null,
    Text(String),
    /// Anything with attributes or child elements, kept whole.
    Node(Element),
}

impl ManifestValue {
    pub fn as_text(&self) -> Option<&str> {
        match self {
            ManifestValue::Null => Some(""),
            ManifestValue::Text(text) => Some(text),
            ManifestValue::Node(_) => None,
        }
    }

    fn from_element(element: &Element) -> Self {
        if !element.attributes.is_empty() || !element.children.is_empty() {
            return ManifestValue::Node(element.clone());
        }
        match &element.text {
            Some(text) => ManifestValue::Text(text.clone()),
            None => ManifestValue::Null,
        }
    }

    fn to_element(&self, name: &str) -> Element {
        match self {
            ManifestValue::Null => Element::new(name),
            ManifestValue::Text(text) => Element::new(name).with_text(text.as_str()),
            ManifestValue::Node(element) => {
                let mut element = element.clone();
                element.name = name.to_string();
                element
            }
        }
    }
}

/// Ordered field map mirroring the children of the `<Mod>` root element.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Manifest {
    fields: IndexMap<String, ManifestValue>,
}

impl Manifest {
    /// Build from the `<Mod>` element. A repeated field keeps its first
    /// position and its last value.
    pub fn from_element(root: &Element) -> Self {
        let mut fields = IndexMap::with_capacity(root.children.len());
        for child in &root.children {
            fields.insert(child.name.clone(), ManifestValue::from_element(child));
        }
        Self { fields }
    }

    pub fn to_element(&self) -> Element {
        let mut root = Element::new(ROOT);
        root.children = self
            .fields
            .iter()
            .map(|(name, value)| value.to_element(name))
            .collect();
        root
    }

    pub fn from_template(template: &ManifestTemplate, name: &str, author: &str) -> Self {
        let text = |value: &str| ManifestValue::Text(value.to_string());
        let flag = |value: bool| ManifestValue::Text(value.to_string());

        let mut manifest = Manifest::default();
        manifest.insert(NAME, text(name));
        manifest.insert(AUTHOR, text(author));
        manifest.insert(VERSION, text(&template.version));
        manifest.insert(DESCRIPTION, text(&template.description));
        manifest.insert(DEBUG, flag(template.debug));
        manifest.insert(MULTIPLAYER_COMPATIBLE, flag(template.multiplayer_compatible));
        for section in &[ASSEMBLIES, BLOCKS, ENTITIES, TRIGGERS, EVENTS, KEYS, RESOURCES] {
            manifest.insert(*section, ManifestValue::Null);
        }
        manifest.insert(ID, text(&template.id));
        manifest
    }

    pub fn get(&self, field: &str) -> Option<&ManifestValue> {
        self.fields.get(field)
    }

    pub fn get_mut(&mut self, field: &str) -> Option<&mut ManifestValue> {
        self.fields.get_mut(field)
    }

    /// Set a field, keeping its position if it already exists.
    pub fn insert(&mut self, field: impl Into<String>, value: ManifestValue) {
        self.fields.insert(field.into(), value);
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &ManifestValue)> {
        self.fields.iter().map(|(name, value)| (name.as_str(), value))
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

/// Defaults written into a freshly created manifest.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct ManifestTemplate {
    pub version: String,
    pub description: String,
    pub debug: bool,
    pub multiplayer_compatible: bool,
    // TODO: generate a real mod ID instead of leaving it blank
    pub id: String,
}

impl Default for ManifestTemplate {
    fn default() -> Self {
        Self {
            version: "0.0.1".to_string(),
            description: "Description".to_string(),
            debug: true,
            multiplayer_compatible: true,
            id: "".to_string(),
        }
    }
}

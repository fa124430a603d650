//! Typed entities bound by variable definitions.
//!
//! The set of entity kinds is closed: a constructor name in DSL text is looked
//! up with [`EntityKind::from_name`], and each kind declares the constructor
//! keys and fields it understands so that typos are caught while parsing
//! rather than while a device is being inspected.

use crate::Literal;
use crate::error::{Error, Result};
use crate::layout::{self, Bounds, Fingerprint, Hierarchy, NodeId, ViewNode, WidgetKind};
use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::rc::{Rc, Weak};
use std::str::FromStr;

// --- Kinds ------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntityKind {
    Device,
    Screen,
    Widget,
}

impl EntityKind {
    pub const ALL: [EntityKind; 3] = [EntityKind::Device, EntityKind::Screen, EntityKind::Widget];

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|k| k.as_str() == name)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            EntityKind::Device => "Device",
            EntityKind::Screen => "Screen",
            EntityKind::Widget => "Widget",
        }
    }

    /// Fields readable with `var.field` in predicates.
    pub fn fields(self) -> &'static [&'static str] {
        match self {
            EntityKind::Device => &["id", "volume", "audio", "orientation", "log", "crash"],
            EntityKind::Screen => &["id", "fingerprint", "package"],
            EntityKind::Widget => &[
                "text",
                "resource_id",
                "content_desc",
                "kind",
                "class",
                "bounds",
                "clickable",
                "checked",
                "enabled",
                "selected",
                "focused",
            ],
        }
    }

    pub fn has_field(self, field: &str) -> bool {
        self.fields().contains(&field)
    }

    /// Check one constructor argument; the error is a human-readable reason.
    pub(crate) fn check_argument(self, key: &str, value: &Literal) -> std::result::Result<(), String> {
        let expect = |ok: bool, wanted: &str| {
            if ok { Ok(()) } else { Err(format!("`{key}` expects {wanted}, found {}", value.type_name())) }
        };
        match (self, key) {
            (EntityKind::Device, "volume") => expect(matches!(value, Literal::Int(_)), "an integer"),
            (EntityKind::Device, "audio") => match value {
                Literal::Bool(_) => Ok(()),
                Literal::Str(s) if parse_audio_word(s).is_some() => Ok(()),
                _ => Err(format!("`audio` expects a boolean or \"on\"/\"off\", found {value}")),
            },
            (EntityKind::Device, "orientation") => match value {
                Literal::Str(s) => s.parse::<Orientation>().map(|_| ()),
                _ => expect(false, "a string"),
            },
            (EntityKind::Device, "log") => expect(matches!(value, Literal::Str(_)), "a string"),
            (EntityKind::Device, "is_crash") => expect(matches!(value, Literal::Bool(_)), "a boolean"),
            (EntityKind::Screen, "package") => expect(matches!(value, Literal::Str(_)), "a string"),
            (EntityKind::Widget, "bounds" | "resource_id" | "text" | "content_desc" | "class") => {
                expect(matches!(value, Literal::Str(_)), "a string")
            }
            (EntityKind::Widget, "clickable" | "enabled" | "checked") => {
                expect(matches!(value, Literal::Bool(_)), "a boolean")
            }
            (kind, _) => Err(format!("{kind} does not accept argument `{key}`")),
        }
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// --- Device -----------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Orientation {
    Natural,
    Left,
    Right,
    UpsideDown,
}

impl Orientation {
    pub fn as_str(self) -> &'static str {
        match self {
            Orientation::Natural => "natural",
            Orientation::Left => "left",
            Orientation::Right => "right",
            Orientation::UpsideDown => "upsidedown",
        }
    }
}

impl FromStr for Orientation {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "natural" => Ok(Orientation::Natural),
            "left" => Ok(Orientation::Left),
            "right" => Ok(Orientation::Right),
            "upsidedown" => Ok(Orientation::UpsideDown),
            other => Err(format!("unknown orientation `{other}` (expected natural, left, right or upsidedown)")),
        }
    }
}

impl fmt::Display for Orientation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

fn parse_audio_word(word: &str) -> Option<bool> {
    match word.to_ascii_lowercase().as_str() {
        "on" | "true" => Some(true),
        "off" | "false" => Some(false),
        _ => None,
    }
}

/// Device facts captured alongside a layout.
///
/// Serialized as the `device_info/*.json` snapshot format:
/// `{"volume": 3, "audio": "on", "log": "...", "orientation": "natural"}`.
/// Every fact is optional; a capture tool that could not read the volume
/// writes `null`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Device {
    #[serde(skip)]
    pub id: String,
    #[serde(default, serialize_with = "serialize_audio", deserialize_with = "deserialize_audio")]
    pub audio: Option<bool>,
    #[serde(default)]
    pub volume: Option<i64>,
    #[serde(default)]
    pub orientation: Option<Orientation>,
    #[serde(default, deserialize_with = "deserialize_log")]
    pub log: String,
}

impl Device {
    /// Parse a device-info snapshot.
    pub fn from_json(id: impl Into<String>, json: &str) -> Result<Self> {
        let mut device: Device = serde_json::from_str(json)?;
        device.id = id.into();
        Ok(device)
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Whether the log shows an app crash or an ANR.
    pub fn crashed(&self) -> bool {
        regex!(r"(?m)FATAL EXCEPTION|^.*ANR in ").is_match(&self.log)
    }
}

fn serialize_audio<S: Serializer>(audio: &Option<bool>, s: S) -> std::result::Result<S::Ok, S::Error> {
    match audio {
        Some(true) => s.serialize_str("on"),
        Some(false) => s.serialize_str("off"),
        None => s.serialize_none(),
    }
}

fn deserialize_audio<'de, D: Deserializer<'de>>(d: D) -> std::result::Result<Option<bool>, D::Error> {
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum AudioRepr {
        Flag(bool),
        Word(String),
    }

    match Option::<AudioRepr>::deserialize(d)? {
        None => Ok(None),
        Some(AudioRepr::Flag(flag)) => Ok(Some(flag)),
        Some(AudioRepr::Word(word)) => {
            parse_audio_word(&word).map(Some).ok_or_else(|| D::Error::custom(format!("invalid audio state `{word}`")))
        }
    }
}

fn deserialize_log<'de, D: Deserializer<'de>>(d: D) -> std::result::Result<String, D::Error> {
    Ok(Option::<String>::deserialize(d)?.unwrap_or_default())
}

// --- Screen -----------------------------------------------------------------

/// One captured UI hierarchy.
///
/// A dump that cannot be read is still a screen: it is kept with its
/// structural error so that validation can report it as an invalid binding
/// instead of aborting the run.
#[derive(Debug, Clone, PartialEq)]
pub struct Screen {
    pub id: String,
    /// Package whose leaves identify the screen; `None` compares every leaf.
    pub package: Option<String>,
    hierarchy: std::result::Result<Hierarchy, String>,
}

impl Screen {
    pub fn from_xml(id: impl Into<String>, xml: &str) -> Self {
        Self { id: id.into(), package: None, hierarchy: Hierarchy::from_xml(xml).map_err(|e| e.to_string()) }
    }

    pub fn with_package(mut self, package: Option<String>) -> Self {
        self.package = package;
        self
    }

    pub fn hierarchy(&self) -> Option<&Hierarchy> {
        self.hierarchy.as_ref().ok()
    }

    pub fn structural_error(&self) -> Option<&str> {
        self.hierarchy.as_ref().err().map(String::as_str)
    }

    pub fn is_valid(&self) -> bool {
        self.hierarchy.is_ok()
    }

    pub fn fingerprint(&self, overlays: &[String]) -> Option<Fingerprint> {
        self.hierarchy().map(|h| layout::fingerprint(h, self.package.as_deref(), overlays))
    }

    /// Whether a soft keyboard container is on screen.
    pub fn keyboard_on(&self, keyboard_ids: &[String]) -> bool {
        self.hierarchy().is_some_and(|h| h.has_resource_id(keyboard_ids))
    }
}

// --- Widget -----------------------------------------------------------------

/// One constructor constraint of a `Widget(...)` definition.
#[derive(Debug, Clone, PartialEq)]
pub enum Constraint {
    Bounds(Bounds),
    ResourceId(String),
    Text(String),
    ContentDesc(String),
    Class(String),
    Flag { name: &'static str, value: bool },
}

impl Constraint {
    fn from_argument(key: &str, value: &Literal) -> Result<Self> {
        let text = || match value {
            Literal::Str(s) => Ok(s.clone()),
            other => Err(Error::snapshot(format!("`{key}` expects a string, found {other}"))),
        };
        let flag = |name: &'static str| match value {
            Literal::Bool(b) => Ok(Constraint::Flag { name, value: *b }),
            other => Err(Error::snapshot(format!("`{key}` expects a boolean, found {other}"))),
        };
        match key {
            "bounds" => Ok(Constraint::Bounds(text()?.parse()?)),
            "resource_id" => Ok(Constraint::ResourceId(text()?)),
            "text" => Ok(Constraint::Text(text()?)),
            "content_desc" => Ok(Constraint::ContentDesc(text()?)),
            "class" => Ok(Constraint::Class(text()?)),
            "clickable" => flag("clickable"),
            "enabled" => flag("enabled"),
            "checked" => flag("checked"),
            other => Err(Error::snapshot(format!("Widget does not accept argument `{other}`"))),
        }
    }

    pub fn matches(&self, node: &ViewNode) -> bool {
        match self {
            Constraint::Bounds(b) => node.bounds().is_ok_and(|nb| nb == *b),
            // Either the full id or the part after `:id/`.
            Constraint::ResourceId(id) => {
                let rid = node.resource_id();
                rid == id || rid.rsplit('/').next() == Some(id.as_str())
            }
            Constraint::Text(t) => node.text().trim() == t.trim(),
            Constraint::ContentDesc(d) => node.content_desc() == d,
            // `Button` matches `android.widget.Button`.
            Constraint::Class(c) => node.class() == c || node.class().rsplit('.').next() == Some(c.as_str()),
            Constraint::Flag { name, value } => node.flag(name) == *value,
        }
    }
}

impl fmt::Display for Constraint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Constraint::Bounds(b) => write!(f, "bounds=\"{b}\""),
            Constraint::ResourceId(id) => write!(f, "resource_id=\"{id}\""),
            Constraint::Text(t) => write!(f, "text=\"{t}\""),
            Constraint::ContentDesc(d) => write!(f, "content_desc=\"{d}\""),
            Constraint::Class(c) => write!(f, "class=\"{c}\""),
            Constraint::Flag { name, value } => write!(f, "{name}={value}"),
        }
    }
}

/// Constraints of a `Widget(...)` definition, in declaration order.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct WidgetQuery {
    pub constraints: Vec<Constraint>,
}

impl WidgetQuery {
    pub fn from_args(args: &[crate::Argument]) -> Result<Self> {
        let constraints = args.iter().map(|a| Constraint::from_argument(&a.key, &a.value)).collect::<Result<_>>()?;
        Ok(Self { constraints })
    }
}

/// Data of the single node a widget resolved to.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedView {
    pub node_id: NodeId,
    pub node: ViewNode,
    /// `None` when the node's bounds attribute is malformed.
    pub bounds: Option<Bounds>,
    pub resource_id: String,
    pub content_desc: String,
    /// Textual representation used by similarity predicates.
    pub texts: Vec<String>,
    pub kind: WidgetKind,
    pub description: String,
    pub path: String,
}

/// How a widget query matched its screen.
#[derive(Debug, Clone, PartialEq)]
pub enum Resolution {
    Unique(Box<ResolvedView>),
    /// Filtering by `constraint` left no candidate.
    NoMatch { constraint: String },
    /// `count` nodes satisfy every constraint.
    Ambiguous { count: usize },
    /// The screen itself could not be read.
    ScreenUnavailable(String),
}

/// A view located on a screen by its constructor constraints.
#[derive(Debug, Clone)]
pub struct Widget {
    pub query: WidgetQuery,
    pub resolution: Resolution,
    screen: Weak<Screen>,
}

impl Widget {
    /// Narrow the screen's nodes constraint by constraint.
    pub fn resolve(query: WidgetQuery, screen: &Rc<Screen>) -> Self {
        let resolution = match screen.hierarchy() {
            None => Resolution::ScreenUnavailable(screen.structural_error().unwrap_or_default().to_string()),
            Some(h) => Self::narrow(&query, h),
        };
        Widget { query, resolution, screen: Rc::downgrade(screen) }
    }

    fn narrow(query: &WidgetQuery, hierarchy: &Hierarchy) -> Resolution {
        let mut candidates: Vec<NodeId> = (0..hierarchy.len()).collect();
        for constraint in &query.constraints {
            candidates.retain(|&id| constraint.matches(hierarchy.node(id)));
            if candidates.is_empty() {
                return Resolution::NoMatch { constraint: constraint.to_string() };
            }
        }
        match candidates[..] {
            [id] => {
                let node = hierarchy.node(id);
                Resolution::Unique(Box::new(ResolvedView {
                    node_id: id,
                    node: node.clone(),
                    bounds: node.bounds().ok(),
                    resource_id: node.resource_id().to_string(),
                    content_desc: node.content_desc().to_string(),
                    texts: layout::text::textual_representation(hierarchy, id),
                    kind: WidgetKind::of(node),
                    description: layout::text::describe(hierarchy, id),
                    path: hierarchy.path(id),
                }))
            }
            _ => Resolution::Ambiguous { count: candidates.len() },
        }
    }

    pub fn view(&self) -> Option<&ResolvedView> {
        match &self.resolution {
            Resolution::Unique(view) => Some(view),
            _ => None,
        }
    }

    /// The screen this widget was resolved against, while the run keeps it alive.
    pub fn screen(&self) -> Option<Rc<Screen>> {
        self.screen.upgrade()
    }

    pub fn is_valid(&self) -> bool {
        self.view().is_some()
    }
}

impl PartialEq for Widget {
    fn eq(&self, other: &Self) -> bool {
        self.query == other.query && self.resolution == other.resolution
    }
}

// --- Entity -----------------------------------------------------------------

/// A populated binding.
#[derive(Debug, Clone, PartialEq)]
pub enum Entity {
    Device(Device),
    Screen(Rc<Screen>),
    Widget(Widget),
}

impl Entity {
    pub fn kind(&self) -> EntityKind {
        match self {
            Entity::Device(_) => EntityKind::Device,
            Entity::Screen(_) => EntityKind::Screen,
            Entity::Widget(_) => EntityKind::Widget,
        }
    }

    pub fn is_valid(&self) -> bool {
        self.invalid_reason().is_none()
    }

    /// Why the binding cannot be used, or `None` when it is valid.
    pub fn invalid_reason(&self) -> Option<String> {
        match self {
            Entity::Device(_) => None,
            Entity::Screen(screen) => {
                screen.structural_error().map(|e| format!("screen {} is unreadable: {e}", screen.id))
            }
            Entity::Widget(widget) => match &widget.resolution {
                Resolution::Unique(_) => None,
                Resolution::NoMatch { constraint } => Some(format!("no node matches {constraint}")),
                Resolution::Ambiguous { count } => Some(format!("{count} nodes match every constraint")),
                Resolution::ScreenUnavailable(err) => Some(format!("screen is unreadable: {err}")),
            },
        }
    }
}

//! Definition → Entity.
//!
//! Each definition costs exactly one snapshot request: `layout` for screens
//! and widgets, `device_info` for devices, on the previous snapshot when the
//! variable name ends in `1`. Widgets resolve against their own copy of the
//! screen; [`Bindings`] keeps those screens alive for the run so the widget's
//! weak back-reference stays usable.

use crate::api::Context;
use crate::entity::{Device, Entity, EntityKind, Screen, Widget, WidgetQuery};
use crate::error::Result;
use crate::snapshot::SnapshotSource;
use crate::{Definition, Literal};
use std::rc::Rc;

/// Variables bound during one run, in declaration order.
#[derive(Debug, Default)]
pub(crate) struct Bindings {
    entries: Vec<(String, Entity)>,
    // Screens that widgets point at weakly; held for the lifetime of the run.
    _anchors: Vec<Rc<Screen>>,
}

impl Bindings {
    pub(crate) fn get(&self, name: &str) -> Option<&Entity> {
        self.entries.iter().find(|(n, _)| n == name).map(|(_, e)| e)
    }

    pub(crate) fn bind(&mut self, name: impl Into<String>, populated: Populated) {
        if let Some(screen) = populated.anchor {
            self._anchors.push(screen);
        }
        self.entries.push((name.into(), populated.entity));
    }

    #[cfg(test)]
    pub(crate) fn len(&self) -> usize {
        self.entries.len()
    }
}

/// A freshly populated entity and, for widgets, the screen it was resolved on.
#[derive(Debug)]
pub(crate) struct Populated {
    pub entity: Entity,
    pub anchor: Option<Rc<Screen>>,
}

/// Build the entity for `def` from one snapshot request.
pub(crate) fn populate(def: &Definition, source: &dyn SnapshotSource, context: &Context) -> Result<Populated> {
    let previous = def.previous();
    match def.kind {
        EntityKind::Device => {
            let device = source.device_info(previous)?;
            Ok(Populated { entity: Entity::Device(device), anchor: None })
        }
        EntityKind::Screen => {
            let package = match def.arg("package") {
                Some(Literal::Str(pkg)) => Some(pkg.clone()),
                _ => context.app_package.clone(),
            };
            let screen = Rc::new(source.layout(previous)?.with_package(package));
            Ok(Populated { entity: Entity::Screen(screen), anchor: None })
        }
        EntityKind::Widget => {
            let query = WidgetQuery::from_args(&def.args)?;
            let screen = Rc::new(source.layout(previous)?.with_package(context.app_package.clone()));
            let widget = Widget::resolve(query, &screen);
            Ok(Populated { entity: Entity::Widget(widget), anchor: Some(screen) })
        }
    }
}

/// Human-readable summary of a valid entity, used as its diagnostic reason.
pub(crate) fn summarize(def: &Definition, entity: &Entity) -> String {
    let snapshot = if def.previous() { "previous" } else { "current" };
    match entity {
        Entity::Device(device) => {
            let mut summary = format!("{snapshot} device {}: {}", device.id, device_facts(device));
            let notes = declared_mismatches(def, device);
            if !notes.is_empty() {
                summary.push_str(&format!("; declared {}", notes.join(", ")));
            }
            summary
        }
        Entity::Screen(screen) => {
            let nodes = screen.hierarchy().map_or(0, |h| h.len());
            format!("{snapshot} screen {} with {nodes} nodes", screen.id)
        }
        Entity::Widget(widget) => match widget.view() {
            Some(view) => format!("{} at {}", view.description, view.path),
            None => String::new(),
        },
    }
}

fn device_facts(device: &Device) -> String {
    let volume = shown(device.volume);
    let audio = match device.audio {
        Some(true) => "on",
        Some(false) => "off",
        None => "?",
    };
    let orientation = device.orientation.map_or("?", |o| o.as_str());
    format!("volume={volume} audio={audio} orientation={orientation} crash={}", device.crashed())
}

fn shown<T: ToString>(value: Option<T>) -> String {
    value.map_or_else(|| "?".to_string(), |v| v.to_string())
}

/// Device constructor arguments are expectations, not filters: report the
/// ones the snapshot disagrees with.
fn declared_mismatches(def: &Definition, device: &Device) -> Vec<String> {
    def.args
        .iter()
        .filter_map(|arg| {
            let observed = match (arg.key.as_str(), &arg.value) {
                ("volume", Literal::Int(v)) => (device.volume != Some(*v)).then(|| shown(device.volume)),
                ("audio", Literal::Bool(on)) => (device.audio != Some(*on)).then(|| shown(device.audio)),
                ("audio", Literal::Str(word)) => {
                    let on = word.eq_ignore_ascii_case("on") || word.eq_ignore_ascii_case("true");
                    (device.audio != Some(on)).then(|| shown(device.audio))
                }
                ("orientation", Literal::Str(o)) => {
                    (device.orientation.map(|x| x.as_str()) != Some(o.as_str())).then(|| shown(device.orientation))
                }
                ("is_crash", Literal::Bool(c)) => (device.crashed() != *c).then(|| device.crashed().to_string()),
                ("log", Literal::Str(text)) => (!device.log.contains(text.as_str())).then(|| "no such line".into()),
                _ => None,
            }?;
            Some(format!("{}={} but observed {observed}", arg.key, arg.value))
        })
        .collect()
}

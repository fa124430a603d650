//! Predicate scheduling and execution.
//!
//! Predicates run after every definition has been populated and validated.
//! They are stable-sorted by operator tier (structural operators first) and
//! then executed one by one without short-circuiting, so a failing run reports
//! every false predicate rather than only the first.
//!
//! Operands are resolved to [`Value`]s before an operator sees them:
//!
//! ```text
//! w            -> Value::Entity(&Entity::Widget(..))
//! d.volume     -> Value::Int(3)   or   Value::Missing("d.volume was not captured")
//! "Save"       -> Value::Str("Save")
//! ```

use super::populate::Bindings;
use super::registry::OperatorSet;
use crate::api::Options;
use crate::entity::{Entity, Resolution};
use crate::error::{Error, Result};
use crate::similarity::SimilarityService;
use crate::{Literal, Operand, Predicate};
use std::borrow::Cow;
use std::fmt;

/// A resolved operand.
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Value<'a> {
    Entity(&'a Entity),
    Str(Cow<'a, str>),
    Int(i64),
    Float(f64),
    Bool(bool),
    /// A fact the snapshot does not carry; the text says which.
    Missing(String),
}

impl Value<'_> {
    pub(crate) fn type_name(&self) -> &'static str {
        match self {
            Value::Entity(Entity::Device(_)) => "a Device",
            Value::Entity(Entity::Screen(_)) => "a Screen",
            Value::Entity(Entity::Widget(_)) => "a Widget",
            Value::Str(_) => "a string",
            Value::Int(_) | Value::Float(_) => "a number",
            Value::Bool(_) => "a boolean",
            Value::Missing(_) => "a missing value",
        }
    }

    pub(crate) fn as_number(&self) -> Option<f64> {
        match self {
            Value::Int(i) => Some(*i as f64),
            Value::Float(x) => Some(*x),
            _ => None,
        }
    }
}

impl fmt::Display for Value<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Entity(entity) => write!(f, "<{}>", entity.kind()),
            Value::Str(s) if s.chars().count() > 48 => {
                let head: String = s.chars().take(45).collect();
                write!(f, "{head:?}...")
            }
            Value::Str(s) => write!(f, "{s:?}"),
            Value::Int(i) => write!(f, "{i}"),
            Value::Float(x) => write!(f, "{x}"),
            Value::Bool(b) => write!(f, "{b}"),
            Value::Missing(what) => f.write_str(what),
        }
    }
}

/// Everything an operator may look at.
pub(crate) struct Call<'a> {
    pub operator: &'a str,
    pub operands: &'a [Operand],
    pub args: Vec<Value<'a>>,
    pub options: &'a Options,
    pub similarity: &'a dyn SimilarityService,
}

impl Call<'_> {
    /// Source text of operand `i`, e.g. `d.volume`.
    pub(crate) fn label(&self, i: usize) -> String {
        self.operands.get(i).map(ToString::to_string).unwrap_or_default()
    }

    pub(crate) fn mismatch(&self, detail: impl Into<String>) -> Error {
        Error::TypeMismatch { operator: self.operator.to_string(), detail: detail.into() }
    }
}

/// Outcome of one operator call.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Check {
    pub holds: bool,
    pub reason: String,
}

impl Check {
    pub(crate) fn new(holds: bool, reason: impl Into<String>) -> Self {
        Self { holds, reason: reason.into() }
    }

    pub(crate) fn fail(reason: impl Into<String>) -> Self {
        Self::new(false, reason)
    }
}

/// Stable tier order: structural operators first, textual order within a tier.
pub(crate) fn schedule<'p>(
    predicates: impl IntoIterator<Item = &'p Predicate>,
    operators: &OperatorSet,
) -> Vec<&'p Predicate> {
    let mut ordered: Vec<&Predicate> = predicates.into_iter().collect();
    ordered.sort_by_key(|p| operators.tier(&p.operator).unwrap_or(u8::MAX));
    ordered
}

/// Resolve operands and run one predicate.
pub(crate) fn evaluate(
    predicate: &Predicate,
    bindings: &Bindings,
    operators: &OperatorSet,
    options: &Options,
    similarity: &dyn SimilarityService,
) -> Result<Check> {
    let op = operators.get(&predicate.operator).ok_or_else(|| Error::UnknownOperator {
        name: predicate.operator.clone(),
        clause: predicate.to_string(),
    })?;
    let args = predicate
        .operands
        .iter()
        .map(|operand| resolve(operand, predicate, bindings, options))
        .collect::<Result<Vec<_>>>()?;
    let call = Call { operator: op.name, operands: &predicate.operands, args, options, similarity };
    (op.eval)(&call)
}

fn resolve<'a>(
    operand: &'a Operand,
    predicate: &Predicate,
    bindings: &'a Bindings,
    options: &Options,
) -> Result<Value<'a>> {
    let lookup = |name: &str| {
        bindings
            .get(name)
            .ok_or_else(|| Error::UndeclaredVariable { name: name.to_string(), clause: predicate.to_string() })
    };
    match operand {
        Operand::Literal(lit) => Ok(literal_value(lit)),
        Operand::Variable(name) => lookup(name).map(Value::Entity),
        Operand::Field { var, field } => Ok(field_value(lookup(var)?, var, field, options)),
    }
}

fn literal_value(lit: &Literal) -> Value<'_> {
    match lit {
        Literal::Str(s) => Value::Str(Cow::Borrowed(s)),
        Literal::Bool(b) => Value::Bool(*b),
        Literal::Int(i) => Value::Int(*i),
        Literal::Float(x) => Value::Float(*x),
    }
}

/// Read `var.field` from a populated entity.
pub(crate) fn field_value<'a>(entity: &'a Entity, var: &str, field: &str, options: &Options) -> Value<'a> {
    let missing = |what: &str| Value::Missing(format!("{var}.{field} {what}"));
    match entity {
        Entity::Device(device) => match field {
            "id" => Value::Str(Cow::Borrowed(&device.id)),
            "volume" => device.volume.map_or_else(|| missing("was not captured"), Value::Int),
            "audio" => device.audio.map_or_else(|| missing("was not captured"), Value::Bool),
            "orientation" => device
                .orientation
                .map_or_else(|| missing("was not captured"), |o| Value::Str(Cow::Borrowed(o.as_str()))),
            "log" => Value::Str(Cow::Borrowed(&device.log)),
            "crash" => Value::Bool(device.crashed()),
            _ => missing("is not a Device field"),
        },
        Entity::Screen(screen) => match field {
            "id" => Value::Str(Cow::Borrowed(&screen.id)),
            "package" => {
                screen.package.as_deref().map_or_else(|| missing("is not set"), |p| Value::Str(Cow::Borrowed(p)))
            }
            "fingerprint" => screen.fingerprint(&options.installer_packages).map_or_else(
                || missing("is unavailable for an unreadable screen"),
                |f| Value::Str(Cow::Owned(f.to_string())),
            ),
            _ => missing("is not a Screen field"),
        },
        Entity::Widget(widget) => {
            let Resolution::Unique(view) = &widget.resolution else {
                return missing("belongs to an unresolved widget");
            };
            match field {
                "text" => Value::Str(Cow::Owned(view.texts.join(" "))),
                "resource_id" => Value::Str(Cow::Borrowed(&view.resource_id)),
                "content_desc" => Value::Str(Cow::Borrowed(&view.content_desc)),
                "kind" => Value::Str(Cow::Borrowed(view.kind.as_str())),
                "class" => Value::Str(Cow::Borrowed(view.node.class())),
                "bounds" => {
                    view.bounds.map_or_else(|| missing("is malformed"), |b| Value::Str(Cow::Owned(b.to_string())))
                }
                "clickable" | "checked" | "enabled" | "selected" | "focused" => Value::Bool(view.node.flag(field)),
                _ => missing("is not a Widget field"),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entity::{Device, Orientation, Screen, Widget, WidgetQuery};
    use crate::{Argument, parse_assertion};
    use std::rc::Rc;

    #[test]
    fn structural_predicates_run_first_in_textual_order() {
        let assertion = parse_assertion(
            "s = Screen() AND w = Widget() AND v = Widget() AND keyboard_on(s) AND in_screen(w, s) \
             AND is_enabled(w) AND in_screen(v, s)",
        )
        .unwrap();
        let order: Vec<String> =
            schedule(assertion.predicates(), &OperatorSet::default()).into_iter().map(|p| p.to_string()).collect();
        assert_eq!(order, vec!["in_screen(w, s)", "in_screen(v, s)", "keyboard_on(s)", "is_enabled(w)"]);
    }

    #[test]
    fn device_fields() {
        let device = Entity::Device(Device {
            id: "dev".into(),
            volume: Some(4),
            orientation: Some(Orientation::Left),
            ..Device::default()
        });
        let options = Options::default();
        assert_eq!(field_value(&device, "d", "volume", &options), Value::Int(4));
        assert_eq!(field_value(&device, "d", "orientation", &options), Value::Str(Cow::Borrowed("left")));
        assert_eq!(field_value(&device, "d", "audio", &options), Value::Missing("d.audio was not captured".into()));
        assert_eq!(field_value(&device, "d", "crash", &options), Value::Bool(false));
    }

    #[test]
    fn widget_fields() {
        let xml = r#"<hierarchy><node class="android.widget.FrameLayout" bounds="[0,0][100,100]">
            <node class="android.widget.CheckBox" text="Remember me" checked="true" clickable="true" bounds="[10,10][50,20]" />
        </node></hierarchy>"#;
        let screen = Rc::new(Screen::from_xml("s", xml));
        let query = WidgetQuery::from_args(&[Argument { key: "text".into(), value: Literal::Str("Remember me".into()) }])
            .unwrap();
        let widget = Entity::Widget(Widget::resolve(query, &screen));
        let options = Options::default();
        assert_eq!(field_value(&widget, "w", "checked", &options), Value::Bool(true));
        assert_eq!(field_value(&widget, "w", "enabled", &options), Value::Bool(false));
        assert_eq!(field_value(&widget, "w", "kind", &options), Value::Str(Cow::Borrowed("checkbox")));
        assert_eq!(field_value(&widget, "w", "bounds", &options), Value::Str(Cow::Owned("[10,10][50,20]".into())));
    }

    #[test]
    fn long_strings_are_shortened_in_reasons() {
        let long = Value::Str(Cow::Owned("x".repeat(100)));
        assert_eq!(long.to_string(), format!("\"{}\"...", "x".repeat(45)));
        assert_eq!(Value::Str(Cow::Borrowed("ok")).to_string(), "\"ok\"");
    }
}

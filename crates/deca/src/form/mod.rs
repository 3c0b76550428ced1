//! Form model: controls read from the page, the serialized submission and
//! the transforms applied before it goes on the wire.

pub mod checkbox;
pub mod postal;
pub mod validator;

use crate::config::HighlightTimings;
use crate::http::encode_form;
use validator::{Rule, ValidationReport};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ControlKind {
    Text,
    TextArea,
    Select,
    Hidden,
    Checkbox,
    Radio,
    Button,
}

impl ControlKind {
    /// Maps an `<input type>` (or tag name) to a kind. Unknown types behave
    /// like text inputs, same as browsers do.
    pub fn from_input_type(input_type: &str) -> Self {
        match input_type.to_ascii_lowercase().as_str() {
            "checkbox" => Self::Checkbox,
            "radio" => Self::Radio,
            "hidden" => Self::Hidden,
            "submit" | "button" | "reset" | "image" | "file" => Self::Button,
            "textarea" => Self::TextArea,
            "select" | "select-one" | "select-multiple" => Self::Select,
            _ => Self::Text,
        }
    }

    pub fn is_checkable(&self) -> bool {
        matches!(self, Self::Checkbox | Self::Radio)
    }
}

/// Snapshot of one form control.
#[derive(Clone, Debug, PartialEq)]
pub struct Control {
    pub name: String,
    pub kind: ControlKind,
    pub value: String,
    pub checked: bool,
    pub disabled: bool,
    /// Validation rules declared on the control's markup.
    pub rules: Vec<Rule>,
    /// Value sent for this checkbox group when none of its boxes is checked.
    pub unchecked_default: Option<String>,
}

impl Control {
    pub fn new(name: impl Into<String>, kind: ControlKind, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind,
            value: value.into(),
            checked: false,
            disabled: false,
            rules: Vec::new(),
            unchecked_default: None,
        }
    }

    pub fn text(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self::new(name, ControlKind::Text, value)
    }

    pub fn checkbox(name: impl Into<String>, value: impl Into<String>, checked: bool) -> Self {
        Self {
            checked,
            ..Self::new(name, ControlKind::Checkbox, value)
        }
    }

    pub fn radio(name: impl Into<String>, value: impl Into<String>, checked: bool) -> Self {
        Self {
            checked,
            ..Self::new(name, ControlKind::Radio, value)
        }
    }

    pub fn with_rules(mut self, rules: impl IntoIterator<Item = Rule>) -> Self {
        self.rules.extend(rules);
        self
    }

    pub fn with_unchecked_default(mut self, default: impl Into<String>) -> Self {
        self.unchecked_default = Some(default.into());
        self
    }

    pub fn is_postal_code(&self) -> bool {
        self.rules.contains(&Rule::PostalCode)
    }

    /// Whether the control contributes to a serialized submission
    /// (jQuery's "successful controls").
    pub fn is_successful(&self) -> bool {
        !self.name.is_empty()
            && !self.disabled
            && self.kind != ControlKind::Button
            && (!self.kind.is_checkable() || self.checked)
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum FieldValue {
    Single(String),
    Multi(Vec<String>),
}

impl FieldValue {
    pub fn as_single(&self) -> Option<&str> {
        match self {
            Self::Single(value) => Some(value),
            Self::Multi(_) => None,
        }
    }
}

/// Field name to value mapping in document order.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct FormSubmission {
    entries: Vec<(String, FieldValue)>,
}

impl FormSubmission {
    /// Serialize controls. A name seen more than once becomes an ordered
    /// [`FieldValue::Multi`].
    pub fn serialize(controls: &[Control]) -> Self {
        let mut submission = Self::default();
        for control in controls.iter().filter(|control| control.is_successful()) {
            submission.append(&control.name, control.value.clone());
        }
        submission
    }

    fn append(&mut self, name: &str, value: String) {
        match self.entries.iter_mut().find(|(key, _)| key == name) {
            Some((_, existing)) => {
                *existing = match std::mem::replace(existing, FieldValue::Multi(Vec::new())) {
                    FieldValue::Single(first) => FieldValue::Multi(vec![first, value]),
                    FieldValue::Multi(mut values) => {
                        values.push(value);
                        FieldValue::Multi(values)
                    }
                };
            }
            None => self.entries.push((name.to_owned(), FieldValue::Single(value))),
        }
    }

    /// Set `name`, replacing any earlier value but keeping its position.
    pub fn insert(&mut self, name: &str, value: impl Into<String>) {
        let value = FieldValue::Single(value.into());
        match self.entries.iter_mut().find(|(key, _)| key == name) {
            Some((_, existing)) => *existing = value,
            None => self.entries.push((name.to_owned(), value)),
        }
    }

    pub fn get(&self, name: &str) -> Option<&FieldValue> {
        self.entries.iter().find(|(key, _)| key == name).map(|(_, value)| value)
    }

    pub fn single(&self, name: &str) -> Option<&str> {
        self.get(name).and_then(FieldValue::as_single)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &FieldValue)> {
        self.entries.iter().map(|(name, value)| (name.as_str(), value))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Drop empty entries of multi-valued fields and join the rest.
    pub fn join_multi_values(&mut self, divider: &str) {
        for (_, value) in &mut self.entries {
            if let FieldValue::Multi(values) = value {
                let joined = values
                    .iter()
                    .filter(|value| !value.is_empty())
                    .map(String::as_str)
                    .collect::<Vec<_>>()
                    .join(divider);
                *value = FieldValue::Single(joined);
            }
        }
    }

    /// Give every checkbox group that serialized to nothing its declared
    /// default, so "all cleared" is distinguishable from "not on the form".
    pub fn backfill_unchecked_groups(&mut self, controls: &[Control]) {
        for control in controls {
            if control.kind != ControlKind::Checkbox || control.disabled {
                continue;
            }
            if let Some(default) = &control.unchecked_default {
                if !self.contains(&control.name) {
                    self.insert(&control.name, default.clone());
                }
            }
        }
    }

    /// URL-encoded request body. Multi values (which only survive when
    /// [`Self::join_multi_values`] wasn't applied) repeat the name.
    pub fn to_body(&self) -> String {
        let pairs = self.entries.iter().flat_map(|(name, value)| {
            let values: Vec<&str> = match value {
                FieldValue::Single(value) => vec![value.as_str()],
                FieldValue::Multi(values) => values.iter().map(String::as_str).collect(),
            };
            values.into_iter().map(move |value| (name.as_str(), value))
        });
        encode_form(pairs)
    }
}

/// How a field name is represented on the form, for filling it back in.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum InputShape {
    Missing,
    Single,
    CheckboxGroup,
    RadioGroup,
}

/// Derive the [`InputShape`] of `name` from a control snapshot.
pub fn input_shape(controls: &[Control], name: &str) -> InputShape {
    let mut matching = controls.iter().filter(|control| control.name == name);
    let Some(first) = matching.next() else {
        return InputShape::Missing;
    };
    if matching.next().is_none() && !first.kind.is_checkable() {
        return InputShape::Single;
    }
    match first.kind {
        ControlKind::Checkbox => InputShape::CheckboxGroup,
        ControlKind::Radio => InputShape::RadioGroup,
        _ => InputShape::Single,
    }
}

/// The DOM subtree of one form.
pub trait FormView {
    fn controls(&self) -> Vec<Control>;

    /// Declared `action`; empty posts to the current path.
    fn action(&self) -> String;

    fn set_value(&self, name: &str, value: &str);

    /// Check exactly the boxes of group `name` whose value is in `values`.
    fn set_checked_values(&self, name: &str, values: &[&str]);

    fn select_radio(&self, name: &str, value: &str);

    /// Inline error markers for the fields in `report`; clears the others.
    fn annotate(&self, report: &ValidationReport);

    fn clear_annotations(&self);

    /// Focus the field's first input and scroll the viewport to it.
    fn focus_and_reveal(&self, name: &str);

    /// Apply the error highlight and fade it out on a timer.
    fn flash_errors(&self, names: &[String], timings: HighlightTimings);

    fn set_submit_enabled(&self, enabled: bool);
}

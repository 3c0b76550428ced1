use zoon::wasm_bindgen::JsCast;
use zoon::web_sys::{self, Element, HtmlFormElement, HtmlInputElement, HtmlSelectElement, HtmlTextAreaElement};
use zoon::{Task, Timer};

use super::dom::{self, query_all};
use crate::config::HighlightTimings;
use crate::form::validator::{Rule, ValidationReport};
use crate::form::{Control, ControlKind, FormView};

const CONTROL_SELECTOR: &str = "input, select, textarea, button";
/// Bootstrap class on a field's `.form-group` when it failed validation.
const ERROR_CLASS: &str = "has-error";
const FLASH_CLASS: &str = "bg-danger";
const ERROR_MESSAGE_CLASS: &str = "deca-error-message";
/// Value a checkbox group transmits when nothing in it is checked.
const UNCHECKED_VALUE_ATTRIBUTE: &str = "data-unchecked-value";

#[derive(Clone)]
pub struct DomForm {
    form: HtmlFormElement,
    submit: Vec<Element>,
}

impl DomForm {
    /// `submit` are the trigger controls disabled while a submission is pending.
    pub fn new(form: HtmlFormElement, submit: Vec<Element>) -> Self {
        Self { form, submit }
    }

    pub fn element(&self) -> &Element {
        &self.form
    }

    fn elements(&self) -> Vec<Element> {
        query_all(&self.form, CONTROL_SELECTOR)
    }

    fn named(&self, name: &str) -> Vec<Element> {
        self.elements()
            .into_iter()
            .filter(|element| element.get_attribute("name").as_deref() == Some(name))
            .collect()
    }

    fn group_of(&self, name: &str) -> Option<Element> {
        let first = self.named(name).into_iter().next()?;
        first.closest(".form-group").ok().flatten().or(Some(first))
    }
}

fn attributes(element: &Element) -> Vec<(String, String)> {
    element
        .get_attribute_names()
        .iter()
        .filter_map(|name| name.as_string())
        .map(|name| {
            let value = element.get_attribute(&name).unwrap_or_default();
            (name, value)
        })
        .collect()
}

fn control_of(element: &Element) -> Option<Control> {
    let (kind, name, value, checked, disabled) = if let Some(input) = element.dyn_ref::<HtmlInputElement>() {
        (
            ControlKind::from_input_type(&input.type_()),
            input.name(),
            input.value(),
            input.checked(),
            input.disabled(),
        )
    } else if let Some(select) = element.dyn_ref::<HtmlSelectElement>() {
        (ControlKind::Select, select.name(), select.value(), false, select.disabled())
    } else if let Some(textarea) = element.dyn_ref::<HtmlTextAreaElement>() {
        (ControlKind::TextArea, textarea.name(), textarea.value(), false, textarea.disabled())
    } else {
        let value = element.get_attribute("value").unwrap_or_default();
        let disabled = element.has_attribute("disabled");
        (ControlKind::Button, element.get_attribute("name").unwrap_or_default(), value, false, disabled)
    };

    let attributes = attributes(element);
    let rules = Rule::from_attributes(attributes.iter().map(|(name, value)| (name.as_str(), value.as_str())));
    let mut control = Control::new(name, kind, value).with_rules(rules);
    control.checked = checked;
    control.disabled = disabled;
    if let Some((_, default)) = attributes.iter().find(|(name, _)| name == UNCHECKED_VALUE_ATTRIBUTE) {
        control = control.with_unchecked_default(default.clone());
    }
    Some(control)
}

fn set_element_value(element: &Element, value: &str) {
    if let Some(input) = element.dyn_ref::<HtmlInputElement>() {
        input.set_value(value);
    } else if let Some(select) = element.dyn_ref::<HtmlSelectElement>() {
        select.set_value(value);
    } else if let Some(textarea) = element.dyn_ref::<HtmlTextAreaElement>() {
        textarea.set_value(value);
    }
}

fn dispatch_change(element: &Element) {
    if let Ok(event) = web_sys::Event::new("change") {
        element.dispatch_event(&event).ok();
    }
}

impl FormView for DomForm {
    fn controls(&self) -> Vec<Control> {
        self.elements().iter().filter_map(control_of).collect()
    }

    fn action(&self) -> String {
        self.form.get_attribute("action").unwrap_or_default()
    }

    fn set_value(&self, name: &str, value: &str) {
        for element in self.named(name) {
            set_element_value(&element, value);
            dispatch_change(&element);
        }
    }

    fn set_checked_values(&self, name: &str, values: &[&str]) {
        for element in self.named(name) {
            if let Some(input) = element.dyn_ref::<HtmlInputElement>() {
                input.set_checked(values.contains(&input.value().as_str()));
                dispatch_change(&element);
            }
        }
    }

    fn select_radio(&self, name: &str, value: &str) {
        for element in self.named(name) {
            if let Some(input) = element.dyn_ref::<HtmlInputElement>() {
                if input.value() == value {
                    input.set_checked(true);
                    dispatch_change(&element);
                }
            }
        }
    }

    fn annotate(&self, report: &ValidationReport) {
        self.clear_annotations();
        for error in &report.errors {
            let Some(group) = self.group_of(&error.field) else {
                continue;
            };
            dom::set_class(&group, ERROR_CLASS, true);
            if let Some(document) = dom::document() {
                if let Ok(message) = document.create_element("small") {
                    message.set_class_name(&format!("help-block {ERROR_MESSAGE_CLASS}"));
                    message.set_text_content(Some(&error.message));
                    group.append_child(&message).ok();
                }
            }
        }
    }

    fn clear_annotations(&self) {
        for message in query_all(&self.form, &format!(".{ERROR_MESSAGE_CLASS}")) {
            message.remove();
        }
        for group in query_all(&self.form, &format!(".{ERROR_CLASS}")) {
            dom::set_class(&group, ERROR_CLASS, false);
        }
    }

    fn focus_and_reveal(&self, name: &str) {
        let Some(input) = self.named(name).into_iter().next() else {
            return;
        };
        dom::focus(&input);
        let options = web_sys::ScrollIntoViewOptions::new();
        options.set_behavior(web_sys::ScrollBehavior::Smooth);
        match self.group_of(name) {
            Some(group) => group.scroll_into_view_with_scroll_into_view_options(&options),
            None => input.scroll_into_view_with_scroll_into_view_options(&options),
        }
    }

    fn flash_errors(&self, names: &[String], timings: HighlightTimings) {
        let groups: Vec<Element> = names.iter().filter_map(|name| self.group_of(name)).collect();
        for group in &groups {
            dom::set_class(group, FLASH_CLASS, true);
        }
        Task::start(async move {
            Timer::sleep(timings.fade_in_ms + timings.fade_out_ms).await;
            for group in &groups {
                dom::set_class(group, FLASH_CLASS, false);
            }
        });
    }

    fn set_submit_enabled(&self, enabled: bool) {
        for trigger in &self.submit {
            if enabled {
                trigger.remove_attribute("disabled").ok();
            } else {
                dom::set_attribute(trigger, "disabled", "");
            }
        }
    }
}

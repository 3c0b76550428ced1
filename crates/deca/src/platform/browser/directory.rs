use deca_protocol::MemberRecord;
use zoon::wasm_bindgen::JsCast;
use zoon::web_sys::{Element, HtmlInputElement, HtmlTemplateElement};

use super::dom::{self, query, query_all};
use crate::directory::MemberDirectory;
use crate::directory::renew::DirectoryView;

pub const LIST_ID: &str = "membersList";
pub const ITEM_TEMPLATE_ID: &str = "membersListItemTemplate";
pub const FILTER_ID: &str = "membersFilter";
const SPINNER_ID: &str = "membersListLoadSpinner";
const NO_MATCH_ID: &str = "membersListNoMatch";
const REVIEW_PLACEHOLDER_ID: &str = "reviewRenewPlaceholder";
const REVIEW_ID: &str = "reviewRenew";
pub const ITEM_CLASS: &str = "member-item";
pub const INDEX_ATTRIBUTE: &str = "data-member-index";

/// Instantiate `<template id=...>` for one member. Elements carrying
/// `data-field="<name>"` get that field's text; `null` renders empty.
pub fn render_member(template_id: &str, member: &MemberRecord) -> Option<Element> {
    let template = dom::by_id(template_id)?.dyn_into::<HtmlTemplateElement>().ok()?;
    let item = template
        .content()
        .first_element_child()?
        .clone_node_with_deep(true)
        .ok()?
        .dyn_into::<Element>()
        .ok()?;
    for slot in query_all(&item, "[data-field]") {
        let field = slot.get_attribute("data-field").unwrap_or_default();
        let text = member.text(&field).unwrap_or_default();
        slot.set_text_content(Some(&text));
    }
    Some(item)
}

pub struct DomDirectoryView {
    list: Element,
}

impl DomDirectoryView {
    pub fn new(list: Element) -> Self {
        Self { list }
    }

    pub fn list(&self) -> &Element {
        &self.list
    }

    fn items(&self) -> Vec<Element> {
        query_all(&self.list, &format!(".{ITEM_CLASS}"))
    }

    fn item(&self, index: usize) -> Option<Element> {
        query(&self.list, &format!("[{INDEX_ATTRIBUTE}=\"{index}\"]"))
    }

    fn filter_input(&self) -> Option<HtmlInputElement> {
        dom::by_id(FILTER_ID)?.dyn_into().ok()
    }
}

impl DirectoryView for DomDirectoryView {
    fn render_members(&self, directory: &MemberDirectory) {
        for (index, member) in directory.members().iter().enumerate() {
            let Some(item) = render_member(ITEM_TEMPLATE_ID, member) else {
                log::error!("`#{ITEM_TEMPLATE_ID}` is missing or empty");
                break;
            };
            dom::set_class(&item, ITEM_CLASS, true);
            dom::set_attribute(&item, INDEX_ATTRIBUTE, &index.to_string());
            self.list.append_child(&item).ok();
        }

        if let Some(spinner) = dom::by_id(SPINNER_ID) {
            spinner.remove();
        }
        if let Some(input) = self.filter_input() {
            input.set_placeholder("Type to find member");
            input.set_disabled(false);
            input.focus().ok();
        }
    }

    fn show_load_failed(&self) {
        if let Some(spinner) = dom::by_id(SPINNER_ID) {
            spinner.set_inner_html(r#"<i class="fa fa-warning" style="color:red"></i>"#);
        }
    }

    fn set_item_shown(&self, index: usize, shown: bool) {
        if let Some(item) = self.item(index) {
            dom::set_style(&item, "display", if shown { "" } else { "none" });
        }
    }

    fn set_no_match(&self, visible: bool) {
        if let Some(no_match) = dom::by_id(NO_MATCH_ID) {
            dom::set_hidden(&no_match, !visible);
        }
    }

    fn set_active(&self, index: usize) {
        for item in self.items() {
            dom::set_class(&item, "active", false);
        }
        if let Some(item) = self.item(index) {
            dom::set_class(&item, "active", true);
        }
    }

    fn set_filter_text(&self, text: &str) {
        if let Some(input) = self.filter_input() {
            input.set_value(text);
        }
    }

    fn reveal_review(&self) {
        if let Some(placeholder) = dom::by_id(REVIEW_PLACEHOLDER_ID) {
            dom::set_hidden(&placeholder, true);
        }
        if let Some(review) = dom::by_id(REVIEW_ID) {
            dom::set_class(&review, "invisible", false);
        }
    }
}

/// Directory index of the list item containing `target`.
pub fn clicked_index(target: &Element) -> Option<usize> {
    target
        .closest(&format!(".{ITEM_CLASS}"))
        .ok()
        .flatten()?
        .get_attribute(INDEX_ATTRIBUTE)?
        .parse()
        .ok()
}

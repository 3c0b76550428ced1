//! Icon checkbox wiring for `.checkbox-group` and `.checkbox-text`.

use zoon::wasm_bindgen::JsCast;
use zoon::web_sys::{Element, HtmlInputElement};

use super::dom::{self, Listener, query, query_all};
use crate::form::checkbox::{icon_swap, text_marks_checked};

pub const GROUP_SELECTOR: &str = ".checkbox-group";
pub const TEXT_GROUP_SELECTOR: &str = ".checkbox-text";
const CHECKBOX_SELECTOR: &str = "input[type=checkbox]";
const TEXT_ADDON_SELECTOR: &str = ".input-group-addon";
const CHECKED_ICON: &str = "data-checked-icon";
const UNCHECKED_ICON: &str = "data-unchecked-icon";

pub fn set_icon(group: &Element, checked: bool) {
    let Some(icon) = query(group, "i") else {
        return;
    };
    let checked_icon = icon.get_attribute(CHECKED_ICON).unwrap_or_default();
    let unchecked_icon = icon.get_attribute(UNCHECKED_ICON).unwrap_or_default();
    let swap = icon_swap(&checked_icon, &unchecked_icon, checked);
    for class in swap.remove {
        dom::set_class(&icon, class, false);
    }
    for class in swap.add {
        dom::set_class(&icon, class, true);
    }
}

fn checkbox_of(group: &Element) -> Option<HtmlInputElement> {
    query(group, CHECKBOX_SELECTOR)?.dyn_into().ok()
}

fn sync_group(group: &Element) {
    let checked = checkbox_of(group).is_some_and(|checkbox| checkbox.checked());
    set_icon(group, checked);
}

/// Sync every icon under `root` to its control, then keep it in sync.
pub fn watch_checkboxes(root: &Element) -> Vec<Listener> {
    let mut listeners = Vec::new();

    for group in query_all(root, GROUP_SELECTOR) {
        sync_group(&group);
        let Some(checkbox) = checkbox_of(&group) else {
            continue;
        };

        let clicked = group.clone();
        let toggled = checkbox.clone();
        listeners.push(Listener::new(&group, "click", move |event| {
            // The checkbox toggles itself; its `change` syncs the icon.
            let on_checkbox = event
                .target()
                .and_then(|target| target.dyn_into::<Element>().ok())
                .is_some_and(|target| target == *toggled.unchecked_ref::<Element>());
            if on_checkbox {
                return;
            }
            toggled.set_checked(!toggled.checked());
            sync_group(&clicked);
        }));

        let changed = group.clone();
        listeners.push(Listener::new(&checkbox, "change", move |_| sync_group(&changed)));
    }

    for group in query_all(root, TEXT_GROUP_SELECTOR) {
        let Some(input) = query(&group, "input").and_then(|input| input.dyn_into::<HtmlInputElement>().ok()) else {
            continue;
        };
        for event in ["change", "keyup"] {
            let typed = group.clone();
            let source = input.clone();
            listeners.push(Listener::new(&input, event, move |_| {
                set_icon(&typed, text_marks_checked(&source.value()));
            }));
        }
        for addon in query_all(&group, TEXT_ADDON_SELECTOR) {
            let target = input.clone();
            listeners.push(Listener::new(&addon, "click", move |_| {
                target.focus().ok();
            }));
        }
    }

    listeners
}

#[cfg(all(test, target_arch = "wasm32"))]
mod tests {
    use wasm_bindgen_test::*;
    use zoon::web_sys;

    use super::*;

    wasm_bindgen_test_configure!(run_in_browser);

    fn fixture(html: &str) -> Element {
        let document = dom::document().unwrap();
        let root = document.create_element("div").unwrap();
        root.set_inner_html(html);
        document.body().unwrap().append_child(&root).unwrap();
        root
    }

    fn icon_classes(root: &Element) -> String {
        query(root, "i").unwrap().class_name()
    }

    #[wasm_bindgen_test]
    fn group_click_toggles_checkbox_and_icon() {
        let root = fixture(
            r#"<div class="checkbox-group"><input type="checkbox" name="volunteer" hidden>
               <i class="fa" data-checked-icon="fa-check-square-o" data-unchecked-icon="fa-square-o"></i></div>"#,
        );
        let listeners = watch_checkboxes(&root);
        assert_eq!(icon_classes(&root), "fa fa-square-o");

        let icon: web_sys::HtmlElement = query(&root, "i").unwrap().dyn_into().unwrap();
        icon.click();
        let checkbox = checkbox_of(&query(&root, GROUP_SELECTOR).unwrap()).unwrap();
        assert!(checkbox.checked());
        assert_eq!(icon_classes(&root), "fa fa-check-square-o");
        drop(listeners);
        root.remove();
    }

    #[wasm_bindgen_test]
    fn text_group_icon_follows_the_value() {
        let root = fixture(
            r#"<div class="checkbox-text"><span class="input-group-addon">
               <i data-checked-icon="fa-check" data-unchecked-icon="fa-times"></i></span>
               <input type="text" name="other_interest"></div>"#,
        );
        let listeners = watch_checkboxes(&root);
        let input: HtmlInputElement = query(&root, "input").unwrap().dyn_into().unwrap();
        input.set_value("Bees");
        input.dispatch_event(&web_sys::Event::new("keyup").unwrap()).unwrap();
        assert_eq!(icon_classes(&root), "fa-check");

        input.set_value("");
        input.dispatch_event(&web_sys::Event::new("change").unwrap()).unwrap();
        assert_eq!(icon_classes(&root), "fa-times");
        drop(listeners);
        root.remove();
    }
}

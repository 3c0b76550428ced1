//! Renew page: pick a member from the filtered list, the renewal form is
//! filled with their current details.

use std::cell::{Cell, RefCell};

use deca_protocol::MemberRecord;

use super::filter::{FilterUpdate, LiveFilter};
use super::{MemberDirectory, fetch_failure_alert, fetch_members};
use crate::config::ClientConfig;
use crate::error::ClientError;
use crate::form::{FormView, InputShape, input_shape};
use crate::http::Transport;
use crate::modal::ModalView;
use crate::page::{self, Page};
use crate::submit::SubmitController;

/// The list side of the renew page.
pub trait DirectoryView {
    /// Render one item per member in index order and make the filter usable.
    fn render_members(&self, directory: &MemberDirectory);

    /// Loading failed: swap the spinner for a warning marker.
    fn show_load_failed(&self);

    fn set_item_shown(&self, index: usize, shown: bool);

    fn set_no_match(&self, visible: bool);

    /// Mark `index` as the active item, clearing the previous one.
    fn set_active(&self, index: usize);

    fn set_filter_text(&self, text: &str);

    fn reveal_review(&self);
}

/// `true` for the key that should blur the filter input (phone "Go").
pub fn blurs_filter(key: &str) -> bool {
    key == "Enter"
}

/// Write a member's fields into the form. Checkbox groups are re-derived
/// from the divider-joined value, radios select the matching option and
/// `null` fills as an empty string.
pub fn fill_member_form(form: &impl FormView, member: &MemberRecord, divider: &str) {
    let controls = form.controls();
    for (name, _) in member.iter() {
        let value = member.text(name).unwrap_or_default();
        match input_shape(&controls, name) {
            InputShape::Missing => {}
            InputShape::Single => form.set_value(name, &value),
            InputShape::CheckboxGroup => {
                let values: Vec<&str> = value.split(divider).collect();
                form.set_checked_values(name, &values);
            }
            InputShape::RadioGroup => form.select_radio(name, &value),
        }
    }
}

pub struct RenewDirectory<V> {
    directory: MemberDirectory,
    filter: RefCell<LiveFilter>,
    view: V,
    selected: Cell<Option<usize>>,
}

impl<V: DirectoryView> RenewDirectory<V> {
    /// Render the list, report the initial count and apply a filter term
    /// taken from the URL fragment.
    pub fn mount(directory: MemberDirectory, view: V, search_fields: &[String], initial_filter: Option<String>) -> Self {
        view.render_members(&directory);
        let filter = LiveFilter::new((0..directory.len()).map(|index| directory.search_text(index, search_fields)));
        view.set_no_match(filter.shown_count() == 0);
        let renew = Self {
            directory,
            filter: RefCell::new(filter),
            view,
            selected: Cell::new(None),
        };
        if let Some(term) = initial_filter {
            renew.view.set_filter_text(&term);
            renew.on_change(&term);
        }
        renew
    }

    pub fn directory(&self) -> &MemberDirectory {
        &self.directory
    }

    pub fn view(&self) -> &V {
        &self.view
    }

    pub fn selected(&self) -> Option<usize> {
        self.selected.get()
    }

    pub fn on_change(&self, text: &str) {
        let update = self.filter.borrow_mut().apply(text);
        self.show(update);
    }

    pub fn on_keystroke(&self) -> u64 {
        self.filter.borrow_mut().keystroke()
    }

    pub fn on_settle(&self, token: u64, text: &str) {
        let update = self.filter.borrow_mut().settle(token, text);
        if let Some(update) = update {
            self.show(update);
        }
    }

    fn show(&self, update: FilterUpdate) {
        for (index, shown) in &update.toggled {
            self.view.set_item_shown(*index, *shown);
        }
        self.view.set_no_match(update.no_match());
    }

    /// Item clicked: fill `controller`'s form with that member.
    pub fn select<F, M, T, P>(&self, index: usize, controller: &SubmitController<F, M, T, P>) -> bool
    where
        F: FormView,
        M: ModalView,
        T: Transport,
        P: Page,
    {
        let Some(member) = self.directory.get(index) else {
            log::warn!("selected member #{index} is not in the list");
            return false;
        };
        self.view.set_active(index);
        controller.reset_validation();
        fill_member_form(controller.form(), member, &controller.config().multivalue_divider);
        self.view.reveal_review();
        self.selected.set(Some(index));
        true
    }
}

/// Fetch the list and mount it; on failure the user gets a blocking alert.
pub async fn load<V: DirectoryView>(
    transport: &impl Transport,
    page: &impl Page,
    config: &ClientConfig,
    view: V,
) -> Result<RenewDirectory<V>, ClientError> {
    match fetch_members(transport, &config.endpoints.all_members).await {
        Ok(directory) => Ok(RenewDirectory::mount(
            directory,
            view,
            &config.directory.search_fields,
            page::fragment_term(page),
        )),
        Err(error) => {
            view.show_load_failed();
            page.alert(&fetch_failure_alert(&error));
            Err(error)
        }
    }
}

#[cfg(test)]
mod tests {
    use std::rc::Rc;

    use futures::executor::block_on;

    use super::*;
    use crate::common::{FormKind, FormMode};
    use crate::directory::tests::{MEMBERS_JSON, directory};
    use crate::form::Control;
    use crate::form::validator::Rule;
    use crate::page::tests::FakePage;
    use crate::submit::tests::{FakeForm, FakeModalView, ScriptedTransport};

    #[derive(Default)]
    struct FakeDirectoryView {
        rendered: Cell<usize>,
        load_failed: Cell<bool>,
        hidden: RefCell<Vec<usize>>,
        no_match: RefCell<Vec<bool>>,
        active: Cell<Option<usize>>,
        filter_text: RefCell<String>,
        review_revealed: Cell<bool>,
    }

    impl DirectoryView for FakeDirectoryView {
        fn render_members(&self, directory: &MemberDirectory) {
            self.rendered.set(directory.len());
        }

        fn show_load_failed(&self) {
            self.load_failed.set(true);
        }

        fn set_item_shown(&self, index: usize, shown: bool) {
            let mut hidden = self.hidden.borrow_mut();
            hidden.retain(|item| *item != index);
            if !shown {
                hidden.push(index);
            }
        }

        fn set_no_match(&self, visible: bool) {
            self.no_match.borrow_mut().push(visible);
        }

        fn set_active(&self, index: usize) {
            self.active.set(Some(index));
        }

        fn set_filter_text(&self, text: &str) {
            *self.filter_text.borrow_mut() = text.to_owned();
        }

        fn reveal_review(&self) {
            self.review_revealed.set(true);
        }
    }

    fn search_fields() -> Vec<String> {
        crate::config::DirectoryOptions::default().search_fields
    }

    fn renew_form() -> Vec<Control> {
        vec![
            Control::text("first_name", "").with_rules([Rule::Required]),
            Control::text("email", "old@example.com"),
            Control::checkbox("volunteer_interests", "Gardening", false),
            Control::checkbox("volunteer_interests", "Events", false),
            Control::checkbox("volunteer_interests", "Cooking", true),
            Control::radio("paid_by", "cash", false),
            Control::radio("paid_by", "cheque", true),
        ]
    }

    #[test]
    fn fill_rederives_groups_and_blanks_nulls() {
        let form = FakeForm::new(renew_form());
        let directory = directory();
        fill_member_form(&form, directory.get(0).unwrap(), "; ");
        assert_eq!(form.value("first_name").as_deref(), Some("Ann"));
        let checked: Vec<(String, bool)> = form
            .controls()
            .into_iter()
            .filter(|control| control.kind.is_checkable())
            .map(|control| (control.value, control.checked))
            .collect();
        assert_eq!(
            checked,
            [
                ("Gardening".into(), true),
                ("Events".into(), true),
                ("Cooking".into(), false),
                ("cash".into(), true),
                ("cheque".into(), false),
            ]
        );

        fill_member_form(&form, directory.get(1).unwrap(), "; ");
        assert_eq!(form.value("email").as_deref(), Some(""));
    }

    #[test]
    fn mount_reports_count_and_applies_fragment() {
        let renew = RenewDirectory::mount(
            directory(),
            FakeDirectoryView::default(),
            &search_fields(),
            Some("stone".into()),
        );
        assert_eq!(renew.view().rendered.get(), 3);
        assert_eq!(*renew.view().filter_text.borrow(), "stone");
        assert_eq!(*renew.view().hidden.borrow(), [0, 2]);
        assert_eq!(*renew.view().no_match.borrow(), [false, false]);
    }

    #[test]
    fn filter_without_matches_shows_indicator() {
        let renew = RenewDirectory::mount(directory(), FakeDirectoryView::default(), &search_fields(), None);
        let token = renew.on_keystroke();
        renew.on_settle(token, "nobody");
        assert_eq!(renew.view().no_match.borrow().last(), Some(&true));
        renew.on_change("");
        assert!(renew.view().hidden.borrow().is_empty());
    }

    #[test]
    fn select_fills_form_and_resets_validation() {
        let controller = SubmitController::new(
            FormKind::Member(FormMode::Renew),
            Rc::new(ClientConfig::default()),
            FakeForm::new(renew_form()),
            FakeModalView::default(),
            ScriptedTransport::default(),
            FakePage::default(),
        )
        .unwrap();
        block_on(controller.submit(None));
        assert!(controller.form().annotated.borrow().is_some());

        let renew = RenewDirectory::mount(directory(), FakeDirectoryView::default(), &search_fields(), None);
        assert!(renew.select(2, &controller));
        assert!(controller.form().annotated.borrow().is_none());
        assert_eq!(controller.form().value("first_name").as_deref(), Some("Cy"));
        assert_eq!(renew.view().active.get(), Some(2));
        assert!(renew.view().review_revealed.get());
        assert_eq!(renew.selected(), Some(2));
        assert!(!renew.select(7, &controller));
    }

    #[test]
    fn load_failure_alerts() {
        let transport = ScriptedTransport::replying(500, "INTERNAL SERVER ERROR", "boom");
        let page = FakePage::default();
        let result = block_on(load(&transport, &page, &ClientConfig::default(), FakeDirectoryView::default()));
        assert!(result.is_err());
        assert_eq!(
            *page.alerts.borrow(),
            ["Failed to load member list. Reload the page to try again.\n\n500: INTERNAL SERVER ERROR: boom"]
        );
    }

    #[test]
    fn load_uses_fragment_as_filter() {
        let transport = ScriptedTransport::replying(200, "OK", MEMBERS_JSON);
        let page = FakePage {
            fragment: "cy%40example".into(),
            ..FakePage::default()
        };
        let renew = block_on(load(&transport, &page, &ClientConfig::default(), FakeDirectoryView::default())).unwrap();
        assert_eq!(*renew.view().filter_text.borrow(), "cy@example");
        assert_eq!(*renew.view().hidden.borrow(), [0, 1]);
    }

    #[test]
    fn enter_blurs_filter() {
        assert!(blurs_filter("Enter"));
        assert!(!blurs_filter("a"));
    }
}

//! Icon checkboxes. A `.checkbox-group` wraps a hidden checkbox and an
//! `<i>` whose classes come from `data-checked-icon` / `data-unchecked-icon`.
//! A `.checkbox-text` group marks its icon checked while its text input has
//! a value.

/// Class changes that make an icon show `checked`.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct IconSwap<'a> {
    pub remove: Vec<&'a str>,
    pub add: Vec<&'a str>,
}

pub fn icon_swap<'a>(checked_icon: &'a str, unchecked_icon: &'a str, checked: bool) -> IconSwap<'a> {
    let (shown, hidden) = if checked {
        (checked_icon, unchecked_icon)
    } else {
        (unchecked_icon, checked_icon)
    };
    let add: Vec<&str> = shown.split_whitespace().collect();
    // Classes both icons share stay on the element.
    let remove = hidden.split_whitespace().filter(|class| !add.contains(class)).collect();
    IconSwap { remove, add }
}

pub fn text_marks_checked(value: &str) -> bool {
    !value.is_empty()
}

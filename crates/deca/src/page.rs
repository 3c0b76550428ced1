//! The hosting window: framing, URLs and navigation.

use crate::common::FormMode;
use crate::http::decode_uri_component;

pub trait Page {
    /// `window !== window.top`.
    fn is_framed(&self) -> bool;

    /// `document.referrer`, empty when the browser withholds it.
    fn referrer(&self) -> String;

    fn document_url(&self) -> String;

    /// Location hash without the leading `#`, still percent-encoded.
    fn fragment(&self) -> String;

    fn navigate(&self, url: &str);

    /// Navigate the top-level window (leaves any iframe).
    fn navigate_top(&self, url: &str);

    /// Blocking `window.alert`.
    fn alert(&self, message: &str);
}

/// URL of the page that embeds the form: the referrer when framed,
/// otherwise the form page itself.
pub fn embedder_url(page: &impl Page) -> String {
    if page.is_framed() {
        page.referrer()
    } else {
        page.document_url()
    }
}

/// Decoded fragment, `None` when empty.
pub fn fragment_term(page: &impl Page) -> Option<String> {
    let fragment = page.fragment();
    let fragment = fragment.strip_prefix('#').unwrap_or(&fragment);
    (!fragment.is_empty()).then(|| decode_uri_component(fragment).into_owned())
}

/// `scheme://host[:port]` of an absolute URL.
pub fn origin_of(url: &str) -> Option<String> {
    let (scheme, rest) = url.split_once("://")?;
    let authority = rest.split(['/', '?', '#']).next()?;
    (!scheme.is_empty() && !authority.is_empty()).then(|| format!("{scheme}://{authority}"))
}

/// Where the success modal's "done" control leads.
///
/// A fragment on the form page wins, except on the renew page where it is
/// the directory filter term. Self-serve pages otherwise return to the
/// embedding site's origin; everything else goes to `home`.
pub fn done_target(page: &impl Page, mode: FormMode, home: &str) -> String {
    if mode != FormMode::Renew {
        if let Some(target) = fragment_term(page) {
            return target;
        }
    }
    if mode == FormMode::SelfServe {
        if let Some(origin) = origin_of(&page.referrer()) {
            return origin;
        }
    }
    home.to_owned()
}

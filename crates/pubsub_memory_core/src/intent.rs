use url::form_urlencoded;
use url::Url;

use crate::MemorySettings;

/// Whether the page location asks for the publish dialog to be open.
///
/// Checks, in order: a raw substring of the lowercased href, the top-level
/// query string, and a query string embedded in the hash fragment.
pub fn has_publish_modal_intent(href: &str, settings: &MemorySettings) -> bool {
    let param = settings.modal_param.as_str();
    let sentinel = settings.modal_sentinel.as_str();

    let needle = format!("{param}={sentinel}").to_lowercase();
    if href.to_lowercase().contains(&needle) {
        return true;
    }

    let Ok(url) = Url::parse(href) else {
        return false;
    };

    if query_has_sentinel(url.query().unwrap_or_default(), param, sentinel) {
        return true;
    }

    url.fragment()
        .and_then(|hash| hash.split_once('?'))
        .is_some_and(|(_, query)| query_has_sentinel(query, param, sentinel))
}

fn query_has_sentinel(query: &str, param: &str, sentinel: &str) -> bool {
    if query.is_empty() {
        return false;
    }
    // URLSearchParams.get semantics: only the first occurrence counts.
    form_urlencoded::parse(query.as_bytes())
        .find(|(key, _)| key == param)
        .is_some_and(|(_, value)| value.eq_ignore_ascii_case(sentinel))
}

//! CSS selectors for the disclosure side-sheet fragment.
//!
//! Update these when the storefront changes its markup, and add a fixture
//! under `tests/fixtures/` capturing the new shape.

use std::sync::LazyLock;

use scraper::Selector;

fn selector(css: &str) -> Selector {
    Selector::parse(css).expect("valid CSS selector")
}

pub(crate) static RESPONSIBLE_CONTAINER: LazyLock<Selector> =
    LazyLock::new(|| selector("div#buffet-sidesheet-rsp-content-container"));

pub(crate) static MANUFACTURER_CONTAINER: LazyLock<Selector> =
    LazyLock::new(|| selector("div#buffet-sidesheet-manufacturer-content-container"));

/// One contact sub-block inside a section container.
pub(crate) static CONTACT_BLOCK: LazyLock<Selector> =
    LazyLock::new(|| selector(".a-box-inner"));

/// Responsible-party names are bold spans.
pub(crate) static RESPONSIBLE_NAME: LazyLock<Selector> =
    LazyLock::new(|| selector("span.a-size-base.a-text-bold"));

/// Manufacturer names are headings.
pub(crate) static MANUFACTURER_NAME: LazyLock<Selector> = LazyLock::new(|| selector("h6"));

pub(crate) static LINE_LIST: LazyLock<Selector> = LazyLock::new(|| selector("ul"));

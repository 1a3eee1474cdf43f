//! Rendering seam between a payload and a scannable image.
//!
//! Drawing the code itself happens elsewhere; a renderer only turns payload
//! text into whatever handle the caller hands out (typically an image URL).

use url::Url;

/// Turns payload text into a handle for its scannable image.
pub trait QrRenderer {
    fn render(&self, payload: &str) -> String;
}

impl<F> QrRenderer for F
where
    F: Fn(&str) -> String,
{
    fn render(&self, payload: &str) -> String {
        self(payload)
    }
}

/// Points at an image service that draws the code from a `data` query parameter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QrServerRenderer {
    base: Url,
}

impl QrServerRenderer {
    pub fn new(base: Url) -> Self {
        Self { base }
    }
}

impl QrRenderer for QrServerRenderer {
    fn render(&self, payload: &str) -> String {
        let mut url = self.base.clone();
        url.query_pairs_mut().append_pair("data", payload);
        url.into()
    }
}

//! Media block canonicalization for article bodies.
//!
//! Dzen wraps every image in a `data-block-type="image"` block stuffed with
//! UI chrome: lazy-load placeholders, zoom buttons, caption siblings. Feed
//! readers only need the image, so each such block is emptied down to its
//! first `<img>`. Other blocks pass through untouched.
//!
//! Attribute order survives the round trip because `scraper` is built with
//! its `deterministic` feature; without it every element's attributes come
//! back sorted by name.

use once_cell::sync::Lazy;
use scraper::{Html, Selector};
use std::collections::HashSet;

static MEDIA_BLOCK: Lazy<Selector> = Lazy::new(|| Selector::parse(r#"[data-block-type="image"]"#).unwrap());
static IMAGE: Lazy<Selector> = Lazy::new(|| Selector::parse("img").unwrap());

/// Rewrite every media block in `markup` so its only child is its image.
///
/// Idempotent: an already canonical block is left exactly as it was.
pub fn canonicalize_media_blocks(markup: &str) -> String {
    let mut fragment = Html::parse_fragment(markup);

    let mut claimed = HashSet::new();
    let rewrites: Vec<_> = fragment
        .select(&MEDIA_BLOCK)
        .filter_map(|block| {
            let image = block.select(&IMAGE).next()?;
            // A nested media block whose image was already hoisted into its
            // parent is left alone.
            if !claimed.insert(image.id()) {
                return None;
            }
            let children: Vec<_> = block.children().map(|child| child.id()).collect();
            Some((block.id(), image.id(), children))
        })
        .collect();

    for (block_id, image_id, children) in rewrites {
        for child_id in children {
            if let Some(mut child) = fragment.tree.get_mut(child_id) {
                child.detach();
            }
        }
        if let Some(mut block) = fragment.tree.get_mut(block_id) {
            block.append_id(image_id);
        }
    }

    fragment.root_element().inner_html()
}

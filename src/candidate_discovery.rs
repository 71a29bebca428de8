//! Extracts, resolves, filters, and ranks image references from an HTML page.

use std::collections::HashSet;

use html5ever::parse_document;
use html5ever::tendril::TendrilSink;
use html5ever::tree_builder::TreeBuilderOpts;
use html5ever::ParseOpts;
use log::debug;
use markup5ever_rcdom::{Handle, NodeData, RcDom};
use url::Url;

use crate::candidate_scoring::{has_supported_image_extension, score_url};

/// Absolute image URL paired with its heuristic score.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RankedCandidate {
    pub url: String,
    pub score: i32,
}

/// Raw attribute references grouped by the element kind they came from.
#[derive(Debug, Default)]
struct ExtractedReferences {
    images: Vec<String>,
    sources: Vec<String>,
    anchors: Vec<String>,
}

impl ExtractedReferences {
    fn into_ordered(self) -> Vec<String> {
        let mut all = self.images;
        all.extend(self.sources);
        all.extend(self.anchors);
        all
    }
}

/// Returns the URL token of each comma-separated `srcset` entry, dropping descriptors.
pub fn parse_srcset(srcset: &str) -> Vec<String> {
    srcset
        .split(',')
        .filter_map(|entry| entry.trim().split(' ').next())
        .filter(|url| !url.is_empty())
        .map(str::to_string)
        .collect()
}

fn attribute_value(node: &Handle, attribute: &str) -> Option<String> {
    let NodeData::Element { attrs, .. } = &node.data else {
        return None;
    };
    let attrs = attrs.borrow();
    let value = attrs
        .iter()
        .find(|attr| attr.name.local.as_ref() == attribute)
        .map(|attr| attr.value.to_string())?;
    if value.is_empty() {
        return None;
    }
    Some(value)
}

fn element_name(node: &Handle) -> Option<String> {
    match &node.data {
        NodeData::Element { name, .. } => Some(name.local.as_ref().to_ascii_lowercase()),
        _ => None,
    }
}

fn collect_references(document: &Handle) -> ExtractedReferences {
    let mut references = ExtractedReferences::default();
    let mut pending = vec![document.clone()];

    while let Some(node) = pending.pop() {
        match element_name(&node).as_deref() {
            Some("img") => {
                if let Some(src) = attribute_value(&node, "src") {
                    references.images.push(src);
                }
                if let Some(srcset) = attribute_value(&node, "srcset") {
                    references.images.extend(parse_srcset(&srcset));
                }
            }
            Some("source") => {
                if let Some(srcset) = attribute_value(&node, "srcset") {
                    references.sources.extend(parse_srcset(&srcset));
                }
            }
            Some("a") => {
                if let Some(href) = attribute_value(&node, "href") {
                    if has_supported_image_extension(&href) {
                        references.anchors.push(href);
                    }
                }
            }
            _ => {}
        }

        let children = node.children.borrow();
        for child in children.iter().rev() {
            pending.push(child.clone());
        }
    }

    references
}

/// Resolves references against `base`, drops unsupported extensions, and dedups in first-seen order.
pub fn resolve_and_filter(base: &Url, references: &[String]) -> Vec<String> {
    let mut seen = HashSet::new();
    let mut unique = Vec::new();
    for reference in references {
        let resolved = match base.join(reference.trim()) {
            Ok(resolved) => resolved.to_string(),
            Err(err) => {
                debug!("Skipping unresolvable reference '{}': {}", reference, err);
                continue;
            }
        };
        if !has_supported_image_extension(&resolved) {
            continue;
        }
        if seen.insert(resolved.clone()) {
            unique.push(resolved);
        }
    }
    unique
}

/// Sorts by descending score; equal scores keep discovery order.
pub fn rank_candidates(urls: Vec<String>) -> Vec<RankedCandidate> {
    let mut ranked: Vec<RankedCandidate> = urls
        .into_iter()
        .map(|url| {
            let score = score_url(&url);
            RankedCandidate { url, score }
        })
        .collect();
    ranked.sort_by(|left, right| right.score.cmp(&left.score));
    ranked
}

/// Finds every image candidate on the page and ranks them best-first.
pub fn discover_candidates(html: &str, base_url: &str) -> Result<Vec<RankedCandidate>, String> {
    let base = Url::parse(base_url)
        .map_err(|err| format!("Invalid page URL '{}': {}", base_url, err))?;
    // Scripting off so `<noscript>` bodies parse as elements.
    let opts = ParseOpts {
        tree_builder: TreeBuilderOpts {
            scripting_enabled: false,
            ..Default::default()
        },
        ..Default::default()
    };
    let dom = parse_document(RcDom::default(), opts).one(html);
    let references = collect_references(&dom.document).into_ordered();
    debug!("Extracted {} raw image references", references.len());
    let unique = resolve_and_filter(&base, &references);
    Ok(rank_candidates(unique))
}

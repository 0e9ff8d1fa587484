//! SVG template renderer.
//!
//! Templates are ordinary SVG files whose value slots are elements addressed
//! by a stable `id` attribute, with an optional `<id>_dots` sibling holding a
//! dot leader that right-justifies the value. The renderer mutates the
//! document tree in place and writes it back with an XML declaration.

use crate::stats::Stats;
use anyhow::{Context, Result};
use std::fs::File;
use std::io::BufReader;
use std::path::Path;
use xmltree::{Element, EmitterConfig, XMLNode};

/// Replace the text content of the first element whose `id` attribute equals
/// `id`. An absent id is a no-op so templates may omit optional fields.
///
/// If the parent element declares an `x` offset, it is copied onto the element
/// itself to re-pin the text anchor after external layout tooling has moved
/// the parent.
pub fn find_and_replace(root: &mut Element, id: &str, text: &str) {
    replace_below(root, id, text);
}

fn replace_below(parent: &mut Element, id: &str, text: &str) -> bool {
    let parent_x = parent.attributes.get("x").cloned();

    for node in &mut parent.children {
        let XMLNode::Element(el) = node else { continue };

        if el.attributes.get("id").is_some_and(|v| v == id) {
            set_text(el, text);
            if let Some(x) = &parent_x {
                el.attributes.insert("x".to_string(), x.clone());
            }
            return true;
        }

        if replace_below(el, id, text) {
            return true;
        }
    }

    false
}

fn set_text(el: &mut Element, text: &str) {
    el.children.retain(|n| !matches!(n, XMLNode::Text(_)));
    el.children.insert(0, XMLNode::Text(text.to_string()));
}

/// Dot leader for a given amount of padding, total over all inputs.
pub fn dot_leader(padding: usize) -> String {
    match padding {
        0 => String::new(),
        1 => " ".to_string(),
        2 => ". ".to_string(),
        n => format!(" {} ", ".".repeat(n)),
    }
}

/// Group an integer with comma thousands separators.
pub fn group_thousands(n: i64) -> String {
    let digits = n.unsigned_abs().to_string();
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);

    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }

    if n < 0 {
        format!("-{grouped}")
    } else {
        grouped
    }
}

/// Write `text` into the `id` slot and the matching dot leader into the
/// `<id>_dots` slot, padding the pair out to `width` columns.
pub fn justify_format(root: &mut Element, id: &str, text: &str, width: usize) {
    let padding = width.saturating_sub(text.chars().count());
    find_and_replace(root, id, text);
    find_and_replace(root, &format!("{id}_dots"), &dot_leader(padding));
}

/// Rewrite one template file in place with every value from the snapshot.
/// A malformed template is fatal; slots the template does not declare are
/// skipped silently.
pub fn overwrite(path: &Path, stats: &Stats, age: &str) -> Result<()> {
    let file =
        File::open(path).with_context(|| format!("cannot open template {}", path.display()))?;
    let mut root = Element::parse(BufReader::new(file))
        .map_err(|e| anyhow::anyhow!("malformed template {}: {e}", path.display()))?;

    justify_format(&mut root, "age_data", age, 0);
    justify_format(
        &mut root,
        "commit_data",
        &group_thousands(stats.commits_total as i64),
        22,
    );
    justify_format(
        &mut root,
        "star_data",
        &group_thousands(stats.stars as i64),
        14,
    );
    justify_format(
        &mut root,
        "repo_data",
        &group_thousands(stats.repos as i64),
        6,
    );
    justify_format(
        &mut root,
        "contrib_data",
        &group_thousands(stats.contributed_repos as i64),
        0,
    );
    justify_format(
        &mut root,
        "follower_data",
        &group_thousands(stats.followers as i64),
        10,
    );
    justify_format(&mut root, "loc_data", &group_thousands(stats.loc_total), 9);
    justify_format(&mut root, "loc_add", &group_thousands(stats.loc_add), 0);
    justify_format(&mut root, "loc_del", &group_thousands(stats.loc_del), 7);

    let out = File::create(path)
        .with_context(|| format!("cannot rewrite template {}", path.display()))?;
    let config = EmitterConfig::new()
        .write_document_declaration(true)
        .perform_indent(false);
    root.write_with_config(out, config)
        .map_err(|e| anyhow::anyhow!("failed to serialize {}: {e}", path.display()))?;

    Ok(())
}

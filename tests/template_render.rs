//! End-to-end template rewrite through a real file on disk.

use profile_stats::stats::Stats;
use profile_stats::svg;
use std::fs;
use xmltree::{Element, XMLNode};

const TEMPLATE: &str = r#"<svg xmlns="http://www.w3.org/2000/svg">
    <text x="20">
        <tspan id="age_data"></tspan>
        <tspan id="commit_data"></tspan>
        <tspan id="commit_data_dots"></tspan>
        <tspan id="star_data"></tspan>
        <tspan id="star_data_dots"></tspan>
        <tspan id="repo_data"></tspan>
        <tspan id="repo_data_dots"></tspan>
        <tspan id="follower_data"></tspan>
        <tspan id="follower_data_dots"></tspan>
        <tspan id="loc_data"></tspan>
        <tspan id="loc_data_dots"></tspan>
        <tspan id="loc_add"></tspan>
        <tspan id="loc_del"></tspan>
        <tspan id="loc_del_dots"></tspan>
    </text>
</svg>"#;

fn sample_stats() -> Stats {
    Stats {
        repos: 24,
        stars: 1234,
        followers: 87,
        commits_total: 4321,
        contributed_repos: 31,
        loc_add: 120_000,
        loc_del: 45_000,
        loc_total: 75_000,
    }
}

fn text_of(root: &Element, id: &str) -> Option<String> {
    for node in &root.children {
        if let XMLNode::Element(el) = node {
            if el.attributes.get("id").map(String::as_str) == Some(id) {
                return Some(el.get_text().unwrap_or_default().into_owned());
            }
            if let Some(t) = text_of(el, id) {
                return Some(t);
            }
        }
    }
    None
}

#[test]
fn overwrite_substitutes_every_slot_in_place() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("banner.svg");
    fs::write(&path, TEMPLATE).unwrap();

    let age = "22 years, 4 months, 23 days";
    svg::overwrite(&path, &sample_stats(), age).unwrap();

    let raw = fs::read_to_string(&path).unwrap();
    assert!(raw.starts_with("<?xml"), "missing XML declaration: {raw}");

    let root = Element::parse(raw.as_bytes()).unwrap();
    assert_eq!(text_of(&root, "age_data").unwrap(), age);
    assert_eq!(text_of(&root, "star_data").unwrap(), "1,234");
    // "1,234" fills 5 of 14 columns, leaving a 9-dot leader.
    assert_eq!(text_of(&root, "star_data_dots").unwrap(), " ......... ");
    assert_eq!(text_of(&root, "commit_data").unwrap(), "4,321");
    assert_eq!(text_of(&root, "repo_data").unwrap(), "24");
    assert_eq!(text_of(&root, "repo_data_dots").unwrap(), " .... ");
    assert_eq!(text_of(&root, "follower_data").unwrap(), "87");
    assert_eq!(text_of(&root, "loc_data").unwrap(), "75,000");
    assert_eq!(text_of(&root, "loc_data_dots").unwrap(), " ... ");
    assert_eq!(text_of(&root, "loc_add").unwrap(), "120,000");
    assert_eq!(text_of(&root, "loc_del").unwrap(), "45,000");
}

#[test]
fn overwrite_tolerates_templates_missing_optional_slots() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("minimal.svg");
    fs::write(
        &path,
        r#"<svg xmlns="http://www.w3.org/2000/svg"><text><tspan id="star_data"></tspan></text></svg>"#,
    )
    .unwrap();

    svg::overwrite(&path, &sample_stats(), "1 year, 0 months, 0 days").unwrap();

    let root = Element::parse(fs::read_to_string(&path).unwrap().as_bytes()).unwrap();
    assert_eq!(text_of(&root, "star_data").unwrap(), "1,234");
}

#[test]
fn overwrite_fails_on_malformed_template() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("broken.svg");
    fs::write(&path, "<svg><text>").unwrap();

    let err = svg::overwrite(&path, &sample_stats(), "").unwrap_err();
    assert!(err.to_string().contains("malformed template"));
}

//! Scenario tests for the world exporter
//!
//! Scenes are built in memory, exported to a string and checked both for
//! exact fragments and for structural well-formedness.

mod scenarios;

use std::collections::HashSet;

use crate::export::identifier::is_legal;
use crate::export::{ExportOptions, ExportStats, OverrideTable, PathReference, WebotsExporter};
use crate::foundation::math::Vec3;
use crate::scene::{Face, Mesh, Polygon, Scene};

/// Scene directory the test resolver assumes
pub(super) const SCENE_DIR: &str = "/scenes";

/// Output directory the test resolver assumes
pub(super) const OUTPUT_DIR: &str = "/out";

/// Axis-aligned cube of half-size 1 made of six quads
pub(super) fn cube_mesh(name: &str) -> Mesh {
    let mut mesh = Mesh::new(name);
    mesh.vertices = vec![
        Vec3::new(-1.0, -1.0, -1.0),
        Vec3::new(1.0, -1.0, -1.0),
        Vec3::new(1.0, 1.0, -1.0),
        Vec3::new(-1.0, 1.0, -1.0),
        Vec3::new(-1.0, -1.0, 1.0),
        Vec3::new(1.0, -1.0, 1.0),
        Vec3::new(1.0, 1.0, 1.0),
        Vec3::new(-1.0, 1.0, 1.0),
    ];
    mesh.faces = [
        [0, 3, 2, 1],
        [4, 5, 6, 7],
        [0, 1, 5, 4],
        [1, 2, 6, 5],
        [2, 3, 7, 6],
        [3, 0, 4, 7],
    ]
    .into_iter()
    .map(|quad| Face::new(Polygon::Quad(quad)))
    .collect();
    mesh
}

/// Export `scene` into a string using a resolver rooted at [`SCENE_DIR`]
/// and [`OUTPUT_DIR`]
pub(super) fn export_with(
    scene: &mut Scene,
    options: ExportOptions,
    overrides: &OverrideTable,
) -> (String, ExportStats) {
    let exporter = WebotsExporter::new(options);
    let mut resolver = PathReference::new(exporter.options().path_mode, SCENE_DIR, OUTPUT_DIR);
    let mut out = Vec::new();
    let stats = exporter.export(scene, overrides, &mut resolver, &mut out).unwrap();
    (String::from_utf8(out).unwrap(), stats)
}

/// Export with default options and no overrides
pub(super) fn export(scene: &mut Scene) -> String {
    export_with(scene, ExportOptions::default(), &OverrideTable::new()).0
}

/// Every `USE` follows a `DEF` of the same identifier, every identifier is
/// legal and defined once, and brackets outside string literals balance.
pub(super) fn assert_well_formed(text: &str) {
    let mut defined = HashSet::new();
    let mut tokens = text.split_whitespace();
    while let Some(token) = tokens.next() {
        match token {
            "DEF" => {
                let id = tokens.next().expect("DEF without identifier");
                assert!(is_legal(id), "illegal identifier {id}");
                assert!(defined.insert(id), "{id} defined twice");
            }
            "USE" => {
                let id = tokens.next().expect("USE without identifier");
                assert!(defined.contains(id), "USE {id} before its DEF");
            }
            _ => {}
        }
    }

    let mut depth = 0i64;
    let mut in_string = false;
    let mut escaped = false;
    for c in text.chars() {
        if in_string {
            match c {
                _ if escaped => escaped = false,
                '\\' => escaped = true,
                '"' => in_string = false,
                _ => {}
            }
            continue;
        }
        match c {
            '"' => in_string = true,
            '{' | '[' => depth += 1,
            '}' | ']' => {
                depth -= 1;
                assert!(depth >= 0, "closing bracket without opening one");
            }
            _ => {}
        }
    }
    assert_eq!(depth, 0, "unbalanced brackets");
}

/// Number of non-overlapping occurrences of `needle`
pub(super) fn count(text: &str, needle: &str) -> usize {
    text.matches(needle).count()
}

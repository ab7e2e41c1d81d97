//! Internal dependency closure

use std::collections::HashSet;

use crate::package::Package;

/// All internal packages `pkg` depends on, directly or transitively,
/// in depth-first discovery order.
///
/// Only dependencies declared with the workspace link marker are
/// followed; names absent from the snapshot are external or removed and
/// are skipped. A visited set keyed by package name guarantees
/// termination on accidental circular link edges.
pub fn dependency_closure(pkg: &Package, all: &[Package]) -> Vec<Package> {
    let mut closure = Vec::new();
    let mut visited: HashSet<String> = HashSet::new();
    walk(pkg, all, &mut visited, &mut closure);
    closure
}

fn walk(pkg: &Package, all: &[Package], visited: &mut HashSet<String>, out: &mut Vec<Package>) {
    for name in pkg.linked_dependencies() {
        if visited.contains(name) {
            continue;
        }
        let Some(dep) = all.iter().find(|p| p.name == name) else {
            continue;
        };

        visited.insert(name.to_string());
        out.push(dep.clone());
        walk(dep, all, visited, out);
    }
}

//! Helpers for treating a `serde_json::Value` as a path-addressed tree.

use serde_json::{Map, Value};

// ---

/// Set `value` at `path` under `root`, creating (or replacing) intermediate objects.
pub(super) fn set(root: &mut Value, path: &[&str], value: Value) {
    // ---
    let Some((last, parents)) = path.split_last() else {
        *root = value;
        return;
    };

    let mut node = root;
    for key in parents {
        node = object_mut(node)
            .entry(key.to_string())
            .or_insert_with(|| Value::Object(Map::new()));
    }
    object_mut(node).insert(last.to_string(), value);
}

pub(super) fn get<'a>(root: &'a Value, path: &[&str]) -> Option<&'a Value> {
    path.iter().try_fold(root, |node, key| node.get(*key))
}

/// Remove the subtree at `path`. Returns whether anything was removed.
pub(super) fn remove(root: &mut Value, path: &[&str]) -> bool {
    // ---
    let Some((last, parents)) = path.split_last() else {
        return false;
    };

    let mut node = root;
    for key in parents {
        match node.get_mut(*key) {
            Some(child) => node = child,
            None => return false,
        }
    }
    node.as_object_mut()
        .map(|obj| obj.remove(*last).is_some())
        .unwrap_or(false)
}

fn object_mut(node: &mut Value) -> &mut Map<String, Value> {
    // ---
    if !node.is_object() {
        *node = Value::Object(Map::new());
    }
    match node {
        Value::Object(map) => map,
        _ => unreachable!("node was just replaced with an object"),
    }
}

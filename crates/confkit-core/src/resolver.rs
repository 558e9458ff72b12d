//! Placeholder resolution
//!
//! A [`Resolver`] rewrites a merged configuration tree in place. The default
//! [`PlaceholderResolver`] substitutes `${path}` / `${path:default}` in every
//! string leaf, looking paths up in the tree itself.

use crate::error::Result;
use crate::placeholder::{Placeholder, Template};
use crate::value::Value;

/// Rewrites a configuration tree after it has been merged
pub trait Resolver: Send + Sync {
    /// Resolve the tree in place
    fn resolve(&self, tree: &mut Value) -> Result<()>;

    /// Get the name of this resolver
    fn name(&self) -> &str;
}

/// A simple function-based resolver
pub struct FnResolver<F>
where
    F: Fn(&mut Value) -> Result<()> + Send + Sync,
{
    name: String,
    func: F,
}

impl<F> FnResolver<F>
where
    F: Fn(&mut Value) -> Result<()> + Send + Sync,
{
    /// Create a new function-based resolver
    pub fn new(name: impl Into<String>, func: F) -> Self {
        Self {
            name: name.into(),
            func,
        }
    }
}

impl<F> Resolver for FnResolver<F>
where
    F: Fn(&mut Value) -> Result<()> + Send + Sync,
{
    fn resolve(&self, tree: &mut Value) -> Result<()> {
        (self.func)(tree)
    }

    fn name(&self) -> &str {
        &self.name
    }
}

/// The built-in `${path:default}` resolver
///
/// Every placeholder is looked up against a snapshot of the tree taken before
/// the walk, so the outcome does not depend on traversal order and looked-up
/// values are never resolved a second time. Missing paths and malformed
/// placeholders degrade to the default or to an empty string; they are not
/// errors.
#[derive(Debug, Default, Clone, Copy)]
pub struct PlaceholderResolver;

impl Resolver for PlaceholderResolver {
    fn resolve(&self, tree: &mut Value) -> Result<()> {
        let snapshot = tree.clone();
        let mut substituted = 0usize;
        resolve_node(tree, &snapshot, "", &mut substituted);
        log::debug!("Resolved placeholders in {} leaves", substituted);
        Ok(())
    }

    fn name(&self) -> &str {
        "placeholder"
    }
}

/// Resolve placeholders in `tree` with the built-in resolver
pub fn resolve(tree: &mut Value) -> Result<()> {
    PlaceholderResolver.resolve(tree)
}

fn resolve_node(value: &mut Value, root: &Value, path: &str, substituted: &mut usize) {
    let replacement = match value {
        Value::String(text) => substitute(text, root, path),
        // Raw record payloads carrying placeholders are treated as text
        Value::Bytes(bytes) => std::str::from_utf8(bytes)
            .ok()
            .and_then(|text| substitute(text, root, path)),
        Value::Sequence(items) => {
            for (i, item) in items.iter_mut().enumerate() {
                let item_path = format!("{}[{}]", path, i);
                resolve_node(item, root, &item_path, substituted);
            }
            None
        }
        Value::Mapping(map) => {
            for (key, child) in map.iter_mut() {
                let key_path = if path.is_empty() {
                    key.clone()
                } else {
                    format!("{}.{}", path, key)
                };
                resolve_node(child, root, &key_path, substituted);
            }
            None
        }
        _ => None,
    };

    if let Some(resolved) = replacement {
        *substituted += 1;
        *value = resolved;
    }
}

fn substitute(text: &str, root: &Value, path: &str) -> Option<Value> {
    let template = Template::parse(text);
    if !template.has_placeholders() {
        return None;
    }
    Some(template.render(|placeholder| lookup(root, placeholder, path)))
}

fn lookup(root: &Value, placeholder: &Placeholder<'_>, leaf_path: &str) -> String {
    let found = if placeholder.path.is_empty() {
        None
    } else {
        root.get_path(placeholder.path)
    };

    let text = match found {
        Some(Value::Mapping(_)) => {
            log::warn!(
                "Placeholder {} at '{}' references a mapping; substituting an empty string",
                placeholder.raw,
                leaf_path
            );
            String::new()
        }
        Some(value) => value.to_string(),
        None => placeholder.default.unwrap_or_default().to_string(),
    };

    log::trace!("{} at '{}' -> {:?}", placeholder.raw, leaf_path, text);
    text
}

//! Ordered transformation hooks applied around storage boundaries.
//!
//! Output filters run after a load populates the attribute map from
//! external data; input filters fold over the full map right before it is
//! narrowed to schema columns for a write. Hooks are registered explicitly,
//! in order, by the record type (see [`Entity::filters`](crate::Entity::filters)).

use std::fmt;

use tracing::debug;

use crate::attributes::AttributeMap;

/// Hook applied in place after hydration.
///
/// Writes made here go straight to the attribute map and never reach the
/// modification log.
pub type OutputFilter = fn(&mut AttributeMap);

/// Hook applied to the outgoing map before a write; returns the next map.
pub type InputFilter = fn(AttributeMap) -> AttributeMap;

/// Ordered, named input and output hooks for one record type.
///
/// # Examples
///
/// ```
/// use simple_orm_core::{AttributeMap, FilterPipeline, Value};
///
/// fn trim_title(mut map: AttributeMap) -> AttributeMap {
///     if let Some(Value::Text(t)) = map.get("title").cloned() {
///         map.insert("title", t.trim());
///     }
///     map
/// }
///
/// let pipeline = FilterPipeline::new().input("trim_title", trim_title);
/// let out = pipeline.apply_input([("title", " Hi ")].into_iter().collect());
/// assert_eq!(out.get("title"), Some(&Value::from("Hi")));
/// ```
#[derive(Clone, Default)]
pub struct FilterPipeline {
    output: Vec<(&'static str, OutputFilter)>,
    input: Vec<(&'static str, InputFilter)>,
}

impl fmt::Debug for FilterPipeline {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FilterPipeline")
            .field("output", &self.output_names().collect::<Vec<_>>())
            .field("input", &self.input_names().collect::<Vec<_>>())
            .finish()
    }
}

impl FilterPipeline {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends an output hook; hooks run in registration order.
    pub fn output(mut self, name: &'static str, hook: OutputFilter) -> Self {
        self.output.push((name, hook));
        self
    }

    /// Appends an input hook; hooks run in registration order.
    pub fn input(mut self, name: &'static str, hook: InputFilter) -> Self {
        self.input.push((name, hook));
        self
    }

    pub fn output_names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.output.iter().map(|(name, _)| *name)
    }

    pub fn input_names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.input.iter().map(|(name, _)| *name)
    }

    /// Runs every output hook against `attributes`.
    pub fn apply_output(&self, attributes: &mut AttributeMap) {
        for &(name, hook) in &self.output {
            debug!(filter = name, "applying output filter");
            hook(attributes);
        }
    }

    /// Folds `attributes` through every input hook.
    pub fn apply_input(&self, attributes: AttributeMap) -> AttributeMap {
        self.input.iter().fold(attributes, |map, &(name, hook)| {
            debug!(filter = name, "applying input filter");
            hook(map)
        })
    }
}

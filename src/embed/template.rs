//! Typed placeholder substitution for embedded text resources.

use std::marker::PhantomData;

/// A set of values substituted into one template's placeholders
pub trait TemplateVars {
    fn apply(&self, content: &str) -> String;
}

/// Embedded text bound to the variable set it expects
#[derive(Debug, Clone, Copy)]
pub struct Template<V> {
    content: &'static str,
    _vars: PhantomData<V>,
}

impl<V> Template<V> {
    pub const fn new(content: &'static str) -> Self {
        Self {
            content,
            _vars: PhantomData,
        }
    }

    /// Raw text with placeholders intact
    pub const fn content(&self) -> &'static str {
        self.content
    }
}

impl<V: TemplateVars> Template<V> {
    pub fn render(&self, vars: &V) -> String {
        vars.apply(self.content)
    }
}

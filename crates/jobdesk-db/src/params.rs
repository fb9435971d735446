//! Typed parameter values for stored-operation invocation.

/// Input parameter value. Tagged variants cover every shape the dynamic
/// payload normalizer can produce; the gateway binds each variant to the
/// matching driver type.
#[derive(Debug, Clone, PartialEq)]
pub enum ParamValue {
    /// Text parameter sized to its content; minimum size 1 so zero-length
    /// strings never produce a zero-sized binding.
    Text { value: String, size: usize },
    Int(i32),
    Float(f64),
    Bool(bool),
    /// Structured JSON passed through as raw serialized text.
    Raw(String),
    Null,
}

impl ParamValue {
    pub fn text(value: impl Into<String>) -> Self {
        let value = value.into();
        let size = value.len().max(1);
        ParamValue::Text { value, size }
    }

    pub fn raw(value: impl Into<String>) -> Self {
        ParamValue::Raw(value.into())
    }
}

/// Declared kind of an output parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputKind {
    Int,
    Text { size: usize },
}

/// A typed output-parameter placeholder the store fills in.
#[derive(Debug, Clone, Copy)]
pub struct OutputSpec {
    pub name: &'static str,
    pub kind: OutputKind,
}

impl OutputSpec {
    pub const fn int(name: &'static str) -> Self {
        OutputSpec {
            name,
            kind: OutputKind::Int,
        }
    }

    pub const fn text(name: &'static str, size: usize) -> Self {
        OutputSpec {
            name,
            kind: OutputKind::Text { size },
        }
    }
}

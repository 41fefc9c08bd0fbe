//! Script formatter with a degrading fallback chain.
//!
//! `format` prefers the primary engine when it is installed, falls back to the
//! heuristic reformatter when it is not (or when it fails), and returns the
//! input unchanged as a last resort. It never returns an error.

mod engine;
mod heuristic;

pub use engine::{EngineState, ExternalBeautifier, FormatError, FormatterEngine, PrettyPrinter};
pub use heuristic::heuristic_format;

/// Cheap to clone; clones share the engine cell.
#[derive(Clone, Default)]
pub struct Formatter {
    engine: FormatterEngine,
}

impl Formatter {
    pub fn new(engine: FormatterEngine) -> Self {
        Self { engine }
    }

    /// A formatter whose engine never becomes available.
    pub fn heuristic_only() -> Self {
        Self::default()
    }

    pub fn engine(&self) -> &FormatterEngine {
        &self.engine
    }

    /// Formats `code`. Total: any internal failure degrades, never propagates.
    pub async fn format(&self, code: &str) -> String {
        // The state is read once; an engine installed mid-call is not used.
        let state = self.engine.current();
        if let EngineState::Available(engine) = state {
            match engine.pretty_print(code).await {
                Ok(out) => return out,
                Err(e) => {
                    tracing::debug!(engine = engine.name(), error = %e, "engine failed; using heuristic")
                }
            }
        }
        fallback(code)
    }
}

fn fallback(code: &str) -> String {
    let out = heuristic_format(code);
    if out.trim().is_empty() && !code.trim().is_empty() {
        return code.to_string();
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::Arc;

    struct Failing;

    #[async_trait]
    impl PrettyPrinter for Failing {
        async fn pretty_print(&self, _code: &str) -> Result<String, FormatError> {
            Err(FormatError::EmptyOutput)
        }

        fn name(&self) -> &'static str {
            "failing"
        }
    }

    struct Tagging;

    #[async_trait]
    impl PrettyPrinter for Tagging {
        async fn pretty_print(&self, code: &str) -> Result<String, FormatError> {
            Ok(format!("/* pretty */\n{}", code))
        }

        fn name(&self) -> &'static str {
            "tagging"
        }
    }

    #[tokio::test]
    async fn unavailable_engine_uses_heuristic() {
        let f = Formatter::heuristic_only();
        assert_eq!(f.format("a();b();").await, "a();\nb();\n");
    }

    #[tokio::test]
    async fn available_engine_is_preferred() {
        let f = Formatter::new(FormatterEngine::available(Arc::new(Tagging)));
        assert_eq!(f.format("a();").await, "/* pretty */\na();");
    }

    #[tokio::test]
    async fn failing_engine_degrades_to_heuristic() {
        let f = Formatter::new(FormatterEngine::available(Arc::new(Failing)));
        assert_eq!(f.format("x();y();").await, "x();\ny();\n");
    }

    #[tokio::test]
    async fn engine_installed_later_is_picked_up() {
        let engine = FormatterEngine::unavailable();
        let f = Formatter::new(engine.clone());
        assert_eq!(f.format("a();").await, "a();\n");
        engine.install(Arc::new(Tagging));
        assert_eq!(f.format("a();").await, "/* pretty */\na();");
    }

    #[tokio::test]
    async fn clean_input_is_stable_under_heuristic() {
        let f = Formatter::heuristic_only();
        let clean = "function f() {\n  return 1;\n}\n";
        assert_eq!(f.format(clean).await, clean);
    }
}

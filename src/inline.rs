//! Recursive partial inlining.
//!
//! Templates reference other templates with a static inclusion marker:
//!
//! ```text
//! <!-- IMPORT partials/menu.tpl -->
//! ```
//!
//! The operand is a namespace path without its leading separator.
//! [`inline_partials`] resolves one directive per pass (always the first
//! remaining occurrence), splices the referenced content in place of the
//! marker, and rescans the updated text from the top. Content pulled in by
//! a substitution is therefore expanded too.
//!
//! An operand that does not resolve in the namespace, or that names the
//! template currently being processed (direct self-inclusion), is logged
//! as a warning and stripped; it never fails the run. Indirect cycles are
//! not detected; a pass ceiling turns runaway expansion into a fatal
//! error instead of unbounded work.
//!
//! Content lookup goes through the [`PartialSource`] trait so the
//! substitution algorithm can be exercised against an in-memory map
//! without touching the filesystem.

use std::io;

use async_trait::async_trait;
use once_cell::sync::Lazy;
use regex::Regex;
use tracing::warn;

use crate::error::{Error, Result};
use crate::namespace::{Namespace, TemplatePath};

/// Inclusion marker. The operand is everything between `IMPORT ` and the
/// closing `-->`, matched lazily so one line can hold several directives.
static IMPORT_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"<!-- IMPORT (.+?) -->").expect("import directive pattern"));

/// Passes after which expansion is declared runaway and aborted.
const MAX_PASSES: usize = 1_000;

/// Resolution and content lookup for partials.
#[async_trait]
pub trait PartialSource: Send + Sync {
    /// Whether `path` resolves to a template.
    fn contains(&self, path: &TemplatePath) -> bool;

    /// Load the raw content behind `path`.
    async fn load(&self, path: &TemplatePath) -> io::Result<String>;
}

#[async_trait]
impl PartialSource for Namespace {
    fn contains(&self, path: &TemplatePath) -> bool {
        self.contains_key(path)
    }

    async fn load(&self, path: &TemplatePath) -> io::Result<String> {
        match self.get(path) {
            Some(file) => tokio::fs::read_to_string(file).await,
            None => Err(io::Error::new(
                io::ErrorKind::NotFound,
                format!("{path} is not in the template namespace"),
            )),
        }
    }
}

/// Replace every discoverable `IMPORT` directive in `source` with the
/// referenced template's content.
///
/// `current` is the namespace path of the template being processed; a
/// directive referencing it is stripped rather than expanded, which keeps
/// direct self-inclusion from looping forever.
///
/// # Errors
///
/// Fails if loading a referenced partial's content fails, or if the text
/// still contains directives after `MAX_PASSES` passes (runaway expansion
/// through an indirect import cycle).
pub async fn inline_partials<S: PartialSource + ?Sized>(
    partials: &S,
    current: &TemplatePath,
    source: String,
) -> Result<String> {
    let mut text = source;

    for _ in 0..MAX_PASSES {
        let Some((range, target)) = first_directive(&text) else {
            return Ok(text);
        };

        let replacement = if target != *current && partials.contains(&target) {
            partials.load(&target).await?
        } else {
            warn!(partial = %target, template = %current, "partial not loaded");
            String::new()
        };

        // Literal splice: replacement content is inserted verbatim, then
        // the next pass rescans the whole text from the start.
        text.replace_range(range, &replacement);
    }

    Err(Error::InlineDepthExceeded {
        path: current.as_str().to_string(),
        max: MAX_PASSES,
    })
}

/// Locate the first remaining directive: its byte range and the namespace
/// path it references.
fn first_directive(text: &str) -> Option<(std::ops::Range<usize>, TemplatePath)> {
    let captures = IMPORT_RE.captures(text)?;
    let whole = captures.get(0)?;
    Some((whole.range(), TemplatePath::from_directive(&captures[1])))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;
    use tracing_test::traced_test;

    /// In-memory partial source: no filesystem involved.
    struct MapSource(BTreeMap<TemplatePath, String>);

    impl MapSource {
        fn new(entries: &[(&str, &str)]) -> Self {
            Self(
                entries
                    .iter()
                    .map(|(path, content)| {
                        (TemplatePath::from_directive(path), content.to_string())
                    })
                    .collect(),
            )
        }
    }

    #[async_trait]
    impl PartialSource for MapSource {
        fn contains(&self, path: &TemplatePath) -> bool {
            self.0.contains_key(path)
        }

        async fn load(&self, path: &TemplatePath) -> io::Result<String> {
            self.0
                .get(path)
                .cloned()
                .ok_or_else(|| io::Error::new(io::ErrorKind::NotFound, path.as_str().to_string()))
        }
    }

    async fn inline(source: &MapSource, current: &str, text: &str) -> Result<String> {
        inline_partials(
            source,
            &TemplatePath::from_directive(current),
            text.to_string(),
        )
        .await
    }

    #[tokio::test]
    async fn text_without_directives_is_unchanged() {
        let source = MapSource::new(&[]);
        let text = "<h1>{title}</h1>\nplain text\n";
        assert_eq!(inline(&source, "page.tpl", text).await.unwrap(), text);
    }

    #[tokio::test]
    async fn single_directive_is_replaced_with_partial_content() {
        let source = MapSource::new(&[("partials/menu.tpl", "<nav>menu</nav>")]);
        let result = inline(
            &source,
            "page.tpl",
            "before <!-- IMPORT partials/menu.tpl --> after",
        )
        .await
        .unwrap();
        assert_eq!(result, "before <nav>menu</nav> after");
    }

    #[tokio::test]
    async fn nested_directives_expand_transitively() {
        let source = MapSource::new(&[
            ("partials/head.tpl", "H <!-- IMPORT partials/meta.tpl -->"),
            ("partials/meta.tpl", "M"),
        ]);
        let result = inline(&source, "page.tpl", "A <!-- IMPORT partials/head.tpl --> Z")
            .await
            .unwrap();
        assert_eq!(result, "A H M Z");
    }

    #[tokio::test]
    async fn multiple_distinct_directives_all_resolve() {
        let source = MapSource::new(&[("a.tpl", "1"), ("b.tpl", "2"), ("c.tpl", "3")]);
        let result = inline(
            &source,
            "page.tpl",
            "<!-- IMPORT a.tpl --><!-- IMPORT b.tpl --><!-- IMPORT c.tpl -->",
        )
        .await
        .unwrap();
        assert_eq!(result, "123");
    }

    #[tokio::test]
    #[traced_test]
    async fn unresolved_directive_is_stripped_with_warning() {
        let source = MapSource::new(&[]);
        let result = inline(&source, "page.tpl", "X<!-- IMPORT nope.tpl -->Y")
            .await
            .unwrap();
        assert_eq!(result, "XY");
        assert!(logs_contain("partial not loaded"));
    }

    #[tokio::test]
    #[traced_test]
    async fn direct_self_import_is_stripped() {
        let source = MapSource::new(&[("self.tpl", "S<!-- IMPORT self.tpl -->E")]);
        let result = inline(&source, "self.tpl", "S<!-- IMPORT self.tpl -->E")
            .await
            .unwrap();
        assert_eq!(result, "SE");
        assert!(logs_contain("partial not loaded"));
    }

    #[tokio::test]
    async fn self_guard_applies_per_occurrence_after_substitution() {
        // A partial whose content references the template being processed:
        // the substitution succeeds first, then the later pass catches the
        // self-reference and strips it.
        let source = MapSource::new(&[("wrap.tpl", "[<!-- IMPORT page.tpl -->]")]);
        let result = inline(&source, "page.tpl", "go <!-- IMPORT wrap.tpl -->")
            .await
            .unwrap();
        assert_eq!(result, "go []");
    }

    #[tokio::test]
    async fn dollar_signs_in_partials_are_spliced_literally() {
        let source = MapSource::new(&[("price.tpl", "$1 and $` and $'")]);
        let result = inline(&source, "page.tpl", "<!-- IMPORT price.tpl -->")
            .await
            .unwrap();
        assert_eq!(result, "$1 and $` and $'");
    }

    #[tokio::test]
    async fn indirect_cycle_hits_the_pass_ceiling() {
        // a -> b -> a diverges when neither is the template being
        // processed; the ceiling converts it into a fatal error.
        let source = MapSource::new(&[
            ("a.tpl", "<!-- IMPORT b.tpl -->"),
            ("b.tpl", "<!-- IMPORT a.tpl -->"),
        ]);
        let result = inline(&source, "page.tpl", "<!-- IMPORT a.tpl -->").await;
        assert!(matches!(result, Err(Error::InlineDepthExceeded { .. })));
    }

    #[tokio::test]
    async fn failing_partial_load_is_fatal() {
        // Present in the namespace but unreadable: contains() says yes,
        // load() fails.
        struct Broken;

        #[async_trait]
        impl PartialSource for Broken {
            fn contains(&self, _path: &TemplatePath) -> bool {
                true
            }
            async fn load(&self, _path: &TemplatePath) -> io::Result<String> {
                Err(io::Error::new(io::ErrorKind::PermissionDenied, "denied"))
            }
        }

        let result = inline_partials(
            &Broken,
            &TemplatePath::from_directive("page.tpl"),
            "<!-- IMPORT locked.tpl -->".to_string(),
        )
        .await;
        assert!(matches!(result, Err(Error::Io(_))));
    }
}

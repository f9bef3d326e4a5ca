//! Rule modules and the registry that runs them.
//!
//! A rule module is a named set of checks over a [`ResolvedDocument`].
//! Modules are registered explicitly and run in registration order; a module
//! that returns an error or panics is recorded as failed without stopping the
//! others.
//!
//! # Example
//!
//! ```no_run
//! use paperlint::rules::RuleRegistry;
//! use paperlint::resolve::ResolvedDocument;
//!
//! fn main() -> paperlint::Result<()> {
//!     let document = paperlint::open_file("paper.docx")?;
//!     let registry = RuleRegistry::with_builtin()?;
//!     let report = registry.run_all(&ResolvedDocument::new(&document));
//!     println!("{:?}", report.summary());
//!     Ok(())
//! }
//! ```

mod caption;
mod expect;
mod template;

pub use caption::{CaptionKind, CaptionModule};
pub use expect::{FormatRule, LineSpacingRule, Mismatch};
pub use template::{
    builtin_templates, CountRule, ItemsRule, SectionRule, Selector, Template, TemplateModule, TextRule,
};

use crate::error::{Error, Result};
use crate::report::{LocateHint, ModuleFindings, ModuleReport, Report};
use crate::resolve::{ResolvedDocument, ResolvedParagraph};
use rayon::prelude::*;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Arc;

/// Keyword hints use at most this many characters of the paragraph text.
pub const KEYWORD_LEN: usize = 20;

/// A named, independently runnable set of checks.
pub trait RuleModule: Send + Sync {
    /// Module name, used as the report key and in comment headings.
    fn name(&self) -> &str;

    /// Paragraph used for issues that carry no locate hint.
    fn fallback_index(&self) -> usize {
        0
    }

    /// Run the checks over a resolved document.
    fn run(&self, document: &ResolvedDocument<'_>) -> Result<ModuleFindings>;
}

/// Ordered collection of rule modules.
#[derive(Clone)]
pub struct RuleRegistry {
    modules: Vec<Arc<dyn RuleModule>>,
    parallel: bool,
}

impl RuleRegistry {
    /// Create an empty registry that runs modules in parallel.
    pub fn new() -> Self {
        Self {
            modules: Vec::new(),
            parallel: true,
        }
    }

    /// Create a registry with the built-in templates and caption modules.
    pub fn with_builtin() -> Result<Self> {
        let mut registry = Self::new();
        for template in builtin_templates()? {
            registry.register(Arc::new(TemplateModule::new(template)?));
        }
        registry.register(Arc::new(CaptionModule::tables()));
        registry.register(Arc::new(CaptionModule::figures()));
        Ok(registry)
    }

    /// Register a module.
    ///
    /// A module with the same name as an existing one replaces it in place.
    pub fn register(&mut self, module: Arc<dyn RuleModule>) {
        match self.modules.iter().position(|m| m.name() == module.name()) {
            Some(pos) => {
                log::warn!("Replacing rule module '{}'", module.name());
                self.modules[pos] = module;
            }
            None => self.modules.push(module),
        }
    }

    /// Look up a module by name.
    pub fn get_by_name(&self, name: &str) -> Option<Arc<dyn RuleModule>> {
        self.modules.iter().find(|m| m.name() == name).cloned()
    }

    /// Module names in registration order.
    pub fn names(&self) -> Vec<&str> {
        self.modules.iter().map(|m| m.name()).collect()
    }

    /// Number of registered modules.
    pub fn len(&self) -> usize {
        self.modules.len()
    }

    /// Whether no module is registered.
    pub fn is_empty(&self) -> bool {
        self.modules.is_empty()
    }

    /// Run modules in parallel or not.
    pub fn with_parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    /// Run modules one after another.
    pub fn sequential(self) -> Self {
        self.with_parallel(false)
    }

    /// Run every module and collect their fragments in registration order.
    pub fn run_all(&self, document: &ResolvedDocument<'_>) -> Report {
        log::debug!(
            "Running {} rule modules ({})",
            self.modules.len(),
            if self.parallel { "parallel" } else { "sequential" }
        );

        let modules = if self.parallel {
            self.modules
                .par_iter()
                .map(|m| run_isolated(m.as_ref(), document))
                .collect()
        } else {
            self.modules
                .iter()
                .map(|m| run_isolated(m.as_ref(), document))
                .collect()
        };

        Report { modules }
    }
}

impl Default for RuleRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for RuleRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RuleRegistry")
            .field("modules", &self.names())
            .field("parallel", &self.parallel)
            .finish()
    }
}

fn run_isolated(module: &dyn RuleModule, document: &ResolvedDocument<'_>) -> ModuleReport {
    let name = module.name();
    let fallback = module.fallback_index();

    let outcome = catch_unwind(AssertUnwindSafe(|| module.run(document)));
    let error = match outcome {
        Ok(Ok(findings)) => return ModuleReport::completed(name, findings, fallback),
        Ok(Err(e)) => e,
        Err(payload) => Error::ModuleFailed {
            module: name.to_string(),
            message: panic_message(payload.as_ref()),
        },
    };

    log::warn!("Rule module '{}' failed: {}", name, error);
    let message = match error {
        Error::ModuleFailed { message, .. } => message,
        other => other.to_string(),
    };
    ModuleReport::failed(name, message, fallback)
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "module panicked".to_string()
    }
}

/// A locate hint that finds `paragraph` again.
///
/// Uses the first characters of the trimmed text when that keyword leads back
/// to this paragraph, otherwise the paragraph index.
pub fn locate_hint_for(document: &ResolvedDocument<'_>, paragraph: &ResolvedParagraph) -> LocateHint {
    let keyword: String = paragraph.text.trim().chars().take(KEYWORD_LEN).collect();
    if !keyword.is_empty() {
        let first = document
            .paragraphs()
            .iter()
            .position(|p| p.text.contains(keyword.as_str()));
        if first == Some(paragraph.index) {
            return LocateHint::Keyword(keyword);
        }
    }
    LocateHint::Index(paragraph.index)
}

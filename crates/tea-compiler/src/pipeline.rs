// SPDX-License-Identifier: (MIT OR Apache-2.0)
//! Scan, parse, check and optimize one compilation unit.

use std::rc::Rc;

use tea_ast::token::Token;
use tea_ast::Template;
use tea_diagnostics::Reporter;
use tea_lexer::Scanner;
use tea_opt::BasicOptimizer;
use tea_parser::parse_template;
use tea_types::{ClassTable, InternalError, TemplateSignature, TypeChecker};

use crate::cache::ParseTreeCache;
use crate::options::CompileOptions;
use crate::report::RenderingListener;
use crate::repository::HashMapRepository;

/// Result of compiling one template.
#[derive(Debug)]
pub struct CompiledTemplate {
    pub template: Template,
    /// Present when the unit compiled without errors.
    pub signature: Option<TemplateSignature>,
    /// Errors reported while compiling this unit.
    pub errors: usize,
    /// Optimizer rewrites, zero when the optimizer did not run.
    pub rewrites: usize,
}

impl CompiledTemplate {
    pub fn is_ok(&self) -> bool {
        self.errors == 0
    }
}

/// Compiles templates against one class table.
///
/// Signatures of successfully compiled units are remembered, so later units
/// can `call` earlier ones.
pub struct Compiler {
    classes: ClassTable,
    options: CompileOptions,
    repository: HashMapRepository,
    cache: ParseTreeCache,
}

impl Compiler {
    pub fn new(options: CompileOptions) -> Self {
        Self {
            classes: ClassTable::new(),
            options,
            repository: HashMapRepository::new(),
            cache: ParseTreeCache::new(),
        }
    }

    /// Use a class table with application classes registered.
    pub fn with_classes(mut self, classes: ClassTable) -> Self {
        self.classes = classes;
        self
    }

    pub fn options(&self) -> &CompileOptions {
        &self.options
    }

    pub fn classes(&self) -> &ClassTable {
        &self.classes
    }

    pub fn repository(&self) -> &HashMapRepository {
        &self.repository
    }

    pub fn repository_mut(&mut self) -> &mut HashMapRepository {
        &mut self.repository
    }

    pub fn cache(&self) -> &ParseTreeCache {
        &self.cache
    }

    /// The token stream of `source`, as tooling sees it.
    pub fn tokens(&self, source: &str, reporter: &Reporter) -> Vec<Token> {
        Scanner::new(source, reporter).emit_comments(self.options.emit_comments).tokenize()
    }

    /// Parse `source`, reusing the cached tree when the source is unchanged.
    pub fn parse(&mut self, name: &str, source: &str, reporter: &Reporter) -> Template {
        if let Some(tree) = self.cache.get(name, source) {
            return tree.clone();
        }
        let _span = tracing::info_span!("parse", template = name).entered();
        let before = reporter.error_count();
        let tree = parse_template(source, reporter);
        if reporter.error_count() == before {
            self.cache.put(name, source, tree.clone());
        }
        tree
    }

    /// Run the whole front end on one unit.
    ///
    /// Diagnostics go to `reporter`. The optimizer only runs when the unit
    /// produced no errors.
    pub fn compile(&mut self, name: &str, source: &str, reporter: &Reporter) -> Result<CompiledTemplate, InternalError> {
        let _span = tracing::info_span!("compile", template = name).entered();
        let before = reporter.error_count();

        let tree = self.parse(name, source, reporter);
        let mut template = TypeChecker::new(&self.classes, reporter)
            .with_repository(&self.repository)
            .with_options(self.options.check_options())
            .check(tree)?;
        let errors = reporter.error_count() - before;

        let mut rewrites = 0;
        if errors > 0 {
            tracing::debug!(errors, "skipping optimization");
        } else if self.options.optimize {
            let mut optimizer = BasicOptimizer::new();
            optimizer.optimize(&mut template);
            rewrites = optimizer.rewrites();
        }

        let signature = if errors == 0 { TemplateSignature::of(&template) } else { None };
        if let Some(signature) = &signature {
            self.repository.insert(signature.clone());
        }
        tracing::info!(errors, rewrites, "compiled template");
        Ok(CompiledTemplate { template, signature, errors, rewrites })
    }

    /// Compile one unit with its own reporter and return the rendered
    /// diagnostics alongside the result.
    pub fn compile_reporting(
        &mut self,
        name: &str,
        source: &str,
    ) -> Result<(CompiledTemplate, Vec<String>), InternalError> {
        let reporter = Reporter::new();
        let listener = Rc::new(RenderingListener::new(name, source, self.options.pretty_diagnostics));
        reporter.add_listener(listener.clone());
        let compiled = self.compile(name, source, &reporter)?;
        Ok((compiled, listener.rendered()))
    }
}

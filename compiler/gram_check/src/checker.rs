//! The per-file check pass.
//!
//! Checking validates a parsed file after binding: `@define`/`@line`
//! pragma keys and values, structural symbol shapes, strict parametric
//! consistency across every declaration of a production, and identifier
//! resolution, which records references into the caller's
//! [`BindingTable`].

use gram_bind::{bind_source_file, BindingTable, FileId, NodeKey, SymbolId, SymbolKind};
use gram_diagnostic::{
    codes, CancelToken, Canceled, Diagnostics, LineOffset, LineOffsetMap, RegionMap,
};
use gram_syntax::{Name, NodeId, NodeKind, NodeList, SourceFile, StringInterner, SyntaxKind};
use rustc_hash::FxHashSet;
use tracing::trace;

use crate::Resolver;

/// Options that apply to every file unless a `@define` pragma overrides
/// them for a region of one file.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct CompilerOptions {
    /// Treat parameters and arguments as plain identifiers instead of
    /// matching every invocation against the declared parameter set.
    pub no_strict_parametric_productions: bool,
    /// Suppress the unused-parameter warning.
    pub no_unused_parameters: bool,
}

/// A pragma-scoped override of one compiler option. `None` is the value
/// of `@define key default`: revert to the global option.
type PragmaValue = Option<bool>;

/// The semantic checker. One instance can check any number of files;
/// each filename is checked at most once.
pub struct Checker {
    options: CompilerOptions,
    checked: FxHashSet<String>,
    no_strict: RegionMap<PragmaValue>,
    no_unused: RegionMap<PragmaValue>,
    line_offsets: LineOffsetMap,
}

impl Checker {
    pub fn new(options: CompilerOptions) -> Self {
        Checker {
            options,
            checked: FxHashSet::default(),
            no_strict: RegionMap::new(),
            no_unused: RegionMap::new(),
            line_offsets: LineOffsetMap::new(),
        }
    }

    pub fn options(&self) -> CompilerOptions {
        self.options
    }

    /// The `@line` remapping table accumulated by checked files.
    pub fn line_offsets(&self) -> &LineOffsetMap {
        &self.line_offsets
    }

    /// A lookup facade over one checked file.
    pub fn resolver<'a>(
        &'a self,
        file: &'a SourceFile,
        bindings: &'a BindingTable,
    ) -> Resolver<'a> {
        Resolver::new(file, bindings, &self.line_offsets)
    }

    /// Check one parsed file, binding it first if the caller has not.
    /// A filename already checked is a no-op; a canceled check leaves
    /// the filename unmarked so a later call re-runs it from scratch.
    #[tracing::instrument(level = "debug", skip_all, fields(filename = %file.filename()))]
    pub fn check_source_file(
        &mut self,
        file: &SourceFile,
        interner: &StringInterner,
        bindings: &mut BindingTable,
        diagnostics: &mut Diagnostics,
        cancel: &CancelToken,
    ) -> Result<(), Canceled> {
        cancel.check()?;
        if self.checked.contains(file.filename()) {
            trace!("already checked");
            return Ok(());
        }
        bind_source_file(file, interner, bindings, cancel)?;
        diagnostics.set_source_file(file.filename(), file.line_map());
        self.collect_pragmas(file, interner, diagnostics);

        let Some(file_id) = bindings.file_id(file.filename()) else {
            return Ok(());
        };
        let mut pass = FileChecker {
            file,
            file_id,
            interner,
            bindings,
            diagnostics,
            cancel,
            options: self.options,
            no_strict: &self.no_strict,
            no_unused: &self.no_unused,
        };
        pass.check(file.root(), None)?;
        self.checked.insert(file.filename().to_owned());
        Ok(())
    }

    // ─── Pragma collection ───

    /// Walk the top-level meta elements, validating `@define` and
    /// `@line` and populating the region maps the tree walk consults.
    fn collect_pragmas(
        &mut self,
        file: &SourceFile,
        interner: &StringInterner,
        diagnostics: &mut Diagnostics,
    ) {
        self.no_strict.clear_file(file.filename());
        self.no_unused.clear_file(file.filename());
        self.line_offsets.clear_file(file.filename());

        let arena = file.arena();
        let NodeKind::SourceFile { elements } = arena.node(file.root()).kind else {
            return;
        };
        for &element in arena.list(elements) {
            match arena.node(element).kind {
                NodeKind::Define { key, value } => {
                    self.collect_define(file, element, key, value, diagnostics);
                }
                NodeKind::Line { number, path } => {
                    self.collect_line(file, element, number, path, interner, diagnostics);
                }
                _ => {}
            }
        }
    }

    fn collect_define(
        &mut self,
        file: &SourceFile,
        element: NodeId,
        key: Option<NodeId>,
        value: Option<NodeId>,
        diagnostics: &mut Diagnostics,
    ) {
        let arena = file.arena();
        // A missing key was already reported by the parser.
        let Some(key) = key else { return };
        let target = match file.node_text(key) {
            "noStrictParametricProductions" => &mut self.no_strict,
            "noUnusedParameters" => &mut self.no_unused,
            text => {
                diagnostics.report_at(
                    arena.span(key),
                    codes::INVALID_DEFINE_KEY,
                    vec![text.to_owned()],
                );
                return;
            }
        };
        let setting = match value {
            Some(value) => match arena.node(value).kind {
                NodeKind::KeywordValue {
                    keyword: SyntaxKind::TrueKeyword,
                } => Some(true),
                NodeKind::KeywordValue {
                    keyword: SyntaxKind::FalseKeyword,
                } => Some(false),
                NodeKind::KeywordValue {
                    keyword: SyntaxKind::DefaultKeyword,
                } => None,
                _ => {
                    diagnostics.report_at(
                        arena.span(value),
                        codes::INVALID_DEFINE_VALUE,
                        vec![file.node_text(value).to_owned()],
                    );
                    return;
                }
            },
            None => {
                diagnostics.report_at(
                    arena.span(element),
                    codes::INVALID_DEFINE_VALUE,
                    vec![String::new()],
                );
                return;
            }
        };
        let line = file.line_map().line_of(arena.span(element).start);
        target.add(file.filename(), line, setting);
    }

    fn collect_line(
        &mut self,
        file: &SourceFile,
        element: NodeId,
        number: Option<NodeId>,
        path: Option<NodeId>,
        interner: &StringInterner,
        diagnostics: &mut Diagnostics,
    ) {
        let arena = file.arena();
        // A missing number was already reported by the parser.
        let Some(number) = number else { return };
        let pragma_line = file.line_map().line_of(arena.span(element).start);
        match arena.node(number).kind {
            NodeKind::NumberLiteral { value } => {
                let path = path.and_then(|p| match arena.node(p).kind {
                    NodeKind::StringLiteral { value } => Some(interner.resolve(value).to_owned()),
                    _ => None,
                });
                // `@line N` names the 1-based number of the next line.
                let offset = LineOffset {
                    file: path,
                    line: value.saturating_sub(1),
                };
                self.line_offsets
                    .add_line_offset(file.filename(), pragma_line + 1, Some(offset));
            }
            NodeKind::KeywordValue {
                keyword: SyntaxKind::DefaultKeyword,
            } => {
                self.line_offsets
                    .add_line_offset(file.filename(), pragma_line + 1, None);
            }
            _ => {
                diagnostics.report_at(arena.span(number), codes::LINE_NUMBER_EXPECTED, vec![]);
            }
        }
    }
}

// ─── The tree walk ───

/// The enclosing production while walking a right-hand side.
#[derive(Copy, Clone)]
struct ProductionScope {
    symbol: SymbolId,
}

struct FileChecker<'a> {
    file: &'a SourceFile,
    file_id: FileId,
    interner: &'a StringInterner,
    bindings: &'a mut BindingTable,
    diagnostics: &'a mut Diagnostics,
    cancel: &'a CancelToken,
    options: CompilerOptions,
    no_strict: &'a RegionMap<Option<bool>>,
    no_unused: &'a RegionMap<Option<bool>>,
}

impl<'a> FileChecker<'a> {
    fn check(&mut self, node: NodeId, production: Option<ProductionScope>) -> Result<(), Canceled> {
        self.cancel.check()?;
        let mut scope = production;
        let kind = self.file.arena().node(node).kind.clone();
        match kind {
            NodeKind::Production {
                name, parameters, ..
            } => {
                self.check_production(node, name, parameters);
                if let Some(symbol) = self.bindings.symbol_of(self.key(node)) {
                    scope = Some(ProductionScope { symbol });
                }
            }
            NodeKind::Nonterminal {
                name, arguments, ..
            } => {
                // The argument subtree is validated against the invoked
                // production here; the walk does not descend into it.
                self.check_nonterminal(node, name, arguments, scope);
                return Ok(());
            }
            NodeKind::Constraints { elements } => {
                self.check_constraints(elements, scope);
                return Ok(());
            }
            NodeKind::ButNotSymbol { .. } => {
                self.run_structural(node, &[Self::but_not_right_shape]);
            }
            NodeKind::SymbolSet { elements } => {
                self.run_structural(node, &[Self::symbol_set_position]);
                self.check_duplicate_terminals(elements);
            }
            NodeKind::LookaheadAssertion { .. } => self.run_structural(
                node,
                &[Self::lookahead_set_operand, Self::lookahead_single_operand],
            ),
            NodeKind::NoSymbolHereAssertion { .. } => {
                self.run_structural(node, &[Self::no_symbol_here_nonempty]);
            }
            _ => {}
        }
        for child in self.file.arena().children(node) {
            self.check(child, scope)?;
        }
        Ok(())
    }

    // ─── Shared lookups ───

    fn key(&self, node: NodeId) -> NodeKey {
        NodeKey::new(self.file_id, node)
    }

    fn report(&mut self, node: NodeId, code: u32, args: Vec<String>) {
        let span = self.file.arena().span(node);
        self.diagnostics.report_at(span, code, args);
    }

    fn node_text(&self, node: NodeId) -> String {
        self.file.node_text(node).to_owned()
    }

    fn pragma_value(&self, map: &RegionMap<Option<bool>>, node: NodeId, global: bool) -> bool {
        let line = self
            .file
            .line_map()
            .line_of(self.file.arena().span(node).start);
        match map.find(self.file.filename(), line) {
            Some(region) => region.value.unwrap_or(global),
            None => global,
        }
    }

    fn no_strict_at(&self, node: NodeId) -> bool {
        self.pragma_value(
            self.no_strict,
            node,
            self.options.no_strict_parametric_productions,
        )
    }

    fn no_unused_at(&self, node: NodeId) -> bool {
        self.pragma_value(self.no_unused, node, self.options.no_unused_parameters)
    }

    /// The name node of a `Parameter`, if well-formed.
    fn parameter_name_node(&self, param: NodeId) -> Option<NodeId> {
        match self.file.arena().node(param).kind {
            NodeKind::Parameter { name } => Some(name),
            _ => None,
        }
    }

    fn identifier_name(&self, node: NodeId) -> Option<Name> {
        match self.file.arena().node(node).kind {
            NodeKind::Identifier { name } if name != Name::EMPTY => Some(name),
            _ => None,
        }
    }

    /// `(name, name-node)` per well-formed parameter, in declaration
    /// order.
    fn parameter_entries(&self, parameters: Option<NodeId>) -> Vec<(Name, NodeId)> {
        let Some(list) = parameters else {
            return Vec::new();
        };
        let NodeKind::ParameterList { elements } = self.file.arena().node(list).kind else {
            return Vec::new();
        };
        let params = self.file.arena().list(elements).to_vec();
        let mut out = Vec::with_capacity(params.len());
        for param in params {
            let Some(name_node) = self.parameter_name_node(param) else {
                continue;
            };
            let Some(name) = self.identifier_name(name_node) else {
                continue;
            };
            out.push((name, name_node));
        }
        out
    }

    /// The canonical parameter set of a production: its first
    /// declaration's, in declaration order. A canonical declaration in
    /// another file is not reachable through this file's tree; fall
    /// back to the merged locals, sorted for deterministic reports.
    fn canonical_parameters(&self, symbol: SymbolId) -> Vec<Name> {
        let Some(&first) = self.bindings.declarations(symbol).first() else {
            return Vec::new();
        };
        if first.file == self.file_id {
            let NodeKind::Production { parameters, .. } =
                self.file.arena().node(first.node).kind.clone()
            else {
                return Vec::new();
            };
            return self
                .parameter_entries(parameters)
                .into_iter()
                .map(|(name, _)| name)
                .collect();
        }
        let mut names: Vec<Name> = self
            .bindings
            .symbol(symbol)
            .locals()
            .names(SymbolKind::Parameter)
            .map(|(name, _)| name)
            .collect();
        names.sort_by_key(|&name| self.interner.resolve(name));
        names
    }

    // ─── Productions ───

    fn check_production(&mut self, node: NodeId, name: NodeId, parameters: Option<NodeId>) {
        self.check_duplicate_parameters(parameters);
        let Some(symbol) = self.bindings.symbol_of(self.key(node)) else {
            return;
        };
        if !self.no_strict_at(node) {
            self.check_parameter_consistency(node, name, symbol, parameters);
        }
        if !self.no_unused_at(node) {
            self.check_unused_parameters(symbol, parameters);
        }
    }

    fn check_duplicate_parameters(&mut self, parameters: Option<NodeId>) {
        let mut seen: FxHashSet<Name> = FxHashSet::default();
        for (name, name_node) in self.parameter_entries(parameters) {
            if !seen.insert(name) {
                self.report(
                    name_node,
                    codes::DUPLICATE_IDENTIFIER,
                    vec![self.node_text(name_node)],
                );
            }
        }
    }

    /// Strict mode: every declaration after the first must name exactly
    /// the canonical parameter set, order-independently. Mismatches are
    /// reported symmetrically, each side anchored at a production name.
    fn check_parameter_consistency(
        &mut self,
        node: NodeId,
        name: NodeId,
        symbol: SymbolId,
        parameters: Option<NodeId>,
    ) {
        let Some(&first) = self.bindings.declarations(symbol).first() else {
            return;
        };
        if first.file != self.file_id || first.node == node {
            return;
        }
        let NodeKind::Production {
            name: first_name,
            parameters: first_params,
            ..
        } = self.file.arena().node(first.node).kind.clone()
        else {
            return;
        };

        let mine = self.parameter_entries(parameters);
        let canonical = self.parameter_entries(first_params);
        let mine_set: FxHashSet<Name> = mine.iter().map(|&(name, _)| name).collect();
        let canonical_set: FxHashSet<Name> = canonical.iter().map(|&(name, _)| name).collect();
        let production = self.node_text(name);

        for &(param, _) in &canonical {
            if !mine_set.contains(&param) {
                self.report(
                    name,
                    codes::MISSING_PARAMETER,
                    vec![production.clone(), self.interner.resolve(param).to_owned()],
                );
            }
        }
        for &(param, _) in &mine {
            if !canonical_set.contains(&param) {
                self.report(
                    first_name,
                    codes::MISSING_PARAMETER,
                    vec![production.clone(), self.interner.resolve(param).to_owned()],
                );
            }
        }
    }

    /// A parameter is used if any declaration of the production names
    /// it in an argument or constraint. Every same-file declaration is
    /// scanned before concluding, so `P[In]` declared here and used in
    /// a later declaration does not warn.
    fn check_unused_parameters(&mut self, symbol: SymbolId, parameters: Option<NodeId>) {
        let entries = self.parameter_entries(parameters);
        if entries.is_empty() {
            return;
        }
        let used = self.parameter_usage(symbol);
        for (param, name_node) in entries {
            if !used.contains(&param) {
                self.report(
                    name_node,
                    codes::UNUSED_PARAMETER,
                    vec![self.interner.resolve(param).to_owned()],
                );
            }
        }
    }

    fn parameter_usage(&self, symbol: SymbolId) -> FxHashSet<Name> {
        let mut used = FxHashSet::default();
        let arena = self.file.arena();
        for key in self.bindings.declarations(symbol) {
            if key.file != self.file_id {
                continue;
            }
            arena.walk(key.node, &mut |id| {
                if let NodeKind::Argument {
                    name: Some(name), ..
                } = arena.node(id).kind
                {
                    if let Some(name) = self.identifier_name(name) {
                        used.insert(name);
                    }
                }
            });
        }
        used
    }

    // ─── Nonterminals and arguments ───

    fn check_nonterminal(
        &mut self,
        node: NodeId,
        name: NodeId,
        arguments: Option<NodeId>,
        scope: Option<ProductionScope>,
    ) {
        let target = self.resolve_nonterminal_name(name, scope);
        if !self.no_strict_at(node) {
            self.check_arguments(name, arguments, target, scope);
        }
    }

    /// Resolve a nonterminal target: enclosing scopes first, then the
    /// global production scope. Success records a reference; failure
    /// reports cannot-find-name.
    fn resolve_nonterminal_name(
        &mut self,
        name: NodeId,
        scope: Option<ProductionScope>,
    ) -> Option<SymbolId> {
        let text = self.identifier_name(name)?;
        let local = scope.and_then(|scope| {
            self.bindings
                .resolve_local(scope.symbol, SymbolKind::Production, text)
        });
        let resolved = local.or_else(|| self.bindings.resolve_global(SymbolKind::Production, text));
        match resolved {
            Some(symbol) => {
                self.bindings.record_reference(symbol, self.key(name));
                Some(symbol)
            }
            None => {
                self.report(name, codes::CANNOT_FIND_NAME, vec![self.node_text(name)]);
                None
            }
        }
    }

    /// Strict-mode invocation matching: exactly one argument per
    /// declared parameter of the invoked production, matched by name.
    fn check_arguments(
        &mut self,
        name: NodeId,
        arguments: Option<NodeId>,
        target: Option<SymbolId>,
        scope: Option<ProductionScope>,
    ) {
        let declared: Vec<Name> = target
            .map(|symbol| self.canonical_parameters(symbol))
            .unwrap_or_default();
        let production = self.node_text(name);

        let mut supplied: Vec<Name> = Vec::new();
        if let Some(list) = arguments {
            let NodeKind::ArgumentList { elements } = self.file.arena().node(list).kind else {
                return;
            };
            for argument in self.file.arena().list(elements).to_vec() {
                let NodeKind::Argument {
                    operator,
                    name: Some(arg_name),
                } = self.file.arena().node(argument).kind
                else {
                    continue;
                };
                let Some(text) = self.identifier_name(arg_name) else {
                    continue;
                };
                if supplied.contains(&text) {
                    self.report(
                        arg_name,
                        codes::DUPLICATE_ARGUMENT,
                        vec![self.node_text(arg_name)],
                    );
                    continue;
                }
                supplied.push(text);
                if operator == Some(SyntaxKind::QuestionToken) {
                    // `?name` forwards the enclosing production's
                    // parameter of the same name.
                    self.resolve_enclosing_parameter(arg_name, text, scope);
                }
                if let Some(symbol) = target {
                    if !declared.contains(&text) {
                        self.report(
                            arg_name,
                            codes::UNKNOWN_PARAMETER,
                            vec![production.clone(), self.node_text(arg_name)],
                        );
                    } else if let Some(param) =
                        self.bindings
                            .resolve_local(symbol, SymbolKind::Parameter, text)
                    {
                        self.bindings.record_reference(param, self.key(arg_name));
                    }
                }
            }
        }

        if target.is_some() {
            let anchor = arguments.unwrap_or(name);
            for &param in &declared {
                if !supplied.contains(&param) {
                    self.report(
                        anchor,
                        codes::MISSING_ARGUMENT,
                        vec![self.interner.resolve(param).to_owned()],
                    );
                }
            }
        }
    }

    /// Constraint-style arguments (`[+In]`, `[~Yield]`) gate a
    /// right-hand side on the enclosing production's parameters.
    fn check_constraints(&mut self, elements: NodeList, scope: Option<ProductionScope>) {
        for argument in self.file.arena().list(elements).to_vec() {
            let NodeKind::Argument {
                name: Some(arg_name),
                ..
            } = self.file.arena().node(argument).kind
            else {
                continue;
            };
            let Some(text) = self.identifier_name(arg_name) else {
                continue;
            };
            if self.no_strict_at(argument) {
                continue;
            }
            self.resolve_enclosing_parameter(arg_name, text, scope);
        }
    }

    fn resolve_enclosing_parameter(
        &mut self,
        arg_name: NodeId,
        text: Name,
        scope: Option<ProductionScope>,
    ) {
        let resolved = scope.and_then(|scope| {
            self.bindings
                .resolve_local(scope.symbol, SymbolKind::Parameter, text)
        });
        match resolved {
            Some(param) => self.bindings.record_reference(param, self.key(arg_name)),
            None => self.report(
                arg_name,
                codes::CANNOT_FIND_PARAMETER,
                vec![self.node_text(arg_name)],
            ),
        }
    }

    // ─── Structural predicates ───

    /// Run structural predicates in order, stopping at the first that
    /// reports. At most one structural defect per node reaches the
    /// diagnostics; semantic checks run regardless.
    fn run_structural(&mut self, node: NodeId, checks: &[fn(&mut Self, NodeId) -> bool]) {
        for check in checks {
            if check(self, node) {
                break;
            }
        }
    }

    /// `A but not B`: the right side must be a single terminal-like
    /// symbol or a `one of` list. Absent operands were already reported
    /// by the parser.
    fn but_not_right_shape(&mut self, node: NodeId) -> bool {
        let NodeKind::ButNotSymbol {
            right: Some(right), ..
        } = self.file.arena().node(node).kind
        else {
            return false;
        };
        match self.file.arena().kind(right) {
            SyntaxKind::Terminal
            | SyntaxKind::Nonterminal
            | SyntaxKind::OneOfSymbol
            | SyntaxKind::UnicodeCharacterLiteral
            | SyntaxKind::UnicodeCharacterRange
            | SyntaxKind::InvalidSymbol => false,
            _ => {
                self.report(right, codes::INVALID_SYMBOL, vec![]);
                true
            }
        }
    }

    /// A symbol set is only meaningful as a lookahead operand.
    fn symbol_set_position(&mut self, node: NodeId) -> bool {
        let parent = self.bindings.parent(self.key(node));
        let parent_kind = parent.map(|key| self.file.arena().kind(key.node));
        if parent_kind == Some(SyntaxKind::LookaheadAssertion) {
            return false;
        }
        self.report(node, codes::INVALID_SYMBOL, vec![]);
        true
    }

    /// `∈`/`∉`/`<-`/`<!` take a set or nonterminal operand.
    fn lookahead_set_operand(&mut self, node: NodeId) -> bool {
        let NodeKind::LookaheadAssertion {
            operator,
            operand: Some(operand),
        } = self.file.arena().node(node).kind
        else {
            return false;
        };
        if !matches!(
            operator,
            SyntaxKind::ElementOfToken
                | SyntaxKind::NotAnElementOfToken
                | SyntaxKind::LessThanMinusToken
                | SyntaxKind::LessThanExclamationToken
        ) {
            return false;
        }
        match self.file.arena().kind(operand) {
            SyntaxKind::SymbolSet | SyntaxKind::Nonterminal => false,
            _ => {
                self.report(operand, codes::INVALID_ASSERTION, vec![]);
                true
            }
        }
    }

    /// `==`/`!=` compare against a single symbol, never a set.
    fn lookahead_single_operand(&mut self, node: NodeId) -> bool {
        let NodeKind::LookaheadAssertion {
            operator,
            operand: Some(operand),
        } = self.file.arena().node(node).kind
        else {
            return false;
        };
        if !matches!(
            operator,
            SyntaxKind::EqualsToken
                | SyntaxKind::EqualsEqualsToken
                | SyntaxKind::ExclamationEqualsToken
        ) {
            return false;
        }
        if self.file.arena().kind(operand) == SyntaxKind::SymbolSet {
            self.report(operand, codes::INVALID_ASSERTION, vec![]);
            return true;
        }
        false
    }

    /// `[no X here]` needs at least one symbol.
    fn no_symbol_here_nonempty(&mut self, node: NodeId) -> bool {
        let NodeKind::NoSymbolHereAssertion { symbols } = self.file.arena().node(node).kind else {
            return false;
        };
        if symbols.is_empty() {
            self.report(node, codes::INVALID_ASSERTION, vec![]);
            return true;
        }
        false
    }

    // ─── Symbol sets ───

    fn check_duplicate_terminals(&mut self, elements: NodeList) {
        let mut seen: FxHashSet<Name> = FxHashSet::default();
        for element in self.file.arena().list(elements).to_vec() {
            let NodeKind::Terminal { literal, .. } = self.file.arena().node(element).kind else {
                continue;
            };
            let NodeKind::TerminalLiteral { text } = self.file.arena().node(literal).kind else {
                continue;
            };
            if !seen.insert(text) {
                self.report(
                    element,
                    codes::DUPLICATE_TERMINAL,
                    vec![self.interner.resolve(text).to_owned()],
                );
            }
        }
    }
}

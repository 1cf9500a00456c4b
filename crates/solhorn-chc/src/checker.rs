//! The CFG-to-Horn traversal and verification driver.
//!
//! One [`ChcChecker`] analyzes the contracts of a source unit in turn.
//! Per contract it allocates the interface and error relations, encodes the
//! (possibly synthesized) constructor and every public implemented
//! function, and finally issues one reachability query per recorded
//! `assert`.
//!
//! The traversal keeps a path stack of captured block applications in
//! lock-step with the encoder's solver scopes: entering a block pushes
//! both, leaving pops both, and the source of every emitted rule is the
//! captured application on top of the stack. Continuation blocks pushed by
//! loops and branch joins are counted in `function_blocks` so enclosing
//! constructs can pop them before wiring their own edges.

use crate::engine::{CheckResult, HornEngine};
use crate::predicate::{PredicateError, PredicateRegistry, PredicateSymbol};
use crate::report::{ContractAnalysis, Reporter, TargetReport, TargetVerdict, VerificationTarget};
use crate::sorts::SortCatalogue;
use solhorn_ast::{
    ContractDefinition, Expression, FunctionDefinition, NodeId, SourceLocation, SourceUnit,
    Statement, VariableDeclaration,
};
use solhorn_smt::encoder::{self, CallEvent};
use solhorn_smt::{EncodingContext, EncodingError, SmtExpr};
use std::collections::BTreeSet;
use thiserror::Error;
use tracing::{debug, warn};

/// Internal failures of the encoding itself. These abort the current
/// contract only; other contracts are analyzed regardless.
#[derive(Debug, Error)]
pub enum ChcError {
    #[error(transparent)]
    Encoding(#[from] EncodingError),
    #[error(transparent)]
    Predicate(#[from] PredicateError),
    #[error("no contract is being analyzed")]
    NoContract,
    #[error("function has no body to encode")]
    MissingBody,
    #[error("path stack empty where a block was required")]
    EmptyPath,
    #[error("path stack depth {path} diverged from solver scope depth {scopes}")]
    ScopeMismatch { path: usize, scopes: usize },
    #[error("path stack depth {path} does not match {blocks} open function blocks")]
    BlockMismatch { path: usize, blocks: usize },
}

/// A block currently on the encoding path: its SSA-qualified predicate
/// name, the captured application, and the captured argument list.
#[derive(Debug, Clone)]
struct PathEntry {
    name: String,
    app: SmtExpr,
    args: Vec<SmtExpr>,
}

/// The complete encoding context: registry, SSA state, path stack and
/// verification targets, all owned here and threaded by exclusive
/// reference.
pub struct ChcChecker<'e> {
    engine: &'e mut dyn HornEngine,
    reporter: &'e mut dyn Reporter,
    ctx: EncodingContext,
    registry: PredicateRegistry,
    catalogue: SortCatalogue,
    interface: Option<PredicateSymbol>,
    error: Option<PredicateSymbol>,
    state_variables: Vec<VariableDeclaration>,
    path: Vec<PathEntry>,
    /// Continuation blocks currently open for the function being encoded.
    function_blocks: usize,
    verification_targets: Vec<VerificationTarget>,
    unknown_call_seen: bool,
}

impl<'e> ChcChecker<'e> {
    pub fn new(engine: &'e mut dyn HornEngine, reporter: &'e mut dyn Reporter) -> Self {
        Self {
            engine,
            reporter,
            ctx: EncodingContext::new(),
            registry: PredicateRegistry::new(),
            catalogue: SortCatalogue::default(),
            interface: None,
            error: None,
            state_variables: Vec::new(),
            path: Vec::new(),
            function_blocks: 0,
            verification_targets: Vec::new(),
            unknown_call_seen: false,
        }
    }

    /// Analyze every deployable contract of the unit. Internal errors are
    /// reported as warnings and never leak across contract boundaries.
    pub fn analyze(&mut self, unit: &SourceUnit) -> Vec<ContractAnalysis> {
        if !unit.checker_enabled {
            debug!("model checker not enabled for this unit");
            return Vec::new();
        }
        let mut analyses = Vec::new();
        for contract in &unit.contracts {
            if contract.is_library() || contract.is_interface() {
                debug!(contract = %contract.name, "skipping non-deployable contract");
                continue;
            }
            match self.analyze_contract(unit, contract) {
                Ok(analysis) => analyses.push(analysis),
                Err(err) => {
                    warn!(contract = %contract.name, error = %err, "contract analysis aborted");
                    self.reporter.warning(
                        contract.location,
                        &format!("Internal error during model checking: {err}"),
                    );
                }
            }
        }
        analyses
    }

    fn analyze_contract(
        &mut self,
        unit: &SourceUnit,
        contract: &ContractDefinition,
    ) -> Result<ContractAnalysis, ChcError> {
        debug!(contract = %contract.name, "encoding contract");
        self.reset();

        self.state_variables = unit
            .state_variables_including_inherited(contract)
            .into_iter()
            .cloned()
            .collect();
        self.catalogue = SortCatalogue::new(&self.state_variables);
        let state_variables = self.state_variables.clone();
        for var in &state_variables {
            self.ctx.create_variable(var);
        }

        self.interface = Some(PredicateSymbol::new(
            &format!("interface_{}_{}", contract.name, contract.id),
            self.catalogue.interface_sort(),
            &mut *self.engine,
        ));
        self.error = Some(PredicateSymbol::new(
            &format!("error_{}_{}", contract.name, contract.id),
            self.catalogue.error_sort(),
            &mut *self.engine,
        ));

        // A written constructor is encoded as a regular function below.
        // Otherwise synthesize one that zero-initializes the state.
        if contract.constructor().is_none() {
            let constructor = PredicateSymbol::new(
                &format!("constructor_{}_{}", contract.name, contract.id),
                self.catalogue.constructor_sort(),
                &mut *self.engine,
            );
            for var in &state_variables {
                self.ctx.increase_index(var.id)?;
                self.ctx.set_zero_value(var.id)?;
            }
            let constructor_app = constructor.apply(&[])?;
            let constructor_name = constructor.current_name();
            // the constructor is a fact: it has no in-edges
            self.add_rule(constructor_app.clone(), constructor_name.clone());
            let interface_app = self.interface_app()?;
            let rule = constructor_app.and(&self.ctx.assertions()).implies(&interface_app);
            let name = format!("{}_to_{}", constructor_name, self.interface()?.current_name());
            self.add_rule(rule, name);
        }

        for function in &contract.functions {
            if function.is_public() && function.is_implemented() {
                self.encode_function(function)?;
            }
        }

        // Driver: one reachability query per recorded target. Target i
        // corresponds to error version i + 1.
        let mut targets = Vec::new();
        let recorded = self.verification_targets.clone();
        for (i, target) in recorded.iter().enumerate() {
            let error_app = self.error()?.apply_at(i + 1, &[])?;
            self.flush_declarations();
            let (result, _model) = self.engine.query(&error_app);
            debug!(query = %error_app, %result, "assertion query");
            let verdict = self.record_verdict(target, result);
            targets.push(TargetReport {
                target: *target,
                verdict,
            });
        }
        Ok(ContractAnalysis {
            contract: contract.id,
            name: contract.name.clone(),
            targets,
        })
    }

    fn record_verdict(
        &mut self,
        target: &VerificationTarget,
        result: CheckResult,
    ) -> TargetVerdict {
        match result {
            CheckResult::Unsatisfiable => TargetVerdict::Safe,
            CheckResult::Satisfiable => {
                self.reporter
                    .warning(target.location, "Assertion violation happens here.");
                TargetVerdict::Unsafe
            }
            CheckResult::Unknown => {
                self.reporter
                    .warning(target.location, "Assertion violation might happen here.");
                TargetVerdict::Unknown
            }
            CheckResult::Conflicting => {
                self.reporter.warning(
                    target.location,
                    "At least two SMT solvers provided conflicting answers. \
                     Results might not be sound.",
                );
                TargetVerdict::Unknown
            }
            CheckResult::Error => {
                self.reporter
                    .warning(target.location, "Error trying to invoke SMT solver.");
                TargetVerdict::SolverError
            }
        }
    }

    // ---- functions ----

    fn encode_function(&mut self, function: &FunctionDefinition) -> Result<(), ChcError> {
        debug!(function = %function.name, "encoding function");
        let body = function.body.as_ref().ok_or(ChcError::MissingBody)?;

        // Parameter, return and local symbols; their initialization
        // constraints travel on the entry edge.
        self.ctx.push_solver();
        encoder::init_function(&mut self.ctx, function)?;
        let init = self.ctx.assertions();
        self.ctx.pop_solver()?;

        let function_sort = self.catalogue.function_sort(function);
        let function_name = predicate_name(function);
        self.registry
            .create_or_bump(function.id, function_sort, &function_name, &mut *self.engine)?;

        // interface ⇒ entry, no constraints
        let interface_app = self.interface_app()?;
        let entry_args = self.function_values(function)?;
        let entry_app = self.registry.apply(function.id, &entry_args)?;
        let entry_name = self.registry.get(function.id)?.current_name();
        self.add_rule(
            interface_app.implies(&entry_app),
            format!("{}_to_{}", self.interface()?.current_name(), entry_name),
        );
        self.push_block(entry_name.clone(), entry_app, entry_args)?;

        // entry ⇒ body, carrying variable initialization
        let body_sort = self.catalogue.body_sort(function);
        self.registry.create_or_bump(
            body.id,
            body_sort,
            &format!("{function_name}_body"),
            &mut *self.engine,
        )?;
        let body_args = self.block_values(function)?;
        let body_app = self.registry.apply(body.id, &body_args)?;
        let body_name = self.registry.get(body.id)?.current_name();
        let (_, entry_top) = self.top_cloned()?;
        self.add_rule(
            entry_top.and(&init).implies(&body_app),
            format!("{entry_name}_to_{body_name}"),
        );
        self.push_block(body_name, body_app, body_args)?;

        self.function_blocks = 2;

        for stmt in &body.statements {
            self.encode_statement(function, stmt)?;
        }

        // body ⇒ exit, the exit block being the re-indexed function
        // predicate
        self.registry.bump(function.id, &mut *self.engine)?;
        let exit_app = self.registry.apply(function.id, &self.function_values(function)?)?;
        let exit_name = self.registry.get(function.id)?.current_name();
        let (from_name, from_app) = self.top_cloned()?;
        self.add_rule(
            from_app.and(&self.ctx.assertions()).implies(&exit_app),
            format!("{from_name}_to_{exit_name}"),
        );

        // exit ⇒ interface, no constraints
        let interface_app = self.interface_app()?;
        self.add_rule(
            exit_app.implies(&interface_app),
            format!("{exit_name}_to_{}", self.interface()?.current_name()),
        );

        if self.path.len() != self.function_blocks {
            return Err(ChcError::BlockMismatch {
                path: self.path.len(),
                blocks: self.function_blocks,
            });
        }
        while !self.path.is_empty() {
            self.pop_block()?;
        }
        self.function_blocks = 0;
        Ok(())
    }

    // ---- statements ----

    fn encode_statement(
        &mut self,
        function: &FunctionDefinition,
        stmt: &Statement,
    ) -> Result<(), ChcError> {
        match stmt {
            Statement::Block(block) => {
                for inner in &block.statements {
                    self.encode_statement(function, inner)?;
                }
                Ok(())
            }
            Statement::If {
                id,
                condition,
                true_branch,
                false_branch,
                ..
            } => self.encode_if(
                function,
                *id,
                condition,
                true_branch,
                false_branch.as_deref(),
            ),
            Statement::While {
                id,
                condition,
                body,
                is_do_while,
                ..
            } => {
                let was_seen = std::mem::replace(&mut self.unknown_call_seen, false);
                // do-while runs its body once before the loop is wired up
                if *is_do_while {
                    self.encode_statement(function, body)?;
                }
                self.encode_loop(function, *id, Some(condition), body, None)?;
                if self.unknown_call_seen {
                    self.erase_knowledge()?;
                }
                self.unknown_call_seen = was_seen;
                Ok(())
            }
            Statement::For {
                id,
                init,
                condition,
                post,
                body,
                ..
            } => {
                let was_seen = std::mem::replace(&mut self.unknown_call_seen, false);
                if let Some(init) = init {
                    self.encode_statement(function, init)?;
                }
                self.encode_loop(function, *id, condition.as_ref(), body, post.as_deref())?;
                if self.unknown_call_seen {
                    self.erase_knowledge()?;
                }
                self.unknown_call_seen = was_seen;
                Ok(())
            }
            Statement::Break { .. } | Statement::Continue { .. } => {
                // Not modeled precisely: both collapse all knowledge
                // within the enclosing loop.
                self.erase_knowledge()?;
                self.ctx.reset_variables(|_, _| true)?;
                Ok(())
            }
            Statement::Return { values, .. } => {
                let return_params: Vec<NodeId> =
                    function.return_parameters.iter().map(|p| p.id).collect();
                let mut events = Vec::new();
                encoder::encode_return(&mut self.ctx, values, &return_params, &mut events)?;
                self.process_events(events)
            }
            Statement::VariableDeclaration { .. } | Statement::Expression { .. } => {
                let events = encoder::encode_statement(&mut self.ctx, stmt)?;
                self.process_events(events)
            }
        }
    }

    fn process_events(&mut self, events: Vec<CallEvent>) -> Result<(), ChcError> {
        for event in events {
            match event {
                CallEvent::Assert {
                    call,
                    location,
                    condition,
                } => self.encode_assert(call, location, condition)?,
                CallEvent::Unknown { kind, location } => {
                    debug!(?kind, %location, "call with unmodeled effects, erasing knowledge");
                    self.erase_knowledge()?;
                    self.unknown_call_seen = true;
                }
            }
        }
        Ok(())
    }

    /// `current ∧ constraints ∧ path conditions ∧ ¬condition ⇒ error_i`
    fn encode_assert(
        &mut self,
        call: NodeId,
        location: SourceLocation,
        condition: SmtExpr,
    ) -> Result<(), ChcError> {
        let error = self.error.as_mut().ok_or(ChcError::NoContract)?;
        error.increase_index(&mut *self.engine);
        let error_app = error.apply(&[])?;

        let (_, current) = self.top_cloned()?;
        let body = current
            .and(&self.ctx.assertions())
            .and(&self.ctx.current_path_conditions())
            .and(&condition.not());
        self.add_rule(body.implies(&error_app), format!("assert_{call}_to_error"));
        self.verification_targets
            .push(VerificationTarget { call, location });
        Ok(())
    }

    /// Branch encoding: fresh `then`/`else` blocks, joined on a re-indexed
    /// function body block that the rest of the surrounding block
    /// continues in.
    fn encode_if(
        &mut self,
        function: &FunctionDefinition,
        id: NodeId,
        condition: &Expression,
        true_branch: &Statement,
        false_branch: Option<&Statement>,
    ) -> Result<(), ChcError> {
        let was_seen = std::mem::replace(&mut self.unknown_call_seen, false);
        let body = function.body.as_ref().ok_or(ChcError::MissingBody)?;

        // condition side effects are observed by the current block
        let mut events = Vec::new();
        let cond = encoder::encode_expression(&mut self.ctx, condition, &mut events)?;
        self.process_events(events)?;

        let body_sort = self.catalogue.body_sort(function);
        self.registry.create_or_bump(
            true_branch.id(),
            body_sort.clone(),
            &format!("if_true_{id}"),
            &mut *self.engine,
        )?;
        if let Some(false_branch) = false_branch {
            self.registry.create_or_bump(
                false_branch.id(),
                body_sort,
                &format!("if_false_{id}"),
                &mut *self.engine,
            )?;
        }
        // The join is pinned now so both branch exits target the same
        // version even if nested constructs re-index the body block.
        let join_index = self.registry.bump(body.id, &mut *self.engine)?;
        let join_name = self.registry.get(body.id)?.name_at(join_index);

        // entry edges over the pre-branch snapshot
        let values = self.block_values(function)?;
        let then_app = self.registry.apply(true_branch.id(), &values)?;
        let then_name = self.registry.get(true_branch.id())?.current_name();
        let (top_name, top_app) = self.top_cloned()?;
        let guard = top_app.and(&self.ctx.assertions());
        self.add_rule(
            guard.and(&cond).implies(&then_app),
            format!("{top_name}_to_{then_name}"),
        );
        match false_branch {
            Some(false_branch) => {
                let else_app = self.registry.apply(false_branch.id(), &values)?;
                let else_name = self.registry.get(false_branch.id())?.current_name();
                self.add_rule(
                    guard.and(&cond.not()).implies(&else_app),
                    format!("{top_name}_to_{else_name}"),
                );
            }
            None => {
                // no else: the false direction goes straight to the join
                let join_app = self.registry.apply_at(body.id, join_index, &values)?;
                self.add_rule(
                    guard.and(&cond.not()).implies(&join_app),
                    format!("{top_name}_to_{join_name}"),
                );
            }
        }

        self.encode_branch(function, true_branch, then_name, then_app, values, body.id, join_index, &join_name)?;
        if let Some(false_branch) = false_branch {
            let branch_args = self.block_values(function)?;
            let else_app = self.registry.apply(false_branch.id(), &branch_args)?;
            let else_name = self.registry.get(false_branch.id())?.current_name();
            self.encode_branch(
                function,
                false_branch,
                else_name,
                else_app,
                branch_args,
                body.id,
                join_index,
                &join_name,
            )?;
        }

        // the surrounding block continues in the join
        let join_args = self.block_values(function)?;
        let join_app = self.registry.apply_at(body.id, join_index, &join_args)?;
        self.push_block(join_name, join_app, join_args)?;
        self.function_blocks += 1;

        if self.unknown_call_seen {
            self.erase_knowledge()?;
        }
        self.unknown_call_seen = was_seen;
        Ok(())
    }

    /// Encode one branch body and its edge into the join block.
    #[allow(clippy::too_many_arguments)]
    fn encode_branch(
        &mut self,
        function: &FunctionDefinition,
        branch: &Statement,
        name: String,
        app: SmtExpr,
        args: Vec<SmtExpr>,
        body_key: NodeId,
        join_index: usize,
        join_name: &str,
    ) -> Result<(), ChcError> {
        self.push_block(name, app, args)?;
        let saved_blocks = self.function_blocks;
        self.encode_statement(function, branch)?;

        let (from_name, from_app) = self.top_cloned()?;
        let join_exit =
            self.registry
                .apply_at(body_key, join_index, &self.block_values(function)?)?;
        self.add_rule(
            from_app.and(&self.ctx.assertions()).implies(&join_exit),
            format!("{from_name}_to_{join_name}"),
        );

        while self.function_blocks > saved_blocks {
            self.pop_block()?;
            self.function_blocks -= 1;
        }
        self.pop_block()
    }

    /// Loop encoding:
    ///
    /// ```text
    /// current ∧ ⟦init⟧                  ⇒ header
    /// header ∧ ⟦cond effects⟧ ∧  cond   ⇒ body_entry
    /// latest ∧ ⟦body + post⟧            ⇒ header          (back edge)
    /// header ∧ ⟦cond effects⟧ ∧ ¬cond   ⇒ continuation
    /// ```
    ///
    /// where `latest` is the loop body entry, or the newest continuation
    /// block if the body spawned nested loops or branches.
    fn encode_loop(
        &mut self,
        function: &FunctionDefinition,
        loop_id: NodeId,
        condition: Option<&Expression>,
        body_stmt: &Statement,
        post: Option<&Statement>,
    ) -> Result<(), ChcError> {
        let body = function.body.as_ref().ok_or(ChcError::MissingBody)?;
        let body_sort = self.catalogue.body_sort(function);

        // header block
        self.registry.create_or_bump(
            loop_id,
            body_sort.clone(),
            &format!("loop_header_{loop_id}"),
            &mut *self.engine,
        )?;
        let header_args = self.block_values(function)?;
        let header_app = self.registry.apply(loop_id, &header_args)?;
        let header_name = self.registry.get(loop_id)?.current_name();
        let (top_name, top_app) = self.top_cloned()?;
        self.add_rule(
            top_app.and(&self.ctx.assertions()).implies(&header_app),
            format!("{top_name}_to_{header_name}"),
        );
        self.push_block(header_name.clone(), header_app, header_args)?;

        // the condition lives in the header so both the body and the exit
        // see its side effects
        let cond = match condition {
            Some(condition) => {
                let mut events = Vec::new();
                let cond = encoder::encode_expression(&mut self.ctx, condition, &mut events)?;
                self.process_events(events)?;
                cond
            }
            None => SmtExpr::true_(),
        };

        // loop body entry
        self.registry.create_or_bump(
            body_stmt.id(),
            body_sort,
            &format!("loop_body_{loop_id}"),
            &mut *self.engine,
        )?;
        let body_args = self.block_values(function)?;
        let body_entry_app = self.registry.apply(body_stmt.id(), &body_args)?;
        let body_entry_name = self.registry.get(body_stmt.id())?.current_name();
        let (_, header_top) = self.top_cloned()?;
        self.add_rule(
            header_top
                .and(&self.ctx.assertions())
                .and(&cond)
                .implies(&body_entry_app),
            format!("{header_name}_to_{body_entry_name}"),
        );
        self.push_block(body_entry_name, body_entry_app, body_args)?;

        let saved_blocks = self.function_blocks;
        self.encode_statement(function, body_stmt)?;
        if let Some(post) = post {
            self.encode_statement(function, post)?;
        }

        // back edge from the latest block on the path
        let (from_name, from_app) = self.top_cloned()?;
        let header_back = self.registry.apply(loop_id, &self.block_values(function)?)?;
        self.add_rule(
            from_app.and(&self.ctx.assertions()).implies(&header_back),
            format!("{from_name}_to_{header_name}"),
        );

        // close continuations opened by nested constructs
        while self.function_blocks > saved_blocks {
            self.pop_block()?;
            self.function_blocks -= 1;
        }

        // continuation block: the function body re-indexed; its exit-edge
        // arguments are the loop body entry snapshot, i.e. the state right
        // after the condition was evaluated
        let continuation_index = self.registry.bump(body.id, &mut *self.engine)?;
        let continuation_name = self.registry.get(body.id)?.name_at(continuation_index);
        let body_entry_snapshot = self.top()?.args.clone();
        let exit_target =
            self.registry
                .apply_at(body.id, continuation_index, &body_entry_snapshot)?;
        self.pop_block()?; // loop body entry

        let (_, header_top) = self.top_cloned()?;
        self.add_rule(
            header_top
                .and(&self.ctx.assertions())
                .and(&cond.not())
                .implies(&exit_target),
            format!("{header_name}_to_{continuation_name}"),
        );
        self.pop_block()?; // header

        let continuation_args = self.block_values(function)?;
        let continuation_app =
            self.registry
                .apply_at(body.id, continuation_index, &continuation_args)?;
        self.push_block(continuation_name, continuation_app, continuation_args)?;
        self.function_blocks += 1;
        Ok(())
    }

    // ---- knowledge erasure ----

    /// Havoc state variables and reference/mapping-typed locals. Branch
    /// merging must not carry equalities past effects that cannot be
    /// modeled.
    fn erase_knowledge(&mut self) -> Result<(), ChcError> {
        let state_ids: BTreeSet<NodeId> = self.state_variables.iter().map(|v| v.id).collect();
        self.ctx
            .reset_variables(|id, var| state_ids.contains(&id) || var.ty().is_reference_or_mapping())?;
        Ok(())
    }

    // ---- path stack ----

    fn push_block(
        &mut self,
        name: String,
        app: SmtExpr,
        args: Vec<SmtExpr>,
    ) -> Result<(), ChcError> {
        self.ctx.push_solver();
        self.path.push(PathEntry { name, app, args });
        self.check_parity()
    }

    fn pop_block(&mut self) -> Result<(), ChcError> {
        self.path.pop().ok_or(ChcError::EmptyPath)?;
        self.ctx.pop_solver()?;
        self.check_parity()
    }

    fn check_parity(&self) -> Result<(), ChcError> {
        if self.path.len() != self.ctx.scope_depth() {
            return Err(ChcError::ScopeMismatch {
                path: self.path.len(),
                scopes: self.ctx.scope_depth(),
            });
        }
        Ok(())
    }

    fn top(&self) -> Result<&PathEntry, ChcError> {
        self.path.last().ok_or(ChcError::EmptyPath)
    }

    fn top_cloned(&self) -> Result<(String, SmtExpr), ChcError> {
        let entry = self.top()?;
        Ok((entry.name.clone(), entry.app.clone()))
    }

    // ---- applications ----

    fn interface(&self) -> Result<&PredicateSymbol, ChcError> {
        self.interface.as_ref().ok_or(ChcError::NoContract)
    }

    fn error(&self) -> Result<&PredicateSymbol, ChcError> {
        self.error.as_ref().ok_or(ChcError::NoContract)
    }

    fn interface_app(&self) -> Result<SmtExpr, ChcError> {
        Ok(self.interface()?.apply(&self.state_values()?)?)
    }

    fn state_values(&self) -> Result<Vec<SmtExpr>, ChcError> {
        self.state_variables
            .iter()
            .map(|v| Ok(self.ctx.current_value(v.id)?))
            .collect()
    }

    /// `state ++ params ++ returns`, current values.
    fn function_values(&self, function: &FunctionDefinition) -> Result<Vec<SmtExpr>, ChcError> {
        let mut values = self.state_values()?;
        for var in function
            .parameters
            .iter()
            .chain(&function.return_parameters)
        {
            values.push(self.ctx.current_value(var.id)?);
        }
        Ok(values)
    }

    /// `state ++ params ++ returns ++ locals`, current values.
    fn block_values(&self, function: &FunctionDefinition) -> Result<Vec<SmtExpr>, ChcError> {
        let mut values = self.function_values(function)?;
        for local in function.local_variables() {
            values.push(self.ctx.current_value(local.id)?);
        }
        Ok(values)
    }

    // ---- engine plumbing ----

    fn flush_declarations(&mut self) {
        for (name, sort) in self.ctx.take_pending_declarations() {
            self.engine.declare_variable(&name, &sort);
        }
    }

    fn add_rule(&mut self, rule: SmtExpr, name: String) {
        self.flush_declarations();
        debug!(rule = %name, "adding rule");
        self.engine.add_rule(&rule, &name);
    }

    fn reset(&mut self) {
        self.ctx.reset();
        self.registry.reset();
        self.interface = None;
        self.error = None;
        self.state_variables.clear();
        self.path.clear();
        self.function_blocks = 0;
        self.verification_targets.clear();
        self.unknown_call_seen = false;
    }
}

fn predicate_name(function: &FunctionDefinition) -> String {
    let base = if function.is_constructor() {
        "constructor".to_string()
    } else if function.is_fallback() {
        "fallback".to_string()
    } else {
        format!("function_{}", function.name)
    };
    format!("{}_{}", base, function.id)
}

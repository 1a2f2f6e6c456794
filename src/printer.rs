//! The iterative printers for terms and proofs.
//!
//! Proofs are arbitrarily deep, so neither printer recurses. Both keep an
//! explicit work stack, print an opening token when a node is first popped,
//! push the node's arguments and a closing entry, and substitute a reference
//! token for every node that has a let binding.

use std::fmt::{self, Write};

use crate::{
    letify::LetTable,
    proof::{ProofId, ProofStore},
    rules::{PrintItem, RuleArguments},
    termdag::{SortId, Term, TermDag, TermId},
    translate::{TermTranslator, TranslationCache},
    util::{Closer, HashMap, RefToken, ASSUME_PREFIX, PROOF_LET_PREFIX, TERM_LET_PREFIX},
    Error,
};

enum TermFrame {
    Visit { id: TermId, space_before: bool },
    Close,
}

/// Writes `term`, replacing every node in `lets` by its reference token.
///
/// With `expand_root`, the root itself is written out even if it has a
/// binding; this is how a binding's own definition is printed.
pub(crate) fn write_term(
    out: &mut impl Write,
    dag: &TermDag,
    term: TermId,
    lets: &LetTable<TermId>,
    expand_root: bool,
) -> fmt::Result {
    write_term_budgeted(out, dag, term, lets, expand_root, &mut Budget::unlimited())
        .map_err(|_| fmt::Error)
}

fn write_term_budgeted(
    out: &mut impl Write,
    dag: &TermDag,
    term: TermId,
    lets: &LetTable<TermId>,
    expand_root: bool,
    budget: &mut Budget,
) -> Result<(), Error> {
    let mut stack = vec![TermFrame::Visit {
        id: term,
        space_before: false,
    }];
    while let Some(frame) = stack.pop() {
        budget.tick()?;
        let (id, space_before) = match frame {
            TermFrame::Close => {
                out.write_char(')')?;
                continue;
            }
            TermFrame::Visit { id, space_before } => (id, space_before),
        };
        if space_before {
            out.write_char(' ')?;
        }
        if !(expand_root && id == term) {
            if let Some(let_id) = lets.get(&id) {
                write!(out, "{}", RefToken(TERM_LET_PREFIX, let_id))?;
                continue;
            }
        }
        let args = match dag.get(id) {
            Term::Lit(lit) => {
                write!(out, "{lit}")?;
                continue;
            }
            Term::Const(name, _) | Term::Var(name, _) => {
                out.write_str(name.as_str())?;
                continue;
            }
            Term::App(op, args) if args.is_empty() => {
                out.write_str(op.as_str())?;
                continue;
            }
            Term::App(op, args) => {
                write!(out, "({op}")?;
                args.clone()
            }
            Term::Apply(head, args) if args.is_empty() => {
                stack.push(TermFrame::Visit {
                    id: *head,
                    space_before: false,
                });
                continue;
            }
            Term::Apply(head, args) => {
                out.write_char('(')?;
                stack.push(TermFrame::Close);
                for child in args.iter().rev() {
                    stack.push(TermFrame::Visit {
                        id: *child,
                        space_before: true,
                    });
                }
                stack.push(TermFrame::Visit {
                    id: *head,
                    space_before: false,
                });
                continue;
            }
        };
        stack.push(TermFrame::Close);
        for child in args.into_iter().rev() {
            stack.push(TermFrame::Visit {
                id: child,
                space_before: true,
            });
        }
    }
    Ok(())
}

/// Bounds the number of work items one print request may process.
#[derive(Debug, Clone)]
pub(crate) struct Budget {
    steps: usize,
    limit: Option<usize>,
}

impl Budget {
    pub(crate) fn new(limit: Option<usize>) -> Self {
        Budget { steps: 0, limit }
    }

    pub(crate) fn unlimited() -> Self {
        Budget::new(None)
    }

    pub(crate) fn steps(&self) -> usize {
        self.steps
    }

    fn tick(&mut self) -> Result<(), Error> {
        self.steps += 1;
        match self.limit {
            Some(limit) if self.steps > limit => Err(Error::StepLimitExceeded(limit)),
            _ => Ok(()),
        }
    }
}

/// Request-local state for printing terms.
///
/// It owns a copy of the arena, so that translated terms never leak into the
/// caller's store.
pub(crate) struct TermPrinter<'a> {
    pub(crate) dag: TermDag,
    translator: &'a dyn TermTranslator,
    translated: TranslationCache,
    pub(crate) lets: LetTable<TermId>,
    pub(crate) budget: Budget,
}

impl<'a> TermPrinter<'a> {
    pub(crate) fn new(dag: TermDag, translator: &'a dyn TermTranslator, step_limit: Option<usize>) -> Self {
        TermPrinter {
            dag,
            translator,
            translated: TranslationCache::default(),
            lets: LetTable::default(),
            budget: Budget::new(step_limit),
        }
    }

    pub(crate) fn to_internal(&mut self, term: TermId) -> TermId {
        self.translator.to_internal_cached(&mut self.dag, term, &mut self.translated)
    }

    pub(crate) fn to_internal_sort(&mut self, sort: SortId) -> SortId {
        self.translator.to_internal_sort(&mut self.dag, sort)
    }

    /// Writes an already translated term.
    pub(crate) fn write_term(
        &mut self,
        out: &mut impl Write,
        term: TermId,
        expand_root: bool,
    ) -> Result<(), Error> {
        write_term_budgeted(out, &self.dag, term, &self.lets, expand_root, &mut self.budget)
    }

    /// Writes `(@ @t<N> <term>` for every binding, recording a closer for each.
    pub(crate) fn write_let_list(&mut self, out: &mut impl Write, closer: &mut Closer) -> Result<(), Error> {
        let bindings: Vec<_> = self.lets.iter().collect();
        for (term, id) in bindings {
            log::trace!("term let {} := {}", RefToken(TERM_LET_PREFIX, id), term);
            write!(out, "(@ {} ", RefToken(TERM_LET_PREFIX, id))?;
            self.write_term(out, term, true)?;
            out.write_char('\n')?;
            closer.open(")");
        }
        Ok(())
    }
}

/// Whether a rule application's closing parenthesis has been written.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ProofState {
    Opened,
    Closed,
}

/// Request-local state for printing proofs.
pub(crate) struct ProofPrinter<'a> {
    pub(crate) terms: TermPrinter<'a>,
    store: &'a ProofStore,
    rules: &'a dyn RuleArguments,
    pub(crate) lets: LetTable<ProofId>,
    /// Labels of the assumptions in scope, keyed by their translated conclusion.
    assumptions: HashMap<TermId, u32>,
}

impl<'a> ProofPrinter<'a> {
    pub(crate) fn new(
        terms: TermPrinter<'a>,
        store: &'a ProofStore,
        rules: &'a dyn RuleArguments,
        assumptions: HashMap<TermId, u32>,
    ) -> Self {
        ProofPrinter {
            terms,
            store,
            rules,
            lets: LetTable::default(),
            assumptions,
        }
    }

    /// Writes `(plet _ _ <proof> (\ @p<N>` for every binding, then the body,
    /// then closes every binding.
    pub(crate) fn write_letified(&mut self, out: &mut impl Write, root: ProofId, threshold: usize) -> Result<(), Error> {
        self.lets = crate::letify::compute_proof_lets(self.store, root, threshold);
        let mut closer = Closer::new();
        let bindings: Vec<_> = self.lets.iter().collect();
        for (proof, id) in bindings {
            log::trace!("proof let {} := step {}", RefToken(PROOF_LET_PREFIX, id), proof);
            out.write_str("(plet _ _ ")?;
            self.write_proof(out, proof, true)?;
            writeln!(out, " (\\ {}", RefToken(PROOF_LET_PREFIX, id))?;
            closer.open("))");
        }
        self.write_proof(out, root, false)?;
        closer.close_all(out)?;
        Ok(())
    }

    /// Writes one proof, substituting bindings and assumption labels.
    ///
    /// A node is pushed back as its own closing sentinel when it is opened.
    /// Since the proof is acyclic, popping a node in the `Opened` state means
    /// all of its arguments have been written.
    pub(crate) fn write_proof(&mut self, out: &mut impl Write, root: ProofId, expand_root: bool) -> Result<(), Error> {
        let mut state = HashMap::<ProofId, ProofState>::default();
        let mut stack = vec![(PrintItem::Proof(root), false)];
        while let Some((item, space_before)) = stack.pop() {
            self.terms.budget.tick()?;
            if let PrintItem::Proof(id) = item {
                if state.get(&id) == Some(&ProofState::Opened) {
                    state.insert(id, ProofState::Closed);
                    out.write_char(')')?;
                    continue;
                }
            }
            if space_before {
                out.write_char(' ')?;
            }
            let id = match item {
                PrintItem::Hole => {
                    out.write_char('_')?;
                    continue;
                }
                PrintItem::Term(term) => {
                    let internal = self.terms.to_internal(term);
                    self.terms.write_term(out, internal, false)?;
                    continue;
                }
                PrintItem::Proof(id) => id,
            };

            if !(expand_root && id == root) {
                if let Some(let_id) = self.lets.get(&id) {
                    write!(out, "{}", RefToken(PROOF_LET_PREFIX, let_id))?;
                    continue;
                }
            }
            let store = self.store;
            let node = store.get(id);
            if node.is_assume() {
                let conclusion = self.terms.to_internal(node.conclusion());
                let Some(label) = self.assumptions.get(&conclusion) else {
                    panic!(
                        "ASSUME step {id} concludes {}, which is not among the assertions it is printed against",
                        self.terms.dag.to_string(conclusion)
                    );
                };
                write!(out, "{}", RefToken(ASSUME_PREFIX, *label))?;
                continue;
            }

            state.insert(id, ProofState::Opened);
            write!(out, "({}", self.rules.rule_token(store, node))?;
            stack.push((PrintItem::Proof(id), false));
            for arg in self.rules.rule_arguments(store, node).into_iter().rev() {
                stack.push((arg, true));
            }
        }
        Ok(())
    }
}

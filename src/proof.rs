//! Proofs as hashconsed DAGs of inference steps.
//!
//! A [`ProofStore`] is similar to a [`TermDag`]: it is an arena enabling proofs to
//! share sub-proofs, and it owns the [`TermDag`] holding their conclusions and
//! arguments. A step can only be added once its premises are in the store, so
//! ids are always a topological order of the proof.

use std::fmt::{self, Display, Formatter};

use crate::{
    termdag::{TermDag, TermId},
    util::{HashSet, IndexSet},
};

/// An identifier for a proof step in a [`ProofStore`].
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug)]
pub struct ProofId(u32);

impl ProofId {
    pub fn from_usize(index: usize) -> Self {
        ProofId(u32::try_from(index).expect("proof store overflowed u32 ids"))
    }

    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl Display for ProofId {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.index())
    }
}

/// The inference rules a solver can justify a step with.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub enum PfRule {
    /// A leaf: the conclusion is one of the input assertions.
    Assume,
    Scope,
    Resolution,
    ChainResolution,
    Factoring,
    Reordering,
    Split,
    EqResolve,
    ModusPonens,
    NotNotElim,
    Contra,
    AndElim,
    AndIntro,
    NotOrElim,
    ImpliesElim,
    Refl,
    Symm,
    Trans,
    Cong,
    TrueIntro,
    TrueElim,
    FalseIntro,
    FalseElim,
    /// A step the solver could not justify further.
    Trust,
}

impl PfRule {
    /// The lowercase name used for the rule in certificates.
    pub fn lfsc_name(self) -> &'static str {
        match self {
            PfRule::Assume => "assume",
            PfRule::Scope => "scope",
            PfRule::Resolution => "resolution",
            PfRule::ChainResolution => "chain_resolution",
            PfRule::Factoring => "factoring",
            PfRule::Reordering => "reordering",
            PfRule::Split => "split",
            PfRule::EqResolve => "eq_resolve",
            PfRule::ModusPonens => "modus_ponens",
            PfRule::NotNotElim => "not_not_elim",
            PfRule::Contra => "contra",
            PfRule::AndElim => "and_elim",
            PfRule::AndIntro => "and_intro",
            PfRule::NotOrElim => "not_or_elim",
            PfRule::ImpliesElim => "implies_elim",
            PfRule::Refl => "refl",
            PfRule::Symm => "symm",
            PfRule::Trans => "trans",
            PfRule::Cong => "cong",
            PfRule::TrueIntro => "true_intro",
            PfRule::TrueElim => "true_elim",
            PfRule::FalseIntro => "false_intro",
            PfRule::FalseElim => "false_elim",
            PfRule::Trust => "trust",
        }
    }
}

impl Display for PfRule {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.lfsc_name().to_uppercase())
    }
}

/// One inference step: a rule, its premises, its conclusion and rule-specific arguments.
#[derive(Clone, PartialEq, Eq, Hash, Debug)]
pub struct ProofNode {
    rule: PfRule,
    children: Vec<ProofId>,
    conclusion: TermId,
    args: Vec<TermId>,
}

impl ProofNode {
    pub fn new(rule: PfRule, children: Vec<ProofId>, conclusion: TermId, args: Vec<TermId>) -> Self {
        ProofNode {
            rule,
            children,
            conclusion,
            args,
        }
    }

    pub fn rule(&self) -> PfRule {
        self.rule
    }

    pub fn children(&self) -> &[ProofId] {
        &self.children
    }

    pub fn conclusion(&self) -> TermId {
        self.conclusion
    }

    pub fn args(&self) -> &[TermId] {
        &self.args
    }

    pub fn is_assume(&self) -> bool {
        self.rule == PfRule::Assume
    }
}

#[derive(Clone, Debug, Default)]
pub struct ProofStore {
    term_dag: TermDag,
    nodes: IndexSet<ProofNode>,
}

impl ProofStore {
    pub fn term_dag(&self) -> &TermDag {
        &self.term_dag
    }

    /// Terms can be added at any time; existing terms never change.
    pub fn term_dag_mut(&mut self) -> &mut TermDag {
        &mut self.term_dag
    }

    pub fn size(&self) -> usize {
        self.nodes.len()
    }

    /// Get the [`ProofNode`] with the given id.
    /// Panics if the id is invalid (if it came from another proof store, for example).
    pub fn get(&self, id: ProofId) -> &ProofNode {
        self.nodes
            .get_index(id.index())
            .unwrap_or_else(|| panic!("proof id {id} is out of bounds for a store of {} steps", self.size()))
    }

    /// Insert a step, deduplicating it against existing steps.
    ///
    /// Panics if a premise, the conclusion or an argument is not already in the store.
    pub fn add(&mut self, node: ProofNode) -> ProofId {
        for child in &node.children {
            assert!(
                child.index() < self.nodes.len(),
                "premise {child} of a {} step is not in this store",
                node.rule
            );
        }
        for term in std::iter::once(&node.conclusion).chain(&node.args) {
            assert!(
                self.term_dag.contains(*term),
                "term {term} of a {} step is not in this store's dag",
                node.rule
            );
        }
        assert!(
            !node.is_assume() || node.children.is_empty(),
            "ASSUME steps have no premises"
        );
        ProofId::from_usize(self.nodes.insert_full(node).0)
    }

    pub fn assume(&mut self, conclusion: TermId) -> ProofId {
        self.add(ProofNode::new(PfRule::Assume, vec![], conclusion, vec![]))
    }

    pub fn step(
        &mut self,
        rule: PfRule,
        children: Vec<ProofId>,
        conclusion: TermId,
        args: Vec<TermId>,
    ) -> ProofId {
        self.add(ProofNode::new(rule, children, conclusion, args))
    }

    /// The ASSUME leaves reachable from `root`, in the order a left-to-right
    /// traversal first encounters them.
    pub fn assumptions(&self, root: ProofId) -> Vec<ProofId> {
        let mut leaves = vec![];
        let mut seen = HashSet::default();
        let mut stack = vec![root];
        while let Some(id) = stack.pop() {
            if !seen.insert(id) {
                continue;
            }
            let node = self.get(id);
            if node.is_assume() {
                leaves.push(id);
            }
            stack.extend(node.children.iter().rev());
        }
        leaves
    }
}

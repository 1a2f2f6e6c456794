//! Per-rule argument lists.
//!
//! The printer knows nothing about individual inference rules. For each step it
//! asks a [`RuleArguments`] implementation for the rule token and the ordered
//! items that follow it. [`RuleTable`] dispatches on the rule tag to one
//! implementation per rule family.

use crate::{
    proof::{PfRule, ProofId, ProofNode, ProofStore},
    termdag::{Literal, Term, TermId},
    util::HashMap,
};

/// One argument position of a printed rule application.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub enum PrintItem {
    Term(TermId),
    Proof(ProofId),
    /// An argument the checker infers, printed as `_`.
    Hole,
}

pub trait RuleArguments {
    fn rule_token(&self, store: &ProofStore, node: &ProofNode) -> String;

    fn rule_arguments(&self, store: &ProofStore, node: &ProofNode) -> Vec<PrintItem>;
}

fn holes(n: usize) -> impl Iterator<Item = PrintItem> {
    std::iter::repeat(PrintItem::Hole).take(n)
}

fn premises(node: &ProofNode) -> impl Iterator<Item = PrintItem> + '_ {
    node.children().iter().map(|p| PrintItem::Proof(*p))
}

fn terms(ids: &[TermId]) -> impl Iterator<Item = PrintItem> + '_ {
    ids.iter().map(|t| PrintItem::Term(*t))
}

/// The premises followed by the argument terms.
#[derive(Debug, Default, Clone, Copy)]
pub struct GenericRule;

impl RuleArguments for GenericRule {
    fn rule_token(&self, _store: &ProofStore, node: &ProofNode) -> String {
        node.rule().lfsc_name().to_string()
    }

    fn rule_arguments(&self, _store: &ProofStore, node: &ProofNode) -> Vec<PrintItem> {
        premises(node).chain(terms(node.args())).collect()
    }
}

/// `refl`, `symm`, `trans` and `cong`. The equalities being related are left
/// for the checker to infer.
#[derive(Debug, Default, Clone, Copy)]
pub struct EqualityRules;

impl RuleArguments for EqualityRules {
    fn rule_token(&self, _store: &ProofStore, node: &ProofNode) -> String {
        node.rule().lfsc_name().to_string()
    }

    fn rule_arguments(&self, _store: &ProofStore, node: &ProofNode) -> Vec<PrintItem> {
        let inferred = match node.rule() {
            PfRule::Refl => {
                return match node.args().first() {
                    Some(t) => vec![PrintItem::Term(*t)],
                    None => vec![PrintItem::Hole],
                }
            }
            PfRule::Symm => 2,
            PfRule::Trans => 3,
            PfRule::Cong => 4,
            other => panic!("{other} is not an equality rule"),
        };
        holes(inferred).chain(premises(node)).collect()
    }
}

/// Binary resolution. The arguments are the pivot polarity and the pivot;
/// the rule is `R` when the pivot occurs positively in the first premise and
/// `Q` otherwise. Both clauses are inferred.
#[derive(Debug, Default, Clone, Copy)]
pub struct ResolutionRules;

impl ResolutionRules {
    fn positive(store: &ProofStore, node: &ProofNode) -> bool {
        match node.args().first().map(|t| store.term_dag().get(*t)) {
            Some(Term::Lit(Literal::Bool(pol))) => *pol,
            _ => true,
        }
    }
}

impl RuleArguments for ResolutionRules {
    fn rule_token(&self, store: &ProofStore, node: &ProofNode) -> String {
        if node.rule() != PfRule::Resolution {
            return node.rule().lfsc_name().to_string();
        }
        let token = if Self::positive(store, node) { "R" } else { "Q" };
        token.to_string()
    }

    fn rule_arguments(&self, store: &ProofStore, node: &ProofNode) -> Vec<PrintItem> {
        if node.rule() != PfRule::Resolution {
            return GenericRule.rule_arguments(store, node);
        }
        holes(2)
            .chain(premises(node))
            .chain(terms(node.args().get(1..).unwrap_or_default()))
            .collect()
    }
}

/// Steps that are not justified further print their conclusion.
#[derive(Debug, Default, Clone, Copy)]
pub struct TrustRule;

impl RuleArguments for TrustRule {
    fn rule_token(&self, _store: &ProofStore, node: &ProofNode) -> String {
        node.rule().lfsc_name().to_string()
    }

    fn rule_arguments(&self, _store: &ProofStore, node: &ProofNode) -> Vec<PrintItem> {
        premises(node)
            .chain(std::iter::once(PrintItem::Term(node.conclusion())))
            .collect()
    }
}

/// Looks up the argument provider for a step by its rule tag.
pub struct RuleTable {
    families: HashMap<PfRule, Box<dyn RuleArguments>>,
    fallback: Box<dyn RuleArguments>,
}

impl RuleTable {
    /// An empty table; every rule goes to `fallback`.
    pub fn new(fallback: impl RuleArguments + 'static) -> Self {
        RuleTable {
            families: HashMap::default(),
            fallback: Box::new(fallback),
        }
    }

    /// The table used for the LFSC signature.
    pub fn lfsc() -> Self {
        let mut table = RuleTable::new(GenericRule);
        for rule in [PfRule::Refl, PfRule::Symm, PfRule::Trans, PfRule::Cong] {
            table.register(rule, EqualityRules);
        }
        table.register(PfRule::Resolution, ResolutionRules);
        table.register(PfRule::Trust, TrustRule);
        table
    }

    pub fn register(&mut self, rule: PfRule, family: impl RuleArguments + 'static) {
        self.families.insert(rule, Box::new(family));
    }

    fn family(&self, rule: PfRule) -> &dyn RuleArguments {
        self.families
            .get(&rule)
            .map(|f| &**f)
            .unwrap_or(&*self.fallback)
    }
}

impl Default for RuleTable {
    fn default() -> Self {
        RuleTable::lfsc()
    }
}

impl RuleArguments for RuleTable {
    fn rule_token(&self, store: &ProofStore, node: &ProofNode) -> String {
        self.family(node.rule()).rule_token(store, node)
    }

    fn rule_arguments(&self, store: &ProofStore, node: &ProofNode) -> Vec<PrintItem> {
        self.family(node.rule()).rule_arguments(store, node)
    }
}

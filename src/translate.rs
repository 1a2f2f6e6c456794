//! Translation from solver terms into the vocabulary of the LFSC signature.

use crate::{
    termdag::{SortId, Term, TermDag, TermId},
    util::HashMap,
    Symbol,
};

/// Translations already computed during one print request, keyed by the
/// original term.
#[derive(Debug, Default, Clone)]
pub struct TranslationCache {
    done: HashMap<TermId, TermId>,
}

impl TranslationCache {
    pub fn get(&self, term: TermId) -> Option<TermId> {
        self.done.get(&term).copied()
    }

    pub fn insert(&mut self, term: TermId, internal: TermId) {
        self.done.insert(term, internal);
    }

    pub fn len(&self) -> usize {
        self.done.len()
    }

    pub fn is_empty(&self) -> bool {
        self.done.is_empty()
    }
}

/// Maps solver terms and sorts to the form the certificate language expects.
///
/// Implementations must be pure: the result may only depend on the dag
/// contents and the input. New terms are added to `dag`.
pub trait TermTranslator {
    fn to_internal(&self, dag: &mut TermDag, term: TermId) -> TermId;

    /// Like [`TermTranslator::to_internal`], reusing and extending `cache`.
    ///
    /// The default only caches `term` itself. Translators that walk subterms
    /// should record them too, so shared subterms are translated once per request.
    fn to_internal_cached(&self, dag: &mut TermDag, term: TermId, cache: &mut TranslationCache) -> TermId {
        if let Some(internal) = cache.get(term) {
            return internal;
        }
        let internal = self.to_internal(dag, term);
        cache.insert(term, internal);
        internal
    }

    fn to_internal_sort(&self, _dag: &mut TermDag, sort: SortId) -> SortId {
        sort
    }
}

/// Leaves every term as it is.
#[derive(Debug, Default, Clone, Copy)]
pub struct IdentityTranslator;

impl TermTranslator for IdentityTranslator {
    fn to_internal(&self, _dag: &mut TermDag, term: TermId) -> TermId {
        term
    }
}

/// The translation used by the LFSC signature:
/// * `and` and `or` are binary, right-nested and terminated by their unit,
///   so `(and a b c)` becomes `(and a (and b (and c true)))`;
/// * other associative operators are binary and right-nested;
/// * uninterpreted functions are curried through `apply`.
#[derive(Debug, Default, Clone, Copy)]
pub struct LfscTranslator;

const ASSOCIATIVE: &[&str] = &["+", "*", "xor", "bvand", "bvor", "bvadd", "bvmul", "concat"];

impl LfscTranslator {
    fn convert(&self, dag: &mut TermDag, term: Term, done: &HashMap<TermId, TermId>) -> Term {
        match term {
            Term::Lit(_) | Term::Const(..) | Term::Var(..) => term,
            Term::App(op, args) => {
                let args: Vec<TermId> = args.iter().map(|a| done[a]).collect();
                let unit = match op.as_str() {
                    "and" => Some(true),
                    "or" => Some(false),
                    _ => None,
                };
                if let Some(unit) = unit {
                    let tail = dag.bool_lit(unit);
                    return Self::nest(dag, op, args, tail);
                }
                if ASSOCIATIVE.contains(&op.as_str()) && args.len() > 2 {
                    let mut args = args;
                    let tail = args.pop().expect("more than two arguments");
                    return Self::nest(dag, op, args, tail);
                }
                Term::App(op, args)
            }
            Term::Apply(head, args) => {
                let mut cur = done[&head];
                let Some((last, init)) = args.split_last() else {
                    return dag.get(cur).clone();
                };
                for arg in init {
                    cur = dag.app("apply", vec![cur, done[arg]]);
                }
                Term::App("apply".into(), vec![cur, done[last]])
            }
        }
    }

    /// `op(a1, op(a2, ... op(an, tail)))`, returned without inserting the outermost node.
    fn nest(dag: &mut TermDag, op: Symbol, args: Vec<TermId>, tail: TermId) -> Term {
        let mut args = args.into_iter().rev();
        let Some(first) = args.next() else {
            return dag.get(tail).clone();
        };
        let mut node = Term::App(op, vec![first, tail]);
        for arg in args {
            let inner = dag.add(node);
            node = Term::App(op, vec![arg, inner]);
        }
        node
    }
}

impl TermTranslator for LfscTranslator {
    fn to_internal(&self, dag: &mut TermDag, term: TermId) -> TermId {
        self.to_internal_cached(dag, term, &mut TranslationCache::default())
    }

    fn to_internal_cached(&self, dag: &mut TermDag, term: TermId, cache: &mut TranslationCache) -> TermId {
        // use a stack to avoid stack overflow
        let mut stack = vec![(term, false)];
        while let Some((id, children_done)) = stack.pop() {
            if cache.done.contains_key(&id) {
                continue;
            }
            let node = dag.get(id).clone();
            if children_done {
                let converted = self.convert(dag, node, &cache.done);
                let new_id = dag.add(converted);
                cache.insert(id, new_id);
            } else {
                stack.push((id, true));
                for child in node.children().into_iter().rev() {
                    if !cache.done.contains_key(&child) {
                        stack.push((child, false));
                    }
                }
            }
        }
        cache.done[&term]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn setup() -> (TermDag, TermId, TermId, TermId) {
        let mut td = TermDag::default();
        let b = td.bool_sort();
        let p = td.constant("p", b);
        let q = td.constant("q", b);
        let r = td.constant("r", b);
        (td, p, q, r)
    }

    #[test]
    fn and_or_are_nested_with_units() {
        let (mut td, p, q, r) = setup();
        let and = td.app("and", vec![p, q, r]);
        let internal = LfscTranslator.to_internal(&mut td, and);
        assert_eq!(td.to_string(internal), "(and p (and q (and r true)))");

        let or = td.app("or", vec![p, q]);
        let internal = LfscTranslator.to_internal(&mut td, or);
        assert_eq!(td.to_string(internal), "(or p (or q false))");
    }

    #[test]
    fn associative_operators_are_binary() {
        let mut td = TermDag::default();
        let int = td.int_sort();
        let x = td.constant("x", int);
        let y = td.constant("y", int);
        let one = td.lit(1i64);
        let sum = td.app("+", vec![x, y, one]);
        let pair = td.app("+", vec![x, y]);
        let internal = LfscTranslator.to_internal(&mut td, sum);
        assert_eq!(td.to_string(internal), "(+ x (+ y 1))");
        assert_eq!(LfscTranslator.to_internal(&mut td, pair), pair);
    }

    #[test]
    fn uninterpreted_functions_are_curried() {
        let mut td = TermDag::default();
        let u = td.uninterpreted_sort("U");
        let f_sort = td.arrow_sort(vec![u, u], u);
        let f = td.constant("f", f_sort);
        let a = td.constant("a", u);
        let b = td.constant("b", u);
        let fab = td.apply(f, vec![a, b]);
        let ffab = td.apply(f, vec![fab, a]);
        let internal = LfscTranslator.to_internal(&mut td, ffab);
        assert_eq!(
            td.to_string(internal),
            "(apply (apply f (apply (apply f a) b)) a)"
        );
    }

    #[test]
    fn translation_preserves_sharing() {
        let (mut td, p, q, r) = setup();
        let pq = td.app("or", vec![p, q]);
        let top = td.app("and", vec![pq, r, pq]);
        let internal = LfscTranslator.to_internal(&mut td, top);
        let translated_pq = LfscTranslator.to_internal(&mut td, pq);
        let Term::App(_, args) = td.get(internal).clone() else {
            panic!("expected an application");
        };
        assert_eq!(args[0], translated_pq);
    }

    #[test]
    fn shared_subterms_are_translated_once() {
        let (mut td, p, q, r) = setup();
        let pq = td.app("and", vec![p, q]);
        let left = td.app("or", vec![pq, r]);
        let right = td.app("or", vec![r, pq]);

        let mut cache = TranslationCache::default();
        let first = LfscTranslator.to_internal_cached(&mut td, left, &mut cache);
        let translated_pq = cache.get(pq).unwrap();
        assert_eq!(td.to_string(translated_pq), "(and p (and q true))");
        let walked = cache.len();

        let second = LfscTranslator.to_internal_cached(&mut td, right, &mut cache);
        // only `right` itself is new
        assert_eq!(cache.len(), walked + 1);
        assert_eq!(td.to_string(first), "(or (and p (and q true)) (or r false))");
        assert_eq!(td.to_string(second), "(or r (or (and p (and q true)) false))");
        assert_eq!(LfscTranslator.to_internal(&mut td, right), second);
    }

    #[test]
    fn default_cache_records_roots() {
        let (mut td, p, q, _) = setup();
        let and = td.app("and", vec![p, q]);
        let mut cache = TranslationCache::default();
        assert!(cache.is_empty());
        assert_eq!(IdentityTranslator.to_internal_cached(&mut td, and, &mut cache), and);
        assert_eq!(cache.get(and), Some(and));
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn identity_translation() {
        let (mut td, p, q, _) = setup();
        let and = td.app("and", vec![p, q]);
        assert_eq!(IdentityTranslator.to_internal(&mut td, and), and);
    }
}

use std::fmt::Write;

use crate::{
    letify::{compute_term_lets, DEFAULT_LET_THRESHOLD},
    printer::{ProofPrinter, TermPrinter},
    proof::{ProofId, ProofStore},
    rules::{RuleArguments, RuleTable},
    termdag::{SortId, Term, TermDag, TermId},
    translate::{LfscTranslator, TermTranslator},
    util::{Closer, HashMap, RefToken, ASSUME_PREFIX},
    Error, Symbol,
};

/// Settings for one [`LfscPrinter`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PrinterConfig {
    /// A compound term used at least this many times gets a `(@ ...)` binding.
    pub term_let_threshold: usize,
    /// A sub-proof used at least this many times gets a `(plet ...)` binding.
    pub proof_let_threshold: usize,
    /// Give up with [`Error::StepLimitExceeded`] after this many work items.
    pub step_limit: Option<usize>,
}

impl Default for PrinterConfig {
    fn default() -> Self {
        Self {
            term_let_threshold: DEFAULT_LET_THRESHOLD,
            proof_let_threshold: DEFAULT_LET_THRESHOLD,
            step_limit: None,
        }
    }
}

/// Prints proofs of unsatisfiability as LFSC certificates.
///
/// Every print request builds its own let tables and its own copy of the term
/// arena, so one printer can serve any number of requests.
pub struct LfscPrinter<T = LfscTranslator, R = RuleTable> {
    translator: T,
    rules: R,
    config: PrinterConfig,
}

impl Default for LfscPrinter {
    fn default() -> Self {
        LfscPrinter::new(LfscTranslator, RuleTable::lfsc(), PrinterConfig::default())
    }
}

impl<T: TermTranslator, R: RuleArguments> LfscPrinter<T, R> {
    pub fn new(translator: T, rules: R, config: PrinterConfig) -> Self {
        LfscPrinter {
            translator,
            rules,
            config,
        }
    }

    pub fn with_config(mut self, config: PrinterConfig) -> Self {
        self.config = config;
        self
    }

    /// Print the certificate that `proof`, a proof of `false`, refutes
    /// `assertions`.
    ///
    /// Nothing is written to `out` unless the whole certificate was printed.
    pub fn print_certificate(
        &self,
        out: &mut impl Write,
        store: &ProofStore,
        assertions: &[TermId],
        proof: ProofId,
    ) -> Result<(), Error> {
        let assumed = store.assumptions(proof);
        if assertions.is_empty() && !assumed.is_empty() {
            return Err(Error::MissingAssertions(assumed.len()));
        }
        let conclusion = store.get(proof).conclusion();
        if !store.term_dag().is_false(conclusion) {
            return Err(Error::ConclusionNotFalse(store.term_dag().to_string(conclusion)));
        }

        let mut buf = String::new();
        let mut closer = Closer::new();
        let mut terms = TermPrinter::new(store.term_dag().clone(), &self.translator, self.config.step_limit);

        // declarations
        let symbols = terms.dag.free_symbols(assertions);
        let mut declared = Vec::with_capacity(symbols.len());
        for symbol in &symbols {
            let Term::Const(name, sort) = terms.dag.get(*symbol).clone() else {
                unreachable!("free symbols are constants");
            };
            declared.push((name, terms.to_internal_sort(sort)));
        }
        // a name can only be declared once
        let mut sort_of = HashMap::<Symbol, SortId>::default();
        for (name, sort) in &declared {
            if *sort_of.entry(*name).or_insert(*sort) != *sort {
                return Err(Error::AmbiguousSymbol(*name));
            }
        }
        let sorts = terms.dag.uninterpreted_sorts(declared.iter().map(|(_, sort)| *sort));
        for sort in &sorts {
            write!(buf, "(declare ")?;
            terms.dag.write_sort(&mut buf, *sort)?;
            writeln!(buf, " sort)")?;
        }
        for (name, sort) in &declared {
            write!(buf, "(declare {name} ")?;
            terms.dag.write_sort(&mut buf, *sort)?;
            writeln!(buf, ")")?;
        }

        let internal: Vec<TermId> = assertions.iter().map(|a| terms.to_internal(*a)).collect();

        writeln!(buf, "(check")?;
        closer.open(")");
        terms.lets = compute_term_lets(&terms.dag, &internal, self.config.term_let_threshold);
        terms.write_let_list(&mut buf, &mut closer)?;

        // assumptions, each bound once
        let mut labels = HashMap::<TermId, u32>::default();
        for assertion in &internal {
            if labels.contains_key(assertion) {
                continue;
            }
            let label = labels.len() as u32;
            write!(buf, "(% {} (holds ", RefToken(ASSUME_PREFIX, label))?;
            terms.write_term(&mut buf, *assertion, false)?;
            writeln!(buf, ")")?;
            closer.open(")");
            labels.insert(*assertion, label);
        }

        writeln!(buf, "(: (holds false)")?;
        closer.open(")");

        log::debug!(
            "certificate: {} sorts, {} symbols, {} assumptions, {} term lets",
            sorts.len(),
            declared.len(),
            labels.len(),
            terms.lets.len()
        );

        let mut proofs = ProofPrinter::new(terms, store, &self.rules, labels);
        proofs.write_letified(&mut buf, proof, self.config.proof_let_threshold)?;
        closer.close_all(&mut buf)?;
        log::debug!("certificate printed in {} steps", proofs.terms.budget.steps());

        out.write_str(&buf)?;
        Ok(())
    }

    pub fn certificate_to_string(
        &self,
        store: &ProofStore,
        assertions: &[TermId],
        proof: ProofId,
    ) -> Result<String, Error> {
        let mut result = String::new();
        self.print_certificate(&mut result, store, assertions, proof)?;
        Ok(result)
    }

    /// Print a proof on its own, with its proof lets but without declarations,
    /// assumption bindings or the `false` annotation.
    ///
    /// ASSUME steps are free in the printed proof. They are labelled in the
    /// order they are first encountered.
    pub fn print_proof(&self, out: &mut impl Write, store: &ProofStore, proof: ProofId) -> Result<(), Error> {
        let mut terms = TermPrinter::new(store.term_dag().clone(), &self.translator, self.config.step_limit);
        let mut labels = HashMap::<TermId, u32>::default();
        for leaf in store.assumptions(proof) {
            let conclusion = terms.to_internal(store.get(leaf).conclusion());
            let next = labels.len() as u32;
            labels.entry(conclusion).or_insert(next);
        }

        let mut buf = String::new();
        let mut proofs = ProofPrinter::new(terms, store, &self.rules, labels);
        proofs.write_letified(&mut buf, proof, self.config.proof_let_threshold)?;
        out.write_str(&buf)?;
        Ok(())
    }

    pub fn proof_to_string(&self, store: &ProofStore, proof: ProofId) -> Result<String, Error> {
        let mut result = String::new();
        self.print_proof(&mut result, store, proof)?;
        Ok(result)
    }

    /// Print a single term, translated, with its own term lets.
    pub fn print_term(&self, out: &mut impl Write, dag: &TermDag, term: TermId) -> Result<(), Error> {
        let mut terms = TermPrinter::new(dag.clone(), &self.translator, self.config.step_limit);
        let internal = terms.to_internal(term);
        terms.lets = compute_term_lets(&terms.dag, &[internal], self.config.term_let_threshold);

        let mut buf = String::new();
        let mut closer = Closer::new();
        terms.write_let_list(&mut buf, &mut closer)?;
        terms.write_term(&mut buf, internal, false)?;
        closer.close_all(&mut buf)?;
        out.write_str(&buf)?;
        Ok(())
    }

    pub fn term_to_string(&self, dag: &TermDag, term: TermId) -> Result<String, Error> {
        let mut result = String::new();
        self.print_term(&mut result, dag, term)?;
        Ok(result)
    }

    /// Print a sort the way declarations print it.
    pub fn print_sort(&self, out: &mut impl Write, dag: &TermDag, sort: SortId) -> Result<(), Error> {
        let mut dag = dag.clone();
        let internal = self.translator.to_internal_sort(&mut dag, sort);
        dag.write_sort(out, internal)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{proof::PfRule, translate::IdentityTranslator};

    fn init_logger() {
        let _ = env_logger::builder().is_test(true).try_init();
    }

    #[test]
    fn minimal_certificate() {
        init_logger();
        let mut store = ProofStore::default();
        let dag = store.term_dag_mut();
        let b = dag.bool_sort();
        let p = dag.constant("p", b);
        let not_p = dag.app("not", vec![p]);
        let f = dag.bool_lit(false);
        let ap = store.assume(p);
        let anp = store.assume(not_p);
        let root = store.step(PfRule::Contra, vec![ap, anp], f, vec![]);

        let printer = LfscPrinter::default();
        let cert = printer.certificate_to_string(&store, &[p, not_p], root).unwrap();
        assert_eq!(
            cert,
            "(declare p Bool)\n\
             (check\n\
             (% @a0 (holds p)\n\
             (% @a1 (holds (not p))\n\
             (: (holds false)\n\
             (contra @a0 @a1)))))"
        );
    }

    #[test]
    fn declarations_cover_sorts_inside_function_sorts() {
        let mut store = ProofStore::default();
        let dag = store.term_dag_mut();
        let u = dag.uninterpreted_sort("U");
        let b = dag.bool_sort();
        let p_sort = dag.arrow_sort(vec![u], b);
        let p = dag.constant("P", p_sort);
        let x = dag.var("x", u);
        let px = dag.apply(p, vec![x]);
        let forall = dag.app("forall", vec![x, px]);
        let f = dag.bool_lit(false);
        let a = store.assume(forall);
        let root = store.step(PfRule::Trust, vec![a], f, vec![]);

        let printer = LfscPrinter::new(IdentityTranslator, RuleTable::lfsc(), PrinterConfig::default());
        let cert = printer.certificate_to_string(&store, &[forall], root).unwrap();
        assert!(cert.starts_with("(declare U sort)\n(declare P (arrow U Bool))\n(check\n"));
        assert!(cert.contains("(% @a0 (holds (forall x (P x)))"));
        assert!(cert.contains("(trust @a0 false)"));
    }

    #[test]
    fn duplicate_assertions_share_a_label() {
        let mut store = ProofStore::default();
        let dag = store.term_dag_mut();
        let b = dag.bool_sort();
        let p = dag.constant("p", b);
        let q = dag.constant("q", b);
        let f = dag.bool_lit(false);
        let ap = store.assume(p);
        let aq = store.assume(q);
        let root = store.step(PfRule::Contra, vec![aq, ap], f, vec![]);

        let printer = LfscPrinter::default();
        let cert = printer.certificate_to_string(&store, &[p, p, q], root).unwrap();
        assert_eq!(cert.matches("(% ").count(), 2);
        assert!(cert.contains("(% @a1 (holds q)\n"));
        assert!(cert.contains("(contra @a1 @a0)"));
    }

    #[test]
    fn missing_assertions_are_reported() {
        let mut store = ProofStore::default();
        let dag = store.term_dag_mut();
        let b = dag.bool_sort();
        let p = dag.constant("p", b);
        let f = dag.bool_lit(false);
        let ap = store.assume(p);
        let root = store.step(PfRule::Contra, vec![ap, ap], f, vec![]);

        let printer = LfscPrinter::default();
        let mut out = String::new();
        let err = printer.print_certificate(&mut out, &store, &[], root).unwrap_err();
        assert!(matches!(err, Error::MissingAssertions(1)));
        assert!(out.is_empty());
    }

    #[test]
    fn symbols_with_one_name_and_two_sorts_are_rejected() {
        let mut store = ProofStore::default();
        let dag = store.term_dag_mut();
        let b = dag.bool_sort();
        let int = dag.int_sort();
        let x_bool = dag.constant("x", b);
        let x_int = dag.constant("x", int);
        let zero = dag.lit(0i64);
        let eq = dag.app("=", vec![x_int, zero]);
        let both = dag.app("and", vec![x_bool, eq]);
        let f = dag.bool_lit(false);
        let a = store.assume(both);
        let root = store.step(PfRule::Trust, vec![a], f, vec![]);

        let mut out = String::new();
        let err = LfscPrinter::default()
            .print_certificate(&mut out, &store, &[both], root)
            .unwrap_err();
        assert!(matches!(err, Error::AmbiguousSymbol(name) if name.as_str() == "x"));
        assert!(out.is_empty());
    }

    #[test]
    fn real_symbols_are_declared() {
        let mut store = ProofStore::default();
        let dag = store.term_dag_mut();
        let real = dag.real_sort();
        let r = dag.constant("r", real);
        let half = dag.lit(num::BigRational::new(1.into(), 2.into()));
        let lt = dag.app("<", vec![r, half]);
        let f = dag.bool_lit(false);
        let a = store.assume(lt);
        let root = store.step(PfRule::Trust, vec![a], f, vec![]);

        let cert = LfscPrinter::default()
            .certificate_to_string(&store, &[lt], root)
            .unwrap();
        assert!(cert.starts_with("(declare r Real)\n(check\n(% @a0 (holds (< r 1/2))\n"));
    }

    #[test]
    fn certificates_must_prove_false() {
        let mut store = ProofStore::default();
        let dag = store.term_dag_mut();
        let b = dag.bool_sort();
        let p = dag.constant("p", b);
        let ap = store.assume(p);
        let root = store.step(PfRule::NotNotElim, vec![ap], p, vec![]);

        let err = LfscPrinter::default()
            .certificate_to_string(&store, &[p], root)
            .unwrap_err();
        assert!(matches!(err, Error::ConclusionNotFalse(ref t) if t == "p"));
    }

    #[test]
    fn step_limit_aborts_without_output() {
        let mut store = ProofStore::default();
        let dag = store.term_dag_mut();
        let b = dag.bool_sort();
        let p = dag.constant("p", b);
        let f = dag.bool_lit(false);
        let mut cur = store.assume(p);
        for _ in 0..50 {
            cur = store.step(PfRule::NotNotElim, vec![cur], p, vec![]);
        }
        let root = store.step(PfRule::Contra, vec![cur], f, vec![]);

        let printer = LfscPrinter::default().with_config(PrinterConfig {
            step_limit: Some(20),
            ..PrinterConfig::default()
        });
        let mut out = String::new();
        let err = printer.print_certificate(&mut out, &store, &[p], root).unwrap_err();
        assert!(matches!(err, Error::StepLimitExceeded(20)));
        assert!(out.is_empty());
    }

    #[test]
    fn bare_proofs_label_free_assumptions() {
        let mut store = ProofStore::default();
        let dag = store.term_dag_mut();
        let b = dag.bool_sort();
        let p = dag.constant("p", b);
        let q = dag.constant("q", b);
        let pq = dag.app("and", vec![p, q]);
        let aq = store.assume(q);
        let ap = store.assume(p);
        let root = store.step(PfRule::AndIntro, vec![aq, ap], pq, vec![]);

        let printer = LfscPrinter::default();
        assert_eq!(printer.proof_to_string(&store, root).unwrap(), "(and_intro @a0 @a1)");
    }

    #[test]
    fn bare_proofs_bind_shared_steps() {
        let mut store = ProofStore::default();
        let dag = store.term_dag_mut();
        let b = dag.bool_sort();
        let p = dag.constant("p", b);
        let f = dag.bool_lit(false);
        let ap = store.assume(p);
        let shared = store.step(PfRule::NotNotElim, vec![ap], p, vec![]);
        let split = store.step(PfRule::Split, vec![shared], f, vec![]);
        let root = store.step(PfRule::Contra, vec![shared, split], f, vec![]);

        assert_eq!(
            LfscPrinter::default().proof_to_string(&store, root).unwrap(),
            "(plet _ _ (not_not_elim @a0) (\\ @p0\n(contra @p0 (split @p0))))"
        );
    }

    #[test]
    fn standalone_terms_and_sorts() {
        let mut td = TermDag::default();
        let u = td.uninterpreted_sort("U");
        let f_sort = td.arrow_sort(vec![u], u);
        let f = td.constant("f", f_sort);
        let a = td.constant("a", u);
        let fa = td.apply(f, vec![a]);
        let eq = td.app("=", vec![fa, fa]);

        let printer = LfscPrinter::default();
        assert_eq!(
            printer.term_to_string(&td, eq).unwrap(),
            "(@ @t0 (apply f a)\n(= @t0 @t0))"
        );
        let mut out = String::new();
        printer.print_sort(&mut out, &td, f_sort).unwrap();
        assert_eq!(out, "(arrow U U)");
    }
}

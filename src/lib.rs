//! # lfsc-cert
//! Prints proofs of unsatisfiability as certificates in LFSC, the Logical
//! Framework with Side Conditions, so that an external checker can verify them.
//!
//! Terms and proof steps live in hash-consed arenas ([`TermDag`] and
//! [`ProofStore`]). An [`LfscPrinter`] translates the terms into the LFSC
//! signature's vocabulary, binds every term and sub-proof that is used more
//! than once to a name, and prints the result without recursing, so proofs of
//! any depth can be printed.
//!
//! ```
//! use lfsc_cert::{LfscPrinter, PfRule, ProofStore};
//!
//! let mut store = ProofStore::default();
//! let dag = store.term_dag_mut();
//! let b = dag.bool_sort();
//! let p = dag.constant("p", b);
//! let not_p = dag.app("not", vec![p]);
//! let f = dag.bool_lit(false);
//! let ap = store.assume(p);
//! let anp = store.assume(not_p);
//! let root = store.step(PfRule::Contra, vec![ap, anp], f, vec![]);
//!
//! let cert = LfscPrinter::default()
//!     .certificate_to_string(&store, &[p, not_p], root)
//!     .unwrap();
//! assert!(cert.ends_with("(contra @a0 @a1)))))"));
//! ```
mod certificate;
pub mod letify;
mod printer;
mod proof;
pub mod rules;
mod termdag;
pub mod translate;
pub mod util;

pub use certificate::{LfscPrinter, PrinterConfig};
pub use letify::{compute_proof_lets, compute_term_lets, LetTable, DEFAULT_LET_THRESHOLD};
pub use proof::{PfRule, ProofId, ProofNode, ProofStore};
pub use rules::{
    EqualityRules, GenericRule, PrintItem, ResolutionRules, RuleArguments, RuleTable, TrustRule,
};
pub use symbol_table::GlobalSymbol as Symbol;
pub use termdag::{Literal, Sort, SortId, Term, TermDag, TermId};
pub use translate::{IdentityTranslator, LfscTranslator, TermTranslator, TranslationCache};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("The proof uses {0} assumption(s), but no assertions were given")]
    MissingAssertions(usize),
    #[error("A certificate must prove false, but the proof concludes {0}")]
    ConclusionNotFalse(String),
    #[error("Symbol {0} is used with more than one sort")]
    AmbiguousSymbol(Symbol),
    #[error("Printing exceeded the limit of {0} steps")]
    StepLimitExceeded(usize),
    #[error(transparent)]
    Fmt(#[from] std::fmt::Error),
}

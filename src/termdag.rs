use std::fmt::{self, Display, Formatter, Write};

use num::{BigInt, BigRational, Signed};
use smallvec::SmallVec;

use crate::{
    util::{HashSet, IndexSet},
    Symbol,
};

pub type TermId = usize;
pub type SortId = usize;

#[derive(Clone, PartialEq, Eq, Hash, Debug)]
pub enum Literal {
    Bool(bool),
    Int(BigInt),
    Rational(BigRational),
}

macro_rules! impl_from {
    ($ctor:ident($t:ty)) => {
        impl From<$t> for Literal {
            fn from(t: $t) -> Self {
                Literal::$ctor(t)
            }
        }
    };
}

impl_from!(Bool(bool));
impl_from!(Int(BigInt));
impl_from!(Rational(BigRational));

impl From<i64> for Literal {
    fn from(i: i64) -> Self {
        Literal::Int(BigInt::from(i))
    }
}

/// LFSC numerals are unsigned, so negation is written `(~ n)`.
impl Display for Literal {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Literal::Bool(b) => write!(f, "{b}"),
            Literal::Int(i) if i.is_negative() => write!(f, "(~ {})", i.abs()),
            Literal::Int(i) => write!(f, "{i}"),
            Literal::Rational(r) => {
                let numer = r.numer();
                if numer.is_negative() {
                    write!(f, "(~ {}/{})", numer.abs(), r.denom())
                } else {
                    write!(f, "{}/{}", numer, r.denom())
                }
            }
        }
    }
}

/// A sort, stored hashconsed next to the terms of a [`TermDag`].
#[derive(Clone, PartialEq, Eq, Hash, Debug)]
pub enum Sort {
    Bool,
    Int,
    Real,
    /// A sort introduced by the user. It needs a `(declare <name> sort)`.
    Uninterpreted(Symbol),
    /// The sort of a function from the argument sorts to the result sort.
    Arrow(Vec<SortId>, SortId),
}

/// Like an expression tree but with sharing and deduplication.
///
/// Terms refer to their children indirectly via opaque [`TermId`]s (internally
/// these are just `usize`s) that map into an ambient [`TermDag`].
#[derive(Clone, PartialEq, Eq, Hash, Debug)]
pub enum Term {
    Lit(Literal),
    /// A free symbol, declared in the certificate before it is used.
    Const(Symbol, SortId),
    /// A bound variable. Never declared.
    Var(Symbol, SortId),
    /// A builtin operator applied to arguments.
    App(Symbol, Vec<TermId>),
    /// An uninterpreted function (a [`Term::Const`]) applied to arguments.
    Apply(TermId, Vec<TermId>),
}

impl Term {
    /// The children of this term, in printing order.
    pub fn children(&self) -> SmallVec<[TermId; 4]> {
        match self {
            Term::Lit(_) | Term::Const(..) | Term::Var(..) => SmallVec::new(),
            Term::App(_, args) => args.iter().copied().collect(),
            Term::Apply(head, args) => std::iter::once(*head).chain(args.iter().copied()).collect(),
        }
    }

    pub fn is_leaf(&self) -> bool {
        match self {
            Term::Lit(_) | Term::Const(..) | Term::Var(..) => true,
            Term::App(_, args) => args.is_empty(),
            Term::Apply(..) => false,
        }
    }
}

/// A hashconsing arena for [`Term`]s and [`Sort`]s.
#[derive(Clone, PartialEq, Eq, Debug, Default)]
pub struct TermDag {
    /// A bidirectional map between deduplicated `Term`s and indices.
    nodes: IndexSet<Term>,
    sorts: IndexSet<Sort>,
}

impl TermDag {
    /// Returns the number of terms in this DAG.
    pub fn size(&self) -> usize {
        self.nodes.len()
    }

    /// Convert the given term to its id.
    ///
    /// Panics if the term does not already exist in this [TermDag].
    pub fn lookup(&self, node: &Term) -> TermId {
        self.nodes
            .get_index_of(node)
            .unwrap_or_else(|| panic!("term {node:?} is not in this dag"))
    }

    /// Convert the given id to the corresponding term.
    ///
    /// Panics if the id is not valid.
    pub fn get(&self, id: TermId) -> &Term {
        self.nodes
            .get_index(id)
            .unwrap_or_else(|| panic!("term id {id} is out of bounds for a dag of {} terms", self.size()))
    }

    pub fn get_sort(&self, id: SortId) -> &Sort {
        self.sorts
            .get_index(id)
            .unwrap_or_else(|| panic!("sort id {id} is out of bounds"))
    }

    pub fn contains(&self, id: TermId) -> bool {
        id < self.nodes.len()
    }

    /// Insert the term if it is not already present and return its id.
    ///
    /// Panics if any of the children (or the sort) are not already in the DAG.
    pub fn add(&mut self, node: Term) -> TermId {
        for child in node.children() {
            assert!(
                self.contains(child),
                "child {child} of {node:?} is not in this dag"
            );
        }
        if let Term::Const(_, sort) | Term::Var(_, sort) = &node {
            assert!(*sort < self.sorts.len(), "sort {sort} of {node:?} is not in this dag");
        }
        self.nodes.insert_full(node).0
    }

    fn add_sort(&mut self, sort: Sort) -> SortId {
        if let Sort::Arrow(args, ret) = &sort {
            assert!(
                args.iter().chain(std::iter::once(ret)).all(|s| *s < self.sorts.len()),
                "arrow sort refers to an unknown sort"
            );
        }
        self.sorts.insert_full(sort).0
    }

    pub fn lit(&mut self, lit: impl Into<Literal>) -> TermId {
        self.add(Term::Lit(lit.into()))
    }

    pub fn bool_lit(&mut self, b: bool) -> TermId {
        self.lit(b)
    }

    pub fn constant(&mut self, name: impl Into<Symbol>, sort: SortId) -> TermId {
        self.add(Term::Const(name.into(), sort))
    }

    pub fn var(&mut self, name: impl Into<Symbol>, sort: SortId) -> TermId {
        self.add(Term::Var(name.into(), sort))
    }

    pub fn app(&mut self, op: impl Into<Symbol>, children: Vec<TermId>) -> TermId {
        self.add(Term::App(op.into(), children))
    }

    /// Applies an uninterpreted function. With no arguments this is the
    /// function symbol itself.
    pub fn apply(&mut self, function: TermId, args: Vec<TermId>) -> TermId {
        if args.is_empty() {
            return function;
        }
        self.add(Term::Apply(function, args))
    }

    pub fn bool_sort(&mut self) -> SortId {
        self.add_sort(Sort::Bool)
    }

    pub fn int_sort(&mut self) -> SortId {
        self.add_sort(Sort::Int)
    }

    pub fn real_sort(&mut self) -> SortId {
        self.add_sort(Sort::Real)
    }

    pub fn uninterpreted_sort(&mut self, name: impl Into<Symbol>) -> SortId {
        self.add_sort(Sort::Uninterpreted(name.into()))
    }

    pub fn arrow_sort(&mut self, args: Vec<SortId>, ret: SortId) -> SortId {
        if args.is_empty() {
            return ret;
        }
        self.add_sort(Sort::Arrow(args, ret))
    }

    pub fn is_false(&self, id: TermId) -> bool {
        matches!(self.get(id), Term::Lit(Literal::Bool(false)))
    }

    /// The free symbols reachable from `roots`, in the order they are first
    /// encountered by a left-to-right traversal.
    pub fn free_symbols(&self, roots: &[TermId]) -> IndexSet<TermId> {
        let mut symbols = IndexSet::default();
        let mut seen = HashSet::default();
        let mut stack: Vec<TermId> = roots.iter().rev().copied().collect();
        while let Some(id) = stack.pop() {
            if !seen.insert(id) {
                continue;
            }
            let term = self.get(id);
            if let Term::Const(..) = term {
                symbols.insert(id);
            }
            stack.extend(term.children().into_iter().rev());
        }
        symbols
    }

    /// The uninterpreted sorts occurring in `sorts`, including inside arrows,
    /// in discovery order.
    pub fn uninterpreted_sorts(&self, sorts: impl IntoIterator<Item = SortId>) -> IndexSet<SortId> {
        let mut found = IndexSet::default();
        let mut stack = vec![];
        for root in sorts {
            stack.push(root);
            while let Some(id) = stack.pop() {
                match self.get_sort(id) {
                    Sort::Uninterpreted(_) => {
                        found.insert(id);
                    }
                    Sort::Arrow(args, ret) => {
                        stack.push(*ret);
                        stack.extend(args.iter().rev());
                    }
                    Sort::Bool | Sort::Int | Sort::Real => {}
                }
            }
        }
        found
    }

    /// Writes a sort in LFSC syntax. Function sorts are curried.
    pub fn write_sort(&self, out: &mut impl Write, sort: SortId) -> fmt::Result {
        match self.get_sort(sort) {
            Sort::Bool => out.write_str("Bool"),
            Sort::Int => out.write_str("Int"),
            Sort::Real => out.write_str("Real"),
            Sort::Uninterpreted(name) => out.write_str(name.as_str()),
            Sort::Arrow(args, ret) => {
                for arg in args {
                    out.write_str("(arrow ")?;
                    self.write_sort(out, *arg)?;
                    out.write_char(' ')?;
                }
                self.write_sort(out, *ret)?;
                for _ in args {
                    out.write_char(')')?;
                }
                Ok(())
            }
        }
    }

    pub fn sort_to_string(&self, sort: SortId) -> String {
        let mut result = String::new();
        // writing to a string cannot fail
        let _ = self.write_sort(&mut result, sort);
        result
    }

    /// Converts the given term to a string, without any let bindings.
    ///
    /// Panics if the term or any of its subterms are not in the DAG.
    pub fn to_string(&self, term: TermId) -> String {
        let mut result = String::new();
        let _ = crate::printer::write_term(&mut result, self, term, &Default::default(), false);
        result
    }
}

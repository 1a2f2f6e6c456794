//! Sharing detection for printing.
//!
//! Both passes work the same way over terms and proof steps. [`Counts::update`]
//! visits every distinct node reachable from a root once, while counting
//! every edge into it, and records nodes in post-order. [`Counts::into_lets`]
//! then keeps the nodes used at least `threshold` times. Because the visit list
//! is a post-order, a hoisted node only ever refers to hoisted nodes defined
//! before it.

use std::hash::Hash;

use smallvec::SmallVec;

use crate::{
    proof::{ProofId, ProofStore},
    termdag::{TermDag, TermId},
    util::{HEntry, HashMap},
};

/// The default minimum number of uses before a node gets a let binding.
pub const DEFAULT_LET_THRESHOLD: usize = 2;

/// Hoisted nodes in definition order, with the id each one was assigned.
#[derive(Clone, Debug)]
pub struct LetTable<K> {
    list: Vec<K>,
    ids: HashMap<K, u32>,
}

impl<K> Default for LetTable<K> {
    fn default() -> Self {
        LetTable {
            list: vec![],
            ids: HashMap::default(),
        }
    }
}

impl<K: Copy + Eq + Hash> LetTable<K> {
    pub fn get(&self, key: &K) -> Option<u32> {
        self.ids.get(key).copied()
    }

    pub fn len(&self) -> usize {
        self.list.len()
    }

    pub fn is_empty(&self) -> bool {
        self.list.is_empty()
    }

    /// Entries in definition order.
    pub fn iter(&self) -> impl Iterator<Item = (K, u32)> + '_ {
        self.list.iter().map(|k| (*k, self.ids[k]))
    }

    fn push(&mut self, key: K) -> u32 {
        let id = self.list.len() as u32;
        self.list.push(key);
        self.ids.insert(key, id);
        id
    }
}

/// Occurrence counts over the distinct nodes reachable from some roots.
#[derive(Clone, Debug)]
pub struct Counts<K> {
    /// Counted nodes in post-order.
    visit: Vec<K>,
    count: HashMap<K, usize>,
}

impl<K> Default for Counts<K> {
    fn default() -> Self {
        Counts {
            visit: vec![],
            count: HashMap::default(),
        }
    }
}

impl<K: Copy + Eq + Hash> Counts<K> {
    /// Count the edges reachable from `root`.
    ///
    /// `expand` returns the children of a node, or `None` for nodes that must
    /// never be hoisted. Those are neither counted nor descended into.
    ///
    /// A node stays on the stack while its children are processed. Seeing it
    /// again with a count of zero therefore means its children are done.
    pub fn update(&mut self, root: K, mut expand: impl FnMut(K) -> Option<SmallVec<[K; 4]>>) {
        let mut stack = vec![root];
        while let Some(&cur) = stack.last() {
            match self.count.entry(cur) {
                HEntry::Vacant(entry) => match expand(cur) {
                    Some(children) => {
                        entry.insert(0);
                        stack.extend(children.into_iter().rev());
                    }
                    None => {
                        stack.pop();
                    }
                },
                HEntry::Occupied(mut entry) => {
                    if *entry.get() == 0 {
                        self.visit.push(cur);
                    }
                    *entry.get_mut() += 1;
                    stack.pop();
                }
            }
        }
    }

    pub fn count(&self, key: &K) -> usize {
        self.count.get(key).copied().unwrap_or(0)
    }

    /// Keep the nodes used at least `threshold` times, in post-order.
    pub fn into_lets(self, threshold: usize) -> LetTable<K> {
        let mut lets = LetTable::default();
        for key in self.visit {
            if self.count[&key] >= threshold {
                lets.push(key);
            }
        }
        lets
    }
}

/// Let bindings for the compound terms shared among `roots`.
pub fn compute_term_lets(dag: &TermDag, roots: &[TermId], threshold: usize) -> LetTable<TermId> {
    let mut counts = Counts::default();
    for root in roots {
        counts.update(*root, |t| {
            let term = dag.get(t);
            // leaves are never shorter as a reference
            (!term.is_leaf()).then(|| term.children())
        });
    }
    let lets = counts.into_lets(threshold);
    log::debug!("{} of {} terms get a let binding", lets.len(), dag.size());
    lets
}

/// Let bindings for the sub-proofs shared under `root`. ASSUME steps are never
/// hoisted, since they are always referred to by their assumption label.
pub fn compute_proof_lets(store: &ProofStore, root: ProofId, threshold: usize) -> LetTable<ProofId> {
    let mut counts = Counts::default();
    counts.update(root, |p| {
        let node = store.get(p);
        (!node.is_assume()).then(|| node.children().iter().copied().collect())
    });
    let lets = counts.into_lets(threshold);
    log::debug!("{} sub-proofs get a let binding", lets.len());
    lets
}

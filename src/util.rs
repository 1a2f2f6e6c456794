use std::fmt::{self, Display, Formatter};

pub(crate) type BuildHasher = std::hash::BuildHasherDefault<rustc_hash::FxHasher>;
pub(crate) type HashMap<K, V> = hashbrown::HashMap<K, V, BuildHasher>;
pub(crate) type HashSet<K> = hashbrown::HashSet<K, BuildHasher>;
pub(crate) type HEntry<'a, A, B> = hashbrown::hash_map::Entry<'a, A, B, BuildHasher>;
pub type IndexSet<K> = indexmap::IndexSet<K, BuildHasher>;

/// Reference tokens are an LFSC identifier made of a reserved prefix and an index.
/// The `@` prefix cannot clash with user symbols, which are printed as-is.
pub const TERM_LET_PREFIX: &str = "@t";
pub const PROOF_LET_PREFIX: &str = "@p";
pub const ASSUME_PREFIX: &str = "@a";

/// Displays `@<kind><id>`, for example `@t3`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RefToken(pub &'static str, pub u32);

impl Display for RefToken {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.0, self.1)
    }
}

/// Closing delimiters for every section opened so far.
///
/// Sections are closed in exact reverse order of opening by [`Closer::close_all`].
#[derive(Debug, Default, Clone)]
pub struct Closer {
    pending: Vec<&'static str>,
}

impl Closer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record that a construct closed by `token` has been opened.
    pub fn open(&mut self, token: &'static str) {
        self.pending.push(token);
    }

    pub fn close_all(&mut self, out: &mut impl fmt::Write) -> fmt::Result {
        while let Some(token) = self.pending.pop() {
            out.write_str(token)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn closer_closes_in_reverse() {
        let mut closer = Closer::new();
        closer.open(")");
        closer.open("))");
        closer.open("]");
        let mut out = String::new();
        closer.close_all(&mut out).unwrap();
        assert_eq!(out, "])))");
        out.clear();
        closer.close_all(&mut out).unwrap();
        assert!(out.is_empty());
    }

    #[test]
    fn ref_token_display() {
        assert_eq!(RefToken(TERM_LET_PREFIX, 3).to_string(), "@t3");
        assert_eq!(RefToken(PROOF_LET_PREFIX, 0).to_string(), "@p0");
        assert_eq!(RefToken(ASSUME_PREFIX, 12).to_string(), "@a12");
    }
}

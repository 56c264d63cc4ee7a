//! The RNGLR reduction action.
//!
//! A reduction `(head, length)` tells the generalized parser to pop `length`
//! nodes off its graph-structured stack and push one for `head`. Right-nulled
//! tables record reductions of every prefix length of a nullable-suffix
//! production, so equal heads appear with several lengths; the per-state sets
//! deduplicate exact repeats.

use std::{
    collections::HashSet,
    fmt::Write,
    hash::{Hash, Hasher},
};

use cranelift_entity::{entity_impl, EntityRef, PrimaryMap};

use crate::symbols::{decimal_width, SymbolHandle, SymbolStore};

/// FNV-1a over the little-endian bytes of a word sequence. Order sensitive,
/// so `(a, b)` and `(b, a)` digest differently.
pub fn hash_uint_sequence(seq: &[u64]) -> u64 {
    const BASIS: u64 = 0xcbf29ce484222325;
    const PRIME: u64 = 0x100000001b3;

    let mut hash = BASIS;
    for &word in seq {
        for byte in word.to_le_bytes() {
            hash ^= byte as u64;
            hash = hash.wrapping_mul(PRIME);
        }
    }
    hash
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct Reduction {
    pub head: SymbolHandle,
    pub length: u64,
}

impl Reduction {
    pub fn new(head: SymbolHandle, length: u64) -> Reduction {
        Reduction { head, length }
    }

    pub fn digest(&self) -> u64 {
        hash_uint_sequence(&[self.length, self.head.index() as u64])
    }

    /// `R(<head>, <length>)`
    pub fn display_into(&self, buf: &mut dyn Write, symbols: &SymbolStore) -> std::fmt::Result {
        buf.write_str("R(")?;
        symbols.get(self.head).display_into(buf)?;
        write!(buf, ", {})", self.length)
    }

    /// Printed width in characters, without materializing the string.
    pub fn display_width(&self, symbols: &SymbolStore) -> usize {
        let fixed = "R(, )".len();
        fixed + symbols.get(self.head).display_width() + decimal_width(self.length)
    }
}

impl Hash for Reduction {
    fn hash<H: Hasher>(&self, state: &mut H) {
        state.write_u64(self.digest());
    }
}

/// The reduction actions of one parse state. Insertion refuses duplicates,
/// which is the "no duplicate actions per state" table invariant.
#[derive(Clone, Default, Debug)]
pub struct ReductionSet {
    entries: HashSet<Reduction>,
}

impl ReductionSet {
    pub fn new() -> ReductionSet {
        ReductionSet::default()
    }

    /// True when the reduction was not already present.
    pub fn insert(&mut self, reduction: Reduction) -> bool {
        self.entries.insert(reduction)
    }

    pub fn contains(&self, reduction: &Reduction) -> bool {
        self.entries.contains(reduction)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Reduction> {
        self.entries.iter()
    }
}

#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug)]
pub struct StateHandle(u32);

entity_impl! { StateHandle }

/// Per-state reduction sets, filled in during table construction.
#[derive(Default)]
pub struct ReductionTable {
    states: PrimaryMap<StateHandle, ReductionSet>,
}

impl ReductionTable {
    pub fn new() -> ReductionTable {
        ReductionTable::default()
    }

    pub fn add_state(&mut self) -> StateHandle {
        self.states.push(ReductionSet::new())
    }

    pub fn insert(&mut self, state: StateHandle, reduction: Reduction) -> bool {
        self.states[state].insert(reduction)
    }

    pub fn get(&self, state: StateHandle) -> &ReductionSet {
        &self.states[state]
    }

    pub fn len(&self) -> usize {
        self.states.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::symbols::Symbol;

    fn handle(index: usize) -> SymbolHandle {
        SymbolHandle::new(index)
    }

    #[test]
    fn equality_is_field_wise() {
        assert_eq!(Reduction::new(handle(42), 3), Reduction::new(handle(42), 3));
        assert_ne!(Reduction::new(handle(42), 3), Reduction::new(handle(42), 4));
        assert_ne!(Reduction::new(handle(42), 3), Reduction::new(handle(41), 3));
    }

    #[test]
    fn equal_reductions_hash_equal() {
        let a = Reduction::new(handle(42), 3);
        let b = Reduction::new(handle(42), 3);
        assert_eq!(a.digest(), b.digest());
        // distinct pairs should not collide, and swapping the fields changes
        // the digest because the sequence hash is order sensitive
        assert_ne!(a.digest(), Reduction::new(handle(42), 4).digest());
        assert_ne!(a.digest(), Reduction::new(handle(3), 42).digest());
    }

    #[test]
    fn sets_refuse_duplicates() {
        let mut set = ReductionSet::new();
        assert!(set.insert(Reduction::new(handle(42), 3)));
        assert!(!set.insert(Reduction::new(handle(42), 3)));
        assert_eq!(set.len(), 1);
        assert!(set.insert(Reduction::new(handle(42), 4)));
        assert_eq!(set.len(), 2);
    }

    #[test]
    fn table_tracks_states_independently() {
        let mut table = ReductionTable::new();
        let a = table.add_state();
        let b = table.add_state();
        assert!(table.insert(a, Reduction::new(handle(1), 2)));
        assert!(table.insert(b, Reduction::new(handle(1), 2)));
        assert!(!table.insert(a, Reduction::new(handle(1), 2)));
        assert_eq!(table.get(a).len(), 1);
        assert_eq!(table.get(b).len(), 1);
    }

    #[test]
    fn display_and_width_agree() {
        let mut symbols = SymbolStore::new();
        let head = symbols.intern(Symbol::identifier("expr"));
        let r = Reduction::new(head, 17);

        let mut buf = String::new();
        r.display_into(&mut buf, &symbols).unwrap();
        assert_eq!(buf, "R(#expr, 17)");
        assert_eq!(r.display_width(&symbols), buf.chars().count());
    }
}

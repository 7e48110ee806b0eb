//! Indexed pair and triple containers used throughout the reasoning
//! pipeline.
//!
//! Both stores are sets with a hash index on their leading
//! component(s); iteration follows insertion order, which keeps the
//! engine deterministic.
use std::hash::Hash;

use indexmap::{IndexMap, IndexSet};

/// A set of pairs `(a, b)` indexed by the first component.
#[derive(Clone, Debug)]
pub struct PairStore<A, B = A> {
    index: IndexMap<A, IndexSet<B>>,
    len: usize,
}

impl<A, B> PairStore<A, B>
where
    A: Hash + Eq + Clone,
    B: Hash + Eq + Clone,
{
    pub fn new() -> PairStore<A, B> {
        PairStore {
            index: IndexMap::new(),
            len: 0,
        }
    }

    /// Add a pair, returning true if it was not already present.
    pub fn add(&mut self, a: A, b: B) -> bool {
        let fresh = self.index.entry(a).or_insert_with(IndexSet::new).insert(b);
        if fresh {
            self.len += 1;
        }
        fresh
    }

    pub fn contains(&self, a: &A, b: &B) -> bool {
        self.index.get(a).map_or(false, |bs| bs.contains(b))
    }

    /// True when every pair `(a, b)` for `b` drawn from `bs` is
    /// present.
    pub fn contains_all<'a, I>(&self, a: &A, bs: I) -> bool
    where
        B: 'a,
        I: IntoIterator<Item = &'a B>,
    {
        match self.index.get(a) {
            Some(present) => bs.into_iter().all(|b| present.contains(b)),
            None => bs.into_iter().next().is_none(),
        }
    }

    /// The second components of every pair whose first component is
    /// `a`.
    pub fn pairs_with_first(&self, a: &A) -> impl Iterator<Item = &B> {
        self.index.get(a).into_iter().flat_map(|bs| bs.iter())
    }

    pub fn firsts(&self) -> impl Iterator<Item = &A> {
        self.index.keys()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&A, &B)> {
        self.index
            .iter()
            .flat_map(|(a, bs)| bs.iter().map(move |b| (a, b)))
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }
}

impl<A, B> Default for PairStore<A, B>
where
    A: Hash + Eq + Clone,
    B: Hash + Eq + Clone,
{
    fn default() -> PairStore<A, B> {
        PairStore::new()
    }
}

/// A set of triples `(a, b, c)` indexed by the first and the first
/// two components.
#[derive(Clone, Debug)]
pub struct TripletStore<A, B = A, C = A> {
    index: IndexMap<A, IndexMap<B, IndexSet<C>>>,
    len: usize,
}

impl<A, B, C> TripletStore<A, B, C>
where
    A: Hash + Eq + Clone,
    B: Hash + Eq + Clone,
    C: Hash + Eq + Clone,
{
    pub fn new() -> TripletStore<A, B, C> {
        TripletStore {
            index: IndexMap::new(),
            len: 0,
        }
    }

    /// Add a triple, returning true if it was not already present.
    pub fn add(&mut self, a: A, b: B, c: C) -> bool {
        let fresh = self
            .index
            .entry(a)
            .or_insert_with(IndexMap::new)
            .entry(b)
            .or_insert_with(IndexSet::new)
            .insert(c);
        if fresh {
            self.len += 1;
        }
        fresh
    }

    pub fn contains(&self, a: &A, b: &B, c: &C) -> bool {
        self.index
            .get(a)
            .and_then(|m| m.get(b))
            .map_or(false, |cs| cs.contains(c))
    }

    pub fn contains_all<'a, I>(&self, a: &A, b: &B, cs: I) -> bool
    where
        C: 'a,
        I: IntoIterator<Item = &'a C>,
    {
        match self.index.get(a).and_then(|m| m.get(b)) {
            Some(present) => cs.into_iter().all(|c| present.contains(c)),
            None => cs.into_iter().next().is_none(),
        }
    }

    /// The `(b, c)` suffixes of every triple whose first component is
    /// `a`.
    pub fn triples_with_first(&self, a: &A) -> impl Iterator<Item = (&B, &C)> {
        self.index
            .get(a)
            .into_iter()
            .flat_map(|m| m.iter().flat_map(|(b, cs)| cs.iter().map(move |c| (b, c))))
    }

    /// The third components of every triple beginning `(a, b)`.
    pub fn triples_with_first_two(&self, a: &A, b: &B) -> impl Iterator<Item = &C> {
        self.index
            .get(a)
            .and_then(|m| m.get(b))
            .into_iter()
            .flat_map(|cs| cs.iter())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&A, &B, &C)> {
        self.index.iter().flat_map(|(a, m)| {
            m.iter()
                .flat_map(move |(b, cs)| cs.iter().map(move |c| (a, b, c)))
        })
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }
}

impl<A, B, C> Default for TripletStore<A, B, C>
where
    A: Hash + Eq + Clone,
    B: Hash + Eq + Clone,
    C: Hash + Eq + Clone,
{
    fn default() -> TripletStore<A, B, C> {
        TripletStore::new()
    }
}

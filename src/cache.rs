//! Memoization for the recursive operations.
//!
//! One table serves every operation, keyed by an operation tag plus the
//! operand edge words. The cache is a hint: entries may vanish at any
//! time (the whole table is dropped when it grows past its cap, and
//! flushed outright by GC and restructuring), and a hit may name a dead
//! node, which the caller revives.
use crate::edge::Edge;
use fxhash::FxHashMap;

#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub enum Op { And, Xor, Ite }

#[derive(Clone, Copy, PartialEq, Eq, Hash)]
struct Key { op: Op, f: u64, g: u64, h: u64 }

pub struct OpCache {
  map: FxHashMap<Key, Edge>,
  cap: usize,
  tests: u64,
  hits: u64 }

impl OpCache {
  pub fn new(cap: usize) -> OpCache {
    OpCache { map: FxHashMap::default(), cap, tests: 0, hits: 0 }}

  pub fn probe2(&mut self, op: Op, f: Edge, g: Edge) -> Option<Edge> {
    self.probe3(op, f, g, Edge::default()) }

  pub fn probe3(&mut self, op: Op, f: Edge, g: Edge, h: Edge) -> Option<Edge> {
    self.tests += 1;
    let r = self.map.get(&Key { op, f: f.word(), g: g.word(), h: h.word() }).copied();
    if r.is_some() { self.hits += 1 }
    r }

  pub fn store2(&mut self, op: Op, f: Edge, g: Edge, r: Edge) {
    self.store3(op, f, g, Edge::default(), r) }

  pub fn store3(&mut self, op: Op, f: Edge, g: Edge, h: Edge, r: Edge) {
    if self.map.len() >= self.cap {
      debug!("cache: dropping {} entries at cap", self.map.len());
      self.map.clear() }
    self.map.insert(Key { op, f: f.word(), g: g.word(), h: h.word() }, r); }

  pub fn clear(&mut self) { self.map.clear() }

  pub fn len(&self) -> usize { self.map.len() }
  #[must_use] pub fn is_empty(&self) -> bool { self.map.is_empty() }

  /// (tests, hits) since creation.
  pub fn stats(&self) -> (u64, u64) { (self.tests, self.hits) }}


#[test] fn test_cache_roundtrip() {
  let mut c = OpCache::new(16);
  let (f, g) = (Edge::new(3), !Edge::new(4));
  assert_eq!(c.probe2(Op::And, f, g), None);
  c.store2(Op::And, f, g, Edge::new(7));
  assert_eq!(c.probe2(Op::And, f, g), Some(Edge::new(7)));
  assert_eq!(c.probe2(Op::Xor, f, g), None, "tag must distinguish ops");
  assert_eq!(c.stats(), (3, 1)); }

#[test] fn test_cache_cap() {
  let mut c = OpCache::new(2);
  for i in 0..5 { c.store2(Op::And, Edge::new(i), Edge::new(i), Edge::new(i)) }
  assert!(c.len() <= 2, "cap must bound the table"); }

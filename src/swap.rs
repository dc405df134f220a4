/// Adjacent-level swaps.
///
/// Swapping two adjacent levels in place is the one low-level mutation
/// everything dynamic builds on. Nodes on the upper level that do not
/// reach the lower level stay where they are (and simply end up one
/// level deeper when the two subtables trade places); nodes that do
/// reach it are rewritten *in their own slot* to branch on the lower
/// variable, over freshly built children that branch on the upper one.
/// A relocated slot keeps its function and its polarity, so every edge
/// held anywhere — including mid-recursion frames — survives a swap.
///
/// The four-way case split (Shannon/Davio above and below) collapses
/// into one algorithm: *split* each child by the lower level's rule,
/// *rebuild* the two new children by the upper variable's rule. Only
/// the collapse tests differ, and `swap_make` owns those.
use fxhash::FxHashMap;
use crate::edge::{Edge, ZERO};
use crate::manager::Manager;

impl Manager {

  /// Exchange levels `x` and `x+1` in place; returns the live key count.
  /// All three levels touching the exchange must be classical variants
  /// (`complex_swap` lifts that restriction). Never fails for memory:
  /// swap allocations are exempt from the soft budgets; a broken
  /// invariant is fatal.
  pub fn swap_adjacent(&mut self, x: usize) -> usize {
    let y = x + 1;
    assert!(y < self.num_vars(), "swap_adjacent at the bottom level");
    assert!(x == 0 || self.expansion[x - 1].is_classical(),
            "swap under a biconditional parent breaks its pairing");
    assert!(self.expansion[x].is_classical() && self.expansion[y].is_classical(),
            "naive swap requires classical variants");
    // swaps want a clean table: dead nodes hold no child references,
    // so they cannot be relocated or swept locally.
    if self.dead > 0 { self.garbage_collect(); }
    let (xi, yi) = (self.invperm[x], self.invperm[y]);
    if let Some(m) = &self.interact {
      if !m.test(xi, yi) { return self.exchange_metadata(x) }}

    let was_inner = self.inner;
    self.inner = true;

    // partition level x: keepers stay put, movers get rebuilt.
    let xmap = std::mem::take(&mut self.subtables[x].map);
    let davio_x = self.expansion[x].is_davio();
    let mut bottom: FxHashMap<(u64, u64), u32> = FxHashMap::default();
    let mut movers: Vec<u32> = vec![];
    for (key, slot) in xmap {
      let n = self.nodes[slot as usize];
      if self.level(n.low) == y || self.level(n.high) == y { movers.push(slot) }
      else { bottom.insert(key, slot); }}

    let mut top: FxHashMap<(u64, u64), u32> = FxHashMap::default();
    for slot in movers {
      let n = self.nodes[slot as usize];
      let (a00, a01) = self.cofactors(y, n.low);
      let (a10, a11) = self.cofactors(y, n.high);
      let newl = self.swap_make(davio_x, xi, &mut bottom, a00, a10);
      let newh = self.swap_make(davio_x, xi, &mut bottom, a01, a11);
      debug_assert!(!newl.is_inv(), "relocated node lost its regular low");
      debug_assert!(if self.expansion[y].is_shannon() { newl != newh } else { newh != ZERO },
                    "relocated node became superfluous");
      self.nodes[slot as usize].index = yi;
      self.nodes[slot as usize].low = newl;
      self.nodes[slot as usize].high = newh;
      let dup = top.insert((newl.word(), newh.word()), slot);
      debug_assert!(dup.is_none(), "swap produced duplicate nodes");
      self.del_ref(n.low);
      self.del_ref(n.high); }

    // the old lower level: live nodes are still someone's children and
    // simply move up; dead shells are swept in place.
    let ymap = std::mem::take(&mut self.subtables[y].map);
    let mut swept = 0;
    for (key, slot) in ymap {
      if self.nodes[slot as usize].rc > 0 {
        let dup = top.insert(key, slot);
        debug_assert!(dup.is_none(), "surviving node collides with a relocated one"); }
      else { self.free_slot(slot); swept += 1 }}
    debug_assert_eq!(swept, self.subtables[y].dead, "swept shells must equal the level's dead");
    self.dead -= swept;
    self.subtables[x].map = top;
    self.subtables[x].dead = 0;
    self.subtables[y].map = bottom;
    self.subtables[y].dead = 0;
    self.commit_order(x);
    // relocation freed slots; cache entries may name them.
    self.cache.clear();
    self.inner = was_inner;
    let n = self.len();
    trace!("swapped levels {} and {}: {} keys", x, y, n);
    n }

  /// one new (or shared) child on the lower side of the swap, built from
  /// a pair of grandchild components per the upper variable's rule.
  fn swap_make(&mut self, davio: bool, xi: u32, bottom: &mut FxHashMap<(u64, u64), u32>,
               p: Edge, q: Edge) -> Edge {
    if davio { if q == ZERO { return self.take(p) }}
    else if p == q { return self.take(p) }
    let inv = p.is_inv();
    let (low, high) =
      if inv { if davio { (!p, q) } else { (!p, !q) }}
      else { (p, q) };
    debug_assert!(!low.is_inv());
    if let Some(&slot) = bottom.get(&(low.word(), high.word())) {
      return self.take(Edge::new(slot as usize)).inv_if(inv) }
    let slot = self.alloc_slot(xi, low, high);
    bottom.insert((low.word(), high.word()), slot);
    Edge::new(slot as usize).inv_if(inv) }

  /// degenerate swap: the two variables share no function, so the levels
  /// exchange wholesale and no node moves.
  fn exchange_metadata(&mut self, x: usize) -> usize {
    self.subtables.swap(x, x + 1);
    self.commit_order(x);
    trace!("metadata-only swap of levels {} and {}", x, x + 1);
    self.len() }

  fn commit_order(&mut self, x: usize) {
    let y = x + 1;
    self.invperm.swap(x, y);
    self.perm[self.invperm[x] as usize] = x;
    self.perm[self.invperm[y] as usize] = y;
    self.expansion.swap(x, y); }

  /// Swap regardless of biconditional coupling: any of the three levels
  /// whose pairing the exchange would rewire is first toggled to its
  /// classical counterpart, then the naive swap runs, then the
  /// biconditional variant is restored at each displaced position where
  /// the pairing precondition still holds. (Where it does not, the
  /// level legitimately stays classical — the function is unchanged
  /// either way, and the sift driver's expansion search brings the
  /// variant back when it pays.)
  pub fn complex_swap(&mut self, x: usize) -> usize {
    let y = x + 1;
    assert!(y < self.num_vars());
    // deepest first, so each toggle sees a classical level below it.
    let bi_below = self.expansion[y].is_bicond();
    if bi_below { self.change_variant(y) }
    let bi_here = self.expansion[x].is_bicond();
    if bi_here { self.change_variant(x) }
    let bi_above = x > 0 && self.expansion[x - 1].is_bicond();
    if bi_above { self.change_variant(x - 1) }
    let r = self.swap_adjacent(x);
    // the old upper level now sits at y; the old lower at x.
    if bi_here && self.can_pair(y) { self.change_variant(y) }
    if bi_below && self.can_pair(x) { self.change_variant(x) }
    if bi_above && self.can_pair(x - 1) { self.change_variant(x - 1) }
    r }

  /// may this level take a biconditional variant right now?
  pub(crate) fn can_pair(&self, lvl: usize) -> bool {
    lvl + 1 < self.num_vars()
      && self.expansion[lvl + 1].is_classical()
      && (lvl == 0 || !self.expansion[lvl - 1].is_bicond()) }
}

include!("test-swap.rs");

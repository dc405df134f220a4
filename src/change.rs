//! Expansion-type rewrites.
//!
//! Each primitive rewrites every live node of one level so that the
//! level reads under a different decomposition rule while every edge
//! keeps its function. Function-axis changes (Shannon/Davio) only
//! touch the level itself: the new children are XOR combinations of the
//! old ones, allocated strictly below. Variant changes (classical/
//! biconditional) re-derive each node from its grandchildren through
//! the classical level below, which carries the pair variable.
//!
//! Discipline for polarity: rewrites are slot-preserving, and when a
//! rewritten node's new low comes out complemented the slot is stored
//! complement-normalized, now denoting the complement of its old
//! function. One upward sweep (`fix_flips`) then repairs every edge
//! into the flip set: plain child edges toggle their tag in place; a
//! parent whose *low* toggled renormalizes and joins the set itself.
//! Levels below the rewritten one are never touched, reference counts
//! are unaffected, and the projection and pin tables are patched from
//! the final set — which is why pinned roots survive with their
//! functions intact.
use fxhash::{FxHashMap, FxHashSet};
use crate::edge::{Edge, ZERO};
use crate::expansion::{Expansion, Kind};
use crate::manager::Manager;

impl Manager {

  /// rewrite one level to the target tag, routing through the
  /// function-axis primitive and then the variant toggle.
  pub fn change_expansion(&mut self, lvl: usize, target: Expansion) {
    let cur = self.expansion[lvl];
    if cur == target { return }
    if cur.kind() != target.kind() { self.change_kind(lvl, target.kind()) }
    if cur.is_bicond() != target.is_bicond() { self.change_variant(lvl) }}

  /// Shannon ⇔ negative Davio on one level.
  pub fn change_s_nd(&mut self, lvl: usize) {
    let k = self.expansion[lvl].kind();
    assert!(k != Kind::PDavio, "change_s_nd on a positive-Davio level");
    self.change_kind(lvl, if k == Kind::Shannon { Kind::NDavio } else { Kind::Shannon }) }

  /// negative ⇔ positive Davio on one level.
  pub fn change_nd_pd(&mut self, lvl: usize) {
    let k = self.expansion[lvl].kind();
    assert!(k != Kind::Shannon, "change_nd_pd on a Shannon level");
    self.change_kind(lvl, if k == Kind::NDavio { Kind::PDavio } else { Kind::NDavio }) }

  /// Shannon ⇔ positive Davio on one level.
  pub fn change_s_pd(&mut self, lvl: usize) {
    let k = self.expansion[lvl].kind();
    assert!(k != Kind::NDavio, "change_s_pd on a negative-Davio level");
    self.change_kind(lvl, if k == Kind::Shannon { Kind::PDavio } else { Kind::Shannon }) }

  /// biconditional ⇔ classical on one level.
  pub fn change_bi_cla(&mut self, lvl: usize) { self.change_variant(lvl) }

  // -- the function axis -----------------------------------------------

  /// Rewrite a level between Shannon and the Davio polarities via the
  /// XOR identities. With children `(l, h)` reading per the old rule,
  /// the new pair is:
  ///
  /// ```text
  ///   S  -> PD : (l,     l ⊕ h)        PD -> S  : (l,     l ⊕ h)
  ///   S  -> ND : (h,     l ⊕ h)        ND -> S  : (l ⊕ h, l    )
  ///   PD -> ND : (l ⊕ h, h    )        ND -> PD : (l ⊕ h, h    )
  /// ```
  pub(crate) fn change_kind(&mut self, lvl: usize, to: Kind) {
    let from = self.expansion[lvl].kind();
    if from == to { return }
    if self.dead > 0 { self.garbage_collect(); }
    let was_inner = self.inner;
    self.inner = true;
    let slots: Vec<u32> = self.subtables[lvl].map.values().copied().collect();
    let mut flipped: FxHashSet<u32> = FxHashSet::default();
    for slot in slots.iter().copied() {
      let n = self.nodes[slot as usize];
      let (l, h) = (n.low, n.high);
      let x = self.xor_rec(l, h).expect("allocation inside restructuring");
      let (mut nl, mut nh) = match (from, to) {
        (Kind::Shannon, Kind::PDavio) | (Kind::PDavio, Kind::Shannon) => (self.take(l), x),
        (Kind::Shannon, Kind::NDavio) => (self.take(h), x),
        (Kind::NDavio, Kind::Shannon) => (x, self.take(l)),
        (Kind::PDavio, Kind::NDavio) | (Kind::NDavio, Kind::PDavio) => (x, self.take(h)),
        _ => unreachable!() };
      if nl.is_inv() {
        flipped.insert(slot);
        nl = !nl;
        if to == Kind::Shannon { nh = !nh }}
      debug_assert!(if to == Kind::Shannon { nl != nh } else { nh != ZERO });
      self.nodes[slot as usize].low = nl;
      self.nodes[slot as usize].high = nh;
      self.del_ref(l);
      self.del_ref(h); }
    self.rekey_level(lvl, &slots);
    self.expansion[lvl] = self.expansion[lvl].with_kind(to);
    self.fix_flips(lvl, flipped);
    self.cache.clear();
    self.inner = was_inner;
    debug!("level {} now expands {}", lvl, self.expansion[lvl]); }

  // -- the variant axis ------------------------------------------------

  /// Toggle classical ⇔ biconditional on one level. The level below
  /// carries the pair variable and must currently be classical; the
  /// transform is its own inverse. Shannon nodes exchange the low
  /// grandchildren of their two children; Davio nodes replace the low
  /// child by `[y=0 -> l₀⊕h₀, y=1 -> l₁]` and keep the correction.
  pub(crate) fn change_variant(&mut self, lvl: usize) {
    let y = lvl + 1;
    assert!(y < self.num_vars(), "the bottom level has no pair to branch on");
    assert!(self.expansion[y].is_classical(), "pair level must be classical");
    if !self.expansion[lvl].is_bicond() {
      assert!(self.can_pair(lvl), "pairing preconditions not met") }
    if self.dead > 0 { self.garbage_collect(); }
    let was_inner = self.inner;
    self.inner = true;
    let shannon = self.expansion[lvl].is_shannon();
    let slots: Vec<u32> = self.subtables[lvl].map.values().copied().collect();
    let mut flipped: FxHashSet<u32> = FxHashSet::default();
    for slot in slots.iter().copied() {
      let n = self.nodes[slot as usize];
      let (l, h) = (n.low, n.high);
      let (mut nl, mut nh);
      if shannon {
        let (l0, l1) = self.points(y, l);
        let (h0, h1) = self.points(y, h);
        nl = self.rebuild_y(y, h0, l1);
        nh = self.rebuild_y(y, l0, h1); }
      else {
        let (l0, l1) = self.points(y, l);
        let (h0, h1) = self.points(y, h);
        let m = self.xor_rec(l0, h0).expect("allocation inside restructuring");
        self.del_ref(l0);
        self.del_ref(h0);
        self.del_ref(h1);
        nl = self.rebuild_y(y, m, l1);
        nh = self.take(h); }
      if nl.is_inv() {
        flipped.insert(slot);
        nl = !nl;
        if shannon { nh = !nh }}
      debug_assert!(if shannon { nl != nh } else { nh != ZERO });
      self.nodes[slot as usize].low = nl;
      self.nodes[slot as usize].high = nh;
      self.del_ref(l);
      self.del_ref(h); }
    self.rekey_level(lvl, &slots);
    self.expansion[lvl] = self.expansion[lvl].toggled_variant();
    if self.expansion[lvl].is_bicond() {
      // the branch condition now reads the pair variable.
      let (xi, yi) = (self.invperm[lvl], self.invperm[y]);
      if let Some(m) = self.interact.as_mut() { m.set(xi, yi) }}
    self.fix_flips(lvl, flipped);
    self.cache.clear();
    self.inner = was_inner;
    debug!("level {} now expands {}", lvl, self.expansion[lvl]); }

  /// owned value-cofactors of `e` at the two values of the (classical)
  /// level `y`'s variable.
  fn points(&mut self, y: usize, e: Edge) -> (Edge, Edge) {
    let (a, b) = self.cofactors(y, e);
    match self.expansion[y].kind() {
      Kind::Shannon => (self.take(a), self.take(b)),
      Kind::PDavio => {
        let s = self.xor_rec(a, b).expect("allocation inside restructuring");
        (self.take(a), s) }
      Kind::NDavio => {
        let s = self.xor_rec(a, b).expect("allocation inside restructuring");
        (s, self.take(a)) }}}

  /// canonical node at level `y` taking value `p0` at y=0 and `p1` at
  /// y=1, per `y`'s own rule. Consumes both references.
  fn rebuild_y(&mut self, y: usize, p0: Edge, p1: Edge) -> Edge {
    match self.expansion[y].kind() {
      Kind::Shannon => self.make_node_in(y, p0, p1),
      Kind::PDavio => {
        let c = self.xor_rec(p0, p1).expect("allocation inside restructuring");
        self.del_ref(p1);
        self.make_node_in(y, p0, c) }
      Kind::NDavio => {
        let c = self.xor_rec(p0, p1).expect("allocation inside restructuring");
        self.del_ref(p0);
        self.make_node_in(y, p1, c) }}}

  // -- polarity repair -------------------------------------------------

  fn rekey_level(&mut self, lvl: usize, slots: &[u32]) {
    let mut map: FxHashMap<(u64, u64), u32> = FxHashMap::default();
    map.reserve(slots.len());
    for &slot in slots {
      let dup = map.insert(self.nodes[slot as usize].key(), slot);
      assert!(dup.is_none(), "expansion rewrite collided at level {}", lvl); }
    self.subtables[lvl].map = map; }

  /// Propagate polarity flips upward: every edge into a flipped slot
  /// toggles its complement tag; a node whose low edge toggled
  /// renormalizes per its own rule and joins the set. Then the
  /// projection and pin tables are patched from the final set.
  fn fix_flips(&mut self, lvl: usize, mut flipped: FxHashSet<u32>) {
    if flipped.is_empty() { return }
    for ul in (0..lvl).rev() {
      let shannon = self.expansion[ul].is_shannon();
      let entries: Vec<u32> = self.subtables[ul].map.values().copied().collect();
      let mut touched_any = false;
      for slot in entries.iter().copied() {
        let n = self.nodes[slot as usize];
        let (mut low, mut high) = (n.low, n.high);
        let mut touched = false;
        if !low.is_const() && flipped.contains(&(low.ix() as u32)) { low = !low; touched = true }
        if !high.is_const() && flipped.contains(&(high.ix() as u32)) { high = !high; touched = true }
        if !touched { continue }
        touched_any = true;
        if low.is_inv() {
          low = !low;
          if shannon { high = !high }
          flipped.insert(slot); }
        self.nodes[slot as usize].low = low;
        self.nodes[slot as usize].high = high; }
      if touched_any { self.rekey_level(ul, &entries) }}
    let fix = |e: Edge| {
      if !e.is_const() && flipped.contains(&(e.ix() as u32)) { !e } else { e }};
    for v in self.vars.iter_mut() { *v = fix(*v) }
    for p in self.pins.iter_mut().flatten() { *p = fix(*p) }}
}

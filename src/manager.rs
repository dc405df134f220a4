//! The manager: owner of the node slab, the per-level unique tables, the
//! operation cache, the variable order and every counter and knob.
//!
//! One manager is one diagram forest. Managers are cheap to instantiate
//! and fully independent of each other; inside one manager everything is
//! single-threaded and mutated only through these APIs.
use std::fmt;
use std::time::{Duration, Instant};
use fxhash::{FxHashMap, FxHashSet};
use crate::cache::OpCache;
use crate::edge::{Edge, ONE, ZERO};
use crate::expansion::{Expansion, Kind};
use crate::node::{Node, Subtable, NO_VAR, RC_SAT};
use crate::sift::Interact;

/// Level assigned to the terminal node: strictly below every real level.
pub(crate) const CONST_LEVEL: usize = usize::MAX;

// -- errors ------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Error {
  /// a soft memory budget was exceeded at an allocation point.
  Memory,
  /// the configured time limit or termination callback fired.
  TimeoutExpired,
  /// internal sentinel: an automatic reorder interrupted the recursion
  /// and the whole operation must restart. Never escapes the wrappers.
  Reordered }

pub type Result<T> = std::result::Result<T, Error>;

impl fmt::Display for Error {
  fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
    match self {
      Error::Memory => write!(f, "memory budget exceeded"),
      Error::TimeoutExpired => write!(f, "time limit expired"),
      Error::Reordered => write!(f, "interrupted by reordering") }}}

impl std::error::Error for Error {}

// -- configuration -----------------------------------------------------

/// Tuning knobs. Plain data; construct one, tweak fields, hand it to
/// `Manager::new`. A zero on a budget field means "unlimited".
pub struct Params {
  /// fraction of levels allowed to hold Davio expansions.
  pub davio_exist_factor: f64,
  /// relative size a new expansion must reach to be accepted.
  pub choose_new_bound_factor: f64,
  /// stricter threshold for introducing a Davio expansion.
  pub choose_dav_bound_factor: f64,
  /// failure ratio that ends the expansion search of a sift sweep.
  pub choose_fail_bound_factor: f64,
  /// absolute floor on the keys reduction of an accepted expansion.
  pub choose_lower_bound: usize,
  /// multiplicative cap on intermediate growth during sifting.
  pub max_growth: f64,
  /// maximum biconditional pairing-group size. Only 2 is supported:
  /// a biconditional level always pairs with a classical one below it.
  pub group_size: usize,
  /// how many variables one sift sweep will move.
  pub sift_max_var: usize,
  /// total adjacent-swap budget for one sift sweep.
  pub sift_max_swap: usize,
  /// wall-clock limit, measured from manager creation.
  pub time_limit: Option<Duration>,
  /// soft byte budget for the slab + tables.
  pub max_memory: usize,
  /// soft cap on live nodes.
  pub max_live: usize,
  /// GC only runs once at least this many nodes are dead...
  pub min_dead: usize,
  /// ...and the dead make up this fraction of the keys.
  pub gc_frac: f64,
  /// reorder automatically when live nodes pass the trigger.
  pub auto_reorder: bool,
  /// initial live-node count that arms the first automatic reorder.
  pub reorder_trigger: usize,
  /// operation-cache entry cap.
  pub cache_cap: usize }

impl Default for Params {
  fn default() -> Params {
    Params {
      davio_exist_factor: 0.75,
      choose_new_bound_factor: 0.98,
      choose_dav_bound_factor: 0.90,
      choose_fail_bound_factor: 0.5,
      choose_lower_bound: 1,
      max_growth: 1.2,
      group_size: 2,
      sift_max_var: 1000,
      sift_max_swap: 2_000_000,
      time_limit: None,
      max_memory: 0,
      max_live: 0,
      min_dead: 64,
      gc_frac: 0.25,
      auto_reorder: false,
      reorder_trigger: 4096,
      cache_cap: 1 << 18 }}}

/// Handle to a registered root. Pinned edges are kept up to date by the
/// restructuring primitives (which may renormalize node polarities), so
/// a pin survives swaps, expansion changes and sifting with its function
/// intact. Each pin holds one reference.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct Pin(usize);

// -- the manager -------------------------------------------------------

pub struct Manager {
  pub(crate) nodes: Vec<Node>,
  free: Vec<u32>,
  pub(crate) subtables: Vec<Subtable>,
  /// variable index -> level.
  pub(crate) perm: Vec<usize>,
  /// level -> variable index.
  pub(crate) invperm: Vec<u32>,
  pub(crate) expansion: Vec<Expansion>,
  /// projection edge per variable index. Owned by the manager; callers
  /// must not deref these.
  pub(crate) vars: Vec<Edge>,
  pub(crate) pins: Vec<Option<Edge>>,
  pub(crate) cache: OpCache,
  pub(crate) interact: Option<Interact>,
  pub(crate) params: Params,
  /// count of dead (rc = 0) nodes still keyed in the subtables.
  pub(crate) dead: usize,
  /// projections referenced only by the manager's own variable table.
  isolated: usize,
  /// set when an automatic reorder interrupted an operation.
  pub(crate) reordered: bool,
  /// while set, allocation never triggers GC, reordering or the soft
  /// budgets, and the timeout checkpoints are suspended: this is the
  /// "inner" mode the restructuring primitives run under.
  pub(crate) inner: bool,
  next_reorder: usize,
  reorder_count: usize,
  deadline: Option<Instant>,
  term_cb: Option<Box<dyn Fn() -> bool>>,
  timeout_handler: Option<Box<dyn FnMut()>> }

impl Default for Manager { fn default() -> Self { Manager::new(Params::default()) }}

impl Manager {

  pub fn new(params: Params) -> Manager {
    let terminal = Node { index: NO_VAR, low: ONE, high: ONE, rc: RC_SAT };
    let deadline = params.time_limit.map(|d| Instant::now() + d);
    let next_reorder = params.reorder_trigger;
    let cache = OpCache::new(params.cache_cap);
    Manager {
      nodes: vec![terminal], free: vec![], subtables: vec![],
      perm: vec![], invperm: vec![], expansion: vec![],
      vars: vec![], pins: vec![], cache, interact: None,
      params, dead: 0, isolated: 0, reordered: false, inner: false,
      next_reorder, reorder_count: 0,
      deadline, term_cb: None, timeout_handler: None }}

  #[inline] pub fn one(&self) -> Edge { ONE }
  #[inline] pub fn zero(&self) -> Edge { ZERO }
  pub fn not(&self, f: Edge) -> Edge { !f }

  pub fn num_vars(&self) -> usize { self.invperm.len() }
  pub fn level_of(&self, var: u32) -> usize { self.perm[var as usize] }
  pub fn var_at(&self, level: usize) -> u32 { self.invperm[level] }
  pub fn expansion_at(&self, level: usize) -> Expansion { self.expansion[level] }
  pub fn var_edge(&self, var: u32) -> Edge { self.vars[var as usize] }

  /// live keys across all levels (the terminal is not counted).
  pub fn len(&self) -> usize {
    self.subtables.iter().map(|s| s.live()).sum() }
  #[must_use] pub fn is_empty(&self) -> bool { self.len() == 0 }

  /// keys including dead ones.
  pub fn keys(&self) -> usize { self.subtables.iter().map(|s| s.keys()).sum() }
  pub fn dead_count(&self) -> usize { self.dead }
  pub fn isolated_count(&self) -> usize { self.isolated }
  pub fn reorder_count(&self) -> usize { self.reorder_count }
  pub fn cache_stats(&self) -> (u64, u64) { self.cache.stats() }
  pub fn params(&self) -> &Params { &self.params }
  pub fn params_mut(&mut self) -> &mut Params { &mut self.params }

  // -- node plumbing ---------------------------------------------------

  #[inline] pub(crate) fn node(&self, slot: usize) -> &Node { &self.nodes[slot] }

  /// level of the node an edge lands on; the terminal sits below all.
  #[inline] pub(crate) fn level(&self, e: Edge) -> usize {
    if e.is_const() { CONST_LEVEL }
    else { self.perm[self.nodes[e.ix()].index as usize] }}

  /// is this slot the projection node of its variable?
  #[inline] fn is_proj(&self, slot: usize) -> bool {
    let ix = self.nodes[slot].index as usize;
    ix < self.vars.len() && self.vars[ix].ix() == slot }

  #[inline] fn rc_inc(&mut self, slot: usize) {
    let was = self.nodes[slot].rc;
    self.nodes[slot].sat_inc();
    if was == 1 && self.is_proj(slot) { self.isolated -= 1 }}

  /// returns true when the node just died.
  #[inline] fn rc_dec(&mut self, slot: usize) -> bool {
    let died = self.nodes[slot].sat_dec();
    if died {
      self.dead += 1;
      let lvl = self.perm[self.nodes[slot].index as usize];
      self.subtables[lvl].dead += 1; }
    else if self.nodes[slot].rc == 1 && self.is_proj(slot) { self.isolated += 1 }
    died }

  /// take one reference on an edge. A dead target is revived, and its
  /// subgraph with it.
  pub fn add_ref(&mut self, e: Edge) {
    if e.is_const() { return }
    let slot = e.ix();
    if self.nodes[slot].rc == 0 { self.reclaim(slot) } else { self.rc_inc(slot) }}

  /// release one reference; a node that dies releases its children
  /// transitively and lingers in its subtable until a sweep.
  pub fn del_ref(&mut self, e: Edge) {
    if e.is_const() { return }
    let slot = e.ix();
    if self.rc_dec(slot) {
      let n = self.nodes[slot];
      self.del_ref(n.low);
      self.del_ref(n.high); }}

  fn reclaim(&mut self, slot: usize) {
    self.nodes[slot].rc = 1;
    self.dead -= 1;
    let lvl = self.perm[self.nodes[slot].index as usize];
    self.subtables[lvl].dead -= 1;
    let n = self.nodes[slot];
    self.add_ref(n.low);
    self.add_ref(n.high); }

  /// add_ref and pass through; the owned-result idiom of the recursions.
  #[inline] pub(crate) fn take(&mut self, e: Edge) -> Edge { self.add_ref(e); e }

  pub(crate) fn rc_of(&self, e: Edge) -> u16 {
    if e.is_const() { RC_SAT } else { self.nodes[e.ix()].rc }}

  /// fresh slot with rc = 1; references both children. The caller keys
  /// it into the right subtable.
  pub(crate) fn alloc_slot(&mut self, index: u32, low: Edge, high: Edge) -> u32 {
    self.add_ref(low);
    self.add_ref(high);
    match self.free.pop() {
      Some(slot) => { self.nodes[slot as usize] = Node::new(index, low, high); slot }
      None => {
        let slot = self.nodes.len() as u32;
        self.nodes.push(Node::new(index, low, high));
        slot }}}

  pub(crate) fn free_slot(&mut self, slot: u32) {
    self.nodes[slot as usize].index = NO_VAR;
    self.free.push(slot); }

  // -- variables -------------------------------------------------------

  /// create a fresh input variable at the bottom of the order and return
  /// its projection edge. The single reference on a projection belongs
  /// to the manager; projections live as long as it does.
  pub fn new_var(&mut self) -> Result<Edge> {
    let ix = self.num_vars() as u32;
    let lvl = self.num_vars();
    self.subtables.push(Subtable::default());
    self.perm.push(lvl);
    self.invperm.push(ix);
    self.expansion.push(Expansion::CS);
    if let Some(m) = self.interact.as_mut() { m.grow(ix as usize + 1) }
    // projection creation must not itself trigger GC or reordering.
    let was_inner = self.inner;
    self.inner = true;
    let e = self.make_node(lvl, ZERO, ONE);
    self.inner = was_inner;
    let e = e?;
    self.vars.push(e);
    self.isolated += 1;
    Ok(e) }

  // -- the unique table ------------------------------------------------

  /// Find or create the node `(invperm[lvl], low, high)`, returning an
  /// owned (ref-of-one) regular edge to it.
  ///
  /// The caller must already have normalized: `low` regular, both
  /// children at deeper levels, and the pair not violating the level's
  /// reduction rule. `make_node` does all of that; prefer it.
  pub(crate) fn lookup_or_create(&mut self, lvl: usize, low: Edge, high: Edge) -> Result<Edge> {
    debug_assert!(!low.is_inv(), "low edge must be regular");
    debug_assert!(self.level(low) > lvl && self.level(high) > lvl, "order coherence");
    debug_assert!(if self.expansion[lvl].is_shannon() { low != high } else { high != ZERO },
                  "reduction precondition");
    let key = (low.word(), high.word());
    if let Some(&slot) = self.subtables[lvl].map.get(&key) {
      let slot = slot as usize;
      if self.nodes[slot].rc == 0 { self.reclaim(slot) } else { self.rc_inc(slot) }
      return Ok(Edge::new(slot)) }
    if !self.inner {
      if self.dead >= self.params.min_dead
         && self.dead as f64 >= self.params.gc_frac * self.keys() as f64 {
        self.garbage_collect(); }
      if self.params.auto_reorder && self.len() >= self.next_reorder {
        self.auto_reorder()?;
        return Err(Error::Reordered) }
      if self.params.max_live > 0 && self.len() >= self.params.max_live {
        return Err(Error::Memory) }
      if self.params.max_memory > 0 && self.mem_estimate() > self.params.max_memory {
        return Err(Error::Memory) }}
    let slot = self.alloc_slot(self.invperm[lvl], low, high);
    self.subtables[lvl].map.insert(key, slot);
    Ok(Edge::new(slot as usize)) }

  /// Build the canonical edge for cofactor pair `(t, e)` at a level,
  /// applying the reduction rule and pushing any complement on `t` up
  /// onto the returned edge. Consumes the caller's references on both
  /// arguments and returns an owned edge.
  pub(crate) fn make_node(&mut self, lvl: usize, t: Edge, e: Edge) -> Result<Edge> {
    let shannon = self.expansion[lvl].is_shannon();
    if shannon { if t == e { self.del_ref(e); return Ok(t) }}
    else if e == ZERO { return Ok(t) }
    let inv = t.is_inv();
    let (low, high) =
      if inv { if shannon { (!t, !e) } else { (!t, e) }}
      else { (t, e) };
    let r = self.lookup_or_create(lvl, low, high);
    self.del_ref(t);
    self.del_ref(e);
    r.map(|x| x.inv_if(inv)) }

  /// as `make_node`, but inside restructuring, where the soft budgets
  /// are suspended and failure is impossible.
  pub(crate) fn make_node_in(&mut self, lvl: usize, t: Edge, e: Edge) -> Edge {
    debug_assert!(self.inner);
    self.make_node(lvl, t, e).expect("allocation inside restructuring") }

  /// The per-level cofactor pair of `f` with respect to level `lvl`,
  /// pushing `f`'s complement down (onto both parts under Shannon, onto
  /// the low part only under Davio). `f` must live at `lvl` or deeper.
  pub(crate) fn cofactors(&self, lvl: usize, f: Edge) -> (Edge, Edge) {
    let shannon = self.expansion[lvl].is_shannon();
    if self.level(f) == lvl {
      let n = self.nodes[f.ix()];
      if f.is_inv() {
        if shannon { (!n.low, !n.high) } else { (!n.low, n.high) }}
      else { (n.low, n.high) }}
    else if shannon { (f, f) }
    else { (f, ZERO) }}

  /// The node behind an edge as `(variable, low, high)` with the edge's
  /// complement pushed down, or None for the terminal.
  pub fn read_node(&self, e: Edge) -> Option<(u32, Edge, Edge)> {
    if e.is_const() { return None }
    let n = self.nodes[e.ix()];
    let lvl = self.perm[n.index as usize];
    let (l, h) = self.cofactors(lvl, e);
    Some((n.index, l, h)) }

  // -- garbage collection ----------------------------------------------

  /// sweep every dead node out of the tables and into the free list.
  /// Dead nodes hold no child references, so sweeping is a plain
  /// reclaim. The cache goes with them: entries may name swept slots.
  pub fn garbage_collect(&mut self) -> usize {
    if self.dead == 0 { return 0 }
    let mut swept = 0;
    for lvl in 0..self.subtables.len() {
      if self.subtables[lvl].dead == 0 { continue }
      let map = std::mem::take(&mut self.subtables[lvl].map);
      let mut kept = FxHashMap::default();
      kept.reserve(map.len());
      for (key, slot) in map {
        if self.nodes[slot as usize].rc > 0 { kept.insert(key, slot); }
        else {
          self.nodes[slot as usize].index = NO_VAR;
          self.free.push(slot);
          swept += 1 }}
      self.subtables[lvl].map = kept;
      self.subtables[lvl].dead = 0; }
    self.dead = 0;
    self.cache.clear();
    debug!("gc: swept {} dead nodes, {} live remain", swept, self.len());
    swept }

  fn mem_estimate(&self) -> usize {
    self.nodes.capacity() * std::mem::size_of::<Node>()
      + self.keys() * 3 * std::mem::size_of::<u64>()
      + self.cache.len() * 5 * std::mem::size_of::<u64>() }

  // -- limits ----------------------------------------------------------

  pub fn set_time_limit(&mut self, d: Duration) { self.deadline = Some(Instant::now() + d) }
  pub fn clear_time_limit(&mut self) { self.deadline = None }
  pub fn set_termination_callback(&mut self, cb: Box<dyn Fn() -> bool>) { self.term_cb = Some(cb) }
  pub fn set_timeout_handler(&mut self, h: Box<dyn FnMut()>) { self.timeout_handler = Some(h) }

  /// the cancellation checkpoint consulted at every cache probe.
  /// Suspended in inner mode; the sift driver polls `hard_limits`
  /// between primitives instead.
  #[inline] pub(crate) fn check_limits(&self) -> Result<()> {
    if self.inner { Ok(()) } else { self.hard_limits() }}

  pub(crate) fn hard_limits(&self) -> Result<()> {
    if let Some(d) = self.deadline {
      if Instant::now() >= d { return Err(Error::TimeoutExpired) }}
    if let Some(cb) = &self.term_cb {
      if cb() { return Err(Error::TimeoutExpired) }}
    Ok(()) }

  pub(crate) fn note_reorder(&mut self) {
    self.reorder_count += 1;
    self.reordered = true;
    self.next_reorder = std::cmp::max(2 * self.len(), self.params.reorder_trigger); }

  /// invoked on the return path of the top-level wrappers.
  pub(crate) fn report_timeout(&mut self) {
    if let Some(h) = self.timeout_handler.as_mut() { h() }}

  // -- pins ------------------------------------------------------------

  /// register a root that restructuring keeps valid. Holds one ref.
  pub fn pin(&mut self, e: Edge) -> Pin {
    self.add_ref(e);
    for (i, p) in self.pins.iter_mut().enumerate() {
      if p.is_none() { *p = Some(e); return Pin(i) }}
    self.pins.push(Some(e));
    Pin(self.pins.len() - 1) }

  /// current edge of a pinned root (restructuring may have renormalized
  /// the stored polarity; the function is unchanged).
  pub fn pinned(&self, p: Pin) -> Edge { self.pins[p.0].expect("stale pin") }

  pub fn unpin(&mut self, p: Pin) {
    let e = self.pins[p.0].take().expect("stale pin");
    self.del_ref(e); }

  // -- evaluation and introspection ------------------------------------

  /// branch condition of a level under an assignment: the level's own
  /// variable, or `x ⇔ y` with its pair for biconditional levels.
  fn condition(&self, lvl: usize, env: &[bool]) -> bool {
    let x = env[self.invperm[lvl] as usize];
    if self.expansion[lvl].is_bicond() {
      let y = env[self.invperm[lvl + 1] as usize];
      x == y }
    else { x }}

  /// definitional evaluation of an edge under a full assignment
  /// (indexed by variable index), honoring every decomposition type.
  pub fn eval(&self, e: Edge, env: &[bool]) -> bool {
    if e.is_const() { return !e.is_inv() }
    let n = self.nodes[e.ix()];
    let lvl = self.perm[n.index as usize];
    let c = self.condition(lvl, env);
    let v = match self.expansion[lvl].kind() {
      Kind::Shannon => if c { self.eval(n.high, env) } else { self.eval(n.low, env) },
      Kind::PDavio => self.eval(n.low, env) ^ (c && self.eval(n.high, env)),
      Kind::NDavio => self.eval(n.low, env) ^ (!c && self.eval(n.high, env)) };
    v ^ e.is_inv() }

  /// Truth table over all the manager's variables: entry `m` is the
  /// value under the assignment where variable `i` gets bit `i` of `m`.
  /// Mostly for tests; `1`s and `0`s read better than bools there.
  pub fn tt(&self, e: Edge) -> Vec<u8> {
    let nv = self.num_vars();
    assert!(nv <= 16, "refusing to build a 2^{} entry truth table", nv);
    let mut env = vec![false; nv];
    (0..1usize << nv).map(|m| {
      for (i, b) in env.iter_mut().enumerate() { *b = m & (1 << i) != 0 }
      self.eval(e, &env) as u8 }).collect() }

  /// count of distinct interior nodes reachable from an edge.
  pub fn node_count(&self, e: Edge) -> usize {
    let mut seen = FxHashSet::default();
    self.walk_slots(e, &mut seen);
    seen.len() }

  fn walk_slots(&self, e: Edge, seen: &mut FxHashSet<usize>) {
    if e.is_const() || !seen.insert(e.ix()) { return }
    let n = self.nodes[e.ix()];
    self.walk_slots(n.low, seen);
    self.walk_slots(n.high, seen); }

  /// sorted variable support of an edge. Biconditional levels add their
  /// pair variable: the branch condition reads it.
  pub fn support(&self, e: Edge) -> Vec<u32> {
    let mut seen = FxHashSet::default();
    self.walk_slots(e, &mut seen);
    let mut sup = FxHashSet::default();
    for slot in seen {
      let ix = self.nodes[slot].index;
      let lvl = self.perm[ix as usize];
      sup.insert(ix);
      if self.expansion[lvl].is_bicond() { sup.insert(self.invperm[lvl + 1]); }}
    let mut v: Vec<u32> = sup.into_iter().collect();
    v.sort_unstable();
    v }

  // -- the invariant auditor -------------------------------------------

  /// panic (with the failure) unless every manager invariant holds.
  /// `held` lists the edges the caller owns references on, so the ref
  /// accounting can be checked exactly.
  pub fn validate(&self, held: &[Edge]) {
    if let Err(e) = self.is_valid(held) {
      panic!("manager invariant broken: {}", e) }}

  pub fn is_valid(&self, held: &[Edge]) -> std::result::Result<(), String> {
    let nv = self.num_vars();
    // the order maps must be inverse bijections.
    for v in 0..nv {
      if self.invperm[self.perm[v]] != v as u32 {
        return Err(format!("perm/invperm disagree at var {}", v)) }}
    // expected reference counts: children of live nodes, projections,
    // pins, and whatever the caller says it holds.
    let mut expect: FxHashMap<usize, usize> = FxHashMap::default();
    let mut dead_seen = 0;
    for lvl in 0..nv {
      let dec = self.expansion[lvl];
      if dec.is_bicond() {
        if lvl + 1 >= nv { return Err(format!("biconditional bottom level {}", lvl)) }
        if self.expansion[lvl + 1].is_bicond() {
          return Err(format!("adjacent biconditional levels {} and {}", lvl, lvl + 1)) }}
      let mut tbl_dead = 0;
      for (&(lo, hi), &slot) in &self.subtables[lvl].map {
        let n = self.nodes[slot as usize];
        if n.index != self.invperm[lvl] {
          return Err(format!("node {} keyed at level {} but branches on {}", slot, lvl, n.index)) }
        if (n.low.word(), n.high.word()) != (lo, hi) {
          return Err(format!("stale key for node {} at level {}", slot, lvl)) }
        if n.low.is_inv() {
          return Err(format!("complemented low edge on node {}", slot)) }
        if dec.is_shannon() && n.low == n.high {
          return Err(format!("superfluous Shannon node {}", slot)) }
        if dec.is_davio() && n.high == ZERO {
          return Err(format!("trivial Davio correction on node {}", slot)) }
        for c in [n.low, n.high] {
          if self.level(c) <= lvl {
            return Err(format!("upward edge from node {} at level {}", slot, lvl)) }}
        if n.rc == 0 { tbl_dead += 1; dead_seen += 1 }
        else {
          for c in [n.low, n.high] {
            if !c.is_const() { *expect.entry(c.ix()).or_insert(0) += 1 }}}}
      if tbl_dead != self.subtables[lvl].dead {
        return Err(format!("level {} dead count {} != {}", lvl, self.subtables[lvl].dead, tbl_dead)) }}
    if dead_seen != self.dead {
      return Err(format!("global dead count {} != {}", self.dead, dead_seen)) }
    for &v in &self.vars {
      *expect.entry(v.ix()).or_insert(0) += 1 }
    for p in self.pins.iter().flatten() {
      *expect.entry(p.ix()).or_insert(0) += 1 }
    for h in held {
      if !h.is_const() { *expect.entry(h.ix()).or_insert(0) += 1 }}
    let mut isolated = 0;
    for lvl in 0..nv {
      for &slot in self.subtables[lvl].map.values() {
        let n = self.nodes[slot as usize];
        let want = expect.get(&(slot as usize)).copied().unwrap_or(0);
        if n.rc != RC_SAT && n.rc as usize != want {
          return Err(format!("node {} rc {} but {} references exist", slot, n.rc, want)) }
        if n.rc == 1 && self.is_proj(slot as usize) { isolated += 1 }}}
    if isolated != self.isolated {
      return Err(format!("isolated count {} != {}", self.isolated, isolated)) }
    Ok(()) }
}

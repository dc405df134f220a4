//! The sifting driver.
//!
//! Classic sifting slides one variable through the order, one adjacent
//! swap at a time, and settles it where the table was smallest. This
//! driver additionally auditions expansion types at every position it
//! visits (ITE-sifting / OET), so a sweep optimizes the (order, type)
//! pair under the `choose_*` acceptance bounds.
//!
//! Two flavors share the machinery: the public `sift` uses the complex
//! swap and the full expansion search; the automatic reorder triggered
//! mid-operation is swap-only and skips biconditional neighborhoods,
//! because the recursion frames it interrupts hold raw edges that only
//! the naive swap is guaranteed to preserve.
use fxhash::FxHashSet;
use crate::expansion::Expansion;
use crate::manager::{Manager, Result};

/// Variable interaction matrix: `test(i, j)` is false only when no
/// function in the forest depends on both variables, in which case
/// swapping their adjacent levels degenerates to a metadata exchange.
/// Co-support is invariant under reordering, so one build per sweep
/// suffices; introducing a biconditional pairing adds its edge.
#[derive(Default)]
pub(crate) struct Interact { pairs: FxHashSet<(u32, u32)> }

impl Interact {
  pub fn set(&mut self, i: u32, j: u32) {
    if i != j { self.pairs.insert((i.min(j), i.max(j))); }}
  pub fn test(&self, i: u32, j: u32) -> bool {
    self.pairs.contains(&(i.min(j), i.max(j))) }
  /// nothing to do: the pair set is not sized to the variable count.
  pub fn grow(&mut self, _n: usize) {}}

impl Manager {

  /// mark every co-support pair of every live node. Children sit at
  /// deeper levels, so one bottom-up pass has supports ready when their
  /// parents need them.
  pub(crate) fn build_interact(&mut self) {
    let n = self.num_vars();
    let mut m = Interact::default();
    let mut sup: fxhash::FxHashMap<u32, Vec<u32>> = fxhash::FxHashMap::default();
    for lvl in (0..n).rev() {
      let slots: Vec<u32> = self.subtables[lvl].map.values().copied().collect();
      for slot in slots {
        let node = *self.node(slot as usize);
        let mut s: FxHashSet<u32> = FxHashSet::default();
        s.insert(node.index);
        if self.expansion[lvl].is_bicond() { s.insert(self.invperm[lvl + 1]); }
        for c in [node.low, node.high] {
          if c.is_const() { continue }
          let cix = c.ix() as u32;
          if let Some(cs) = sup.get(&cix) { s.extend(cs.iter().copied()) }}
        let v: Vec<u32> = s.into_iter().collect();
        for (a, &i) in v.iter().enumerate() {
          for &j in &v[a + 1..] { m.set(i, j) }}
        sup.insert(slot, v); }}
    self.interact = Some(m); }

  /// One full OET sweep over `[lower, upper]`. Variables are visited in
  /// decreasing subtable-size order. Returns whether the table shrank.
  /// On timeout or termination the manager is rolled back to the
  /// `(perm, expansion)` snapshot taken on entry.
  pub fn sift(&mut self, lower: usize, upper: usize) -> Result<bool> {
    let n = self.num_vars();
    if n < 2 { return Ok(false) }
    let upper = upper.min(n - 1);
    assert!(lower <= upper, "bad sift range");
    if self.dead > 0 { self.garbage_collect(); }
    let snapshot = (self.perm.clone(), self.expansion.clone());
    self.build_interact();
    let was_inner = self.inner;
    self.inner = true;
    let before = self.len();
    let res = self.sift_sweep(lower, upper, true, false);
    match &res {
      Ok(_) => debug!("sift: {} -> {} live nodes", before, self.len()),
      Err(e) => {
        warn!("sift aborted ({}); rolling back", e);
        self.rollback(&snapshot); }}
    self.inner = was_inner;
    self.interact = None;
    res }

  /// swap-only reorder for use mid-operation; the caller then reports
  /// `Reordered` so the interrupted operation restarts.
  pub(crate) fn auto_reorder(&mut self) -> Result<()> {
    info!("automatic reorder at {} live nodes", self.len());
    if self.dead > 0 { self.garbage_collect(); }
    self.build_interact();
    let was_inner = self.inner;
    self.inner = true;
    let r = self.sift_sweep(0, self.num_vars() - 1, false, true);
    self.inner = was_inner;
    self.interact = None;
    self.note_reorder();
    r.map(|_| ()) }

  fn sift_sweep(&mut self, lower: usize, upper: usize,
                with_expn: bool, naive: bool) -> Result<bool> {
    let mut order: Vec<(usize, u32)> =
      (lower..=upper).map(|lvl| (self.subtables[lvl].live(), self.invperm[lvl])).collect();
    order.sort_by(|a, b| b.0.cmp(&a.0));
    order.truncate(self.params.sift_max_var);
    let start_keys = self.len();
    let mut swaps = 0usize;
    let mut tries = 0usize;
    let mut fails = 0usize;
    let mut try_expn = with_expn;
    for (_, var) in order {
      self.hard_limits()?;
      if swaps >= self.params.sift_max_swap {
        debug!("sift: swap budget exhausted");
        break }
      self.sift_var(var, lower, upper, try_expn, naive, &mut swaps, &mut tries, &mut fails)?;
      if try_expn && tries >= 8
         && fails as f64 > self.params.choose_fail_bound_factor * tries as f64 {
        debug!("sift: expansion search ends after {}/{} failed auditions", fails, tries);
        try_expn = false }}
    Ok(self.len() < start_keys) }

  /// slide one variable to both boundaries (shorter side first), then
  /// settle on the best `(position, expansion)` seen.
  #[allow(clippy::too_many_arguments)]
  fn sift_var(&mut self, var: u32, lower: usize, upper: usize, expn: bool, naive: bool,
              swaps: &mut usize, tries: &mut usize, fails: &mut usize) -> Result<()> {
    let start = self.perm[var as usize];
    if start < lower || start > upper { return Ok(()) }
    let initial = self.len();
    let limit = (self.params.max_growth * initial as f64) as usize;
    let mut best = (start, self.expansion[start], initial);
    let down_first = upper - start <= start - lower;
    for leg in 0..2 {
      let down = down_first == (leg == 0);
      let bound = if down { upper } else { lower };
      self.sift_leg(var, down, bound, limit, expn, naive,
                    &mut best, swaps, tries, fails)?; }
    self.settle(var, best, naive, swaps);
    Ok(()) }

  #[allow(clippy::too_many_arguments)]
  fn sift_leg(&mut self, var: u32, down: bool, bound: usize, limit: usize,
              expn: bool, naive: bool, best: &mut (usize, Expansion, usize),
              swaps: &mut usize, tries: &mut usize, fails: &mut usize) -> Result<()> {
    loop {
      let pos = self.perm[var as usize];
      if (down && pos >= bound) || (!down && pos <= bound) { break }
      if *swaps >= self.params.sift_max_swap { break }
      self.hard_limits()?;
      let x = if down { pos } else { pos - 1 };
      if naive {
        if !self.naive_ok(x) { break }
        self.swap_adjacent(x); }
      else { self.complex_swap(x); }
      *swaps += 1;
      let here = self.perm[var as usize];
      if expn { self.try_expansions(here, tries, fails) }
      let sz = self.len();
      if sz + self.params.choose_lower_bound <= best.2 {
        *best = (here, self.expansion[here], sz) }
      if sz > limit { break }}
    Ok(()) }

  /// bring the variable back to the best position and re-establish the
  /// expansion recorded there.
  fn settle(&mut self, var: u32, best: (usize, Expansion, usize), naive: bool,
            swaps: &mut usize) {
    loop {
      let pos = self.perm[var as usize];
      if pos == best.0 { break }
      let x = if pos < best.0 { pos } else { pos - 1 };
      if naive { self.swap_adjacent(x); } else { self.complex_swap(x); }
      *swaps += 1; }
    // swap-only sweeps never touch expansions: in-flight frames hold
    // raw edges that a rewrite could renormalize away.
    if naive { return }
    if self.expansion[best.0] != best.1 {
      let target =
        if best.1.is_bicond() && !self.can_pair(best.0) { best.1.toggled_variant() }
        else { best.1 };
      self.change_expansion(best.0, target); }}

  /// audition the admissible expansion tags at a level and keep the
  /// winner under the acceptance bounds.
  fn try_expansions(&mut self, lvl: usize, tries: &mut usize, fails: &mut usize) {
    let start_tag = self.expansion[lvl];
    let mut best = (start_tag, self.len());
    let davio_ok = self.davio_room(lvl);
    for tag in crate::expansion::ALL {
      if tag == start_tag { continue }
      if tag.is_bicond() && !(self.expansion[lvl].is_bicond() || self.can_pair(lvl)) { continue }
      if tag.is_davio() && !davio_ok { continue }
      self.change_expansion(lvl, tag);
      let k = self.len();
      let bound = if tag.is_davio() && !best.0.is_davio() {
        self.params.choose_dav_bound_factor }
        else { self.params.choose_new_bound_factor };
      if (k as f64) <= bound * best.1 as f64
         && k + self.params.choose_lower_bound <= best.1 {
        best = (tag, k) }}
    *tries += 1;
    if best.0 == start_tag { *fails += 1 }
    if self.expansion[lvl] != best.0 { self.change_expansion(lvl, best.0) }}

  /// cap on how many levels may hold Davio expansions at once.
  fn davio_room(&self, lvl: usize) -> bool {
    if self.expansion[lvl].is_davio() { return true }
    let davio = self.expansion.iter().filter(|e| e.is_davio()).count();
    (davio as f64) < self.params.davio_exist_factor * self.num_vars() as f64 }

  /// may the naive swap run at `x` without touching any pairing?
  fn naive_ok(&self, x: usize) -> bool {
    (x == 0 || self.expansion[x - 1].is_classical())
      && self.expansion[x].is_classical()
      && self.expansion[x + 1].is_classical() }

  /// return to a `(perm, expansion)` snapshot: classicalize, reorder by
  /// adjacent swaps, then re-apply the recorded tags top-down.
  fn rollback(&mut self, snap: &(Vec<usize>, Vec<Expansion>)) {
    let (perm0, exp0) = snap;
    let n = self.num_vars();
    for lvl in 0..n {
      if self.expansion[lvl].is_bicond() { self.change_variant(lvl) }}
    let mut invperm0 = vec![0u32; n];
    for (ix, &lvl) in perm0.iter().enumerate() { invperm0[lvl] = ix as u32 }
    for target in 0..n {
      let want = invperm0[target];
      while self.perm[want as usize] > target {
        self.swap_adjacent(self.perm[want as usize] - 1); }}
    for lvl in 0..n {
      if self.expansion[lvl] != exp0[lvl] { self.change_expansion(lvl, exp0[lvl]) }}
    debug_assert_eq!(&self.perm, perm0);
    debug_assert_eq!(&self.expansion, exp0); }
}

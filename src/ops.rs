//! The Boolean operations: AND, XOR, ITE and their thin wrappers.
//!
//! Every recursive function here returns an *owned* edge: the caller
//! receives exactly one reference and must release it (or hand it on).
//! Error paths release whatever the frame already acquired, so a
//! mid-operation failure never leaks intermediates. The public wrappers
//! own the restart loop for the `Reordered` sentinel.
use crate::cache::Op;
use crate::edge::{Edge, ONE, ZERO};
use crate::manager::{Error, Manager, Result};

/// release the listed edges and bail when a subcall fails.
macro_rules! guard {
  ($m:ident, $e:expr $(, $held:expr)*) => {
    match $e {
      Ok(x) => x,
      Err(err) => { $($m.del_ref($held);)* return Err(err) }}}}

impl Manager {

  // -- public wrappers -------------------------------------------------

  pub fn and(&mut self, f: Edge, g: Edge) -> Result<Edge> {
    self.toplevel(|m| m.and_rec(f, g)) }

  pub fn or(&mut self, f: Edge, g: Edge) -> Result<Edge> {
    self.toplevel(|m| Ok(!m.and_rec(!f, !g)?)) }

  pub fn xor(&mut self, f: Edge, g: Edge) -> Result<Edge> {
    self.toplevel(|m| m.xor_rec(f, g)) }

  pub fn ite(&mut self, f: Edge, g: Edge, h: Edge) -> Result<Edge> {
    self.toplevel(|m| m.ite_rec(f, g, h)) }

  /// Restart loop: an automatic reorder mid-recursion unwinds the whole
  /// operation (every frame has already dropped its intermediates) and
  /// we simply run it again against the new order. Callers outside the
  /// engine see at most a retry, never a partial result.
  fn toplevel<F>(&mut self, f: F) -> Result<Edge>
  where F: Fn(&mut Manager) -> Result<Edge> {
    loop {
      match f(self) {
        Err(Error::Reordered) => {
          self.reordered = false;
          debug!("restarting operation after automatic reorder");
          continue }
        Err(Error::TimeoutExpired) => {
          self.report_timeout();
          return Err(Error::TimeoutExpired) }
        r => return r }}}

  // -- AND -------------------------------------------------------------

  pub(crate) fn and_rec(&mut self, f: Edge, g: Edge) -> Result<Edge> {
    // terminal and algebraic short circuits
    if f == g { return Ok(self.take(f)) }
    if f == !g || f == ZERO || g == ZERO { return Ok(ZERO) }
    if f == ONE { return Ok(self.take(g)) }
    if g == ONE { return Ok(self.take(f)) }
    // a consistent operand order doubles the cache's reach
    let (f, g) = if f.word() <= g.word() { (f, g) } else { (g, f) };
    self.check_limits()?;
    let cacheable = self.rc_of(f) != 1 && self.rc_of(g) != 1;
    if cacheable {
      if let Some(r) = self.cache.probe2(Op::And, f, g) {
        return Ok(self.take(r)) }}
    let lvl = std::cmp::min(self.level(f), self.level(g));
    let (fl, fh) = self.cofactors(lvl, f);
    let (gl, gh) = self.cofactors(lvl, g);
    let r = if self.expansion[lvl].is_shannon() {
      let t = self.and_rec(fl, gl)?;
      let e = guard!(self, self.and_rec(fh, gh), t);
      self.make_node(lvl, t, e)? }
    else {
      // f·g = (fl·gl) ⊕ ((fl⊕fh)·(gl⊕gh)), either Davio polarity
      let t = self.and_rec(fl, gl)?;
      let fx = guard!(self, self.xor_rec(fl, fh), t);
      let gx = guard!(self, self.xor_rec(gl, gh), t, fx);
      let m = guard!(self, self.and_rec(fx, gx), t, fx, gx);
      self.del_ref(fx);
      self.del_ref(gx);
      let e = guard!(self, self.xor_rec(t, m), t, m);
      self.del_ref(m);
      self.make_node(lvl, t, e)? };
    if cacheable { self.cache.store2(Op::And, f, g, r) }
    Ok(r) }

  // -- XOR -------------------------------------------------------------

  pub(crate) fn xor_rec(&mut self, f: Edge, g: Edge) -> Result<Edge> {
    if f == g { return Ok(ZERO) }
    if f == !g { return Ok(ONE) }
    if f == ZERO { return Ok(self.take(g)) }
    if g == ZERO { return Ok(self.take(f)) }
    if f == ONE { return Ok(!self.take(g)) }
    if g == ONE { return Ok(!self.take(f)) }
    // strip the complements: ¬a ⊕ b = ¬(a ⊕ b)
    let inv = f.is_inv() != g.is_inv();
    let (f, g) = (f.raw(), g.raw());
    let (f, g) = if f.word() <= g.word() { (f, g) } else { (g, f) };
    self.check_limits()?;
    let cacheable = self.rc_of(f) != 1 && self.rc_of(g) != 1;
    if cacheable {
      if let Some(r) = self.cache.probe2(Op::Xor, f, g) {
        return Ok(self.take(r).inv_if(inv)) }}
    let lvl = std::cmp::min(self.level(f), self.level(g));
    let (fl, fh) = self.cofactors(lvl, f);
    let (gl, gh) = self.cofactors(lvl, g);
    // componentwise under Shannon and Davio alike
    let t = self.xor_rec(fl, gl)?;
    let e = guard!(self, self.xor_rec(fh, gh), t);
    let r = self.make_node(lvl, t, e)?;
    if cacheable { self.cache.store2(Op::Xor, f, g, r) }
    Ok(r.inv_if(inv)) }

  // -- ITE -------------------------------------------------------------

  pub(crate) fn ite_rec(&mut self, f: Edge, g: Edge, h: Edge) -> Result<Edge> {
    // the standard-triples preamble: anything with two related
    // arguments collapses to a constant, AND or XOR.
    if f == ONE { return Ok(self.take(g)) }
    if f == ZERO { return Ok(self.take(h)) }
    if g == h { return Ok(self.take(g)) }
    if g == !h { return Ok(!self.xor_rec(f, g)?) }
    if f == g { return Ok(!self.and_rec(!f, !h)?) }   // ite(f,f,h) = f ∨ h
    if f == !g { return self.and_rec(!f, h) }          // ite(f,¬f,h) = ¬f ∧ h
    if f == h { return self.and_rec(f, g) }            // ite(f,g,f) = f ∧ g
    if f == !h { return Ok(!self.and_rec(f, !g)?) }    // ite(f,g,¬f) = ¬f ∨ g
    if g == ONE { return Ok(!self.and_rec(!f, !h)?) }
    if g == ZERO { return self.and_rec(!f, h) }
    if h == ONE { return Ok(!self.and_rec(f, !g)?) }
    if h == ZERO { return self.and_rec(f, g) }
    // canonicalize: make f, then g, regular; remember the output bit.
    let (mut f, mut g, mut h) = (f, g, h);
    if f.is_inv() { std::mem::swap(&mut g, &mut h); f = !f }
    let inv = g.is_inv();
    if inv { g = !g; h = !h }
    self.check_limits()?;
    let cacheable = self.rc_of(f) != 1 && self.rc_of(g) != 1 && self.rc_of(h) != 1;
    if cacheable {
      if let Some(r) = self.cache.probe3(Op::Ite, f, g, h) {
        return Ok(self.take(r).inv_if(inv)) }}
    let r = self.ite_build(f, g, h)?;
    if cacheable { self.cache.store3(Op::Ite, f, g, h, r) }
    Ok(r.inv_if(inv)) }

  fn ite_build(&mut self, f: Edge, g: Edge, h: Edge) -> Result<Edge> {
    use crate::expansion::Kind;
    let v = std::cmp::min(self.level(g), self.level(h));
    let lf = self.level(f);
    // fast path: f is (the complement of) a projection sitting above
    // both branches of a classical level, so the result is one fresh
    // node over g and h.
    if lf < v && self.expansion[lf].is_classical() {
      let fvar = self.node(f.ix()).index;
      let proj = self.var_edge(fvar);
      if proj.ix() == f.ix() {
        let (lo, hi) = if f == proj { (h, g) } else { (g, h) };
        return match self.expansion[lf].kind() {
          Kind::Shannon => {
            let (lo, hi) = (self.take(lo), self.take(hi));
            self.make_node(lf, lo, hi) }
          Kind::PDavio => {
            let m = self.xor_rec(lo, hi)?;
            let lo = self.take(lo);
            self.make_node(lf, lo, m) }
          Kind::NDavio => {
            let m = self.xor_rec(lo, hi)?;
            let hi = self.take(hi);
            self.make_node(lf, hi, m) }}}}
    let top = std::cmp::min(lf, v);
    if self.expansion[top].is_shannon() {
      let (fl, fh) = self.cofactors(top, f);
      let (gl, gh) = self.cofactors(top, g);
      let (hl, hh) = self.cofactors(top, h);
      let t = self.ite_rec(fl, gl, hl)?;
      let e = guard!(self, self.ite_rec(fh, gh, hh), t);
      self.make_node(top, t, e) }
    else {
      // Davio on top: fall back to ite(f,g,h) = (f·g) ⊕ (¬f·h)
      let t1 = self.and_rec(f, g)?;
      let t2 = guard!(self, self.and_rec(!f, h), t1);
      let r = guard!(self, self.xor_rec(t1, t2), t1, t2);
      self.del_ref(t1);
      self.del_ref(t2);
      Ok(r) }}
}

include!("test-ops.rs");

// swap / change / sift test suite (included from swap.rs)

#[cfg(test)] use crate::edge::ONE;
#[cfg(test)] use crate::expansion::Expansion;
#[cfg(test)] use crate::manager::Error;
#[cfg(test)] use std::cell::Cell;
#[cfg(test)] use std::rc::Rc;

#[cfg(test)]
fn setup2(n: usize) -> (Manager, Vec<Edge>) {
  let mut m = Manager::default();
  let vs = (0..n).map(|_| m.new_var().unwrap()).collect();
  (m, vs) }

#[cfg(test)]
fn order_of(m: &Manager) -> Vec<u32> {
  (0..m.num_vars()).map(|l| m.var_at(l)).collect() }

#[cfg(test)]
fn tags_of(m: &Manager) -> Vec<Expansion> {
  (0..m.num_vars()).map(|l| m.expansion_at(l)).collect() }

#[test] fn test_swap_ite() {
  let (mut m, vs) = setup2(3);
  let f = m.ite(vs[0], vs[1], vs[2]).unwrap();
  let want = m.tt(f);
  assert_eq!(m.node_count(f), 3);
  m.swap_adjacent(0);
  assert_eq!(order_of(&m), vec![1, 0, 2]);
  assert_eq!(m.tt(f), want, "a swap must preserve every held edge");
  assert_eq!(m.node_count(f), 4, "b on top needs two a-nodes");
  m.validate(&[f]);
  m.swap_adjacent(0);
  assert_eq!(order_of(&m), vec![0, 1, 2]);
  assert_eq!(m.node_count(f), 3);
  assert_eq!(m.tt(f), want);
  m.validate(&[f]); }

#[test] fn test_swap_idempotent() {
  let (mut m, vs) = setup2(4);
  let ab = m.and(vs[0], vs[1]).unwrap();
  let cd = m.xor(vs[2], vs[3]).unwrap();
  let f = m.or(ab, cd).unwrap();
  let g = m.ite(vs[1], vs[2], !vs[0]).unwrap();
  let (tf, tg) = (m.tt(f), m.tt(g));
  let size = m.len();
  let order = order_of(&m);
  for x in [0, 1, 2] {
    m.swap_adjacent(x);
    m.swap_adjacent(x);
    assert_eq!(order_of(&m), order, "double swap must restore the order");
    assert_eq!(m.len(), size, "double swap must restore the size");
    assert_eq!(m.tt(f), tf);
    assert_eq!(m.tt(g), tg);
    m.validate(&[ab, cd, f, g]); }}

#[test] fn test_swap_uncoupled() {
  // b sits between a and c but shares no function with a: the swap
  // moves no nodes.
  let (mut m, vs) = setup2(3);
  let f = m.and(vs[0], vs[2]).unwrap();
  let want = m.tt(f);
  let size = m.len();
  m.swap_adjacent(0);
  assert_eq!(order_of(&m), vec![1, 0, 2]);
  assert_eq!(m.len(), size);
  assert_eq!(m.tt(f), want);
  m.validate(&[f]); }

/// a ⊕ b re-expressed with positive Davio on top keeps its function,
/// with the b node as constant term and a unit correction.
#[test] fn test_change_xor_to_pdavio() {
  let (mut m, vs) = setup2(2);
  let f = m.xor(vs[0], vs[1]).unwrap();
  let want = m.tt(f);
  m.change_expansion(0, Expansion::CPD);
  assert_eq!(m.expansion_at(0), Expansion::CPD);
  assert_eq!(m.tt(f), want);
  let (var, lo, hi) = m.read_node(f).unwrap();
  assert_eq!(var, 0);
  assert_eq!(lo, m.var_edge(1), "constant term is b itself");
  assert_eq!(hi, ONE, "a ⊕ b corrects by 1");
  m.validate(&[f]); }

#[test] fn test_change_all_tags_preserve() {
  let (mut m, vs) = setup2(3);
  let x = m.xor(vs[1], vs[2]).unwrap();
  let f = m.ite(vs[0], x, vs[2]).unwrap();
  let p = m.pin(f);
  m.del_ref(x);
  m.del_ref(f);
  let want = m.tt(m.pinned(p));
  for lvl in [0usize, 1] {
    for tag in crate::expansion::ALL {
      m.change_expansion(lvl, tag);
      assert_eq!(m.expansion_at(lvl), tag);
      assert_eq!(m.tt(m.pinned(p)), want, "tag {} at level {}", tag, lvl);
      m.validate(&[]); }
    m.change_expansion(lvl, Expansion::CS); }
  // projections must have survived every rewrite too
  assert_eq!(m.tt(m.var_edge(0)), vec![0, 1, 0, 1, 0, 1, 0, 1]);
  m.unpin(p);
  m.validate(&[]); }

/// negative-Davio transitions renormalize node polarities; the upward
/// sweep must repair parents, projections and pins.
#[test] fn test_change_flip_repair() {
  let (mut m, vs) = setup2(2);
  let f = m.xor(vs[0], vs[1]).unwrap();
  let p = m.pin(f);
  m.del_ref(f);
  let want = m.tt(m.pinned(p));
  m.change_expansion(1, Expansion::CND);
  assert_eq!(m.tt(m.pinned(p)), want);
  assert_eq!(m.tt(m.var_edge(1)), vec![0, 0, 1, 1], "patched projection still reads b");
  m.validate(&[]);
  m.change_expansion(0, Expansion::CND);
  assert_eq!(m.tt(m.pinned(p)), want);
  m.validate(&[]);
  m.change_expansion(0, Expansion::CS);
  m.change_expansion(1, Expansion::CS);
  assert_eq!(m.tt(m.pinned(p)), want);
  m.unpin(p);
  m.validate(&[]); }

#[test] fn test_bicond_variants() {
  let (mut m, vs) = setup2(3);
  let f = m.ite(vs[0], vs[1], vs[2]).unwrap();
  let x0 = m.xor(vs[0], vs[1]).unwrap();
  let g = m.xor(x0, vs[2]).unwrap();
  let (pf, pg) = (m.pin(f), m.pin(g));
  m.del_ref(f);
  m.del_ref(x0);
  m.del_ref(g);
  let (wf, wg) = (m.tt(m.pinned(pf)), m.tt(m.pinned(pg)));
  for tag in [Expansion::BS, Expansion::BND, Expansion::BPD] {
    m.change_expansion(0, tag);
    assert_eq!(m.expansion_at(0), tag);
    assert_eq!(m.tt(m.pinned(pf)), wf, "{} broke ite", tag);
    assert_eq!(m.tt(m.pinned(pg)), wg, "{} broke parity", tag);
    m.validate(&[]); }
  m.change_expansion(0, Expansion::CS);
  // pairing one level down: level 1 pairs with the bottom level
  m.change_expansion(1, Expansion::BS);
  assert_eq!(m.tt(m.pinned(pf)), wf);
  assert_eq!(m.tt(m.pinned(pg)), wg);
  m.validate(&[]);
  m.change_expansion(1, Expansion::CS);
  m.unpin(pf);
  m.unpin(pg);
  m.validate(&[]); }

#[test] fn test_complex_swap_with_bicond() {
  let (mut m, vs) = setup2(3);
  let f = m.ite(vs[0], vs[1], vs[2]).unwrap();
  let p = m.pin(f);
  m.del_ref(f);
  let want = m.tt(m.pinned(p));
  m.change_expansion(0, Expansion::BS);
  m.complex_swap(0);
  assert_eq!(order_of(&m), vec![1, 0, 2]);
  assert_eq!(m.tt(m.pinned(p)), want);
  m.validate(&[]);
  // swapping below a biconditional level must also survive
  m.complex_swap(0);
  m.change_expansion(1, Expansion::CS);
  m.change_expansion(0, Expansion::BND);
  m.complex_swap(1);
  assert_eq!(m.tt(m.pinned(p)), want);
  m.validate(&[]);
  m.unpin(p);
  m.validate(&[]); }

/// badly interleaved conjunction pairs: sifting must shrink the table
/// and keep the function.
#[test] fn test_sift_reduces() {
  let (mut m, vs) = setup2(6);
  let t1 = m.and(vs[0], vs[3]).unwrap();
  let t2 = m.and(vs[1], vs[4]).unwrap();
  let t3 = m.and(vs[2], vs[5]).unwrap();
  let o1 = m.or(t1, t2).unwrap();
  let f = m.or(o1, t3).unwrap();
  let p = m.pin(f);
  for e in [t1, t2, t3, o1, f] { m.del_ref(e) }
  let want = m.tt(m.pinned(p));
  let before = m.len();
  let changed = m.sift(0, 5).unwrap();
  assert!(changed, "the interleaved order must improve");
  assert!(m.len() < before, "{} -> {}", before, m.len());
  assert_eq!(m.tt(m.pinned(p)), want);
  m.validate(&[]);
  m.unpin(p);
  m.validate(&[]); }

/// parity over 8 inputs, sifted with the expansion search on. The
/// truth table must survive whatever (order, type) mix the sweep
/// settles on.
#[test] fn test_sift_parity() {
  let (mut m, vs) = setup2(8);
  let mut f = m.take(vs[0]);
  for v in &vs[1..] {
    let nf = m.xor(f, *v).unwrap();
    m.del_ref(f);
    f = nf; }
  let p = m.pin(f);
  m.del_ref(f);
  let want = m.tt(m.pinned(p));
  let before = m.len();
  m.sift(0, 7).unwrap();
  assert!(m.len() <= before);
  assert_eq!(m.tt(m.pinned(p)), want);
  m.validate(&[]);
  m.unpin(p);
  m.validate(&[]); }

/// a termination callback firing mid-sweep must roll the manager back
/// to the configuration observed on entry.
#[test] fn test_sift_rollback() {
  let (mut m, vs) = setup2(4);
  let t1 = m.and(vs[0], vs[2]).unwrap();
  let t2 = m.and(vs[1], vs[3]).unwrap();
  let f = m.or(t1, t2).unwrap();
  let p = m.pin(f);
  for e in [t1, t2, f] { m.del_ref(e) }
  let want = m.tt(m.pinned(p));
  let order = order_of(&m);
  let tags = tags_of(&m);
  let calls = Rc::new(Cell::new(0usize));
  let c = calls.clone();
  m.set_termination_callback(Box::new(move || {
    c.set(c.get() + 1);
    c.get() > 2 }));
  assert_eq!(m.sift(0, 3).unwrap_err(), Error::TimeoutExpired);
  assert_eq!(order_of(&m), order, "rollback must restore the order");
  assert_eq!(tags_of(&m), tags, "rollback must restore the expansions");
  assert_eq!(m.tt(m.pinned(p)), want);
  m.unpin(p);
  m.validate(&[]); }

extern crate bkfdd;
use bkfdd::Manager;

fn main() { divan::main() }

/// parity over 12 inputs, all-Shannon.
#[divan::bench]
fn parity12() -> usize {
  let mut m = Manager::default();
  let vs: Vec<_> = (0..12).map(|_| m.new_var().unwrap()).collect();
  let mut f = vs[0];
  m.add_ref(f);
  for v in &vs[1..] {
    let nf = m.xor(f, *v).unwrap();
    m.del_ref(f);
    f = nf; }
  m.len() }

/// interleaved conjunction pairs, then one OET sift sweep.
#[divan::bench]
fn sift_pairs() -> usize {
  let mut m = Manager::default();
  let vs: Vec<_> = (0..10).map(|_| m.new_var().unwrap()).collect();
  let mut f = m.zero();
  m.add_ref(f);
  for i in 0..5 {
    let t = m.and(vs[i], vs[i + 5]).unwrap();
    let nf = m.or(f, t).unwrap();
    m.del_ref(t);
    m.del_ref(f);
    f = nf; }
  let p = m.pin(f);
  m.del_ref(f);
  m.sift(0, 9).unwrap();
  let _ = m.pinned(p);
  m.len() }

/// a pile of ITEs with shared subfunctions, exercising the cache.
#[divan::bench]
fn ite_mix() -> usize {
  let mut m = Manager::default();
  let vs: Vec<_> = (0..8).map(|_| m.new_var().unwrap()).collect();
  let mut acc = m.one();
  m.add_ref(acc);
  for w in vs.windows(3) {
    let t = m.ite(w[0], w[1], w[2]).unwrap();
    let na = m.and(acc, t).unwrap();
    m.del_ref(t);
    m.del_ref(acc);
    acc = na; }
  m.node_count(acc) }

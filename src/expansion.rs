//! Per-level decomposition types.
//!
//! Each level of the diagram independently decomposes with respect to a
//! branch condition: the level's own variable for the classical variants,
//! or `x ⇔ y` (with `y` the next variable in the order) for the
//! biconditional variants. Combined with the three function-axis rules
//! (Shannon, negative Davio, positive Davio) this gives six tags.
use std::fmt;

/// The function-axis rule alone, shared by both variants.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Hash)]
pub enum Kind { Shannon, NDavio, PDavio }

#[derive(Clone, Copy, PartialEq, Eq, Debug, Hash)]
pub enum Expansion { CS, CND, CPD, BS, BND, BPD }
use self::Expansion::*;

/// All six tags, classical variants first.
pub const ALL: [Expansion; 6] = [CS, CND, CPD, BS, BND, BPD];

impl Expansion {
  #[inline] pub fn is_shannon(self) -> bool { matches!(self, CS | BS) }
  #[inline] pub fn is_ndavio(self) -> bool { matches!(self, CND | BND) }
  #[inline] pub fn is_pdavio(self) -> bool { matches!(self, CPD | BPD) }
  #[inline] pub fn is_davio(self) -> bool { !self.is_shannon() }
  #[inline] pub fn is_bicond(self) -> bool { matches!(self, BS | BND | BPD) }
  #[inline] pub fn is_classical(self) -> bool { !self.is_bicond() }

  pub fn kind(self) -> Kind {
    match self {
      CS | BS => Kind::Shannon,
      CND | BND => Kind::NDavio,
      CPD | BPD => Kind::PDavio }}

  /// same variant, different function-axis rule.
  pub fn with_kind(self, k: Kind) -> Expansion {
    match (self.is_bicond(), k) {
      (false, Kind::Shannon) => CS, (false, Kind::NDavio) => CND, (false, Kind::PDavio) => CPD,
      (true, Kind::Shannon) => BS, (true, Kind::NDavio) => BND, (true, Kind::PDavio) => BPD }}

  /// same function-axis rule, other variant.
  pub fn toggled_variant(self) -> Expansion {
    match self {
      CS => BS, CND => BND, CPD => BPD,
      BS => CS, BND => CND, BPD => CPD }}}

impl fmt::Display for Expansion {
  fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
    write!(f, "{}", match self {
      CS => "CS", CND => "CND", CPD => "CPD",
      BS => "BS", BND => "BND", BPD => "BPD" })}}


#[test] fn test_axes() {
  for x in ALL {
    assert_eq!(x.is_davio(), !x.is_shannon());
    assert_eq!(x.is_bicond(), !x.is_classical());
    assert_eq!(x.toggled_variant().toggled_variant(), x);
    assert_eq!(x.toggled_variant().kind(), x.kind());
    assert_eq!(x.with_kind(x.kind()), x); }
  assert!(CS.is_shannon() && BS.is_shannon());
  assert!(CND.is_ndavio() && BPD.is_pdavio());
  assert!(BS.is_bicond() && CPD.is_classical()); }

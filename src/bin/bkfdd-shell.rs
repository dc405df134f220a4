use std::io;
use std::io::Write;
use std::collections::HashMap;

extern crate bkfdd;
use bkfdd::{Edge, Expansion, Manager};

// forth-like REPL for the BKFDD manager (helper routines)

fn readln() -> String {
  let mut buf = String::new();
  print!("> ");
  io::stdout().flush().expect("couldn't flush stdout.");
  io::stdin().read_line(&mut buf).expect("failed to read line.");
  buf }

fn pop<T>(data: &mut Vec<T>) -> T {
  data.pop().expect("underflow") }

fn pop2<T>(data: &mut Vec<T>) -> (T, T) {
  let y = pop(data); let x = pop(data); (x, y) }

fn pop3<T>(data: &mut Vec<T>) -> (T, T, T) {
  let (y, z) = pop2(data); let x = pop(data); (x, y, z) }

fn parse_tag(word: &str) -> Option<Expansion> {
  match word {
    "CS" => Some(Expansion::CS), "CND" => Some(Expansion::CND), "CPD" => Some(Expansion::CPD),
    "BS" => Some(Expansion::BS), "BND" => Some(Expansion::BND), "BPD" => Some(Expansion::BPD),
    _ => None }}

// forth-like REPL (main loop)

fn repl(m: &mut Manager) {
  let mut scope: HashMap<String, Edge> = HashMap::new();
  println!("hint: no variables defined. type '8 vars' to define 8 of them.");
  let mut data: Vec<Edge> = Vec::new();
  'main: loop {
    print!("[ ");
    for x in &data { print!("{} ", *x); }
    println!("] keys:{} order:{:?}", m.len(),
             (0..m.num_vars()).map(|l| m.var_at(l)).collect::<Vec<_>>());
    let line = readln();
    for word in line.split_whitespace() {
      match word {
        "vars" => {
          let x = pop(&mut data);
          for _ in m.num_vars()..x.ix() { m.new_var().expect("new_var"); }}
        "i" | "I" => data.push(m.one()),
        "o" | "O" => data.push(m.zero()),
        "~" | "not" => { let x = pop(&mut data); data.push(m.not(x)) }
        "and" => { let (x, y) = pop2(&mut data); data.push(m.and(x, y).expect("and")) }
        "xor" => { let (x, y) = pop2(&mut data); data.push(m.xor(x, y).expect("xor")) }
        "or" => { let (x, y) = pop2(&mut data); data.push(m.or(x, y).expect("or")) }
        "ite" => { let (x, y, z) = pop3(&mut data); data.push(m.ite(x, y, z).expect("ite")) }
        "tt" => { let x = pop(&mut data); println!("{:?}", m.tt(x)); }
        "cnt" => { let x = pop(&mut data); println!("{}", m.node_count(x)); }
        "swp" => { let x = pop(&mut data); m.swap_adjacent(x.ix()); }
        "sift" => { m.sift(0, m.num_vars().saturating_sub(1)).expect("sift"); }
        "gc" => { println!("swept {}", m.garbage_collect()); }
        "chk" => { m.validate(&data); println!("ok"); }

        // generic forth commands
        "q" => break 'main,
        "." => { let e = pop(&mut data); println!("{}", e); }
        "drop" => { let _ = pop(&mut data); }
        "dup" => { let x = pop(&mut data); data.push(x); data.push(x); }
        "swap" => { let p = data.len() - 1; if p > 0 { data.swap(p - 1, p) }}
        "reset" => data = Vec::new(),
        _ => {
          // expansion tag: apply to the level on top of the stack
          if let Some(tag) = parse_tag(word) {
            let x = pop(&mut data);
            m.change_expansion(x.ix(), tag); }
          // parse number (used as a count or level):
          else if let Ok(w) = usize::from_str_radix(word, 10) { data.push(Edge::new(w)); }
          // parse input variable
          else if let Some(s) = word.strip_prefix('$') {
            if let Ok(n) = u32::from_str_radix(s, 10) { data.push(m.var_edge(n)); }
            else { println!("bad var: {}", word) }}
          // define:
          else if let Some(name) = word.strip_prefix(':') {
            let val = pop(&mut data);
            scope.insert(name.to_string(), val); }
          // retrieve:
          else if let Some(&val) = scope.get(word) { data.push(val); }
          else { println!("{}?", word) }}}}}}

fn main() {
  use simplelog::{Config, LevelFilter, TermLogger};
  TermLogger::init(LevelFilter::Info, Config::default()).expect("logger");
  let mut m = Manager::default();
  repl(&mut m) }

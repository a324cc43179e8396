//! Hash-consed, canonically-ordered, immutable terms for propositional
//! logic, regular expressions over it, and the LDLf/LTLf formula algebras.
//!
//! Every term is a small `Rc` handle into a table owned by a
//! [`TermManager`]. Two handles produced by the same manager are
//! `Rc::ptr_eq` if and only if they are structurally equal — that is the
//! hash-consing invariant the rest of the crate relies on: term equality is
//! pointer equality, and a `HashMap` keyed on a term is as cheap as one
//! keyed on an interned string (see `lasso::Spur` for the same trick
//! applied only to symbol names).

use crate::error::{contract, Result};
use lasso::{Key, Rodeo, Spur};
use std::cell::RefCell;
use std::cmp::Ordering;
use std::collections::HashMap;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::rc::Rc;

/// An interned atom name. Two `Symbol`s from the same manager compare equal
/// iff they were interned from equal strings.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct Symbol(Spur);

impl fmt::Debug for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Symbol({:?})", self.0)
    }
}

macro_rules! term_handle {
    ($name:ident, $node:ident, $kind:ident) => {
        #[derive(Clone)]
        pub struct $name(Rc<$node>);

        struct $node {
            kind: $kind,
            hash: u64,
        }

        impl $name {
            fn new(kind: $kind, hash: u64) -> Self {
                $name(Rc::new($node { kind, hash }))
            }

            pub fn kind(&self) -> &$kind {
                &self.0.kind
            }

            fn structural_hash(&self) -> u64 {
                self.0.hash
            }
        }

        impl PartialEq for $name {
            fn eq(&self, other: &Self) -> bool {
                Rc::ptr_eq(&self.0, &other.0)
            }
        }
        impl Eq for $name {}

        impl Hash for $name {
            fn hash<H: Hasher>(&self, state: &mut H) {
                (Rc::as_ptr(&self.0) as usize).hash(state)
            }
        }

        impl fmt::Debug for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, stringify!($name))?;
                write!(f, "({:?})", self.0.kind)
            }
        }
    };
}

/// `make` combiner: a fixed 64-bit mix of a tag and the children's cached
/// hashes (FNV-1a style, good enough for a hash-cons table, not for
/// cryptography).
fn mix(tag: u64, children: impl IntoIterator<Item = u64>) -> u64 {
    let mut h = tag.wrapping_mul(0x9E3779B97F4A7C15).wrapping_add(0x1000_0001);
    for c in children {
        h ^= c;
        h = h.wrapping_mul(0x100000001B3);
    }
    h
}

// ---------------------------------------------------------------------
// Propositional formulas
// ---------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum AtomKind {
    Sym(Symbol),
    Quoted(Ldlf),
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum PropKind {
    True,
    False,
    Atom(AtomKind),
    Not(Prop),
    And(Vec<Prop>),
    Or(Vec<Prop>),
}

term_handle!(Prop, PropNode, PropKind);

fn rank(k: &PropKind) -> u8 {
    match k {
        PropKind::True => 0,
        PropKind::False => 1,
        PropKind::Atom(_) => 2,
        PropKind::Not(_) => 3,
        PropKind::And(_) => 4,
        PropKind::Or(_) => 5,
    }
}

fn prop_cmp(a: &Prop, b: &Prop) -> Ordering {
    let (ka, kb) = (a.kind(), b.kind());
    let (ra, rb) = (rank(ka), rank(kb));
    if ra != rb {
        return ra.cmp(&rb);
    }
    match (ka, kb) {
        (PropKind::True, PropKind::True) | (PropKind::False, PropKind::False) => Ordering::Equal,
        (PropKind::Atom(x), PropKind::Atom(y)) => atom_cmp(x, y),
        (PropKind::Not(x), PropKind::Not(y)) => prop_cmp(x, y),
        (PropKind::And(xs), PropKind::And(ys)) | (PropKind::Or(xs), PropKind::Or(ys)) => {
            lexicographic(xs, ys, prop_cmp)
        }
        _ => unreachable!("rank partitions PropKind by variant"),
    }
}

fn atom_cmp(a: &AtomKind, b: &AtomKind) -> Ordering {
    match (a, b) {
        (AtomKind::Sym(x), AtomKind::Sym(y)) => x.0.into_usize().cmp(&y.0.into_usize()),
        (AtomKind::Quoted(x), AtomKind::Quoted(y)) => ldlf_cmp(x, y),
        (AtomKind::Sym(_), AtomKind::Quoted(_)) => Ordering::Less,
        (AtomKind::Quoted(_), AtomKind::Sym(_)) => Ordering::Greater,
    }
}

fn lexicographic<T>(xs: &[T], ys: &[T], cmp: impl Fn(&T, &T) -> Ordering) -> Ordering {
    xs.len().cmp(&ys.len()).then_with(|| {
        for (x, y) in xs.iter().zip(ys.iter()) {
            let c = cmp(x, y);
            if c != Ordering::Equal {
                return c;
            }
        }
        Ordering::Equal
    })
}

// ---------------------------------------------------------------------
// Regular expressions (over propositional formulas, with tests)
// ---------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum RegexKind {
    PropRegex(Prop),
    Test(Ldlf),
    Seq(Vec<Regex>),
    Union(Vec<Regex>),
    Star(Regex),
}

term_handle!(Regex, RegexNode, RegexKind);

fn regex_rank(k: &RegexKind) -> u8 {
    match k {
        RegexKind::PropRegex(_) => 0,
        RegexKind::Test(_) => 1,
        RegexKind::Seq(_) => 2,
        RegexKind::Union(_) => 3,
        RegexKind::Star(_) => 4,
    }
}

fn regex_cmp(a: &Regex, b: &Regex) -> Ordering {
    let (ka, kb) = (a.kind(), b.kind());
    let (ra, rb) = (regex_rank(ka), regex_rank(kb));
    if ra != rb {
        return ra.cmp(&rb);
    }
    match (ka, kb) {
        (RegexKind::PropRegex(x), RegexKind::PropRegex(y)) => prop_cmp(x, y),
        (RegexKind::Test(x), RegexKind::Test(y)) => ldlf_cmp(x, y),
        (RegexKind::Seq(xs), RegexKind::Seq(ys)) | (RegexKind::Union(xs), RegexKind::Union(ys)) => {
            lexicographic(xs, ys, regex_cmp)
        }
        (RegexKind::Star(x), RegexKind::Star(y)) => regex_cmp(x, y),
        _ => unreachable!("rank partitions RegexKind by variant"),
    }
}

// ---------------------------------------------------------------------
// LDLf
// ---------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum LdlfKind {
    True,
    False,
    And(Vec<Ldlf>),
    Or(Vec<Ldlf>),
    Not(Ldlf),
    Diamond(Regex, Ldlf),
    Box(Regex, Ldlf),
    /// `F(psi)`: "falsum-wrapped" placeholder used only inside `delta` (see
    /// [`crate::delta`]); stripped by `ExpandPlaceholders` before a DFA is
    /// ever built from it.
    F(Ldlf),
    /// `T(psi)`: the dual of `F`, also delta-only.
    T(Ldlf),
    /// `Q(psi)`: signals a Kleene-star continuation point to the general
    /// star procedure ([`crate::star`]); never produced or consumed
    /// outside that path.
    Q(Ldlf),
}

term_handle!(Ldlf, LdlfNode, LdlfKind);

fn ldlf_rank(k: &LdlfKind) -> u8 {
    match k {
        LdlfKind::True => 0,
        LdlfKind::False => 1,
        LdlfKind::And(_) => 2,
        LdlfKind::Or(_) => 3,
        LdlfKind::Not(_) => 4,
        LdlfKind::Diamond(_, _) => 5,
        LdlfKind::Box(_, _) => 6,
        LdlfKind::F(_) => 7,
        LdlfKind::T(_) => 8,
        LdlfKind::Q(_) => 9,
    }
}

fn ldlf_cmp(a: &Ldlf, b: &Ldlf) -> Ordering {
    let (ka, kb) = (a.kind(), b.kind());
    let (ra, rb) = (ldlf_rank(ka), ldlf_rank(kb));
    if ra != rb {
        return ra.cmp(&rb);
    }
    match (ka, kb) {
        (LdlfKind::True, LdlfKind::True) | (LdlfKind::False, LdlfKind::False) => Ordering::Equal,
        (LdlfKind::And(xs), LdlfKind::And(ys)) | (LdlfKind::Or(xs), LdlfKind::Or(ys)) => {
            lexicographic(xs, ys, ldlf_cmp)
        }
        (LdlfKind::Not(x), LdlfKind::Not(y))
        | (LdlfKind::F(x), LdlfKind::F(y))
        | (LdlfKind::T(x), LdlfKind::T(y))
        | (LdlfKind::Q(x), LdlfKind::Q(y)) => ldlf_cmp(x, y),
        (LdlfKind::Diamond(r1, x), LdlfKind::Diamond(r2, y))
        | (LdlfKind::Box(r1, x), LdlfKind::Box(r2, y)) => {
            regex_cmp(r1, r2).then_with(|| ldlf_cmp(x, y))
        }
        _ => unreachable!("rank partitions LdlfKind by variant"),
    }
}

// ---------------------------------------------------------------------
// LTLf
// ---------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum LtlfKind {
    True,
    False,
    Atom(Symbol),
    And(Vec<Ltlf>),
    Or(Vec<Ltlf>),
    Not(Ltlf),
    Next(Ltlf),
    WeakNext(Ltlf),
    Until(Ltlf, Ltlf),
    Release(Ltlf, Ltlf),
    Eventually(Ltlf),
    Always(Ltlf),
}

term_handle!(Ltlf, LtlfNode, LtlfKind);

fn ltlf_rank(k: &LtlfKind) -> u8 {
    match k {
        LtlfKind::True => 0,
        LtlfKind::False => 1,
        LtlfKind::Atom(_) => 2,
        LtlfKind::And(_) => 3,
        LtlfKind::Or(_) => 4,
        LtlfKind::Not(_) => 5,
        LtlfKind::Next(_) => 6,
        LtlfKind::WeakNext(_) => 7,
        LtlfKind::Until(_, _) => 8,
        LtlfKind::Release(_, _) => 9,
        LtlfKind::Eventually(_) => 10,
        LtlfKind::Always(_) => 11,
    }
}

fn ltlf_cmp(a: &Ltlf, b: &Ltlf) -> Ordering {
    let (ka, kb) = (a.kind(), b.kind());
    let (ra, rb) = (ltlf_rank(ka), ltlf_rank(kb));
    if ra != rb {
        return ra.cmp(&rb);
    }
    match (ka, kb) {
        (LtlfKind::True, LtlfKind::True) | (LtlfKind::False, LtlfKind::False) => Ordering::Equal,
        (LtlfKind::Atom(x), LtlfKind::Atom(y)) => x.0.into_usize().cmp(&y.0.into_usize()),
        (LtlfKind::And(xs), LtlfKind::And(ys)) | (LtlfKind::Or(xs), LtlfKind::Or(ys)) => {
            lexicographic(xs, ys, ltlf_cmp)
        }
        (LtlfKind::Not(x), LtlfKind::Not(y))
        | (LtlfKind::Next(x), LtlfKind::Next(y))
        | (LtlfKind::WeakNext(x), LtlfKind::WeakNext(y))
        | (LtlfKind::Eventually(x), LtlfKind::Eventually(y))
        | (LtlfKind::Always(x), LtlfKind::Always(y)) => ltlf_cmp(x, y),
        (LtlfKind::Until(x1, y1), LtlfKind::Until(x2, y2))
        | (LtlfKind::Release(x1, y1), LtlfKind::Release(x2, y2)) => {
            ltlf_cmp(x1, x2).then_with(|| ltlf_cmp(y1, y2))
        }
        _ => unreachable!("rank partitions LtlfKind by variant"),
    }
}

// ---------------------------------------------------------------------
// Manager
// ---------------------------------------------------------------------

/// Owns the symbol interner and the four hash-cons tables. Lives until all
/// terms it produced are dropped; terms never outlive their manager in
/// practice because they hold an `Rc` into tables the manager indirectly
/// keeps alive only while it itself is alive (callers keep the manager
/// around for the lifetime of a translation, per the single-threaded
/// cooperative model).
pub struct TermManager {
    interner: RefCell<Rodeo>,
    prop_table: RefCell<HashMap<PropKind, Prop>>,
    regex_table: RefCell<HashMap<RegexKind, Regex>>,
    ldlf_table: RefCell<HashMap<LdlfKind, Ldlf>>,
    ltlf_table: RefCell<HashMap<LtlfKind, Ltlf>>,
}

impl Default for TermManager {
    fn default() -> Self {
        Self::new()
    }
}

macro_rules! cons {
    ($self:ident, $table:ident, $handle:ident, $node:ident, $kind:ident, $tag:expr, $children_hashes:expr, $built:expr) => {{
        if let Some(existing) = $self.$table.borrow().get(&$built) {
            return Ok(existing.clone());
        }
        let h = mix($tag, $children_hashes);
        let term = $handle::new($built.clone(), h);
        $self.$table.borrow_mut().insert($built, term.clone());
        Ok(term)
    }};
}

impl TermManager {
    pub fn new() -> Self {
        TermManager {
            interner: RefCell::new(Rodeo::new()),
            prop_table: RefCell::new(HashMap::new()),
            regex_table: RefCell::new(HashMap::new()),
            ldlf_table: RefCell::new(HashMap::new()),
            ltlf_table: RefCell::new(HashMap::new()),
        }
    }

    pub fn symbol(&self, name: &str) -> Symbol {
        Symbol(self.interner.borrow_mut().get_or_intern(name))
    }

    pub fn symbol_name(&self, sym: Symbol) -> String {
        self.interner.borrow().resolve(&sym.0).to_owned()
    }

    // -- propositional formulas -----------------------------------------

    pub fn prop_true(&self) -> Prop {
        self.cons_prop(PropKind::True)
    }

    pub fn prop_false(&self) -> Prop {
        self.cons_prop(PropKind::False)
    }

    pub fn prop_atom(&self, sym: Symbol) -> Prop {
        self.cons_prop(PropKind::Atom(AtomKind::Sym(sym)))
    }

    pub fn prop_quoted(&self, ldlf: Ldlf) -> Prop {
        self.cons_prop(PropKind::Atom(AtomKind::Quoted(ldlf)))
    }

    pub fn prop_not(&self, x: Prop) -> Prop {
        match x.kind() {
            PropKind::True => return self.prop_false(),
            PropKind::False => return self.prop_true(),
            PropKind::Not(inner) => return inner.clone(),
            _ => {}
        }
        self.cons_prop(PropKind::Not(x))
    }

    pub fn prop_and(&self, args: Vec<Prop>) -> Prop {
        self.prop_assoc(args, true)
    }

    pub fn prop_or(&self, args: Vec<Prop>) -> Prop {
        self.prop_assoc(args, false)
    }

    fn prop_assoc(&self, args: Vec<Prop>, is_and: bool) -> Prop {
        let identity = if is_and {
            PropKind::True
        } else {
            PropKind::False
        };
        let mut flat = Vec::with_capacity(args.len());
        for a in args {
            match (is_and, a.kind()) {
                (_, k) if *k == identity => continue,
                (true, PropKind::False) | (false, PropKind::True) => {
                    return if is_and {
                        self.prop_false()
                    } else {
                        self.prop_true()
                    }
                }
                (true, PropKind::And(cs)) => flat.extend(cs.iter().cloned()),
                (false, PropKind::Or(cs)) => flat.extend(cs.iter().cloned()),
                _ => flat.push(a),
            }
        }
        flat.sort_by(prop_cmp);
        flat.dedup_by(|a, b| a == b);
        match flat.len() {
            0 => {
                if is_and {
                    self.prop_true()
                } else {
                    self.prop_false()
                }
            }
            1 => flat.into_iter().next().unwrap(),
            _ => {
                if is_and {
                    self.cons_prop(PropKind::And(flat))
                } else {
                    self.cons_prop(PropKind::Or(flat))
                }
            }
        }
    }

    fn cons_prop(&self, kind: PropKind) -> Prop {
        if let Some(existing) = self.prop_table.borrow().get(&kind) {
            return existing.clone();
        }
        let tag = rank(&kind) as u64;
        let children: Vec<u64> = match &kind {
            PropKind::Atom(AtomKind::Sym(s)) => vec![s.0.into_usize() as u64],
            PropKind::Atom(AtomKind::Quoted(q)) => vec![q.structural_hash()],
            PropKind::Not(x) => vec![x.structural_hash()],
            PropKind::And(xs) | PropKind::Or(xs) => xs.iter().map(|x| x.structural_hash()).collect(),
            PropKind::True | PropKind::False => vec![],
        };
        let h = mix(tag, children);
        let term = Prop::new(kind.clone(), h);
        self.prop_table.borrow_mut().insert(kind, term.clone());
        term
    }

    // -- regex ------------------------------------------------------------

    pub fn regex_prop(&self, p: Prop) -> Regex {
        self.cons_regex(RegexKind::PropRegex(p))
    }

    pub fn regex_test(&self, ldlf: Ldlf) -> Regex {
        self.cons_regex(RegexKind::Test(ldlf))
    }

    pub fn regex_seq(&self, args: Vec<Regex>) -> Result<Regex> {
        if args.is_empty() {
            return Err(contract("Seq of fewer than one regex"));
        }
        let mut flat = Vec::with_capacity(args.len());
        for a in args {
            if let RegexKind::Seq(cs) = a.kind() {
                flat.extend(cs.iter().cloned());
            } else {
                flat.push(a);
            }
        }
        if flat.len() == 1 {
            return Ok(flat.into_iter().next().unwrap());
        }
        Ok(self.cons_regex(RegexKind::Seq(flat)))
    }

    pub fn regex_union(&self, args: Vec<Regex>) -> Result<Regex> {
        if args.is_empty() {
            return Err(contract("Union of fewer than one regex"));
        }
        let mut flat = Vec::with_capacity(args.len());
        for a in args {
            if let RegexKind::Union(cs) = a.kind() {
                flat.extend(cs.iter().cloned());
            } else {
                flat.push(a);
            }
        }
        flat.sort_by(regex_cmp);
        flat.dedup_by(|a, b| a == b);
        if flat.len() == 1 {
            return Ok(flat.into_iter().next().unwrap());
        }
        Ok(self.cons_regex(RegexKind::Union(flat)))
    }

    pub fn regex_star(&self, r: Regex) -> Regex {
        if let RegexKind::Star(_) = r.kind() {
            return r;
        }
        self.cons_regex(RegexKind::Star(r))
    }

    fn cons_regex(&self, kind: RegexKind) -> Regex {
        if let Some(existing) = self.regex_table.borrow().get(&kind) {
            return existing.clone();
        }
        let tag = regex_rank(&kind) as u64;
        let children: Vec<u64> = match &kind {
            RegexKind::PropRegex(p) => vec![p.structural_hash()],
            RegexKind::Test(l) => vec![l.structural_hash()],
            RegexKind::Seq(xs) | RegexKind::Union(xs) => {
                xs.iter().map(|x| x.structural_hash()).collect()
            }
            RegexKind::Star(x) => vec![x.structural_hash()],
        };
        let h = mix(tag, children);
        let term = Regex::new(kind.clone(), h);
        self.regex_table.borrow_mut().insert(kind, term.clone());
        term
    }

    // -- LDLf ---------------------------------------------------------------

    pub fn ldlf_true(&self) -> Ldlf {
        self.cons_ldlf(LdlfKind::True)
    }

    pub fn ldlf_false(&self) -> Ldlf {
        self.cons_ldlf(LdlfKind::False)
    }

    pub fn ldlf_and(&self, args: Vec<Ldlf>) -> Ldlf {
        self.ldlf_assoc(args, true)
    }

    pub fn ldlf_or(&self, args: Vec<Ldlf>) -> Ldlf {
        self.ldlf_assoc(args, false)
    }

    fn ldlf_assoc(&self, args: Vec<Ldlf>, is_and: bool) -> Ldlf {
        let identity = if is_and { LdlfKind::True } else { LdlfKind::False };
        let mut flat = Vec::with_capacity(args.len());
        for a in args {
            match (is_and, a.kind()) {
                (_, k) if *k == identity => continue,
                (true, LdlfKind::False) | (false, LdlfKind::True) => {
                    return if is_and {
                        self.ldlf_false()
                    } else {
                        self.ldlf_true()
                    }
                }
                (true, LdlfKind::And(cs)) => flat.extend(cs.iter().cloned()),
                (false, LdlfKind::Or(cs)) => flat.extend(cs.iter().cloned()),
                _ => flat.push(a),
            }
        }
        flat.sort_by(ldlf_cmp);
        flat.dedup_by(|a, b| a == b);
        match flat.len() {
            0 => {
                if is_and {
                    self.ldlf_true()
                } else {
                    self.ldlf_false()
                }
            }
            1 => flat.into_iter().next().unwrap(),
            _ => {
                if is_and {
                    self.cons_ldlf(LdlfKind::And(flat))
                } else {
                    self.cons_ldlf(LdlfKind::Or(flat))
                }
            }
        }
    }

    pub fn ldlf_not(&self, x: Ldlf) -> Ldlf {
        if let LdlfKind::Not(inner) = x.kind() {
            return inner.clone();
        }
        match x.kind() {
            LdlfKind::True => return self.ldlf_false(),
            LdlfKind::False => return self.ldlf_true(),
            _ => {}
        }
        self.cons_ldlf(LdlfKind::Not(x))
    }

    pub fn ldlf_diamond(&self, r: Regex, psi: Ldlf) -> Ldlf {
        self.cons_ldlf(LdlfKind::Diamond(r, psi))
    }

    pub fn ldlf_box(&self, r: Regex, psi: Ldlf) -> Ldlf {
        self.cons_ldlf(LdlfKind::Box(r, psi))
    }

    pub fn ldlf_f(&self, x: Ldlf) -> Ldlf {
        self.cons_ldlf(LdlfKind::F(x))
    }

    pub fn ldlf_t(&self, x: Ldlf) -> Ldlf {
        self.cons_ldlf(LdlfKind::T(x))
    }

    pub fn ldlf_q(&self, x: Ldlf) -> Ldlf {
        self.cons_ldlf(LdlfKind::Q(x))
    }

    fn cons_ldlf(&self, kind: LdlfKind) -> Ldlf {
        if let Some(existing) = self.ldlf_table.borrow().get(&kind) {
            return existing.clone();
        }
        let tag = ldlf_rank(&kind) as u64;
        let children: Vec<u64> = match &kind {
            LdlfKind::True | LdlfKind::False => vec![],
            LdlfKind::And(xs) | LdlfKind::Or(xs) => xs.iter().map(|x| x.structural_hash()).collect(),
            LdlfKind::Not(x) | LdlfKind::F(x) | LdlfKind::T(x) | LdlfKind::Q(x) => {
                vec![x.structural_hash()]
            }
            LdlfKind::Diamond(r, x) | LdlfKind::Box(r, x) => {
                vec![r.structural_hash(), x.structural_hash()]
            }
        };
        let h = mix(tag, children);
        let term = Ldlf::new(kind.clone(), h);
        self.ldlf_table.borrow_mut().insert(kind, term.clone());
        term
    }

    // -- LTLf ---------------------------------------------------------------

    pub fn ltlf_true(&self) -> Ltlf {
        self.cons_ltlf(LtlfKind::True)
    }
    pub fn ltlf_false(&self) -> Ltlf {
        self.cons_ltlf(LtlfKind::False)
    }
    pub fn ltlf_atom(&self, s: Symbol) -> Ltlf {
        self.cons_ltlf(LtlfKind::Atom(s))
    }

    pub fn ltlf_and(&self, args: Vec<Ltlf>) -> Ltlf {
        self.ltlf_assoc(args, true)
    }
    pub fn ltlf_or(&self, args: Vec<Ltlf>) -> Ltlf {
        self.ltlf_assoc(args, false)
    }

    fn ltlf_assoc(&self, args: Vec<Ltlf>, is_and: bool) -> Ltlf {
        let identity = if is_and { LtlfKind::True } else { LtlfKind::False };
        let mut flat = Vec::with_capacity(args.len());
        for a in args {
            match (is_and, a.kind()) {
                (_, k) if *k == identity => continue,
                (true, LtlfKind::False) | (false, LtlfKind::True) => {
                    return if is_and {
                        self.ltlf_false()
                    } else {
                        self.ltlf_true()
                    }
                }
                (true, LtlfKind::And(cs)) => flat.extend(cs.iter().cloned()),
                (false, LtlfKind::Or(cs)) => flat.extend(cs.iter().cloned()),
                _ => flat.push(a),
            }
        }
        flat.sort_by(ltlf_cmp);
        flat.dedup_by(|a, b| a == b);
        match flat.len() {
            0 => {
                if is_and {
                    self.ltlf_true()
                } else {
                    self.ltlf_false()
                }
            }
            1 => flat.into_iter().next().unwrap(),
            _ => {
                if is_and {
                    self.cons_ltlf(LtlfKind::And(flat))
                } else {
                    self.cons_ltlf(LtlfKind::Or(flat))
                }
            }
        }
    }

    pub fn ltlf_not(&self, x: Ltlf) -> Ltlf {
        if let LtlfKind::Not(inner) = x.kind() {
            return inner.clone();
        }
        self.cons_ltlf(LtlfKind::Not(x))
    }
    pub fn ltlf_next(&self, x: Ltlf) -> Ltlf {
        self.cons_ltlf(LtlfKind::Next(x))
    }
    pub fn ltlf_weak_next(&self, x: Ltlf) -> Ltlf {
        self.cons_ltlf(LtlfKind::WeakNext(x))
    }
    pub fn ltlf_until(&self, a: Ltlf, b: Ltlf) -> Ltlf {
        self.cons_ltlf(LtlfKind::Until(a, b))
    }
    pub fn ltlf_release(&self, a: Ltlf, b: Ltlf) -> Ltlf {
        self.cons_ltlf(LtlfKind::Release(a, b))
    }
    pub fn ltlf_eventually(&self, x: Ltlf) -> Ltlf {
        self.cons_ltlf(LtlfKind::Eventually(x))
    }
    pub fn ltlf_always(&self, x: Ltlf) -> Ltlf {
        self.cons_ltlf(LtlfKind::Always(x))
    }

    fn cons_ltlf(&self, kind: LtlfKind) -> Ltlf {
        if let Some(existing) = self.ltlf_table.borrow().get(&kind) {
            return existing.clone();
        }
        let tag = ltlf_rank(&kind) as u64;
        let children: Vec<u64> = match &kind {
            LtlfKind::True | LtlfKind::False => vec![],
            LtlfKind::Atom(s) => vec![s.0.into_usize() as u64],
            LtlfKind::And(xs) | LtlfKind::Or(xs) => xs.iter().map(|x| x.structural_hash()).collect(),
            LtlfKind::Not(x)
            | LtlfKind::Next(x)
            | LtlfKind::WeakNext(x)
            | LtlfKind::Eventually(x)
            | LtlfKind::Always(x) => vec![x.structural_hash()],
            LtlfKind::Until(a, b) | LtlfKind::Release(a, b) => {
                vec![a.structural_hash(), b.structural_hash()]
            }
        };
        let h = mix(tag, children);
        let term = Ltlf::new(kind.clone(), h);
        self.ltlf_table.borrow_mut().insert(kind, term.clone());
        term
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn symbol_interning_is_identity() {
        let m = TermManager::new();
        assert_eq!(m.symbol("a"), m.symbol("a"));
        assert_ne!(m.symbol("a"), m.symbol("b"));
    }

    #[test]
    fn hash_consing_is_pointer_identity() {
        let m = TermManager::new();
        let a = m.symbol("a");
        let p1 = m.prop_atom(a);
        let p2 = m.prop_atom(a);
        assert!(Rc::ptr_eq(&p1.0, &p2.0));
    }

    #[test]
    fn and_discards_identity_and_flattens() {
        let m = TermManager::new();
        let a = m.prop_atom(m.symbol("a"));
        let b = m.prop_atom(m.symbol("b"));
        let t = m.prop_true();
        let lhs = m.prop_and(vec![a.clone(), t]);
        assert_eq!(lhs, a);

        let inner = m.prop_and(vec![a.clone(), b.clone()]);
        let c = m.prop_atom(m.symbol("c"));
        let flattened = m.prop_and(vec![inner, c.clone()]);
        match flattened.kind() {
            PropKind::And(xs) => assert_eq!(xs.len(), 3),
            _ => panic!("expected a flattened And"),
        }
    }

    #[test]
    fn and_short_circuits_on_false() {
        let m = TermManager::new();
        let a = m.prop_atom(m.symbol("a"));
        let f = m.prop_false();
        let r = m.prop_and(vec![a, f]);
        assert_eq!(*r.kind(), PropKind::False);
    }

    #[test]
    fn seq_of_zero_is_contract_violation() {
        let m = TermManager::new();
        assert!(m.regex_seq(vec![]).is_err());
    }

    #[test]
    fn and_is_commutative_under_canonicalization() {
        let m = TermManager::new();
        let a = m.prop_atom(m.symbol("a"));
        let b = m.prop_atom(m.symbol("b"));
        let lhs = m.prop_and(vec![a.clone(), b.clone()]);
        let rhs = m.prop_and(vec![b, a]);
        assert_eq!(lhs, rhs);
    }
}

use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

use once_cell::sync::Lazy;

use super::VariantError;

/// Text form of the null (deletion) allele.
pub const NULL_ALLELE_STRING: &str = "-";
/// Text form of the no-call allele.
pub const NO_CALL_STRING: &str = ".";

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
enum AlleleKind {
    Regular,
    Null,
    NoCall,
    Symbolic,
}

#[derive(Debug)]
struct AlleleData {
    bases: Box<[u8]>,
    is_ref: bool,
    kind: AlleleKind,
}

/// One haplotype sequence observed (or hypothesised) at a site.
///
/// Alleles are cheap shared handles. Single-base alleles and the null and
/// no-call markers come from a fixed intern table, so repeated creation of
/// e.g. a reference `A` hands back the same underlying instance.
#[derive(Clone)]
pub struct Allele(Arc<AlleleData>);

struct InternTable {
    reference: [Allele; 5],
    alternate: [Allele; 5],
    ref_null: Allele,
    alt_null: Allele,
    no_call: Allele,
}

impl InternTable {
    fn build() -> Self {
        let make = |base: u8, is_ref: bool| Allele::from_parts(vec![base], is_ref, AlleleKind::Regular);
        Self {
            reference: [
                make(b'A', true),
                make(b'C', true),
                make(b'G', true),
                make(b'T', true),
                make(b'N', true),
            ],
            alternate: [
                make(b'A', false),
                make(b'C', false),
                make(b'G', false),
                make(b'T', false),
                make(b'N', false),
            ],
            ref_null: Allele::from_parts(Vec::new(), true, AlleleKind::Null),
            alt_null: Allele::from_parts(Vec::new(), false, AlleleKind::Null),
            no_call: Allele::from_parts(Vec::new(), false, AlleleKind::NoCall),
        }
    }
}

static INTERNED: Lazy<InternTable> = Lazy::new(InternTable::build);

fn intern_slot(base: u8) -> Option<usize> {
    match base {
        b'A' | b'a' => Some(0),
        b'C' | b'c' => Some(1),
        b'G' | b'g' => Some(2),
        b'T' | b't' => Some(3),
        b'N' | b'n' => Some(4),
        _ => None,
    }
}

fn would_be_null(bases: &[u8]) -> bool {
    bases.is_empty() || bases == NULL_ALLELE_STRING.as_bytes()
}

fn would_be_no_call(bases: &[u8]) -> bool {
    bases == NO_CALL_STRING.as_bytes()
}

fn would_be_symbolic(bases: &[u8]) -> bool {
    if bases.len() <= 1 {
        return false;
    }
    bases[0] == b'<'
        || bases[bases.len() - 1] == b'>'
        || bases.iter().any(|&b| b == b'[' || b == b']')
}

/// Whether `bases` only contains `A`, `C`, `G`, `T` or `N` (any case).
pub fn acceptable_allele_bases(bases: &[u8]) -> bool {
    !bases.is_empty() && bases.iter().all(|b| intern_slot(*b).is_some())
}

impl Allele {
    fn from_parts(bases: Vec<u8>, is_ref: bool, kind: AlleleKind) -> Self {
        Allele(Arc::new(AlleleData {
            bases: bases.into_boxed_slice(),
            is_ref,
            kind,
        }))
    }

    /// Create an allele from its textual bases.
    ///
    /// `-` (or empty input) yields the null allele, `.` the no-call allele and
    /// `<TAG>`/breakend notation a symbolic allele. Anything else must be made
    /// of `ACGTN` and is stored upper-cased.
    pub fn create(bases: impl AsRef<[u8]>, is_ref: bool) -> Result<Self, VariantError> {
        let bases = bases.as_ref();

        if would_be_null(bases) {
            return Ok(if is_ref {
                INTERNED.ref_null.clone()
            } else {
                INTERNED.alt_null.clone()
            });
        }

        if would_be_no_call(bases) {
            if is_ref {
                return Err(VariantError::IllegalReferenceTag(NO_CALL_STRING.to_string()));
            }
            return Ok(INTERNED.no_call.clone());
        }

        if would_be_symbolic(bases) {
            let text = String::from_utf8_lossy(bases).into_owned();
            if is_ref {
                return Err(VariantError::IllegalReferenceTag(text));
            }
            return Ok(Self::from_parts(bases.to_vec(), false, AlleleKind::Symbolic));
        }

        if bases.len() == 1 {
            if let Some(slot) = intern_slot(bases[0]) {
                let table = if is_ref {
                    &INTERNED.reference
                } else {
                    &INTERNED.alternate
                };
                return Ok(table[slot].clone());
            }
        }

        if !acceptable_allele_bases(bases) {
            return Err(VariantError::InvalidAlleleBases(
                String::from_utf8_lossy(bases).into_owned(),
            ));
        }

        Ok(Self::from_parts(
            bases.to_ascii_uppercase(),
            is_ref,
            AlleleKind::Regular,
        ))
    }

    /// The shared no-call allele.
    pub fn no_call() -> Self {
        INTERNED.no_call.clone()
    }

    /// The shared null allele, tagged as reference or not.
    pub fn null(is_ref: bool) -> Self {
        if is_ref {
            INTERNED.ref_null.clone()
        } else {
            INTERNED.alt_null.clone()
        }
    }

    /// Append `right` to the bases of `left`, keeping its reference tag.
    pub fn extend(left: &Allele, right: &[u8]) -> Result<Self, VariantError> {
        if left.is_symbolic() {
            return Err(VariantError::ExtendSymbolic(left.display_string()));
        }
        let mut bases = Vec::with_capacity(left.len() + right.len());
        bases.extend_from_slice(left.bases());
        bases.extend_from_slice(right);
        Self::create(bases, left.is_reference())
    }

    /// True if either allele's bases are a prefix of the other's.
    pub fn one_is_prefix_of_other(a: &Allele, b: &Allele) -> bool {
        if a.len() <= b.len() {
            b.bases().starts_with(a.bases())
        } else {
            a.bases().starts_with(b.bases())
        }
    }

    /// Raw bases. Empty for null and no-call alleles.
    pub fn bases(&self) -> &[u8] {
        &self.0.bases
    }

    /// Bases as text; `.` for the no-call allele.
    pub fn base_string(&self) -> String {
        if self.is_no_call() {
            NO_CALL_STRING.to_string()
        } else {
            String::from_utf8_lossy(&self.0.bases).into_owned()
        }
    }

    /// Text shown to users: `.` for no-calls, `-` for null alleles, bases otherwise.
    pub fn display_string(&self) -> String {
        match self.0.kind {
            AlleleKind::NoCall => NO_CALL_STRING.to_string(),
            AlleleKind::Null => NULL_ALLELE_STRING.to_string(),
            _ => String::from_utf8_lossy(&self.0.bases).into_owned(),
        }
    }

    /// Number of bases.
    pub fn len(&self) -> usize {
        self.0.bases.len()
    }

    /// True for alleles without bases (null and no-call).
    pub fn is_empty(&self) -> bool {
        self.0.bases.is_empty()
    }

    /// Tagged as the reference allele.
    pub fn is_reference(&self) -> bool {
        self.0.is_ref
    }

    /// Not tagged as the reference allele.
    pub fn is_non_reference(&self) -> bool {
        !self.0.is_ref
    }

    /// The deletion marker.
    pub fn is_null(&self) -> bool {
        self.0.kind == AlleleKind::Null
    }

    /// Anything but the deletion marker.
    pub fn is_non_null(&self) -> bool {
        !self.is_null()
    }

    /// The undetermined-call marker.
    pub fn is_no_call(&self) -> bool {
        self.0.kind == AlleleKind::NoCall
    }

    /// Anything but the no-call marker.
    pub fn is_called(&self) -> bool {
        !self.is_no_call()
    }

    /// Structural allele written as `<TAG>` or breakend notation.
    pub fn is_symbolic(&self) -> bool {
        self.0.kind == AlleleKind::Symbolic
    }

    /// Equality on bases and null/no-call state, ignoring the reference tag.
    pub fn equals_ignore_ref(&self, other: &Allele) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
            || (self.0.kind == other.0.kind && self.0.bases == other.0.bases)
    }

    /// True if both handles point at the same interned instance.
    pub fn ptr_eq(&self, other: &Allele) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

impl PartialEq for Allele {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
            || (self.0.is_ref == other.0.is_ref && self.equals_ignore_ref(other))
    }
}

impl Eq for Allele {}

impl Hash for Allele {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.0.is_ref.hash(state);
        self.0.kind.hash(state);
        self.0.bases.hash(state);
    }
}

impl Ord for Allele {
    fn cmp(&self, other: &Self) -> Ordering {
        other
            .0
            .is_ref
            .cmp(&self.0.is_ref)
            .then_with(|| self.0.bases.cmp(&other.0.bases))
            .then_with(|| self.0.kind.cmp(&other.0.kind))
    }
}

impl PartialOrd for Allele {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl fmt::Display for Allele {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.display_string())?;
        if self.is_reference() {
            write!(f, "*")?;
        }
        Ok(())
    }
}

impl fmt::Debug for Allele {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Allele({self})")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn single_bases_are_interned() {
        let a = Allele::create("A", true).expect("ref A");
        let b = Allele::create("a", true).expect("ref a");
        assert!(a.ptr_eq(&b));

        let alt = Allele::create("A", false).expect("alt A");
        assert!(!a.ptr_eq(&alt));
        assert_ne!(a, alt);
        assert!(a.equals_ignore_ref(&alt));
    }

    #[test]
    fn special_forms_are_recognised() {
        let null = Allele::create("-", false).expect("null");
        assert!(null.is_null());
        assert!(null.is_empty());
        assert_eq!(null.display_string(), "-");

        let no_call = Allele::create(".", false).expect("no call");
        assert!(no_call.is_no_call());
        assert!(no_call.ptr_eq(&Allele::no_call()));

        let symbolic = Allele::create("<DEL>", false).expect("symbolic");
        assert!(symbolic.is_symbolic());
        assert_eq!(symbolic.display_string(), "<DEL>");
    }

    #[test]
    fn reference_tag_is_rejected_for_no_call_and_symbolic() {
        assert!(matches!(
            Allele::create(".", true),
            Err(VariantError::IllegalReferenceTag(_))
        ));
        assert!(matches!(
            Allele::create("<INS>", true),
            Err(VariantError::IllegalReferenceTag(_))
        ));
    }

    #[test]
    fn invalid_bases_fail() {
        assert!(matches!(
            Allele::create("ACGX", false),
            Err(VariantError::InvalidAlleleBases(_))
        ));
        assert!(Allele::create("R", false).is_err());
    }

    #[test]
    fn multi_base_alleles_are_uppercased() {
        let allele = Allele::create("acgt", false).expect("lowercase bases");
        assert_eq!(allele.bases(), b"ACGT");
        assert_eq!(allele.to_string(), "ACGT");
    }

    #[test]
    fn extend_keeps_reference_tag() {
        let reference = Allele::create("A", true).expect("ref");
        let extended = Allele::extend(&reference, b"TT").expect("extend");
        assert!(extended.is_reference());
        assert_eq!(extended.bases(), b"ATT");

        let symbolic = Allele::create("<DUP>", false).expect("symbolic");
        assert!(Allele::extend(&symbolic, b"A").is_err());
    }

    #[test]
    fn ordering_puts_reference_first_then_bases() {
        let mut alleles = vec![
            Allele::create("T", false).expect("T"),
            Allele::create("C", false).expect("C"),
            Allele::create("G", true).expect("G*"),
        ];
        alleles.sort();
        let rendered: Vec<String> = alleles.iter().map(|a| a.to_string()).collect();
        assert_eq!(rendered, vec!["G*", "C", "T"]);
    }

    #[test]
    fn prefix_relationship() {
        let short = Allele::create("AC", true).expect("AC");
        let long = Allele::create("ACGT", false).expect("ACGT");
        let other = Allele::create("AG", false).expect("AG");
        assert!(Allele::one_is_prefix_of_other(&short, &long));
        assert!(Allele::one_is_prefix_of_other(&long, &short));
        assert!(!Allele::one_is_prefix_of_other(&other, &long));
    }
}
